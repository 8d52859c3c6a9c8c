use std::process::Command;

const PERSONALIZE_KEY: &str = r"HKCU\Software\Microsoft\Windows\CurrentVersion\Themes\Personalize";

pub fn is_dark_mode() -> Option<bool> {
    let output = Command::new("reg")
        .args(["query", PERSONALIZE_KEY, "/v", "AppsUseLightTheme"])
        .output()
        .ok()?;
    if !output.status.success() {
        return None;
    }
    parse_apps_use_light_theme(&String::from_utf8_lossy(&output.stdout)).map(|light| !light)
}

/// Reads the DWORD from a line like `AppsUseLightTheme    REG_DWORD    0x0`.
fn parse_apps_use_light_theme(stdout: &str) -> Option<bool> {
    let line = stdout.lines().find(|l| l.contains("AppsUseLightTheme"))?;
    let value = line.split_whitespace().last()?;
    Some(value != "0x0")
}
