use std::process::Command;

/// `AppleInterfaceStyle` is only set while dark mode is on, so a failed read
/// means light mode.
pub fn is_dark_mode() -> Option<bool> {
    let output = Command::new("defaults")
        .args(["read", "-g", "AppleInterfaceStyle"])
        .output()
        .ok()?;
    Some(
        output.status.success()
            && String::from_utf8_lossy(&output.stdout)
                .trim()
                .eq_ignore_ascii_case("dark"),
    )
}
