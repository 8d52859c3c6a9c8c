use std::process::Command;

/// Asks GNOME-compatible desktops for the preferred color scheme, then the
/// GTK theme name.
pub fn is_dark_mode() -> Option<bool> {
    if let Some(scheme) = gsettings("color-scheme") {
        if scheme.contains("dark") {
            return Some(true);
        }
        if scheme.contains("light") {
            return Some(false);
        }
    }
    gsettings("gtk-theme").map(|name| name.to_lowercase().contains("dark"))
}

fn gsettings(key: &str) -> Option<String> {
    let output = Command::new("gsettings")
        .args(["get", "org.gnome.desktop.interface", key])
        .output()
        .ok()?;
    output
        .status
        .success()
        .then(|| String::from_utf8_lossy(&output.stdout).trim().to_string())
}
