#[cfg(target_os = "linux")]
mod linux;
#[cfg(target_os = "macos")]
mod macos;
#[cfg(target_os = "windows")]
mod windows;

/// Whether the desktop is using a dark color scheme. Falls back to dark when
/// the setting cannot be read.
pub fn is_dark_mode() -> bool {
    #[cfg(target_os = "linux")]
    {
        linux::is_dark_mode().unwrap_or(true)
    }
    #[cfg(target_os = "macos")]
    {
        macos::is_dark_mode().unwrap_or(true)
    }
    #[cfg(target_os = "windows")]
    {
        windows::is_dark_mode().unwrap_or(true)
    }
    #[cfg(not(any(target_os = "linux", target_os = "macos", target_os = "windows")))]
    {
        true
    }
}
