//! Ambient light/dark preference of the host environment.

/// Explicit override, `dark` or `light`.
pub const THEME_OVERRIDE_VAR: &str = "RESUME_ANALYZER_THEME";
/// `fg;bg` (or `fg;x;bg`) colour indices exported by many terminals.
const COLORFGBG_VAR: &str = "COLORFGBG";

/// Answers "does the host prefer a dark theme right now?".
pub trait AmbientTheme: Send + Sync {
    fn prefers_dark(&self) -> bool;
}

/// Reads the preference from the terminal environment.
pub struct TerminalTheme;

impl AmbientTheme for TerminalTheme {
    fn prefers_dark(&self) -> bool {
        let theme_override = std::env::var(THEME_OVERRIDE_VAR).ok();
        let colorfgbg = std::env::var(COLORFGBG_VAR).ok();
        prefers_dark_from(theme_override.as_deref(), colorfgbg.as_deref())
    }
}

/// A fixed answer.
#[cfg(test)]
#[derive(Debug, Clone, Copy)]
pub struct FixedTheme(pub bool);

#[cfg(test)]
impl AmbientTheme for FixedTheme {
    fn prefers_dark(&self) -> bool {
        self.0
    }
}

/// Unknown environments read as light.
pub fn prefers_dark_from(theme_override: Option<&str>, colorfgbg: Option<&str>) -> bool {
    match theme_override.map(|v| v.trim().to_ascii_lowercase()).as_deref() {
        Some("dark") => return true,
        Some("light") => return false,
        _ => {}
    }

    colorfgbg
        .and_then(|v| v.rsplit(';').next())
        .and_then(|bg| bg.trim().parse::<u8>().ok())
        .map(|bg| bg <= 6 || bg == 8)
        .unwrap_or(false)
}
