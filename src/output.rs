//! # Output Configuration
//!
//! Controls how the CLI decorates its human-readable output (status markers
//! and colors) based on terminal capabilities and user preferences.
//!
//! ## Respecting User Preferences
//!
//! The module respects the following environment variables and flags:
//! - `--color=never|always|auto` - CLI flag for color control
//! - `NO_COLOR` - Disables colors when set (per https://no-color.org/)
//! - `CLICOLOR=0` - Disables colors
//! - `CLICOLOR_FORCE=1` - Forces colors even in non-TTY
//! - `TERM=dumb` - Disables colors for dumb terminals
//!
//! Machine-readable output (resolved YAML/JSON) is never decorated.
//!
//! ## Usage
//!
//! ```rust
//! use confgen::output::{status, OutputConfig, Status};
//!
//! let config = OutputConfig::from_env_and_flag("never");
//! assert_eq!(status(&config, Status::Ok), "[OK]");
//! ```

use std::env;

use console::style;

/// Output configuration for controlling colors and status markers.
#[derive(Debug, Clone)]
pub struct OutputConfig {
    /// Whether colors and symbols should be used in output.
    pub use_color: bool,
}

impl OutputConfig {
    /// Create an output configuration from environment and CLI flag.
    ///
    /// - `--color=always`: Force colors on (overrides NO_COLOR)
    /// - `--color=never`: Force colors off
    /// - `--color=auto`: Detect based on environment
    pub fn from_env_and_flag(color_flag: &str) -> Self {
        let use_color = match color_flag.to_lowercase().as_str() {
            "always" => true,
            "never" => false,
            _ => Self::detect_color_support(),
        };

        Self { use_color }
    }

    /// Detect whether color output is supported based on environment.
    fn detect_color_support() -> bool {
        // presence alone disables colors, even when empty
        if env::var_os("NO_COLOR").is_some() {
            return false;
        }

        if env::var("CLICOLOR").is_ok_and(|v| v == "0") {
            return false;
        }

        if env::var("CLICOLOR_FORCE").is_ok_and(|v| v != "0" && !v.is_empty()) {
            return true;
        }

        if env::var("TERM").is_ok_and(|v| v == "dumb") {
            return false;
        }

        console::Term::stdout().features().colors_supported()
    }

    /// Create a configuration with colors always enabled.
    #[cfg(test)]
    pub fn with_color() -> Self {
        Self { use_color: true }
    }

    /// Create a configuration with colors always disabled.
    #[cfg(test)]
    pub fn without_color() -> Self {
        Self { use_color: false }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self::from_env_and_flag("auto")
    }
}

/// Outcome shown in front of a report line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Ok,
    Failed,
}

/// Marker for a report line: a colored symbol, or a plain bracketed word
/// when colors are disabled.
pub fn status(config: &OutputConfig, status: Status) -> String {
    match (config.use_color, status) {
        (true, Status::Ok) => style("✓").green().force_styling(true).to_string(),
        (true, Status::Failed) => style("✗").red().force_styling(true).to_string(),
        (false, Status::Ok) => "[OK]".to_string(),
        (false, Status::Failed) => "[FAIL]".to_string(),
    }
}

/// Emphasize a name (role, node) in report lines.
pub fn name(config: &OutputConfig, text: &str) -> String {
    if config.use_color {
        style(text).bold().force_styling(true).to_string()
    } else {
        text.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_color_flag_forces_mode() {
        assert!(OutputConfig::from_env_and_flag("always").use_color);
        assert!(!OutputConfig::from_env_and_flag("never").use_color);
    }

    #[test]
    fn test_name_is_bold_only_with_color() {
        assert!(name(&OutputConfig::with_color(), "web").contains("\u{1b}[1m"));
        assert_eq!(name(&OutputConfig::without_color(), "web"), "web");
    }

    #[test]
    fn test_status_with_color() {
        let config = OutputConfig::with_color();
        assert!(status(&config, Status::Ok).contains('✓'));
        assert!(status(&config, Status::Failed).contains('✗'));
    }

    #[test]
    fn test_status_without_color() {
        let config = OutputConfig::without_color();
        assert_eq!(status(&config, Status::Ok), "[OK]");
        assert_eq!(status(&config, Status::Failed), "[FAIL]");
    }
}
