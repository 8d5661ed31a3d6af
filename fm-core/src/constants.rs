//! Constants and configuration values for Filament Manager
//!
//! Centralizes defaults, paths and magic numbers used by the accounting
//! engine and the settings layer.

use std::time::Duration;

/// Configuration paths
pub mod paths {
    /// Directory name under the user's config base
    pub const APP_DIR: &str = "filamentmanager";

    /// Settings file name
    pub const SETTINGS_FILE: &str = "settings.json";

    /// System-wide fallback when neither XDG_CONFIG_HOME nor HOME is set
    pub const SYSTEM_CONFIG_DIR: &str = "/etc/filamentmanager";

    /// User configuration directory
    ///
    /// `$XDG_CONFIG_HOME/filamentmanager`, then `$HOME/.config/filamentmanager`,
    /// then whatever `dirs` reports for the platform.
    pub fn user_config_dir() -> Option<std::path::PathBuf> {
        let config_base = if let Ok(xdg) = std::env::var("XDG_CONFIG_HOME") {
            Some(std::path::PathBuf::from(xdg))
        } else if let Ok(home) = std::env::var("HOME") {
            Some(std::path::PathBuf::from(home).join(".config"))
        } else {
            dirs::config_dir()
        };

        config_base.map(|p| p.join(APP_DIR))
    }
}

/// Filament physics
pub mod filament {
    /// mm³ per cm³
    pub const MM3_PER_CM3: f64 = 1000.0;

    /// mm per m, used when displaying lengths
    pub const MM_PER_M: f64 = 1000.0;
}

/// Settings defaults
pub mod defaults {
    pub const CURRENCY_SYMBOL: &str = "€";
}

/// Warning notices
pub mod warning {
    use super::Duration;

    pub const TITLE: &str = "Insufficient filament";

    pub const TEXT: &str =
        "The current print job needs more material than what's left on the selected spool.";

    /// Dismissal delay applied to a notice that is being replaced
    pub const REPLACE_FADE_DELAY: Duration = Duration::from_millis(1000);
}

/// Automatic pause
pub mod pause {
    /// Filament kept in reserve before pausing, in mm
    pub const DEFAULT_THRESHOLD_MM: f64 = 100.0;

    /// Largest accepted reserve, in mm
    pub const MAX_THRESHOLD_MM: f64 = 100_000.0;
}

/// Input limits
pub mod limits {
    /// Largest settings or scenario file read from disk
    pub const MAX_CONFIG_FILE_SIZE: u64 = 1024 * 1024;

    /// Tool counts above this are treated as a misconfigured printer profile
    pub const MAX_TOOL_COUNT: usize = 64;

    pub const MAX_CURRENCY_SYMBOL_LEN: usize = 8;
}
