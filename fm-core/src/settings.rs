//! Plugin Settings
//!
//! Persistent settings stored as JSON in ~/.config/filamentmanager/settings.json

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{OnceLock, RwLock};

use crate::constants::{defaults, pause, paths};
use crate::data::{validate_currency_symbol, validate_file_size, validate_pause_threshold};
use crate::error::{FilamentError, Result};

// ============================================================================
// Cached Settings
// ============================================================================

static SETTINGS_CACHE: OnceLock<RwLock<Option<PluginSettings>>> = OnceLock::new();

fn get_cache() -> &'static RwLock<Option<PluginSettings>> {
    SETTINGS_CACHE.get_or_init(|| RwLock::new(None))
}

/// Get cached settings, loading from disk on a cache miss
pub fn get_cached_settings() -> PluginSettings {
    if let Ok(guard) = get_cache().read() {
        if let Some(ref settings) = *guard {
            return settings.clone();
        }
    }

    let settings = load_settings().unwrap_or_else(|e| {
        tracing::warn!("Falling back to default settings: {}", e);
        PluginSettings::default()
    });
    update_cache(&settings);
    settings
}

/// Invalidate the settings cache (call after editing the file by hand)
pub fn invalidate_settings_cache() {
    if let Ok(mut guard) = get_cache().write() {
        *guard = None;
    }
}

fn update_cache(settings: &PluginSettings) {
    if let Ok(mut guard) = get_cache().write() {
        *guard = Some(settings.clone());
    }
}

/// Front-end settings of the filament manager
///
/// Field names follow the host's settings keys, so a settings file exported
/// from the host can be read as is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PluginSettings {
    /// Track extrusion while printing and book it on the spools afterwards
    #[serde(default = "default_true")]
    pub enable_odometer: bool,

    /// Warn when a job needs more filament than the selected spool holds
    #[serde(default = "default_true")]
    pub enable_warning: bool,

    /// Pause the print before a spool runs out
    #[serde(default)]
    pub auto_pause: bool,

    /// Filament kept in reserve when pausing, mm
    #[serde(default = "default_pause_threshold")]
    pub pause_threshold: f64,

    #[serde(default = "default_currency_symbol")]
    pub currency_symbol: String,

    /// Ask the user to confirm spool selections before printing
    #[serde(default)]
    pub confirm_spool_selection: bool,

    /// Close the insufficient-filament notice once the shortage is gone
    #[serde(default)]
    pub dismiss_resolved_warning: bool,

    /// Whether G90 also switches the extruder to absolute mode
    #[serde(default = "default_true")]
    pub g90_influences_extruder: bool,
}

fn default_true() -> bool {
    true
}

fn default_pause_threshold() -> f64 {
    pause::DEFAULT_THRESHOLD_MM
}

fn default_currency_symbol() -> String {
    defaults::CURRENCY_SYMBOL.to_string()
}

impl Default for PluginSettings {
    fn default() -> Self {
        Self {
            enable_odometer: true,
            enable_warning: true,
            auto_pause: false,
            pause_threshold: default_pause_threshold(),
            currency_symbol: default_currency_symbol(),
            confirm_spool_selection: false,
            dismiss_resolved_warning: false,
            g90_influences_extruder: true,
        }
    }
}

/// Keys accepted by [`PluginSettings::set_value`] and [`PluginSettings::get_value`]
pub const SETTING_KEYS: &[&str] = &[
    "enableOdometer",
    "enableWarning",
    "autoPause",
    "pauseThreshold",
    "currencySymbol",
    "confirmSpoolSelection",
    "dismissResolvedWarning",
    "g90InfluencesExtruder",
];

fn parse_value<T: std::str::FromStr>(key: &str, value: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| FilamentError::invalid_setting(key, format!("cannot parse '{}'", value)))
}

impl PluginSettings {
    /// Check every field that has a constrained range
    pub fn validate(&self) -> Result<()> {
        validate_pause_threshold(self.pause_threshold)?;
        validate_currency_symbol(&self.currency_symbol)?;
        Ok(())
    }

    /// Set one field from its settings key and a textual value
    pub fn set_value(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "enableOdometer" => self.enable_odometer = parse_value(key, value)?,
            "enableWarning" => self.enable_warning = parse_value(key, value)?,
            "autoPause" => self.auto_pause = parse_value(key, value)?,
            "pauseThreshold" => {
                self.pause_threshold = validate_pause_threshold(parse_value(key, value)?)?
            }
            "currencySymbol" => {
                validate_currency_symbol(value)?;
                self.currency_symbol = value.to_string();
            }
            "confirmSpoolSelection" => self.confirm_spool_selection = parse_value(key, value)?,
            "dismissResolvedWarning" => self.dismiss_resolved_warning = parse_value(key, value)?,
            "g90InfluencesExtruder" => self.g90_influences_extruder = parse_value(key, value)?,
            _ => return Err(FilamentError::invalid_setting(key, "unknown setting")),
        }
        Ok(())
    }

    /// Current value of one field, by settings key
    pub fn get_value(&self, key: &str) -> Result<serde_json::Value> {
        let value = serde_json::to_value(self)?;
        value
            .get(key)
            .cloned()
            .ok_or_else(|| FilamentError::invalid_setting(key, "unknown setting"))
    }
}

/// Get settings file path, creating the config directory if needed
pub fn get_settings_path() -> Result<PathBuf> {
    let dir = paths::user_config_dir()
        .ok_or_else(|| FilamentError::config("Could not determine config directory"))?;

    if !dir.exists() {
        fs::create_dir_all(&dir).map_err(|e| {
            FilamentError::config(format!("Failed to create config directory: {}", e))
        })?;
    }

    Ok(dir.join(paths::SETTINGS_FILE))
}

/// Load settings from the user's settings file
pub fn load_settings() -> Result<PluginSettings> {
    load_settings_from(&get_settings_path()?)
}

/// Load settings from an explicit path, defaults if the file is missing
pub fn load_settings_from(path: &Path) -> Result<PluginSettings> {
    if !path.exists() {
        tracing::debug!("No settings file at {}, using defaults", path.display());
        return Ok(PluginSettings::default());
    }

    validate_file_size(path)?;

    let content = fs::read_to_string(path).map_err(|e| FilamentError::FileRead {
        path: path.to_path_buf(),
        source: e,
    })?;

    let settings: PluginSettings = serde_json::from_str(&content).map_err(|e| {
        FilamentError::config(format!("Failed to parse settings JSON: {}", e))
    })?;
    settings.validate()?;

    Ok(settings)
}

/// Save settings to the user's settings file
pub fn save_settings(settings: &PluginSettings) -> Result<()> {
    save_settings_to(&get_settings_path()?, settings)?;
    update_cache(settings);
    Ok(())
}

/// Write settings atomically: temp file, fsync, rename
pub fn save_settings_to(path: &Path, settings: &PluginSettings) -> Result<()> {
    use std::io::Write;

    settings.validate()?;

    let json = serde_json::to_string_pretty(settings).map_err(|e| {
        FilamentError::config(format!("Failed to serialize settings: {}", e))
    })?;

    let temp_path = path.with_extension("json.tmp");
    let write_err = |e| FilamentError::FileWrite {
        path: temp_path.clone(),
        source: e,
    };

    let mut file = fs::File::create(&temp_path).map_err(write_err)?;
    file.write_all(json.as_bytes()).map_err(write_err)?;
    file.sync_all().map_err(write_err)?;
    drop(file);

    fs::rename(&temp_path, path).map_err(|e| FilamentError::FileWrite {
        path: path.to_path_buf(),
        source: e,
    })?;

    tracing::debug!("Saved settings to {}", path.display());
    Ok(())
}

/// Update the user's settings and save; nothing is written if the updater fails
pub fn update_setting<F>(updater: F) -> Result<PluginSettings>
where
    F: FnOnce(&mut PluginSettings) -> Result<()>,
{
    let mut settings = load_settings()?;
    updater(&mut settings)?;
    save_settings(&settings)?;
    Ok(settings)
}
