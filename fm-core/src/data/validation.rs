//! Input validation for Filament Manager
//!
//! Profiles and spools are checked with the same rules the wire protocol
//! applies before a request goes out, lifted into [`FilamentError`].

use std::path::Path;

use crate::constants::{limits, pause};
use crate::data::{Profile, Spool};
use crate::error::{FilamentError, Result};

/// Validates a material definition (names present, density and diameter > 0)
pub fn validate_profile(profile: &Profile) -> Result<()> {
    fm_protocol::validate_profile(profile).map_err(FilamentError::InvalidProfile)
}

/// Validates a spool, including `0 <= used <= weight`
pub fn validate_spool(spool: &Spool) -> Result<()> {
    fm_protocol::validate_spool(spool).map_err(FilamentError::InvalidSpool)
}

/// Validates the filament reserve kept before an automatic pause (mm)
pub fn validate_pause_threshold(value: f64) -> Result<f64> {
    if !value.is_finite() || !(0.0..=pause::MAX_THRESHOLD_MM).contains(&value) {
        return Err(FilamentError::invalid_setting(
            "pauseThreshold",
            format!("must be between 0 and {} mm", pause::MAX_THRESHOLD_MM),
        ));
    }
    Ok(value)
}

/// Validates a tool count reported by the host's printer profile
pub fn validate_tool_count(count: usize) -> Result<usize> {
    if count > limits::MAX_TOOL_COUNT {
        return Err(FilamentError::config(format!(
            "tool count {} exceeds maximum of {}",
            count,
            limits::MAX_TOOL_COUNT
        )));
    }
    Ok(count)
}

pub fn validate_currency_symbol(symbol: &str) -> Result<()> {
    if symbol.chars().count() > limits::MAX_CURRENCY_SYMBOL_LEN {
        return Err(FilamentError::invalid_setting(
            "currencySymbol",
            format!("at most {} characters", limits::MAX_CURRENCY_SYMBOL_LEN),
        ));
    }
    Ok(())
}

/// Validates the size of a settings or scenario file before reading it
pub fn validate_file_size(path: &Path) -> Result<()> {
    let metadata = std::fs::metadata(path).map_err(|e| FilamentError::FileRead {
        path: path.to_path_buf(),
        source: e,
    })?;

    if metadata.len() > limits::MAX_CONFIG_FILE_SIZE {
        return Err(FilamentError::config(format!(
            "{} exceeds maximum size of {} bytes",
            path.display(),
            limits::MAX_CONFIG_FILE_SIZE
        )));
    }

    Ok(())
}
