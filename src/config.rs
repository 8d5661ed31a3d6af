/*
 * This file is part of Filament Manager.
 *
 * Copyright (C) 2025 Filament Manager contributors
 *
 * Filament Manager is free software: you can redistribute it and/or modify
 * it under the terms of the GNU General Public License as published by
 * the Free Software Foundation, either version 3 of the License, or
 * (at your option) any later version.
 *
 * Filament Manager is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
 * GNU General Public License for more details.
 *
 * You should have received a copy of the GNU General Public License
 * along with Filament Manager. If not, see <https://www.gnu.org/licenses/>.
 */

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use fm_core::{validate_file_size, validate_profile, validate_spool, FilamentTelemetry, PluginSettings, Profile, Spool};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScenarioError {
    #[error(transparent)]
    Core(#[from] fm_core::FilamentError),
    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Invalid scenario: {0}")]
    Invalid(String),
}

/// One step of a replayed session, in the order the host would deliver it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "step", rename_all = "snake_case")]
pub enum ScenarioStep {
    /// Printer profile switched to `count` tools
    ToolCount { count: usize },
    /// User picks a spool by id (or clears the tool) through the backend
    Select { tool: usize, spool: Option<u64> },
    /// File loaded in the host, `null` unloads it
    File { name: Option<String> },
    /// Filament analysis of the loaded file
    Telemetry { filament: Vec<FilamentTelemetry> },
    /// The user closed a notice
    CloseNotice { id: u64 },
    /// User answers the spool confirmation dialog, one spool id per job tool
    Confirm { spools: Vec<Option<u64>> },
    /// Run a print: G-code lines go through the odometer, usage is booked at the end
    Print { gcode: String },
}

/// A recorded session: what the backend holds and what the host reports
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Scenario {
    #[serde(default)]
    pub settings: PluginSettings,
    #[serde(default)]
    pub profiles: Vec<Profile>,
    #[serde(default)]
    pub spools: Vec<Spool>,
    pub steps: Vec<ScenarioStep>,
}

pub fn load_scenario(path: &Path) -> Result<Scenario, ScenarioError> {
    validate_file_size(path)?;
    let data = fs::read_to_string(path).map_err(|e| fm_core::FilamentError::FileRead {
        path: path.to_path_buf(),
        source: e,
    })?;
    parse_scenario(&data)
}

pub fn parse_scenario(data: &str) -> Result<Scenario, ScenarioError> {
    let scenario: Scenario = serde_json::from_str(data)?;
    validate_scenario(&scenario)?;
    Ok(scenario)
}

/// The backend allocates new ids above the largest one in use
fn check_id(kind: &str, id: u64) -> Result<(), ScenarioError> {
    if id == u64::MAX {
        return Err(ScenarioError::Invalid(format!("{} id {} is out of range", kind, id)));
    }
    Ok(())
}

pub fn validate_scenario(scenario: &Scenario) -> Result<(), ScenarioError> {
    scenario.settings.validate()?;

    let mut profile_ids = HashSet::new();
    for profile in &scenario.profiles {
        validate_profile(profile)?;
        let id = profile
            .id
            .ok_or_else(|| ScenarioError::Invalid(format!("profile '{}' has no id", profile.material)))?;
        check_id("profile", id)?;
        if !profile_ids.insert(id) {
            return Err(ScenarioError::Invalid(format!("duplicate profile id {}", id)));
        }
    }

    let mut spool_ids = HashSet::new();
    for spool in &scenario.spools {
        validate_spool(spool)?;
        let id = spool
            .id
            .ok_or_else(|| ScenarioError::Invalid(format!("spool '{}' has no id", spool.name)))?;
        check_id("spool", id)?;
        if !spool_ids.insert(id) {
            return Err(ScenarioError::Invalid(format!("duplicate spool id {}", id)));
        }
    }

    for (i, step) in scenario.steps.iter().enumerate() {
        if let ScenarioStep::Select { spool: Some(id), .. } = step {
            if !spool_ids.contains(id) {
                return Err(ScenarioError::Invalid(format!(
                    "step #{} selects unknown spool {}",
                    i + 1,
                    id
                )));
            }
        }
    }
    Ok(())
}
