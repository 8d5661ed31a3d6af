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

//! Command Line Interface
//!
//! `fmctl` replays recorded sessions, runs the odometer on G-code files and
//! edits the plugin settings.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use fm_core::{
    format_filament_with_weight, get_cached_settings, get_settings_path, update_setting,
    FilamentOdometer, SETTING_KEYS,
};

use crate::events::replay_scenario;
use crate::{config::load_scenario, logger};

#[derive(Parser, Debug)]
#[command(name = "fmctl")]
#[command(version)]
#[command(about = "Filament Manager - filament consumption and spool accounting")]
#[command(long_about = "Filament Manager - filament consumption and spool accounting

EXAMPLES:
    fmctl check session.json           Replay a recorded session
    fmctl --json check session.json    Same, as JSON
    fmctl odometer benchy.gcode        Filament extruded per tool
    fmctl settings show                Show all settings as JSON
    fmctl settings set autoPause true

ENVIRONMENT VARIABLES:
    FM_LOG=debug           Log filter (default: info)

FILES:
    ~/.config/filamentmanager/settings.json   Plugin settings
    ~/.config/filamentmanager/logs.json       Event log (--logging)")]
#[command(propagate_version = true)]
pub struct Cli {
    /// Print results as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Append a JSON-lines event log next to the settings file
    #[arg(long, global = true)]
    pub logging: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug, PartialEq)]
pub enum Commands {
    /// Replay a recorded session and print consumption and notices
    Check {
        /// Scenario file (settings, profiles, spools, steps)
        path: PathBuf,
    },

    /// Print the filament extruded per tool by a G-code file
    Odometer {
        /// G-code file
        path: PathBuf,
    },

    /// Plugin settings
    #[command(subcommand)]
    Settings(SettingsCommands),
}

#[derive(Subcommand, Debug, PartialEq)]
pub enum SettingsCommands {
    /// Show all current settings as JSON
    Show,
    /// Get a specific setting value
    #[command(after_help = "AVAILABLE KEYS:\n  enableOdometer\n  enableWarning\n  autoPause\n  pauseThreshold\n  currencySymbol\n  confirmSpoolSelection\n  dismissResolvedWarning\n  g90InfluencesExtruder")]
    Get {
        /// Setting key (e.g., pauseThreshold)
        key: String,
    },
    /// Set a setting value
    #[command(after_help = "EXAMPLES:\n  fmctl settings set autoPause true\n  fmctl settings set pauseThreshold 250\n  fmctl settings set currencySymbol $")]
    Set(SetSettingArgs),
    /// Show settings file path
    Path,
}

#[derive(Args, Debug, PartialEq)]
pub struct SetSettingArgs {
    /// Setting key
    pub key: String,
    /// New value
    pub value: String,
}

// ============================================================================
// CLI Execution
// ============================================================================

pub fn run_cli(cli: &Cli) -> anyhow::Result<()> {
    if cli.logging {
        match logger::init_logging() {
            Some(path) => tracing::debug!("Event log at {}", path.display()),
            None => tracing::warn!("Could not open an event log file"),
        }
        logger::log_event("startup", serde_json::json!({ "command": format!("{:?}", cli.command) }));
    }

    let result = match &cli.command {
        Commands::Check { path } => cmd_check(path, cli.json),
        Commands::Odometer { path } => cmd_odometer(path, cli.json),
        Commands::Settings(sub) => cmd_settings(sub),
    };

    if let Err(err) = &result {
        logger::log_event("fatal_error", serde_json::json!({ "error": format!("{:#}", err) }));
    }
    result
}

// ============================================================================
// Check Command
// ============================================================================

fn cmd_check(path: &Path, json_output: bool) -> anyhow::Result<()> {
    let scenario = load_scenario(path).with_context(|| format!("loading {}", path.display()))?;
    let (reports, mut app) = replay_scenario(scenario)?;

    for report in &reports {
        logger::log_event(
            "step",
            serde_json::json!({ "step": report.step, "name": report.name, "notice": report.notice }),
        );
    }

    if json_output {
        let output = serde_json::json!({ "steps": reports, "spools": app.spools()? });
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    for report in &reports {
        for line in report.render() {
            println!("{}", line);
        }
    }
    let warnings = reports.iter().filter(|r| r.notice.is_some()).count();
    println!("{} step(s), {} warning(s)", reports.len(), warnings);
    for line in app.spool_summary()? {
        println!("  {}", line);
    }
    Ok(())
}

// ============================================================================
// Odometer Command
// ============================================================================

fn cmd_odometer(path: &Path, json_output: bool) -> anyhow::Result<()> {
    let program = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let settings = get_cached_settings();

    let mut odometer = FilamentOdometer::new(settings.g90_influences_extruder);
    odometer.process_program(&program);

    if json_output {
        println!("{}", serde_json::to_string_pretty(odometer.extrusion())?);
        return Ok(());
    }

    for (tool, length) in odometer.extrusion().iter().enumerate() {
        println!("tool{}: {}", tool, format_filament_with_weight(*length, None));
    }
    Ok(())
}

// ============================================================================
// Settings Commands
// ============================================================================

fn cmd_settings(cmd: &SettingsCommands) -> anyhow::Result<()> {
    match cmd {
        SettingsCommands::Show => {
            let settings = get_cached_settings();
            println!("{}", serde_json::to_string_pretty(&settings)?);
        }
        SettingsCommands::Get { key } => {
            let value = get_cached_settings()
                .get_value(key)
                .with_context(|| format!("known keys: {}", SETTING_KEYS.join(", ")))?;
            println!("{}", value);
        }
        SettingsCommands::Set(args) => {
            update_setting(|settings| settings.set_value(&args.key, &args.value))?;
            println!("Set {} = {}", args.key, args.value);
        }
        SettingsCommands::Path => {
            println!("{}", get_settings_path()?.display());
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_check_with_global_flags() {
        let cli = Cli::try_parse_from(["fmctl", "check", "session.json", "--json"]).unwrap();
        assert!(cli.json);
        assert!(!cli.logging);
        assert_eq!(cli.command, Commands::Check { path: PathBuf::from("session.json") });
    }

    #[test]
    fn test_unknown_flag_rejected() {
        assert!(Cli::try_parse_from(["fmctl", "--jsno", "check", "session.json"]).is_err());
        assert!(Cli::try_parse_from(["fmctl"]).is_err());
    }

    #[test]
    fn test_path_starting_with_dashes() {
        let cli = Cli::try_parse_from(["fmctl", "odometer", "--", "--part.gcode"]).unwrap();
        assert_eq!(cli.command, Commands::Odometer { path: PathBuf::from("--part.gcode") });
    }

    #[test]
    fn test_parse_settings_set() {
        let cli = Cli::try_parse_from(["fmctl", "settings", "set", "autoPause", "true"]).unwrap();
        assert_eq!(
            cli.command,
            Commands::Settings(SettingsCommands::Set(SetSettingArgs {
                key: "autoPause".to_string(),
                value: "true".to_string(),
            }))
        );
    }

    #[test]
    fn test_check_runs_scenario_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        fs::write(&path, r#"{"steps": [{"step": "tool_count", "count": 1}]}"#).unwrap();
        assert!(cmd_check(&path, false).is_ok());
        assert!(cmd_check(&dir.path().join("missing.json"), true).is_err());
    }
}
