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

use fm_core::{
    book_usage, confirmation_matches, confirmation_slots, handle_plugin_message,
    requires_confirmation, select_spool, temperature_offsets, AccountingEvent, PrintAction,
    RecomputeOutcome,
};

use crate::app::{App, StepReport};
use crate::backend::MemoryBackend;
use crate::config::{Scenario, ScenarioError, ScenarioStep};

impl ScenarioStep {
    pub fn name(&self) -> &'static str {
        match self {
            ScenarioStep::ToolCount { .. } => "tool_count",
            ScenarioStep::Select { .. } => "select",
            ScenarioStep::File { .. } => "file",
            ScenarioStep::Telemetry { .. } => "telemetry",
            ScenarioStep::CloseNotice { .. } => "close_notice",
            ScenarioStep::Confirm { .. } => "confirm",
            ScenarioStep::Print { .. } => "print",
        }
    }
}

/// Replay a whole scenario, one report per step
pub fn run_scenario(scenario: Scenario) -> Result<Vec<StepReport>, ScenarioError> {
    replay_scenario(scenario).map(|(reports, _)| reports)
}

/// Like [`run_scenario`], also returning the app in its final state
pub fn replay_scenario(scenario: Scenario) -> Result<(Vec<StepReport>, App), ScenarioError> {
    let backend = MemoryBackend::new(scenario.profiles, scenario.spools);
    let mut app = App::new(scenario.settings, backend);
    let reports = scenario
        .steps
        .iter()
        .enumerate()
        .map(|(i, step)| run_step(&mut app, i + 1, step))
        .collect::<Result<Vec<_>, _>>()?;
    Ok((reports, app))
}

pub fn run_step(app: &mut App, index: usize, step: &ScenarioStep) -> Result<StepReport, ScenarioError> {
    tracing::debug!("Step #{}: {}", index, step.name());

    let mut details = Vec::new();
    let outcome = match step {
        ScenarioStep::ToolCount { count } => {
            app.accounting.dispatch(AccountingEvent::ToolCountChanged { count: *count })?
        }
        ScenarioStep::Select { tool, spool } => {
            let outcome = select_spool(&mut app.backend, &mut app.accounting, *tool, *spool)?;
            details.push(format_offsets(app));
            outcome
        }
        ScenarioStep::File { name } => {
            app.accounting.dispatch(AccountingEvent::FileChanged { filename: name.clone() })?
        }
        ScenarioStep::Telemetry { filament } => app
            .accounting
            .dispatch(AccountingEvent::TelemetryChanged { filament: filament.clone() })?,
        ScenarioStep::CloseNotice { id } => {
            app.accounting.dispatch(AccountingEvent::NoticeClosed { id: *id })?
        }
        ScenarioStep::Confirm { spools } => {
            details.push(confirm(app, spools));
            None
        }
        ScenarioStep::Print { gcode } => run_print(app, gcode, &mut details)?,
    };

    let mut report = StepReport::new(index, step.name(), outcome.as_ref());
    report.details = details;
    Ok(report)
}

fn format_offsets(app: &App) -> String {
    let registry = app.accounting.registry();
    let offsets = temperature_offsets(&registry.read());
    let parts: Vec<String> = offsets.iter().map(|(tool, offset)| format!("{}={}", tool, offset)).collect();
    format!("temperature offsets: {}", parts.join(", "))
}

fn confirm(app: &App, spools: &[Option<u64>]) -> String {
    if !requires_confirmation(app.accounting.settings()) {
        return "confirmation not required".to_string();
    }

    let mut slots = confirmation_slots(&app.accounting.job().read());
    for (slot, spool_id) in slots.iter_mut().zip(spools) {
        slot.spool_id = *spool_id;
    }

    let registry = app.accounting.registry();
    if confirmation_matches(&registry.read(), &slots) {
        "spool selection confirmed".to_string()
    } else {
        "spool selection does not match".to_string()
    }
}

fn run_print(
    app: &mut App,
    gcode: &str,
    details: &mut Vec<String>,
) -> Result<Option<RecomputeOutcome>, ScenarioError> {
    app.accounting.start_print();

    let mut paused = false;
    for (n, line) in gcode.lines().enumerate() {
        if let PrintAction::Pause { tool } = app.accounting.process_gcode(line) {
            if !paused {
                details.push(format!("pause requested for tool{} at line {}", tool, n + 1));
                paused = true;
            }
        }
    }

    let usage = app.accounting.finish_print();
    for entry in &usage {
        details.push(format!(
            "tool{}: {:.2}mm, {:.2}g booked on '{}'",
            entry.tool,
            entry.length,
            entry.weight,
            entry.spool.display_name()
        ));
    }
    book_usage(&mut app.backend, &usage)?;

    let mut outcome = None;
    for message in app.backend.drain_messages() {
        if let Some(o) = handle_plugin_message(&mut app.backend, &mut app.accounting, &message)? {
            outcome = Some(o);
        }
    }
    Ok(outcome)
}
