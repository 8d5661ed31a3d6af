//! Data handed to the host printer application
//!
//! Temperature offsets of the selected spools and the spool confirmation
//! check run before a print is started or resumed.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::engine::{JobTelemetry, ToolSelectionRegistry};
use crate::settings::PluginSettings;

/// Extruder temperature offsets keyed by host tool name ("tool0", "tool1", ...)
///
/// Tools without a spool get an offset of 0 so a previous offset is cleared.
pub fn temperature_offsets(registry: &ToolSelectionRegistry) -> BTreeMap<String, f64> {
    registry
        .get_all()
        .iter()
        .enumerate()
        .map(|(tool, spool)| {
            let offset = spool.as_ref().map(|s| s.temp_offset).unwrap_or(0.0);
            (format!("tool{}", tool), offset)
        })
        .collect()
}

/// One tool's answer in the confirmation dialog
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpoolConfirmation {
    pub tool: usize,
    /// Spool the user says is loaded, `None` until chosen
    pub spool_id: Option<u64>,
}

/// Whether printing has to wait for the user to confirm the loaded spools
pub fn requires_confirmation(settings: &PluginSettings) -> bool {
    settings.confirm_spool_selection
}

/// Blank confirmations, one per tool the loaded job uses
pub fn confirmation_slots(job: &JobTelemetry) -> Vec<SpoolConfirmation> {
    job.tools()
        .into_iter()
        .map(|tool| SpoolConfirmation { tool, spool_id: None })
        .collect()
}

/// True if every confirmation names the spool selected for its tool
///
/// A confirmation for a tool the printer does not have never matches.
pub fn confirmation_matches(registry: &ToolSelectionRegistry, confirmations: &[SpoolConfirmation]) -> bool {
    confirmations.iter().all(|c| match registry.get_selection(c.tool) {
        Ok(selected) => selected.and_then(|s| s.id) == c.spool_id,
        Err(_) => false,
    })
}
