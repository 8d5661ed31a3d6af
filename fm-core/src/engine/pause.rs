//! Automatic pause thresholds
//!
//! For each selected spool: the length of filament left on it, minus the
//! configured reserve. Once a tool has extruded that much the print should be
//! paused so the spool can be swapped before it runs dry.

use std::collections::BTreeMap;

use crate::data::ToolSelection;
use crate::engine::consumption::filament_length;
use crate::engine::odometer::FilamentOdometer;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PauseThresholds {
    thresholds: BTreeMap<usize, f64>,
}

impl PauseThresholds {
    /// Thresholds (mm) for every tool that has a spool selected
    ///
    /// Spools whose profile has a zero diameter or density get no threshold.
    pub fn compute(selections: &[ToolSelection], reserve_mm: f64) -> Self {
        let mut thresholds = BTreeMap::new();
        for selection in selections {
            let Some(spool) = selection.spool.as_ref() else {
                continue;
            };
            match filament_length(spool.remaining(), spool.profile.diameter, spool.profile.density) {
                Some(length) => {
                    thresholds.insert(selection.tool, length - reserve_mm);
                }
                None => tracing::warn!(
                    "Cannot compute pause threshold for tool{}, pause feature not available for '{}'",
                    selection.tool,
                    spool.display_name()
                ),
            }
        }
        tracing::debug!("Updated pause thresholds: {:?}", thresholds);
        Self { thresholds }
    }

    pub fn get(&self, tool: usize) -> Option<f64> {
        self.thresholds.get(&tool).copied()
    }

    pub fn is_empty(&self) -> bool {
        self.thresholds.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, f64)> + '_ {
        self.thresholds.iter().map(|(t, l)| (*t, *l))
    }

    /// True when the active tool has extruded up to its threshold
    pub fn should_pause(&self, odometer: &FilamentOdometer) -> bool {
        let tool = odometer.current_tool();
        self.get(tool)
            .is_some_and(|threshold| odometer.extrusion_for(tool) >= threshold)
    }
}
