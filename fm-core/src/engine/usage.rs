//! Booking the filament of a finished print on the selected spools

use crate::data::Spool;
use crate::engine::consumption::profile_weight;
use crate::engine::registry::ToolSelectionRegistry;

/// Filament booked on one spool
#[derive(Debug, Clone, PartialEq)]
pub struct SpoolUsage {
    pub tool: usize,
    /// mm extruded by the tool
    pub length: f64,
    /// g added to `spool.used`, after clamping
    pub weight: f64,
    /// Spool with the new `used` value, ready to send to the backend
    pub spool: Spool,
}

/// Add the extruded filament of every tool to its selected spool
///
/// Only tools both the printer and the odometer know about are booked. Usage
/// is clamped to the spool's nominal weight so `used` never exceeds it.
pub fn update_filament_usage(registry: &ToolSelectionRegistry, extrusion: &[f64]) -> Vec<SpoolUsage> {
    let tools = registry.tool_count().min(extrusion.len());
    tracing::info!(
        "Updating filament usage for {} tools (printer {}, tracked {})",
        tools,
        registry.tool_count(),
        extrusion.len()
    );

    let mut updates = Vec::new();
    for (tool, length) in extrusion.iter().copied().enumerate().take(tools) {
        let Some(spool) = registry.get_all()[tool].as_ref() else {
            tracing::warn!("No selected spool for tool{}", tool);
            continue;
        };

        let mut updated = spool.clone();
        let old_remaining = updated.remaining();
        updated.used = (updated.used + profile_weight(length, &updated.profile))
            .clamp(0.0, updated.total_weight);
        let booked = updated.used - spool.used;

        tracing::info!(
            "Updated remaining filament on spool '{}' from {:.2}g to {:.2}g ({:.2}g)",
            updated.display_name(),
            old_remaining,
            updated.remaining(),
            -booked
        );

        updates.push(SpoolUsage {
            tool,
            length,
            weight: booked,
            spool: updated,
        });
    }
    updates
}
