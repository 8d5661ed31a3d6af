//! Filament accounting engine modules
//!
//! Selection registry, consumption math, the warning coordinator and the
//! print-time helpers (odometer, pause thresholds, usage booking).

mod consumption;
mod coordinator;
mod job;
mod odometer;
mod pause;
mod registry;
mod usage;

pub use consumption::{filament_length, filament_weight, profile_weight};
pub use coordinator::{RecomputeOutcome, WarningCoordinator, WarningState};
pub use job::{JobTelemetry, SharedJob};
pub use odometer::FilamentOdometer;
pub use pause::PauseThresholds;
pub use registry::{SharedRegistry, ToolSelectionRegistry};
pub use usage::{update_filament_usage, SpoolUsage};
