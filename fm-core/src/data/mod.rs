//! Data types and validation modules
//!
//! Contains the filament data model shared by the engine and the front-ends.

mod types;
mod validation;

pub use types::{
    extract_tool_id, FilamentTelemetry, Profile, Spool, ToolConsumption, ToolSelection,
};
pub use validation::{
    validate_currency_symbol, validate_file_size, validate_pause_threshold, validate_profile,
    validate_spool, validate_tool_count,
};
