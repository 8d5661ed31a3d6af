//! Filament Manager Core Library
//!
//! Filament consumption and spool-selection accounting for a 3D-printer host.
//!
//! # Features
//!
//! - **Selections**: one spool (or none) per printer tool, resized with the printer profile
//! - **Consumption**: filament length to mass for the selected spool's material
//! - **Warnings**: a single, de-duplicated notice when a job needs more than a spool holds
//! - **Print tracking**: G-code odometer, automatic pause thresholds, usage booking
//! - **Settings**: persistent plugin settings with an in-process cache
//!
//! # Module Structure
//!
//! - `data/` - Data types, defaults, validation
//! - `engine/` - Registry, consumption math, warning coordinator, odometer
//! - `accounting` - Event entry point tying the engine together
//! - `backend` - Typed client for the backend plugin
//!
//! # Example
//!
//! ```no_run
//! use fm_core::{AccountingEvent, FilamentAccounting, Notice, NoticeId, Notifier, PluginSettings};
//! use std::time::Duration;
//!
//! struct Console;
//!
//! impl Notifier for Console {
//!     fn show(&mut self, notice: &Notice) -> NoticeId {
//!         println!("{}: {}", notice.title, notice.text);
//!         1
//!     }
//!     fn remove_after(&mut self, _id: NoticeId, _delay: Duration) {}
//! }
//!
//! let mut accounting = FilamentAccounting::new(Box::new(Console), PluginSettings::default());
//! accounting.dispatch(AccountingEvent::ToolCountChanged { count: 1 }).unwrap();
//! ```

// Grouped modules
pub mod data;
pub mod engine;

// Standalone modules
pub mod accounting;
pub mod backend;
pub mod constants;
pub mod display;
pub mod error;
pub mod host;
pub mod notify;
pub mod print;
pub mod settings;

// Re-export primary types from data/
pub use data::{
    extract_tool_id, FilamentTelemetry, Profile, Spool,
    ToolConsumption, ToolSelection,
};

// Re-export validation functions from data/
pub use data::{
    validate_currency_symbol, validate_file_size, validate_pause_threshold, validate_profile,
    validate_spool, validate_tool_count,
};

// Re-export error types
pub use error::{FilamentError, Result};

// Re-export engine types
pub use engine::{
    filament_length, filament_weight, profile_weight, update_filament_usage, FilamentOdometer,
    JobTelemetry, PauseThresholds, RecomputeOutcome, SharedJob, SharedRegistry, SpoolUsage,
    ToolSelectionRegistry, WarningCoordinator, WarningState,
};

pub use accounting::{AccountingEvent, AccountingObserver, FilamentAccounting};
pub use backend::{
    book_usage, handle_plugin_message, select_spool, sync_selections, BackendApi, BackendClient,
    BackendTransport,
};
pub use host::{
    confirmation_matches, confirmation_slots, requires_confirmation, temperature_offsets,
    SpoolConfirmation,
};
pub use notify::{Notice, NoticeId, Notifier, Severity};
pub use print::{PrintAction, PrintMonitor};

// Re-export settings functions
pub use settings::{
    get_cached_settings, get_settings_path, invalidate_settings_cache, load_settings,
    load_settings_from, save_settings, save_settings_to, update_setting, PluginSettings,
    SETTING_KEYS,
};

// Re-export display formatting functions
pub use display::{
    format_cost_with_symbol, format_filament_with_weight, format_length_m,
    format_remaining, format_weight,
};
