//! Error types, re-exported from `fm-error` for the engine and the CLI

pub use fm_error::{FilamentError, Result};
