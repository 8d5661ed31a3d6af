//! Telemetry of the currently loaded print job

use std::sync::Arc;

use parking_lot::RwLock;

use crate::data::FilamentTelemetry;

/// Job handle shared between the accounting front and the coordinator
pub type SharedJob = Arc<RwLock<JobTelemetry>>;

/// File identity plus the filament the host reported for it
#[derive(Debug, Clone, Default, PartialEq)]
pub struct JobTelemetry {
    filename: Option<String>,
    filament: Vec<FilamentTelemetry>,
}

impl JobTelemetry {
    pub fn shared() -> SharedJob {
        Arc::new(RwLock::new(Self::default()))
    }

    pub fn filename(&self) -> Option<&str> {
        self.filename.as_deref()
    }

    pub fn filament(&self) -> &[FilamentTelemetry] {
        &self.filament
    }

    /// Switch to another file; its telemetry is unknown until reported.
    ///
    /// Returns false if the same file is already loaded.
    pub fn set_file(&mut self, filename: Option<String>) -> bool {
        if self.filename == filename {
            return false;
        }
        self.filename = filename;
        self.filament.clear();
        true
    }

    /// Store telemetry for the current file, returns false if nothing changed
    pub fn set_filament(&mut self, filament: Vec<FilamentTelemetry>) -> bool {
        if self.filament == filament {
            return false;
        }
        self.filament = filament;
        true
    }

    /// Required length for a tool, 0 if the host reported none
    ///
    /// Entries whose label names no valid tool are never matched.
    pub fn length_for(&self, tool: usize) -> f64 {
        self.filament
            .iter()
            .find(|f| f.tool_index() == Some(tool))
            .map(|f| f.length)
            .unwrap_or(0.0)
    }

    /// Tool indices named in the telemetry, in report order
    pub fn tools(&self) -> Vec<usize> {
        self.filament.iter().filter_map(FilamentTelemetry::tool_index).collect()
    }
}
