//! Filament accounting front
//!
//! All host and backend notifications enter through [`FilamentAccounting::dispatch`],
//! one event at a time. Each event updates the selection registry or the job
//! telemetry and, when that changed anything, runs the warning coordinator.

use serde::{Deserialize, Serialize};

use crate::data::{validate_tool_count, FilamentTelemetry, Spool, ToolConsumption, ToolSelection};
use crate::engine::{
    JobTelemetry, RecomputeOutcome, SharedJob, SharedRegistry, SpoolUsage, ToolSelectionRegistry,
    WarningCoordinator, WarningState,
};
use crate::error::Result;
use crate::notify::{NoticeId, Notifier};
use crate::print::{PrintAction, PrintMonitor};
use crate::settings::PluginSettings;

/// Notification delivered to the accounting engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum AccountingEvent {
    /// The printer profile now has `count` tools
    ToolCountChanged { count: usize },
    /// The user picked a spool (or none) for a tool
    SelectionChanged { tool: usize, spool: Option<Spool> },
    /// The backend reported its current selections
    BackendSelections { selections: Vec<ToolSelection> },
    /// The host published filament telemetry for the loaded file
    TelemetryChanged { filament: Vec<FilamentTelemetry> },
    /// Another file was loaded, or the file was unloaded
    FileChanged { filename: Option<String> },
    /// The shell closed a notice
    NoticeClosed { id: NoticeId },
    SettingsChanged { settings: PluginSettings },
}

impl AccountingEvent {
    pub fn name(&self) -> &'static str {
        match self {
            AccountingEvent::ToolCountChanged { .. } => "tool_count_changed",
            AccountingEvent::SelectionChanged { .. } => "selection_changed",
            AccountingEvent::BackendSelections { .. } => "backend_selections",
            AccountingEvent::TelemetryChanged { .. } => "telemetry_changed",
            AccountingEvent::FileChanged { .. } => "file_changed",
            AccountingEvent::NoticeClosed { .. } => "notice_closed",
            AccountingEvent::SettingsChanged { .. } => "settings_changed",
        }
    }
}

/// Listener for UI parts that mirror the accounting state
pub trait AccountingObserver: Send {
    fn on_event(&mut self, _event: &AccountingEvent) {}

    fn on_recompute(&mut self, _outcome: &RecomputeOutcome) {}
}

pub struct FilamentAccounting {
    registry: SharedRegistry,
    job: SharedJob,
    coordinator: WarningCoordinator,
    print: PrintMonitor,
    observers: Vec<Box<dyn AccountingObserver>>,
}

impl FilamentAccounting {
    pub fn new(notifier: Box<dyn Notifier>, settings: PluginSettings) -> Self {
        let registry = ToolSelectionRegistry::shared(0);
        let job = JobTelemetry::shared();
        let coordinator = WarningCoordinator::new(registry.clone(), job.clone(), notifier, settings);
        Self {
            registry,
            job,
            coordinator,
            print: PrintMonitor::new(),
            observers: Vec::new(),
        }
    }

    pub fn subscribe(&mut self, observer: Box<dyn AccountingObserver>) {
        self.observers.push(observer);
    }

    pub fn registry(&self) -> SharedRegistry {
        self.registry.clone()
    }

    pub fn job(&self) -> SharedJob {
        self.job.clone()
    }

    pub fn settings(&self) -> &PluginSettings {
        self.coordinator.settings()
    }

    pub fn warning_state(&self) -> WarningState {
        self.coordinator.state()
    }

    /// Per-tool consumption from the last recompute
    pub fn consumption(&self) -> &[ToolConsumption] {
        self.coordinator.consumption()
    }

    pub fn selections(&self) -> Vec<ToolSelection> {
        self.registry.read().selections()
    }

    pub fn get_selection(&self, tool: usize) -> Result<Option<Spool>> {
        Ok(self.registry.read().get_selection(tool)?.cloned())
    }

    /// Shorthand for dispatching a [`AccountingEvent::SelectionChanged`]
    pub fn set_selection(&mut self, tool: usize, spool: Option<Spool>) -> Result<Option<RecomputeOutcome>> {
        self.dispatch(AccountingEvent::SelectionChanged { tool, spool })
    }

    /// Handle one event; returns the recompute it caused, if any
    pub fn dispatch(&mut self, event: AccountingEvent) -> Result<Option<RecomputeOutcome>> {
        tracing::debug!("Dispatching {}", event.name());

        let changed = match &event {
            AccountingEvent::ToolCountChanged { count } => {
                let count = validate_tool_count(*count)?;
                self.registry.write().resize(count)
            }
            AccountingEvent::SelectionChanged { tool, spool } => {
                self.registry.write().set_selection(*tool, spool.clone())?;
                true
            }
            AccountingEvent::BackendSelections { selections } => {
                self.registry.write().apply_backend_selections(selections)
            }
            AccountingEvent::TelemetryChanged { filament } => {
                self.job.write().set_filament(filament.clone())
            }
            AccountingEvent::FileChanged { filename } => self.job.write().set_file(filename.clone()),
            AccountingEvent::NoticeClosed { id } => {
                self.coordinator.notice_closed(*id);
                false
            }
            AccountingEvent::SettingsChanged { settings } => {
                settings.validate()?;
                self.coordinator.set_settings(settings.clone());
                let selections = self.selections();
                self.print.update_thresholds(settings, &selections);
                false
            }
        };

        let selections_changed = matches!(
            event,
            AccountingEvent::ToolCountChanged { .. }
                | AccountingEvent::SelectionChanged { .. }
                | AccountingEvent::BackendSelections { .. }
        );
        if changed && selections_changed {
            let selections = self.selections();
            self.print.update_thresholds(self.coordinator.settings(), &selections);
        }

        for observer in self.observers.iter_mut() {
            observer.on_event(&event);
        }

        if !changed {
            return Ok(None);
        }

        let outcome = self.coordinator.recompute();
        for observer in self.observers.iter_mut() {
            observer.on_recompute(&outcome);
        }
        Ok(Some(outcome))
    }

    // ------------------------------------------------------------------------
    // Print tracking
    // ------------------------------------------------------------------------

    pub fn print_monitor(&self) -> &PrintMonitor {
        &self.print
    }

    pub fn start_print(&mut self) {
        let selections = self.selections();
        let settings = self.coordinator.settings().clone();
        self.print.start(&settings, &selections);
    }

    pub fn process_gcode(&mut self, line: &str) -> PrintAction {
        self.print.process_line(line)
    }

    /// Book the print's filament; the returned spools go to the backend
    pub fn finish_print(&mut self) -> Vec<SpoolUsage> {
        let registry = self.registry.read();
        self.print.finish(&registry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Profile;
    use crate::notify::MockNotifier;
    use std::sync::{Arc, Mutex};

    fn spool(id: u64, used: f64) -> Spool {
        Spool {
            id: Some(id),
            name: "Black".to_string(),
            profile: Profile { id: Some(1), ..Profile::default() },
            used,
            ..Spool::default()
        }
    }

    fn quiet_notifier() -> Box<MockNotifier> {
        let mut notifier = MockNotifier::new();
        notifier.expect_show().returning(|_| 1);
        notifier.expect_remove_after().return_const(());
        Box::new(notifier)
    }

    #[derive(Clone, Default)]
    struct Recorder {
        events: Arc<Mutex<Vec<&'static str>>>,
        recomputes: Arc<Mutex<usize>>,
    }

    impl AccountingObserver for Recorder {
        fn on_event(&mut self, event: &AccountingEvent) {
            self.events.lock().unwrap().push(event.name());
        }

        fn on_recompute(&mut self, _outcome: &RecomputeOutcome) {
            *self.recomputes.lock().unwrap() += 1;
        }
    }

    #[test]
    fn test_unchanged_events_do_not_recompute() {
        let mut acc = FilamentAccounting::new(quiet_notifier(), PluginSettings::default());
        let recorder = Recorder::default();
        acc.subscribe(Box::new(recorder.clone()));

        assert!(acc.dispatch(AccountingEvent::ToolCountChanged { count: 1 }).unwrap().is_some());
        assert!(acc.dispatch(AccountingEvent::ToolCountChanged { count: 1 }).unwrap().is_none());

        let telemetry = AccountingEvent::TelemetryChanged {
            filament: vec![FilamentTelemetry::new("tool0", 100.0)],
        };
        assert!(acc.dispatch(telemetry.clone()).unwrap().is_some());
        assert!(acc.dispatch(telemetry).unwrap().is_none());

        assert_eq!(recorder.events.lock().unwrap().len(), 4);
        assert_eq!(*recorder.recomputes.lock().unwrap(), 2);
    }

    #[test]
    fn test_selection_out_of_range_propagates() {
        let mut acc = FilamentAccounting::new(quiet_notifier(), PluginSettings::default());
        acc.dispatch(AccountingEvent::ToolCountChanged { count: 2 }).unwrap();
        let err = acc.set_selection(5, Some(spool(1, 0.0))).unwrap_err();
        assert!(err.is_out_of_range());
        assert!(acc.get_selection(5).is_err());
    }

    #[test]
    fn test_tool_count_above_limit_keeps_registry() {
        let mut acc = FilamentAccounting::new(quiet_notifier(), PluginSettings::default());
        acc.dispatch(AccountingEvent::ToolCountChanged { count: 2 }).unwrap();
        acc.set_selection(1, Some(spool(1, 0.0))).unwrap();

        let err = acc.dispatch(AccountingEvent::ToolCountChanged { count: 65 }).unwrap_err();
        assert!(matches!(err, crate::error::FilamentError::Config(_)));
        assert_eq!(acc.registry().read().tool_count(), 2);
        assert_eq!(acc.get_selection(1).unwrap().and_then(|s| s.id), Some(1));

        assert!(acc.dispatch(AccountingEvent::ToolCountChanged { count: 64 }).unwrap().is_some());
        assert_eq!(acc.selections().len(), 64);
    }

    #[test]
    fn test_event_json_shape() {
        let event: AccountingEvent =
            serde_json::from_str(r#"{"event": "file_changed", "filename": "cube.gcode"}"#).unwrap();
        assert_eq!(
            event,
            AccountingEvent::FileChanged { filename: Some("cube.gcode".to_string()) }
        );
    }

    #[test]
    fn test_print_cycle_books_usage() {
        let mut acc = FilamentAccounting::new(quiet_notifier(), PluginSettings::default());
        acc.dispatch(AccountingEvent::ToolCountChanged { count: 1 }).unwrap();
        acc.set_selection(0, Some(spool(1, 0.0))).unwrap();

        acc.start_print();
        assert_eq!(acc.process_gcode("G1 E1000"), PrintAction::Continue);
        let usage = acc.finish_print();
        assert_eq!(usage.len(), 1);
        assert!((usage[0].spool.used - 3.0066).abs() < 0.001);
    }
}
