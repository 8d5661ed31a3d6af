//! Print-time tracking
//!
//! While a print runs the host forwards every G-code line. The monitor feeds
//! them to the odometer, tells the host when to pause, and books the
//! extruded filament on the selected spools once the print ends.

use crate::data::ToolSelection;
use crate::engine::{
    update_filament_usage, FilamentOdometer, PauseThresholds, SpoolUsage, ToolSelectionRegistry,
};
use crate::settings::PluginSettings;

/// What the host should do after a G-code line was sent
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrintAction {
    Continue,
    /// The active tool reached its pause threshold
    Pause { tool: usize },
}

#[derive(Debug, Clone, Default)]
pub struct PrintMonitor {
    odometer: FilamentOdometer,
    thresholds: PauseThresholds,
    odometer_enabled: bool,
    pause_enabled: bool,
    printing: bool,
}

impl PrintMonitor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_printing(&self) -> bool {
        self.printing
    }

    pub fn odometer(&self) -> &FilamentOdometer {
        &self.odometer
    }

    pub fn thresholds(&self) -> &PauseThresholds {
        &self.thresholds
    }

    /// Start tracking a new print with the current settings and selections
    pub fn start(&mut self, settings: &PluginSettings, selections: &[ToolSelection]) {
        self.odometer = FilamentOdometer::new(settings.g90_influences_extruder);
        self.odometer_enabled = settings.enable_odometer;
        self.pause_enabled = settings.auto_pause;
        self.printing = true;
        self.update_thresholds(settings, selections);

        tracing::debug!(
            "Print started, odometer {}, auto pause {}",
            if self.odometer_enabled { "on" } else { "off" },
            if self.pause_enabled && self.odometer_enabled { "on" } else { "off" }
        );
    }

    /// Recalculate thresholds after spools, selections or the reserve changed
    pub fn update_thresholds(&mut self, settings: &PluginSettings, selections: &[ToolSelection]) {
        self.thresholds = PauseThresholds::compute(selections, settings.pause_threshold);
    }

    pub fn process_line(&mut self, line: &str) -> PrintAction {
        if !self.printing || !self.odometer_enabled {
            return PrintAction::Continue;
        }

        self.odometer.process_line(line);

        if self.pause_enabled && self.thresholds.should_pause(&self.odometer) {
            let tool = self.odometer.current_tool();
            tracing::info!("Filament is running out on tool{}, pausing print", tool);
            return PrintAction::Pause { tool };
        }
        PrintAction::Continue
    }

    /// End of print (done, failed or cancelled)
    ///
    /// Returns the spools with their new usage, empty when the odometer was
    /// off or no print was running.
    pub fn finish(&mut self, registry: &ToolSelectionRegistry) -> Vec<SpoolUsage> {
        if !self.printing {
            return Vec::new();
        }
        self.printing = false;
        if !self.odometer_enabled {
            return Vec::new();
        }
        update_filament_usage(registry, self.odometer.extrusion())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{Profile, Spool};

    fn registry_with_spool() -> ToolSelectionRegistry {
        let mut reg = ToolSelectionRegistry::new(1);
        reg.set_selection(
            0,
            Some(Spool {
                id: Some(1),
                profile: Profile { id: Some(1), ..Profile::default() },
                used: 997.0,
                ..Spool::default()
            }),
        )
        .unwrap();
        reg
    }

    #[test]
    fn test_pause_when_spool_runs_low() {
        let reg = registry_with_spool();
        let settings = PluginSettings {
            auto_pause: true,
            pause_threshold: 100.0,
            ..PluginSettings::default()
        };

        let mut monitor = PrintMonitor::new();
        monitor.start(&settings, &reg.selections());
        // 3 g left is just under 1000 mm of 1.75 mm PLA-like filament
        assert_eq!(monitor.process_line("G1 X10 E500"), PrintAction::Continue);
        assert_eq!(monitor.process_line("G1 X20 E950"), PrintAction::Pause { tool: 0 });
    }

    #[test]
    fn test_no_pause_when_disabled() {
        let reg = registry_with_spool();
        let mut monitor = PrintMonitor::new();
        monitor.start(&PluginSettings::default(), &reg.selections());
        assert_eq!(monitor.process_line("G1 E5000"), PrintAction::Continue);
    }

    #[test]
    fn test_finish_books_usage_once() {
        let reg = registry_with_spool();
        let mut monitor = PrintMonitor::new();
        monitor.start(&PluginSettings::default(), &reg.selections());
        monitor.process_line("G1 E500");

        let usage = monitor.finish(&reg);
        assert_eq!(usage.len(), 1);
        assert!(usage[0].spool.used > 998.0);
        assert!(monitor.finish(&reg).is_empty());
    }

    #[test]
    fn test_odometer_disabled_books_nothing() {
        let reg = registry_with_spool();
        let settings = PluginSettings {
            enable_odometer: false,
            ..PluginSettings::default()
        };
        let mut monitor = PrintMonitor::new();
        monitor.start(&settings, &reg.selections());
        monitor.process_line("G1 E500");
        assert_eq!(monitor.odometer().extrusion_for(0), 0.0);
        assert!(monitor.finish(&reg).is_empty());
    }
}
