/*
 * Integration tests for Filament Manager
 *
 * These tests drive the accounting engine the way a host would and
 * check the replay front-end against whole recorded sessions.
 */

use std::time::Duration;

use filament_manager::config::{load_scenario, parse_scenario};
use filament_manager::events::run_scenario;
use fm_core::{
    filament_weight, load_settings_from, save_settings_to, AccountingEvent, FilamentAccounting,
    FilamentTelemetry, Notice, NoticeId, Notifier, PluginSettings, Profile, Spool, ToolSelection,
    ToolSelectionRegistry, WarningState,
};
use mockall::mock;
use serial_test::serial;

mock! {
    pub Shell {}
    impl Notifier for Shell {
        fn show(&mut self, notice: &Notice) -> NoticeId;
        fn remove_after(&mut self, id: NoticeId, delay: Duration);
    }
}

// Test utilities
fn pla() -> Profile {
    Profile {
        id: Some(1),
        vendor: "Generic".to_string(),
        material: "PLA".to_string(),
        density: 1.25,
        diameter: 1.75,
    }
}

fn spool(id: u64, used: f64) -> Spool {
    Spool {
        id: Some(id),
        name: format!("Spool {}", id),
        profile: pla(),
        cost: 20.0,
        total_weight: 1000.0,
        used,
        temp_offset: 0.0,
    }
}

fn telemetry(lengths: &[f64]) -> AccountingEvent {
    AccountingEvent::TelemetryChanged {
        filament: lengths
            .iter()
            .enumerate()
            .map(|(i, l)| FilamentTelemetry::new(format!("tool{}", i), *l))
            .collect(),
    }
}

/// Shell that expects exactly `shows` notices and numbers them from 1
fn shell(shows: usize) -> Box<MockShell> {
    let mut shell = MockShell::new();
    let mut next = 0;
    shell.expect_show().times(shows).returning(move |_| {
        next += 1;
        next
    });
    shell.expect_remove_after().return_const(());
    Box::new(shell)
}

fn accounting(tools: usize, shows: usize) -> FilamentAccounting {
    let mut acc = FilamentAccounting::new(shell(shows), PluginSettings::default());
    acc.dispatch(AccountingEvent::ToolCountChanged { count: tools }).unwrap();
    acc.dispatch(AccountingEvent::FileChanged { filename: Some("cube.gcode".to_string()) })
        .unwrap();
    acc
}

#[test]
fn test_resize_twice_matches_resize_once() {
    let mut registry = ToolSelectionRegistry::new(3);
    registry.set_selection(0, Some(spool(1, 0.0))).unwrap();
    registry.set_selection(1, Some(spool(2, 10.0))).unwrap();

    registry.resize(2);
    let once = registry.get_all().to_vec();
    assert!(!registry.resize(2));
    assert_eq!(registry.get_all(), once.as_slice());
    assert_eq!(once[0], Some(spool(1, 0.0)));
    assert_eq!(once[1], Some(spool(2, 10.0)));
}

#[test]
fn test_mass_formula() {
    // 1 m of 1.75 mm filament is 2405.28 mm³
    let weight = filament_weight(1000.0, 1.75, 1.25);
    assert!((weight - 3.0066).abs() < 1e-3, "got {}", weight);
}

#[test]
fn test_zero_length_weighs_nothing() {
    for (diameter, density) in [(1.75, 1.25), (2.85, 1.04), (0.4, 7.8), (0.0, 0.0)] {
        assert_eq!(filament_weight(0.0, diameter, density), 0.0);
    }
}

#[test]
fn test_unchanged_state_warns_once() {
    let mut acc = accounting(1, 1);
    acc.set_selection(0, Some(spool(1, 900.0))).unwrap();

    let first = acc.dispatch(telemetry(&[50000.0])).unwrap().unwrap();
    assert!(first.warned());

    // Same spool and same telemetry again: recomputes happen, notices do not
    for _ in 0..3 {
        let outcome = acc.set_selection(0, Some(spool(1, 900.0))).unwrap().unwrap();
        assert!(!outcome.warned());
    }
    assert!(acc.dispatch(telemetry(&[50000.0])).unwrap().is_none());
    assert_eq!(acc.warning_state(), WarningState::Warned(1));
}

#[test]
fn test_changed_spool_content_is_checked_again() {
    let mut acc = accounting(1, 2);
    acc.set_selection(0, Some(spool(1, 900.0))).unwrap();
    assert_eq!(acc.dispatch(telemetry(&[50000.0])).unwrap().unwrap().notice, Some(1));
    acc.dispatch(AccountingEvent::NoticeClosed { id: 1 }).unwrap();

    let pushed = |used: f64| AccountingEvent::BackendSelections {
        selections: vec![ToolSelection { tool: 0, spool: Some(spool(1, used)) }],
    };

    // Identical spool from the backend or the user: no new notice
    assert!(acc.dispatch(pushed(900.0)).unwrap().is_none());
    let outcome = acc.set_selection(0, Some(spool(1, 900.0))).unwrap().unwrap();
    assert_eq!(outcome.notice, None);

    // Same spool id after usage was booked: checked again on the same file
    let outcome = acc.dispatch(pushed(950.0)).unwrap().unwrap();
    assert_eq!(outcome.notice, Some(2));
    assert_eq!(acc.warning_state(), WarningState::Warned(2));
}

#[test]
fn test_two_short_tools_raise_one_notice() {
    let mut acc = accounting(2, 1);
    acc.set_selection(0, Some(spool(1, 990.0))).unwrap();
    acc.set_selection(1, Some(spool(2, 995.0))).unwrap();

    let outcome = acc.dispatch(telemetry(&[50000.0, 50000.0])).unwrap().unwrap();
    assert_eq!(outcome.insufficient_tool, Some(0));
    assert_eq!(outcome.notice, Some(1));
}

#[test]
fn test_tool_without_spool_never_warns() {
    let mut acc = accounting(2, 0);
    acc.set_selection(0, Some(spool(1, 0.0))).unwrap();

    let outcome = acc.dispatch(telemetry(&[1000.0, 1_000_000.0])).unwrap().unwrap();
    assert!(!outcome.warned());
    assert_eq!(outcome.consumption[1].length, 1_000_000.0);
    assert_eq!(outcome.consumption[1].weight, 0.0);
}

#[test]
fn test_get_selection_out_of_range() {
    let acc = accounting(2, 0);
    let err = acc.get_selection(5).unwrap_err();
    assert!(err.is_out_of_range());
    assert!(err.to_string().contains('5'));
}

#[test]
fn test_end_to_end_single_tool() {
    let mut acc = accounting(1, 1);
    acc.set_selection(0, Some(spool(1, 900.0))).unwrap();

    let outcome = acc.dispatch(telemetry(&[1000.0])).unwrap().unwrap();
    assert!(!outcome.warned());
    assert!((outcome.consumption[0].weight - 3.0066).abs() < 1e-3);

    let outcome = acc.dispatch(telemetry(&[50000.0])).unwrap().unwrap();
    assert!(outcome.warned());
    assert!(outcome.consumption[0].weight > 100.0);
    assert!((outcome.consumption[0].weight - 150.33).abs() < 1e-2);
}

#[test]
fn test_new_file_warns_again() {
    let mut acc = accounting(1, 2);
    acc.set_selection(0, Some(spool(1, 900.0))).unwrap();
    assert!(acc.dispatch(telemetry(&[50000.0])).unwrap().unwrap().warned());

    acc.dispatch(AccountingEvent::FileChanged { filename: Some("vase.gcode".to_string()) })
        .unwrap();
    let outcome = acc.dispatch(telemetry(&[50000.0])).unwrap().unwrap();
    assert_eq!(outcome.notice, Some(2));
}

#[test]
fn test_replay_scenario_end_to_end() {
    let data = r#"{
        "profiles": [{"id": 1, "vendor": "Generic", "material": "PLA", "density": 1.25, "diameter": 1.75}],
        "spools": [{
            "id": 7, "name": "Red",
            "profile": {"id": 1, "vendor": "Generic", "material": "PLA", "density": 1.25, "diameter": 1.75},
            "weight": 1000, "used": 900
        }],
        "steps": [
            {"step": "tool_count", "count": 1},
            {"step": "select", "tool": 0, "spool": 7},
            {"step": "file", "name": "cube.gcode"},
            {"step": "telemetry", "filament": [{"toolName": "tool0", "length": 1000}]},
            {"step": "telemetry", "filament": [{"toolName": "tool0", "length": 50000}]},
            {"step": "telemetry", "filament": [{"toolName": "tool0", "length": 50000}]}
        ]
    }"#;

    let reports = run_scenario(parse_scenario(data).unwrap()).unwrap();
    let notices: Vec<_> = reports.iter().filter_map(|r| r.notice).collect();
    assert_eq!(notices, vec![1]);
    assert_eq!(reports[4].notice, Some(1));
    assert!(reports[3].render()[1].contains("1.00m / 3.01g"));
}

#[test]
fn test_scenario_rejects_unknown_spool() {
    let data = r#"{"steps": [{"step": "select", "tool": 0, "spool": 3}]}"#;
    assert!(parse_scenario(data).is_err());
}

#[test]
fn test_load_scenario_from_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("session.json");
    std::fs::write(&path, r#"{"steps": [{"step": "tool_count", "count": 2}]}"#).unwrap();

    let scenario = load_scenario(&path).unwrap();
    assert_eq!(scenario.steps.len(), 1);
    assert_eq!(scenario.settings, PluginSettings::default());
}

#[test]
#[serial]
fn test_settings_persist_and_reload() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("settings.json");

    let settings = PluginSettings {
        auto_pause: true,
        pause_threshold: 250.0,
        currency_symbol: "$".to_string(),
        ..PluginSettings::default()
    };
    save_settings_to(&path, &settings).unwrap();
    assert_eq!(load_settings_from(&path).unwrap(), settings);
}
