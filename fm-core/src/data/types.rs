//! Core data types for Filament Manager
//!
//! Profiles, spools and selections come straight from the wire protocol;
//! this module adds the types that only live inside the engine.

use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

pub use fm_protocol::{Profile, Spool, ToolSelection};

/// Filament usage reported by the host for one tool of the loaded file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilamentTelemetry {
    /// Host label such as "tool0", the index is embedded in the name
    pub tool_name: String,
    /// mm of filament needed by the sliced model, 0 if unknown
    #[serde(default)]
    pub length: f64,
}

impl FilamentTelemetry {
    pub fn new(tool_name: impl Into<String>, length: f64) -> Self {
        Self {
            tool_name: tool_name.into(),
            length,
        }
    }

    /// None when the label names an index too large to be a tool
    pub fn tool_index(&self) -> Option<usize> {
        extract_tool_id(&self.tool_name)
    }
}

/// Required filament for one tool, as shown in the sidebar
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ToolConsumption {
    pub tool: usize,
    /// mm
    pub length: f64,
    /// g, 0 when no spool is selected for the tool
    pub weight: f64,
}

impl ToolConsumption {
    pub fn display(&self) -> String {
        crate::display::format_filament_with_weight(self.length, Some(self.weight))
    }
}

fn tool_id_regex() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(\d+)").ok()).as_ref()
}

/// Tool index embedded in a host tool label
///
/// The first run of digits wins and labels without digits map to tool 0.
/// An index that does not fit a `usize` names no tool.
pub fn extract_tool_id(name: &str) -> Option<usize> {
    match tool_id_regex()?.find(name) {
        Some(m) => m.as_str().parse().ok(),
        None => Some(0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_tool_id() {
        assert_eq!(extract_tool_id("tool0"), Some(0));
        assert_eq!(extract_tool_id("tool3"), Some(3));
        assert_eq!(extract_tool_id("Tool 12 (left)"), Some(12));
        assert_eq!(extract_tool_id("extruder"), Some(0));
        assert_eq!(extract_tool_id(""), Some(0));
        assert_eq!(extract_tool_id("tool99999999999999999999999"), None);
    }

    #[test]
    fn test_telemetry_missing_length_defaults_to_zero() {
        let t: FilamentTelemetry = serde_json::from_str(r#"{"toolName": "tool1"}"#).unwrap();
        assert_eq!(t.length, 0.0);
        assert_eq!(t.tool_index(), Some(1));
    }
}
