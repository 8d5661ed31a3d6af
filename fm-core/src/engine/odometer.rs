//! G-code filament odometer
//!
//! Follows the extruder position of every tool through the G-code sent to
//! the printer and keeps the largest extruded length seen per tool, so
//! retractions at the end of a print do not reduce the booked amount.

use std::sync::OnceLock;

use regex::Regex;

/// Command letter and number, with or without a space before the parameters
fn code_regex() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^([GMTgmt])(\d+)").ok()).as_ref()
}

fn e_param_regex() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)E\s*(-?\d*\.?\d+)").ok())
        .as_ref()
}

#[derive(Debug, Clone)]
pub struct FilamentOdometer {
    g90_influences_extruder: bool,
    relative_mode: bool,
    relative_extrusion: bool,
    current_tool: usize,
    last_extrusion: Vec<f64>,
    total_extrusion: Vec<f64>,
    max_extrusion: Vec<f64>,
}

impl Default for FilamentOdometer {
    fn default() -> Self {
        Self::new(true)
    }
}

impl FilamentOdometer {
    pub fn new(g90_influences_extruder: bool) -> Self {
        Self {
            g90_influences_extruder,
            relative_mode: false,
            relative_extrusion: false,
            current_tool: 0,
            last_extrusion: vec![0.0],
            total_extrusion: vec![0.0],
            max_extrusion: vec![0.0],
        }
    }

    pub fn set_g90_influences_extruder(&mut self, value: bool) {
        self.g90_influences_extruder = value;
    }

    /// Forget everything, called when a new print starts
    pub fn reset(&mut self) {
        *self = Self::new(self.g90_influences_extruder);
    }

    pub fn current_tool(&self) -> usize {
        self.current_tool
    }

    /// Largest extruded length per tool, mm
    pub fn extrusion(&self) -> &[f64] {
        &self.max_extrusion
    }

    /// Largest extruded length of a tool, 0 for tools never selected
    pub fn extrusion_for(&self, tool: usize) -> f64 {
        self.max_extrusion.get(tool).copied().unwrap_or(0.0)
    }

    /// Feed one line of G-code; comments and blank lines are ignored
    pub fn process_line(&mut self, line: &str) {
        let cmd = line.split(';').next().unwrap_or("").trim();
        let Some((letter, number, params)) = split_code(cmd) else {
            return;
        };

        match (letter, number) {
            ('G', 0) | ('G', 1) => {
                if let Some(e) = parse_e(params) {
                    self.extrude(e);
                }
            }
            ('G', 90) => {
                self.relative_mode = false;
                if self.g90_influences_extruder {
                    self.relative_extrusion = false;
                }
            }
            ('G', 91) => {
                self.relative_mode = true;
                if self.g90_influences_extruder {
                    self.relative_extrusion = true;
                }
            }
            ('G', 92) => {
                if let Some(e) = parse_e(params) {
                    self.last_extrusion[self.current_tool] = e;
                }
            }
            ('M', 82) => self.relative_extrusion = false,
            ('M', 83) => self.relative_extrusion = true,
            ('T', tool) if tool < crate::constants::limits::MAX_TOOL_COUNT => self.select_tool(tool),
            _ => {}
        }
    }

    /// Feed a whole G-code program
    pub fn process_program(&mut self, program: &str) {
        for line in program.lines() {
            self.process_line(line);
        }
    }

    fn absolute_extrusion(&self) -> bool {
        if self.g90_influences_extruder {
            !self.relative_extrusion
        } else {
            !self.relative_mode && !self.relative_extrusion
        }
    }

    fn extrude(&mut self, e: f64) {
        let tool = self.current_tool;
        let delta = if self.absolute_extrusion() {
            e - self.last_extrusion[tool]
        } else {
            e
        };
        self.total_extrusion[tool] += delta;
        self.last_extrusion[tool] += delta;
        self.max_extrusion[tool] = self.max_extrusion[tool].max(self.total_extrusion[tool]);
    }

    fn select_tool(&mut self, tool: usize) {
        if tool >= self.last_extrusion.len() {
            self.last_extrusion.resize(tool + 1, 0.0);
            self.total_extrusion.resize(tool + 1, 0.0);
            self.max_extrusion.resize(tool + 1, 0.0);
        }
        self.current_tool = tool;
    }
}

/// Split `G1X10E5` into `('G', 1, "X10E5")`; the parameters keep any leading space
fn split_code(cmd: &str) -> Option<(char, usize, &str)> {
    let caps = code_regex()?.captures(cmd)?;
    let letter = caps.get(1)?.as_str().chars().next()?.to_ascii_uppercase();
    let number = caps.get(2)?.as_str().parse().ok()?;
    let end = caps.get(0)?.end();
    Some((letter, number, &cmd[end..]))
}

fn parse_e(params: &str) -> Option<f64> {
    e_param_regex()?
        .captures(params)
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse().ok())
}
