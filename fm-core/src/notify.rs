//! Notice side channel to the UI shell

use std::time::Duration;

use serde::Serialize;

use crate::constants::warning;

/// Identifier the shell assigned to a shown notice
pub type NoticeId = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub title: String,
    pub text: String,
    pub severity: Severity,
    /// Sticky notices stay until the user or the engine closes them
    pub sticky: bool,
}

impl Notice {
    pub fn insufficient_filament() -> Self {
        Self {
            title: warning::TITLE.to_string(),
            text: warning::TEXT.to_string(),
            severity: Severity::Warning,
            sticky: true,
        }
    }
}

/// Where notices are shown
#[cfg_attr(test, mockall::automock)]
pub trait Notifier: Send {
    /// Display a notice and return its id
    fn show(&mut self, notice: &Notice) -> NoticeId;

    /// Shorten a notice's display time and queue it for removal
    fn remove_after(&mut self, id: NoticeId, delay: Duration);
}
