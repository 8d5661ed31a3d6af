/*
 * This file is part of Filament Manager.
 *
 * Copyright (C) 2025 Filament Manager contributors
 *
 * Filament Manager is free software: you can redistribute it and/or modify
 * it under the terms of the GNU General Public License as published by
 * the Free Software Foundation, either version 3 of the License, or
 * (at your option) any later version.
 *
 * Filament Manager is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
 * GNU General Public License for more details.
 *
 * You should have received a copy of the GNU General Public License
 * along with Filament Manager. If not, see <https://www.gnu.org/licenses/>.
 */

use std::sync::{Arc, Mutex};
use std::time::Duration;

use fm_core::{
    format_cost_with_symbol, format_remaining, BackendApi, FilamentAccounting, Notice, NoticeId,
    Notifier, PluginSettings, RecomputeOutcome, Result, Spool, ToolConsumption,
};
use serde::Serialize;

use crate::backend::MemoryBackend;

/// What happened to a notice while replaying
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NoticeRecord {
    Shown { id: NoticeId, notice: Notice },
    Removed { id: NoticeId, delay_ms: u64 },
}

pub type NoticeLog = Arc<Mutex<Vec<NoticeRecord>>>;

/// Notifier that records notices instead of drawing them
pub struct RecordingNotifier {
    log: NoticeLog,
    next_id: NoticeId,
}

impl RecordingNotifier {
    pub fn new(log: NoticeLog) -> Self {
        Self { log, next_id: 1 }
    }

    fn record(&self, record: NoticeRecord) {
        if let Ok(mut guard) = self.log.lock() {
            guard.push(record);
        }
    }
}

impl Notifier for RecordingNotifier {
    fn show(&mut self, notice: &Notice) -> NoticeId {
        let id = self.next_id;
        self.next_id += 1;
        tracing::warn!("{}: {}", notice.title, notice.text);
        self.record(NoticeRecord::Shown {
            id,
            notice: notice.clone(),
        });
        id
    }

    fn remove_after(&mut self, id: NoticeId, delay: Duration) {
        tracing::debug!("Removing notice {} after {:?}", id, delay);
        self.record(NoticeRecord::Removed {
            id,
            delay_ms: delay.as_millis() as u64,
        });
    }
}

/// Replay state: the accounting engine wired to an in-memory backend
pub struct App {
    pub accounting: FilamentAccounting,
    pub backend: MemoryBackend,
    pub notices: NoticeLog,
}

impl App {
    pub fn new(settings: PluginSettings, backend: MemoryBackend) -> Self {
        let notices: NoticeLog = Arc::new(Mutex::new(Vec::new()));
        let notifier = RecordingNotifier::new(notices.clone());
        let accounting = FilamentAccounting::new(Box::new(notifier), settings);
        Self {
            accounting,
            backend,
            notices,
        }
    }

    /// Notices shown so far
    pub fn shown_notices(&self) -> Vec<NoticeId> {
        self.notices
            .lock()
            .map(|log| {
                log.iter()
                    .filter_map(|r| match r {
                        NoticeRecord::Shown { id, .. } => Some(*id),
                        NoticeRecord::Removed { .. } => None,
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn consumption(&self) -> Vec<ToolConsumption> {
        self.accounting.consumption().to_vec()
    }

    pub fn spools(&mut self) -> Result<Vec<Spool>> {
        self.backend.list_spools(false)
    }

    /// One line per backend spool: what is left on it and what it cost
    pub fn spool_summary(&mut self) -> Result<Vec<String>> {
        let symbol = self.accounting.settings().currency_symbol.clone();
        Ok(self
            .spools()?
            .iter()
            .map(|spool| {
                format!(
                    "{}: {} left, {}",
                    spool.display_name(),
                    format_remaining(spool),
                    format_cost_with_symbol(spool.cost, &symbol)
                )
            })
            .collect())
    }
}

/// Result of one replayed step, as printed by `fmctl check`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StepReport {
    pub step: usize,
    pub name: &'static str,
    pub consumption: Vec<ToolConsumption>,
    pub notice: Option<NoticeId>,
    pub dismissed: Option<NoticeId>,
    /// Extra information (confirmation result, booked usage, pauses)
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub details: Vec<String>,
}

impl StepReport {
    pub fn new(step: usize, name: &'static str, outcome: Option<&RecomputeOutcome>) -> Self {
        Self {
            step,
            name,
            consumption: outcome.map(|o| o.consumption.clone()).unwrap_or_default(),
            notice: outcome.and_then(|o| o.notice),
            dismissed: outcome.and_then(|o| o.dismissed),
            details: Vec::new(),
        }
    }

    /// Human readable lines for the console
    pub fn render(&self) -> Vec<String> {
        let mut lines = vec![format!("[{}] {}", self.step, self.name)];
        for c in &self.consumption {
            lines.push(format!("    Filament (tool{}): {}", c.tool, c.display()));
        }
        if let Some(id) = self.notice {
            lines.push(format!("    ! {} (notice {})", fm_core::constants::warning::TITLE, id));
        }
        if let Some(id) = self.dismissed {
            lines.push(format!("    notice {} dismissed", id));
        }
        for detail in &self.details {
            lines.push(format!("    {}", detail));
        }
        lines
    }
}
