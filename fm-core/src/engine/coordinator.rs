//! Insufficient-filament warning coordinator
//!
//! Recomputes the filament each tool of the loaded job needs, compares it to
//! what is left on the selected spools and raises at most one notice per
//! recompute.
//!
//! # De-duplication
//!
//! The host republishes job telemetry constantly and selections get
//! re-applied on every backend push. A tool is only checked again when the
//! loaded file changed, or when its snapshot (selected spool and required
//! length) differs from the one seen by the previous recompute. A warning
//! for an unchanged file and selection is therefore never repeated.

use crate::constants::warning;
use crate::data::{Spool, ToolConsumption};
use crate::engine::consumption::profile_weight;
use crate::engine::job::SharedJob;
use crate::engine::registry::SharedRegistry;
use crate::notify::{Notice, NoticeId, Notifier};
use crate::settings::PluginSettings;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WarningState {
    Idle,
    Warned(NoticeId),
}

/// Inputs that decide whether a tool needs to be checked again
#[derive(Debug, Clone, PartialEq)]
struct ToolSnapshot {
    spool: Option<Spool>,
    length: f64,
}

/// Result of one recompute
#[derive(Debug, Clone, PartialEq)]
pub struct RecomputeOutcome {
    /// One entry per tool, in tool order
    pub consumption: Vec<ToolConsumption>,
    /// First tool found short of filament in this recompute
    pub insufficient_tool: Option<usize>,
    /// Notice raised by this recompute
    pub notice: Option<NoticeId>,
    /// Notice closed because the shortage was resolved
    pub dismissed: Option<NoticeId>,
}

impl RecomputeOutcome {
    pub fn warned(&self) -> bool {
        self.notice.is_some()
    }
}

pub struct WarningCoordinator {
    registry: SharedRegistry,
    job: SharedJob,
    notifier: Box<dyn Notifier>,
    settings: PluginSettings,
    state: WarningState,
    previous_file: Option<String>,
    previous: Vec<ToolSnapshot>,
    consumption: Vec<ToolConsumption>,
}

impl WarningCoordinator {
    pub fn new(
        registry: SharedRegistry,
        job: SharedJob,
        notifier: Box<dyn Notifier>,
        settings: PluginSettings,
    ) -> Self {
        Self {
            registry,
            job,
            notifier,
            settings,
            state: WarningState::Idle,
            previous_file: None,
            previous: Vec::new(),
            consumption: Vec::new(),
        }
    }

    pub fn state(&self) -> WarningState {
        self.state
    }

    /// Consumption computed by the last recompute
    pub fn consumption(&self) -> &[ToolConsumption] {
        &self.consumption
    }

    pub fn settings(&self) -> &PluginSettings {
        &self.settings
    }

    pub fn set_settings(&mut self, settings: PluginSettings) {
        self.settings = settings;
    }

    /// The shell closed a notice (user click or timeout)
    pub fn notice_closed(&mut self, id: NoticeId) {
        if self.state == WarningState::Warned(id) {
            tracing::debug!("Warning notice {} closed", id);
            self.state = WarningState::Idle;
        }
    }

    /// Recompute consumption for every tool and warn if a spool falls short
    pub fn recompute(&mut self) -> RecomputeOutcome {
        let (filename, snapshots) = {
            let registry = self.registry.read();
            let job = self.job.read();
            let snapshots: Vec<ToolSnapshot> = registry
                .get_all()
                .iter()
                .enumerate()
                .map(|(tool, spool)| ToolSnapshot {
                    spool: spool.clone(),
                    length: job.length_for(tool),
                })
                .collect();
            (job.filename().map(str::to_string), snapshots)
        };

        let file_changed = filename != self.previous_file;
        let mut consumption = Vec::with_capacity(snapshots.len());
        let mut insufficient_tool = None;
        let mut any_short = false;

        for (tool, snapshot) in snapshots.iter().enumerate() {
            let Some(spool) = snapshot.spool.as_ref() else {
                consumption.push(ToolConsumption {
                    tool,
                    length: snapshot.length,
                    weight: 0.0,
                });
                continue;
            };

            let required = profile_weight(snapshot.length, &spool.profile);
            let remaining = spool.remaining();
            consumption.push(ToolConsumption {
                tool,
                length: snapshot.length,
                weight: required,
            });

            let short = required > remaining;
            any_short |= short;

            let unchanged = !file_changed && self.previous.get(tool) == Some(snapshot);
            if insufficient_tool.is_none() && !unchanged && short {
                tracing::info!(
                    "tool{} needs {:.2}g but only {:.2}g left on '{}'",
                    tool,
                    required,
                    remaining,
                    spool.display_name()
                );
                insufficient_tool = Some(tool);
            }
        }

        let mut notice = None;
        let mut dismissed = None;
        if self.settings.enable_warning {
            if insufficient_tool.is_some() {
                notice = Some(self.raise_warning());
            } else if !any_short && self.settings.dismiss_resolved_warning {
                dismissed = self.dismiss();
            }
        }

        self.previous_file = filename;
        self.previous = snapshots;
        self.consumption = consumption.clone();

        RecomputeOutcome {
            consumption,
            insufficient_tool,
            notice,
            dismissed,
        }
    }

    fn raise_warning(&mut self) -> NoticeId {
        if let WarningState::Warned(old) = self.state {
            self.notifier.remove_after(old, warning::REPLACE_FADE_DELAY);
        }
        let id = self.notifier.show(&Notice::insufficient_filament());
        self.state = WarningState::Warned(id);
        id
    }

    fn dismiss(&mut self) -> Option<NoticeId> {
        match self.state {
            WarningState::Warned(id) => {
                tracing::debug!("Filament shortage resolved, closing notice {}", id);
                self.notifier.remove_after(id, warning::REPLACE_FADE_DELAY);
                self.state = WarningState::Idle;
                Some(id)
            }
            WarningState::Idle => None,
        }
    }
}
