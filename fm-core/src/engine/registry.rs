//! Per-tool spool selections
//!
//! One slot per printer tool. The slot count always equals the tool count the
//! host last reported; every mutation bumps a revision counter so observers
//! can tell whether anything changed.

use std::sync::Arc;

use parking_lot::RwLock;

use crate::data::{Spool, ToolSelection};
use crate::error::{FilamentError, Result};

/// Registry handle shared between the accounting front and the coordinator
pub type SharedRegistry = Arc<RwLock<ToolSelectionRegistry>>;

#[derive(Debug, Clone, Default)]
pub struct ToolSelectionRegistry {
    slots: Vec<Option<Spool>>,
    revision: u64,
}

impl ToolSelectionRegistry {
    pub fn new(tool_count: usize) -> Self {
        Self {
            slots: vec![None; tool_count],
            revision: 0,
        }
    }

    pub fn shared(tool_count: usize) -> SharedRegistry {
        Arc::new(RwLock::new(Self::new(tool_count)))
    }

    pub fn tool_count(&self) -> usize {
        self.slots.len()
    }

    /// Bumped on every change to the selections
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Match the slot count to the printer's tool count
    ///
    /// Growing pads with empty slots, shrinking drops the highest tools.
    /// Returns false when the count is unchanged.
    pub fn resize(&mut self, tool_count: usize) -> bool {
        if tool_count == self.slots.len() {
            return false;
        }
        tracing::debug!("Resizing tool selections {} -> {}", self.slots.len(), tool_count);
        self.slots.resize(tool_count, None);
        self.revision += 1;
        true
    }

    pub fn set_selection(&mut self, tool: usize, spool: Option<Spool>) -> Result<()> {
        let tool_count = self.slots.len();
        let slot = self
            .slots
            .get_mut(tool)
            .ok_or_else(|| FilamentError::out_of_range(tool, tool_count))?;
        *slot = spool;
        self.revision += 1;
        Ok(())
    }

    pub fn get_selection(&self, tool: usize) -> Result<Option<&Spool>> {
        self.slots
            .get(tool)
            .map(Option::as_ref)
            .ok_or_else(|| FilamentError::out_of_range(tool, self.slots.len()))
    }

    /// All slots, indexed by tool
    pub fn get_all(&self) -> &[Option<Spool>] {
        &self.slots
    }

    pub fn selections(&self) -> Vec<ToolSelection> {
        self.slots
            .iter()
            .enumerate()
            .map(|(tool, spool)| ToolSelection {
                tool,
                spool: spool.clone(),
            })
            .collect()
    }

    /// Apply selections pushed by the backend
    ///
    /// Entries for tools the printer does not have are skipped. Returns true
    /// if any slot changed.
    pub fn apply_backend_selections(&mut self, selections: &[ToolSelection]) -> bool {
        let mut changed = false;
        for selection in selections {
            match self.slots.get_mut(selection.tool) {
                Some(slot) => {
                    if *slot != selection.spool {
                        *slot = selection.spool.clone();
                        changed = true;
                    }
                }
                None => tracing::debug!(
                    "Ignoring selection for tool{} (printer has {} tools)",
                    selection.tool,
                    self.slots.len()
                ),
            }
        }
        if changed {
            self.revision += 1;
        }
        changed
    }
}
