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

//! In-memory stand-in for the backend plugin, used when replaying scenarios

use std::collections::BTreeMap;

use fm_core::{
    validate_profile, validate_spool, BackendApi, FilamentError, Profile, Result, Spool, ToolSelection,
};
use fm_protocol::PluginMessage;

#[derive(Debug, Default)]
pub struct MemoryBackend {
    profiles: BTreeMap<u64, Profile>,
    spools: BTreeMap<u64, Spool>,
    selections: BTreeMap<usize, Option<u64>>,
    next_id: u64,
    /// Push messages the backend would have sent since the last drain
    outbox: Vec<PluginMessage>,
}

impl MemoryBackend {
    pub fn new(profiles: Vec<Profile>, spools: Vec<Spool>) -> Self {
        let mut backend = Self::default();
        for profile in profiles {
            let Some(id) = backend.seed_id(profile.id) else {
                tracing::warn!("No id left for profile '{}', skipped", profile.material);
                continue;
            };
            backend.profiles.insert(id, Profile { id: Some(id), ..profile });
        }
        for spool in spools {
            let Some(id) = backend.seed_id(spool.id) else {
                tracing::warn!("No id left for spool '{}', skipped", spool.name);
                continue;
            };
            backend.spools.insert(id, Spool { id: Some(id), ..spool });
        }
        backend
    }

    pub fn spool(&self, id: u64) -> Option<&Spool> {
        self.spools.get(&id)
    }

    /// Take the push messages queued by modifications
    pub fn drain_messages(&mut self) -> Vec<PluginMessage> {
        std::mem::take(&mut self.outbox)
    }

    fn allocate_id(&mut self) -> Result<u64> {
        let id = self.next_id.max(1);
        self.next_id = id
            .checked_add(1)
            .ok_or_else(|| FilamentError::backend("No ids left"))?;
        Ok(id)
    }

    /// Keep a preset id, or allocate one; later allocations start above it
    fn seed_id(&mut self, id: Option<u64>) -> Option<u64> {
        match id {
            Some(id) => {
                self.next_id = self.next_id.max(id.saturating_add(1));
                Some(id)
            }
            None => self.allocate_id().ok(),
        }
    }

    fn changed(&mut self, table: &str, action: &str) {
        self.outbox.push(PluginMessage::data_changed(table, action));
    }

    fn resolve(&self, spool_id: Option<u64>) -> Option<Spool> {
        spool_id.and_then(|id| self.spools.get(&id).cloned())
    }
}

impl BackendApi for MemoryBackend {
    fn list_profiles(&mut self, _force: bool) -> Result<Vec<Profile>> {
        Ok(self.profiles.values().cloned().collect())
    }

    fn add_profile(&mut self, profile: Profile) -> Result<Profile> {
        validate_profile(&profile)?;
        let id = self.allocate_id()?;
        let profile = Profile { id: Some(id), ..profile };
        self.profiles.insert(id, profile.clone());
        self.changed("profiles", "add");
        Ok(profile)
    }

    fn update_profile(&mut self, id: u64, profile: Profile) -> Result<Profile> {
        validate_profile(&profile)?;
        let slot = self
            .profiles
            .get_mut(&id)
            .ok_or_else(|| FilamentError::backend(format!("No profile with id {}", id)))?;
        *slot = Profile { id: Some(id), ..profile };
        let updated = slot.clone();
        for spool in self.spools.values_mut().filter(|s| s.profile.id == Some(id)) {
            spool.profile = updated.clone();
        }
        self.changed("profiles", "update");
        Ok(updated)
    }

    fn delete_profile(&mut self, id: u64) -> Result<()> {
        if self.spools.values().any(|s| s.profile.id == Some(id)) {
            return Err(FilamentError::backend(format!("Profile {} is still used by a spool", id)));
        }
        self.profiles.remove(&id);
        self.changed("profiles", "delete");
        Ok(())
    }

    fn list_spools(&mut self, _force: bool) -> Result<Vec<Spool>> {
        Ok(self.spools.values().cloned().collect())
    }

    fn add_spool(&mut self, spool: Spool) -> Result<Spool> {
        validate_spool(&spool)?;
        let id = self.allocate_id()?;
        let spool = Spool { id: Some(id), ..spool };
        self.spools.insert(id, spool.clone());
        self.changed("spools", "add");
        Ok(spool)
    }

    fn update_spool(&mut self, id: u64, spool: Spool) -> Result<Spool> {
        validate_spool(&spool)?;
        let slot = self
            .spools
            .get_mut(&id)
            .ok_or_else(|| FilamentError::backend(format!("No spool with id {}", id)))?;
        *slot = Spool { id: Some(id), ..spool };
        let updated = slot.clone();
        self.changed("spools", "update");
        Ok(updated)
    }

    fn delete_spool(&mut self, id: u64) -> Result<()> {
        self.spools.remove(&id);
        for selected in self.selections.values_mut() {
            if *selected == Some(id) {
                *selected = None;
            }
        }
        self.changed("spools", "delete");
        Ok(())
    }

    fn list_selections(&mut self) -> Result<Vec<ToolSelection>> {
        Ok(self
            .selections
            .iter()
            .map(|(tool, spool_id)| ToolSelection {
                tool: *tool,
                spool: self.resolve(*spool_id),
            })
            .collect())
    }

    fn update_selection(&mut self, tool: usize, spool_id: Option<u64>) -> Result<ToolSelection> {
        if let Some(id) = spool_id {
            if !self.spools.contains_key(&id) {
                return Err(FilamentError::backend(format!("No spool with id {}", id)));
            }
        }
        self.selections.insert(tool, spool_id);
        Ok(ToolSelection {
            tool,
            spool: self.resolve(spool_id),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::test_utils::{create_test_profile, create_test_spool};

    #[test]
    fn test_selection_resolves_spool() {
        let mut backend = MemoryBackend::new(vec![create_test_profile(1)], vec![create_test_spool(4, 1, 0.0)]);
        let selection = backend.update_selection(0, Some(4)).unwrap();
        assert_eq!(selection.spool.and_then(|s| s.id), Some(4));
        assert!(backend.update_selection(0, Some(99)).is_err());
    }

    #[test]
    fn test_update_spool_queues_message() {
        let mut backend = MemoryBackend::new(vec![create_test_profile(1)], vec![create_test_spool(4, 1, 0.0)]);
        let mut spool = create_test_spool(4, 1, 0.0);
        spool.used = 12.5;
        backend.update_spool(4, spool).unwrap();

        assert_eq!(backend.spool(4).map(|s| s.used), Some(12.5));
        let messages = backend.drain_messages();
        assert_eq!(messages.len(), 1);
        assert!(messages[0].requires_refresh());
        assert!(backend.drain_messages().is_empty());
    }

    #[test]
    fn test_deleting_spool_clears_selection() {
        let mut backend = MemoryBackend::new(vec![create_test_profile(1)], vec![create_test_spool(4, 1, 0.0)]);
        backend.update_selection(1, Some(4)).unwrap();
        backend.delete_spool(4).unwrap();
        let selections = backend.list_selections().unwrap();
        assert_eq!(selections.len(), 1);
        assert!(selections[0].spool.is_none());
        assert!(backend.delete_profile(1).is_ok());
    }

    #[test]
    fn test_new_ids_do_not_collide() {
        let mut backend = MemoryBackend::new(vec![create_test_profile(7)], vec![]);
        let added = backend.add_spool(create_test_spool(0, 7, 0.0)).unwrap();
        assert_eq!(added.id, Some(8));
    }

    #[test]
    fn test_largest_id_does_not_overflow() {
        let mut backend = MemoryBackend::new(vec![create_test_profile(u64::MAX)], vec![create_test_spool(3, 1, 0.0)]);
        assert!(backend.spool(3).is_some());
        let err = backend.add_spool(create_test_spool(0, 1, 0.0)).unwrap_err();
        assert!(matches!(err, FilamentError::Backend(_)));
    }
}
