//! In-memory store backend.

use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard};

use crate::common::error::{StoreError, StoreResult};
use crate::store::BridgeStore;

/// Link record for a bridged conversation.
#[derive(Debug, Clone)]
struct Link {
    destination: String,
    enabled: bool,
}

#[derive(Debug, Default)]
struct Tables {
    /// id -> display name
    contacts: HashMap<String, String>,
    links: HashMap<String, Link>,
    blacklist: HashSet<String>,
}

/// Store that keeps everything in process memory.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> StoreResult<MutexGuard<'_, Tables>> {
        self.tables.lock().map_err(|_| StoreError::Poisoned)
    }
}

impl BridgeStore for MemoryStore {
    fn is_blacklisted(&self, id: &str) -> StoreResult<bool> {
        Ok(self.lock()?.blacklist.contains(id))
    }

    fn get_contact(&self, id: &str) -> StoreResult<Option<String>> {
        Ok(self.lock()?.contacts.get(id).cloned())
    }

    fn add_contact(&self, name: &str, id: &str) -> StoreResult<()> {
        self.lock()?.contacts.insert(id.to_string(), name.to_string());
        Ok(())
    }

    fn remove_contact(&self, name: &str) -> StoreResult<()> {
        self.lock()?.contacts.retain(|_, n| n != name);
        Ok(())
    }

    fn replace_contact(&self, old_name: &str, new_name: &str, id: &str) -> StoreResult<()> {
        let mut tables = self.lock()?;
        tables.contacts.retain(|_, n| n != old_name);
        tables.contacts.insert(id.to_string(), new_name.to_string());
        Ok(())
    }

    fn is_bridge_enabled(&self, id: &str) -> StoreResult<bool> {
        Ok(self.lock()?.links.get(id).map(|l| l.enabled).unwrap_or(false))
    }

    fn toggle_bridge(&self, id: &str, enable: bool) -> StoreResult<Option<bool>> {
        Ok(self.lock()?.links.get_mut(id).map(|link| {
            link.enabled = enable;
            enable
        }))
    }

    fn link_destination(&self, id: &str) -> StoreResult<Option<String>> {
        Ok(self.lock()?.links.get(id).map(|l| l.destination.clone()))
    }

    fn link_chat(&self, id: &str, destination: &str) -> StoreResult<()> {
        self.lock()?.links.insert(
            id.to_string(),
            Link {
                destination: destination.to_string(),
                enabled: true,
            },
        );
        Ok(())
    }

    fn add_to_blacklist(&self, id: &str) -> StoreResult<()> {
        self.lock()?.blacklist.insert(id.to_string());
        Ok(())
    }
}
