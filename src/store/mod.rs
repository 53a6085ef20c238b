//! Contact, bridge-link and blacklist persistence.
//!
//! The bridge core only talks to the [`BridgeStore`] trait. Two backends are
//! provided: [`MemoryStore`] for ephemeral runs and tests, and
//! [`SqliteStore`] for a persistent database file.

pub mod memory;
pub mod sqlite;

use tracing::info;

use crate::common::error::StoreResult;
use crate::config::StoreConfig;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

/// Key-value persistence used by the dispatcher.
///
/// Ids are bare conversation/participant ids (no protocol suffix).
pub trait BridgeStore: Send + Sync {
    /// Whether messages from this conversation must be ignored entirely.
    fn is_blacklisted(&self, id: &str) -> StoreResult<bool>;

    /// Display name saved for an id.
    fn get_contact(&self, id: &str) -> StoreResult<Option<String>>;

    /// Save a display name for an id.
    fn add_contact(&self, name: &str, id: &str) -> StoreResult<()>;

    /// Remove the contact with the given display name.
    fn remove_contact(&self, name: &str) -> StoreResult<()>;

    /// Swap `old_name` for `new_name` as one unit.
    ///
    /// Backends with transactions should override this.
    fn replace_contact(&self, old_name: &str, new_name: &str, id: &str) -> StoreResult<()> {
        self.remove_contact(old_name)?;
        self.add_contact(new_name, id)
    }

    /// Whether relaying is enabled for a conversation. Unlinked is `false`.
    fn is_bridge_enabled(&self, id: &str) -> StoreResult<bool>;

    /// Set the bridge flag. Returns `None` when the conversation has no link
    /// record, otherwise the new flag.
    fn toggle_bridge(&self, id: &str, enable: bool) -> StoreResult<Option<bool>>;

    /// Telegram chat a conversation is linked to, if any.
    fn link_destination(&self, id: &str) -> StoreResult<Option<String>>;

    /// Create (or re-point) the link record for a conversation, enabled.
    fn link_chat(&self, id: &str, destination: &str) -> StoreResult<()>;

    /// Add an id to the blacklist.
    fn add_to_blacklist(&self, id: &str) -> StoreResult<()>;
}

/// Apply the startup blacklist and link records from the config.
///
/// Links that already point at the configured chat are left alone so a
/// persisted `/bridgeOff` survives a restart.
pub fn seed(store: &dyn BridgeStore, config: &StoreConfig) -> StoreResult<()> {
    for id in &config.blacklist {
        store.add_to_blacklist(id)?;
    }
    if !config.blacklist.is_empty() {
        info!("Blacklisted {} ids", config.blacklist.len());
    }

    for link in &config.links {
        if store.link_destination(&link.wa)?.as_deref() == Some(link.tg.as_str()) {
            continue;
        }
        store.link_chat(&link.wa, &link.tg)?;
        info!("Linked {} to {}", link.wa, link.tg);
    }

    Ok(())
}
