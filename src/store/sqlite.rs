//! SQLite store backend.
//!
//! Schema:
//! - `contact(phone PRIMARY KEY, name)`: display names
//! - `chat(wa_group PRIMARY KEY, tg_group, bridge_enabled)`: link records
//! - `blacklist(phone PRIMARY KEY)`

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use rusqlite::{params, Connection, OptionalExtension};

use crate::common::error::{StoreError, StoreResult};
use crate::store::BridgeStore;

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS contact (
        phone TEXT PRIMARY KEY NOT NULL,
        name  TEXT NOT NULL
    );
    CREATE TABLE IF NOT EXISTS chat (
        wa_group       TEXT PRIMARY KEY NOT NULL,
        tg_group       TEXT NOT NULL,
        bridge_enabled INTEGER NOT NULL DEFAULT 1
    );
    CREATE TABLE IF NOT EXISTS blacklist (
        phone TEXT PRIMARY KEY NOT NULL
    );
";

/// Store backed by a SQLite database.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open (or create) a database at the given path.
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let path = path.as_ref();
        tracing::info!(path = %path.display(), "opening store");

        let conn = Connection::open(path)?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        Self::with_connection(conn)
    }

    /// Open a private in-memory database.
    #[cfg(test)]
    pub fn open_in_memory() -> StoreResult<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> StoreResult<Self> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> StoreResult<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| StoreError::Poisoned)
    }
}

impl BridgeStore for SqliteStore {
    fn is_blacklisted(&self, id: &str) -> StoreResult<bool> {
        let found = self
            .conn()?
            .query_row(
                "SELECT 1 FROM blacklist WHERE phone = ?1",
                params![id],
                |_| Ok(()),
            )
            .optional()?;
        Ok(found.is_some())
    }

    fn get_contact(&self, id: &str) -> StoreResult<Option<String>> {
        let name = self
            .conn()?
            .query_row(
                "SELECT name FROM contact WHERE phone = ?1",
                params![id],
                |row| row.get(0),
            )
            .optional()?;
        Ok(name)
    }

    fn add_contact(&self, name: &str, id: &str) -> StoreResult<()> {
        self.conn()?.execute(
            "INSERT OR REPLACE INTO contact (phone, name) VALUES (?1, ?2)",
            params![id, name],
        )?;
        Ok(())
    }

    fn remove_contact(&self, name: &str) -> StoreResult<()> {
        self.conn()?
            .execute("DELETE FROM contact WHERE name = ?1", params![name])?;
        Ok(())
    }

    fn replace_contact(&self, old_name: &str, new_name: &str, id: &str) -> StoreResult<()> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        tx.execute("DELETE FROM contact WHERE name = ?1", params![old_name])?;
        tx.execute(
            "INSERT OR REPLACE INTO contact (phone, name) VALUES (?1, ?2)",
            params![id, new_name],
        )?;
        tx.commit()?;
        Ok(())
    }

    fn is_bridge_enabled(&self, id: &str) -> StoreResult<bool> {
        let enabled: Option<bool> = self
            .conn()?
            .query_row(
                "SELECT bridge_enabled FROM chat WHERE wa_group = ?1",
                params![id],
                |row| row.get(0),
            )
            .optional()?;
        Ok(enabled.unwrap_or(false))
    }

    fn toggle_bridge(&self, id: &str, enable: bool) -> StoreResult<Option<bool>> {
        let updated = self.conn()?.execute(
            "UPDATE chat SET bridge_enabled = ?2 WHERE wa_group = ?1",
            params![id, enable],
        )?;
        Ok((updated > 0).then_some(enable))
    }

    fn link_destination(&self, id: &str) -> StoreResult<Option<String>> {
        let destination = self
            .conn()?
            .query_row(
                "SELECT tg_group FROM chat WHERE wa_group = ?1",
                params![id],
                |row| row.get(0),
            )
            .optional()?;
        Ok(destination)
    }

    fn link_chat(&self, id: &str, destination: &str) -> StoreResult<()> {
        self.conn()?.execute(
            "INSERT OR REPLACE INTO chat (wa_group, tg_group, bridge_enabled) VALUES (?1, ?2, 1)",
            params![id, destination],
        )?;
        Ok(())
    }

    fn add_to_blacklist(&self, id: &str) -> StoreResult<()> {
        self.conn()?.execute(
            "INSERT OR IGNORE INTO blacklist (phone) VALUES (?1)",
            params![id],
        )?;
        Ok(())
    }
}
