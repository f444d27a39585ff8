//! SQLite-backed whitelist store.
//!
//! The user whitelist is a single record in a key/value `settings` table:
//! key `whitelisted_apps`, value a JSON array of package ids. A missing
//! record reads as an empty whitelist.

use kiosk_whitelist::{PackageId, SystemAllowlist, WhitelistEditor, WhitelistError, WhitelistStore};
use rusqlite::{Connection, OptionalExtension};
use std::collections::BTreeSet;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

/// Settings key holding the user whitelist.
pub const WHITELIST_KEY: &str = "whitelisted_apps";

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("database error: {0}")]
    DatabaseError(#[from] rusqlite::Error),
    #[error("serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
    #[error("database mutex poisoned")]
    Poisoned,
}

impl From<StorageError> for WhitelistError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::SerializationError(e) => WhitelistError::Corrupt(e.to_string()),
            other => WhitelistError::backend(other),
        }
    }
}

pub type Result<T> = std::result::Result<T, StorageError>;

pub struct Database {
    conn: Mutex<Connection>,
    system: SystemAllowlist,
}

impl Database {
    pub fn open(path: &Path, system: SystemAllowlist) -> Result<Self> {
        let conn = Connection::open(path)?;
        let db = Self {
            conn: Mutex::new(conn),
            system,
        };
        db.init_schema()?;
        tracing::debug!(path = %path.display(), "whitelist database opened");
        Ok(db)
    }

    pub fn open_in_memory(system: SystemAllowlist) -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Self {
            conn: Mutex::new(conn),
            system,
        };
        db.init_schema()?;
        Ok(db)
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| StorageError::Poisoned)
    }

    fn init_schema(&self) -> Result<()> {
        let conn = self.conn()?;
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS settings (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );
            "#,
        )?;
        Ok(())
    }

    pub fn get_setting(&self, key: &str) -> Result<Option<String>> {
        let conn = self.conn()?;
        let value = conn
            .query_row("SELECT value FROM settings WHERE key = ?1", [key], |row| {
                row.get(0)
            })
            .optional()?;
        Ok(value)
    }

    pub fn set_setting(&self, key: &str, value: &str) -> Result<()> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT OR REPLACE INTO settings (key, value) VALUES (?1, ?2)",
            (key, value),
        )?;
        Ok(())
    }

    pub fn delete_setting(&self, key: &str) -> Result<()> {
        let conn = self.conn()?;
        conn.execute("DELETE FROM settings WHERE key = ?1", [key])?;
        Ok(())
    }

    fn load_user_whitelist(&self) -> Result<BTreeSet<PackageId>> {
        let Some(json) = self.get_setting(WHITELIST_KEY)? else {
            return Ok(BTreeSet::new());
        };
        let stored: BTreeSet<PackageId> = serde_json::from_str(&json)?;
        Ok(stored
            .into_iter()
            .filter(|id| !self.system.contains(id))
            .collect())
    }

    fn save_user_whitelist(&self, packages: &BTreeSet<PackageId>) -> Result<()> {
        let json = serde_json::to_string(packages)?;
        self.set_setting(WHITELIST_KEY, &json)
    }
}

impl WhitelistStore for Database {
    fn system(&self) -> &SystemAllowlist {
        &self.system
    }

    fn list_user_allowed(&self) -> kiosk_whitelist::Result<BTreeSet<PackageId>> {
        Ok(self.load_user_whitelist()?)
    }
}

impl WhitelistEditor for Database {
    fn replace(&self, packages: BTreeSet<PackageId>) -> kiosk_whitelist::Result<()> {
        let packages: BTreeSet<PackageId> = packages
            .into_iter()
            .filter(|id| !self.system.contains(id))
            .collect();
        self.save_user_whitelist(&packages)?;
        tracing::info!(count = packages.len(), "user whitelist saved");
        Ok(())
    }
}
