//! Storage collaborator: the treatment list persisted as one JSON document
//! under a well-known key.
//!
//! The engine calls `save` synchronously after every mutation; a single
//! `INSERT OR REPLACE` keeps the write atomic from the engine's point of
//! view (no partial state is ever observable).

use rusqlite::{params, Connection, OptionalExtension};

use super::StoreError;
use crate::config::TREATMENTS_STORAGE_KEY;
use crate::models::Treatment;

/// Abstract persistence consumed by the engine.
pub trait TreatmentStore {
    /// Load the full treatment list; an empty store yields an empty list.
    fn load(&self) -> Result<Vec<Treatment>, StoreError>;
    /// Persist the full treatment list, replacing the previous snapshot.
    fn save(&self, treatments: &[Treatment]) -> Result<(), StoreError>;
}

/// SQLite-backed store.
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    pub fn new(conn: Connection) -> Self {
        Self { conn }
    }

    /// Open (and migrate) the database at `path`.
    pub fn open(path: &std::path::Path) -> Result<Self, StoreError> {
        Ok(Self::new(super::sqlite::open_database(path)?))
    }

    /// In-memory store for tests.
    pub fn in_memory() -> Result<Self, StoreError> {
        Ok(Self::new(super::sqlite::open_memory_database()?))
    }
}

impl TreatmentStore for SqliteStore {
    fn load(&self) -> Result<Vec<Treatment>, StoreError> {
        let value: Option<String> = self
            .conn
            .query_row(
                "SELECT value FROM storage WHERE key = ?1",
                params![TREATMENTS_STORAGE_KEY],
                |row| row.get(0),
            )
            .optional()?;

        match value {
            Some(json) => Ok(serde_json::from_str(&json)?),
            None => Ok(Vec::new()),
        }
    }

    fn save(&self, treatments: &[Treatment]) -> Result<(), StoreError> {
        let json = serde_json::to_string(treatments)?;
        self.conn.execute(
            "INSERT OR REPLACE INTO storage (key, value, updated_at)
             VALUES (?1, ?2, datetime('now'))",
            params![TREATMENTS_STORAGE_KEY, json],
        )?;
        Ok(())
    }
}

/// No-op store for tests and ephemeral sessions.
#[derive(Default)]
pub struct NullStore;

impl TreatmentStore for NullStore {
    fn load(&self) -> Result<Vec<Treatment>, StoreError> {
        Ok(Vec::new())
    }

    fn save(&self, _treatments: &[Treatment]) -> Result<(), StoreError> {
        Ok(())
    }
}
