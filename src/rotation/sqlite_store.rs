//! SQLite-backed entry store.

use super::entry_store::EntryStore;
use super::models::{Entry, RunAudit};
use super::schema::ROTATION_SCHEMA;
use anyhow::{Context, Result};
use rusqlite::{params, Connection};
use std::collections::HashSet;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing::info;

/// Durable entry store keeping history, queue and run audits in a
/// single SQLite database.
pub struct SqliteEntryStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteEntryStore {
    /// Open an existing database (validating its schema) or create a
    /// new one at the given path.
    pub fn new<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        let conn = if db_path.as_ref().exists() {
            let conn = Connection::open(&db_path)?;
            ROTATION_SCHEMA
                .validate(&conn)
                .with_context(|| format!("Schema validation failed for {:?}", db_path.as_ref()))?;
            conn
        } else {
            let conn = Connection::open(&db_path)?;
            ROTATION_SCHEMA.create(&conn)?;
            info!("Created new rotation database at {:?}", db_path.as_ref());
            conn
        };
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// In-memory store, for tests.
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        ROTATION_SCHEMA.create(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }
}

impl EntryStore for SqliteEntryStore {
    fn append_history(&self, list_id: &str, entries: &[Entry]) -> Result<()> {
        if entries.is_empty() {
            return Ok(());
        }
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO rotation_history (list_id, category, performer, title, item_id)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
            )?;
            for entry in entries {
                stmt.execute(params![
                    list_id,
                    entry.category,
                    entry.performer,
                    entry.title,
                    entry.item_id,
                ])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    fn history_entries(&self, list_id: &str) -> Result<Vec<Entry>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT category, performer, title, item_id FROM rotation_history
             WHERE list_id = ?1 ORDER BY id ASC",
        )?;
        let entries = stmt
            .query_map(params![list_id], |row| {
                Ok(Entry {
                    category: row.get(0)?,
                    performer: row.get(1)?,
                    title: row.get(2)?,
                    item_id: row.get(3)?,
                    added_at: None,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(entries)
    }

    fn history_identifiers(&self, list_id: &str) -> Result<HashSet<String>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt =
            conn.prepare("SELECT item_id FROM rotation_history WHERE list_id = ?1")?;
        let ids = stmt
            .query_map(params![list_id], |row| row.get::<_, String>(0))?
            .collect::<Result<HashSet<_>, _>>()?;
        Ok(ids)
    }

    fn replace_queue(&self, list_id: &str, entries: &[Entry]) -> Result<()> {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;
        tx.execute(
            "DELETE FROM rotation_queue WHERE list_id = ?1",
            params![list_id],
        )?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO rotation_queue (list_id, position, category, performer, title, item_id)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            )?;
            for (position, entry) in entries.iter().enumerate() {
                stmt.execute(params![
                    list_id,
                    position as i64,
                    entry.category,
                    entry.performer,
                    entry.title,
                    entry.item_id,
                ])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    fn read_queue(&self, list_id: &str) -> Result<Vec<Entry>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT category, performer, title, item_id FROM rotation_queue
             WHERE list_id = ?1 ORDER BY position ASC",
        )?;
        let entries = stmt
            .query_map(params![list_id], |row| {
                Ok(Entry {
                    category: row.get(0)?,
                    performer: row.get(1)?,
                    title: row.get(2)?,
                    item_id: row.get(3)?,
                    added_at: None,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(entries)
    }

    fn clear_queue(&self, list_id: &str) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "DELETE FROM rotation_queue WHERE list_id = ?1",
            params![list_id],
        )?;
        Ok(())
    }

    fn record_run(&self, audit: &RunAudit) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO rotation_runs (id, list_id, status, started_at, completed_at, error_message)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                audit.id,
                audit.list_id,
                audit.status.as_str(),
                audit.started_at,
                audit.completed_at,
                audit.error_message,
            ],
        )?;
        Ok(())
    }
}
