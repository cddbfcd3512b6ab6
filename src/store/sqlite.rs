// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! SQLite-backed list document store (thread-safe wrapper)

use async_trait::async_trait;
use rusqlite::{params, Connection};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tokio::sync::broadcast;
use tracing::{debug, warn};

use super::{ListStore, StoreStats};
use crate::model::{
    decode_snapshot, encode_snapshot, Item, ListSnapshot, SnapshotPatch, SCHEMA_VERSION,
};
use crate::{DespensaError, Result};

/// Capacity of each list's change channel. Messages are full snapshots,
/// so a lagging subscriber that skips ahead only ever misses
/// intermediate states, never data.
const CHANNEL_CAPACITY: usize = 16;

/// Backup documents live next to the real ones under this id prefix.
const BACKUP_PREFIX: &str = "backup-";

/// Document store backed by SQLite
#[derive(Clone)]
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
    channels: Arc<Mutex<HashMap<String, broadcast::Sender<ListSnapshot>>>>,
    backup_on_write: bool,
}

impl SqliteStore {
    /// Open or create the database
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path)?;
        let store = Self::wrap(conn);
        store.initialize()?;
        Ok(store)
    }

    /// Open an in-memory database (for testing)
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self::wrap(conn);
        store.initialize()?;
        Ok(store)
    }

    fn wrap(conn: Connection) -> Self {
        Self {
            conn: Arc::new(Mutex::new(conn)),
            channels: Arc::new(Mutex::new(HashMap::new())),
            backup_on_write: true,
        }
    }

    /// Disable or re-enable pre-update backup documents.
    pub fn with_backups(mut self, enabled: bool) -> Self {
        self.backup_on_write = enabled;
        self
    }

    fn lock_conn(&self) -> Result<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| DespensaError::Store("Database lock poisoned".to_string()))
    }

    /// Initialize database schema
    fn initialize(&self) -> Result<()> {
        let conn = self.lock_conn()?;
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS documents (
                id TEXT PRIMARY KEY,
                body TEXT NOT NULL,
                updated_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
            );

            CREATE TABLE IF NOT EXISTS products (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                category TEXT,
                updated_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
            );

            CREATE INDEX IF NOT EXISTS idx_products_category ON products(category);
        "#,
        )?;
        Ok(())
    }

    /// Read a raw document body. A body that no longer parses is
    /// reported as an empty object so the sanitizing decode can start
    /// the list over instead of wedging every caller.
    fn read_document(conn: &Connection, id: &str) -> Result<Option<Value>> {
        let result: rusqlite::Result<String> = conn.query_row(
            "SELECT body FROM documents WHERE id = ?1",
            params![id],
            |row| row.get(0),
        );
        match result {
            Ok(body) => match serde_json::from_str(&body) {
                Ok(value) => Ok(Some(value)),
                Err(e) => {
                    warn!("Document '{}' has unparseable body: {}", id, e);
                    Ok(Some(json!({})))
                }
            },
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn write_document(conn: &Connection, id: &str, body: &Value) -> Result<()> {
        conn.execute(
            r#"INSERT OR REPLACE INTO documents (id, body, updated_at)
               VALUES (?1, ?2, datetime('now'))"#,
            params![id, serde_json::to_string(body)?],
        )?;
        Ok(())
    }

    fn sender_for(&self, list_id: &str) -> Result<broadcast::Sender<ListSnapshot>> {
        let mut channels = self
            .channels
            .lock()
            .map_err(|_| DespensaError::Store("Channel map lock poisoned".to_string()))?;
        Ok(channels
            .entry(list_id.to_string())
            .or_insert_with(|| broadcast::channel(CHANNEL_CAPACITY).0)
            .clone())
    }

    /// Fan the post-write snapshot out to subscribers, if any.
    fn notify(&self, list_id: &str, body: &Value) {
        let sender = match self.channels.lock() {
            Ok(channels) => channels.get(list_id).cloned(),
            Err(_) => None,
        };
        if let Some(sender) = sender {
            // Send only fails when nobody is listening.
            let _ = sender.send(decode_snapshot(body));
        }
    }

    /// Write the pre-update state into `backup-<id>` with merge
    /// semantics, so fields missing from the current body survive from
    /// older backups.
    fn write_backup(conn: &Connection, list_id: &str, body: &Value) {
        let backup_id = format!("{}{}", BACKUP_PREFIX, list_id);
        let mut backup = match Self::read_document(conn, &backup_id) {
            Ok(Some(existing)) => existing,
            Ok(None) => json!({}),
            Err(e) => {
                warn!("Skipping backup for '{}': {}", list_id, e);
                return;
            }
        };
        merge_fields(&mut backup, body);
        if let Err(e) = Self::write_document(conn, &backup_id, &backup) {
            warn!("Backup write failed for '{}': {}", list_id, e);
        }
    }

    /// Ids of all stored lists, backups excluded.
    pub fn list_ids(&self) -> Result<Vec<String>> {
        let conn = self.lock_conn()?;
        let mut stmt = conn.prepare(
            "SELECT id FROM documents WHERE id NOT LIKE ?1 ORDER BY id",
        )?;
        let ids = stmt
            .query_map(params![format!("{}%", BACKUP_PREFIX)], |row| row.get(0))?
            .collect::<rusqlite::Result<Vec<String>>>()?;
        Ok(ids)
    }

    /// Vacuum database
    pub fn vacuum(&self) -> Result<()> {
        let conn = self.lock_conn()?;
        conn.execute("VACUUM", [])?;
        Ok(())
    }

    #[cfg(test)]
    fn write_raw(&self, id: &str, body: &str) -> Result<()> {
        let conn = self.lock_conn()?;
        conn.execute(
            "INSERT OR REPLACE INTO documents (id, body, updated_at) VALUES (?1, ?2, datetime('now'))",
            params![id, body],
        )?;
        Ok(())
    }
}

#[async_trait]
impl ListStore for SqliteStore {
    async fn get(&self, list_id: &str) -> Result<Option<ListSnapshot>> {
        let conn = self.lock_conn()?;
        Ok(Self::read_document(&conn, list_id)?.map(|body| decode_snapshot(&body)))
    }

    async fn set(&self, list_id: &str, snapshot: &ListSnapshot, merge: bool) -> Result<()> {
        let body = encode_snapshot(snapshot)?;
        let stored = {
            let conn = self.lock_conn()?;
            let stored = if merge {
                let mut base = Self::read_document(&conn, list_id)?.unwrap_or_else(|| json!({}));
                merge_fields(&mut base, &body);
                base
            } else {
                body
            };
            Self::write_document(&conn, list_id, &stored)?;
            stored
        };
        debug!("Wrote document '{}'", list_id);
        self.notify(list_id, &stored);
        Ok(())
    }

    async fn update(&self, list_id: &str, patch: &SnapshotPatch) -> Result<()> {
        let patch_body = serde_json::to_value(patch)?;
        let stored = {
            let conn = self.lock_conn()?;
            let mut body = Self::read_document(&conn, list_id)?
                .ok_or_else(|| DespensaError::ListNotFound(list_id.to_string()))?;
            if self.backup_on_write {
                Self::write_backup(&conn, list_id, &body);
            }
            merge_fields(&mut body, &patch_body);
            body["schemaVersion"] = Value::from(SCHEMA_VERSION);
            Self::write_document(&conn, list_id, &body)?;
            body
        };
        debug!("Updated document '{}'", list_id);
        self.notify(list_id, &stored);
        Ok(())
    }

    fn subscribe(&self, list_id: &str) -> broadcast::Receiver<ListSnapshot> {
        match self.sender_for(list_id) {
            Ok(sender) => sender.subscribe(),
            // Poisoned channel map: hand back a channel that only ever
            // reports Closed instead of propagating a panic.
            Err(_) => broadcast::channel(1).1,
        }
    }

    async fn record_product(&self, item: &Item) -> Result<()> {
        let conn = self.lock_conn()?;
        conn.execute(
            r#"INSERT OR REPLACE INTO products (id, name, category, updated_at)
               VALUES (?1, ?2, ?3, datetime('now'))"#,
            params![item.id, item.name, item.category.label()],
        )?;
        Ok(())
    }

    async fn remove_products(&self, ids: &[String]) -> Result<()> {
        let conn = self.lock_conn()?;
        for id in ids {
            conn.execute("DELETE FROM products WHERE id = ?1", params![id])?;
        }
        Ok(())
    }

    async fn stats(&self) -> Result<StoreStats> {
        let conn = self.lock_conn()?;
        let list_count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM documents WHERE id NOT LIKE ?1",
            params![format!("{}%", BACKUP_PREFIX)],
            |row| row.get(0),
        )?;
        let product_count: i64 =
            conn.query_row("SELECT COUNT(*) FROM products", [], |row| row.get(0))?;
        Ok(StoreStats {
            list_count,
            product_count,
        })
    }
}

/// Shallow field-level merge: top-level fields present in `patch`
/// replace the same field in `base`; everything else is untouched.
fn merge_fields(base: &mut Value, patch: &Value) {
    if !base.is_object() {
        *base = json!({});
    }
    if let (Some(base_map), Some(patch_map)) = (base.as_object_mut(), patch.as_object()) {
        for (key, value) in patch_map {
            base_map.insert(key.clone(), value.clone());
        }
    }
}
