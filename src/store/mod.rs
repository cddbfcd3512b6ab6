// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Document store abstraction for shared lists
//!
//! One JSON document per list id, plus a per-product side table keyed
//! by item id, plus change notification channels. The concrete backend
//! is SQLite; the trait keeps the sync layer and the service testable
//! against anything that can hold a document.

pub mod sqlite;

use async_trait::async_trait;
use serde::Serialize;
use tokio::sync::broadcast;

pub use sqlite::SqliteStore;

use crate::model::{Item, ListSnapshot, SnapshotPatch};
use crate::Result;

/// Store-level statistics
#[derive(Debug, Clone, Serialize)]
pub struct StoreStats {
    pub list_count: i64,
    pub product_count: i64,
}

/// Remote document store for shared lists.
///
/// Every read returns a sanitized snapshot, never a raw document; the
/// decode boundary lives inside the store so no caller ever sees a
/// malformed item. Subscribers receive the full post-write snapshot
/// after every successful write to their list.
#[async_trait]
pub trait ListStore: Send + Sync {
    /// Fetch and sanitize a list document. `None` when it does not exist.
    async fn get(&self, list_id: &str) -> Result<Option<ListSnapshot>>;

    /// Write a full snapshot, creating the document if needed. With
    /// `merge`, top-level fields already in the stored document survive
    /// unless the snapshot replaces them.
    async fn set(&self, list_id: &str, snapshot: &ListSnapshot, merge: bool) -> Result<()>;

    /// Apply a field-level partial update to an existing document.
    /// Fails with `ListNotFound` when the document does not exist.
    async fn update(&self, list_id: &str, patch: &SnapshotPatch) -> Result<()>;

    /// Subscribe to change notifications for one list id. Dropping the
    /// receiver unsubscribes.
    fn subscribe(&self, list_id: &str) -> broadcast::Receiver<ListSnapshot>;

    /// Record a product in the side table (callers treat this as best
    /// effort).
    async fn record_product(&self, item: &Item) -> Result<()>;

    /// Remove per-product records after their item ids disappeared from
    /// every collection.
    async fn remove_products(&self, ids: &[String]) -> Result<()>;

    /// Store totals for status displays.
    async fn stats(&self) -> Result<StoreStats>;
}
