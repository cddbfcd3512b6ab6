// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Synchronization between a cached snapshot and the remote store
//!
//! A [`ListSync`] is one client's view of one shared list: it holds the
//! last-observed remote snapshot, pushes local mutations out as
//! field-level partial updates, and detects which product ids a write
//! deletes so their side records can be cleaned up. Concurrent writers
//! are resolved last-write-wins at field level; there is no
//! compare-and-swap anywhere in this layer.

use std::sync::{Arc, Mutex};
use tokio::sync::broadcast;
use tracing::{debug, warn};

use crate::model::{Item, ListSnapshot, SnapshotPatch};
use crate::store::ListStore;
use crate::{DespensaError, Result};

/// Ids present in `before` but absent from `after`.
pub fn removed_ids(before: &[Item], after: &[Item]) -> Vec<String> {
    before
        .iter()
        .filter(|b| !after.iter().any(|a| a.id == b.id))
        .map(|b| b.id.clone())
        .collect()
}

/// Ids whose product records should be cleaned once `patch` lands:
/// gone from a collection the patch replaces, and not present anywhere
/// in the post-update union of both collections. The union check keeps
/// pantry/shopping moves from looking like deletions.
pub fn deleted_product_ids(remote: &ListSnapshot, patch: &SnapshotPatch) -> Vec<String> {
    let mut deleted = Vec::new();
    if let Some(after) = &patch.pantry {
        deleted.extend(removed_ids(&remote.pantry, after));
    }
    if let Some(after) = &patch.shopping_list {
        deleted.extend(removed_ids(&remote.shopping_list, after));
    }
    if deleted.is_empty() {
        return deleted;
    }

    let post_pantry = patch.pantry.as_ref().unwrap_or(&remote.pantry);
    let post_shopping = patch.shopping_list.as_ref().unwrap_or(&remote.shopping_list);
    deleted.retain(|id| {
        !post_pantry
            .iter()
            .chain(post_shopping.iter())
            .any(|item| &item.id == id)
    });
    deleted.sort();
    deleted.dedup();
    deleted
}

/// Client-side synchronization handle for one shared list.
pub struct ListSync {
    store: Arc<dyn ListStore>,
    list_id: String,
    remote: Mutex<ListSnapshot>,
}

impl ListSync {
    /// Attach to a list document, creating a default empty one on first
    /// access so every caller starts from a real document.
    pub async fn attach(store: Arc<dyn ListStore>, list_id: impl Into<String>) -> Result<Self> {
        let list_id = list_id.into();
        let snapshot = match store.get(&list_id).await? {
            Some(snapshot) => snapshot,
            None => {
                debug!("List '{}' does not exist yet, writing default document", list_id);
                let snapshot = ListSnapshot::default();
                store.set(&list_id, &snapshot, false).await?;
                snapshot
            }
        };
        Ok(Self {
            store,
            list_id,
            remote: Mutex::new(snapshot),
        })
    }

    pub fn list_id(&self) -> &str {
        &self.list_id
    }

    /// Clone of the last-observed remote snapshot.
    pub fn snapshot(&self) -> Result<ListSnapshot> {
        Ok(self.lock_remote()?.clone())
    }

    /// Push a partial update to the remote document.
    ///
    /// Collections in the patch are diffed against the cached remote
    /// copy first; ids that truly disappeared get their product records
    /// cleaned up in a background task, decoupled from the update
    /// itself. On success the cache absorbs the patch.
    pub async fn update_remote(&self, patch: SnapshotPatch) -> Result<()> {
        if patch.is_empty() {
            return Ok(());
        }
        let deleted = {
            let remote = self.lock_remote()?;
            deleted_product_ids(&remote, &patch)
        };
        if !deleted.is_empty() {
            debug!(
                "{} product record(s) to clean up for list '{}'",
                deleted.len(),
                self.list_id
            );
            let store = Arc::clone(&self.store);
            let list_id = self.list_id.clone();
            tokio::spawn(async move {
                if let Err(e) = store.remove_products(&deleted).await {
                    warn!("Product cleanup failed for list '{}': {}", list_id, e);
                }
            });
        }
        self.store.update(&self.list_id, &patch).await?;
        patch.apply_to(&mut *self.lock_remote()?);
        Ok(())
    }

    /// Live change notifications for this list. Feed each received
    /// snapshot back through [`ListSync::apply_remote`] to keep the
    /// cache current.
    pub fn changes(&self) -> broadcast::Receiver<ListSnapshot> {
        self.store.subscribe(&self.list_id)
    }

    /// Adopt a remote notification: the entire cached snapshot is
    /// replaced, never merged.
    pub fn apply_remote(&self, snapshot: ListSnapshot) -> Result<()> {
        *self.lock_remote()? = snapshot;
        Ok(())
    }

    fn lock_remote(&self) -> Result<std::sync::MutexGuard<'_, ListSnapshot>> {
        self.remote
            .lock()
            .map_err(|_| DespensaError::Store("Snapshot lock poisoned".to_string()))
    }
}
