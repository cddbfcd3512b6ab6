// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! High-level list operations
//!
//! Ties the resolution policy, the lifecycle transitions and the sync
//! layer together. Every operation attaches to the list, mutates a
//! local snapshot, and persists only the collections that actually
//! changed. The web API and the CLI both sit on top of this.

use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, info};

use crate::categorize::{
    remember_resolution, resolve_category, CategoryMatcher, Classifier, Resolution,
};
use crate::model::{Category, Changed, Item, ItemStatus, ListSnapshot, Section, SnapshotPatch};
use crate::store::ListStore;
use crate::sweep::{reclassify_all, SweepSummary};
use crate::sync::ListSync;
use crate::transitions;
use crate::{DespensaError, Result};

/// Outcome of an add: the stored item plus how its category was chosen.
#[derive(Debug, Clone, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AddedItem {
    pub item: Item,
    pub resolution: Resolution,
}

/// Orchestrates list operations against one store.
pub struct ListService {
    store: Arc<dyn ListStore>,
    matcher: CategoryMatcher,
    classifier: Option<Arc<dyn Classifier>>,
}

impl ListService {
    pub fn new(
        store: Arc<dyn ListStore>,
        matcher: CategoryMatcher,
        classifier: Option<Arc<dyn Classifier>>,
    ) -> Self {
        Self {
            store,
            matcher,
            classifier,
        }
    }

    pub fn store(&self) -> &Arc<dyn ListStore> {
        &self.store
    }

    pub fn matcher(&self) -> &CategoryMatcher {
        &self.matcher
    }

    pub fn has_classifier(&self) -> bool {
        self.classifier.is_some()
    }

    async fn attach(&self, list_id: &str) -> Result<ListSync> {
        ListSync::attach(Arc::clone(&self.store), list_id).await
    }

    /// Persist only the collections a mutation touched.
    async fn persist(
        &self,
        sync: &ListSync,
        snapshot: &ListSnapshot,
        changed: Changed,
    ) -> Result<()> {
        if !changed.any() {
            return Ok(());
        }
        sync.update_remote(SnapshotPatch::from_changed(snapshot, changed))
            .await
    }

    /// Sanitized snapshot of a list, creating it on first access.
    pub async fn snapshot(&self, list_id: &str) -> Result<ListSnapshot> {
        self.attach(list_id).await?.snapshot()
    }

    /// Attach plus a live notification stream, for watch surfaces.
    pub async fn watch(
        &self,
        list_id: &str,
    ) -> Result<(ListSync, broadcast::Receiver<ListSnapshot>)> {
        let sync = self.attach(list_id).await?;
        let rx = sync.changes();
        Ok((sync, rx))
    }

    /// Apply a raw partial update (the generic client write surface).
    pub async fn apply_patch(&self, list_id: &str, patch: SnapshotPatch) -> Result<()> {
        let sync = self.attach(list_id).await?;
        sync.update_remote(patch).await
    }

    /// Add an item, resolving its category through the full policy.
    ///
    /// `explicit` skips resolution entirely; otherwise overrides, the
    /// keyword table and (if configured) the classifier are consulted
    /// in that order, and a `local`/`ai` result is written back into
    /// the override map. Defaults: pantry adds arrive `available`,
    /// shopping adds arrive `out_of_stock`.
    pub async fn add_item(
        &self,
        list_id: &str,
        name: &str,
        explicit: Option<Category>,
        status: Option<ItemStatus>,
        section: Section,
    ) -> Result<AddedItem> {
        let sync = self.attach(list_id).await?;
        let mut snapshot = sync.snapshot()?;

        let resolution = resolve_category(
            name,
            explicit,
            &snapshot.category_overrides,
            &self.matcher,
            self.classifier.as_deref(),
        )
        .await;
        let status = status.unwrap_or(match section {
            Section::Pantry => ItemStatus::Available,
            Section::Shopping => ItemStatus::OutOfStock,
        });

        let (id, mut changed) =
            transitions::add_resolved(&mut snapshot, name, resolution.category, status, section)?;
        if remember_resolution(&mut snapshot.category_overrides, name, resolution) {
            changed.category_overrides = true;
        }

        let item = snapshot
            .section(section)
            .iter()
            .find(|i| i.id == id)
            .cloned()
            .ok_or_else(|| DespensaError::ItemNotFound(id.clone()))?;

        // Best-effort product record; the list write matters, this does not.
        if let Err(e) = self.store.record_product(&item).await {
            debug!("Product record write failed for '{}': {}", item.name, e);
        }

        self.persist(&sync, &snapshot, changed).await?;
        info!(
            "Added '{}' to {:?} of '{}' as {} ({:?})",
            item.name, section, list_id, resolution.category, resolution.source
        );
        Ok(AddedItem { item, resolution })
    }

    /// Change a pantry item's stock status.
    pub async fn set_status(
        &self,
        list_id: &str,
        item_id: &str,
        status: ItemStatus,
    ) -> Result<()> {
        let sync = self.attach(list_id).await?;
        let mut snapshot = sync.snapshot()?;
        let changed = transitions::set_status(&mut snapshot, item_id, status)?;
        self.persist(&sync, &snapshot, changed).await
    }

    /// Push a low pantry item's linked copy onto the shopping list.
    pub async fn push_to_shopping(&self, list_id: &str, item_id: &str) -> Result<()> {
        let sync = self.attach(list_id).await?;
        let mut snapshot = sync.snapshot()?;
        let changed = transitions::push_low_to_shopping(&mut snapshot, item_id)?;
        self.persist(&sync, &snapshot, changed).await
    }

    /// Check a shopping entry off as purchased.
    pub async fn check_off(&self, list_id: &str, item_id: &str) -> Result<()> {
        let sync = self.attach(list_id).await?;
        let mut snapshot = sync.snapshot()?;
        let changed = transitions::check_off(&mut snapshot, item_id)?;
        self.persist(&sync, &snapshot, changed).await
    }

    /// Return a low-stock copy to the pantry unbought.
    pub async fn return_to_pantry(&self, list_id: &str, item_id: &str) -> Result<()> {
        let sync = self.attach(list_id).await?;
        let mut snapshot = sync.snapshot()?;
        let changed = transitions::return_to_pantry(&mut snapshot, item_id)?;
        self.persist(&sync, &snapshot, changed).await
    }

    /// Delete an item from one collection.
    pub async fn remove_item(&self, list_id: &str, section: Section, item_id: &str) -> Result<()> {
        let sync = self.attach(list_id).await?;
        let mut snapshot = sync.snapshot()?;
        let changed = transitions::remove_item(&mut snapshot, section, item_id)?;
        self.persist(&sync, &snapshot, changed).await
    }

    /// Toggle the "not on this trip" flag of a shopping entry.
    pub async fn set_buy_later(
        &self,
        list_id: &str,
        item_id: &str,
        buy_later: bool,
    ) -> Result<()> {
        let sync = self.attach(list_id).await?;
        let mut snapshot = sync.snapshot()?;
        let changed = transitions::set_buy_later(&mut snapshot, item_id, buy_later)?;
        self.persist(&sync, &snapshot, changed).await
    }

    /// Freeze or unfreeze a pantry item.
    pub async fn set_frozen(&self, list_id: &str, item_id: &str, frozen: bool) -> Result<()> {
        let sync = self.attach(list_id).await?;
        let mut snapshot = sync.snapshot()?;
        let changed = transitions::set_frozen(&mut snapshot, item_id, frozen)?;
        self.persist(&sync, &snapshot, changed).await
    }

    /// Run the catch-all reclassification sweep over one list.
    ///
    /// Unlike every other operation this refuses to create the list:
    /// sweeping a list nobody ever wrote would only report zeros.
    /// With `persist` false the sweep reports without writing anything.
    pub async fn reclassify(&self, list_id: &str, persist: bool) -> Result<SweepSummary> {
        let mut snapshot = self
            .store
            .get(list_id)
            .await?
            .ok_or_else(|| DespensaError::ListNotFound(list_id.to_string()))?;

        let outcome =
            reclassify_all(&mut snapshot, &self.matcher, self.classifier.as_deref()).await;

        if persist && outcome.changed.any() {
            let sync = self.attach(list_id).await?;
            sync.update_remote(SnapshotPatch::from_changed(&snapshot, outcome.changed))
                .await?;
        }
        Ok(outcome.summary)
    }

    /// One-off category resolution for a name, without touching any list.
    pub async fn resolve(&self, list_id: Option<&str>, name: &str) -> Result<Resolution> {
        let overrides = match list_id {
            Some(id) => self
                .store
                .get(id)
                .await?
                .map(|s| s.category_overrides)
                .unwrap_or_default(),
            None => Default::default(),
        };
        Ok(resolve_category(
            name,
            None,
            &overrides,
            &self.matcher,
            self.classifier.as_deref(),
        )
        .await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::categorize::ResolutionSource;
    use crate::store::SqliteStore;

    fn service() -> ListService {
        let store: Arc<dyn ListStore> = Arc::new(SqliteStore::in_memory().unwrap());
        ListService::new(store, CategoryMatcher::with_defaults(), None)
    }

    #[tokio::test]
    async fn test_add_item_resolves_and_persists() {
        let service = service();
        let added = service
            .add_item("hogar", "Tomate frito", None, None, Section::Pantry)
            .await
            .unwrap();

        assert_eq!(added.item.category, Category::ConservasYDespensa);
        assert_eq!(added.resolution.source, ResolutionSource::Local);
        assert_eq!(added.item.status, ItemStatus::Available);

        let stored = service.store().get("hogar").await.unwrap().unwrap();
        assert_eq!(stored.pantry.len(), 1);
        assert_eq!(stored.history, vec!["Tomate frito"]);
        // Local result was written back as an override.
        assert_eq!(
            stored.category_overrides.get("tomate frito"),
            Some(&Category::ConservasYDespensa)
        );
        // And the product landed in the side table.
        assert_eq!(service.store().stats().await.unwrap().product_count, 1);
    }

    #[tokio::test]
    async fn test_add_with_explicit_category() {
        let service = service();
        let added = service
            .add_item(
                "hogar",
                "Leche",
                Some(Category::Bebidas),
                None,
                Section::Pantry,
            )
            .await
            .unwrap();
        assert_eq!(added.item.category, Category::Bebidas);
        assert_eq!(added.resolution.source, ResolutionSource::Override);

        // Explicit choices are not written into the override map.
        let stored = service.store().get("hogar").await.unwrap().unwrap();
        assert!(stored.category_overrides.is_empty());
    }

    #[tokio::test]
    async fn test_add_unknown_name_falls_back() {
        let service = service();
        let added = service
            .add_item("hogar", "wasabi", None, None, Section::Shopping)
            .await
            .unwrap();
        assert_eq!(added.item.category, Category::Otros);
        assert_eq!(added.resolution.source, ResolutionSource::Fallback);
        assert_eq!(added.item.status, ItemStatus::OutOfStock);
        assert_eq!(added.item.reason, None);
    }

    #[tokio::test]
    async fn test_add_twice_merges() {
        let service = service();
        let first = service
            .add_item("hogar", "Manzanas", None, None, Section::Pantry)
            .await
            .unwrap();
        let second = service
            .add_item(
                "hogar",
                "manzana",
                None,
                Some(ItemStatus::Low),
                Section::Pantry,
            )
            .await
            .unwrap();

        assert_eq!(first.item.id, second.item.id);
        let stored = service.store().get("hogar").await.unwrap().unwrap();
        assert_eq!(stored.pantry.len(), 1);
        assert_eq!(stored.pantry[0].status, ItemStatus::Low);
        assert_eq!(stored.history.len(), 1);
    }

    #[tokio::test]
    async fn test_out_of_stock_flow_end_to_end() {
        let service = service();
        let added = service
            .add_item("hogar", "Leche", None, None, Section::Pantry)
            .await
            .unwrap();

        service
            .set_status("hogar", &added.item.id, ItemStatus::OutOfStock)
            .await
            .unwrap();
        let stored = service.store().get("hogar").await.unwrap().unwrap();
        assert!(stored.pantry.is_empty());
        assert_eq!(stored.shopping_list.len(), 1);

        service.check_off("hogar", &added.item.id).await.unwrap();
        let stored = service.store().get("hogar").await.unwrap().unwrap();
        assert!(stored.shopping_list.is_empty());
        assert_eq!(stored.pantry[0].status, ItemStatus::Available);
    }

    #[tokio::test]
    async fn test_low_push_and_return_flow() {
        let service = service();
        let added = service
            .add_item(
                "hogar",
                "Leche",
                None,
                Some(ItemStatus::Low),
                Section::Pantry,
            )
            .await
            .unwrap();

        service.push_to_shopping("hogar", &added.item.id).await.unwrap();
        let stored = service.store().get("hogar").await.unwrap().unwrap();
        assert!(stored.pantry[0].is_pending_purchase);
        assert_eq!(stored.shopping_list.len(), 1);

        service.return_to_pantry("hogar", &added.item.id).await.unwrap();
        let stored = service.store().get("hogar").await.unwrap().unwrap();
        assert!(!stored.pantry[0].is_pending_purchase);
        assert!(stored.shopping_list.is_empty());
    }

    #[tokio::test]
    async fn test_unknown_item_is_an_error() {
        let service = service();
        service.snapshot("hogar").await.unwrap();
        let err = service
            .set_status("hogar", "nope", ItemStatus::Low)
            .await
            .unwrap_err();
        assert!(matches!(err, DespensaError::ItemNotFound(_)));
    }

    #[tokio::test]
    async fn test_reclassify_missing_list() {
        let service = service();
        let err = service.reclassify("nadie", true).await.unwrap_err();
        assert!(matches!(err, DespensaError::ListNotFound(_)));
        // It must not have created the document as a side effect.
        assert!(service.store().get("nadie").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_reclassify_updates_document() {
        let service = service();
        service
            .add_item(
                "hogar",
                "Cerveza",
                Some(Category::Otros),
                None,
                Section::Pantry,
            )
            .await
            .unwrap();

        let summary = service.reclassify("hogar", true).await.unwrap();
        assert_eq!(summary.candidates, 1);
        assert_eq!(summary.updated, 1);

        let stored = service.store().get("hogar").await.unwrap().unwrap();
        assert_eq!(stored.pantry[0].category, Category::Bebidas);
    }

    #[tokio::test]
    async fn test_reclassify_dry_run_leaves_document_alone() {
        let service = service();
        service
            .add_item(
                "hogar",
                "Cerveza",
                Some(Category::Otros),
                None,
                Section::Pantry,
            )
            .await
            .unwrap();

        let summary = service.reclassify("hogar", false).await.unwrap();
        assert_eq!(summary.updated, 1);

        let stored = service.store().get("hogar").await.unwrap().unwrap();
        assert_eq!(stored.pantry[0].category, Category::Otros);
    }

    #[tokio::test]
    async fn test_resolve_uses_list_overrides() {
        let service = service();
        service
            .add_item("hogar", "wasabi", None, None, Section::Pantry)
            .await
            .unwrap();
        // Plant an override by hand through the patch surface.
        let mut overrides = std::collections::HashMap::new();
        overrides.insert("wasabi".to_string(), Category::ConservasYDespensa);
        service
            .apply_patch(
                "hogar",
                SnapshotPatch {
                    category_overrides: Some(overrides),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let resolution = service.resolve(Some("hogar"), "Wasabi").await.unwrap();
        assert_eq!(resolution.category, Category::ConservasYDespensa);
        assert_eq!(resolution.source, ResolutionSource::Override);

        let without_list = service.resolve(None, "Wasabi").await.unwrap();
        assert_eq!(without_list.source, ResolutionSource::Fallback);
    }
}
