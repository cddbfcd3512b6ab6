// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Data model for shared lists
//!
//! Items, snapshots, partial updates, and the sanitizing decode that
//! sits between the document store and the typed model. Documents are
//! written by several app versions at once, so every read assumes the
//! body may be missing fields, carry duplicate ids, or use the legacy
//! layout; decoding repairs or drops instead of rejecting.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::str::FromStr;
use tracing::debug;
use uuid::Uuid;

use crate::normalize::normalize_name;

/// Current snapshot schema version. Version 0 (field absent) is the
/// legacy layout with a `savedItems` array and no override map.
pub const SCHEMA_VERSION: u32 = 2;

/// The closed category set: nine concrete labels plus the catch-all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    #[serde(rename = "Frutas y Verduras")]
    FrutasYVerduras,
    #[serde(rename = "Carnes y Pescados")]
    CarnesYPescados,
    #[serde(rename = "Lácteos y Huevos")]
    LacteosYHuevos,
    #[serde(rename = "Panadería y Cereales")]
    PanaderiaYCereales,
    #[serde(rename = "Conservas y Despensa")]
    ConservasYDespensa,
    #[serde(rename = "Congelados")]
    Congelados,
    #[serde(rename = "Bebidas")]
    Bebidas,
    #[serde(rename = "Limpieza y Hogar")]
    LimpiezaYHogar,
    #[serde(rename = "Higiene y Salud")]
    HigieneYSalud,
    #[serde(rename = "Otros")]
    Otros,
}

impl Category {
    /// All categories in display order, catch-all last.
    pub const ALL: [Category; 10] = [
        Category::FrutasYVerduras,
        Category::CarnesYPescados,
        Category::LacteosYHuevos,
        Category::PanaderiaYCereales,
        Category::ConservasYDespensa,
        Category::Congelados,
        Category::Bebidas,
        Category::LimpiezaYHogar,
        Category::HigieneYSalud,
        Category::Otros,
    ];

    /// Display label, exactly as stored on the wire.
    pub fn label(&self) -> &'static str {
        match self {
            Category::FrutasYVerduras => "Frutas y Verduras",
            Category::CarnesYPescados => "Carnes y Pescados",
            Category::LacteosYHuevos => "Lácteos y Huevos",
            Category::PanaderiaYCereales => "Panadería y Cereales",
            Category::ConservasYDespensa => "Conservas y Despensa",
            Category::Congelados => "Congelados",
            Category::Bebidas => "Bebidas",
            Category::LimpiezaYHogar => "Limpieza y Hogar",
            Category::HigieneYSalud => "Higiene y Salud",
            Category::Otros => "Otros",
        }
    }

    /// Parse an exact display label.
    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.iter().find(|c| c.label() == label).copied()
    }

    /// Lenient parse for AI replies and stored documents.
    ///
    /// Falls back to accent- and case-insensitive containment, so
    /// "lacteos y huevos" and "Categoría: Bebidas." both resolve.
    pub fn parse_lenient(text: &str) -> Option<Self> {
        if let Some(category) = Self::from_label(text.trim()) {
            return Some(category);
        }
        let normalized = normalize_name(text);
        if normalized.is_empty() {
            return None;
        }
        Self::ALL
            .iter()
            .find(|c| normalized.contains(&normalize_name(c.label())))
            .copied()
    }

    /// True for the `Otros` bucket that the sweep re-resolves.
    pub fn is_catch_all(&self) -> bool {
        matches!(self, Category::Otros)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl Default for Category {
    fn default() -> Self {
        Category::Otros
    }
}

/// Stock status of an item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemStatus {
    Available,
    Low,
    OutOfStock,
}

impl ItemStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemStatus::Available => "available",
            ItemStatus::Low => "low",
            ItemStatus::OutOfStock => "out_of_stock",
        }
    }
}

impl FromStr for ItemStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "available" => Ok(ItemStatus::Available),
            "low" => Ok(ItemStatus::Low),
            "out_of_stock" => Ok(ItemStatus::OutOfStock),
            other => Err(format!("unknown status '{other}'")),
        }
    }
}

/// Why an item sits on the shopping list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PurchaseReason {
    Low,
    OutOfStock,
}

/// Which of the two collections an operation targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Section {
    Pantry,
    Shopping,
}

impl Default for Section {
    fn default() -> Self {
        Section::Pantry
    }
}

impl FromStr for Section {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "pantry" => Ok(Section::Pantry),
            "shopping" => Ok(Section::Shopping),
            other => Err(format!("unknown section '{other}'")),
        }
    }
}

/// One product record, shared by the pantry and the shopping list.
///
/// An item keeps the same id when it moves between the two collections;
/// a pantry entry and a shopping entry with the same id are two views
/// of one product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    pub id: String,
    pub name: String,
    pub category: Category,
    pub status: ItemStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<PurchaseReason>,
    #[serde(default)]
    pub is_pending_purchase: bool,
    #[serde(default)]
    pub buy_later: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frozen_at: Option<DateTime<Utc>>,
}

impl Item {
    /// New item with a fresh id and no flags set.
    pub fn new(name: impl Into<String>, category: Category, status: ItemStatus) -> Self {
        Self {
            id: new_item_id(),
            name: name.into(),
            category,
            status,
            reason: None,
            is_pending_purchase: false,
            buy_later: false,
            frozen_at: None,
        }
    }
}

/// Generate a unique item id.
pub fn new_item_id() -> String {
    Uuid::new_v4().to_string()
}

/// Full state of one shared list document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListSnapshot {
    #[serde(default)]
    pub pantry: Vec<Item>,
    #[serde(default)]
    pub shopping_list: Vec<Item>,
    #[serde(default)]
    pub history: Vec<String>,
    #[serde(default)]
    pub category_overrides: HashMap<String, Category>,
}

impl ListSnapshot {
    pub fn section(&self, section: Section) -> &Vec<Item> {
        match section {
            Section::Pantry => &self.pantry,
            Section::Shopping => &self.shopping_list,
        }
    }

    pub fn section_mut(&mut self, section: Section) -> &mut Vec<Item> {
        match section {
            Section::Pantry => &mut self.pantry,
            Section::Shopping => &mut self.shopping_list,
        }
    }

    pub fn pantry_item(&self, id: &str) -> Option<&Item> {
        self.pantry.iter().find(|i| i.id == id)
    }

    pub fn pantry_item_mut(&mut self, id: &str) -> Option<&mut Item> {
        self.pantry.iter_mut().find(|i| i.id == id)
    }

    pub fn shopping_item(&self, id: &str) -> Option<&Item> {
        self.shopping_list.iter().find(|i| i.id == id)
    }

    pub fn shopping_item_mut(&mut self, id: &str) -> Option<&mut Item> {
        self.shopping_list.iter_mut().find(|i| i.id == id)
    }

    /// Look up a stored override, trying the normalized key first and
    /// then the plain lowercase key kept for documents written before
    /// key normalization existed.
    pub fn override_for(&self, name: &str) -> Option<Category> {
        stored_override(&self.category_overrides, name)
    }

    /// Record a name in the autocomplete history, deduplicated by
    /// normalized key. Returns true when the history changed.
    pub fn remember_name(&mut self, name: &str) -> bool {
        let trimmed = name.trim();
        if trimmed.is_empty() {
            return false;
        }
        let key = normalize_name(trimmed);
        if self.history.iter().any(|h| normalize_name(h) == key) {
            return false;
        }
        self.history.push(trimmed.to_string());
        true
    }
}

/// Look up an override for `name` in a raw override map.
///
/// Tries the normalized key, then the legacy trim+lowercase key.
pub fn stored_override(overrides: &HashMap<String, Category>, name: &str) -> Option<Category> {
    overrides
        .get(&normalize_name(name))
        .or_else(|| overrides.get(&name.trim().to_lowercase()))
        .copied()
}

/// Partial snapshot update: only the collections present are written,
/// each as a full replacement of that field.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pantry: Option<Vec<Item>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shopping_list: Option<Vec<Item>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub history: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category_overrides: Option<HashMap<String, Category>>,
}

impl SnapshotPatch {
    pub fn is_empty(&self) -> bool {
        self.pantry.is_none()
            && self.shopping_list.is_none()
            && self.history.is_none()
            && self.category_overrides.is_none()
    }

    /// Build a patch carrying the snapshot collections that `changed` marks.
    pub fn from_changed(snapshot: &ListSnapshot, changed: Changed) -> Self {
        Self {
            pantry: changed.pantry.then(|| snapshot.pantry.clone()),
            shopping_list: changed.shopping_list.then(|| snapshot.shopping_list.clone()),
            history: changed.history.then(|| snapshot.history.clone()),
            category_overrides: changed
                .category_overrides
                .then(|| snapshot.category_overrides.clone()),
        }
    }

    /// Overwrite the snapshot fields this patch carries.
    pub fn apply_to(&self, snapshot: &mut ListSnapshot) {
        if let Some(pantry) = &self.pantry {
            snapshot.pantry = pantry.clone();
        }
        if let Some(shopping_list) = &self.shopping_list {
            snapshot.shopping_list = shopping_list.clone();
        }
        if let Some(history) = &self.history {
            snapshot.history = history.clone();
        }
        if let Some(overrides) = &self.category_overrides {
            snapshot.category_overrides = overrides.clone();
        }
    }
}

/// Which snapshot collections a mutation touched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Changed {
    pub pantry: bool,
    pub shopping_list: bool,
    pub history: bool,
    pub category_overrides: bool,
}

impl Changed {
    pub fn any(&self) -> bool {
        self.pantry || self.shopping_list || self.history || self.category_overrides
    }

    pub fn mark(&mut self, section: Section) {
        match section {
            Section::Pantry => self.pantry = true,
            Section::Shopping => self.shopping_list = true,
        }
    }

    pub fn merge(self, other: Changed) -> Changed {
        Changed {
            pantry: self.pantry || other.pantry,
            shopping_list: self.shopping_list || other.shopping_list,
            history: self.history || other.history,
            category_overrides: self.category_overrides || other.category_overrides,
        }
    }
}

/// Untrusted wire form of an item. The three core fields must decode
/// or the entry is dropped; everything else degrades to a default.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct RawItem {
    id: Option<String>,
    name: Option<String>,
    category: Option<String>,
    status: Option<String>,
    reason: Value,
    is_pending_purchase: Value,
    buy_later: Value,
    frozen_at: Value,
}

/// Decode an untrusted document body into a sanitized snapshot.
///
/// Repairs instead of rejecting: items without an id get a fresh one,
/// items missing name, category or status are dropped, duplicate ids
/// collapse to the first occurrence, unknown category labels fall back
/// to the catch-all, and unknown status strings drop the entry. Legacy
/// documents (no `schemaVersion`) get their `savedItems` names folded
/// into the history.
pub fn decode_snapshot(body: &Value) -> ListSnapshot {
    let obj = match body.as_object() {
        Some(obj) => obj,
        None => return ListSnapshot::default(),
    };

    let mut snapshot = ListSnapshot {
        pantry: sanitize_items(obj.get("pantry")),
        shopping_list: sanitize_items(obj.get("shoppingList")),
        history: sanitize_history(obj.get("history")),
        category_overrides: sanitize_overrides(obj.get("categoryOverrides")),
    };

    let version = obj
        .get("schemaVersion")
        .and_then(Value::as_u64)
        .unwrap_or(0);
    if version == 0 {
        migrate_saved_items(obj.get("savedItems"), &mut snapshot);
    }

    snapshot
}

/// Encode a snapshot into its document body, stamping the schema version.
pub fn encode_snapshot(snapshot: &ListSnapshot) -> crate::Result<Value> {
    let mut body = serde_json::to_value(snapshot)?;
    body["schemaVersion"] = Value::from(SCHEMA_VERSION);
    Ok(body)
}

fn sanitize_items(value: Option<&Value>) -> Vec<Item> {
    let entries = match value.and_then(Value::as_array) {
        Some(entries) => entries,
        None => return Vec::new(),
    };
    let mut seen = HashSet::new();
    let mut items = Vec::new();
    for entry in entries {
        let raw: RawItem = match serde_json::from_value(entry.clone()) {
            Ok(raw) => raw,
            Err(e) => {
                debug!("dropping malformed item entry: {}", e);
                continue;
            }
        };
        let name = match raw.name.as_deref().map(str::trim) {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => continue,
        };
        let category = match raw.category.as_deref() {
            Some(label) => Category::parse_lenient(label).unwrap_or(Category::Otros),
            None => continue,
        };
        let status = match raw.status.as_deref().map(ItemStatus::from_str) {
            Some(Ok(status)) => status,
            _ => continue,
        };
        let id = match raw.id.filter(|id| !id.trim().is_empty()) {
            Some(id) => id,
            None => new_item_id(),
        };
        if !seen.insert(id.clone()) {
            debug!("dropping duplicate item id '{}'", id);
            continue;
        }
        items.push(Item {
            id,
            name,
            category,
            status,
            reason: match raw.reason.as_str() {
                Some("low") => Some(PurchaseReason::Low),
                Some("out_of_stock") => Some(PurchaseReason::OutOfStock),
                _ => None,
            },
            is_pending_purchase: raw.is_pending_purchase.as_bool().unwrap_or(false),
            buy_later: raw.buy_later.as_bool().unwrap_or(false),
            frozen_at: raw
                .frozen_at
                .as_str()
                .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
                .map(|d| d.with_timezone(&Utc)),
        });
    }
    items
}

fn sanitize_history(value: Option<&Value>) -> Vec<String> {
    let entries = match value.and_then(Value::as_array) {
        Some(entries) => entries,
        None => return Vec::new(),
    };
    let mut seen = HashSet::new();
    entries
        .iter()
        .filter_map(Value::as_str)
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .filter(|name| seen.insert(normalize_name(name)))
        .map(str::to_string)
        .collect()
}

fn sanitize_overrides(value: Option<&Value>) -> HashMap<String, Category> {
    let entries = match value.and_then(Value::as_object) {
        Some(entries) => entries,
        None => return HashMap::new(),
    };
    let mut overrides = HashMap::new();
    for (key, value) in entries {
        if key.trim().is_empty() {
            continue;
        }
        let category = match value.as_str().and_then(Category::parse_lenient) {
            Some(category) if !category.is_catch_all() => category,
            _ => {
                debug!("dropping override '{}' with unusable category", key);
                continue;
            }
        };
        overrides.insert(key.clone(), category);
    }
    overrides
}

/// Fold a legacy `savedItems` array into the history. Entries were
/// either bare name strings or full item objects depending on the app
/// version that wrote them.
fn migrate_saved_items(value: Option<&Value>, snapshot: &mut ListSnapshot) {
    let entries = match value.and_then(Value::as_array) {
        Some(entries) => entries,
        None => return,
    };
    let mut migrated = 0;
    for entry in entries {
        let name = entry
            .as_str()
            .or_else(|| entry.get("name").and_then(Value::as_str));
        if let Some(name) = name {
            if snapshot.remember_name(name) {
                migrated += 1;
            }
        }
    }
    if migrated > 0 {
        debug!("migrated {} legacy savedItems entries into history", migrated);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_category_labels_round_trip() {
        for category in Category::ALL {
            assert_eq!(Category::from_label(category.label()), Some(category));
        }
    }

    #[test]
    fn test_category_parse_lenient() {
        assert_eq!(
            Category::parse_lenient("lacteos y huevos"),
            Some(Category::LacteosYHuevos)
        );
        assert_eq!(
            Category::parse_lenient("Categoría: Bebidas."),
            Some(Category::Bebidas)
        );
        assert_eq!(Category::parse_lenient("OTROS"), Some(Category::Otros));
        assert_eq!(Category::parse_lenient("Electrónica"), None);
        assert_eq!(Category::parse_lenient(""), None);
    }

    #[test]
    fn test_item_serializes_camel_case() {
        let mut item = Item::new("Leche", Category::LacteosYHuevos, ItemStatus::Low);
        item.is_pending_purchase = true;
        let value = serde_json::to_value(&item).unwrap();
        assert_eq!(value["status"], "low");
        assert_eq!(value["isPendingPurchase"], true);
        assert_eq!(value["category"], "Lácteos y Huevos");
        assert!(value.get("reason").is_none());
        assert!(value.get("frozenAt").is_none());
    }

    #[test]
    fn test_decode_fills_missing_id() {
        let body = json!({
            "pantry": [
                { "name": "Pan", "category": "Panadería y Cereales", "status": "available" },
                { "name": "Sal", "category": "Conservas y Despensa", "status": "available" },
            ]
        });
        let snapshot = decode_snapshot(&body);
        assert_eq!(snapshot.pantry.len(), 2);
        assert!(!snapshot.pantry[0].id.is_empty());
        assert_ne!(snapshot.pantry[0].id, snapshot.pantry[1].id);
    }

    #[test]
    fn test_decode_first_id_wins() {
        let body = json!({
            "pantry": [
                { "id": "a", "name": "Pan", "category": "Otros", "status": "available" },
                { "id": "a", "name": "Sal", "category": "Otros", "status": "available" },
            ]
        });
        let snapshot = decode_snapshot(&body);
        assert_eq!(snapshot.pantry.len(), 1);
        assert_eq!(snapshot.pantry[0].name, "Pan");
    }

    #[test]
    fn test_decode_drops_incomplete_entries() {
        let body = json!({
            "shoppingList": [
                { "id": "a", "category": "Otros", "status": "low" },
                { "id": "b", "name": "Leche", "status": "low" },
                { "id": "c", "name": "Pan", "category": "Otros" },
                { "id": "d", "name": "Atún", "category": "Otros", "status": "plentiful" },
                "not an object",
                { "id": "e", "name": "Agua", "category": "Bebidas", "status": "out_of_stock" },
            ]
        });
        let snapshot = decode_snapshot(&body);
        assert_eq!(snapshot.shopping_list.len(), 1);
        assert_eq!(snapshot.shopping_list[0].name, "Agua");
    }

    #[test]
    fn test_decode_unknown_category_becomes_catch_all() {
        let body = json!({
            "pantry": [
                { "id": "a", "name": "Cosa", "category": "Ferretería", "status": "available" },
            ]
        });
        let snapshot = decode_snapshot(&body);
        assert_eq!(snapshot.pantry[0].category, Category::Otros);
    }

    #[test]
    fn test_decode_tolerates_bad_flag_types() {
        let body = json!({
            "pantry": [
                {
                    "id": "a",
                    "name": "Helado",
                    "category": "Congelados",
                    "status": "available",
                    "buyLater": "yes",
                    "isPendingPurchase": 1,
                    "frozenAt": "not a date",
                    "reason": 42,
                },
            ]
        });
        let snapshot = decode_snapshot(&body);
        let item = &snapshot.pantry[0];
        assert!(!item.buy_later);
        assert!(!item.is_pending_purchase);
        assert!(item.frozen_at.is_none());
        assert!(item.reason.is_none());
    }

    #[test]
    fn test_decode_non_object_body() {
        assert_eq!(decode_snapshot(&json!(null)), ListSnapshot::default());
        assert_eq!(decode_snapshot(&json!([1, 2])), ListSnapshot::default());
    }

    #[test]
    fn test_decode_overrides_keep_keys_verbatim() {
        let body = json!({
            "categoryOverrides": {
                "leche": "Lácteos y Huevos",
                "Pan Bimbo": "Panadería y Cereales",
                "rarezas": "Otros",
                "cosa": "No Existe",
                "": "Bebidas",
            }
        });
        let snapshot = decode_snapshot(&body);
        assert_eq!(
            snapshot.category_overrides.get("leche"),
            Some(&Category::LacteosYHuevos)
        );
        // Legacy keys are preserved as written, not re-normalized.
        assert_eq!(
            snapshot.category_overrides.get("Pan Bimbo"),
            Some(&Category::PanaderiaYCereales)
        );
        // Catch-all, unknown and empty-key entries are dropped.
        assert_eq!(snapshot.category_overrides.len(), 2);
    }

    #[test]
    fn test_decode_migrates_legacy_saved_items() {
        let body = json!({
            "pantry": [],
            "history": ["Pan"],
            "savedItems": [
                "Leche",
                { "name": "Huevos", "category": "Otros" },
                "pan",
                42,
            ]
        });
        let snapshot = decode_snapshot(&body);
        assert_eq!(snapshot.history, vec!["Pan", "Leche", "Huevos"]);
    }

    #[test]
    fn test_versioned_doc_skips_saved_items() {
        let body = json!({
            "schemaVersion": 2,
            "history": [],
            "savedItems": ["Leche"],
        });
        let snapshot = decode_snapshot(&body);
        assert!(snapshot.history.is_empty());
    }

    #[test]
    fn test_history_dedups_by_normalized_key() {
        let body = json!({
            "history": ["Manzanas", "manzana", "  ", "Pan"]
        });
        let snapshot = decode_snapshot(&body);
        assert_eq!(snapshot.history, vec!["Manzanas", "Pan"]);
    }

    #[test]
    fn test_encode_stamps_schema_version() {
        let body = encode_snapshot(&ListSnapshot::default()).unwrap();
        assert_eq!(body["schemaVersion"], 2);
        assert!(body["pantry"].is_array());
        assert!(body["categoryOverrides"].is_object());
    }

    #[test]
    fn test_remember_name_dedups() {
        let mut snapshot = ListSnapshot::default();
        assert!(snapshot.remember_name("Manzanas"));
        assert!(!snapshot.remember_name("  manzana "));
        assert!(!snapshot.remember_name(""));
        assert_eq!(snapshot.history, vec!["Manzanas"]);
    }

    #[test]
    fn test_stored_override_legacy_key() {
        let mut overrides = HashMap::new();
        overrides.insert("leches".to_string(), Category::LacteosYHuevos);
        // "Leches" normalizes to "leche", which misses; the legacy
        // lowercase key "leches" still hits.
        assert_eq!(
            stored_override(&overrides, "Leches"),
            Some(Category::LacteosYHuevos)
        );
        assert_eq!(stored_override(&overrides, "Pan"), None);
    }

    #[test]
    fn test_patch_from_changed_and_apply() {
        let mut snapshot = ListSnapshot::default();
        snapshot.pantry.push(Item::new(
            "Pan",
            Category::PanaderiaYCereales,
            ItemStatus::Available,
        ));
        snapshot.history.push("Pan".to_string());

        let changed = Changed {
            pantry: true,
            ..Default::default()
        };
        let patch = SnapshotPatch::from_changed(&snapshot, changed);
        assert!(patch.shopping_list.is_none());
        assert!(patch.history.is_none());

        let mut other = ListSnapshot::default();
        other.history.push("Sal".to_string());
        patch.apply_to(&mut other);
        assert_eq!(other.pantry.len(), 1);
        assert_eq!(other.history, vec!["Sal"]);
    }

    #[test]
    fn test_patch_serializes_only_present_fields() {
        let patch = SnapshotPatch {
            history: Some(vec!["Pan".to_string()]),
            ..Default::default()
        };
        let value = serde_json::to_value(&patch).unwrap();
        let obj = value.as_object().unwrap();
        assert_eq!(obj.len(), 1);
        assert!(obj.contains_key("history"));
    }
}
