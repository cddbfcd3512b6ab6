// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Item lifecycle transitions
//!
//! The legal moves between the pantry and the shopping list, and which
//! flags travel (or get dropped) with each move. All functions mutate
//! the snapshot in place and report which collections they touched;
//! persisting the result is the caller's concern.
//!
//! An item keeps its id across every move, so a pantry entry and a
//! shopping entry with the same id are linked views of one product.

use chrono::Utc;

use crate::error::{DespensaError, Result};
use crate::model::{Category, Changed, Item, ItemStatus, ListSnapshot, PurchaseReason, Section};
use crate::normalize::normalize_name;

/// Mark a pantry item `available`, `low` or `out_of_stock`.
///
/// `out_of_stock` moves the record onto the shopping list, refreshing
/// the linked entry if one is already there; the other two statuses
/// change the pantry record in place. Setting the status an item
/// already has is a no-op.
pub fn set_status(
    snapshot: &mut ListSnapshot,
    item_id: &str,
    status: ItemStatus,
) -> Result<Changed> {
    let position = pantry_position(snapshot, item_id)?;
    match status {
        ItemStatus::Available | ItemStatus::Low => {
            let item = &mut snapshot.pantry[position];
            if item.status == status {
                return Ok(Changed::default());
            }
            item.status = status;
            Ok(Changed {
                pantry: true,
                ..Default::default()
            })
        }
        ItemStatus::OutOfStock => {
            let item = snapshot.pantry.remove(position);
            if let Some(linked) = snapshot.shopping_item_mut(&item.id) {
                linked.status = ItemStatus::OutOfStock;
                linked.reason = Some(PurchaseReason::OutOfStock);
            } else {
                snapshot.shopping_list.push(Item {
                    status: ItemStatus::OutOfStock,
                    reason: Some(PurchaseReason::OutOfStock),
                    is_pending_purchase: false,
                    ..item
                });
            }
            Ok(Changed {
                pantry: true,
                shopping_list: true,
                ..Default::default()
            })
        }
    }
}

/// Push a linked low-stock copy of a pantry item onto the shopping list.
///
/// The pantry record stays where it is with `isPendingPurchase` set;
/// pushing again while the copy is still pending is a no-op.
pub fn push_low_to_shopping(snapshot: &mut ListSnapshot, item_id: &str) -> Result<Changed> {
    let position = pantry_position(snapshot, item_id)?;
    {
        let item = &snapshot.pantry[position];
        if item.status != ItemStatus::Low {
            return Err(DespensaError::InvalidTransition(format!(
                "'{}' is not low on stock",
                item.name
            )));
        }
        if item.is_pending_purchase {
            return Ok(Changed::default());
        }
    }
    let (id, name, category) = {
        let item = &snapshot.pantry[position];
        (item.id.clone(), item.name.clone(), item.category)
    };
    if let Some(linked) = snapshot.shopping_item_mut(&id) {
        linked.status = ItemStatus::Low;
        linked.reason = Some(PurchaseReason::Low);
    } else {
        snapshot.shopping_list.push(Item {
            id,
            name,
            category,
            status: ItemStatus::Low,
            reason: Some(PurchaseReason::Low),
            is_pending_purchase: false,
            buy_later: false,
            frozen_at: None,
        });
    }
    snapshot.pantry[position].is_pending_purchase = true;
    Ok(Changed {
        pantry: true,
        shopping_list: true,
        ..Default::default()
    })
}

/// Check a shopping-list entry off as purchased.
///
/// The record leaves the shopping list and lands in the pantry as
/// freshly `available`; `buyLater`, `reason` and the pending flag are
/// all dropped on promotion.
pub fn check_off(snapshot: &mut ListSnapshot, item_id: &str) -> Result<Changed> {
    let position = shopping_position(snapshot, item_id)?;
    let bought = snapshot.shopping_list.remove(position);
    if let Some(linked) = snapshot.pantry_item_mut(&bought.id) {
        linked.status = ItemStatus::Available;
        linked.is_pending_purchase = false;
    } else {
        snapshot.pantry.push(Item {
            status: ItemStatus::Available,
            reason: None,
            is_pending_purchase: false,
            buy_later: false,
            ..bought
        });
    }
    Ok(Changed {
        pantry: true,
        shopping_list: true,
        ..Default::default()
    })
}

/// Return a low-stock shopping copy to the pantry without buying it.
///
/// Only entries with `reason = low` can return; the linked pantry item
/// loses its pending flag so it can be pushed again later. If the
/// pantry half is gone the copy is simply dropped.
pub fn return_to_pantry(snapshot: &mut ListSnapshot, item_id: &str) -> Result<Changed> {
    let position = shopping_position(snapshot, item_id)?;
    if snapshot.shopping_list[position].reason != Some(PurchaseReason::Low) {
        return Err(DespensaError::InvalidTransition(
            "only low-stock copies can return to the pantry".to_string(),
        ));
    }
    let removed = snapshot.shopping_list.remove(position);
    let mut changed = Changed {
        shopping_list: true,
        ..Default::default()
    };
    if let Some(linked) = snapshot.pantry_item_mut(&removed.id) {
        if linked.is_pending_purchase {
            linked.is_pending_purchase = false;
            changed.pantry = true;
        }
    }
    Ok(changed)
}

/// Delete an item from one collection.
///
/// Deleting a shopping entry that was a low-stock copy re-arms the
/// linked pantry item for future pushes.
pub fn remove_item(
    snapshot: &mut ListSnapshot,
    section: Section,
    item_id: &str,
) -> Result<Changed> {
    match section {
        Section::Pantry => {
            let position = pantry_position(snapshot, item_id)?;
            snapshot.pantry.remove(position);
            Ok(Changed {
                pantry: true,
                ..Default::default()
            })
        }
        Section::Shopping => {
            let position = shopping_position(snapshot, item_id)?;
            let removed = snapshot.shopping_list.remove(position);
            let mut changed = Changed {
                shopping_list: true,
                ..Default::default()
            };
            if removed.reason == Some(PurchaseReason::Low) {
                if let Some(linked) = snapshot.pantry_item_mut(&removed.id) {
                    if linked.is_pending_purchase {
                        linked.is_pending_purchase = false;
                        changed.pantry = true;
                    }
                }
            }
            Ok(changed)
        }
    }
}

/// Flag or unflag a shopping entry as "not on this trip".
pub fn set_buy_later(
    snapshot: &mut ListSnapshot,
    item_id: &str,
    buy_later: bool,
) -> Result<Changed> {
    let position = shopping_position(snapshot, item_id)?;
    let item = &mut snapshot.shopping_list[position];
    if item.buy_later == buy_later {
        return Ok(Changed::default());
    }
    item.buy_later = buy_later;
    Ok(Changed {
        shopping_list: true,
        ..Default::default()
    })
}

/// Freeze or unfreeze a pantry item, stamping `frozenAt` with now.
pub fn set_frozen(snapshot: &mut ListSnapshot, item_id: &str, frozen: bool) -> Result<Changed> {
    let position = pantry_position(snapshot, item_id)?;
    let item = &mut snapshot.pantry[position];
    if frozen == item.frozen_at.is_some() {
        return Ok(Changed::default());
    }
    item.frozen_at = if frozen { Some(Utc::now()) } else { None };
    Ok(Changed {
        pantry: true,
        ..Default::default()
    })
}

/// Add a resolved item to one collection.
///
/// Adding a name that already lives in the target collection (same
/// normalized key) merges into the existing record instead of creating
/// a duplicate: status and category are refreshed, the id survives.
/// Either way the name is recorded in the history. Returns the id of
/// the affected item.
pub fn add_resolved(
    snapshot: &mut ListSnapshot,
    name: &str,
    category: Category,
    status: ItemStatus,
    section: Section,
) -> Result<(String, Changed)> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(DespensaError::InvalidName("empty name".to_string()));
    }
    let key = normalize_name(trimmed);
    let mut changed = Changed::default();

    let list = snapshot.section_mut(section);
    let id = match list.iter().position(|i| normalize_name(&i.name) == key) {
        Some(position) => {
            let item = &mut list[position];
            if item.status != status {
                item.status = status;
                changed.mark(section);
            }
            if item.category != category {
                item.category = category;
                changed.mark(section);
            }
            item.id.clone()
        }
        None => {
            // Direct adds carry no purchase reason, even onto the
            // shopping list; a reason means stock ran out or low.
            let item = Item::new(trimmed, category, status);
            let id = item.id.clone();
            list.push(item);
            changed.mark(section);
            id
        }
    };

    if snapshot.remember_name(trimmed) {
        changed.history = true;
    }
    Ok((id, changed))
}

fn pantry_position(snapshot: &ListSnapshot, item_id: &str) -> Result<usize> {
    snapshot
        .pantry
        .iter()
        .position(|i| i.id == item_id)
        .ok_or_else(|| DespensaError::ItemNotFound(item_id.to_string()))
}

fn shopping_position(snapshot: &ListSnapshot, item_id: &str) -> Result<usize> {
    snapshot
        .shopping_list
        .iter()
        .position(|i| i.id == item_id)
        .ok_or_else(|| DespensaError::ItemNotFound(item_id.to_string()))
}
