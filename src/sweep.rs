// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Bulk reclassification of catch-all items
//!
//! Items land in `Otros` whenever they were added while the keyword
//! table missed and no classifier was reachable. The sweep walks both
//! collections and re-runs the full resolution policy over every such
//! item, so a later keyword-table update or a recovered AI backend can
//! repair old data in one pass.

use serde::Serialize;
use tracing::info;

use crate::categorize::{
    remember_resolution, resolve_category, CategoryMatcher, Classifier, ResolutionSource,
};
use crate::model::{stored_override, Category, Changed, ListSnapshot};

/// Cap on before/after examples carried in a sweep summary.
const SAMPLE_LIMIT: usize = 5;

/// Per-source tallies for one sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SourceCounts {
    #[serde(rename = "override")]
    pub overrides: usize,
    pub local: usize,
    pub ai: usize,
    pub fallback: usize,
}

impl SourceCounts {
    fn tally(&mut self, source: ResolutionSource) {
        match source {
            ResolutionSource::Override => self.overrides += 1,
            ResolutionSource::Local => self.local += 1,
            ResolutionSource::Ai => self.ai += 1,
            ResolutionSource::Fallback => self.fallback += 1,
        }
    }
}

/// One before/after example from a sweep.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SweepSample {
    pub name: String,
    pub from: Category,
    pub to: Category,
    pub source: ResolutionSource,
}

/// Result summary of one reclassification sweep.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SweepSummary {
    /// Catch-all items with a usable name that were examined.
    pub candidates: usize,
    /// Items whose category actually changed.
    pub updated: usize,
    pub by_source: SourceCounts,
    /// Up to [`SAMPLE_LIMIT`] before/after examples.
    pub samples: Vec<SweepSample>,
}

/// A sweep's mutations plus its reportable summary.
#[derive(Debug)]
pub struct SweepOutcome {
    pub changed: Changed,
    pub summary: SweepSummary,
}

/// Re-resolve every catch-all item in the snapshot, mutating it in place.
///
/// Per-item classifier failures degrade that one item to the fallback
/// and never abort the sweep. Resolutions from the keyword table or the
/// classifier are written back into the override map as they happen, so
/// repeated names resolve from the map instead of hitting the backend
/// again. Running the sweep twice in a row updates nothing the second
/// time.
pub async fn reclassify_all(
    snapshot: &mut ListSnapshot,
    matcher: &CategoryMatcher,
    classifier: Option<&dyn Classifier>,
) -> SweepOutcome {
    let mut summary = SweepSummary::default();
    let mut changed = Changed::default();

    let ListSnapshot {
        pantry,
        shopping_list,
        category_overrides,
        ..
    } = snapshot;

    for (items, in_pantry) in [(pantry, true), (shopping_list, false)] {
        for item in items.iter_mut() {
            if !item.category.is_catch_all() || item.name.trim().is_empty() {
                continue;
            }
            summary.candidates += 1;

            let hint = stored_override(category_overrides, &item.name);
            let resolution =
                resolve_category(&item.name, hint, category_overrides, matcher, classifier)
                    .await;
            summary.by_source.tally(resolution.source);

            if remember_resolution(category_overrides, &item.name, resolution) {
                changed.category_overrides = true;
            }
            if resolution.category != item.category {
                if summary.samples.len() < SAMPLE_LIMIT {
                    summary.samples.push(SweepSample {
                        name: item.name.clone(),
                        from: item.category,
                        to: resolution.category,
                        source: resolution.source,
                    });
                }
                item.category = resolution.category;
                summary.updated += 1;
                if in_pantry {
                    changed.pantry = true;
                } else {
                    changed.shopping_list = true;
                }
            }
        }
    }

    info!(
        "reclassification sweep: {} candidates, {} updated ({} local, {} ai, {} override, {} fallback)",
        summary.candidates,
        summary.updated,
        summary.by_source.local,
        summary.by_source.ai,
        summary.by_source.overrides,
        summary.by_source.fallback,
    );
    SweepOutcome { changed, summary }
}
