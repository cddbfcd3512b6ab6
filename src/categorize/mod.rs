// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Offline keyword matcher and the category resolution policy

pub mod keywords;

use async_trait::async_trait;
use serde::Serialize;
use std::cmp::Reverse;
use std::collections::HashMap;
use tracing::{debug, warn};

use crate::model::{stored_override, Category};
use crate::normalize::normalize_name;
use crate::Result;

/// Outcome of a local keyword classification.
#[derive(Debug, Clone, PartialEq)]
pub struct LocalMatch {
    pub category: Option<Category>,
    pub matched_keyword: Option<String>,
    pub normalized_name: String,
}

/// Remote classifier collaborator: an opaque, fallible name-to-category
/// service. Implementations must not panic on arbitrary names.
#[async_trait]
pub trait Classifier: Send + Sync {
    async fn classify(&self, name: &str) -> Result<Category>;
}

/// Keyword-backed offline classifier.
///
/// The (keyword, category) pairs are flattened once at construction and
/// sorted by keyword length, longest first, so a more specific keyword
/// ("tomate frito") always beats a shorter one ("tomate") when both
/// occur in the same name. Matching is plain substring containment over
/// normalized text; a short keyword inside an unrelated longer word can
/// false-positive, which the length ordering keeps rare.
pub struct CategoryMatcher {
    entries: Vec<(String, Category)>,
}

impl CategoryMatcher {
    /// Build a matcher from an explicit keyword table. Entries for the
    /// catch-all category are ignored; it never matches by keyword.
    pub fn new(table: &[(Category, &[&str])]) -> Self {
        let mut entries: Vec<(String, Category)> = Vec::new();
        for (category, words) in table {
            if category.is_catch_all() {
                continue;
            }
            for word in *words {
                let keyword = normalize_name(word);
                if !keyword.is_empty() {
                    entries.push((keyword, *category));
                }
            }
        }
        // Stable sort keeps table order among equal-length keywords, so
        // matching stays deterministic for a given table.
        entries.sort_by_key(|(keyword, _)| Reverse(keyword.chars().count()));
        Self { entries }
    }

    /// Matcher over the built-in Spanish keyword table.
    pub fn with_defaults() -> Self {
        Self::new(keywords::DEFAULT_KEYWORDS)
    }

    /// Classify a name using only the keyword table.
    pub fn classify(&self, name: &str) -> LocalMatch {
        let normalized_name = normalize_name(name);
        if normalized_name.is_empty() {
            return LocalMatch {
                category: None,
                matched_keyword: None,
                normalized_name,
            };
        }
        for (keyword, category) in &self.entries {
            if normalized_name.contains(keyword.as_str()) {
                return LocalMatch {
                    category: Some(*category),
                    matched_keyword: Some(keyword.clone()),
                    normalized_name,
                };
            }
        }
        LocalMatch {
            category: None,
            matched_keyword: None,
            normalized_name,
        }
    }

    /// Number of loaded keywords.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for CategoryMatcher {
    fn default() -> Self {
        Self::with_defaults()
    }
}

/// Where a resolved category came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ResolutionSource {
    Override,
    Local,
    Ai,
    Fallback,
}

/// A resolved category together with its provenance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Resolution {
    pub category: Category,
    pub source: ResolutionSource,
}

/// Resolve the final category for an item name.
///
/// Priority: explicit caller choice, stored override (normalized key,
/// then legacy lowercase key), local keyword match, remote classifier,
/// catch-all. A classifier error or a classifier answer of the
/// catch-all both degrade to the fallback; the sweep and the add path
/// keep working without AI. Writing `local`/`ai` results back into the
/// override map is the caller's job; this function has no side effects.
pub async fn resolve_category(
    name: &str,
    explicit: Option<Category>,
    overrides: &HashMap<String, Category>,
    matcher: &CategoryMatcher,
    classifier: Option<&dyn Classifier>,
) -> Resolution {
    if let Some(category) = explicit {
        return Resolution {
            category,
            source: ResolutionSource::Override,
        };
    }
    if let Some(category) = stored_override(overrides, name) {
        return Resolution {
            category,
            source: ResolutionSource::Override,
        };
    }
    let local = matcher.classify(name);
    if let Some(category) = local.category {
        debug!(
            "local match '{}' -> {} (keyword '{}')",
            name,
            category,
            local.matched_keyword.as_deref().unwrap_or("")
        );
        return Resolution {
            category,
            source: ResolutionSource::Local,
        };
    }
    if let Some(classifier) = classifier {
        match classifier.classify(name).await {
            Ok(category) if !category.is_catch_all() => {
                return Resolution {
                    category,
                    source: ResolutionSource::Ai,
                };
            }
            Ok(_) => debug!("classifier had no confident category for '{}'", name),
            Err(e) => warn!("classifier failed for '{}': {}", name, e),
        }
    }
    Resolution {
        category: Category::Otros,
        source: ResolutionSource::Fallback,
    }
}

/// Record a `local`/`ai` resolution in the override map so the next
/// lookup for the same name short-circuits. Returns true when the map
/// changed. Explicit and fallback results are never written: the first
/// is already user state, the second carries no information.
pub fn remember_resolution(
    overrides: &mut HashMap<String, Category>,
    name: &str,
    resolution: Resolution,
) -> bool {
    if !matches!(
        resolution.source,
        ResolutionSource::Local | ResolutionSource::Ai
    ) {
        return false;
    }
    if resolution.category.is_catch_all() {
        return false;
    }
    let key = normalize_name(name);
    if key.is_empty() {
        return false;
    }
    match overrides.insert(key, resolution.category) {
        Some(previous) if previous == resolution.category => false,
        _ => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedClassifier(Category);

    #[async_trait]
    impl Classifier for FixedClassifier {
        async fn classify(&self, _name: &str) -> Result<Category> {
            Ok(self.0)
        }
    }

    struct FailingClassifier;

    #[async_trait]
    impl Classifier for FailingClassifier {
        async fn classify(&self, name: &str) -> Result<Category> {
            Err(crate::DespensaError::ClassifierUnavailable(format!(
                "no backend for '{name}'"
            )))
        }
    }

    #[test]
    fn test_basic_keyword_match() {
        let matcher = CategoryMatcher::with_defaults();
        assert_eq!(
            matcher.classify("Tomate").category,
            Some(Category::FrutasYVerduras)
        );
        assert_eq!(
            matcher.classify("Leche entera").category,
            Some(Category::LacteosYHuevos)
        );
        assert_eq!(
            matcher.classify("detergente lavadora").category,
            Some(Category::LimpiezaYHogar)
        );
    }

    #[test]
    fn test_longer_keyword_wins() {
        let matcher = CategoryMatcher::with_defaults();
        assert_eq!(
            matcher.classify("Tomate frito").category,
            Some(Category::ConservasYDespensa)
        );
        assert_eq!(
            matcher.classify("naranjada").category,
            Some(Category::Bebidas)
        );
        assert_eq!(
            matcher.classify("naranjas").category,
            Some(Category::FrutasYVerduras)
        );
        assert_eq!(
            matcher.classify("leche condensada").category,
            Some(Category::ConservasYDespensa)
        );
    }

    #[test]
    fn test_match_ignores_accents_and_case() {
        let matcher = CategoryMatcher::with_defaults();
        assert_eq!(
            matcher.classify("CÚRCUMA").category,
            Some(Category::ConservasYDespensa)
        );
        assert_eq!(
            matcher.classify("  Atún  ").category,
            Some(Category::ConservasYDespensa)
        );
    }

    #[test]
    fn test_match_on_pluralized_name() {
        let matcher = CategoryMatcher::with_defaults();
        assert_eq!(
            matcher.classify("Manzanas").category,
            Some(Category::FrutasYVerduras)
        );
        assert_eq!(
            matcher.classify("yogures").category,
            Some(Category::LacteosYHuevos)
        );
    }

    #[test]
    fn test_no_match() {
        let matcher = CategoryMatcher::with_defaults();
        let result = matcher.classify("wasabi");
        assert_eq!(result.category, None);
        assert_eq!(result.matched_keyword, None);
        assert_eq!(result.normalized_name, "wasabi");
    }

    #[test]
    fn test_empty_name_never_matches() {
        let matcher = CategoryMatcher::with_defaults();
        assert_eq!(matcher.classify("   ").category, None);
    }

    #[test]
    fn test_catch_all_keywords_are_ignored() {
        let table: &[(Category, &[&str])] = &[(Category::Otros, &["otro"])];
        let matcher = CategoryMatcher::new(table);
        assert!(matcher.is_empty());
        assert_eq!(matcher.classify("otros").category, None);
    }

    #[tokio::test]
    async fn test_explicit_choice_wins() {
        let matcher = CategoryMatcher::with_defaults();
        let mut overrides = HashMap::new();
        overrides.insert("leche".to_string(), Category::ConservasYDespensa);
        let resolution = resolve_category(
            "Leche",
            Some(Category::Bebidas),
            &overrides,
            &matcher,
            None,
        )
        .await;
        assert_eq!(resolution.category, Category::Bebidas);
        assert_eq!(resolution.source, ResolutionSource::Override);
    }

    #[tokio::test]
    async fn test_stored_override_beats_local_match() {
        let matcher = CategoryMatcher::with_defaults();
        let mut overrides = HashMap::new();
        overrides.insert("leche".to_string(), Category::ConservasYDespensa);
        // "Leches" normalizes to "leche", hitting the override even
        // though the keyword table says dairy.
        let resolution = resolve_category("Leches", None, &overrides, &matcher, None).await;
        assert_eq!(resolution.category, Category::ConservasYDespensa);
        assert_eq!(resolution.source, ResolutionSource::Override);
    }

    #[tokio::test]
    async fn test_legacy_lowercase_override_key() {
        let matcher = CategoryMatcher::new(&[]);
        let mut overrides = HashMap::new();
        overrides.insert("leches".to_string(), Category::LacteosYHuevos);
        let resolution = resolve_category("Leches", None, &overrides, &matcher, None).await;
        assert_eq!(resolution.category, Category::LacteosYHuevos);
        assert_eq!(resolution.source, ResolutionSource::Override);
    }

    #[tokio::test]
    async fn test_local_match_when_no_override() {
        let matcher = CategoryMatcher::with_defaults();
        let resolution =
            resolve_category("Tomate frito", None, &HashMap::new(), &matcher, None).await;
        assert_eq!(resolution.category, Category::ConservasYDespensa);
        assert_eq!(resolution.source, ResolutionSource::Local);
    }

    #[tokio::test]
    async fn test_classifier_consulted_after_local_miss() {
        let matcher = CategoryMatcher::with_defaults();
        let classifier = FixedClassifier(Category::ConservasYDespensa);
        let resolution = resolve_category(
            "wasabi",
            None,
            &HashMap::new(),
            &matcher,
            Some(&classifier),
        )
        .await;
        assert_eq!(resolution.category, Category::ConservasYDespensa);
        assert_eq!(resolution.source, ResolutionSource::Ai);
    }

    #[tokio::test]
    async fn test_classifier_failure_degrades_to_fallback() {
        let matcher = CategoryMatcher::with_defaults();
        let resolution = resolve_category(
            "wasabi",
            None,
            &HashMap::new(),
            &matcher,
            Some(&FailingClassifier),
        )
        .await;
        assert_eq!(resolution.category, Category::Otros);
        assert_eq!(resolution.source, ResolutionSource::Fallback);
    }

    #[tokio::test]
    async fn test_classifier_catch_all_answer_is_fallback() {
        let matcher = CategoryMatcher::with_defaults();
        let classifier = FixedClassifier(Category::Otros);
        let resolution = resolve_category(
            "wasabi",
            None,
            &HashMap::new(),
            &matcher,
            Some(&classifier),
        )
        .await;
        assert_eq!(resolution.source, ResolutionSource::Fallback);
    }

    #[tokio::test]
    async fn test_unknown_name_without_classifier() {
        let matcher = CategoryMatcher::with_defaults();
        let resolution =
            resolve_category("cosa rara", None, &HashMap::new(), &matcher, None).await;
        assert_eq!(resolution.category, Category::Otros);
        assert_eq!(resolution.source, ResolutionSource::Fallback);
    }

    #[test]
    fn test_remember_resolution() {
        let mut overrides = HashMap::new();
        let local = Resolution {
            category: Category::Bebidas,
            source: ResolutionSource::Local,
        };
        assert!(remember_resolution(&mut overrides, "Zumo de piña", local));
        assert_eq!(
            overrides.get("zumo de pina"),
            Some(&Category::Bebidas)
        );
        // Same result again is a no-op.
        assert!(!remember_resolution(&mut overrides, "zumo de piña", local));
    }

    #[test]
    fn test_remember_skips_override_and_fallback_sources() {
        let mut overrides = HashMap::new();
        let explicit = Resolution {
            category: Category::Bebidas,
            source: ResolutionSource::Override,
        };
        let fallback = Resolution {
            category: Category::Otros,
            source: ResolutionSource::Fallback,
        };
        assert!(!remember_resolution(&mut overrides, "zumo", explicit));
        assert!(!remember_resolution(&mut overrides, "cosa", fallback));
        assert!(overrides.is_empty());
    }

    #[test]
    fn test_remember_never_stores_catch_all() {
        let mut overrides = HashMap::new();
        let odd = Resolution {
            category: Category::Otros,
            source: ResolutionSource::Ai,
        };
        assert!(!remember_resolution(&mut overrides, "cosa", odd));
        assert!(overrides.is_empty());
    }
}
