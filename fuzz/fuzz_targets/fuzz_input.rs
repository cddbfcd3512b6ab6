// SPDX-License-Identifier: PMPL-1.0
#![no_main]

use libfuzzer_sys::fuzz_target;
use std::sync::OnceLock;

use despensa::categorize::CategoryMatcher;
use despensa::normalize::normalize_name;

fn matcher() -> &'static CategoryMatcher {
    static MATCHER: OnceLock<CategoryMatcher> = OnceLock::new();
    MATCHER.get_or_init(CategoryMatcher::with_defaults)
}

fuzz_target!(|data: &str| {
    let normalized = normalize_name(data);

    // Canonical form: trimmed, lowercased, single spaces.
    assert_eq!(normalized, normalized.trim());
    assert!(!normalized.contains("  "));
    assert_eq!(normalized, normalized.to_lowercase());

    // Matching never panics and always reports the canonical form.
    let m = matcher().classify(data);
    assert_eq!(m.normalized_name, normalized);
});
