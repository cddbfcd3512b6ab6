// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Canonical name normalization for match keys
//!
//! Every comparison in the crate (keyword matching, override lookup,
//! history dedup) goes through [`normalize_name`] so that "Cúrcuma",
//! "curcuma" and "CURCUMA" all land on the same key.

use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Produce the canonical match key for an item name.
///
/// Trims, lowercases, strips diacritics ("cúrcuma" becomes "curcuma")
/// and lightly de-pluralizes every word so "Luces" and "luz" share a
/// key. Interior whitespace collapses to single spaces. The result is
/// used as the override-map and history key, so this must stay a pure
/// function of its input.
pub fn normalize_name(input: &str) -> String {
    input
        .trim()
        .to_lowercase()
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .collect::<String>()
        .split_whitespace()
        .map(singularize)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Strip the common Spanish plural endings from a single word.
///
/// Words of three characters or fewer are left alone. A trailing "ces"
/// collapses to "z" ("luces" becomes "luz"), "es" is stripped only when
/// a long stem remains, and a lone trailing "s" is stripped when the
/// stem keeps at least four characters.
fn singularize(word: &str) -> String {
    if word.chars().count() <= 3 {
        return word.to_string();
    }
    if let Some(stem) = word.strip_suffix("ces") {
        return format!("{stem}z");
    }
    if let Some(stem) = word.strip_suffix("es") {
        if stem.chars().count() > 4 {
            return stem.to_string();
        }
    }
    if let Some(stem) = word.strip_suffix('s') {
        if stem.chars().count() > 3 {
            return stem.to_string();
        }
    }
    word.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lowercases_and_trims() {
        assert_eq!(normalize_name("  Leche Entera  "), "leche entera");
    }

    #[test]
    fn test_strips_accents() {
        assert_eq!(normalize_name("CÚRCUMA"), "curcuma");
        assert_eq!(normalize_name("Azúcar"), "azucar");
        assert_eq!(normalize_name("Lasaña"), "lasana");
    }

    #[test]
    fn test_ces_plural_collapses_to_z() {
        assert_eq!(normalize_name("Luces"), "luz");
        assert_eq!(normalize_name("nueces"), "nuez");
    }

    #[test]
    fn test_es_plural_needs_long_stem() {
        // Stem "melon" is long enough, stem "lech" is not.
        assert_eq!(normalize_name("melones"), "melon");
        assert_eq!(normalize_name("leches"), "leche");
    }

    #[test]
    fn test_short_words_keep_their_s() {
        assert_eq!(normalize_name("tres"), "tres");
        assert_eq!(normalize_name("dos"), "dos");
        assert_eq!(normalize_name("gas"), "gas");
    }

    #[test]
    fn test_simple_plural() {
        assert_eq!(normalize_name("patatas"), "patata");
        assert_eq!(normalize_name("huevos"), "huevo");
    }

    #[test]
    fn test_collapses_interior_whitespace() {
        assert_eq!(normalize_name("tomate   frito"), "tomate frito");
        assert_eq!(normalize_name("papel\tde cocina"), "papel de cocina");
    }

    #[test]
    fn test_empty_and_blank() {
        assert_eq!(normalize_name(""), "");
        assert_eq!(normalize_name("   "), "");
    }

    #[test]
    fn test_idempotent_on_item_names() {
        let names = [
            "Leche Entera",
            "CÚRCUMA",
            "Luces",
            "tomates   fritos",
            "Manzanas",
            "papel higiénico",
            "Huevos",
            "nueces",
            "agua con gas",
        ];
        for name in names {
            let once = normalize_name(name);
            assert_eq!(normalize_name(&once), once, "not stable for {name:?}");
        }
    }
}
