//! Document identifiers derived from human-readable titles.
//!
//! A document's slug is both its manifest id and the stem of its output
//! file (`manifests/<slug>.json`), so it must be filesystem- and URL-safe.
//!
//! ## Rules
//!
//! 1. Lowercase.
//! 2. Drop ASCII punctuation (`!"#$%&'()*+,-./:;<=>?@[\]^_{|}~` and backtick).
//! 3. Trim, and collapse each run of whitespace into a single `-`.
//!
//! ```text
//! "Site - My, Document!"  → "site-my-document"
//! "site -  my document"   → "site-my-document"
//! "Dessau - Bauhaus (1928)" → "dessau-bauhaus-1928"
//! ```
//!
//! Two distinct titles can map to the same slug. The store detects this
//! when it happens within a run (see [`crate::store`]).

/// Normalize a title into a document identifier. Pure and total; may
/// return an empty string when the title holds nothing but punctuation.
pub fn slugify(title: &str) -> String {
    let stripped: String = title
        .to_lowercase()
        .chars()
        .filter(|c| !c.is_ascii_punctuation())
        .collect();
    stripped.split_whitespace().collect::<Vec<_>>().join("-")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn punctuation_and_spacing_variants_agree() {
        let a = slugify("Site - My, Document!");
        let b = slugify("site -  my document");
        assert_eq!(a, b);
        assert_eq!(a, "site-my-document");
    }

    #[test]
    fn short_site_and_title() {
        assert_eq!(slugify("S - T"), "s-t");
    }

    #[test]
    fn trims_outer_whitespace() {
        assert_eq!(slugify("  Bernau \t"), "bernau");
    }

    #[test]
    fn collapses_tabs_and_newlines() {
        assert_eq!(slugify("Letter\tto\n\nGropius"), "letter-to-gropius");
    }

    #[test]
    fn parentheses_removed() {
        assert_eq!(slugify("Dessau - Bauhaus (1928)"), "dessau-bauhaus-1928");
    }

    #[test]
    fn non_ascii_letters_kept_and_lowercased() {
        assert_eq!(slugify("Zürich - Ämter"), "zürich-ämter");
    }

    #[test]
    fn punctuation_only_is_empty() {
        assert_eq!(slugify(" - !?"), "");
    }

    #[test]
    fn empty_input() {
        assert_eq!(slugify(""), "");
    }

    #[test]
    fn deterministic() {
        let t = "Harvard - Mappe 12, Blatt 3";
        assert_eq!(slugify(t), slugify(t));
    }
}
