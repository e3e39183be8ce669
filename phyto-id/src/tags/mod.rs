//! Medicinal-property tags
//!
//! - [`vocabulary`]: controlled vocabulary, normalization rules, keyword heuristics
//! - [`canonicalizer`]: maps raw labels onto the vocabulary
//! - [`extract_property_mentions`]: pulls raw "anti-…" mentions out of free text

pub mod canonicalizer;
pub mod vocabulary;

pub use canonicalizer::{Resolution, TagCanonicalizer, TagSet};
pub use vocabulary::{KeywordRule, TagVocabulary};

use once_cell::sync::Lazy;
use regex::Regex;

/// "anti-<word>" or "anti <word>", case-insensitive, at a word boundary
static ANTI_MENTION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\banti[- ]([a-z]+)").expect("property mention pattern is valid")
});

/// Scan description text for property mentions
///
/// Each match becomes a raw tag `anti-<word>` (lowercased). Duplicates are kept
/// in order of appearance; the canonicalizer collapses them.
pub fn extract_property_mentions(text: &str) -> Vec<String> {
    ANTI_MENTION
        .captures_iter(text)
        .filter_map(|caps| caps.get(1))
        .map(|word| format!("anti-{}", word.as_str().to_lowercase()))
        .collect()
}
