// Tag Canonicalizer
//
// Resolves raw property labels onto the controlled vocabulary. Per raw tag,
// first match wins:
//   1. exact normalization rule
//   2. canonical membership
//   3. first keyword heuristic (table order) found as a substring
//   4. sanitized literal fallback (cleaned length > 2)
//   5. otherwise dropped
//
// Pure and total: no I/O, never fails.

use super::vocabulary::TagVocabulary;
use std::collections::BTreeSet;
use std::sync::Arc;

/// Set of resolved tags (ordered for deterministic output; order is not a contract)
pub type TagSet = BTreeSet<String>;

/// Cleaned tags at or below this length (in characters) are dropped
const MIN_FALLBACK_LEN: usize = 2;

/// How a raw tag was resolved
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// Matched a normalization rule
    Rule(String),
    /// Already a canonical tag
    Canonical(String),
    /// Matched a keyword heuristic
    Keyword(String),
    /// Not in the vocabulary; sanitized literal
    Fallback(String),
    /// Too short or nothing left after sanitizing
    Dropped,
}

impl Resolution {
    pub fn tag(&self) -> Option<&str> {
        match self {
            Resolution::Rule(t)
            | Resolution::Canonical(t)
            | Resolution::Keyword(t)
            | Resolution::Fallback(t) => Some(t),
            Resolution::Dropped => None,
        }
    }

    pub fn into_tag(self) -> Option<String> {
        match self {
            Resolution::Rule(t)
            | Resolution::Canonical(t)
            | Resolution::Keyword(t)
            | Resolution::Fallback(t) => Some(t),
            Resolution::Dropped => None,
        }
    }

    pub fn is_canonical(&self) -> bool {
        !matches!(self, Resolution::Fallback(_) | Resolution::Dropped)
    }
}

/// Maps raw property strings onto a [`TagVocabulary`]
#[derive(Debug, Clone)]
pub struct TagCanonicalizer {
    vocabulary: Arc<TagVocabulary>,
}

impl Default for TagCanonicalizer {
    fn default() -> Self {
        Self::new(TagVocabulary::builtin())
    }
}

impl TagCanonicalizer {
    pub fn new(vocabulary: Arc<TagVocabulary>) -> Self {
        Self { vocabulary }
    }

    pub fn vocabulary(&self) -> &TagVocabulary {
        &self.vocabulary
    }

    /// Canonicalize a batch of raw tags into a de-duplicated set
    pub fn canonicalize<I, S>(&self, raw_tags: I) -> TagSet
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        raw_tags
            .into_iter()
            .filter_map(|raw| self.resolve(raw.as_ref()).into_tag())
            .collect()
    }

    /// Resolve one raw tag
    pub fn resolve(&self, raw: &str) -> Resolution {
        let cleaned = raw.trim().to_lowercase();

        if let Some(tag) = self.vocabulary.normalize(&cleaned) {
            return Resolution::Rule(tag.to_string());
        }

        if self.vocabulary.contains(&cleaned) {
            return Resolution::Canonical(cleaned);
        }

        if let Some(rule) = self
            .vocabulary
            .keywords()
            .iter()
            .find(|rule| cleaned.contains(rule.keyword.as_str()))
        {
            return Resolution::Keyword(rule.tag.clone());
        }

        if cleaned.chars().count() <= MIN_FALLBACK_LEN {
            return Resolution::Dropped;
        }

        let literal = sanitize(&cleaned);
        if literal.is_empty() {
            Resolution::Dropped
        } else {
            Resolution::Fallback(literal)
        }
    }
}

/// Reduce a cleaned string to `[a-z0-9-]`, single hyphens, no hyphen at either end
pub fn sanitize(cleaned: &str) -> String {
    let mut out = String::with_capacity(cleaned.len());
    for c in cleaned.chars() {
        let c = if c.is_ascii_lowercase() || c.is_ascii_digit() {
            c
        } else {
            '-'
        };
        if c == '-' && (out.is_empty() || out.ends_with('-')) {
            continue;
        }
        out.push(c);
    }
    while out.ends_with('-') {
        out.pop();
    }
    out
}
