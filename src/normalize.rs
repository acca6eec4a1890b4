//! Free-text normalization for address comparison.
//!
//! Two modes exist on purpose. Search normalization is light (case and
//! whitespace only, plus a fixed punctuation strip) because suffix words like
//! "street" carry search signal. Dedup normalization additionally drops
//! street-suffix tokens so "123 Main St" and "123 Main Street" collapse to
//! the same key when deciding whether two addresses are the same.
//!
//! Both modes are pure, total, and idempotent; empty input yields an empty key.

use serde::{Deserialize, Serialize};

use crate::model::AddressRecord;

/// Punctuation stripped by both modes.
const STRIP_CHARS: [char; 3] = ['.', ',', ';'];

/// Street-suffix tokens dropped by dedup normalization.
const SUFFIX_TOKENS: [&str; 8] = [
    "st", "street", "rd", "road", "ave", "avenue", "blvd", "boulevard",
];

/// A canonical string form of free text, used for equality and lookup
/// comparisons independent of formatting differences. Derived, never
/// persisted.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NormalizedKey(String);

impl NormalizedKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whitespace-separated tokens of the key.
    pub fn tokens(&self) -> impl Iterator<Item = &str> {
        self.0.split_whitespace()
    }
}

impl std::fmt::Display for NormalizedKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Search normalization: lowercase, strip `. , ;`, collapse whitespace.
///
/// Used for query matching and as the location index key.
pub fn search_normalize(text: &str) -> NormalizedKey {
    NormalizedKey(collapse(text))
}

/// Dedup normalization: search normalization plus street-suffix stripping.
///
/// Used wherever a "is this the same address" decision is made (manual-entry
/// commit, import dedup), so duplicate detection cannot silently diverge
/// between paths.
pub fn dedup_normalize(text: &str) -> NormalizedKey {
    let collapsed = collapse(text);
    let kept: Vec<&str> = collapsed
        .split(' ')
        .filter(|token| !token.is_empty() && !SUFFIX_TOKENS.contains(token))
        .collect();
    NormalizedKey(kept.join(" "))
}

/// Builds the searchable key for a record from its location name, street,
/// city, and state.
pub fn record_search_key(record: &AddressRecord) -> NormalizedKey {
    let mut parts: Vec<&str> = Vec::with_capacity(4);
    if let Some(name) = record.location_name.as_deref() {
        if !name.trim().is_empty() {
            parts.push(name);
        }
    }
    parts.push(&record.street);
    parts.push(&record.city);
    parts.push(&record.state);
    search_normalize(&parts.join(" "))
}

/// Builds the dedup key for a record (no location name; two records with
/// the same street/city/state are the same physical address).
pub fn record_dedup_key(record: &AddressRecord) -> NormalizedKey {
    dedup_normalize(&format!("{} {} {}", record.street, record.city, record.state))
}

fn collapse(text: &str) -> String {
    let lowered = text.to_lowercase();
    let stripped: String = lowered
        .chars()
        .map(|ch| if STRIP_CHARS.contains(&ch) { ' ' } else { ch })
        .collect();
    stripped.split_whitespace().collect::<Vec<_>>().join(" ")
}
