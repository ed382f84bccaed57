//! Similarity scores in `[0, 1]` used to pair array elements and rank moves.
//!
//! A score of 1 means "identical", 0 means "nothing in common". Additions and
//! deletions always score 0; the other delta kinds score by how much of the
//! value survived.

use jsonassert_types::{JsonNumber, JsonValue};
use similar::TextDiff;

use crate::delta::Delta;

/// Base score of a value that stayed at its position.
pub const SAME_POSITION: f64 = 0.3;
/// Bonus when the old and new values share a kind.
pub const SAME_KIND: f64 = 0.3;
/// Weight of content closeness for same-kind scalars.
pub const CONTENT_WEIGHT: f64 = 0.4;
/// Base score of a moved element (its content is intact).
pub const MOVED_CONTENT: f64 = 0.6;
/// Weight of index closeness for moved elements.
pub const MOVED_INDEX_WEIGHT: f64 = 0.4;

/// Character-level similarity ratio of two strings.
pub fn string_similarity(a: &str, b: &str) -> f64 {
    if a == b {
        return 1.0;
    }
    clamp(f64::from(TextDiff::from_chars(a, b).ratio()))
}

/// Ratio of the smaller to the larger magnitude.
pub fn number_closeness(a: &JsonNumber, b: &JsonNumber) -> f64 {
    if a == b {
        return 1.0;
    }
    let (x, y) = (a.as_f64().abs(), b.as_f64().abs());
    let max = x.max(y);
    if max == 0.0 {
        return 1.0;
    }
    clamp(x.min(y) / max)
}

/// Score of a value replaced in place by another.
pub fn modified_similarity(old: &JsonValue, new: &JsonValue) -> f64 {
    let mut score = SAME_POSITION;
    if old.kind() == new.kind() {
        score += SAME_KIND;
        score += CONTENT_WEIGHT
            * match (old, new) {
                (JsonValue::String(a), JsonValue::String(b)) => string_similarity(a, b),
                (JsonValue::Number(a), JsonValue::Number(b)) => number_closeness(a, b),
                _ => 0.0,
            };
    }
    clamp(score)
}

/// Score of a string edited in place.
pub fn text_similarity(old: &str, new: &str) -> f64 {
    clamp(SAME_POSITION + SAME_KIND + CONTENT_WEIGHT * string_similarity(old, new))
}

/// Ratio of the smaller to the larger index.
pub fn index_closeness(from: usize, to: usize) -> f64 {
    let max = from.max(to);
    if max == 0 {
        return 1.0;
    }
    from.min(to) as f64 / max as f64
}

/// Score of an element moved from one index to another, optionally changed.
pub fn moved_similarity(from: usize, to: usize, nested: Option<f64>) -> f64 {
    let base = MOVED_CONTENT + MOVED_INDEX_WEIGHT * index_closeness(from, to);
    clamp(match nested {
        Some(nested) => (base + nested) / 2.0,
        None => base,
    })
}

/// Mean similarity of sibling deltas; an empty list is identical.
pub fn mean_similarity(deltas: &[Delta]) -> f64 {
    if deltas.is_empty() {
        return 1.0;
    }
    let sum: f64 = deltas.iter().map(Delta::similarity).sum();
    clamp(sum / deltas.len() as f64)
}

/// Similarity of two containers: unchanged children count as 1.
pub fn weighted_similarity(unchanged: usize, deltas: &[Delta]) -> f64 {
    let total = unchanged + deltas.len();
    if total == 0 {
        return 1.0;
    }
    let sum: f64 = deltas.iter().map(Delta::similarity).sum();
    clamp((unchanged as f64 + sum) / total as f64)
}

fn clamp(score: f64) -> f64 {
    score.clamp(0.0, 1.0)
}
