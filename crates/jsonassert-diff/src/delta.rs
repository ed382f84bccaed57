//! The delta tree produced by the differ, and how to apply it.
//!
//! A [`Diff`] is the list of top-level deltas between two container roots.
//! Each [`Delta`] addresses one child of its enclosing container: object
//! deltas by member name, array deltas by index. Array deltas carry two
//! kinds of index:
//!
//! - *pre* indices (deletions, move sources) refer to the expected array
//! - *post* indices (additions, move targets, in-place changes) refer to the
//!   actual array
//!
//! Applying a delta list to an array removes every pre index in descending
//! order, then inserts or patches every post index in ascending order.

use std::cell::OnceCell;
use std::collections::BTreeMap;
use std::fmt;

use jsonassert_types::{JsonValue, Position, ValueKind};

use crate::error::{DeltaError, DeltaResult};
use crate::similarity::{mean_similarity, modified_similarity, moved_similarity, text_similarity};
use crate::text::EditScript;

/// Lazily computed similarity score.
///
/// Ignored by equality, so two deltas compare equal whether or not their
/// score has been computed yet.
#[derive(Clone, Default)]
pub struct SimilarityCache(OnceCell<f64>);

impl SimilarityCache {
    fn get_or_compute(&self, compute: impl FnOnce() -> f64) -> f64 {
        *self.0.get_or_init(compute)
    }
}

impl PartialEq for SimilarityCache {
    fn eq(&self, _other: &Self) -> bool {
        true
    }
}

impl fmt::Debug for SimilarityCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0.get() {
            Some(score) => write!(f, "{score}"),
            None => f.write_str("_"),
        }
    }
}

/// One change between the expected and the actual document.
#[derive(Clone, Debug, PartialEq)]
pub enum Delta {
    /// A member or element present only in the actual document.
    Added { position: Position, value: JsonValue },

    /// A member or element present only in the expected document.
    Deleted { position: Position, value: JsonValue },

    /// A value replaced by another at the same position.
    Modified {
        position: Position,
        old_value: JsonValue,
        new_value: JsonValue,
        similarity: SimilarityCache,
    },

    /// A long string edited in place, with a character-level script.
    TextDiff {
        position: Position,
        old_value: String,
        new_value: String,
        script: EditScript,
        similarity: SimilarityCache,
    },

    /// An array element relocated from `from` (expected) to `to` (actual),
    /// optionally changed on the way.
    Moved {
        from: usize,
        to: usize,
        value: JsonValue,
        delta: Option<Box<Delta>>,
        similarity: SimilarityCache,
    },

    /// Changes inside a nested object.
    Object {
        position: Position,
        deltas: Vec<Delta>,
        similarity: SimilarityCache,
    },

    /// Changes inside a nested array.
    Array {
        position: Position,
        deltas: Vec<Delta>,
        similarity: SimilarityCache,
    },
}

impl Delta {
    pub fn added(position: Position, value: JsonValue) -> Self {
        Self::Added { position, value }
    }

    pub fn deleted(position: Position, value: JsonValue) -> Self {
        Self::Deleted { position, value }
    }

    pub fn modified(position: Position, old_value: JsonValue, new_value: JsonValue) -> Self {
        Self::Modified {
            position,
            old_value,
            new_value,
            similarity: SimilarityCache::default(),
        }
    }

    /// Build a text delta, computing the edit script.
    pub fn text_diff(position: Position, old_value: String, new_value: String) -> Self {
        let script = EditScript::between(&old_value, &new_value);
        Self::TextDiff {
            position,
            old_value,
            new_value,
            script,
            similarity: SimilarityCache::default(),
        }
    }

    /// Build a move; a nested delta must be positioned at `Index(to)`.
    pub fn moved(from: usize, to: usize, value: JsonValue, delta: Option<Delta>) -> Self {
        Self::Moved {
            from,
            to,
            value,
            delta: delta.map(Box::new),
            similarity: SimilarityCache::default(),
        }
    }

    pub fn object(position: Position, deltas: Vec<Delta>) -> Self {
        Self::Object {
            position,
            deltas,
            similarity: SimilarityCache::default(),
        }
    }

    pub fn array(position: Position, deltas: Vec<Delta>) -> Self {
        Self::Array {
            position,
            deltas,
            similarity: SimilarityCache::default(),
        }
    }

    /// Short lowercase name of the delta kind, used in error messages.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Added { .. } => "added",
            Self::Deleted { .. } => "deleted",
            Self::Modified { .. } => "modified",
            Self::TextDiff { .. } => "text",
            Self::Moved { .. } => "moved",
            Self::Object { .. } => "object",
            Self::Array { .. } => "array",
        }
    }

    /// Similarity score in `[0, 1]`, computed once and cached.
    pub fn similarity(&self) -> f64 {
        match self {
            Self::Added { .. } | Self::Deleted { .. } => 0.0,
            Self::Modified {
                old_value,
                new_value,
                similarity,
                ..
            } => similarity.get_or_compute(|| modified_similarity(old_value, new_value)),
            Self::TextDiff {
                old_value,
                new_value,
                similarity,
                ..
            } => similarity.get_or_compute(|| text_similarity(old_value, new_value)),
            Self::Moved {
                from,
                to,
                delta,
                similarity,
                ..
            } => similarity.get_or_compute(|| {
                moved_similarity(*from, *to, delta.as_deref().map(Delta::similarity))
            }),
            Self::Object {
                deltas, similarity, ..
            }
            | Self::Array {
                deltas, similarity, ..
            } => similarity.get_or_compute(|| mean_similarity(deltas)),
        }
    }

    /// Position in the expected container, for deletions and move sources.
    pub fn pre_position(&self) -> Option<Position> {
        match self {
            Self::Deleted { position, .. } => Some(position.clone()),
            Self::Moved { from, .. } => Some(Position::Index(*from)),
            _ => None,
        }
    }

    /// Position in the actual container, for every delta except deletions.
    pub fn post_position(&self) -> Option<Position> {
        match self {
            Self::Deleted { .. } => None,
            Self::Moved { to, .. } => Some(Position::Index(*to)),
            Self::Added { position, .. }
            | Self::Modified { position, .. }
            | Self::TextDiff { position, .. }
            | Self::Object { position, .. }
            | Self::Array { position, .. } => Some(position.clone()),
        }
    }

    /// The position the delta is reported at: its post position, or the pre
    /// position for deletions.
    pub fn position(&self) -> Position {
        match self {
            Self::Moved { to, .. } => Position::Index(*to),
            Self::Added { position, .. }
            | Self::Deleted { position, .. }
            | Self::Modified { position, .. }
            | Self::TextDiff { position, .. }
            | Self::Object { position, .. }
            | Self::Array { position, .. } => position.clone(),
        }
    }

    pub fn pre_index(&self) -> Option<usize> {
        self.pre_position().and_then(|p| p.as_index())
    }

    pub fn post_index(&self) -> Option<usize> {
        self.post_position().and_then(|p| p.as_index())
    }

    /// The member name this delta addresses inside an object, if any.
    pub fn name(&self) -> Option<&str> {
        match self {
            Self::Moved { .. } => None,
            Self::Added { position, .. }
            | Self::Deleted { position, .. }
            | Self::Modified { position, .. }
            | Self::TextDiff { position, .. }
            | Self::Object { position, .. }
            | Self::Array { position, .. } => position.as_name(),
        }
    }

    /// Returns `true` for deltas that change a value without relocating it.
    pub fn is_in_place(&self) -> bool {
        matches!(
            self,
            Self::Modified { .. } | Self::TextDiff { .. } | Self::Object { .. } | Self::Array { .. }
        )
    }

    /// The same delta with its post index replaced.
    ///
    /// Used when sibling additions are dropped from an array delta list and
    /// the remaining actual-side indices shift down. Deletions are returned
    /// unchanged.
    pub fn with_post_index(self, index: usize) -> Self {
        let position = Position::Index(index);
        match self {
            Self::Deleted { .. } => self,
            Self::Added { value, .. } => Self::added(position, value),
            Self::Modified {
                old_value,
                new_value,
                ..
            } => Self::modified(position, old_value, new_value),
            Self::TextDiff {
                old_value,
                new_value,
                script,
                ..
            } => Self::TextDiff {
                position,
                old_value,
                new_value,
                script,
                similarity: SimilarityCache::default(),
            },
            Self::Moved {
                from, value, delta, ..
            } => Self::moved(from, index, value, delta.map(|d| d.with_post_index(index))),
            Self::Object { deltas, .. } => Self::object(position, deltas),
            Self::Array { deltas, .. } => Self::array(position, deltas),
        }
    }

    /// Replace `value` by what this delta turns it into.
    ///
    /// Only in-place deltas (modified, text, object, array) can be applied
    /// to a single value.
    pub fn apply_in_place(&self, value: JsonValue) -> DeltaResult<JsonValue> {
        match self {
            Self::Modified { new_value, .. } => Ok(new_value.clone()),
            Self::TextDiff { script, .. } => match value {
                JsonValue::String(text) => script.apply(&text).map(JsonValue::String),
                other => Err(DeltaError::MissingText {
                    found: other.kind(),
                }),
            },
            Self::Object { deltas, .. } => {
                expect_kind(self, &value, ValueKind::Object)?;
                apply_deltas(value, deltas)
            }
            Self::Array { deltas, .. } => {
                expect_kind(self, &value, ValueKind::Array)?;
                apply_deltas(value, deltas)
            }
            _ => Err(DeltaError::NotInPlace {
                delta: self.kind_name(),
            }),
        }
    }

    /// The value a move places at its target: the source value with the
    /// nested delta applied.
    pub fn moved_value(&self) -> DeltaResult<JsonValue> {
        match self {
            Self::Moved { value, delta, .. } => match delta {
                Some(nested) => nested.apply_in_place(value.clone()),
                None => Ok(value.clone()),
            },
            _ => Err(DeltaError::NotInPlace {
                delta: self.kind_name(),
            }),
        }
    }

    fn apply_to_object(&self, members: &mut BTreeMap<String, JsonValue>) -> DeltaResult<()> {
        let name = match self.name() {
            Some(name) => name.to_owned(),
            None => {
                return Err(DeltaError::PositionKind {
                    delta: self.kind_name(),
                    position: self.position(),
                    container: ValueKind::Object,
                })
            }
        };

        match self {
            Self::Added { value, .. } => {
                members.insert(name, value.clone());
            }
            Self::Deleted { .. } => {
                members.remove(&name).ok_or(DeltaError::MissingMember {
                    delta: self.kind_name(),
                    name,
                })?;
            }
            _ => {
                let current = members.remove(&name).ok_or_else(|| DeltaError::MissingMember {
                    delta: self.kind_name(),
                    name: name.clone(),
                })?;
                members.insert(name, self.apply_in_place(current)?);
            }
        }
        Ok(())
    }
}

fn expect_kind(delta: &Delta, value: &JsonValue, expected: ValueKind) -> DeltaResult<()> {
    if value.kind() == expected {
        Ok(())
    } else {
        Err(DeltaError::ContainerMismatch {
            delta: delta.kind_name(),
            expected,
            actual: value.kind(),
        })
    }
}

/// Apply a sibling delta list to the container `value`.
///
/// An empty list is a no-op for any value; a non-empty list requires an
/// object or an array.
pub fn apply_deltas(value: JsonValue, deltas: &[Delta]) -> DeltaResult<JsonValue> {
    match value {
        JsonValue::Object(mut members) => {
            for delta in deltas {
                delta.apply_to_object(&mut members)?;
            }
            Ok(JsonValue::Object(members))
        }
        JsonValue::Array(mut items) => {
            apply_to_array(&mut items, deltas)?;
            Ok(JsonValue::Array(items))
        }
        other => match deltas.first() {
            None => Ok(other),
            Some(delta) => Err(DeltaError::ContainerMismatch {
                delta: delta.kind_name(),
                expected: ValueKind::Object,
                actual: other.kind(),
            }),
        },
    }
}

fn apply_to_array(items: &mut Vec<JsonValue>, deltas: &[Delta]) -> DeltaResult<()> {
    let mut removals: Vec<(usize, &Delta)> = Vec::new();
    let mut placements: Vec<(usize, &Delta)> = Vec::new();

    for delta in deltas {
        let pre = delta.pre_position();
        let post = delta.post_position();
        for position in pre.iter().chain(post.iter()) {
            if position.as_index().is_none() {
                return Err(DeltaError::PositionKind {
                    delta: delta.kind_name(),
                    position: position.clone(),
                    container: ValueKind::Array,
                });
            }
        }
        if let Some(index) = pre.and_then(|p| p.as_index()) {
            removals.push((index, delta));
        }
        if let Some(index) = post.and_then(|p| p.as_index()) {
            placements.push((index, delta));
        }
    }

    removals.sort_by(|a, b| b.0.cmp(&a.0));
    for (index, delta) in removals {
        if index >= items.len() {
            return Err(DeltaError::IndexOutOfRange {
                delta: delta.kind_name(),
                index,
                len: items.len(),
            });
        }
        items.remove(index);
    }

    placements.sort_by_key(|(index, _)| *index);
    for (index, delta) in placements {
        let out_of_range = DeltaError::IndexOutOfRange {
            delta: delta.kind_name(),
            index,
            len: items.len(),
        };
        match delta {
            Delta::Added { value, .. } => {
                if index > items.len() {
                    return Err(out_of_range);
                }
                items.insert(index, value.clone());
            }
            Delta::Moved { .. } => {
                if index > items.len() {
                    return Err(out_of_range);
                }
                items.insert(index, delta.moved_value()?);
            }
            _ => {
                let slot = items.get_mut(index).ok_or(out_of_range)?;
                let current = std::mem::replace(slot, JsonValue::Null);
                *slot = delta.apply_in_place(current)?;
            }
        }
    }
    Ok(())
}

/// The differences between two container roots.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Diff {
    deltas: Vec<Delta>,
}

impl Diff {
    pub fn new(deltas: Vec<Delta>) -> Self {
        Self { deltas }
    }

    pub fn deltas(&self) -> &[Delta] {
        &self.deltas
    }

    pub fn into_deltas(self) -> Vec<Delta> {
        self.deltas
    }

    /// Number of top-level deltas.
    pub fn len(&self) -> usize {
        self.deltas.len()
    }

    /// Returns `true` if there are no deltas.
    pub fn is_empty(&self) -> bool {
        self.deltas.is_empty()
    }

    /// Returns `true` if the roots differ.
    pub fn is_modified(&self) -> bool {
        !self.deltas.is_empty()
    }

    /// Apply the diff to the expected root, yielding the actual root.
    pub fn apply(&self, expected: JsonValue) -> DeltaResult<JsonValue> {
        apply_deltas(expected, &self.deltas)
    }
}
