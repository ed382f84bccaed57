//! Character-level edit scripts for long string values.
//!
//! Uses the `similar` crate (Myers diff algorithm) over characters, then
//! coalesces consecutive changes of the same kind into runs.

use std::fmt;

use jsonassert_types::quote;
use similar::{ChangeTag, TextDiff};

use crate::error::{DeltaError, DeltaResult};

/// A single run in an [`EditScript`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TextOp {
    /// Copy this many characters unchanged.
    Keep(usize),
    /// Drop this text from the old string.
    Delete(String),
    /// Emit this text into the new string.
    Insert(String),
}

/// Reversible character-level patch between two strings.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EditScript {
    ops: Vec<TextOp>,
}

impl EditScript {
    /// Compute the script turning `old` into `new`.
    pub fn between(old: &str, new: &str) -> Self {
        let diff = TextDiff::from_chars(old, new);
        let mut ops: Vec<TextOp> = Vec::new();

        for change in diff.iter_all_changes() {
            let text = change.value();
            match (change.tag(), ops.last_mut()) {
                (ChangeTag::Equal, Some(TextOp::Keep(n))) => *n += text.chars().count(),
                (ChangeTag::Equal, _) => ops.push(TextOp::Keep(text.chars().count())),
                (ChangeTag::Delete, Some(TextOp::Delete(run))) => run.push_str(text),
                (ChangeTag::Delete, _) => ops.push(TextOp::Delete(text.to_owned())),
                (ChangeTag::Insert, Some(TextOp::Insert(run))) => run.push_str(text),
                (ChangeTag::Insert, _) => ops.push(TextOp::Insert(text.to_owned())),
            }
        }

        Self { ops }
    }

    pub fn ops(&self) -> &[TextOp] {
        &self.ops
    }

    /// Returns `true` if the script changes nothing.
    pub fn is_identity(&self) -> bool {
        self.ops.iter().all(|op| matches!(op, TextOp::Keep(_)))
    }

    /// Number of characters deleted plus inserted.
    pub fn changed_chars(&self) -> usize {
        self.ops
            .iter()
            .map(|op| match op {
                TextOp::Keep(_) => 0,
                TextOp::Delete(text) | TextOp::Insert(text) => text.chars().count(),
            })
            .sum()
    }

    /// Run the script forward against `old`.
    ///
    /// The script must consume `old` exactly; kept and deleted runs that do
    /// not line up with the text fail with [`DeltaError::PatchFailed`].
    pub fn apply(&self, old: &str) -> DeltaResult<String> {
        let mut rest = old;
        let mut offset = 0usize;
        let mut out = String::with_capacity(old.len());

        for op in &self.ops {
            match op {
                TextOp::Keep(n) => {
                    let (kept, tail) = split_at_char(rest, *n).ok_or(DeltaError::PatchFailed {
                        offset,
                        reason: "kept run extends past end of text",
                    })?;
                    out.push_str(kept);
                    rest = tail;
                    offset += n;
                }
                TextOp::Delete(text) => {
                    rest = rest.strip_prefix(text.as_str()).ok_or(DeltaError::PatchFailed {
                        offset,
                        reason: "deleted run does not match text",
                    })?;
                    offset += text.chars().count();
                }
                TextOp::Insert(text) => out.push_str(text),
            }
        }

        if !rest.is_empty() {
            return Err(DeltaError::PatchFailed {
                offset,
                reason: "script ends before text",
            });
        }
        Ok(out)
    }

    /// Run the script backward against `new`, recovering the old string.
    pub fn revert(&self, new: &str) -> DeltaResult<String> {
        self.inverted().apply(new)
    }

    /// The script that undoes this one.
    pub fn inverted(&self) -> Self {
        let ops = self
            .ops
            .iter()
            .map(|op| match op {
                TextOp::Keep(n) => TextOp::Keep(*n),
                TextOp::Delete(text) => TextOp::Insert(text.clone()),
                TextOp::Insert(text) => TextOp::Delete(text.clone()),
            })
            .collect();
        Self { ops }
    }
}

/// Split after the first `n` characters, or `None` if `s` is shorter.
fn split_at_char(s: &str, n: usize) -> Option<(&str, &str)> {
    if n == 0 {
        return Some(("", s));
    }
    match s.char_indices().nth(n) {
        Some((at, _)) => Some(s.split_at(at)),
        None if s.chars().count() == n => Some((s, "")),
        None => None,
    }
}

impl fmt::Display for EditScript {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, op) in self.ops.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            match op {
                TextOp::Keep(n) => write!(f, "={n}")?,
                TextOp::Delete(text) => write!(f, "-{}", quote(text))?,
                TextOp::Insert(text) => write!(f, "+{}", quote(text))?,
            }
        }
        Ok(())
    }
}
