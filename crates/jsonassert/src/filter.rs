//! Equivalence rules applied on top of a raw structural diff.
//!
//! The differ reports every difference. The filter then drops the ones the
//! expected document asked to tolerate:
//!
//! - values whose expected side is the ignore marker
//! - placeholders, which capture the actual value the first time they are
//!   seen and must match it afterwards
//! - additions, in subset mode

use jsonassert_diff::Delta;
use jsonassert_types::JsonValue;
use jsonassert_vars::VarStore;

/// What to do with a changed value.
enum Verdict {
    Drop,
    Keep,
    /// Keep the change, reporting the captured value as the expected one.
    Captured(JsonValue),
}

/// Filters a delta list according to the comparison rules.
pub struct DeltaFilter<'a> {
    ignore_diff: &'a str,
    vars: Option<&'a mut dyn VarStore>,
    keep_additions: bool,
}

impl<'a> DeltaFilter<'a> {
    /// A filter honouring `ignore_diff` (empty disables it).
    ///
    /// With `keep_additions` false, members and elements present only in the
    /// actual document are not differences.
    pub fn new(ignore_diff: &'a str, keep_additions: bool) -> Self {
        Self {
            ignore_diff,
            vars: None,
            keep_additions,
        }
    }

    /// Resolve placeholders against `vars`, capturing new values into it.
    pub fn with_vars(mut self, vars: &'a mut dyn VarStore) -> Self {
        self.vars = Some(vars);
        self
    }

    /// Filter one sibling list.
    ///
    /// Containers whose children are all filtered out disappear. When array
    /// additions are dropped, the actual-side indices of the remaining deltas
    /// shift down so the list still describes a consistent transformation.
    pub fn filter(&mut self, deltas: Vec<Delta>) -> Vec<Delta> {
        let mut kept = Vec::with_capacity(deltas.len());
        let mut dropped_indices = Vec::new();

        for delta in deltas {
            if let Delta::Added { position, .. } = &delta {
                if !self.keep_additions {
                    dropped_indices.extend(position.as_index());
                    continue;
                }
            }
            kept.extend(self.filter_one(delta));
        }

        if dropped_indices.is_empty() {
            return kept;
        }
        dropped_indices.sort_unstable();
        kept.into_iter()
            .map(|delta| match delta.post_index() {
                Some(index) => {
                    let shift = dropped_indices.partition_point(|&dropped| dropped < index);
                    if shift == 0 {
                        delta
                    } else {
                        delta.with_post_index(index - shift)
                    }
                }
                None => delta,
            })
            .collect()
    }

    fn filter_one(&mut self, delta: Delta) -> Option<Delta> {
        match delta {
            Delta::Modified {
                position,
                old_value,
                new_value,
                ..
            } => match self.judge(&old_value, &new_value) {
                Verdict::Drop => None,
                Verdict::Keep => Some(Delta::modified(position, old_value, new_value)),
                Verdict::Captured(captured) => Some(Delta::modified(position, captured, new_value)),
            },
            Delta::TextDiff {
                position,
                old_value,
                new_value,
                script,
                similarity,
            } => {
                let old = JsonValue::String(old_value);
                let new = JsonValue::String(new_value);
                match self.judge(&old, &new) {
                    Verdict::Drop => None,
                    Verdict::Captured(captured) => Some(Delta::modified(position, captured, new)),
                    Verdict::Keep => match (old, new) {
                        (JsonValue::String(old_value), JsonValue::String(new_value)) => {
                            Some(Delta::TextDiff {
                                position,
                                old_value,
                                new_value,
                                script,
                                similarity,
                            })
                        }
                        (old, new) => Some(Delta::modified(position, old, new)),
                    },
                }
            }
            Delta::Object { position, deltas, .. } => {
                let deltas = self.filter(deltas);
                (!deltas.is_empty()).then(|| Delta::object(position, deltas))
            }
            Delta::Array { position, deltas, .. } => {
                let deltas = self.filter(deltas);
                (!deltas.is_empty()).then(|| Delta::array(position, deltas))
            }
            Delta::Moved {
                from,
                to,
                value,
                delta,
                ..
            } => {
                let nested = delta.and_then(|nested| self.filter_one(*nested));
                Some(Delta::moved(from, to, value, nested))
            }
            Delta::Added { .. } if !self.keep_additions => None,
            Delta::Added { .. } | Delta::Deleted { .. } => Some(delta),
        }
    }

    fn judge(&mut self, old: &JsonValue, new: &JsonValue) -> Verdict {
        let Some(text) = old.as_str() else {
            return Verdict::Keep;
        };
        if !self.ignore_diff.is_empty() && text == self.ignore_diff {
            return Verdict::Drop;
        }
        let Some(vars) = self.vars.as_deref_mut() else {
            return Verdict::Keep;
        };
        if !vars.is_var(text) {
            return Verdict::Keep;
        }
        match vars.get(text).cloned() {
            None => {
                vars.set(text, capture_value(new));
                Verdict::Drop
            }
            Some(captured) if &captured == new => Verdict::Drop,
            Some(captured) => Verdict::Captured(captured),
        }
    }
}

/// The value stored when a placeholder captures `actual`.
///
/// Whole-valued floats are stored as integers.
pub fn capture_value(actual: &JsonValue) -> JsonValue {
    match actual {
        JsonValue::Number(number) => JsonValue::Number(number.normalized()),
        other => other.clone(),
    }
}
