//! Structural diff of two JSON documents.
//!
//! Objects are compared member by member in sorted key order. Arrays are
//! aligned in four passes:
//!
//! 1. a longest common subsequence (Myers, over canonical element keys)
//!    anchors the elements that are unchanged and in order
//! 2. equal elements left over on both sides become moves
//! 3. the remaining elements of each gap between anchors are paired by rank
//!    and, when similar enough, diffed in place
//! 4. leftover containers of the same kind are paired greedily by
//!    similarity and become moves carrying a nested delta
//!
//! Whatever is still unmatched is reported as deleted or added.

use std::collections::{BTreeMap, BTreeSet, HashMap, VecDeque};

use jsonassert_types::{JsonValue, Position};
use serde::{Deserialize, Serialize};
use similar::{capture_diff_slices, Algorithm, DiffOp};
use tracing::trace;

use crate::delta::{Delta, Diff};
use crate::error::{DiffError, DiffResult};
use crate::similarity::{string_similarity, weighted_similarity};

/// Tuning knobs for the differ.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiffOptions {
    /// Both strings must have at least this many characters for a text delta.
    pub text_diff_min_length: usize,
    /// Minimum string similarity for a text delta instead of a plain modification.
    pub text_diff_min_similarity: f64,
    /// Minimum similarity for two elements in the same gap to be diffed in place.
    pub pair_threshold: f64,
    /// Minimum similarity for two containers to be reported as a move.
    pub move_threshold: f64,
    /// Skip container move detection when a gap has more candidate pairs than this.
    pub max_move_candidates: usize,
}

impl Default for DiffOptions {
    fn default() -> Self {
        Self {
            text_diff_min_length: 30,
            text_diff_min_similarity: 0.5,
            pair_threshold: 0.3,
            move_threshold: 0.5,
            max_move_candidates: 10_000,
        }
    }
}

/// Computes [`Diff`]s between two decoded documents.
#[derive(Clone, Debug, Default)]
pub struct Differ {
    options: DiffOptions,
}

/// Child deltas of one container comparison plus the number of children
/// that compared equal.
struct Comparison {
    deltas: Vec<Delta>,
    unchanged: usize,
}

impl Comparison {
    fn similarity(&self) -> f64 {
        weighted_similarity(self.unchanged, &self.deltas)
    }
}

/// Indices on each side of a stretch between two anchored elements.
#[derive(Default)]
struct Gap {
    expected: Vec<usize>,
    actual: Vec<usize>,
}

impl Gap {
    fn is_empty(&self) -> bool {
        self.expected.is_empty() && self.actual.is_empty()
    }
}

struct MoveCandidate {
    from: usize,
    to: usize,
    similarity: f64,
    delta: Option<Delta>,
}

impl Differ {
    pub fn new(options: DiffOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &DiffOptions {
        &self.options
    }

    /// Diff two documents.
    ///
    /// Container roots of the same kind produce a (possibly empty) [`Diff`].
    /// Roots of different kinds, or unequal scalar roots, cannot be expressed
    /// as deltas and are reported as errors.
    pub fn diff(&self, expected: &JsonValue, actual: &JsonValue) -> DiffResult<Diff> {
        match (expected, actual) {
            (JsonValue::Object(e), JsonValue::Object(a)) => {
                Ok(Diff::new(self.compare_objects(e, a).deltas))
            }
            (JsonValue::Array(e), JsonValue::Array(a)) => {
                Ok(Diff::new(self.compare_arrays(e, a).deltas))
            }
            _ if expected.kind() != actual.kind() => Err(DiffError::RootTypeMismatch {
                expected: expected.kind(),
                actual: actual.kind(),
            }),
            _ if expected == actual => Ok(Diff::default()),
            _ => Err(DiffError::RootValueMismatch {
                expected: expected.clone(),
                actual: actual.clone(),
            }),
        }
    }

    fn compare_objects(
        &self,
        expected: &BTreeMap<String, JsonValue>,
        actual: &BTreeMap<String, JsonValue>,
    ) -> Comparison {
        let keys: BTreeSet<&String> = expected.keys().chain(actual.keys()).collect();
        let mut deltas = Vec::new();
        let mut unchanged = 0;

        for key in keys {
            match (expected.get(key), actual.get(key)) {
                (Some(old), Some(new)) => match self.compare_pair(Position::name(key), old, new).0 {
                    Some(delta) => deltas.push(delta),
                    None => unchanged += 1,
                },
                (Some(old), None) => deltas.push(Delta::deleted(Position::name(key), old.clone())),
                (None, Some(new)) => deltas.push(Delta::added(Position::name(key), new.clone())),
                (None, None) => {}
            }
        }

        Comparison { deltas, unchanged }
    }

    /// Compare two values at the same position.
    ///
    /// Returns the delta (`None` if equal) and the pair's similarity.
    fn compare_pair(
        &self,
        position: Position,
        expected: &JsonValue,
        actual: &JsonValue,
    ) -> (Option<Delta>, f64) {
        match (expected, actual) {
            (JsonValue::Object(e), JsonValue::Object(a)) => {
                let comparison = self.compare_objects(e, a);
                let similarity = comparison.similarity();
                let delta = (!comparison.deltas.is_empty())
                    .then(|| Delta::object(position, comparison.deltas));
                (delta, similarity)
            }
            (JsonValue::Array(e), JsonValue::Array(a)) => {
                let comparison = self.compare_arrays(e, a);
                let similarity = comparison.similarity();
                let delta = (!comparison.deltas.is_empty())
                    .then(|| Delta::array(position, comparison.deltas));
                (delta, similarity)
            }
            _ if expected == actual => (None, 1.0),
            _ => {
                let delta = self.scalar_delta(position, expected, actual);
                let similarity = delta.similarity();
                (Some(delta), similarity)
            }
        }
    }

    fn scalar_delta(&self, position: Position, expected: &JsonValue, actual: &JsonValue) -> Delta {
        if let (JsonValue::String(old), JsonValue::String(new)) = (expected, actual) {
            let min = self.options.text_diff_min_length;
            if old.chars().count() >= min
                && new.chars().count() >= min
                && string_similarity(old, new) >= self.options.text_diff_min_similarity
            {
                return Delta::text_diff(position, old.clone(), new.clone());
            }
        }
        Delta::modified(position, expected.clone(), actual.clone())
    }

    fn compare_arrays(&self, expected: &[JsonValue], actual: &[JsonValue]) -> Comparison {
        let expected_keys: Vec<String> = expected.iter().map(JsonValue::canonical_key).collect();
        let actual_keys: Vec<String> = actual.iter().map(JsonValue::canonical_key).collect();

        let mut taken_expected = vec![false; expected.len()];
        let mut taken_actual = vec![false; actual.len()];
        let mut unchanged = 0;
        let mut gaps: Vec<Gap> = Vec::new();
        let mut current = Gap::default();
        for op in capture_diff_slices(Algorithm::Myers, &expected_keys, &actual_keys) {
            match op {
                DiffOp::Equal {
                    old_index,
                    new_index,
                    len,
                } => {
                    unchanged += len;
                    taken_expected[old_index..old_index + len].fill(true);
                    taken_actual[new_index..new_index + len].fill(true);
                    if !current.is_empty() {
                        gaps.push(std::mem::take(&mut current));
                    }
                }
                DiffOp::Delete {
                    old_index, old_len, ..
                } => current.expected.extend(old_index..old_index + old_len),
                DiffOp::Insert {
                    new_index, new_len, ..
                } => current.actual.extend(new_index..new_index + new_len),
                DiffOp::Replace {
                    old_index,
                    old_len,
                    new_index,
                    new_len,
                } => {
                    current.expected.extend(old_index..old_index + old_len);
                    current.actual.extend(new_index..new_index + new_len);
                }
            }
        }
        if !current.is_empty() {
            gaps.push(current);
        }

        let mut deltas = Vec::new();

        // Equal elements that the subsequence could not keep in order.
        let mut pending: HashMap<&str, VecDeque<usize>> = HashMap::new();
        for &j in gaps.iter().flat_map(|gap| &gap.actual) {
            pending.entry(actual_keys[j].as_str()).or_default().push_back(j);
        }
        let mut exact_moves = 0usize;
        for &i in gaps.iter().flat_map(|gap| &gap.expected) {
            let target = pending
                .get_mut(expected_keys[i].as_str())
                .and_then(VecDeque::pop_front);
            if let Some(j) = target {
                deltas.push(Delta::moved(i, j, expected[i].clone(), None));
                taken_expected[i] = true;
                taken_actual[j] = true;
                exact_moves += 1;
            }
        }

        // Same-rank elements within a gap.
        for gap in &gaps {
            let rest_expected: Vec<usize> = gap
                .expected
                .iter()
                .copied()
                .filter(|&i| !taken_expected[i])
                .collect();
            let rest_actual: Vec<usize> = gap
                .actual
                .iter()
                .copied()
                .filter(|&j| !taken_actual[j])
                .collect();
            for (i, j) in rest_expected.into_iter().zip(rest_actual) {
                let (delta, similarity) =
                    self.compare_pair(Position::Index(j), &expected[i], &actual[j]);
                if similarity < self.options.pair_threshold {
                    continue;
                }
                match delta {
                    Some(delta) => deltas.push(delta),
                    None => unchanged += 1,
                }
                taken_expected[i] = true;
                taken_actual[j] = true;
            }
        }

        // Changed containers that moved.
        let candidates_expected: Vec<usize> = (0..expected.len())
            .filter(|&i| !taken_expected[i] && expected[i].is_container())
            .collect();
        let candidates_actual: Vec<usize> = (0..actual.len())
            .filter(|&j| !taken_actual[j] && actual[j].is_container())
            .collect();
        let pairs = candidates_expected.len() * candidates_actual.len();
        let mut container_moves = 0usize;
        if pairs > self.options.max_move_candidates {
            trace!(pairs, "skipping container move detection");
        } else if pairs > 0 {
            let mut candidates = Vec::new();
            for &i in &candidates_expected {
                for &j in &candidates_actual {
                    if expected[i].kind() != actual[j].kind() {
                        continue;
                    }
                    let (delta, similarity) =
                        self.compare_pair(Position::Index(j), &expected[i], &actual[j]);
                    if similarity >= self.options.move_threshold {
                        candidates.push(MoveCandidate {
                            from: i,
                            to: j,
                            similarity,
                            delta,
                        });
                    }
                }
            }
            candidates.sort_by(|a, b| {
                b.similarity
                    .total_cmp(&a.similarity)
                    .then(a.from.cmp(&b.from))
                    .then(a.to.cmp(&b.to))
            });
            for candidate in candidates {
                if taken_expected[candidate.from] || taken_actual[candidate.to] {
                    continue;
                }
                taken_expected[candidate.from] = true;
                taken_actual[candidate.to] = true;
                deltas.push(Delta::moved(
                    candidate.from,
                    candidate.to,
                    expected[candidate.from].clone(),
                    candidate.delta,
                ));
                container_moves += 1;
            }
        }

        for (i, value) in expected.iter().enumerate() {
            if !taken_expected[i] {
                deltas.push(Delta::deleted(Position::Index(i), value.clone()));
            }
        }
        for (j, value) in actual.iter().enumerate() {
            if !taken_actual[j] {
                deltas.push(Delta::added(Position::Index(j), value.clone()));
            }
        }

        deltas.sort_by_key(order_key);
        trace!(
            expected = expected.len(),
            actual = actual.len(),
            unchanged,
            gaps = gaps.len(),
            exact_moves,
            container_moves,
            deltas = deltas.len(),
            "aligned arrays"
        );

        Comparison { deltas, unchanged }
    }
}

/// Sort key for array deltas: by index, deletions before placements.
fn order_key(delta: &Delta) -> (usize, u8) {
    match (delta.post_index(), delta.pre_index()) {
        (Some(post), _) => (post, 1),
        (None, Some(pre)) => (pre, 0),
        (None, None) => (usize::MAX, 2),
    }
}

/// Diff two documents with default options.
pub fn diff(expected: &JsonValue, actual: &JsonValue) -> DiffResult<Diff> {
    Differ::default().diff(expected, actual)
}
