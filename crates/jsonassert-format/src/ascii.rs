//! Line-oriented rendering of a delta tree.
//!
//! The expected document is printed one scalar or bracket per line. Each line
//! starts with a marker column (`' '` unchanged, `'-'` only in expected,
//! `'+'` only in actual) followed by two spaces per nesting level.

use std::borrow::Cow;
use std::collections::{BTreeMap, HashMap};

use colored::Color;
use jsonassert_diff::Delta;
use jsonassert_types::{quote, JsonValue, Position, ValueKind};

use crate::error::{FormatError, FormatResult};
use crate::options::FormatOptions;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Marker {
    Same,
    Added,
    Deleted,
}

impl Marker {
    fn symbol(self) -> char {
        match self {
            Self::Same => ' ',
            Self::Added => '+',
            Self::Deleted => '-',
        }
    }
}

/// What precedes a value on its line.
#[derive(Clone, Copy, Debug)]
enum Key<'a> {
    None,
    Name(&'a str),
    Index(usize),
}

/// One sibling of a container, decided before anything is printed so that
/// the last emitted sibling is known up front.
enum Slot<'a> {
    Same {
        key: Key<'a>,
        value: &'a JsonValue,
    },
    Deleted {
        key: Key<'a>,
        value: &'a JsonValue,
    },
    Added {
        key: Key<'a>,
        value: Cow<'a, JsonValue>,
    },
    Replaced {
        old_key: Key<'a>,
        old: Cow<'a, JsonValue>,
        new_key: Key<'a>,
        new: Cow<'a, JsonValue>,
    },
    Nested {
        key: Key<'a>,
        value: &'a JsonValue,
        deltas: &'a [Delta],
    },
}

/// Renders a delta tree against the document it was computed from.
pub struct AsciiFormatter<'a> {
    expected: &'a JsonValue,
    options: FormatOptions,
}

impl<'a> AsciiFormatter<'a> {
    pub fn new(expected: &'a JsonValue, options: FormatOptions) -> Self {
        Self { expected, options }
    }

    /// Render `deltas` (the top-level deltas of the expected root).
    ///
    /// Fails if the root is not a container or the deltas do not line up
    /// with the expected document.
    pub fn format(&self, deltas: &[Delta]) -> FormatResult<String> {
        if !self.expected.is_container() {
            return Err(FormatError::UnsupportedRoot(self.expected.kind()));
        }
        let mut writer = Writer {
            options: &self.options,
            out: String::new(),
        };
        writer.nested(Key::None, self.expected, deltas, 0, false)?;
        Ok(writer.out)
    }
}

struct Writer<'o> {
    options: &'o FormatOptions,
    out: String,
}

impl Writer<'_> {
    fn nested(
        &mut self,
        key: Key<'_>,
        value: &JsonValue,
        deltas: &[Delta],
        depth: usize,
        comma: bool,
    ) -> FormatResult<()> {
        let (open, close, slots) = match value {
            JsonValue::Object(members) => ("{", "}", object_slots(members, deltas)?),
            JsonValue::Array(items) => ("[", "]", array_slots(items, deltas)?),
            other => return Err(FormatError::UnsupportedRoot(other.kind())),
        };
        self.line(Marker::Same, depth, key, open, false);
        self.slots(&slots, depth + 1)?;
        self.line(Marker::Same, depth, Key::None, close, comma);
        Ok(())
    }

    fn slots(&mut self, slots: &[Slot<'_>], depth: usize) -> FormatResult<()> {
        let last = slots.len().saturating_sub(1);
        for (n, slot) in slots.iter().enumerate() {
            let comma = n != last;
            match slot {
                Slot::Same { key, value } => self.value(Marker::Same, depth, *key, value, comma),
                Slot::Deleted { key, value } => {
                    self.value(Marker::Deleted, depth, *key, value, comma)
                }
                Slot::Added { key, value } => self.value(Marker::Added, depth, *key, value, comma),
                Slot::Replaced {
                    old_key,
                    old,
                    new_key,
                    new,
                } => {
                    self.value(Marker::Deleted, depth, *old_key, old, comma);
                    self.value(Marker::Added, depth, *new_key, new, comma);
                }
                Slot::Nested { key, value, deltas } => {
                    self.nested(*key, value, deltas, depth, comma)?
                }
            }
        }
        Ok(())
    }

    /// Print a whole value with one marker on every line.
    fn value(&mut self, marker: Marker, depth: usize, key: Key<'_>, value: &JsonValue, comma: bool) {
        match value {
            JsonValue::Object(members) => {
                self.line(marker, depth, key, "{", false);
                let last = members.len().saturating_sub(1);
                for (n, (name, member)) in members.iter().enumerate() {
                    self.value(marker, depth + 1, Key::Name(name), member, n != last);
                }
                self.line(marker, depth, Key::None, "}", comma);
            }
            JsonValue::Array(items) => {
                self.line(marker, depth, key, "[", false);
                let last = items.len().saturating_sub(1);
                for (n, item) in items.iter().enumerate() {
                    self.value(marker, depth + 1, Key::Index(n), item, n != last);
                }
                self.line(marker, depth, Key::None, "]", comma);
            }
            scalar => self.line(marker, depth, key, &scalar.to_json_string(), comma),
        }
    }

    fn line(&mut self, marker: Marker, depth: usize, key: Key<'_>, text: &str, comma: bool) {
        let mut line = String::with_capacity(1 + depth * 2 + text.len() + 2);
        line.push(marker.symbol());
        for _ in 0..depth {
            line.push_str("  ");
        }
        match key {
            Key::Name(name) => {
                line.push_str(&quote(name));
                line.push_str(": ");
            }
            Key::Index(index) if self.options.show_array_index => {
                line.push_str(&index.to_string());
                line.push_str(": ");
            }
            Key::Index(_) | Key::None => {}
        }
        line.push_str(text);
        if comma {
            line.push(',');
        }

        match (self.options.coloring, marker) {
            (true, Marker::Added) => self.out.push_str(&paint(&line, Color::Green)),
            (true, Marker::Deleted) => self.out.push_str(&paint(&line, Color::Red)),
            _ => self.out.push_str(&line),
        }
        self.out.push('\n');
    }
}

/// Black text on `background`, regardless of where the output goes.
fn paint(line: &str, background: Color) -> String {
    format!(
        "\x1b[{};{}m{line}\x1b[0m",
        Color::Black.to_fg_str(),
        background.to_bg_str()
    )
}

fn object_slots<'a>(
    members: &'a BTreeMap<String, JsonValue>,
    deltas: &'a [Delta],
) -> FormatResult<Vec<Slot<'a>>> {
    let mut by_name: HashMap<&str, &Delta> = HashMap::new();
    let mut added = Vec::new();
    for delta in deltas {
        let name = match (delta, delta.name()) {
            (Delta::Moved { .. }, _) | (_, None) => {
                return Err(FormatError::UnexpectedDelta {
                    delta: delta.kind_name(),
                    position: delta.position(),
                    container: ValueKind::Object,
                })
            }
            (_, Some(name)) => name,
        };
        match delta {
            Delta::Added { value, .. } => added.push(Slot::Added {
                key: Key::Name(name),
                value: Cow::Borrowed(value),
            }),
            _ => {
                by_name.insert(name, delta);
            }
        }
    }

    let mut slots = Vec::with_capacity(members.len() + added.len());
    let mut consumed = 0;
    for (name, value) in members {
        let key = Key::Name(name);
        let slot = match by_name.get(name.as_str()) {
            None => Slot::Same { key, value },
            Some(&delta) => {
                consumed += 1;
                match delta {
                    Delta::Deleted { .. } => Slot::Deleted { key, value },
                    _ => in_place_slot(delta, key, key, value, ValueKind::Object)?,
                }
            }
        };
        slots.push(slot);
    }
    if consumed != by_name.len() {
        return Err(FormatError::UnconsumedDeltas {
            container: ValueKind::Object,
            count: by_name.len() - consumed,
        });
    }

    slots.extend(added);
    Ok(slots)
}

/// Walk expected indices `i` and actual indices `j` together: removals at
/// `i` first, then insertions at `j`, then the kept pair `(i, j)`.
fn array_slots<'a>(items: &'a [JsonValue], deltas: &'a [Delta]) -> FormatResult<Vec<Slot<'a>>> {
    let mut removed: BTreeMap<usize, &Delta> = BTreeMap::new();
    let mut placed: BTreeMap<usize, &Delta> = BTreeMap::new();
    for delta in deltas {
        for position in delta.pre_position().iter().chain(delta.post_position().iter()) {
            if position.as_index().is_none() {
                return Err(FormatError::UnexpectedDelta {
                    delta: delta.kind_name(),
                    position: position.clone(),
                    container: ValueKind::Array,
                });
            }
        }
        if let Some(i) = delta.pre_index() {
            removed.insert(i, delta);
        }
        if let Some(j) = delta.post_index() {
            placed.insert(j, delta);
        }
    }

    let mut slots = Vec::with_capacity(items.len() + placed.len());
    let (mut i, mut j) = (0, 0);
    let (mut consumed_removed, mut consumed_placed) = (0, 0);
    loop {
        if i < items.len() && removed.contains_key(&i) {
            slots.push(Slot::Deleted {
                key: Key::Index(i),
                value: &items[i],
            });
            consumed_removed += 1;
            i += 1;
            continue;
        }

        let placement = placed.get(&j).copied();
        if let Some(delta) = placement {
            let inserted = match delta {
                Delta::Added { value, .. } => Some(Cow::Borrowed(value)),
                Delta::Moved { .. } => Some(Cow::Owned(delta.moved_value()?)),
                _ => None,
            };
            if let Some(value) = inserted {
                slots.push(Slot::Added {
                    key: Key::Index(j),
                    value,
                });
                consumed_placed += 1;
                j += 1;
                continue;
            }
        }

        if i >= items.len() {
            break;
        }
        let slot = match placement {
            Some(delta) => {
                consumed_placed += 1;
                in_place_slot(delta, Key::Index(i), Key::Index(j), &items[i], ValueKind::Array)?
            }
            None => Slot::Same {
                key: Key::Index(i),
                value: &items[i],
            },
        };
        slots.push(slot);
        i += 1;
        j += 1;
    }

    let unconsumed = (removed.len() - consumed_removed) + (placed.len() - consumed_placed);
    if unconsumed > 0 {
        return Err(FormatError::UnconsumedDeltas {
            container: ValueKind::Array,
            count: unconsumed,
        });
    }
    Ok(slots)
}

fn in_place_slot<'a>(
    delta: &'a Delta,
    old_key: Key<'a>,
    new_key: Key<'a>,
    value: &'a JsonValue,
    container: ValueKind,
) -> FormatResult<Slot<'a>> {
    let slot = match delta {
        Delta::Modified {
            old_value,
            new_value,
            ..
        } => Slot::Replaced {
            old_key,
            old: Cow::Borrowed(old_value),
            new_key,
            new: Cow::Borrowed(new_value),
        },
        Delta::TextDiff {
            old_value,
            new_value,
            ..
        } => Slot::Replaced {
            old_key,
            old: Cow::Owned(JsonValue::String(old_value.clone())),
            new_key,
            new: Cow::Owned(JsonValue::String(new_value.clone())),
        },
        Delta::Object { deltas, .. } | Delta::Array { deltas, .. } => {
            let expected = match delta {
                Delta::Object { .. } => ValueKind::Object,
                _ => ValueKind::Array,
            };
            if value.kind() != expected {
                return Err(FormatError::TypeMismatch {
                    delta: delta.kind_name(),
                    position: delta.position(),
                    found: value.kind(),
                });
            }
            Slot::Nested {
                key: old_key,
                value,
                deltas,
            }
        }
        _ => {
            return Err(FormatError::UnexpectedDelta {
                delta: delta.kind_name(),
                position: delta.position(),
                container,
            })
        }
    };
    Ok(slot)
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonassert_diff::diff;
    use serde_json::json;

    fn v(value: serde_json::Value) -> JsonValue {
        JsonValue::from(value)
    }

    fn render(expected: serde_json::Value, actual: serde_json::Value) -> String {
        let expected = v(expected);
        let d = diff(&expected, &v(actual)).unwrap();
        AsciiFormatter::new(&expected, FormatOptions::default())
            .format(d.deltas())
            .unwrap()
    }

    #[test]
    fn nested_array_modification() {
        let text = render(
            json!({"a": 1.23, "b": [1, 2, 3], "c": "abc", "d": 4}),
            json!({"a": 1.23, "b": [1, 2, 4], "c": "abc", "d": 4}),
        );
        assert_eq!(
            text,
            " {\n   \"a\": 1.23,\n   \"b\": [\n     1,\n     2,\n-    3\n+    4\n   ],\n   \"c\": \"abc\",\n   \"d\": 4\n }\n"
        );
    }

    #[test]
    fn added_members_follow_existing_ones() {
        let text = render(
            json!({"a": 1, "c": {"d": 1}}),
            json!({"a": 1, "b": 2, "c": {"d": 1, "e": 2}}),
        );
        assert_eq!(
            text,
            " {\n   \"a\": 1,\n   \"c\": {\n     \"d\": 1,\n+    \"e\": 2\n   },\n+  \"b\": 2\n }\n"
        );
    }

    #[test]
    fn deleted_container_marks_every_line() {
        let text = render(json!({"a": {"x": [1]}, "b": 1}), json!({"b": 1}));
        assert_eq!(
            text,
            " {\n-  \"a\": {\n-    \"x\": [\n-      1\n-    ]\n-  },\n   \"b\": 1\n }\n"
        );
    }

    #[test]
    fn array_root_with_insertions_and_removals() {
        let text = render(json!([1, 2, 3]), json!([0, 1, 3]));
        assert_eq!(text, " [\n+  0,\n   1,\n-  2,\n   3\n ]\n");
    }

    #[test]
    fn moved_element_shows_both_slots() {
        let text = render(json!([1, 2, 3]), json!([3, 1, 2]));
        assert_eq!(text, " [\n+  3,\n   1,\n   2,\n-  3\n ]\n");
    }

    #[test]
    fn show_array_index() {
        let expected = v(json!([10, 20]));
        let d = diff(&expected, &v(json!([10, 21]))).unwrap();
        let options = FormatOptions {
            show_array_index: true,
            coloring: false,
        };
        let text = AsciiFormatter::new(&expected, options).format(d.deltas()).unwrap();
        assert_eq!(text, " [\n   0: 10,\n-  1: 20\n+  1: 21\n ]\n");
    }

    #[test]
    fn empty_containers_use_two_lines() {
        let text = render(json!({"a": []}), json!({"a": {}}));
        assert_eq!(text, " {\n-  \"a\": [\n-  ]\n+  \"a\": {\n+  }\n }\n");
    }

    #[test]
    fn keys_are_escaped() {
        let text = render(json!({"q\"k": 1}), json!({"q\"k": 2}));
        assert!(text.contains(r#"-  "q\"k": 1"#));
    }

    #[test]
    fn coloring_wraps_changed_lines() {
        let expected = v(json!({"a": 1}));
        let d = diff(&expected, &v(json!({"a": 2}))).unwrap();
        let options = FormatOptions {
            show_array_index: false,
            coloring: true,
        };
        let text = AsciiFormatter::new(&expected, options).format(d.deltas()).unwrap();
        assert_eq!(
            text,
            " {\n\x1b[30;41m-  \"a\": 1\x1b[0m\n\x1b[30;42m+  \"a\": 2\x1b[0m\n }\n"
        );
    }

    #[test]
    fn long_text_edit_prints_both_strings() {
        let expected = v(json!({
            "msg": "the quick brown fox jumps over the lazy dog",
            "n": 1
        }));
        let d = diff(
            &expected,
            &v(json!({"msg": "the quick brown fox jumped over the lazy dog", "n": 1})),
        )
        .unwrap();
        assert!(matches!(d.deltas(), [Delta::TextDiff { .. }]));
        let text = AsciiFormatter::new(&expected, FormatOptions::default())
            .format(d.deltas())
            .unwrap();
        assert_eq!(
            text,
            concat!(
                " {\n",
                "-  \"msg\": \"the quick brown fox jumps over the lazy dog\",\n",
                "+  \"msg\": \"the quick brown fox jumped over the lazy dog\",\n",
                "   \"n\": 1\n",
                " }\n",
            )
        );
    }

    #[test]
    fn scalar_root_is_rejected() {
        let expected = v(json!(1));
        let err = AsciiFormatter::new(&expected, FormatOptions::default())
            .format(&[])
            .unwrap_err();
        assert!(matches!(err, FormatError::UnsupportedRoot(ValueKind::Number)));
    }

    #[test]
    fn inconsistent_deltas_are_rejected() {
        let expected = v(json!({"a": 1}));
        let deltas = vec![Delta::deleted(Position::name("missing"), JsonValue::Null)];
        let err = AsciiFormatter::new(&expected, FormatOptions::default())
            .format(&deltas)
            .unwrap_err();
        assert!(matches!(err, FormatError::UnconsumedDeltas { count: 1, .. }));

        let deltas = vec![Delta::object(
            Position::name("a"),
            vec![Delta::added(Position::name("x"), JsonValue::Null)],
        )];
        let err = AsciiFormatter::new(&expected, FormatOptions::default())
            .format(&deltas)
            .unwrap_err();
        assert!(matches!(err, FormatError::TypeMismatch { .. }));
    }
}
