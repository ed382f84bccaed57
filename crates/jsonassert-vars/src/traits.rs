use std::collections::BTreeMap;

use jsonassert_types::JsonValue;

/// Table of placeholder variables shared across comparisons.
///
/// All implementations must satisfy these invariants:
/// - A name is a variable only if [`is_var`](VarStore::is_var) accepts it.
/// - Once set, a variable keeps its value until it is set again; comparisons
///   only ever set variables that are not captured yet.
/// - Values are stored as decoded, so large integers survive capture exactly.
pub trait VarStore {
    /// Returns `true` if `name` follows the placeholder convention.
    fn is_var(&self, name: &str) -> bool;

    /// Look up a captured value. Returns `None` if the variable is not set.
    fn get(&self, name: &str) -> Option<&JsonValue>;

    /// Capture a value, replacing any previous one.
    fn set(&mut self, name: &str, value: JsonValue);

    /// Snapshot of every captured variable, in name order.
    fn get_all(&self) -> BTreeMap<String, JsonValue>;

    /// The placeholder name if `value` is a string naming a variable.
    fn placeholder<'a>(&self, value: &'a JsonValue) -> Option<&'a str> {
        value.as_str().filter(|name| self.is_var(name))
    }

    /// Copy of `value` with every captured placeholder replaced by its value.
    ///
    /// Uncaptured placeholders and object keys are left untouched.
    fn substitute(&self, value: &JsonValue) -> JsonValue {
        match value {
            JsonValue::String(_) => match self.placeholder(value).and_then(|name| self.get(name)) {
                Some(captured) => captured.clone(),
                None => value.clone(),
            },
            JsonValue::Array(items) => {
                JsonValue::Array(items.iter().map(|item| self.substitute(item)).collect())
            }
            JsonValue::Object(members) => JsonValue::Object(
                members
                    .iter()
                    .map(|(key, member)| (key.clone(), self.substitute(member)))
                    .collect(),
            ),
            _ => value.clone(),
        }
    }
}
