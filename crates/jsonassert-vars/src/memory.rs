use std::collections::BTreeMap;
use std::fmt;

use jsonassert_types::JsonValue;
use tracing::debug;

use crate::traits::VarStore;

/// Default placeholder prefix.
pub const DEFAULT_PREFIX: &str = "$";

/// In-memory variable table.
///
/// A placeholder is any string that starts with the configured prefix and has
/// at least one more character after it, e.g. `"$id"` with the default prefix.
#[derive(Clone)]
pub struct Vars {
    prefix: String,
    values: BTreeMap<String, JsonValue>,
}

impl Vars {
    /// Create an empty table using the default `$` prefix.
    pub fn new() -> Self {
        Self::with_prefix(DEFAULT_PREFIX)
    }

    /// Create an empty table with a custom placeholder prefix.
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            values: BTreeMap::new(),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Number of captured variables.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns `true` if nothing has been captured.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Forget every captured value.
    pub fn clear(&mut self) {
        self.values.clear();
    }
}

impl Default for Vars {
    fn default() -> Self {
        Self::new()
    }
}

impl VarStore for Vars {
    fn is_var(&self, name: &str) -> bool {
        !self.prefix.is_empty()
            && name
                .strip_prefix(self.prefix.as_str())
                .is_some_and(|rest| !rest.is_empty())
    }

    fn get(&self, name: &str) -> Option<&JsonValue> {
        self.values.get(name)
    }

    fn set(&mut self, name: &str, value: JsonValue) {
        debug!(name, value = %value, "variable set");
        self.values.insert(name.to_owned(), value);
    }

    fn get_all(&self) -> BTreeMap<String, JsonValue> {
        self.values.clone()
    }
}

impl fmt::Debug for Vars {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Vars")
            .field("prefix", &self.prefix)
            .field("var_count", &self.values.len())
            .finish()
    }
}
