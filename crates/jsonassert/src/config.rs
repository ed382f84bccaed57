use std::path::{Path, PathBuf};

use jsonassert_diff::DiffOptions;
use jsonassert_format::FormatOptions;
use serde::{Deserialize, Serialize};

/// Default marker for expected values whose actual counterpart is not checked.
pub const IGNORE_DIFF: &str = "<ignore-diff>";

/// Errors from loading comparison settings.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    Toml(#[from] toml::de::Error),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Settings for a [`Comparer`](crate::Comparer).
///
/// Every field has a default, so a TOML file only needs the keys it changes:
///
/// ```toml
/// ignore_diff = "<skip>"
/// keep_full_diff = true
///
/// [format]
/// coloring = true
///
/// [diff]
/// move_threshold = 0.7
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompareOptions {
    /// Expected string value that matches anything; empty disables it.
    pub ignore_diff: String,
    /// Report the whole rendered diff instead of windows around changes.
    pub keep_full_diff: bool,
    /// Rendered diffs longer than this are reduced.
    pub full_diff_max_lines: usize,
    /// Lines kept before and after each changed line when reducing.
    pub diff_surrounding_lines: usize,
    pub format: FormatOptions,
    pub diff: DiffOptions,
}

impl Default for CompareOptions {
    fn default() -> Self {
        Self {
            ignore_diff: IGNORE_DIFF.to_owned(),
            keep_full_diff: false,
            full_diff_max_lines: 50,
            diff_surrounding_lines: 5,
            format: FormatOptions::default(),
            diff: DiffOptions::default(),
        }
    }
}

impl CompareOptions {
    /// Settings without an ignore marker: every value is compared.
    pub fn exact() -> Self {
        Self {
            ignore_diff: String::new(),
            ..Default::default()
        }
    }

    pub fn from_toml_str(text: &str) -> ConfigResult<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Read settings from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }
}
