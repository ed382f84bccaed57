use serde::{Deserialize, Serialize};

/// Rendering switches for [`AsciiFormatter`](crate::AsciiFormatter).
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FormatOptions {
    /// Print `N: ` before array items.
    pub show_array_index: bool,
    /// Wrap `+` and `-` lines in ANSI colors.
    pub coloring: bool,
}
