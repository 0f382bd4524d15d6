//! Dotnotation configuration
//!
//! Policy knobs for the path grammar and the table cell format. A config is
//! plain data threaded explicitly through every codec call; there is no
//! global or per-type mutable state.

use serde::{Deserialize, Serialize};

/// Configuration for dotnotation paths and delimited cell values.
///
/// # Example
///
/// ```rust
/// use dotnotation_sdk::config::DotnotationConfig;
///
/// let config = DotnotationConfig::default();
/// assert_eq!(config.separator, ".");
/// assert_eq!(config.cardinality_marker, "[]");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DotnotationConfig {
    /// String joining path segments (default: ".")
    #[serde(default = "default_separator")]
    pub separator: String,
    /// Suffix appended to a segment name when the attribute is multi-valued (default: "[]")
    #[serde(default = "default_cardinality_marker")]
    pub cardinality_marker: String,
    /// String joining list elements inside one table cell (default: "|")
    #[serde(default = "default_cardinality_separator")]
    pub cardinality_separator: String,
    /// When enabled, a simple-wrapper attribute's payload is addressed by the
    /// wrapper's own path instead of a nested path (default: false)
    #[serde(default)]
    pub waarde_shortcut: bool,
}

fn default_separator() -> String {
    ".".to_string()
}

fn default_cardinality_marker() -> String {
    "[]".to_string()
}

fn default_cardinality_separator() -> String {
    "|".to_string()
}

impl Default for DotnotationConfig {
    fn default() -> Self {
        Self {
            separator: default_separator(),
            cardinality_marker: default_cardinality_marker(),
            cardinality_separator: default_cardinality_separator(),
            waarde_shortcut: false,
        }
    }
}

impl DotnotationConfig {
    /// Default configuration with the waarde shortcut enabled.
    pub fn with_waarde_shortcut() -> Self {
        Self {
            waarde_shortcut: true,
            ..Self::default()
        }
    }
}
