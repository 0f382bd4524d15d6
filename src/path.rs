//! Dotnotation path grammar
//!
//! Converts between the structural [`DotPath`] form and its external string
//! form under a [`DotnotationConfig`]. The grammar itself is shortcut-agnostic:
//! collapsing a simple-wrapper payload onto its wrapper's path happens at the
//! flatten/unflatten boundary, not here.

use serde::{Deserialize, Serialize};

use crate::config::DotnotationConfig;

/// A dotnotation string that cannot be parsed under the active configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("malformed dotnotation path '{input}': {reason}")]
pub struct MalformedPathError {
    /// The full input string that failed to parse
    pub input: String,
    /// Human-readable parse failure
    pub reason: String,
}

impl MalformedPathError {
    fn new(input: &str, reason: impl Into<String>) -> Self {
        Self {
            input: input.to_string(),
            reason: reason.into(),
        }
    }
}

/// One named step of a dotnotation path.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PathSegment {
    /// Attribute name addressed by this step
    pub name: String,
    /// Whether the attribute is multi-valued (rendered with the cardinality marker)
    pub multi: bool,
}

impl PathSegment {
    /// Create a segment.
    pub fn new(name: impl Into<String>, multi: bool) -> Self {
        Self {
            name: name.into(),
            multi,
        }
    }
}

/// An ordered sequence of path segments with structural equality and ordering.
///
/// Structural ordering (segment-wise, then by length) is what header sorting
/// and record iteration use, so `a.b` sorts before `ab` regardless of the
/// configured separator.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct DotPath {
    segments: Vec<PathSegment>,
}

impl DotPath {
    /// Path consisting of a single segment.
    pub fn root(segment: PathSegment) -> Self {
        Self {
            segments: vec![segment],
        }
    }

    /// Build a path from segments.
    pub fn from_segments(segments: Vec<PathSegment>) -> Self {
        Self { segments }
    }

    /// `segment` followed by all of `tail`'s segments.
    pub fn prefixed(segment: PathSegment, tail: &DotPath) -> Self {
        let mut segments = Vec::with_capacity(1 + tail.segments.len());
        segments.push(segment);
        segments.extend(tail.segments.iter().cloned());
        Self { segments }
    }

    /// Number of segments.
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// Whether the path has no segments.
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// All segments in order.
    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    /// First segment, if any.
    pub fn first(&self) -> Option<&PathSegment> {
        self.segments.first()
    }

    /// Last segment, if any.
    pub fn last(&self) -> Option<&PathSegment> {
        self.segments.last()
    }

    /// The path without its first segment.
    pub fn rest(&self) -> DotPath {
        DotPath {
            segments: self.segments.iter().skip(1).cloned().collect(),
        }
    }

    /// Whether any segment is multi-valued.
    pub fn has_multi(&self) -> bool {
        self.segments.iter().any(|s| s.multi)
    }

    /// Render the path to its external string form.
    pub fn format(&self, config: &DotnotationConfig) -> String {
        let parts: Vec<String> = self
            .segments
            .iter()
            .map(|segment| {
                if segment.multi {
                    format!("{}{}", segment.name, config.cardinality_marker)
                } else {
                    segment.name.clone()
                }
            })
            .collect();
        parts.join(&config.separator)
    }

    /// Parse an external string form back into a path.
    ///
    /// Fails on an empty segment or on a cardinality marker that appears
    /// anywhere but at the very end of a segment.
    pub fn parse(input: &str, config: &DotnotationConfig) -> Result<Self, MalformedPathError> {
        let marker = &config.cardinality_marker;
        let mut segments = Vec::new();
        for piece in input.split(config.separator.as_str()) {
            if piece.is_empty() {
                return Err(MalformedPathError::new(input, "empty path segment"));
            }
            let (name, multi) = match piece.strip_suffix(marker.as_str()) {
                Some(stripped) if !marker.is_empty() => (stripped, true),
                _ => (piece, false),
            };
            if name.is_empty() {
                return Err(MalformedPathError::new(
                    input,
                    format!("segment '{piece}' has no name before the cardinality marker"),
                ));
            }
            if !marker.is_empty() && name.contains(marker.as_str()) {
                return Err(MalformedPathError::new(
                    input,
                    format!("cardinality marker inside segment '{piece}'"),
                ));
            }
            segments.push(PathSegment::new(name, multi));
        }
        Ok(Self { segments })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> DotnotationConfig {
        DotnotationConfig::default()
    }

    #[test]
    fn test_format_simple() {
        let path = DotPath::from_segments(vec![
            PathSegment::new("assetId", false),
            PathSegment::new("identificator", false),
        ]);
        assert_eq!(path.format(&config()), "assetId.identificator");
    }

    #[test]
    fn test_format_with_marker() {
        let path = DotPath::from_segments(vec![
            PathSegment::new("elements", true),
            PathSegment::new("weight", false),
        ]);
        assert_eq!(path.format(&config()), "elements[].weight");
    }

    #[test]
    fn test_parse_roundtrip() {
        let path = DotPath::parse("elements[].weight", &config()).unwrap();
        assert_eq!(path.len(), 2);
        assert!(path.segments()[0].multi);
        assert!(!path.segments()[1].multi);
        assert_eq!(path.format(&config()), "elements[].weight");
    }

    #[test]
    fn test_parse_empty_segment() {
        assert!(DotPath::parse("a..b", &config()).is_err());
        assert!(DotPath::parse("", &config()).is_err());
        assert!(DotPath::parse(".a", &config()).is_err());
    }

    #[test]
    fn test_parse_marker_not_at_end() {
        assert!(DotPath::parse("a[]b", &config()).is_err());
        assert!(DotPath::parse("[]", &config()).is_err());
        assert!(DotPath::parse("a[][]", &config()).is_err());
    }

    #[test]
    fn test_parse_custom_separator() {
        let config = DotnotationConfig {
            separator: "/".to_string(),
            cardinality_marker: "*".to_string(),
            ..DotnotationConfig::default()
        };
        let path = DotPath::parse("a*/b", &config).unwrap();
        assert!(path.segments()[0].multi);
        assert_eq!(path.format(&config), "a*/b");
    }

    #[test]
    fn test_structural_ordering() {
        let config = config();
        let ab = DotPath::parse("a.b", &config).unwrap();
        let c = DotPath::parse("ab", &config).unwrap();
        assert!(ab < c);
    }
}
