//! Attribute and class templates
//!
//! Templates describe the shape of an asset type: which attributes exist,
//! their cardinality, and their value kind. The closed set of value kinds is
//! a tagged enum so the codec dispatches statically instead of inspecting
//! object internals by name.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::path::DotPath;

/// Whether an attribute holds one value or an ordered sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Cardinality {
    #[default]
    Single,
    Multi,
}

/// Primitive datatypes carried by leaf attributes. Geometry and other opaque
/// payloads are `Text`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrimitiveType {
    Text,
    Integer,
    Float,
    Bool,
}

impl fmt::Display for PrimitiveType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PrimitiveType::Text => "text",
            PrimitiveType::Integer => "integer",
            PrimitiveType::Float => "float",
            PrimitiveType::Bool => "bool",
        };
        write!(f, "{name}")
    }
}

/// The value kind of an attribute, with its nested shape where applicable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum AttributeKind {
    /// Leaf attribute holding a primitive value
    Primitive { datatype: PrimitiveType },
    /// Single-field complex attribute whose payload may be addressed by the
    /// wrapper's own path when the waarde shortcut is enabled
    SimpleWrapper { payload: Box<AttributeTemplate> },
    /// Nested attribute set
    Complex { children: Vec<AttributeTemplate> },
    /// Nested attribute set of which at most one member is populated
    Union { children: Vec<AttributeTemplate> },
}

/// Template for one attribute slot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttributeTemplate {
    /// Attribute name, unique among siblings
    pub name: String,
    #[serde(default)]
    pub cardinality: Cardinality,
    #[serde(flatten)]
    pub kind: AttributeKind,
}

impl AttributeTemplate {
    /// Single-valued primitive attribute.
    pub fn primitive(name: impl Into<String>, datatype: PrimitiveType) -> Self {
        Self {
            name: name.into(),
            cardinality: Cardinality::Single,
            kind: AttributeKind::Primitive { datatype },
        }
    }

    /// Single-valued complex attribute.
    pub fn complex(name: impl Into<String>, children: Vec<AttributeTemplate>) -> Self {
        Self {
            name: name.into(),
            cardinality: Cardinality::Single,
            kind: AttributeKind::Complex { children },
        }
    }

    /// Single-valued union attribute.
    pub fn union(name: impl Into<String>, children: Vec<AttributeTemplate>) -> Self {
        Self {
            name: name.into(),
            cardinality: Cardinality::Single,
            kind: AttributeKind::Union { children },
        }
    }

    /// Simple wrapper around a payload attribute.
    pub fn wrapper(name: impl Into<String>, payload: AttributeTemplate) -> Self {
        Self {
            name: name.into(),
            cardinality: Cardinality::Single,
            kind: AttributeKind::SimpleWrapper {
                payload: Box::new(payload),
            },
        }
    }

    /// Builder-style cardinality override.
    pub fn with_cardinality(mut self, cardinality: Cardinality) -> Self {
        self.cardinality = cardinality;
        self
    }

    pub fn is_multi(&self) -> bool {
        self.cardinality == Cardinality::Multi
    }

    pub fn is_primitive(&self) -> bool {
        matches!(self.kind, AttributeKind::Primitive { .. })
    }

    pub fn is_simple_wrapper(&self) -> bool {
        matches!(self.kind, AttributeKind::SimpleWrapper { .. })
    }

    /// Primitive datatype for leaf attributes.
    pub fn datatype(&self) -> Option<PrimitiveType> {
        match &self.kind {
            AttributeKind::Primitive { datatype } => Some(*datatype),
            _ => None,
        }
    }

    /// The payload template of a simple wrapper.
    pub fn payload(&self) -> Option<&AttributeTemplate> {
        match &self.kind {
            AttributeKind::SimpleWrapper { payload } => Some(payload),
            _ => None,
        }
    }

    /// Child templates for non-primitive kinds (a wrapper exposes its payload
    /// as its only child).
    pub fn children(&self) -> &[AttributeTemplate] {
        match &self.kind {
            AttributeKind::Primitive { .. } => &[],
            AttributeKind::SimpleWrapper { payload } => std::slice::from_ref(payload),
            AttributeKind::Complex { children } | AttributeKind::Union { children } => children,
        }
    }

    /// Child template by name.
    pub fn child(&self, name: &str) -> Option<&AttributeTemplate> {
        self.children().iter().find(|c| c.name == name)
    }
}

/// A path that does not resolve to a primitive leaf of a class template.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResolveError {
    #[error("unknown attribute '{attribute}' on '{owner}'")]
    UnknownAttribute { attribute: String, owner: String },
    #[error("attribute '{attribute}' is not a primitive leaf")]
    NotALeaf { attribute: String },
}

/// The primitive leaf a dotnotation path resolves to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedLeaf {
    pub datatype: PrimitiveType,
    /// Whether any attribute along the path (payload included) is multi-valued
    pub list_valued: bool,
}

/// Template for one asset type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassTemplate {
    /// Type identifier keyed on by the registry and the typeURI table column
    pub type_uri: String,
    pub attributes: Vec<AttributeTemplate>,
}

impl ClassTemplate {
    pub fn new(type_uri: impl Into<String>, attributes: Vec<AttributeTemplate>) -> Self {
        Self {
            type_uri: type_uri.into(),
            attributes,
        }
    }

    /// Top-level attribute template by name.
    pub fn attribute(&self, name: &str) -> Option<&AttributeTemplate> {
        self.attributes.iter().find(|a| a.name == name)
    }

    /// Resolve a dotnotation path to its primitive leaf.
    ///
    /// A path ending at a simple wrapper resolves to the wrapper's payload,
    /// mirroring the shortcut resolution the unflatten engine applies.
    pub fn resolve(&self, path: &DotPath) -> Result<ResolvedLeaf, ResolveError> {
        let mut owner = self.type_uri.clone();
        let mut current: Option<&AttributeTemplate> = None;
        let mut list_valued = false;
        for segment in path.segments() {
            let next = match current {
                None => self.attribute(&segment.name),
                Some(template) => template.child(&segment.name),
            };
            let template = next.ok_or_else(|| ResolveError::UnknownAttribute {
                attribute: segment.name.clone(),
                owner: owner.clone(),
            })?;
            list_valued |= template.is_multi();
            owner = template.name.clone();
            current = Some(template);
        }
        let leaf = current.ok_or(ResolveError::NotALeaf {
            attribute: String::new(),
        })?;
        match &leaf.kind {
            AttributeKind::Primitive { datatype } => Ok(ResolvedLeaf {
                datatype: *datatype,
                list_valued,
            }),
            AttributeKind::SimpleWrapper { payload } => {
                let datatype = payload.datatype().ok_or(ResolveError::NotALeaf {
                    attribute: leaf.name.clone(),
                })?;
                Ok(ResolvedLeaf {
                    datatype,
                    list_valued: list_valued || payload.is_multi(),
                })
            }
            _ => Err(ResolveError::NotALeaf {
                attribute: leaf.name.clone(),
            }),
        }
    }
}
