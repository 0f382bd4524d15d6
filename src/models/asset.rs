//! Asset instances
//!
//! The in-memory instance tree the codec reads and populates. Attribute slots
//! are kept in a name-ordered map so iteration order is stable; list growth is
//! always explicit through [`Attribute::allocate_next_slot`] — a read never
//! materializes anything.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::models::template::{AttributeKind, AttributeTemplate, Cardinality, ClassTemplate};
use crate::models::value::{CoercionError, Scalar, coerce_scalar};

/// Structurally invalid use of an attribute slot.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ModelError {
    #[error("attribute '{name}' is not a single-valued primitive")]
    NotScalar { name: String },
    #[error("attribute '{name}' is not a multi-valued primitive")]
    NotScalarList { name: String },
    #[error("attribute '{name}' is not a single-valued complex attribute")]
    NotComplex { name: String },
    #[error("attribute '{name}' is not a multi-valued complex attribute")]
    NotComplexList { name: String },
    #[error(transparent)]
    Coercion(#[from] CoercionError),
}

/// Current value of an attribute slot.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub enum AttributeValue {
    /// No value set
    #[default]
    Empty,
    Scalar(Scalar),
    /// Ordered scalar sequence; `None` marks an unset position
    ScalarList(Vec<Option<Scalar>>),
    /// Nested attribute set (complex, union or wrapper instance)
    Complex(AttributeSet),
    ComplexList(Vec<AttributeSet>),
}

/// One attribute slot: its template plus its current value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attribute {
    template: AttributeTemplate,
    value: AttributeValue,
}

impl Attribute {
    pub fn new(template: AttributeTemplate) -> Self {
        Self {
            template,
            value: AttributeValue::Empty,
        }
    }

    pub fn name(&self) -> &str {
        &self.template.name
    }

    pub fn template(&self) -> &AttributeTemplate {
        &self.template
    }

    pub fn is_multi(&self) -> bool {
        self.template.is_multi()
    }

    pub fn is_set(&self) -> bool {
        !matches!(self.value, AttributeValue::Empty)
    }

    pub fn value(&self) -> &AttributeValue {
        &self.value
    }

    /// Clear the slot back to empty.
    pub fn clear(&mut self) {
        self.value = AttributeValue::Empty;
    }

    pub fn scalar(&self) -> Option<&Scalar> {
        match &self.value {
            AttributeValue::Scalar(s) => Some(s),
            _ => None,
        }
    }

    pub fn scalar_list(&self) -> Option<&[Option<Scalar>]> {
        match &self.value {
            AttributeValue::ScalarList(items) => Some(items),
            _ => None,
        }
    }

    pub fn complex(&self) -> Option<&AttributeSet> {
        match &self.value {
            AttributeValue::Complex(set) => Some(set),
            _ => None,
        }
    }

    pub fn complex_list(&self) -> Option<&[AttributeSet]> {
        match &self.value {
            AttributeValue::ComplexList(items) => Some(items),
            _ => None,
        }
    }

    /// Set a single primitive value with best-effort coercion.
    ///
    /// Returns whether a conversion took place so callers can surface a
    /// coercion warning; an unconvertible scalar leaves the slot untouched.
    pub fn set_scalar(&mut self, value: Scalar) -> Result<bool, ModelError> {
        let datatype = match (&self.template.kind, self.template.cardinality) {
            (AttributeKind::Primitive { datatype }, Cardinality::Single) => *datatype,
            _ => {
                return Err(ModelError::NotScalar {
                    name: self.template.name.clone(),
                });
            }
        };
        let coerced = coerce_scalar(value, datatype)?;
        self.value = AttributeValue::Scalar(coerced.value);
        Ok(coerced.converted)
    }

    /// Append one slot to a multi-valued primitive attribute.
    ///
    /// `None` grows the list with an unset position (padding). Returns whether
    /// a coercion took place for a `Some` value.
    pub fn push_scalar(&mut self, value: Option<Scalar>) -> Result<bool, ModelError> {
        let datatype = match (&self.template.kind, self.template.cardinality) {
            (AttributeKind::Primitive { datatype }, Cardinality::Multi) => *datatype,
            _ => {
                return Err(ModelError::NotScalarList {
                    name: self.template.name.clone(),
                });
            }
        };
        let (item, converted) = match value {
            Some(scalar) => {
                let coerced = coerce_scalar(scalar, datatype)?;
                (Some(coerced.value), coerced.converted)
            }
            None => (None, false),
        };
        match &mut self.value {
            AttributeValue::ScalarList(items) => items.push(item),
            _ => self.value = AttributeValue::ScalarList(vec![item]),
        }
        Ok(converted)
    }

    /// Set the whole scalar list at once (values already of the declared type).
    pub fn set_scalar_list(&mut self, items: Vec<Option<Scalar>>) -> Result<(), ModelError> {
        if !matches!(self.template.kind, AttributeKind::Primitive { .. }) || !self.is_multi() {
            return Err(ModelError::NotScalarList {
                name: self.template.name.clone(),
            });
        }
        self.value = AttributeValue::ScalarList(items);
        Ok(())
    }

    /// The single nested attribute set, created from the child templates when
    /// absent. Only valid for single-valued non-primitive attributes.
    pub fn materialize_complex(&mut self) -> Result<&mut AttributeSet, ModelError> {
        if self.template.is_primitive() || self.is_multi() {
            return Err(ModelError::NotComplex {
                name: self.template.name.clone(),
            });
        }
        if !matches!(self.value, AttributeValue::Complex(_)) {
            self.value = AttributeValue::Complex(AttributeSet::from_templates(
                self.template.children(),
            ));
        }
        match &mut self.value {
            AttributeValue::Complex(set) => Ok(set),
            _ => unreachable!(),
        }
    }

    /// Append one element to a multi-valued non-primitive attribute and
    /// return it. This is the only list-growth primitive for complex lists.
    pub fn allocate_next_slot(&mut self) -> Result<&mut AttributeSet, ModelError> {
        if self.template.is_primitive() || !self.is_multi() {
            return Err(ModelError::NotComplexList {
                name: self.template.name.clone(),
            });
        }
        if !matches!(self.value, AttributeValue::ComplexList(_)) {
            self.value = AttributeValue::ComplexList(Vec::new());
        }
        match &mut self.value {
            AttributeValue::ComplexList(items) => {
                items.push(AttributeSet::from_templates(self.template.children()));
                Ok(items.last_mut().expect("just pushed"))
            }
            _ => unreachable!(),
        }
    }

    /// Grow a complex list to at least `n` elements.
    pub fn ensure_slots(&mut self, n: usize) -> Result<(), ModelError> {
        while self.slot_count() < n {
            self.allocate_next_slot()?;
        }
        Ok(())
    }

    /// Mutable access to element `index` of a complex list.
    pub fn slot_mut(&mut self, index: usize) -> Option<&mut AttributeSet> {
        match &mut self.value {
            AttributeValue::ComplexList(items) => items.get_mut(index),
            _ => None,
        }
    }

    /// Number of elements in a complex list (0 when unset).
    pub fn slot_count(&self) -> usize {
        match &self.value {
            AttributeValue::ComplexList(items) => items.len(),
            _ => 0,
        }
    }
}

/// A name-ordered set of attribute slots; the body of an asset or of a nested
/// complex value.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AttributeSet {
    attributes: BTreeMap<String, Attribute>,
}

impl AttributeSet {
    /// Empty slots for each template.
    pub fn from_templates(templates: &[AttributeTemplate]) -> Self {
        let attributes = templates
            .iter()
            .map(|t| (t.name.clone(), Attribute::new(t.clone())))
            .collect();
        Self { attributes }
    }

    pub fn attribute(&self, name: &str) -> Option<&Attribute> {
        self.attributes.get(name)
    }

    pub fn attribute_mut(&mut self, name: &str) -> Option<&mut Attribute> {
        self.attributes.get_mut(name)
    }

    /// Attributes in name order.
    pub fn iter(&self) -> impl Iterator<Item = &Attribute> {
        self.attributes.values()
    }

    pub fn len(&self) -> usize {
        self.attributes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }

    /// Whether any slot holds a value (recursively meaningful only at the top
    /// level; nested emptiness is the flatten engine's concern).
    pub fn any_set(&self) -> bool {
        self.attributes.values().any(|a| a.is_set())
    }
}

/// One domain object: a type identifier plus its attribute tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Asset {
    type_uri: String,
    attributes: AttributeSet,
}

impl Asset {
    /// Fresh empty instance of a class.
    pub fn from_class(class: &ClassTemplate) -> Self {
        Self {
            type_uri: class.type_uri.clone(),
            attributes: AttributeSet::from_templates(&class.attributes),
        }
    }

    pub fn type_uri(&self) -> &str {
        &self.type_uri
    }

    pub fn attributes(&self) -> &AttributeSet {
        &self.attributes
    }

    pub fn attributes_mut(&mut self) -> &mut AttributeSet {
        &mut self.attributes
    }

    pub fn attribute(&self, name: &str) -> Option<&Attribute> {
        self.attributes.attribute(name)
    }

    pub fn attribute_mut(&mut self, name: &str) -> Option<&mut Attribute> {
        self.attributes.attribute_mut(name)
    }
}
