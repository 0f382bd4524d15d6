//! Object model for the codec
//!
//! The capability surface the engines consume: templates describing attribute
//! shape, instance trees with explicit list growth, scalar values with
//! best-effort coercion, and a registry that constructs empty instances by
//! type URI.

pub mod asset;
pub mod registry;
pub mod template;
pub mod value;

pub use asset::{Asset, Attribute, AttributeSet, AttributeValue, ModelError};
pub use registry::{RegistryError, TypeRegistry};
pub use template::{
    AttributeKind, AttributeTemplate, Cardinality, ClassTemplate, PrimitiveType, ResolveError,
    ResolvedLeaf,
};
pub use value::{Coerced, CoercionError, Scalar, Value, coerce_scalar};
