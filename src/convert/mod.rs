//! Tree⇄record conversion
//!
//! The two engines at the heart of the codec:
//! - flatten: object tree → path-keyed [`FlatRecord`]
//! - unflatten: [`FlatRecord`] → freshly constructed object tree
//!
//! Fatal conditions abort one object's conversion; recoverable ones are
//! collected as [`ConversionWarning`]s (and logged) so callers can inspect
//! them without an ambient side channel.

pub mod flatten;
pub mod record;
pub mod unflatten;

use crate::path::MalformedPathError;

/// Fatal conversion failure for a single object.
#[derive(Debug, thiserror::Error)]
pub enum ConvertError {
    #[error(transparent)]
    MalformedPath(#[from] MalformedPathError),
    /// A list nested inside a list value, beyond the single per-index fan-out
    /// level a 2-D table can express
    #[error("nested list value at '{path}' cannot be placed unambiguously")]
    NestedList { path: String },
    #[error("unknown attribute '{attribute}' on '{owner}'")]
    UnknownAttribute { attribute: String, owner: String },
    /// A value whose shape contradicts the attribute it addresses
    #[error("cannot place value at '{path}': {detail}")]
    InvalidPlacement { path: String, detail: String },
}

/// Non-fatal issue recovered during a conversion.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConversionWarning {
    /// Multi-valued attribute nested inside a multi-valued attribute; the
    /// sub-path's values were dropped
    #[error("'{path}' holds a list per list element and cannot appear in a table; values dropped")]
    UnsupportedCardinality { path: String },
    /// A scalar was best-effort converted to the declared primitive type
    #[error("value at '{path}' converted from {from} to {to}")]
    TypeCoercion {
        path: String,
        from: String,
        to: String,
    },
    /// A scalar could not be converted and was discarded
    #[error("value at '{path}' discarded: {detail}")]
    DiscardedValue { path: String, detail: String },
}

/// Output of flattening one object: the record plus recovered warnings.
#[derive(Debug, Clone, PartialEq)]
pub struct FlattenResult {
    pub record: record::FlatRecord,
    pub warnings: Vec<ConversionWarning>,
}

pub use flatten::flatten_one;
pub use record::FlatRecord;
pub use unflatten::unflatten_one;
