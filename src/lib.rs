//! Dotnotation SDK - tree⇄table codec for cardinality-annotated asset models
//!
//! Provides unified interfaces for:
//! - Dotnotation path grammar (configurable separator and cardinality marker)
//! - Flattening an asset's attribute tree into a path-keyed flat record
//! - Rebuilding assets from flat records (with explicit list-slot allocation)
//! - Assembling flat records into 2-D tables and back (per type or mixed)
//! - Stringify/destringify of table cells for delimited-text adapters
//!
//! Format-specific byte I/O (CSV, spreadsheets, dataframes, geo features) is
//! the job of adapters built on top of the [`Table`] and [`FlatRecord`]
//! surfaces; the codec itself is synchronous, in-memory and side-effect free.

pub mod config;
pub mod convert;
pub mod models;
pub mod path;
pub mod table;

// Re-export commonly used types
pub use config::DotnotationConfig;
pub use path::{DotPath, MalformedPathError, PathSegment};

pub use convert::{
    ConversionWarning, ConvertError, FlatRecord, FlattenResult, flatten_one, unflatten_one,
};

// Re-export models
pub use models::{
    Asset, AttributeKind, AttributeTemplate, Cardinality, ClassTemplate, PrimitiveType,
    RegistryError, Scalar, TypeRegistry, Value,
};

// Re-export table assembly
pub use table::{
    DisassembleResult, RowFailure, Table, TableError, TableOptions, TableResult,
    assets_from_string_rows, assets_from_table, destringify, group_by_type, group_single,
    stringify,
};
