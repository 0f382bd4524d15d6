//! Table assembly
//!
//! Batch conversion between asset sequences and 2-D tables. A table's header
//! always starts with the three identity columns (`typeURI`, then the
//! dotnotation forms of `assetId.identificator` and `assetId.toegekendDoor`);
//! the remaining columns are the sorted union of every other path seen across
//! the batch. Cells hold [`Value`]s; `stringify`/`destringify` convert cells
//! to and from the delimited text form used by text-based adapters.
//!
//! When importing, per-row failures are collected alongside the successfully
//! converted remainder unless `fail_fast` is set.

use std::collections::{BTreeMap, BTreeSet};

use tracing::warn;

use crate::config::DotnotationConfig;
use crate::convert::record::FlatRecord;
use crate::convert::{ConversionWarning, ConvertError, flatten_one, unflatten_one};
use crate::models::asset::Asset;
use crate::models::registry::TypeRegistry;
use crate::models::template::{ClassTemplate, ResolvedLeaf};
use crate::models::value::{Scalar, Value};
use crate::path::{DotPath, PathSegment};

/// Header name of the type column.
pub const TYPE_URI_COLUMN: &str = "typeURI";
/// Attribute holding the asset identity.
pub const ASSET_ID_ATTRIBUTE: &str = "assetId";
/// Identity sub-attribute: the identifier proper.
pub const IDENTIFICATOR_ATTRIBUTE: &str = "identificator";
/// Identity sub-attribute: the assigning party.
pub const TOEGEKEND_DOOR_ATTRIBUTE: &str = "toegekendDoor";

/// Fatal failure while assembling or disassembling a table.
#[derive(Debug, thiserror::Error)]
pub enum TableError {
    #[error("cannot build a table from an empty object sequence")]
    EmptySequence,
    #[error("object {index} has no identity value")]
    EmptyIdentity { index: usize },
    #[error("header has no typeURI column")]
    MissingTypeUriColumn,
    #[error("row {index} has no usable typeURI")]
    MissingTypeUri { index: usize },
    #[error("unknown type '{type_uri}' for row {index}")]
    UnknownType { index: usize, type_uri: String },
    #[error("header/row length mismatch at row {index}")]
    RaggedRow { index: usize },
    #[error(transparent)]
    Convert(#[from] ConvertError),
}

/// Assembly policy knobs.
#[derive(Debug, Clone, Copy, Default)]
pub struct TableOptions {
    /// Leave the identity cell absent instead of failing an identity-less object
    pub ignore_empty_identity: bool,
    /// Abort the whole batch on the first per-object failure
    pub fail_fast: bool,
}

/// A header plus value rows for one or more objects of compatible shape.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    /// Column names: the three fixed identity columns, then sorted paths
    pub header: Vec<String>,
    /// One row per object; `Value::Null` marks an absent cell
    pub rows: Vec<Vec<Value>>,
}

impl Table {
    /// Render header and rows as delimited-cell text for text-based adapters.
    ///
    /// A nested-list cell is fatal; the error names the offending column.
    pub fn to_string_rows(&self, config: &DotnotationConfig) -> Result<Vec<Vec<String>>, TableError> {
        let mut out = Vec::with_capacity(self.rows.len() + 1);
        out.push(self.header.clone());
        for row in &self.rows {
            let mut cells = Vec::with_capacity(row.len());
            for (name, value) in self.header.iter().zip(row) {
                let cell = stringify(value, config).map_err(|_| ConvertError::NestedList {
                    path: name.clone(),
                })?;
                cells.push(cell);
            }
            out.push(cells);
        }
        Ok(out)
    }
}

/// A single object that failed conversion within a batch.
#[derive(Debug)]
pub struct RowFailure {
    /// Index into the input sequence (or row index when importing)
    pub index: usize,
    pub error: TableError,
}

/// Output of a batch conversion to a table.
#[derive(Debug)]
pub struct TableResult {
    pub table: Table,
    /// Objects that failed conversion, by input index
    pub failures: Vec<RowFailure>,
    pub warnings: Vec<ConversionWarning>,
}

/// Output of a batch conversion back to assets.
#[derive(Debug)]
pub struct DisassembleResult {
    pub assets: Vec<Asset>,
    /// Rows that failed conversion, by row index
    pub failures: Vec<RowFailure>,
    pub warnings: Vec<ConversionWarning>,
}

fn identificator_path() -> DotPath {
    DotPath::from_segments(vec![
        PathSegment::new(ASSET_ID_ATTRIBUTE, false),
        PathSegment::new(IDENTIFICATOR_ATTRIBUTE, false),
    ])
}

fn toegekend_door_path() -> DotPath {
    DotPath::from_segments(vec![
        PathSegment::new(ASSET_ID_ATTRIBUTE, false),
        PathSegment::new(TOEGEKEND_DOOR_ATTRIBUTE, false),
    ])
}

/// Whether a record carries a non-empty identity value.
fn has_identity(record: &FlatRecord) -> bool {
    match record.get(&identificator_path()) {
        Some(Value::Scalar(Scalar::Text(s))) => !s.is_empty(),
        Some(Value::Scalar(_)) => true,
        _ => false,
    }
}

/// Assemble one table from a sequence of objects.
///
/// The header is the three fixed identity columns followed by the union of
/// all other paths seen, sorted by their rendered string form; each object
/// becomes one row with `Null`
/// for paths it did not set. An empty input sequence is fatal, as is an
/// object without a non-empty identity value unless `ignore_empty_identity`
/// is set (the identity cell is then simply left absent).
pub fn group_single(
    assets: &[Asset],
    config: &DotnotationConfig,
    options: &TableOptions,
) -> Result<TableResult, TableError> {
    if assets.is_empty() {
        return Err(TableError::EmptySequence);
    }
    let mut warnings = Vec::new();
    let mut flattened: Vec<(&Asset, FlatRecord)> = Vec::with_capacity(assets.len());
    for (index, asset) in assets.iter().enumerate() {
        let result = flatten_one(asset, config);
        warnings.extend(result.warnings);
        if !options.ignore_empty_identity && !has_identity(&result.record) {
            return Err(TableError::EmptyIdentity { index });
        }
        flattened.push((asset, result.record));
    }

    // columns sort by rendered name: structural path order diverges from
    // string order once an attribute name is a prefix of a sibling's
    let fixed = [identificator_path(), toegekend_door_path()];
    let mut other_columns: BTreeSet<(String, DotPath)> = BTreeSet::new();
    for (_, record) in &flattened {
        for path in record.paths() {
            if !fixed.contains(path) {
                other_columns.insert((path.format(config), path.clone()));
            }
        }
    }

    let mut header = vec![TYPE_URI_COLUMN.to_string()];
    header.extend(fixed.iter().map(|p| p.format(config)));
    header.extend(other_columns.iter().map(|(name, _)| name.clone()));

    let columns: Vec<DotPath> = fixed
        .iter()
        .cloned()
        .chain(other_columns.into_iter().map(|(_, path)| path))
        .collect();
    let mut rows = Vec::with_capacity(flattened.len());
    for (asset, record) in &flattened {
        let mut row = Vec::with_capacity(columns.len() + 1);
        row.push(Value::Scalar(Scalar::Text(asset.type_uri().to_string())));
        for path in &columns {
            row.push(record.get(path).cloned().unwrap_or(Value::Null));
        }
        rows.push(row);
    }

    Ok(TableResult {
        table: Table { header, rows },
        failures: Vec::new(),
        warnings,
    })
}

/// Assemble one table per runtime type.
///
/// Objects are bucketed by type URI before per-bucket assembly, so each table
/// only carries the columns its type actually uses.
pub fn group_by_type(
    assets: &[Asset],
    config: &DotnotationConfig,
    options: &TableOptions,
) -> Result<BTreeMap<String, TableResult>, TableError> {
    if assets.is_empty() {
        return Err(TableError::EmptySequence);
    }
    let mut buckets: BTreeMap<String, Vec<Asset>> = BTreeMap::new();
    for asset in assets {
        buckets
            .entry(asset.type_uri().to_string())
            .or_default()
            .push(asset.clone());
    }
    let mut out = BTreeMap::new();
    for (type_uri, bucket) in buckets {
        out.insert(type_uri, group_single(&bucket, config, options)?);
    }
    Ok(out)
}

/// Render one cell value to its delimited text form.
///
/// `Null` becomes the empty string, scalars their natural text form, lists
/// their elements joined by the cardinality separator (with empty text for
/// `Null` padding). A nested list cannot live in one delimited cell and is
/// fatal.
pub fn stringify(value: &Value, config: &DotnotationConfig) -> Result<String, ConvertError> {
    match value {
        Value::Null => Ok(String::new()),
        Value::Scalar(s) => Ok(s.to_string()),
        Value::List(items) => {
            let mut parts = Vec::with_capacity(items.len());
            for item in items {
                match item {
                    Value::Null => parts.push(String::new()),
                    Value::Scalar(s) => parts.push(s.to_string()),
                    Value::List(_) => {
                        return Err(ConvertError::NestedList {
                            path: String::new(),
                        });
                    }
                }
            }
            Ok(parts.join(&config.cardinality_separator))
        }
    }
}

/// Parse one text cell back into a value, driven by the leaf the target path
/// resolved to — never by guessing from the text.
pub fn destringify(text: &str, leaf: &ResolvedLeaf, config: &DotnotationConfig) -> Value {
    if text.is_empty() {
        return Value::Null;
    }
    if leaf.list_valued {
        let items = text
            .split(config.cardinality_separator.as_str())
            .map(|part| {
                if part.is_empty() {
                    Value::Null
                } else {
                    Value::Scalar(Scalar::parse_as(part, leaf.datatype))
                }
            })
            .collect();
        Value::List(items)
    } else {
        Value::Scalar(Scalar::parse_as(text, leaf.datatype))
    }
}

/// Parsed header: column paths with the typeURI column position.
struct ParsedHeader {
    type_uri_column: usize,
    columns: Vec<(usize, DotPath)>,
}

fn parse_header(header: &[String], config: &DotnotationConfig) -> Result<ParsedHeader, TableError> {
    let type_uri_column = header
        .iter()
        .position(|name| name == TYPE_URI_COLUMN)
        .ok_or(TableError::MissingTypeUriColumn)?;
    let mut columns = Vec::with_capacity(header.len().saturating_sub(1));
    for (position, name) in header.iter().enumerate() {
        if position == type_uri_column {
            continue;
        }
        let path = DotPath::parse(name, config).map_err(ConvertError::from)?;
        columns.push((position, path));
    }
    Ok(ParsedHeader {
        type_uri_column,
        columns,
    })
}

fn row_type_uri(row: &[Value], position: usize, index: usize) -> Result<String, TableError> {
    match row.get(position) {
        Some(Value::Scalar(Scalar::Text(s))) if !s.is_empty() => Ok(s.clone()),
        _ => Err(TableError::MissingTypeUri { index }),
    }
}

/// Rebuild assets from a table of value cells.
///
/// Each row's typeURI resolves a class through the registry; the remaining
/// cells become a flat record handed to the unflatten engine. Failed rows are
/// collected (or abort the batch under `fail_fast`).
pub fn assets_from_table(
    table: &Table,
    registry: &TypeRegistry,
    config: &DotnotationConfig,
    options: &TableOptions,
) -> Result<DisassembleResult, TableError> {
    let header = parse_header(&table.header, config)?;
    let mut assets = Vec::with_capacity(table.rows.len());
    let mut failures = Vec::new();
    let mut warnings = Vec::new();
    for (index, row) in table.rows.iter().enumerate() {
        match asset_from_row(row, &header, registry, config, index) {
            Ok((asset, row_warnings)) => {
                warnings.extend(row_warnings);
                assets.push(asset);
            }
            Err(error) => {
                if options.fail_fast {
                    return Err(error);
                }
                warn!(index, %error, "skipping row that failed conversion");
                failures.push(RowFailure { index, error });
            }
        }
    }
    Ok(DisassembleResult {
        assets,
        failures,
        warnings,
    })
}

fn asset_from_row(
    row: &[Value],
    header: &ParsedHeader,
    registry: &TypeRegistry,
    config: &DotnotationConfig,
    index: usize,
) -> Result<(Asset, Vec<ConversionWarning>), TableError> {
    if row.len() != header.columns.len() + 1 {
        return Err(TableError::RaggedRow { index });
    }
    let type_uri = row_type_uri(row, header.type_uri_column, index)?;
    let mut asset = registry
        .instantiate(&type_uri)
        .map_err(|_| TableError::UnknownType { index, type_uri })?;
    let mut record = FlatRecord::new();
    for (position, path) in &header.columns {
        let value = &row[*position];
        if !value.is_null() {
            record.insert(path.clone(), value.clone());
        }
    }
    let warnings = unflatten_one(&mut asset, &record, config).map_err(TableError::from)?;
    Ok((asset, warnings))
}

/// Rebuild assets from text rows (header row first), destringifying each
/// cell against the declared cardinality and datatype of the row's class.
pub fn assets_from_string_rows(
    rows: &[Vec<String>],
    registry: &TypeRegistry,
    config: &DotnotationConfig,
    options: &TableOptions,
) -> Result<DisassembleResult, TableError> {
    let Some((header_row, data_rows)) = rows.split_first() else {
        return Err(TableError::EmptySequence);
    };
    let header = parse_header(header_row, config)?;
    let mut assets = Vec::with_capacity(data_rows.len());
    let mut failures = Vec::new();
    let mut warnings = Vec::new();
    for (index, cells) in data_rows.iter().enumerate() {
        match asset_from_string_row(cells, &header, registry, config, index) {
            Ok((asset, row_warnings)) => {
                warnings.extend(row_warnings);
                assets.push(asset);
            }
            Err(error) => {
                if options.fail_fast {
                    return Err(error);
                }
                warn!(index, %error, "skipping row that failed conversion");
                failures.push(RowFailure { index, error });
            }
        }
    }
    Ok(DisassembleResult {
        assets,
        failures,
        warnings,
    })
}

fn asset_from_string_row(
    cells: &[String],
    header: &ParsedHeader,
    registry: &TypeRegistry,
    config: &DotnotationConfig,
    index: usize,
) -> Result<(Asset, Vec<ConversionWarning>), TableError> {
    if cells.len() != header.columns.len() + 1 {
        return Err(TableError::RaggedRow { index });
    }
    let type_uri = match cells.get(header.type_uri_column) {
        Some(s) if !s.is_empty() => s.clone(),
        _ => return Err(TableError::MissingTypeUri { index }),
    };
    let class = registry
        .class(&type_uri)
        .ok_or_else(|| TableError::UnknownType {
            index,
            type_uri: type_uri.clone(),
        })?;
    let record = record_from_string_cells(cells, header, class, config)?;
    let mut asset = registry
        .instantiate(&type_uri)
        .map_err(|_| TableError::UnknownType { index, type_uri })?;
    let warnings = unflatten_one(&mut asset, &record, config).map_err(TableError::from)?;
    Ok((asset, warnings))
}

fn record_from_string_cells(
    cells: &[String],
    header: &ParsedHeader,
    class: &ClassTemplate,
    config: &DotnotationConfig,
) -> Result<FlatRecord, TableError> {
    let mut record = FlatRecord::new();
    for (position, path) in &header.columns {
        let text = &cells[*position];
        if text.is_empty() {
            continue;
        }
        let leaf = class.resolve(path).map_err(|e| {
            ConvertError::InvalidPlacement {
                path: path.format(config),
                detail: e.to_string(),
            }
        })?;
        let value = destringify(text, &leaf, config);
        if !value.is_null() {
            record.insert(path.clone(), value);
        }
    }
    Ok(record)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stringify_null_and_scalar() {
        let config = DotnotationConfig::default();
        assert_eq!(stringify(&Value::Null, &config).unwrap(), "");
        assert_eq!(
            stringify(&Value::Scalar(Scalar::from("x")), &config).unwrap(),
            "x"
        );
    }

    #[test]
    fn test_stringify_list_with_padding() {
        let config = DotnotationConfig::default();
        let value = Value::List(vec![
            Value::Scalar(Scalar::from("x")),
            Value::Null,
            Value::Scalar(Scalar::Integer(3)),
        ]);
        assert_eq!(stringify(&value, &config).unwrap(), "x||3");
    }

    #[test]
    fn test_stringify_nested_list_is_fatal() {
        let config = DotnotationConfig::default();
        let value = Value::List(vec![Value::List(vec![])]);
        assert!(matches!(
            stringify(&value, &config),
            Err(ConvertError::NestedList { .. })
        ));
    }

    #[test]
    fn test_destringify_is_cardinality_driven() {
        let config = DotnotationConfig::default();
        let single = ResolvedLeaf {
            datatype: crate::models::template::PrimitiveType::Text,
            list_valued: false,
        };
        let multi = ResolvedLeaf {
            list_valued: true,
            ..single
        };
        // same text, different declared cardinality
        assert_eq!(
            destringify("x|y", &single, &config),
            Value::Scalar(Scalar::from("x|y"))
        );
        assert_eq!(
            destringify("x|y", &multi, &config),
            Value::List(vec![
                Value::Scalar(Scalar::from("x")),
                Value::Scalar(Scalar::from("y")),
            ])
        );
        assert_eq!(destringify("", &single, &config), Value::Null);
    }
}
