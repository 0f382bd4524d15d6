//! Flatten engine
//!
//! Walks an asset's attribute tree in name order and produces one
//! [`FlatRecord`] entry per representable leaf path. Multi-valued complex
//! attributes fan out per index: every sub-path observed on any element gets a
//! value list aligned by element position, padded with `Null` where an element
//! did not set it. A list-valued sub-path inside a multi-valued parent has no
//! 2-D representation; it is dropped with a [`ConversionWarning::UnsupportedCardinality`]
//! instead of failing the conversion.

use std::collections::{BTreeMap, BTreeSet};

use tracing::warn;

use crate::config::DotnotationConfig;
use crate::convert::record::FlatRecord;
use crate::convert::{ConversionWarning, FlattenResult};
use crate::models::asset::{Asset, AttributeSet, AttributeValue};
use crate::models::template::AttributeTemplate;
use crate::models::value::{Scalar, Value};
use crate::path::{DotPath, PathSegment};

/// Flatten one object into a path-keyed record.
pub fn flatten_one(asset: &Asset, config: &DotnotationConfig) -> FlattenResult {
    let mut warnings = Vec::new();
    let entries = flatten_set(asset.attributes(), config, &DotPath::default(), &mut warnings);
    let record = entries.into_iter().collect::<FlatRecord>();
    FlattenResult { record, warnings }
}

/// Flatten a nested attribute set. `prefix` is the path from the object root
/// to this set, used only for diagnostics.
fn flatten_set(
    set: &AttributeSet,
    config: &DotnotationConfig,
    prefix: &DotPath,
    warnings: &mut Vec<ConversionWarning>,
) -> BTreeMap<DotPath, Value> {
    let mut out = BTreeMap::new();
    for attr in set.iter() {
        match attr.value() {
            AttributeValue::Empty => continue,
            AttributeValue::Scalar(s) => {
                out.insert(
                    DotPath::root(PathSegment::new(attr.name(), false)),
                    Value::Scalar(s.clone()),
                );
            }
            AttributeValue::ScalarList(items) => {
                // an empty list places nothing when read back; treat it as unset
                if items.is_empty() {
                    continue;
                }
                out.insert(
                    DotPath::root(PathSegment::new(attr.name(), true)),
                    Value::from_scalars(items.clone()),
                );
            }
            AttributeValue::Complex(nested) => {
                if let Some(payload) = shortcut_payload(attr.template(), config) {
                    collapse_single_wrapper(attr.name(), payload, nested, &mut out);
                    continue;
                }
                let segment = PathSegment::new(attr.name(), false);
                let nested_prefix = extend(prefix, &segment);
                let sub = flatten_set(nested, config, &nested_prefix, warnings);
                for (path, value) in sub {
                    out.insert(DotPath::prefixed(segment.clone(), &path), value);
                }
            }
            AttributeValue::ComplexList(elements) => {
                let segment = PathSegment::new(attr.name(), true);
                let nested_prefix = extend(prefix, &segment);
                if let Some(payload) = shortcut_payload(attr.template(), config) {
                    collapse_wrapper_list(
                        attr.name(),
                        payload,
                        elements,
                        config,
                        &nested_prefix,
                        warnings,
                        &mut out,
                    );
                    continue;
                }
                fan_out(elements, config, &nested_prefix, warnings, |path, value| {
                    out.insert(DotPath::prefixed(segment.clone(), &path), value);
                });
            }
        }
    }
    out
}

/// The payload template to collapse onto the wrapper's own path, when the
/// shortcut applies. Wrappers with a non-primitive payload fall back to the
/// ordinary nested form.
fn shortcut_payload<'a>(
    template: &'a AttributeTemplate,
    config: &DotnotationConfig,
) -> Option<&'a AttributeTemplate> {
    if !config.waarde_shortcut {
        return None;
    }
    template.payload().filter(|p| p.is_primitive())
}

/// Single wrapper with shortcut: the payload value appears at the wrapper's
/// own path. The segment carries the marker when the payload is a list.
fn collapse_single_wrapper(
    name: &str,
    payload: &AttributeTemplate,
    nested: &AttributeSet,
    out: &mut BTreeMap<DotPath, Value>,
) {
    let Some(slot) = nested.attribute(&payload.name) else {
        return;
    };
    match slot.value() {
        AttributeValue::Scalar(s) => {
            out.insert(
                DotPath::root(PathSegment::new(name, false)),
                Value::Scalar(s.clone()),
            );
        }
        AttributeValue::ScalarList(items) if !items.is_empty() => {
            out.insert(
                DotPath::root(PathSegment::new(name, true)),
                Value::from_scalars(items.clone()),
            );
        }
        _ => {}
    }
}

/// Multi-valued wrapper with shortcut: one payload scalar per element,
/// aligned by position. A multi-valued payload inside the list would need a
/// list per element and is dropped with a warning.
fn collapse_wrapper_list(
    name: &str,
    payload: &AttributeTemplate,
    elements: &[AttributeSet],
    config: &DotnotationConfig,
    nested_prefix: &DotPath,
    warnings: &mut Vec<ConversionWarning>,
    out: &mut BTreeMap<DotPath, Value>,
) {
    if payload.is_multi() {
        push_unsupported(nested_prefix.format(config), warnings);
        return;
    }
    let values: Vec<Option<Scalar>> = elements
        .iter()
        .map(|element| {
            element
                .attribute(&payload.name)
                .and_then(|slot| slot.scalar().cloned())
        })
        .collect();
    if values.iter().all(Option::is_none) {
        return;
    }
    out.insert(
        DotPath::root(PathSegment::new(name, true)),
        Value::from_scalars(values),
    );
}

/// Per-index fan-out over a complex list. Every sub-path seen on any element
/// is emitted once, as a list aligned to element positions.
fn fan_out(
    elements: &[AttributeSet],
    config: &DotnotationConfig,
    nested_prefix: &DotPath,
    warnings: &mut Vec<ConversionWarning>,
    mut emit: impl FnMut(DotPath, Value),
) {
    let count = elements.len();
    let mut merged: BTreeMap<DotPath, Vec<Value>> = BTreeMap::new();
    let mut dropped: BTreeSet<DotPath> = BTreeSet::new();
    for (index, element) in elements.iter().enumerate() {
        let sub = flatten_set(element, config, nested_prefix, warnings);
        for (path, value) in sub {
            if matches!(value, Value::List(_)) {
                // list per element: not representable in a 2-D table
                if dropped.insert(path.clone()) {
                    let full = join(nested_prefix, &path).format(config);
                    push_unsupported(full, warnings);
                }
                continue;
            }
            let column = merged.entry(path).or_default();
            if column.len() < index {
                column.resize(index, Value::Null);
            }
            column.push(value);
        }
    }
    for (path, mut column) in merged {
        if dropped.contains(&path) {
            continue;
        }
        column.resize(count, Value::Null);
        emit(path, Value::List(column));
    }
}

fn push_unsupported(path: String, warnings: &mut Vec<ConversionWarning>) {
    warn!(path = %path, "dropping list-per-element values not representable in a table");
    warnings.push(ConversionWarning::UnsupportedCardinality { path });
}

fn extend(prefix: &DotPath, segment: &PathSegment) -> DotPath {
    let mut segments: Vec<PathSegment> = prefix.segments().to_vec();
    segments.push(segment.clone());
    DotPath::from_segments(segments)
}

fn join(prefix: &DotPath, tail: &DotPath) -> DotPath {
    let mut segments: Vec<PathSegment> = prefix.segments().to_vec();
    segments.extend(tail.segments().iter().cloned());
    DotPath::from_segments(segments)
}
