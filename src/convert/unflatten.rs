//! Unflatten engine
//!
//! Populates a freshly constructed asset from a [`FlatRecord`]. Each entry's
//! path is walked segment by segment; single complex values are materialized
//! on demand, multi segments allocate one list slot per element of the value
//! list (an explicit growth operation, never triggered by a read). A path that
//! terminates at a simple wrapper sets the wrapper's payload directly, which
//! is how shortcut and non-shortcut paths coexist without ambiguity.
//!
//! Coercion mismatches recover locally with warnings; structurally ambiguous
//! placements and list-of-lists beyond the single fan-out level are fatal for
//! the object.

use tracing::warn;

use crate::config::DotnotationConfig;
use crate::convert::record::FlatRecord;
use crate::convert::{ConversionWarning, ConvertError};
use crate::models::asset::{Asset, Attribute, AttributeSet, ModelError};
use crate::models::template::{AttributeKind, AttributeTemplate};
use crate::models::value::{Scalar, Value};
use crate::path::{DotPath, PathSegment};

/// Populate an empty asset's attributes from a flat record.
///
/// Returns the warnings recovered along the way; a fatal error aborts this
/// object's conversion and leaves the asset partially populated (callers
/// discard it).
pub fn unflatten_one(
    asset: &mut Asset,
    record: &FlatRecord,
    config: &DotnotationConfig,
) -> Result<Vec<ConversionWarning>, ConvertError> {
    let mut warnings = Vec::new();
    let owner = asset.type_uri().to_string();
    for (path, value) in record.iter() {
        if path.is_empty() || value.is_null() {
            continue;
        }
        place(
            asset.attributes_mut(),
            path.segments(),
            value,
            path,
            &owner,
            config,
            &mut warnings,
        )?;
    }
    Ok(warnings)
}

fn place(
    set: &mut AttributeSet,
    segments: &[PathSegment],
    value: &Value,
    full: &DotPath,
    owner: &str,
    config: &DotnotationConfig,
    warnings: &mut Vec<ConversionWarning>,
) -> Result<(), ConvertError> {
    let segment = &segments[0];
    let attr = set
        .attribute_mut(&segment.name)
        .ok_or_else(|| ConvertError::UnknownAttribute {
            attribute: segment.name.clone(),
            owner: owner.to_string(),
        })?;

    if segments.len() == 1 {
        return place_terminal(attr, value, full, config, warnings);
    }

    if attr.template().is_primitive() {
        return Err(invalid(
            full,
            config,
            format!("path continues past primitive attribute '{}'", segment.name),
        ));
    }

    // cardinality comes from the template; the parsed marker only had to
    // round-trip through the grammar
    if !attr.is_multi() {
        let child_owner = attr.name().to_string();
        let nested = attr
            .materialize_complex()
            .map_err(|e| invalid(full, config, e.to_string()))?;
        return place(
            nested,
            &segments[1..],
            value,
            full,
            &child_owner,
            config,
            warnings,
        );
    }

    let Value::List(items) = value else {
        return Err(invalid(
            full,
            config,
            format!("expected a list at multi-valued segment '{}'", segment.name),
        ));
    };
    let child_owner = attr.name().to_string();
    attr.ensure_slots(items.len())
        .map_err(|e| invalid(full, config, e.to_string()))?;
    for (index, item) in items.iter().enumerate() {
        match item {
            // slot stays allocated but empty, preserving positional alignment
            Value::Null => {}
            Value::List(_) => {
                return Err(ConvertError::NestedList {
                    path: full.format(config),
                });
            }
            Value::Scalar(_) => {
                let slot = attr
                    .slot_mut(index)
                    .ok_or_else(|| invalid(full, config, "list slot missing".to_string()))?;
                place(
                    slot,
                    &segments[1..],
                    item,
                    full,
                    &child_owner,
                    config,
                    warnings,
                )?;
            }
        }
    }
    Ok(())
}

/// Place a value at the attribute the final path segment addresses.
fn place_terminal(
    attr: &mut Attribute,
    value: &Value,
    full: &DotPath,
    config: &DotnotationConfig,
    warnings: &mut Vec<ConversionWarning>,
) -> Result<(), ConvertError> {
    let kind = attr.template().kind.clone();
    match kind {
        AttributeKind::Primitive { .. } => {
            if attr.is_multi() {
                set_scalar_list(attr, value, full, config, warnings)
            } else {
                set_single_scalar(attr, value, full, config, warnings)
            }
        }
        AttributeKind::SimpleWrapper { payload } => {
            set_wrapper_payload(attr, &payload, value, full, config, warnings)
        }
        AttributeKind::Complex { .. } | AttributeKind::Union { .. } => Err(invalid(
            full,
            config,
            format!("path ends at complex attribute '{}'", attr.name()),
        )),
    }
}

fn set_single_scalar(
    attr: &mut Attribute,
    value: &Value,
    full: &DotPath,
    config: &DotnotationConfig,
    warnings: &mut Vec<ConversionWarning>,
) -> Result<(), ConvertError> {
    match value {
        Value::Null => Ok(()),
        Value::Scalar(s) => apply_scalar(attr, s, full, config, warnings),
        Value::List(_) => Err(invalid(
            full,
            config,
            format!("list value for single-valued attribute '{}'", attr.name()),
        )),
    }
}

fn set_scalar_list(
    attr: &mut Attribute,
    value: &Value,
    full: &DotPath,
    config: &DotnotationConfig,
    warnings: &mut Vec<ConversionWarning>,
) -> Result<(), ConvertError> {
    let items: Vec<&Value> = match value {
        Value::List(items) => items.iter().collect(),
        // a lone scalar against a multi-valued attribute becomes its only element
        Value::Scalar(_) => vec![value],
        Value::Null => return Ok(()),
    };
    for item in items {
        match item {
            Value::Null => {
                attr.push_scalar(None)
                    .map_err(|e| invalid(full, config, e.to_string()))?;
            }
            Value::Scalar(s) => push_with_coercion(attr, s, full, config, warnings)?,
            Value::List(_) => {
                return Err(ConvertError::NestedList {
                    path: full.format(config),
                });
            }
        }
    }
    Ok(())
}

/// Shortcut resolution: the path stopped at a simple wrapper, so the value
/// belongs to its payload.
fn set_wrapper_payload(
    attr: &mut Attribute,
    payload: &AttributeTemplate,
    value: &Value,
    full: &DotPath,
    config: &DotnotationConfig,
    warnings: &mut Vec<ConversionWarning>,
) -> Result<(), ConvertError> {
    if !payload.is_primitive() {
        return Err(invalid(
            full,
            config,
            format!("wrapper '{}' has a non-primitive payload", attr.name()),
        ));
    }
    if attr.is_multi() {
        // one wrapper element per list position, payload set where present
        let Value::List(items) = value else {
            return Err(invalid(
                full,
                config,
                format!("expected a list at multi-valued wrapper '{}'", attr.name()),
            ));
        };
        attr.ensure_slots(items.len())
            .map_err(|e| invalid(full, config, e.to_string()))?;
        for (index, item) in items.iter().enumerate() {
            match item {
                Value::Null => {}
                Value::List(_) => {
                    return Err(ConvertError::NestedList {
                        path: full.format(config),
                    });
                }
                Value::Scalar(s) => {
                    let slot = attr
                        .slot_mut(index)
                        .ok_or_else(|| invalid(full, config, "list slot missing".to_string()))?;
                    let payload_attr = slot.attribute_mut(&payload.name).ok_or_else(|| {
                        invalid(full, config, format!("missing payload '{}'", payload.name))
                    })?;
                    apply_scalar(payload_attr, s, full, config, warnings)?;
                }
            }
        }
        return Ok(());
    }

    let nested = attr
        .materialize_complex()
        .map_err(|e| invalid(full, config, e.to_string()))?;
    let payload_attr = nested
        .attribute_mut(&payload.name)
        .ok_or_else(|| invalid(full, config, format!("missing payload '{}'", payload.name)))?;
    if payload.is_multi() {
        set_scalar_list(payload_attr, value, full, config, warnings)
    } else {
        set_single_scalar(payload_attr, value, full, config, warnings)
    }
}

/// Set one scalar with best-effort coercion, recovering mismatches as warnings.
fn apply_scalar(
    attr: &mut Attribute,
    scalar: &Scalar,
    full: &DotPath,
    config: &DotnotationConfig,
    warnings: &mut Vec<ConversionWarning>,
) -> Result<(), ConvertError> {
    let from = scalar.primitive_type();
    match attr.set_scalar(scalar.clone()) {
        Ok(false) => Ok(()),
        Ok(true) => {
            let to = attr
                .template()
                .datatype()
                .map(|d| d.to_string())
                .unwrap_or_default();
            let path = full.format(config);
            warn!(path = %path, %from, %to, "coerced scalar to declared primitive type");
            warnings.push(ConversionWarning::TypeCoercion {
                path,
                from: from.to_string(),
                to,
            });
            Ok(())
        }
        Err(ModelError::Coercion(e)) => {
            let path = full.format(config);
            warn!(path = %path, error = %e, "discarding unconvertible scalar");
            warnings.push(ConversionWarning::DiscardedValue {
                path,
                detail: e.to_string(),
            });
            Ok(())
        }
        Err(e) => Err(invalid(full, config, e.to_string())),
    }
}

fn push_with_coercion(
    attr: &mut Attribute,
    scalar: &Scalar,
    full: &DotPath,
    config: &DotnotationConfig,
    warnings: &mut Vec<ConversionWarning>,
) -> Result<(), ConvertError> {
    let from = scalar.primitive_type();
    match attr.push_scalar(Some(scalar.clone())) {
        Ok(false) => Ok(()),
        Ok(true) => {
            let to = attr
                .template()
                .datatype()
                .map(|d| d.to_string())
                .unwrap_or_default();
            let path = full.format(config);
            warn!(path = %path, %from, %to, "coerced scalar to declared primitive type");
            warnings.push(ConversionWarning::TypeCoercion {
                path,
                from: from.to_string(),
                to,
            });
            Ok(())
        }
        Err(ModelError::Coercion(e)) => {
            // keep positional alignment: the failed element becomes padding
            let path = full.format(config);
            warn!(path = %path, error = %e, "discarding unconvertible list element");
            warnings.push(ConversionWarning::DiscardedValue {
                path,
                detail: e.to_string(),
            });
            attr.push_scalar(None)
                .map_err(|err| invalid(full, config, err.to_string()))?;
            Ok(())
        }
        Err(e) => Err(invalid(full, config, e.to_string())),
    }
}

fn invalid(full: &DotPath, config: &DotnotationConfig, detail: String) -> ConvertError {
    ConvertError::InvalidPlacement {
        path: full.format(config),
        detail,
    }
}
