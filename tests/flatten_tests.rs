//! Flatten engine tests

use dotnotation_sdk::convert::flatten_one;
use dotnotation_sdk::models::{
    Asset, AttributeTemplate, Cardinality, ClassTemplate, PrimitiveType, Scalar, TypeRegistry,
    Value,
};
use dotnotation_sdk::{ConversionWarning, DotPath, DotnotationConfig};

fn gate_class() -> ClassTemplate {
    ClassTemplate::new(
        "https://example.org/ns#Gate",
        vec![
            AttributeTemplate::complex(
                "assetId",
                vec![
                    AttributeTemplate::primitive("identificator", PrimitiveType::Text),
                    AttributeTemplate::primitive("toegekendDoor", PrimitiveType::Text),
                ],
            ),
            AttributeTemplate::primitive("name", PrimitiveType::Text),
            AttributeTemplate::primitive("tags", PrimitiveType::Text)
                .with_cardinality(Cardinality::Multi),
            AttributeTemplate::wrapper(
                "width",
                AttributeTemplate::primitive("waarde", PrimitiveType::Float),
            ),
            AttributeTemplate::complex(
                "hinges",
                vec![
                    AttributeTemplate::primitive("weight", PrimitiveType::Float),
                    AttributeTemplate::primitive("label", PrimitiveType::Text),
                ],
            )
            .with_cardinality(Cardinality::Multi),
        ],
    )
}

fn registry() -> TypeRegistry {
    TypeRegistry::from_classes(vec![gate_class()])
}

fn empty_gate() -> Asset {
    registry().instantiate("https://example.org/ns#Gate").unwrap()
}

fn path(s: &str, config: &DotnotationConfig) -> DotPath {
    DotPath::parse(s, config).unwrap()
}

mod scalar_tests {
    use super::*;

    #[test]
    fn test_flatten_single_scalar() {
        let config = DotnotationConfig::default();
        let mut gate = empty_gate();
        gate.attribute_mut("name")
            .unwrap()
            .set_scalar(Scalar::from("north-gate"))
            .unwrap();

        let result = flatten_one(&gate, &config);
        assert!(result.warnings.is_empty());
        assert_eq!(result.record.len(), 1);
        assert_eq!(
            result.record.get(&path("name", &config)),
            Some(&Value::Scalar(Scalar::from("north-gate")))
        );
    }

    #[test]
    fn test_flatten_scalar_list() {
        let config = DotnotationConfig::default();
        let mut gate = empty_gate();
        let tags = gate.attribute_mut("tags").unwrap();
        tags.push_scalar(Some(Scalar::from("x"))).unwrap();
        tags.push_scalar(Some(Scalar::from("y"))).unwrap();

        let result = flatten_one(&gate, &config);
        assert_eq!(
            result.record.get(&path("tags[]", &config)),
            Some(&Value::List(vec![
                Value::Scalar(Scalar::from("x")),
                Value::Scalar(Scalar::from("y")),
            ]))
        );
    }

    #[test]
    fn test_flatten_skips_empty_scalar_list() {
        // a zero-length list reads back as unset, so it is not emitted at all
        let config = DotnotationConfig::default();
        let mut gate = empty_gate();
        gate.attribute_mut("tags")
            .unwrap()
            .set_scalar_list(vec![])
            .unwrap();

        let result = flatten_one(&gate, &config);
        assert!(result.record.is_empty());
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn test_flatten_skips_unset_attributes() {
        let config = DotnotationConfig::default();
        let gate = empty_gate();
        let result = flatten_one(&gate, &config);
        assert!(result.record.is_empty());
    }
}

mod complex_tests {
    use super::*;

    #[test]
    fn test_flatten_complex_single_prefixes_children() {
        let config = DotnotationConfig::default();
        let mut gate = empty_gate();
        let asset_id = gate.attribute_mut("assetId").unwrap();
        let nested = asset_id.materialize_complex().unwrap();
        nested
            .attribute_mut("identificator")
            .unwrap()
            .set_scalar(Scalar::from("G-001"))
            .unwrap();

        let result = flatten_one(&gate, &config);
        assert_eq!(
            result.record.get(&path("assetId.identificator", &config)),
            Some(&Value::Scalar(Scalar::from("G-001")))
        );
    }

    #[test]
    fn test_cardinality_alignment_pads_with_null() {
        // three elements; weight set on elements 0 and 2 only
        let config = DotnotationConfig::default();
        let mut gate = empty_gate();
        let hinges = gate.attribute_mut("hinges").unwrap();
        hinges
            .allocate_next_slot()
            .unwrap()
            .attribute_mut("weight")
            .unwrap()
            .set_scalar(Scalar::Float(1.0))
            .unwrap();
        hinges.allocate_next_slot().unwrap();
        hinges
            .allocate_next_slot()
            .unwrap()
            .attribute_mut("weight")
            .unwrap()
            .set_scalar(Scalar::Float(3.0))
            .unwrap();

        let result = flatten_one(&gate, &config);
        assert_eq!(
            result.record.get(&path("hinges[].weight", &config)),
            Some(&Value::List(vec![
                Value::Scalar(Scalar::Float(1.0)),
                Value::Null,
                Value::Scalar(Scalar::Float(3.0)),
            ]))
        );
    }

    #[test]
    fn test_sibling_subpaths_align_by_position() {
        // first element sets weight, second sets label
        let config = DotnotationConfig::default();
        let mut gate = empty_gate();
        let hinges = gate.attribute_mut("hinges").unwrap();
        hinges
            .allocate_next_slot()
            .unwrap()
            .attribute_mut("weight")
            .unwrap()
            .set_scalar(Scalar::Float(1.0))
            .unwrap();
        hinges
            .allocate_next_slot()
            .unwrap()
            .attribute_mut("label")
            .unwrap()
            .set_scalar(Scalar::from("b"))
            .unwrap();

        let result = flatten_one(&gate, &config);
        assert_eq!(
            result.record.get(&path("hinges[].weight", &config)),
            Some(&Value::List(vec![
                Value::Scalar(Scalar::Float(1.0)),
                Value::Null,
            ]))
        );
        assert_eq!(
            result.record.get(&path("hinges[].label", &config)),
            Some(&Value::List(vec![
                Value::Null,
                Value::Scalar(Scalar::from("b")),
            ]))
        );
    }
}

mod nested_cardinality_tests {
    use super::*;

    fn fence_class() -> ClassTemplate {
        ClassTemplate::new(
            "https://example.org/ns#Fence",
            vec![
                AttributeTemplate::complex(
                    "panels",
                    vec![
                        AttributeTemplate::primitive("label", PrimitiveType::Text),
                        AttributeTemplate::primitive("bolts", PrimitiveType::Integer)
                            .with_cardinality(Cardinality::Multi),
                    ],
                )
                .with_cardinality(Cardinality::Multi),
            ],
        )
    }

    #[test]
    fn test_list_inside_list_is_dropped_with_warning() {
        let config = DotnotationConfig::default();
        let registry = TypeRegistry::from_classes(vec![fence_class()]);
        let mut fence = registry.instantiate("https://example.org/ns#Fence").unwrap();
        let panels = fence.attribute_mut("panels").unwrap();
        let first = panels.allocate_next_slot().unwrap();
        first
            .attribute_mut("label")
            .unwrap()
            .set_scalar(Scalar::from("a"))
            .unwrap();
        first
            .attribute_mut("bolts")
            .unwrap()
            .push_scalar(Some(Scalar::Integer(4)))
            .unwrap();

        let result = flatten_one(&fence, &config);
        // the representable sibling survives, the nested list is gone
        assert!(result.record.contains(&path("panels[].label", &config)));
        assert!(!result.record.contains(&path("panels[].bolts[]", &config)));
        assert_eq!(result.warnings.len(), 1);
        assert!(matches!(
            &result.warnings[0],
            ConversionWarning::UnsupportedCardinality { path } if path == "panels[].bolts[]"
        ));
    }
}

mod shortcut_tests {
    use super::*;

    fn set_width(gate: &mut Asset, value: f64) {
        let width = gate.attribute_mut("width").unwrap();
        width
            .materialize_complex()
            .unwrap()
            .attribute_mut("waarde")
            .unwrap()
            .set_scalar(Scalar::Float(value))
            .unwrap();
    }

    #[test]
    fn test_wrapper_without_shortcut_keeps_payload_segment() {
        let config = DotnotationConfig::default();
        let mut gate = empty_gate();
        set_width(&mut gate, 2.5);

        let result = flatten_one(&gate, &config);
        assert_eq!(
            result.record.get(&path("width.waarde", &config)),
            Some(&Value::Scalar(Scalar::Float(2.5)))
        );
        assert!(!result.record.contains(&path("width", &config)));
    }

    #[test]
    fn test_wrapper_with_shortcut_collapses_payload() {
        let config = DotnotationConfig::with_waarde_shortcut();
        let mut gate = empty_gate();
        set_width(&mut gate, 2.5);

        let result = flatten_one(&gate, &config);
        assert_eq!(
            result.record.get(&path("width", &config)),
            Some(&Value::Scalar(Scalar::Float(2.5)))
        );
        assert!(!result.record.contains(&path("width.waarde", &config)));
    }

    #[test]
    fn test_wrapper_list_with_shortcut() {
        let class = ClassTemplate::new(
            "https://example.org/ns#Span",
            vec![
                AttributeTemplate::wrapper(
                    "loads",
                    AttributeTemplate::primitive("waarde", PrimitiveType::Float),
                )
                .with_cardinality(Cardinality::Multi),
            ],
        );
        let registry = TypeRegistry::from_classes(vec![class]);
        let config = DotnotationConfig::with_waarde_shortcut();
        let mut span = registry.instantiate("https://example.org/ns#Span").unwrap();
        let loads = span.attribute_mut("loads").unwrap();
        loads
            .allocate_next_slot()
            .unwrap()
            .attribute_mut("waarde")
            .unwrap()
            .set_scalar(Scalar::Float(10.0))
            .unwrap();
        loads.allocate_next_slot().unwrap();

        let result = flatten_one(&span, &config);
        assert_eq!(
            result.record.get(&path("loads[]", &config)),
            Some(&Value::List(vec![
                Value::Scalar(Scalar::Float(10.0)),
                Value::Null,
            ]))
        );
    }
}
