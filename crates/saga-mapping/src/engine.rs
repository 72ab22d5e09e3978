//! Schema-guided projection of a source payload onto a destination payload,
//! per a declarative `EmitMapping`.
//!
//! The mapping engine walks the *destination schema*, not the source
//! payload — recursion terminates on schema depth, and every destination
//! key the schema declares gets exactly one outcome: populated, or omitted
//! with a warning explaining why.

use indexmap::IndexMap;
use saga_scenario::{EmitMapping, PayloadSchema, PrimitiveType};
use serde_json::{Map, Value};

/// One recoverable issue encountered while applying a mapping. The caller
/// decides what to do with these (log, collect, ignore); the engine always
/// returns the best-effort partial result regardless.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MappingWarning {
    pub path: String,
    pub message: String,
}

/// Apply `mapping` against `destination_schema`, pulling values from
/// `source_payload`. Returns the partial object that could be built; any
/// destination key that couldn't be populated is simply omitted, with a
/// corresponding warning delivered to `warn` unless the mapping had no
/// entry for that key at all (an absent entry is not itself a warning).
pub fn apply_emit_mapping(
    source_payload: &Map<String, Value>,
    destination_schema: &PayloadSchema,
    mapping: Option<&EmitMapping>,
    warn: &mut dyn FnMut(MappingWarning),
) -> Map<String, Value> {
    let dest_fields = match destination_schema {
        PayloadSchema::Object(fields) => fields,
        _ => return Map::new(),
    };
    let mapping_fields = top_level_fields(mapping);
    apply_object(source_payload, dest_fields, mapping_fields, "", warn)
}

fn top_level_fields(mapping: Option<&EmitMapping>) -> Option<&IndexMap<String, EmitMapping>> {
    match mapping {
        Some(EmitMapping::Map(fields)) => Some(fields),
        _ => None,
    }
}

fn apply_object(
    source: &Map<String, Value>,
    dest_fields: &IndexMap<String, PayloadSchema>,
    mapping_fields: Option<&IndexMap<String, EmitMapping>>,
    path: &str,
    warn: &mut dyn FnMut(MappingWarning),
) -> Map<String, Value> {
    let mut out = Map::new();

    for (key, schema) in dest_fields {
        let Some(entry) = mapping_fields.and_then(|m| m.get(key)) else {
            continue;
        };
        let key_path = join_path(path, key);
        if let Some(value) = resolve_entry(source, schema, entry, &key_path, warn) {
            out.insert(key.clone(), value);
        }
    }

    out
}

fn resolve_entry(
    source: &Map<String, Value>,
    schema: &PayloadSchema,
    entry: &EmitMapping,
    path: &str,
    warn: &mut dyn FnMut(MappingWarning),
) -> Option<Value> {
    match entry {
        EmitMapping::Field(name) | EmitMapping::From { from: name } => {
            copy_field(source, name, schema, path, warn)
        }
        EmitMapping::Const { value } => {
            if type_compatible(value, schema) {
                Some(value.clone())
            } else {
                warn(MappingWarning {
                    path: path.to_string(),
                    message: format!(
                        "Constant value is incompatible with type \"{}\"",
                        type_name(schema)
                    ),
                });
                None
            }
        }
        EmitMapping::ObjectFrom { object_from, map } => {
            resolve_object_from(source, object_from, map, schema, path, warn)
        }
        EmitMapping::Map(map) => resolve_object_in_place(source, map, schema, path, warn),
        EmitMapping::ArrayFrom { array_from, map } => {
            resolve_array_from(source, array_from, map, schema, path, warn)
        }
    }
}

fn copy_field(
    source: &Map<String, Value>,
    name: &str,
    schema: &PayloadSchema,
    path: &str,
    warn: &mut dyn FnMut(MappingWarning),
) -> Option<Value> {
    match source.get(name) {
        None => {
            warn(MappingWarning {
                path: path.to_string(),
                message: format!("Field \"{name}\" is missing in source payload"),
            });
            None
        }
        Some(value) if type_compatible(value, schema) => Some(value.clone()),
        Some(_) => {
            warn(MappingWarning {
                path: path.to_string(),
                message: format!(
                    "Field \"{name}\" has incompatible type for destination \"{}\"",
                    type_name(schema)
                ),
            });
            None
        }
    }
}

fn resolve_object_from(
    source: &Map<String, Value>,
    object_from: &str,
    map: &IndexMap<String, EmitMapping>,
    schema: &PayloadSchema,
    path: &str,
    warn: &mut dyn FnMut(MappingWarning),
) -> Option<Value> {
    let PayloadSchema::Object(sub_fields) = schema else {
        warn(MappingWarning {
            path: path.to_string(),
            message: format!(
                "Field \"{object_from}\" has incompatible type for destination \"{}\"",
                type_name(schema)
            ),
        });
        return None;
    };
    match source.get(object_from) {
        None => {
            warn(MappingWarning {
                path: path.to_string(),
                message: format!("Field \"{object_from}\" is missing in source payload"),
            });
            None
        }
        Some(Value::Object(sub_source)) => Some(Value::Object(apply_object(
            sub_source,
            sub_fields,
            Some(map),
            path,
            warn,
        ))),
        Some(_) => {
            warn(MappingWarning {
                path: path.to_string(),
                message: format!(
                    "Field \"{object_from}\" has incompatible type for destination \"object\""
                ),
            });
            None
        }
    }
}

fn resolve_object_in_place(
    source: &Map<String, Value>,
    map: &IndexMap<String, EmitMapping>,
    schema: &PayloadSchema,
    path: &str,
    warn: &mut dyn FnMut(MappingWarning),
) -> Option<Value> {
    let PayloadSchema::Object(sub_fields) = schema else {
        warn(MappingWarning {
            path: path.to_string(),
            message: format!(
                "Nested mapping is incompatible with destination \"{}\"",
                type_name(schema)
            ),
        });
        return None;
    };
    Some(Value::Object(apply_object(
        source, sub_fields, Some(map), path, warn,
    )))
}

fn resolve_array_from(
    source: &Map<String, Value>,
    array_from: &str,
    map: &IndexMap<String, EmitMapping>,
    schema: &PayloadSchema,
    path: &str,
    warn: &mut dyn FnMut(MappingWarning),
) -> Option<Value> {
    let PayloadSchema::Array(item_schemas) = schema else {
        warn(MappingWarning {
            path: path.to_string(),
            message: format!(
                "Field \"{array_from}\" has incompatible type for destination \"{}\"",
                type_name(schema)
            ),
        });
        return None;
    };
    let Some(item_schema) = item_schemas.first() else {
        warn(MappingWarning {
            path: path.to_string(),
            message: "array schema declares no item schema, emitting an empty array".to_string(),
        });
        return Some(Value::Array(Vec::new()));
    };
    let PayloadSchema::Object(item_fields) = item_schema else {
        warn(MappingWarning {
            path: path.to_string(),
            message: "Array item schema must be an object".to_string(),
        });
        return None;
    };

    match source.get(array_from) {
        None => {
            warn(MappingWarning {
                path: path.to_string(),
                message: format!("Field \"{array_from}\" is missing in source payload"),
            });
            None
        }
        Some(Value::Array(items)) => {
            let mut out = Vec::with_capacity(items.len());
            for (i, item) in items.iter().enumerate() {
                let item_path = format!("{path}[{i}]");
                match item {
                    Value::Object(item_obj) => {
                        out.push(Value::Object(apply_object(
                            item_obj,
                            item_fields,
                            Some(map),
                            &item_path,
                            warn,
                        )));
                    }
                    _ => {
                        warn(MappingWarning {
                            path: item_path,
                            message: "Array element is not an object".to_string(),
                        });
                    }
                }
            }
            Some(Value::Array(out))
        }
        Some(_) => {
            warn(MappingWarning {
                path: path.to_string(),
                message: format!(
                    "Field \"{array_from}\" has incompatible type for destination \"array\""
                ),
            });
            None
        }
    }
}

fn type_compatible(value: &Value, schema: &PayloadSchema) -> bool {
    match schema {
        PayloadSchema::Primitive(PrimitiveType::String) => value.is_string(),
        PayloadSchema::Primitive(PrimitiveType::Number) => value.is_number(),
        PayloadSchema::Primitive(PrimitiveType::Boolean) => value.is_boolean(),
        PayloadSchema::Primitive(PrimitiveType::Datetime) => value.is_string(),
        PayloadSchema::Object(_) => value.is_object(),
        PayloadSchema::Array(_) => value.is_array(),
    }
}

fn type_name(schema: &PayloadSchema) -> &'static str {
    match schema {
        PayloadSchema::Primitive(PrimitiveType::String) => "string",
        PayloadSchema::Primitive(PrimitiveType::Number) => "number",
        PayloadSchema::Primitive(PrimitiveType::Boolean) => "boolean",
        PayloadSchema::Primitive(PrimitiveType::Datetime) => "datetime",
        PayloadSchema::Object(_) => "object",
        PayloadSchema::Array(_) => "array",
    }
}

fn join_path(prefix: &str, key: &str) -> String {
    if prefix.is_empty() {
        key.to_string()
    } else {
        format!("{prefix}.{key}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    fn schema_from(value: Value) -> PayloadSchema {
        serde_json::from_value(value).unwrap()
    }

    fn mapping_from(value: Value) -> EmitMapping {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn happy_path_mapping_matches_spec_example() {
        let destination_schema = schema_from(json!({
            "orderId": "string",
            "amount": "number",
            "status": "string",
            "address": {"line1": "string", "city": "string"},
            "lines": [{"sku": "string", "qty": "number"}]
        }));
        let mapping = mapping_from(json!({
            "orderId": "orderId",
            "amount": "totalAmount",
            "status": {"const": "CONFIRMED"},
            "address": {"objectFrom": "shippingAddress", "map": {"line1": "line1", "city": "city"}},
            "lines": {"arrayFrom": "items", "map": {"sku": "sku", "qty": "quantity"}}
        }));
        let source = json!({
            "orderId": "ORD-9",
            "totalAmount": 199.99,
            "shippingAddress": {"line1": "Gran Via 1", "city": "Madrid", "zip": "28013"},
            "items": [{"sku": "SKU-1", "quantity": 1}, {"sku": "SKU-2", "quantity": 3}]
        });
        let source = source.as_object().unwrap();

        let mut warnings = Vec::new();
        let result = apply_emit_mapping(source, &destination_schema, Some(&mapping), &mut |w| {
            warnings.push(w)
        });

        assert!(warnings.is_empty(), "unexpected warnings: {warnings:?}");
        assert_eq!(
            Value::Object(result),
            json!({
                "orderId": "ORD-9",
                "amount": 199.99,
                "status": "CONFIRMED",
                "address": {"line1": "Gran Via 1", "city": "Madrid"},
                "lines": [{"sku": "SKU-1", "qty": 1}, {"sku": "SKU-2", "qty": 3}]
            })
        );
    }

    #[test]
    fn failed_mappings_yield_empty_object_and_matching_warnings() {
        let destination_schema = schema_from(json!({
            "orderId": "string",
            "amount": "number",
            "status": "string"
        }));
        let mapping = mapping_from(json!({
            "orderId": {"from": "missingOrderId"},
            "amount": "amount",
            "status": {"const": true}
        }));
        let source = json!({"amount": "not-a-number"});
        let source = source.as_object().unwrap();

        let mut warnings = Vec::new();
        let result = apply_emit_mapping(source, &destination_schema, Some(&mapping), &mut |w| {
            warnings.push(w)
        });

        assert_eq!(Value::Object(result), json!({}));
        let messages: Vec<&str> = warnings.iter().map(|w| w.message.as_str()).collect();
        assert!(messages.contains(&"Field \"missingOrderId\" is missing in source payload"));
        assert!(messages.contains(&"Field \"amount\" has incompatible type for destination \"number\""));
        assert!(messages.contains(&"Constant value is incompatible with type \"string\""));
    }

    #[test]
    fn absent_mapping_entry_omits_key_without_warning() {
        let destination_schema = schema_from(json!({"orderId": "string", "status": "string"}));
        let mapping = mapping_from(json!({"orderId": "orderId"}));
        let source = json!({"orderId": "ORD-1"});
        let source = source.as_object().unwrap();

        let mut warnings = Vec::new();
        let result = apply_emit_mapping(source, &destination_schema, Some(&mapping), &mut |w| {
            warnings.push(w)
        });

        assert_eq!(Value::Object(result), json!({"orderId": "ORD-1"}));
        assert!(warnings.is_empty());
    }

    #[test]
    fn no_mapping_at_all_yields_empty_object() {
        let destination_schema = schema_from(json!({"orderId": "string"}));
        let source = json!({"orderId": "ORD-1"});
        let source = source.as_object().unwrap();

        let mut warnings = Vec::new();
        let result = apply_emit_mapping(source, &destination_schema, None, &mut |w| warnings.push(w));

        assert_eq!(Value::Object(result), json!({}));
        assert!(warnings.is_empty());
    }

    #[test]
    fn array_elements_failing_validation_are_skipped_independently() {
        let destination_schema = schema_from(json!({
            "lines": [{"sku": "string", "qty": "number"}]
        }));
        let mapping = mapping_from(json!({
            "lines": {"arrayFrom": "items", "map": {"sku": "sku", "qty": "quantity"}}
        }));
        let source = json!({
            "items": [{"sku": "SKU-1", "quantity": 1}, {"sku": "SKU-2"}]
        });
        let source = source.as_object().unwrap();

        let mut warnings = Vec::new();
        let result = apply_emit_mapping(source, &destination_schema, Some(&mapping), &mut |w| {
            warnings.push(w)
        });

        assert_eq!(
            result.get("lines"),
            Some(&json!([{"sku": "SKU-1", "qty": 1}, {"sku": "SKU-2"}]))
        );
        assert!(warnings
            .iter()
            .any(|w| w.message.contains("\"quantity\" is missing")));
    }

    #[test]
    fn array_schema_with_no_item_schema_warns_and_emits_empty_array() {
        let destination_schema = schema_from(json!({"lines": []}));
        let mapping = mapping_from(json!({
            "lines": {"arrayFrom": "items", "map": {"sku": "sku"}}
        }));
        let source = json!({"items": [{"sku": "SKU-1"}]});
        let source = source.as_object().unwrap();

        let mut warnings = Vec::new();
        let result = apply_emit_mapping(source, &destination_schema, Some(&mapping), &mut |w| {
            warnings.push(w)
        });

        assert_eq!(result.get("lines"), Some(&json!([])));
        assert!(warnings.iter().any(|w| w.message.contains("no item schema")));
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 256,
            ..ProptestConfig::default()
        })]

        /// Property: for any set of string-valued fields whose destination
        /// schema and mapping both reference exactly those field names by
        /// identity, the mapped output is precisely the source payload
        /// restricted to that field set — no value is altered, dropped, or
        /// fabricated, and no warning is raised.
        #[test]
        fn identity_string_mapping_reproduces_source_fields_exactly(
            fields in prop::collection::vec("[a-z][a-z0-9]{0,8}", 1..8)
                .prop_map(|mut v| { v.sort(); v.dedup(); v }),
            values in prop::collection::vec(".{0,12}", 8)
        ) {
            let mut dest_fields = IndexMap::new();
            let mut mapping_fields = IndexMap::new();
            let mut source = Map::new();
            for (name, value) in fields.iter().zip(values.iter()) {
                dest_fields.insert(name.clone(), PayloadSchema::Primitive(PrimitiveType::String));
                mapping_fields.insert(name.clone(), EmitMapping::Field(name.clone()));
                source.insert(name.clone(), Value::String(value.clone()));
            }
            let destination_schema = PayloadSchema::Object(dest_fields);
            let mapping = EmitMapping::Map(mapping_fields);

            let mut warnings = Vec::new();
            let result = apply_emit_mapping(&source, &destination_schema, Some(&mapping), &mut |w| {
                warnings.push(w)
            });

            prop_assert!(warnings.is_empty());
            prop_assert_eq!(Value::Object(result), Value::Object(source));
        }
    }
}
