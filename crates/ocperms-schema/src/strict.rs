//! Closes object schemas against undeclared properties.

use serde_json::{Map, Value};

/// Members whose value is a map of name to subschema.
const SCHEMA_MAPS: [&str; 5] = [
    "properties",
    "patternProperties",
    "dependentSchemas",
    "$defs",
    "definitions",
];

/// Members whose value is a single subschema.
const SCHEMA_SINGLES: [&str; 11] = [
    "propertyNames",
    "additionalProperties",
    "unevaluatedProperties",
    "items",
    "contains",
    "additionalItems",
    "unevaluatedItems",
    "not",
    "if",
    "then",
    "else",
];

/// Members whose value is a list of subschemas.
const SCHEMA_LISTS: [&str; 4] = ["prefixItems", "allOf", "anyOf", "oneOf"];

/// Keywords that only make sense on an object schema.
const OBJECT_KEYWORDS: [&str; 8] = [
    "properties",
    "patternProperties",
    "additionalProperties",
    "unevaluatedProperties",
    "required",
    "dependentRequired",
    "dependentSchemas",
    "propertyNames",
];

/// Add `additionalProperties: false` to every object schema that leaves it unset.
pub(crate) fn close_object_schemas(schema: &mut Value) {
    match schema {
        Value::Object(map) => {
            if describes_object(map) && !map.contains_key("additionalProperties") {
                map.insert("additionalProperties".to_string(), Value::Bool(false));
            }

            for key in SCHEMA_MAPS {
                if let Some(Value::Object(children)) = map.get_mut(key) {
                    children.values_mut().for_each(close_object_schemas);
                }
            }
            for key in SCHEMA_SINGLES {
                if let Some(child) = map.get_mut(key) {
                    close_object_schemas(child);
                }
            }
            for key in SCHEMA_LISTS {
                if let Some(Value::Array(children)) = map.get_mut(key) {
                    children.iter_mut().for_each(close_object_schemas);
                }
            }
        }
        Value::Array(items) => items.iter_mut().for_each(close_object_schemas),
        _ => {}
    }
}

fn describes_object(map: &Map<String, Value>) -> bool {
    match map.get("type") {
        Some(Value::String(kind)) => kind == "object",
        Some(Value::Array(kinds)) => kinds.iter().any(|kind| kind.as_str() == Some("object")),
        _ => OBJECT_KEYWORDS.iter().any(|keyword| map.contains_key(*keyword)),
    }
}
