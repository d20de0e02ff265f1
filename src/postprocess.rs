use serde_json::Value;

/// Keys holding a single sub-schema.
const SCHEMA_CHILDREN: &[&str] = &[
    "items",
    "additionalItems",
    "contains",
    "not",
    "if",
    "then",
    "else",
    "propertyNames",
    "additionalProperties",
];

/// Keys holding a list of sub-schemas. `items` appears in both lists to
/// cover its scalar and tuple forms.
const SCHEMA_LIST_CHILDREN: &[&str] = &["items", "allOf", "anyOf", "oneOf"];

/// Keys holding a map of sub-schemas.
const SCHEMA_MAP_CHILDREN: &[&str] = &[
    "properties",
    "patternProperties",
    "definitions",
    "$defs",
];

/// Recursively stamps `additionalProperties` onto every object sub-schema,
/// identified by `"type": "object"` or a `properties` key. `$ref` subtrees
/// are opaque and left alone, as is an `additionalProperties` that already
/// holds a schema of its own (the stamp only fills boolean or missing
/// slots). Applying the same stamp twice is a no-op.
pub(crate) fn stamp_additional_properties(schema: &mut Value, allowed: bool) {
    let Value::Object(map) = schema else {
        return;
    };
    if map.contains_key("$ref") {
        return;
    }

    let is_object_schema = map.get("type").and_then(Value::as_str) == Some("object")
        || map.contains_key("properties");
    if is_object_schema
        && !map
            .get("additionalProperties")
            .is_some_and(Value::is_object)
    {
        map.insert("additionalProperties".to_owned(), Value::Bool(allowed));
    }

    for key in SCHEMA_MAP_CHILDREN {
        if let Some(Value::Object(children)) = map.get_mut(*key) {
            for child in children.values_mut() {
                stamp_additional_properties(child, allowed);
            }
        }
    }

    for key in SCHEMA_LIST_CHILDREN {
        if let Some(Value::Array(children)) = map.get_mut(*key) {
            for child in children {
                stamp_additional_properties(child, allowed);
            }
        }
    }

    for key in SCHEMA_CHILDREN {
        if let Some(child) = map.get_mut(*key) {
            if child.is_object() {
                stamp_additional_properties(child, allowed);
            }
        }
    }

    // Schema-form dependencies only; the co-requirement list form has no
    // sub-schema to stamp.
    if let Some(Value::Object(dependencies)) = map.get_mut("dependencies") {
        for child in dependencies.values_mut() {
            if child.is_object() {
                stamp_additional_properties(child, allowed);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn stamps_nested_object_schemas() {
        let mut schema = json!({
            "type": "object",
            "properties": {
                "child": {
                    "type": "object",
                    "properties": { "x": { "type": "integer" } }
                },
                "list": {
                    "type": "array",
                    "items": { "properties": { "y": {} } }
                }
            },
            "oneOf": [
                { "type": "object" },
                { "type": "string" }
            ],
            "definitions": {
                "aux": { "type": "object" }
            }
        });

        stamp_additional_properties(&mut schema, false);

        assert_eq!(json!(false), schema["additionalProperties"]);
        assert_eq!(json!(false), schema["properties"]["child"]["additionalProperties"]);
        assert_eq!(
            json!(false),
            schema["properties"]["list"]["items"]["additionalProperties"]
        );
        assert_eq!(json!(false), schema["oneOf"][0]["additionalProperties"]);
        assert!(schema["oneOf"][1].get("additionalProperties").is_none());
        assert_eq!(json!(false), schema["definitions"]["aux"]["additionalProperties"]);
    }

    #[test]
    fn refs_are_opaque() {
        let mut schema = json!({
            "type": "object",
            "properties": {
                "linked": { "$ref": "#/definitions/other" }
            }
        });

        stamp_additional_properties(&mut schema, false);

        assert_eq!(
            json!({ "$ref": "#/definitions/other" }),
            schema["properties"]["linked"]
        );
    }

    #[test]
    fn schema_valued_additional_properties_survive() {
        let mut schema = json!({
            "type": "object",
            "additionalProperties": { "type": "object", "properties": { "z": {} } }
        });

        stamp_additional_properties(&mut schema, false);

        // The value slot keeps its schema; the stamp recursed into it.
        assert_eq!(json!("object"), schema["additionalProperties"]["type"]);
        assert_eq!(
            json!(false),
            schema["additionalProperties"]["additionalProperties"]
        );
    }

    #[test]
    fn idempotent() {
        let mut once = json!({
            "type": "object",
            "properties": {
                "child": { "type": "object" }
            },
            "if": { "properties": { "a": {} } },
            "then": { "type": "object" },
            "dependencies": {
                "a": { "properties": { "b": {} } },
                "c": ["d"]
            }
        });
        stamp_additional_properties(&mut once, false);

        let mut twice = once.clone();
        stamp_additional_properties(&mut twice, false);

        assert_eq!(once, twice);
    }
}
