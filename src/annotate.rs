use serde_json::{json, Value};

use crate::generate::GenContext;
use crate::reflect::{Annotation, Annotations};

/// Keys whose values are converted to JSON and copied onto the field schema
/// as-is.
const COPIED: &[&str] = &[
    "minLength",
    "maxLength",
    "pattern",
    "format",
    "minimum",
    "maximum",
    "exclusiveMinimum",
    "exclusiveMaximum",
    "multipleOf",
    "minItems",
    "maxItems",
    "uniqueItems",
    "minProperties",
    "maxProperties",
    "title",
    "description",
    "default",
    "examples",
];

/// Copies a field's annotation bag onto its generated schema.
///
/// The control keys (`required`, `ignore`, `name`) belong to the generator
/// and are skipped here; unrecognized keys are ignored. If the field schema
/// is a `$ref`, it is first wrapped in `allOf` so the reference keeps no
/// siblings.
pub(crate) fn apply(bag: &Annotations, schema: &mut Value, ctx: &mut GenContext) {
    if bag.is_empty() {
        return;
    }

    if schema.get("$ref").is_some() && bag.iter().any(|(key, _)| is_known(key)) {
        *schema = json!({ "allOf": [schema.take()] });
    }
    let Value::Object(map) = schema else {
        return;
    };

    for (key, annotation) in bag.iter() {
        match key {
            "required" | "ignore" | "name" => {}
            "const" | "_const" => {
                map.insert("const".to_owned(), annotation_value(annotation, ctx));
            }
            "enum" => {
                if let Annotation::List(choices) = annotation {
                    let choices: Vec<Value> =
                        choices.iter().map(|a| annotation_value(a, ctx)).collect();
                    map.insert("enum".to_owned(), Value::Array(choices));
                }
            }
            "items" | "contains" | "not" => {
                map.insert(key.to_owned(), subschema(annotation, ctx));
            }
            "allOf" | "anyOf" | "oneOf" => {
                if let Annotation::List(subs) = annotation {
                    let subs: Vec<Value> = subs.iter().map(|a| subschema(a, ctx)).collect();
                    map.insert(key.to_owned(), Value::Array(subs));
                }
            }
            key if COPIED.contains(&key) => {
                map.insert(key.to_owned(), annotation_value(annotation, ctx));
            }
            _ => {}
        }
    }
}

fn is_known(key: &str) -> bool {
    matches!(
        key,
        "const" | "_const" | "enum" | "items" | "contains" | "not" | "allOf" | "anyOf" | "oneOf"
    ) || COPIED.contains(&key)
}

/// An annotation as a plain JSON value; type references become their
/// generated schema.
fn annotation_value(annotation: &Annotation, ctx: &mut GenContext) -> Value {
    match annotation {
        Annotation::Str(s) => Value::String(s.clone()),
        Annotation::Int(i) => json!(*i),
        Annotation::Float(f) => json!(*f),
        Annotation::Bool(b) => Value::Bool(*b),
        Annotation::List(items) => {
            Value::Array(items.iter().map(|a| annotation_value(a, ctx)).collect())
        }
        Annotation::Schema(schema) => schema.clone(),
        Annotation::Type(shape) => ctx.generate_shape(shape),
    }
}

/// An annotation as a schema position: lists become tuple-form arrays, type
/// references are expanded, raw schemas are spliced verbatim.
fn subschema(annotation: &Annotation, ctx: &mut GenContext) -> Value {
    match annotation {
        Annotation::List(items) => {
            Value::Array(items.iter().map(|a| subschema(a, ctx)).collect())
        }
        Annotation::Type(shape) => ctx.generate_shape(shape),
        Annotation::Schema(schema) => schema.clone(),
        other => annotation_value(other, ctx),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generate::{generate, GenerateOptions, RefMode};
    use crate::reflect::{Field, Reflect, Shape};
    use crate::validate::validate;

    struct Tagged {
        #[allow(dead_code)]
        label: String,
    }

    impl Reflect for Tagged {
        fn shape() -> Shape {
            Shape::record::<Tagged>("Tagged", module_path!(), || {
                vec![
                    Field::new("label", String::shape())
                        .with("pattern", "^[a-z]+$")
                        .with("description", "lowercase tag"),
                    Field::new("level", u8::shape())
                        .with("enum", vec![Annotation::Int(1), Annotation::Int(2)]),
                    Field::new("kind", String::shape()).with("_const", "tag"),
                    Field::new("ids", Vec::<i64>::shape())
                        .with("items", json!({ "type": "integer", "minimum": 0 }))
                        .with("maxItems", 10),
                    Field::new("extra", Value::shape()).with(
                        "anyOf",
                        vec![
                            Annotation::Schema(json!({ "type": "string" })),
                            Annotation::Type(Shape::Int),
                        ],
                    ),
                ]
            })
        }
    }

    #[test]
    fn annotations_land_on_field_schemas() {
        let schema = generate::<Tagged>(GenerateOptions::new());
        let properties = &schema.as_value()["properties"];

        assert_eq!(
            &json!({
                "type": "string",
                "pattern": "^[a-z]+$",
                "description": "lowercase tag"
            }),
            &properties["label"]
        );
        assert_eq!(
            &json!({ "type": "integer", "enum": [1, 2] }),
            &properties["level"]
        );
        assert_eq!(
            &json!({ "type": "string", "const": "tag" }),
            &properties["kind"]
        );
        assert_eq!(
            &json!({
                "type": "array",
                "items": { "type": "integer", "minimum": 0 },
                "maxItems": 10
            }),
            &properties["ids"]
        );
        assert_eq!(
            &json!({ "anyOf": [{ "type": "string" }, { "type": "integer" }] }),
            &properties["extra"]
        );
    }

    #[test]
    fn annotated_schema_validates() {
        let schema = generate::<Tagged>(GenerateOptions::new());

        let errors = validate(
            &schema,
            &json!({
                "label": "abc",
                "level": 2,
                "kind": "tag",
                "ids": [0, 5],
                "extra": "free-form"
            }),
        );
        assert!(errors.is_empty(), "{:?}", errors);

        let errors = validate(
            &schema,
            &json!({
                "label": "ABC",
                "level": 3,
                "kind": "other",
                "ids": [-1],
                "extra": true
            }),
        );
        let mut paths: Vec<&str> = errors.iter().map(|e| e.path.as_str()).collect();
        paths.sort_unstable();
        assert_eq!(vec!["extra", "ids[0]", "kind", "label", "level"], paths);
    }

    #[test]
    fn record_types_expand_inside_annotations() {
        struct Inner {
            #[allow(dead_code)]
            n: i32,
        }
        impl Reflect for Inner {
            fn shape() -> Shape {
                Shape::record::<Inner>("Inner", module_path!(), || {
                    vec![Field::new("n", i32::shape())]
                })
            }
        }

        struct Outer;
        impl Reflect for Outer {
            fn shape() -> Shape {
                Shape::record::<Outer>("Outer", module_path!(), || {
                    vec![Field::new("item", Value::shape())
                        .with("contains", Inner::shape())]
                })
            }
        }

        let inline = generate::<Outer>(GenerateOptions::new());
        assert_eq!(
            &json!({
                "contains": {
                    "type": "object",
                    "properties": { "n": { "type": "integer" } },
                    "required": ["n"]
                }
            }),
            &inline.as_value()["properties"]["item"]
        );

        // Under refs mode the expansion goes through the definitions table.
        let referenced = generate::<Outer>(GenerateOptions::new().with_refs(RefMode::Definitions));
        let root = referenced.as_value();
        let contains = &root["properties"]["item"]["contains"];
        let pointer = contains["$ref"].as_str().unwrap();
        assert!(crate::resolve(pointer, root).is_ok());
    }

    #[test]
    fn ref_fields_keep_references_clean() {
        struct Leaf;
        impl Reflect for Leaf {
            fn shape() -> Shape {
                Shape::record::<Leaf>("Leaf", module_path!(), Vec::new)
            }
        }

        struct Holder;
        impl Reflect for Holder {
            fn shape() -> Shape {
                Shape::record::<Holder>("Holder", module_path!(), || {
                    vec![Field::new("leaf", Leaf::shape())
                        .with("description", "a nested leaf")]
                })
            }
        }

        let schema = generate::<Holder>(GenerateOptions::new().with_refs(RefMode::Definitions));
        let leaf = &schema.as_value()["properties"]["leaf"];

        let Value::Object(wrapper) = leaf else {
            panic!("expected an object, got {}", leaf);
        };
        assert!(wrapper.get("$ref").is_none());
        assert_eq!(1, wrapper["allOf"].as_array().unwrap().len());
        assert!(wrapper["allOf"][0].get("$ref").is_some());
        assert_eq!("a nested leaf", wrapper["description"]);
    }

    #[test]
    fn unknown_annotations_are_ignored() {
        struct Odd;
        impl Reflect for Odd {
            fn shape() -> Shape {
                Shape::record::<Odd>("Odd", module_path!(), || {
                    vec![Field::new("x", i32::shape()).with("totallyUnknown", "whatever")]
                })
            }
        }

        let schema = generate::<Odd>(GenerateOptions::new());
        assert_eq!(
            &json!({ "type": "integer" }),
            &schema.as_value()["properties"]["x"]
        );
    }
}
