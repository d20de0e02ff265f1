//! Data-driven validation suite, in the shape of the official
//! JSON-Schema-Test-Suite harnesses: named cases of (schema, instance,
//! expectation), with remote documents inlined before validation begins.

use std::collections::BTreeMap;

use serde::Deserialize;
use serde_json::Value;

use jsv::Schema;

#[derive(Deserialize)]
struct TestCase {
    schema: Value,
    instance: Value,
    valid: bool,
    #[serde(default, rename = "errorPaths")]
    error_paths: Vec<String>,
}

/// The remote loader: known URIs yield the document bytes, anything else is
/// `None` and the reference stays external.
fn remote(uri: &str) -> Option<Vec<u8>> {
    match uri {
        "http://localhost:1234/integer.json" => {
            Some(br#"{ "type": "integer" }"#.to_vec())
        }
        _ => None,
    }
}

/// Replaces every fetchable external `$ref` with the referenced document,
/// so validation itself never needs the network.
fn inline_remotes(node: &mut Value, loader: &dyn Fn(&str) -> Option<Vec<u8>>) {
    match node {
        Value::Object(map) => {
            if let Some(Value::String(pointer)) = map.get("$ref") {
                if !pointer.starts_with('#') {
                    if let Some(bytes) = loader(pointer) {
                        let fetched: Value =
                            serde_json::from_slice(&bytes).expect("parse remote document");
                        *node = fetched;
                        inline_remotes(node, loader);
                        return;
                    }
                }
            }
            for value in map.values_mut() {
                inline_remotes(value, loader);
            }
        }
        Value::Array(items) => {
            for item in items {
                inline_remotes(item, loader);
            }
        }
        _ => {}
    }
}

#[test]
fn validation_suite() {
    let test_cases: BTreeMap<String, TestCase> =
        serde_json::from_str(include_str!("data/validation.json")).expect("parse validation.json");

    for (name, mut test_case) in test_cases {
        inline_remotes(&mut test_case.schema, &remote);

        let schema = Schema::from_value(test_case.schema).expect(&name);
        let errors = jsv::validate(&schema, &test_case.instance);

        assert_eq!(
            test_case.valid,
            errors.is_empty(),
            "wrong verdict for {}: {:?}",
            name,
            errors
        );

        if !test_case.error_paths.is_empty() {
            let mut paths: Vec<&str> = errors.iter().map(|e| e.path.as_str()).collect();
            paths.sort_unstable();
            let mut expected: Vec<&str> =
                test_case.error_paths.iter().map(String::as_str).collect();
            expected.sort_unstable();
            assert_eq!(expected, paths, "wrong error paths for {}", name);
        }
    }
}
