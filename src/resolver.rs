use serde_json::Value;
use thiserror::Error;

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ResolveError {
    #[error("unresolvable reference '{0}'")]
    NotFound(String),

    #[error("external reference '{0}' is not supported")]
    External(String),
}

/// Resolves a `#/a/b/c` JSON Pointer against the document root.
///
/// `#` alone resolves to the root itself. Segments are matched raw; the
/// `~0`/`~1` escapes are not decoded, so pointers are expected pre-decoded.
/// Anything that does not start with `#` is an external reference and is
/// rejected.
pub fn resolve<'a>(pointer: &str, root: &'a Value) -> Result<&'a Value, ResolveError> {
    if pointer == "#" {
        return Ok(root);
    }

    let path = pointer
        .strip_prefix("#/")
        .ok_or_else(|| ResolveError::External(pointer.to_owned()))?;

    let mut node = root;
    for segment in path.split('/') {
        node = match node {
            Value::Object(map) => map.get(segment),
            Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
            _ => None,
        }
        .ok_or_else(|| ResolveError::NotFound(pointer.to_owned()))?;
    }

    Ok(node)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn resolves_nested_segments() {
        let root = json!({
            "definitions": {
                "node": { "type": "object" }
            },
            "items": [{ "type": "string" }, { "type": "integer" }]
        });

        assert_eq!(
            &json!({ "type": "object" }),
            resolve("#/definitions/node", &root).unwrap()
        );
        assert_eq!(
            &json!({ "type": "integer" }),
            resolve("#/items/1", &root).unwrap()
        );
        assert_eq!(&root, resolve("#", &root).unwrap());
    }

    #[test]
    fn missing_segment() {
        let root = json!({ "definitions": {} });

        assert_eq!(
            Err(ResolveError::NotFound("#/definitions/gone".to_owned())),
            resolve("#/definitions/gone", &root)
        );
        assert_eq!(
            Err(ResolveError::NotFound("#/definitions/a/b".to_owned())),
            resolve("#/definitions/a/b", &root)
        );
    }

    #[test]
    fn external_pointer() {
        let root = json!({});

        assert_eq!(
            Err(ResolveError::External(
                "http://example.com/schema#/a".to_owned()
            )),
            resolve("http://example.com/schema#/a", &root)
        );
    }
}
