use std::any::TypeId;
use std::str::FromStr;

use serde::Serialize;
use serde_json::{json, Map, Value};
use thiserror::Error;

use crate::json;
use crate::reflect::Reflect;
use crate::validate::{validate_with, ValidateOptions, ValidationError};

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum SchemaError {
    #[error("unsupported schema document: expected an object or a boolean, got {0}")]
    UnsupportedDocument(&'static str),

    #[error("schema text is not valid JSON: {0}")]
    Parse(String),

    #[error("schema was generated from {expected} and cannot validate an instance of {actual}")]
    SourceTypeMismatch {
        expected: &'static str,
        actual: &'static str,
    },

    #[error("instance cannot be serialized: {0}")]
    Serialize(String),
}

/// A parsed schema document: the root schema object plus, for generated
/// schemas, a tag naming the type the schema was derived from.
///
/// A `Schema` is immutable once constructed; validating against it never
/// mutates it, so one document can back any number of validation calls.
#[derive(Clone, Debug)]
pub struct Schema {
    root: Value,
    source: Option<SourceType>,
}

#[derive(Clone, Copy, Debug)]
struct SourceType {
    id: TypeId,
    name: &'static str,
}

impl Schema {
    /// Wraps a parsed JSON value as a schema document. Accepts an object, or
    /// a boolean (`true` is the accept-all schema `{}`, `false` rejects
    /// everything). Any other value is a caller error.
    pub fn from_value(value: Value) -> Result<Self, SchemaError> {
        match value {
            Value::Object(_) => Ok(Schema {
                root: value,
                source: None,
            }),
            Value::Bool(accept) => Ok(Self::from_bool(accept)),
            other => Err(SchemaError::UnsupportedDocument(json::type_name(&other))),
        }
    }

    pub fn from_bool(accept: bool) -> Self {
        let root = if accept {
            Value::Object(Map::new())
        } else {
            json!({ "not": {} })
        };
        Schema { root, source: None }
    }

    pub(crate) fn generated<T: 'static>(root: Value) -> Self {
        Schema {
            root,
            source: Some(SourceType {
                id: TypeId::of::<T>(),
                name: std::any::type_name::<T>(),
            }),
        }
    }

    /// The root schema object.
    pub fn as_value(&self) -> &Value {
        &self.root
    }

    pub fn into_value(self) -> Value {
        self.root
    }

    /// The fully qualified name of the source type, for generated schemas.
    pub fn source_type(&self) -> Option<&'static str> {
        self.source.map(|source| source.name)
    }

    /// Validates an in-memory instance of the schema's source type.
    ///
    /// The instance is serialized once through serde and checked like any
    /// other JSON value, except that a field holding `null` counts as absent
    /// for `required`, matching how an unset optional field reads on the
    /// typed side.
    ///
    /// Fails if the schema carries a source type tag for some other type.
    pub fn validate_instance<T>(&self, instance: &T) -> Result<Vec<ValidationError>, SchemaError>
    where
        T: Reflect + Serialize + 'static,
    {
        if let Some(source) = &self.source {
            if source.id != TypeId::of::<T>() {
                return Err(SchemaError::SourceTypeMismatch {
                    expected: source.name,
                    actual: std::any::type_name::<T>(),
                });
            }
        }

        let value =
            serde_json::to_value(instance).map_err(|err| SchemaError::Serialize(err.to_string()))?;
        Ok(validate_with(
            self,
            &value,
            ValidateOptions::new().treat_null_as_absent(),
        ))
    }
}

impl FromStr for Schema {
    type Err = SchemaError;

    fn from_str(s: &str) -> Result<Self, SchemaError> {
        let value: Value =
            serde_json::from_str(s).map_err(|err| SchemaError::Parse(err.to_string()))?;
        Self::from_value(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn boolean_schemas() {
        let accept = Schema::from_value(json!(true)).unwrap();
        assert_eq!(&json!({}), accept.as_value());

        let reject = Schema::from_value(json!(false)).unwrap();
        assert_eq!(&json!({ "not": {} }), reject.as_value());

        assert!(crate::is_valid(&accept, &json!({ "anything": [1, 2] })));
        assert!(!crate::is_valid(&reject, &json!(null)));
    }

    #[test]
    fn rejects_non_object_documents() {
        assert_eq!(
            Err(SchemaError::UnsupportedDocument("array")),
            Schema::from_value(json!([1, 2])).map(|_| ())
        );
        assert_eq!(
            Err(SchemaError::UnsupportedDocument("string")),
            Schema::from_value(json!("{}")).map(|_| ())
        );
    }

    #[test]
    fn parses_from_text() {
        let schema: Schema = r#"{ "type": "integer" }"#.parse().unwrap();
        assert!(crate::is_valid(&schema, &json!(4)));
        assert!(!crate::is_valid(&schema, &json!("4")));

        assert!(matches!(
            "{ not json".parse::<Schema>(),
            Err(SchemaError::Parse(_))
        ));
    }
}
