//! A [JSON Schema](https://json-schema.org) draft-07 validator with
//! type-driven schema generation.
//!
//! `jsv` validates JSON values against schema documents, and can derive
//! those documents from Rust types that describe themselves through the
//! [`Reflect`] trait.
//!
//! # Quick start
//!
//! Parse a schema, then check values against it:
//!
//! ```
//! use jsv::Schema;
//! use serde_json::json;
//!
//! let schema = Schema::from_value(json!({
//!     "type": "object",
//!     "properties": {
//!         "foo": { "type": "integer" }
//!     },
//!     "required": ["foo"]
//! }))
//! .expect("construct schema");
//!
//! assert!(jsv::is_valid(&schema, &json!({ "foo": 1 })));
//! assert!(!jsv::is_valid(&schema, &json!({ "foo": "1" })));
//! assert!(!jsv::is_valid(&schema, &json!({})));
//! ```
//!
//! In the real world you usually want to know what the failures were, not
//! just that there were some. [`validate`] returns every failure, each
//! carrying the dotted path to the offending value:
//!
//! ```
//! use jsv::{validate, Schema};
//! use serde_json::json;
//!
//! let schema = Schema::from_value(json!({
//!     "type": "array",
//!     "items": { "type": "string", "minLength": 1 }
//! }))
//! .expect("construct schema");
//!
//! let errors = validate(&schema, &json!(["ok", ""]));
//! assert_eq!(1, errors.len());
//! assert_eq!("[1]", errors[0].path);
//! ```
//!
//! # Generating schemas from types
//!
//! A type that implements [`Reflect`] can have its schema generated, with
//! per-field annotations feeding the schema keywords. The produced document
//! is tagged with its source type, and [`Schema::validate_instance`] checks
//! in-memory values of that type directly:
//!
//! ```
//! use jsv::{generate, Field, GenerateOptions, Reflect, Shape};
//! use serde::Serialize;
//!
//! #[derive(Serialize)]
//! struct User {
//!     id: u64,
//!     name: String,
//! }
//!
//! impl Reflect for User {
//!     fn shape() -> Shape {
//!         Shape::record::<User>("User", module_path!(), || {
//!             vec![
//!                 Field::new("id", u64::shape()).with("minimum", 1),
//!                 Field::new("name", String::shape()).with("minLength", 1),
//!             ]
//!         })
//!     }
//! }
//!
//! let schema = generate::<User>(GenerateOptions::new());
//! assert_eq!(schema.as_value()["title"], "User");
//!
//! let ok = User { id: 7, name: "Ada".to_owned() };
//! assert!(schema.validate_instance(&ok).unwrap().is_empty());
//!
//! let bad = User { id: 0, name: "".to_owned() };
//! assert_eq!(2, schema.validate_instance(&bad).unwrap().len());
//! ```
//!
//! # Scope
//!
//! The full draft-07 keyword vocabulary is supported: type checks, the
//! string/numeric/array/object constraint keywords, `enum`/`const`,
//! composition (`allOf`, `anyOf`, `oneOf`, `not`), conditionals
//! (`if`/`then`/`else`), and intra-document `$ref` (JSON Pointers of the
//! `#/a/b/c` form). The boolean draft-04 form of `exclusiveMinimum` and
//! `exclusiveMaximum` is accepted alongside the numeric draft-06+ form.
//! External references are not fetched; a schema containing one reports a
//! validation error at that position.
//!
//! # Security considerations
//!
//! Validating untrusted *instances* is fine. Validating against untrusted
//! *schemas* is riskier: a schema can contain `$ref` cycles that never
//! consume instance depth and so never terminate. Cap them with
//! [`ValidateOptions::with_max_ref_depth`].

mod annotate;
mod format;
mod generate;
mod json;
mod postprocess;
mod reflect;
mod resolver;
mod schema;
mod validate;

pub use format::check_format;
pub use generate::{generate, GenerateOptions, RefMode, DRAFT_07};
pub use reflect::{Annotation, Annotations, Field, RecordShape, Reflect, Shape};
pub use resolver::{resolve, ResolveError};
pub use schema::{Schema, SchemaError};
pub use validate::{
    is_valid, is_valid_verbose, validate, validate_with, ValidateOptions, ValidationError,
};
