use std::any::TypeId;
use std::collections::{HashMap, HashSet};

use serde_json::{json, Map, Value};

use crate::annotate;
use crate::postprocess;
use crate::reflect::{Annotation, RecordShape, Reflect, Shape};
use crate::schema::Schema;

/// The `$schema` value stamped on generated documents by default.
pub const DRAFT_07: &str = "https://json-schema.org/draft-07/schema#";

/// Where nested record schemas go.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RefMode {
    /// Expand every nested record in place.
    Inline,
    /// Emit `$ref`s into a `definitions` block (the draft-07 key).
    Definitions,
    /// Emit `$ref`s into a `$defs` block (the draft-2019 key).
    Defs,
}

impl RefMode {
    fn key(self) -> &'static str {
        match self {
            RefMode::Inline | RefMode::Definitions => "definitions",
            RefMode::Defs => "$defs",
        }
    }
}

/// Options for [`generate`].
#[derive(Clone, Debug)]
pub struct GenerateOptions {
    title: Option<String>,
    description: Option<String>,
    id: Option<String>,
    draft: String,
    refs: RefMode,
    all_fields_required: bool,
    additional_properties: Option<bool>,
}

impl Default for GenerateOptions {
    fn default() -> Self {
        GenerateOptions {
            title: None,
            description: None,
            id: None,
            draft: DRAFT_07.to_owned(),
            refs: RefMode::Inline,
            all_fields_required: false,
            additional_properties: None,
        }
    }
}

impl GenerateOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Overrides the default title (the unqualified type name).
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Sets `$id` on the generated document.
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Sets `$schema` on the generated document.
    pub fn with_draft(mut self, draft: impl Into<String>) -> Self {
        self.draft = draft.into();
        self
    }

    pub fn with_refs(mut self, refs: RefMode) -> Self {
        self.refs = refs;
        self
    }

    /// Marks every field required, regardless of nullability or annotation.
    pub fn with_all_fields_required(mut self, required: bool) -> Self {
        self.all_fields_required = required;
        self
    }

    /// Stamps `additionalProperties` onto every object sub-schema of the
    /// generated document.
    pub fn with_additional_properties(mut self, allowed: bool) -> Self {
        self.additional_properties = Some(allowed);
        self
    }
}

/// Generates a schema document for `T`, tagged with `T` as its source type.
pub fn generate<T: Reflect + 'static>(options: GenerateOptions) -> Schema {
    let shape = T::shape();
    let mut ctx = GenContext::new(&options);

    let body = match &shape {
        Shape::Record(record) => ctx.root_record(record),
        other => ctx.generate_shape(other),
    };

    let mut root = Map::new();
    root.insert("$schema".to_owned(), Value::String(options.draft.clone()));
    if let Some(id) = &options.id {
        root.insert("$id".to_owned(), Value::String(id.clone()));
    }
    let title = options
        .title
        .clone()
        .unwrap_or_else(|| default_title::<T>(&shape));
    root.insert("title".to_owned(), Value::String(title));
    if let Some(description) = &options.description {
        root.insert("description".to_owned(), Value::String(description.clone()));
    }

    if let Value::Object(body) = body {
        for (key, value) in body {
            root.insert(key, value);
        }
    }

    if !ctx.definitions.is_empty() {
        root.insert(
            options.refs.key().to_owned(),
            Value::Object(ctx.definitions),
        );
    }

    let mut value = Value::Object(root);
    if let Some(allowed) = options.additional_properties {
        postprocess::stamp_additional_properties(&mut value, allowed);
    }

    Schema::generated::<T>(value)
}

fn default_title<T>(shape: &Shape) -> String {
    if let Shape::Record(record) = shape {
        return record.name.to_owned();
    }
    unqualified(std::any::type_name::<T>()).to_owned()
}

fn unqualified(name: &str) -> &str {
    let head = &name[..name.find('<').unwrap_or(name.len())];
    match head.rfind("::") {
        Some(i) => &name[i + 2..],
        None => name,
    }
}

/// Mutable state for one `generate` call.
pub(crate) struct GenContext {
    refs: RefMode,
    all_fields_required: bool,
    type_names: HashMap<TypeId, String>,
    definitions: Map<String, Value>,
    generation_stack: Vec<TypeId>,
    referenced: HashSet<TypeId>,
}

impl GenContext {
    fn new(options: &GenerateOptions) -> Self {
        GenContext {
            refs: options.refs,
            all_fields_required: options.all_fields_required,
            type_names: HashMap::new(),
            definitions: Map::new(),
            generation_stack: Vec::new(),
            referenced: HashSet::new(),
        }
    }

    pub(crate) fn generate_shape(&mut self, shape: &Shape) -> Value {
        match shape {
            Shape::Any => json!({}),
            Shape::Null => json!({ "type": "null" }),
            Shape::Bool => json!({ "type": "boolean" }),
            Shape::Int => json!({ "type": "integer" }),
            Shape::Float => json!({ "type": "number" }),
            Shape::Str => json!({ "type": "string" }),
            Shape::Array(element) => json!({
                "type": "array",
                "items": self.generate_shape(element)
            }),
            Shape::Set(element) => json!({
                "type": "array",
                "uniqueItems": true,
                "items": self.generate_shape(element)
            }),
            Shape::Tuple(elements) => {
                let items: Vec<Value> =
                    elements.iter().map(|e| self.generate_shape(e)).collect();
                json!({
                    "type": "array",
                    "items": items,
                    "minItems": elements.len(),
                    "maxItems": elements.len()
                })
            }
            Shape::Map(values) => match **values {
                Shape::Any => json!({ "type": "object" }),
                _ => json!({
                    "type": "object",
                    "additionalProperties": self.generate_shape(values)
                }),
            },
            Shape::Optional(inner) => self.generate_nullable(inner),
            Shape::Union(variants) => self.generate_union(variants),
            Shape::Record(record) => match self.refs {
                RefMode::Inline => self.record_inline(record),
                _ => self.record_ref(record),
            },
        }
    }

    /// Widens a shape's schema to also accept `null`. A `$ref` cannot carry
    /// siblings, so it is wrapped in `oneOf` instead.
    fn generate_nullable(&mut self, inner: &Shape) -> Value {
        match inner {
            Shape::Optional(inner) => self.generate_nullable(inner),
            Shape::Null => json!({ "type": "null" }),
            _ => widen_null(self.generate_shape(inner)),
        }
    }

    fn generate_union(&mut self, variants: &[Shape]) -> Value {
        let non_null: Vec<&Shape> = variants
            .iter()
            .filter(|v| !matches!(v, Shape::Null))
            .collect();
        let has_null = non_null.len() != variants.len();

        match non_null.len() {
            0 => json!({ "type": "null" }),
            1 if has_null => self.generate_nullable(non_null[0]),
            1 => self.generate_shape(non_null[0]),
            _ => {
                let mut subs: Vec<Value> =
                    non_null.iter().map(|v| self.generate_shape(v)).collect();
                if has_null {
                    subs.push(json!({ "type": "null" }));
                }
                json!({ "oneOf": subs })
            }
        }
    }

    /// The document's top-level record. Emitted in place rather than behind
    /// a `$ref`; if generation finds a cycle back to it, its schema is also
    /// recorded under definitions so those references resolve.
    fn root_record(&mut self, record: &RecordShape) -> Value {
        let name = record.definition_key();
        self.type_names.insert(record.type_id, name.clone());
        self.generation_stack.push(record.type_id);
        let body = self.record_body(record);
        self.generation_stack.pop();

        if self.referenced.contains(&record.type_id) && self.refs != RefMode::Inline {
            self.definitions.insert(name, body.clone());
        }
        body
    }

    fn record_inline(&mut self, record: &RecordShape) -> Value {
        // A cycle cannot be expanded in place; the accept-all schema keeps
        // the rest of the document usable.
        if self.generation_stack.contains(&record.type_id) {
            return json!({});
        }
        self.generation_stack.push(record.type_id);
        let body = self.record_body(record);
        self.generation_stack.pop();
        body
    }

    fn record_ref(&mut self, record: &RecordShape) -> Value {
        // In progress further up the stack: point at the name it was
        // assigned on entry; its frame will fill the definition in.
        if self.generation_stack.contains(&record.type_id) {
            self.referenced.insert(record.type_id);
            if let Some(name) = self.type_names.get(&record.type_id).cloned() {
                return self.ref_to(&name);
            }
        }

        if let Some(name) = self.type_names.get(&record.type_id).cloned() {
            if self.definitions.contains_key(&name) {
                return self.ref_to(&name);
            }
        }

        let name = record.definition_key();
        self.type_names.insert(record.type_id, name.clone());
        self.generation_stack.push(record.type_id);
        let body = self.record_body(record);
        self.generation_stack.pop();
        self.definitions.insert(name.clone(), body);
        self.ref_to(&name)
    }

    fn ref_to(&self, name: &str) -> Value {
        json!({ "$ref": format!("#/{}/{}", self.refs.key(), name) })
    }

    fn record_body(&mut self, record: &RecordShape) -> Value {
        let mut schema = Map::new();
        schema.insert("type".to_owned(), Value::String("object".to_owned()));

        let mut properties = Map::new();
        let mut required = Vec::new();

        for field in (record.fields)() {
            let bag = &field.annotations;
            if bag.bool("ignore") == Some(true) {
                continue;
            }

            let name = bag.str("name").unwrap_or(field.name).to_owned();

            let mut field_schema = self.generate_shape(&field.shape);
            annotate::apply(bag, &mut field_schema, self);

            let is_required = if self.all_fields_required {
                true
            } else {
                match bag.get("required") {
                    Some(Annotation::Bool(required)) => *required,
                    _ => !field.shape.is_nullable(),
                }
            };
            if is_required {
                required.push(Value::String(name.clone()));
            }

            properties.insert(name, field_schema);
        }

        if !properties.is_empty() {
            schema.insert("properties".to_owned(), Value::Object(properties));
        }
        if !required.is_empty() {
            schema.insert("required".to_owned(), Value::Array(required));
        }
        Value::Object(schema)
    }
}

fn widen_null(schema: Value) -> Value {
    let mut map = match schema {
        Value::Object(map) => map,
        other => return other,
    };

    if map.contains_key("$ref") {
        return json!({ "oneOf": [Value::Object(map), { "type": "null" }] });
    }

    if let Some(Value::Array(subs)) = map.get_mut("oneOf") {
        if !subs.contains(&json!({ "type": "null" })) {
            subs.push(json!({ "type": "null" }));
        }
        return Value::Object(map);
    }

    match map.get("type").cloned() {
        Some(Value::String(name)) => {
            if name != "null" {
                map.insert("type".to_owned(), json!([name, "null"]));
            }
            Value::Object(map)
        }
        Some(Value::Array(mut names)) => {
            if !names.contains(&json!("null")) {
                names.push(json!("null"));
            }
            map.insert("type".to_owned(), Value::Array(names));
            Value::Object(map)
        }
        // No type constraint means null is already accepted.
        _ => Value::Object(map),
    }
}
