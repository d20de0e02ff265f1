use std::fmt;

use regex::Regex;
use serde_json::{Map, Value};

use crate::format::check_format;
use crate::json;
use crate::resolver;
use crate::schema::Schema;

/// Options for a validation call.
#[derive(Clone, Debug, Default)]
pub struct ValidateOptions {
    max_errors: usize,
    max_ref_depth: usize,
    verbose: bool,
    nulls_absent: bool,
}

impl ValidateOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stop after this many errors. Zero, the default, reports them all.
    pub fn with_max_errors(mut self, max_errors: usize) -> Self {
        self.max_errors = max_errors;
        self
    }

    /// Abort `$ref` chains deeper than this with a validation error instead
    /// of following them. Zero, the default, follows refs without limit;
    /// set a limit when validating against untrusted schemas, which may
    /// contain reference cycles that never consume instance depth.
    pub fn with_max_ref_depth(mut self, max_ref_depth: usize) -> Self {
        self.max_ref_depth = max_ref_depth;
        self
    }

    /// Print each error to stderr as it is found.
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub(crate) fn treat_null_as_absent(mut self) -> Self {
        self.nulls_absent = true;
        self
    }
}

/// One validation failure: the dotted path to the offending value and a
/// message describing the violated keyword.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ValidationError {
    pub path: String,
    pub message: String,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.path.is_empty() {
            write!(f, "{}", self.message)
        } else {
            write!(f, "{}: {}", self.path, self.message)
        }
    }
}

/// Validates `instance` against `schema`, returning every failure. An empty
/// report means the instance is valid.
pub fn validate(schema: &Schema, instance: &Value) -> Vec<ValidationError> {
    validate_with(schema, instance, ValidateOptions::new())
}

pub fn validate_with(
    schema: &Schema,
    instance: &Value,
    options: ValidateOptions,
) -> Vec<ValidationError> {
    let mut vm = Vm {
        root: schema.as_value(),
        max_errors: options.max_errors,
        max_ref_depth: options.max_ref_depth,
        nulls_absent: options.nulls_absent,
        ref_depth: 0,
        path: vec![],
        errors: vec![],
    };

    // Err here only means the error cap was reached.
    let _ = vm.validate_node(schema.as_value(), instance);

    if options.verbose {
        for error in &vm.errors {
            eprintln!("{}", error);
        }
    }

    vm.errors
}

/// Whether `instance` satisfies `schema`.
pub fn is_valid(schema: &Schema, instance: &Value) -> bool {
    validate_with(schema, instance, ValidateOptions::new().with_max_errors(1)).is_empty()
}

/// Like [`is_valid`], but prints each error to stderr.
pub fn is_valid_verbose(schema: &Schema, instance: &Value) -> bool {
    validate_with(schema, instance, ValidateOptions::new().with_verbose(true)).is_empty()
}

#[derive(Clone, Debug)]
enum PathSegment {
    Key(String),
    Index(usize),
}

struct MaxErrorsReached;

struct Vm<'a> {
    root: &'a Value,
    max_errors: usize,
    max_ref_depth: usize,
    nulls_absent: bool,
    ref_depth: usize,
    path: Vec<PathSegment>,
    errors: Vec<ValidationError>,
}

impl<'a> Vm<'a> {
    fn validate_node(&mut self, schema: &Value, instance: &Value) -> Result<(), MaxErrorsReached> {
        let schema = match schema {
            Value::Bool(true) => return Ok(()),
            Value::Bool(false) => return self.push_error("schema allows no values".to_owned()),
            Value::Object(map) => map,
            _ => return self.push_error("schema must be an object or a boolean".to_owned()),
        };

        // $ref short-circuits: siblings of a reference are ignored.
        if let Some(Value::String(pointer)) = schema.get("$ref") {
            return self.validate_ref(pointer, instance);
        }

        self.check_type(schema, instance)?;
        self.check_enum_const(schema, instance)?;

        match instance {
            Value::String(s) => self.check_string(schema, s)?,
            Value::Number(_) => self.check_number(schema, instance)?,
            Value::Array(items) => self.check_array(schema, items)?,
            Value::Object(_) => self.check_object(schema, instance)?,
            _ => {}
        }

        self.check_composition(schema, instance)?;
        self.check_conditional(schema, instance)?;

        Ok(())
    }

    fn validate_ref(&mut self, pointer: &str, instance: &Value) -> Result<(), MaxErrorsReached> {
        if self.max_ref_depth != 0 && self.ref_depth >= self.max_ref_depth {
            return self.push_error("maximum reference depth exceeded".to_owned());
        }

        let root = self.root;
        match resolver::resolve(pointer, root) {
            Ok(node) => {
                self.ref_depth += 1;
                let result = self.validate_node(node, instance);
                self.ref_depth -= 1;
                result
            }
            Err(err) => self.push_error(err.to_string()),
        }
    }

    fn check_type(
        &mut self,
        schema: &Map<String, Value>,
        instance: &Value,
    ) -> Result<(), MaxErrorsReached> {
        let Some(expected) = schema.get("type") else {
            return Ok(());
        };

        let matched = match expected {
            Value::String(name) => type_matches(name, instance),
            Value::Array(names) => names
                .iter()
                .any(|name| name.as_str().is_some_and(|name| type_matches(name, instance))),
            _ => true,
        };

        if !matched {
            let expected = match expected {
                Value::String(name) => name.clone(),
                Value::Array(names) => {
                    let names: Vec<&str> = names.iter().filter_map(Value::as_str).collect();
                    format!("one of {}", names.join(", "))
                }
                _ => unreachable!(),
            };
            self.push_error(format!(
                "expected {}, got {}",
                expected,
                json::type_name(instance)
            ))?;
        }

        Ok(())
    }

    fn check_enum_const(
        &mut self,
        schema: &Map<String, Value>,
        instance: &Value,
    ) -> Result<(), MaxErrorsReached> {
        if let Some(Value::Array(choices)) = schema.get("enum") {
            if !choices.iter().any(|choice| json::equal(choice, instance)) {
                self.push_error("value is not one of the enum values".to_owned())?;
            }
        }

        if let Some(expected) = schema.get("const") {
            if !json::equal(expected, instance) {
                self.push_error("value does not equal the const value".to_owned())?;
            }
        }

        Ok(())
    }

    fn check_string(
        &mut self,
        schema: &Map<String, Value>,
        s: &str,
    ) -> Result<(), MaxErrorsReached> {
        let length = s.chars().count();

        if let Some(min) = schema.get("minLength").and_then(Value::as_f64) {
            if (length as f64) < min {
                self.push_error(format!(
                    "string has {} characters, minLength is {}",
                    length, min
                ))?;
            }
        }

        if let Some(max) = schema.get("maxLength").and_then(Value::as_f64) {
            if (length as f64) > max {
                self.push_error(format!(
                    "string has {} characters, maxLength is {}",
                    length, max
                ))?;
            }
        }

        // An unparseable pattern is skipped, never reported.
        if let Some(Value::String(pattern)) = schema.get("pattern") {
            if let Ok(re) = Regex::new(pattern) {
                if !re.is_match(s) {
                    self.push_error(format!("string does not match pattern '{}'", pattern))?;
                }
            }
        }

        if let Some(Value::String(format)) = schema.get("format") {
            if !check_format(format, s) {
                self.push_error(format!("string is not a valid {}", format))?;
            }
        }

        Ok(())
    }

    fn check_number(
        &mut self,
        schema: &Map<String, Value>,
        instance: &Value,
    ) -> Result<(), MaxErrorsReached> {
        let Some(value) = instance.as_f64() else {
            return Ok(());
        };

        // Booleans in the exclusive keywords are the draft-04 form, turning
        // the inclusive bound strict; numbers are the draft-06+ form, a
        // strict bound of their own. `as_f64` is None for the boolean form,
        // so each arm sees only its own draft.
        let strict_min = matches!(schema.get("exclusiveMinimum"), Some(Value::Bool(true)));
        let strict_max = matches!(schema.get("exclusiveMaximum"), Some(Value::Bool(true)));

        if let Some(min) = schema.get("minimum").and_then(Value::as_f64) {
            if value < min || (strict_min && value == min) {
                self.push_error(format!("value {} is less than minimum {}", value, min))?;
            }
        }

        if let Some(max) = schema.get("maximum").and_then(Value::as_f64) {
            if value > max || (strict_max && value == max) {
                self.push_error(format!("value {} is greater than maximum {}", value, max))?;
            }
        }

        if let Some(bound) = schema.get("exclusiveMinimum").and_then(Value::as_f64) {
            if value <= bound {
                self.push_error(format!(
                    "value {} is not greater than exclusive minimum {}",
                    value, bound
                ))?;
            }
        }

        if let Some(bound) = schema.get("exclusiveMaximum").and_then(Value::as_f64) {
            if value >= bound {
                self.push_error(format!(
                    "value {} is not less than exclusive maximum {}",
                    value, bound
                ))?;
            }
        }

        if let Some(divisor) = schema.get("multipleOf").and_then(Value::as_f64) {
            if divisor > 0.0 && !is_multiple_of(value, divisor) {
                self.push_error(format!("value {} is not a multiple of {}", value, divisor))?;
            }
        }

        Ok(())
    }

    fn check_array(
        &mut self,
        schema: &Map<String, Value>,
        items: &[Value],
    ) -> Result<(), MaxErrorsReached> {
        if let Some(min) = schema.get("minItems").and_then(Value::as_f64) {
            if (items.len() as f64) < min {
                self.push_error(format!(
                    "array has {} items, minimum is {}",
                    items.len(),
                    min
                ))?;
            }
        }

        if let Some(max) = schema.get("maxItems").and_then(Value::as_f64) {
            if (items.len() as f64) > max {
                self.push_error(format!(
                    "array has {} items, maximum is {}",
                    items.len(),
                    max
                ))?;
            }
        }

        if schema.get("uniqueItems") == Some(&Value::Bool(true)) && !json::all_unique(items) {
            self.push_error("items must be unique".to_owned())?;
        }

        if let Some(contains) = schema.get("contains") {
            if !items.iter().any(|item| self.probe(contains, item)) {
                self.push_error("no item matches the contains schema".to_owned())?;
            }
        }

        match schema.get("items") {
            // Tuple form: element i against schema i, the tail against
            // additionalItems.
            Some(Value::Array(tuple)) => {
                for (i, item) in items.iter().enumerate() {
                    if let Some(sub) = tuple.get(i) {
                        self.descend_index(i, sub, item)?;
                    } else {
                        match schema.get("additionalItems") {
                            Some(Value::Bool(false)) => {
                                self.path.push(PathSegment::Index(i));
                                let result = self
                                    .push_error("additional items are not allowed".to_owned());
                                self.path.pop();
                                result?;
                            }
                            Some(additional) if !additional.is_boolean() => {
                                self.descend_index(i, additional, item)?;
                            }
                            _ => {}
                        }
                    }
                }
            }
            Some(single) if !single.is_null() => {
                for (i, item) in items.iter().enumerate() {
                    self.descend_index(i, single, item)?;
                }
            }
            _ => {}
        }

        Ok(())
    }

    fn check_object(
        &mut self,
        schema: &Map<String, Value>,
        instance: &Value,
    ) -> Result<(), MaxErrorsReached> {
        let Some(obj) = instance.as_object() else {
            return Ok(());
        };
        let nulls_absent = self.nulls_absent;

        if let Some(Value::Object(properties)) = schema.get("properties") {
            for (name, sub) in properties {
                if let Some(sub_instance) = present(obj, name, nulls_absent) {
                    self.descend_key(name, sub, sub_instance)?;
                }
            }
        }

        if let Some(Value::Array(required)) = schema.get("required") {
            for name in required.iter().filter_map(Value::as_str) {
                if present(obj, name, nulls_absent).is_none() {
                    self.push_error(format!("required property '{}' is missing", name))?;
                }
            }
        }

        if let Some(Value::Object(pattern_properties)) = schema.get("patternProperties") {
            for (pattern, sub) in pattern_properties {
                if let Ok(re) = Regex::new(pattern) {
                    for (name, sub_instance) in obj {
                        if re.is_match(name) {
                            self.descend_key(name, sub, sub_instance)?;
                        }
                    }
                }
            }
        }

        if let Some(additional) = schema.get("additionalProperties") {
            if additional != &Value::Bool(true) {
                let named = schema.get("properties").and_then(Value::as_object);
                let patterns: Vec<Regex> = schema
                    .get("patternProperties")
                    .and_then(Value::as_object)
                    .map(|m| m.keys().filter_map(|p| Regex::new(p).ok()).collect())
                    .unwrap_or_default();

                for (name, sub_instance) in obj {
                    if named.is_some_and(|p| p.contains_key(name))
                        || patterns.iter().any(|re| re.is_match(name))
                    {
                        continue;
                    }
                    if additional == &Value::Bool(false) {
                        self.push_error(format!("additional property '{}' not allowed", name))?;
                    } else {
                        self.descend_key(name, additional, sub_instance)?;
                    }
                }
            }
        }

        if let Some(sub) = schema.get("propertyNames") {
            for name in obj.keys() {
                if !self.probe(sub, &Value::String(name.clone())) {
                    self.push_error(format!("property name '{}' is not valid", name))?;
                }
            }
        }

        if let Some(min) = schema.get("minProperties").and_then(Value::as_f64) {
            if (obj.len() as f64) < min {
                self.push_error(format!(
                    "object has {} properties, minimum is {}",
                    obj.len(),
                    min
                ))?;
            }
        }

        if let Some(max) = schema.get("maxProperties").and_then(Value::as_f64) {
            if (obj.len() as f64) > max {
                self.push_error(format!(
                    "object has {} properties, maximum is {}",
                    obj.len(),
                    max
                ))?;
            }
        }

        if let Some(Value::Object(dependencies)) = schema.get("dependencies") {
            for (key, dependency) in dependencies {
                if !obj.contains_key(key) {
                    continue;
                }
                match dependency {
                    Value::Array(names) => {
                        for name in names.iter().filter_map(Value::as_str) {
                            if !obj.contains_key(name) {
                                self.push_error(format!(
                                    "property '{}' requires property '{}'",
                                    key, name
                                ))?;
                            }
                        }
                    }
                    Value::String(name) => {
                        if !obj.contains_key(name.as_str()) {
                            self.push_error(format!(
                                "property '{}' requires property '{}'",
                                key, name
                            ))?;
                        }
                    }
                    sub => self.validate_node(sub, instance)?,
                }
            }
        }

        Ok(())
    }

    fn check_composition(
        &mut self,
        schema: &Map<String, Value>,
        instance: &Value,
    ) -> Result<(), MaxErrorsReached> {
        if let Some(Value::Array(all_of)) = schema.get("allOf") {
            for sub in all_of {
                self.validate_node(sub, instance)?;
            }
        }

        if let Some(Value::Array(any_of)) = schema.get("anyOf") {
            if !any_of.iter().any(|sub| self.probe(sub, instance)) {
                self.push_error("value does not match any schema in anyOf".to_owned())?;
            }
        }

        if let Some(Value::Array(one_of)) = schema.get("oneOf") {
            let matched = one_of.iter().filter(|sub| self.probe(sub, instance)).count();
            if matched == 0 {
                self.push_error("value matches none of the schemas in oneOf".to_owned())?;
            } else if matched > 1 {
                self.push_error("value matches multiple schemas in oneOf".to_owned())?;
            }
        }

        if let Some(sub) = schema.get("not") {
            if self.probe(sub, instance) {
                self.push_error("value matches the schema forbidden by not".to_owned())?;
            }
        }

        Ok(())
    }

    fn check_conditional(
        &mut self,
        schema: &Map<String, Value>,
        instance: &Value,
    ) -> Result<(), MaxErrorsReached> {
        let Some(condition) = schema.get("if") else {
            return Ok(());
        };

        if self.probe(condition, instance) {
            if let Some(then) = schema.get("then") {
                self.validate_node(then, instance)?;
            }
        } else if let Some(els) = schema.get("else") {
            self.validate_node(els, instance)?;
        }

        Ok(())
    }

    /// Silently checks `instance` against `schema`; used by the keywords
    /// whose sub-errors are not part of the report.
    fn probe(&self, schema: &Value, instance: &Value) -> bool {
        let mut vm = Vm {
            root: self.root,
            max_errors: 1,
            max_ref_depth: self.max_ref_depth,
            nulls_absent: self.nulls_absent,
            ref_depth: self.ref_depth,
            path: vec![],
            errors: vec![],
        };
        let _ = vm.validate_node(schema, instance);
        vm.errors.is_empty()
    }

    fn descend_key(
        &mut self,
        key: &str,
        schema: &Value,
        instance: &Value,
    ) -> Result<(), MaxErrorsReached> {
        self.path.push(PathSegment::Key(key.to_owned()));
        let result = self.validate_node(schema, instance);
        self.path.pop();
        result
    }

    fn descend_index(
        &mut self,
        index: usize,
        schema: &Value,
        instance: &Value,
    ) -> Result<(), MaxErrorsReached> {
        self.path.push(PathSegment::Index(index));
        let result = self.validate_node(schema, instance);
        self.path.pop();
        result
    }

    fn push_error(&mut self, message: String) -> Result<(), MaxErrorsReached> {
        self.errors.push(ValidationError {
            path: self.path_string(),
            message,
        });

        if self.max_errors != 0 && self.errors.len() >= self.max_errors {
            Err(MaxErrorsReached)
        } else {
            Ok(())
        }
    }

    fn path_string(&self) -> String {
        let mut out = String::new();
        for segment in &self.path {
            match segment {
                PathSegment::Key(key) => {
                    if !out.is_empty() {
                        out.push('.');
                    }
                    out.push_str(key);
                }
                PathSegment::Index(i) => {
                    out.push('[');
                    out.push_str(&i.to_string());
                    out.push(']');
                }
            }
        }
        out
    }
}

/// Property lookup honoring the record rule: when nulls count as absent, a
/// key holding `null` reads as missing.
fn present<'v>(
    obj: &'v Map<String, Value>,
    name: &str,
    nulls_absent: bool,
) -> Option<&'v Value> {
    obj.get(name)
        .filter(|value| !(nulls_absent && value.is_null()))
}

fn type_matches(name: &str, instance: &Value) -> bool {
    match name {
        "null" => instance.is_null(),
        "boolean" => instance.is_boolean(),
        "integer" => json::is_integer(instance),
        "number" => instance.is_number(),
        "string" => instance.is_string(),
        "array" => instance.is_array(),
        "object" => instance.is_object(),
        _ => false,
    }
}

fn is_multiple_of(value: f64, divisor: f64) -> bool {
    let remainder = (value / divisor).fract().abs();
    remainder < 1e-8 || 1.0 - remainder < 1e-8
}
