use serde_json::{Number, Value};

/// JSON type name as it appears in validation messages.
pub(crate) fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => {
            if is_integer(value) {
                "integer"
            } else {
                "number"
            }
        }
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Whether the value is an integral number. A float with a zero fractional
/// part counts, so `1.0` satisfies `"type": "integer"`.
pub(crate) fn is_integer(value: &Value) -> bool {
    match value {
        Value::Number(n) => {
            n.is_i64()
                || n.is_u64()
                || n.as_f64().is_some_and(|f| f.is_finite() && f.fract() == 0.0)
        }
        _ => false,
    }
}

/// Structural equality with mathematical number comparison: `1`, `1.0`, and
/// `1u64` are all equal to each other, and never equal to `true`.
pub(crate) fn equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => number_equal(x, y),
        (Value::Array(x), Value::Array(y)) => {
            x.len() == y.len() && x.iter().zip(y).all(|(v, w)| equal(v, w))
        }
        (Value::Object(x), Value::Object(y)) => {
            x.len() == y.len()
                && x.iter().all(|(k, v)| y.get(k).is_some_and(|w| equal(v, w)))
        }
        _ => a == b,
    }
}

fn number_equal(a: &Number, b: &Number) -> bool {
    if let (Some(x), Some(y)) = (a.as_i64(), b.as_i64()) {
        return x == y;
    }
    if let (Some(x), Some(y)) = (a.as_u64(), b.as_u64()) {
        return x == y;
    }
    match (a.as_f64(), b.as_f64()) {
        (Some(x), Some(y)) => x == y,
        _ => false,
    }
}

/// Pairwise uniqueness under [`equal`], as `uniqueItems` requires.
pub(crate) fn all_unique(items: &[Value]) -> bool {
    for (i, item) in items.iter().enumerate() {
        if items[i + 1..].iter().any(|other| equal(item, other)) {
            return false;
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn integers() {
        assert!(is_integer(&json!(1)));
        assert!(is_integer(&json!(-3)));
        assert!(is_integer(&json!(1.0)));
        assert!(!is_integer(&json!(1.5)));
        assert!(!is_integer(&json!(true)));
        assert!(!is_integer(&json!("1")));
    }

    #[test]
    fn number_coalescing() {
        assert!(equal(&json!(1), &json!(1.0)));
        assert!(equal(&json!(0), &json!(-0.0)));
        assert!(!equal(&json!(1), &json!(true)));
        assert!(!equal(&json!(1), &json!("1")));
    }

    #[test]
    fn structural() {
        assert!(equal(
            &json!({"a": [1, {"b": 2}]}),
            &json!({"a": [1.0, {"b": 2.0}]})
        ));
        assert!(!equal(&json!({"a": 1}), &json!({"a": 1, "b": 2})));
        assert!(!equal(&json!([1, 2]), &json!([2, 1])));
    }

    #[test]
    fn uniqueness() {
        assert!(all_unique(&[json!(1), json!("1"), json!(true), json!(null)]));
        assert!(!all_unique(&[json!(1), json!(1.0)]));
        assert!(!all_unique(&[json!({"a": 1}), json!({"a": 1})]));
        assert!(all_unique(&[]));
    }
}
