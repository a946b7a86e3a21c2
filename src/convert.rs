//! Conversion between interpreter values and `serde_json` values.

use crate::Error;
use crate::MAX_PARSE_DEPTH;
use crate::printer;
use crate::value::Value;

/// Convert a JSON value into an interpreter value.
///
/// `null` becomes `Nil`, booleans become `0`/`1`, strings become char lists
/// and objects become dictionaries keyed by symbols.
pub fn from_json(json: &serde_json::Value) -> Result<Value, Error> {
    from_json_at_depth(json, 0)
}

fn from_json_at_depth(json: &serde_json::Value, depth: usize) -> Result<Value, Error> {
    if depth >= MAX_PARSE_DEPTH {
        return Err(Error::Conversion(format!(
            "JSON value too deeply nested (max depth: {MAX_PARSE_DEPTH})."
        )));
    }
    match json {
        serde_json::Value::Null => Ok(Value::Nil),
        serde_json::Value::Bool(b) => Ok(Value::from_bool(*b)),
        serde_json::Value::Number(n) => n
            .as_f64()
            .map(Value::Number)
            .ok_or_else(|| Error::Conversion(format!("cannot convert number {n}."))),
        serde_json::Value::String(s) => Ok(Value::from(s.as_str())),
        serde_json::Value::Array(items) => items
            .iter()
            .map(|v| from_json_at_depth(v, depth + 1))
            .collect::<Result<Vec<_>, _>>()
            .map(Value::List),
        serde_json::Value::Object(map) => {
            let keys = map.keys().map(|k| Value::Symbol(k.clone())).collect();
            let values = map
                .values()
                .map(|v| from_json_at_depth(v, depth + 1))
                .collect::<Result<Vec<_>, _>>()?;
            Value::dict(keys, values)
        }
    }
}

/// Convert an interpreter value into JSON.
///
/// Char lists become strings, `Nil` and non-finite numbers become `null`,
/// and dictionary keys are rendered as text. Functions, views and
/// expression nodes have no JSON form.
pub fn to_json(value: &Value) -> Result<serde_json::Value, Error> {
    match value {
        Value::Nil => Ok(serde_json::Value::Null),
        Value::Number(n) => Ok(serde_json::Number::from_f64(*n)
            .map_or(serde_json::Value::Null, serde_json::Value::Number)),
        Value::Symbol(s) => Ok(serde_json::Value::String(s.clone())),
        Value::Char(_) => value.text().map(serde_json::Value::String),
        Value::List(items) if !items.is_empty() && value.is_string() => {
            value.text().map(serde_json::Value::String)
        }
        Value::List(items) => items
            .iter()
            .map(to_json)
            .collect::<Result<Vec<_>, _>>()
            .map(serde_json::Value::Array),
        Value::Dict(d) => {
            let mut map = serde_json::Map::with_capacity(d.len());
            for (k, v) in d.iter() {
                map.insert(printer::format(k, true), to_json(v)?);
            }
            Ok(serde_json::Value::Object(map))
        }
        other => Err(Error::Conversion(format!(
            "cannot convert '{other}' to a JSON datatype."
        ))),
    }
}

/// Parse JSON text into an interpreter value
pub fn parse_json(text: &str) -> Result<Value, Error> {
    let json: serde_json::Value = serde_json::from_str(text)
        .map_err(|e| Error::Conversion(format!("invalid JSON: {e}.")))?;
    from_json(&json)
}

#[cfg(test)]
#[expect(clippy::unwrap_used)] // test code OK
mod tests {
    use super::*;
    use crate::value::{sym, val};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_from_json() {
        let cases = vec![
            (json!(null), Value::Nil),
            (json!(true), val(1)),
            (json!(2.5), val(2.5)),
            (json!("hi"), val("hi")),
            (json!([1, "a"]), val(vec![val(1), val("a")])),
        ];
        for (input, expected) in cases {
            assert_eq!(from_json(&input).unwrap(), expected, "{input}");
        }

        let d = from_json(&json!({"a": 1, "b": [2, 3]})).unwrap();
        assert_eq!(d.to_string(), "[a:1;b:2 3]");
    }

    #[test]
    fn test_to_json() {
        let cases = vec![
            (val(3), json!(3.0)),
            (val(f64::NAN), json!(null)),
            (val(f64::INFINITY), json!(null)),
            (sym("abc"), json!("abc")),
            (Value::Char(u32::from('x')), json!("x")),
            (val("hey"), json!("hey")),
            (val(Vec::<Value>::new()), json!([])),
            (val(vec![val(1), sym("b")]), json!([1.0, "b"])),
        ];
        for (input, expected) in cases {
            assert_eq!(to_json(&input).unwrap(), expected, "{input}");
        }

        let d = Value::dict(vec![sym("k"), val(2)], vec![val("v"), val(1)]).unwrap();
        assert_eq!(to_json(&d).unwrap(), json!({"k": "v", "2": 1.0}));
    }

    #[test]
    fn test_unconvertible_values() {
        let interp = crate::evaluator::Interpreter::new();
        let f = interp.eval("{x+1}").unwrap();
        let err = to_json(&f).unwrap_err();
        assert_eq!(
            err,
            Error::Conversion("cannot convert '{[x]x+1}' to a JSON datatype.".into())
        );

        assert!(matches!(parse_json("[1,"), Err(Error::Conversion(_))));
        let nested = format!("{}{}", "[".repeat(100), "]".repeat(100));
        assert!(parse_json(&nested).is_err());
    }
}
