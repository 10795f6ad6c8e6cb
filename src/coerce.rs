//! Scheme-driven coercion engine
//!
//! [`coerce`] walks a scheme node and a value side by side. Records keep only
//! the fields they declare, array-of nodes map over every element (wrapping a
//! lone value first), and casters convert leaves. Missing values are never
//! coerced. [`is_valid`] is the post-coercion check applied once per read.

use std::collections::BTreeMap;

use tracing::trace;

use crate::error::Result;
use crate::scheme::{Caster, Scheme};
use crate::value::Value;

/// Coerce `value` to `scheme`.
///
/// No scheme means pass-through; no value stays no value. The only failure is
/// malformed JSON text reaching an object caster.
pub fn coerce(scheme: Option<&Scheme>, value: Option<&Value>) -> Result<Option<Value>> {
    match (scheme, value) {
        (None, value) => Ok(value.cloned()),
        (Some(_), None) => Ok(None),
        (Some(scheme), Some(value)) => coerce_value(scheme, value).map(Some),
    }
}

/// Coerce a present value against a scheme node
pub fn coerce_value(scheme: &Scheme, value: &Value) -> Result<Value> {
    match scheme {
        Scheme::Record(fields) => {
            let mut output = BTreeMap::new();
            for (name, child) in fields {
                if let Some(field) = value.member(name) {
                    output.insert(name.clone(), coerce_value(child, field)?);
                }
            }
            Ok(Value::Object(output))
        }
        Scheme::ArrayOf(element) => {
            let items = as_sequence(value)
                .iter()
                .map(|item| coerce_value(element, item))
                .collect::<Result<Vec<_>>>()?;
            Ok(Value::Array(items))
        }
        Scheme::Caster(caster) => cast(*caster, value),
    }
}

/// Apply a single caster to a value
pub fn cast(caster: Caster, value: &Value) -> Result<Value> {
    trace!(caster = %caster, kind = value.kind(), "casting value");

    let output = match caster {
        Caster::Text => Value::String(value.to_text()),
        Caster::Number => Value::Number(value.to_number()),
        Caster::Boolean => Value::Bool(value.to_boolean()),
        Caster::DateTime => Value::Date(value.to_timestamp()),
        Caster::Object => match value {
            Value::String(text) => serde_json::from_str::<serde_json::Value>(text)?.into(),
            Value::Null => Value::object(),
            Value::Bool(_) | Value::Number(_) => Value::Boxed(Box::new(value.clone())),
            other => other.clone(),
        },
        Caster::Array => Value::Array(as_sequence(value).to_vec()),
    };

    Ok(output)
}

/// Post-coercion validity check.
///
/// Numbers must not be NaN, dates must not be invalid, and the object caster
/// must have produced something of object kind. Absent values are valid.
pub fn is_valid(scheme: Option<&Scheme>, value: Option<&Value>) -> bool {
    let (Some(Scheme::Caster(caster)), Some(value)) = (scheme, value) else {
        return true;
    };

    match caster {
        Caster::Number => !value.as_f64().is_some_and(f64::is_nan),
        Caster::DateTime => value.as_timestamp().map_or(true, |ts| ts.is_valid()),
        Caster::Object => value.is_object_kind(),
        Caster::Text | Caster::Boolean | Caster::Array => true,
    }
}

/// Zero value for a scheme node, used to pre-fill a document
pub fn zero_value(scheme: &Scheme) -> Value {
    match scheme {
        Scheme::Caster(Caster::Text) => Value::String(String::new()),
        Scheme::Caster(Caster::Number) | Scheme::Caster(Caster::DateTime) => Value::Number(0.0),
        Scheme::Caster(Caster::Boolean) => Value::Bool(false),
        Scheme::Caster(Caster::Object) => Value::object(),
        Scheme::Caster(Caster::Array) | Scheme::ArrayOf(_) => Value::Array(Vec::new()),
        Scheme::Record(fields) => Value::Object(
            fields
                .iter()
                .map(|(name, child)| (name.clone(), zero_value(child)))
                .collect(),
        ),
    }
}

/// Borrow a value as a sequence, treating a non-array as a single element
fn as_sequence(value: &Value) -> &[Value] {
    match value {
        Value::Array(items) => items,
        other => std::slice::from_ref(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SchemeError;
    use crate::value::Timestamp;
    use serde_json::json;

    fn epoch() -> Value {
        Value::Date(Timestamp::from_millis(0.0))
    }

    fn coerce_json(scheme: &Scheme, json: serde_json::Value) -> Value {
        coerce_value(scheme, &Value::from(json)).unwrap()
    }

    #[test]
    fn test_no_scheme_passes_through() {
        let value = Value::from(json!({"any": ["shape", 1]}));
        assert_eq!(coerce(None, Some(&value)).unwrap(), Some(value));
        assert_eq!(coerce(None, None).unwrap(), None);
    }

    #[test]
    fn test_missing_value_is_not_coerced() {
        let schemes = [
            Scheme::number(),
            Scheme::array_of(Scheme::text()),
            Scheme::record([("a", Scheme::number())]),
        ];
        for scheme in schemes {
            assert_eq!(coerce(Some(&scheme), None).unwrap(), None);
        }
    }

    #[test]
    fn test_scalar_casters() {
        assert_eq!(coerce_json(&Scheme::number(), json!("123")), Value::Number(123.0));
        assert_eq!(coerce_json(&Scheme::text(), json!(123)), Value::from("123"));
        assert_eq!(coerce_json(&Scheme::boolean(), json!("1")), Value::Bool(true));
        assert_eq!(coerce_json(&Scheme::boolean(), json!(0)), Value::Bool(false));
        assert_eq!(coerce_json(&Scheme::boolean(), json!(null)), Value::Bool(false));
    }

    #[test]
    fn test_idempotent_on_declared_type() {
        assert_eq!(coerce_json(&Scheme::number(), json!(5)), Value::Number(5.0));
        assert_eq!(coerce_json(&Scheme::text(), json!("x")), Value::from("x"));

        let date = coerce_json(&Scheme::date_time(), json!("2016-03-15T12:39:38.065Z"));
        assert_eq!(coerce_value(&Scheme::date_time(), &date).unwrap(), date);
    }

    #[test]
    fn test_date_caster() {
        let date = coerce_json(&Scheme::date_time(), json!(0));
        assert_eq!(date, epoch());
        assert_eq!(coerce_json(&Scheme::date_time(), json!(null)), epoch());

        let invalid = coerce_json(&Scheme::date_time(), json!("not-a-date"));
        assert_eq!(invalid, Value::Date(Timestamp::invalid()));
        assert!(!is_valid(Some(&Scheme::date_time()), Some(&invalid)));
    }

    #[test]
    fn test_object_caster() {
        let scheme = Scheme::object();
        assert_eq!(coerce_json(&scheme, json!(r#"{"a": 1}"#)), Value::from(json!({"a": 1})));
        assert_eq!(coerce_json(&scheme, json!(null)), Value::object());
        assert_eq!(coerce_json(&scheme, json!(7)), Value::Boxed(Box::new(Value::Number(7.0))));
        assert_eq!(coerce_json(&scheme, json!([1])), Value::from(json!([1])));

        let text = coerce_json(&scheme, json!(r#""little string""#));
        assert_eq!(text, Value::from("little string"));
        assert!(!is_valid(Some(&scheme), Some(&text)));

        let err = coerce_value(&scheme, &Value::from("{a: 1}")).unwrap_err();
        assert!(matches!(err, SchemeError::Parse(_)));
    }

    #[test]
    fn test_array_caster_wraps_single_values() {
        assert_eq!(coerce_json(&Scheme::array(), json!([1, 2, 3])), Value::from(json!([1, 2, 3])));
        assert_eq!(coerce_json(&Scheme::array(), json!("1234")), Value::from(json!(["1234"])));
    }

    #[test]
    fn test_array_of() {
        let strings = coerce_json(&Scheme::array_of(Scheme::text()), json!(["foobar", 123, null]));
        assert_eq!(strings, Value::from(json!(["foobar", "123", "null"])));

        let numbers = coerce_json(
            &Scheme::array_of(Scheme::number()),
            json!(["123", null, "1234.123"]),
        );
        assert_eq!(numbers, Value::from(json!([123, 0, 1234.123])));

        let single = coerce_json(&Scheme::array_of(Scheme::number()), json!("42"));
        assert_eq!(single, Value::from(json!([42])));
    }

    #[test]
    fn test_record_keeps_declared_fields_only() {
        let scheme = Scheme::record([
            ("num", Scheme::number()),
            ("str", Scheme::text()),
            ("missing", Scheme::boolean()),
            ("more", Scheme::record([("bool", Scheme::boolean())])),
        ]);
        let output = coerce_json(
            &scheme,
            json!({"num": "1234", "str": 1234, "extra": "dropped", "more": {"bool": 0, "x": 1}}),
        );
        assert_eq!(
            output,
            Value::from(json!({"num": 1234, "str": "1234", "more": {"bool": false}}))
        );
    }

    #[test]
    fn test_validity_only_checks_top_level() {
        let scheme = Scheme::array_of(Scheme::number());
        let output = coerce_json(&scheme, json!(["abc"]));
        assert!(output.as_array().unwrap()[0].as_f64().unwrap().is_nan());
        assert!(is_valid(Some(&scheme), Some(&output)));
        assert!(!is_valid(Some(&Scheme::number()), Some(&Value::Number(f64::NAN))));
    }

    #[test]
    fn test_zero_values() {
        let scheme = Scheme::record([
            ("str", Scheme::text()),
            ("num", Scheme::number()),
            ("bool", Scheme::boolean()),
            ("date", Scheme::date_time()),
            ("list", Scheme::array_of(Scheme::number())),
            ("deep", Scheme::record([("obj", Scheme::object())])),
        ]);
        assert_eq!(
            zero_value(&scheme).to_json(),
            json!({"str": "", "num": 0, "bool": false, "date": 0, "list": [], "deep": {"obj": {}}})
        );
    }
}
