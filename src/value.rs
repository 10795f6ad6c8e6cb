//! Loosely-typed values and their dynamic conversions
//!
//! [`Value`] is the shape of everything stored in a model and everything a
//! scheme coerces into. Besides the JSON kinds it carries two extra variants:
//! [`Value::Date`] for the output of the date caster and [`Value::Boxed`] for
//! primitives wrapped into an object by the object caster.
//!
//! The `to_*` conversions follow the loose rules of dynamic languages
//! (`"" -> 0`, `null -> false`, `[1, null] -> "1,"`) rather than failing.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::path::array_index;

/// Furthest distance from the epoch, in milliseconds, a timestamp may reach
const MAX_EPOCH_MILLIS: f64 = 8.64e15;

/// Naive formats accepted after RFC 3339 and RFC 2822 fail; read as UTC
const NAIVE_DATE_TIME_FORMATS: [&str; 3] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
];

/// A millisecond-precision UTC instant, or the invalid-date sentinel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Timestamp(Option<i64>);

impl Timestamp {
    /// The invalid-date sentinel
    pub fn invalid() -> Self {
        Self(None)
    }

    /// Build from milliseconds since the epoch, truncating any fraction.
    /// Instants chrono cannot represent are invalid.
    pub fn from_millis(millis: f64) -> Self {
        if !millis.is_finite() || millis.abs() > MAX_EPOCH_MILLIS {
            return Self::invalid();
        }
        let millis = millis.trunc() as i64;
        match DateTime::<Utc>::from_timestamp_millis(millis) {
            Some(_) => Self(Some(millis)),
            None => Self::invalid(),
        }
    }

    pub fn from_datetime(datetime: DateTime<Utc>) -> Self {
        Self::from_millis(datetime.timestamp_millis() as f64)
    }

    /// Parse a date string; anything unrecognized yields the invalid sentinel
    pub fn parse(text: &str) -> Self {
        let text = text.trim();

        if let Ok(datetime) = DateTime::parse_from_rfc3339(text) {
            return Self::from_datetime(datetime.with_timezone(&Utc));
        }
        if let Ok(datetime) = DateTime::parse_from_rfc2822(text) {
            return Self::from_datetime(datetime.with_timezone(&Utc));
        }
        if let Ok(date) = NaiveDate::parse_from_str(text, "%Y-%m-%d") {
            if let Some(midnight) = date.and_hms_opt(0, 0, 0) {
                return Self::from_datetime(midnight.and_utc());
            }
        }
        for format in NAIVE_DATE_TIME_FORMATS {
            if let Ok(datetime) = NaiveDateTime::parse_from_str(text, format) {
                return Self::from_datetime(datetime.and_utc());
            }
        }

        Self::invalid()
    }

    pub fn is_valid(&self) -> bool {
        self.0.is_some()
    }

    /// Milliseconds since the epoch, `None` for an invalid date
    pub fn epoch_millis(&self) -> Option<i64> {
        self.0
    }

    pub fn to_datetime(&self) -> Option<DateTime<Utc>> {
        self.0.and_then(DateTime::from_timestamp_millis)
    }

    /// RFC 3339 with millisecond precision, e.g. `2016-03-15T12:39:38.065Z`
    pub fn to_rfc3339(&self) -> Option<String> {
        self.to_datetime()
            .map(|datetime| datetime.to_rfc3339_opts(SecondsFormat::Millis, true))
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_rfc3339() {
            Some(text) => f.write_str(&text),
            None => f.write_str("Invalid Date"),
        }
    }
}

impl From<DateTime<Utc>> for Timestamp {
    fn from(datetime: DateTime<Utc>) -> Self {
        Self::from_datetime(datetime)
    }
}

/// A loosely-typed value held by a model
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Number(f64),
    String(String),
    Array(Vec<Value>),
    Object(BTreeMap<String, Value>),
    /// Output of the date caster
    Date(Timestamp),
    /// A primitive wrapped into an object
    Boxed(Box<Value>),
}

impl Value {
    /// A fresh, empty mapping
    pub fn object() -> Self {
        Value::Object(BTreeMap::new())
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// True for every kind a dynamic runtime would report as "object":
    /// `null`, arrays, mappings, dates and boxed primitives.
    pub fn is_object_kind(&self) -> bool {
        matches!(
            self,
            Value::Null | Value::Array(_) | Value::Object(_) | Value::Date(_) | Value::Boxed(_)
        )
    }

    /// Short name of the variant, used in diagnostics
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "boolean",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::Array(_) => "array",
            Value::Object(_) => "object",
            Value::Date(_) => "date",
            Value::Boxed(_) => "boxed",
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&Vec<Value>> {
        match self {
            Value::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&BTreeMap<String, Value>> {
        match self {
            Value::Object(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_timestamp(&self) -> Option<Timestamp> {
        match self {
            Value::Date(ts) => Some(*ts),
            _ => None,
        }
    }

    /// Look up a direct member: a mapping key, or a numeric index into an array
    pub fn member(&self, key: &str) -> Option<&Value> {
        match self {
            Value::Object(map) => map.get(key),
            Value::Array(items) => array_index(key).and_then(|i| items.get(i)),
            _ => None,
        }
    }

    /// Numeric conversion; unconvertible input becomes NaN
    pub fn to_number(&self) -> f64 {
        match self {
            Value::Null => 0.0,
            Value::Bool(b) => {
                if *b {
                    1.0
                } else {
                    0.0
                }
            }
            Value::Number(n) => *n,
            Value::String(s) => parse_number(s),
            Value::Array(_) => parse_number(&self.to_text()),
            Value::Object(_) => f64::NAN,
            Value::Date(ts) => ts.epoch_millis().map_or(f64::NAN, |ms| ms as f64),
            Value::Boxed(inner) => inner.to_number(),
        }
    }

    /// Truthiness
    pub fn to_boolean(&self) -> bool {
        match self {
            Value::Null => false,
            Value::Bool(b) => *b,
            Value::Number(n) => *n != 0.0 && !n.is_nan(),
            Value::String(s) => !s.is_empty(),
            Value::Array(_) | Value::Object(_) | Value::Date(_) | Value::Boxed(_) => true,
        }
    }

    /// String conversion
    pub fn to_text(&self) -> String {
        match self {
            Value::Null => "null".to_string(),
            Value::Bool(b) => b.to_string(),
            Value::Number(n) => format_number(*n),
            Value::String(s) => s.clone(),
            Value::Array(items) => items
                .iter()
                .map(|item| match item {
                    Value::Null => String::new(),
                    other => other.to_text(),
                })
                .collect::<Vec<_>>()
                .join(","),
            Value::Object(_) => "[object Object]".to_string(),
            Value::Date(ts) => ts.to_string(),
            Value::Boxed(inner) => inner.to_text(),
        }
    }

    /// Date conversion; unparseable input becomes the invalid sentinel
    pub fn to_timestamp(&self) -> Timestamp {
        match self {
            Value::Date(ts) => *ts,
            Value::Null => Timestamp::from_millis(0.0),
            Value::Bool(b) => Timestamp::from_millis(if *b { 1.0 } else { 0.0 }),
            Value::Number(n) => Timestamp::from_millis(*n),
            Value::String(s) => Timestamp::parse(s),
            Value::Boxed(inner) => inner.to_timestamp(),
            Value::Array(_) | Value::Object(_) => Timestamp::parse(&self.to_text()),
        }
    }

    /// Convert into plain JSON. Integral numbers become JSON integers, dates
    /// become RFC 3339 strings, and NaN, infinities and invalid dates become `null`.
    pub fn to_json(&self) -> serde_json::Value {
        use serde_json::Value as Json;

        match self {
            Value::Null => Json::Null,
            Value::Bool(b) => Json::Bool(*b),
            Value::Number(n) => number_to_json(*n),
            Value::String(s) => Json::String(s.clone()),
            Value::Array(items) => Json::Array(items.iter().map(Value::to_json).collect()),
            Value::Object(map) => Json::Object(
                map.iter()
                    .map(|(key, value)| (key.clone(), value.to_json()))
                    .collect(),
            ),
            Value::Date(ts) => ts.to_rfc3339().map_or(Json::Null, Json::String),
            Value::Boxed(inner) => inner.to_json(),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_text())
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Value {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        serde_json::Value::deserialize(deserializer).map(Value::from)
    }
}

impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        use serde_json::Value as Json;

        match json {
            Json::Null => Value::Null,
            Json::Bool(b) => Value::Bool(b),
            Json::Number(n) => Value::Number(n.as_f64().unwrap_or(f64::NAN)),
            Json::String(s) => Value::String(s),
            Json::Array(items) => Value::Array(items.into_iter().map(Value::from).collect()),
            Json::Object(map) => Value::Object(
                map.into_iter()
                    .map(|(key, value)| (key, Value::from(value)))
                    .collect(),
            ),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Number(n as f64)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Number(f64::from(n))
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::Array(items)
    }
}

impl From<BTreeMap<String, Value>> for Value {
    fn from(map: BTreeMap<String, Value>) -> Self {
        Value::Object(map)
    }
}

impl From<Timestamp> for Value {
    fn from(ts: Timestamp) -> Self {
        Value::Date(ts)
    }
}

fn number_to_json(n: f64) -> serde_json::Value {
    const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_991.0;

    if n.fract() == 0.0 && n.abs() <= MAX_SAFE_INTEGER {
        serde_json::Value::from(n as i64)
    } else {
        serde_json::Number::from_f64(n).map_or(serde_json::Value::Null, serde_json::Value::Number)
    }
}

/// Parse numeric text: decimal literals, `Infinity`, and `0x`/`0o`/`0b`
/// integers. Blank text is zero; anything else is NaN.
pub fn parse_number(text: &str) -> f64 {
    let s = text.trim();
    if s.is_empty() {
        return 0.0;
    }

    match s {
        "Infinity" | "+Infinity" => return f64::INFINITY,
        "-Infinity" => return f64::NEG_INFINITY,
        _ => {}
    }

    for (prefix, radix) in [("0x", 16), ("0X", 16), ("0o", 8), ("0O", 8), ("0b", 2), ("0B", 2)] {
        if let Some(digits) = s.strip_prefix(prefix) {
            if digits.is_empty() || !digits.chars().all(|c| c.is_digit(radix)) {
                return f64::NAN;
            }
            return digits.chars().fold(0.0, |acc, c| {
                acc * f64::from(radix) + f64::from(c.to_digit(radix).unwrap_or(0))
            });
        }
    }

    // f64::from_str also takes "inf" and "nan", which are not numeric text here
    if !s.chars().all(|c| c.is_ascii_digit() || matches!(c, '.' | 'e' | 'E' | '+' | '-')) {
        return f64::NAN;
    }
    s.parse::<f64>().unwrap_or(f64::NAN)
}

/// Shortest round-trip rendering of a number. Plain notation is used for
/// magnitudes in `[1e-7, 1e21)`, exponent notation (`1e+21`, `5e-7`) outside.
pub fn format_number(n: f64) -> String {
    if n.is_nan() {
        return "NaN".to_string();
    }
    if n == 0.0 {
        return "0".to_string();
    }
    if n.is_infinite() {
        return if n > 0.0 { "Infinity" } else { "-Infinity" }.to_string();
    }

    let sign = if n < 0.0 { "-" } else { "" };
    let scientific = format!("{:e}", n.abs());
    let (mantissa, exponent) = scientific.split_once('e').unwrap_or((scientific.as_str(), "0"));
    let exponent: i32 = exponent.parse().unwrap_or(0);
    let digits: String = mantissa.chars().filter(|c| *c != '.').collect();

    let len = digits.len() as i32;
    // position of the decimal point relative to the first digit
    let point = exponent + 1;

    let body = if len <= point && point <= 21 {
        format!("{}{}", digits, "0".repeat((point - len) as usize))
    } else if 0 < point && point <= 21 {
        let (int, frac) = digits.split_at(point as usize);
        format!("{}.{}", int, frac)
    } else if -6 < point && point <= 0 {
        format!("0.{}{}", "0".repeat((-point) as usize), digits)
    } else {
        let e = point - 1;
        let e_sign = if e >= 0 { "+" } else { "-" };
        let (first, rest) = digits.split_at(1);
        if rest.is_empty() {
            format!("{}e{}{}", first, e_sign, e.abs())
        } else {
            format!("{}.{}e{}{}", first, rest, e_sign, e.abs())
        }
    };

    format!("{}{}", sign, body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_number() {
        assert_eq!(parse_number("123"), 123.0);
        assert_eq!(parse_number("  1234.123 "), 1234.123);
        assert_eq!(parse_number(""), 0.0);
        assert_eq!(parse_number("   "), 0.0);
        assert_eq!(parse_number("0x1F"), 31.0);
        assert_eq!(parse_number("0b101"), 5.0);
        assert_eq!(parse_number("-Infinity"), f64::NEG_INFINITY);
        assert_eq!(parse_number(".5"), 0.5);
        assert!(parse_number("abc").is_nan());
        assert!(parse_number("inf").is_nan());
        assert!(parse_number("12px").is_nan());
        assert!(parse_number("-0x10").is_nan());
    }

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(123.0), "123");
        assert_eq!(format_number(1234.123), "1234.123");
        assert_eq!(format_number(-0.5), "-0.5");
        assert_eq!(format_number(-0.0), "0");
        assert_eq!(format_number(1e21), "1e+21");
        assert_eq!(format_number(1.5e-7), "1.5e-7");
        assert_eq!(format_number(0.000001), "0.000001");
        assert_eq!(format_number(1e20), "100000000000000000000");
        assert_eq!(format_number(f64::NAN), "NaN");
        assert_eq!(format_number(f64::INFINITY), "Infinity");
    }

    #[test]
    fn test_to_number() {
        assert_eq!(Value::Null.to_number(), 0.0);
        assert_eq!(Value::Bool(true).to_number(), 1.0);
        assert_eq!(Value::from("123").to_number(), 123.0);
        assert_eq!(Value::Array(vec![]).to_number(), 0.0);
        assert_eq!(Value::from(json!(["7"])).to_number(), 7.0);
        assert!(Value::from(json!([1, 2])).to_number().is_nan());
        assert!(Value::object().to_number().is_nan());
    }

    #[test]
    fn test_to_boolean() {
        assert!(Value::from("1").to_boolean());
        assert!(Value::from("0").to_boolean());
        assert!(!Value::from("").to_boolean());
        assert!(!Value::Number(0.0).to_boolean());
        assert!(!Value::Number(f64::NAN).to_boolean());
        assert!(!Value::Null.to_boolean());
        assert!(Value::Array(vec![]).to_boolean());
        assert!(Value::object().to_boolean());
    }

    #[test]
    fn test_to_text() {
        assert_eq!(Value::Null.to_text(), "null");
        assert_eq!(Value::Number(123.0).to_text(), "123");
        assert_eq!(Value::from(json!([1, null, "a"])).to_text(), "1,,a");
        assert_eq!(Value::object().to_text(), "[object Object]");
        assert_eq!(Value::Date(Timestamp::invalid()).to_text(), "Invalid Date");
    }

    #[test]
    fn test_timestamp_parse() {
        let ts = Timestamp::parse("2016-03-15T12:39:38.065Z");
        assert_eq!(ts.epoch_millis(), Some(1458045578065));
        assert_eq!(ts.to_string(), "2016-03-15T12:39:38.065Z");

        assert_eq!(Timestamp::parse("1970-01-02").epoch_millis(), Some(86_400_000));
        assert_eq!(Timestamp::parse("1970-01-01T00:01").epoch_millis(), Some(60_000));
        assert!(Timestamp::parse("Tue, 15 Mar 2016 12:39:38 +0000").is_valid());
        assert!(!Timestamp::parse("not-a-date").is_valid());
    }

    #[test]
    fn test_timestamp_range() {
        let far = Timestamp::from_millis(8.0e15);
        assert!(far.is_valid());
        assert_ne!(far.to_string(), "Invalid Date");
        assert!(far.to_rfc3339().is_some());

        let beyond_chrono = Timestamp::from_millis(8.64e15);
        assert!(!beyond_chrono.is_valid());
        assert_eq!(beyond_chrono.to_string(), "Invalid Date");
        assert!(!Timestamp::from_millis(-8.64e15).is_valid());
        assert!(!Timestamp::from_millis(8.64e15 + 1.0).is_valid());
        assert!(!Timestamp::from_millis(f64::NAN).is_valid());
        assert_eq!(Timestamp::from_millis(1.9).epoch_millis(), Some(1));
    }

    #[test]
    fn test_json_conversion() {
        let value = Value::from(json!({"a": [1, 2.5, "x"], "b": null}));
        assert_eq!(value.member("a").and_then(|a| a.member("1")), Some(&Value::Number(2.5)));
        assert_eq!(value.to_json(), json!({"a": [1, 2.5, "x"], "b": null}));
        assert_eq!(Value::Number(f64::NAN).to_json(), json!(null));
    }
}
