//! Scheme descriptors
//!
//! A scheme is a tree that declares, per field, how stored values are to be
//! coerced on read:
//!
//! ```text
//! {
//!   "num":  "Number",
//!   "tags": ["String"],
//!   "deep": { "when": "Date", "more": { "flag": "Boolean" } }
//! }
//! ```
//!
//! String tags name a [`Caster`], a one-element array wraps an element
//! scheme, and an object declares a record of named child schemes.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{Result, SchemeError};
use crate::path::{array_index, PathNode, PATH_SEPARATOR};

/// Primitive coercion rule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Caster {
    /// String conversion
    Text,
    /// Numeric conversion, invalid when the result is NaN
    Number,
    /// Truthiness
    Boolean,
    /// Date parsing, invalid on an unparseable date
    DateTime,
    /// JSON text is parsed, anything else is wrapped as an object
    Object,
    /// Generic sequence: wraps non-array values, leaves elements untouched
    Array,
}

impl Caster {
    pub const ALL: [Caster; 6] = [
        Caster::Text,
        Caster::Number,
        Caster::Boolean,
        Caster::DateTime,
        Caster::Object,
        Caster::Array,
    ];

    /// Canonical tag used in descriptors
    pub fn tag(&self) -> &'static str {
        match self {
            Caster::Text => "String",
            Caster::Number => "Number",
            Caster::Boolean => "Boolean",
            Caster::DateTime => "Date",
            Caster::Object => "Object",
            Caster::Array => "Array",
        }
    }

    /// Parse a descriptor tag, accepting the aliases `Text` and `DateTime`
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "Text" => Some(Caster::Text),
            "DateTime" => Some(Caster::DateTime),
            _ => Self::ALL.into_iter().find(|caster| caster.tag() == tag),
        }
    }
}

impl fmt::Display for Caster {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// A node of the scheme tree
#[derive(Debug, Clone, PartialEq)]
pub enum Scheme {
    Caster(Caster),
    /// Every element coerced to the inner scheme
    ArrayOf(Box<Scheme>),
    /// Nested object with named child schemes
    Record(BTreeMap<String, Scheme>),
}

impl Scheme {
    pub fn text() -> Self {
        Scheme::Caster(Caster::Text)
    }

    pub fn number() -> Self {
        Scheme::Caster(Caster::Number)
    }

    pub fn boolean() -> Self {
        Scheme::Caster(Caster::Boolean)
    }

    pub fn date_time() -> Self {
        Scheme::Caster(Caster::DateTime)
    }

    pub fn object() -> Self {
        Scheme::Caster(Caster::Object)
    }

    pub fn array() -> Self {
        Scheme::Caster(Caster::Array)
    }

    pub fn array_of(element: Scheme) -> Self {
        Scheme::ArrayOf(Box::new(element))
    }

    /// Build a record node. Field names containing `.` can never be reached
    /// by a path; use [`Scheme::from_json`] to have them rejected.
    pub fn record<K, I>(fields: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, Scheme)>,
    {
        Scheme::Record(
            fields
                .into_iter()
                .map(|(name, scheme)| (name.into(), scheme))
                .collect(),
        )
    }

    /// Parse a JSON descriptor
    pub fn from_json(json: &serde_json::Value) -> Result<Self> {
        use serde_json::Value as Json;

        match json {
            Json::String(tag) => Caster::from_tag(tag)
                .map(Scheme::Caster)
                .ok_or_else(|| SchemeError::InvalidScheme(format!("unknown caster '{}'", tag))),
            Json::Array(items) => match items.as_slice() {
                [element] => Ok(Scheme::array_of(Scheme::from_json(element)?)),
                _ => Err(SchemeError::InvalidScheme(format!(
                    "array descriptor must hold exactly one element scheme, found {}",
                    items.len()
                ))),
            },
            Json::Object(fields) => {
                let mut record = BTreeMap::new();
                for (name, child) in fields {
                    if name.contains(PATH_SEPARATOR) {
                        return Err(SchemeError::InvalidScheme(format!(
                            "field name '{}' contains '{}'",
                            name, PATH_SEPARATOR
                        )));
                    }
                    record.insert(name.clone(), Scheme::from_json(child)?);
                }
                Ok(Scheme::Record(record))
            }
            other => Err(SchemeError::InvalidScheme(format!(
                "expected a caster tag, array or object, found {}",
                other
            ))),
        }
    }

    /// Parse a JSON descriptor from text
    pub fn from_json_str(text: &str) -> Result<Self> {
        let json: serde_json::Value = serde_json::from_str(text)?;
        Self::from_json(&json)
    }

    /// Render back into a JSON descriptor
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Scheme::Caster(caster) => serde_json::Value::String(caster.tag().to_string()),
            Scheme::ArrayOf(element) => serde_json::Value::Array(vec![element.to_json()]),
            Scheme::Record(fields) => serde_json::Value::Object(
                fields
                    .iter()
                    .map(|(name, scheme)| (name.clone(), scheme.to_json()))
                    .collect(),
            ),
        }
    }

    /// Scheme node at `path`, if the tree declares one
    pub fn lookup(&self, path: &str) -> Option<&Scheme> {
        crate::path::resolve_read(self, path)
    }
}

impl PathNode for Scheme {
    fn child(&self, key: &str) -> Option<&Self> {
        match self {
            Scheme::Record(fields) => fields.get(key),
            Scheme::ArrayOf(element) if array_index(key).is_some() => Some(element.as_ref()),
            _ => None,
        }
    }
}

impl fmt::Display for Scheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scheme::Caster(caster) => write!(f, "{}", caster),
            Scheme::ArrayOf(element) => write!(f, "[{}]", element),
            Scheme::Record(fields) => {
                f.write_str("{")?;
                for (i, (name, scheme)) in fields.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}: {}", name, scheme)?;
                }
                f.write_str("}")
            }
        }
    }
}

impl From<Caster> for Scheme {
    fn from(caster: Caster) -> Self {
        Scheme::Caster(caster)
    }
}

impl Serialize for Scheme {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Scheme {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let json = serde_json::Value::deserialize(deserializer)?;
        Scheme::from_json(&json).map_err(serde::de::Error::custom)
    }
}
