//! Model façade
//!
//! A [`Model`] pairs one scheme tree with one mutable data document. Writes
//! store raw values untouched; reads coerce through the scheme node found at
//! the same path and, when validation is on, reject invalid results.

use std::collections::BTreeMap;

use tracing::{debug, warn};

use crate::coerce::{coerce, is_valid, zero_value};
use crate::config::ModelConfig;
use crate::error::{Result, SchemeError};
use crate::path::{resolve_read, resolve_write};
use crate::scheme::Scheme;
use crate::value::Value;

/// A data document read through a scheme
#[derive(Debug, Clone)]
pub struct Model {
    /// Fixed at construction
    scheme: Scheme,
    /// Root mapping of the stored document
    data: Value,
    validate_scheme: bool,
}

impl Model {
    /// Create a model with an empty document and validation enabled
    pub fn new(scheme: Scheme) -> Self {
        Self {
            scheme,
            data: Value::object(),
            validate_scheme: true,
        }
    }

    /// Create a model whose document is pre-filled with zero values
    pub fn initialized(scheme: Scheme) -> Self {
        let mut model = Self::new(scheme);
        model.init();
        model
    }

    /// Create a model over an existing document
    pub fn with_data(scheme: Scheme, data: BTreeMap<String, Value>) -> Self {
        Self {
            scheme,
            data: Value::Object(data),
            validate_scheme: true,
        }
    }

    /// Create a model following the given configuration
    pub fn with_config(scheme: Scheme, config: &ModelConfig) -> Self {
        let mut model = Self::new(scheme);
        model.validate_scheme = config.model.validate_scheme;
        if config.model.zero_fill {
            model.init();
        }
        model
    }

    pub fn scheme(&self) -> &Scheme {
        &self.scheme
    }

    /// The raw stored document
    pub fn data(&self) -> &Value {
        &self.data
    }

    pub fn validate_scheme(&self) -> bool {
        self.validate_scheme
    }

    pub fn set_validate_scheme(&mut self, enabled: bool) {
        self.validate_scheme = enabled;
    }

    /// Store `value` at `path` as-is, creating intermediate levels
    pub fn set(&mut self, path: &str, value: impl Into<Value>) {
        let value = value.into();
        debug!(path, kind = value.kind(), "set");
        resolve_write(&mut self.data, path, value);
    }

    /// Read the value at `path` coerced through its scheme node.
    ///
    /// Returns `Ok(None)` when nothing is stored there. Fails with
    /// [`SchemeError::TypeCoercion`] when validation is enabled and the
    /// coerced value is invalid, or [`SchemeError::Parse`] on malformed JSON
    /// text under an object caster.
    pub fn get(&self, path: &str) -> Result<Option<Value>> {
        let value = resolve_read(&self.data, path);
        let scheme = self.scheme.lookup(path);
        debug!(path, has_value = value.is_some(), has_scheme = scheme.is_some(), "get");

        let output = coerce(scheme, value)?;

        if self.validate_scheme && !is_valid(scheme, output.as_ref()) {
            let value = output.map(|v| v.to_text()).unwrap_or_default();
            let scheme = scheme.map(|s| s.to_string()).unwrap_or_default();
            warn!(path, %value, %scheme, "coerced value rejected by scheme");
            return Err(SchemeError::TypeCoercion { value, scheme });
        }

        Ok(output)
    }

    /// [`Model::get`] rendered as plain JSON
    pub fn get_json(&self, path: &str) -> Result<Option<serde_json::Value>> {
        Ok(self.get(path)?.map(|value| value.to_json()))
    }

    /// Replace the document with zero values for every declared field
    pub fn init(&mut self) {
        self.data = match &self.scheme {
            scheme @ Scheme::Record(_) => zero_value(scheme),
            _ => Value::object(),
        };
    }
}
