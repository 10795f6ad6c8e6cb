//! Error types for the scheme model

use thiserror::Error;

/// Result type for scheme model operations
pub type Result<T> = std::result::Result<T, SchemeError>;

/// Scheme model errors
#[derive(Error, Debug)]
pub enum SchemeError {
    /// A coerced value failed the validity check of its scheme node
    #[error("{value} is not an instance of {scheme}")]
    TypeCoercion { value: String, scheme: String },

    /// Malformed JSON text handed to the object caster
    #[error("JSON error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid scheme descriptor: {0}")]
    InvalidScheme(String),
}

impl SchemeError {
    /// Returns true for errors raised by scheme validation on read
    pub fn is_type_coercion(&self) -> bool {
        matches!(self, SchemeError::TypeCoercion { .. })
    }
}
