//! Validation errors for incoming payloads.

use thiserror::Error;

/// A payload failed validation.
///
/// Each variant names the offending field so the API can report it back to
/// the form that submitted it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A required field was absent or null.
    #[error("missing required field `{0}`")]
    MissingField(String),

    /// A required text field was empty or whitespace.
    #[error("field `{0}` must not be blank")]
    Blank(String),

    /// A field had a value outside its allowed set or format.
    #[error("invalid value for `{field}`: {message}")]
    InvalidValue { field: String, message: String },

    /// A list filter is not supported by the target entity.
    #[error("unsupported filter `{filter}` for {entity}")]
    UnsupportedFilter { entity: String, filter: String },

    /// The payload could not be decoded at all.
    #[error("malformed payload: {0}")]
    Malformed(String),
}

impl ValidationError {
    /// A value outside a closed enumeration.
    pub fn invalid_enum(field: &str, value: &str, allowed: &[&str]) -> Self {
        Self::InvalidValue {
            field: field.to_string(),
            message: format!("'{}' is not one of: {}", value, allowed.join(", ")),
        }
    }

    /// A field value with a free-form reason.
    pub fn invalid(field: &str, message: impl Into<String>) -> Self {
        Self::InvalidValue {
            field: field.to_string(),
            message: message.into(),
        }
    }

    /// The field this error refers to, if any.
    pub fn field(&self) -> Option<&str> {
        match self {
            Self::MissingField(f) | Self::Blank(f) => Some(f),
            Self::InvalidValue { field, .. } => Some(field),
            Self::UnsupportedFilter { filter, .. } => Some(filter),
            Self::Malformed(_) => None,
        }
    }
}
