use serde::Serialize;
use std::borrow::Cow;
use strum::Display;
use thiserror::Error;

/// Coarse classification every domain error maps onto.
///
/// Callers pick a response (HTTP status, exit code) from this tag instead of
/// inspecting messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ErrorKind {
    Validation,
    NotFound,
    Conflict,
    Unauthorized,
    Internal,
}

/// Input rejected while building a value object or checking a request.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ValidationError {
    field: Cow<'static, str>,
    message: String,
}

impl ValidationError {
    pub fn new(field: impl Into<Cow<'static, str>>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Shorthand for "`<Label>` is required".
    pub fn required(field: &'static str, label: &str) -> Self {
        Self::new(field, format!("{} is required", label))
    }

    pub fn field(&self) -> &str {
        &self.field
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn kind(&self) -> ErrorKind {
        ErrorKind::Validation
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_is_message() {
        let err = ValidationError::new("sku", "SKU is too short");
        assert_eq!(err.to_string(), "SKU is too short");
        assert_eq!(err.field(), "sku");
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[test]
    fn test_required() {
        let err = ValidationError::required("name", "Name");
        assert_eq!(err.message(), "Name is required");
    }

    #[test]
    fn test_error_kind_display() {
        assert_eq!(ErrorKind::NotFound.to_string(), "not_found");
        assert_eq!(ErrorKind::Conflict.to_string(), "conflict");
    }
}
