//! Error types for the form engine

use thiserror::Error;

/// Result type for form operations
pub type Result<T> = std::result::Result<T, FormError>;

/// Errors that can occur while configuring or driving a form
#[derive(Debug, Error)]
pub enum FormError {
    /// No field with this name exists on the form
    #[error("unknown field: {name}")]
    UnknownField { name: String },

    /// A schema property collides with the reserved submission error path
    #[error("property '{name}' uses the reserved submission error path")]
    ReservedPath { name: String },

    /// Default values could not be converted into a record
    #[error("default values must serialize to an object, got {kind}")]
    Defaults { kind: String },

    /// JSON (de)serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_field_display() {
        let err = FormError::UnknownField {
            name: "title".into(),
        };
        assert_eq!(err.to_string(), "unknown field: title");
    }

    #[test]
    fn test_reserved_path_display() {
        let err = FormError::ReservedPath {
            name: "_submit".into(),
        };
        assert!(err.to_string().contains("_submit"));
        assert!(err.to_string().contains("reserved"));
    }

    #[test]
    fn test_json_error_converts() {
        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err: FormError = json_err.into();
        assert!(matches!(err, FormError::Json(_)));
    }
}
