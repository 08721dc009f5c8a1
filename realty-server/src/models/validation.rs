//! Validation error types

use std::fmt;

/// A request that could not be turned into a typed value
#[derive(Debug, Clone)]
pub enum ValidationError {
    /// JSON body is malformed or misses required fields
    Body { reason: String },

    /// Query string could not be parsed
    Query { reason: String },

    /// Path segment has the wrong shape (e.g. non-integer id)
    Path { field: &'static str, reason: String },
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Body { reason } => write!(f, "invalid request body: {}", reason),
            Self::Query { reason } => write!(f, "invalid query parameters: {}", reason),
            Self::Path { field, reason } => write!(f, "invalid {}: {}", field, reason),
        }
    }
}

impl std::error::Error for ValidationError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = ValidationError::Path {
            field: "property id",
            reason: "expected an integer".into(),
        };
        assert_eq!(err.to_string(), "invalid property id: expected an integer");
    }
}
