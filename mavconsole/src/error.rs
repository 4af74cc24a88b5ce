//! Error types for configuration and custom display expressions.
//!
//! Message dispatch itself is infallible; these errors surface only from
//! APIs a host calls explicitly (loading settings, registering display
//! items) and from expression evaluation, whose failures the engine turns
//! into a placeholder.

use thiserror::Error;

/// Errors loading or interpreting console settings.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The settings file could not be read or parsed.
    #[error("Failed to load settings: {0}")]
    Load(#[from] ini::Error),

    /// Settings text is not valid INI.
    #[error("Invalid INI: {0}")]
    Parse(#[from] ini::ParseError),

    /// A setting has a value of the wrong form.
    #[error("Invalid value for {key}: '{value}'")]
    InvalidValue { key: String, value: String },

    /// A display item section lacks a required key.
    #[error("Display item '{id}' is missing '{key}'")]
    MissingKey { id: String, key: &'static str },

    /// A display item expression does not parse.
    #[error("Display item '{id}': {source}")]
    DisplayItem {
        id: String,
        #[source]
        source: ExpressionError,
    },
}

impl ConfigError {
    /// Shorthand for [`ConfigError::InvalidValue`].
    pub fn invalid(key: impl Into<String>, value: impl Into<String>) -> Self {
        ConfigError::InvalidValue {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// Errors parsing, evaluating or formatting a display expression.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ExpressionError {
    /// Syntax error at a byte offset.
    #[error("Syntax error at {position}: {message}")]
    Parse { position: usize, message: String },

    /// No message of the referenced type has been received.
    #[error("No {0} message received")]
    MissingMessage(String),

    /// The message has no such field.
    #[error("{message} has no field '{field}'")]
    MissingField { message: String, field: String },

    /// The field exists but is not a number.
    #[error("{message}.{field} is not numeric")]
    NonNumeric { message: String, field: String },

    #[error("Division by zero")]
    DivisionByZero,

    #[error("Unknown function '{0}'")]
    UnknownFunction(String),

    /// A function was called with the wrong number of arguments.
    #[error("{function}() takes {expected} argument(s), got {found}")]
    Arity {
        function: String,
        expected: &'static str,
        found: usize,
    },

    /// The display format string is unusable.
    #[error("Bad format: {0}")]
    Format(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_display() {
        let err = ConfigError::invalid("units.height", "cubits");
        assert!(err.to_string().contains("units.height"));
        assert!(err.to_string().contains("cubits"));
    }

    #[test]
    fn test_display_item_error_has_source() {
        use std::error::Error as _;

        let err = ConfigError::DisplayItem {
            id: "Batt".to_string(),
            source: ExpressionError::DivisionByZero,
        };
        assert!(err.to_string().contains("Batt"));
        assert!(err.source().is_some());
    }

    #[test]
    fn test_expression_error_display() {
        let err = ExpressionError::MissingField {
            message: "VFR_HUD".to_string(),
            field: "speed".to_string(),
        };
        assert_eq!(err.to_string(), "VFR_HUD has no field 'speed'");
    }
}
