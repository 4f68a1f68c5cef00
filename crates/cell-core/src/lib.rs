#![deny(warnings)]
#![deny(rust_2018_idioms)]
#![deny(unsafe_op_in_unsafe_fn)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

//! # cell-core
//!
//! Typed cell values, processing context and failure model shared by every
//! stage of the cell pipeline.
//!
//! Two kinds of problems are kept apart here: [`Error`] covers configuration
//! mistakes detected while a chain is being built, while [`CellFailure`] is a
//! per-cell value returned to the caller during processing.

/// Immutable per-cell context and field identity.
pub mod context;
/// Per-cell failure model and ordered message variables.
pub mod failure;
/// Stage execution contract and value printers.
pub mod processor;
/// Typed cell values.
pub mod value;

pub use context::{CellContext, FieldIdentity};
pub use failure::{CellFailure, FailureKind, MessageVars, Outcome};
pub use processor::{CellProcessor, DisplayPrinter, FnPrinter, ValuePrinter};
pub use value::Value;

use thiserror::Error;

/// Configuration errors raised while building stages and chains.
///
/// These never occur while a cell is being processed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("Invalid bounds: max ({max}) should not be < min ({min})")]
    InvalidBounds { min: String, max: String },

    #[error("Missing required argument '{0}'")]
    MissingArgument(String),

    #[error("Invalid pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },

    #[error("Invalid regex '{pattern}': {reason}")]
    InvalidRegex { pattern: String, reason: String },

    #[error("Unknown locale '{0}'")]
    UnknownLocale(String),

    #[error("Invalid value '{value}' for {target}: {reason}")]
    InvalidValue {
        value: String,
        target: String,
        reason: String,
    },

    #[error("Component '{0}' is not registered")]
    UnknownComponent(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Build an invalid-bounds error from displayable bounds.
    pub fn invalid_bounds(min: impl ToString, max: impl ToString) -> Self {
        Self::InvalidBounds {
            min: min.to_string(),
            max: max.to_string(),
        }
    }

    /// Build a missing-argument error.
    pub fn missing(argument: impl Into<String>) -> Self {
        Self::MissingArgument(argument.into())
    }

    /// Build an invalid-pattern error.
    pub fn invalid_pattern(pattern: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidPattern {
            pattern: pattern.into(),
            reason: reason.into(),
        }
    }

    /// Build an invalid-regex error.
    pub fn invalid_regex(pattern: impl Into<String>, reason: impl ToString) -> Self {
        Self::InvalidRegex {
            pattern: pattern.into(),
            reason: reason.to_string(),
        }
    }

    /// Build an invalid-value error for a target type or field.
    pub fn invalid_value(
        value: impl Into<String>,
        target: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::InvalidValue {
            value: value.into(),
            target: target.into(),
            reason: reason.into(),
        }
    }

    /// Build a generic configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }
}

/// Crate-local result type for configuration-time operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_bounds_message() {
        let err = Error::invalid_bounds(10, 5);
        assert_eq!(
            err.to_string(),
            "Invalid bounds: max (5) should not be < min (10)"
        );
    }

    #[test]
    fn test_missing_argument_message() {
        let err = Error::missing("printer");
        assert_eq!(err.to_string(), "Missing required argument 'printer'");
    }
}
