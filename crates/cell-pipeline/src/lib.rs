#![deny(warnings)]
#![deny(rust_2018_idioms)]
#![deny(unsafe_op_in_unsafe_fn)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

//! # cell-pipeline
//!
//! Bidirectional per-field processing chains.
//!
//! A field is declared once ([`FieldConfig`]) and resolved at setup into a
//! [`FieldMapping`] holding two immutable [`Chain`]s: decode (text to typed
//! value) and encode (typed value to text). Stage order is fixed per
//! direction by [`ChainBuilder`]:
//!
//! | direction | order |
//! |-----------|-------|
//! | decode    | absence, text rewrite, parse, constraints, custom |
//! | encode    | absence, constraints, format, text rewrite, custom |
//!
//! so bounds are always checked against the typed value, never against
//! formatted text.
//!
//! ## Example Usage
//!
//! ```rust
//! use cell_core::Value;
//! use cell_pipeline::{Components, FieldConfig, FieldKind, MappingConfig, MappingSet};
//!
//! let config = MappingConfig::new(vec![
//!     FieldConfig::new("qty", 1, FieldKind::Int)
//!         .required()
//!         .pattern_format("#,##0")
//!         .range("1", "5,000", true),
//! ]);
//! let mappings = MappingSet::from_config(&config, &Components::new()).unwrap();
//!
//! assert_eq!(mappings.decode_cell(1, Some("1,200"), 1).unwrap(), Value::Int(1200));
//! assert!(mappings.encode_cell(1, Value::Int(6000), 1).is_err());
//! ```

pub mod chain;
pub mod config;
pub mod factory;
pub mod mapping;
pub mod message;
pub mod stage;

pub use chain::{Chain, ChainBuilder, Direction};
pub use config::{
    FieldConfig, FieldKind, ForbiddenWordsConfig, FormatConfig, KindClass, MappingConfig,
    MappingLoader, PatternConfig, RangeConfig, ReplaceConfig,
};
pub use factory::{ComponentFactory, Components, Constructor, Registration, Resources};
pub use mapping::{FieldMapping, MappingSet, RecordOutcome};
pub use message::{FailureReport, MessageCatalog, MessageInterpolator, MessageResolver};
pub use stage::{Phase, Stage};

use thiserror::Error;

/// Errors raised while loading configuration and building mappings.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] cell_core::Error),

    #[error("Field '{field}': {source}")]
    Field {
        field: String,
        #[source]
        source: cell_core::Error,
    },

    #[error("Invalid format: {0}")]
    InvalidFormat(String),

    #[error("IO error during {operation} for '{path}': {message}")]
    Io {
        operation: String,
        path: String,
        message: String,
    },
}

impl Error {
    /// Create an IO error with operation/path context.
    pub fn io(
        operation: impl Into<String>,
        path: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::Io {
            operation: operation.into(),
            path: path.into(),
            message: message.into(),
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::io("io", "<unknown>", e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
