#![deny(warnings)]
#![deny(rust_2018_idioms)]
#![deny(unsafe_op_in_unsafe_fn)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

//! # cell-constraint
//!
//! Validation and text-rewriting stages for typed cell values:
//!
//! - [`NumberRange`], [`DateRange`] and [`TemporalRange`] check a value
//!   against [`RangeSpec`] bounds
//! - [`RegexReplace`] rewrites text that fully matches a regex
//! - [`PatternMatch`] requires a full regex match
//! - [`WordForbid`] rejects values containing words from a
//!   [`ForbiddenWordProvider`]
//! - [`Required`] rejects absent values
//!
//! Every stage forwards [`cell_core::Value::Null`] untouched except
//! [`Required`]. Construction problems are reported as [`cell_core::Error`];
//! per-cell problems as [`cell_core::CellFailure`].

pub mod pattern;
pub mod range;
pub mod replace;
pub mod required;
pub mod vocabulary;

pub use pattern::{PATTERN_MATCH_KEY, PatternMatch};
pub use range::{
    DATE_RANGE_KEY, DateRange, NUMBER_RANGE_KEY, NumberRange, RangeSpec, TEMPORAL_RANGE_KEY,
    TemporalRange, VALIDATED_VALUE_VAR,
};
pub use replace::RegexReplace;
pub use required::{REQUIRED_KEY, Required};
pub use vocabulary::{ForbiddenWordProvider, StaticWordProvider, WORD_FORBID_KEY, WordForbid};
