#![deny(warnings)]
#![deny(rust_2018_idioms)]
#![deny(unsafe_op_in_unsafe_fn)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

//! # cell-format
//!
//! Locale-aware codecs turning cell text into typed numbers and temporal
//! values and back.
//!
//! ## Example Usage
//!
//! ```rust
//! use cell_core::{CellContext, Value};
//! use cell_format::{FormatSpec, NumberCodec, NumericKind};
//!
//! let spec = FormatSpec::builder("#,##0.00")
//!     .locale("de-DE")
//!     .unwrap()
//!     .build()
//!     .unwrap();
//! let codec = NumberCodec::new(NumericKind::Decimal, spec);
//! let ctx = CellContext::new(1, 1, "amount");
//!
//! let value = codec.decode(Value::text("1.234,50"), &ctx).unwrap();
//! assert_eq!(codec.encode(value, &ctx).unwrap(), Value::text("1.234,50"));
//! ```
//!
//! Number formatters keep mutable working buffers, so each thread builds its
//! own formatter per [`FormatSpec`] on first use (see [`cache`]). Temporal
//! codecs hold only immutable compiled items.

pub mod cache;
pub mod number;
pub mod pattern;
pub mod spec;
pub mod symbols;
pub mod temporal;

pub use cache::{clear_formatter_cache, formatter_cache_len};
pub use number::{
    FORMAT_NUMBER_KEY, FormatNumber, NarrowingError, NumberCodec, NumberError, NumericKind,
    PARSE_NUMBER_KEY, ParseNumber, narrow, to_decimal,
};
pub use pattern::{NumberFormatError, NumberParseError, NumberPattern};
pub use spec::{FormatSpec, FormatSpecBuilder};
pub use symbols::{Currency, LocaleSymbols};
pub use temporal::{
    FORMAT_TEMPORAL_KEY, FormatTemporal, PARSE_TEMPORAL_KEY, ParseTemporal, TemporalCodec,
    TemporalError, TemporalKind,
};
