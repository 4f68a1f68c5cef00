//! Locale-aware numeric parsing, narrowing and formatting

use crate::cache::with_formatter;
use crate::pattern::{NumberFormatError, NumberParseError, NumberPattern, Symbols, parse_plain};
use crate::spec::FormatSpec;
use crate::symbols::LocaleSymbols;
use cell_core::{CellContext, CellFailure, CellProcessor, Outcome, Value, ValuePrinter};
use rust_decimal::Decimal;
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::str::FromStr;
use std::sync::Arc;
use thiserror::Error;
use tracing::trace;

/// Message key for text that cannot be parsed as a number.
pub const PARSE_NUMBER_KEY: &str = "cell.format.ParseNumber.violated";
/// Message key for values that cannot be rendered as a number.
pub const FORMAT_NUMBER_KEY: &str = "cell.format.FormatNumber.violated";

/// Target numeric type of a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NumericKind {
    Byte,
    Short,
    Int,
    Long,
    BigInteger,
    Float,
    Double,
    Decimal,
}

impl NumericKind {
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Byte => "byte",
            Self::Short => "short",
            Self::Int => "int",
            Self::Long => "long",
            Self::BigInteger => "big_integer",
            Self::Float => "float",
            Self::Double => "double",
            Self::Decimal => "decimal",
        }
    }

    /// Whether the kind holds whole numbers only.
    #[must_use]
    pub fn is_integral(self) -> bool {
        matches!(
            self,
            Self::Byte | Self::Short | Self::Int | Self::Long | Self::BigInteger
        )
    }

    /// Whether `value` carries this kind.
    #[must_use]
    pub fn matches(self, value: &Value) -> bool {
        matches!(
            (self, value),
            (Self::Byte, Value::Byte(_))
                | (Self::Short, Value::Short(_))
                | (Self::Int, Value::Int(_))
                | (Self::Long, Value::Long(_))
                | (Self::BigInteger, Value::BigInteger(_))
                | (Self::Float, Value::Float(_))
                | (Self::Double, Value::Double(_))
                | (Self::Decimal, Value::Decimal(_))
        )
    }
}

/// Why a decimal could not be narrowed to the target type.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum NarrowingError {
    #[error("fractional part would be lost")]
    Precision,
    #[error("value is out of range for the target type")]
    Overflow,
}

impl NarrowingError {
    #[must_use]
    pub fn reason(self) -> &'static str {
        match self {
            Self::Precision => "precision",
            Self::Overflow => "overflow",
        }
    }
}

/// Narrow a parsed decimal to `kind`.
///
/// Lenient narrowing truncates toward zero and wraps to the target width the
/// way a primitive cast does. Strict narrowing rejects any fractional part and
/// any magnitude outside the target range.
///
/// # Errors
///
/// Returns a [`NarrowingError`] when strict narrowing is not exact.
#[allow(clippy::cast_possible_truncation)]
pub fn narrow(value: Decimal, kind: NumericKind, lenient: bool) -> Result<Value, NarrowingError> {
    if kind.is_integral() {
        if !lenient && !value.fract().is_zero() {
            return Err(NarrowingError::Precision);
        }
        let whole = value.trunc().to_i128().ok_or(NarrowingError::Overflow)?;
        return if lenient {
            Ok(match kind {
                NumericKind::Byte => Value::Byte(whole as i8),
                NumericKind::Short => Value::Short(whole as i16),
                NumericKind::Int => Value::Int(whole as i32),
                NumericKind::Long => Value::Long(whole as i64),
                _ => Value::BigInteger(whole),
            })
        } else {
            let overflow = |_| NarrowingError::Overflow;
            Ok(match kind {
                NumericKind::Byte => Value::Byte(i8::try_from(whole).map_err(overflow)?),
                NumericKind::Short => Value::Short(i16::try_from(whole).map_err(overflow)?),
                NumericKind::Int => Value::Int(i32::try_from(whole).map_err(overflow)?),
                NumericKind::Long => Value::Long(i64::try_from(whole).map_err(overflow)?),
                _ => Value::BigInteger(whole),
            })
        };
    }

    match kind {
        NumericKind::Float => value
            .to_f32()
            .map(Value::Float)
            .ok_or(NarrowingError::Overflow),
        NumericKind::Double => value
            .to_f64()
            .map(Value::Double)
            .ok_or(NarrowingError::Overflow),
        _ => Ok(Value::Decimal(value)),
    }
}

/// Convert a numeric value to a decimal.
///
/// Returns `None` for non-numeric values and for floats without a finite
/// decimal form.
#[must_use]
pub fn to_decimal(value: &Value) -> Option<Decimal> {
    match value {
        Value::Byte(n) => Some(Decimal::from(*n)),
        Value::Short(n) => Some(Decimal::from(*n)),
        Value::Int(n) => Some(Decimal::from(*n)),
        Value::Long(n) => Some(Decimal::from(*n)),
        Value::BigInteger(n) => Decimal::from_i128(*n),
        Value::Float(n) => Decimal::from_str(&n.to_string()).ok(),
        Value::Double(n) => Decimal::from_str(&n.to_string()).ok(),
        Value::Decimal(d) => Some(*d),
        _ => None,
    }
}

fn float_value(value: &Value) -> Option<f64> {
    match value {
        // Shortest f32 digits, so 3e38 renders as 3 followed by zeros.
        Value::Float(n) => Some(n.to_string().parse().unwrap_or(f64::from(*n))),
        Value::Double(n) => Some(*n),
        _ => None,
    }
}

/// Failure while parsing number text.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NumberError {
    #[error("{0}")]
    Parse(#[from] NumberParseError),
    #[error("{0}")]
    Narrowing(#[from] NarrowingError),
}

impl NumberError {
    fn reason(&self) -> &'static str {
        match self {
            Self::Parse(_) => "parse",
            Self::Narrowing(n) => n.reason(),
        }
    }
}

/// Per-thread formatter state for one [`FormatSpec`].
struct NumberFormatter {
    pattern: Arc<NumberPattern>,
    symbols: LocaleSymbols,
    currency_symbol: String,
    currency_code: String,
    buffer: RefCell<String>,
}

impl NumberFormatter {
    fn new(spec: &FormatSpec) -> Self {
        let symbols = spec.symbols().cloned().unwrap_or_default();
        let (currency_symbol, currency_code) = match spec.currency() {
            Some(currency) => (currency.symbol.clone(), currency.code.clone()),
            None => (
                symbols.currency_symbol.clone(),
                symbols.currency_code.clone(),
            ),
        };
        Self {
            pattern: Arc::clone(spec.compiled()),
            symbols,
            currency_symbol,
            currency_code,
            buffer: RefCell::new(String::new()),
        }
    }

    fn symbols(&self) -> Symbols<'_> {
        Symbols {
            locale: &self.symbols,
            currency_symbol: &self.currency_symbol,
            currency_code: &self.currency_code,
        }
    }

    fn parse(&self, text: &str) -> Result<Decimal, NumberParseError> {
        let mut buffer = self.buffer.borrow_mut();
        self.pattern.parse_with(text, &self.symbols(), &mut buffer)
    }

    fn format(&self, value: &Value) -> Result<String, NumberFormatError> {
        let mut buffer = self.buffer.borrow_mut();
        let symbols = self.symbols();
        buffer.clear();
        let rendered = match to_decimal(value) {
            Some(decimal) => self.pattern.format_into(decimal, &symbols, &mut buffer),
            None => Err(NumberFormatError::NotNumeric(value.type_name())),
        };
        // Floats outside the decimal range still have a textual form.
        let rendered = match (rendered, float_value(value)) {
            (Err(_), Some(float)) => {
                buffer.clear();
                self.pattern.format_float_into(float, &symbols, &mut buffer)
            }
            (rendered, _) => rendered,
        };
        rendered.map(|()| buffer.clone())
    }
}

/// Numeric codec for one field: parses text to a typed number and renders
/// typed numbers back to text.
#[derive(Debug, Clone)]
pub struct NumberCodec {
    kind: NumericKind,
    spec: Option<FormatSpec>,
}

impl NumberCodec {
    /// Codec using a locale-aware format.
    #[must_use]
    pub fn new(kind: NumericKind, spec: FormatSpec) -> Self {
        Self {
            kind,
            spec: Some(spec),
        }
    }

    /// Codec using plain decimal notation and strict narrowing.
    #[must_use]
    pub fn plain(kind: NumericKind) -> Self {
        Self { kind, spec: None }
    }

    #[must_use]
    pub fn kind(&self) -> NumericKind {
        self.kind
    }

    #[must_use]
    pub fn spec(&self) -> Option<&FormatSpec> {
        self.spec.as_ref()
    }

    #[must_use]
    pub fn is_lenient(&self) -> bool {
        self.spec.as_ref().is_some_and(FormatSpec::is_lenient)
    }

    /// Parse text into this codec's numeric kind.
    ///
    /// # Errors
    ///
    /// Returns a [`NumberError`] if the text is not a number or cannot be
    /// narrowed.
    pub fn parse_text(&self, text: &str) -> Result<Value, NumberError> {
        let decimal = match &self.spec {
            Some(spec) => with_formatter(
                spec.id(),
                || NumberFormatter::new(spec),
                |formatter| formatter.parse(text),
            )?,
            None => parse_plain(text)?,
        };
        Ok(narrow(decimal, self.kind, self.is_lenient())?)
    }

    /// Render a numeric value.
    ///
    /// # Errors
    ///
    /// Returns a [`NumberFormatError`] for non-numeric values, non-finite
    /// floats and `%`/`‰` scaling that overflows.
    pub fn format_value(&self, value: &Value) -> Result<String, NumberFormatError> {
        match &self.spec {
            Some(spec) => with_formatter(
                spec.id(),
                || NumberFormatter::new(spec),
                |formatter| formatter.format(value),
            ),
            None if value.is_numeric() => Ok(value.to_string()),
            None => Err(NumberFormatError::NotNumeric(value.type_name())),
        }
    }

    fn describe(&self, failure: CellFailure) -> CellFailure {
        let mut failure = failure.var("type", self.kind.name());
        if let Some(spec) = &self.spec {
            failure = failure
                .var("pattern", spec.pattern())
                .var("lenient", spec.is_lenient());
            if let Some(symbols) = spec.symbols() {
                failure = failure.var("locale", symbols.locale.as_str());
            }
            if let Some(currency) = spec.currency() {
                failure = failure.var("currency", currency.code.as_str());
            }
        }
        failure
    }

    /// Decode a cell: text in, typed number out.
    ///
    /// # Errors
    ///
    /// Returns a conversion failure for unparseable text or non-text input.
    pub fn decode(&self, value: Value, context: &CellContext) -> Outcome<Value> {
        match value {
            Value::Null => Ok(Value::Null),
            Value::Text(text) => self.parse_text(&text).map_err(|err| {
                trace!(field = context.field(), %err, "number parse failed");
                self.describe(CellFailure::conversion(PARSE_NUMBER_KEY, context))
                    .var("reason", err.reason())
                    .message(format!(
                        "'{text}' could not be parsed as {}: {err}",
                        self.kind.name()
                    ))
                    .rejected(text)
            }),
            other => Err(self
                .describe(CellFailure::conversion(PARSE_NUMBER_KEY, context))
                .var("reason", "type")
                .message(format!("expected text but found {}", other.type_name()))
                .rejected(other)),
        }
    }

    /// Encode a cell: typed number in, text out.
    ///
    /// # Errors
    ///
    /// Returns a conversion failure for non-numeric input and for values the
    /// pattern cannot render.
    pub fn encode(&self, value: Value, context: &CellContext) -> Outcome<Value> {
        if value.is_null() {
            return Ok(Value::Null);
        }
        match self.format_value(&value) {
            Ok(text) => Ok(Value::Text(text)),
            Err(err) => {
                trace!(field = context.field(), %err, "number format failed");
                Err(self
                    .describe(CellFailure::conversion(FORMAT_NUMBER_KEY, context))
                    .var("reason", err.reason())
                    .message(format!(
                        "{} value '{value}' could not be formatted as {}: {err}",
                        value.type_name(),
                        self.kind.name()
                    ))
                    .rejected(value))
            }
        }
    }
}

impl ValuePrinter for NumberCodec {
    fn print(&self, value: &Value) -> String {
        self.format_value(value)
            .unwrap_or_else(|_| value.to_string())
    }
}

/// Decode stage parsing text with a [`NumberCodec`].
#[derive(Debug, Clone)]
pub struct ParseNumber {
    codec: NumberCodec,
}

impl ParseNumber {
    #[must_use]
    pub fn new(codec: NumberCodec) -> Self {
        Self { codec }
    }

    #[must_use]
    pub fn codec(&self) -> &NumberCodec {
        &self.codec
    }
}

impl CellProcessor for ParseNumber {
    fn name(&self) -> &str {
        "ParseNumber"
    }

    fn process(&self, value: Value, context: &CellContext) -> Outcome<Value> {
        self.codec.decode(value, context)
    }
}

/// Encode stage rendering numbers with a [`NumberCodec`].
#[derive(Debug, Clone)]
pub struct FormatNumber {
    codec: NumberCodec,
}

impl FormatNumber {
    #[must_use]
    pub fn new(codec: NumberCodec) -> Self {
        Self { codec }
    }

    #[must_use]
    pub fn codec(&self) -> &NumberCodec {
        &self.codec
    }
}

impl CellProcessor for FormatNumber {
    fn name(&self) -> &str {
        "FormatNumber"
    }

    fn process(&self, value: Value, context: &CellContext) -> Outcome<Value> {
        self.codec.encode(value, context)
    }
}
