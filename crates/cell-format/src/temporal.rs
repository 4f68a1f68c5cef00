//! Calendar and clock value codecs
//!
//! Patterns use strftime syntax and are compiled once into chrono format
//! items. Compiled items are immutable, so one codec can be shared freely
//! across threads without a per-thread cache.

use cell_core::{CellContext, CellFailure, CellProcessor, Error, Outcome, Result, Value, ValuePrinter};
use chrono::format::{Item, Parsed, StrftimeItems, parse};
use chrono::{Days, FixedOffset, NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use std::fmt::Write;
use std::sync::Arc;
use thiserror::Error;
use tracing::trace;

/// Message key for text that cannot be parsed as a temporal value.
pub const PARSE_TEMPORAL_KEY: &str = "cell.format.ParseTemporal.violated";
/// Message key for values that cannot be rendered with the pattern.
pub const FORMAT_TEMPORAL_KEY: &str = "cell.format.FormatTemporal.violated";

/// Target temporal type of a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TemporalKind {
    Date,
    Time,
    DateTime,
    OffsetDateTime,
}

impl TemporalKind {
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Date => "date",
            Self::Time => "time",
            Self::DateTime => "date_time",
            Self::OffsetDateTime => "offset_date_time",
        }
    }

    /// Pattern used when a field configures none.
    #[must_use]
    pub fn default_pattern(self) -> &'static str {
        match self {
            Self::Date => "%Y-%m-%d",
            Self::Time => "%H:%M:%S",
            Self::DateTime => "%Y-%m-%d %H:%M:%S",
            Self::OffsetDateTime => "%Y-%m-%dT%H:%M:%S%:z",
        }
    }

    #[must_use]
    pub fn matches(self, value: &Value) -> bool {
        matches!(
            (self, value),
            (Self::Date, Value::Date(_))
                | (Self::Time, Value::Time(_))
                | (Self::DateTime, Value::DateTime(_))
                | (Self::OffsetDateTime, Value::OffsetDateTime(_))
        )
    }

    fn sample(self) -> Value {
        let date = NaiveDate::from_ymd_opt(2000, 1, 1).unwrap_or_default();
        let midnight = NaiveTime::from_hms_opt(0, 0, 0).unwrap_or_default();
        let datetime = date.and_time(midnight);
        match self {
            Self::Date => Value::Date(date),
            Self::Time => Value::Time(midnight),
            Self::DateTime => Value::DateTime(datetime),
            Self::OffsetDateTime => Value::OffsetDateTime(datetime.and_utc().fixed_offset()),
        }
    }
}

/// Failure while parsing temporal text.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TemporalError {
    #[error("input is empty")]
    Empty,
    #[error("{0}")]
    Parse(#[from] chrono::format::ParseError),
}

/// Codec for one temporal field.
#[derive(Debug, Clone)]
pub struct TemporalCodec {
    kind: TemporalKind,
    pattern: String,
    items: Arc<Vec<Item<'static>>>,
    lenient: bool,
}

impl TemporalCodec {
    /// Strict codec using the kind's default pattern.
    ///
    /// # Errors
    ///
    /// Same as [`TemporalCodec::with_pattern`].
    pub fn new(kind: TemporalKind) -> Result<Self> {
        Self::with_pattern(kind, kind.default_pattern())
    }

    /// Codec for an explicit strftime pattern.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidPattern`] if the pattern is empty, malformed or
    /// asks for fields the kind does not carry.
    pub fn with_pattern(kind: TemporalKind, pattern: &str) -> Result<Self> {
        if pattern.is_empty() {
            return Err(Error::invalid_pattern(pattern, "pattern is empty"));
        }
        let items = StrftimeItems::new(pattern)
            .parse_to_owned()
            .map_err(|err| Error::invalid_pattern(pattern, err.to_string()))?;
        let codec = Self {
            kind,
            pattern: pattern.to_string(),
            items: Arc::new(items),
            lenient: false,
        };
        if codec.render(&kind.sample()).is_none() {
            return Err(Error::invalid_pattern(
                pattern,
                format!("pattern cannot render a {}", kind.name()),
            ));
        }
        Ok(codec)
    }

    /// Roll day-of-month overflow into the following month when parsing.
    #[must_use]
    pub fn lenient(mut self, lenient: bool) -> Self {
        self.lenient = lenient;
        self
    }

    #[must_use]
    pub fn kind(&self) -> TemporalKind {
        self.kind
    }

    #[must_use]
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    #[must_use]
    pub fn is_lenient(&self) -> bool {
        self.lenient
    }

    /// Parse text into this codec's kind.
    ///
    /// # Errors
    ///
    /// Returns a [`TemporalError`] if the text does not follow the pattern or
    /// names an impossible instant.
    pub fn parse_text(&self, text: &str) -> std::result::Result<Value, TemporalError> {
        if text.is_empty() {
            return Err(TemporalError::Empty);
        }
        let mut parsed = Parsed::new();
        parse(&mut parsed, text, self.items.iter())?;

        let strict = match self.kind {
            TemporalKind::Date => parsed.to_naive_date().map(Value::Date),
            TemporalKind::Time => parsed.to_naive_time().map(Value::Time),
            TemporalKind::DateTime => parsed
                .to_naive_datetime_with_offset(0)
                .map(Value::DateTime),
            TemporalKind::OffsetDateTime => parsed.to_datetime().map(Value::OffsetDateTime),
        };
        match strict {
            Ok(value) => Ok(value),
            Err(err) if self.lenient => self
                .roll_over(&parsed)
                .ok_or(TemporalError::Parse(err)),
            Err(err) => Err(TemporalError::Parse(err)),
        }
    }

    /// Rebuild a date whose day overflows its month by counting the excess
    /// days into the following month.
    fn roll_over(&self, parsed: &Parsed) -> Option<Value> {
        let (year, month, day) = (parsed.year?, parsed.month?, parsed.day?);
        let date = NaiveDate::from_ymd_opt(year, month, 1)?
            .checked_add_days(Days::new(u64::from(day.checked_sub(1)?)))?;
        trace!(year, month, day, %date, "rolled over day of month");
        match self.kind {
            TemporalKind::Date => Some(Value::Date(date)),
            TemporalKind::Time => None,
            TemporalKind::DateTime => Some(Value::DateTime(
                date.and_time(parsed.to_naive_time().ok()?),
            )),
            TemporalKind::OffsetDateTime => {
                let offset = FixedOffset::east_opt(parsed.offset?)?;
                let local = date.and_time(parsed.to_naive_time().ok()?);
                local
                    .and_local_timezone(offset)
                    .single()
                    .map(Value::OffsetDateTime)
            }
        }
    }

    /// Render a value of this codec's kind; `None` on type mismatch.
    #[must_use]
    pub fn render(&self, value: &Value) -> Option<String> {
        let items = self.items.iter();
        let mut out = String::new();
        let written = match value {
            Value::Date(d) if self.kind == TemporalKind::Date => {
                write!(out, "{}", d.format_with_items(items))
            }
            Value::Time(t) if self.kind == TemporalKind::Time => {
                write!(out, "{}", t.format_with_items(items))
            }
            Value::DateTime(dt) if self.kind == TemporalKind::DateTime => {
                write!(out, "{}", dt.format_with_items(items))
            }
            Value::OffsetDateTime(dt) if self.kind == TemporalKind::OffsetDateTime => {
                write!(out, "{}", dt.format_with_items(items))
            }
            _ => return None,
        };
        written.ok().map(|()| out)
    }

    fn describe(&self, failure: CellFailure) -> CellFailure {
        failure
            .var("pattern", self.pattern.as_str())
            .var("type", self.kind.name())
            .var("lenient", self.lenient)
    }

    /// Decode a cell: text in, temporal value out.
    ///
    /// # Errors
    ///
    /// Returns a conversion failure for text that does not parse.
    pub fn decode(&self, value: Value, context: &CellContext) -> Outcome<Value> {
        match value {
            Value::Null => Ok(Value::Null),
            Value::Text(text) => self.parse_text(&text).map_err(|err| {
                trace!(field = context.field(), %err, "temporal parse failed");
                self.describe(CellFailure::conversion(PARSE_TEMPORAL_KEY, context))
                    .message(format!(
                        "'{text}' could not be parsed as {} with pattern '{}': {err}",
                        self.kind.name(),
                        self.pattern
                    ))
                    .rejected(text)
            }),
            other => Err(self
                .describe(CellFailure::conversion(PARSE_TEMPORAL_KEY, context))
                .message(format!("expected text but found {}", other.type_name()))
                .rejected(other)),
        }
    }

    /// Encode a cell: temporal value in, text out.
    ///
    /// # Errors
    ///
    /// Returns a conversion failure when the value is not of this kind.
    pub fn encode(&self, value: Value, context: &CellContext) -> Outcome<Value> {
        if value.is_null() {
            return Ok(Value::Null);
        }
        match self.render(&value) {
            Some(text) => Ok(Value::Text(text)),
            None => Err(self
                .describe(CellFailure::conversion(FORMAT_TEMPORAL_KEY, context))
                .message(format!(
                    "{} value could not be formatted as {}",
                    value.type_name(),
                    self.kind.name()
                ))
                .rejected(value)),
        }
    }
}

impl ValuePrinter for TemporalCodec {
    fn print(&self, value: &Value) -> String {
        self.render(value).unwrap_or_else(|| value.to_string())
    }
}

/// Decode stage parsing text with a [`TemporalCodec`].
#[derive(Debug, Clone)]
pub struct ParseTemporal {
    codec: TemporalCodec,
}

impl ParseTemporal {
    #[must_use]
    pub fn new(codec: TemporalCodec) -> Self {
        Self { codec }
    }

    #[must_use]
    pub fn codec(&self) -> &TemporalCodec {
        &self.codec
    }
}

impl CellProcessor for ParseTemporal {
    fn name(&self) -> &str {
        "ParseTemporal"
    }

    fn process(&self, value: Value, context: &CellContext) -> Outcome<Value> {
        self.codec.decode(value, context)
    }
}

/// Encode stage rendering values with a [`TemporalCodec`].
#[derive(Debug, Clone)]
pub struct FormatTemporal {
    codec: TemporalCodec,
}

impl FormatTemporal {
    #[must_use]
    pub fn new(codec: TemporalCodec) -> Self {
        Self { codec }
    }

    #[must_use]
    pub fn codec(&self) -> &TemporalCodec {
        &self.codec
    }
}

impl CellProcessor for FormatTemporal {
    fn name(&self) -> &str {
        "FormatTemporal"
    }

    fn process(&self, value: Value, context: &CellContext) -> Outcome<Value> {
        self.codec.encode(value, context)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, NaiveDateTime, TimeZone};

    fn offset_date_time(local: NaiveDateTime, offset_seconds: i32) -> Option<DateTime<FixedOffset>> {
        FixedOffset::east_opt(offset_seconds)?
            .from_local_datetime(&local)
            .single()
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_default_patterns_parse() {
        let codec = TemporalCodec::new(TemporalKind::Date).unwrap();
        assert_eq!(codec.parse_text("2024-02-29").unwrap(), Value::Date(date(2024, 2, 29)));

        let codec = TemporalCodec::new(TemporalKind::Time).unwrap();
        assert_eq!(
            codec.parse_text("13:45:00").unwrap(),
            Value::Time(NaiveTime::from_hms_opt(13, 45, 0).unwrap())
        );

        let codec = TemporalCodec::new(TemporalKind::OffsetDateTime).unwrap();
        let value = codec.parse_text("2024-05-01T08:00:00+02:00").unwrap();
        let expected = offset_date_time(date(2024, 5, 1).and_hms_opt(8, 0, 0).unwrap(), 7200).unwrap();
        assert_eq!(value, Value::OffsetDateTime(expected));
    }

    #[test]
    fn test_strict_rejects_day_overflow() {
        let codec = TemporalCodec::new(TemporalKind::Date).unwrap();
        assert!(codec.parse_text("2024-02-30").is_err());
    }

    #[test]
    fn test_lenient_rolls_day_overflow() {
        let codec = TemporalCodec::new(TemporalKind::Date).unwrap().lenient(true);
        assert_eq!(codec.parse_text("2024-02-30").unwrap(), Value::Date(date(2024, 3, 1)));

        let codec = TemporalCodec::new(TemporalKind::DateTime).unwrap().lenient(true);
        assert_eq!(
            codec.parse_text("2023-04-31 10:00:00").unwrap(),
            Value::DateTime(date(2023, 5, 1).and_hms_opt(10, 0, 0).unwrap())
        );
    }

    #[test]
    fn test_lenient_still_rejects_garbage() {
        let codec = TemporalCodec::new(TemporalKind::Date).unwrap().lenient(true);
        assert!(codec.parse_text("abc").is_err());
        assert!(codec.parse_text("2024-13-01").is_err());
    }

    #[test]
    fn test_invalid_patterns() {
        assert!(TemporalCodec::with_pattern(TemporalKind::Date, "").is_err());
        assert!(TemporalCodec::with_pattern(TemporalKind::Date, "%Y-%Q").is_err());
        assert!(TemporalCodec::with_pattern(TemporalKind::Date, "%Y %H").is_err());
    }

    #[test]
    fn test_decode_failure_carries_pattern() {
        let codec = TemporalCodec::with_pattern(TemporalKind::Time, "%H:%M").unwrap();
        let failure = codec
            .decode(Value::text("abc"), &CellContext::new(3, 2, "start"))
            .unwrap_err();
        assert!(failure.is_conversion());
        assert_eq!(failure.message_key(), PARSE_TEMPORAL_KEY);
        assert_eq!(failure.variables().get("pattern"), Some(&Value::text("%H:%M")));
        assert_eq!(failure.context().row(), 3);
    }

    #[test]
    fn test_decode_null_passes_through() {
        let codec = TemporalCodec::new(TemporalKind::Time).unwrap();
        assert_eq!(
            codec.decode(Value::Null, &CellContext::anonymous()).unwrap(),
            Value::Null
        );
    }

    #[test]
    fn test_encode_custom_pattern() {
        let codec = TemporalCodec::with_pattern(TemporalKind::Date, "%d.%m.%Y").unwrap();
        let text = codec
            .encode(Value::Date(date(2024, 1, 9)), &CellContext::anonymous())
            .unwrap();
        assert_eq!(text, Value::text("09.01.2024"));
        assert_eq!(codec.decode(text, &CellContext::anonymous()).unwrap(), Value::Date(date(2024, 1, 9)));
    }

    #[test]
    fn test_encode_type_mismatch() {
        let codec = TemporalCodec::new(TemporalKind::Date).unwrap();
        let failure = codec
            .encode(Value::Int(1), &CellContext::anonymous())
            .unwrap_err();
        assert_eq!(failure.message_key(), FORMAT_TEMPORAL_KEY);
        assert_eq!(codec.print(&Value::Int(1)), "1");
    }
}
