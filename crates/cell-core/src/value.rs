//! Typed cell values

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// A single cell value, either raw text or a typed domain value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    /// Absent value
    Null,

    /// Raw or converted text
    Text(String),

    /// Boolean value
    Bool(bool),

    /// 8-bit signed integer
    Byte(i8),

    /// 16-bit signed integer
    Short(i16),

    /// 32-bit signed integer
    Int(i32),

    /// 64-bit signed integer
    Long(i64),

    /// Wide integer
    BigInteger(i128),

    /// Single precision float
    Float(f32),

    /// Double precision float
    Double(f64),

    /// Exact decimal value
    Decimal(Decimal),

    /// Calendar date
    Date(NaiveDate),

    /// Local time of day
    Time(NaiveTime),

    /// Local date and time
    DateTime(NaiveDateTime),

    /// Date and time with a fixed UTC offset
    OffsetDateTime(DateTime<FixedOffset>),
}

impl Value {
    /// Build a text value.
    pub fn text(s: impl Into<String>) -> Self {
        Self::Text(s.into())
    }

    /// Whether the value is absent.
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Whether the value is absent or empty text.
    #[must_use]
    pub fn is_null_or_empty(&self) -> bool {
        match self {
            Self::Null => true,
            Self::Text(s) => s.is_empty(),
            _ => false,
        }
    }

    /// Borrow the text content, if this is a text value.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s.as_str()),
            _ => None,
        }
    }

    /// Short name of the value's type, used in diagnostics.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Text(_) => "text",
            Self::Bool(_) => "bool",
            Self::Byte(_) => "byte",
            Self::Short(_) => "short",
            Self::Int(_) => "int",
            Self::Long(_) => "long",
            Self::BigInteger(_) => "big_integer",
            Self::Float(_) => "float",
            Self::Double(_) => "double",
            Self::Decimal(_) => "decimal",
            Self::Date(_) => "date",
            Self::Time(_) => "time",
            Self::DateTime(_) => "date_time",
            Self::OffsetDateTime(_) => "offset_date_time",
        }
    }

    /// Whether both values carry the same variant.
    #[must_use]
    pub fn same_type(&self, other: &Value) -> bool {
        std::mem::discriminant(self) == std::mem::discriminant(other)
    }

    /// Natural ordering between two values of the same type.
    ///
    /// Returns `None` for values of different types, for unordered types
    /// (null, bool) and for NaN floats.
    #[must_use]
    pub fn compare(&self, other: &Value) -> Option<Ordering> {
        match (self, other) {
            (Self::Text(a), Self::Text(b)) => Some(a.cmp(b)),
            (Self::Byte(a), Self::Byte(b)) => Some(a.cmp(b)),
            (Self::Short(a), Self::Short(b)) => Some(a.cmp(b)),
            (Self::Int(a), Self::Int(b)) => Some(a.cmp(b)),
            (Self::Long(a), Self::Long(b)) => Some(a.cmp(b)),
            (Self::BigInteger(a), Self::BigInteger(b)) => Some(a.cmp(b)),
            (Self::Float(a), Self::Float(b)) => a.partial_cmp(b),
            (Self::Double(a), Self::Double(b)) => a.partial_cmp(b),
            (Self::Decimal(a), Self::Decimal(b)) => Some(a.cmp(b)),
            (Self::Date(a), Self::Date(b)) => Some(a.cmp(b)),
            (Self::Time(a), Self::Time(b)) => Some(a.cmp(b)),
            (Self::DateTime(a), Self::DateTime(b)) => Some(a.cmp(b)),
            (Self::OffsetDateTime(a), Self::OffsetDateTime(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }

    /// Whether the value is one of the numeric variants.
    #[must_use]
    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            Self::Byte(_)
                | Self::Short(_)
                | Self::Int(_)
                | Self::Long(_)
                | Self::BigInteger(_)
                | Self::Float(_)
                | Self::Double(_)
                | Self::Decimal(_)
        )
    }
}

impl PartialOrd for Value {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        self.compare(other)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => Ok(()),
            Self::Text(s) => f.write_str(s),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Byte(n) => write!(f, "{n}"),
            Self::Short(n) => write!(f, "{n}"),
            Self::Int(n) => write!(f, "{n}"),
            Self::Long(n) => write!(f, "{n}"),
            Self::BigInteger(n) => write!(f, "{n}"),
            Self::Float(n) => write!(f, "{n}"),
            Self::Double(n) => write!(f, "{n}"),
            Self::Decimal(d) => write!(f, "{d}"),
            Self::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            Self::Time(t) => write!(f, "{}", t.format("%H:%M:%S")),
            Self::DateTime(dt) => write!(f, "{}", dt.format("%Y-%m-%dT%H:%M:%S")),
            Self::OffsetDateTime(dt) => write!(f, "{}", dt.format("%Y-%m-%dT%H:%M:%S%:z")),
        }
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i8> for Value {
    fn from(value: i8) -> Self {
        Self::Byte(value)
    }
}

impl From<i16> for Value {
    fn from(value: i16) -> Self {
        Self::Short(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Self::Int(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Self::Long(value)
    }
}

impl From<i128> for Value {
    fn from(value: i128) -> Self {
        Self::BigInteger(value)
    }
}

impl From<f32> for Value {
    fn from(value: f32) -> Self {
        Self::Float(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Self::Double(value)
    }
}

impl From<Decimal> for Value {
    fn from(value: Decimal) -> Self {
        Self::Decimal(value)
    }
}

impl From<NaiveDate> for Value {
    fn from(value: NaiveDate) -> Self {
        Self::Date(value)
    }
}

impl From<NaiveTime> for Value {
    fn from(value: NaiveTime) -> Self {
        Self::Time(value)
    }
}

impl From<NaiveDateTime> for Value {
    fn from(value: NaiveDateTime) -> Self {
        Self::DateTime(value)
    }
}

impl From<DateTime<FixedOffset>> for Value {
    fn from(value: DateTime<FixedOffset>) -> Self {
        Self::OffsetDateTime(value)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_null_or_empty() {
        assert!(Value::Null.is_null_or_empty());
        assert!(Value::text("").is_null_or_empty());
        assert!(!Value::text(" ").is_null_or_empty());
        assert!(!Value::Int(0).is_null_or_empty());
    }

    #[test]
    fn test_compare_same_type() {
        assert_eq!(Value::Int(1).compare(&Value::Int(2)), Some(Ordering::Less));
        let a = Value::Decimal(Decimal::from_str("1.50").unwrap());
        let b = Value::Decimal(Decimal::from_str("1.5").unwrap());
        assert_eq!(a.compare(&b), Some(Ordering::Equal));
    }

    #[test]
    fn test_compare_mismatched_types() {
        assert_eq!(Value::Int(1).compare(&Value::Long(1)), None);
        assert_eq!(Value::Double(f64::NAN).compare(&Value::Double(1.0)), None);
    }

    #[test]
    fn test_display_temporal() {
        let date = NaiveDate::from_ymd_opt(2024, 1, 15).unwrap();
        assert_eq!(Value::Date(date).to_string(), "2024-01-15");
        let offset = FixedOffset::east_opt(9 * 3600).unwrap();
        let dt = date.and_hms_opt(7, 12, 1).unwrap().and_local_timezone(offset).unwrap();
        assert_eq!(
            Value::OffsetDateTime(dt).to_string(),
            "2024-01-15T07:12:01+09:00"
        );
    }

    #[test]
    fn test_from_option() {
        assert_eq!(Value::from(None::<i32>), Value::Null);
        assert_eq!(Value::from(Some(5i32)), Value::Int(5));
    }

    #[test]
    fn test_serde_roundtrip_text() {
        let json = serde_json::to_string(&Value::text("abc")).unwrap();
        let back: Value = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Value::text("abc"));
    }
}
