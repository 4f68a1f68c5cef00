//! The closed set of chain stages

use cell_constraint::{
    DateRange, NumberRange, PatternMatch, RegexReplace, Required, TemporalRange, WordForbid,
};
use cell_core::{CellContext, CellProcessor, Outcome, Value};
use cell_format::{FormatNumber, FormatTemporal, ParseNumber, ParseTemporal};
use std::fmt;
use std::sync::Arc;

/// Where a stage sits in a chain.
///
/// [`crate::ChainBuilder`] orders stages by phase; the order differs between
/// decode and encode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Phase {
    /// Whitespace clean-up, seen by every later stage
    Normalize,
    /// Null and empty handling
    Absence,
    /// Text rewriting
    Text,
    /// Parsing or formatting
    Convert,
    /// Range, pattern and vocabulary checks
    Constrain,
    /// User-supplied processors
    Custom,
}

/// One unit of a [`crate::Chain`].
#[derive(Clone)]
pub enum Stage {
    /// Turns empty text into null.
    Optional,
    /// Fails on null or empty text.
    Required(Required),
    /// Substitutes a value for null or empty text.
    DefaultOnNull(Value),
    /// Strips leading and trailing whitespace from text.
    Trim,
    Replace(RegexReplace),
    ParseNumber(ParseNumber),
    FormatNumber(FormatNumber),
    ParseTemporal(ParseTemporal),
    FormatTemporal(FormatTemporal),
    NumberRange(NumberRange),
    DateRange(DateRange),
    TemporalRange(TemporalRange),
    Pattern(PatternMatch),
    WordForbid(WordForbid),
    /// A user-defined processor, run after every built-in stage.
    Custom(Arc<dyn CellProcessor>),
}

impl Stage {
    #[must_use]
    pub fn phase(&self) -> Phase {
        match self {
            Self::Optional | Self::Required(_) | Self::DefaultOnNull(_) => Phase::Absence,
            Self::Trim => Phase::Normalize,
            Self::Replace(_) => Phase::Text,
            Self::ParseNumber(_)
            | Self::FormatNumber(_)
            | Self::ParseTemporal(_)
            | Self::FormatTemporal(_) => Phase::Convert,
            Self::NumberRange(_)
            | Self::DateRange(_)
            | Self::TemporalRange(_)
            | Self::Pattern(_)
            | Self::WordForbid(_) => Phase::Constrain,
            Self::Custom(_) => Phase::Custom,
        }
    }

    /// Run the stage on one value.
    ///
    /// # Errors
    ///
    /// Returns the stage's [`cell_core::CellFailure`] when the value is
    /// rejected.
    pub fn execute(&self, value: Value, context: &CellContext) -> Outcome<Value> {
        match self {
            Self::Optional => Ok(match value {
                Value::Text(text) if text.is_empty() => Value::Null,
                other => other,
            }),
            Self::Required(stage) => stage.process(value, context),
            Self::DefaultOnNull(default) => {
                if value.is_null_or_empty() {
                    Ok(default.clone())
                } else {
                    Ok(value)
                }
            }
            Self::Trim => Ok(match value {
                Value::Text(text) => {
                    let trimmed = text.trim();
                    if trimmed.len() == text.len() {
                        Value::Text(text)
                    } else {
                        Value::text(trimmed)
                    }
                }
                other => other,
            }),
            Self::Replace(stage) => stage.process(value, context),
            Self::ParseNumber(stage) => stage.process(value, context),
            Self::FormatNumber(stage) => stage.process(value, context),
            Self::ParseTemporal(stage) => stage.process(value, context),
            Self::FormatTemporal(stage) => stage.process(value, context),
            Self::NumberRange(stage) => stage.process(value, context),
            Self::DateRange(stage) => stage.process(value, context),
            Self::TemporalRange(stage) => stage.process(value, context),
            Self::Pattern(stage) => stage.process(value, context),
            Self::WordForbid(stage) => stage.process(value, context),
            Self::Custom(processor) => {
                if value.is_null() {
                    Ok(value)
                } else {
                    processor.process(value, context)
                }
            }
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Optional => "Optional",
            Self::Required(stage) => stage.name(),
            Self::DefaultOnNull(_) => "DefaultOnNull",
            Self::Trim => "Trim",
            Self::Replace(stage) => stage.name(),
            Self::ParseNumber(stage) => stage.name(),
            Self::FormatNumber(stage) => stage.name(),
            Self::ParseTemporal(stage) => stage.name(),
            Self::FormatTemporal(stage) => stage.name(),
            Self::NumberRange(stage) => stage.name(),
            Self::DateRange(stage) => stage.name(),
            Self::TemporalRange(stage) => stage.name(),
            Self::Pattern(stage) => stage.name(),
            Self::WordForbid(stage) => stage.name(),
            Self::Custom(processor) => processor.name(),
        }
    }
}

impl fmt::Debug for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DefaultOnNull(value) => f.debug_tuple("DefaultOnNull").field(value).finish(),
            Self::Custom(processor) => f.debug_tuple("Custom").field(processor).finish(),
            other => f.write_str(other.name()),
        }
    }
}

impl CellProcessor for Stage {
    fn name(&self) -> &str {
        Stage::name(self)
    }

    fn process(&self, value: Value, context: &CellContext) -> Outcome<Value> {
        self.execute(value, context)
    }
}

impl From<RegexReplace> for Stage {
    fn from(stage: RegexReplace) -> Self {
        Self::Replace(stage)
    }
}

impl From<PatternMatch> for Stage {
    fn from(stage: PatternMatch) -> Self {
        Self::Pattern(stage)
    }
}

impl From<WordForbid> for Stage {
    fn from(stage: WordForbid) -> Self {
        Self::WordForbid(stage)
    }
}

impl From<NumberRange> for Stage {
    fn from(stage: NumberRange) -> Self {
        Self::NumberRange(stage)
    }
}

impl From<DateRange> for Stage {
    fn from(stage: DateRange) -> Self {
        Self::DateRange(stage)
    }
}

impl From<TemporalRange> for Stage {
    fn from(stage: TemporalRange) -> Self {
        Self::TemporalRange(stage)
    }
}

impl From<Arc<dyn CellProcessor>> for Stage {
    fn from(processor: Arc<dyn CellProcessor>) -> Self {
        Self::Custom(processor)
    }
}
