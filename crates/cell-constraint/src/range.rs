//! Bound validators for numbers, dates and temporal values

use cell_core::{
    CellContext, CellFailure, CellProcessor, DisplayPrinter, Error, Outcome, Result, Value,
    ValuePrinter,
};
use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;
use tracing::trace;

/// Message key for numeric bound violations.
pub const NUMBER_RANGE_KEY: &str = "cell.constraint.NumberRange.violated";
/// Message key for calendar date bound violations.
pub const DATE_RANGE_KEY: &str = "cell.constraint.DateRange.violated";
/// Message key for time and date-time bound violations.
pub const TEMPORAL_RANGE_KEY: &str = "cell.constraint.TemporalRange.violated";

/// Failure variable holding the rejected value as the bound printer renders it.
pub const VALIDATED_VALUE_VAR: &str = "validatedValue";

/// Bounds for a range check.
///
/// `min <= max` holds for every constructed spec. Bounds are inclusive unless
/// [`RangeSpec::inclusive`] turns that off.
#[derive(Clone)]
pub struct RangeSpec<T> {
    min: T,
    max: T,
    inclusive: bool,
    printer: Arc<dyn ValuePrinter>,
}

impl<T> RangeSpec<T>
where
    T: PartialOrd + Clone + Into<Value>,
{
    /// Create inclusive bounds.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidBounds`] when `min > max` or the bounds cannot
    /// be compared (NaN).
    pub fn new(min: T, max: T) -> Result<Self> {
        match min.partial_cmp(&max) {
            Some(Ordering::Less | Ordering::Equal) => Ok(Self {
                min,
                max,
                inclusive: true,
                printer: Arc::new(DisplayPrinter),
            }),
            _ => Err(Error::invalid_bounds(min.into(), max.into())),
        }
    }

    /// Create bounds from optional arguments.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingArgument`] for an absent bound, otherwise as
    /// [`RangeSpec::new`].
    pub fn try_new(min: Option<T>, max: Option<T>) -> Result<Self> {
        let min = min.ok_or_else(|| Error::missing("min"))?;
        let max = max.ok_or_else(|| Error::missing("max"))?;
        Self::new(min, max)
    }

    /// Whether values equal to a bound are accepted.
    #[must_use]
    pub fn inclusive(mut self, inclusive: bool) -> Self {
        self.inclusive = inclusive;
        self
    }

    /// Printer used to render bounds and rejected values in failures.
    #[must_use]
    pub fn printer(mut self, printer: Arc<dyn ValuePrinter>) -> Self {
        self.printer = printer;
        self
    }

    #[must_use]
    pub fn min(&self) -> &T {
        &self.min
    }

    #[must_use]
    pub fn max(&self) -> &T {
        &self.max
    }

    #[must_use]
    pub fn is_inclusive(&self) -> bool {
        self.inclusive
    }

    /// Whether `value` lies within the bounds.
    #[must_use]
    pub fn contains(&self, value: &T) -> bool {
        let (Some(low), Some(high)) = (value.partial_cmp(&self.min), value.partial_cmp(&self.max))
        else {
            return false;
        };
        if low == Ordering::Greater && high == Ordering::Less {
            return true;
        }
        self.inclusive && (low == Ordering::Equal || high == Ordering::Equal)
    }

    fn erase(self) -> RangeSpec<Value> {
        RangeSpec {
            min: self.min.into(),
            max: self.max.into(),
            inclusive: self.inclusive,
            printer: self.printer,
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for RangeSpec<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RangeSpec")
            .field("min", &self.min)
            .field("max", &self.max)
            .field("inclusive", &self.inclusive)
            .finish_non_exhaustive()
    }
}

/// Bound check over type-erased values shared by the range stages.
#[derive(Debug, Clone)]
struct BoundCheck {
    stage: &'static str,
    message_key: &'static str,
    spec: RangeSpec<Value>,
}

impl BoundCheck {
    fn new(
        stage: &'static str,
        message_key: &'static str,
        spec: RangeSpec<Value>,
        accepts: fn(&Value) -> bool,
    ) -> Result<Self> {
        if !accepts(&spec.min) {
            return Err(Error::invalid_value(
                spec.min.to_string(),
                stage,
                format!("unsupported bound type {}", spec.min.type_name()),
            ));
        }
        Ok(Self {
            stage,
            message_key,
            spec,
        })
    }

    fn check(&self, value: Value, context: &CellContext) -> Outcome<Value> {
        if value.is_null() {
            return Ok(value);
        }
        if !value.same_type(&self.spec.min) {
            return Err(CellFailure::conversion(self.message_key, context)
                .var("expected", self.spec.min.type_name())
                .var("actual", value.type_name())
                .message(format!(
                    "{} expected a {} value but found {}",
                    self.stage,
                    self.spec.min.type_name(),
                    value.type_name()
                ))
                .rejected(value));
        }
        if self.spec.contains(&value) {
            return Ok(value);
        }

        let printer = &self.spec.printer;
        let (min, max) = (printer.print(&self.spec.min), printer.print(&self.spec.max));
        let shown = printer.print(&value);
        trace!(stage = self.stage, %value, %min, %max, "value out of range");
        Err(CellFailure::constraint(self.message_key, context)
            .message(format!(
                "{shown} does not lie between the min ({min}) and max ({max}) value."
            ))
            .var("min", min)
            .var("max", max)
            .var("inclusive", self.spec.inclusive)
            .var(VALIDATED_VALUE_VAR, shown)
            .rejected(value))
    }
}

macro_rules! range_stage {
    ($(#[$doc:meta])* $name:ident, $key:expr, $accepts:expr) => {
        $(#[$doc])*
        #[derive(Debug, Clone)]
        pub struct $name {
            check: BoundCheck,
        }

        impl $name {
            /// Build the stage from bounds.
            ///
            /// # Errors
            ///
            /// Returns [`Error::InvalidValue`] when the bound type does not
            /// belong to this stage.
            pub fn new<T>(spec: RangeSpec<T>) -> Result<Self>
            where
                T: PartialOrd + Clone + Into<Value>,
            {
                let check = BoundCheck::new(stringify!($name), $key, spec.erase(), $accepts)?;
                Ok(Self { check })
            }

            #[must_use]
            pub fn spec(&self) -> &RangeSpec<Value> {
                &self.check.spec
            }
        }

        impl CellProcessor for $name {
            fn name(&self) -> &str {
                stringify!($name)
            }

            fn process(&self, value: Value, context: &CellContext) -> Outcome<Value> {
                self.check.check(value, context)
            }
        }
    };
}

range_stage!(
    /// Numeric bound check. Bounds and values share one numeric type.
    NumberRange,
    NUMBER_RANGE_KEY,
    Value::is_numeric
);

range_stage!(
    /// Calendar date bound check.
    DateRange,
    DATE_RANGE_KEY,
    |v| matches!(v, Value::Date(_))
);

range_stage!(
    /// Bound check for times, local date-times and offset date-times.
    TemporalRange,
    TEMPORAL_RANGE_KEY,
    |v| matches!(
        v,
        Value::Time(_) | Value::DateTime(_) | Value::OffsetDateTime(_)
    )
);
