//! Execution contract shared by all stages

use crate::context::CellContext;
use crate::failure::Outcome;
use crate::value::Value;
use std::fmt::Debug;

/// A single transform or validation unit.
///
/// Implementations hold no per-call mutable state and are shared across
/// threads once built.
pub trait CellProcessor: Debug + Send + Sync {
    /// Short name used when describing a chain.
    fn name(&self) -> &str;

    /// Transform the value or reject it.
    ///
    /// # Errors
    ///
    /// Returns a [`crate::CellFailure`] when the value cannot be converted or
    /// violates a constraint.
    fn process(&self, value: Value, context: &CellContext) -> Outcome<Value>;
}

/// Renders a typed value for display inside failure variables.
pub trait ValuePrinter: Debug + Send + Sync {
    fn print(&self, value: &Value) -> String;
}

/// Printer using the value's `Display` form.
#[derive(Debug, Clone, Copy, Default)]
pub struct DisplayPrinter;

impl ValuePrinter for DisplayPrinter {
    fn print(&self, value: &Value) -> String {
        value.to_string()
    }
}

/// Printer backed by a closure.
pub struct FnPrinter<F>(pub F);

impl<F> Debug for FnPrinter<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("FnPrinter")
    }
}

impl<F> ValuePrinter for FnPrinter<F>
where
    F: Fn(&Value) -> String + Send + Sync,
{
    fn print(&self, value: &Value) -> String {
        (self.0)(value)
    }
}
