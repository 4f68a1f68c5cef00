//! Presence check

use cell_core::{CellContext, CellFailure, CellProcessor, Outcome, Value};

/// Message key for absent required values.
pub const REQUIRED_KEY: &str = "cell.constraint.Required.violated";

/// Rejects null values and empty text.
#[derive(Debug, Clone, Copy, Default)]
pub struct Required;

impl CellProcessor for Required {
    fn name(&self) -> &str {
        "Required"
    }

    fn process(&self, value: Value, context: &CellContext) -> Outcome<Value> {
        if value.is_null_or_empty() {
            return Err(CellFailure::constraint(REQUIRED_KEY, context)
                .message(format!("field '{}' requires a value", context.field()))
                .rejected(value));
        }
        Ok(value)
    }
}
