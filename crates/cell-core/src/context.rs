//! Per-cell processing context

use serde::{Deserialize, Serialize};

/// Identity of a mapped field: its name and 1-based column number.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FieldIdentity {
    /// Field name
    pub name: String,
    /// Column number (1-indexed)
    pub column: usize,
}

impl FieldIdentity {
    pub fn new(name: impl Into<String>, column: usize) -> Self {
        Self {
            name: name.into(),
            column,
        }
    }
}

/// Context of a single cell invocation.
///
/// Created once per cell and only read afterwards; stages receive it by
/// reference for diagnostics.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CellContext {
    row: usize,
    column: usize,
    field: String,
    raw: Option<String>,
}

impl CellContext {
    /// Create a context for the given row, column and field.
    pub fn new(row: usize, column: usize, field: impl Into<String>) -> Self {
        Self {
            row,
            column,
            field: field.into(),
            raw: None,
        }
    }

    /// Create a context for a field identity at the given row.
    #[must_use]
    pub fn for_field(field: &FieldIdentity, row: usize) -> Self {
        Self::new(row, field.column, field.name.clone())
    }

    /// Context used when no record position is known.
    #[must_use]
    pub fn anonymous() -> Self {
        Self::default()
    }

    /// Attach the raw cell input.
    #[must_use]
    pub fn with_raw(mut self, raw: Option<&str>) -> Self {
        self.raw = raw.map(str::to_string);
        self
    }

    /// Row number (1-indexed, 0 when unknown)
    #[must_use]
    pub fn row(&self) -> usize {
        self.row
    }

    /// Column number (1-indexed, 0 when unknown)
    #[must_use]
    pub fn column(&self) -> usize {
        self.column
    }

    /// Field name
    #[must_use]
    pub fn field(&self) -> &str {
        &self.field
    }

    /// Raw cell input as read, if any
    #[must_use]
    pub fn raw(&self) -> Option<&str> {
        self.raw.as_deref()
    }
}
