//! Per-cell failure model

use crate::context::CellContext;
use crate::value::Value;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result of running a value through a stage or chain.
pub type Outcome<T> = std::result::Result<T, CellFailure>;

/// Kind of per-cell failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FailureKind {
    /// Raw text could not be converted to the target type
    Conversion,
    /// A converted value violated a constraint
    Constraint,
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Conversion => write!(f, "conversion"),
            Self::Constraint => write!(f, "constraint"),
        }
    }
}

/// Named message variables in insertion order.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MessageVars {
    entries: Vec<(String, Value)>,
}

impl MessageVars {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a variable; an existing name keeps its position and gets the new value.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        let name = name.into();
        let value = value.into();
        if let Some(slot) = self.entries.iter_mut().find(|(n, _)| *n == name) {
            slot.1 = value;
        } else {
            self.entries.push((name, value));
        }
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.entries
            .iter()
            .find_map(|(n, v)| (n == name).then_some(v))
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Variable names in insertion order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(n, _)| n.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Structured failure for one cell.
///
/// Terminal for the chain that produced it; the caller decides what happens to
/// the surrounding record.
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[error("{kind} failure at row {row}, column {column} ('{field}'): {message}", row = .context.row(), column = .context.column(), field = .context.field())]
pub struct CellFailure {
    kind: FailureKind,
    message_key: String,
    rejected: Value,
    variables: MessageVars,
    context: CellContext,
    message: String,
}

impl CellFailure {
    /// Start a conversion failure for the given message key.
    pub fn conversion(message_key: impl Into<String>, context: &CellContext) -> Self {
        Self::new(FailureKind::Conversion, message_key, context)
    }

    /// Start a constraint failure for the given message key.
    pub fn constraint(message_key: impl Into<String>, context: &CellContext) -> Self {
        Self::new(FailureKind::Constraint, message_key, context)
    }

    fn new(kind: FailureKind, message_key: impl Into<String>, context: &CellContext) -> Self {
        Self {
            kind,
            message_key: message_key.into(),
            rejected: Value::Null,
            variables: MessageVars::new(),
            context: context.clone(),
            message: String::new(),
        }
    }

    /// Set the rejected value.
    #[must_use]
    pub fn rejected(mut self, value: impl Into<Value>) -> Self {
        self.rejected = value.into();
        self
    }

    /// Append a named message variable.
    #[must_use]
    pub fn var(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.variables.insert(name, value);
        self
    }

    /// Set the default (untranslated) message.
    #[must_use]
    pub fn message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    #[must_use]
    pub fn kind(&self) -> FailureKind {
        self.kind
    }

    #[must_use]
    pub fn message_key(&self) -> &str {
        &self.message_key
    }

    #[must_use]
    pub fn rejected_value(&self) -> &Value {
        &self.rejected
    }

    #[must_use]
    pub fn variables(&self) -> &MessageVars {
        &self.variables
    }

    #[must_use]
    pub fn context(&self) -> &CellContext {
        &self.context
    }

    #[must_use]
    pub fn default_message(&self) -> &str {
        &self.message
    }

    #[must_use]
    pub fn is_conversion(&self) -> bool {
        self.kind == FailureKind::Conversion
    }

    #[must_use]
    pub fn is_constraint(&self) -> bool {
        self.kind == FailureKind::Constraint
    }
}
