//! Forbidden vocabulary check

use cell_core::{CellContext, CellFailure, CellProcessor, FieldIdentity, Outcome, Value};
use std::collections::HashMap;
use std::fmt::Debug;
use tracing::debug;

/// Message key for values containing a forbidden word.
pub const WORD_FORBID_KEY: &str = "cell.constraint.WordForbid.violated";

/// Source of disallowed substrings for a field.
pub trait ForbiddenWordProvider: Debug + Send + Sync {
    /// Words that must not occur in the field's values. Empty means no check.
    fn forbidden_words(&self, field: &FieldIdentity) -> Vec<String>;
}

/// In-memory provider with per-field lists and a list applied to every field.
#[derive(Debug, Clone, Default)]
pub struct StaticWordProvider {
    common: Vec<String>,
    by_field: HashMap<String, Vec<String>>,
}

impl StaticWordProvider {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Words forbidden in every field.
    #[must_use]
    pub fn common<I, S>(mut self, words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.common.extend(words.into_iter().map(Into::into));
        self
    }

    /// Words forbidden in the named field.
    #[must_use]
    pub fn field<I, S>(mut self, name: impl Into<String>, words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.by_field
            .entry(name.into())
            .or_default()
            .extend(words.into_iter().map(Into::into));
        self
    }
}

impl ForbiddenWordProvider for StaticWordProvider {
    fn forbidden_words(&self, field: &FieldIdentity) -> Vec<String> {
        let mut words = self.common.clone();
        if let Some(specific) = self.by_field.get(&field.name) {
            words.extend(specific.iter().cloned());
        }
        words
    }
}

/// Fails when the textual form of a value contains any forbidden word.
#[derive(Debug, Clone)]
pub struct WordForbid {
    words: Vec<String>,
}

impl WordForbid {
    /// Resolve the field's words from `provider` once.
    #[must_use]
    pub fn from_provider(provider: &dyn ForbiddenWordProvider, field: &FieldIdentity) -> Self {
        let words = provider.forbidden_words(field);
        debug!(field = %field.name, count = words.len(), "resolved forbidden words");
        Self::new(words)
    }

    /// Use a fixed word list. Empty entries and duplicates are dropped.
    pub fn new<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut unique: Vec<String> = Vec::new();
        for word in words.into_iter().map(Into::into) {
            if !word.is_empty() && !unique.contains(&word) {
                unique.push(word);
            }
        }
        Self { words: unique }
    }

    #[must_use]
    pub fn words(&self) -> &[String] {
        &self.words
    }

    /// Forbidden words occurring in `text`, in configuration order.
    #[must_use]
    pub fn matches<'a>(&'a self, text: &str) -> Vec<&'a str> {
        self.words
            .iter()
            .filter(|word| text.contains(word.as_str()))
            .map(String::as_str)
            .collect()
    }
}

impl CellProcessor for WordForbid {
    fn name(&self) -> &str {
        "WordForbid"
    }

    fn process(&self, value: Value, context: &CellContext) -> Outcome<Value> {
        if value.is_null() || self.words.is_empty() {
            return Ok(value);
        }
        let text = match &value {
            Value::Text(text) => text.clone(),
            other => other.to_string(),
        };
        let found = self.matches(&text);
        if found.is_empty() {
            return Ok(value);
        }

        let words = found.join(", ");
        Err(CellFailure::constraint(WORD_FORBID_KEY, context)
            .message(format!("'{text}' contains the forbidden words: {words}"))
            .var("words", words)
            .rejected(value))
    }
}
