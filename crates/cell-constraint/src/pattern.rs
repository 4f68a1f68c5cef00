//! Full-match regex constraint

use cell_core::{CellContext, CellFailure, CellProcessor, Error, Outcome, Result, Value};
use regex::Regex;

/// Message key for values that do not match the configured regex.
pub const PATTERN_MATCH_KEY: &str = "cell.constraint.PatternMatch.violated";

/// Requires the textual form of a value to match a regex in its entirety.
#[derive(Debug, Clone)]
pub struct PatternMatch {
    source: String,
    anchored: Regex,
    description: Option<String>,
}

impl PatternMatch {
    /// # Errors
    ///
    /// Returns [`Error::InvalidRegex`] if the pattern does not compile.
    pub fn new(pattern: &str) -> Result<Self> {
        let anchored = Regex::new(&format!("^(?:{pattern})$"))
            .map_err(|err| Error::invalid_regex(pattern, err))?;
        Ok(Self {
            source: pattern.to_string(),
            anchored,
            description: None,
        })
    }

    /// Human-readable description of the expected shape (e.g. "postal code").
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    #[must_use]
    pub fn regex(&self) -> &str {
        &self.source
    }

    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    #[must_use]
    pub fn is_match(&self, text: &str) -> bool {
        self.anchored.is_match(text)
    }
}

impl CellProcessor for PatternMatch {
    fn name(&self) -> &str {
        "PatternMatch"
    }

    fn process(&self, value: Value, context: &CellContext) -> Outcome<Value> {
        if value.is_null() {
            return Ok(value);
        }
        let matched = match &value {
            Value::Text(text) => self.is_match(text),
            other => self.is_match(&other.to_string()),
        };
        if matched {
            return Ok(value);
        }

        let mut failure = CellFailure::constraint(PATTERN_MATCH_KEY, context)
            .var("regex", self.source.as_str());
        if let Some(description) = &self.description {
            failure = failure.var("description", description.as_str());
        }
        Err(failure
            .message(format!(
                "'{value}' does not match the pattern '{}'",
                self.description.as_deref().unwrap_or(&self.source)
            ))
            .rejected(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_match_required() {
        let stage = PatternMatch::new(r"[A-Z]{3}").unwrap();
        let ctx = CellContext::anonymous();
        assert!(stage.process(Value::text("ABC"), &ctx).is_ok());

        let failure = stage.process(Value::text("ABCD"), &ctx).unwrap_err();
        assert!(failure.is_constraint());
        assert_eq!(failure.message_key(), PATTERN_MATCH_KEY);
        assert_eq!(failure.variables().get("regex"), Some(&Value::text("[A-Z]{3}")));
        assert!(!failure.variables().contains("description"));
    }

    #[test]
    fn test_description_variable() {
        let stage = PatternMatch::new(r"\d{3}-\d{4}")
            .unwrap()
            .with_description("postal code");
        let failure = stage
            .process(Value::text("12-345"), &CellContext::anonymous())
            .unwrap_err();
        assert_eq!(
            failure.variables().get("description"),
            Some(&Value::text("postal code"))
        );
        assert_eq!(
            failure.default_message(),
            "'12-345' does not match the pattern 'postal code'"
        );
    }

    #[test]
    fn test_typed_values_use_display_form() {
        let stage = PatternMatch::new(r"\d{2}").unwrap();
        let ctx = CellContext::anonymous();
        assert!(stage.process(Value::Int(42), &ctx).is_ok());
        assert!(stage.process(Value::Int(420), &ctx).is_err());
        assert_eq!(stage.process(Value::Null, &ctx).unwrap(), Value::Null);
    }
}
