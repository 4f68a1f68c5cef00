//! Full-match regex replacement

use cell_core::{CellContext, CellProcessor, Error, Outcome, Result, Value};
use regex::Regex;
use tracing::trace;

/// Replaces text that matches a regex in its entirety.
///
/// Text that only partially matches passes through byte-identical, as do
/// null and non-text values. The replacement uses `$1` / `${name}` group
/// references.
#[derive(Debug, Clone)]
pub struct RegexReplace {
    source: String,
    anchored: Regex,
    replacement: String,
}

impl RegexReplace {
    /// Compile the pattern.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidRegex`] if the pattern does not compile.
    pub fn new(pattern: &str, replacement: impl Into<String>) -> Result<Self> {
        let anchored = Regex::new(&format!("^(?:{pattern})$"))
            .map_err(|err| Error::invalid_regex(pattern, err))?;
        Ok(Self {
            source: pattern.to_string(),
            anchored,
            replacement: replacement.into(),
        })
    }

    #[must_use]
    pub fn regex(&self) -> &str {
        &self.source
    }

    #[must_use]
    pub fn replacement(&self) -> &str {
        &self.replacement
    }

    /// Apply the replacement if `text` matches in full.
    #[must_use]
    pub fn apply(&self, text: &str) -> Option<String> {
        self.anchored
            .is_match(text)
            .then(|| self.anchored.replace(text, self.replacement.as_str()).into_owned())
    }
}

impl CellProcessor for RegexReplace {
    fn name(&self) -> &str {
        "RegexReplace"
    }

    fn process(&self, value: Value, context: &CellContext) -> Outcome<Value> {
        let Value::Text(text) = value else {
            return Ok(value);
        };
        match self.apply(&text) {
            Some(replaced) => {
                trace!(field = context.field(), regex = %self.source, "replaced cell text");
                Ok(Value::Text(replaced))
            }
            None => Ok(Value::Text(text)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(stage: &RegexReplace, input: &str) -> Value {
        stage
            .process(Value::text(input), &CellContext::anonymous())
            .unwrap()
    }

    #[test]
    fn test_full_match_is_replaced() {
        let stage = RegexReplace::new(r"\d+", "N").unwrap();
        assert_eq!(run(&stage, "123"), Value::text("N"));
    }

    #[test]
    fn test_partial_match_passes_through() {
        let stage = RegexReplace::new(r"\d+", "N").unwrap();
        assert_eq!(run(&stage, "a123"), Value::text("a123"));
        assert_eq!(run(&stage, "123a"), Value::text("123a"));
    }

    #[test]
    fn test_alternation_is_anchored_as_a_whole() {
        let stage = RegexReplace::new("yes|y", "true").unwrap();
        assert_eq!(run(&stage, "y"), Value::text("true"));
        assert_eq!(run(&stage, "yesno"), Value::text("yesno"));
    }

    #[test]
    fn test_group_references() {
        let stage = RegexReplace::new(r"(\d{4})(\d{2})(\d{2})", "$1-$2-$3").unwrap();
        assert_eq!(run(&stage, "20240131"), Value::text("2024-01-31"));
    }

    #[test]
    fn test_null_and_typed_values_forwarded() {
        let stage = RegexReplace::new(r"\d+", "N").unwrap();
        let ctx = CellContext::anonymous();
        assert_eq!(stage.process(Value::Null, &ctx).unwrap(), Value::Null);
        assert_eq!(stage.process(Value::Int(5), &ctx).unwrap(), Value::Int(5));
    }

    #[test]
    fn test_invalid_regex_is_config_error() {
        let err = RegexReplace::new("(unclosed", "x").unwrap_err();
        assert!(matches!(err, Error::InvalidRegex { .. }));
    }
}
