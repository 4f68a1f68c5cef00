//! Message templates, interpolation and failure reports

use crate::{Error, Result};
use cell_constraint::{
    DATE_RANGE_KEY, NUMBER_RANGE_KEY, PATTERN_MATCH_KEY, REQUIRED_KEY, TEMPORAL_RANGE_KEY,
    VALIDATED_VALUE_VAR, WORD_FORBID_KEY,
};
use cell_core::{CellFailure, FailureKind, Value};
use cell_format::{FORMAT_NUMBER_KEY, FORMAT_TEMPORAL_KEY, PARSE_NUMBER_KEY, PARSE_TEMPORAL_KEY};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt::Debug;
use std::sync::Arc;

/// Looks up message templates by key and locale.
pub trait MessageResolver: Debug + Send + Sync {
    fn resolve(&self, key: &str, locale: Option<&str>) -> Option<String>;
}

const DEFAULT_SECTION: &str = "default";

const ENGLISH: &[(&str, &str)] = &[
    (PARSE_NUMBER_KEY, "'{validatedValue}' is not a valid {type}."),
    (FORMAT_NUMBER_KEY, "'{validatedValue}' could not be formatted as {type}."),
    (
        PARSE_TEMPORAL_KEY,
        "'{validatedValue}' does not match the {type} pattern '{pattern}'.",
    ),
    (
        FORMAT_TEMPORAL_KEY,
        "'{validatedValue}' could not be formatted with the pattern '{pattern}'.",
    ),
    (
        NUMBER_RANGE_KEY,
        "{validatedValue} does not lie between the min ({min}) and max ({max}) value.",
    ),
    (
        DATE_RANGE_KEY,
        "{validatedValue} does not lie between the min ({min}) and max ({max}) date.",
    ),
    (
        TEMPORAL_RANGE_KEY,
        "{validatedValue} does not lie between the min ({min}) and max ({max}) value.",
    ),
    (PATTERN_MATCH_KEY, "'{validatedValue}' does not match the pattern '{regex}'."),
    (
        WORD_FORBID_KEY,
        "'{validatedValue}' contains the forbidden words: {words}.",
    ),
    (REQUIRED_KEY, "'{label}' requires a value."),
];

/// Per-locale message templates with fallback to less specific locales.
///
/// `de-DE` falls back to `de`, then to the default section.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MessageCatalog {
    defaults: HashMap<String, String>,
    locales: HashMap<String, HashMap<String, String>>,
}

impl MessageCatalog {
    /// Empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Catalog holding English templates for every built-in message key.
    #[must_use]
    pub fn english() -> Self {
        let mut catalog = Self::new();
        for (key, template) in ENGLISH {
            catalog.insert(None, *key, *template);
        }
        catalog
    }

    /// Add a template; `None` targets the default section.
    pub fn insert(&mut self, locale: Option<&str>, key: impl Into<String>, template: impl Into<String>) {
        let section = match locale {
            Some(tag) => self.locales.entry(normalize(tag)).or_default(),
            None => &mut self.defaults,
        };
        section.insert(key.into(), template.into());
    }

    /// Merge templates from YAML. Top-level keys are locale tags, with
    /// `default` naming the fallback section.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidFormat`] for malformed YAML.
    pub fn merge_yaml(&mut self, yaml: &str) -> Result<()> {
        let sections: HashMap<String, HashMap<String, String>> = serde_yaml::from_str(yaml)
            .map_err(|e| Error::InvalidFormat(format!("YAML parse error: {e}")))?;
        self.merge(sections);
        Ok(())
    }

    /// Merge templates from JSON shaped like [`MessageCatalog::merge_yaml`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidFormat`] for malformed JSON.
    pub fn merge_json(&mut self, json: &str) -> Result<()> {
        let sections: HashMap<String, HashMap<String, String>> = serde_json::from_str(json)
            .map_err(|e| Error::InvalidFormat(format!("JSON parse error: {e}")))?;
        self.merge(sections);
        Ok(())
    }

    fn merge(&mut self, sections: HashMap<String, HashMap<String, String>>) {
        for (section, templates) in sections {
            let locale = (section != DEFAULT_SECTION).then_some(section.as_str());
            for (key, template) in templates {
                self.insert(locale, key, template);
            }
        }
    }
}

impl MessageResolver for MessageCatalog {
    fn resolve(&self, key: &str, locale: Option<&str>) -> Option<String> {
        if let Some(tag) = locale {
            let mut tag = normalize(tag);
            loop {
                if let Some(template) = self.locales.get(&tag).and_then(|t| t.get(key)) {
                    return Some(template.clone());
                }
                match tag.rfind('-') {
                    Some(pos) => tag.truncate(pos),
                    None => break,
                }
            }
        }
        self.defaults.get(key).cloned()
    }
}

fn normalize(tag: &str) -> String {
    tag.trim().replace('_', "-").to_lowercase()
}

/// Renders failures through a resolver for one locale.
#[derive(Debug, Clone)]
pub struct MessageInterpolator {
    resolver: Arc<dyn MessageResolver>,
    locale: Option<String>,
}

impl MessageInterpolator {
    #[must_use]
    pub fn new(resolver: Arc<dyn MessageResolver>) -> Self {
        Self {
            resolver,
            locale: None,
        }
    }

    #[must_use]
    pub fn locale(mut self, tag: impl Into<String>) -> Self {
        self.locale = Some(tag.into());
        self
    }

    /// Replace `{name}` placeholders with the failure's variables and the
    /// context variables `rowNumber`, `columnNumber`, `label` and
    /// `validatedValue`. Unknown placeholders are kept verbatim.
    #[must_use]
    pub fn interpolate(&self, template: &str, failure: &CellFailure) -> String {
        let mut out = String::with_capacity(template.len());
        let mut rest = template;
        while let Some(open) = rest.find('{') {
            out.push_str(&rest[..open]);
            let after = &rest[open + 1..];
            let Some(close) = after.find('}') else {
                out.push_str(&rest[open..]);
                return out;
            };
            let name = &after[..close];
            match lookup(name, failure) {
                Some(value) => out.push_str(&value),
                None => {
                    out.push('{');
                    out.push_str(name);
                    out.push('}');
                }
            }
            rest = &after[close + 1..];
        }
        out.push_str(rest);
        out
    }

    /// Resolve the failure's template and interpolate it, falling back to the
    /// failure's own message when no template is known.
    #[must_use]
    pub fn render(&self, failure: &CellFailure) -> String {
        match self
            .resolver
            .resolve(failure.message_key(), self.locale.as_deref())
        {
            Some(template) => self.interpolate(&template, failure),
            None => failure.default_message().to_string(),
        }
    }
}

fn lookup(name: &str, failure: &CellFailure) -> Option<String> {
    let context = failure.context();
    match name {
        "rowNumber" => Some(context.row().to_string()),
        "columnNumber" => Some(context.column().to_string()),
        "label" => Some(context.field().to_string()),
        VALIDATED_VALUE_VAR => Some(
            failure
                .variables()
                .get(VALIDATED_VALUE_VAR)
                .map_or_else(|| render_value(failure.rejected_value()), render_value),
        ),
        other => failure.variables().get(other).map(render_value),
    }
}

fn render_value(value: &Value) -> String {
    value.to_string()
}

/// A rendered failure, ready for logs or error files.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureReport {
    pub row: usize,
    pub column: usize,
    pub field: String,
    pub kind: FailureKind,
    pub key: String,
    pub rejected: String,
    pub message: String,
}

impl FailureReport {
    #[must_use]
    pub fn new(failure: &CellFailure, interpolator: &MessageInterpolator) -> Self {
        let context = failure.context();
        Self {
            row: context.row(),
            column: context.column(),
            field: context.field().to_string(),
            kind: failure.kind(),
            key: failure.message_key().to_string(),
            rejected: render_value(failure.rejected_value()),
            message: interpolator.render(failure),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cell_core::CellContext;

    fn failure() -> CellFailure {
        CellFailure::constraint(NUMBER_RANGE_KEY, &CellContext::new(5, 2, "price"))
            .rejected(Value::Int(12))
            .var("min", "0")
            .var("max", "10")
            .var("inclusive", true)
            .message("12 does not lie between the min (0) and max (10) value.")
    }

    #[test]
    fn test_printed_value_wins_over_rejected_value() {
        let interpolator = MessageInterpolator::new(Arc::new(MessageCatalog::english()));
        let failure = failure()
            .rejected(Value::Int(12000))
            .var(VALIDATED_VALUE_VAR, "12.000,00");
        assert_eq!(
            interpolator.render(&failure),
            "12.000,00 does not lie between the min (0) and max (10) value."
        );
    }

    #[test]
    fn test_english_catalog_renders_range() {
        let interpolator = MessageInterpolator::new(Arc::new(MessageCatalog::english()));
        assert_eq!(
            interpolator.render(&failure()),
            "12 does not lie between the min (0) and max (10) value."
        );
    }

    #[test]
    fn test_context_variables_and_unknown_placeholders() {
        let interpolator = MessageInterpolator::new(Arc::new(MessageCatalog::new()));
        assert_eq!(
            interpolator.interpolate("[{rowNumber},{columnNumber}] {label}={validatedValue} {nope} {", &failure()),
            "[5,2] price=12 {nope} {"
        );
    }

    #[test]
    fn test_locale_fallback() {
        let mut catalog = MessageCatalog::english();
        catalog
            .merge_yaml(
                r#"
de:
  cell.constraint.NumberRange.violated: "{validatedValue} liegt nicht zwischen {min} und {max}."
"#,
            )
            .unwrap();
        let resolver: Arc<dyn MessageResolver> = Arc::new(catalog);

        let german = MessageInterpolator::new(Arc::clone(&resolver)).locale("de_DE");
        assert_eq!(german.render(&failure()), "12 liegt nicht zwischen 0 und 10.");

        let french = MessageInterpolator::new(resolver).locale("fr");
        assert_eq!(
            french.render(&failure()),
            "12 does not lie between the min (0) and max (10) value."
        );
    }

    #[test]
    fn test_unknown_key_uses_default_message() {
        let interpolator = MessageInterpolator::new(Arc::new(MessageCatalog::new()));
        assert_eq!(
            interpolator.render(&failure()),
            "12 does not lie between the min (0) and max (10) value."
        );
    }

    #[test]
    fn test_json_default_section() {
        let mut catalog = MessageCatalog::new();
        catalog
            .merge_json(r#"{"default": {"k": "v {label}"}}"#)
            .unwrap();
        assert_eq!(catalog.resolve("k", Some("ja")), Some("v {label}".to_string()));
        assert!(catalog.merge_json("[").is_err());
    }

    #[test]
    fn test_failure_report_serializes() {
        let interpolator = MessageInterpolator::new(Arc::new(MessageCatalog::english()));
        let report = FailureReport::new(&failure(), &interpolator);
        assert_eq!(report.row, 5);
        assert_eq!(report.rejected, "12");

        let json = serde_json::to_string(&report).unwrap();
        assert!(json.contains("\"kind\":\"Constraint\""));
        let back: FailureReport = serde_json::from_str(&json).unwrap();
        assert_eq!(back, report);
    }
}
