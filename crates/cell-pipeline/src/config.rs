//! Declarative field configuration and its loader

use crate::{Error, Result};
use cell_format::{NumericKind, TemporalKind};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashSet;
use std::path::Path;
use tracing::{info, trace};

/// Declared type of a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    #[default]
    Text,
    Byte,
    Short,
    Int,
    Long,
    BigInteger,
    Float,
    Double,
    Decimal,
    Date,
    Time,
    DateTime,
    OffsetDateTime,
}

/// Codec family of a [`FieldKind`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KindClass {
    Text,
    Numeric(NumericKind),
    Temporal(TemporalKind),
}

impl FieldKind {
    #[must_use]
    pub fn class(self) -> KindClass {
        match self {
            Self::Text => KindClass::Text,
            Self::Byte => KindClass::Numeric(NumericKind::Byte),
            Self::Short => KindClass::Numeric(NumericKind::Short),
            Self::Int => KindClass::Numeric(NumericKind::Int),
            Self::Long => KindClass::Numeric(NumericKind::Long),
            Self::BigInteger => KindClass::Numeric(NumericKind::BigInteger),
            Self::Float => KindClass::Numeric(NumericKind::Float),
            Self::Double => KindClass::Numeric(NumericKind::Double),
            Self::Decimal => KindClass::Numeric(NumericKind::Decimal),
            Self::Date => KindClass::Temporal(TemporalKind::Date),
            Self::Time => KindClass::Temporal(TemporalKind::Time),
            Self::DateTime => KindClass::Temporal(TemporalKind::DateTime),
            Self::OffsetDateTime => KindClass::Temporal(TemporalKind::OffsetDateTime),
        }
    }
}

/// Number or temporal format of a field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FormatConfig {
    /// Number pattern (`#,##0.00`) or strftime pattern (`%d.%m.%Y`)
    pub pattern: Option<String>,
    /// Locale tag for number symbols
    pub locale: Option<String>,
    /// ISO 4217 currency code
    pub currency: Option<String>,
    pub lenient: bool,
}

/// Bounds of a field, written in the field's own format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RangeConfig {
    #[serde(default, deserialize_with = "scalar_text")]
    pub min: Option<String>,
    #[serde(default, deserialize_with = "scalar_text")]
    pub max: Option<String>,
    #[serde(default = "default_inclusive")]
    pub inclusive: bool,
}

fn default_inclusive() -> bool {
    true
}

/// Reads a value written in the field's format, quoted or as a bare number.
fn scalar_text<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Scalar {
        Text(String),
        Signed(i64),
        Unsigned(u64),
        Float(f64),
    }

    Ok(Option::<Scalar>::deserialize(deserializer)?.map(|scalar| match scalar {
        Scalar::Text(text) => text,
        Scalar::Signed(n) => n.to_string(),
        Scalar::Unsigned(n) => n.to_string(),
        Scalar::Float(n) => n.to_string(),
    }))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReplaceConfig {
    pub pattern: String,
    pub replacement: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PatternConfig {
    pub regex: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// Forbidden words from a registered provider, inline, or both.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ForbiddenWordsConfig {
    /// Key of a provider registered with the component factory
    pub provider: Option<String>,
    pub words: Vec<String>,
}

/// Everything needed to build the decode and encode chains of one field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FieldConfig {
    pub name: String,
    /// 1-based column number
    pub column: usize,
    pub kind: FieldKind,
    /// Empty input decodes to null
    pub optional: bool,
    /// Null or empty input is rejected
    pub required: bool,
    /// Text substituted for empty input before parsing
    #[serde(deserialize_with = "scalar_text")]
    pub input_default: Option<String>,
    /// Value (in the field's format) substituted for null before encoding
    #[serde(deserialize_with = "scalar_text")]
    pub output_default: Option<String>,
    /// Trim whitespace before parsing
    pub trim: bool,
    pub format: Option<FormatConfig>,
    pub range: Option<RangeConfig>,
    pub replace: Vec<ReplaceConfig>,
    pub pattern: Option<PatternConfig>,
    pub forbidden_words: Option<ForbiddenWordsConfig>,
    /// Keys of user processors registered with the component factory
    pub processors: Vec<String>,
}

impl FieldConfig {
    #[must_use]
    pub fn new(name: impl Into<String>, column: usize, kind: FieldKind) -> Self {
        Self {
            name: name.into(),
            column,
            kind,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    #[must_use]
    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    #[must_use]
    pub fn trim(mut self) -> Self {
        self.trim = true;
        self
    }

    #[must_use]
    pub fn input_default(mut self, text: impl Into<String>) -> Self {
        self.input_default = Some(text.into());
        self
    }

    #[must_use]
    pub fn output_default(mut self, text: impl Into<String>) -> Self {
        self.output_default = Some(text.into());
        self
    }

    #[must_use]
    pub fn format(mut self, format: FormatConfig) -> Self {
        self.format = Some(format);
        self
    }

    /// Shorthand for a format with only a pattern.
    #[must_use]
    pub fn pattern_format(self, pattern: impl Into<String>) -> Self {
        self.format(FormatConfig {
            pattern: Some(pattern.into()),
            ..FormatConfig::default()
        })
    }

    #[must_use]
    pub fn range(mut self, min: impl Into<String>, max: impl Into<String>, inclusive: bool) -> Self {
        self.range = Some(RangeConfig {
            min: Some(min.into()),
            max: Some(max.into()),
            inclusive,
        });
        self
    }

    #[must_use]
    pub fn replace(mut self, pattern: impl Into<String>, replacement: impl Into<String>) -> Self {
        self.replace.push(ReplaceConfig {
            pattern: pattern.into(),
            replacement: replacement.into(),
        });
        self
    }

    #[must_use]
    pub fn matches(mut self, regex: impl Into<String>, description: Option<&str>) -> Self {
        self.pattern = Some(PatternConfig {
            regex: regex.into(),
            description: description.map(str::to_string),
        });
        self
    }

    #[must_use]
    pub fn forbidden_words(mut self, config: ForbiddenWordsConfig) -> Self {
        self.forbidden_words = Some(config);
        self
    }

    #[must_use]
    pub fn processor(mut self, key: impl Into<String>) -> Self {
        self.processors.push(key.into());
        self
    }
}

/// The fields of one record layout.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MappingConfig {
    pub fields: Vec<FieldConfig>,
}

impl MappingConfig {
    #[must_use]
    pub fn new(fields: Vec<FieldConfig>) -> Self {
        Self { fields }
    }

    /// Check structural invariants: names and columns are unique and columns
    /// start at 1.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidFormat`] naming the offending field.
    pub fn validate(&self) -> Result<()> {
        let mut names = HashSet::new();
        let mut columns = HashSet::new();
        for field in &self.fields {
            if field.name.is_empty() {
                return Err(Error::InvalidFormat(format!(
                    "field at column {} has no name",
                    field.column
                )));
            }
            if field.column == 0 {
                return Err(Error::InvalidFormat(format!(
                    "field '{}' has column 0; columns start at 1",
                    field.name
                )));
            }
            if !names.insert(field.name.as_str()) {
                return Err(Error::InvalidFormat(format!(
                    "duplicate field name '{}'",
                    field.name
                )));
            }
            if !columns.insert(field.column) {
                return Err(Error::InvalidFormat(format!(
                    "duplicate column {} (field '{}')",
                    field.column, field.name
                )));
            }
            if field.required && field.optional {
                return Err(Error::InvalidFormat(format!(
                    "field '{}' cannot be both required and optional",
                    field.name
                )));
            }
        }
        Ok(())
    }
}

/// Reads [`MappingConfig`] from YAML or JSON.
pub struct MappingLoader;

impl MappingLoader {
    /// # Errors
    ///
    /// Returns [`Error::InvalidFormat`] for malformed documents or invalid
    /// layouts.
    pub fn from_yaml(yaml: &str) -> Result<MappingConfig> {
        let config: MappingConfig = serde_yaml::from_str(yaml)
            .map_err(|e| Error::InvalidFormat(format!("YAML parse error: {e}")))?;
        config.validate()?;
        info!(fields = config.fields.len(), "loaded mapping configuration");
        Ok(config)
    }

    /// # Errors
    ///
    /// Returns [`Error::InvalidFormat`] for malformed documents or invalid
    /// layouts.
    pub fn from_json(json: &str) -> Result<MappingConfig> {
        let config: MappingConfig = serde_json::from_str(json)
            .map_err(|e| Error::InvalidFormat(format!("JSON parse error: {e}")))?;
        config.validate()?;
        info!(fields = config.fields.len(), "loaded mapping configuration");
        Ok(config)
    }

    /// Load a file, choosing YAML for `.yaml`/`.yml` and JSON otherwise.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if the file cannot be read, otherwise as
    /// [`MappingLoader::from_yaml`].
    pub fn from_file(path: &Path) -> Result<MappingConfig> {
        trace!(path = %path.display(), "loading mapping configuration");
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::io("read", path.display().to_string(), e.to_string()))?;

        if path
            .extension()
            .is_some_and(|e| e == "yaml" || e == "yml")
        {
            Self::from_yaml(&content)
        } else {
            Self::from_json(&content)
        }
    }
}
