//! Field mappings built from declarative configuration

use crate::chain::{Chain, ChainBuilder};
use crate::config::{
    FieldConfig, ForbiddenWordsConfig, FormatConfig, KindClass, MappingConfig, RangeConfig,
};
use crate::factory::Components;
use crate::stage::Stage;
use crate::{Error, Result};
use cell_constraint::{
    DateRange, NumberRange, PatternMatch, RangeSpec, RegexReplace, Required, TemporalRange,
    WordForbid,
};
use cell_core::{CellContext, CellFailure, FieldIdentity, Outcome, Value};
use cell_format::{
    Currency, FormatNumber, FormatSpec, FormatTemporal, NumberCodec, ParseNumber, ParseTemporal,
    TemporalCodec, TemporalKind,
};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info};

/// The codec a field converts with.
#[derive(Debug, Clone)]
enum Codec {
    Text,
    Number(NumberCodec),
    Temporal(TemporalCodec),
}

impl Codec {
    fn from_config(config: &FieldConfig) -> cell_core::Result<Self> {
        let format = config.format.as_ref();
        match config.kind.class() {
            KindClass::Text => {
                if format.is_some() {
                    return Err(cell_core::Error::config(format!(
                        "text field '{}' cannot carry a format",
                        config.name
                    )));
                }
                Ok(Self::Text)
            }
            KindClass::Numeric(kind) => {
                let Some(format) = format else {
                    return Ok(Self::Number(NumberCodec::plain(kind)));
                };
                match &format.pattern {
                    Some(pattern) => Ok(Self::Number(NumberCodec::new(
                        kind,
                        number_spec(pattern, format)?,
                    ))),
                    None if format.locale.is_some() || format.currency.is_some() => {
                        Err(cell_core::Error::missing("format.pattern"))
                    }
                    None => Ok(Self::Number(NumberCodec::plain(kind))),
                }
            }
            KindClass::Temporal(kind) => {
                let Some(format) = format else {
                    return Ok(Self::Temporal(TemporalCodec::new(kind)?));
                };
                if format.locale.is_some() || format.currency.is_some() {
                    return Err(cell_core::Error::config(format!(
                        "temporal field '{}' accepts only pattern and lenient",
                        config.name
                    )));
                }
                let codec = match &format.pattern {
                    Some(pattern) => TemporalCodec::with_pattern(kind, pattern)?,
                    None => TemporalCodec::new(kind)?,
                };
                Ok(Self::Temporal(codec.lenient(format.lenient)))
            }
        }
    }

    /// Parse configuration text (bounds, defaults) into a typed value.
    fn parse(&self, text: &str, target: &str) -> cell_core::Result<Value> {
        match self {
            Self::Text => Ok(Value::text(text)),
            Self::Number(codec) => codec
                .parse_text(text)
                .map_err(|err| cell_core::Error::invalid_value(text, target, err.to_string())),
            Self::Temporal(codec) => codec
                .parse_text(text)
                .map_err(|err| cell_core::Error::invalid_value(text, target, err.to_string())),
        }
    }

    fn parse_stage(&self) -> Option<Stage> {
        match self {
            Self::Text => None,
            Self::Number(codec) => Some(Stage::ParseNumber(ParseNumber::new(codec.clone()))),
            Self::Temporal(codec) => Some(Stage::ParseTemporal(ParseTemporal::new(codec.clone()))),
        }
    }

    fn format_stage(&self) -> Option<Stage> {
        match self {
            Self::Text => None,
            Self::Number(codec) => Some(Stage::FormatNumber(FormatNumber::new(codec.clone()))),
            Self::Temporal(codec) => {
                Some(Stage::FormatTemporal(FormatTemporal::new(codec.clone())))
            }
        }
    }

    fn is_typed(&self) -> bool {
        !matches!(self, Self::Text)
    }
}

fn number_spec(pattern: &str, format: &FormatConfig) -> cell_core::Result<FormatSpec> {
    let mut builder = FormatSpec::builder(pattern).lenient(format.lenient);
    if let Some(tag) = &format.locale {
        builder = builder.locale(tag)?;
    }
    if let Some(code) = &format.currency {
        builder = builder.currency(Currency::from_code(code)?);
    }
    builder.build()
}

fn range_stage(range: &RangeConfig, codec: &Codec, field: &str) -> cell_core::Result<Stage> {
    let min = range
        .min
        .as_deref()
        .map(|text| codec.parse(text, &format!("range.min of '{field}'")))
        .transpose()?;
    let max = range
        .max
        .as_deref()
        .map(|text| codec.parse(text, &format!("range.max of '{field}'")))
        .transpose()?;
    let spec = RangeSpec::try_new(min, max)?.inclusive(range.inclusive);

    match codec {
        Codec::Text => Err(cell_core::Error::config(format!(
            "text field '{field}' cannot carry a range"
        ))),
        Codec::Number(number) => Ok(Stage::from(NumberRange::new(
            spec.printer(Arc::new(number.clone())),
        )?)),
        Codec::Temporal(temporal) => {
            let spec = spec.printer(Arc::new(temporal.clone()));
            if temporal.kind() == TemporalKind::Date {
                Ok(Stage::from(DateRange::new(spec)?))
            } else {
                Ok(Stage::from(TemporalRange::new(spec)?))
            }
        }
    }
}

/// Decode and encode chains of one column.
#[derive(Debug, Clone)]
pub struct FieldMapping {
    identity: FieldIdentity,
    decode: Chain,
    encode: Chain,
}

impl FieldMapping {
    /// Build both chains of a field.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Field`] when a pattern, bound, default or component
    /// key of the field is invalid.
    pub fn from_config(config: &FieldConfig, components: &Components) -> Result<Self> {
        Self::build(config, components).map_err(|source| Error::Field {
            field: config.name.clone(),
            source,
        })
    }

    fn build(config: &FieldConfig, components: &Components) -> cell_core::Result<Self> {
        let identity = FieldIdentity::new(config.name.clone(), config.column);
        let codec = Codec::from_config(config)?;

        let mut decode = ChainBuilder::decode();
        let mut encode = ChainBuilder::encode();

        if config.optional || (codec.is_typed() && !config.required) {
            decode.push(Stage::Optional);
        }
        if let Some(text) = &config.input_default {
            codec.parse(text, &format!("input_default of '{}'", config.name))?;
            decode.push(Stage::DefaultOnNull(Value::text(text.as_str())));
        }
        if let Some(text) = &config.output_default {
            let value = codec.parse(text, &format!("output_default of '{}'", config.name))?;
            encode.push(Stage::DefaultOnNull(value));
        }
        if config.required {
            decode.push(Stage::Required(Required));
            encode.push(Stage::Required(Required));
        }

        if config.trim {
            decode.push(Stage::Trim);
        }
        for replace in &config.replace {
            let stage = RegexReplace::new(&replace.pattern, replace.replacement.as_str())?;
            decode.push(stage.clone());
            encode.push(stage);
        }

        if let Some(stage) = codec.parse_stage() {
            decode.push(stage);
        }
        if let Some(stage) = codec.format_stage() {
            encode.push(stage);
        }

        if let Some(range) = &config.range {
            let stage = range_stage(range, &codec, &config.name)?;
            decode.push(stage.clone());
            encode.push(stage);
        }
        if let Some(pattern) = &config.pattern {
            let mut stage = PatternMatch::new(&pattern.regex)?;
            if let Some(description) = &pattern.description {
                stage = stage.with_description(description.as_str());
            }
            decode.push(stage.clone());
            encode.push(stage);
        }
        if let Some(words) = &config.forbidden_words {
            let stage = forbidden_words(words, &identity, components)?;
            decode.push(stage.clone());
            encode.push(stage);
        }

        for key in &config.processors {
            let processor = components.processors.create(key)?;
            decode.push(Arc::clone(&processor));
            encode.push(processor);
        }

        let mapping = Self {
            identity,
            decode: decode.build(),
            encode: encode.build(),
        };
        debug!(
            field = %mapping.identity.name,
            column = mapping.identity.column,
            decode = %mapping.decode.describe(),
            encode = %mapping.encode.describe(),
            "built field mapping"
        );
        Ok(mapping)
    }

    #[must_use]
    pub fn identity(&self) -> &FieldIdentity {
        &self.identity
    }

    #[must_use]
    pub fn decode_chain(&self) -> &Chain {
        &self.decode
    }

    #[must_use]
    pub fn encode_chain(&self) -> &Chain {
        &self.encode
    }

    /// Decode one cell of this field at `row`.
    ///
    /// # Errors
    ///
    /// Returns the failure that stopped the decode chain.
    pub fn decode(&self, raw: Option<&str>, row: usize) -> Outcome<Value> {
        let context = CellContext::for_field(&self.identity, row).with_raw(raw);
        self.decode.decode(raw, &context)
    }

    /// Encode one value of this field at `row`; `None` for null.
    ///
    /// # Errors
    ///
    /// Returns the failure that stopped the encode chain.
    pub fn encode(&self, value: Value, row: usize) -> Outcome<Option<String>> {
        let context = CellContext::for_field(&self.identity, row);
        self.encode.encode(value, &context).map(into_text)
    }
}

fn forbidden_words(
    config: &ForbiddenWordsConfig,
    identity: &FieldIdentity,
    components: &Components,
) -> cell_core::Result<WordForbid> {
    let mut words = Vec::new();
    if let Some(key) = &config.provider {
        let provider = components.word_providers.create(key)?;
        words.extend(WordForbid::from_provider(provider.as_ref(), identity).words().iter().cloned());
    }
    words.extend(config.words.iter().cloned());
    Ok(WordForbid::new(words))
}

fn into_text(value: Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::Text(text) => Some(text),
        other => Some(other.to_string()),
    }
}

/// Per-cell results of one record.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordOutcome<T> {
    /// One entry per column; failed cells hold the default value.
    pub values: Vec<T>,
    pub failures: Vec<CellFailure>,
}

impl<T> RecordOutcome<T> {
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.failures.is_empty()
    }

    /// Value of a 1-based column.
    #[must_use]
    pub fn get(&self, column: usize) -> Option<&T> {
        column.checked_sub(1).and_then(|index| self.values.get(index))
    }
}

/// The field mappings of one record layout, indexed by column and name.
#[derive(Debug, Clone, Default)]
pub struct MappingSet {
    mappings: Vec<FieldMapping>,
    by_column: HashMap<usize, usize>,
    by_name: HashMap<String, usize>,
}

impl MappingSet {
    /// Validate a layout and build every field mapping.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidFormat`] for structural problems and
    /// [`Error::Field`] for the first field that cannot be built.
    pub fn from_config(config: &MappingConfig, components: &Components) -> Result<Self> {
        config.validate()?;
        let mut set = Self::default();
        for field in &config.fields {
            set.insert(FieldMapping::from_config(field, components)?);
        }
        info!(fields = set.len(), "built mapping set");
        Ok(set)
    }

    /// Add a mapping, replacing every mapping with the same column or name.
    pub fn insert(&mut self, mapping: FieldMapping) {
        let column_slot = self.by_column.get(&mapping.identity.column).copied();
        let name_slot = self.by_name.get(&mapping.identity.name).copied();
        match (column_slot, name_slot) {
            (None, None) => {
                let index = self.mappings.len();
                self.by_column.insert(mapping.identity.column, index);
                self.by_name.insert(mapping.identity.name.clone(), index);
                self.mappings.push(mapping);
                return;
            }
            (Some(by_column), Some(by_name)) if by_column != by_name => {
                debug!(
                    column = mapping.identity.column,
                    name = %mapping.identity.name,
                    "mapping replaces two existing fields"
                );
                self.mappings[by_column.min(by_name)] = mapping;
                self.mappings.remove(by_column.max(by_name));
            }
            (Some(index), _) | (None, Some(index)) => self.mappings[index] = mapping,
        }
        self.reindex();
    }

    fn reindex(&mut self) {
        self.by_column.clear();
        self.by_name.clear();
        for (index, mapping) in self.mappings.iter().enumerate() {
            self.by_column.insert(mapping.identity.column, index);
            self.by_name.insert(mapping.identity.name.clone(), index);
        }
    }

    #[must_use]
    pub fn get(&self, column: usize) -> Option<&FieldMapping> {
        self.by_column.get(&column).map(|&index| &self.mappings[index])
    }

    #[must_use]
    pub fn by_name(&self, name: &str) -> Option<&FieldMapping> {
        self.by_name.get(name).map(|&index| &self.mappings[index])
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.mappings.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.mappings.is_empty()
    }

    /// Highest mapped column, 0 when empty.
    #[must_use]
    pub fn width(&self) -> usize {
        self.by_column.keys().copied().max().unwrap_or(0)
    }

    /// Decode one cell. Unmapped columns pass their text through.
    ///
    /// # Errors
    ///
    /// Returns the failure that stopped the field's decode chain.
    pub fn decode_cell(&self, column: usize, raw: Option<&str>, row: usize) -> Outcome<Value> {
        match self.get(column) {
            Some(mapping) => mapping.decode(raw, row),
            None => Ok(raw.map_or(Value::Null, Value::text)),
        }
    }

    /// Encode one value. Unmapped columns render the value's display form.
    ///
    /// # Errors
    ///
    /// Returns the failure that stopped the field's encode chain.
    pub fn encode_cell(&self, column: usize, value: Value, row: usize) -> Outcome<Option<String>> {
        match self.get(column) {
            Some(mapping) => mapping.encode(value, row),
            None => Ok(into_text(value)),
        }
    }

    /// Decode every cell of a record, collecting all failures.
    ///
    /// Mapped columns beyond the end of the record decode as absent cells.
    pub fn decode_record<'a, I>(&self, row: usize, cells: I) -> RecordOutcome<Value>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut cells: Vec<Option<&str>> = cells.into_iter().map(Some).collect();
        if cells.len() < self.width() {
            cells.resize(self.width(), None);
        }

        let mut outcome = RecordOutcome {
            values: Vec::with_capacity(cells.len()),
            failures: Vec::new(),
        };
        for (index, raw) in cells.into_iter().enumerate() {
            match self.decode_cell(index + 1, raw, row) {
                Ok(value) => outcome.values.push(value),
                Err(failure) => {
                    outcome.values.push(Value::Null);
                    outcome.failures.push(failure);
                }
            }
        }
        outcome
    }

    /// Encode a record of values, collecting all failures. Null cells and
    /// failed cells render as empty text.
    pub fn encode_record<I>(&self, row: usize, values: I) -> RecordOutcome<String>
    where
        I: IntoIterator<Item = Value>,
    {
        let mut outcome = RecordOutcome {
            values: Vec::new(),
            failures: Vec::new(),
        };
        for (index, value) in values.into_iter().enumerate() {
            match self.encode_cell(index + 1, value, row) {
                Ok(text) => outcome.values.push(text.unwrap_or_default()),
                Err(failure) => {
                    outcome.values.push(String::new());
                    outcome.failures.push(failure);
                }
            }
        }
        outcome
    }
}
