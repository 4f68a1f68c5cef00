//! Number format configuration

use crate::cache::next_format_id;
use crate::pattern::NumberPattern;
use crate::symbols::{Currency, LocaleSymbols};
use cell_core::Result;
use std::sync::Arc;

/// Pattern, locale symbols, currency and leniency for a numeric field.
///
/// The pattern is compiled once here. Clones share the same identity, which
/// keys the per-thread formatter cache.
#[derive(Debug, Clone)]
pub struct FormatSpec {
    id: u64,
    pattern: Arc<NumberPattern>,
    symbols: Option<LocaleSymbols>,
    currency: Option<Currency>,
    lenient: bool,
}

impl FormatSpec {
    /// Create a strict spec for the pattern with root locale symbols.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the pattern is empty or malformed.
    pub fn new(pattern: &str) -> Result<Self> {
        Self::builder(pattern).build()
    }

    /// Start building a spec for the pattern.
    pub fn builder(pattern: impl Into<String>) -> FormatSpecBuilder {
        FormatSpecBuilder {
            pattern: pattern.into(),
            symbols: None,
            currency: None,
            lenient: false,
        }
    }

    /// Identity shared by all clones of this spec.
    #[must_use]
    pub fn id(&self) -> u64 {
        self.id
    }

    #[must_use]
    pub fn pattern(&self) -> &str {
        self.pattern.source()
    }

    pub(crate) fn compiled(&self) -> &Arc<NumberPattern> {
        &self.pattern
    }

    #[must_use]
    pub fn symbols(&self) -> Option<&LocaleSymbols> {
        self.symbols.as_ref()
    }

    #[must_use]
    pub fn currency(&self) -> Option<&Currency> {
        self.currency.as_ref()
    }

    #[must_use]
    pub fn is_lenient(&self) -> bool {
        self.lenient
    }
}

/// Builder for [`FormatSpec`].
#[derive(Debug, Clone)]
pub struct FormatSpecBuilder {
    pattern: String,
    symbols: Option<LocaleSymbols>,
    currency: Option<Currency>,
    lenient: bool,
}

impl FormatSpecBuilder {
    #[must_use]
    pub fn symbols(mut self, symbols: LocaleSymbols) -> Self {
        self.symbols = Some(symbols);
        self
    }

    /// Use the symbols of a locale tag.
    ///
    /// # Errors
    ///
    /// Returns an error for unknown locale tags.
    pub fn locale(mut self, tag: &str) -> Result<Self> {
        self.symbols = Some(LocaleSymbols::for_locale(tag)?);
        Ok(self)
    }

    #[must_use]
    pub fn currency(mut self, currency: Currency) -> Self {
        self.currency = Some(currency);
        self
    }

    #[must_use]
    pub fn lenient(mut self, lenient: bool) -> Self {
        self.lenient = lenient;
        self
    }

    /// Compile the pattern and build the spec.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the pattern is empty or malformed.
    pub fn build(self) -> Result<FormatSpec> {
        let mut pattern = NumberPattern::compile(&self.pattern)?;
        if let Some(currency) = &self.currency {
            if pattern.uses_currency() {
                pattern.set_fraction_digits(currency.fraction_digits);
            }
        }
        Ok(FormatSpec {
            id: next_format_id(),
            pattern: Arc::new(pattern),
            symbols: self.symbols,
            currency: self.currency,
            lenient: self.lenient,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_pattern_is_config_error() {
        let err = FormatSpec::new("").unwrap_err();
        assert!(matches!(err, cell_core::Error::InvalidPattern { .. }));
    }

    #[test]
    fn test_clone_shares_identity() {
        let spec = FormatSpec::new("#,##0").unwrap();
        let other = FormatSpec::new("#,##0").unwrap();
        assert_eq!(spec.clone().id(), spec.id());
        assert_ne!(spec.id(), other.id());
    }

    #[test]
    fn test_currency_sets_fraction_digits() {
        let spec = FormatSpec::builder("¤#,##0.00")
            .currency(Currency::from_code("JPY").unwrap())
            .build()
            .unwrap();
        assert_eq!(spec.compiled().max_fraction_digits(), 0);
        assert_eq!(spec.currency().map(|c| c.code.as_str()), Some("JPY"));
    }

    #[test]
    fn test_builder_defaults() {
        let spec = FormatSpec::builder("0.00").locale("de").unwrap().build().unwrap();
        assert!(!spec.is_lenient());
        assert_eq!(spec.symbols().map(|s| s.decimal_separator), Some(','));
        assert_eq!(spec.pattern(), "0.00");
    }
}
