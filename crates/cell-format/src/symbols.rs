//! Locale number symbols and currencies

use cell_core::{Error, Result};
use serde::{Deserialize, Serialize};

/// Characters and strings used when rendering numbers for a locale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocaleSymbols {
    /// Locale tag these symbols were resolved for
    pub locale: String,
    pub decimal_separator: char,
    pub grouping_separator: char,
    pub minus_sign: char,
    pub percent: char,
    pub per_mille: char,
    /// Local currency symbol (e.g. "€")
    pub currency_symbol: String,
    /// ISO 4217 code of the local currency (e.g. "EUR")
    pub currency_code: String,
}

impl LocaleSymbols {
    /// Locale-neutral symbols.
    #[must_use]
    pub fn root() -> Self {
        Self::build("root", '.', ',', "¤", "XXX")
    }

    /// Resolve symbols for a locale tag such as `de-DE` or `fr_FR`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownLocale`] for tags without known symbols.
    pub fn for_locale(tag: &str) -> Result<Self> {
        let normalized = tag.trim().replace('_', "-").to_lowercase();
        let symbols = match normalized.as_str() {
            "" | "root" => Self::root(),
            "en" | "en-us" => Self::build(&normalized, '.', ',', "$", "USD"),
            "en-gb" => Self::build(&normalized, '.', ',', "£", "GBP"),
            "de" | "de-de" => Self::build(&normalized, ',', '.', "€", "EUR"),
            "de-ch" => Self::build(&normalized, '.', '\u{2019}', "CHF", "CHF"),
            "fr" | "fr-fr" => Self::build(&normalized, ',', '\u{202f}', "€", "EUR"),
            "ja" | "ja-jp" => Self::build(&normalized, '.', ',', "￥", "JPY"),
            _ => return Err(Error::UnknownLocale(tag.to_string())),
        };
        Ok(symbols)
    }

    fn build(
        locale: &str,
        decimal_separator: char,
        grouping_separator: char,
        currency_symbol: &str,
        currency_code: &str,
    ) -> Self {
        Self {
            locale: locale.to_string(),
            decimal_separator,
            grouping_separator,
            minus_sign: '-',
            percent: '%',
            per_mille: '‰',
            currency_symbol: currency_symbol.to_string(),
            currency_code: currency_code.to_string(),
        }
    }

    /// Whether `c` is accepted as a grouping separator when parsing.
    ///
    /// Locales grouping with a no-break space also accept a plain space.
    #[must_use]
    pub fn is_grouping(&self, c: char) -> bool {
        c == self.grouping_separator
            || (c == ' ' && matches!(self.grouping_separator, '\u{a0}' | '\u{202f}'))
    }
}

impl Default for LocaleSymbols {
    fn default() -> Self {
        Self::root()
    }
}

/// An ISO 4217 currency.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Currency {
    pub code: String,
    pub symbol: String,
    pub fraction_digits: u32,
}

impl Currency {
    /// Look up a currency by its three-letter code.
    ///
    /// # Errors
    ///
    /// Returns an error when the code is not three ASCII letters.
    pub fn from_code(code: &str) -> Result<Self> {
        let code = code.trim().to_uppercase();
        if code.len() != 3 || !code.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(Error::invalid_value(
                code,
                "currency",
                "expected a three-letter ISO 4217 code",
            ));
        }
        let (symbol, fraction_digits) = match code.as_str() {
            "USD" => ("$", 2),
            "EUR" => ("€", 2),
            "GBP" => ("£", 2),
            "JPY" => ("￥", 0),
            _ => (code.as_str(), 2),
        };
        Ok(Self {
            symbol: symbol.to_string(),
            fraction_digits,
            code,
        })
    }
}
