//! Decimal number patterns
//!
//! Supports the usual decimal-format pattern syntax: `0` and `#` digits,
//! `,` grouping, `.` decimal separator, quoted literals, `¤`/`¤¤` currency,
//! `%` and `‰` multipliers and an optional `;` negative subpattern.

use crate::symbols::LocaleSymbols;
use cell_core::{Error, Result};
use rust_decimal::{Decimal, RoundingStrategy};
use thiserror::Error;

/// One piece of a prefix or suffix.
#[derive(Debug, Clone, PartialEq, Eq)]
enum AffixPart {
    Literal(String),
    CurrencySymbol,
    CurrencyCode,
    Percent,
    PerMille,
    Minus,
}

type Affix = Vec<AffixPart>;

/// A compiled number pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NumberPattern {
    source: String,
    positive_prefix: Affix,
    positive_suffix: Affix,
    negative: Option<(Affix, Affix)>,
    min_integer_digits: u32,
    min_fraction_digits: u32,
    max_fraction_digits: u32,
    grouping_size: Option<usize>,
    decimal_always_shown: bool,
    multiplier: u32,
}

/// Resolved rendering environment for a pattern.
#[derive(Debug, Clone)]
pub struct Symbols<'a> {
    pub locale: &'a LocaleSymbols,
    pub currency_symbol: &'a str,
    pub currency_code: &'a str,
}

/// Errors raised while parsing text with a pattern.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NumberParseError {
    #[error("input is empty")]
    Empty,
    #[error("input does not match the pattern affixes")]
    AffixMismatch,
    #[error("unexpected character '{0}'")]
    UnexpectedChar(char),
    #[error("no digits found")]
    NoDigits,
    #[error("value exceeds decimal precision")]
    Precision,
}

/// Errors raised while rendering a value with a pattern.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NumberFormatError {
    #[error("scaling by {0} leaves the representable range")]
    Overflow(u32),
    #[error("value is not finite")]
    NotFinite,
    #[error("{0} is not a number")]
    NotNumeric(&'static str),
}

impl NumberFormatError {
    #[must_use]
    pub fn reason(&self) -> &'static str {
        match self {
            Self::Overflow(_) => "overflow",
            Self::NotFinite => "not_finite",
            Self::NotNumeric(_) => "type",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Prefix,
    Number,
    Suffix,
}

struct SubPattern {
    prefix: Affix,
    number: String,
    suffix: Affix,
}

impl NumberPattern {
    /// Compile a pattern string.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidPattern`] for empty or malformed patterns.
    pub fn compile(pattern: &str) -> Result<Self> {
        if pattern.is_empty() {
            return Err(Error::invalid_pattern(pattern, "pattern should not be empty"));
        }

        let (positive_src, negative_src) = split_subpatterns(pattern)?;
        let positive = parse_subpattern(pattern, &positive_src)?;
        if positive.number.is_empty() {
            return Err(Error::invalid_pattern(pattern, "pattern has no digits"));
        }

        let negative = match negative_src {
            Some(src) => {
                let sub = parse_subpattern(pattern, &src)?;
                Some((sub.prefix, sub.suffix))
            }
            None => None,
        };

        let mut compiled = Self {
            source: pattern.to_string(),
            positive_prefix: positive.prefix,
            positive_suffix: positive.suffix,
            negative,
            min_integer_digits: 0,
            min_fraction_digits: 0,
            max_fraction_digits: 0,
            grouping_size: None,
            decimal_always_shown: false,
            multiplier: 1,
        };
        compiled.apply_number_section(&positive.number)?;
        compiled.multiplier = compiled.detect_multiplier();
        Ok(compiled)
    }

    fn apply_number_section(&mut self, number: &str) -> Result<()> {
        let (integer, fraction) = match number.split_once('.') {
            Some((i, f)) => {
                if f.contains('.') {
                    return Err(Error::invalid_pattern(
                        &self.source,
                        "multiple decimal separators",
                    ));
                }
                self.decimal_always_shown = f.is_empty();
                (i, f)
            }
            None => (number, ""),
        };

        if fraction.contains(',') {
            return Err(Error::invalid_pattern(
                &self.source,
                "grouping separator in fraction part",
            ));
        }

        let mut seen_zero = false;
        for c in integer.chars() {
            match c {
                '0' => seen_zero = true,
                '#' if seen_zero => {
                    return Err(Error::invalid_pattern(
                        &self.source,
                        "'#' follows '0' in integer part",
                    ));
                }
                _ => {}
            }
        }

        let mut seen_hash = false;
        for c in fraction.chars() {
            match c {
                '#' => seen_hash = true,
                '0' if seen_hash => {
                    return Err(Error::invalid_pattern(
                        &self.source,
                        "'0' follows '#' in fraction part",
                    ));
                }
                _ => {}
            }
        }

        self.min_integer_digits = count_char(integer, '0');
        self.min_fraction_digits = count_char(fraction, '0');
        self.max_fraction_digits = u32::try_from(fraction.len()).unwrap_or(u32::MAX);
        self.grouping_size = integer
            .rfind(',')
            .map(|pos| integer.len() - pos - 1)
            .filter(|size| *size > 0);
        Ok(())
    }

    fn detect_multiplier(&self) -> u32 {
        let parts = self
            .positive_prefix
            .iter()
            .chain(self.positive_suffix.iter());
        let mut multiplier = 1;
        for part in parts {
            match part {
                AffixPart::Percent => multiplier = 100,
                AffixPart::PerMille => multiplier = 1000,
                _ => {}
            }
        }
        multiplier
    }

    /// The pattern source text.
    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Whether the pattern renders a currency symbol or code.
    #[must_use]
    pub fn uses_currency(&self) -> bool {
        self.positive_prefix
            .iter()
            .chain(self.positive_suffix.iter())
            .any(|p| matches!(p, AffixPart::CurrencySymbol | AffixPart::CurrencyCode))
    }

    /// Override the fraction digit range (used for currency defaults).
    pub fn set_fraction_digits(&mut self, digits: u32) {
        self.min_fraction_digits = digits;
        self.max_fraction_digits = digits;
    }

    #[must_use]
    pub fn max_fraction_digits(&self) -> u32 {
        self.max_fraction_digits
    }

    /// Render a decimal into `out`, rounding half-even.
    ///
    /// # Errors
    ///
    /// Returns [`NumberFormatError::Overflow`] when the `%` or `‰` scaling
    /// leaves the decimal range.
    pub fn format_into(
        &self,
        value: Decimal,
        symbols: &Symbols<'_>,
        out: &mut String,
    ) -> std::result::Result<(), NumberFormatError> {
        let scaled = value
            .checked_mul(Decimal::from(self.multiplier))
            .ok_or(NumberFormatError::Overflow(self.multiplier))?;
        let rounded = scaled
            .round_dp_with_strategy(self.max_fraction_digits, RoundingStrategy::MidpointNearestEven);
        let negative = rounded.is_sign_negative() && !rounded.is_zero();
        self.render_digits(negative, &rounded.abs().to_string(), symbols, out);
        Ok(())
    }

    /// Render a float that has no decimal form, such as `1e30`.
    ///
    /// Uses the shortest digits that round-trip, rounded to the pattern's
    /// maximum fraction digits when they run longer.
    ///
    /// # Errors
    ///
    /// Returns [`NumberFormatError::NotFinite`] for NaN and infinities, and
    /// [`NumberFormatError::Overflow`] when scaling leaves the float range.
    pub fn format_float_into(
        &self,
        value: f64,
        symbols: &Symbols<'_>,
        out: &mut String,
    ) -> std::result::Result<(), NumberFormatError> {
        if !value.is_finite() {
            return Err(NumberFormatError::NotFinite);
        }
        let scaled = value * f64::from(self.multiplier);
        if !scaled.is_finite() {
            return Err(NumberFormatError::Overflow(self.multiplier));
        }
        let magnitude = scaled.abs();
        let max_fraction = self.max_fraction_digits as usize;
        let shortest = magnitude.to_string();
        let digits = match shortest.split_once('.') {
            Some((_, fraction)) if fraction.len() > max_fraction => {
                format!("{magnitude:.max_fraction$}")
            }
            _ => shortest,
        };
        let negative =
            scaled.is_sign_negative() && digits.bytes().any(|b| b.is_ascii_digit() && b != b'0');
        self.render_digits(negative, &digits, symbols, out);
        Ok(())
    }

    fn render_digits(&self, negative: bool, digits: &str, symbols: &Symbols<'_>, out: &mut String) {
        let (int_digits, frac_digits) = digits.split_once('.').unwrap_or((digits, ""));

        let int_digits = int_digits.trim_start_matches('0');
        let mut fraction = frac_digits.trim_end_matches('0').to_string();
        let min_frac = self.min_fraction_digits as usize;
        while fraction.len() < min_frac {
            fraction.push('0');
        }

        let mut integer = String::new();
        let min_int = self.min_integer_digits as usize;
        for _ in int_digits.len()..min_int {
            integer.push('0');
        }
        integer.push_str(int_digits);
        if integer.is_empty() && fraction.is_empty() {
            integer.push('0');
        }

        let (prefix, suffix) = self.affixes(negative);
        if negative && self.negative.is_none() {
            out.push(symbols.locale.minus_sign);
        }
        render_affix(prefix, symbols, out);
        self.push_grouped(&integer, symbols.locale.grouping_separator, out);
        if !fraction.is_empty() || self.decimal_always_shown {
            out.push(symbols.locale.decimal_separator);
            out.push_str(&fraction);
        }
        render_affix(suffix, symbols, out);
    }

    fn affixes(&self, negative: bool) -> (&Affix, &Affix) {
        match (&self.negative, negative) {
            (Some((prefix, suffix)), true) => (prefix, suffix),
            _ => (&self.positive_prefix, &self.positive_suffix),
        }
    }

    fn push_grouped(&self, integer: &str, separator: char, out: &mut String) {
        let Some(size) = self.grouping_size else {
            out.push_str(integer);
            return;
        };
        let len = integer.len();
        for (index, ch) in integer.chars().enumerate() {
            if index > 0 && (len - index) % size == 0 {
                out.push(separator);
            }
            out.push(ch);
        }
    }

    /// Parse `text` into a decimal, consuming the whole input.
    ///
    /// `scratch` is reused to collect digits.
    ///
    /// # Errors
    ///
    /// Returns a [`NumberParseError`] when the text does not follow the pattern.
    pub fn parse_with(
        &self,
        text: &str,
        symbols: &Symbols<'_>,
        scratch: &mut String,
    ) -> std::result::Result<Decimal, NumberParseError> {
        if text.is_empty() {
            return Err(NumberParseError::Empty);
        }

        let positive = (
            affix_text(&self.positive_prefix, symbols),
            affix_text(&self.positive_suffix, symbols),
        );
        let negative = match &self.negative {
            Some((prefix, suffix)) => (affix_text(prefix, symbols), affix_text(suffix, symbols)),
            None => (
                format!("{}{}", symbols.locale.minus_sign, positive.0),
                positive.1.clone(),
            ),
        };

        let (body, is_negative) = if let Some(body) = strip_affixes(text, &negative) {
            (body, true)
        } else if let Some(body) = strip_affixes(text, &positive) {
            (body, false)
        } else {
            return Err(NumberParseError::AffixMismatch);
        };

        scratch.clear();
        let mut seen_decimal = false;
        let mut digit_count = 0usize;
        for c in body.chars() {
            if c.is_ascii_digit() {
                scratch.push(c);
                digit_count += 1;
            } else if c == symbols.locale.decimal_separator && !seen_decimal {
                scratch.push('.');
                seen_decimal = true;
            } else if !seen_decimal && symbols.locale.is_grouping(c) {
                continue;
            } else {
                return Err(NumberParseError::UnexpectedChar(c));
            }
        }
        if digit_count == 0 {
            return Err(NumberParseError::NoDigits);
        }
        if scratch.ends_with('.') {
            scratch.pop();
        }

        let mut value = Decimal::from_str_exact(scratch).map_err(|_| NumberParseError::Precision)?;
        if self.multiplier != 1 {
            value = value
                .checked_div(Decimal::from(self.multiplier))
                .ok_or(NumberParseError::Precision)?;
        }
        if is_negative {
            value.set_sign_negative(true);
        }
        Ok(value.normalize())
    }
}

/// Plain parsing without a pattern: optional sign, digits and `.`.
///
/// # Errors
///
/// Returns a [`NumberParseError`] for anything that is not a plain decimal.
pub fn parse_plain(text: &str) -> std::result::Result<Decimal, NumberParseError> {
    if text.is_empty() {
        return Err(NumberParseError::Empty);
    }
    let digits = text
        .strip_prefix(|c: char| c == '-' || c == '+')
        .unwrap_or(text);
    if !digits.chars().any(|c| c.is_ascii_digit()) {
        return Err(NumberParseError::NoDigits);
    }
    if let Some(c) = digits.chars().find(|c| !c.is_ascii_digit() && *c != '.') {
        return Err(NumberParseError::UnexpectedChar(c));
    }
    Decimal::from_str_exact(text).map_err(|_| NumberParseError::Precision)
}

fn split_subpatterns(pattern: &str) -> Result<(String, Option<String>)> {
    let mut in_quote = false;
    for (index, c) in pattern.char_indices() {
        match c {
            '\'' => in_quote = !in_quote,
            ';' if !in_quote => {
                let negative = &pattern[index + 1..];
                if negative.is_empty() {
                    return Err(Error::invalid_pattern(pattern, "empty negative subpattern"));
                }
                return Ok((pattern[..index].to_string(), Some(negative.to_string())));
            }
            _ => {}
        }
    }
    if in_quote {
        return Err(Error::invalid_pattern(pattern, "unterminated quote"));
    }
    Ok((pattern.to_string(), None))
}

fn parse_subpattern(full: &str, src: &str) -> Result<SubPattern> {
    let mut section = Section::Prefix;
    let mut prefix = Affix::new();
    let mut suffix = Affix::new();
    let mut number = String::new();
    let mut chars = src.chars().peekable();

    while let Some(c) = chars.next() {
        let is_number_char = matches!(c, '0' | '#' | ',' | '.');
        match section {
            Section::Prefix if is_number_char => {
                section = Section::Number;
                number.push(c);
                continue;
            }
            Section::Number if is_number_char => {
                number.push(c);
                continue;
            }
            Section::Number => section = Section::Suffix,
            Section::Suffix if is_number_char => {
                return Err(Error::invalid_pattern(full, "digits after suffix"));
            }
            _ => {}
        }

        if matches!(c, 'E' | 'e') && matches!(section, Section::Suffix) && suffix.is_empty() {
            return Err(Error::invalid_pattern(full, "exponent notation is not supported"));
        }

        let target = match section {
            Section::Prefix => &mut prefix,
            _ => &mut suffix,
        };
        let part = match c {
            '\'' => {
                let mut literal = String::new();
                if chars.peek() == Some(&'\'') {
                    chars.next();
                    literal.push('\'');
                } else {
                    loop {
                        match chars.next() {
                            Some('\'') if chars.peek() == Some(&'\'') => {
                                chars.next();
                                literal.push('\'');
                            }
                            Some('\'') | None => break,
                            Some(other) => literal.push(other),
                        }
                    }
                }
                AffixPart::Literal(literal)
            }
            '¤' => {
                if chars.peek() == Some(&'¤') {
                    chars.next();
                    AffixPart::CurrencyCode
                } else {
                    AffixPart::CurrencySymbol
                }
            }
            '%' => AffixPart::Percent,
            '‰' => AffixPart::PerMille,
            '-' => AffixPart::Minus,
            other => AffixPart::Literal(other.to_string()),
        };
        push_part(target, part);
    }

    if number.starts_with(',') || number.ends_with(',') || number.contains(",.") {
        return Err(Error::invalid_pattern(full, "misplaced grouping separator"));
    }

    Ok(SubPattern {
        prefix,
        number,
        suffix,
    })
}

fn push_part(affix: &mut Affix, part: AffixPart) {
    if let (Some(AffixPart::Literal(last)), AffixPart::Literal(next)) = (affix.last_mut(), &part) {
        last.push_str(next);
        return;
    }
    affix.push(part);
}

fn count_char(s: &str, target: char) -> u32 {
    u32::try_from(s.chars().filter(|c| *c == target).count()).unwrap_or(u32::MAX)
}

fn render_affix(affix: &Affix, symbols: &Symbols<'_>, out: &mut String) {
    for part in affix {
        match part {
            AffixPart::Literal(s) => out.push_str(s),
            AffixPart::CurrencySymbol => out.push_str(symbols.currency_symbol),
            AffixPart::CurrencyCode => out.push_str(symbols.currency_code),
            AffixPart::Percent => out.push(symbols.locale.percent),
            AffixPart::PerMille => out.push(symbols.locale.per_mille),
            AffixPart::Minus => out.push(symbols.locale.minus_sign),
        }
    }
}

fn affix_text(affix: &Affix, symbols: &Symbols<'_>) -> String {
    let mut out = String::new();
    render_affix(affix, symbols, &mut out);
    out
}

fn strip_affixes<'t>(text: &'t str, (prefix, suffix): &(String, String)) -> Option<&'t str> {
    let body = text.strip_prefix(prefix.as_str())?;
    let body = body.strip_suffix(suffix.as_str())?;
    (!body.is_empty()).then_some(body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn render(pattern: &str, value: &str, locale: &LocaleSymbols) -> String {
        let compiled = NumberPattern::compile(pattern).unwrap();
        let symbols = Symbols {
            locale,
            currency_symbol: &locale.currency_symbol,
            currency_code: &locale.currency_code,
        };
        let mut out = String::new();
        compiled
            .format_into(Decimal::from_str(value).unwrap(), &symbols, &mut out)
            .unwrap();
        out
    }

    fn parse(pattern: &str, text: &str, locale: &LocaleSymbols) -> std::result::Result<Decimal, NumberParseError> {
        let compiled = NumberPattern::compile(pattern).unwrap();
        let symbols = Symbols {
            locale,
            currency_symbol: &locale.currency_symbol,
            currency_code: &locale.currency_code,
        };
        compiled.parse_with(text, &symbols, &mut String::new())
    }

    #[test]
    fn test_compile_digit_counts() {
        let p = NumberPattern::compile("#,##0.00#").unwrap();
        assert_eq!(p.min_integer_digits, 1);
        assert_eq!(p.min_fraction_digits, 2);
        assert_eq!(p.max_fraction_digits, 3);
        assert_eq!(p.grouping_size, Some(3));
    }

    #[test]
    fn test_compile_rejects_malformed() {
        assert!(NumberPattern::compile("").is_err());
        assert!(NumberPattern::compile("abc").is_err());
        assert!(NumberPattern::compile("0.#0").is_err());
        assert!(NumberPattern::compile("0.00E0").is_err());
        assert!(NumberPattern::compile("'unterminated 0").is_err());
        assert!(NumberPattern::compile("0;").is_err());
    }

    #[test]
    fn test_format_grouping_and_rounding() {
        let root = LocaleSymbols::root();
        assert_eq!(render("#,##0.00", "1234567.891", &root), "1,234,567.89");
        assert_eq!(render("#,##0.00", "0.125", &root), "0.12");
        assert_eq!(render("#,##0.00", "0.135", &root), "0.14");
        assert_eq!(render("0", "-42", &root), "-42");
        assert_eq!(render("#", "0", &root), "0");
        assert_eq!(render("000", "7", &root), "007");
        assert_eq!(render("#,##0.###", "1000.5", &root), "1,000.5");
    }

    #[test]
    fn test_format_locale_symbols() {
        let de = LocaleSymbols::for_locale("de-DE").unwrap();
        assert_eq!(render("#,##0.00 ¤", "1234.5", &de), "1.234,50 €");
        assert_eq!(render("0.0%", "0.256", &de), "25,6%");
    }

    #[test]
    fn test_format_negative_subpattern() {
        let root = LocaleSymbols::root();
        assert_eq!(render("#,##0.00;(#,##0.00)", "-5", &root), "(5.00)");
        assert_eq!(render("#,##0.00;(#,##0.00)", "5", &root), "5.00");
    }

    #[test]
    fn test_percent_scaling_overflow_is_reported() {
        let root = LocaleSymbols::root();
        let symbols = Symbols {
            locale: &root,
            currency_symbol: &root.currency_symbol,
            currency_code: &root.currency_code,
        };
        let percent = NumberPattern::compile("0%").unwrap();
        let mut out = String::new();
        assert_eq!(
            percent.format_into(Decimal::MAX, &symbols, &mut out),
            Err(NumberFormatError::Overflow(100))
        );
        assert_eq!(
            percent.format_float_into(f64::MAX, &symbols, &mut out),
            Err(NumberFormatError::Overflow(100))
        );
    }

    #[test]
    fn test_format_float_beyond_decimal_range() {
        let root = LocaleSymbols::root();
        let symbols = Symbols {
            locale: &root,
            currency_symbol: &root.currency_symbol,
            currency_code: &root.currency_code,
        };
        let grouped = NumberPattern::compile("#,##0.00").unwrap();

        let mut out = String::new();
        grouped.format_float_into(-1e30, &symbols, &mut out).unwrap();
        assert_eq!(out, "-1,000,000,000,000,000,000,000,000,000,000.00");

        out.clear();
        grouped.format_float_into(1e-30, &symbols, &mut out).unwrap();
        assert_eq!(out, "0.00");

        assert_eq!(
            grouped.format_float_into(f64::NAN, &symbols, &mut out),
            Err(NumberFormatError::NotFinite)
        );
    }

    #[test]
    fn test_format_quoted_literal() {
        let root = LocaleSymbols::root();
        assert_eq!(render("0 'pcs'", "3", &root), "3 pcs");
        assert_eq!(render("0''", "3", &root), "3'");
    }

    #[test]
    fn test_parse_locale_text() {
        let de = LocaleSymbols::for_locale("de").unwrap();
        assert_eq!(
            parse("#,##0.00", "1.234,50", &de).unwrap(),
            Decimal::from_str("1234.5").unwrap()
        );
        assert_eq!(
            parse("#,##0.00", "-0,75", &de).unwrap(),
            Decimal::from_str("-0.75").unwrap()
        );
    }

    #[test]
    fn test_parse_percent_and_negative_subpattern() {
        let root = LocaleSymbols::root();
        assert_eq!(
            parse("0%", "25%", &root).unwrap(),
            Decimal::from_str("0.25").unwrap()
        );
        assert_eq!(
            parse("0.00;(0.00)", "(1.50)", &root).unwrap(),
            Decimal::from_str("-1.5").unwrap()
        );
    }

    #[test]
    fn test_parse_rejects_garbage() {
        let root = LocaleSymbols::root();
        assert_eq!(parse("0", "", &root), Err(NumberParseError::Empty));
        assert_eq!(
            parse("0", "12a", &root),
            Err(NumberParseError::UnexpectedChar('a'))
        );
        assert_eq!(parse("0 'pcs'", "12 kg", &root), Err(NumberParseError::AffixMismatch));
        assert_eq!(
            parse("0.00", "1.2.3", &root),
            Err(NumberParseError::UnexpectedChar('.'))
        );
    }

    #[test]
    fn test_parse_plain() {
        assert_eq!(parse_plain("-12.5").unwrap(), Decimal::from_str("-12.5").unwrap());
        assert_eq!(parse_plain("abc"), Err(NumberParseError::NoDigits));
        assert_eq!(parse_plain("1e5"), Err(NumberParseError::UnexpectedChar('e')));
    }
}
