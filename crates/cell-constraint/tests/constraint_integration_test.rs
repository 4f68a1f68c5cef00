use anyhow::Result;
use cell_constraint::{
    DateRange, NumberRange, PatternMatch, RangeSpec, RegexReplace, TemporalRange, WordForbid,
};
use cell_core::{CellContext, CellProcessor, Value};
use cell_format::{FormatSpec, NumberCodec, NumericKind, TemporalCodec, TemporalKind};
use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use std::str::FromStr;
use std::sync::Arc;

#[test]
fn test_number_range_prints_bounds_with_codec() -> Result<()> {
    let spec = FormatSpec::builder("#,##0.00").locale("de-DE")?.build()?;
    let printer = Arc::new(NumberCodec::new(NumericKind::Decimal, spec));
    let range = RangeSpec::new(Decimal::from(1000), Decimal::from(5000))?.printer(printer);
    let stage = NumberRange::new(range)?;

    let ctx = CellContext::new(4, 2, "amount");
    let failure = stage
        .process(Value::Decimal(Decimal::from_str("999.5")?), &ctx)
        .unwrap_err();

    assert_eq!(failure.variables().get("min"), Some(&Value::text("1.000,00")));
    assert_eq!(failure.variables().get("max"), Some(&Value::text("5.000,00")));
    assert_eq!(
        failure.default_message(),
        "999,50 does not lie between the min (1.000,00) and max (5.000,00) value."
    );
    assert_eq!(failure.context().column(), 2);
    Ok(())
}

#[test]
fn test_date_range_prints_bounds_with_pattern() -> Result<()> {
    let printer = Arc::new(TemporalCodec::with_pattern(TemporalKind::Date, "%d/%m/%Y")?);
    let min = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
    let max = NaiveDate::from_ymd_opt(2024, 12, 31).unwrap();
    let stage = DateRange::new(RangeSpec::new(min, max)?.printer(printer))?;

    let failure = stage
        .process(
            Value::Date(NaiveDate::from_ymd_opt(2025, 1, 1).unwrap()),
            &CellContext::anonymous(),
        )
        .unwrap_err();
    assert_eq!(failure.variables().get("min"), Some(&Value::text("01/01/2024")));
    assert_eq!(failure.variables().get("max"), Some(&Value::text("31/12/2024")));
    Ok(())
}

#[test]
fn test_temporal_range_exclusive_date_time() -> Result<()> {
    let at = |s: &str| NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M").unwrap();
    let stage = TemporalRange::new(
        RangeSpec::new(at("2024-01-01 00:00"), at("2024-01-02 00:00"))?.inclusive(false),
    )?;
    let ctx = CellContext::anonymous();

    assert!(stage.process(Value::DateTime(at("2024-01-01 12:00")), &ctx).is_ok());
    let failure = stage
        .process(Value::DateTime(at("2024-01-01 00:00")), &ctx)
        .unwrap_err();
    assert_eq!(failure.variables().get("inclusive"), Some(&Value::Bool(false)));
    Ok(())
}

#[test]
fn test_text_stages_compose() -> Result<()> {
    let stages: Vec<Box<dyn CellProcessor>> = vec![
        Box::new(RegexReplace::new(r"(\d{3})(\d{4})", "$1-$2")?),
        Box::new(PatternMatch::new(r"\d{3}-\d{4}")?.with_description("postal code")),
        Box::new(WordForbid::new(["000-"])),
    ];
    let ctx = CellContext::new(1, 1, "zip");
    let run = |input: &str| {
        stages
            .iter()
            .try_fold(Value::text(input), |value, stage| stage.process(value, &ctx))
    };

    assert_eq!(run("1234567").unwrap(), Value::text("123-4567"));
    assert_eq!(run("123-4567").unwrap(), Value::text("123-4567"));
    assert!(run("12345").unwrap_err().is_constraint());
    assert_eq!(
        run("0001234").unwrap_err().message_key(),
        cell_constraint::WORD_FORBID_KEY
    );
    Ok(())
}

#[test]
fn test_stages_are_shareable_across_threads() -> Result<()> {
    let stage = Arc::new(NumberRange::new(RangeSpec::new(0_i64, 1000)?)?);
    std::thread::scope(|scope| {
        for t in 0..8_i64 {
            let stage = Arc::clone(&stage);
            scope.spawn(move || {
                let ctx = CellContext::new(usize::try_from(t).unwrap(), 1, "n");
                for n in 0..500 {
                    let value = Value::Long(t * 200 + n);
                    let ok = (0..=1000).contains(&(t * 200 + n));
                    assert_eq!(stage.process(value, &ctx).is_ok(), ok);
                }
            });
        }
    });
    Ok(())
}
