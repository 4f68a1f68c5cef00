use anyhow::Result;
use cell_core::Value;
use cell_format::formatter_cache_len;
use cell_pipeline::{Components, FieldConfig, FieldKind, FormatConfig, MappingConfig, MappingSet};
use rust_decimal::Decimal;
use std::sync::Arc;
use std::thread;

fn layout() -> MappingConfig {
    MappingConfig::new(vec![
        FieldConfig::new("amount", 1, FieldKind::Decimal)
            .format(FormatConfig {
                pattern: Some("#,##0.00".to_string()),
                locale: Some("de-DE".to_string()),
                ..FormatConfig::default()
            })
            .range("0,00", "100.000,00", true),
        FieldConfig::new("count", 2, FieldKind::Long).pattern_format("#,##0"),
        FieldConfig::new("day", 3, FieldKind::Date).pattern_format("%d.%m.%Y"),
    ])
}

#[test]
fn test_shared_mappings_across_threads() -> Result<()> {
    let mappings = Arc::new(MappingSet::from_config(&layout(), &Components::new())?);

    thread::scope(|scope| {
        for worker in 0..8_i64 {
            let mappings = Arc::clone(&mappings);
            scope.spawn(move || {
                for i in 0..250_i64 {
                    let n = worker * 1_000 + i;
                    let amount = Value::Decimal(Decimal::new(n * 100 + 25, 2));
                    let text = mappings.encode_cell(1, amount.clone(), 1).unwrap();
                    assert_eq!(mappings.decode_cell(1, text.as_deref(), 1).unwrap(), amount);

                    let text = mappings.encode_cell(2, Value::Long(n * 1_000), 1).unwrap();
                    assert_eq!(
                        mappings.decode_cell(2, text.as_deref(), 1).unwrap(),
                        Value::Long(n * 1_000)
                    );

                    let outcome = mappings.decode_record(
                        usize::try_from(i).unwrap(),
                        ["-1,00", "x", "30.02.2024"],
                    );
                    assert_eq!(outcome.failures.len(), 3);
                }
                // One formatter per numeric format on this thread.
                assert_eq!(formatter_cache_len(), 2);
            });
        }
    });
    Ok(())
}

#[test]
fn test_failures_carry_their_own_row() -> Result<()> {
    let mappings = Arc::new(MappingSet::from_config(&layout(), &Components::new())?);

    let rows: Vec<usize> = thread::scope(|scope| {
        let handles: Vec<_> = (1..=4)
            .map(|row| {
                let mappings = Arc::clone(&mappings);
                scope.spawn(move || {
                    let failure = mappings.decode_cell(2, Some("oops"), row).unwrap_err();
                    failure.context().row()
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });
    assert_eq!(rows, vec![1, 2, 3, 4]);
    Ok(())
}
