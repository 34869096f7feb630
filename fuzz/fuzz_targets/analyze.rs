#![no_main]

use libfuzzer_sys::fuzz_target;
use targetstats::{analyze::analyze_bytes, stats::SortBy};
use targetstats_exposition::{Classifier, Entry};

fuzz_target!(|data: &[u8]| {
    let entries: Vec<_> = Classifier::new(data).collect();

    // Nothing follows a malformed entry or a classifier fault
    if let Some(idx) = entries
        .iter()
        .position(|e| matches!(e, Err(_) | Ok(Entry::Malformed { .. })))
    {
        assert_eq!(idx, entries.len() - 1, "classifier must stop after {idx}");
    }

    let mut types = 0.0;
    let mut series = 0.0;
    for entry in entries.iter().flatten() {
        match entry {
            Entry::Type { .. } => types += 1.0,
            Entry::Series { series: text, .. } => {
                assert!(!text.is_empty(), "series text must not be empty");
                series += 1.0;
            }
            _ => {}
        }
    }

    let clean = entries
        .iter()
        .all(|e| !matches!(e, Err(_) | Ok(Entry::Malformed { .. })));

    match analyze_bytes(data, SortBy::Value) {
        Ok(result) => {
            assert!(clean, "analysis succeeded over a malformed input");
            let total = |group: &[targetstats::stats::Stat]| -> f64 {
                group.iter().map(|s| s.value()).sum()
            };
            assert_eq!(total(&result.generic), entries.len() as f64);
            assert_eq!(total(&result.types), types);
            assert_eq!(total(&result.series), series);
            assert!(
                result
                    .generic
                    .windows(2)
                    .all(|w| w[0].value() >= w[1].value())
            );
        }
        Err(_) => assert!(!clean, "analysis failed over a clean input"),
    }
});
