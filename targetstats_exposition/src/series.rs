//! Series sample lines
//!
//! A sample line is `name[{labels}] value [timestamp] [# exemplar]`. The
//! metric name and label block are returned verbatim; labels are checked for
//! well-formedness but not decoded.

use crate::{Entry, MalformedReason};

/// Classify a trimmed, non-comment line as a series sample.
pub(crate) fn classify(line: &str) -> Result<Entry<'_>, MalformedReason> {
    let (series, remainder) = split_series(line)?;
    let (value, timestamp) = parse_value_and_timestamp(remainder)?;
    Ok(Entry::Series {
        series,
        value,
        timestamp,
    })
}

/// Split the line after its label block, or after the bare metric name.
fn split_series(line: &str) -> Result<(&str, &str), MalformedReason> {
    let name_end = line
        .find(|c: char| c == '{' || c.is_whitespace())
        .unwrap_or(line.len());
    if name_end == 0 {
        return Err(MalformedReason::MissingName);
    }

    let rest = &line[name_end..];
    if rest.starts_with('{') {
        let close = scan_labels(rest)?;
        let end = name_end + close + 1;
        Ok((&line[..end], &line[end..]))
    } else {
        Ok((&line[..name_end], rest))
    }
}

/// Scan the label block that opens `block`, returning the byte offset of its
/// closing brace.
///
/// Delimiters are all ASCII so byte offsets where the scan stops are always
/// char boundaries.
fn scan_labels(block: &str) -> Result<usize, MalformedReason> {
    let bytes = block.as_bytes();
    let mut pos = 1;

    loop {
        pos = skip_whitespace(bytes, pos);
        match bytes.get(pos) {
            None => return Err(MalformedReason::UnclosedLabels),
            Some(b'}') => return Ok(pos),
            Some(_) => {}
        }

        let name_start = pos;
        while let Some(&b) = bytes.get(pos) {
            if matches!(b, b'=' | b',' | b'}' | b'"') || b.is_ascii_whitespace() {
                break;
            }
            pos += 1;
        }
        let name = &block[name_start..pos];
        validate_label_name(name)?;

        pos = skip_whitespace(bytes, pos);
        if bytes.get(pos) != Some(&b'=') {
            return Err(MalformedReason::InvalidLabel(format!(
                "Label missing '=': {name}"
            )));
        }
        pos = skip_whitespace(bytes, pos + 1);
        if bytes.get(pos) != Some(&b'"') {
            return Err(MalformedReason::InvalidLabel(format!(
                "Label value must be quoted: {name}"
            )));
        }
        pos = scan_label_value(block, pos + 1)?;

        pos = skip_whitespace(bytes, pos);
        match bytes.get(pos) {
            Some(b',') => pos += 1,
            Some(b'}') => return Ok(pos),
            None => return Err(MalformedReason::UnclosedLabels),
            Some(_) => {
                return Err(MalformedReason::InvalidLabel(format!(
                    "Expected ',' or '}}' after value of {name}"
                )));
            }
        }
    }
}

fn validate_label_name(name: &str) -> Result<(), MalformedReason> {
    if name.is_empty() {
        return Err(MalformedReason::InvalidLabel("Empty label key".to_string()));
    }
    // Label names starting with __ are reserved for internal use
    if name.starts_with("__") {
        return Err(MalformedReason::InvalidLabel(
            "Label names starting with '__' are reserved for internal use".to_string(),
        ));
    }
    Ok(())
}

/// Scan a quoted label value starting just after its opening quote,
/// returning the offset just past the closing quote.
fn scan_label_value(block: &str, start: usize) -> Result<usize, MalformedReason> {
    let bytes = block.as_bytes();
    let mut pos = start;

    while let Some(&b) = bytes.get(pos) {
        match b {
            b'\\' => match bytes.get(pos + 1) {
                Some(b'\\' | b'"' | b'n') => pos += 2,
                Some(_) => {
                    let c = block[pos + 1..].chars().next().unwrap_or_default();
                    return Err(MalformedReason::InvalidLabel(format!(
                        "Invalid escape sequence: \\{c}"
                    )));
                }
                None => {
                    return Err(MalformedReason::InvalidLabel(
                        "Backslash at end of label value".to_string(),
                    ));
                }
            },
            b'"' => return Ok(pos + 1),
            _ => pos += 1,
        }
    }

    Err(MalformedReason::InvalidLabel(
        "Label value quotes not properly paired".to_string(),
    ))
}

fn skip_whitespace(bytes: &[u8], mut pos: usize) -> usize {
    while bytes.get(pos).is_some_and(u8::is_ascii_whitespace) {
        pos += 1;
    }
    pos
}

fn parse_value_and_timestamp(value_str: &str) -> Result<(f64, Option<i64>), MalformedReason> {
    // An OpenMetrics exemplar follows a '#' and is not part of the sample
    let mut parts = value_str
        .split_whitespace()
        .take_while(|part| !part.starts_with('#'));

    let value_part = parts.next().ok_or(MalformedReason::MissingValue)?;

    // Special float spellings of the exposition format
    let value = match value_part {
        "NaN" => f64::NAN,
        "+Inf" => f64::INFINITY,
        "-Inf" => f64::NEG_INFINITY,
        _ => value_part
            .parse::<f64>()
            .map_err(|_| MalformedReason::InvalidValue(value_part.to_string()))?,
    };

    let timestamp = if let Some(ts_str) = parts.next() {
        Some(
            ts_str
                .parse::<i64>()
                .map_err(|_| MalformedReason::InvalidTimestamp(ts_str.to_string()))?,
        )
    } else {
        None
    };

    if let Some(extra) = parts.next() {
        return Err(MalformedReason::TrailingContent(extra.to_string()));
    }

    Ok((value, timestamp))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn series(line: &str) -> &str {
        match classify(line).expect("series line") {
            Entry::Series { series, .. } => series,
            other => panic!("unexpected entry {other:?}"),
        }
    }

    fn value(line: &str) -> f64 {
        match classify(line).expect("series line") {
            Entry::Series { value, .. } => value,
            other => panic!("unexpected entry {other:?}"),
        }
    }

    #[test]
    fn test_series_no_labels() {
        assert_eq!(
            classify("http_requests_total 1027"),
            Ok(Entry::Series {
                series: "http_requests_total",
                value: 1027.0,
                timestamp: None,
            })
        );
    }

    #[test]
    fn test_series_with_labels() {
        assert_eq!(
            classify("http_requests_total{method=\"GET\",code=\"200\"} 1027"),
            Ok(Entry::Series {
                series: "http_requests_total{method=\"GET\",code=\"200\"}",
                value: 1027.0,
                timestamp: None,
            })
        );
        // Trailing comma and inner whitespace
        assert_eq!(
            series("metric{ a = \"1\" , b=\"2\", } 1"),
            "metric{ a = \"1\" , b=\"2\", }"
        );
        // Empty label block
        assert_eq!(series("metric{} 1"), "metric{}");
        // No whitespace between the label block and the value
        assert_eq!(series("metric{a=\"1\"}2"), "metric{a=\"1\"}");
    }

    #[test]
    fn test_series_with_timestamp() {
        assert_eq!(
            classify("http_requests_total 1027 1729113558073"),
            Ok(Entry::Series {
                series: "http_requests_total",
                value: 1027.0,
                timestamp: Some(1_729_113_558_073),
            })
        );
        assert_eq!(
            classify("http_requests_total 1027 soon"),
            Err(MalformedReason::InvalidTimestamp("soon".to_string()))
        );
        assert_eq!(
            classify("http_requests_total 1027 1729113558073 extra"),
            Err(MalformedReason::TrailingContent("extra".to_string()))
        );
    }

    #[test]
    fn test_series_with_exemplar() {
        assert_eq!(
            classify("foo_bucket{le=\"0.1\"} 8 # {id=\"abc\"} 0.5"),
            Ok(Entry::Series {
                series: "foo_bucket{le=\"0.1\"}",
                value: 8.0,
                timestamp: None,
            })
        );
    }

    #[test]
    fn test_invalid_value() {
        assert_eq!(
            classify("http_requests_total foobar"),
            Err(MalformedReason::InvalidValue("foobar".to_string()))
        );
        assert_eq!(classify("metric"), Err(MalformedReason::MissingValue));
        assert_eq!(
            classify("metric{a=\"b\"}"),
            Err(MalformedReason::MissingValue)
        );
    }

    #[test]
    fn test_empty_metric_name() {
        assert_eq!(classify("{}0"), Err(MalformedReason::MissingName));
        assert_eq!(
            classify("{label=\"value\"} 1"),
            Err(MalformedReason::MissingName)
        );
    }

    #[test]
    fn test_invalid_labels() {
        // Empty label key
        assert!(matches!(
            classify("metric{=\"value\"} 123"),
            Err(MalformedReason::InvalidLabel(_))
        ));
        // Label without equals
        assert!(matches!(
            classify("metric{key} 123"),
            Err(MalformedReason::InvalidLabel(_))
        ));
        // Unclosed block
        assert_eq!(
            classify("metric{key=\"v\""),
            Err(MalformedReason::UnclosedLabels)
        );
        assert_eq!(classify("metric{"), Err(MalformedReason::UnclosedLabels));
        // Missing separator between labels
        assert!(matches!(
            classify("metric{a=\"1\" b=\"2\"} 1"),
            Err(MalformedReason::InvalidLabel(_))
        ));
        // Empty label value is allowed
        assert!(classify("metric{key=\"\"} 123").is_ok());
    }

    #[test]
    fn test_label_name_validation() {
        assert!(matches!(
            classify("metric{__reserved=\"value\"} 123"),
            Err(MalformedReason::InvalidLabel(_))
        ));
        assert!(classify("metric{valid_label=\"value\"} 123").is_ok());
        // UTF-8 label names are allowed but not recommended
        assert!(classify("metric{français=\"value\"} 123").is_ok());
    }

    #[test]
    fn test_label_value_escaping() {
        assert_eq!(
            series(r#"metric{key="value with \"quotes\""} 123"#),
            r#"metric{key="value with \"quotes\""}"#
        );
        assert!(classify(r#"metric{key="path\\to\\file"} 123"#).is_ok());
        assert!(classify(r#"metric{key="line1\nline2"} 123"#).is_ok());
        // Braces and commas inside values do not end the label block
        assert_eq!(
            series(r#"escaped_metric{json="{\"key\": [1, 2]}",x="}"} 3.0"#),
            r#"escaped_metric{json="{\"key\": [1, 2]}",x="}"}"#
        );

        assert!(matches!(
            classify("metric{key=unquoted} 123"),
            Err(MalformedReason::InvalidLabel(_))
        ));
        assert!(matches!(
            classify(r#"metric{key="invalid\x"} 123"#),
            Err(MalformedReason::InvalidLabel(_))
        ));
        // Single quote character, an edge case from fuzzing
        assert!(matches!(
            classify(r#"metric{key="} 123"#),
            Err(MalformedReason::InvalidLabel(_))
        ));
    }

    #[test]
    fn test_special_float_values() {
        assert!(value("metric NaN").is_nan());
        assert_eq!(value("metric +Inf"), f64::INFINITY);
        assert_eq!(value("metric -Inf"), f64::NEG_INFINITY);
        assert_eq!(value("metric 1.23e45"), 1.23e45);
        assert_eq!(value("metric -42.5"), -42.5);
    }

    #[test]
    fn test_label_with_spaces() {
        let line = r#"vector_build_info{arch="aarch64",debug="false",host="d0cf527728fe",revision="745babd 2024-09-11 14:55:36.802851761",rust_version="1.78",version="0.41.1"} 1 1729113558073"#;
        let Ok(Entry::Series {
            series,
            value,
            timestamp,
        }) = classify(line)
        else {
            panic!("expected a series");
        };
        assert!(series.starts_with("vector_build_info{"));
        assert!(series.ends_with("version=\"0.41.1\"}"));
        assert_eq!(value, 1.0);
        assert_eq!(timestamp, Some(1_729_113_558_073));
    }

    proptest! {
        #[test]
        fn prop_no_panic_on_any_line(input: String) {
            let _ = classify(input.trim());
        }

        #[test]
        fn prop_empty_names_always_rejected(
            labels in "\\{[^}\n]*\\}",
            suffix in "[ \t]*",
            value in "[0-9]+",
        ) {
            let line = format!("{labels}{suffix} {value}");
            prop_assert_eq!(classify(&line), Err(MalformedReason::MissingName));
        }

        #[test]
        fn prop_valid_metric_names_accepted(
            name in "[a-zA-Z_:][a-zA-Z0-9_:]*",
            value in prop::num::f64::NORMAL | prop::num::f64::POSITIVE | prop::num::f64::NEGATIVE,
        ) {
            let line = format!("{name} {value}");
            prop_assert_eq!(
                classify(&line),
                Ok(Entry::Series { series: name.as_str(), value, timestamp: None })
            );
        }

        #[test]
        fn prop_reserved_label_names_rejected(
            name in "[a-zA-Z_][a-zA-Z0-9_]*",
            label_suffix in "[a-zA-Z0-9_]*",
            value in "[0-9]+",
        ) {
            let line = format!("{name}{{__{label_suffix}=\"value\"}} {value}");
            prop_assert!(matches!(classify(&line), Err(MalformedReason::InvalidLabel(_))));
        }

        #[test]
        fn prop_escaped_label_values_accepted(
            name in "[a-zA-Z_][a-zA-Z0-9_]*",
            label_name in "[a-zA-Z][a-zA-Z0-9_]*",
            raw_value in ".*",
            metric_value in "[0-9]+",
        ) {
            let escaped = raw_value
                .replace('\\', "\\\\")
                .replace('"', "\\\"")
                .replace('\n', "\\n");
            let labels = format!("{{{label_name}=\"{escaped}\"}}");
            let line = format!("{name}{labels} {metric_value}");

            let expected = format!("{name}{labels}");
            prop_assert_eq!(series(&line), expected.as_str());
        }

        #[test]
        fn prop_timestamp_parsing(
            name in "[a-zA-Z_][a-zA-Z0-9_]*",
            value in prop::num::f64::NORMAL,
            timestamp in prop::num::i64::ANY,
        ) {
            let line = format!("{name} {value} {timestamp}");
            prop_assert_eq!(
                classify(&line),
                Ok(Entry::Series { series: name.as_str(), value, timestamp: Some(timestamp) })
            );
        }
    }
}
