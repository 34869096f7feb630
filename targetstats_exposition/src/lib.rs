//! Prometheus text format classifier
//!
//! This crate splits a buffer of Prometheus / OpenMetrics text exposition
//! into classified entries, one per non-empty line. Classification is lazy:
//! [`Classifier`] is an iterator and does no work until pulled.
//! <https://github.com/prometheus/docs/blob/main/content/docs/instrumenting/exposition_formats.md>
//!
//! Each line is one of a `# TYPE`, `# HELP` or `# UNIT` declaration, some
//! other `#` comment, or a series sample. A line that cannot be classified is
//! reported as [`Entry::Malformed`], after which the classifier yields
//! nothing further.

#![deny(clippy::all)]
#![deny(clippy::cargo)]
#![deny(clippy::pedantic)]
#![deny(clippy::print_stdout)]
#![deny(clippy::print_stderr)]
#![deny(clippy::dbg_macro)]
#![deny(clippy::unwrap_used)]
#![deny(unused_extern_crates)]
#![deny(unused_allocation)]
#![deny(unused_assignments)]
#![deny(unused_comparisons)]
#![deny(unreachable_pub)]
#![deny(missing_docs)]
#![deny(missing_copy_implementations)]
#![deny(missing_debug_implementations)]
#![allow(clippy::multiple_crate_versions)]

mod series;

use std::{fmt, str::FromStr};

use tracing::trace;

/// Errors produced by [`Classifier`]
///
/// These are faults in the input that prevent the classifier from producing
/// any further entries. Syntax problems within a line are not errors, see
/// [`Entry::Malformed`].
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// A line of the input was not valid UTF-8
    #[error("line {line} is not valid UTF-8: {source}")]
    Utf8 {
        /// Line number, 1-based
        line: usize,
        /// Underlying decode error
        #[source]
        source: std::str::Utf8Error,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
/// Metric types a `# TYPE` line may declare
pub enum MetricType {
    /// A cumulative metric that only increases
    Counter,
    /// A single numerical value that can go up and down
    Gauge,
    /// Observations counted into configurable buckets
    Histogram,
    /// Observations summarized as quantiles
    Summary,
    /// Prometheus metric without a declared type
    Untyped,
    /// OpenMetrics histogram over a gauge
    GaugeHistogram,
    /// OpenMetrics info metric
    Info,
    /// OpenMetrics set of boolean states
    StateSet,
    /// OpenMetrics metric of unknown type
    Unknown,
}

impl MetricType {
    /// The type as written in a `# TYPE` line
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Counter => "counter",
            Self::Gauge => "gauge",
            Self::Histogram => "histogram",
            Self::Summary => "summary",
            Self::Untyped => "untyped",
            Self::GaugeHistogram => "gaugehistogram",
            Self::Info => "info",
            Self::StateSet => "stateset",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for MetricType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MetricType {
    type Err = MalformedReason;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "counter" => Ok(Self::Counter),
            "gauge" => Ok(Self::Gauge),
            "histogram" => Ok(Self::Histogram),
            "summary" => Ok(Self::Summary),
            "untyped" => Ok(Self::Untyped),
            "gaugehistogram" => Ok(Self::GaugeHistogram),
            "info" => Ok(Self::Info),
            "stateset" => Ok(Self::StateSet),
            "unknown" => Ok(Self::Unknown),
            _ => Err(MalformedReason::UnknownMetricType(s.to_string())),
        }
    }
}

/// Why a line was classified as [`Entry::Malformed`]
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum MalformedReason {
    /// Unknown metric type in a TYPE line
    #[error("unknown metric type {0:?}")]
    UnknownMetricType(String),
    /// A TYPE, HELP or UNIT line without a metric name
    #[error("missing metric name in {0} line")]
    MissingMetadataName(&'static str),
    /// A TYPE line without a metric type
    #[error("missing metric type in TYPE line")]
    MissingMetricType,
    /// Missing name in a series line
    #[error("missing metric name")]
    MissingName,
    /// Missing value in a series line
    #[error("missing value")]
    MissingValue,
    /// Value that cannot be parsed as a number
    #[error("invalid value {0:?}")]
    InvalidValue(String),
    /// Timestamp that cannot be parsed as milliseconds since the epoch
    #[error("invalid timestamp {0:?}")]
    InvalidTimestamp(String),
    /// Content after the last expected token of a line
    #[error("unexpected trailing content {0:?}")]
    TrailingContent(String),
    /// Label block opened but never closed
    #[error("unclosed label block")]
    UnclosedLabels,
    /// Invalid label format
    #[error("invalid label: {0}")]
    InvalidLabel(String),
}

/// A classified line of exposition text
///
/// Variants borrow from the buffer handed to [`Classifier::new`] and carry
/// only the fields relevant to their kind.
#[derive(Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum Entry<'a> {
    /// `# TYPE <name> <type>`
    Type {
        /// The metric name
        name: &'a str,
        /// The declared type
        metric_type: MetricType,
    },
    /// `# HELP <name> <text>`
    Help {
        /// The metric name
        name: &'a str,
        /// Help text, possibly empty
        text: &'a str,
    },
    /// A sample line
    Series {
        /// Metric name and label block, exactly as written
        series: &'a str,
        /// The sample value
        value: f64,
        /// Optional timestamp in milliseconds since Unix epoch
        timestamp: Option<i64>,
    },
    /// Any other `#` line
    Comment {
        /// Text after the `#` marker
        text: &'a str,
    },
    /// `# UNIT <name> <unit>`
    Unit {
        /// The metric name
        name: &'a str,
        /// The unit, possibly empty
        unit: &'a str,
    },
    /// A line that could not be classified. Always the last entry.
    Malformed {
        /// Line number, 1-based
        line: usize,
        /// What was wrong with the line
        reason: MalformedReason,
    },
}

impl Entry<'_> {
    /// Short name of this entry's kind, for diagnostics
    #[must_use]
    pub fn tag(&self) -> &'static str {
        match self {
            Entry::Type { .. } => "type",
            Entry::Help { .. } => "help",
            Entry::Series { .. } => "series",
            Entry::Comment { .. } => "comment",
            Entry::Unit { .. } => "unit",
            Entry::Malformed { .. } => "malformed",
        }
    }
}

/// Lazily classifies a buffer of exposition text
///
/// Yields `Ok` entries until the input is exhausted, an OpenMetrics `# EOF`
/// line is reached, or a malformed line is classified. An `Err` is yielded
/// when a line cannot be decoded. The iterator is fused after a malformed
/// entry or an error.
#[derive(Debug, Clone)]
#[allow(missing_copy_implementations)]
pub struct Classifier<'a> {
    rest: &'a [u8],
    line: usize,
    done: bool,
}

impl<'a> Classifier<'a> {
    /// Create a new classifier over `input`
    #[must_use]
    pub fn new(input: &'a [u8]) -> Self {
        Self {
            rest: input,
            line: 0,
            done: false,
        }
    }

    /// Line number of the most recently read line, 1-based. Zero before the
    /// first line is read.
    #[must_use]
    pub fn line(&self) -> usize {
        self.line
    }

    fn next_line(&mut self) -> Option<&'a [u8]> {
        if self.rest.is_empty() {
            return None;
        }
        let (line, rest) = match self.rest.iter().position(|&b| b == b'\n') {
            Some(idx) => (&self.rest[..idx], &self.rest[idx + 1..]),
            None => (self.rest, &self.rest[self.rest.len()..]),
        };
        self.rest = rest;
        self.line += 1;
        Some(line)
    }
}

impl<'a> Iterator for Classifier<'a> {
    type Item = Result<Entry<'a>, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        while !self.done {
            let raw = self.next_line()?;
            let text = match std::str::from_utf8(raw) {
                Ok(text) => text.trim(),
                Err(source) => {
                    self.done = true;
                    return Some(Err(Error::Utf8 {
                        line: self.line,
                        source,
                    }));
                }
            };
            if text.is_empty() {
                continue;
            }

            return match classify_line(text) {
                Ok(Some(entry)) => Some(Ok(entry)),
                Ok(None) => {
                    self.done = true;
                    None
                }
                Err(reason) => {
                    trace!("line {line} is malformed: {reason}", line = self.line);
                    self.done = true;
                    Some(Ok(Entry::Malformed {
                        line: self.line,
                        reason,
                    }))
                }
            };
        }
        None
    }
}

impl std::iter::FusedIterator for Classifier<'_> {}

/// Classify a single trimmed, non-empty line. `Ok(None)` marks `# EOF`.
fn classify_line(line: &str) -> Result<Option<Entry<'_>>, MalformedReason> {
    let Some(body) = line.strip_prefix('#') else {
        return series::classify(line).map(Some);
    };

    let body = body.trim_start();
    let (keyword, remainder) = split_token(body);
    let entry = match keyword {
        "TYPE" => {
            let (name, remainder) = split_token(remainder);
            if name.is_empty() {
                return Err(MalformedReason::MissingMetadataName("TYPE"));
            }
            let (metric_type, remainder) = split_token(remainder);
            if metric_type.is_empty() {
                return Err(MalformedReason::MissingMetricType);
            }
            if !remainder.is_empty() {
                return Err(MalformedReason::TrailingContent(remainder.to_string()));
            }
            Entry::Type {
                name,
                metric_type: metric_type.parse()?,
            }
        }
        "HELP" => {
            let (name, text) = split_token(remainder);
            if name.is_empty() {
                return Err(MalformedReason::MissingMetadataName("HELP"));
            }
            Entry::Help { name, text }
        }
        "UNIT" => {
            let (name, unit) = split_token(remainder);
            if name.is_empty() {
                return Err(MalformedReason::MissingMetadataName("UNIT"));
            }
            Entry::Unit { name, unit }
        }
        "EOF" if remainder.is_empty() => return Ok(None),
        _ => Entry::Comment { text: body },
    };
    Ok(Some(entry))
}

/// Split off the first whitespace-delimited token, returning it and the
/// remainder with leading whitespace removed.
fn split_token(s: &str) -> (&str, &str) {
    let s = s.trim_start();
    match s.find(char::is_whitespace) {
        Some(idx) => (&s[..idx], s[idx..].trim_start()),
        None => (s, ""),
    }
}
