//! Structural analysis of an exposition snapshot
//!
//! The [`Analyzer`] reads a complete scrape into memory, classifies it with
//! [`targetstats_exposition::Classifier`] and tallies three independent
//! frequency tables: entries per kind, metrics per declared type and samples
//! per series name. Series names are lower-cased and stripped of their label
//! block, so every label set of a metric counts toward the same series.
//!

use std::{fmt, io::Read};

use rustc_hash::FxHashMap;
use targetstats_exposition::{Classifier, Entry, MalformedReason, MetricType};
use tracing::{debug, trace};

use crate::stats::{AnalysisResult, SortBy, Stat, StatGroup};

/// Errors produced by [`Analyzer`]
///
/// Every error is terminal, no partial result is produced.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// The input could not be read in full
    #[error("Failed to read target input: {0}")]
    Io(#[from] std::io::Error),
    /// The classifier reported a malformed entry
    #[error("Invalid entry during target parsing, line {line}: {reason}")]
    Malformed {
        /// Line number of the malformed entry, 1-based
        line: usize,
        /// Why the line was rejected
        reason: MalformedReason,
    },
    /// The classifier produced an entry kind this analyzer does not know
    #[error("Unknown entry type {0}")]
    UnrecognizedEntry(&'static str),
    /// The classifier failed without classifying the input
    #[error(transparent)]
    Classifier(#[from] targetstats_exposition::Error),
}

/// Kinds of entry counted in the generic group
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum EntryKind {
    Type,
    Help,
    Series,
    Comment,
    Unit,
}

impl fmt::Display for EntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EntryKind::Type => "Type",
            EntryKind::Help => "Help",
            EntryKind::Series => "Series",
            EntryKind::Comment => "Comment",
            EntryKind::Unit => "Unit",
        };
        f.write_str(name)
    }
}

/// Running counts for a single analysis
#[derive(Debug, Default)]
struct Tally {
    generic: FxHashMap<EntryKind, u64>,
    types: FxHashMap<MetricType, u64>,
    series: FxHashMap<String, u64>,
}

impl Tally {
    fn record(&mut self, entry: Entry<'_>) -> Result<(), Error> {
        let kind = match entry {
            Entry::Type { metric_type, .. } => {
                *self.types.entry(metric_type).or_default() += 1;
                EntryKind::Type
            }
            Entry::Help { .. } => EntryKind::Help,
            Entry::Series { series, .. } => {
                *self.series.entry(normalize_series(series)).or_default() += 1;
                EntryKind::Series
            }
            Entry::Comment { .. } => EntryKind::Comment,
            Entry::Unit { .. } => EntryKind::Unit,
            Entry::Malformed { line, reason } => {
                return Err(Error::Malformed { line, reason });
            }
            other => return Err(Error::UnrecognizedEntry(other.tag())),
        };
        *self.generic.entry(kind).or_default() += 1;
        Ok(())
    }

    fn into_result(self) -> AnalysisResult {
        AnalysisResult {
            generic: into_group(self.generic),
            types: into_group(self.types),
            series: into_group(self.series),
        }
    }
}

fn into_group<K: fmt::Display>(table: FxHashMap<K, u64>) -> StatGroup {
    table
        .into_iter()
        .map(|(key, count)| Stat::new(format!("{key}_count"), count as f64))
        .collect()
}

/// Normalize a series to the name it is counted under
///
/// The series is lower-cased and truncated at the first `{`, dropping the
/// label block.
#[must_use]
pub fn normalize_series(series: &str) -> String {
    let mut name = series.to_lowercase();
    if let Some(cut) = name.find('{') {
        name.truncate(cut);
    }
    name
}

/// Computes statistics about a single exposition snapshot
#[derive(Debug)]
pub struct Analyzer<R> {
    reader: R,
}

impl<R> Analyzer<R>
where
    R: Read,
{
    /// Create a new [`Analyzer`] that reads exposition text from `reader`
    #[must_use]
    pub fn new(reader: R) -> Self {
        Self { reader }
    }

    /// Read the input to its end and analyze it
    ///
    /// # Errors
    ///
    /// Function will return an error if the input cannot be read, or if it
    /// holds a malformed entry. See [`Error`].
    pub fn analyze(mut self, sort_by: SortBy) -> Result<AnalysisResult, Error> {
        let mut buffer = Vec::new();
        self.reader.read_to_end(&mut buffer)?;
        debug!("Read {bytes} bytes of target input", bytes = buffer.len());
        analyze_bytes(&buffer, sort_by)
    }
}

/// Analyze an in-memory exposition snapshot
///
/// # Errors
///
/// Function will return an error if `input` holds a malformed entry or
/// cannot be classified. See [`Error`].
pub fn analyze_bytes(input: &[u8], sort_by: SortBy) -> Result<AnalysisResult, Error> {
    let mut tally = Tally::default();

    let mut entries = 0_u64;
    for entry in Classifier::new(input) {
        let entry = entry?;
        trace!("{tag} entry", tag = entry.tag());
        tally.record(entry)?;
        entries += 1;
    }
    debug!(
        "Classified {entries} entries: {series} distinct series, {types} declared types",
        series = tally.series.len(),
        types = tally.types.len(),
    );

    let mut result = tally.into_result();
    result.sort(sort_by);
    Ok(result)
}
