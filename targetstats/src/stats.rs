//! Statistics produced by an analysis
//!
//! An analysis produces three groups of named counts. Groups are plain
//! vectors of [`Stat`]; their order carries no meaning until a [`SortBy`]
//! policy is applied.

use serde::{Deserialize, Serialize};
use tracing::warn;

/// A named measurement
///
/// Values are counts but are held as `f64` so that reports treat every stat
/// uniformly.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Stat {
    name: String,
    value: f64,
}

impl Stat {
    /// Create a new [`Stat`]
    #[must_use]
    pub fn new(name: impl Into<String>, value: f64) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }

    /// The name of this stat
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The value of this stat
    #[must_use]
    pub fn value(&self) -> f64 {
        self.value
    }
}

/// A group of stats reported together, unique by name
pub type StatGroup = Vec<Stat>;

/// The result of analyzing one exposition snapshot
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AnalysisResult {
    /// Counts per classified entry kind: `Type`, `Help`, `Series`, `Comment`
    /// and `Unit`
    pub generic: StatGroup,
    /// Counts per declared metric type
    pub types: StatGroup,
    /// Counts per series name, label sets collapsed
    pub series: StatGroup,
}

impl AnalysisResult {
    /// Sort all three groups by `sort_by`
    pub fn sort(&mut self, sort_by: SortBy) {
        sort_by.sort(&mut self.generic);
        sort_by.sort(&mut self.types);
        sort_by.sort(&mut self.series);
    }
}

/// Order in which the stats of a group are reported
///
/// Policies are named `none`, `by-value-desc` and `by-name-asc`; the short
/// forms `value` and `name` are accepted too. Any unrecognized policy name is
/// treated as [`SortBy::None`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(from = "String")]
pub enum SortBy {
    /// Leave groups in the order they were built
    #[default]
    None,
    /// Largest value first. Ties keep their prior order.
    Value,
    /// Ascending by name, compared bytewise
    Name,
}

impl SortBy {
    /// Stable-sort `group` according to this policy
    pub fn sort(self, group: &mut [Stat]) {
        match self {
            SortBy::None => {}
            SortBy::Value => group.sort_by(|a, b| b.value.total_cmp(&a.value)),
            SortBy::Name => group.sort_by(|a, b| a.name.cmp(&b.name)),
        }
    }
}

impl From<&str> for SortBy {
    fn from(s: &str) -> Self {
        match s {
            "by-value-desc" | "value" => SortBy::Value,
            "by-name-asc" | "name" => SortBy::Name,
            "none" | "" => SortBy::None,
            other => {
                warn!("Unrecognized sort policy {other:?}, leaving stats unsorted");
                SortBy::None
            }
        }
    }
}

impl From<String> for SortBy {
    fn from(s: String) -> Self {
        SortBy::from(s.as_str())
    }
}
