//! Rendering of an [`AnalysisResult`]

use std::{io, str::FromStr};

use serde::Deserialize;

use crate::stats::{AnalysisResult, Stat};

/// Errors produced while writing a report
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// Writing to the output failed
    #[error("Failed to write report: {0}")]
    Io(#[from] io::Error),
    /// Serializing the result failed
    #[error("Failed to serialize report: {0}")]
    Json(#[from] serde_json::Error),
    /// The report format is not known
    #[error("Unknown report format {0:?}, expected table or json")]
    UnknownFormat(String),
}

/// Report output format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Format {
    /// Aligned plain text, one section per group
    #[default]
    Table,
    /// Pretty printed JSON
    Json,
}

impl FromStr for Format {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "table" => Ok(Format::Table),
            "json" => Ok(Format::Json),
            _ => Err(Error::UnknownFormat(s.to_string())),
        }
    }
}

/// Write `result` to `out` in `format`
///
/// # Errors
///
/// Function will return an error if `out` cannot be written to.
pub fn write<W>(result: &AnalysisResult, format: Format, out: &mut W) -> Result<(), Error>
where
    W: io::Write,
{
    match format {
        Format::Table => {
            write_group(out, "Generic", &result.generic)?;
            writeln!(out)?;
            write_group(out, "Types", &result.types)?;
            writeln!(out)?;
            write_group(out, "Series", &result.series)?;
        }
        Format::Json => {
            serde_json::to_writer_pretty(&mut *out, result)?;
            writeln!(out)?;
        }
    }
    out.flush()?;
    Ok(())
}

fn write_group<W>(out: &mut W, title: &str, group: &[Stat]) -> io::Result<()>
where
    W: io::Write,
{
    writeln!(out, "{title}")?;
    if group.is_empty() {
        return writeln!(out, "  (none)");
    }

    let name_width = group.iter().map(|s| s.name().len()).max().unwrap_or(0);
    let values: Vec<String> = group.iter().map(|s| s.value().to_string()).collect();
    let value_width = values.iter().map(String::len).max().unwrap_or(0);

    for (stat, value) in group.iter().zip(&values) {
        writeln!(
            out,
            "  {name:<name_width$}  {value:>value_width$}",
            name = stat.name()
        )?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> AnalysisResult {
        AnalysisResult {
            generic: vec![Stat::new("Series_count", 12.0), Stat::new("Type_count", 1.0)],
            types: vec![Stat::new("counter_count", 1.0)],
            series: vec![],
        }
    }

    #[test]
    fn table_is_aligned() -> Result<(), Error> {
        let mut out = Vec::new();
        write(&sample(), Format::Table, &mut out)?;

        let expected = "\
Generic
  Series_count  12
  Type_count     1

Types
  counter_count  1

Series
  (none)
";
        assert_eq!(String::from_utf8_lossy(&out), expected);
        Ok(())
    }

    #[test]
    fn json_round_trips_through_serde_json() -> Result<(), Error> {
        let mut out = Vec::new();
        write(&sample(), Format::Json, &mut out)?;

        let value: serde_json::Value = serde_json::from_slice(&out)?;
        assert_eq!(value["generic"][0]["name"], "Series_count");
        assert_eq!(value["generic"][0]["value"], 12.0);
        assert_eq!(value["types"][0]["name"], "counter_count");
        assert_eq!(value["series"], serde_json::json!([]));
        Ok(())
    }

    #[test]
    fn format_from_str() {
        assert!(matches!("table".parse::<Format>(), Ok(Format::Table)));
        assert!(matches!("json".parse::<Format>(), Ok(Format::Json)));
        assert!(matches!(
            "yaml".parse::<Format>(),
            Err(Error::UnknownFormat(s)) if s == "yaml"
        ));
    }
}
