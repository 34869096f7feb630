//! This module controls configuration parsing from the end user, providing a
//! convenience mechanism for the rest of the program. Command line flags are
//! layered on top of what is parsed here.

use std::{
    fs,
    path::{Path, PathBuf},
    str::FromStr,
};

use serde::Deserialize;

use crate::{report::Format, source::Source, stats::SortBy};

/// Errors produced by [`Config`]
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// Error for a serde [`serde_yaml`].
    #[error("Failed to deserialize yaml: {0}")]
    SerdeYaml(#[from] serde_yaml::Error),
    /// Error reading config file
    #[error("Failed to read config file {path:?}: {source}")]
    ReadFile {
        /// File path
        path: PathBuf,
        /// Underlying IO error
        #[source]
        source: Box<std::io::Error>,
    },
}

/// Main configuration struct for this program
#[derive(Debug, Default, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// How to order the stats of each group
    #[serde(default)]
    pub sort_by: SortBy,
    /// How to render the report
    #[serde(default)]
    pub format: Format,
    /// Where exposition text is read from. Stdin when unset.
    #[serde(default)]
    #[serde(with = "serde_yaml::with::singleton_map_recursive")]
    pub source: Option<Source>,
}

impl Config {
    /// Load configuration from the YAML file at `path`
    ///
    /// # Errors
    ///
    /// Function will return an error if the file cannot be read or does not
    /// hold a valid configuration.
    pub fn from_path(path: &Path) -> Result<Self, Error> {
        let contents = fs::read_to_string(path).map_err(|source| Error::ReadFile {
            path: path.to_path_buf(),
            source: Box::new(source),
        })?;
        contents.parse()
    }
}

impl FromStr for Config {
    type Err = Error;

    fn from_str(contents: &str) -> Result<Self, Self::Err> {
        Ok(serde_yaml::from_str(contents)?)
    }
}
