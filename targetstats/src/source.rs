//! Acquisition of exposition text
//!
//! A [`Source`] names where a snapshot comes from: a file, stdin or an HTTP
//! scrape of a running target. Sources are fetched in full; analysis never
//! starts on a partial body.

use std::{path::PathBuf, time::Duration};

use serde::Deserialize;
use tokio::io::AsyncReadExt;
use tracing::{debug, info};

/// Errors produced by [`Source`]
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// Reading a file failed
    #[error("Failed to read {path:?}: {source}")]
    File {
        /// File path
        path: PathBuf,
        /// Underlying IO error
        #[source]
        source: std::io::Error,
    },
    /// Reading stdin failed
    #[error("Failed to read stdin: {0}")]
    Stdin(#[source] std::io::Error),
    /// The HTTP request failed
    #[error("Failed to scrape target: {0}")]
    Http(#[from] reqwest::Error),
    /// The target answered with a non-success status
    #[error("Target {uri} answered with status {status}")]
    Status {
        /// URI scraped
        uri: String,
        /// Status returned
        status: reqwest::StatusCode,
    },
}

fn default_timeout_milliseconds() -> u64 {
    1_000
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
#[serde(deny_unknown_fields)]
/// Where exposition text is read from
pub enum Source {
    /// Standard input
    Stdin,
    /// A file on disk
    File {
        /// Path to the file
        path: PathBuf,
    },
    /// A Prometheus endpoint scraped over HTTP
    Http {
        /// URI to scrape
        uri: String,
        /// Request timeout
        #[serde(default = "default_timeout_milliseconds")]
        timeout_milliseconds: u64,
    },
}

impl Source {
    /// Create an HTTP source with the default timeout
    #[must_use]
    pub fn http(uri: impl Into<String>) -> Self {
        Source::Http {
            uri: uri.into(),
            timeout_milliseconds: default_timeout_milliseconds(),
        }
    }

    /// Fetch the full body of this source
    ///
    /// # Errors
    ///
    /// Function will return an error if the source cannot be read in full,
    /// or if an HTTP target answers with a non-success status.
    pub async fn fetch(&self) -> Result<Vec<u8>, Error> {
        match self {
            Source::Stdin => {
                let mut body = Vec::new();
                tokio::io::stdin()
                    .read_to_end(&mut body)
                    .await
                    .map_err(Error::Stdin)?;
                debug!("Read {bytes} bytes from stdin", bytes = body.len());
                Ok(body)
            }
            Source::File { path } => {
                let body = tokio::fs::read(path).await.map_err(|source| Error::File {
                    path: path.clone(),
                    source,
                })?;
                debug!("Read {bytes} bytes from {path:?}", bytes = body.len());
                Ok(body)
            }
            Source::Http {
                uri,
                timeout_milliseconds,
            } => {
                info!("Scraping {uri}");
                let resp = reqwest::Client::new()
                    .get(uri)
                    .timeout(Duration::from_millis(*timeout_milliseconds))
                    .send()
                    .await?;

                let status = resp.status();
                if !status.is_success() {
                    return Err(Error::Status {
                        uri: uri.clone(),
                        status,
                    });
                }

                let body = resp.bytes().await?;
                debug!("Read {bytes} bytes from {uri}", bytes = body.len());
                Ok(body.to_vec())
            }
        }
    }
}
