//! Structural statistics for a Prometheus exposition snapshot.

use std::{env, io, path::PathBuf};

use clap::Parser;
use targetstats::{
    analyze::{self, Analyzer},
    config::{self, Config},
    report::{self, Format},
    source::{self, Source},
    stats::SortBy,
};
use tracing::{debug, error, info, warn};
use tracing_subscriber::{EnvFilter, util::SubscriberInitExt};

#[derive(thiserror::Error, Debug)]
enum Error {
    #[error(transparent)]
    Config(#[from] config::Error),
    #[error(transparent)]
    Source(#[from] source::Error),
    #[error(transparent)]
    Analyze(#[from] analyze::Error),
    #[error(transparent)]
    Report(#[from] report::Error),
}

#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
struct Args {
    /// path on disk to the configuration file
    #[clap(long)]
    config_path: Option<PathBuf>,

    /// order of reported stats: `by-value-desc`, `by-name-asc` or `none`
    #[clap(long)]
    sort_by: Option<String>,

    /// report format: `table` or `json`
    #[clap(long)]
    format: Option<Format>,

    /// scrape exposition text from this URI instead of reading INPUT
    #[clap(long, conflicts_with = "input")]
    uri: Option<String>,

    /// timeout for an HTTP scrape, overriding the configured one
    #[clap(long)]
    timeout_milliseconds: Option<u64>,

    /// path to exposition text, `-` for stdin
    input: Option<PathBuf>,
}

fn load_config(args: &Args) -> Result<Config, Error> {
    if let Ok(env_var_value) = env::var("TARGETSTATS_CONFIG") {
        debug!("Using config from env var 'TARGETSTATS_CONFIG'");
        return Ok(env_var_value.parse()?);
    }
    match &args.config_path {
        Some(path) => {
            debug!("Attempting to open configuration file at: {}", path.display());
            Config::from_path(path).map_err(|err| {
                error!("Configuration validation failed: {err}");
                Error::Config(err)
            })
        }
        None => Ok(Config::default()),
    }
}

/// Layer command line flags over `config`.
fn resolve(args: Args, mut config: Config) -> Config {
    if let Some(sort_by) = args.sort_by {
        config.sort_by = SortBy::from(sort_by);
    }
    if let Some(format) = args.format {
        config.format = format;
    }

    if let Some(uri) = args.uri {
        config.source = Some(Source::http(uri));
    } else if let Some(input) = args.input {
        config.source = Some(if input.as_os_str() == "-" {
            Source::Stdin
        } else {
            Source::File { path: input }
        });
    }

    if let Some(timeout) = args.timeout_milliseconds {
        match &mut config.source {
            Some(Source::Http {
                timeout_milliseconds,
                ..
            }) => *timeout_milliseconds = timeout,
            _ => warn!("--timeout-milliseconds has no effect without an HTTP source"),
        }
    }
    config
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Error> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .with_ansi(false)
        .finish()
        .init();

    let args = Args::parse();
    let config = load_config(&args)?;
    let config = resolve(args, config);

    let source = config.source.unwrap_or(Source::Stdin);
    let body = source.fetch().await.map_err(|err| {
        error!("Failed to acquire target input: {err}");
        Error::Source(err)
    })?;
    info!("Analyzing {bytes} bytes", bytes = body.len());

    let result = Analyzer::new(body.as_slice())
        .analyze(config.sort_by)
        .map_err(|err| {
            error!("Analysis failed: {err}");
            Error::Analyze(err)
        })?;

    let stdout = io::stdout();
    report::write(&result, config.format, &mut stdout.lock())?;
    Ok(())
}
