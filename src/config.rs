//! Command-line flags and layered configuration.
//!
//! Settings are resolved from, lowest precedence first:
//!
//! 1. built-in defaults
//! 2. an optional config file (`--config`, TOML/YAML/JSON by extension)
//! 3. `PROMSTORM_*` environment variables (e.g. `PROMSTORM_NUM_THREADS=4`)
//! 4. command-line flags
//!
//! Duration values use the same grammar as the range (`5m`, `1h30m`, `250ms`).

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use ::config::{Config, Environment, File};
use clap::{Parser, Subcommand};
use promstorm_types::{ParseError, TimeSpan};
use serde::Deserialize;
use thiserror::Error;

/// Prefix for environment variable overrides.
pub const ENV_PREFIX: &str = "PROMSTORM";

const DEFAULT_PROM_URL: &str = "http://localhost:9090";
const DEFAULT_QUERY_FILE: &str = "queries.txt";
const DEFAULT_RANGE: &str = "30d";
const DEFAULT_STEP: &str = "5m";
const DEFAULT_TICKER: &str = "5s";
const DEFAULT_LABEL: &str = "instance";
const DEFAULT_NUM_THREADS: u64 = 1;
const DEFAULT_SLEEP: &str = "1ms";
const DEFAULT_LOG_LEVEL: &str = "info";

/// Periodic query load generator for Prometheus-compatible APIs.
#[derive(Parser, Debug, Default)]
#[command(name = "promstorm", about)]
pub struct Cli {
    /// Path to a TOML, YAML or JSON config file.
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Base URL of Prometheus [default: http://localhost:9090]
    #[arg(long, value_name = "URL")]
    pub prom_url: Option<String>,

    /// File with one query template per line [default: queries.txt]
    #[arg(long, value_name = "FILE")]
    pub query_file: Option<PathBuf>,

    /// Time range each query covers, e.g. 7d, 12h, 30m [default: 30d]
    #[arg(long)]
    pub range: Option<String>,

    /// Bearer token sent in the Authorization header
    #[arg(long, value_name = "TOKEN")]
    pub auth_header: Option<String>,

    /// Query resolution step, at least 1s [default: 5m]
    #[arg(long)]
    pub step: Option<String>,

    /// Interval between rounds [default: 5s]
    #[arg(long)]
    pub ticker: Option<String>,

    /// Label whose values are enumerated as entities [default: instance]
    #[arg(long)]
    pub label: Option<String>,

    /// Workers per round; each runs the full workload [default: 1]
    #[arg(long)]
    pub num_threads: Option<u64>,

    /// Pause after each entity's queries [default: 1ms]
    #[arg(long)]
    pub sleep: Option<String>,

    /// Timeout for each range query (no timeout when unset)
    #[arg(long)]
    pub query_timeout: Option<String>,

    /// Logging verbosity (trace, debug, info, warn, error) [default: info]
    #[arg(long)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print version information and exit.
    Version,
}

/// Errors produced while resolving settings.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A source could not be read or a value had the wrong type.
    #[error(transparent)]
    Load(#[from] ::config::ConfigError),

    /// A duration setting did not parse.
    #[error("invalid {key}: {source}")]
    Duration {
        key: &'static str,
        #[source]
        source: ParseError,
    },

    /// A duration setting that must not be negative was.
    #[error("{key} must not be negative, got {value:?}")]
    Negative { key: &'static str, value: String },

    /// The step would truncate to zero seconds on the wire.
    #[error("step must be at least 1s, got {0:?}")]
    SubSecondStep(String),

    #[error("ticker interval must be greater than zero")]
    ZeroInterval,

    #[error("num_threads must be at least 1")]
    NoWorkers,
}

/// Merged, not yet validated values.
#[derive(Debug, Deserialize)]
struct RawSettings {
    prom_url: String,
    query_file: PathBuf,
    range: String,
    auth_header: String,
    step: String,
    ticker: String,
    label: String,
    num_threads: usize,
    sleep: String,
    query_timeout: Option<String>,
    log_level: String,
}

/// Validated settings for one run.
#[derive(Clone, PartialEq, Eq)]
pub struct Settings {
    /// Base URL of the query API.
    pub prom_url: String,
    /// Template file.
    pub query_file: PathBuf,
    /// How far back each window reaches.
    pub range: TimeSpan,
    /// Bearer token; `None` when empty.
    pub auth_token: Option<String>,
    /// Query resolution, whole seconds.
    pub step: Duration,
    /// Interval between rounds.
    pub ticker: Duration,
    /// Label enumerated for entities.
    pub label: String,
    /// Workers per round.
    pub num_threads: usize,
    /// Pause after each entity.
    pub sleep: Duration,
    /// Per-query timeout.
    pub query_timeout: Option<Duration>,
    /// Log filter used when `RUST_LOG` is unset.
    pub log_level: String,
}

impl Settings {
    /// Resolve settings from defaults, file, process environment and flags.
    pub fn load(cli: &Cli) -> Result<Self, ConfigError> {
        Self::load_with_env(cli, Environment::with_prefix(ENV_PREFIX))
    }

    /// Resolve settings using a specific environment source.
    pub fn load_with_env(cli: &Cli, env: Environment) -> Result<Self, ConfigError> {
        let mut builder = Config::builder()
            .set_default("prom_url", DEFAULT_PROM_URL)?
            .set_default("query_file", DEFAULT_QUERY_FILE)?
            .set_default("range", DEFAULT_RANGE)?
            .set_default("auth_header", "")?
            .set_default("step", DEFAULT_STEP)?
            .set_default("ticker", DEFAULT_TICKER)?
            .set_default("label", DEFAULT_LABEL)?
            .set_default("num_threads", DEFAULT_NUM_THREADS)?
            .set_default("sleep", DEFAULT_SLEEP)?
            .set_default("log_level", DEFAULT_LOG_LEVEL)?;

        if let Some(path) = &cli.config {
            builder = builder.add_source(File::from(path.as_path()));
        }

        let raw: RawSettings = builder
            .add_source(env)
            .set_override_option("prom_url", cli.prom_url.clone())?
            .set_override_option(
                "query_file",
                cli.query_file
                    .as_ref()
                    .map(|p| p.to_string_lossy().into_owned()),
            )?
            .set_override_option("range", cli.range.clone())?
            .set_override_option("auth_header", cli.auth_header.clone())?
            .set_override_option("step", cli.step.clone())?
            .set_override_option("ticker", cli.ticker.clone())?
            .set_override_option("label", cli.label.clone())?
            .set_override_option("num_threads", cli.num_threads)?
            .set_override_option("sleep", cli.sleep.clone())?
            .set_override_option("query_timeout", cli.query_timeout.clone())?
            .set_override_option("log_level", cli.log_level.clone())?
            .build()?
            .try_deserialize()?;

        raw.validate()
    }
}

impl RawSettings {
    fn validate(self) -> Result<Settings, ConfigError> {
        let range = parse_span("range", &self.range)?;

        let step = parse_non_negative("step", &self.step)?;
        if step < Duration::from_secs(1) {
            return Err(ConfigError::SubSecondStep(self.step));
        }

        let ticker = parse_non_negative("ticker", &self.ticker)?;
        if ticker.is_zero() {
            return Err(ConfigError::ZeroInterval);
        }

        if self.num_threads == 0 {
            return Err(ConfigError::NoWorkers);
        }

        let sleep = parse_non_negative("sleep", &self.sleep)?;

        let query_timeout = match self.query_timeout.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(raw) => Some(parse_non_negative("query_timeout", raw)?),
        };

        Ok(Settings {
            prom_url: self.prom_url,
            query_file: self.query_file,
            range,
            auth_token: (!self.auth_header.is_empty()).then_some(self.auth_header),
            step,
            ticker,
            label: self.label,
            num_threads: self.num_threads,
            sleep,
            query_timeout,
            log_level: self.log_level,
        })
    }
}

fn parse_span(key: &'static str, raw: &str) -> Result<TimeSpan, ConfigError> {
    TimeSpan::parse(raw).map_err(|source| ConfigError::Duration { key, source })
}

fn parse_non_negative(key: &'static str, raw: &str) -> Result<Duration, ConfigError> {
    parse_span(key, raw)?
        .to_duration()
        .ok_or_else(|| ConfigError::Negative {
            key,
            value: raw.to_string(),
        })
}

impl fmt::Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Settings")
            .field("prom_url", &self.prom_url)
            .field("query_file", &self.query_file)
            .field("range", &format_args!("{}", self.range))
            .field("auth_token", &self.auth_token.as_ref().map(|_| "<redacted>"))
            .field("step", &self.step)
            .field("ticker", &self.ticker)
            .field("label", &self.label)
            .field("num_threads", &self.num_threads)
            .field("sleep", &self.sleep)
            .field("query_timeout", &self.query_timeout)
            .field("log_level", &self.log_level)
            .finish()
    }
}
