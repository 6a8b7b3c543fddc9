//! Command-line interface definitions using clap derive macros.
//!
//! Contains the top-level [`Cli`] parser, the [`Commands`] enum for
//! subcommands (run, validate, health), and their associated argument
//! structs. Every `run` flag has an environment variable equivalent for
//! container deployments and overrides the settings file when given.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(
    name = "configgate",
    version,
    about = "Configuration readiness gate for services fed by a coordination store",
    propagate_version = true,
    after_help = "\x1b[1mQuick start:\x1b[0m\n  \
        configgate run --store-dir ./cluster --root /services/demo\n  \
        configgate run -s configgate.yaml      Start with a settings file\n  \
        configgate health                      Query a running instance"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Load configuration, wait for readiness and serve health endpoints
    Run(Box<RunArgs>),

    /// Validate a settings file without starting
    Validate(ValidateArgs),

    /// Check health of a running instance
    Health(HealthArgs),
}

#[derive(Args)]
#[command(after_help = "\x1b[1mExamples:\x1b[0m\n  \
        configgate run                                          Auto-detect settings\n  \
        configgate run --store-dir /etc/cluster --root /svc/a   Directory store\n  \
        configgate run --require app.yaml --require db.yaml     Required paths\n  \
        configgate run --redis-url redis://cache:6379           Redis store")]
pub struct RunArgs {
    /// Settings file path (.yaml, .json, .toml)
    #[arg(short, long, env = "CONFIGGATE_SETTINGS")]
    pub settings: Option<PathBuf>,

    /// Service name used in logs and lifecycle step names
    #[arg(long, env = "CONFIGGATE_NAME")]
    pub name: Option<String>,

    /// Instance configuration root inside the store
    #[arg(short, long, env = "CONFIGGATE_ROOT")]
    pub root: Option<String>,

    /// Configuration path that must exist (repeatable)
    #[arg(long = "require", env = "CONFIGGATE_REQUIRE", value_delimiter = ',')]
    pub required_paths: Vec<String>,

    // -- Coordination Store --
    /// Use a directory tree as the coordination store
    #[arg(long, env = "CONFIGGATE_STORE_DIR", help_heading = "Coordination Store")]
    pub store_dir: Option<PathBuf>,

    /// Redis connection URL
    #[cfg(feature = "redis")]
    #[arg(
        long,
        env = "REDIS_URL",
        conflicts_with = "store_dir",
        help_heading = "Coordination Store"
    )]
    pub redis_url: Option<String>,

    /// Store poll interval in seconds
    #[arg(long, env = "POLL_INTERVAL_SECS", help_heading = "Coordination Store")]
    pub poll_interval: Option<u64>,

    // -- Server --
    /// Listen port
    #[arg(short, long, env = "PORT", help_heading = "Server")]
    pub port: Option<u16>,

    /// Listen address
    #[arg(long, env = "HOST", help_heading = "Server")]
    pub host: Option<String>,

    // -- Logging --
    /// Log level
    #[arg(short, long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: LogLevel,

    /// Force pretty (human-readable) log output
    #[arg(long)]
    pub pretty: bool,

    /// Force JSON log output (overrides TTY detection)
    #[arg(long, conflicts_with = "pretty")]
    pub json: bool,
}

#[derive(Args)]
pub struct ValidateArgs {
    /// Settings file to validate
    #[arg(default_value = "configgate.yaml")]
    pub settings: PathBuf,

    /// Output format
    #[arg(long, default_value = "text")]
    pub format: ValidateFormat,
}

#[derive(Args)]
pub struct HealthArgs {
    /// URL of the running instance
    #[arg(default_value = "http://localhost:8080")]
    pub url: String,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Clone, Debug, ValueEnum)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    #[must_use]
    pub const fn to_tracing_level(&self) -> tracing::Level {
        match self {
            Self::Trace => tracing::Level::TRACE,
            Self::Debug => tracing::Level::DEBUG,
            Self::Info => tracing::Level::INFO,
            Self::Warn => tracing::Level::WARN,
            Self::Error => tracing::Level::ERROR,
        }
    }
}

#[derive(Clone, Debug, ValueEnum)]
pub enum ValidateFormat {
    Text,
    Json,
}
