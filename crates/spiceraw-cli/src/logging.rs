//! Logging setup using `tracing` and `tracing-subscriber`.
//!
//! Diagnostics go to stderr so they never mix with exported lines on stdout.
//!
//! # Log Levels
//!
//! - `error`: fatal conditions, the reason for a non-zero exit
//! - `warn`: size mismatches, stepped binary files
//! - `info`: parsed metadata summary
//! - `debug`: raw header sections and binary sizing
//! - `trace`: one event per decoded point

use std::io;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::{
    fmt::{self, MakeWriter},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};

/// Configuration for logging behavior.
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Level applied to this tool's crates
    pub level: LevelFilter,
    /// Whether to include target (module path) in log output
    pub with_target: bool,
    /// Whether to use ANSI colors in output
    pub with_ansi: bool,
    /// Let `RUST_LOG` replace the configured level
    pub use_env_filter: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: LevelFilter::WARN,
            with_target: false,
            with_ansi: false,
            use_env_filter: true,
        }
    }
}

impl LogConfig {
    #[must_use]
    pub fn with_level(mut self, level: LevelFilter) -> Self {
        self.level = level;
        self
    }

    #[must_use]
    pub fn with_ansi(mut self, enable: bool) -> Self {
        self.with_ansi = enable;
        self
    }
}

/// Install the global subscriber writing to stderr.
pub fn init_logging(config: &LogConfig) {
    init_logging_with_writer(config, io::stderr);
}

/// Install the global subscriber with a custom writer.
pub fn init_logging_with_writer<W>(config: &LogConfig, writer: W)
where
    W: for<'writer> MakeWriter<'writer> + Send + Sync + 'static,
{
    let layer = fmt::layer()
        .with_writer(writer)
        .with_ansi(config.with_ansi)
        .with_target(config.with_target)
        .without_time();

    // A second initialization (tests) keeps the first subscriber
    let _ = tracing_subscriber::registry()
        .with(build_env_filter(config))
        .with(layer)
        .try_init();
}

/// Build an `EnvFilter` from the configured level, respecting `RUST_LOG`.
fn build_env_filter(config: &LogConfig) -> EnvFilter {
    let fallback = || {
        EnvFilter::new(format!(
            "off,spiceraw={level},spiceraw_core={level}",
            level = config.level.to_string().to_lowercase()
        ))
    };

    if config.use_env_filter {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| fallback())
    } else {
        fallback()
    }
}
