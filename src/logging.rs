//! Logging through `tracing`, scoped to a single run.
//!
//! Rather than installing a process-wide subscriber, the binary builds a [Dispatch] from a
//! [LogConfig] and runs its jobs inside [with_run_logging]. Library code only emits events;
//! if nothing is installed they go nowhere.
//!
//! # Log Levels
//!
//! - `error`: missing or unreadable inputs, failed writes
//! - `warn`: suspicious configuration, such as rename collisions
//! - `info`: rows loaded, records merged, files written, output samples
//! - `debug`: field overwrites between sources and other detail

use std::io;
use tracing::level_filters::LevelFilter;
use tracing::{Dispatch, Level};
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::EnvFilter;

/// Configuration for logging behavior.
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Level used when `RUST_LOG` is unset or ignored.
    pub level: Level,
    /// Honor `RUST_LOG` when it is set.
    pub use_env_filter: bool,
    pub with_timestamps: bool,
    /// Include the module path of each event.
    pub with_target: bool,
    pub with_ansi: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: Level::INFO,
            use_env_filter: true,
            with_timestamps: true,
            with_target: false,
            with_ansi: false,
        }
    }
}

impl LogConfig {
    /// Create a `LogConfig` from CLI verbosity flags.
    ///
    /// - `-q`: errors only
    /// - no flag: info
    /// - `-v`: debug
    /// - `-vv` and up: trace
    ///
    /// An explicit flag takes precedence over `RUST_LOG`.
    #[must_use]
    pub fn from_verbosity(verbose: u8, quiet: bool) -> Self {
        let level = match (quiet, verbose) {
            (true, _) => Level::ERROR,
            (false, 0) => Level::INFO,
            (false, 1) => Level::DEBUG,
            (false, _) => Level::TRACE,
        };
        Self {
            level,
            use_env_filter: !quiet && verbose == 0,
            ..Default::default()
        }
    }

    #[must_use]
    pub fn with_ansi(mut self, enable: bool) -> Self {
        self.with_ansi = enable;
        self
    }

    #[must_use]
    pub fn with_timestamps(mut self, enable: bool) -> Self {
        self.with_timestamps = enable;
        self
    }
}

fn build_env_filter(config: &LogConfig) -> EnvFilter {
    let fallback = EnvFilter::default().add_directive(LevelFilter::from_level(config.level).into());
    if config.use_env_filter {
        EnvFilter::try_from_default_env().unwrap_or(fallback)
    } else {
        fallback
    }
}

/// Build a dispatcher that writes formatted events to stderr.
pub fn build_dispatch(config: &LogConfig) -> Dispatch {
    build_dispatch_with_writer(config, io::stderr)
}

/// Build a dispatcher with a custom writer (useful for testing).
pub fn build_dispatch_with_writer<W>(config: &LogConfig, writer: W) -> Dispatch
where
    W: for<'writer> MakeWriter<'writer> + Send + Sync + 'static,
{
    let builder = tracing_subscriber::fmt()
        .with_env_filter(build_env_filter(config))
        .with_writer(writer)
        .with_ansi(config.with_ansi)
        .with_target(config.with_target);

    if config.with_timestamps {
        Dispatch::new(builder.finish())
    } else {
        Dispatch::new(builder.without_time().finish())
    }
}

/// Run `f` with `config`'s subscriber as the current default, restoring the previous
/// one afterwards.
pub fn with_run_logging<T>(config: &LogConfig, f: impl FnOnce() -> T) -> T {
    tracing::dispatcher::with_default(&build_dispatch(config), f)
}
