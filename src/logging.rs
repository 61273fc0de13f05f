//! Logging setup.
//!
//! Diagnostics go through `tracing` and are written to stderr, so they never
//! mix with the listings the CLI prints on stdout.
//!
//! Filter priority (highest to lowest):
//! 1. `TREEFORGE_LOG` environment variable (any `EnvFilter` directive)
//! 2. `-v` on the command line (`debug`)
//! 3. `info`
//!
//! `TREEFORGE_LOG_FORMAT=json` switches to one JSON object per event.

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

pub const LOG_ENV: &str = "TREEFORGE_LOG";
pub const LOG_FORMAT_ENV: &str = "TREEFORGE_LOG_FORMAT";

/// Output format for log events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

impl LogFormat {
    /// Anything other than `json` means text.
    pub fn parse(value: Option<&str>) -> Self {
        match value {
            Some(v) if v.eq_ignore_ascii_case("json") => LogFormat::Json,
            _ => LogFormat::Text,
        }
    }
}

/// Directive used when `TREEFORGE_LOG` is not set.
pub fn default_directive(verbose: bool) -> &'static str {
    if verbose { "debug" } else { "info" }
}

fn build_env_filter(verbose: bool) -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default_directive(verbose)))
}

/// Install the global subscriber. Calling it a second time is a no-op.
pub fn init_logging(verbose: bool) {
    let filter = build_env_filter(verbose);
    let format = LogFormat::parse(std::env::var(LOG_FORMAT_ENV).ok().as_deref());
    let registry = tracing_subscriber::registry().with(filter);

    let result = match format {
        LogFormat::Json => registry
            .with(
                fmt::layer()
                    .json()
                    .with_target(true)
                    .with_writer(std::io::stderr),
            )
            .try_init(),
        LogFormat::Text => registry
            .with(
                fmt::layer()
                    .with_target(true)
                    .with_writer(std::io::stderr),
            )
            .try_init(),
    };
    // Already installed, e.g. by a test harness.
    let _ = result;
}
