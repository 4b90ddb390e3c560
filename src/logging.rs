//! Diagnostic logging to stderr
//!
//! Stdout carries the analysis result, so every log line goes to stderr.

use clap::ValueEnum;
use tracing_subscriber::EnvFilter;

/// Overrides the computed filter, e.g. `PLUGIN_LOG=drone_gemini=trace`
pub const LOG_FILTER_ENV: &str = "PLUGIN_LOG";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    /// Multi-line, human readable
    #[default]
    Human,
    /// One terse line per event
    Compact,
    /// One JSON object per event
    Json,
}

/// Default filter directive when `PLUGIN_LOG` is unset
pub fn default_directive(debug: bool) -> String {
    let level = if debug { "debug" } else { "info" };
    format!("{}={}", env!("CARGO_CRATE_NAME"), level)
}

fn make_filter(debug: bool) -> EnvFilter {
    EnvFilter::try_from_env(LOG_FILTER_ENV).unwrap_or_else(|_| EnvFilter::new(default_directive(debug)))
}

/// Install the global subscriber
///
/// A second call is a no-op.
pub fn init(format: LogFormat, debug: bool) {
    let filter = make_filter(debug);

    match format {
        LogFormat::Json => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .json()
                .with_writer(std::io::stderr)
                .try_init()
                .ok();
        }
        LogFormat::Compact => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .compact()
                .with_writer(std::io::stderr)
                .with_target(true)
                .try_init()
                .ok();
        }
        LogFormat::Human => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .with_target(false)
                .without_time()
                .try_init()
                .ok();
        }
    }
}
