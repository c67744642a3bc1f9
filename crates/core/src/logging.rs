//! Logging infrastructure for the ask pipeline.
//!
//! All logs are emitted to stderr so that stdout carries nothing but the
//! streamed answer.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::error::{AppError, AppResult};

/// Default filter when neither `RUST_LOG` nor an override is present.
///
/// Informational pipeline logs would interleave with the streamed answer on
/// a terminal, so only warnings are shown unless asked for.
const DEFAULT_FILTER: &str = "warn";

/// Initialize the tracing subscriber with stderr output.
///
/// # Arguments
/// * `log_level` - Optional filter override (e.g., "debug", "ask_pipeline=trace")
/// * `no_color` - Disable colored output
///
/// # Example
/// ```no_run
/// use ask_core::logging::init_logging;
///
/// init_logging(None, false).expect("Failed to initialize logging");
/// ```
pub fn init_logging(log_level: Option<&str>, no_color: bool) -> AppResult<()> {
    let filter_str = resolve_filter(log_level, std::env::var("RUST_LOG").ok());

    let env_filter = EnvFilter::try_new(&filter_str)
        .map_err(|e| AppError::Config(format!("Invalid log filter '{}': {}", filter_str, e)))?;

    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_level(true)
        .with_ansi(!no_color && supports_color());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init()
        .map_err(|e| AppError::Config(format!("Failed to init logging: {}", e)))?;

    Ok(())
}

/// Pick the filter string: explicit override, then `RUST_LOG`, then the default.
fn resolve_filter(log_level: Option<&str>, env_value: Option<String>) -> String {
    log_level
        .map(str::to_string)
        .or(env_value)
        .unwrap_or_else(|| DEFAULT_FILTER.to_string())
}

/// Check if the terminal supports color output.
fn supports_color() -> bool {
    std::env::var("NO_COLOR").is_err()
}
