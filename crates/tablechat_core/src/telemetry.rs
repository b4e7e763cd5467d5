//! Structured logging setup shared by every binary.

use crate::LoggingSettings;
use tracing_subscriber::{EnvFilter, Layer, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize the global tracing subscriber.
///
/// `RUST_LOG` wins over the configured level. JSON output is meant for
/// production log shipping; the default is human-readable with targets,
/// file and line numbers.
///
/// # Errors
///
/// Returns error if the filter directive is invalid or a subscriber is
/// already installed.
pub fn init_tracing(settings: &LoggingSettings) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let env_filter =
        EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(settings.level()))?;

    let fmt_layer = if *settings.json() {
        tracing_subscriber::fmt::layer().json().boxed()
    } else {
        tracing_subscriber::fmt::layer()
            .with_target(true)
            .with_file(true)
            .with_line_number(true)
            .boxed()
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init()?;

    Ok(())
}
