//! Process-wide tracing setup.
//!
//! The storage layer logs through the `log` facade; those records are
//! forwarded into the same subscriber by [`tracing_log::LogTracer`].

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::{fmt, EnvFilter, Layer};

use crate::config::LoggingConfig;
use crate::error::LoggingError;

/// Builds the filter: `RUST_LOG` wins over the configured directive.
pub fn build_filter(config: &LoggingConfig) -> Result<EnvFilter, LoggingError> {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Ok(filter);
    }
    EnvFilter::try_new(&config.filter).map_err(|e| LoggingError::InvalidFilter {
        filter: config.filter.clone(),
        reason: e.to_string(),
    })
}

/// Installs the global subscriber, writing to stderr. Call once, early in `main`.
pub fn init(config: &LoggingConfig) -> Result<(), LoggingError> {
    let filter = build_filter(config)?;

    let fmt_layer = if config.json {
        fmt::layer()
            .json()
            .with_current_span(true)
            .with_writer(std::io::stderr)
            .boxed()
    } else {
        fmt::layer()
            .with_target(true)
            .with_writer(std::io::stderr)
            .boxed()
    };

    let subscriber = tracing_subscriber::registry().with(filter).with(fmt_layer);
    tracing::subscriber::set_global_default(subscriber)
        .map_err(|_| LoggingError::AlreadyInstalled)?;

    // A logger may already exist when embedded in a host application.
    if tracing_log::LogTracer::init().is_err() {
        tracing::debug!("log facade already bridged");
    }

    Ok(())
}
