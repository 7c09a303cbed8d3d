//! # Embedlink Telemetry
//!
//! Logging and metrics setup shared by the embedlink crates.
//!
//! ## Components
//!
//! - **Logging**: `tracing-subscriber` registry with an `EnvFilter` and either
//!   a JSON or a human-readable fmt layer
//! - **Metrics**: Prometheus counters for envelope traffic and handler failures
//!
//! ## Usage
//!
//! ```rust,ignore
//! use embedlink_telemetry::{init_telemetry, TelemetryConfig};
//!
//! let config = TelemetryConfig::from_env();
//! let _guard = init_telemetry(&config).expect("Failed to init telemetry");
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `EMBEDLINK_SERVICE_NAME` | `embedlink` | Service name attached to startup logs |
//! | `EMBEDLINK_LOG_LEVEL` | `info` | Log level filter (`RUST_LOG` takes precedence) |
//! | `EMBEDLINK_JSON_LOGS` | `false` | Emit JSON formatted logs |
//! | `EMBEDLINK_CONSOLE_OUTPUT` | `true` | Attach the fmt layer at all |

mod config;
mod logging;
pub mod metrics;

pub use config::TelemetryConfig;
pub use logging::{init_logging, LoggingHandle};
pub use metrics::{
    encode_metrics, register_metrics, MetricsHandle, ENVELOPES_DISCARDED, ENVELOPES_RECEIVED,
    ENVELOPES_SENT, HANDLER_FAILURES,
};

use thiserror::Error;

/// Telemetry initialization errors
#[derive(Error, Debug)]
pub enum TelemetryError {
    #[error("Failed to initialize logging: {0}")]
    LoggingInit(String),

    #[error("Failed to initialize Prometheus metrics: {0}")]
    MetricsInit(String),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

/// Initialize logging and register metrics in one step.
///
/// Returns a guard that keeps the metric registry handle alive.
pub fn init_telemetry(config: &TelemetryConfig) -> Result<TelemetryGuard, TelemetryError> {
    let metrics_handle = register_metrics()?;
    let logging_handle = init_logging(config)?;

    Ok(TelemetryGuard {
        _logging: logging_handle,
        _metrics: metrics_handle,
    })
}

/// Guard that keeps telemetry active.
pub struct TelemetryGuard {
    _logging: LoggingHandle,
    _metrics: MetricsHandle,
}

impl Drop for TelemetryGuard {
    fn drop(&mut self) {
        tracing::debug!("Telemetry guard dropped");
    }
}
