//! Prometheus metrics for the embedlink router.
//!
//! All metrics follow the naming convention: `embedlink_<subject>_<metric>_total`.
//! Counters are process-wide; every router instance in the process feeds them.

use lazy_static::lazy_static;
use prometheus::{Encoder, IntCounterVec, Opts, Registry, TextEncoder};
use std::sync::Arc;

use crate::TelemetryError;

lazy_static! {
    /// Global metrics registry
    pub static ref REGISTRY: Registry = Registry::new();

    /// Envelopes handed to the transport
    pub static ref ENVELOPES_SENT: IntCounterVec = IntCounterVec::new(
        Opts::new("embedlink_envelopes_sent_total", "Envelopes sent to the peer"),
        &["kind"]  // kind: command/success/failure
    ).expect("metric creation failed");

    /// Envelopes decoded from inbound text
    pub static ref ENVELOPES_RECEIVED: IntCounterVec = IntCounterVec::new(
        Opts::new("embedlink_envelopes_received_total", "Envelopes received from the peer"),
        &["kind"]
    ).expect("metric creation failed");

    /// Inbound messages dropped without effect
    pub static ref ENVELOPES_DISCARDED: IntCounterVec = IntCounterVec::new(
        Opts::new("embedlink_envelopes_discarded_total", "Inbound messages discarded"),
        &["reason"]  // reason: undecodable/unmatched
    ).expect("metric creation failed");

    /// Failed handler attempts while dispatching commands
    pub static ref HANDLER_FAILURES: IntCounterVec = IntCounterVec::new(
        Opts::new("embedlink_handler_failures_total", "Handler attempts that failed"),
        &["message_type"]
    ).expect("metric creation failed");
}

/// Handle to the metrics registry
pub struct MetricsHandle {
    _registry: Arc<Registry>,
}

/// Register all metrics with the global registry.
///
/// Safe to call more than once: already registered collectors are skipped.
pub fn register_metrics() -> Result<MetricsHandle, TelemetryError> {
    let metrics: Vec<Box<dyn prometheus::core::Collector>> = vec![
        Box::new(ENVELOPES_SENT.clone()),
        Box::new(ENVELOPES_RECEIVED.clone()),
        Box::new(ENVELOPES_DISCARDED.clone()),
        Box::new(HANDLER_FAILURES.clone()),
    ];

    for metric in metrics {
        match REGISTRY.register(metric) {
            Ok(()) | Err(prometheus::Error::AlreadyReg) => {}
            Err(e) => return Err(TelemetryError::MetricsInit(e.to_string())),
        }
    }

    Ok(MetricsHandle {
        _registry: Arc::new(REGISTRY.clone()),
    })
}

/// Encode all metrics as Prometheus text format.
pub fn encode_metrics() -> Result<String, TelemetryError> {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder
        .encode(&metric_families, &mut buffer)
        .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;
    String::from_utf8(buffer).map_err(|e| TelemetryError::MetricsInit(e.to_string()))
}
