//! Router error types.
//!
//! Only outbound calls surface errors to callers. Inbound problems (noise,
//! unmatched responses, handler failures) are contained and logged by the
//! router; handler failures travel back to the peer as `{"error": ...}`
//! payloads built by [`error_payload`].

use crate::domain::call_id::CallId;
use crate::domain::envelope::CodecError;
use crate::ports::transport::TransportError;
use serde_json::Value;
use std::time::Duration;

/// Payload sent back when a command has no subscribed handler.
pub const NO_HANDLER: &str = "no handler";

/// Build the `{"error": message}` payload of a failed response.
pub fn error_payload(message: impl Into<String>) -> Value {
    serde_json::json!({ "error": message.into() })
}

/// Why an outbound call did not produce a success payload.
#[derive(Debug, thiserror::Error)]
pub enum CallError {
    /// The peer answered with `_FAILED`; carries the (intercepted) payload.
    #[error("peer rejected the call: {0}")]
    Rejected(Value),

    /// No response within the configured call timeout.
    #[error("call {uid} timed out after {}ms", .after.as_millis())]
    Timeout { uid: CallId, after: Duration },

    /// The response interceptor failed on the peer's payload.
    #[error("interceptor for {message_type} failed: {message}")]
    Interceptor {
        message_type: String,
        message: String,
    },

    /// The type cannot be used for a call (empty or carries an outcome suffix).
    #[error("invalid call type: {0:?}")]
    InvalidType(String),

    #[error("encode failed: {0}")]
    Codec(#[from] CodecError),

    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// The pending record was dropped without an answer (e.g. swept or router gone).
    #[error("call {0} was abandoned")]
    Abandoned(CallId),
}

impl CallError {
    /// The peer's payload, when the call was rejected by the peer.
    pub fn rejection(&self) -> Option<&Value> {
        match self {
            CallError::Rejected(payload) => Some(payload),
            _ => None,
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, CallError::Timeout { .. })
    }
}

/// Result type for outbound calls
pub type CallResult<T = Value> = Result<T, CallError>;
