//! Envelope codec.
//!
//! The envelope is the only unit that crosses the transport:
//!
//! ```text
//! { "type": "PRICE_UPDATE_OK", "uid": "5", "payload": { ... } }
//! ```
//!
//! `type` carries both the logical channel (the base type) and, for
//! responses, an outcome suffix. The suffix is parsed once, at decode time,
//! into an [`EnvelopeKind`].

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Suffix marking a successful response.
pub const SUCCESS_SUFFIX: &str = "_OK";

/// Suffix marking a failed response.
pub const FAILURE_SUFFIX: &str = "_FAILED";

/// Codec errors.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    #[error("malformed JSON: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("message is not a JSON object")]
    NotAnObject,
    #[error("message has no usable type field")]
    MissingType,
}

/// What an envelope means, derived from the outcome suffix of its type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EnvelopeKind {
    /// Bare name: a command or pushed event.
    Command,
    /// `_OK`: successful response to a command.
    Success,
    /// `_FAILED`: failed response to a command.
    Failure,
}

impl EnvelopeKind {
    /// The suffix appended to a base type for this kind.
    pub fn suffix(self) -> &'static str {
        match self {
            EnvelopeKind::Command => "",
            EnvelopeKind::Success => SUCCESS_SUFFIX,
            EnvelopeKind::Failure => FAILURE_SUFFIX,
        }
    }

    /// Whether this kind answers a pending call.
    pub fn is_response(self) -> bool {
        !matches!(self, EnvelopeKind::Command)
    }

    /// Label used in logs and metrics.
    pub fn as_str(self) -> &'static str {
        match self {
            EnvelopeKind::Command => "command",
            EnvelopeKind::Success => "success",
            EnvelopeKind::Failure => "failure",
        }
    }
}

impl fmt::Display for EnvelopeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Split a wire type into its base type and kind.
///
/// Total over all strings: anything without a recognized suffix is a command.
///
/// ```
/// use embedlink_router::domain::envelope::{split_type, EnvelopeKind};
///
/// assert_eq!(split_type("FOO_BAR_OK"), ("FOO_BAR", EnvelopeKind::Success));
/// assert_eq!(split_type("FOO"), ("FOO", EnvelopeKind::Command));
/// ```
pub fn split_type(wire_type: &str) -> (&str, EnvelopeKind) {
    if let Some(base) = wire_type.strip_suffix(FAILURE_SUFFIX) {
        (base, EnvelopeKind::Failure)
    } else if let Some(base) = wire_type.strip_suffix(SUCCESS_SUFFIX) {
        (base, EnvelopeKind::Success)
    } else {
        (wire_type, EnvelopeKind::Command)
    }
}

/// Whether `name` can be used as a base type on the wire.
pub fn is_base_type(name: &str) -> bool {
    !name.is_empty() && split_type(name).1 == EnvelopeKind::Command
}

/// The unit exchanged over the transport.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    /// Wire type, base type plus optional outcome suffix
    #[serde(rename = "type")]
    pub message_type: String,
    /// Correlation id minted by the requester
    pub uid: String,
    /// Arbitrary JSON payload
    pub payload: Value,
}

impl Envelope {
    pub fn new(message_type: impl Into<String>, uid: impl Into<String>, payload: Value) -> Self {
        Self {
            message_type: message_type.into(),
            uid: uid.into(),
            payload,
        }
    }

    /// Build a response envelope for a command of `base_type`.
    pub fn response(base_type: &str, kind: EnvelopeKind, uid: impl Into<String>, payload: Value) -> Self {
        Self::new(format!("{}{}", base_type, kind.suffix()), uid, payload)
    }

    /// Serialize to transport text.
    pub fn encode(&self) -> Result<String, CodecError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Parse transport text.
    ///
    /// Lenient about everything except `type`: a numeric `uid` is read as its
    /// decimal string, a missing `uid` as the empty string and a missing
    /// `payload` as `null`.
    pub fn decode(text: &str) -> Result<Self, CodecError> {
        let value: Value = serde_json::from_str(text)?;
        let Value::Object(mut fields) = value else {
            return Err(CodecError::NotAnObject);
        };

        let message_type = match fields.remove("type") {
            Some(Value::String(t)) if !t.is_empty() => t,
            _ => return Err(CodecError::MissingType),
        };

        let uid = match fields.remove("uid") {
            Some(Value::String(s)) => s,
            Some(Value::Number(n)) => n.to_string(),
            _ => String::new(),
        };

        let payload = fields.remove("payload").unwrap_or(Value::Null);

        Ok(Self {
            message_type,
            uid,
            payload,
        })
    }

    /// Classify into a [`Message`], parsing the outcome suffix.
    pub fn classify(self) -> Message {
        let (base, kind) = split_type(&self.message_type);
        Message {
            base_type: base.to_string(),
            kind,
            uid: self.uid,
            payload: self.payload,
        }
    }
}

/// A decoded envelope with its suffix resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    pub base_type: String,
    pub kind: EnvelopeKind,
    pub uid: String,
    pub payload: Value,
}
