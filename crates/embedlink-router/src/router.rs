//! Message router: correlation and dispatch over one shared channel.

use crate::domain::args::HandlerArgs;
use crate::domain::call_id::CallId;
use crate::domain::config::{ConfigError, RouterConfig};
use crate::domain::envelope::{is_base_type, Envelope, EnvelopeKind, Message};
use crate::domain::error::{error_payload, CallError, CallResult, NO_HANDLER};
use crate::domain::pending::{PendingCallStore, PendingStats};
use crate::domain::subscriptions::{Handler, Interceptor, InterceptorTable, SubscriptionTable};
use crate::ports::transport::Transport;
use embedlink_telemetry::metrics::{
    ENVELOPES_DISCARDED, ENVELOPES_RECEIVED, ENVELOPES_SENT, HANDLER_FAILURES,
};
use serde_json::Value;
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;
use tracing::{debug, error, trace, warn};

/// What inbound dispatch did with one message.
#[derive(Debug, Clone, PartialEq)]
pub enum Dispatch {
    /// Not a protocol message (undecodable, not an object, no type).
    Discarded,
    /// A response settled the pending call with this id.
    Settled { uid: CallId, kind: EnvelopeKind },
    /// A response whose uid matches no pending call.
    Unmatched { uid: String },
    /// A command was answered with `response`.
    Replied { response: Envelope, delivered: bool },
}

/// Running result of a command's handler fan-out.
///
/// Any success makes the outcome a success; the payload is that of the last
/// successful handler, or the last failure while none has succeeded.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Fanout {
    pub kind: EnvelopeKind,
    pub payload: Value,
}

impl Fanout {
    /// Outcome of a fan-out over zero handlers.
    pub fn no_handler() -> Self {
        Self {
            kind: EnvelopeKind::Failure,
            payload: error_payload(NO_HANDLER),
        }
    }

    pub fn fold(self, attempt: Result<Value, String>) -> Self {
        match attempt {
            Ok(payload) => Self {
                kind: EnvelopeKind::Success,
                payload,
            },
            Err(_) if self.kind == EnvelopeKind::Success => self,
            Err(message) => Self {
                kind: EnvelopeKind::Failure,
                payload: error_payload(message),
            },
        }
    }
}

/// Run user code, turning both errors and panics into a message.
///
/// The process panic hook still runs before the unwind is caught, so a
/// panicking handler prints to stderr under the default hook even though
/// the router only records it as a failed attempt. Hosts that want silence
/// install their own hook with [`std::panic::set_hook`].
fn guarded<T>(f: impl FnOnce() -> anyhow::Result<T>) -> Result<T, String> {
    match panic::catch_unwind(AssertUnwindSafe(f)) {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(err)) => Err(err.to_string()),
        Err(panic) => Err(panic_message(panic.as_ref())),
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        format!("panicked: {s}")
    } else if let Some(s) = panic.downcast_ref::<String>() {
        format!("panicked: {s}")
    } else {
        "panicked".to_string()
    }
}

/// A sent request awaiting its response.
///
/// Dropping it stops waiting; the record stays in the router until a
/// response (or the timeout sweep) removes it.
pub struct PendingReply {
    uid: CallId,
    receiver: oneshot::Receiver<CallResult>,
    timeout: Option<Duration>,
    store: Arc<PendingCallStore>,
}

impl PendingReply {
    pub fn uid(&self) -> CallId {
        self.uid
    }

    /// Wait for the response, honoring the configured call timeout.
    pub async fn wait(self) -> CallResult {
        let uid = self.uid;
        let outcome = match self.timeout {
            Some(after) => match tokio::time::timeout(after, self.receiver).await {
                Ok(outcome) => outcome,
                Err(_) => {
                    self.store.cancel(&uid);
                    warn!(uid = %uid, timeout_ms = after.as_millis() as u64, "Call timed out");
                    return Err(CallError::Timeout { uid, after });
                }
            },
            None => self.receiver.await,
        };

        outcome.unwrap_or(Err(CallError::Abandoned(uid)))
    }
}

/// The protocol endpoint.
///
/// Owns the pending call store, the subscription table and the interceptor
/// table, and the transport used to reach the peer.
pub struct Router {
    config: RouterConfig,
    transport: Arc<dyn Transport>,
    pending: Arc<PendingCallStore>,
    subscriptions: SubscriptionTable,
    interceptors: InterceptorTable,
}

impl Router {
    /// Router with the default configuration.
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            config: RouterConfig::default(),
            transport,
            pending: Arc::new(PendingCallStore::new()),
            subscriptions: SubscriptionTable::new(),
            interceptors: InterceptorTable::new(),
        }
    }

    pub fn with_config(config: RouterConfig, transport: Arc<dyn Transport>) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            config,
            ..Self::new(transport)
        })
    }

    pub fn config(&self) -> &RouterConfig {
        &self.config
    }

    // =========================================================================
    // OUTBOUND
    // =========================================================================

    /// Register a pending call and send the request without waiting.
    pub async fn request(&self, message_type: &str, payload: Value) -> CallResult<PendingReply> {
        if !is_base_type(message_type) {
            return Err(CallError::InvalidType(message_type.to_string()));
        }

        let timeout = self.config.call_timeout();
        let (uid, receiver) = self.pending.register(message_type, timeout);
        let envelope = Envelope::new(message_type, uid, payload);

        if let Err(e) = self.send_envelope(&envelope, EnvelopeKind::Command).await {
            self.pending.cancel(&uid);
            return Err(e);
        }

        debug!(uid = %uid, message_type = message_type, "Sent request");

        Ok(PendingReply {
            uid,
            receiver,
            timeout,
            store: self.pending.clone(),
        })
    }

    /// Send a request and wait for the peer's response payload.
    pub async fn call(&self, message_type: &str, payload: Value) -> CallResult {
        self.request(message_type, payload).await?.wait().await
    }

    async fn send_envelope(&self, envelope: &Envelope, kind: EnvelopeKind) -> CallResult<()> {
        let text = envelope.encode()?;
        self.transport.send_raw(text).await?;
        ENVELOPES_SENT.with_label_values(&[kind.as_str()]).inc();
        Ok(())
    }

    // =========================================================================
    // TABLES
    // =========================================================================

    pub fn add_handler(&self, base_type: &str, handler: Handler) {
        self.subscriptions.add(base_type, handler);
    }

    pub fn remove_handler(&self, base_type: &str, handler: &Handler) -> bool {
        self.subscriptions.remove(base_type, handler)
    }

    pub fn handler_count(&self, base_type: &str) -> usize {
        self.subscriptions.count(base_type)
    }

    pub fn subscribed_types(&self) -> Vec<String> {
        self.subscriptions.subscribed_types()
    }

    /// Set the payload transform for `base_type`. Last registration wins.
    pub fn set_interceptor(&self, base_type: &str, interceptor: Interceptor) {
        if self.interceptors.set(base_type, interceptor).is_some() {
            debug!(message_type = base_type, "Interceptor replaced");
        }
    }

    pub fn pending_count(&self) -> usize {
        self.pending.pending_count()
    }

    pub fn pending_stats(&self) -> &PendingStats {
        self.pending.stats()
    }

    /// Reject pending calls past their deadline. Returns how many were removed.
    pub fn sweep_expired(&self) -> usize {
        self.pending.remove_expired()
    }

    // =========================================================================
    // INBOUND
    // =========================================================================

    /// Process one inbound message from the transport.
    ///
    /// Never fails: everything that goes wrong is contained to this message.
    pub async fn handle_raw(&self, text: &str) -> Dispatch {
        let envelope = match Envelope::decode(text) {
            Ok(envelope) => envelope,
            Err(e) => {
                trace!(error = %e, "Discarding non-protocol message");
                ENVELOPES_DISCARDED.with_label_values(&["undecodable"]).inc();
                return Dispatch::Discarded;
            }
        };

        let message = envelope.classify();
        ENVELOPES_RECEIVED
            .with_label_values(&[message.kind.as_str()])
            .inc();

        if message.kind.is_response() {
            self.settle_response(message)
        } else {
            self.answer_command(message).await
        }
    }

    fn settle_response(&self, message: Message) -> Dispatch {
        let Some(call) = CallId::parse(&message.uid).and_then(|uid| self.pending.take(uid)) else {
            debug!(
                uid = %message.uid,
                message_type = %message.base_type,
                "Discarding response for unknown call"
            );
            ENVELOPES_DISCARDED.with_label_values(&["unmatched"]).inc();
            return Dispatch::Unmatched { uid: message.uid };
        };

        let uid = call.id();
        let payload = match self.interceptors.get(&message.base_type) {
            Some(transform) => {
                let raw = message.payload;
                match guarded(|| transform(raw)) {
                    Ok(args) => Ok(args.into_value()),
                    Err(e) => {
                        warn!(
                            uid = %uid,
                            message_type = %message.base_type,
                            error = %e,
                            "Response interceptor failed"
                        );
                        Err(CallError::Interceptor {
                            message_type: message.base_type.clone(),
                            message: e,
                        })
                    }
                }
            }
            None => Ok(message.payload),
        };

        let outcome = match (message.kind, payload) {
            (_, Err(e)) => Err(e),
            (EnvelopeKind::Success, Ok(payload)) => Ok(payload),
            (_, Ok(payload)) => Err(CallError::Rejected(payload)),
        };
        call.settle(outcome);

        Dispatch::Settled {
            uid,
            kind: message.kind,
        }
    }

    async fn answer_command(&self, message: Message) -> Dispatch {
        let base_type = message.base_type;
        let handlers = self.subscriptions.handlers(&base_type);

        let fanout = if handlers.is_empty() {
            debug!(uid = %message.uid, message_type = %base_type, "No handler for command");
            Fanout::no_handler()
        } else {
            let args = self.intercept_command(&base_type, message.payload);
            handlers
                .iter()
                .map(|handler| {
                    let attempt = match &args {
                        Ok(args) => guarded(|| handler(args)),
                        Err(e) => Err(e.clone()),
                    };
                    if let Err(e) = &attempt {
                        debug!(message_type = %base_type, error = %e, "Handler failed");
                        HANDLER_FAILURES
                            .with_label_values(&[base_type.as_str()])
                            .inc();
                    }
                    attempt
                })
                .fold(Fanout::no_handler(), Fanout::fold)
        };

        let response = Envelope::response(&base_type, fanout.kind, message.uid, fanout.payload);
        let delivered = match self.send_envelope(&response, fanout.kind).await {
            Ok(()) => true,
            Err(e) => {
                error!(
                    uid = %response.uid,
                    message_type = %response.message_type,
                    error = %e,
                    "Failed to send response"
                );
                false
            }
        };

        debug!(
            uid = %response.uid,
            message_type = %response.message_type,
            handlers = handlers.len(),
            "Answered command"
        );

        Dispatch::Replied { response, delivered }
    }

    fn intercept_command(&self, base_type: &str, payload: Value) -> Result<HandlerArgs, String> {
        match self.interceptors.get(base_type) {
            Some(transform) => guarded(|| transform(payload)).inspect_err(|e| {
                warn!(message_type = base_type, error = %e, "Command interceptor failed");
            }),
            None => Ok(HandlerArgs::from_payload(payload)),
        }
    }
}

/// Background task that periodically rejects expired pending calls.
pub async fn sweep_task(router: Arc<Router>, interval: Duration) {
    let mut sweep_interval = tokio::time::interval(interval);
    sweep_interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    loop {
        sweep_interval.tick().await;
        let removed = router.sweep_expired();
        if removed > 0 {
            debug!(removed = removed, "Swept expired pending calls");
        }
    }
}
