//! Event-name facade over a [`Router`].
//!
//! Applications talk in event names like `price-update`; the wire uses
//! message types like `PRICE_UPDATE`. The facade normalizes between the two
//! and tells the peer which events it wants pushed.

use crate::domain::config::{ConfigError, RouterConfig};
use crate::domain::envelope::is_base_type;
use crate::domain::error::{CallError, CallResult};
use crate::domain::subscriptions::{Handler, Interceptor};
use crate::ports::transport::Transport;
use crate::router::{Dispatch, Router};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{debug, warn};

/// Map an event name to its message type: upper-case, `-` becomes `_`.
pub fn normalize_event_name(event: &str) -> String {
    event.to_uppercase().replace('-', "_")
}

pub struct Bridge {
    router: Arc<Router>,
}

impl Bridge {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self::from_router(Arc::new(Router::new(transport)))
    }

    pub fn with_config(config: RouterConfig, transport: Arc<dyn Transport>) -> Result<Self, ConfigError> {
        Ok(Self::from_router(Arc::new(Router::with_config(config, transport)?)))
    }

    pub fn from_router(router: Arc<Router>) -> Self {
        Self { router }
    }

    /// The underlying router, e.g. for an inbound listener.
    pub fn router(&self) -> &Arc<Router> {
        &self.router
    }

    /// Call `message_type` on the peer and wait for its response payload.
    pub async fn invoke(&self, message_type: &str, payload: Value) -> CallResult {
        self.router.call(message_type, payload).await
    }

    /// Send the init command with `options`.
    pub async fn initialize(&self, options: Value) -> CallResult {
        let init = self.router.config().init_command.clone();
        self.invoke(&init, options).await
    }

    /// Passive events are compared by normalized name, so `LOAD`, `Loading`
    /// and `no-data` are all passive under the default configuration.
    fn is_passive(&self, message_type: &str) -> bool {
        self.router
            .config()
            .passive_events
            .iter()
            .any(|event| normalize_event_name(event) == message_type)
    }

    /// Subscribe `handler` to `event`.
    ///
    /// Unless the event is passive, the peer is asked to push it with a
    /// subscribe request whose reply is not awaited. The handler stays
    /// registered even when that request cannot be sent.
    pub async fn subscribe(&self, event: &str, handler: Handler) -> CallResult<&Self> {
        let message_type = normalize_event_name(event);
        if !is_base_type(&message_type) {
            return Err(CallError::InvalidType(event.to_string()));
        }

        self.router.add_handler(&message_type, handler);

        if self.is_passive(&message_type) {
            debug!(event = event, "Passive event, no subscribe request");
        } else {
            let command = self.router.config().subscribe_command.clone();
            let reply = self.router.request(&command, json!({ "topic": event })).await?;
            debug!(uid = %reply.uid(), event = event, "Subscribe request sent");
        }

        Ok(self)
    }

    /// Remove the first registration of `handler` for `event`.
    pub async fn unsubscribe(&self, event: &str, handler: &Handler) -> bool {
        let message_type = normalize_event_name(event);
        if !self.router.remove_handler(&message_type, handler) {
            return false;
        }

        let config = self.router.config();
        if config.notify_unsubscribe
            && self.router.handler_count(&message_type) == 0
            && !self.is_passive(&message_type)
        {
            let command = config.unsubscribe_command.clone();
            if let Err(e) = self.router.request(&command, json!({ "topic": event })).await {
                warn!(event = event, error = %e, "Failed to send unsubscribe request");
            }
        }

        true
    }

    /// Set the payload transform for `message_type`.
    pub fn set_interceptor(&self, message_type: &str, interceptor: Interceptor) -> &Self {
        self.router.set_interceptor(message_type, interceptor);
        self
    }

    pub async fn handle_raw(&self, text: &str) -> Dispatch {
        self.router.handle_raw(text).await
    }
}
