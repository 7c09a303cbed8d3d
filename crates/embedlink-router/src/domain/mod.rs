//! Domain types for the router.
//!
//! This module contains the wire codec, the protocol tables, configuration
//! and error handling. Nothing here touches the transport.

pub mod args;
pub mod call_id;
pub mod config;
pub mod envelope;
pub mod error;
pub mod pending;
pub mod subscriptions;

// Re-exports for convenience
pub use args::HandlerArgs;
pub use call_id::CallId;
pub use config::{ConfigError, RouterConfig};
pub use envelope::{split_type, CodecError, Envelope, EnvelopeKind, Message};
pub use error::{error_payload, CallError, CallResult, NO_HANDLER};
pub use pending::{PendingCallStore, PendingStats};
pub use subscriptions::{handler, interceptor, Handler, Interceptor, InterceptorTable, SubscriptionTable};
