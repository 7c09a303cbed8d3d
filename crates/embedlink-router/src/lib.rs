//! Embedlink Router - request/response and pub/sub messaging between an
//! embedded client and its host over one text channel.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                      Bridge (facade)                         │
//! │   invoke / initialize / subscribe / unsubscribe / intercept  │
//! ├──────────────────────────────────────────────────────────────┤
//! │                          Router                              │
//! │  ┌──────────────────┐ ┌──────────────┐ ┌──────────────────┐  │
//! │  │ Pending Calls    │ │ Subscriptions│ │ Interceptors     │  │
//! │  │ uid → oneshot    │ │ type → [fn]  │ │ type → fn        │  │
//! │  └──────────────────┘ └──────────────┘ └──────────────────┘  │
//! │            ▲ settle            ▲ fan-out                     │
//! │            └────── handle_raw ─┘                             │
//! └──────────────┬───────────────────────────────▲───────────────┘
//!                │ send_raw                      │ InboundListener
//!                ▼                               │
//!            Transport ──────────── peer ────────┘
//! ```
//!
//! # Wire format
//!
//! Every message is a JSON object `{"type", "uid", "payload"}`. A `type`
//! ending in `_OK` or `_FAILED` is the response to the request with the same
//! `uid`; any other `type` is a command for the local handlers.
//!
//! # Usage
//!
//! ```ignore
//! use embedlink_router::{handler, Bridge, ChannelTransport};
//!
//! let (transport, outbound) = ChannelTransport::channel();
//! let bridge = Bridge::new(Arc::new(transport));
//! bridge.subscribe("price-update", handler(|args| Ok(json!({"seen": args.first()})))).await?;
//! let ready = bridge.initialize(json!({"locale": "en"})).await?;
//! ```

#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod adapters;
pub mod domain;
pub mod facade;
pub mod ports;
pub mod router;

pub use adapters::{forward, ChannelTransport, InboundFrame, InboundListener, ListenerStats};
pub use domain::{
    error_payload, handler, interceptor, split_type, CallError, CallId, CallResult, CodecError,
    ConfigError, Envelope, EnvelopeKind, Handler, HandlerArgs, Interceptor, RouterConfig,
    NO_HANDLER,
};
pub use facade::{normalize_event_name, Bridge};
pub use ports::{Transport, TransportError};
pub use router::{sweep_task, Dispatch, PendingReply, Router};
