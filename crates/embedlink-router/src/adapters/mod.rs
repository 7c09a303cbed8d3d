//! Adapters implementing the router's ports.

pub mod channel;

pub use channel::{forward, ChannelTransport, InboundFrame, InboundListener, ListenerStats};
