//! Transport port.
//!
//! The router only needs a best-effort way to push text to the peer.
//! Inbound text is handed to [`Router::handle_raw`](crate::Router::handle_raw)
//! by whatever owns the receiving side.

use async_trait::async_trait;

/// Outbound side of a duplex text channel.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send one message. No delivery acknowledgment is implied.
    async fn send_raw(&self, text: String) -> Result<(), TransportError>;
}

/// Transport error types
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("channel closed")]
    ChannelClosed,
    #[error("send failed: {0}")]
    SendFailed(String),
}
