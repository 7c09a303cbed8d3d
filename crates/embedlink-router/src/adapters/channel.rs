//! In-process transport over tokio channels.
//!
//! `ChannelTransport` is the outbound half. The inbound half is an
//! [`InboundListener`] feeding frames into a router. [`forward`] pipes one
//! endpoint's outbound text into another endpoint's inbound queue, tagging it
//! with an origin, which is how two routers are wired together in one process.
//!
//! The outbound queue is unbounded. A listener awaits `send_raw` for every
//! reply it produces, so a bounded outbound queue would let two endpoints
//! with full queues wait on each other forever. Sending never waits; only
//! the inbound side applies backpressure.

use crate::ports::transport::{Transport, TransportError};
use crate::router::{Dispatch, Router};
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, trace};

/// Outbound transport writing into an unbounded mpsc channel.
#[derive(Clone)]
pub struct ChannelTransport {
    sender: mpsc::UnboundedSender<String>,
}

impl ChannelTransport {
    pub fn new(sender: mpsc::UnboundedSender<String>) -> Self {
        Self { sender }
    }

    /// Create a transport and the receiver that observes what it sends.
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<String>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self::new(tx), rx)
    }
}

#[async_trait]
impl Transport for ChannelTransport {
    async fn send_raw(&self, text: String) -> Result<(), TransportError> {
        self.sender
            .send(text)
            .map_err(|_| TransportError::ChannelClosed)
    }
}

/// One inbound message together with where it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct InboundFrame {
    pub origin: String,
    pub text: String,
}

impl InboundFrame {
    pub fn new(origin: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            origin: origin.into(),
            text: text.into(),
        }
    }
}

/// Counters reported when a listener stops.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ListenerStats {
    pub frames: u64,
    pub foreign: u64,
    pub discarded: u64,
}

/// Drives inbound frames into a router until the channel closes.
pub struct InboundListener {
    router: Arc<Router>,
    receiver: mpsc::Receiver<InboundFrame>,
    expected_origin: Option<String>,
}

impl InboundListener {
    pub fn new(router: Arc<Router>, receiver: mpsc::Receiver<InboundFrame>) -> Self {
        Self {
            router,
            receiver,
            expected_origin: None,
        }
    }

    /// Ignore frames whose origin differs from `origin`.
    pub fn accept_only(mut self, origin: impl Into<String>) -> Self {
        self.expected_origin = Some(origin.into());
        self
    }

    /// Run the listener loop
    pub async fn run(mut self) -> ListenerStats {
        let mut stats = ListenerStats::default();

        while let Some(frame) = self.receiver.recv().await {
            stats.frames += 1;

            if let Some(expected) = &self.expected_origin {
                if frame.origin != *expected {
                    trace!(origin = %frame.origin, "Ignoring frame from foreign origin");
                    stats.foreign += 1;
                    continue;
                }
            }

            if self.router.handle_raw(&frame.text).await == Dispatch::Discarded {
                stats.discarded += 1;
            }
        }

        info!(
            frames = stats.frames,
            foreign = stats.foreign,
            discarded = stats.discarded,
            "Inbound channel closed, stopping listener"
        );
        stats
    }
}

/// Pipe outbound text into an inbound queue, tagged with `origin`.
///
/// Returns when either side closes.
pub async fn forward(
    mut outbound: mpsc::UnboundedReceiver<String>,
    origin: String,
    inbound: mpsc::Sender<InboundFrame>,
) {
    while let Some(text) = outbound.recv().await {
        if inbound
            .send(InboundFrame::new(origin.clone(), text))
            .await
            .is_err()
        {
            debug!(origin = %origin, "Inbound side closed, stopping forwarder");
            return;
        }
    }
}
