//! Client ↔ host wiring over in-process channels.
//!
//! Each side gets its own router, a [`ChannelTransport`] for outbound text
//! and an [`InboundListener`] that only accepts frames tagged with the other
//! side's origin. Forwarder tasks carry text between the two.

use embedlink_router::{
    forward, Bridge, ChannelTransport, ConfigError, InboundFrame, InboundListener, RouterConfig,
};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

pub const CLIENT_ORIGIN: &str = "client";
pub const HOST_ORIGIN: &str = "host";

const BUFFER: usize = 64;

pub struct Link {
    pub client: Bridge,
    pub host: Bridge,
    /// Raw inbound queue of the client, for injecting frames
    pub client_inbox: mpsc::Sender<InboundFrame>,
    tasks: Vec<JoinHandle<()>>,
}

impl Link {
    pub fn connect() -> Self {
        let (client_transport, client_out) = ChannelTransport::channel();
        let (host_transport, host_out) = ChannelTransport::channel();
        Self::wire(
            Bridge::new(Arc::new(client_transport)),
            client_out,
            Bridge::new(Arc::new(host_transport)),
            host_out,
        )
    }

    pub fn connect_with(
        client_config: RouterConfig,
        host_config: RouterConfig,
    ) -> Result<Self, ConfigError> {
        let (client_transport, client_out) = ChannelTransport::channel();
        let (host_transport, host_out) = ChannelTransport::channel();
        Ok(Self::wire(
            Bridge::with_config(client_config, Arc::new(client_transport))?,
            client_out,
            Bridge::with_config(host_config, Arc::new(host_transport))?,
            host_out,
        ))
    }

    fn wire(
        client: Bridge,
        client_out: mpsc::UnboundedReceiver<String>,
        host: Bridge,
        host_out: mpsc::UnboundedReceiver<String>,
    ) -> Self {
        let (client_inbox, client_in) = mpsc::channel(BUFFER);
        let (host_inbox, host_in) = mpsc::channel(BUFFER);

        let client_listener =
            InboundListener::new(client.router().clone(), client_in).accept_only(HOST_ORIGIN);
        let host_listener =
            InboundListener::new(host.router().clone(), host_in).accept_only(CLIENT_ORIGIN);

        let tasks = vec![
            tokio::spawn(forward(client_out, CLIENT_ORIGIN.into(), host_inbox)),
            tokio::spawn(forward(host_out, HOST_ORIGIN.into(), client_inbox.clone())),
            tokio::spawn(async move {
                client_listener.run().await;
            }),
            tokio::spawn(async move {
                host_listener.run().await;
            }),
        ];

        Self {
            client,
            host,
            client_inbox,
            tasks,
        }
    }
}

impl Drop for Link {
    fn drop(&mut self) {
        for task in &self.tasks {
            task.abort();
        }
    }
}
