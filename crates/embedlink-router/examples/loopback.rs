//! # Loopback Demo
//!
//! Wires a client and a host router back to back in one process, runs a
//! subscribe/push/call round and prints the Prometheus counters.
//!
//! ```bash
//! EMBEDLINK_LOG_LEVEL=debug cargo run -p embedlink-router --example loopback
//! ```

use anyhow::{Context, Result};
use embedlink_router::{
    forward, handler, sweep_task, Bridge, ChannelTransport, InboundListener, RouterConfig,
};
use embedlink_telemetry::{encode_metrics, init_telemetry, TelemetryConfig};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    let _telemetry = init_telemetry(&TelemetryConfig::for_endpoint("loopback"))
        .context("telemetry init")?;

    let config = RouterConfig::default().with_call_timeout(Duration::from_secs(5));
    let (client_transport, client_out) = ChannelTransport::channel();
    let (host_transport, host_out) = ChannelTransport::channel();
    let client = Bridge::with_config(config.clone(), Arc::new(client_transport))?;
    let host = Bridge::with_config(config, Arc::new(host_transport))?;

    let (client_inbox, client_in) = mpsc::channel(64);
    let (host_inbox, host_in) = mpsc::channel(64);
    tokio::spawn(forward(client_out, "client".into(), host_inbox));
    tokio::spawn(forward(host_out, "host".into(), client_inbox));
    tokio::spawn(InboundListener::new(client.router().clone(), client_in).accept_only("host").run());
    tokio::spawn(InboundListener::new(host.router().clone(), host_in).accept_only("client").run());
    tokio::spawn(sweep_task(client.router().clone(), Duration::from_secs(1)));

    host.router().add_handler(
        "INIT",
        handler(|args| Ok(json!({"ok": true, "echo": args.first().cloned()}))),
    );
    host.router().add_handler(
        "SUBSCRIBE",
        handler(|args| {
            info!(topic = ?args.first(), "Host accepted subscription");
            Ok(json!(true))
        }),
    );

    let ready = client.initialize(json!({"locale": "en"})).await?;
    info!(%ready, "Client initialized");

    client
        .subscribe(
            "price-update",
            handler(|args| {
                let v = args.first().and_then(|p| p["v"].as_f64()).unwrap_or(0.0);
                Ok(json!({"doubled": v * 2.0}))
            }),
        )
        .await?;

    let pushed = host.invoke("PRICE_UPDATE", json!({"v": 10})).await?;
    info!(%pushed, "Host push answered");

    match host.invoke("UNKNOWN", json!(null)).await {
        Ok(value) => info!(%value, "Unexpected success"),
        Err(e) => info!(error = %e, "Unhandled command rejected"),
    }

    println!("{}", encode_metrics()?);
    Ok(())
}
