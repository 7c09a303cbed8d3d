//! # Subscription Flows
//!
//! The client subscribes to host events; the host pushes commands and gets
//! the client's handler results back.

#[cfg(test)]
mod tests {
    use crate::harness::Link;
    use embedlink_router::{
        handler, Bridge, ChannelTransport, Envelope, Handler, RouterConfig,
    };
    use parking_lot::Mutex;
    use serde_json::{json, Value};
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::sync::mpsc;
    use tokio::time::timeout;

    const WAIT: Duration = Duration::from_secs(2);

    /// Host-side SUBSCRIBE/UNSUBSCRIBE handler reporting `(command, topic)`.
    fn topic_recorder(command: &'static str) -> (Handler, mpsc::UnboundedReceiver<(String, Value)>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let recorder = handler(move |args| {
            let topic = args.first().map(|p| p["topic"].clone()).unwrap_or_default();
            let _ = tx.send((command.to_string(), topic));
            Ok(json!(true))
        });
        (recorder, rx)
    }

    #[tokio::test]
    async fn test_price_update_scenario_on_the_wire() {
        let (transport, mut outbound) = ChannelTransport::channel();
        let bridge = Bridge::new(Arc::new(transport));
        bridge
            .subscribe(
                "price-update",
                handler(|args| Ok(json!({"seen": args.first().cloned()}))),
            )
            .await
            .unwrap();

        let subscribe = Envelope::decode(&outbound.recv().await.unwrap()).unwrap();
        assert_eq!(subscribe.message_type, "SUBSCRIBE");
        assert_eq!(subscribe.payload, json!({"topic": "price-update"}));

        bridge
            .handle_raw(r#"{"type":"PRICE_UPDATE","uid":"5","payload":{"v":10}}"#)
            .await;

        let reply = Envelope::decode(&outbound.recv().await.unwrap()).unwrap();
        assert_eq!(
            reply,
            Envelope::new("PRICE_UPDATE_OK", "5", json!({"seen": {"v": 10}}))
        );
    }

    #[tokio::test]
    async fn test_host_pushes_to_subscriber() {
        let link = Link::connect();
        let (recorder, mut topics) = topic_recorder("SUBSCRIBE");
        link.host.router().add_handler("SUBSCRIBE", recorder);

        link.client
            .subscribe(
                "price-update",
                handler(|args| {
                    let v = args.first().and_then(|p| p["v"].as_i64()).unwrap_or(0);
                    Ok(json!(v * 2))
                }),
            )
            .await
            .unwrap();

        let (command, topic) = timeout(WAIT, topics.recv()).await.unwrap().unwrap();
        assert_eq!(command, "SUBSCRIBE");
        assert_eq!(topic, json!("price-update"));

        let result = timeout(WAIT, link.host.invoke("PRICE_UPDATE", json!({"v": 10})))
            .await
            .unwrap();
        assert_eq!(result.unwrap(), json!(20));
    }

    #[tokio::test]
    async fn test_passive_events_are_not_requested() {
        let (transport, mut outbound) = ChannelTransport::channel();
        let bridge = Bridge::new(Arc::new(transport));
        for event in ["load", "loading", "no-data"] {
            bridge.subscribe(event, handler(|_| Ok(Value::Null))).await.unwrap();
        }
        bridge.subscribe("tick", handler(|_| Ok(Value::Null))).await.unwrap();

        let only = Envelope::decode(&outbound.recv().await.unwrap()).unwrap();
        assert_eq!(only.payload, json!({"topic": "tick"}));
        assert!(outbound.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_unsubscribed_handler_is_not_called() {
        let link = Link::connect();
        let calls = Arc::new(Mutex::new(0));
        let counter = {
            let calls = calls.clone();
            handler(move |_| {
                *calls.lock() += 1;
                Ok(Value::Null)
            })
        };

        link.client.subscribe("tick", counter.clone()).await.unwrap();
        timeout(WAIT, link.host.invoke("TICK", json!(null)))
            .await
            .unwrap()
            .unwrap();

        assert!(link.client.unsubscribe("tick", &counter).await);
        let err = timeout(WAIT, link.host.invoke("TICK", json!(null)))
            .await
            .unwrap()
            .unwrap_err();

        assert_eq!(err.rejection(), Some(&json!({"error": "no handler"})));
        assert_eq!(*calls.lock(), 1);
    }

    #[tokio::test]
    async fn test_unsubscribe_never_registered() {
        let link = Link::connect();
        let registered = handler(|_| Ok(Value::Null));
        let stranger = handler(|_| Ok(Value::Null));
        link.client.subscribe("load", registered).await.unwrap();

        assert!(!link.client.unsubscribe("load", &stranger).await);
        assert_eq!(link.client.router().handler_count("LOAD"), 1);
    }

    #[tokio::test]
    async fn test_unsubscribe_notification() {
        let client_config = RouterConfig {
            notify_unsubscribe: true,
            ..RouterConfig::default()
        };
        let link = Link::connect_with(client_config, RouterConfig::default()).unwrap();
        let (subscribes, mut topics) = topic_recorder("SUBSCRIBE");
        let (unsubscribes, mut untopics) = topic_recorder("UNSUBSCRIBE");
        link.host.router().add_handler("SUBSCRIBE", subscribes);
        link.host.router().add_handler("UNSUBSCRIBE", unsubscribes);

        let h = handler(|_| Ok(Value::Null));
        link.client.subscribe("tick", h.clone()).await.unwrap();
        timeout(WAIT, topics.recv()).await.unwrap().unwrap();

        link.client.unsubscribe("tick", &h).await;
        let (command, topic) = timeout(WAIT, untopics.recv()).await.unwrap().unwrap();
        assert_eq!(command, "UNSUBSCRIBE");
        assert_eq!(topic, json!("tick"));
    }

    #[tokio::test]
    async fn test_fan_out_reports_last_success() {
        let link = Link::connect();
        let client = &link.client;
        client
            .subscribe("load", handler(|_| Ok(json!("first"))))
            .await
            .unwrap()
            .subscribe("load", handler(|_| Err(anyhow::anyhow!("broken chart"))))
            .await
            .unwrap();

        let result = timeout(WAIT, link.host.invoke("LOAD", json!(null)))
            .await
            .unwrap();
        assert_eq!(result.unwrap(), json!("first"));
    }

    #[tokio::test]
    async fn test_array_payload_spreads_into_arguments() {
        let link = Link::connect();
        link.client
            .subscribe(
                "load",
                handler(|args| {
                    let first: String = args.parse(0)?;
                    let second: i64 = args.parse(1)?;
                    Ok(json!(format!("{first}:{second}")))
                }),
            )
            .await
            .unwrap();

        let result = timeout(WAIT, link.host.invoke("LOAD", json!(["a", 7])))
            .await
            .unwrap();
        assert_eq!(result.unwrap(), json!("a:7"));
    }
}
