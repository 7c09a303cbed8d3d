//! # Dataset Flows
//!
//! The host pushes data messages; the client's dataset interceptors shape
//! them before its handlers (or pending calls) see them.

#[cfg(test)]
mod tests {
    use crate::harness::Link;
    use embedlink_dataset::{install, Axes, Dataset};
    use embedlink_router::{handler, HandlerArgs};
    use serde_json::{json, Value};
    use std::time::Duration;
    use tokio::time::timeout;

    const WAIT: Duration = Duration::from_secs(2);

    fn sales() -> Value {
        json!({
            "data": [
                {"metric_id": 1, "loc_id": 10, "period_id": "q1", "val": 1000},
                {"metric_id": 1, "loc_id": 10, "period_id": "q2", "val": 2500.5},
                {"metric_id": 1, "loc_id": 20, "period_id": "q1", "value": 300},
                {"metric_id": 2, "loc_id": 20, "period_id": "q2", "val": "n/a"}
            ],
            "axes": {
                "metrics": [{"id": 1, "title": "Sales", "unit_id": 5}, {"id": 2, "title": "Notes"}],
                "locations": [{"id": 10}, {"id": 20}],
                "periods": [{"id": "q1"}, {"id": "q2"}],
                "units": [{"id": 5, "value_suffix": "USD"}],
                "axesOrder": ["periods", "locations", "metrics"],
                "axisOrder": ["metrics", "locations", "periods"]
            }
        })
    }

    #[tokio::test]
    async fn test_load_handler_walks_the_cube() {
        let link = Link::connect();
        install(link.client.router());
        link.client
            .subscribe(
                "load",
                handler(|args| {
                    let dataset = Dataset::from_args(args)?;
                    let axes = dataset.axes();
                    let mut rows = Vec::new();
                    for z in axes.zs() {
                        for y in axes.ys() {
                            for x in axes.xs() {
                                rows.push(dataset.value_at(z, y, x)?.text.clone());
                            }
                        }
                    }
                    Ok(json!(rows))
                }),
            )
            .await
            .unwrap();

        let result = timeout(WAIT, link.host.invoke("LOAD", sales()))
            .await
            .unwrap()
            .unwrap();

        // Legacy axisOrder present: axesOrder is reversed to metrics/locations/periods
        assert_eq!(
            result,
            json!([
                "1 000 USD", "2 500.50 USD", "300 USD", "-",
                "-", "-", "-", "n/a"
            ])
        );
    }

    #[tokio::test]
    async fn test_load_data_uses_same_shaping() {
        let link = Link::connect();
        install(link.client.router());
        link.client
            .subscribe(
                "load-data",
                handler(|args| {
                    let dataset = Dataset::from_args(args)?;
                    let total: f64 = dataset.cells().filter_map(|c| c.as_f64()).sum();
                    Ok(json!(total))
                }),
            )
            .await
            .unwrap();

        let result = timeout(WAIT, link.host.invoke("LOAD_DATA", sales()))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(result, json!(3800.5));
    }

    #[tokio::test]
    async fn test_loading_handler_receives_axes() {
        let link = Link::connect();
        install(link.client.router());
        link.client
            .subscribe(
                "loading",
                handler(|args| {
                    let axes = Axes::from_args(args)?;
                    let titles: Vec<Value> = axes
                        .zs()
                        .iter()
                        .filter_map(|m| m.attribute("title").cloned())
                        .collect();
                    Ok(json!(titles))
                }),
            )
            .await
            .unwrap();

        let payload = json!({"axes": sales()["axes"].clone()});
        let result = timeout(WAIT, link.host.invoke("LOADING", payload))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(result, json!(["Sales", "Notes"]));
    }

    #[tokio::test]
    async fn test_response_is_shaped_before_resolving_call() {
        let link = Link::connect();
        install(link.client.router());
        link.host
            .router()
            .add_handler("LOAD_DATA", handler(|_| Ok(sales())));

        let value = timeout(WAIT, link.client.invoke("LOAD_DATA", json!({"period": "q2"})))
            .await
            .unwrap()
            .unwrap();

        // Positional interceptor output arrives as one array
        let dataset = Dataset::from_args(&HandlerArgs::from_payload(value)).unwrap();
        assert_eq!(dataset.cell("1", "10", "q2").unwrap().text, "2 500.50 USD");
    }

    #[tokio::test]
    async fn test_malformed_data_fails_the_push() {
        let link = Link::connect();
        install(link.client.router());
        link.client
            .subscribe("load", handler(|_| Ok(json!("unreachable"))))
            .await
            .unwrap();

        let err = timeout(WAIT, link.host.invoke("LOAD", json!({"axes": "broken"})))
            .await
            .unwrap()
            .unwrap_err();
        assert!(err.rejection().is_some());
    }
}
