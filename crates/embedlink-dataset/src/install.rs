//! Interceptors turning host data messages into handler arguments.

use crate::axes::Axes;
use crate::cube::Dataset;
use crate::DatasetError;
use embedlink_router::{interceptor, HandlerArgs, Interceptor, Router};
use serde_json::Value;
use tracing::debug;

pub const LOAD: &str = "LOAD";
pub const LOAD_DATA: &str = "LOAD_DATA";
pub const LOADING: &str = "LOADING";
pub const NO_DATA: &str = "NO_DATA";

/// `{data, axes}` → `[cube, axes]`.
pub fn load_interceptor() -> Interceptor {
    interceptor(|payload| {
        let dataset = Dataset::from_payload(payload)?;
        debug!(cells = dataset.cells().count(), "Dataset shaped");
        Ok(dataset.to_args()?)
    })
}

/// `{axes}` → `[axes]`.
pub fn axes_interceptor() -> Interceptor {
    interceptor(|payload: Value| {
        let axes = payload
            .get("axes")
            .cloned()
            .ok_or_else(|| DatasetError::InvalidPayload("missing axes".into()))?;
        Ok(HandlerArgs::Positional(vec![Axes::from_value(axes)?.to_value()]))
    })
}

/// Register the dataset interceptors on `router`.
pub fn install(router: &Router) {
    router.set_interceptor(LOAD, load_interceptor());
    router.set_interceptor(LOAD_DATA, load_interceptor());
    router.set_interceptor(LOADING, axes_interceptor());
    router.set_interceptor(NO_DATA, axes_interceptor());
}
