//! Embedlink Dataset - shapes host data messages into a typed cube.
//!
//! The host pushes `LOAD`/`LOAD_DATA` with sparse data points and axes, and
//! `LOADING`/`NO_DATA` with axes only. [`install`] registers interceptors on a
//! router so handlers receive `[cube, axes]` (or `[axes]`) as positional
//! arguments, which [`Dataset::from_args`] and [`Axes::from_args`] turn back
//! into typed views.
//!
//! ```ignore
//! embedlink_dataset::install(bridge.router());
//! bridge.subscribe("load", handler(|args| {
//!     let dataset = Dataset::from_args(args)?;
//!     for z in dataset.axes().zs() { /* ... */ }
//!     Ok(Value::Null)
//! })).await?;
//! ```

#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod axes;
pub mod cube;
pub mod format;
pub mod install;

pub use axes::{AxisItem, AxisName, Axes};
pub use cube::{Cell, DataPoint, Dataset};
pub use format::{format_number, make_value, DEFAULT_PRECISION};
pub use install::{axes_interceptor, install, load_interceptor};

/// Dataset errors
#[derive(Debug, thiserror::Error)]
pub enum DatasetError {
    #[error("invalid payload: {0}")]
    InvalidPayload(String),

    #[error("malformed dataset: {0}")]
    Json(#[from] serde_json::Error),

    #[error("missing handler argument {0}")]
    MissingArgument(usize),

    #[error("Unknown axes coords")]
    UnknownCoords,
}
