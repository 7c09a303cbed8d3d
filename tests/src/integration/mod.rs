//! Integration flows.

pub mod codec_properties;
pub mod dataset_flow;
pub mod subscriptions;
