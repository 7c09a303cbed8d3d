//! Ports (hexagonal boundaries) of the router.

pub mod transport;

pub use transport::{Transport, TransportError};
