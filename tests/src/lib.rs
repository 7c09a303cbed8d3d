//! # Embedlink Test Suite
//!
//! Cross-crate flows between a client and a host router.
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! ├── harness.rs        # Client ↔ host wiring over channels
//! └── integration/
//!     ├── request_response.rs
//!     ├── subscriptions.rs
//!     ├── dataset_flow.rs
//!     └── codec_properties.rs
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p embedlink-tests
//! cargo test -p embedlink-tests integration::subscriptions
//! cargo bench -p embedlink-tests
//! ```

pub mod harness;
pub mod integration;
