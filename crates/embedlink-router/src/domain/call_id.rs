//! Call ids for request tracking.
//!
//! Minted from a per-router counter starting at zero. Only uniqueness among
//! pending calls matters, not unpredictability.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Id of an outbound call, rendered on the wire as a decimal string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CallId(u64);

impl CallId {
    pub fn from_u64(value: u64) -> Self {
        Self(value)
    }

    /// Parse a wire uid. Returns `None` for uids this router never mints.
    pub fn parse(uid: &str) -> Option<Self> {
        // "007" or "+7" would parse to 7 but were never minted as such
        if !uid.bytes().all(|b| b.is_ascii_digit()) || (uid.len() > 1 && uid.starts_with('0')) {
            return None;
        }
        uid.parse().ok().map(Self)
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for CallId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<CallId> for String {
    fn from(id: CallId) -> Self {
        id.to_string()
    }
}

/// Monotonic call id source.
#[derive(Debug, Default)]
pub struct CallIdGenerator {
    next: AtomicU64,
}

impl CallIdGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_id(&self) -> CallId {
        CallId(self.next.fetch_add(1, Ordering::Relaxed))
    }
}
