//! Pending call store.
//!
//! Maps call ids to the completion channel of an outstanding outbound call.
//!
//! Flow:
//! 1. `Router::request` calls `register()` to mint an id and get a receiver
//! 2. The request envelope is sent with that id as its uid
//! 3. Inbound dispatch calls `take()` when a `_OK`/`_FAILED` with the id arrives
//! 4. The taken record is settled exactly once and the caller's receiver fires

use crate::domain::call_id::{CallId, CallIdGenerator};
use crate::domain::error::{CallError, CallResult};
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::oneshot;
use tracing::{debug, warn};

/// Statistics for the pending call store
#[derive(Debug, Default)]
pub struct PendingStats {
    /// Total calls registered
    pub total_registered: AtomicU64,
    /// Total calls settled by a response
    pub total_completed: AtomicU64,
    /// Total calls expired by the timeout sweep
    pub total_timeouts: AtomicU64,
    /// Total calls cancelled or whose caller stopped waiting
    pub total_cancelled: AtomicU64,
}

/// A pending call taken out of the store, ready to be settled.
pub struct PendingCall {
    id: CallId,
    sender: oneshot::Sender<CallResult>,
    created_at: Instant,
    message_type: String,
    deadline: Option<Instant>,
    stats: Arc<PendingStats>,
}

impl PendingCall {
    pub fn id(&self) -> CallId {
        self.id
    }

    /// Deliver the outcome to the waiting caller.
    ///
    /// Returns false if the caller already stopped waiting.
    pub fn settle(self, result: CallResult) -> bool {
        let elapsed = self.created_at.elapsed();
        match self.sender.send(result) {
            Ok(()) => {
                self.stats.total_completed.fetch_add(1, Ordering::Relaxed);
                debug!(
                    uid = %self.id,
                    message_type = %self.message_type,
                    response_time_ms = elapsed.as_millis() as u64,
                    "Settled pending call"
                );
                true
            }
            Err(_) => {
                // Receiver was dropped (fire-and-forget or caller gave up)
                self.stats.total_cancelled.fetch_add(1, Ordering::Relaxed);
                debug!(
                    uid = %self.id,
                    message_type = %self.message_type,
                    "Pending call receiver dropped"
                );
                false
            }
        }
    }

    fn is_expired(&self, now: Instant) -> bool {
        self.deadline.is_some_and(|deadline| now >= deadline)
    }
}

/// Pending call store.
pub struct PendingCallStore {
    /// Map of call id to pending call
    pending: DashMap<CallId, PendingCall>,
    /// Source of fresh call ids
    ids: CallIdGenerator,
    /// Statistics
    stats: Arc<PendingStats>,
}

impl PendingCallStore {
    pub fn new() -> Self {
        Self {
            pending: DashMap::new(),
            ids: CallIdGenerator::new(),
            stats: Arc::new(PendingStats::default()),
        }
    }

    /// Register a pending call and get a receiver for its outcome.
    ///
    /// `timeout` only sets the deadline used by [`remove_expired`]; waiting
    /// callers enforce it themselves.
    ///
    /// [`remove_expired`]: PendingCallStore::remove_expired
    pub fn register(
        &self,
        message_type: &str,
        timeout: Option<Duration>,
    ) -> (CallId, oneshot::Receiver<CallResult>) {
        let id = self.ids.next_id();
        let (tx, rx) = oneshot::channel();
        let created_at = Instant::now();

        let call = PendingCall {
            id,
            sender: tx,
            created_at,
            message_type: message_type.to_string(),
            deadline: timeout.map(|t| created_at + t),
            stats: self.stats.clone(),
        };

        self.pending.insert(id, call);
        self.stats.total_registered.fetch_add(1, Ordering::Relaxed);

        debug!(uid = %id, message_type = message_type, "Registered pending call");

        (id, rx)
    }

    /// Remove a pending call so it can be settled.
    pub fn take(&self, id: CallId) -> Option<PendingCall> {
        self.pending.remove(&id).map(|(_, call)| call)
    }

    /// Reject every call whose deadline has passed with [`CallError::Timeout`].
    ///
    /// Returns the number of calls removed.
    pub fn remove_expired(&self) -> usize {
        let now = Instant::now();
        let expired: Vec<CallId> = self
            .pending
            .iter()
            .filter(|entry| entry.value().is_expired(now))
            .map(|entry| *entry.key())
            .collect();

        let mut removed = 0;
        for id in expired {
            // Re-check under removal: a response may have raced the sweep
            let Some((_, call)) = self.pending.remove_if(&id, |_, call| call.is_expired(now)) else {
                continue;
            };
            let after = now.duration_since(call.created_at);
            warn!(
                uid = %id,
                message_type = %call.message_type,
                elapsed_ms = after.as_millis() as u64,
                "Removing expired pending call"
            );
            self.stats.total_timeouts.fetch_add(1, Ordering::Relaxed);
            let _ = call.sender.send(Err(CallError::Timeout { uid: id, after }));
            removed += 1;
        }

        removed
    }

    /// Drop a pending call without settling it.
    pub fn cancel(&self, id: &CallId) -> bool {
        if self.pending.remove(id).is_some() {
            self.stats.total_cancelled.fetch_add(1, Ordering::Relaxed);
            true
        } else {
            false
        }
    }

    /// Get number of currently pending calls
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Get statistics
    pub fn stats(&self) -> &PendingStats {
        &self.stats
    }
}

impl Default for PendingCallStore {
    fn default() -> Self {
        Self::new()
    }
}
