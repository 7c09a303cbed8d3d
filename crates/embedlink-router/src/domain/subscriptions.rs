//! Handler and interceptor tables.
//!
//! Both tables are keyed by base type. Lookups hand out cloned `Arc`s so no
//! lock is held while user code runs; a handler may subscribe, unsubscribe
//! or set interceptors while being dispatched.

use crate::domain::args::HandlerArgs;
use parking_lot::RwLock;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// A subscription handler. Its return value becomes the response payload.
pub type Handler = Arc<dyn Fn(&HandlerArgs) -> anyhow::Result<Value> + Send + Sync>;

/// A payload transform applied before handlers or call continuations.
pub type Interceptor = Arc<dyn Fn(Value) -> anyhow::Result<HandlerArgs> + Send + Sync>;

/// Wrap a closure as a [`Handler`].
pub fn handler<F>(f: F) -> Handler
where
    F: Fn(&HandlerArgs) -> anyhow::Result<Value> + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Wrap a closure as an [`Interceptor`].
pub fn interceptor<F>(f: F) -> Interceptor
where
    F: Fn(Value) -> anyhow::Result<HandlerArgs> + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Identity of a handler: the address of its allocation.
///
/// Compares data pointers only, so two clones of one `Handler` match while
/// two separately allocated but identical closures do not.
fn same_handler(a: &Handler, b: &Handler) -> bool {
    std::ptr::eq(Arc::as_ptr(a) as *const (), Arc::as_ptr(b) as *const ())
}

/// Base type → ordered handler list.
#[derive(Default)]
pub struct SubscriptionTable {
    handlers: RwLock<HashMap<String, Vec<Handler>>>,
}

impl SubscriptionTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a handler. The same handler may be added more than once.
    pub fn add(&self, base_type: &str, handler: Handler) {
        let mut handlers = self.handlers.write();
        let list = handlers.entry(base_type.to_string()).or_default();
        list.push(handler);
        debug!(message_type = base_type, handlers = list.len(), "Handler added");
    }

    /// Remove the first instance of `handler`. Returns whether one was found.
    pub fn remove(&self, base_type: &str, handler: &Handler) -> bool {
        let mut handlers = self.handlers.write();
        let Some(list) = handlers.get_mut(base_type) else {
            return false;
        };
        let Some(index) = list.iter().position(|h| same_handler(h, handler)) else {
            return false;
        };
        list.remove(index);
        debug!(message_type = base_type, handlers = list.len(), "Handler removed");
        true
    }

    /// Snapshot of the handlers for `base_type`, in subscription order.
    pub fn handlers(&self, base_type: &str) -> Vec<Handler> {
        self.handlers
            .read()
            .get(base_type)
            .cloned()
            .unwrap_or_default()
    }

    /// Number of handlers registered for `base_type`.
    pub fn count(&self, base_type: &str) -> usize {
        self.handlers.read().get(base_type).map_or(0, Vec::len)
    }

    /// Base types with at least one handler.
    pub fn subscribed_types(&self) -> Vec<String> {
        let mut types: Vec<String> = self
            .handlers
            .read()
            .iter()
            .filter(|(_, list)| !list.is_empty())
            .map(|(name, _)| name.clone())
            .collect();
        types.sort();
        types
    }
}

/// Base type → interceptor (last registration wins).
#[derive(Default)]
pub struct InterceptorTable {
    interceptors: RwLock<HashMap<String, Interceptor>>,
}

impl InterceptorTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the interceptor for `base_type`, returning the replaced one.
    pub fn set(&self, base_type: &str, interceptor: Interceptor) -> Option<Interceptor> {
        self.interceptors
            .write()
            .insert(base_type.to_string(), interceptor)
    }

    pub fn get(&self, base_type: &str) -> Option<Interceptor> {
        self.interceptors.read().get(base_type).cloned()
    }
}
