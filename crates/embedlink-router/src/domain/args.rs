//! Handler calling convention.
//!
//! A payload reaches a handler either as one value or as a positional
//! argument list. JSON arrays are spread into positional arguments; any
//! other value is passed as a single argument. Interceptors return
//! [`HandlerArgs`] directly and may pick either shape.

use serde::de::DeserializeOwned;
use serde_json::Value;
use std::slice;

/// Arguments passed to a subscription handler.
#[derive(Debug, Clone, PartialEq)]
pub enum HandlerArgs {
    /// One argument.
    Single(Value),
    /// Positional arguments.
    Positional(Vec<Value>),
}

impl HandlerArgs {
    /// Apply the array-spreading convention to a raw payload.
    pub fn from_payload(payload: Value) -> Self {
        match payload {
            Value::Array(items) => HandlerArgs::Positional(items),
            other => HandlerArgs::Single(other),
        }
    }

    /// All arguments as a slice.
    pub fn as_slice(&self) -> &[Value] {
        match self {
            HandlerArgs::Single(value) => slice::from_ref(value),
            HandlerArgs::Positional(values) => values,
        }
    }

    /// Argument at `index`, if present.
    pub fn get(&self, index: usize) -> Option<&Value> {
        self.as_slice().get(index)
    }

    /// First argument, if any.
    pub fn first(&self) -> Option<&Value> {
        self.get(0)
    }

    pub fn len(&self) -> usize {
        self.as_slice().len()
    }

    pub fn is_empty(&self) -> bool {
        self.as_slice().is_empty()
    }

    pub fn is_positional(&self) -> bool {
        matches!(self, HandlerArgs::Positional(_))
    }

    /// Deserialize the argument at `index`.
    pub fn parse<T: DeserializeOwned>(&self, index: usize) -> anyhow::Result<T> {
        let value = self
            .get(index)
            .ok_or_else(|| anyhow::anyhow!("missing argument {}", index))?;
        Ok(serde_json::from_value(value.clone())?)
    }

    /// Collapse back into a single JSON value.
    ///
    /// Used when resolving a pending call, where only one value can be
    /// delivered: positional arguments become an array.
    pub fn into_value(self) -> Value {
        match self {
            HandlerArgs::Single(value) => value,
            HandlerArgs::Positional(values) => Value::Array(values),
        }
    }
}

impl From<Value> for HandlerArgs {
    fn from(payload: Value) -> Self {
        HandlerArgs::from_payload(payload)
    }
}
