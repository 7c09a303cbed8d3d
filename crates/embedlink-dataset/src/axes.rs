//! Axes of a dataset: metrics, locations, periods and units.

use crate::DatasetError;
use embedlink_router::HandlerArgs;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::collections::HashMap;

/// Canonical lookup key of an item id (ids arrive as strings or numbers).
pub fn id_key(id: &Value) -> String {
    match id {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// One entry of an axis. Only `id` is interpreted; everything else is kept.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AxisItem {
    pub id: Value,
    #[serde(flatten)]
    pub attributes: Map<String, Value>,
}

impl AxisItem {
    pub fn key(&self) -> String {
        id_key(&self.id)
    }

    pub fn attribute(&self, name: &str) -> Option<&Value> {
        self.attributes.get(name)
    }

    /// A non-empty string attribute.
    pub fn text_attribute(&self, name: &str) -> Option<&str> {
        self.attribute(name)
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
    }

    /// Id of the unit a metric is measured in: `unit_id`, else `dim_id`.
    pub fn unit_key(&self) -> Option<String> {
        match self.attribute("unit_id") {
            Some(id) => Some(id_key(id)),
            None => self.attribute("dim_id").map(id_key),
        }
    }
}

/// Name of an axis as used in axis orders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AxisName {
    Metrics,
    Locations,
    Periods,
    #[serde(other)]
    Unknown,
}

/// Axis items in order, indexed by id.
#[derive(Debug, Clone, Default)]
struct AxisList {
    items: Vec<AxisItem>,
    by_id: HashMap<String, usize>,
}

impl AxisList {
    fn new(items: Vec<AxisItem>) -> Self {
        // Later duplicates win, as with any keyed lookup
        let by_id = items
            .iter()
            .enumerate()
            .map(|(i, item)| (item.key(), i))
            .collect();
        Self { items, by_id }
    }

    fn get(&self, id: &str) -> Option<&AxisItem> {
        self.by_id.get(id).map(|&i| &self.items[i])
    }

    /// Position of this exact item (not just an equal one) in the list.
    fn position_of(&self, item: &AxisItem) -> Option<usize> {
        self.items.iter().position(|e| std::ptr::eq(e, item))
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawAxes {
    #[serde(default)]
    metrics: Vec<AxisItem>,
    #[serde(default)]
    locations: Vec<AxisItem>,
    #[serde(default)]
    periods: Vec<AxisItem>,
    #[serde(default)]
    units: Vec<AxisItem>,
    #[serde(default)]
    axes_order: Vec<AxisName>,
    #[serde(default)]
    axes_order_correct: Option<Vec<AxisName>>,
    #[serde(default)]
    axis_order: Option<Value>,
}

impl RawAxes {
    /// Resolve the effective axis order.
    ///
    /// `axesOrderCorrect` wins. Otherwise `axesOrder` is used as is, except
    /// that senders which also emit the legacy `axisOrder` field send it
    /// reversed (x, y, z).
    fn resolved_order(&self) -> Vec<AxisName> {
        if let Some(order) = &self.axes_order_correct {
            return order.clone();
        }
        let mut order = self.axes_order.clone();
        if self.axis_order.is_some() {
            order.reverse();
        }
        order
    }
}

/// Typed view of the axes payload.
#[derive(Debug, Clone)]
pub struct Axes {
    metrics: AxisList,
    locations: AxisList,
    periods: AxisList,
    units: AxisList,
    order: Vec<AxisName>,
}

impl Axes {
    /// Parse an axes object, resolving the axis order.
    pub fn from_value(value: Value) -> Result<Self, DatasetError> {
        if !value.is_object() {
            return Err(DatasetError::InvalidPayload("axes must be an object".into()));
        }
        let raw: RawAxes = serde_json::from_value(value)?;
        let order = raw.resolved_order();
        Ok(Self {
            metrics: AxisList::new(raw.metrics),
            locations: AxisList::new(raw.locations),
            periods: AxisList::new(raw.periods),
            units: AxisList::new(raw.units),
            order,
        })
    }

    /// Axes from `[axes]` handler arguments.
    pub fn from_args(args: &HandlerArgs) -> Result<Self, DatasetError> {
        let axes = args.first().ok_or(DatasetError::MissingArgument(0))?;
        Self::from_value(axes.clone())
    }

    /// Serialize with the resolved order, so that parsing it again yields
    /// the same axes.
    pub fn to_value(&self) -> Value {
        json!({
            "metrics": self.metrics.items,
            "locations": self.locations.items,
            "periods": self.periods.items,
            "units": self.units.items,
            "axesOrderCorrect": self.order,
        })
    }

    pub fn metrics(&self) -> &[AxisItem] {
        &self.metrics.items
    }

    pub fn locations(&self) -> &[AxisItem] {
        &self.locations.items
    }

    pub fn periods(&self) -> &[AxisItem] {
        &self.periods.items
    }

    pub fn units(&self) -> &[AxisItem] {
        &self.units.items
    }

    pub fn metric(&self, id: &str) -> Option<&AxisItem> {
        self.metrics.get(id)
    }

    pub fn location(&self, id: &str) -> Option<&AxisItem> {
        self.locations.get(id)
    }

    pub fn period(&self, id: &str) -> Option<&AxisItem> {
        self.periods.get(id)
    }

    pub fn unit(&self, id: &str) -> Option<&AxisItem> {
        self.units.get(id)
    }

    pub fn unit_of(&self, metric: &AxisItem) -> Option<&AxisItem> {
        metric.unit_key().and_then(|id| self.unit(&id))
    }

    pub fn order(&self) -> &[AxisName] {
        &self.order
    }

    /// Items of the named axis; unknown names have no items.
    pub fn axis(&self, name: AxisName) -> &[AxisItem] {
        match name {
            AxisName::Metrics => self.metrics(),
            AxisName::Locations => self.locations(),
            AxisName::Periods => self.periods(),
            AxisName::Unknown => &[],
        }
    }

    fn axis_at(&self, position: usize) -> &[AxisItem] {
        match self.order.get(position) {
            Some(&name) => self.axis(name),
            None => &[],
        }
    }

    pub fn zs(&self) -> &[AxisItem] {
        self.axis_at(0)
    }

    pub fn ys(&self) -> &[AxisItem] {
        self.axis_at(1)
    }

    pub fn xs(&self) -> &[AxisItem] {
        self.axis_at(2)
    }

    /// Indices `(metric, location, period)` of three items taken from these
    /// axes, in any order.
    pub(crate) fn locate(&self, coords: [&AxisItem; 3]) -> Option<(usize, usize, usize)> {
        let find = |list: &AxisList| coords.iter().find_map(|item| list.position_of(item));
        Some((find(&self.metrics)?, find(&self.locations)?, find(&self.periods)?))
    }
}
