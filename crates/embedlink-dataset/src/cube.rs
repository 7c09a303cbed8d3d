//! Dense metric × location × period cube built from sparse data points.

use crate::axes::{id_key, AxisItem, Axes};
use crate::format::make_value;
use crate::DatasetError;
use embedlink_router::HandlerArgs;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;

/// One sparse data point as sent by the host.
#[derive(Debug, Clone, Deserialize)]
pub struct DataPoint {
    #[serde(default)]
    pub metric_id: Value,
    #[serde(default)]
    pub loc_id: Value,
    #[serde(default)]
    pub period_id: Value,
    #[serde(default)]
    pub val: Value,
    /// Deprecated spelling of `val`.
    #[serde(default)]
    pub value: Value,
}

impl DataPoint {
    pub fn effective_value(&self) -> &Value {
        if self.val.is_null() {
            &self.value
        } else {
            &self.val
        }
    }

    fn coords(&self) -> (String, String, String) {
        (
            id_key(&self.metric_id),
            id_key(&self.loc_id),
            id_key(&self.period_id),
        )
    }
}

/// A cube cell: value, coordinates and display text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cell {
    /// Number, string, or null when the point is missing
    pub value: Value,
    pub metric: String,
    pub location: String,
    pub period: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    pub text: String,
}

impl Cell {
    fn new(value: Value, metric: &AxisItem, location: &AxisItem, period: &AxisItem, unit: Option<&AxisItem>) -> Self {
        let text = make_value(&value, unit, None);
        Self {
            value,
            metric: metric.key(),
            location: location.key(),
            period: period.key(),
            unit: unit.map(AxisItem::key),
            text,
        }
    }

    pub fn is_missing(&self) -> bool {
        self.value.is_null()
    }

    pub fn as_f64(&self) -> Option<f64> {
        self.value.as_f64()
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

#[derive(Deserialize)]
struct LoadPayload {
    data: Vec<DataPoint>,
    axes: Value,
}

/// Axes plus the cube `[metric][location][period]` in axis list order.
#[derive(Debug, Clone)]
pub struct Dataset {
    cube: Vec<Vec<Vec<Cell>>>,
    axes: Axes,
}

impl Dataset {
    /// Index the points and lay them out densely; absent points become
    /// null cells. A later point for the same coordinates replaces an
    /// earlier one.
    pub fn build(points: &[DataPoint], axes: Axes) -> Self {
        let index: HashMap<_, _> = points
            .iter()
            .map(|point| (point.coords(), point.effective_value()))
            .collect();

        let cube: Vec<Vec<Vec<Cell>>> = axes
            .metrics()
            .iter()
            .map(|m| {
                let unit = axes.unit_of(m);
                axes.locations()
                    .iter()
                    .map(|l| {
                        axes.periods()
                            .iter()
                            .map(|p| {
                                let value = index
                                    .get(&(m.key(), l.key(), p.key()))
                                    .map_or(Value::Null, |v| (*v).clone());
                                Cell::new(value, m, l, p, unit)
                            })
                            .collect()
                    })
                    .collect()
            })
            .collect();

        Self { cube, axes }
    }

    /// Build from a `{data, axes}` payload.
    pub fn from_payload(payload: Value) -> Result<Self, DatasetError> {
        if !payload.is_object() {
            return Err(DatasetError::InvalidPayload("payload must be an object".into()));
        }
        let LoadPayload { data, axes } = serde_json::from_value(payload)?;
        Ok(Self::build(&data, Axes::from_value(axes)?))
    }

    /// Handler arguments `[cube, axes]`.
    pub fn to_args(&self) -> Result<HandlerArgs, DatasetError> {
        Ok(HandlerArgs::Positional(vec![
            serde_json::to_value(&self.cube)?,
            self.axes.to_value(),
        ]))
    }

    /// Rebuild a dataset from `[cube, axes]` handler arguments.
    pub fn from_args(args: &HandlerArgs) -> Result<Self, DatasetError> {
        let cube_arg = args.get(0).ok_or(DatasetError::MissingArgument(0))?;
        let axes_arg = args.get(1).ok_or(DatasetError::MissingArgument(1))?;

        let cube: Vec<Vec<Vec<Cell>>> = serde_json::from_value(cube_arg.clone())?;
        let axes = Axes::from_value(axes_arg.clone())?;

        let (ms, ls, ps) = (axes.metrics().len(), axes.locations().len(), axes.periods().len());
        let shape_ok = cube.len() == ms
            && cube
                .iter()
                .all(|plane| plane.len() == ls && plane.iter().all(|row| row.len() == ps));
        if !shape_ok {
            return Err(DatasetError::InvalidPayload(format!(
                "cube shape does not match axes {ms}x{ls}x{ps}"
            )));
        }

        Ok(Self { cube, axes })
    }

    pub fn axes(&self) -> &Axes {
        &self.axes
    }

    pub fn cube(&self) -> &[Vec<Vec<Cell>>] {
        &self.cube
    }

    /// Every cell, metric-major.
    pub fn cells(&self) -> impl Iterator<Item = &Cell> {
        self.cube.iter().flatten().flatten()
    }

    /// Cell at three axis items of this dataset, given in any order.
    ///
    /// Coordinates are matched by identity, so pass items obtained from
    /// [`Dataset::axes`], typically while iterating `zs`, `ys` and `xs`.
    pub fn value_at(&self, a: &AxisItem, b: &AxisItem, c: &AxisItem) -> Result<&Cell, DatasetError> {
        let (mi, li, pi) = self
            .axes
            .locate([a, b, c])
            .ok_or(DatasetError::UnknownCoords)?;
        self.cube
            .get(mi)
            .and_then(|plane| plane.get(li))
            .and_then(|row| row.get(pi))
            .ok_or(DatasetError::UnknownCoords)
    }

    /// Cell by metric, location and period ids.
    pub fn cell(&self, metric_id: &str, location_id: &str, period_id: &str) -> Option<&Cell> {
        let position = |items: &[AxisItem], id: &str| items.iter().position(|item| item.key() == id);
        let mi = position(self.axes.metrics(), metric_id)?;
        let li = position(self.axes.locations(), location_id)?;
        let pi = position(self.axes.periods(), period_id)?;
        self.cube.get(mi)?.get(li)?.get(pi)
    }
}
