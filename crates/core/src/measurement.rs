// Copyright 2025 Perfdash Ingest Contributors
// SPDX-License-Identifier: Apache-2.0

//! Measurement item types.
//!
//! A [`MeasurementItem`] is a unit-tagged, labeled numeric series. It is the
//! common currency of every payload shape: responsiveness payloads carry them
//! directly inside a [`PerfData`] envelope, resource-usage payloads are
//! folded into them.

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

/// Label carrying a sample count; never rendered downstream.
pub const COUNT_LABEL: &str = "Count";

/// Label naming the pod a resource item belongs to.
pub const POD_NAME_LABEL: &str = "PodName";

/// Label naming the resource kind of a resource item.
pub const RESOURCE_LABEL: &str = "Resource";

/// Deserialize a field that producers may write as `null`, mapping `null`
/// to the type's default.
///
/// Pair with `#[serde(default)]` so an absent field is accepted too.
pub fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}

/// A labeled series of numeric values sharing one unit.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MeasurementItem {
    /// Metric or percentile name to value.
    #[serde(rename = "data", default, deserialize_with = "null_as_default")]
    pub series: BTreeMap<String, f64>,
    /// Unit of every value in `series`.
    #[serde(default, deserialize_with = "null_as_default")]
    pub unit: String,
    /// Labels identifying what the item measures.
    #[serde(
        default,
        deserialize_with = "null_as_default",
        skip_serializing_if = "BTreeMap::is_empty"
    )]
    pub labels: BTreeMap<String, String>,
}

impl MeasurementItem {
    /// Create an empty item with the given unit.
    pub fn new(unit: impl Into<String>) -> Self {
        Self {
            series: BTreeMap::new(),
            unit: unit.into(),
            labels: BTreeMap::new(),
        }
    }

    /// Add a label.
    pub fn with_label(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.labels.insert(key.into(), value.into());
        self
    }

    /// Add a series point.
    pub fn with_point(mut self, key: impl Into<String>, value: f64) -> Self {
        self.series.insert(key.into(), value);
        self
    }

    /// Look up a label value.
    pub fn label(&self, key: &str) -> Option<&str> {
        self.labels.get(key).map(String::as_str)
    }

    /// Remove a label, returning its previous value.
    pub fn strip_label(&mut self, key: &str) -> Option<String> {
        self.labels.remove(key)
    }
}

/// Envelope of a responsiveness payload.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PerfData {
    /// Schema version of the items.
    #[serde(default, deserialize_with = "null_as_default")]
    pub version: String,
    /// Measurement items in payload order.
    #[serde(rename = "dataItems", default, deserialize_with = "null_as_default")]
    pub data_items: Vec<MeasurementItem>,
}
