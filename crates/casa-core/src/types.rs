// Copyright (c) 2025 SOLARE S.R.O.
//
// This file is part of Casa.
//
// Licensed under the Creative Commons Attribution-NonCommercial-NoDerivatives 4.0 International
// (CC BY-NC-ND 4.0). You may use and share this file for non-commercial purposes only and you may not
// create derivatives. See <https://creativecommons.org/licenses/by-nc-nd/4.0/>.
//
// This software is provided "AS IS", without warranty of any kind.
//
// For commercial licensing, please contact: info@solare.cz

use serde::{Deserialize, Serialize, Serializer};
use std::collections::BTreeMap;

/// States the controller reports for entities it cannot currently read
pub const UNAVAILABLE_STATES: &[&str] = &["unavailable", "unknown"];

/// Sentinel reported for energy keys whose entity is missing from the live fetch
pub const NOT_AVAILABLE: &str = "N/A";

/// Attributes of a controller entity that the pipeline reads
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EntityAttributes {
    pub friendly_name: Option<String>,
    pub device_class: Option<String>,
    pub unit_of_measurement: Option<String>,
}

/// One controller entity as returned by the bulk state listing
///
/// Re-fetched on every aggregation call; `area` is attached after the
/// area map has been resolved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawEntityRecord {
    pub entity_id: String,
    pub state: String,
    #[serde(default)]
    pub attributes: EntityAttributes,
    #[serde(default)]
    pub area: Option<String>,
}

impl RawEntityRecord {
    pub fn new(entity_id: impl Into<String>, state: impl Into<String>) -> Self {
        Self {
            entity_id: entity_id.into(),
            state: state.into(),
            attributes: EntityAttributes::default(),
            area: None,
        }
    }

    pub fn with_friendly_name(mut self, name: impl Into<String>) -> Self {
        self.attributes.friendly_name = Some(name.into());
        self
    }

    pub fn with_device_class(mut self, class: impl Into<String>) -> Self {
        self.attributes.device_class = Some(class.into());
        self
    }

    pub fn with_unit(mut self, unit: impl Into<String>) -> Self {
        self.attributes.unit_of_measurement = Some(unit.into());
        self
    }

    pub fn with_area(mut self, area: impl Into<String>) -> Self {
        self.area = Some(area.into());
        self
    }

    /// Domain part of the identifier (`light` for `light.kitchen`)
    pub fn domain(&self) -> &str {
        domain_of(&self.entity_id)
    }

    /// Friendly name, falling back to the identifier
    pub fn display_name(&self) -> &str {
        self.attributes
            .friendly_name
            .as_deref()
            .unwrap_or(&self.entity_id)
    }

    /// Whether the controller reports the entity as unreadable
    pub fn is_unavailable(&self) -> bool {
        UNAVAILABLE_STATES.contains(&self.state.as_str())
    }
}

/// Substring before the first `.`, or the whole id when there is none
pub fn domain_of(entity_id: &str) -> &str {
    entity_id
        .split_once('.')
        .map_or(entity_id, |(domain, _)| domain)
}

/// Compact projection of a [`RawEntityRecord`] handed to the dialogue layer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilteredEntity {
    #[serde(rename = "eid")]
    pub entity_id: String,
    pub name: String,
    pub area: Option<String>,
    pub state: String,
    pub device_class: String,
}

/// Parsed state of one entity in the numeric cache
#[derive(Debug, Clone, PartialEq)]
pub enum StateValue {
    Number(f64),
    Text(String),
}

impl StateValue {
    /// Numeric if the raw state parses as a float, the original string otherwise
    pub fn parse(raw: &str) -> Self {
        raw.trim()
            .parse::<f64>()
            .map_or_else(|_| Self::Text(raw.to_owned()), Self::Number)
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(value) => Some(*value),
            Self::Text(_) => None,
        }
    }
}

/// Numeric cache keyed by entity id, built once per raw-state fetch
pub type StateMap = BTreeMap<String, StateValue>;

/// Value of one key in the live energy snapshot
#[derive(Debug, Clone, PartialEq)]
pub enum SnapshotValue {
    Number(f64),
    Text(String),
    /// The mapped entity was absent from the fetch
    NotAvailable,
}

impl From<&StateValue> for SnapshotValue {
    fn from(value: &StateValue) -> Self {
        match value {
            StateValue::Number(n) => Self::Number(*n),
            StateValue::Text(s) => Self::Text(s.clone()),
        }
    }
}

impl Serialize for SnapshotValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Number(n) => serializer.serialize_f64(*n),
            Self::Text(s) => serializer.serialize_str(s),
            Self::NotAvailable => serializer.serialize_str(NOT_AVAILABLE),
        }
    }
}

/// Semantic key -> live value
pub type EnergySnapshot = BTreeMap<String, SnapshotValue>;

/// Counter name -> per-day consumption, yesterday first; `None` marks a missing day
pub type HistoryDelta = BTreeMap<String, Vec<Option<f64>>>;

/// Everything the dialogue layer gets to see about the house for one request
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SmartHomeContext {
    pub energy_context: EnergySnapshot,
    pub energy_history: HistoryDelta,
    pub controllable_devices: Vec<FilteredEntity>,
    pub sensors: Vec<FilteredEntity>,
}

impl SmartHomeContext {
    /// Context returned whenever the controller cannot be read at all
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.energy_context.is_empty()
            && self.energy_history.is_empty()
            && self.controllable_devices.is_empty()
            && self.sensors.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_state_value_parse() {
        assert_eq!(StateValue::parse("42.5"), StateValue::Number(42.5));
        assert_eq!(StateValue::parse("-3"), StateValue::Number(-3.0));
        assert_eq!(
            StateValue::parse("on"),
            StateValue::Text("on".to_owned())
        );
    }

    #[test]
    fn test_domain_of() {
        assert_eq!(domain_of("binary_sensor.fenster_bad"), "binary_sensor");
        assert_eq!(domain_of("sensor.a.b"), "sensor");
        assert_eq!(domain_of("nodomain"), "nodomain");
    }

    #[test]
    fn test_display_name_falls_back_to_id() {
        let record = RawEntityRecord::new("light.flur", "on");
        assert_eq!(record.display_name(), "light.flur");

        let named = record.with_friendly_name("Flur");
        assert_eq!(named.display_name(), "Flur");
    }

    #[test]
    fn test_empty_context_serialization() {
        let value = serde_json::to_value(SmartHomeContext::empty()).unwrap();
        assert_eq!(
            value,
            json!({
                "energy_context": {},
                "energy_history": {},
                "controllable_devices": [],
                "sensors": []
            })
        );
    }

    #[test]
    fn test_snapshot_value_serialization() {
        let mut snapshot = EnergySnapshot::new();
        snapshot.insert("pv".to_owned(), SnapshotValue::Number(1200.0));
        snapshot.insert("co2_time".to_owned(), SnapshotValue::Text("14:00".to_owned()));
        snapshot.insert("wallbox".to_owned(), SnapshotValue::NotAvailable);

        let value = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(
            value,
            json!({"pv": 1200.0, "co2_time": "14:00", "wallbox": "N/A"})
        );
    }
}
