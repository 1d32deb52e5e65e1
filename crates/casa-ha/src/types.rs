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

use casa_core::{EntityAttributes, RawEntityRecord};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Entity as returned by `GET /api/states`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HaEntityState {
    pub entity_id: String,
    pub state: String,
    #[serde(default)]
    pub attributes: Value,
    #[serde(default)]
    pub last_changed: Option<String>,
    #[serde(default)]
    pub last_updated: Option<String>,
}

impl HaEntityState {
    fn attribute(&self, key: &str) -> Option<String> {
        match self.attributes.get(key)? {
            Value::Null => None,
            Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }
}

impl From<HaEntityState> for RawEntityRecord {
    fn from(state: HaEntityState) -> Self {
        let attributes = EntityAttributes {
            friendly_name: state.attribute("friendly_name"),
            device_class: state.attribute("device_class"),
            unit_of_measurement: state.attribute("unit_of_measurement"),
        };
        Self {
            entity_id: state.entity_id,
            state: state.state,
            attributes,
            area: None,
        }
    }
}

/// Historical state point from HA history API
///
/// With `minimal_response` only the first point of each entity carries
/// `entity_id`, so everything but `state` is optional.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HaHistoryState {
    #[serde(default)]
    pub entity_id: Option<String>,
    pub state: String,
    #[serde(default)]
    pub last_changed: Option<String>,
}
