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

use serde::{Deserialize, Serialize};

use crate::config::LeaveHomeConfig;
use crate::types::{FilteredEntity, SmartHomeContext};

const OPENING_CLASSES: &[&str] = &["window", "door"];
const CLOSED_STATES: &[&str] = &["off", "closed"];

/// Minimal view of one entity worth mentioning before leaving
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityStatus {
    #[serde(rename = "eid")]
    pub entity_id: String,
    pub area: Option<String>,
    pub state: String,
}

impl From<&FilteredEntity> for EntityStatus {
    fn from(entity: &FilteredEntity) -> Self {
        Self {
            entity_id: entity.entity_id.clone(),
            area: entity.area.clone(),
            state: entity.state.clone(),
        }
    }
}

/// What is still on or open in the house
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaveHomeSummary {
    pub active_lights: Vec<EntityStatus>,
    pub open_openings: Vec<EntityStatus>,
    pub high_consumers: Vec<EntityStatus>,
}

impl LeaveHomeSummary {
    pub fn from_context(context: &SmartHomeContext, config: &LeaveHomeConfig) -> Self {
        let active_lights = context
            .controllable_devices
            .iter()
            .filter(|d| d.device_class.starts_with("light") && d.state != "off")
            .map(EntityStatus::from)
            .collect();

        let open_openings = context
            .sensors
            .iter()
            .filter(|s| s.area.is_some())
            .filter(|s| OPENING_CLASSES.contains(&s.device_class.as_str()))
            .filter(|s| !CLOSED_STATES.contains(&s.state.as_str()))
            .map(EntityStatus::from)
            .collect();

        let high_consumers = context
            .sensors
            .iter()
            .filter(|s| {
                s.area
                    .as_ref()
                    .is_some_and(|area| !config.excluded_areas.contains(area))
            })
            .filter(|s| s.device_class == "power")
            .filter(|s| power_w(&s.state) > config.high_power_threshold_w)
            .map(EntityStatus::from)
            .collect();

        Self {
            active_lights,
            open_openings,
            high_consumers,
        }
    }

    pub fn light_ids(&self) -> Vec<String> {
        self.active_lights
            .iter()
            .map(|light| light.entity_id.clone())
            .collect()
    }

    pub fn is_all_clear(&self) -> bool {
        self.active_lights.is_empty()
            && self.open_openings.is_empty()
            && self.high_consumers.is_empty()
    }
}

/// Unreadable power states count as idle
fn power_w(state: &str) -> f64 {
    state.trim().parse().unwrap_or(0.0)
}
