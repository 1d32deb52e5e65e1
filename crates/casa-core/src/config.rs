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
use std::collections::BTreeMap;

const SHARED_BLOCKLIST: &[&str] = &[
    "Internet Access",
    "Update",
    "Firmware",
    "Status",
    "ChildLock",
    "Reboot",
    "Identifizieren",
    "Scene",
    "Schedule",
    "quality",
    "rssi",
    "overheat",
    "overpower",
];

/// Everything that shapes one smart-home context
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextConfig {
    /// Semantic key -> entity id for the live energy snapshot
    #[serde(default = "default_energy_mapping")]
    pub energy_mapping: BTreeMap<String, String>,

    /// Counter name -> cumulative counter entity id for the 7-day history
    #[serde(default = "default_history_mapping")]
    pub history_mapping: BTreeMap<String, String>,

    /// Switchable entities (lights, covers, ...)
    #[serde(default = "EntityFilterConfig::controllable_devices")]
    pub devices: EntityFilterConfig,

    /// Read-only entities
    #[serde(default = "EntityFilterConfig::sensors")]
    pub sensors: EntityFilterConfig,

    #[serde(default)]
    pub leave_home: LeaveHomeConfig,
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            energy_mapping: default_energy_mapping(),
            history_mapping: default_history_mapping(),
            devices: EntityFilterConfig::controllable_devices(),
            sensors: EntityFilterConfig::sensors(),
            leave_home: LeaveHomeConfig::default(),
        }
    }
}

/// Domain allow-list and name blocklist for one entity set
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityFilterConfig {
    pub domains: Vec<String>,
    /// Case-sensitive substrings of the display name
    #[serde(default)]
    pub blocklist: Vec<String>,
}

impl EntityFilterConfig {
    pub fn new<D, B>(domains: D, blocklist: B) -> Self
    where
        D: IntoIterator,
        D::Item: Into<String>,
        B: IntoIterator,
        B::Item: Into<String>,
    {
        Self {
            domains: domains.into_iter().map(Into::into).collect(),
            blocklist: blocklist.into_iter().map(Into::into).collect(),
        }
    }

    pub fn controllable_devices() -> Self {
        let mut blocklist: Vec<&str> = SHARED_BLOCKLIST.to_vec();
        // Switch entities named "... sensor" are diagnostics, not devices
        blocklist.insert(4, "sensor");
        Self::new(["light", "cover", "climate", "switch", "vacuum"], blocklist)
    }

    pub fn sensors() -> Self {
        Self::new(["sensor", "binary_sensor"], SHARED_BLOCKLIST.iter().copied())
    }
}

/// Thresholds for the "leaving the house" summary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeaveHomeConfig {
    /// Power sensors above this value (W) are reported
    #[serde(default = "default_high_power_threshold_w")]
    pub high_power_threshold_w: f64,

    /// Areas whose consumers are expected to run unattended
    #[serde(default = "default_excluded_areas")]
    pub excluded_areas: Vec<String>,
}

impl Default for LeaveHomeConfig {
    fn default() -> Self {
        Self {
            high_power_threshold_w: default_high_power_threshold_w(),
            excluded_areas: default_excluded_areas(),
        }
    }
}

fn default_high_power_threshold_w() -> f64 {
    500.0
}

fn default_excluded_areas() -> Vec<String> {
    vec!["Wärmepumpe".to_owned()]
}

fn mapping(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
    pairs
        .iter()
        .map(|(key, entity)| ((*key).to_owned(), (*entity).to_owned()))
        .collect()
}

fn default_energy_mapping() -> BTreeMap<String, String> {
    mapping(&[
        ("netz_saldo_watt", "sensor.senec_grid_state_power"),
        ("pv_aktuell_watt", "sensor.senec_solar_generated_power"),
        ("pv_rest_prognose_kwh", "sensor.solar_energy_remaining_today"),
        ("batterie_haus_prozent", "sensor.senec_battery_charge_percent"),
        ("batterie_auto_prozent", "sensor.mgzsev_soc"),
        (
            "aktuelle-co2-prozent",
            "sensor.electricity_maps_anteil_fossiler_brennstoffe_im_netz",
        ),
        ("niedrigste-co2-prozent", "sensor.strom_prognose_analyse"),
        (
            "niedrigste-co2-uhrzeit",
            "sensor.strom_prognose_analyse_timestamp",
        ),
        ("waschkueche_power", "sensor.shelly_waschkueche_switch_0_power"),
        ("haus_power", "sensor.senec_house_power"),
    ])
}

fn default_history_mapping() -> BTreeMap<String, String> {
    mapping(&[
        ("Wallbox", "sensor.senec_webapi_v3_wallbox_consumption_total"),
        ("Akku_Geladen", "sensor.senec_webapi_v3_accuexport_total"),
        ("Akku_Entladen", "sensor.senec_webapi_v3_accuimport_total"),
        (
            "PV_Erzeugung_Gesamt",
            "sensor.senec_webapi_v3_powergenerated_total",
        ),
        ("Waschkueche_Gesamt", "sensor.shelly_waschkueche_switch_0_energy"),
        (
            "Waermepumpe_Gesamt",
            "sensor.shelly_ac_em1_total_active_energy",
        ),
        (
            "Hausverbrauch_Gesamt",
            "sensor.senec_webapi_v3_consumption_total",
        ),
    ])
}
