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

use std::collections::BTreeMap;
use tracing::debug;

use crate::types::{EnergySnapshot, RawEntityRecord, SnapshotValue, StateMap, StateValue};

/// Parse every record's state once; the snapshot and the history baseline
/// both read from this cache so they see the same point in time.
pub fn build_state_map(records: &[RawEntityRecord]) -> StateMap {
    records
        .iter()
        .map(|record| (record.entity_id.clone(), StateValue::parse(&record.state)))
        .collect()
}

/// One value per configured key; never fails.
pub fn build_energy_snapshot(
    mapping: &BTreeMap<String, String>,
    states: &StateMap,
) -> EnergySnapshot {
    mapping
        .iter()
        .map(|(key, entity_id)| {
            let value = states
                .get(entity_id)
                .map_or(SnapshotValue::NotAvailable, SnapshotValue::from);
            if value == SnapshotValue::NotAvailable {
                debug!("[ENERGY] {} -> {} not in live states", key, entity_id);
            }
            (key.clone(), value)
        })
        .collect()
}
