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

use crate::config::EntityFilterConfig;
use crate::types::{FilteredEntity, RawEntityRecord};

/// Select the records of the allowed domains whose name is not blocked and
/// whose state is readable, keeping the controller's listing order.
pub fn filter_entities<D, B>(
    records: &[RawEntityRecord],
    allowed_domains: &[D],
    blocklist: &[B],
) -> Vec<FilteredEntity>
where
    D: AsRef<str>,
    B: AsRef<str>,
{
    records
        .iter()
        .filter(|record| {
            let domain = record.domain();
            allowed_domains.iter().any(|d| d.as_ref() == domain)
        })
        .filter(|record| {
            let name = record.display_name();
            !blocklist.iter().any(|blocked| name.contains(blocked.as_ref()))
        })
        .filter(|record| !record.is_unavailable())
        .map(project)
        .collect()
}

/// [`filter_entities`] with the lists of one entity set
pub fn filter_with(records: &[RawEntityRecord], config: &EntityFilterConfig) -> Vec<FilteredEntity> {
    filter_entities(records, config.domains.as_slice(), config.blocklist.as_slice())
}

fn project(record: &RawEntityRecord) -> FilteredEntity {
    FilteredEntity {
        entity_id: record.entity_id.clone(),
        name: record.display_name().to_owned(),
        area: record.area.clone(),
        state: record.state.clone(),
        device_class: record
            .attributes
            .device_class
            .clone()
            .unwrap_or_else(|| record.entity_id.clone()),
    }
}
