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

//! Per-day consumption reconstructed from cumulative lifetime counters.
//!
//! The controller only exposes running totals, so each day's consumption is
//! the difference between two historical readings taken one day apart.

use chrono::{DateTime, Duration, Utc};
use futures::future::join_all;
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

use crate::traits::HomeController;
use crate::types::{HistoryDelta, StateMap};

/// Number of past days looked up per counter
pub const HISTORY_DAYS: i64 = 7;

/// Walk the readings from yesterday backwards and subtract consecutive values.
///
/// `past[0]` is the reading one day ago, `past[1]` two days ago, and so on.
/// Negative differences (counter replaced or reset) clamp to zero. A missing
/// reading yields `None` for its own day and for the next one, since the next
/// day has no reference; the chain resumes at the first present pair after.
pub fn chain_deltas(current: f64, past: &[Option<f64>]) -> Vec<Option<f64>> {
    let mut last = Some(current);
    past.iter()
        .map(|&reading| {
            let delta = match (last, reading) {
                (Some(newer), Some(older)) => Some(round2((newer - older).max(0.0))),
                _ => None,
            };
            last = reading;
            delta
        })
        .collect()
}

/// Two decimals, ties to even
fn round2(value: f64) -> f64 {
    (value * 100.0).round_ties_even() / 100.0
}

struct Lookup<'a> {
    counter: &'a str,
    entity_id: &'a str,
    day: i64,
}

/// Fetch the readings of every counter for the last [`HISTORY_DAYS`] days as
/// one concurrent batch and derive the deltas.
///
/// Counters whose current value is not numeric get an empty sequence and no
/// lookups. A failed lookup only blanks its own cell.
pub async fn fetch_history_deltas(
    controller: &dyn HomeController,
    mapping: &BTreeMap<String, String>,
    states: &StateMap,
    now: DateTime<Utc>,
) -> HistoryDelta {
    let mut deltas = HistoryDelta::new();
    let mut baselines = BTreeMap::new();
    let mut lookups = Vec::new();

    for (counter, entity_id) in mapping {
        match states.get(entity_id).and_then(|value| value.as_number()) {
            Some(current) => {
                baselines.insert(counter.as_str(), current);
                lookups.extend((1..=HISTORY_DAYS).map(|day| Lookup {
                    counter,
                    entity_id,
                    day,
                }));
            }
            None => {
                debug!(
                    "[HISTORY] {} ({}) has no numeric current value, skipping",
                    counter, entity_id
                );
                deltas.insert(counter.clone(), Vec::new());
            }
        }
    }

    if lookups.is_empty() {
        return deltas;
    }

    debug!("[HISTORY] Issuing {} point-in-time lookups", lookups.len());

    let results = join_all(lookups.iter().map(|lookup| async move {
        let at = now - Duration::days(lookup.day);
        match controller.fetch_value_at(lookup.entity_id, at).await {
            Ok(value) => value,
            Err(e) => {
                warn!(
                    "[HISTORY] Lookup of {} at day -{} failed: {:#}",
                    lookup.entity_id, lookup.day, e
                );
                None
            }
        }
    }))
    .await;

    let mut readings: BTreeMap<&str, Vec<(i64, Option<f64>)>> = BTreeMap::new();
    for (lookup, value) in lookups.iter().zip(results) {
        readings
            .entry(lookup.counter)
            .or_default()
            .push((lookup.day, value));
    }

    for (counter, mut points) in readings {
        points.sort_by_key(|(day, _)| *day);
        let past: Vec<Option<f64>> = points.into_iter().map(|(_, value)| value).collect();
        let current = baselines.get(counter).copied().unwrap_or_default();
        deltas.insert(counter.to_owned(), chain_deltas(current, &past));
    }

    let missing = deltas.values().flatten().filter(|cell| cell.is_none()).count();
    info!(
        "[HISTORY] Built deltas for {} counters ({} missing cells)",
        deltas.len(),
        missing
    );

    deltas
}
