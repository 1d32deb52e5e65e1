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

use chrono::Utc;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use crate::config::ContextConfig;
use crate::energy::{build_energy_snapshot, build_state_map};
use crate::filter::filter_with;
use crate::history::fetch_history_deltas;
use crate::traits::HomeController;
use crate::types::SmartHomeContext;

/// Builds a fresh [`SmartHomeContext`] per request from one controller
///
/// Holds no state between calls; every call re-fetches everything.
#[derive(Clone)]
pub struct ContextAggregator {
    controller: Arc<dyn HomeController>,
    config: ContextConfig,
}

impl fmt::Debug for ContextAggregator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContextAggregator")
            .field("controller", &self.controller.name())
            .field("config", &self.config)
            .finish()
    }
}

impl ContextAggregator {
    pub fn new(controller: Arc<dyn HomeController>, config: ContextConfig) -> Self {
        Self { controller, config }
    }

    pub fn config(&self) -> &ContextConfig {
        &self.config
    }

    /// Snapshot of devices, sensors, live energy values and 7-day counter deltas.
    ///
    /// Never fails: an unconfigured or unreachable controller yields the empty
    /// context, a failed area lookup yields entities without areas.
    pub async fn get_smart_home_context(&self) -> SmartHomeContext {
        if !self.controller.is_configured() {
            warn!("[CONTEXT] Controller not configured, returning empty context");
            return SmartHomeContext::empty();
        }

        debug!(
            "[CONTEXT] Fetching states and areas from {}",
            self.controller.name()
        );
        let (states, areas) = tokio::join!(
            self.controller.fetch_states(),
            self.controller.fetch_areas()
        );

        let mut records = match states {
            Ok(records) => records,
            Err(e) => {
                error!("[CONTEXT] Failed to fetch states: {:#}", e);
                return SmartHomeContext::empty();
            }
        };

        let areas = areas.unwrap_or_else(|e| {
            warn!("[CONTEXT] Area lookup failed, continuing without areas: {:#}", e);
            Default::default()
        });

        for record in &mut records {
            record.area = areas.get(&record.entity_id).cloned();
        }

        let state_map = build_state_map(&records);
        let controllable_devices = filter_with(&records, &self.config.devices);
        let sensors = filter_with(&records, &self.config.sensors);
        let energy_context = build_energy_snapshot(&self.config.energy_mapping, &state_map);
        let energy_history = fetch_history_deltas(
            self.controller.as_ref(),
            &self.config.history_mapping,
            &state_map,
            Utc::now(),
        )
        .await;

        info!(
            "[CONTEXT] {} entities -> {} devices, {} sensors, {} energy keys, {} counters",
            records.len(),
            controllable_devices.len(),
            sensors.len(),
            energy_context.len(),
            energy_history.len()
        );

        SmartHomeContext {
            energy_context,
            energy_history,
            controllable_devices,
            sensors,
        }
    }

    /// Invoke `domain.action` on one entity, true iff the controller accepted it
    pub async fn execute_action(&self, domain: &str, action: &str, entity_id: &str) -> bool {
        if !self.controller.is_configured() {
            warn!(
                "[ACTION] Controller not configured, dropping {}.{} -> {}",
                domain, action, entity_id
            );
            return false;
        }

        info!("[ACTION] {}.{} -> {}", domain, action, entity_id);
        match self.controller.call_action(domain, action, entity_id).await {
            Ok(()) => true,
            Err(e) => {
                warn!(
                    "[ACTION] {}.{} -> {} failed: {:#}",
                    domain, action, entity_id, e
                );
                false
            }
        }
    }
}
