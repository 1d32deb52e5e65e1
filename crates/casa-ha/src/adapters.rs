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

use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use casa_core::{HomeController, RawEntityRecord};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::client::HomeAssistantClient;
use crate::config::HaConfig;
use crate::errors::HaResult;

/// Home Assistant adapter implementing HomeController
///
/// Without a base URL or token the adapter is unconfigured: it reports so
/// through [`HomeController::is_configured`] and never touches the network.
#[derive(Debug, Clone)]
pub struct HomeAssistantController {
    client: Option<Arc<HomeAssistantClient>>,
}

impl HomeAssistantController {
    pub fn new(client: Arc<HomeAssistantClient>) -> Self {
        Self {
            client: Some(client),
        }
    }

    pub fn unconfigured() -> Self {
        Self { client: None }
    }

    /// Build from configuration; incomplete configuration is not an error
    pub fn from_config(config: &HaConfig) -> HaResult<Self> {
        if !config.is_complete() {
            warn!("⚠️ HA base URL or token missing, controller stays unconfigured");
            return Ok(Self::unconfigured());
        }
        let client = HomeAssistantClient::from_config(config)?;
        Ok(Self::new(Arc::new(client)))
    }

    fn require_client(&self) -> Result<&HomeAssistantClient> {
        self.client
            .as_deref()
            .ok_or_else(|| anyhow!("Home Assistant connection not configured"))
    }
}

#[async_trait]
impl HomeController for HomeAssistantController {
    fn is_configured(&self) -> bool {
        self.client.is_some()
    }

    async fn fetch_states(&self) -> Result<Vec<RawEntityRecord>> {
        let states = self
            .require_client()?
            .get_all_states()
            .await
            .context("Failed to fetch entity states")?;

        info!("✅ [ADAPTER] Fetched {} entity states", states.len());
        Ok(states.into_iter().map(RawEntityRecord::from).collect())
    }

    async fn fetch_areas(&self) -> Result<HashMap<String, String>> {
        self.require_client()?
            .get_areas()
            .await
            .context("Failed to resolve entity areas")
    }

    async fn fetch_value_at(&self, entity_id: &str, at: DateTime<Utc>) -> Result<Option<f64>> {
        self.require_client()?
            .get_state_at(entity_id, at)
            .await
            .with_context(|| format!("Failed to read history of {entity_id} at {at}"))
    }

    async fn call_action(&self, domain: &str, action: &str, entity_id: &str) -> Result<()> {
        let service = format!("{domain}.{action}");
        debug!("🎯 [ADAPTER] {} -> {}", service, entity_id);

        self.require_client()?
            .call_service(&service, serde_json::json!({ "entity_id": entity_id }))
            .await
            .with_context(|| format!("Failed to call {service} for {entity_id}"))
    }

    fn name(&self) -> &str {
        "HomeAssistant"
    }
}
