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

use crate::config::{DEFAULT_TIMEOUT_SECS, HaConfig};
use crate::errors::{HaError, HaResult};
use crate::types::{HaEntityState, HaHistoryState};
use chrono::{DateTime, SecondsFormat, Utc};
use reqwest::{Client, Response, StatusCode};
use serde_json::{Value, json};
use std::collections::HashMap;
use std::fmt;
use std::time::Duration;
use tracing::{debug, error, info, trace, warn};

/// Renders `{entity_id: area_name}` for every state assigned to an area
pub const AREA_TEMPLATE: &str = "{% set ns = namespace(items=[]) %}\
{% for s in states %}{% set area = area_name(s.entity_id) %}\
{% if area %}{% set ns.items = ns.items + [(s.entity_id, area)] %}{% endif %}\
{% endfor %}{{ dict(ns.items) | to_json }}";

/// Home Assistant REST API client
#[derive(Clone)]
pub struct HomeAssistantClient {
    base_url: String,
    token: String,
    client: Client,
}

impl fmt::Debug for HomeAssistantClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HomeAssistantClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl HomeAssistantClient {
    /// Create a new HA client with the default request timeout
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> HaResult<Self> {
        Self::with_timeout(base_url, token, Duration::from_secs(DEFAULT_TIMEOUT_SECS))
    }

    /// Create a new HA client; `timeout` bounds every single request
    pub fn with_timeout(
        base_url: impl Into<String>,
        token: impl Into<String>,
        timeout: Duration,
    ) -> HaResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| HaError::ConfigError(format!("Failed to build HTTP client: {e}")))?;

        let base_url: String = base_url.into();
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_owned(),
            token: token.into(),
            client,
        })
    }

    /// Create HA client from configuration values
    pub fn from_config(config: &HaConfig) -> HaResult<Self> {
        let base_url = config
            .base_url
            .clone()
            .ok_or_else(|| HaError::ConfigError("HA base URL not configured".to_owned()))?;
        let token = config.token.clone().ok_or_else(|| {
            HaError::ConfigError(
                "HA token not found in config or HA_TOKEN environment variable".to_owned(),
            )
        })?;

        info!("Initializing HA client from configuration: {}", base_url);
        Self::with_timeout(base_url, token, config.timeout())
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Get all states
    pub async fn get_all_states(&self) -> HaResult<Vec<HaEntityState>> {
        let url = format!("{}/api/states", self.base_url);
        debug!("🔍 [HA QUERY] Fetching all entity states");

        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.token)
            .send()
            .await?;
        let response = check_status(response, "states").await?;
        let states = response.json::<Vec<HaEntityState>>().await?;

        debug!("✅ [HA RESULT] {} entity states", states.len());
        Ok(states)
    }

    /// Render a Jinja template on the HA side
    pub async fn render_template(&self, template: &str) -> HaResult<String> {
        let url = format!("{}/api/template", self.base_url);
        let body = json!({ "template": template });
        debug!("🔍 [HA TEMPLATE] Rendering template ({} chars)", template.len());
        trace!("   Template: {}", template);

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.token)
            .json(&body)
            .send()
            .await?;
        let response = check_status(response, "template").await?;

        Ok(response.text().await?)
    }

    /// Entity id -> area name for every entity assigned to an area
    pub async fn get_areas(&self) -> HaResult<HashMap<String, String>> {
        let rendered = self.render_template(AREA_TEMPLATE).await?;
        let areas: HashMap<String, String> = serde_json::from_str(rendered.trim())
            .map_err(|e| HaError::InvalidResponse(format!("Area template output: {e}")))?;

        debug!("✅ [HA TEMPLATE] Resolved areas for {} entities", areas.len());
        Ok(areas)
    }

    /// Numeric state of an entity at a past instant
    ///
    /// Queries a one-second history window starting at `at` and reads the
    /// first returned state. `Ok(None)` when HA has no data for the window or
    /// the state is not a number.
    pub async fn get_state_at(&self, entity_id: &str, at: DateTime<Utc>) -> HaResult<Option<f64>> {
        let start_str = at.to_rfc3339_opts(SecondsFormat::Secs, true);
        let end_str = (at + chrono::Duration::seconds(1)).to_rfc3339_opts(SecondsFormat::Secs, true);

        let url = format!(
            "{}/api/history/period/{}?filter_entity_id={}&end_time={}&minimal_response",
            self.base_url,
            start_str,
            urlencoding::encode(entity_id),
            urlencoding::encode(&end_str)
        );

        debug!("📊 [HA HISTORY] {} at {}", entity_id, start_str);
        trace!("   URL: {}", url);

        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.token)
            .send()
            .await?;
        let response = check_status(response, "history").await?;

        // HA returns an array of arrays, one inner array per entity
        let history: Vec<Vec<HaHistoryState>> = response.json().await?;
        let Some(first) = history.first().and_then(|points| points.first()) else {
            debug!("⚠️ [HA HISTORY] No history data for {} at {}", entity_id, start_str);
            return Ok(None);
        };

        match first.state.trim().parse::<f64>() {
            Ok(value) => {
                trace!("   {} = {}", entity_id, value);
                Ok(Some(value))
            }
            Err(_) => {
                debug!(
                    "⚠️ [HA HISTORY] Non-numeric state '{}' for {}",
                    first.state, entity_id
                );
                Ok(None)
            }
        }
    }

    /// Call a Home Assistant service
    ///
    /// # Arguments
    /// * `service` - Service name in format "domain.service" (e.g., "light.turn_off")
    /// * `data` - JSON data to send with the service call
    pub async fn call_service(&self, service: &str, data: Value) -> HaResult<()> {
        let Some((domain, name)) = service.split_once('.').filter(|(d, n)| {
            !d.is_empty() && !n.is_empty() && !n.contains('.')
        }) else {
            error!("❌ [HA ERROR] Invalid service format: {}", service);
            return Err(HaError::ServiceCallFailed {
                service: service.to_owned(),
                reason: "Invalid service format, expected 'domain.service'".to_owned(),
            });
        };

        let url = format!("{}/api/services/{}/{}", self.base_url, domain, name);
        info!("📞 [HA SERVICE] Calling: {} {}", service, data);
        debug!("   URL: {}", url);

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.token)
            .json(&data)
            .send()
            .await?;

        let status = response.status();
        match status {
            StatusCode::OK => {
                info!("✅ [HA SERVICE] Success: {}", service);
                Ok(())
            }
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                error!("❌ [HA SERVICE] Authentication failed for: {}", service);
                Err(HaError::AuthenticationFailed)
            }
            _status => {
                let error_msg = response.text().await.unwrap_or_default();
                error!("❌ [HA SERVICE] Failed: {} (status: {})", service, status);
                error!("   Error: {}", error_msg);
                Err(HaError::ServiceCallFailed {
                    service: service.to_owned(),
                    reason: format!("status {status}: {error_msg}"),
                })
            }
        }
    }
}

/// Map non-200 answers to [`HaError`]
async fn check_status(response: Response, what: &str) -> HaResult<Response> {
    match response.status() {
        StatusCode::OK => Ok(response),
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            error!("❌ [HA ERROR] Authentication failed for {} request", what);
            Err(HaError::AuthenticationFailed)
        }
        status => {
            let error_text = response.text().await.unwrap_or_default();
            warn!("❌ [HA ERROR] {} request: status {}: {}", what, status, error_text);
            Err(HaError::ApiError {
                status: status.as_u16(),
                message: error_text,
            })
        }
    }
}
