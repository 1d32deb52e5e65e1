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

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;

use crate::types::RawEntityRecord;

/// Upstream home-automation controller as seen by the aggregation pipeline
///
/// Implementations translate the controller's wire format into
/// [`RawEntityRecord`]s at the boundary. Every method is a single network
/// operation; callers decide how a failure degrades.
#[async_trait]
pub trait HomeController: Send + Sync {
    /// False when the base address or the credential is missing.
    /// Callers must not issue any other call in that case.
    fn is_configured(&self) -> bool;

    /// Bulk listing of every entity with its current state
    async fn fetch_states(&self) -> Result<Vec<RawEntityRecord>>;

    /// Entity id -> area label for every entity assigned to an area
    async fn fetch_areas(&self) -> Result<HashMap<String, String>>;

    /// Numeric value of an entity at `at`, `None` when the controller has no data
    async fn fetch_value_at(&self, entity_id: &str, at: DateTime<Utc>) -> Result<Option<f64>>;

    /// Invoke `domain.action` on one entity. Fire-and-forget, no retry.
    async fn call_action(&self, domain: &str, action: &str, entity_id: &str) -> Result<()>;

    /// Get the controller name (for logging)
    fn name(&self) -> &str;
}
