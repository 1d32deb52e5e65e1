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

//! In-memory [`HomeController`] used by the unit tests of this crate.

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::Barrier;

use crate::traits::HomeController;
use crate::types::RawEntityRecord;

#[derive(Debug, Clone)]
enum Series {
    /// Reading `n` days ago is `values[n - 1]`
    Daily(Vec<Option<f64>>),
    Constant(f64),
}

#[derive(Debug, Default)]
pub struct FakeController {
    configured: bool,
    states: Vec<RawEntityRecord>,
    areas: HashMap<String, String>,
    history: HashMap<String, Series>,
    history_anchor: Option<DateTime<Utc>>,
    failing_lookups: HashSet<(String, i64)>,
    failing_actions: HashSet<String>,
    states_fail: bool,
    areas_fail: bool,
    /// States and areas must both be in flight before either returns
    fetch_rendezvous: Option<Arc<Barrier>>,
    /// Every value lookup waits until this many are in flight
    lookup_barrier: Option<Arc<Barrier>>,
    state_fetches: AtomicUsize,
    area_fetches: AtomicUsize,
    value_lookups: AtomicUsize,
    actions: Mutex<Vec<(String, String, String)>>,
}

impl FakeController {
    pub fn configured() -> Self {
        Self {
            configured: true,
            ..Self::default()
        }
    }

    pub fn unconfigured() -> Self {
        Self::default()
    }

    pub fn with_states(mut self, states: Vec<RawEntityRecord>) -> Self {
        self.states = states;
        self
    }

    pub fn with_area(mut self, entity_id: &str, area: &str) -> Self {
        self.areas.insert(entity_id.to_owned(), area.to_owned());
        self
    }

    pub fn with_history_anchor(mut self, anchor: DateTime<Utc>) -> Self {
        self.history_anchor = Some(anchor);
        self
    }

    pub fn with_history(mut self, entity_id: &str, values: Vec<Option<f64>>) -> Self {
        self.history.insert(entity_id.to_owned(), Series::Daily(values));
        self
    }

    pub fn with_constant_history(mut self, entity_id: &str, value: f64) -> Self {
        self.history.insert(entity_id.to_owned(), Series::Constant(value));
        self
    }

    pub fn with_failing_lookup(mut self, entity_id: &str, day: i64) -> Self {
        self.failing_lookups.insert((entity_id.to_owned(), day));
        self
    }

    pub fn with_failing_action(mut self, entity_id: &str) -> Self {
        self.failing_actions.insert(entity_id.to_owned());
        self
    }

    pub fn with_failing_states(mut self) -> Self {
        self.states_fail = true;
        self
    }

    pub fn with_failing_areas(mut self) -> Self {
        self.areas_fail = true;
        self
    }

    pub fn with_fetch_rendezvous(mut self) -> Self {
        self.fetch_rendezvous = Some(Arc::new(Barrier::new(2)));
        self
    }

    pub fn with_lookup_barrier(mut self, in_flight: usize) -> Self {
        self.lookup_barrier = Some(Arc::new(Barrier::new(in_flight)));
        self
    }

    pub fn value_lookups(&self) -> usize {
        self.value_lookups.load(Ordering::SeqCst)
    }

    pub fn actions(&self) -> Vec<(String, String, String)> {
        self.actions.lock().clone()
    }

    pub fn total_calls(&self) -> usize {
        self.state_fetches.load(Ordering::SeqCst)
            + self.area_fetches.load(Ordering::SeqCst)
            + self.value_lookups()
            + self.actions.lock().len()
    }
}

#[async_trait]
impl HomeController for FakeController {
    fn is_configured(&self) -> bool {
        self.configured
    }

    async fn fetch_states(&self) -> Result<Vec<RawEntityRecord>> {
        self.state_fetches.fetch_add(1, Ordering::SeqCst);
        if let Some(rendezvous) = &self.fetch_rendezvous {
            rendezvous.wait().await;
        }
        if self.states_fail {
            return Err(anyhow!("connection refused"));
        }
        Ok(self.states.clone())
    }

    async fn fetch_areas(&self) -> Result<HashMap<String, String>> {
        self.area_fetches.fetch_add(1, Ordering::SeqCst);
        if let Some(rendezvous) = &self.fetch_rendezvous {
            rendezvous.wait().await;
        }
        if self.areas_fail {
            return Err(anyhow!("template rendering failed"));
        }
        Ok(self.areas.clone())
    }

    async fn fetch_value_at(&self, entity_id: &str, at: DateTime<Utc>) -> Result<Option<f64>> {
        self.value_lookups.fetch_add(1, Ordering::SeqCst);
        if let Some(barrier) = &self.lookup_barrier {
            barrier.wait().await;
        }
        let day = self
            .history_anchor
            .map_or(1, |anchor| (anchor - at).num_days());
        if self.failing_lookups.contains(&(entity_id.to_owned(), day)) {
            return Err(anyhow!("timeout"));
        }
        let value = match self.history.get(entity_id) {
            Some(Series::Constant(value)) => Some(*value),
            Some(Series::Daily(values)) => usize::try_from(day - 1)
                .ok()
                .and_then(|index| values.get(index).copied().flatten()),
            None => None,
        };
        Ok(value)
    }

    async fn call_action(&self, domain: &str, action: &str, entity_id: &str) -> Result<()> {
        self.actions
            .lock()
            .push((domain.to_owned(), action.to_owned(), entity_id.to_owned()));
        if self.failing_actions.contains(entity_id) {
            return Err(anyhow!("status 500"));
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "Fake"
    }
}
