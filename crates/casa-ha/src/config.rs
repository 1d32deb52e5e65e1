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
use std::fmt;
use std::time::Duration;

/// Per-request timeout applied to every call to Home Assistant
pub const DEFAULT_TIMEOUT_SECS: u64 = 5;

/// Configuration for Home Assistant API access
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HaConfig {
    /// Base URL of Home Assistant, e.g. http://homeassistant.local:8123
    #[serde(default)]
    pub base_url: Option<String>,
    /// Long-lived access token
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

impl Default for HaConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            token: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl fmt::Debug for HaConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HaConfig")
            .field("base_url", &self.base_url)
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl HaConfig {
    /// Both the address and the credential are present
    pub fn is_complete(&self) -> bool {
        self.base_url.is_some() && self.token.is_some()
    }

    /// A zero timeout would fail every request; it falls back to the default
    pub fn timeout(&self) -> Duration {
        match self.timeout_secs {
            0 => Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            secs => Duration::from_secs(secs),
        }
    }

    /// Override from `HA_URL`/`HA_BASE_URL`, `HA_TOKEN` and `HA_TIMEOUT_SECS`
    pub fn apply_env(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Same as [`Self::apply_env`] with an arbitrary variable source.
    /// Blank values count as unset; blank config values are cleared too.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let non_blank = |value: Option<String>| {
            value
                .map(|v| v.trim().to_owned())
                .filter(|v| !v.is_empty())
        };

        if let Some(url) = non_blank(lookup("HA_URL")).or_else(|| non_blank(lookup("HA_BASE_URL")))
        {
            self.base_url = Some(url);
        }
        if let Some(token) = non_blank(lookup("HA_TOKEN")) {
            self.token = Some(token);
        }
        if let Some(secs) = non_blank(lookup("HA_TIMEOUT_SECS"))
            && let Ok(n) = secs.parse::<u64>()
            && n > 0
        {
            self.timeout_secs = n;
        }

        self.base_url = non_blank(self.base_url.take());
        self.token = non_blank(self.token.take());
    }
}
