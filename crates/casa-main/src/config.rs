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

use anyhow::{Context, Result, bail};
use casa_core::ContextConfig;
use casa_ha::HaConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{info, warn};

/// Config file looked up in the working directory when no path is given
pub const DEFAULT_CONFIG_FILE: &str = "casa.toml";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Home Assistant connection
    #[serde(default)]
    pub controller: HaConfig,

    /// Entity mappings, filters and leave-home thresholds
    #[serde(default)]
    pub context: ContextConfig,
}

impl AppConfig {
    /// Load configuration and apply environment overrides.
    ///
    /// An explicit path must exist; the default `casa.toml` may be absent,
    /// in which case every value is defaulted.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => {
                if !path.exists() {
                    bail!("Config file {} does not exist", path.display());
                }
                Self::from_file(path)?
            }
            None => {
                let default_path = Path::new(DEFAULT_CONFIG_FILE);
                if default_path.exists() {
                    Self::from_file(default_path)?
                } else {
                    warn!(
                        "No {} found, using defaults with environment overrides",
                        DEFAULT_CONFIG_FILE
                    );
                    Self::default()
                }
            }
        };

        config.controller.apply_env();
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let config: AppConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        info!("✅ Loaded configuration from {}", path.display());
        Ok(config)
    }
}
