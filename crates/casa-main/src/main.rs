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

mod config;

use anyhow::{Context, Result, bail};
use casa_core::{
    ContextAggregator, ConversationStateMachine, HomeController, Intent, SessionAttributes,
};
use casa_ha::HomeAssistantController;
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::FmtSubscriber;

use crate::config::AppConfig;

/// Smart-home context and "leaving the house" assistant backend
#[derive(Debug, Parser)]
#[command(name = "casa", version)]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(long, env = "CASA_CONFIG", global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print the aggregated smart-home context as JSON
    Context,
    /// Invoke a single action on one entity
    Action {
        domain: String,
        action: String,
        entity_id: String,
    },
    /// Run one turn of the leave-home conversation
    Converse {
        /// leave-home, yes or no
        intent: Intent,
        /// Session attributes returned by the previous turn
        #[arg(long)]
        session: Option<String>,
    },
}

#[derive(Debug, Serialize)]
struct ActionResult<'a> {
    domain: &'a str,
    action: &'a str,
    entity_id: &'a str,
    success: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Respects RUST_LOG; stdout is reserved for JSON output
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to install tracing subscriber")?;

    let cli = Cli::parse();
    let config = AppConfig::load(cli.config.as_deref())?;

    info!("🏠 Starting Casa");
    info!("   Controller: {:?}", config.controller);
    info!(
        "   Energy keys: {}, history counters: {}",
        config.context.energy_mapping.len(),
        config.context.history_mapping.len()
    );

    let controller = HomeAssistantController::from_config(&config.controller)?;
    info!(
        "🔌 Using {} controller (configured: {})",
        controller.name(),
        controller.is_configured()
    );
    let aggregator = ContextAggregator::new(Arc::new(controller), config.context);

    match cli.command {
        Command::Context => {
            let context = aggregator.get_smart_home_context().await;
            print_json(&context)?;
        }
        Command::Action {
            domain,
            action,
            entity_id,
        } => {
            let success = aggregator.execute_action(&domain, &action, &entity_id).await;
            print_json(&ActionResult {
                domain: &domain,
                action: &action,
                entity_id: &entity_id,
                success,
            })?;
            if !success {
                bail!("{domain}.{action} failed for {entity_id}");
            }
        }
        Command::Converse { intent, session } => {
            let attributes = match session {
                Some(raw) => serde_json::from_str::<SessionAttributes>(&raw)
                    .context("Failed to parse --session as session attributes JSON")?,
                None => SessionAttributes::default(),
            };
            let machine = ConversationStateMachine::new(aggregator);
            let outcome = machine.handle_attributes(attributes, intent).await;
            print_json(&outcome)?;
        }
    }

    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("Failed to serialize output")?;
    println!("{json}");
    Ok(())
}
