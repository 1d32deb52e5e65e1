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

pub mod config;
pub mod context;
pub mod conversation;
pub mod energy;
pub mod filter;
pub mod history;
pub mod leave_home;
pub mod traits;
pub mod types;

#[cfg(test)]
mod testing;

pub use config::{ContextConfig, EntityFilterConfig, LeaveHomeConfig};
pub use context::ContextAggregator;
pub use conversation::{
    ConversationSession, ConversationStateMachine, Intent, Reply, SessionAttributes, TurnOutcome,
};
pub use filter::filter_entities;
pub use history::{HISTORY_DAYS, chain_deltas};
pub use leave_home::{EntityStatus, LeaveHomeSummary};
pub use traits::HomeController;
pub use types::{
    EnergySnapshot, EntityAttributes, FilteredEntity, HistoryDelta, RawEntityRecord,
    SmartHomeContext, SnapshotValue, StateValue,
};
