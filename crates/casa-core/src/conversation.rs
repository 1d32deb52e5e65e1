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

//! Two-turn "leaving the house" dialogue over stateless requests.
//!
//! The caller persists [`SessionAttributes`] between turns and hands them
//! back verbatim; nothing about a conversation is kept in this process.

use anyhow::{Result, anyhow};
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::{debug, info};

use crate::context::ContextAggregator;
use crate::leave_home::LeaveHomeSummary;
use crate::types::domain_of;

pub const INITIAL_TAG: &str = "INITIAL";
pub const AWAITING_CONFIRMATION_TAG: &str = "AWAITING_CONFIRMATION";
/// Tag written by earlier deployments for the same state
const AWAITING_LIGHTS_CONFIRMATION_TAG: &str = "AWAITING_LIGHTS_CONFIRMATION";

const LIGHT_OFF_ACTION: &str = "turn_off";

/// Session payload exactly as the caller stores it
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionAttributes {
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub pending: Vec<String>,
}

/// Where the conversation stands between two turns
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "SessionAttributes", into = "SessionAttributes")]
pub enum ConversationSession {
    #[default]
    Initial,
    /// A yes/no question about switching these entities off is open
    AwaitingConfirmation { pending: Vec<String> },
}

impl ConversationSession {
    pub fn tag(&self) -> &'static str {
        match self {
            Self::Initial => INITIAL_TAG,
            Self::AwaitingConfirmation { .. } => AWAITING_CONFIRMATION_TAG,
        }
    }
}

impl From<SessionAttributes> for ConversationSession {
    /// Unknown tags, and an awaiting tag without pending entities, restore as `Initial`
    fn from(attributes: SessionAttributes) -> Self {
        match attributes.state.as_deref() {
            Some(AWAITING_CONFIRMATION_TAG | AWAITING_LIGHTS_CONFIRMATION_TAG)
                if !attributes.pending.is_empty() =>
            {
                Self::AwaitingConfirmation {
                    pending: attributes.pending,
                }
            }
            Some(other) if other != INITIAL_TAG => {
                debug!("[CONVERSATION] Ignoring session state '{}'", other);
                Self::Initial
            }
            Some(_) | None => Self::Initial,
        }
    }
}

impl From<ConversationSession> for SessionAttributes {
    fn from(session: ConversationSession) -> Self {
        let state = Some(session.tag().to_owned());
        match session {
            ConversationSession::Initial => Self {
                state,
                pending: Vec::new(),
            },
            ConversationSession::AwaitingConfirmation { pending } => Self { state, pending },
        }
    }
}

/// Classified user intent for one turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Intent {
    #[serde(rename = "leave-home")]
    LeaveHome,
    #[serde(rename = "yes", alias = "affirm")]
    Affirm,
    #[serde(rename = "no", alias = "deny")]
    Deny,
}

impl Intent {
    pub fn all() -> &'static [Intent] {
        &[Self::LeaveHome, Self::Affirm, Self::Deny]
    }

    pub fn to_config_value(self) -> &'static str {
        match self {
            Self::LeaveHome => "leave-home",
            Self::Affirm => "yes",
            Self::Deny => "no",
        }
    }
}

impl fmt::Display for Intent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.to_config_value())
    }
}

impl FromStr for Intent {
    type Err = anyhow::Error;

    /// Accepts the short names as well as the voice-assistant intent names
    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "leave-home" | "leavehomeintent" => Ok(Self::LeaveHome),
            "yes" | "affirm" | "amazon.yesintent" => Ok(Self::Affirm),
            "no" | "deny" | "amazon.nointent" => Ok(Self::Deny),
            _ => Err(anyhow!(
                "Unknown intent: '{}'. Supported intents: {}",
                s,
                Self::all()
                    .iter()
                    .map(|i| i.to_config_value())
                    .collect::<Vec<_>>()
                    .join(", ")
            )),
        }
    }
}

/// Structured answer for the dialogue layer to phrase
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Reply {
    /// Lights are on; asks whether to switch them off
    ConfirmLightsOff { summary: LeaveHomeSummary },
    /// Nothing to confirm; the summary may still list open windows or consumers
    Summary { summary: LeaveHomeSummary },
    LightsSwitchedOff { switched_off: usize, requested: usize },
    /// The user declined, nothing was switched
    Dismissed,
}

/// Result of one turn: the reply plus the session the caller must persist
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TurnOutcome {
    pub reply: Reply,
    pub session: ConversationSession,
    pub end_session: bool,
}

impl TurnOutcome {
    pub fn attributes(&self) -> SessionAttributes {
        self.session.clone().into()
    }
}

/// Decides per turn whether to aggregate afresh or resolve a pending confirmation
#[derive(Debug, Clone)]
pub struct ConversationStateMachine {
    aggregator: ContextAggregator,
}

impl ConversationStateMachine {
    pub fn new(aggregator: ContextAggregator) -> Self {
        Self { aggregator }
    }

    pub async fn handle(&self, session: ConversationSession, intent: Intent) -> TurnOutcome {
        debug!(
            "[CONVERSATION] state={} intent={}",
            session.tag(),
            intent
        );
        match (session, intent) {
            (ConversationSession::AwaitingConfirmation { pending }, Intent::Affirm) => {
                self.switch_off(pending).await
            }
            (ConversationSession::AwaitingConfirmation { pending }, Intent::Deny) => {
                info!(
                    "[CONVERSATION] Declined, dropping {} pending entities",
                    pending.len()
                );
                TurnOutcome {
                    reply: Reply::Dismissed,
                    session: ConversationSession::Initial,
                    end_session: true,
                }
            }
            (ConversationSession::AwaitingConfirmation { .. }, Intent::LeaveHome)
            | (ConversationSession::Initial, Intent::LeaveHome | Intent::Affirm | Intent::Deny) => {
                self.start().await
            }
        }
    }

    /// Convenience for callers holding the raw persisted payload
    pub async fn handle_attributes(
        &self,
        attributes: SessionAttributes,
        intent: Intent,
    ) -> TurnOutcome {
        self.handle(attributes.into(), intent).await
    }

    async fn start(&self) -> TurnOutcome {
        let context = self.aggregator.get_smart_home_context().await;
        let summary =
            LeaveHomeSummary::from_context(&context, &self.aggregator.config().leave_home);
        let lights = summary.light_ids();

        if lights.is_empty() {
            info!("[CONVERSATION] No lights on, closing");
            return TurnOutcome {
                reply: Reply::Summary { summary },
                session: ConversationSession::Initial,
                end_session: true,
            };
        }

        info!(
            "[CONVERSATION] {} lights on, asking for confirmation",
            lights.len()
        );
        TurnOutcome {
            reply: Reply::ConfirmLightsOff { summary },
            session: ConversationSession::AwaitingConfirmation { pending: lights },
            end_session: false,
        }
    }

    async fn switch_off(&self, pending: Vec<String>) -> TurnOutcome {
        let results = join_all(pending.iter().map(|entity_id| {
            self.aggregator
                .execute_action(domain_of(entity_id), LIGHT_OFF_ACTION, entity_id)
        }))
        .await;
        let switched_off = results.into_iter().filter(|ok| *ok).count();

        info!(
            "[CONVERSATION] Switched off {}/{} entities",
            switched_off,
            pending.len()
        );
        TurnOutcome {
            reply: Reply::LightsSwitchedOff {
                switched_off,
                requested: pending.len(),
            },
            session: ConversationSession::Initial,
            end_session: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ContextConfig;
    use crate::testing::FakeController;
    use crate::types::RawEntityRecord;
    use serde_json::json;
    use std::sync::Arc;

    fn machine(controller: &Arc<FakeController>) -> ConversationStateMachine {
        let aggregator = ContextAggregator::new(controller.clone(), ContextConfig::default());
        ConversationStateMachine::new(aggregator)
    }

    fn lit_house() -> FakeController {
        FakeController::configured()
            .with_states(vec![
                RawEntityRecord::new("light.wohnzimmer", "on").with_friendly_name("Wohnzimmer"),
                RawEntityRecord::new("light.kueche", "off").with_friendly_name("Küche"),
                RawEntityRecord::new("binary_sensor.fenster_bad", "on")
                    .with_device_class("window"),
            ])
            .with_area("light.wohnzimmer", "Wohnzimmer")
            .with_area("light.kueche", "Küche")
            .with_area("binary_sensor.fenster_bad", "Bad")
    }

    fn awaiting(pending: &[&str]) -> SessionAttributes {
        SessionAttributes {
            state: Some(AWAITING_CONFIRMATION_TAG.to_owned()),
            pending: pending.iter().map(|p| (*p).to_owned()).collect(),
        }
    }

    #[test]
    fn test_session_restore() {
        assert_eq!(
            ConversationSession::from(awaiting(&["light.a"])),
            ConversationSession::AwaitingConfirmation {
                pending: vec!["light.a".to_owned()]
            }
        );
        let legacy = SessionAttributes {
            state: Some("AWAITING_LIGHTS_CONFIRMATION".to_owned()),
            pending: vec!["light.a".to_owned()],
        };
        assert!(matches!(
            ConversationSession::from(legacy),
            ConversationSession::AwaitingConfirmation { .. }
        ));
        let unknown = SessionAttributes {
            state: Some("SOMETHING_ELSE".to_owned()),
            pending: vec!["light.a".to_owned()],
        };
        assert_eq!(ConversationSession::from(unknown), ConversationSession::Initial);
        assert_eq!(ConversationSession::from(awaiting(&[])), ConversationSession::Initial);
        assert_eq!(
            ConversationSession::from(SessionAttributes::default()),
            ConversationSession::Initial
        );
    }

    #[test]
    fn test_session_serializes_as_attributes() {
        let session = ConversationSession::AwaitingConfirmation {
            pending: vec!["light.wohnzimmer".to_owned()],
        };
        let value = serde_json::to_value(&session).unwrap();
        assert_eq!(
            value,
            json!({"state": "AWAITING_CONFIRMATION", "pending": ["light.wohnzimmer"]})
        );

        let restored: ConversationSession = serde_json::from_value(value).unwrap();
        assert_eq!(restored, session);

        let initial = serde_json::to_value(ConversationSession::Initial).unwrap();
        assert_eq!(initial, json!({"state": "INITIAL", "pending": []}));
    }

    #[test]
    fn test_intent_parsing() {
        assert_eq!("leave-home".parse::<Intent>().unwrap(), Intent::LeaveHome);
        assert_eq!("AMAZON.YesIntent".parse::<Intent>().unwrap(), Intent::Affirm);
        assert_eq!("no".parse::<Intent>().unwrap(), Intent::Deny);
        assert!("maybe".parse::<Intent>().is_err());
    }

    #[test]
    fn test_intent_names_agree() {
        for intent in Intent::all() {
            let serialized = serde_json::to_value(intent).unwrap();
            assert_eq!(serialized, json!(intent.to_string()));
            assert_eq!(intent.to_string().parse::<Intent>().unwrap(), *intent);
            assert_eq!(serde_json::from_value::<Intent>(serialized).unwrap(), *intent);
        }
        assert_eq!(serde_json::from_value::<Intent>(json!("affirm")).unwrap(), Intent::Affirm);
    }

    #[tokio::test]
    async fn test_leave_home_asks_when_lights_on() {
        let controller = Arc::new(lit_house());
        let outcome = machine(&controller)
            .handle(ConversationSession::Initial, Intent::LeaveHome)
            .await;

        assert!(!outcome.end_session);
        assert_eq!(
            outcome.attributes(),
            SessionAttributes {
                state: Some(AWAITING_CONFIRMATION_TAG.to_owned()),
                pending: vec!["light.wohnzimmer".to_owned()],
            }
        );
        let Reply::ConfirmLightsOff { summary } = outcome.reply else {
            panic!("expected a confirmation question, got {:?}", outcome.reply);
        };
        assert_eq!(summary.open_openings.len(), 1);
        assert!(controller.actions().is_empty());
    }

    #[tokio::test]
    async fn test_leave_home_without_lights_closes() {
        let controller = Arc::new(FakeController::configured().with_states(vec![
            RawEntityRecord::new("light.kueche", "off"),
        ]));
        let outcome = machine(&controller)
            .handle(ConversationSession::Initial, Intent::LeaveHome)
            .await;

        assert!(outcome.end_session);
        assert_eq!(outcome.session, ConversationSession::Initial);
        assert!(matches!(outcome.reply, Reply::Summary { ref summary } if summary.is_all_clear()));
    }

    #[tokio::test]
    async fn test_affirm_switches_pending_lights_off() {
        let controller = Arc::new(lit_house());
        let outcome = machine(&controller)
            .handle_attributes(awaiting(&["light.wohnzimmer"]), Intent::Affirm)
            .await;

        assert_eq!(
            controller.actions(),
            vec![(
                "light".to_owned(),
                "turn_off".to_owned(),
                "light.wohnzimmer".to_owned()
            )]
        );
        assert_eq!(
            outcome.reply,
            Reply::LightsSwitchedOff {
                switched_off: 1,
                requested: 1
            }
        );
        assert_eq!(outcome.session, ConversationSession::Initial);
        assert!(outcome.end_session);
        // Confirmation does not re-read the house
        assert_eq!(controller.total_calls(), 1);
    }

    #[tokio::test]
    async fn test_affirm_counts_partial_success() {
        let controller = Arc::new(lit_house().with_failing_action("light.flur"));
        let outcome = machine(&controller)
            .handle_attributes(awaiting(&["light.wohnzimmer", "light.flur"]), Intent::Affirm)
            .await;

        assert_eq!(
            outcome.reply,
            Reply::LightsSwitchedOff {
                switched_off: 1,
                requested: 2
            }
        );
        assert_eq!(controller.actions().len(), 2);
    }

    #[tokio::test]
    async fn test_deny_discards_pending() {
        let controller = Arc::new(lit_house());
        let outcome = machine(&controller)
            .handle_attributes(awaiting(&["light.wohnzimmer"]), Intent::Deny)
            .await;

        assert_eq!(outcome.reply, Reply::Dismissed);
        assert_eq!(outcome.session, ConversationSession::Initial);
        assert!(outcome.end_session);
        assert_eq!(controller.total_calls(), 0);
    }

    #[tokio::test]
    async fn test_stale_affirm_starts_fresh() {
        let controller = Arc::new(lit_house());
        let stale = SessionAttributes {
            state: Some("SOMETHING_ELSE".to_owned()),
            pending: vec!["light.kueche".to_owned()],
        };
        let outcome = machine(&controller)
            .handle_attributes(stale, Intent::Affirm)
            .await;

        assert!(controller.actions().is_empty());
        assert!(matches!(outcome.reply, Reply::ConfirmLightsOff { .. }));
        assert_eq!(
            outcome.session,
            ConversationSession::AwaitingConfirmation {
                pending: vec!["light.wohnzimmer".to_owned()]
            }
        );
    }
}
