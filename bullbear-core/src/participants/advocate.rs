//! Advocate turns — the bull and bear positions share one behavior,
//! differing only in stance.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use crate::error::EngineError;
use crate::oracle::ReasoningOracle;
use crate::parser::parse_argument;
use crate::prompts::{advocate_opening_prompt, advocate_preamble, advocate_rebuttal_prompt};
use crate::state::{Actor, SessionState, Speaker};

use super::{Participant, TurnDelta};

/// One debate position. Rebuts the opponent's most recent argument when one
/// exists, otherwise opens the round.
pub struct Advocate {
    speaker: Speaker,
    oracle: Arc<dyn ReasoningOracle>,
}

impl Advocate {
    /// The bull position.
    pub fn bull(oracle: Arc<dyn ReasoningOracle>) -> Self {
        Self {
            speaker: Speaker::Bull,
            oracle,
        }
    }

    /// The bear position.
    pub fn bear(oracle: Arc<dyn ReasoningOracle>) -> Self {
        Self {
            speaker: Speaker::Bear,
            oracle,
        }
    }

    fn opponent(&self) -> Speaker {
        match self.speaker {
            Speaker::Bull => Speaker::Bear,
            _ => Speaker::Bull,
        }
    }
}

#[async_trait]
impl Participant for Advocate {
    fn name(&self) -> &'static str {
        match self.speaker {
            Speaker::Bull => "bull",
            _ => "bear",
        }
    }

    async fn act(&self, state: &SessionState) -> Result<TurnDelta, EngineError> {
        // Most recent opposing argument, passed full-text for rebuttal.
        let opponent_argument = state.last_argument_from(self.opponent());

        let prompt = match opponent_argument {
            Some(arg) => advocate_rebuttal_prompt(self.speaker, state, &arg.content),
            None => advocate_opening_prompt(self.speaker, state),
        };

        let raw = self
            .oracle
            .complete(&prompt, Some(advocate_preamble(self.speaker)))
            .await
            .map_err(|e| EngineError::oracle(self.name(), e))?;

        let argument = parse_argument(self.speaker, &raw);
        debug!(
            speaker = %self.speaker,
            confidence = argument.confidence,
            citations = argument.evidence.len(),
            rebuttal = opponent_argument.is_some(),
            "advocate turn complete"
        );

        // Limit check inside the advocate's own turn routes straight to the
        // judge, skipping the moderator for this exchange. Normally shadowed
        // by the moderator's own check; reachable with a zero round limit or
        // a session resumed mid-round.
        let next = if state.round_index >= state.round_limit {
            Actor::Judge
        } else {
            match self.speaker {
                Speaker::Bull => Actor::Bear,
                _ => Actor::Moderator,
            }
        };

        let mut delta = TurnDelta::route(next);
        delta.arguments.push(argument);
        Ok(delta)
    }
}
