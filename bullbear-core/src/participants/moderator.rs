//! Moderator turn — fact-checks the latest exchange, summarizes it, and
//! advances the round counter.

use std::fmt::Write as _;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use crate::context::{truncate, HISTORY_PREVIEW_CHARS};
use crate::error::EngineError;
use crate::oracle::ReasoningOracle;
use crate::parser::{parse_fact_check, MODERATOR_CONFIDENCE};
use crate::prompts::{fact_check_prompt, moderator_summary_prompt, MODERATOR_PREAMBLE};
use crate::state::{Actor, Argument, SessionState, Speaker};

use super::{Participant, TurnDelta};

/// Neutral fact-checker between rounds.
///
/// Reads the last two arguments (expected: one bull, one bear), runs one
/// fact-check oracle call per advocate argument found, and produces one
/// summary argument. Increments the round index exactly once per turn.
pub struct Moderator {
    oracle: Arc<dyn ReasoningOracle>,
}

impl Moderator {
    pub fn new(oracle: Arc<dyn ReasoningOracle>) -> Self {
        Self { oracle }
    }
}

#[async_trait]
impl Participant for Moderator {
    fn name(&self) -> &'static str {
        "moderator"
    }

    async fn act(&self, state: &SessionState) -> Result<TurnDelta, EngineError> {
        let recent = state.recent_arguments(2);

        let mut recent_text = String::new();
        for arg in recent {
            let _ = write!(
                recent_text,
                "\n[{}]:\n{}\n",
                arg.speaker.to_string().to_uppercase(),
                truncate(&arg.content, HISTORY_PREVIEW_CHARS),
            );
        }

        let summary_raw = self
            .oracle
            .complete(
                &moderator_summary_prompt(state, &recent_text),
                Some(MODERATOR_PREAMBLE),
            )
            .await
            .map_err(|e| EngineError::oracle(self.name(), e))?;

        let summary = Argument::new(
            Speaker::Moderator,
            summary_raw,
            Vec::new(),
            MODERATOR_CONFIDENCE,
        );

        let mut fact_checks = Vec::new();
        for arg in recent.iter().filter(|a| a.speaker.is_advocate()) {
            let raw = self
                .oracle
                .complete(
                    &fact_check_prompt(state, arg.speaker, &arg.content),
                    Some(MODERATOR_PREAMBLE),
                )
                .await
                .map_err(|e| EngineError::oracle(self.name(), e))?;
            fact_checks.push(parse_fact_check(arg.speaker, &raw));
        }

        let completed_round = state.round_index + 1;

        let next = if completed_round >= state.round_limit {
            Actor::Judge
        } else {
            // Alternate: open the next round with whichever advocate did not
            // close the previous one, defaulting to bull when ambiguous.
            match state.last_advocate_argument().map(|a| a.speaker) {
                Some(Speaker::Bull) => Actor::Bear,
                _ => Actor::Bull,
            }
        };

        debug!(
            round = completed_round,
            fact_checks = fact_checks.len(),
            next = %next,
            "moderator turn complete"
        );

        let mut delta = TurnDelta::route(next);
        delta.arguments.push(summary);
        delta.fact_checks = fact_checks;
        delta.round_index = Some(completed_round);
        Ok(delta)
    }
}
