//! Judge turn — weighs the full transcript and fact-checks, issues the
//! terminal verdict.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use crate::error::EngineError;
use crate::oracle::ReasoningOracle;
use crate::parser::parse_verdict;
use crate::prompts::{judge_prompt, JUDGE_PREAMBLE};
use crate::state::{Actor, SessionState};

use super::{Participant, TurnDelta};

/// Impartial committee issuing the final recommendation. Ignores any
/// notion of an opponent; aggregates everything into one oracle call and
/// always terminates the session.
pub struct Judge {
    oracle: Arc<dyn ReasoningOracle>,
}

impl Judge {
    pub fn new(oracle: Arc<dyn ReasoningOracle>) -> Self {
        Self { oracle }
    }
}

#[async_trait]
impl Participant for Judge {
    fn name(&self) -> &'static str {
        "judge"
    }

    async fn act(&self, state: &SessionState) -> Result<TurnDelta, EngineError> {
        let raw = self
            .oracle
            .complete(&judge_prompt(state), Some(JUDGE_PREAMBLE))
            .await
            .map_err(|e| EngineError::oracle(self.name(), e))?;

        let verdict = parse_verdict(&raw);
        info!(
            ticker = %state.ticker,
            recommendation = %verdict.recommendation,
            confidence = verdict.confidence,
            bull_score = verdict.bull_score,
            bear_score = verdict.bear_score,
            "verdict issued"
        );

        let mut delta = TurnDelta::route(Actor::End);
        delta.verdict = Some(verdict);
        Ok(delta)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oracle::OracleError;
    use crate::state::{Argument, Recommendation, Speaker};
    use std::sync::Mutex;

    struct ScriptedOracle {
        response: String,
        prompts: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl ReasoningOracle for ScriptedOracle {
        async fn complete(
            &self,
            prompt: &str,
            _role_instruction: Option<&str>,
        ) -> Result<String, OracleError> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            Ok(self.response.clone())
        }
    }

    #[tokio::test]
    async fn judge_terminates_with_verdict() {
        let oracle = Arc::new(ScriptedOracle {
            response: "RECOMMENDATION: BUY\nCONFIDENCE: 0.8\nBULL_SCORE: 70\nBEAR_SCORE: 45\nSUMMARY: Bull case holds up.".into(),
            prompts: Mutex::new(Vec::new()),
        });
        let judge = Judge::new(oracle.clone());
        let mut state = SessionState::new("NVDA", None, 1);
        state
            .arguments
            .push(Argument::new(Speaker::Bull, "case".into(), vec![], 0.8));

        let delta = judge.act(&state).await.unwrap();
        assert_eq!(delta.next_actor, Some(Actor::End));
        // The judge contributes no transcript argument, only the verdict.
        assert!(delta.arguments.is_empty());

        let verdict = delta.verdict.unwrap();
        assert_eq!(verdict.recommendation, Recommendation::Buy);
        assert_eq!(verdict.bull_score, 70.0);

        let prompts = oracle.prompts.lock().unwrap();
        assert!(prompts[0].contains("FINAL JUDGMENT REQUIRED"));
        assert!(prompts[0].contains("DEBATE HISTORY:"));
    }

    #[tokio::test]
    async fn empty_oracle_text_defaults_to_hold() {
        let oracle = Arc::new(ScriptedOracle {
            response: String::new(),
            prompts: Mutex::new(Vec::new()),
        });
        let judge = Judge::new(oracle);
        let state = SessionState::new("NVDA", None, 1);

        let delta = judge.act(&state).await.unwrap();
        let verdict = delta.verdict.unwrap();
        assert_eq!(verdict.recommendation, Recommendation::Hold);
        assert_eq!(verdict.confidence, 0.5);
    }
}
