//! Debate session state — speakers, routing cursor, and the accumulated
//! argument/fact-check/verdict history threaded through every turn.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Who produced a record in the transcript.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Speaker {
    /// Advocates for buying the stock.
    Bull,
    /// Advocates for selling or avoiding the stock.
    Bear,
    /// Neutral fact-checker between rounds.
    Moderator,
    /// Issues the terminal verdict.
    Judge,
}

impl Speaker {
    /// Whether this speaker is one of the two debate positions.
    pub fn is_advocate(self) -> bool {
        matches!(self, Self::Bull | Self::Bear)
    }

    /// The opposing advocate, if this speaker is one.
    pub fn opponent(self) -> Option<Speaker> {
        match self {
            Self::Bull => Some(Self::Bear),
            Self::Bear => Some(Self::Bull),
            _ => None,
        }
    }
}

impl std::fmt::Display for Speaker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Bull => write!(f, "bull"),
            Self::Bear => write!(f, "bear"),
            Self::Moderator => write!(f, "moderator"),
            Self::Judge => write!(f, "judge"),
        }
    }
}

/// Routing cursor — the next station the session will visit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Actor {
    /// Evidence gathering before argumentation begins.
    Research,
    /// Bull advocate turn.
    Bull,
    /// Bear advocate turn.
    Bear,
    /// Moderator summary + fact-check turn.
    Moderator,
    /// Terminal verdict turn.
    Judge,
    /// Absorbing terminal state — verdict is present.
    End,
}

impl Actor {
    /// Whether the session has terminated.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::End)
    }
}

impl std::fmt::Display for Actor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Research => write!(f, "research"),
            Self::Bull => write!(f, "bull"),
            Self::Bear => write!(f, "bear"),
            Self::Moderator => write!(f, "moderator"),
            Self::Judge => write!(f, "judge"),
            Self::End => write!(f, "end"),
        }
    }
}

/// One utterance in the debate transcript. Immutable once appended.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Argument {
    /// Which participant spoke.
    pub speaker: Speaker,
    /// Full text body, kept verbatim even when structured fields were extracted.
    pub content: String,
    /// Short citation strings pulled from EVIDENCE: lines (may be empty).
    pub evidence: Vec<String>,
    /// Self-assessed strength, always in [0.0, 1.0].
    pub confidence: f64,
    /// When the argument was produced.
    pub created_at: DateTime<Utc>,
}

impl Argument {
    /// Build an argument, clamping confidence into [0.0, 1.0].
    pub fn new(speaker: Speaker, content: String, evidence: Vec<String>, confidence: f64) -> Self {
        Self {
            speaker,
            content,
            evidence,
            confidence: confidence.clamp(0.0, 1.0),
            created_at: Utc::now(),
        }
    }
}

/// Moderator assessment of one advocate argument.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FactCheck {
    /// Which advocate's argument was checked (bull or bear only).
    pub subject_speaker: Speaker,
    /// How well the argument aligns with the evidence, in [0.0, 1.0].
    pub accuracy_score: f64,
    /// Full fact-check text from the moderator.
    pub feedback: String,
    /// When the check was produced.
    pub created_at: DateTime<Utc>,
}

impl FactCheck {
    /// Build a fact check, clamping the accuracy score into [0.0, 1.0].
    pub fn new(subject_speaker: Speaker, accuracy_score: f64, feedback: String) -> Self {
        Self {
            subject_speaker,
            accuracy_score: accuracy_score.clamp(0.0, 1.0),
            feedback,
            created_at: Utc::now(),
        }
    }
}

/// Terminal recommendation scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Recommendation {
    StrongBuy,
    Buy,
    #[default]
    Hold,
    Sell,
    StrongSell,
}

impl Recommendation {
    /// Uppercase label as it appears in oracle text and reports.
    pub fn label(self) -> &'static str {
        match self {
            Self::StrongBuy => "STRONG BUY",
            Self::Buy => "BUY",
            Self::Hold => "HOLD",
            Self::Sell => "SELL",
            Self::StrongSell => "STRONG SELL",
        }
    }
}

impl std::fmt::Display for Recommendation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::StrongBuy => write!(f, "strong_buy"),
            Self::Buy => write!(f, "buy"),
            Self::Hold => write!(f, "hold"),
            Self::Sell => write!(f, "sell"),
            Self::StrongSell => write!(f, "strong_sell"),
        }
    }
}

/// Final decision from the judge. Set exactly once at termination.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Verdict {
    pub recommendation: Recommendation,
    /// Judge's confidence in the call, in [0.0, 1.0].
    pub confidence: f64,
    /// Free-text rationale.
    pub summary: String,
    /// How compelling the bull case was, in [0.0, 100.0].
    pub bull_score: f64,
    /// How compelling the bear case was, in [0.0, 100.0].
    pub bear_score: f64,
    /// Factors that swayed the decision, at most 5.
    pub key_factors: Vec<String>,
    /// Risks to monitor, at most 3.
    pub risks: Vec<String>,
    /// When the verdict was issued.
    pub created_at: DateTime<Utc>,
}

/// Argument reduced to its reportable core for the flat export.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportedArgument {
    pub speaker: Speaker,
    pub content: String,
}

/// Flat serializable record of a finished session, for external reporting.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionExport {
    pub ticker: String,
    pub question: String,
    pub verdict: Option<Verdict>,
    pub arguments: Vec<ExportedArgument>,
}

/// The single source of truth threaded through the run.
///
/// Records accumulate append-only; scalar fields are overwritten by each
/// turn's delta. Owned exclusively by the driver between turns —
/// participants see snapshots and return deltas.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionState {
    /// Unique session identifier.
    pub id: String,
    /// Subject ticker, uppercased.
    pub ticker: String,
    /// The question under debate.
    pub question: String,
    /// Research snapshot; absent until the research stage completes.
    pub evidence: Option<crate::evidence::EvidenceBundle>,
    /// Completed bull/bear exchanges, starting at 0.
    pub round_index: u32,
    /// Configured upper bound on exchanges.
    pub round_limit: u32,
    /// Routing cursor.
    pub next_actor: Actor,
    /// Append-only transcript in insertion order.
    pub arguments: Vec<Argument>,
    /// Append-only moderator assessments.
    pub fact_checks: Vec<FactCheck>,
    /// Terminal decision, set exactly once.
    pub verdict: Option<Verdict>,
    /// Non-fatal error descriptors, never cleared.
    pub errors: Vec<String>,
    /// When the session was created.
    pub created_at: DateTime<Utc>,
}

impl SessionState {
    /// Create the initial state for a new debate.
    ///
    /// Accepts any non-empty ticker (uppercased by convention); the question
    /// defaults to a buy-or-sell template when omitted.
    pub fn new(ticker: &str, question: Option<&str>, round_limit: u32) -> Self {
        let ticker = ticker.trim().to_uppercase();
        let question = question
            .map(str::to_string)
            .unwrap_or_else(|| format!("Should we buy or sell {ticker}?"));
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            ticker,
            question,
            evidence: None,
            round_index: 0,
            round_limit,
            next_actor: Actor::Research,
            arguments: Vec::new(),
            fact_checks: Vec::new(),
            verdict: None,
            errors: Vec::new(),
            created_at: Utc::now(),
        }
    }

    /// Whether the session has reached its absorbing terminal state.
    pub fn is_complete(&self) -> bool {
        self.next_actor.is_terminal()
    }

    /// Most recent argument from the given speaker, if any.
    pub fn last_argument_from(&self, speaker: Speaker) -> Option<&Argument> {
        self.arguments.iter().rev().find(|a| a.speaker == speaker)
    }

    /// Most recent advocate argument, regardless of side.
    pub fn last_advocate_argument(&self) -> Option<&Argument> {
        self.arguments.iter().rev().find(|a| a.speaker.is_advocate())
    }

    /// The last `n` arguments in insertion order.
    pub fn recent_arguments(&self, n: usize) -> &[Argument] {
        let start = self.arguments.len().saturating_sub(n);
        &self.arguments[start..]
    }

    /// Reduce to the flat record used for external reporting.
    pub fn export(&self) -> SessionExport {
        SessionExport {
            ticker: self.ticker.clone(),
            question: self.question.clone(),
            verdict: self.verdict.clone(),
            arguments: self
                .arguments
                .iter()
                .map(|a| ExportedArgument {
                    speaker: a.speaker,
                    content: a.content.clone(),
                })
                .collect(),
        }
    }

    /// Compact status line for progress logging.
    pub fn status_line(&self) -> String {
        format!(
            "[{}] round {}/{} | {} arguments | {} fact-checks | ticker={}",
            self.next_actor,
            self.round_index,
            self.round_limit,
            self.arguments.len(),
            self.fact_checks.len(),
            self.ticker
        )
    }
}
