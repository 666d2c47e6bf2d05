//! Engine and endpoint configuration.
//!
//! Endpoint settings follow the environment-variable convention used across
//! the deployment; debate tuning lives in [`DebateConfig`].

use serde::{Deserialize, Serialize};

/// Tuning for one debate session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DebateConfig {
    /// Upper bound on bull/bear exchanges.
    pub round_limit: u32,
}

impl DebateConfig {
    /// Hard cap on driver steps, derived from the round limit. A session
    /// that routes correctly never reaches it: each round costs at most
    /// three turns (bull, bear, moderator), plus research and the judge.
    pub fn step_ceiling(&self) -> u32 {
        3 * self.round_limit + 4
    }
}

impl Default for DebateConfig {
    fn default() -> Self {
        Self { round_limit: 3 }
    }
}

/// Reasoning-oracle endpoint configuration (OpenAI-compatible chat API).
#[derive(Debug, Clone)]
pub struct OracleConfig {
    pub base_url: String,
    pub model: String,
    pub api_key: Option<String>,
    pub temperature: f64,
    pub max_tokens: u32,
    pub timeout_secs: u64,
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            base_url: std::env::var("BULLBEAR_ORACLE_URL")
                .unwrap_or_else(|_| "http://localhost:8080/v1".into()),
            model: std::env::var("BULLBEAR_ORACLE_MODEL")
                .unwrap_or_else(|_| "llama3.1-70b".into()),
            api_key: std::env::var("BULLBEAR_ORACLE_API_KEY").ok(),
            temperature: 0.7,
            max_tokens: 1024,
            timeout_secs: 120,
        }
    }
}

/// Research-provider endpoint configuration.
#[derive(Debug, Clone)]
pub struct ResearchConfig {
    pub base_url: String,
    pub api_key: Option<String>,
    pub timeout_secs: u64,
}

impl Default for ResearchConfig {
    fn default() -> Self {
        Self {
            base_url: std::env::var("BULLBEAR_RESEARCH_URL")
                .unwrap_or_else(|_| "http://localhost:8090".into()),
            api_key: std::env::var("BULLBEAR_RESEARCH_API_KEY").ok(),
            timeout_secs: 30,
        }
    }
}
