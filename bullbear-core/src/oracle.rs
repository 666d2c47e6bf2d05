//! Reasoning oracle — the text-completion capability every participant
//! consumes, plus the HTTP adapter for OpenAI-compatible chat endpoints.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;
use thiserror::Error;

use crate::config::OracleConfig;

/// Errors from a reasoning-oracle call. The engine never retries; failures
/// surface as turn-level failures.
#[derive(Debug, Error)]
pub enum OracleError {
    #[error("request failed: {0}")]
    RequestFailed(String),

    #[error("service returned {status}: {body}")]
    ServiceError { status: u16, body: String },

    #[error("response payload could not be parsed: {0}")]
    MalformedResponse(String),

    #[error("service returned an empty completion")]
    EmptyResponse,
}

/// Text-generation capability. Safe to call repeatedly; no determinism
/// guaranteed.
#[async_trait]
pub trait ReasoningOracle: Send + Sync {
    /// Complete a prompt, optionally under a role instruction (system
    /// prompt). Returns the raw generated text.
    async fn complete(
        &self,
        prompt: &str,
        role_instruction: Option<&str>,
    ) -> Result<String, OracleError>;
}

/// Reqwest-backed oracle for OpenAI-compatible `/chat/completions`
/// endpoints.
pub struct HttpOracle {
    config: OracleConfig,
    client: reqwest::Client,
}

impl HttpOracle {
    pub fn new(config: OracleConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .expect("failed to build HTTP client");
        Self { config, client }
    }

    /// Adapter from environment configuration.
    pub fn from_env() -> Self {
        Self::new(OracleConfig::default())
    }
}

#[async_trait]
impl ReasoningOracle for HttpOracle {
    async fn complete(
        &self,
        prompt: &str,
        role_instruction: Option<&str>,
    ) -> Result<String, OracleError> {
        let mut messages = Vec::new();
        if let Some(system) = role_instruction {
            messages.push(json!({"role": "system", "content": system}));
        }
        messages.push(json!({"role": "user", "content": prompt}));

        let body = json!({
            "model": self.config.model,
            "messages": messages,
            "temperature": self.config.temperature,
            "max_tokens": self.config.max_tokens,
        });

        let url = format!("{}/chat/completions", self.config.base_url.trim_end_matches('/'));
        let mut request = self.client.post(&url).json(&body);
        if let Some(ref key) = self.config.api_key {
            request = request.header("Authorization", format!("Bearer {key}"));
        }

        let response = request
            .send()
            .await
            .map_err(|e| OracleError::RequestFailed(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(OracleError::ServiceError { status, body });
        }

        let payload: serde_json::Value = response
            .json()
            .await
            .map_err(|e| OracleError::MalformedResponse(e.to_string()))?;

        let content = payload["choices"][0]["message"]["content"]
            .as_str()
            .ok_or_else(|| {
                OracleError::MalformedResponse("missing choices[0].message.content".into())
            })?;

        Ok(content.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = OracleError::ServiceError {
            status: 429,
            body: "rate limited".into(),
        };
        assert!(err.to_string().contains("429"));
        assert!(OracleError::EmptyResponse.to_string().contains("empty"));
    }
}
