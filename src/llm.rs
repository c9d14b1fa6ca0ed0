//! Language-model oracle
//!
//! The pipeline talks to the model through [`Oracle`], a plain text-completion capability.
//! [`LlmClient`] calls an OpenAI-compatible chat completions endpoint; [`ScriptedOracle`]
//! replays canned responses for tests and offline runs.

use crate::config::LlmConfig;
use crate::error::{Nl2SqlError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::Mutex;
use tracing::debug;

/// Decoding controls passed with every oracle call.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DecodingOptions {
    pub temperature: f32,
    pub max_tokens: u32,
}

impl DecodingOptions {
    /// Temperature 0 with the given output budget.
    pub fn deterministic(max_tokens: u32) -> Self {
        Self {
            temperature: 0.0,
            max_tokens,
        }
    }
}

#[async_trait]
pub trait Oracle: Send + Sync {
    /// Model identity, for logging.
    fn name(&self) -> &str;

    async fn generate(&self, prompt: &str, options: &DecodingOptions) -> Result<String>;
}

#[derive(Clone)]
pub struct LlmClient {
    api_key: String,
    base_url: String,
    model: String,
    http: reqwest::Client,
}

impl LlmClient {
    pub fn new(api_key: String, model: String, base_url: String) -> Self {
        Self {
            api_key,
            base_url,
            model,
            http: reqwest::Client::new(),
        }
    }

    pub fn from_config(config: &LlmConfig) -> Result<Self> {
        let api_key = config.require_api_key()?.to_string();
        Ok(Self::new(api_key, config.model.clone(), config.base_url.clone()))
    }

    fn request_body(&self, prompt: &str, options: &DecodingOptions) -> serde_json::Value {
        serde_json::json!({
            "model": self.model,
            "messages": [
                {"role": "user", "content": prompt}
            ],
            "temperature": options.temperature,
            "max_tokens": options.max_tokens
        })
    }
}

#[async_trait]
impl Oracle for LlmClient {
    fn name(&self) -> &str {
        &self.model
    }

    async fn generate(&self, prompt: &str, options: &DecodingOptions) -> Result<String> {
        debug!("Calling {} (max_tokens={})", self.model, options.max_tokens);

        let response = self
            .http
            .post(format!("{}/chat/completions", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&self.request_body(prompt, options))
            .send()
            .await
            .map_err(|e| Nl2SqlError::GenerationFailed(format!("LLM API call failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Nl2SqlError::GenerationFailed(format!(
                "LLM API returned {}: {}",
                status, body
            )));
        }

        let response_json: serde_json::Value = response.json().await.map_err(|e| {
            Nl2SqlError::GenerationFailed(format!("Failed to parse LLM response: {}", e))
        })?;

        extract_content(&response_json)
    }
}

/// Pull the first choice's message text out of a chat completions response.
fn extract_content(response: &serde_json::Value) -> Result<String> {
    let content = response["choices"][0]["message"]["content"]
        .as_str()
        .ok_or_else(|| Nl2SqlError::GenerationFailed("No content in LLM response".to_string()))?;

    if content.trim().is_empty() {
        return Err(Nl2SqlError::GenerationFailed(
            "LLM returned empty text".to_string(),
        ));
    }
    Ok(content.to_string())
}

/// Oracle that replays queued responses in order and records what it was asked.
#[derive(Default)]
pub struct ScriptedOracle {
    responses: Mutex<VecDeque<std::result::Result<String, String>>>,
    calls: Mutex<Vec<(String, DecodingOptions)>>,
}

impl ScriptedOracle {
    pub fn new<I, S>(responses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let oracle = Self::default();
        for response in responses {
            oracle.push_response(response);
        }
        oracle
    }

    pub fn push_response(&self, response: impl Into<String>) {
        lock(&self.responses).push_back(Ok(response.into()));
    }

    /// Queue a failure; the matching call returns `GenerationFailed`.
    pub fn push_error(&self, message: impl Into<String>) {
        lock(&self.responses).push_back(Err(message.into()));
    }

    pub fn call_count(&self) -> usize {
        lock(&self.calls).len()
    }

    pub fn prompts(&self) -> Vec<String> {
        lock(&self.calls).iter().map(|(p, _)| p.clone()).collect()
    }

    pub fn options(&self) -> Vec<DecodingOptions> {
        lock(&self.calls).iter().map(|(_, o)| *o).collect()
    }
}

#[async_trait]
impl Oracle for ScriptedOracle {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn generate(&self, prompt: &str, options: &DecodingOptions) -> Result<String> {
        lock(&self.calls).push((prompt.to_string(), *options));
        match lock(&self.responses).pop_front() {
            Some(Ok(text)) => Ok(text),
            Some(Err(message)) => Err(Nl2SqlError::GenerationFailed(message)),
            None => Err(Nl2SqlError::GenerationFailed(
                "Scripted oracle has no responses left".to_string(),
            )),
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_extract_content() {
        let response = json!({
            "choices": [{"message": {"role": "assistant", "content": "SELECT 1;"}}]
        });
        assert_eq!(extract_content(&response).unwrap(), "SELECT 1;");
    }

    #[test]
    fn test_extract_content_missing_or_empty() {
        let err = extract_content(&json!({"error": {"message": "bad key"}})).unwrap_err();
        assert_eq!(err.kind(), "generation_failed");

        let err = extract_content(&json!({
            "choices": [{"message": {"content": "  \n"}}]
        }))
        .unwrap_err();
        assert_eq!(err.kind(), "generation_failed");
    }

    #[test]
    fn test_request_body_carries_decoding_options() {
        let client = LlmClient::new(
            "sk-test".to_string(),
            "gpt-4o-mini".to_string(),
            "http://localhost".to_string(),
        );
        let body = client.request_body("hello", &DecodingOptions::deterministic(64));
        assert_eq!(body["model"], "gpt-4o-mini");
        assert_eq!(body["temperature"], 0.0);
        assert_eq!(body["max_tokens"], 64);
        assert_eq!(body["messages"][0]["content"], "hello");
    }

    #[test]
    fn test_from_config_requires_api_key() {
        let config = LlmConfig {
            api_key: None,
            model: "gpt-4o-mini".to_string(),
            base_url: "http://localhost".to_string(),
        };
        assert_eq!(LlmClient::from_config(&config).err().unwrap().kind(), "config");
    }

    #[tokio::test]
    async fn test_scripted_oracle_replays_in_order() {
        let oracle = ScriptedOracle::new(["first", "second"]);
        oracle.push_error("rate limited");
        let options = DecodingOptions::deterministic(10);

        assert_eq!(oracle.generate("a", &options).await.unwrap(), "first");
        assert_eq!(oracle.generate("b", &options).await.unwrap(), "second");
        assert_eq!(oracle.generate("c", &options).await.unwrap_err().kind(), "generation_failed");
        assert!(oracle.generate("d", &options).await.is_err());

        assert_eq!(oracle.call_count(), 4);
        assert_eq!(oracle.prompts(), vec!["a", "b", "c", "d"]);
        assert_eq!(oracle.options()[0], options);
    }
}
