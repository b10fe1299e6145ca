//! LLM provider abstraction.
//!
//! `LlmProvider` is an enum over concrete provider implementations.
//! Add a new variant + module in `providers/` for each additional backend.
//!
//! Every backend returns the same normalized [`LlmResponse`]; callers never
//! branch on the shape of a provider's wire response.

pub mod providers;

use serde::{Deserialize, Serialize};
use thiserror::Error;

// ── Error ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("unknown provider: {0}")]
    UnknownProvider(String),
    #[error("provider request failed: {0}")]
    Request(String),
}

// ── Request / response ────────────────────────────────────────────────────────

/// One chat message in the `{role, content}` shape every backend accepts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self { role: "system".into(), content: content.into() }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self { role: "user".into(), content: content.into() }
    }
}

/// An ordered message list plus sampling parameters for one completion.
#[derive(Debug, Clone, Default)]
pub struct ChatRequest {
    pub messages: Vec<ChatMessage>,
    /// `None` uses the provider's configured temperature.
    pub temperature: Option<f32>,
}

impl ChatRequest {
    pub fn new(messages: Vec<ChatMessage>) -> Self {
        Self { messages, temperature: None }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Content of the last `user` message, if any.
    pub fn last_user_content(&self) -> Option<&str> {
        self.messages
            .iter()
            .rev()
            .find(|m| m.role == "user")
            .map(|m| m.content.as_str())
    }
}

/// Token accounting reported by the provider.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LlmUsage {
    pub input_tokens: u64,
    pub output_tokens: u64,
    /// Provider-reported total; some servers send only this.
    pub total_tokens: Option<u64>,
}

impl LlmUsage {
    /// The reported total when present, else input + output.
    pub fn total(&self) -> u64 {
        self.total_tokens.unwrap_or(self.input_tokens + self.output_tokens)
    }
}

/// Normalized completion result.
#[derive(Debug, Clone, PartialEq)]
pub struct LlmResponse {
    pub text: String,
    /// `None` when the backend did not report usage.
    pub usage: Option<LlmUsage>,
}

// ── Provider enum ─────────────────────────────────────────────────────────────

/// All available provider backends.
///
/// Enum dispatch avoids `dyn` trait objects and the `async-trait` dependency.
/// Adding a backend = new module + new variant + new `complete` arm.
#[derive(Debug, Clone)]
pub enum LlmProvider {
    Dummy(providers::dummy::DummyProvider),
    OpenAiCompatible(providers::openai_compatible::OpenAiCompatibleProvider),
}

impl LlmProvider {
    /// Run one completion round-trip.
    pub async fn complete(&self, request: &ChatRequest) -> Result<LlmResponse, ProviderError> {
        match self {
            LlmProvider::Dummy(p) => p.complete(request).await,
            LlmProvider::OpenAiCompatible(p) => p.complete(request).await,
        }
    }

    /// Model identifier, for logging.
    pub fn model(&self) -> &str {
        match self {
            LlmProvider::Dummy(_) => "dummy",
            LlmProvider::OpenAiCompatible(p) => p.model(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn last_user_content_skips_system() {
        let req = ChatRequest::new(vec![
            ChatMessage::system("sys"),
            ChatMessage::user("first"),
            ChatMessage::user("second"),
        ]);
        assert_eq!(req.last_user_content(), Some("second"));
    }

    #[test]
    fn usage_total_sums_both_sides() {
        let u = LlmUsage { input_tokens: 120, output_tokens: 30, total_tokens: None };
        assert_eq!(u.total(), 150);
    }

    #[test]
    fn usage_total_prefers_reported_total() {
        let u = LlmUsage { input_tokens: 0, output_tokens: 0, total_tokens: Some(42) };
        assert_eq!(u.total(), 42);
    }

    #[test]
    fn with_temperature_sets_override() {
        let req = ChatRequest::new(vec![]).with_temperature(0.4);
        assert_eq!(req.temperature, Some(0.4));
    }
}
