//! OpenAI-compatible chat completion provider (`/v1/chat/completions`).
//!
//! All OpenAI wire types are private to this module; callers only see the
//! normalized [`LlmResponse`]. One call is one round-trip: no retries.

use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, trace};

use crate::llm::{ChatMessage, ChatRequest, LlmResponse, LlmUsage, ProviderError};

/// Adapter for any HTTP endpoint implementing `/v1/chat/completions`.
///
/// Covers OpenAI, OpenAI-compatible local servers (Ollama, LM Studio…),
/// and hosted alternatives. Cheap to clone: `reqwest::Client` is an `Arc`
/// internally.
#[derive(Debug, Clone)]
pub struct OpenAiCompatibleProvider {
    client: Client,
    api_base_url: String,
    model: String,
    temperature: f32,
    api_key: Option<String>,
}

impl OpenAiCompatibleProvider {
    /// `api_key`, when present, is sent as `Authorization: Bearer <key>`.
    pub fn new(
        api_base_url: String,
        model: String,
        temperature: f32,
        timeout_seconds: u64,
        api_key: Option<String>,
    ) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(timeout_seconds))
            .build()
            .map_err(|e| ProviderError::Request(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { client, api_base_url, model, temperature, api_key })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub async fn complete(&self, request: &ChatRequest) -> Result<LlmResponse, ProviderError> {
        // gpt-5 family models reject an explicit temperature.
        let temperature = if self.model.starts_with("gpt-5") {
            None
        } else {
            Some(request.temperature.unwrap_or(self.temperature))
        };

        let payload = ChatCompletionRequest {
            model: &self.model,
            messages: &request.messages,
            temperature,
        };

        debug!(
            model = %payload.model,
            temperature = ?payload.temperature,
            messages = payload.messages.len(),
            "sending LLM request"
        );
        if tracing::enabled!(tracing::Level::TRACE) {
            let json = serde_json::to_string_pretty(&payload)
                .unwrap_or_else(|e| format!("<serialization failed: {e}>"));
            trace!(payload = %json, "full LLM request payload");
        }

        let mut req = self.client.post(&self.api_base_url).json(&payload);
        if let Some(key) = &self.api_key {
            req = req.bearer_auth(key);
        }

        let response = req.send().await.map_err(|e| {
            error!(url = %self.api_base_url, error = %e, timeout = e.is_timeout(), "LLM HTTP request failed (transport)");
            ProviderError::Request(e.to_string())
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<failed to read error body>".to_string());
            let message = error_message(status.as_u16(), &body);
            error!(%status, %message, "LLM request returned HTTP error");
            return Err(ProviderError::Request(message));
        }

        let parsed = response.json::<ChatCompletionResponse>().await.map_err(|e| {
            error!(error = %e, "failed to deserialize LLM response");
            ProviderError::Request(format!("failed to parse response body: {e}"))
        })?;

        debug!(choices = parsed.choices.len(), "received LLM response");
        normalize(parsed)
    }
}

/// Collapse the wire response into [`LlmResponse`].
fn normalize(parsed: ChatCompletionResponse) -> Result<LlmResponse, ProviderError> {
    let text = parsed
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ProviderError::Request("empty or missing content in response".into()))?;

    // An empty usage block is no measurement: leave it to the caller's estimate.
    let usage = parsed
        .usage
        .map(|u| LlmUsage {
            input_tokens: u.prompt_tokens,
            output_tokens: u.completion_tokens,
            total_tokens: u.total_tokens,
        })
        .filter(|u| u.total() > 0);

    Ok(LlmResponse { text, usage })
}

/// Render an HTTP error, preferring the OpenAI error envelope when present.
fn error_message(status: u16, body: &str) -> String {
    match serde_json::from_str::<ErrorEnvelope>(body) {
        Ok(env) => {
            let code = env
                .error
                .code
                .map(|v| match v {
                    serde_json::Value::String(s) => format!(" [code={s}]"),
                    other => format!(" [code={other}]"),
                })
                .unwrap_or_default();
            format!("HTTP {status}{code}: {}", env.error.message)
        }
        Err(_) => format!("HTTP {status}: {body}"),
    }
}

// ── Private wire types ────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
    #[serde(default)]
    usage: Option<UsageData>,
}

#[derive(Debug, Deserialize)]
struct UsageData {
    #[serde(default)]
    prompt_tokens: u64,
    #[serde(default)]
    completion_tokens: u64,
    #[serde(default)]
    total_tokens: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
    #[serde(default)]
    code: Option<serde_json::Value>,
}
