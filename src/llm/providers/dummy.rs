//! Dummy LLM provider: echoes the last user message back prefixed with `[echo]`.
//! Used for offline runs and tests without a real API key.

use crate::llm::{ChatRequest, LlmResponse, ProviderError};

#[derive(Debug, Clone)]
pub struct DummyProvider;

impl DummyProvider {
    /// Never reports usage, so callers exercise their token estimate.
    pub async fn complete(&self, request: &ChatRequest) -> Result<LlmResponse, ProviderError> {
        let content = request.last_user_content().unwrap_or_default();
        Ok(LlmResponse { text: format!("[echo] {content}"), usage: None })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::ChatMessage;

    #[tokio::test]
    async fn complete_echoes_last_user_message() {
        let req = ChatRequest::new(vec![
            ChatMessage::system("be brief"),
            ChatMessage::user("memoria"),
            ChatMessage::user("hola"),
        ]);
        let resp = DummyProvider.complete(&req).await.unwrap();
        assert_eq!(resp.text, "[echo] hola");
        assert!(resp.usage.is_none());
    }

    #[tokio::test]
    async fn complete_without_user_message() {
        let req = ChatRequest::new(vec![ChatMessage::system("only system")]);
        assert_eq!(DummyProvider.complete(&req).await.unwrap().text, "[echo] ");
    }
}
