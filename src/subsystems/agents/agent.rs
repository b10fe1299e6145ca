//! Domain agent: retrieval-grounded answer for one institutional domain.

use std::path::PathBuf;

use crate::error::AppError;
use crate::llm::{ChatMessage, ChatRequest};
use crate::observability::TracedLlm;
use crate::subsystems::rag::{self, Retriever};

use super::domain::Domain;
use super::prompt::{self, PromptBuilder};

/// Chunks retrieved per agent call.
pub const AGENT_TOP_K: usize = 3;
/// Sampling temperature for agent answers.
pub const AGENT_TEMPERATURE: f32 = 0.5;

pub const NO_SOURCES_NOTE: &str =
    "*No se encontraron fragmentos locales; valida en el sitio oficial.*";

/// An agent's reply plus the files it was grounded on.
#[derive(Debug, Clone, PartialEq)]
pub struct AgentAnswer {
    /// Model text followed by the `Fuentes:` line or [`NO_SOURCES_NOTE`].
    pub text: String,
    /// Distinct source file names, sorted.
    pub sources: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct DomainAgent {
    label: String,
    hint: String,
    top_k: usize,
    retriever: Retriever,
    prompts_dir: PathBuf,
}

impl DomainAgent {
    /// Agent for `domain`, biased toward files named after its hint.
    pub fn for_domain(domain: Domain, retriever: Retriever, prompts_dir: impl Into<PathBuf>) -> Self {
        Self {
            label: domain.as_str().to_string(),
            hint: domain.retrieval_hint().to_string(),
            top_k: AGENT_TOP_K,
            retriever,
            prompts_dir: prompts_dir.into(),
        }
    }

    /// Unbiased agent used for the single-call path.
    pub fn general(retriever: Retriever, prompts_dir: impl Into<PathBuf>, top_k: usize) -> Self {
        Self {
            label: "general".to_string(),
            hint: String::new(),
            top_k,
            retriever,
            prompts_dir: prompts_dir.into(),
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn hint(&self) -> &str {
        &self.hint
    }

    pub async fn answer(
        &self,
        question: &str,
        mem_summary: &str,
        llm: &TracedLlm<'_>,
    ) -> Result<String, AppError> {
        Ok(self.answer_detailed(question, mem_summary, llm).await?.text)
    }

    pub async fn answer_detailed(
        &self,
        question: &str,
        mem_summary: &str,
        llm: &TracedLlm<'_>,
    ) -> Result<AgentAnswer, AppError> {
        let hits = self.retriever.retrieve(question, self.top_k, &self.hint);
        let sources = rag::sources(&hits);
        let request = self.build_request(question, mem_summary, &rag::format_context(&hits));

        let resp = llm.complete(&self.label, &request).await?;
        Ok(AgentAnswer { text: with_sources_line(resp.text, &sources), sources })
    }

    /// System instructions, memory summary, then context + question.
    pub fn build_request(&self, question: &str, mem_summary: &str, context: &str) -> ChatRequest {
        let system = PromptBuilder::new(&self.prompts_dir)
            .template(prompt::AGENT_SYSTEM, prompt::AGENT_SYSTEM_FALLBACK)
            .build();
        let body = PromptBuilder::new(&self.prompts_dir)
            .template(prompt::AGENT_QUESTION, prompt::AGENT_QUESTION_FALLBACK)
            .var("context", context)
            .var("question", question)
            .build();

        ChatRequest::new(vec![
            ChatMessage::system(system),
            ChatMessage::user(format!("Memoria de sesión (resumen): {mem_summary}")),
            ChatMessage::user(body),
        ])
        .with_temperature(AGENT_TEMPERATURE)
    }
}

/// `Fuentes: [a], [b]` for the given sources, or `None` when there are none.
pub fn sources_line(sources: &[String]) -> Option<String> {
    if sources.is_empty() {
        return None;
    }
    let cited = sources.iter().map(|s| format!("[{s}]")).collect::<Vec<_>>().join(", ");
    Some(format!("Fuentes: {cited}"))
}

fn with_sources_line(mut text: String, sources: &[String]) -> String {
    text.push_str("\n\n");
    match sources_line(sources) {
        Some(line) => text.push_str(&line),
        None => text.push_str(NO_SOURCES_NOTE),
    }
    text
}
