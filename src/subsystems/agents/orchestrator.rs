//! Multi-agent answer: classify → plan → dispatch → fuse.
//!
//! Domains are consulted one after another in their canonical order, so
//! the fusion prompt is identical for identical inputs. Nothing is kept
//! between requests.

use std::collections::BTreeSet;
use std::path::PathBuf;

use tracing::debug;

use crate::error::AppError;
use crate::llm::{ChatMessage, ChatRequest};
use crate::observability::TracedLlm;
use crate::subsystems::rag::Retriever;

use super::agent::{self, DomainAgent, NO_SOURCES_NOTE};
use super::domain::{self, Domain};
use super::prompt::{self, PromptBuilder};

/// Sampling temperature for the fusion call.
pub const FUSION_TEMPERATURE: f32 = 0.4;

/// One agent's labeled contribution.
#[derive(Debug, Clone, PartialEq)]
pub struct Partial {
    pub domain: Domain,
    pub text: String,
    pub sources: Vec<String>,
}

impl Partial {
    /// `"[BECAS]\n<text>"`.
    pub fn labeled(&self) -> String {
        format!("[{}]\n{}", self.domain.as_str().to_uppercase(), self.text)
    }
}

/// Everything one orchestrated request produced.
#[derive(Debug, Clone)]
pub struct OrchestrationOutcome {
    pub domains: BTreeSet<Domain>,
    pub plan: Vec<String>,
    pub partials: Vec<Partial>,
    pub answer: String,
}

#[derive(Debug, Clone)]
pub struct Orchestrator {
    retriever: Retriever,
    prompts_dir: PathBuf,
}

impl Orchestrator {
    pub fn new(retriever: Retriever, prompts_dir: impl Into<PathBuf>) -> Self {
        Self { retriever, prompts_dir: prompts_dir.into() }
    }

    pub fn agent(&self, domain: Domain) -> DomainAgent {
        DomainAgent::for_domain(domain, self.retriever.clone(), &self.prompts_dir)
    }

    pub async fn orchestrate(
        &self,
        question: &str,
        mem_summary: &str,
        llm: &TracedLlm<'_>,
    ) -> Result<String, AppError> {
        Ok(self.orchestrate_detailed(question, mem_summary, llm).await?.answer)
    }

    /// Any agent failure aborts the whole request.
    pub async fn orchestrate_detailed(
        &self,
        question: &str,
        mem_summary: &str,
        llm: &TracedLlm<'_>,
    ) -> Result<OrchestrationOutcome, AppError> {
        let domains = domain::classify(question);
        let plan = domain::make_plan(question, &domains);
        debug!(
            domains = ?domains.iter().map(|d| d.as_str()).collect::<Vec<_>>(),
            steps = plan.len(),
            "orchestrator: plan ready"
        );

        let mut partials = Vec::with_capacity(domains.len());
        for &d in &domains {
            let out = self.agent(d).answer_detailed(question, mem_summary, llm).await?;
            partials.push(Partial { domain: d, text: out.text, sources: out.sources });
        }

        let request = self.fusion_request(&plan, &partials);
        let fused = llm.complete("fusion", &request).await?;
        let answer = ensure_sources_line(fused.text, &partials);

        Ok(OrchestrationOutcome { domains, plan, partials, answer })
    }

    pub fn fusion_request(&self, plan: &[String], partials: &[Partial]) -> ChatRequest {
        let system = PromptBuilder::new(&self.prompts_dir)
            .template(prompt::ORCHESTRATOR_SYSTEM, prompt::ORCHESTRATOR_SYSTEM_FALLBACK)
            .build();
        let body = PromptBuilder::new(&self.prompts_dir)
            .template(prompt::FUSION, prompt::FUSION_FALLBACK)
            .var("plan", plan_bullets(plan))
            .var("partials", partials.iter().map(Partial::labeled).collect::<Vec<_>>().join("\n\n"))
            .build();

        ChatRequest::new(vec![ChatMessage::system(system), ChatMessage::user(body)])
            .with_temperature(FUSION_TEMPERATURE)
    }
}

/// `Fuentes:` at the start of `line`, ignoring markdown emphasis, list and
/// heading markers and case.
fn is_sources_line(line: &str) -> bool {
    let bare: String = line
        .trim_start_matches(|c: char| c.is_whitespace() || matches!(c, '*' | '_' | '#' | '-' | '>'))
        .chars()
        .filter(|c| !matches!(c, '*' | '_'))
        .take("fuentes:".len())
        .collect();
    bare.to_lowercase() == "fuentes:"
}

fn plan_bullets(plan: &[String]) -> String {
    plan.iter().map(|s| format!("- {s}")).collect::<Vec<_>>().join("\n")
}

/// The fused answer must close with a `Fuentes:` line or the verification
/// note. When the model left both out, append one built from the partials.
fn ensure_sources_line(mut answer: String, partials: &[Partial]) -> String {
    let last = answer.lines().rev().find(|l| !l.trim().is_empty()).unwrap_or("");
    if is_sources_line(last) || last.contains(NO_SOURCES_NOTE) {
        return answer;
    }
    let all: BTreeSet<String> = partials.iter().flat_map(|p| p.sources.iter().cloned()).collect();
    let all: Vec<String> = all.into_iter().collect();
    answer.push_str("\n\n");
    match agent::sources_line(&all) {
        Some(line) => answer.push_str(&line),
        None => answer.push_str(NO_SOURCES_NOTE),
    }
    answer
}
