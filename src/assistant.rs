//! One conversational turn, end to end.
//!
//! ```text
//! question ─▶ validate ─▶ rate limit ─▶ request span (user)
//!                                           │
//!                       simple: general agent │ orchestrated: classify/plan/agents/fuse
//!                                           ▼
//!                                  completion span (assistant) ─▶ reply
//! ```
//!
//! [`Assistant::ask`] returns errors; [`Assistant::respond`] turns every
//! error into a message for the user so the console never stops on one.

use std::time::Instant;

use tracing::{debug, info};

use crate::config::{AnswerMode, Config};
use crate::error::AppError;
use crate::llm::{LlmProvider, providers};
use crate::observability::{EventLog, LogRecord, Metrics, Role, SpanContext, TracedLlm};
use crate::subsystems::agents::{DomainAgent, Orchestrator};
use crate::subsystems::guard::{self, RateLimiter};
use crate::subsystems::memory::SessionMemory;
use crate::subsystems::rag::Retriever;

/// Text to show for one turn.
#[derive(Debug, Clone, PartialEq)]
pub struct Reply {
    pub text: String,
    /// `false` when the text is a rejection or error message.
    pub answered: bool,
}

pub struct Assistant {
    config: Config,
    provider: LlmProvider,
    retriever: Retriever,
    orchestrator: Orchestrator,
    limiter: RateLimiter,
    events: EventLog,
    metrics: Metrics,
}

impl Assistant {
    pub fn new(config: Config, provider: LlmProvider, events: EventLog, metrics: Metrics) -> Self {
        let retriever = Retriever::from_config(&config.retrieval);
        let orchestrator = Orchestrator::new(retriever.clone(), &config.prompts_dir);
        let limiter = RateLimiter::per_minute(config.guard.rate_limit_per_min);
        Self { config, provider, retriever, orchestrator, limiter, events, metrics }
    }

    /// Build the provider and event sink named in `config`.
    pub fn from_config(config: Config) -> Result<Self, AppError> {
        let provider = providers::build(&config.llm, config.llm_api_key.clone())
            .map_err(|e| AppError::Config(e.to_string()))?;
        let events = EventLog::new(&config.observability.event_log);
        Ok(Self::new(config, provider, events, Metrics::new()))
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    pub fn events(&self) -> &EventLog {
        &self.events
    }

    /// Questions admitted in the current rate window, and the window's limit.
    pub fn rate_window(&self) -> (usize, usize) {
        (self.limiter.in_window(Instant::now()), self.limiter.limit())
    }

    /// Answer `question` in a new trace. Guard rejections and model
    /// failures come back as errors.
    pub async fn ask(&mut self, question: &str, memory: &SessionMemory) -> Result<String, AppError> {
        let root = SpanContext::root();
        self.ask_in(&root, question, memory).await
    }

    /// Like [`ask`](Self::ask), but always yields text for the user. The
    /// failure is logged to the event sink first.
    pub async fn respond(&mut self, question: &str, memory: &SessionMemory) -> String {
        self.reply(question, memory).await.text
    }

    /// [`respond`](Self::respond), also telling whether the question was
    /// actually answered.
    pub async fn reply(&mut self, question: &str, memory: &SessionMemory) -> Reply {
        let root = SpanContext::root();
        match self.ask_in(&root, question, memory).await {
            Ok(text) => Reply { text, answered: true },
            Err(e) => {
                self.log_failure(&root, &e);
                Reply { text: self.user_message(&e), answered: false }
            }
        }
    }

    async fn ask_in(
        &mut self,
        root: &SpanContext,
        question: &str,
        memory: &SessionMemory,
    ) -> Result<String, AppError> {
        let question = guard::validate_input(question, self.config.guard.max_input_length)?;
        self.limiter.check()?;

        let start = Instant::now();
        self.events.log_event(&LogRecord::new(root, Role::User, question).with_tool("request"));

        let mem_context = memory.prompt_context(self.config.summary_chars);
        let llm = TracedLlm::new(&self.provider, &self.events, &self.metrics, root.clone());

        let answer = match self.config.mode {
            AnswerMode::Simple => {
                DomainAgent::general(
                    self.retriever.clone(),
                    &self.config.prompts_dir,
                    self.config.retrieval.top_k,
                )
                .answer(question, &mem_context, &llm)
                .await?
            }
            AnswerMode::Orchestrated => {
                let outcome = self.orchestrator.orchestrate_detailed(question, &mem_context, &llm).await?;
                info!(
                    trace_id = %root.trace_id,
                    domains = ?outcome.domains.iter().map(|d| d.as_str()).collect::<Vec<_>>(),
                    "orchestrated turn"
                );
                outcome.answer
            }
        };

        self.events.log_event(
            &LogRecord::new(&root.child(), Role::Assistant, answer.as_str())
                .with_tool("respond")
                .with_latency(start.elapsed()),
        );
        Ok(answer)
    }

    fn log_failure(&self, root: &SpanContext, err: &AppError) {
        let record = match err {
            // Rejected before the request span was written: the rejection is the root.
            AppError::InvalidInput(_) | AppError::RateLimitExceeded { .. } => {
                self.metrics.record_rejection();
                LogRecord::new(root, Role::System, err.to_string()).with_tool("guard")
            }
            _ => LogRecord::new(&root.child(), Role::System, err.to_string()).with_tool("respond"),
        };
        debug!(error = %err, "turn failed");
        self.events.log_event(&record.failed());
    }

    fn user_message(&self, err: &AppError) -> String {
        match err {
            AppError::InvalidInput(_) => format!(
                "⚠️ No pude procesar tu consulta. Escribe una pregunta de hasta {} caracteres sobre becas, trámites o reglamento.",
                self.config.guard.max_input_length
            ),
            AppError::RateLimitExceeded { limit, .. } => format!(
                "⏳ Alcanzaste el límite de {limit} consultas por minuto. Intenta nuevamente en unos segundos."
            ),
            AppError::ExternalService(_) => "❌ El servicio de IA no está disponible en este momento. \
                Intenta más tarde o consulta el sitio oficial."
                .to_string(),
            other => format!("❌ Error inesperado: {other}"),
        }
    }
}
