//! Model calls wrapped in a span: latency, token usage and outcome are
//! logged and counted for every call.

use std::time::Instant;

use crate::error::AppError;
use crate::llm::{ChatRequest, LlmProvider, LlmResponse};

use super::{EventLog, LogRecord, Metrics, Role, SpanContext, estimate_tokens};

/// A provider bound to one trace. Each [`complete`](Self::complete) call is
/// a child span of `parent`.
pub struct TracedLlm<'a> {
    provider: &'a LlmProvider,
    events: &'a EventLog,
    metrics: &'a Metrics,
    parent: SpanContext,
}

impl<'a> TracedLlm<'a> {
    pub fn new(
        provider: &'a LlmProvider,
        events: &'a EventLog,
        metrics: &'a Metrics,
        parent: SpanContext,
    ) -> Self {
        Self { provider, events, metrics, parent }
    }

    pub fn parent(&self) -> &SpanContext {
        &self.parent
    }

    /// Run `request` and record it under `label` (logged as tool `llm:<label>`).
    ///
    /// Provider failures are logged with an error status and returned as
    /// [`AppError::ExternalService`].
    pub async fn complete(&self, label: &str, request: &ChatRequest) -> Result<LlmResponse, AppError> {
        let span = self.parent.child();
        let tool = format!("llm:{label}");
        let start = Instant::now();
        let result = self.provider.complete(request).await;
        let latency = start.elapsed();

        match result {
            Ok(resp) => {
                let tokens = match resp.usage {
                    Some(u) => u.total(),
                    None => estimate_tokens(&resp.text),
                };
                self.metrics.record_request(true, latency);
                self.metrics.record_tokens(tokens);
                self.events.log_event(
                    &LogRecord::new(
                        &span,
                        Role::Assistant,
                        format!("{label}: respuesta de {}", self.provider.model()),
                    )
                    .with_tool(tool)
                    .with_latency(latency)
                    .with_tokens(Some(tokens)),
                );
                Ok(resp)
            }
            Err(e) => {
                self.metrics.record_request(false, latency);
                self.events.log_event(
                    &LogRecord::new(&span, Role::System, format!("{label}: {e}"))
                        .with_tool(tool)
                        .with_latency(latency)
                        .failed(),
                );
                Err(e.into())
            }
        }
    }
}
