//! Agents subsystem: domain classification, per-domain agents and the
//! orchestrator that fuses their answers.
//!
//! Routing is keyword based (see [`domain::classify`]); each matched
//! domain gets a [`DomainAgent`] with its own retrieval hint, and the
//! [`Orchestrator`] runs them in canonical order before one fusion call.

pub mod agent;
pub mod domain;
pub mod orchestrator;
pub mod prompt;

pub use agent::{AgentAnswer, DomainAgent};
pub use domain::{Domain, classify, make_plan};
pub use orchestrator::{OrchestrationOutcome, Orchestrator, Partial};
