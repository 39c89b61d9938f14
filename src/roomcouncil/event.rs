//! Pipeline event system.
//!
//! Implement [`EventHandler`] to receive [`PipelineEvent`]s while a
//! [`Pipeline`](crate::pipeline::Pipeline) runs. The handler is optional and purely
//! observational: it cannot alter content or ordering, and a run behaves identically with or
//! without one.
//!
//! # Event Flow
//!
//! ```text
//! RunStarted { agent_count: 4 }
//!   └─ StageStarted { stage: Insight }
//!       ├─ AgentResponded / AgentFailed   (one per agent, completion order)
//!   └─ StageCompleted { stage: Insight, failures }
//!   └─ StageStarted { stage: Critique }
//!       ├─ AgentResponded / AgentFailed
//!   └─ StageCompleted { stage: Critique, failures }
//!   └─ StageStarted { stage: Synthesis }
//!       └─ SynthesisCompleted / SynthesisFailed
//!   └─ StageCompleted { stage: Synthesis, failures }
//! RunCompleted { degraded }
//! ```
//!
//! # Example
//!
//! ```rust
//! use async_trait::async_trait;
//! use roomcouncil::event::{EventHandler, PipelineEvent};
//!
//! struct Printer;
//!
//! #[async_trait]
//! impl EventHandler for Printer {
//!     async fn on_pipeline_event(&self, event: &PipelineEvent) {
//!         if let PipelineEvent::AgentFailed { role, stage, error, .. } = event {
//!             eprintln!("{} failed during {}: {}", role, stage, error);
//!         }
//!     }
//! }
//! ```

use crate::agent::{AgentRole, Stage};
use crate::client_wrapper::TokenUsage;
use async_trait::async_trait;

/// Events emitted during [`Pipeline::run`](crate::pipeline::Pipeline::run).
///
/// Every variant carries the `run_id` so handlers shared between concurrent runs can tell
/// them apart.
#[derive(Debug, Clone)]
pub enum PipelineEvent {
    /// A run began.
    RunStarted {
        run_id: String,
        /// First ~120 characters of the query.
        query_preview: String,
        agent_count: usize,
    },

    /// A stage is about to issue its calls.
    StageStarted { run_id: String, stage: Stage },

    /// An agent's call produced usable text.
    AgentResponded {
        run_id: String,
        stage: Stage,
        role: AgentRole,
        tokens_used: Option<TokenUsage>,
        response_length: usize,
    },

    /// An agent's call failed and its slot fell back to placeholder text.
    AgentFailed {
        run_id: String,
        stage: Stage,
        role: AgentRole,
        error: String,
    },

    /// Every call of a stage has resolved.
    StageCompleted {
        run_id: String,
        stage: Stage,
        /// How many slots in this stage fell back.
        failures: usize,
    },

    /// The lead call produced usable text.
    SynthesisCompleted {
        run_id: String,
        tokens_used: Option<TokenUsage>,
        response_length: usize,
    },

    /// The lead call failed or returned no text.
    SynthesisFailed { run_id: String, error: String },

    /// The run finished; a result is always produced.
    RunCompleted { run_id: String, degraded: bool },
}

impl PipelineEvent {
    pub fn run_id(&self) -> &str {
        match self {
            PipelineEvent::RunStarted { run_id, .. }
            | PipelineEvent::StageStarted { run_id, .. }
            | PipelineEvent::AgentResponded { run_id, .. }
            | PipelineEvent::AgentFailed { run_id, .. }
            | PipelineEvent::StageCompleted { run_id, .. }
            | PipelineEvent::SynthesisCompleted { run_id, .. }
            | PipelineEvent::SynthesisFailed { run_id, .. }
            | PipelineEvent::RunCompleted { run_id, .. } => run_id,
        }
    }
}

/// Receives pipeline events. The default implementation ignores them.
#[async_trait]
pub trait EventHandler: Send + Sync {
    async fn on_pipeline_event(&self, _event: &PipelineEvent) {}
}
