//! Multi-agent insight → critique → synthesis pipeline.
//!
//! # Stages
//!
//! 1. **Insight**: every agent in the roster answers the query from its own role. All calls are
//!    issued together and joined before moving on.
//! 2. **Critique**: every agent reviews the *other* agents' insights. This stage needs the
//!    complete insight set, so it starts only after stage 1 has fully resolved.
//! 3. **Synthesis**: one lead call folds all insights and critiques into an executive summary
//!    and a tailored-room description.
//!
//! Within a stage the calls are independent and may finish in any order; results are collected
//! positionally, so slot `i` always belongs to `AgentRole::ALL[i]`.
//!
//! # Failure policy
//!
//! A failed call never propagates. The slot gets the stage's fallback text and `ok = false`, the
//! failure is logged, and the pipeline carries on with whatever mix of real and fallback content
//! it has. [`Pipeline::run`] therefore has no error path.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use roomcouncil::clients::claude::ClaudeClient;
//! use roomcouncil::pipeline::Pipeline;
//!
//! # async {
//! let client = Arc::new(ClaudeClient::new("sk-ant-..."));
//! let pipeline = Pipeline::new(client);
//!
//! let result = pipeline
//!     .run("How can I design a minimalist yet cozy living room?")
//!     .await;
//!
//! for insight in &result.insights {
//!     println!("[{}] {}", insight.role, insight.content);
//! }
//! println!("{}", result.final_output);
//! # };
//! ```

use crate::agent::{AgentResponse, AgentRole, PipelineResult, Stage, StageOutcome};
use crate::client_wrapper::{ClientError, ClientWrapper, CompletionRequest, TokenUsage};
use crate::clients::claude::{model_to_string, Model};
use crate::event::{EventHandler, PipelineEvent};
use crate::prompts;
use futures_util::future::join_all;
use std::sync::Arc;
use uuid::Uuid;

/// Model and output budget for the two kinds of call the pipeline makes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineConfig {
    /// Model for per-agent insight and critique calls.
    pub agent_model: String,
    /// Output budget for per-agent calls.
    pub agent_max_tokens: usize,
    /// Model for the lead synthesis call.
    pub synthesis_model: String,
    /// Output budget for the synthesis call; larger than the per-agent budget.
    pub synthesis_max_tokens: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        PipelineConfig {
            agent_model: model_to_string(Model::ClaudeHaiku35),
            agent_max_tokens: 300,
            synthesis_model: model_to_string(Model::ClaudeSonnet35),
            synthesis_max_tokens: 1000,
        }
    }
}

/// Trim a raw query, rejecting it if nothing is left.
///
/// ```rust
/// use roomcouncil::pipeline::normalize_query;
///
/// assert_eq!(normalize_query("  cozy room?  "), Some("cozy room?"));
/// assert_eq!(normalize_query(" \n "), None);
/// ```
pub fn normalize_query(raw: &str) -> Option<&str> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed)
    }
}

/// Outcome of one completion call before stage-specific fallback rules apply.
enum CallResult {
    Text {
        text: String,
        usage: Option<TokenUsage>,
    },
    Empty,
    Failed(ClientError),
}

/// The pipeline orchestrator.
///
/// Holds the injected completion client and the call profiles. It keeps no per-run state, so a
/// single instance can serve concurrent runs.
pub struct Pipeline {
    client: Arc<dyn ClientWrapper>,
    config: PipelineConfig,
    event_handler: Option<Arc<dyn EventHandler>>,
}

impl Pipeline {
    /// Create a pipeline with the default call profiles.
    pub fn new(client: Arc<dyn ClientWrapper>) -> Self {
        Pipeline {
            client,
            config: PipelineConfig::default(),
            event_handler: None,
        }
    }

    pub fn with_config(mut self, config: PipelineConfig) -> Self {
        self.config = config;
        self
    }

    /// Attach an observer for [`PipelineEvent`]s.
    pub fn with_event_handler(mut self, handler: Arc<dyn EventHandler>) -> Self {
        self.event_handler = Some(handler);
        self
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    async fn emit(&self, event: PipelineEvent) {
        if let Some(handler) = &self.event_handler {
            handler.on_pipeline_event(&event).await;
        }
    }

    async fn call(&self, request: CompletionRequest) -> CallResult {
        match self.client.send_message(&request).await {
            Ok(response) => match response.first_text() {
                Some(text) => CallResult::Text {
                    text: text.to_string(),
                    usage: response.usage.clone(),
                },
                None => CallResult::Empty,
            },
            Err(err) => CallResult::Failed(err),
        }
    }

    /// Shared body of the insight and critique stages: one call, first text block or fallback.
    async fn agent_call(
        &self,
        run_id: &str,
        stage: Stage,
        role: AgentRole,
        request: CompletionRequest,
        fallback: &str,
    ) -> AgentResponse {
        log::debug!(
            "run {}: {} request for {} agent:\n{}",
            run_id,
            stage,
            role,
            request.system
        );

        let outcome = match self.call(request).await {
            CallResult::Text { text, usage } => {
                self.emit(PipelineEvent::AgentResponded {
                    run_id: run_id.to_string(),
                    stage,
                    role,
                    tokens_used: usage,
                    response_length: text.len(),
                })
                .await;
                StageOutcome::Ok(text)
            }
            CallResult::Empty => StageOutcome::Failed {
                reason: "response contained no text content".to_string(),
            },
            CallResult::Failed(err) => StageOutcome::Failed {
                reason: err.to_string(),
            },
        };

        if let StageOutcome::Failed { reason } = &outcome {
            log::error!(
                "run {}: {} agent {} ({}) failed: {}",
                run_id,
                stage,
                role.agent_id(),
                role,
                reason
            );
            self.emit(PipelineEvent::AgentFailed {
                run_id: run_id.to_string(),
                stage,
                role,
                error: reason.clone(),
            })
            .await;
        }

        AgentResponse::from_outcome(role, outcome, fallback)
    }

    /// Stage 1 for a single agent.
    pub async fn generate_insight(
        &self,
        run_id: &str,
        query: &str,
        role: AgentRole,
    ) -> AgentResponse {
        let request = CompletionRequest::single_turn(
            self.config.agent_model.as_str(),
            self.config.agent_max_tokens,
            prompts::insight_system_prompt(role),
            query,
        );
        self.agent_call(run_id, Stage::Insight, role, request, prompts::INSIGHT_FALLBACK)
            .await
    }

    /// Stage 2 for a single agent. `insights` must be the full stage-1 set.
    pub async fn generate_critique(
        &self,
        run_id: &str,
        query: &str,
        insights: &[AgentResponse],
        role: AgentRole,
    ) -> AgentResponse {
        let request = CompletionRequest::single_turn(
            self.config.agent_model.as_str(),
            self.config.agent_max_tokens,
            prompts::critique_system_prompt(role, insights),
            prompts::critique_user_message(query),
        );
        self.agent_call(run_id, Stage::Critique, role, request, prompts::CRITIQUE_FALLBACK)
            .await
    }

    /// Stage 3. Returns the final text and whether it is real content (`true`) or a fallback.
    pub async fn synthesize(
        &self,
        run_id: &str,
        query: &str,
        insights: &[AgentResponse],
        critiques: &[AgentResponse],
    ) -> (String, bool) {
        let request = CompletionRequest::single_turn(
            self.config.synthesis_model.as_str(),
            self.config.synthesis_max_tokens,
            prompts::synthesis_system_prompt(query, insights, critiques),
            prompts::SYNTHESIS_USER_MESSAGE,
        );
        log::debug!("run {}: synthesis request:\n{}", run_id, request.system);

        match self.call(request).await {
            CallResult::Text { text, usage } => {
                self.emit(PipelineEvent::SynthesisCompleted {
                    run_id: run_id.to_string(),
                    tokens_used: usage,
                    response_length: text.len(),
                })
                .await;
                (text, true)
            }
            CallResult::Empty => {
                log::error!("run {}: synthesis returned no text content", run_id);
                self.emit(PipelineEvent::SynthesisFailed {
                    run_id: run_id.to_string(),
                    error: "response contained no text content".to_string(),
                })
                .await;
                (prompts::SUMMARY_FALLBACK.to_string(), false)
            }
            CallResult::Failed(err) => {
                log::error!("run {}: synthesis failed: {}", run_id, err);
                self.emit(PipelineEvent::SynthesisFailed {
                    run_id: run_id.to_string(),
                    error: err.to_string(),
                })
                .await;
                (prompts::SYNTHESIS_FALLBACK.to_string(), false)
            }
        }
    }

    async fn stage_completed(&self, run_id: &str, stage: Stage, failures: usize) {
        log::info!(
            "run {}: {} stage completed ({} of {} failed)",
            run_id,
            stage,
            failures,
            if stage == Stage::Synthesis { 1 } else { AgentRole::count() }
        );
        self.emit(PipelineEvent::StageCompleted {
            run_id: run_id.to_string(),
            stage,
            failures,
        })
        .await;
    }

    async fn stage_started(&self, run_id: &str, stage: Stage) {
        log::info!("run {}: starting {} stage", run_id, stage);
        self.emit(PipelineEvent::StageStarted {
            run_id: run_id.to_string(),
            stage,
        })
        .await;
    }

    /// Run all three stages for `query` and return the aggregate result.
    ///
    /// Issues `2N + 1` completion calls. Never fails: degraded calls show up as `ok == false`
    /// slots and `degraded == true` on the result.
    pub async fn run(&self, query: &str) -> PipelineResult {
        let run_id = Uuid::new_v4().to_string();

        self.emit(PipelineEvent::RunStarted {
            run_id: run_id.clone(),
            query_preview: query.chars().take(120).collect(),
            agent_count: AgentRole::count(),
        })
        .await;

        self.stage_started(&run_id, Stage::Insight).await;
        let insights: Vec<AgentResponse> = join_all(
            AgentRole::roster().map(|role| self.generate_insight(&run_id, query, role)),
        )
        .await;
        let insight_failures = insights.iter().filter(|r| !r.ok).count();
        self.stage_completed(&run_id, Stage::Insight, insight_failures)
            .await;

        self.stage_started(&run_id, Stage::Critique).await;
        let critiques: Vec<AgentResponse> = join_all(
            AgentRole::roster()
                .map(|role| self.generate_critique(&run_id, query, &insights, role)),
        )
        .await;
        let critique_failures = critiques.iter().filter(|r| !r.ok).count();
        self.stage_completed(&run_id, Stage::Critique, critique_failures)
            .await;

        self.stage_started(&run_id, Stage::Synthesis).await;
        let (final_output, synthesis_ok) = self
            .synthesize(&run_id, query, &insights, &critiques)
            .await;
        self.stage_completed(&run_id, Stage::Synthesis, usize::from(!synthesis_ok))
            .await;

        let degraded = insight_failures > 0 || critique_failures > 0 || !synthesis_ok;
        if degraded {
            log::warn!("run {}: completed with degraded content", run_id);
        }

        self.emit(PipelineEvent::RunCompleted {
            run_id: run_id.clone(),
            degraded,
        })
        .await;

        PipelineResult {
            insights,
            critiques,
            final_output,
            degraded,
        }
    }
}
