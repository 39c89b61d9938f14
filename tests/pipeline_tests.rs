use async_trait::async_trait;
use roomcouncil::agent::{AgentRole, Stage};
use roomcouncil::client_wrapper::{
    ClientError, ClientWrapper, CompletionRequest, CompletionResponse, ContentBlock,
};
use roomcouncil::event::{EventHandler, PipelineEvent};
use roomcouncil::pipeline::{Pipeline, PipelineConfig};
use roomcouncil::prompts::{
    CRITIQUE_FALLBACK, INSIGHT_FALLBACK, ROOM_HEADING, SUMMARY_FALLBACK, SUMMARY_HEADING,
    SYNTHESIS_FALLBACK,
};
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

const COZY_QUERY: &str = "How can I design a minimalist yet cozy living room?";

/// Work out which stage and agent a request belongs to from its system prompt.
fn classify(request: &CompletionRequest) -> (Stage, Option<AgentRole>) {
    if request.system.contains("Lead AI Architect") {
        return (Stage::Synthesis, None);
    }
    let stage = if request.system.contains("Your specific role is:") {
        Stage::Insight
    } else {
        Stage::Critique
    };
    let role = AgentRole::roster()
        .find(|role| request.system.contains(&format!("role is: {}:", role.label())));
    (stage, role)
}

fn insight_text(role: AgentRole) -> String {
    format!("INSIGHT<{}>", role.label())
}

fn critique_text(role: AgentRole) -> String {
    format!("CRITIQUE<{}>", role.label())
}

fn synthesis_text() -> String {
    format!(
        "{}\nKeep it light and warm.\n\n{}\nA pale oak floor, one deep sofa, linen curtains.",
        SUMMARY_HEADING, ROOM_HEADING
    )
}

/// Answers every call deterministically and records what it was asked.
#[derive(Default)]
struct ScriptedClient {
    calls: Mutex<Vec<CompletionRequest>>,
    failures: HashSet<(Stage, AgentRole)>,
    empty_for: HashSet<(Stage, AgentRole)>,
    fail_synthesis: bool,
    empty_synthesis: bool,
}

impl ScriptedClient {
    fn failing(failures: &[(Stage, AgentRole)]) -> Self {
        ScriptedClient {
            failures: failures.iter().copied().collect(),
            ..Default::default()
        }
    }

    fn calls(&self) -> Vec<CompletionRequest> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ClientWrapper for ScriptedClient {
    async fn send_message(
        &self,
        request: &CompletionRequest,
    ) -> Result<CompletionResponse, ClientError> {
        self.calls.lock().unwrap().push(request.clone());

        match classify(request) {
            (Stage::Synthesis, _) => {
                if self.fail_synthesis {
                    Err(ClientError::Http("connection reset".into()))
                } else if self.empty_synthesis {
                    Ok(CompletionResponse::default())
                } else {
                    Ok(CompletionResponse::from_text(synthesis_text()))
                }
            }
            (stage, Some(role)) => {
                if self.failures.contains(&(stage, role)) {
                    return Err(ClientError::Status {
                        status: 529,
                        body: "overloaded".into(),
                    });
                }
                if self.empty_for.contains(&(stage, role)) {
                    return Ok(CompletionResponse {
                        content: vec![ContentBlock::Other {
                            kind: "thinking".into(),
                        }],
                        ..Default::default()
                    });
                }
                let text = match stage {
                    Stage::Insight => insight_text(role),
                    _ => critique_text(role),
                };
                Ok(CompletionResponse::from_text(text))
            }
            (_, None) => Err(ClientError::Decode("unrecognised prompt".into())),
        }
    }
}

fn every_agent_call() -> Vec<(Stage, AgentRole)> {
    AgentRole::roster()
        .flat_map(|role| [(Stage::Insight, role), (Stage::Critique, role)])
        .collect()
}

#[tokio::test]
async fn test_run_produces_one_slot_per_agent() {
    let client = Arc::new(ScriptedClient::default());
    let pipeline = Pipeline::new(client.clone());

    let result = pipeline.run(COZY_QUERY).await;

    assert_eq!(result.insights.len(), AgentRole::count());
    assert_eq!(result.critiques.len(), AgentRole::count());
    for (insight, critique) in result.insights.iter().zip(&result.critiques) {
        assert_eq!(insight.agent_id, critique.agent_id);
        assert_eq!(insight.role, critique.role);
    }
    for (index, role) in AgentRole::roster().enumerate() {
        assert_eq!(result.insights[index].agent_id, index);
        assert_eq!(result.insights[index].content, insight_text(role));
        assert_eq!(result.critiques[index].content, critique_text(role));
    }
    assert!(!result.degraded);
    assert_eq!(client.calls().len(), 2 * AgentRole::count() + 1);
}

#[tokio::test]
async fn test_cozy_living_room_scenario() {
    let pipeline = Pipeline::new(Arc::new(ScriptedClient::default()));

    let result = pipeline.run(COZY_QUERY).await;

    let expected: HashSet<&str> = ["Analytical", "Creative", "Critical", "Practical"]
        .into_iter()
        .collect();
    let insight_roles: HashSet<&str> = result.insights.iter().map(|r| r.role.as_str()).collect();
    let critique_roles: HashSet<&str> = result.critiques.iter().map(|r| r.role.as_str()).collect();
    assert_eq!(insight_roles, expected);
    assert_eq!(critique_roles, expected);

    assert!(result.final_output.contains(SUMMARY_HEADING));
    assert!(result.final_output.contains(ROOM_HEADING));
}

#[tokio::test]
async fn test_single_failure_is_isolated() {
    let client = Arc::new(ScriptedClient::failing(&[(
        Stage::Insight,
        AgentRole::Creative,
    )]));
    let pipeline = Pipeline::new(client);

    let result = pipeline.run(COZY_QUERY).await;

    let creative = AgentRole::Creative.agent_id();
    assert_eq!(result.insights[creative].content, INSIGHT_FALLBACK);
    assert!(!result.insights[creative].ok);

    for role in AgentRole::roster().filter(|r| *r != AgentRole::Creative) {
        let slot = &result.insights[role.agent_id()];
        assert_eq!(slot.content, insight_text(role));
        assert!(slot.ok);
    }
    for role in AgentRole::roster() {
        assert_eq!(result.critiques[role.agent_id()].content, critique_text(role));
    }
    assert!(result.degraded);
    assert!(result.final_output.contains(SUMMARY_HEADING));
}

#[tokio::test]
async fn test_critique_failure_uses_critique_fallback() {
    let client = Arc::new(ScriptedClient::failing(&[(
        Stage::Critique,
        AgentRole::Practical,
    )]));
    let result = Pipeline::new(client).run(COZY_QUERY).await;

    assert_eq!(
        result.critiques[AgentRole::Practical.agent_id()].content,
        CRITIQUE_FALLBACK
    );
    assert!(result.insights.iter().all(|r| r.ok));
    assert!(result.degraded);
}

#[tokio::test]
async fn test_response_without_text_falls_back() {
    let client = Arc::new(ScriptedClient {
        empty_for: [(Stage::Insight, AgentRole::Analytical)].into_iter().collect(),
        ..Default::default()
    });
    let result = Pipeline::new(client).run(COZY_QUERY).await;

    assert_eq!(result.insights[0].content, INSIGHT_FALLBACK);
    assert!(!result.insights[0].ok);
}

#[tokio::test]
async fn test_all_agent_failures_still_synthesize_degraded_content() {
    let client = Arc::new(ScriptedClient::failing(&every_agent_call()));
    let pipeline = Pipeline::new(client.clone());

    let result = pipeline.run(COZY_QUERY).await;

    assert!(result.insights.iter().all(|r| r.content == INSIGHT_FALLBACK));
    assert!(result.critiques.iter().all(|r| r.content == CRITIQUE_FALLBACK));
    assert!(!result.final_output.is_empty());
    assert!(result.degraded);

    let calls = client.calls();
    let synthesis = calls.last().unwrap();
    assert_eq!(classify(synthesis).0, Stage::Synthesis);
    assert!(synthesis.system.contains(INSIGHT_FALLBACK));
    assert!(synthesis.system.contains(CRITIQUE_FALLBACK));
}

#[tokio::test]
async fn test_everything_failing_yields_synthesis_fallback() {
    let client = Arc::new(ScriptedClient {
        failures: every_agent_call().into_iter().collect(),
        fail_synthesis: true,
        ..Default::default()
    });
    let result = Pipeline::new(client).run(COZY_QUERY).await;

    assert_eq!(result.final_output, SYNTHESIS_FALLBACK);
    assert_eq!(result.insights.len(), AgentRole::count());
    assert_eq!(result.critiques.len(), AgentRole::count());
    assert!(result.degraded);
}

#[tokio::test]
async fn test_empty_synthesis_yields_summary_fallback() {
    let client = Arc::new(ScriptedClient {
        empty_synthesis: true,
        ..Default::default()
    });
    let result = Pipeline::new(client).run(COZY_QUERY).await;

    assert_eq!(result.final_output, SUMMARY_FALLBACK);
    assert!(result.degraded);
    assert!(result.insights.iter().all(|r| r.ok));
}

#[tokio::test]
async fn test_stage_prompts_respect_data_dependencies() {
    let client = Arc::new(ScriptedClient::default());
    Pipeline::new(client.clone()).run(COZY_QUERY).await;

    let calls = client.calls();
    let n = AgentRole::count();
    assert_eq!(calls.len(), 2 * n + 1);

    // Stage 1: every call is an insight call that carries no stage-2 content.
    for call in &calls[..n] {
        assert_eq!(classify(call).0, Stage::Insight);
        assert_eq!(call.messages[0].content, COZY_QUERY);
        assert!(!call.system.contains("CRITIQUE<"));
        assert!(!call.system.contains("INSIGHT<"));
    }

    // Stage 2: every other agent's insight, never the caller's own.
    for call in &calls[n..2 * n] {
        let (stage, role) = classify(call);
        assert_eq!(stage, Stage::Critique);
        let own = role.unwrap();
        for other in AgentRole::roster() {
            let present = call.system.contains(&insight_text(other));
            assert_eq!(present, other != own, "{} critique prompt", own);
        }
        assert!(!call.system.contains("CRITIQUE<"));
        assert_eq!(
            call.messages[0].content,
            format!("Original Query: {}", COZY_QUERY)
        );
    }

    // Stage 3: the full union.
    let synthesis = &calls[2 * n];
    assert_eq!(classify(synthesis).0, Stage::Synthesis);
    for role in AgentRole::roster() {
        assert!(synthesis.system.contains(&insight_text(role)));
        assert!(synthesis.system.contains(&critique_text(role)));
    }
    assert!(synthesis.system.contains(COZY_QUERY));
}

#[tokio::test]
async fn test_call_profiles_follow_config() {
    let client = Arc::new(ScriptedClient::default());
    let config = PipelineConfig {
        agent_model: "small-model".into(),
        agent_max_tokens: 120,
        synthesis_model: "big-model".into(),
        synthesis_max_tokens: 900,
    };
    Pipeline::new(client.clone())
        .with_config(config)
        .run(COZY_QUERY)
        .await;

    for call in client.calls() {
        if classify(&call).0 == Stage::Synthesis {
            assert_eq!(call.model, "big-model");
            assert_eq!(call.max_tokens, 900);
        } else {
            assert_eq!(call.model, "small-model");
            assert_eq!(call.max_tokens, 120);
        }
    }
}

#[tokio::test]
async fn test_default_profiles() {
    let config = PipelineConfig::default();
    assert_eq!(config.agent_model, "claude-3-5-haiku-20241022");
    assert_eq!(config.agent_max_tokens, 300);
    assert_eq!(config.synthesis_model, "claude-3-5-sonnet-20240620");
    assert!(config.synthesis_max_tokens > config.agent_max_tokens);
}

/// Delays each agent call so later roster entries finish first, and tracks concurrency.
struct SlowClient {
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    insights_finished: AtomicUsize,
    critique_started_early: AtomicUsize,
}

#[async_trait]
impl ClientWrapper for SlowClient {
    async fn send_message(
        &self,
        request: &CompletionRequest,
    ) -> Result<CompletionResponse, ClientError> {
        let (stage, role) = classify(request);

        if stage == Stage::Critique
            && self.insights_finished.load(Ordering::SeqCst) < AgentRole::count()
        {
            self.critique_started_early.fetch_add(1, Ordering::SeqCst);
        }

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        let delay = role
            .map(|r| (AgentRole::count() - r.agent_id()) as u64 * 10)
            .unwrap_or(0);
        tokio::time::sleep(Duration::from_millis(delay)).await;

        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        let text = match (stage, role) {
            (Stage::Insight, Some(role)) => {
                self.insights_finished.fetch_add(1, Ordering::SeqCst);
                insight_text(role)
            }
            (Stage::Critique, Some(role)) => critique_text(role),
            _ => synthesis_text(),
        };
        Ok(CompletionResponse::from_text(text))
    }
}

#[tokio::test]
async fn test_stage_calls_run_concurrently_and_collect_in_roster_order() {
    let client = Arc::new(SlowClient {
        in_flight: AtomicUsize::new(0),
        max_in_flight: AtomicUsize::new(0),
        insights_finished: AtomicUsize::new(0),
        critique_started_early: AtomicUsize::new(0),
    });

    let result = Pipeline::new(client.clone()).run(COZY_QUERY).await;

    assert_eq!(client.max_in_flight.load(Ordering::SeqCst), AgentRole::count());
    assert_eq!(client.critique_started_early.load(Ordering::SeqCst), 0);
    for (index, role) in AgentRole::roster().enumerate() {
        assert_eq!(result.insights[index].content, insight_text(role));
        assert_eq!(result.critiques[index].content, critique_text(role));
    }
}

#[derive(Default)]
struct RecordingHandler {
    events: Mutex<Vec<PipelineEvent>>,
}

#[async_trait]
impl EventHandler for RecordingHandler {
    async fn on_pipeline_event(&self, event: &PipelineEvent) {
        self.events.lock().unwrap().push(event.clone());
    }
}

#[tokio::test]
async fn test_events_bracket_each_stage() {
    let handler = Arc::new(RecordingHandler::default());
    let client = Arc::new(ScriptedClient::failing(&[(
        Stage::Critique,
        AgentRole::Analytical,
    )]));
    let result = Pipeline::new(client)
        .with_event_handler(handler.clone())
        .run(COZY_QUERY)
        .await;
    assert!(result.degraded);

    let events = handler.events.lock().unwrap().clone();
    let run_id = events[0].run_id().to_string();
    assert!(events.iter().all(|e| e.run_id() == run_id));

    assert!(matches!(
        events.first(),
        Some(PipelineEvent::RunStarted { agent_count: 4, .. })
    ));
    assert!(matches!(
        events.last(),
        Some(PipelineEvent::RunCompleted { degraded: true, .. })
    ));

    let stage_markers: Vec<String> = events
        .iter()
        .filter_map(|e| match e {
            PipelineEvent::StageStarted { stage, .. } => Some(format!("start:{}", stage)),
            PipelineEvent::StageCompleted {
                stage, failures, ..
            } => Some(format!("done:{}:{}", stage, failures)),
            _ => None,
        })
        .collect();
    assert_eq!(
        stage_markers,
        vec![
            "start:insight",
            "done:insight:0",
            "start:critique",
            "done:critique:1",
            "start:synthesis",
            "done:synthesis:0",
        ]
    );

    let failed: Vec<_> = events
        .iter()
        .filter_map(|e| match e {
            PipelineEvent::AgentFailed { stage, role, .. } => Some((*stage, *role)),
            _ => None,
        })
        .collect();
    assert_eq!(failed, vec![(Stage::Critique, AgentRole::Analytical)]);

    let responded = events
        .iter()
        .filter(|e| matches!(e, PipelineEvent::AgentResponded { .. }))
        .count();
    assert_eq!(responded, 2 * AgentRole::count() - 1);
    assert!(events
        .iter()
        .any(|e| matches!(e, PipelineEvent::SynthesisCompleted { .. })));
}

#[tokio::test]
async fn test_runs_are_independent() {
    let handler = Arc::new(RecordingHandler::default());
    let pipeline = Pipeline::new(Arc::new(ScriptedClient::default()))
        .with_event_handler(handler.clone());

    let first = pipeline.run(COZY_QUERY).await;
    let second = pipeline.run(COZY_QUERY).await;
    assert_eq!(first.insights.len(), second.insights.len());

    let run_ids: HashSet<String> = handler
        .events
        .lock()
        .unwrap()
        .iter()
        .map(|e| e.run_id().to_string())
        .collect();
    assert_eq!(run_ids.len(), 2);
}
