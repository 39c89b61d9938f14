//! The fixed agent roster and the per-stage response types.
//!
//! Agents are not created at runtime: the roster is the four [`AgentRole`] variants, iterated in
//! declaration order. An agent's ordinal in [`AgentRole::ALL`] is its `agent_id`, and the same
//! roster is walked for both the insight and the critique stage so their slots always line up.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A fixed persona that frames one completion call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AgentRole {
    Analytical,
    Creative,
    Critical,
    Practical,
}

impl AgentRole {
    /// The full roster, in index order.
    pub const ALL: [AgentRole; 4] = [
        AgentRole::Analytical,
        AgentRole::Creative,
        AgentRole::Critical,
        AgentRole::Practical,
    ];

    /// Iterate the roster by value.
    ///
    /// ```rust
    /// use roomcouncil::agent::AgentRole;
    ///
    /// let labels: Vec<&str> = AgentRole::roster().map(|r| r.label()).collect();
    /// assert_eq!(labels, ["Analytical", "Creative", "Critical", "Practical"]);
    /// ```
    pub fn roster() -> impl Iterator<Item = AgentRole> {
        Self::ALL.into_iter()
    }

    /// Number of agents in the roster.
    pub const fn count() -> usize {
        Self::ALL.len()
    }

    /// Ordinal of this role in the roster.
    pub fn agent_id(self) -> usize {
        match self {
            AgentRole::Analytical => 0,
            AgentRole::Creative => 1,
            AgentRole::Critical => 2,
            AgentRole::Practical => 3,
        }
    }

    /// Short label shown to other agents and returned to callers.
    pub fn label(self) -> &'static str {
        match self {
            AgentRole::Analytical => "Analytical",
            AgentRole::Creative => "Creative",
            AgentRole::Critical => "Critical",
            AgentRole::Practical => "Practical",
        }
    }

    /// The role-instruction text used as a prompt prefix.
    pub fn focus(self) -> &'static str {
        match self {
            AgentRole::Analytical => "Focus on facts, data, and logical structure.",
            AgentRole::Creative => {
                "Focus on innovative ideas, metaphors, and out-of-the-box thinking."
            }
            AgentRole::Critical => "Focus on potential flaws, risks, and counter-arguments.",
            AgentRole::Practical => {
                "Focus on actionable steps, implementation details, and feasibility."
            }
        }
    }

    /// `"<Label>: <focus>"`, the form embedded in system prompts.
    pub fn instruction(self) -> String {
        format!("{}: {}", self.label(), self.focus())
    }
}

impl fmt::Display for AgentRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Which pipeline stage a call belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Insight,
    Critique,
    Synthesis,
}

impl Stage {
    pub fn name(self) -> &'static str {
        match self {
            Stage::Insight => "insight",
            Stage::Critique => "critique",
            Stage::Synthesis => "synthesis",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Tagged result of a single stage call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StageOutcome {
    Ok(String),
    Failed { reason: String },
}

impl StageOutcome {
    pub fn is_ok(&self) -> bool {
        matches!(self, StageOutcome::Ok(_))
    }

    /// Collapse into displayable text, substituting `fallback` on failure.
    pub fn content_or(self, fallback: &str) -> String {
        match self {
            StageOutcome::Ok(text) => text,
            StageOutcome::Failed { .. } => fallback.to_string(),
        }
    }
}

/// One agent's output for one stage.
///
/// An agent's insight and critique are distinct values; nothing is mutated between stages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentResponse {
    pub agent_id: usize,
    pub role: String,
    pub content: String,
    /// `false` when `content` is the stage's fallback text.
    pub ok: bool,
}

impl AgentResponse {
    /// Build a response from a stage outcome, substituting `fallback` if the call failed.
    pub fn from_outcome(role: AgentRole, outcome: StageOutcome, fallback: &str) -> Self {
        let ok = outcome.is_ok();
        AgentResponse {
            agent_id: role.agent_id(),
            role: role.label().to_string(),
            content: outcome.content_or(fallback),
            ok,
        }
    }
}

/// The aggregate returned by [`Pipeline::run`](crate::pipeline::Pipeline::run).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineResult {
    pub insights: Vec<AgentResponse>,
    pub critiques: Vec<AgentResponse>,
    pub final_output: String,
    /// `true` if any insight, critique or the synthesis fell back to placeholder text.
    pub degraded: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_agent_ids_match_roster_positions() {
        for (index, role) in AgentRole::roster().enumerate() {
            assert_eq!(role.agent_id(), index);
        }
        assert_eq!(AgentRole::count(), 4);
    }

    #[test]
    fn test_instruction_format() {
        assert_eq!(
            AgentRole::Critical.instruction(),
            "Critical: Focus on potential flaws, risks, and counter-arguments."
        );
    }

    #[test]
    fn test_from_outcome_failed_uses_fallback() {
        let response = AgentResponse::from_outcome(
            AgentRole::Creative,
            StageOutcome::Failed {
                reason: "timeout".into(),
            },
            "Error generating insight.",
        );
        assert_eq!(response.agent_id, 1);
        assert_eq!(response.role, "Creative");
        assert_eq!(response.content, "Error generating insight.");
        assert!(!response.ok);
    }

    #[test]
    fn test_agent_response_serializes_camel_case() {
        let response =
            AgentResponse::from_outcome(AgentRole::Practical, StageOutcome::Ok("x".into()), "-");
        let value = serde_json::to_value(&response).unwrap();
        assert_eq!(value["agentId"], 3);
        assert_eq!(value["role"], "Practical");
        assert_eq!(value["ok"], true);
    }
}
