//! Prompt templates for the three pipeline stages.
//!
//! Each builder returns the system instruction; the matching user message is a constant or a
//! one-line format. Insight and critique prompts are bounded to ~150 words so the per-agent
//! budget stays small; the synthesis prompt fixes a two-section markdown layout.

use crate::agent::{AgentResponse, AgentRole};

/// Fallback content for a failed insight call.
pub const INSIGHT_FALLBACK: &str = "Error generating insight.";
/// Fallback content for a failed critique call.
pub const CRITIQUE_FALLBACK: &str = "Error generating critique.";
/// Fallback when the synthesis call succeeded but returned no text.
pub const SUMMARY_FALLBACK: &str = "Error generating summary.";
/// Fallback when the synthesis call itself failed.
pub const SYNTHESIS_FALLBACK: &str = "Error in synthesis process.";

/// Heading of the first synthesis section.
pub const SUMMARY_HEADING: &str = "## Executive Summary";
/// Heading of the second synthesis section.
pub const ROOM_HEADING: &str = "## Your Tailored Room";

/// User message sent with the synthesis prompt.
pub const SYNTHESIS_USER_MESSAGE: &str = "Please synthesize and tailor the room.";

/// System prompt for an agent's first-stage insight.
pub fn insight_system_prompt(role: AgentRole) -> String {
    format!(
        "You are one of {count} AI agents working together. Your specific role is: {instruction}.\n\
         Provide your unique insight on the user's query. Keep it concise (under 150 words).",
        count = AgentRole::count(),
        instruction = role.instruction(),
    )
}

/// System prompt for an agent's critique of every *other* agent's insight.
pub fn critique_system_prompt(role: AgentRole, insights: &[AgentResponse]) -> String {
    let others = insights
        .iter()
        .filter(|insight| insight.agent_id != role.agent_id())
        .map(|insight| format!("[Agent {}]: {}", insight.role, insight.content))
        .collect::<Vec<_>>()
        .join("\n\n");

    format!(
        "You are one of {count} AI agents. Your role is: {instruction}.\n\
         Review the insights provided by the other agents:\n\
         {others}\n\n\
         Provide a critique or judgment on their insights based on your perspective.\n\
         Highlight what you agree with, what you disagree with, and why. Keep it concise (under 150 words).",
        count = AgentRole::count(),
        instruction = role.instruction(),
        others = others,
    )
}

/// User message sent with a critique prompt.
pub fn critique_user_message(query: &str) -> String {
    format!("Original Query: {}", query)
}

/// System prompt for the lead synthesis call.
pub fn synthesis_system_prompt(
    query: &str,
    insights: &[AgentResponse],
    critiques: &[AgentResponse],
) -> String {
    let insights_text = labelled_block(insights, "Insight");
    let critiques_text = labelled_block(critiques, "Critique");

    format!(
        "You are the Lead AI Architect. You have received insights and critiques from {count} specialized agents regarding a user's query.\n\n\
         User Query: {query}\n\n\
         --- INSIGHTS ---\n\
         {insights_text}\n\n\
         --- CRITIQUES ---\n\
         {critiques_text}\n\n\
         Your task:\n\
         1. Synthesize all the information into a cohesive summary.\n\
         2. Based on this synthesis, \"tailor a room\" for the user. This means describing a conceptual or physical space (a \"room\") that perfectly suits their needs based on the query and the agents' analysis. Describe the atmosphere, the furniture, the tools available, and the general vibe.\n\n\
         Format your response as:\n\n\
         {summary_heading}\n\
         (Your synthesis here)\n\n\
         {room_heading}\n\
         (Your room description here)",
        count = AgentRole::count(),
        query = query,
        insights_text = insights_text,
        critiques_text = critiques_text,
        summary_heading = SUMMARY_HEADING,
        room_heading = ROOM_HEADING,
    )
}

fn labelled_block(responses: &[AgentResponse], kind: &str) -> String {
    responses
        .iter()
        .map(|r| format!("[Agent {} {}]: {}", r.role, kind, r.content))
        .collect::<Vec<_>>()
        .join("\n\n")
}
