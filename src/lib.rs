//! # roomcouncil
//!
//! roomcouncil answers a child-facing "design my room" style query by convening a small council
//! of LLM agents. Four fixed personas (Analytical, Creative, Critical, Practical) each give an
//! insight, then critique one another, and a lead call synthesises everything into an executive
//! summary plus a description of a tailored room.
//!
//! The crate provides:
//!
//! * **Pipeline**: [`Pipeline`] sequences the insight, critique and synthesis stages with a
//!   fan-out/fan-in join inside each per-agent stage
//! * **Provider seam**: [`ClientWrapper`] abstracts the completion service; [`ClaudeClient`]
//!   implements it over Anthropic's Messages API, and tests plug in their own
//! * **Observability**: [`event::EventHandler`] callbacks plus `log` records for every stage
//!   boundary and every swallowed failure
//! * **HTTP surface** (`server` feature): `POST /api/multi-agent` and `GET /health` on axum
//!
//! ## Getting Started
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use roomcouncil::{ClaudeClient, Pipeline};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     roomcouncil::init_logger();
//!
//!     let client = Arc::new(ClaudeClient::new(&std::env::var("ANTHROPIC_API_KEY")?));
//!     let result = Pipeline::new(client)
//!         .run("How can I design a minimalist yet cozy living room?")
//!         .await;
//!
//!     println!("{}", result.final_output);
//!     Ok(())
//! }
//! ```
//!
//! ## Degraded runs
//!
//! A failed completion call never aborts a run. The affected slot carries its stage's fallback
//! text with `ok == false`, and [`PipelineResult::degraded`] is set, so callers can tell real
//! content from placeholders.

use std::sync::Once;

static INIT_LOGGER: Once = Once::new();

/// Initialise the global [`env_logger`] subscriber exactly once.
///
/// Output is controlled through `RUST_LOG`, e.g. `RUST_LOG=roomcouncil=debug` to see every
/// prompt the pipeline sends.
///
/// ```rust
/// roomcouncil::init_logger();
/// log::info!("Logger is ready");
/// ```
pub fn init_logger() {
    INIT_LOGGER.call_once(|| {
        env_logger::init();
    });
}

pub mod roomcouncil;

pub use roomcouncil::agent;
pub use roomcouncil::agent::{AgentResponse, AgentRole, PipelineResult, Stage, StageOutcome};
pub use roomcouncil::client_wrapper;
pub use roomcouncil::client_wrapper::{
    ClientError, ClientWrapper, CompletionRequest, CompletionResponse, ContentBlock, Message,
    Role, TokenUsage,
};
pub use roomcouncil::clients;
pub use roomcouncil::clients::claude::ClaudeClient;
pub use roomcouncil::config;
pub use roomcouncil::config::{ConfigError, RoomCouncilConfig};
pub use roomcouncil::event;
pub use roomcouncil::event::{EventHandler, PipelineEvent};
pub use roomcouncil::pipeline;
pub use roomcouncil::pipeline::{Pipeline, PipelineConfig};
pub use roomcouncil::prompts;
#[cfg(feature = "server")]
pub use roomcouncil::server;
