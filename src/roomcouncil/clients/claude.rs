//! Anthropic Claude client speaking the native Messages API.
//!
//! Each call is a single `POST {base_url}/v1/messages` carrying the model, output budget,
//! system instruction and messages. The reply's `content` array is decoded block by block;
//! unknown block types are kept as [`ContentBlock::Other`] rather than rejected.
//!
//! # Example
//!
//! ```rust,no_run
//! use roomcouncil::client_wrapper::{ClientWrapper, CompletionRequest};
//! use roomcouncil::clients::claude::{model_to_string, ClaudeClient, Model};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = ClaudeClient::new(&std::env::var("ANTHROPIC_API_KEY")?);
//!     let request = CompletionRequest::single_turn(
//!         model_to_string(Model::ClaudeHaiku35),
//!         300,
//!         "You are terse.",
//!         "Name one cozy colour.",
//!     );
//!     let response = client.send_message(&request).await?;
//!     println!("{}", response.first_text().unwrap_or_default());
//!     Ok(())
//! }
//! ```

use crate::client_wrapper::{
    ClientError, ClientWrapper, CompletionRequest, CompletionResponse, ContentBlock, TokenUsage,
};
use crate::clients::common::{get_shared_http_client, join_url};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};

/// Default public endpoint.
pub const DEFAULT_BASE_URL: &str = "https://api.anthropic.com";

/// Value sent in the `anthropic-version` header.
pub const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Claude models known to this crate.
pub enum Model {
    /// `claude-3-5-haiku-20241022` – fast tier used for per-agent calls.
    ClaudeHaiku35,
    /// `claude-3-5-sonnet-20240620` – lead model used for synthesis.
    ClaudeSonnet35,
    /// `claude-haiku-4-5` – current fast tier.
    ClaudeHaiku45,
    /// `claude-sonnet-4-5` – current balanced tier.
    ClaudeSonnet45,
}

/// Convert a [`Model`] variant into its public string identifier.
pub fn model_to_string(model: Model) -> String {
    match model {
        Model::ClaudeHaiku35 => "claude-3-5-haiku-20241022".to_string(),
        Model::ClaudeSonnet35 => "claude-3-5-sonnet-20240620".to_string(),
        Model::ClaudeHaiku45 => "claude-haiku-4-5".to_string(),
        Model::ClaudeSonnet45 => "claude-sonnet-4-5".to_string(),
    }
}

/// Client wrapper for Anthropic's Messages API.
pub struct ClaudeClient {
    secret_key: String,
    base_url: String,
    http: reqwest::Client,
}

impl ClaudeClient {
    /// Create a client for the public Anthropic endpoint.
    pub fn new(secret_key: &str) -> Self {
        Self::new_with_base_url(secret_key, DEFAULT_BASE_URL)
    }

    /// Create a client pointing at a custom Messages-compatible base URL.
    pub fn new_with_base_url(secret_key: &str, base_url: &str) -> Self {
        ClaudeClient {
            secret_key: secret_key.to_string(),
            base_url: base_url.to_string(),
            http: get_shared_http_client().clone(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn messages_url(&self) -> String {
        join_url(&self.base_url, "/v1/messages")
    }
}

/// Build the JSON body of a Messages API call.
pub fn request_body(request: &CompletionRequest) -> Value {
    json!({
        "model": request.model,
        "max_tokens": request.max_tokens,
        "system": request.system,
        "messages": request.messages,
    })
}

#[derive(Deserialize)]
struct WireResponse {
    #[serde(default)]
    content: Vec<Value>,
    #[serde(default)]
    stop_reason: Option<String>,
    #[serde(default)]
    usage: Option<WireUsage>,
}

#[derive(Deserialize)]
struct WireUsage {
    #[serde(default)]
    input_tokens: usize,
    #[serde(default)]
    output_tokens: usize,
}

fn decode_block(block: &Value) -> ContentBlock {
    let kind = block["type"].as_str().unwrap_or_default();
    match kind {
        "text" => ContentBlock::Text {
            text: block["text"].as_str().unwrap_or_default().to_string(),
        },
        "tool_use" => ContentBlock::ToolUse {
            id: block["id"].as_str().unwrap_or_default().to_string(),
            name: block["name"].as_str().unwrap_or_default().to_string(),
        },
        other => ContentBlock::Other {
            kind: other.to_string(),
        },
    }
}

/// Decode a Messages API response body.
pub fn parse_response(body: &str) -> Result<CompletionResponse, ClientError> {
    let wire: WireResponse =
        serde_json::from_str(body).map_err(|e| ClientError::Decode(e.to_string()))?;

    Ok(CompletionResponse {
        content: wire.content.iter().map(decode_block).collect(),
        stop_reason: wire.stop_reason,
        usage: wire.usage.map(|u| TokenUsage {
            input_tokens: u.input_tokens,
            output_tokens: u.output_tokens,
            total_tokens: u.input_tokens + u.output_tokens,
        }),
    })
}

#[async_trait]
impl ClientWrapper for ClaudeClient {
    async fn send_message(
        &self,
        request: &CompletionRequest,
    ) -> Result<CompletionResponse, ClientError> {
        let response = self
            .http
            .post(self.messages_url())
            .header("x-api-key", &self.secret_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&request_body(request))
            .send()
            .await
            .map_err(|e| ClientError::Http(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ClientError::Http(e.to_string()))?;

        if !status.is_success() {
            log::error!(
                "ClaudeClient::send_message(...): model {} returned {}",
                request.model,
                status
            );
            return Err(ClientError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let parsed = parse_response(&body)?;
        if let Some(usage) = &parsed.usage {
            log::debug!(
                "ClaudeClient::send_message(...): model {} used {} input / {} output tokens",
                request.model,
                usage.input_tokens,
                usage.output_tokens
            );
        }
        Ok(parsed)
    }

    fn provider_name(&self) -> &str {
        "anthropic"
    }
}
