//! The completion-service seam.
//!
//! A [`ClientWrapper`] wraps a remote text-completion service. The pipeline hands it a system
//! instruction plus user messages and gets back a [`CompletionResponse`] containing zero or more
//! content blocks. It does not keep any conversation state; every call is independent.
//!
//! Tests substitute their own implementations of the trait, so nothing in the pipeline depends
//! on a concrete provider.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt;

/// Represents the possible roles for a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    // a message sent by a human user (or app user)
    User,
    // lets the model know the content was generated as a response to a user message
    Assistant,
}

/// Represents a generic message to be sent to an LLM.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// The role associated with the message.
    pub role: Role,
    /// The actual content of the message.
    pub content: String,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Message {
            role: Role::User,
            content: content.into(),
        }
    }
}

/// How many tokens were spent on prompt vs. completion.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TokenUsage {
    pub input_tokens: usize,
    pub output_tokens: usize,
    pub total_tokens: usize,
}

/// One completion call: model, output budget, system instruction and the conversation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionRequest {
    pub model: String,
    pub max_tokens: usize,
    pub system: String,
    pub messages: Vec<Message>,
}

impl CompletionRequest {
    /// Build a single-turn request: one system instruction, one user message.
    ///
    /// ```rust
    /// use roomcouncil::client_wrapper::{CompletionRequest, Role};
    ///
    /// let request = CompletionRequest::single_turn("model-x", 300, "Be brief.", "Hello");
    /// assert_eq!(request.messages.len(), 1);
    /// assert_eq!(request.messages[0].role, Role::User);
    /// ```
    pub fn single_turn(
        model: impl Into<String>,
        max_tokens: usize,
        system: impl Into<String>,
        user_message: impl Into<String>,
    ) -> Self {
        CompletionRequest {
            model: model.into(),
            max_tokens,
            system: system.into(),
            messages: vec![Message::user(user_message)],
        }
    }
}

/// A content block returned by the completion service.
///
/// Only text blocks are consumed by the pipeline; everything else is carried through as
/// [`ContentBlock::Other`] so that unexpected block types never fail a call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentBlock {
    Text { text: String },
    ToolUse { id: String, name: String },
    Other { kind: String },
}

/// The parsed reply of one completion call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompletionResponse {
    pub content: Vec<ContentBlock>,
    pub stop_reason: Option<String>,
    pub usage: Option<TokenUsage>,
}

impl CompletionResponse {
    /// Convenience constructor for a reply made of a single text block.
    pub fn from_text(text: impl Into<String>) -> Self {
        CompletionResponse {
            content: vec![ContentBlock::Text { text: text.into() }],
            stop_reason: Some("end_turn".to_string()),
            usage: None,
        }
    }

    /// The first text-typed block that carries usable (non-blank) text.
    ///
    /// ```rust
    /// use roomcouncil::client_wrapper::{CompletionResponse, ContentBlock};
    ///
    /// let response = CompletionResponse {
    ///     content: vec![
    ///         ContentBlock::Other { kind: "thinking".into() },
    ///         ContentBlock::Text { text: "hi".into() },
    ///     ],
    ///     ..Default::default()
    /// };
    /// assert_eq!(response.first_text(), Some("hi"));
    /// ```
    pub fn first_text(&self) -> Option<&str> {
        self.content.iter().find_map(|block| match block {
            ContentBlock::Text { text } if !text.trim().is_empty() => Some(text.as_str()),
            _ => None,
        })
    }
}

/// Errors surfaced by a [`ClientWrapper`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientError {
    /// The request never produced an HTTP response (DNS, TLS, connection reset, ...).
    Http(String),
    /// The service answered with a non-2xx status.
    Status { status: u16, body: String },
    /// The response body could not be decoded.
    Decode(String),
}

impl fmt::Display for ClientError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClientError::Http(msg) => write!(f, "Transport error: {}", msg),
            ClientError::Status { status, body } => {
                write!(f, "Completion service returned {}: {}", status, body)
            }
            ClientError::Decode(msg) => write!(f, "Malformed response: {}", msg),
        }
    }
}

impl Error for ClientError {}

/// Trait defining the interface to a text-completion service.
#[async_trait]
pub trait ClientWrapper: Send + Sync {
    /// Issue exactly one completion call.
    async fn send_message(
        &self,
        request: &CompletionRequest,
    ) -> Result<CompletionResponse, ClientError>;

    /// Name used in logs to identify the provider.
    fn provider_name(&self) -> &str {
        "unknown"
    }
}
