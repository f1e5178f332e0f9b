//! Request body for the "create response" operation.

use std::collections::HashMap;

use bon::Builder;
use serde::{Deserialize, Serialize};

/// A "create response" request.
///
/// `previous_response_id` and `thread_id`/`user_id` are the two continuation
/// modes; they are mutually exclusive and reconciled by the identity
/// resolver. `model` is required by the contract but optional here so that
/// its absence surfaces as a structured `missing_model` error rather than a
/// deserialization failure.
#[derive(Debug, Clone, Builder, Serialize, Deserialize, Default)]
pub struct ResponsesRequest {
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub input: Option<InputPayload>,
    /// Legacy alias for `input`, kept for chat-completions-shaped clients.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub messages: Option<Vec<RequestMessage>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instructions: Option<String>,
    #[serde(default)]
    #[builder(default)]
    pub stream: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_output_tokens: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous_response_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thread_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    /// Whether the record must be retrievable later by identifier. Defaults
    /// to true when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub store: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<HashMap<String, String>>,
}

impl ResponsesRequest {
    /// Shorthand for a plain-text request.
    pub fn text(model: impl Into<String>, input: impl Into<String>) -> Self {
        Self {
            model: Some(model.into()),
            input: Some(InputPayload::Text(input.into())),
            ..Default::default()
        }
    }
}

/// Request input: a single text value or an ordered sequence of typed parts.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum InputPayload {
    Text(String),
    Parts(Vec<InputPart>),
}

/// One typed input part.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InputPart {
    InputText { text: String },
    /// Legacy alias for `input_text`.
    Text { text: String },
}

impl InputPart {
    /// The text carried by this part.
    pub fn text(&self) -> &str {
        match self {
            Self::InputText { text } | Self::Text { text } => text,
        }
    }
}

/// Conversation role.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// One message in the legacy `messages` payload.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RequestMessage {
    pub role: Role,
    pub content: MessageContent,
}

/// Message content: a plain string or typed parts.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum MessageContent {
    Text(String),
    Parts(Vec<InputPart>),
}

impl MessageContent {
    /// Concatenate all text carried by this content.
    pub fn text(&self) -> String {
        match self {
            Self::Text(text) => text.clone(),
            Self::Parts(parts) => parts.iter().map(InputPart::text).collect::<Vec<_>>().join(" "),
        }
    }
}
