//! Non-streaming response record and its output items.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use uuid::Uuid;

use super::request::Role;
use super::usage::Usage;
use crate::error::ErrorPayload;

/// Wire discriminator for response records.
pub const RESPONSE_OBJECT: &str = "response";

/// Allocate a fresh response identifier.
pub fn new_response_id() -> String {
    format!("resp_{}", Uuid::new_v4().simple())
}

/// Derive the output item identifier for `output_index` of a response.
///
/// Item ids are a pure function of the response id so that assembling the
/// same raw result twice yields identical records.
pub fn item_id(response_id: &str, output_index: u32) -> String {
    let suffix = response_id.strip_prefix("resp_").unwrap_or(response_id);
    format!("item_{suffix}_{output_index}")
}

/// Response lifecycle status.
#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Display, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ResponseStatus {
    InProgress,
    Completed,
    Failed,
    Incomplete,
}

/// The result of one invocation, as returned to the client.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ResponseRecord {
    pub id: String,
    pub object: String,
    pub created_at: i64,
    pub model: String,
    pub status: ResponseStatus,
    pub output: Vec<OutputItem>,
    pub usage: Usage,
    /// When false the id is not advertised as retrievable by a later
    /// `previous_response_id`.
    pub store: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous_response_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorPayload>,
}

impl ResponseRecord {
    /// Concatenate all output text across items.
    pub fn output_text(&self) -> String {
        self.output.iter().map(OutputItem::text).collect::<Vec<_>>().join("")
    }
}

/// One discrete unit of generated content (one message turn).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OutputItem {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: OutputItemKind,
    pub role: Role,
    pub content: Vec<OutputContent>,
}

impl OutputItem {
    /// An empty assistant message item, as announced by `output_item.added`.
    pub fn message(id: String, role: Role) -> Self {
        Self {
            id,
            kind: OutputItemKind::Message,
            role,
            content: vec![OutputContent::OutputText { text: String::new() }],
        }
    }

    /// A message item with its full text, as carried by `output_item.done`.
    pub fn message_with_text(id: String, role: Role, text: String) -> Self {
        Self {
            id,
            kind: OutputItemKind::Message,
            role,
            content: vec![OutputContent::OutputText { text }],
        }
    }

    /// Concatenate the text parts of this item.
    pub fn text(&self) -> String {
        self.content
            .iter()
            .map(|part| match part {
                OutputContent::OutputText { text } => text.as_str(),
            })
            .collect()
    }
}

/// Output item kind discriminator.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum OutputItemKind {
    Message,
}

/// One content part of an output item.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OutputContent {
    OutputText { text: String },
}
