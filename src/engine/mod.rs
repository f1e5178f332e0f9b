//! Agent engine interface.
//!
//! The engine is an opaque capability exposing `invoke` and `stream` over a
//! thread-scoped conversation state. Its persistence, retry, and checkpoint
//! mechanics are out of scope for this crate; any runtime that can satisfy
//! [`AgentEngine`] plugs into the gateway.

use async_trait::async_trait;
use futures::stream::BoxStream;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::gateway::identity::Continuity;
use crate::types::{Role, Usage};

/// One message unit sent to the engine.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EngineMessage {
    pub role: Role,
    pub text: String,
}

impl EngineMessage {
    pub fn system(text: impl Into<String>) -> Self {
        Self { role: Role::System, text: text.into() }
    }

    pub fn user(text: impl Into<String>) -> Self {
        Self { role: Role::User, text: text.into() }
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self { role: Role::Assistant, text: text.into() }
    }
}

/// Validated generation parameters forwarded to the engine.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct GenerationSettings {
    pub temperature: Option<f64>,
    pub top_p: Option<f64>,
    pub max_output_tokens: Option<u32>,
}

/// Normalized internal request: everything the engine needs for one
/// invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct InvocationDescriptor {
    pub model: String,
    pub messages: Vec<EngineMessage>,
    pub settings: GenerationSettings,
    pub continuity: Continuity,
    /// Whether the result must be retrievable later by identifier.
    pub store: bool,
}

impl InvocationDescriptor {
    /// Concatenated input text, used for usage estimation.
    pub fn input_text(&self) -> String {
        self.messages.iter().map(|m| m.text.as_str()).collect::<Vec<_>>().join("\n")
    }
}

/// Completion status reported by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineStatus {
    Completed,
    Incomplete,
    Failed,
}

/// One logical turn of engine output. Fragments belonging to the same turn
/// merge into a single output item.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineTurn {
    pub role: Role,
    pub fragments: Vec<String>,
}

impl EngineTurn {
    pub fn assistant(fragments: Vec<String>) -> Self {
        Self { role: Role::Assistant, fragments }
    }

    /// The turn's full text.
    pub fn text(&self) -> String {
        self.fragments.concat()
    }
}

/// The raw result of a completed (non-streaming) invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineResult {
    pub turns: Vec<EngineTurn>,
    pub status: EngineStatus,
    /// Token usage, when the engine reports it.
    pub usage: Option<Usage>,
}

/// One event of an engine's live stream.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    /// The engine begins a new output item.
    ItemStart,
    /// Incremental text belonging to the open item.
    TextDelta { text: String },
    /// The open item is complete.
    ItemEnd,
    /// The whole invocation is complete; no further events follow.
    Done {
        status: EngineStatus,
        usage: Option<Usage>,
    },
}

/// The only surface the gateway depends on from the internal runtime.
#[async_trait]
pub trait AgentEngine: Send + Sync {
    /// Engine name, reported by the model-listing endpoint.
    fn name(&self) -> &str;

    /// Run one invocation to completion.
    async fn invoke(&self, invocation: &InvocationDescriptor) -> Result<EngineResult>;

    /// Run one invocation, producing a live event stream. Events arrive on a
    /// single logical sequence and must be consumed in order.
    async fn stream(
        &self,
        invocation: &InvocationDescriptor,
    ) -> Result<BoxStream<'static, Result<EngineEvent>>>;
}
