//! Streaming event types, with wire-exact names.

use serde::{Deserialize, Serialize};

use super::response::{OutputItem, ResponseRecord, ResponseStatus};
use crate::error::ErrorPayload;

/// Summary of a response sent with `response.created`, echoing the request's
/// generation parameters.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ResponseHead {
    pub id: String,
    pub object: String,
    pub created_at: i64,
    pub model: String,
    pub status: ResponseStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_output_tokens: Option<u32>,
}

/// One event of the external stream.
///
/// Every stream emits exactly one `response.created` first and ends with
/// exactly one terminal event (`response.completed` or `error`); for each
/// item index, `output_item.added` precedes all of its deltas, which precede
/// its `output_item.done`. The sequencer enforces this ordering.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum StreamEvent {
    #[serde(rename = "response.created")]
    Created {
        sequence_number: u64,
        response: ResponseHead,
    },
    #[serde(rename = "response.output_item.added")]
    OutputItemAdded {
        sequence_number: u64,
        output_index: u32,
        item: OutputItem,
    },
    #[serde(rename = "response.output_text.delta")]
    OutputTextDelta {
        sequence_number: u64,
        item_id: String,
        output_index: u32,
        content_index: u32,
        delta: String,
    },
    #[serde(rename = "response.output_item.done")]
    OutputItemDone {
        sequence_number: u64,
        output_index: u32,
        item: OutputItem,
    },
    #[serde(rename = "response.completed")]
    Completed {
        sequence_number: u64,
        response: ResponseRecord,
    },
    #[serde(rename = "error")]
    Error {
        sequence_number: u64,
        error: ErrorPayload,
    },
}

impl StreamEvent {
    /// Whether this event closes the stream.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed { .. } | Self::Error { .. })
    }

    /// The ordering counter carried by this event.
    pub fn sequence_number(&self) -> u64 {
        match self {
            Self::Created { sequence_number, .. }
            | Self::OutputItemAdded { sequence_number, .. }
            | Self::OutputTextDelta { sequence_number, .. }
            | Self::OutputItemDone { sequence_number, .. }
            | Self::Completed { sequence_number, .. }
            | Self::Error { sequence_number, .. } => *sequence_number,
        }
    }
}
