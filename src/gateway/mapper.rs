//! Request normalization: external request body → invocation descriptor.
//!
//! Pure transformation; all engine invocation happens in the orchestrator.

use crate::engine::{EngineMessage, GenerationSettings, InvocationDescriptor};
use crate::error::{GatewayError, Result};
use crate::types::{InputPayload, ResponsesRequest};

use super::identity::Continuity;

/// Map a request (with its resolved continuity) into an invocation
/// descriptor.
///
/// `instructions` become a leading system message only on the first turn of
/// a new conversation; continuation turns rely on the engine's persisted
/// state.
pub fn map_request(
    request: &ResponsesRequest,
    continuity: Continuity,
) -> Result<InvocationDescriptor> {
    let model = request
        .model
        .as_deref()
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .ok_or(GatewayError::MissingModel)?;

    let settings = validate_settings(request)?;

    let mut messages = Vec::new();
    if continuity == Continuity::Fresh {
        if let Some(instructions) = request.instructions.as_deref() {
            if !instructions.trim().is_empty() {
                messages.push(EngineMessage::system(instructions));
            }
        }
    }
    messages.extend(input_messages(request)?);

    Ok(InvocationDescriptor {
        model: model.to_string(),
        messages,
        settings,
        continuity,
        store: request.store.unwrap_or(true),
    })
}

fn validate_settings(request: &ResponsesRequest) -> Result<GenerationSettings> {
    if let Some(temperature) = request.temperature {
        if !(0.0..=2.0).contains(&temperature) {
            return Err(GatewayError::InvalidParameter {
                field: "temperature",
                message: format!("{temperature} is outside [0, 2]"),
            });
        }
    }
    if let Some(top_p) = request.top_p {
        if !(0.0..=1.0).contains(&top_p) {
            return Err(GatewayError::InvalidParameter {
                field: "top_p",
                message: format!("{top_p} is outside [0, 1]"),
            });
        }
    }
    if request.max_output_tokens == Some(0) {
        return Err(GatewayError::InvalidParameter {
            field: "max_output_tokens",
            message: "must be a positive integer".to_string(),
        });
    }
    Ok(GenerationSettings {
        temperature: request.temperature,
        top_p: request.top_p,
        max_output_tokens: request.max_output_tokens,
    })
}

/// Map the request input into ordered engine message units.
///
/// Prefers `input`; falls back to the legacy `messages` array. Whitespace-only
/// text counts as empty.
fn input_messages(request: &ResponsesRequest) -> Result<Vec<EngineMessage>> {
    if let Some(input) = &request.input {
        let units: Vec<EngineMessage> = match input {
            InputPayload::Text(text) => {
                if text.trim().is_empty() {
                    Vec::new()
                } else {
                    vec![EngineMessage::user(text.clone())]
                }
            }
            InputPayload::Parts(parts) => parts
                .iter()
                .filter(|part| !part.text().trim().is_empty())
                .map(|part| EngineMessage::user(part.text()))
                .collect(),
        };
        if units.is_empty() {
            return Err(GatewayError::EmptyInput);
        }
        return Ok(units);
    }

    if let Some(messages) = &request.messages {
        let units: Vec<EngineMessage> = messages
            .iter()
            .map(|message| (message.role, message.content.text()))
            .filter(|(_, text)| !text.trim().is_empty())
            .map(|(role, text)| EngineMessage { role, text })
            .collect();
        if units.is_empty() {
            return Err(GatewayError::EmptyInput);
        }
        return Ok(units);
    }

    Err(GatewayError::EmptyInput)
}
