//! Response assembly: raw engine result → external response record.

use std::sync::Arc;

use crate::engine::{EngineResult, EngineStatus, InvocationDescriptor};
use crate::error::{ErrorCode, ErrorPayload};
use crate::types::{
    item_id, new_response_id, OutputItem, ResponseRecord, ResponseStatus, Usage, RESPONSE_OBJECT,
};
use crate::util::estimate::TokenEstimator;

use super::identity::Continuity;

/// Assembles response records for one invocation.
///
/// Assembly is a pure function of the assembler's fields and the raw result:
/// item identifiers derive from the response id, so assembling the same
/// result twice yields identical records.
pub struct ResponseAssembler {
    pub response_id: String,
    pub created_at: i64,
    pub model: String,
    pub store: bool,
    pub previous_response_id: Option<String>,
    pub input_text: String,
    pub estimator: Arc<dyn TokenEstimator>,
}

impl ResponseAssembler {
    /// Build an assembler for an invocation, allocating a fresh response id.
    pub fn for_invocation(
        invocation: &InvocationDescriptor,
        estimator: Arc<dyn TokenEstimator>,
    ) -> Self {
        let previous_response_id = match &invocation.continuity {
            Continuity::PriorResponse(id) => Some(id.clone()),
            _ => None,
        };
        Self {
            response_id: new_response_id(),
            created_at: chrono::Utc::now().timestamp(),
            model: invocation.model.clone(),
            store: invocation.store,
            previous_response_id,
            input_text: invocation.input_text(),
            estimator,
        }
    }

    /// Convert a completed invocation result into a response record.
    ///
    /// Fragments of one logical turn merge into one output item; items keep
    /// the order the engine emitted them.
    pub fn assemble(&self, result: &EngineResult) -> ResponseRecord {
        let output: Vec<OutputItem> = result
            .turns
            .iter()
            .enumerate()
            .map(|(index, turn)| {
                OutputItem::message_with_text(
                    item_id(&self.response_id, index as u32),
                    turn.role,
                    turn.text(),
                )
            })
            .collect();

        let output_text: String = output.iter().map(OutputItem::text).collect();
        let usage = usage_or_estimate(
            result.usage.clone(),
            self.estimator.as_ref(),
            &self.input_text,
            &output_text,
        );

        let (status, error) = match result.status {
            EngineStatus::Completed => (ResponseStatus::Completed, None),
            EngineStatus::Incomplete => (ResponseStatus::Incomplete, None),
            EngineStatus::Failed => (
                ResponseStatus::Failed,
                Some(ErrorPayload {
                    code: ErrorCode::EngineInvocationFailure,
                    message: "engine reported a failed invocation".to_string(),
                }),
            ),
        };

        ResponseRecord {
            id: self.response_id.clone(),
            object: RESPONSE_OBJECT.to_string(),
            created_at: self.created_at,
            model: self.model.clone(),
            status,
            output,
            usage,
            store: self.store,
            previous_response_id: self.previous_response_id.clone(),
            error,
        }
    }
}

/// Use engine-reported usage when present; otherwise estimate from text and
/// mark the counts as estimated.
pub fn usage_or_estimate(
    reported: Option<Usage>,
    estimator: &dyn TokenEstimator,
    input_text: &str,
    output_text: &str,
) -> Usage {
    match reported {
        Some(usage) => usage,
        None => Usage::estimated(
            estimator.estimate(input_text),
            estimator.estimate(output_text),
        ),
    }
}
