//! Error types for Tycho.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Primary error type for all gateway operations.
#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("Invalid identifier in {field}: {message}")]
    InvalidIdentifier { field: &'static str, message: String },

    #[error("Conflicting continuity: previous_response_id and thread_id/user_id are mutually exclusive")]
    ConflictingContinuity,

    #[error("Missing required field: model")]
    MissingModel,

    #[error("Input is empty")]
    EmptyInput,

    #[error("Invalid parameter {field}: {message}")]
    InvalidParameter { field: &'static str, message: String },

    #[error("Engine invocation failed: {0}")]
    EngineInvocation(String),

    #[error("Engine timed out after {0}ms")]
    EngineTimeout(u64),

    #[error("Transport closed by client")]
    TransportClosed,

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Machine-readable error code, as sent on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    InvalidIdentifier,
    ConflictingContinuity,
    MissingModel,
    EmptyInput,
    InvalidParameter,
    EngineInvocationFailure,
    EngineTimeout,
    TransportClosed,
    ServerError,
}

/// Structured error payload attached to failed responses and error events.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorPayload {
    #[serde(rename = "type")]
    pub code: ErrorCode,
    pub message: String,
}

impl GatewayError {
    /// Classify this error into a wire code.
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::InvalidIdentifier { .. } => ErrorCode::InvalidIdentifier,
            Self::ConflictingContinuity => ErrorCode::ConflictingContinuity,
            Self::MissingModel => ErrorCode::MissingModel,
            Self::EmptyInput => ErrorCode::EmptyInput,
            Self::InvalidParameter { .. } => ErrorCode::InvalidParameter,
            Self::EngineInvocation(_) => ErrorCode::EngineInvocationFailure,
            Self::EngineTimeout(_) => ErrorCode::EngineTimeout,
            Self::TransportClosed => ErrorCode::TransportClosed,
            Self::Serialization(_) | Self::Io(_) => ErrorCode::ServerError,
        }
    }

    /// Whether this error was caught during request validation, before any
    /// engine invocation.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::InvalidIdentifier { .. }
                | Self::ConflictingContinuity
                | Self::MissingModel
                | Self::EmptyInput
                | Self::InvalidParameter { .. }
        )
    }

    /// Build the wire payload for this error.
    pub fn payload(&self) -> ErrorPayload {
        ErrorPayload {
            code: self.code(),
            message: self.to_string(),
        }
    }
}

/// Convenience alias.
pub type Result<T> = std::result::Result<T, GatewayError>;
