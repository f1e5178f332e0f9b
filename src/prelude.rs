//! Convenience re-exports for common use.

pub use crate::config::GatewayConfig;
pub use crate::engine::{
    AgentEngine, EngineEvent, EngineMessage, EngineResult, EngineStatus, EngineTurn,
    GenerationSettings, InvocationDescriptor,
};
pub use crate::error::{ErrorCode, GatewayError, Result};
pub use crate::gateway::identity::{Continuity, ConversationKey};
pub use crate::gateway::Gateway;
pub use crate::types::{
    OutputItem, ResponseRecord, ResponseStatus, ResponsesRequest, Role, StreamEvent, Usage,
};
