//! Gateway orchestration.
//!
//! Composes identity resolution, request mapping, engine invocation, and
//! response assembly or stream sequencing per incoming request.

pub mod assembler;
pub mod identity;
pub mod mapper;
pub mod sequencer;

use std::sync::Arc;

use futures::stream::BoxStream;
use tracing::debug;

use crate::config::GatewayConfig;
use crate::engine::{AgentEngine, EngineResult, InvocationDescriptor};
use crate::error::Result;
use crate::types::{ResponseRecord, ResponsesRequest, StreamEvent};
use crate::util::timeout::with_timeout;

use assembler::ResponseAssembler;
use sequencer::StreamSequencer;

/// The protocol-translation gateway over one agent engine.
///
/// Each request is handled independently; the gateway holds no per-request
/// mutable state.
pub struct Gateway {
    engine: Arc<dyn AgentEngine>,
    config: GatewayConfig,
}

impl Gateway {
    pub fn new(engine: Arc<dyn AgentEngine>, config: GatewayConfig) -> Self {
        Self { engine, config }
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    /// Name of the engine behind this gateway.
    pub fn engine_name(&self) -> &str {
        self.engine.name()
    }

    /// Handle one non-streaming request: resolve identity, map, invoke, and
    /// assemble a single response record.
    pub async fn respond(&self, request: &ResponsesRequest) -> Result<ResponseRecord> {
        let invocation = self.prepare(request)?;
        debug!(
            model = %invocation.model,
            continuity = ?invocation.continuity,
            streaming = false,
            "dispatching invocation"
        );
        let result = self.invoke(&invocation).await?;
        let assembler =
            ResponseAssembler::for_invocation(&invocation, self.config.estimator());
        Ok(assembler.assemble(&result))
    }

    /// Handle one streaming request: resolve identity, map, open the engine
    /// stream, and sequence it into external events.
    ///
    /// Failures before the stream opens are returned as errors; failures
    /// after it opens surface as the stream's terminal `error` event.
    /// Dropping the returned stream cancels the engine invocation.
    pub async fn respond_stream(
        &self,
        request: &ResponsesRequest,
    ) -> Result<BoxStream<'static, StreamEvent>> {
        let invocation = self.prepare(request)?;
        debug!(
            model = %invocation.model,
            continuity = ?invocation.continuity,
            streaming = true,
            "dispatching invocation"
        );
        let sequencer =
            StreamSequencer::for_invocation(&invocation, self.config.estimator());
        let events = match self.config.engine_timeout {
            Some(duration) => with_timeout(duration, self.engine.stream(&invocation)).await?,
            None => self.engine.stream(&invocation).await?,
        };
        Ok(sequencer.run(events))
    }

    /// Validation pipeline shared by both paths. Runs before any engine
    /// invocation.
    fn prepare(&self, request: &ResponsesRequest) -> Result<InvocationDescriptor> {
        let continuity = identity::resolve(request)?;
        mapper::map_request(request, continuity)
    }

    async fn invoke(&self, invocation: &InvocationDescriptor) -> Result<EngineResult> {
        match self.config.engine_timeout {
            Some(duration) => with_timeout(duration, self.engine.invoke(invocation)).await,
            None => self.engine.invoke(invocation).await,
        }
    }
}
