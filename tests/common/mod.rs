//! Shared test helpers and scripted mock engine.

#![allow(dead_code)]

use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use futures::stream::BoxStream;

use tycho::engine::{
    AgentEngine, EngineEvent, EngineResult, EngineStatus, EngineTurn, InvocationDescriptor,
};
use tycho::error::{GatewayError, Result};
use tycho::types::Usage;

/// One scripted step of an engine stream.
#[derive(Debug, Clone)]
pub enum ScriptStep {
    Event(EngineEvent),
    Fail(String),
}

/// An engine that replays a canned script and records every invocation it
/// receives.
pub struct ScriptedEngine {
    script: Vec<ScriptStep>,
    result: EngineResult,
    fail_invoke: Option<String>,
    delay: Option<Duration>,
    invocations: Mutex<Vec<InvocationDescriptor>>,
}

impl ScriptedEngine {
    /// An engine that completes with a single assistant turn.
    pub fn completing(text: &str) -> Self {
        Self {
            script: vec![
                ScriptStep::Event(EngineEvent::ItemStart),
                ScriptStep::Event(EngineEvent::TextDelta { text: text.to_string() }),
                ScriptStep::Event(EngineEvent::ItemEnd),
                ScriptStep::Event(EngineEvent::Done {
                    status: EngineStatus::Completed,
                    usage: None,
                }),
            ],
            result: EngineResult {
                turns: vec![EngineTurn::assistant(vec![text.to_string()])],
                status: EngineStatus::Completed,
                usage: None,
            },
            fail_invoke: None,
            delay: None,
            invocations: Mutex::new(Vec::new()),
        }
    }

    /// An engine that replays the given stream script.
    pub fn with_script(script: Vec<ScriptStep>) -> Self {
        let mut engine = Self::completing("unused");
        engine.script = script;
        engine
    }

    /// Report engine-side usage from both paths.
    pub fn with_reported_usage(mut self, usage: Usage) -> Self {
        self.result.usage = Some(usage.clone());
        if let Some(ScriptStep::Event(EngineEvent::Done { usage: u, .. })) =
            self.script.last_mut()
        {
            *u = Some(usage);
        }
        self
    }

    /// Fail every `invoke` call with the given message.
    pub fn failing(message: &str) -> Self {
        let mut engine = Self::completing("unused");
        engine.fail_invoke = Some(message.to_string());
        engine
    }

    /// Sleep before answering, to exercise timeouts.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Every invocation descriptor this engine has received, in order.
    pub fn invocations(&self) -> Vec<InvocationDescriptor> {
        self.invocations.lock().unwrap().clone()
    }

    pub fn invocation_count(&self) -> usize {
        self.invocations.lock().unwrap().len()
    }

    fn record(&self, invocation: &InvocationDescriptor) {
        self.invocations.lock().unwrap().push(invocation.clone());
    }
}

#[async_trait]
impl AgentEngine for ScriptedEngine {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn invoke(&self, invocation: &InvocationDescriptor) -> Result<EngineResult> {
        self.record(invocation);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if let Some(message) = &self.fail_invoke {
            return Err(GatewayError::EngineInvocation(message.clone()));
        }
        Ok(self.result.clone())
    }

    async fn stream(
        &self,
        invocation: &InvocationDescriptor,
    ) -> Result<BoxStream<'static, Result<EngineEvent>>> {
        self.record(invocation);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if let Some(message) = &self.fail_invoke {
            return Err(GatewayError::EngineInvocation(message.clone()));
        }
        let mut items = Vec::with_capacity(self.script.len());
        for step in self.script.clone() {
            match step {
                ScriptStep::Event(event) => items.push(Ok(event)),
                ScriptStep::Fail(message) => {
                    items.push(Err(GatewayError::EngineInvocation(message)));
                    break;
                }
            }
        }
        Ok(Box::pin(tokio_stream::iter(items)))
    }
}

/// Shorthand for classifying emitted stream events in assertions.
pub fn event_kinds(events: &[tycho::types::StreamEvent]) -> Vec<&'static str> {
    use tycho::types::StreamEvent;
    events
        .iter()
        .map(|event| match event {
            StreamEvent::Created { .. } => "created",
            StreamEvent::OutputItemAdded { .. } => "added",
            StreamEvent::OutputTextDelta { .. } => "delta",
            StreamEvent::OutputItemDone { .. } => "done",
            StreamEvent::Completed { .. } => "completed",
            StreamEvent::Error { .. } => "error",
        })
        .collect()
}
