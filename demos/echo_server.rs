//! Minimal gateway over an engine that echoes the user's input.
//!
//! Run with `cargo run --example echo_server`, then:
//!
//! ```sh
//! curl localhost:8080/v1/responses \
//!   -H 'content-type: application/json' \
//!   -d '{"model": "echo", "input": "hello", "stream": true}'
//! ```

use std::sync::Arc;

use async_trait::async_trait;
use futures::stream::BoxStream;

use tycho::engine::{
    AgentEngine, EngineEvent, EngineResult, EngineStatus, EngineTurn, InvocationDescriptor,
};
use tycho::error::Result;
use tycho::gateway::Gateway;
use tycho::prelude::GatewayConfig;
use tycho::server;
use tycho::types::Role;

struct EchoEngine;

impl EchoEngine {
    fn reply(invocation: &InvocationDescriptor) -> String {
        let input = invocation
            .messages
            .iter()
            .rev()
            .find(|m| m.role == Role::User)
            .map(|m| m.text.clone())
            .unwrap_or_default();
        format!("You said: {input}")
    }
}

#[async_trait]
impl AgentEngine for EchoEngine {
    fn name(&self) -> &str {
        "echo"
    }

    async fn invoke(&self, invocation: &InvocationDescriptor) -> Result<EngineResult> {
        Ok(EngineResult {
            turns: vec![EngineTurn::assistant(vec![Self::reply(invocation)])],
            status: EngineStatus::Completed,
            usage: None,
        })
    }

    async fn stream(
        &self,
        invocation: &InvocationDescriptor,
    ) -> Result<BoxStream<'static, Result<EngineEvent>>> {
        let reply = Self::reply(invocation);
        let stream = async_stream::stream! {
            yield Ok(EngineEvent::ItemStart);
            for word in reply.split_inclusive(' ') {
                yield Ok(EngineEvent::TextDelta { text: word.to_string() });
            }
            yield Ok(EngineEvent::ItemEnd);
            yield Ok(EngineEvent::Done {
                status: EngineStatus::Completed,
                usage: None,
            });
        };
        Ok(Box::pin(stream))
    }
}

#[tokio::main]
async fn main() -> std::io::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tycho=debug".into()),
        )
        .init();

    let config = GatewayConfig::from_env();
    let gateway = Arc::new(Gateway::new(Arc::new(EchoEngine), config));
    server::serve("0.0.0.0:8080", gateway).await
}
