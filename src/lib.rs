//! Tycho: Responses API gateway for stateful agent runtimes.
//!
//! Exposes the request/response + SSE "Responses" contract and delegates
//! generation to any thread-checkpointed agent runtime implementing
//! [`engine::AgentEngine`]. The gateway translates in both directions:
//! request bodies become invocation descriptors, and the engine's event
//! stream becomes an ordered, wire-exact external event sequence.
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use tycho::config::GatewayConfig;
//! use tycho::gateway::Gateway;
//! # use tycho::engine::AgentEngine;
//!
//! # async fn example(engine: Arc<dyn AgentEngine>) -> std::io::Result<()> {
//! let gateway = Arc::new(Gateway::new(engine, GatewayConfig::from_env()));
//! tycho::server::serve("0.0.0.0:8000", gateway).await
//! # }
//! ```

pub mod config;
pub mod engine;
pub mod error;
pub mod gateway;
pub mod prelude;
pub mod server;
pub mod types;
pub mod util;
