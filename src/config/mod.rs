//! Gateway configuration.
//!
//! Explicitly passed to the gateway and server, never ambient global state.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use bon::Builder;

use crate::util::estimate::{CharsPerToken, TokenEstimator};

/// Configuration for one gateway instance.
#[derive(Clone, Builder)]
pub struct GatewayConfig {
    /// Name of the agent/platform, reported by `/health`.
    #[builder(default = "Tycho Gateway".to_string())]
    pub name: String,
    #[builder(default = env!("CARGO_PKG_VERSION").to_string())]
    pub version: String,
    /// Base path for API endpoints.
    #[builder(default = "/v1".to_string())]
    pub base_path: String,
    /// Model name reported by the model-listing endpoint.
    #[builder(default = "tycho-agent".to_string())]
    pub model_name: String,
    /// Optional caller-configured engine timeout. The gateway applies no
    /// timeout of its own when unset.
    pub engine_timeout: Option<Duration>,
    /// Token estimation strategy used when the engine omits usage.
    #[builder(default = Arc::new(CharsPerToken::default()))]
    estimator: Arc<dyn TokenEstimator>,
}

impl GatewayConfig {
    /// The configured token estimator.
    pub fn estimator(&self) -> Arc<dyn TokenEstimator> {
        self.estimator.clone()
    }

    /// Load overrides from environment variables (TYCHO_NAME,
    /// TYCHO_BASE_PATH, TYCHO_MODEL_NAME, TYCHO_ENGINE_TIMEOUT_MS).
    pub fn from_env() -> Self {
        let _ = dotenvy::dotenv(); // load .env if present, ignore error
        let mut config = Self::default();
        if let Ok(name) = std::env::var("TYCHO_NAME") {
            config.name = name;
        }
        if let Ok(base_path) = std::env::var("TYCHO_BASE_PATH") {
            config.base_path = base_path;
        }
        if let Ok(model_name) = std::env::var("TYCHO_MODEL_NAME") {
            config.model_name = model_name;
        }
        if let Ok(ms) = std::env::var("TYCHO_ENGINE_TIMEOUT_MS") {
            if let Ok(ms) = ms.parse::<u64>() {
                config.engine_timeout = Some(Duration::from_millis(ms));
            }
        }
        config
    }
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl fmt::Debug for GatewayConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GatewayConfig")
            .field("name", &self.name)
            .field("version", &self.version)
            .field("base_path", &self.base_path)
            .field("model_name", &self.model_name)
            .field("engine_timeout", &self.engine_timeout)
            .field("estimator", &"..")
            .finish()
    }
}
