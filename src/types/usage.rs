//! Token usage accounting.

use serde::{Deserialize, Serialize};

/// Token usage for one invocation.
///
/// `estimated` is true when the engine did not report counts and the gateway
/// derived them with its configured [`TokenEstimator`](crate::util::estimate::TokenEstimator).
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct Usage {
    pub input_tokens: u32,
    pub output_tokens: u32,
    pub total_tokens: u32,
    #[serde(default)]
    pub estimated: bool,
}

impl Usage {
    /// Usage reported by the engine.
    pub fn reported(input_tokens: u32, output_tokens: u32) -> Self {
        Self {
            input_tokens,
            output_tokens,
            total_tokens: input_tokens + output_tokens,
            estimated: false,
        }
    }

    /// Usage derived by estimation.
    pub fn estimated(input_tokens: u32, output_tokens: u32) -> Self {
        Self {
            input_tokens,
            output_tokens,
            total_tokens: input_tokens + output_tokens,
            estimated: true,
        }
    }

}
