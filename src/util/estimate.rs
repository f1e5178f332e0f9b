//! Token estimation for engines that do not report usage.

/// Strategy for estimating token counts from text.
///
/// The estimate is a documented approximation; records built from estimated
/// counts are marked `estimated` so the two are never conflated.
pub trait TokenEstimator: Send + Sync {
    fn estimate(&self, text: &str) -> u32;
}

/// Character-proportional estimation, `max(1, chars / n)`.
#[derive(Debug, Clone, Copy)]
pub struct CharsPerToken {
    chars_per_token: usize,
}

impl CharsPerToken {
    pub const fn new(chars_per_token: usize) -> Self {
        Self { chars_per_token }
    }
}

impl Default for CharsPerToken {
    fn default() -> Self {
        Self::new(4)
    }
}

impl TokenEstimator for CharsPerToken {
    fn estimate(&self, text: &str) -> u32 {
        let chars = text.chars().count();
        (chars / self.chars_per_token.max(1)).max(1) as u32
    }
}
