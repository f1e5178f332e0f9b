//! Shared utilities.

pub mod estimate;
pub mod timeout;
