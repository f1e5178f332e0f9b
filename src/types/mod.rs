//! External protocol types for the Responses contract.

pub mod request;
pub mod response;
pub mod events;
pub mod usage;

pub use request::*;
pub use response::*;
pub use events::*;
pub use usage::*;
