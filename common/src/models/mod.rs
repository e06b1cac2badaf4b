//! Request and connection models.

pub mod request;
pub mod target;

// Re-export commonly used types
pub use request::{Action, ActionParams, BridgeRequest, Operation};
pub use target::{ConnectionTarget, Dialect};
