//! Shared types, seams, and error hierarchy for Relay.

pub mod error;
pub mod message;
pub mod provider;
pub mod tool;

pub use error::{ApiError, ConfigError, RelayError, ToolError};
pub use message::*;
pub use tool::*;
