//! Agent-side plumbing for the VISU robot.
//!
//! The conversation framework calls into [`VisuAgent`] through named tools.
//! Tools drive three side effects: the face display (via [`Publisher`]), the
//! robot body over a serial link (via [`MotorController`]) and web lookups.

pub mod agent;
pub mod config;
pub mod error;
pub mod motor;
pub mod publisher;
pub mod search;
pub mod tools;

pub use agent::VisuAgent;
pub use error::{MotorError, PublishError, SearchError, ToolError};
pub use motor::MotorController;
pub use publisher::{DebounceGuard, PublishOutcome, Publisher};
pub use tools::{Tool, ToolRegistry};
