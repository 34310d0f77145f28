//! Agent: observes the world each decision tick and sets the child's intent
//! from a pluggable [`Policy`].
//!
//! # Invariants
//! - The controller only writes the child's intent, and only on `fixedUpdate`.
//! - Every `gameplay:catch` is forwarded to the policy as a reward of +1.
//! - A stopped controller observes nothing and decides nothing.

mod controller;
mod observation;
mod policy;

pub use controller::{AgentConfig, AgentError, LearningController};
pub use observation::Observation;
pub use policy::{Policy, SeekNearestPolicy};

pub fn crate_info() -> &'static str {
    "kinloop-agent v0.1.0"
}
