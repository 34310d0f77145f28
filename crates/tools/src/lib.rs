//! Developer tooling: read-only inspection of a running session.
//!
//! # Invariants
//! - Inspection never mutates the world, the registry or the bus.

mod inspector;

pub use inspector::{SessionInspector, SessionSummary, WorldSummary};

pub fn crate_info() -> &'static str {
    "kinloop-tools v0.1.0"
}
