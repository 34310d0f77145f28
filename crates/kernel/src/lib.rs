//! World kernel: authoritative simulation state advanced one fixed step per
//! `fixedUpdate`.
//!
//! # Invariants
//! - The world is only mutated while handling `fixedUpdate` (its own step or
//!   controllers applying queued intent).
//! - The set of entities (map, child, parent, targets) is fixed at
//!   construction; reset moves them, never replaces them.
//! - Placement is deterministic for a given seed.

mod config;
mod entity;
pub mod world;

pub use config::{ConfigError, WorldConfig};
pub use entity::{Body, Child, Intent, Map, Parent, ParentBehavior, Target};
pub use world::{AttachError, World, WorldEvent};

pub fn crate_info() -> &'static str {
    "kinloop-kernel v0.1.0"
}
