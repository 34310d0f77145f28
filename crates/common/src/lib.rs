//! Shared types and utilities used across the kinloop crates.
//!
//! # Invariants
//! - Positions are 2D map coordinates (`glam::Vec2`).
//! - Randomness is deterministic: the same seed yields the same sequence.

mod rng;
mod types;

pub use glam::Vec2;
pub use rng::{SeededRng, splitmix64};
pub use types::{Bounds, EntityId};

pub fn crate_info() -> &'static str {
    "kinloop-common v0.1.0"
}
