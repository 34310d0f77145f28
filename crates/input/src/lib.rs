//! Player input: device-agnostic actions queued between ticks and applied to
//! the world on `fixedUpdate`.
//!
//! # Invariants
//! - Actions are applied in the order they were queued, never mid-tick.
//! - Input sources produce `Action`s only; they never touch the world.

pub mod action;
mod controller;

pub use action::{Action, KeyMap};
pub use controller::{InputError, PlayerController};

pub fn crate_info() -> &'static str {
    "kinloop-input v0.1.0"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crate_loads() {
        assert!(crate_info().contains("input"));
    }
}
