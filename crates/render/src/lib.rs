//! Rendering adapter: a minimal scene graph and a renderer-agnostic interface.
//!
//! # Invariants
//! - Renderers only read the scene graph.
//! - A container's children are traversed in insertion order.
//! - A parent holds its children for traversal only; whoever created a
//!   container keeps its own handle to it.

mod renderer;
mod scene;

pub use renderer::{DebugTextRenderer, RenderError, Renderer};
pub use scene::{Container, Node};

pub fn crate_info() -> &'static str {
    "kinloop-render v0.1.0"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crate_loads() {
        assert!(crate_info().contains("render"));
    }
}
