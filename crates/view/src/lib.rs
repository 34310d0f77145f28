//! Views: read-only observers that mirror world entities into the scene graph
//! on every `update` tick.
//!
//! # Invariants
//! - Views never mutate the world; they hold weak, non-owning handles to it.
//! - `WorldView` updates its slots in a fixed order: map, child, parent, then
//!   targets in registration order.
//! - A failing sub-view aborts the rest of that tick's view update.

mod effects;
mod entity_view;
mod map_view;
mod world_view;

pub use effects::{Hearts, HeartsConfig};
pub use entity_view::{ChildView, EntityView, ParentView, TargetView, ViewError, WorldHandle};
pub use map_view::MapView;
pub use world_view::{Layers, WorldView};

pub fn crate_info() -> &'static str {
    "kinloop-view v0.1.0"
}
