//! Event bus: fan-out of tick boundaries and gameplay notifications.
//!
//! # Invariants
//! - Listeners for an event fire in registration order, once per registration.
//! - Every emission runs against a snapshot of the listener list taken when the
//!   emission starts; (un)subscribing during an emission only affects later ones.
//! - No internal borrow is held while a listener runs, so listeners may
//!   subscribe, unsubscribe and emit re-entrantly.
//! - Failure handling is chosen per event kind ([`DispatchPolicy`]).

mod bus;
mod error;
mod event;

pub use bus::{EmitReport, EventBus, Subscription};
pub use error::{EmitError, ListenerError};
pub use event::{DispatchPolicy, EventKind, GameEvent};

pub fn crate_info() -> &'static str {
    "kinloop-events v0.1.0"
}
