//! Service registry and game context: cross-subsystem discovery without
//! constructor-time wiring.
//!
//! # Invariants
//! - A service must be registered before it is looked up.
//! - Lookups after registration return the identical instance.
//! - Services are keyed by type; `Service::KEY` only names them in diagnostics.
//! - Teardown disposes services in reverse registration order.

mod context;
mod registry;

pub use context::GameContext;
pub use registry::{RegistryError, Service, ServiceRegistry, Shared};

pub fn crate_info() -> &'static str {
    "kinloop-services v0.1.0"
}
