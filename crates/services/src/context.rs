use std::rc::Rc;

use kinloop_events::EventBus;
use tracing::info;

use crate::registry::{RegistryError, Service, ServiceRegistry, Shared};

/// Everything a component needs to find its collaborators: the service
/// registry and the shared event bus.
///
/// Passed explicitly to each component's `init` instead of living in a
/// global.
#[derive(Debug, Default)]
pub struct GameContext {
    services: ServiceRegistry,
    events: Rc<EventBus>,
}

impl GameContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn services(&self) -> &ServiceRegistry {
        &self.services
    }

    /// The shared event bus.
    pub fn events(&self) -> &Rc<EventBus> {
        &self.events
    }

    pub fn register<S: Service>(&self, service: S) -> Shared<S> {
        self.services.register(service)
    }

    pub fn get<S: Service>(&self) -> Result<Shared<S>, RegistryError> {
        self.services.get::<S>()
    }

    /// End the session: dispose services (which unsubscribe themselves),
    /// then drop whatever listeners remain. The context can be rewired
    /// afterwards.
    pub fn teardown(&self) -> Result<(), RegistryError> {
        let disposed = self.services.dispose_all();
        self.events.clear();
        info!("game context torn down");
        disposed
    }
}
