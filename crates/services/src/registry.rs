use std::any::{Any, TypeId};
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use tracing::{debug, info, warn};

/// Shared, single-threaded handle to a registered service.
pub type Shared<S> = Rc<RefCell<S>>;

/// A process-wide subsystem discoverable through the [`ServiceRegistry`].
pub trait Service: 'static {
    /// Human-readable name used in logs and errors.
    const KEY: &'static str;

    /// Release listeners and other session resources. Called once during
    /// [`ServiceRegistry::dispose_all`].
    fn dispose(&mut self) {}
}

/// Errors from registry operations.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("service `{key}` is not registered")]
    ServiceNotFound { key: &'static str },
    #[error("service `{key}` is borrowed and cannot be disposed")]
    ServiceBusy { key: &'static str },
}

struct Slot {
    key: &'static str,
    instance: Rc<dyn Any>,
    dispose: fn(&dyn Any, &'static str) -> Result<(), RegistryError>,
}

fn dispose_slot<S: Service>(instance: &dyn Any, key: &'static str) -> Result<(), RegistryError> {
    if let Some(cell) = instance.downcast_ref::<RefCell<S>>() {
        cell.try_borrow_mut()
            .map_err(|_| RegistryError::ServiceBusy { key })?
            .dispose();
    }
    Ok(())
}

/// Typed store of singleton services.
///
/// All methods take `&self` so the registry can be reached through a shared
/// [`GameContext`](crate::GameContext) while services are being initialised.
#[derive(Default)]
pub struct ServiceRegistry {
    slots: RefCell<HashMap<TypeId, Slot>>,
    order: RefCell<Vec<TypeId>>,
}

impl ServiceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap and register `service`, returning the shared handle.
    pub fn register<S: Service>(&self, service: S) -> Shared<S> {
        let shared = Rc::new(RefCell::new(service));
        self.register_shared(Rc::clone(&shared));
        shared
    }

    /// Register an existing handle. Replaces (and returns) any instance
    /// previously registered for `S`.
    pub fn register_shared<S: Service>(&self, shared: Shared<S>) -> Option<Shared<S>> {
        let type_id = TypeId::of::<S>();
        let slot = Slot {
            key: S::KEY,
            instance: shared,
            dispose: dispose_slot::<S>,
        };
        let previous = self.slots.borrow_mut().insert(type_id, slot);
        match previous {
            Some(old) => {
                warn!(key = S::KEY, "service registered twice, replacing previous instance");
                old.instance.downcast::<RefCell<S>>().ok()
            }
            None => {
                self.order.borrow_mut().push(type_id);
                debug!(key = S::KEY, "service registered");
                None
            }
        }
    }

    /// Look up a service.
    ///
    /// # Errors
    ///
    /// [`RegistryError::ServiceNotFound`] if `S` was never registered.
    pub fn get<S: Service>(&self) -> Result<Shared<S>, RegistryError> {
        let slots = self.slots.borrow();
        slots
            .get(&TypeId::of::<S>())
            .and_then(|slot| Rc::clone(&slot.instance).downcast::<RefCell<S>>().ok())
            .ok_or(RegistryError::ServiceNotFound { key: S::KEY })
    }

    pub fn contains<S: Service>(&self) -> bool {
        self.slots.borrow().contains_key(&TypeId::of::<S>())
    }

    /// Keys in registration order.
    pub fn keys(&self) -> Vec<&'static str> {
        let slots = self.slots.borrow();
        self.order
            .borrow()
            .iter()
            .filter_map(|id| slots.get(id).map(|slot| slot.key))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.slots.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.borrow().is_empty()
    }

    /// Dispose every service in reverse registration order and empty the
    /// registry. A busy service is skipped; the first such error is returned
    /// after all other services have been disposed.
    pub fn dispose_all(&self) -> Result<(), RegistryError> {
        let order = std::mem::take(&mut *self.order.borrow_mut());
        let mut slots = std::mem::take(&mut *self.slots.borrow_mut());
        let mut first_error = None;

        for type_id in order.iter().rev() {
            let Some(slot) = slots.remove(type_id) else {
                continue;
            };
            match (slot.dispose)(&*slot.instance, slot.key) {
                Ok(()) => debug!(key = slot.key, "service disposed"),
                Err(err) => {
                    warn!(key = slot.key, error = %err, "service dispose failed");
                    first_error.get_or_insert(err);
                }
            }
        }

        info!(services = order.len(), "registry disposed");
        first_error.map_or(Ok(()), Err)
    }
}

impl std::fmt::Debug for ServiceRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceRegistry")
            .field("keys", &self.keys())
            .finish()
    }
}
