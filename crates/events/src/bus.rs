use std::any::Any;
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::{Rc, Weak};

use tracing::{debug, trace, warn};

use crate::error::{EmitError, ListenerError};
use crate::event::{DispatchPolicy, EventKind, GameEvent};

type ListenerFn = dyn FnMut(&GameEvent) -> Result<(), ListenerError>;
type Listener = Rc<RefCell<ListenerFn>>;

/// Handle returned by a registration; pass it to [`EventBus::off`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Subscription {
    id: u64,
    kind: EventKind,
}

impl Subscription {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn kind(&self) -> &EventKind {
        &self.kind
    }
}

/// Outcome of an emission that did not abort.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EmitReport {
    /// Listeners that ran and returned `Ok`.
    pub delivered: usize,
    /// Listeners whose error was isolated and logged.
    pub failed: usize,
}

struct Entry {
    id: u64,
    /// Set for one-shot entries; flipped by the emission that runs it.
    spent: Option<Rc<Cell<bool>>>,
    listener: Listener,
    /// Set for bound listeners; once the context is gone the entry is dead.
    context: Option<Weak<dyn Any>>,
}

impl Entry {
    fn is_alive(&self) -> bool {
        self.context
            .as_ref()
            .is_none_or(|weak| weak.strong_count() > 0)
    }
}

/// One listener captured by an emission snapshot.
struct Pending {
    id: u64,
    listener: Listener,
    spent: Option<Rc<Cell<bool>>>,
}

/// Single-threaded publish/subscribe hub.
///
/// Shared as `Rc<EventBus>`; all methods take `&self`. Listener tables are
/// only borrowed while registering or taking an emission snapshot, never
/// while a listener runs.
pub struct EventBus {
    listeners: RefCell<HashMap<EventKind, Vec<Entry>>>,
    policies: RefCell<HashMap<EventKind, DispatchPolicy>>,
    next_id: Cell<u64>,
}

impl EventBus {
    pub fn new() -> Self {
        Self {
            listeners: RefCell::new(HashMap::new()),
            policies: RefCell::new(HashMap::new()),
            next_id: Cell::new(1),
        }
    }

    /// Register a listener. Registering the same closure twice yields two
    /// independent subscriptions that both fire.
    pub fn on<F>(&self, kind: EventKind, listener: F) -> Subscription
    where
        F: FnMut(&GameEvent) -> Result<(), ListenerError> + 'static,
    {
        self.insert(kind, Rc::new(RefCell::new(listener)), false, None)
    }

    /// Register a listener that fires at most once.
    ///
    /// The entry is consumed when it runs, so an emission aborted before its
    /// turn leaves it registered for the next one.
    pub fn once<F>(&self, kind: EventKind, listener: F) -> Subscription
    where
        F: FnMut(&GameEvent) -> Result<(), ListenerError> + 'static,
    {
        self.insert(kind, Rc::new(RefCell::new(listener)), true, None)
    }

    /// Register `method` to run against `context`.
    ///
    /// The bus only keeps a weak reference: when the context is dropped the
    /// entry stops firing and is pruned at the next emission.
    pub fn on_bound<C>(
        &self,
        kind: EventKind,
        context: &Rc<RefCell<C>>,
        method: fn(&mut C, &GameEvent) -> Result<(), ListenerError>,
    ) -> Subscription
    where
        C: 'static,
    {
        let weak = Rc::downgrade(context);
        let marker: Weak<dyn Any> = weak.clone();
        let listener = move |event: &GameEvent| {
            let Some(context) = weak.upgrade() else {
                return Ok(());
            };
            let mut context = context
                .try_borrow_mut()
                .map_err(|_| ListenerError::ContextBusy)?;
            method(&mut context, event)
        };
        self.insert(kind, Rc::new(RefCell::new(listener)), false, Some(marker))
    }

    fn insert(
        &self,
        kind: EventKind,
        listener: Listener,
        once: bool,
        context: Option<Weak<dyn Any>>,
    ) -> Subscription {
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        trace!(event = %kind, id, once, "listener registered");
        self.listeners
            .borrow_mut()
            .entry(kind.clone())
            .or_default()
            .push(Entry {
                id,
                spent: once.then(|| Rc::new(Cell::new(false))),
                listener,
                context,
            });
        Subscription { id, kind }
    }

    /// Remove a subscription. Returns `false` if it was not registered
    /// (already removed, fired as one-shot, or from another bus).
    pub fn off(&self, subscription: &Subscription) -> bool {
        self.remove(&subscription.kind, subscription.id)
    }

    fn remove(&self, kind: &EventKind, id: u64) -> bool {
        let mut listeners = self.listeners.borrow_mut();
        let Some(entries) = listeners.get_mut(kind) else {
            return false;
        };
        match entries.iter().position(|e| e.id == id) {
            Some(pos) => {
                entries.remove(pos);
                trace!(event = %kind, id, "listener removed");
                true
            }
            None => false,
        }
    }

    /// Synchronously deliver `event` to every listener registered for its
    /// kind when the emission starts, in registration order.
    ///
    /// # Errors
    ///
    /// Under [`DispatchPolicy::FailFast`] the first listener error aborts the
    /// emission. Under [`DispatchPolicy::Isolate`] errors are logged and
    /// counted in the report instead.
    pub fn emit(&self, event: &GameEvent) -> Result<EmitReport, EmitError> {
        let kind = event.kind();
        let snapshot = self.snapshot(&kind);
        let policy = self.policy(&kind);
        let mut report = EmitReport::default();

        for Pending { id, listener, spent } in snapshot {
            if let Some(spent) = spent {
                // A nested emission may already have run this one-shot.
                if spent.replace(true) {
                    continue;
                }
                self.remove(&kind, id);
            }
            let result = match listener.try_borrow_mut() {
                Ok(mut listener) => (&mut *listener)(event),
                Err(_) => Err(ListenerError::Reentrant),
            };
            match result {
                Ok(()) => report.delivered += 1,
                Err(source) => match policy {
                    DispatchPolicy::FailFast => {
                        return Err(EmitError::Listener {
                            event: kind.name().to_string(),
                            subscription: id,
                            source,
                        });
                    }
                    DispatchPolicy::Isolate => {
                        warn!(event = %kind, id, error = %source, "listener failed, continuing");
                        report.failed += 1;
                    }
                },
            }
        }

        Ok(report)
    }

    /// Copy the listener list for `kind`, dropping dead bound entries.
    fn snapshot(&self, kind: &EventKind) -> Vec<Pending> {
        let mut listeners = self.listeners.borrow_mut();
        let Some(entries) = listeners.get_mut(kind) else {
            return Vec::new();
        };

        let before = entries.len();
        entries.retain(Entry::is_alive);
        if entries.len() != before {
            debug!(event = %kind, pruned = before - entries.len(), "pruned dropped listener contexts");
        }

        entries
            .iter()
            .map(|e| Pending {
                id: e.id,
                listener: Rc::clone(&e.listener),
                spent: e.spent.clone(),
            })
            .collect()
    }

    /// Current failure policy for `kind`.
    pub fn policy(&self, kind: &EventKind) -> DispatchPolicy {
        self.policies
            .borrow()
            .get(kind)
            .copied()
            .unwrap_or_else(|| kind.default_policy())
    }

    pub fn set_policy(&self, kind: EventKind, policy: DispatchPolicy) {
        self.policies.borrow_mut().insert(kind, policy);
    }

    /// Number of live registrations for `kind`.
    pub fn listener_count(&self, kind: &EventKind) -> usize {
        self.listeners
            .borrow()
            .get(kind)
            .map_or(0, |entries| entries.iter().filter(|e| e.is_alive()).count())
    }

    /// Kinds with at least one registration, sorted.
    pub fn kinds(&self) -> Vec<EventKind> {
        let mut kinds: Vec<EventKind> = self
            .listeners
            .borrow()
            .iter()
            .filter(|(_, entries)| !entries.is_empty())
            .map(|(kind, _)| kind.clone())
            .collect();
        kinds.sort();
        kinds
    }

    /// Drop every registration. Policies are kept.
    pub fn clear(&self) {
        self.listeners.borrow_mut().clear();
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let counts: Vec<(EventKind, usize)> = self
            .kinds()
            .into_iter()
            .map(|kind| {
                let n = self.listener_count(&kind);
                (kind, n)
            })
            .collect();
        f.debug_struct("EventBus")
            .field("listeners", &counts)
            .field("next_id", &self.next_id.get())
            .finish_non_exhaustive()
    }
}
