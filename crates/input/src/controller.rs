use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::{Rc, Weak};

use kinloop_events::{EventBus, EventKind, GameEvent, ListenerError, Subscription};
use kinloop_kernel::{Intent, ParentBehavior, World};
use kinloop_services::{GameContext, RegistryError, Service, Shared};
use tracing::{debug, info, warn};

use crate::action::{Action, KeyMap};

/// Errors raised while wiring or applying player input.
#[derive(Debug, thiserror::Error)]
pub enum InputError {
    #[error("world was dropped")]
    WorldGone,
    #[error("world is being mutated")]
    WorldBusy,
    #[error("player controller is borrowed")]
    ControllerBusy,
    #[error(transparent)]
    Registry(#[from] RegistryError),
}

/// Queues player actions and applies them to the world on each fixed tick.
pub struct PlayerController {
    keys: KeyMap,
    queue: VecDeque<Action>,
    world: Weak<RefCell<World>>,
    events: Weak<EventBus>,
    subscription: Option<Subscription>,
    applied: u64,
}

impl PlayerController {
    pub fn new() -> Self {
        Self::with_keys(KeyMap::default())
    }

    pub fn with_keys(keys: KeyMap) -> Self {
        Self {
            keys,
            queue: VecDeque::new(),
            world: Weak::new(),
            events: Weak::new(),
            subscription: None,
            applied: 0,
        }
    }

    /// Look up the world and start draining the queue on `fixedUpdate`.
    ///
    /// Attach before the world so queued actions land in the same tick.
    pub fn attach(controller: &Shared<Self>, ctx: &GameContext) -> Result<(), InputError> {
        let world = ctx.get::<World>()?;
        let mut this = controller
            .try_borrow_mut()
            .map_err(|_| InputError::ControllerBusy)?;
        this.detach();

        let events = ctx.events();
        let subscription = events.on_bound(EventKind::FixedUpdate, controller, Self::on_fixed_update);

        this.world = Rc::downgrade(&world);
        this.events = Rc::downgrade(events);
        this.subscription = Some(subscription);
        info!("player controller attached");
        Ok(())
    }

    pub fn detach(&mut self) -> bool {
        let Some(subscription) = self.subscription.take() else {
            return false;
        };
        if let Some(events) = self.events.upgrade() {
            events.off(&subscription);
        }
        true
    }

    pub fn push(&mut self, action: Action) {
        self.queue.push_back(action);
    }

    /// Queue the action bound to `key`. Returns `false` for unbound keys.
    pub fn press(&mut self, key: &str) -> bool {
        match self.keys.action_for(key) {
            Some(action) => {
                self.push(action);
                true
            }
            None => false,
        }
    }

    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// Actions applied so far.
    pub fn applied(&self) -> u64 {
        self.applied
    }

    /// Apply every queued action in order.
    pub fn apply_pending(&mut self) -> Result<(), InputError> {
        if self.queue.is_empty() {
            return Ok(());
        }
        let world = self.world.upgrade().ok_or(InputError::WorldGone)?;
        let mut resets = 0;
        {
            let mut world = world.try_borrow_mut().map_err(|_| InputError::WorldBusy)?;
            while let Some(action) = self.queue.pop_front() {
                match action {
                    Action::Steer(direction) => {
                        world.set_parent_behavior(ParentBehavior::Steer(Intent::toward(direction)));
                    }
                    Action::Release => world.set_parent_behavior(ParentBehavior::Follow),
                    Action::Reset => {
                        world.reset();
                        resets += 1;
                    }
                }
                self.applied += 1;
                debug!(?action, "action applied");
            }
        }

        if let Some(events) = self.events.upgrade() {
            for _ in 0..resets {
                if let Err(err) = events.emit(&GameEvent::Reset) {
                    warn!(error = %err, "reset listeners failed");
                }
            }
        }
        Ok(())
    }

    fn on_fixed_update(&mut self, _event: &GameEvent) -> Result<(), ListenerError> {
        self.apply_pending().map_err(ListenerError::handler)
    }
}

impl Default for PlayerController {
    fn default() -> Self {
        Self::new()
    }
}

impl Service for PlayerController {
    const KEY: &'static str = "PlayerController";

    fn dispose(&mut self) {
        self.detach();
        self.queue.clear();
    }
}
