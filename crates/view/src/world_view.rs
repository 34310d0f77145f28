use std::rc::{Rc, Weak};

use kinloop_events::{EventBus, EventKind, GameEvent, ListenerError, Subscription};
use kinloop_kernel::World;
use kinloop_render::Container;
use kinloop_services::{GameContext, Service, Shared};
use tracing::{debug, info};

use crate::effects::{Hearts, HeartsConfig};
use crate::entity_view::{
    ChildView, EntityView, ParentView, TargetView, ViewError, WorldHandle, read_world,
};
use crate::map_view::MapView;

/// The sub-views a [`WorldView`] drives, in update order.
pub struct Layers {
    pub map: Box<dyn EntityView>,
    pub child: Box<dyn EntityView>,
    pub parent: Box<dyn EntityView>,
    /// Updated in registration order, after the parent.
    pub targets: Vec<Box<dyn EntityView>>,
}

impl Layers {
    /// Standard views for a world with `target_count` targets.
    pub fn for_world(world: &WorldHandle, target_count: usize) -> Self {
        Self {
            map: Box::new(MapView::new(world.clone())),
            child: Box::new(ChildView::new(world.clone())),
            parent: Box::new(ParentView::new(world.clone())),
            targets: (0..target_count)
                .map(|i| Box::new(TargetView::new(world.clone(), i)) as Box<dyn EntityView>)
                .collect(),
        }
    }

    fn len(&self) -> usize {
        3 + self.targets.len()
    }

    fn in_order(&mut self) -> impl Iterator<Item = &mut Box<dyn EntityView>> {
        [&mut self.map, &mut self.child, &mut self.parent]
            .into_iter()
            .chain(self.targets.iter_mut())
    }
}

/// Root view: owns the world's container, its sub-views and the catch effect.
///
/// Listens for `update` to refresh every sub-view and for `gameplay:catch`
/// to burst hearts at the child.
pub struct WorldView {
    container: Container,
    world: WorldHandle,
    layers: Option<Layers>,
    hearts: Option<Hearts>,
    hearts_config: HeartsConfig,
    events: Weak<EventBus>,
    subscriptions: Vec<Subscription>,
    frames: u64,
}

impl WorldView {
    pub fn new() -> Self {
        Self::with_hearts(HeartsConfig::default())
    }

    pub fn with_hearts(hearts_config: HeartsConfig) -> Self {
        Self {
            container: Container::new("world"),
            world: Weak::new(),
            layers: None,
            hearts: None,
            hearts_config,
            events: Weak::new(),
            subscriptions: Vec::new(),
            frames: 0,
        }
    }

    /// Look up the world, compose the standard layers and subscribe `view`
    /// to `update` and `gameplay:catch`.
    pub fn init(view: &Shared<WorldView>, ctx: &GameContext) -> Result<(), ViewError> {
        let world = ctx.get::<World>()?;
        let handle = Rc::downgrade(&world);
        let target_count = world
            .try_borrow()
            .map_err(|_| ViewError::WorldBusy)?
            .targets()
            .len();

        let mut this = view.try_borrow_mut().map_err(|_| ViewError::ViewBusy)?;
        this.compose(handle.clone(), Layers::for_world(&handle, target_count))?;
        this.unsubscribe();

        let events = ctx.events();
        let update = events.on_bound(EventKind::Update, view, Self::handle_update);
        let catch = events.on_bound(EventKind::Catch, view, Self::handle_catch);
        this.subscriptions = vec![update, catch];
        this.events = Rc::downgrade(events);
        info!(targets = target_count, "world view initialised");
        Ok(())
    }

    /// Initialise each layer, attach it under the root container, then put
    /// the effect layer on top. Replaces any earlier composition.
    ///
    /// Every layer is initialised before anything is attached: if one fails,
    /// the previous composition is left untouched.
    pub fn compose(&mut self, world: WorldHandle, mut layers: Layers) -> Result<(), ViewError> {
        for layer in layers.in_order() {
            layer.init()?;
        }

        if let Some(old) = self.layers.take() {
            self.detach_layers(old);
        }
        if let Some(hearts) = self.hearts.take() {
            self.container.remove_child(hearts.layer());
        }
        for layer in layers.in_order() {
            layer.add_to(&self.container);
        }
        self.hearts = Some(Hearts::new(&self.container, self.hearts_config));
        debug!(layers = layers.len(), "world view composed");
        self.world = world;
        self.layers = Some(layers);
        Ok(())
    }

    fn detach_layers(&self, mut layers: Layers) {
        for layer in layers.in_order() {
            self.container.remove_child(layer.container());
        }
    }

    /// Refresh every sub-view, then age the effect by `frame_time`. The first
    /// failing sub-view aborts the rest.
    pub fn update(&mut self, frame_time: f64) -> Result<(), ViewError> {
        let layers = self.layers.as_mut().ok_or(ViewError::NotInitialized)?;
        for layer in layers.in_order() {
            layer.update()?;
        }
        if let Some(hearts) = self.hearts.as_mut() {
            hearts.advance(frame_time as f32);
        }
        self.frames += 1;
        Ok(())
    }

    /// Burst hearts at the child's current position.
    pub fn on_catch(&mut self) -> Result<(), ViewError> {
        let at = read_world(&self.world, |w| Ok(w.child().position()))?;
        let hearts = self.hearts.as_mut().ok_or(ViewError::NotInitialized)?;
        hearts.emit_at(at);
        Ok(())
    }

    fn handle_update(&mut self, event: &GameEvent) -> Result<(), ListenerError> {
        if let GameEvent::Update { frame_time } = event {
            self.update(*frame_time).map_err(ListenerError::handler)?;
        }
        Ok(())
    }

    fn handle_catch(&mut self, _event: &GameEvent) -> Result<(), ListenerError> {
        self.on_catch().map_err(ListenerError::handler)
    }

    fn unsubscribe(&mut self) {
        let subscriptions = std::mem::take(&mut self.subscriptions);
        if let Some(events) = self.events.upgrade() {
            for subscription in &subscriptions {
                events.off(subscription);
            }
        }
    }

    pub fn container(&self) -> &Container {
        &self.container
    }

    pub fn hearts(&self) -> Option<&Hearts> {
        self.hearts.as_ref()
    }

    pub fn is_initialized(&self) -> bool {
        self.layers.is_some()
    }

    /// View updates completed.
    pub fn frames(&self) -> u64 {
        self.frames
    }
}

impl Default for WorldView {
    fn default() -> Self {
        Self::new()
    }
}

impl Service for WorldView {
    const KEY: &'static str = "WorldView";

    fn dispose(&mut self) {
        self.unsubscribe();
        debug!("world view disposed");
    }
}
