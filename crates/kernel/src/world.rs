use std::rc::{Rc, Weak};

use glam::Vec2;
use kinloop_common::SeededRng;
use kinloop_events::{EventBus, EventKind, GameEvent, ListenerError, Subscription};
use kinloop_services::{Service, Shared};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::{ConfigError, WorldConfig};
use crate::entity::{Body, Child, Intent, Map, Parent, ParentBehavior, Target};

/// Something noteworthy that happened during a step.
/// Errors from wiring a world onto an event bus.
#[derive(Debug, thiserror::Error)]
pub enum AttachError {
    #[error("world is borrowed, cannot attach")]
    Busy,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum WorldEvent {
    /// The child caught target `target` at `at`; the target has already been
    /// moved to a new spot.
    Caught { target: usize, at: Vec2 },
}

/// Ties a world to the bus it steps on.
#[derive(Debug)]
struct Attachment {
    events: Weak<EventBus>,
    subscription: Subscription,
}

/// The authoritative simulation state.
///
/// Renderers and controllers read it; only fixed steps and controllers
/// acting inside `fixedUpdate` write it.
#[derive(Debug)]
pub struct World {
    config: WorldConfig,
    map: Map,
    child: Child,
    parent: Parent,
    targets: Vec<Target>,
    rng: SeededRng,
    tick: u64,
    score: u32,
    attachment: Option<Attachment>,
}

impl World {
    /// Build the world and place every entity.
    ///
    /// # Errors
    ///
    /// Returns the validation error if `config` is unusable.
    pub fn new(config: WorldConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let map = Map { bounds: config.map };
        let center = map.bounds.center();
        let targets = (0..config.target_count)
            .map(|_| Target {
                body: Body::at(center),
                catches: 0,
            })
            .collect();

        let mut world = Self {
            rng: SeededRng::new(config.seed),
            map,
            child: Child {
                body: Body::at(center),
                intent: Intent::IDLE,
            },
            parent: Parent {
                body: Body::at(center),
                behavior: ParentBehavior::Follow,
            },
            targets,
            tick: 0,
            score: 0,
            attachment: None,
            config,
        };
        world.reset();
        info!(
            targets = world.targets.len(),
            seed = world.config.seed,
            "world created"
        );
        Ok(world)
    }

    /// Put the child in the centre with the parent beside it, scatter the
    /// targets, zero the score and tick.
    pub fn reset(&mut self) {
        let center = self.map.bounds.center();
        self.child.body.position = center;
        self.child.body.velocity = Vec2::ZERO;
        self.child.intent = Intent::IDLE;
        self.parent.body.position = self
            .map
            .bounds
            .clamp(center - Vec2::new(self.config.follow_distance, 0.0));
        self.parent.body.velocity = Vec2::ZERO;
        self.parent.behavior = ParentBehavior::Follow;

        for i in 0..self.targets.len() {
            let spot = self.free_spot();
            let target = &mut self.targets[i];
            target.body.position = spot;
            target.catches = 0;
        }
        self.tick = 0;
        self.score = 0;
        debug!("world reset");
    }

    pub fn config(&self) -> &WorldConfig {
        &self.config
    }

    /// Seconds per fixed step.
    pub fn time_step(&self) -> f64 {
        self.config.time_step
    }

    pub fn map(&self) -> &Map {
        &self.map
    }

    pub fn child(&self) -> &Child {
        &self.child
    }

    pub fn parent(&self) -> &Parent {
        &self.parent
    }

    pub fn targets(&self) -> &[Target] {
        &self.targets
    }

    pub fn target(&self, index: usize) -> Option<&Target> {
        self.targets.get(index)
    }

    /// Fixed steps taken since creation or the last reset.
    pub fn tick(&self) -> u64 {
        self.tick
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    /// Index and reference of the target closest to `from`.
    pub fn nearest_target(&self, from: Vec2) -> Option<(usize, &Target)> {
        self.targets.iter().enumerate().min_by(|(_, a), (_, b)| {
            a.position()
                .distance_squared(from)
                .total_cmp(&b.position().distance_squared(from))
        })
    }

    pub fn set_child_intent(&mut self, intent: Intent) {
        self.child.intent = intent;
    }

    pub fn set_parent_behavior(&mut self, behavior: ParentBehavior) {
        self.parent.behavior = behavior;
    }

    /// Move the child directly, clamped to the map. Used by tooling and
    /// scripted scenarios.
    pub fn teleport_child(&mut self, position: Vec2) {
        self.child.body.position = self.map.bounds.clamp(position);
    }

    /// Advance the simulation by one `time_step`.
    pub fn step(&mut self) -> Vec<WorldEvent> {
        let dt = self.config.time_step as f32;
        let bounds = self.map.bounds;

        let child = &mut self.child.body;
        child.velocity = self.child.intent.direction() * self.config.child_speed;
        child.position = bounds.clamp(child.position + child.velocity * dt);

        let child_pos = self.child.body.position;
        let parent = &mut self.parent.body;
        let before = parent.position;
        match self.parent.behavior {
            ParentBehavior::Follow => {
                let offset = child_pos - parent.position;
                let gap = offset.length() - self.config.follow_distance;
                if gap > 0.0 {
                    let stride = (self.config.parent_speed * dt).min(gap);
                    parent.position += offset.normalize_or_zero() * stride;
                }
            }
            ParentBehavior::Steer(intent) => {
                parent.position += intent.direction() * self.config.parent_speed * dt;
            }
        }
        parent.position = bounds.clamp(parent.position);
        parent.velocity = if dt > 0.0 {
            (parent.position - before) / dt
        } else {
            Vec2::ZERO
        };

        let mut events = Vec::new();
        for i in 0..self.targets.len() {
            let at = self.targets[i].position();
            if at.distance(child_pos) <= self.config.catch_radius {
                let spot = self.free_spot();
                let target = &mut self.targets[i];
                target.catches += 1;
                target.body.position = spot;
                self.score += 1;
                debug!(target = i, score = self.score, "target caught");
                events.push(WorldEvent::Caught { target: i, at });
            }
        }

        self.tick += 1;
        events
    }

    /// A random point inside the map, preferably outside twice the catch
    /// radius of the child.
    fn free_spot(&mut self) -> Vec2 {
        let bounds = self.map.bounds;
        let margin = self
            .config
            .catch_radius
            .min(bounds.width * 0.25)
            .min(bounds.height * 0.25);
        let keep_away = self.config.catch_radius * 2.0;
        let mut spot = Vec2::ZERO;
        for _ in 0..8 {
            spot = Vec2::new(
                self.rng.range(margin, bounds.width - margin),
                self.rng.range(margin, bounds.height - margin),
            );
            if spot.distance(self.child.body.position) > keep_away {
                break;
            }
        }
        spot
    }

    /// Subscribe `world` to `fixedUpdate` on `events`.
    ///
    /// Each tick steps the world, then emits `gameplay:catch` once per catch
    /// after the world borrow has been released, so catch listeners can read
    /// it. Replaces any previous attachment.
    ///
    /// # Errors
    ///
    /// [`AttachError::Busy`] if `world` is currently borrowed; nothing is
    /// subscribed in that case.
    pub fn attach(world: &Shared<World>, events: &Rc<EventBus>) -> Result<(), AttachError> {
        let mut this = world.try_borrow_mut().map_err(|_| AttachError::Busy)?;
        let weak_world = Rc::downgrade(world);
        let weak_bus = Rc::downgrade(events);
        let subscription = events.on(EventKind::FixedUpdate, move |_| {
            let Some(world) = weak_world.upgrade() else {
                return Ok(());
            };
            let happened = world
                .try_borrow_mut()
                .map_err(|_| ListenerError::ContextBusy)?
                .step();
            let Some(bus) = weak_bus.upgrade() else {
                return Ok(());
            };
            for event in happened {
                match event {
                    WorldEvent::Caught { .. } => {
                        bus.emit(&GameEvent::Catch)
                            .map_err(ListenerError::handler)?;
                    }
                }
            }
            Ok(())
        });

        this.detach();
        this.attachment = Some(Attachment {
            events: Rc::downgrade(events),
            subscription,
        });
        Ok(())
    }

    /// Stop stepping on the bus. Returns `false` if not attached.
    pub fn detach(&mut self) -> bool {
        let Some(attachment) = self.attachment.take() else {
            return false;
        };
        if let Some(events) = attachment.events.upgrade() {
            events.off(&attachment.subscription);
        }
        true
    }

    pub fn is_attached(&self) -> bool {
        self.attachment.is_some()
    }
}

impl Service for World {
    const KEY: &'static str = "World";

    fn dispose(&mut self) {
        self.detach();
    }
}

#[cfg(test)]
mod tests {
    use std::cell::{Cell, RefCell};

    use super::*;

    fn config() -> WorldConfig {
        WorldConfig {
            time_step: 0.1,
            target_count: 3,
            child_speed: 2.0,
            parent_speed: 1.0,
            catch_radius: 0.5,
            follow_distance: 1.0,
            ..WorldConfig::default()
        }
    }

    #[test]
    fn world_starts_centered() {
        let w = World::new(config()).unwrap();
        assert_eq!(w.tick(), 0);
        assert_eq!(w.score(), 0);
        assert_eq!(w.child().position(), w.map().bounds.center());
        assert_eq!(w.targets().len(), 3);
        for t in w.targets() {
            assert!(w.map().bounds.contains(t.position()));
            assert!(t.position().distance(w.child().position()) > 0.5);
        }
    }

    #[test]
    fn invalid_config_is_rejected() {
        let cfg = WorldConfig {
            time_step: f64::NAN,
            ..config()
        };
        assert!(World::new(cfg).is_err());
    }

    #[test]
    fn same_seed_same_layout() {
        let a = World::new(config()).unwrap();
        let b = World::new(config()).unwrap();
        let pa: Vec<Vec2> = a.targets().iter().map(Target::position).collect();
        let pb: Vec<Vec2> = b.targets().iter().map(Target::position).collect();
        assert_eq!(pa, pb);
    }

    #[test]
    fn step_moves_child_along_intent() {
        let mut w = World::new(config()).unwrap();
        let start = w.child().position();
        w.set_child_intent(Intent::toward(Vec2::X));
        w.step();
        let moved = w.child().position() - start;
        assert!((moved.x - 0.2).abs() < 1e-5);
        assert_eq!(moved.y, 0.0);
        assert_eq!(w.tick(), 1);
    }

    #[test]
    fn child_is_clamped_to_map() {
        let mut w = World::new(config()).unwrap();
        w.teleport_child(Vec2::new(0.05, 3.0));
        w.set_child_intent(Intent::toward(-Vec2::X));
        w.step();
        assert_eq!(w.child().position().x, 0.0);
    }

    #[test]
    fn parent_follows_until_follow_distance() {
        let mut w = World::new(config()).unwrap();
        w.teleport_child(w.parent().position() + Vec2::new(3.0, 0.0));
        for _ in 0..200 {
            w.step();
        }
        let gap = w.child().position().distance(w.parent().position());
        assert!((gap - 1.0).abs() < 1e-3, "gap was {gap}");
    }

    #[test]
    fn steered_parent_ignores_child() {
        let mut w = World::new(config()).unwrap();
        let start = w.parent().position();
        w.set_parent_behavior(ParentBehavior::Steer(Intent::toward(Vec2::Y)));
        w.step();
        let moved = w.parent().position() - start;
        assert!((moved.y - 0.1).abs() < 1e-5);
        assert!((w.parent().body.velocity.y - 1.0).abs() < 1e-3);
    }

    #[test]
    fn catching_relocates_target_and_scores() {
        let mut w = World::new(config()).unwrap();
        let spot = w.targets()[1].position();
        w.teleport_child(spot);

        let events = w.step();
        assert_eq!(events, vec![WorldEvent::Caught { target: 1, at: spot }]);
        assert_eq!(w.score(), 1);
        assert_eq!(w.targets()[1].catches, 1);
        assert_ne!(w.targets()[1].position(), spot);
    }

    #[test]
    fn reset_restores_layout_and_score() {
        let mut w = World::new(config()).unwrap();
        let ids: Vec<_> = w.targets().iter().map(|t| t.body.id).collect();
        w.teleport_child(w.targets()[0].position());
        w.step();
        assert_eq!(w.score(), 1);

        w.reset();
        assert_eq!(w.score(), 0);
        assert_eq!(w.tick(), 0);
        assert_eq!(w.child().position(), w.map().bounds.center());
        let after: Vec<_> = w.targets().iter().map(|t| t.body.id).collect();
        assert_eq!(ids, after);
    }

    #[test]
    fn nearest_target_picks_closest() {
        let w = World::new(config()).unwrap();
        let spot = w.targets()[2].position();
        let (index, _) = w.nearest_target(spot).unwrap();
        assert_eq!(index, 2);
    }

    #[test]
    fn attached_world_steps_and_emits_catch() {
        let bus = Rc::new(EventBus::new());
        let world = Rc::new(RefCell::new(World::new(config()).unwrap()));
        World::attach(&world, &bus).unwrap();

        let catches = Rc::new(Cell::new(0));
        let seen = Rc::clone(&catches);
        let reader = Rc::clone(&world);
        bus.on(EventKind::Catch, move |_| {
            // The world must be readable from a catch listener.
            assert_eq!(reader.try_borrow().map(|w| w.score()).ok(), Some(1));
            seen.set(seen.get() + 1);
            Ok(())
        });

        bus.emit(&GameEvent::FixedUpdate).unwrap();
        assert_eq!(world.borrow().tick(), 1);
        assert_eq!(catches.get(), 0);

        let spot = world.borrow().targets()[0].position();
        world.borrow_mut().teleport_child(spot);
        bus.emit(&GameEvent::FixedUpdate).unwrap();
        assert_eq!(catches.get(), 1);
    }

    #[test]
    fn dispose_detaches_from_bus() {
        let bus = Rc::new(EventBus::new());
        let world = Rc::new(RefCell::new(World::new(config()).unwrap()));
        World::attach(&world, &bus).unwrap();
        assert_eq!(bus.listener_count(&EventKind::FixedUpdate), 1);

        world.borrow_mut().dispose();
        assert!(!world.borrow().is_attached());
        assert_eq!(bus.listener_count(&EventKind::FixedUpdate), 0);
    }

    #[test]
    fn attach_while_borrowed_is_refused() {
        let bus = Rc::new(EventBus::new());
        let world = Rc::new(RefCell::new(World::new(config()).unwrap()));
        let held = world.borrow();
        assert!(matches!(World::attach(&world, &bus), Err(AttachError::Busy)));
        drop(held);
        assert_eq!(bus.listener_count(&EventKind::FixedUpdate), 0);
        assert!(!world.borrow().is_attached());
    }
}
