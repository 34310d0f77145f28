use std::cell::RefCell;
use std::rc::{Rc, Weak};

use kinloop_events::{EventBus, EventKind, GameEvent, ListenerError, Subscription};
use kinloop_kernel::{Intent, World};
use kinloop_services::{GameContext, RegistryError, Service, Shared};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::observation::Observation;
use crate::policy::{Policy, SeekNearestPolicy};

/// Errors raised by the agent controller.
#[derive(Debug, thiserror::Error)]
pub enum AgentError {
    #[error("decision_interval must be at least 1")]
    InvalidInterval,
    #[error("world was dropped")]
    WorldGone,
    #[error("world is being mutated")]
    WorldBusy,
    #[error("agent controller is borrowed")]
    ControllerBusy,
    #[error(transparent)]
    Registry(#[from] RegistryError),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    /// Fixed ticks between decisions; 1 decides every tick.
    pub decision_interval: u32,
    /// Start deciding as soon as the controller is attached.
    pub autostart: bool,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            decision_interval: 4,
            autostart: true,
        }
    }
}

/// Drives the child from a [`Policy`] and feeds catches back as rewards.
pub struct LearningController {
    policy: Box<dyn Policy>,
    config: AgentConfig,
    running: bool,
    ticks: u64,
    decisions: u64,
    cumulative_reward: f32,
    world: Weak<RefCell<World>>,
    events: Weak<EventBus>,
    subscriptions: Vec<Subscription>,
}

impl LearningController {
    pub fn new(policy: Box<dyn Policy>, config: AgentConfig) -> Result<Self, AgentError> {
        if config.decision_interval == 0 {
            return Err(AgentError::InvalidInterval);
        }
        Ok(Self {
            policy,
            config,
            running: false,
            ticks: 0,
            decisions: 0,
            cumulative_reward: 0.0,
            world: Weak::new(),
            events: Weak::new(),
            subscriptions: Vec::new(),
        })
    }

    /// Controller with the [`SeekNearestPolicy`] baseline.
    pub fn seek_nearest(config: AgentConfig) -> Result<Self, AgentError> {
        Self::new(Box::new(SeekNearestPolicy::new()), config)
    }

    /// Look up the world and subscribe to `fixedUpdate`, `gameplay:catch` and
    /// `gameplay:reset`.
    pub fn attach(controller: &Shared<Self>, ctx: &GameContext) -> Result<(), AgentError> {
        let world = ctx.get::<World>()?;
        let mut this = controller
            .try_borrow_mut()
            .map_err(|_| AgentError::ControllerBusy)?;
        this.detach();

        let events = ctx.events();
        let subscriptions = vec![
            events.on_bound(EventKind::FixedUpdate, controller, Self::on_fixed_update),
            events.on_bound(EventKind::Catch, controller, Self::on_catch),
            events.on_bound(EventKind::Reset, controller, Self::on_reset),
        ];
        this.world = Rc::downgrade(&world);
        this.events = Rc::downgrade(events);
        this.subscriptions = subscriptions;
        if this.config.autostart {
            this.start();
        }
        info!(policy = this.policy.name(), interval = this.config.decision_interval, "agent attached");
        Ok(())
    }

    pub fn detach(&mut self) {
        let subscriptions = std::mem::take(&mut self.subscriptions);
        if let Some(events) = self.events.upgrade() {
            for subscription in &subscriptions {
                events.off(subscription);
            }
        }
    }

    /// Begin deciding. The first decision happens on the next tick.
    pub fn start(&mut self) {
        if !self.running {
            self.running = true;
            self.ticks = 0;
            debug!("agent started");
        }
    }

    /// Stop deciding. The child keeps its last intent.
    pub fn stop(&mut self) {
        if self.running {
            self.running = false;
            debug!(decisions = self.decisions, "agent stopped");
        }
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn decisions(&self) -> u64 {
        self.decisions
    }

    pub fn cumulative_reward(&self) -> f32 {
        self.cumulative_reward
    }

    pub fn policy(&self) -> &dyn Policy {
        self.policy.as_ref()
    }

    /// Count one tick and, on decision ticks, observe the world and set the
    /// child's intent. Returns whether a decision was made.
    pub fn tick(&mut self) -> Result<bool, AgentError> {
        if !self.running {
            return Ok(false);
        }
        let due = self.ticks % u64::from(self.config.decision_interval) == 0;
        self.ticks += 1;
        if !due {
            return Ok(false);
        }

        let world = self.world.upgrade().ok_or(AgentError::WorldGone)?;
        let mut world = world.try_borrow_mut().map_err(|_| AgentError::WorldBusy)?;
        let observation = Observation::of(&world);
        let direction = self.policy.decide(&observation);
        world.set_child_intent(Intent::toward(direction));
        self.decisions += 1;
        debug!(tick = observation.tick, x = direction.x, y = direction.y, "agent decided");
        Ok(true)
    }

    fn on_fixed_update(&mut self, _event: &GameEvent) -> Result<(), ListenerError> {
        self.tick().map(|_| ()).map_err(ListenerError::handler)
    }

    fn on_catch(&mut self, _event: &GameEvent) -> Result<(), ListenerError> {
        self.cumulative_reward += 1.0;
        self.policy.reward(1.0);
        Ok(())
    }

    fn on_reset(&mut self, _event: &GameEvent) -> Result<(), ListenerError> {
        self.policy.end_episode();
        self.ticks = 0;
        Ok(())
    }
}

impl Service for LearningController {
    const KEY: &'static str = "LearningController";

    fn dispose(&mut self) {
        self.stop();
        self.detach();
    }
}

#[cfg(test)]
mod tests {
    use kinloop_kernel::WorldConfig;

    use super::*;

    fn session(config: AgentConfig) -> (GameContext, Shared<World>, Shared<LearningController>) {
        let ctx = GameContext::new();
        let world = ctx.register(World::new(WorldConfig::default()).unwrap());
        let agent = ctx.register(LearningController::seek_nearest(config).unwrap());
        LearningController::attach(&agent, &ctx).unwrap();
        World::attach(&world, ctx.events()).unwrap();
        (ctx, world, agent)
    }

    #[test]
    fn zero_interval_is_rejected() {
        let config = AgentConfig {
            decision_interval: 0,
            ..AgentConfig::default()
        };
        assert!(matches!(
            LearningController::seek_nearest(config),
            Err(AgentError::InvalidInterval)
        ));
    }

    #[test]
    fn decides_every_interval() {
        let (ctx, _world, agent) = session(AgentConfig {
            decision_interval: 3,
            autostart: true,
        });
        for _ in 0..7 {
            ctx.events().emit(&GameEvent::FixedUpdate).unwrap();
        }
        // ticks 0, 3 and 6
        assert_eq!(agent.borrow().decisions(), 3);
    }

    #[test]
    fn child_heads_for_nearest_target() {
        let (ctx, world, _agent) = session(AgentConfig::default());
        let (start, goal) = {
            let w = world.borrow();
            let start = w.child().position();
            let goal = w.nearest_target(start).map(|(_, t)| t.position()).unwrap();
            (start, goal)
        };

        ctx.events().emit(&GameEvent::FixedUpdate).unwrap();
        let after = world.borrow().child().position();
        assert!(after.distance(goal) < start.distance(goal));
    }

    #[test]
    fn stopped_agent_leaves_world_alone() {
        let (ctx, world, agent) = session(AgentConfig {
            decision_interval: 1,
            autostart: false,
        });
        assert!(!agent.borrow().is_running());
        ctx.events().emit(&GameEvent::FixedUpdate).unwrap();
        assert!(world.borrow().child().intent.is_idle());

        agent.borrow_mut().start();
        ctx.events().emit(&GameEvent::FixedUpdate).unwrap();
        assert!(!world.borrow().child().intent.is_idle());

        agent.borrow_mut().stop();
        ctx.events().emit(&GameEvent::FixedUpdate).unwrap();
        assert_eq!(agent.borrow().decisions(), 1);
    }

    #[test]
    fn catches_are_rewarded() {
        let (ctx, world, agent) = session(AgentConfig::default());
        ctx.events().emit(&GameEvent::Catch).unwrap();
        assert_eq!(agent.borrow().cumulative_reward(), 1.0);

        let spot = world.borrow().targets()[0].position();
        world.borrow_mut().teleport_child(spot);
        // Keep the child on the target for this tick.
        agent.borrow_mut().stop();
        ctx.events().emit(&GameEvent::FixedUpdate).unwrap();

        let score = world.borrow().score();
        assert!(score >= 1);
        assert_eq!(agent.borrow().cumulative_reward(), 1.0 + score as f32);
    }

    #[test]
    fn dispose_detaches() {
        let (ctx, _world, agent) = session(AgentConfig::default());
        assert_eq!(ctx.events().listener_count(&EventKind::Catch), 1);
        agent.borrow_mut().dispose();
        assert_eq!(ctx.events().listener_count(&EventKind::Catch), 0);
        assert!(!agent.borrow().is_running());
    }

    #[test]
    fn attach_while_borrowed_is_refused() {
        let ctx = GameContext::new();
        ctx.register(World::new(WorldConfig::default()).unwrap());
        let agent = ctx.register(LearningController::seek_nearest(AgentConfig::default()).unwrap());
        let held = agent.borrow();
        assert!(matches!(
            LearningController::attach(&agent, &ctx),
            Err(AgentError::ControllerBusy)
        ));
        drop(held);
        assert_eq!(ctx.events().listener_count(&EventKind::FixedUpdate), 0);
    }

    #[test]
    fn config_defaults_fill_partial_json() {
        let config: AgentConfig = serde_json::from_str(r#"{ "decision_interval": 2 }"#).unwrap();
        assert_eq!(config.decision_interval, 2);
        assert!(config.autostart);
    }
}
