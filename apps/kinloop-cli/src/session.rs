use std::cell::RefCell;
use std::rc::Rc;

use anyhow::Context;
use kinloop_agent::LearningController;
use kinloop_driver::Driver;
use kinloop_input::PlayerController;
use kinloop_kernel::World;
use kinloop_render::{Container, DebugTextRenderer};
use kinloop_services::{GameContext, Shared};
use kinloop_view::WorldView;
use tracing::info;

use crate::config::GameConfig;

/// A wired game: services registered, listeners attached, driver stopped.
pub struct Session {
    pub ctx: GameContext,
    pub world: Shared<World>,
    pub view: Shared<WorldView>,
    pub player: Shared<PlayerController>,
    pub agent: Shared<LearningController>,
    pub driver: Rc<RefCell<Driver<DebugTextRenderer>>>,
}

impl Session {
    pub fn wire(config: &GameConfig) -> anyhow::Result<Self> {
        let ctx = GameContext::new();
        let world = ctx.register(World::new(config.world.clone()).context("invalid world config")?);
        let view = ctx.register(WorldView::new());
        let agent = ctx.register(LearningController::seek_nearest(config.agent.clone())?);
        let player = ctx.register(PlayerController::new());

        // fixedUpdate runs in subscription order: controllers set intent,
        // then the world steps.
        PlayerController::attach(&player, &ctx).context("attaching player controller")?;
        LearningController::attach(&agent, &ctx).context("attaching agent")?;
        World::attach(&world, ctx.events()).context("attaching world")?;
        WorldView::init(&view, &ctx).context("initialising world view")?;

        let stage = Container::new("stage");
        stage.add_child(view.borrow().container());
        let dt = world.borrow().time_step();
        let driver = Driver::new(
            dt,
            &config.driver,
            Rc::clone(ctx.events()),
            stage,
            DebugTextRenderer::default(),
        )?;
        info!(services = ctx.services().len(), "session wired");

        Ok(Self {
            ctx,
            world,
            view,
            player,
            agent,
            driver: Rc::new(RefCell::new(driver)),
        })
    }

    /// Dispose every service and drop remaining listeners.
    pub fn teardown(&self) -> anyhow::Result<()> {
        self.ctx.teardown().context("tearing down services")
    }
}

#[cfg(test)]
mod tests {
    use kinloop_driver::{DriverError, ManualClock};
    use kinloop_events::EventKind;
    use kinloop_input::Action;

    use super::*;

    #[test]
    fn driver_waits_for_start() {
        let session = Session::wire(&GameConfig::default()).unwrap();
        assert!(matches!(
            session.driver.borrow_mut().frame(0.016),
            Err(DriverError::NotStarted)
        ));
        assert_eq!(session.world.borrow().tick(), 0);
    }

    #[test]
    fn agent_catches_targets() {
        let session = Session::wire(&GameConfig::default()).unwrap();
        session.driver.borrow_mut().start();
        let mut clock = ManualClock::from_millis(16.0);
        let summary = session.driver.borrow_mut().run_for(&mut clock, 600).unwrap();

        let world = session.world.borrow();
        assert_eq!(world.tick(), summary.fixed_steps);
        assert!(world.score() >= 1);
        assert_eq!(session.view.borrow().frames(), 600);
        assert_eq!(
            session.agent.borrow().cumulative_reward(),
            world.score() as f32
        );
        let hearts = session.view.borrow().hearts().map(|h| h.bursts());
        assert_eq!(hearts, Some(u64::from(world.score())));
    }

    #[test]
    fn player_input_lands_on_next_tick() {
        let session = Session::wire(&GameConfig::default()).unwrap();
        session.driver.borrow_mut().start();
        session.player.borrow_mut().push(Action::Reset);
        session.driver.borrow_mut().frame(0.02).unwrap();
        assert_eq!(session.player.borrow().applied(), 1);
    }

    #[test]
    fn teardown_clears_listeners() {
        let session = Session::wire(&GameConfig::default()).unwrap();
        assert!(session.ctx.events().listener_count(&EventKind::FixedUpdate) >= 3);
        session.teardown().unwrap();
        for kind in [EventKind::FixedUpdate, EventKind::Update, EventKind::Catch] {
            assert_eq!(session.ctx.events().listener_count(&kind), 0);
        }
        assert!(session.ctx.services().is_empty());
    }
}
