use std::fmt;

use glam::Vec2;
use kinloop_events::EventKind;
use kinloop_kernel::{ParentBehavior, World};
use kinloop_services::GameContext;
use tracing::warn;

/// Session inspector for developer tooling.
///
/// Summarises the registry, the bus and the world for logs and debugging
/// output.
pub struct SessionInspector;

impl SessionInspector {
    pub fn world(world: &World) -> WorldSummary {
        WorldSummary {
            tick: world.tick(),
            score: world.score(),
            seed: world.config().seed,
            child: world.child().position(),
            parent: world.parent().position(),
            parent_steered: matches!(world.parent().behavior, ParentBehavior::Steer(_)),
            targets: world
                .targets()
                .iter()
                .map(|t| (t.position(), t.catches))
                .collect(),
        }
    }

    /// Registered services, live listeners per event, and the world if one
    /// is registered and not currently borrowed.
    pub fn session(ctx: &GameContext) -> SessionSummary {
        let events = ctx.events();
        let listeners = events
            .kinds()
            .into_iter()
            .map(|kind| {
                let count = events.listener_count(&kind);
                (kind.name().to_string(), count)
            })
            .filter(|(_, count)| *count > 0)
            .collect();

        let world = ctx.get::<World>().ok().and_then(|world| match world.try_borrow() {
            Ok(world) => Some(Self::world(&world)),
            Err(_) => {
                warn!("world is borrowed, skipping world summary");
                None
            }
        });

        SessionSummary {
            services: ctx.services().keys(),
            listeners,
            world,
        }
    }

    /// Live listeners for `kind`.
    pub fn listeners(ctx: &GameContext, kind: &EventKind) -> usize {
        ctx.events().listener_count(kind)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct WorldSummary {
    pub tick: u64,
    pub score: u32,
    pub seed: u64,
    pub child: Vec2,
    pub parent: Vec2,
    pub parent_steered: bool,
    /// Position and catch count per target.
    pub targets: Vec<(Vec2, u32)>,
}

impl fmt::Display for WorldSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "World: tick={} score={} seed={} child=({:.2}, {:.2}) parent=({:.2}, {:.2}){} targets={}",
            self.tick,
            self.score,
            self.seed,
            self.child.x,
            self.child.y,
            self.parent.x,
            self.parent.y,
            if self.parent_steered { " steered" } else { "" },
            self.targets.len()
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SessionSummary {
    /// Service keys in registration order.
    pub services: Vec<&'static str>,
    /// Event name and live listener count, sorted by event.
    pub listeners: Vec<(String, usize)>,
    pub world: Option<WorldSummary>,
}

impl fmt::Display for SessionSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Services: {}", self.services.join(", "))?;
        let listeners: Vec<String> = self
            .listeners
            .iter()
            .map(|(event, n)| format!("{event}={n}"))
            .collect();
        writeln!(f, "Listeners: {}", listeners.join(" "))?;
        match &self.world {
            Some(world) => write!(f, "{world}"),
            None => write!(f, "World: <none>"),
        }
    }
}
