use glam::Vec2;
use kinloop_kernel::World;

/// What a policy sees of the world at a decision tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Observation {
    pub tick: u64,
    pub child: Vec2,
    pub parent: Vec2,
    /// Offset from the child to the closest target, if any.
    pub nearest_target: Option<Vec2>,
}

impl Observation {
    pub fn of(world: &World) -> Self {
        let child = world.child().position();
        Self {
            tick: world.tick(),
            child,
            parent: world.parent().position(),
            nearest_target: world
                .nearest_target(child)
                .map(|(_, target)| target.position() - child),
        }
    }
}

#[cfg(test)]
mod tests {
    use kinloop_kernel::WorldConfig;

    use super::*;

    #[test]
    fn observes_nearest_offset() {
        let world = World::new(WorldConfig::default()).unwrap();
        let obs = Observation::of(&world);
        assert_eq!(obs.tick, 0);
        assert_eq!(obs.child, world.child().position());

        let offset = obs.nearest_target.unwrap();
        let closest = world
            .targets()
            .iter()
            .map(|t| t.position().distance(obs.child))
            .fold(f32::INFINITY, f32::min);
        assert!((offset.length() - closest).abs() < 1e-4);
        assert!(((obs.parent - obs.child).length() - world.config().follow_distance).abs() < 1e-4);
    }

    #[test]
    fn no_targets_no_offset() {
        let world = World::new(WorldConfig {
            target_count: 0,
            ..WorldConfig::default()
        })
        .unwrap();
        assert_eq!(Observation::of(&world).nearest_target, None);
    }
}
