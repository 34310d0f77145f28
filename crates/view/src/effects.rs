use glam::Vec2;
use kinloop_render::Container;
use tracing::trace;

/// Tuning for the [`Hearts`] burst.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HeartsConfig {
    /// Particles per burst.
    pub count: usize,
    /// Seconds a particle lives.
    pub lifetime: f32,
    /// Units per second.
    pub speed: f32,
}

impl Default for HeartsConfig {
    fn default() -> Self {
        Self {
            count: 3,
            lifetime: 0.8,
            speed: 1.5,
        }
    }
}

struct Particle {
    node: Container,
    age: f32,
    velocity: Vec2,
}

/// Fire-and-forget burst of hearts rising from a point.
///
/// Bursts are triggered by `gameplay:catch`, not by the tick; particles are
/// aged by whoever owns the effect.
pub struct Hearts {
    layer: Container,
    config: HeartsConfig,
    particles: Vec<Particle>,
    bursts: u64,
    last_origin: Option<Vec2>,
}

impl Hearts {
    /// Create the effect layer under `parent`.
    pub fn new(parent: &Container, config: HeartsConfig) -> Self {
        let layer = Container::new("hearts");
        parent.add_child(&layer);
        Self {
            layer,
            config,
            particles: Vec::new(),
            bursts: 0,
            last_origin: None,
        }
    }

    /// Spawn one burst at `origin`.
    pub fn emit_at(&mut self, origin: Vec2) {
        let count = self.config.count.max(1);
        for i in 0..count {
            // Fan upward between -45 and +45 degrees off vertical.
            let t = if count == 1 {
                0.5
            } else {
                i as f32 / (count - 1) as f32
            };
            let angle = (t - 0.5) * std::f32::consts::FRAC_PI_2;
            let velocity = Vec2::new(angle.sin(), -angle.cos()) * self.config.speed;

            let node = Container::new("heart");
            node.set_position(origin);
            node.set_label("<3");
            self.layer.add_child(&node);
            self.particles.push(Particle {
                node,
                age: 0.0,
                velocity,
            });
        }
        self.bursts += 1;
        self.last_origin = Some(origin);
        trace!(x = origin.x, y = origin.y, "hearts emitted");
    }

    /// Age and move particles by `dt` seconds, dropping expired ones.
    pub fn advance(&mut self, dt: f32) {
        let lifetime = self.config.lifetime;
        let layer = &self.layer;
        self.particles.retain_mut(|p| {
            p.age += dt;
            if p.age >= lifetime {
                layer.remove_child(&p.node);
                return false;
            }
            p.node.set_position(p.node.position() + p.velocity * dt);
            p.node.set_alpha(1.0 - p.age / lifetime);
            true
        });
    }

    /// Particles currently alive.
    pub fn active(&self) -> usize {
        self.particles.len()
    }

    /// Bursts emitted so far.
    pub fn bursts(&self) -> u64 {
        self.bursts
    }

    pub fn last_origin(&self) -> Option<Vec2> {
        self.last_origin
    }

    pub fn layer(&self) -> &Container {
        &self.layer
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn burst_spawns_particles_at_origin() {
        let root = Container::new("root");
        let mut hearts = Hearts::new(&root, HeartsConfig::default());
        hearts.emit_at(Vec2::new(4.0, 5.0));

        assert_eq!(hearts.bursts(), 1);
        assert_eq!(hearts.active(), 3);
        assert_eq!(hearts.layer().child_count(), 3);
        assert_eq!(hearts.last_origin(), Some(Vec2::new(4.0, 5.0)));
        for node in hearts.layer().children() {
            assert_eq!(node.position(), Vec2::new(4.0, 5.0));
        }
    }

    #[test]
    fn particles_rise_and_expire() {
        let root = Container::new("root");
        let mut hearts = Hearts::new(&root, HeartsConfig::default());
        hearts.emit_at(Vec2::new(0.0, 10.0));

        hearts.advance(0.1);
        assert_eq!(hearts.active(), 3);
        for node in hearts.layer().children() {
            assert!(node.position().y < 10.0);
        }

        hearts.advance(1.0);
        assert_eq!(hearts.active(), 0);
        assert_eq!(hearts.layer().child_count(), 0);
        assert_eq!(hearts.bursts(), 1);
    }
}
