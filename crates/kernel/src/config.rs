use kinloop_common::Bounds;
use serde::{Deserialize, Serialize};

/// Errors from validating a [`WorldConfig`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("time_step must be positive and finite, got {0}")]
    TimeStep(f64),
    #[error("map must have positive size, got {width}x{height}")]
    MapSize { width: f32, height: f32 },
    #[error("{field} must be non-negative and finite, got {value}")]
    Negative { field: &'static str, value: f32 },
}

/// Simulation parameters. Every field has a default so partial config files
/// are valid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    /// Seconds simulated by one fixed step; also the driver's `dt`.
    pub time_step: f64,
    pub map: Bounds,
    pub target_count: usize,
    /// Units per second.
    pub child_speed: f32,
    /// Units per second.
    pub parent_speed: f32,
    /// The child catches a target within this distance.
    pub catch_radius: f32,
    /// A following parent stops this far from the child.
    pub follow_distance: f32,
    pub seed: u64,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            time_step: 1.0 / 60.0,
            map: Bounds::default(),
            target_count: 5,
            child_speed: 4.0,
            parent_speed: 3.0,
            catch_radius: 0.6,
            follow_distance: 1.5,
            seed: 42,
        }
    }
}

impl WorldConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.time_step > 0.0 && self.time_step.is_finite()) {
            return Err(ConfigError::TimeStep(self.time_step));
        }
        if !(self.map.width > 0.0 && self.map.height > 0.0) {
            return Err(ConfigError::MapSize {
                width: self.map.width,
                height: self.map.height,
            });
        }
        for (field, value) in [
            ("child_speed", self.child_speed),
            ("parent_speed", self.parent_speed),
            ("catch_radius", self.catch_radius),
            ("follow_distance", self.follow_distance),
        ] {
            if !(value >= 0.0 && value.is_finite()) {
                return Err(ConfigError::Negative { field, value });
            }
        }
        Ok(())
    }
}
