use glam::Vec2;

use crate::observation::Observation;

/// Decision-making strategy behind a [`LearningController`](crate::LearningController).
///
/// Learning implementations live outside this crate; they receive every
/// observation and reward through this trait.
pub trait Policy {
    fn name(&self) -> &str;

    /// Direction the child should move in. Zero means stand still.
    fn decide(&mut self, observation: &Observation) -> Vec2;

    /// Feedback for the most recent decisions.
    fn reward(&mut self, _reward: f32) {}

    /// The world was reset; an episode ended.
    fn end_episode(&mut self) {}
}

/// Baseline: run straight at the closest target.
#[derive(Debug, Default)]
pub struct SeekNearestPolicy {
    rewards: f32,
    episodes: u32,
}

impl SeekNearestPolicy {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rewards(&self) -> f32 {
        self.rewards
    }

    pub fn episodes(&self) -> u32 {
        self.episodes
    }
}

impl Policy for SeekNearestPolicy {
    fn name(&self) -> &str {
        "seek-nearest"
    }

    fn decide(&mut self, observation: &Observation) -> Vec2 {
        observation
            .nearest_target
            .map_or(Vec2::ZERO, Vec2::normalize_or_zero)
    }

    fn reward(&mut self, reward: f32) {
        self.rewards += reward;
    }

    fn end_episode(&mut self) {
        self.episodes += 1;
    }
}
