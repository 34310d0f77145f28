use glam::Vec2;
use kinloop_common::{Bounds, EntityId};
use serde::{Deserialize, Serialize};

/// Position and motion shared by every moving entity.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Body {
    pub id: EntityId,
    pub position: Vec2,
    /// Units per second during the last step.
    pub velocity: Vec2,
}

impl Body {
    pub fn at(position: Vec2) -> Self {
        Self {
            id: EntityId::new(),
            position,
            velocity: Vec2::ZERO,
        }
    }
}

/// Desired movement direction: a unit vector, or zero to stand still.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Intent(Vec2);

impl Intent {
    pub const IDLE: Self = Self(Vec2::ZERO);

    /// Normalises `direction`; a zero or non-finite vector means idle.
    pub fn toward(direction: Vec2) -> Self {
        Self(direction.normalize_or_zero())
    }

    pub fn direction(&self) -> Vec2 {
        self.0
    }

    pub fn is_idle(&self) -> bool {
        self.0 == Vec2::ZERO
    }
}

/// The play area.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Map {
    pub bounds: Bounds,
}

/// The agent-driven entity that catches targets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Child {
    pub body: Body,
    pub intent: Intent,
}

impl Child {
    pub fn position(&self) -> Vec2 {
        self.body.position
    }
}

/// How the parent moves each step.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub enum ParentBehavior {
    /// Walk toward the child, stopping at the follow distance.
    #[default]
    Follow,
    /// Player-steered.
    Steer(Intent),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parent {
    pub body: Body,
    pub behavior: ParentBehavior,
}

impl Parent {
    pub fn position(&self) -> Vec2 {
        self.body.position
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Target {
    pub body: Body,
    /// Times this target has been caught.
    pub catches: u32,
}

impl Target {
    pub fn position(&self) -> Vec2 {
        self.body.position
    }
}
