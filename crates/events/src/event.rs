use serde::{Deserialize, Serialize};

/// An event carried by the bus.
///
/// Tick events are emitted by the driver; the others come from gameplay code.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    /// One deterministic simulation step of `dt` seconds. No payload.
    FixedUpdate,
    /// Once per frame after the fixed steps, carrying the (clamped) real time
    /// the frame represents, in seconds.
    Update { frame_time: f64 },
    /// The child caught a target.
    Catch,
    /// The world was reset to its initial layout.
    Reset,
    /// Ad-hoc named notification.
    Custom(String),
}

impl GameEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            Self::FixedUpdate => EventKind::FixedUpdate,
            Self::Update { .. } => EventKind::Update,
            Self::Catch => EventKind::Catch,
            Self::Reset => EventKind::Reset,
            Self::Custom(name) => EventKind::Custom(name.clone()),
        }
    }
}

/// Discriminant of [`GameEvent`], used as the subscription key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EventKind {
    FixedUpdate,
    Update,
    Catch,
    Reset,
    Custom(String),
}

impl EventKind {
    /// Wire name of the event.
    pub fn name(&self) -> &str {
        match self {
            Self::FixedUpdate => "fixedUpdate",
            Self::Update => "update",
            Self::Catch => "gameplay:catch",
            Self::Reset => "gameplay:reset",
            Self::Custom(name) => name,
        }
    }

    /// Ticks feed the simulation and rendering, so a failing listener must
    /// stop the frame. Everything else is a sparse notification.
    pub fn default_policy(&self) -> DispatchPolicy {
        match self {
            Self::FixedUpdate | Self::Update => DispatchPolicy::FailFast,
            _ => DispatchPolicy::Isolate,
        }
    }
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// What an emission does when one of its listeners fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DispatchPolicy {
    /// Abort the emission and return the error to the emitter.
    FailFast,
    /// Log the error, keep running the remaining listeners.
    Isolate,
}
