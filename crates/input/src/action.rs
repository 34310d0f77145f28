use std::collections::HashMap;

use glam::Vec2;

/// A high-level action any input source can produce.
///
/// The world consumes actions, never raw key or pointer events.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Action {
    /// Take manual control of the parent and move it along this direction.
    Steer(Vec2),
    /// Hand the parent back to its follow behaviour.
    Release,
    /// Put every entity back at its starting place.
    Reset,
}

/// Binding from key names to actions.
///
/// Key names are whatever the input source reports; the defaults follow
/// browser `KeyboardEvent.key` values. Map y grows downwards.
#[derive(Debug, Clone)]
pub struct KeyMap {
    bindings: HashMap<String, Action>,
}

impl KeyMap {
    pub fn empty() -> Self {
        Self {
            bindings: HashMap::new(),
        }
    }

    pub fn bind(&mut self, key: impl Into<String>, action: Action) -> Option<Action> {
        self.bindings.insert(key.into(), action)
    }

    pub fn action_for(&self, key: &str) -> Option<Action> {
        self.bindings.get(key).copied()
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

impl Default for KeyMap {
    fn default() -> Self {
        let mut map = Self::empty();
        for (keys, dir) in [
            (["ArrowUp", "w"], Vec2::NEG_Y),
            (["ArrowDown", "s"], Vec2::Y),
            (["ArrowLeft", "a"], Vec2::NEG_X),
            (["ArrowRight", "d"], Vec2::X),
        ] {
            for key in keys {
                map.bind(key, Action::Steer(dir));
            }
        }
        map.bind(" ", Action::Release);
        map.bind("r", Action::Reset);
        map
    }
}
