use std::cell::{Ref, RefCell};
use std::rc::{Rc, Weak};

use kinloop_kernel::{ParentBehavior, World};
use kinloop_render::Container;
use kinloop_services::RegistryError;

/// Non-owning handle from a view to the world it mirrors.
pub type WorldHandle = Weak<RefCell<World>>;

/// Errors raised while building or updating views.
#[derive(Debug, thiserror::Error)]
pub enum ViewError {
    #[error("world was dropped")]
    WorldGone,
    #[error("world is being mutated")]
    WorldBusy,
    #[error("target #{index} does not exist")]
    TargetMissing { index: usize },
    #[error("view used before init")]
    NotInitialized,
    #[error("view is borrowed elsewhere")]
    ViewBusy,
    #[error(transparent)]
    Registry(#[from] RegistryError),
}

/// Contract for a view of one world entity.
pub trait EntityView {
    /// Bind to the model entity and build the visible representation.
    fn init(&mut self) -> Result<(), ViewError>;

    /// Attach this view's root container under `parent`.
    fn add_to(&self, parent: &Container) {
        parent.add_child(self.container());
    }

    /// Pull current state from the model into the representation.
    fn update(&mut self) -> Result<(), ViewError>;

    fn container(&self) -> &Container;
}

/// Run `read` against the world, mapping a dropped or mutably borrowed world
/// to an error.
pub(crate) fn read_world<T>(
    world: &WorldHandle,
    read: impl FnOnce(Ref<'_, World>) -> Result<T, ViewError>,
) -> Result<T, ViewError> {
    let world: Rc<RefCell<World>> = world.upgrade().ok_or(ViewError::WorldGone)?;
    let guard = world.try_borrow().map_err(|_| ViewError::WorldBusy)?;
    read(guard)
}

pub struct ChildView {
    world: WorldHandle,
    container: Container,
}

impl ChildView {
    pub fn new(world: WorldHandle) -> Self {
        Self {
            world,
            container: Container::new("child"),
        }
    }
}

impl EntityView for ChildView {
    fn init(&mut self) -> Result<(), ViewError> {
        self.container.set_label("child");
        self.update()
    }

    fn update(&mut self) -> Result<(), ViewError> {
        let (position, idle) = read_world(&self.world, |w| {
            Ok((w.child().position(), w.child().intent.is_idle()))
        })?;
        self.container.set_position(position);
        self.container
            .set_label(if idle { "child idle" } else { "child running" });
        Ok(())
    }

    fn container(&self) -> &Container {
        &self.container
    }
}

pub struct ParentView {
    world: WorldHandle,
    container: Container,
}

impl ParentView {
    pub fn new(world: WorldHandle) -> Self {
        Self {
            world,
            container: Container::new("parent"),
        }
    }
}

impl EntityView for ParentView {
    fn init(&mut self) -> Result<(), ViewError> {
        self.container.set_label("parent");
        self.update()
    }

    fn update(&mut self) -> Result<(), ViewError> {
        let (position, behavior) =
            read_world(&self.world, |w| Ok((w.parent().position(), w.parent().behavior)))?;
        self.container.set_position(position);
        self.container.set_label(match behavior {
            ParentBehavior::Follow => "parent following",
            ParentBehavior::Steer(_) => "parent steered",
        });
        Ok(())
    }

    fn container(&self) -> &Container {
        &self.container
    }
}

/// View of the target at a fixed index.
pub struct TargetView {
    world: WorldHandle,
    index: usize,
    container: Container,
}

impl TargetView {
    pub fn new(world: WorldHandle, index: usize) -> Self {
        Self {
            world,
            index,
            container: Container::new(format!("target-{index}")),
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }
}

impl EntityView for TargetView {
    fn init(&mut self) -> Result<(), ViewError> {
        self.update()
    }

    fn update(&mut self) -> Result<(), ViewError> {
        let index = self.index;
        let (position, catches) = read_world(&self.world, |w| {
            w.target(index)
                .map(|t| (t.position(), t.catches))
                .ok_or(ViewError::TargetMissing { index })
        })?;
        self.container.set_position(position);
        self.container.set_label(format!("caught x{catches}"));
        Ok(())
    }

    fn container(&self) -> &Container {
        &self.container
    }
}
