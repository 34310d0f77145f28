use kinloop_render::Container;

use crate::entity_view::{EntityView, ViewError, WorldHandle, read_world};

/// Background layer: the play area and the running score.
pub struct MapView {
    world: WorldHandle,
    container: Container,
}

impl MapView {
    pub fn new(world: WorldHandle) -> Self {
        Self {
            world,
            container: Container::new("map"),
        }
    }
}

impl EntityView for MapView {
    fn init(&mut self) -> Result<(), ViewError> {
        self.update()
    }

    fn update(&mut self) -> Result<(), ViewError> {
        let (bounds, score) = read_world(&self.world, |w| Ok((w.map().bounds, w.score())))?;
        self.container.set_label(format!(
            "{}x{} score {score}",
            bounds.width, bounds.height
        ));
        Ok(())
    }

    fn container(&self) -> &Container {
        &self.container
    }
}
