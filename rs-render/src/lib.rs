use bevy::prelude::*;

mod camera;
mod components;
mod world;

pub use camera::{CameraFocus, FOCUS_OFFSET, focus_transform};
pub use components::{ViewerCamera, WorldRoot};
pub use world::WorldSettings;

/// Static scene around the mirrored entities: ground, lights and the viewer camera.
pub struct RenderPlugin;

impl Plugin for RenderPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<WorldSettings>()
            .init_resource::<CameraFocus>()
            .add_systems(Startup, (world::setup_world, camera::spawn_camera))
            .add_systems(Update, camera::apply_camera_focus);
    }
}
