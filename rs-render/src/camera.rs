use bevy::prelude::*;
use tracing::debug;

use crate::components::ViewerCamera;

/// Camera placement relative to the point it looks at.
pub const FOCUS_OFFSET: Vec3 = Vec3::new(0.0, 20.0, 20.0);

/// Where the viewer camera should look. `arm_first_position` makes the next usable
/// bot position win once; explicit focus requests always win.
#[derive(Resource, Debug, Default)]
pub struct CameraFocus {
    target: Option<Vec3>,
    awaiting_first_position: bool,
}

impl CameraFocus {
    pub fn arm_first_position(&mut self) {
        self.awaiting_first_position = true;
    }

    /// Bot position report. Only the first one above y = 0 after arming moves the camera.
    pub fn observe_position(&mut self, pos: Vec3) {
        if self.awaiting_first_position && pos.y > 0.0 {
            self.awaiting_first_position = false;
            self.target = Some(pos);
        }
    }

    pub fn focus_on(&mut self, pos: Vec3) {
        self.target = Some(pos);
    }

    pub fn take_target(&mut self) -> Option<Vec3> {
        self.target.take()
    }
}

pub fn focus_transform(target: Vec3) -> Transform {
    Transform::from_translation(target + FOCUS_OFFSET).looking_at(target, Vec3::Y)
}

pub fn spawn_camera(mut commands: Commands) {
    commands.spawn((
        Camera3d::default(),
        ViewerCamera,
        focus_transform(Vec3::ZERO),
    ));
}

pub fn apply_camera_focus(
    mut focus: ResMut<CameraFocus>,
    mut cameras: Query<&mut Transform, With<ViewerCamera>>,
) {
    let Some(target) = focus.take_target() else {
        return;
    };
    debug!(?target, "camera refocused");
    for mut transform in &mut cameras {
        *transform = focus_transform(target);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_the_first_position_above_ground_focuses() {
        let mut focus = CameraFocus::default();
        focus.observe_position(Vec3::new(1.0, 70.0, 1.0));
        assert_eq!(focus.take_target(), None);

        focus.arm_first_position();
        focus.observe_position(Vec3::new(1.0, 0.0, 1.0));
        assert_eq!(focus.take_target(), None);
        focus.observe_position(Vec3::new(1.0, 64.0, 1.0));
        focus.observe_position(Vec3::new(9.0, 64.0, 9.0));
        assert_eq!(focus.take_target(), Some(Vec3::new(1.0, 64.0, 1.0)));

        focus.focus_on(Vec3::new(5.0, 5.0, 5.0));
        assert_eq!(focus.take_target(), Some(Vec3::new(5.0, 5.0, 5.0)));
    }

    #[test]
    fn focus_looks_down_at_the_target() {
        let transform = focus_transform(Vec3::new(10.0, 64.0, -4.0));
        assert_eq!(transform.translation, Vec3::new(10.0, 84.0, 16.0));
        let forward = transform.forward();
        let expected = (Vec3::new(0.0, -20.0, -20.0)).normalize();
        assert!((forward.as_vec3() - expected).length() < 1e-5);
    }
}
