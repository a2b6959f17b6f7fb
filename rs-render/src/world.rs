use bevy::prelude::*;

use crate::components::WorldRoot;

#[derive(Resource)]
pub struct WorldSettings {
    pub ground_size: f32,
    pub ground_color: Color,
    /// Height of the ground plane. Entity shadows follow their proxies, not this plane.
    pub ground_height: f32,
}

impl Default for WorldSettings {
    fn default() -> Self {
        Self {
            ground_size: 256.0,
            ground_color: Color::srgb(0.2, 0.2, 0.22),
            ground_height: 0.0,
        }
    }
}

pub fn setup_world(
    mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    settings: Res<WorldSettings>,
) {
    let root = commands
        .spawn((WorldRoot, Transform::default(), Visibility::Visible))
        .id();

    commands.entity(root).with_children(|parent| {
        parent.spawn((
            Mesh3d(meshes.add(Plane3d::default())),
            MeshMaterial3d(materials.add(StandardMaterial {
                base_color: settings.ground_color,
                perceptual_roughness: 1.0,
                ..default()
            })),
            Transform::from_xyz(0.0, settings.ground_height, 0.0)
                .with_scale(Vec3::splat(settings.ground_size)),
        ));
    });

    commands.spawn((
        DirectionalLight {
            shadows_enabled: true,
            illuminance: 25_000.0,
            ..default()
        },
        Transform::from_xyz(8.0, 16.0, 8.0).looking_at(Vec3::ZERO, Vec3::Y),
    ));

    commands.insert_resource(AmbientLight {
        color: Color::srgb(0.45, 0.45, 0.5),
        brightness: 0.35,
        affects_lightmapped_meshes: true,
    });
}
