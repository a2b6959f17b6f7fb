use std::f32::consts::FRAC_PI_2;

use bevy::pbr::{NotShadowCaster, NotShadowReceiver};
use bevy::prelude::*;

use crate::textures::{EntityTextureCache, PendingTexture, TextureStatus};

pub const SHADOW_TEXTURE: &str = "misc/shadow.png";
pub const SHADOW_ALPHA: f32 = 0.3;
/// Drop below the proxy origin, enough to avoid fighting the ground plane.
pub const SHADOW_OFFSET: f32 = 0.01;

#[derive(Component, Debug, Clone, Copy)]
pub struct DropShadow;

pub fn shadow_material(texture: Option<Handle<Image>>) -> StandardMaterial {
    StandardMaterial {
        base_color: Color::WHITE.with_alpha(SHADOW_ALPHA),
        base_color_texture: texture,
        alpha_mode: AlphaMode::Blend,
        unlit: true,
        ..Default::default()
    }
}

/// Spawns the flat blob under an entity. The texture is attached in place once the
/// cache has it; until then the quad is a plain translucent square.
pub fn spawn_shadow(
    commands: &mut Commands,
    meshes: &mut Assets<Mesh>,
    materials: &mut Assets<StandardMaterial>,
    textures: &mut EntityTextureCache,
    version: &str,
) -> Entity {
    let (key, status) = textures.request(version, SHADOW_TEXTURE);
    let ready = match &status {
        TextureStatus::Ready(handle) => Some(handle.clone()),
        _ => None,
    };
    let material = materials.add(shadow_material(ready));

    let mut shadow = commands.spawn((
        Name::new("DropShadow"),
        DropShadow,
        Mesh3d(meshes.add(Rectangle::new(1.0, 1.0))),
        MeshMaterial3d(material.clone()),
        Transform::from_xyz(0.0, -SHADOW_OFFSET, 0.0)
            .with_rotation(Quat::from_rotation_x(-FRAC_PI_2)),
        Visibility::Visible,
        NotShadowCaster,
        NotShadowReceiver,
    ));
    if status == TextureStatus::Loading {
        shadow.insert(PendingTexture { key, material });
    }
    shadow.id()
}
