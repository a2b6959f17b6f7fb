//! Mirrors remote entities into the Bevy scene: one proxy per entity id, built from
//! the entity's kind, skin and metadata, moved smoothly toward each new update and
//! released explicitly when the entity goes away.

use std::sync::Arc;

use bevy::prelude::*;

pub mod dispose;
pub mod entity_model;
pub mod factory;
pub mod interpolation;
pub mod metadata;
pub mod nametag;
pub mod registry;
pub mod settings;
pub mod shadow;
pub mod skins;
pub mod textures;

pub use dispose::{DisposeQueue, DisposeReport, dispose_node};
pub use factory::{BuildError, MeshFactory, ProxyContext};
pub use interpolation::{ProxyMotion, Tween, shortest_angle_delta};
pub use metadata::{EntityFlags, MetadataLayout};
pub use nametag::{Nametag, NametagError, NametagRenderer};
pub use registry::{
    EntityEvent, EntityProxy, EntityRegistry, EntityUpdateQueue, ProxyStatus, SceneContainer,
};
pub use settings::EntitySyncSettings;
pub use skins::{MojangSkinSource, SkinError, SkinImage, SkinLoader, SkinModel, SkinSource};
pub use textures::EntityTextureCache;

#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub enum EntitySyncSet {
    /// Asset results and registry mutation.
    Apply,
    /// Transform writes for the current frame.
    Animate,
    /// Release of proxies detached this frame.
    Dispose,
}

pub struct EntitySyncPlugin {
    pub settings: EntitySyncSettings,
    /// `None` disables skin lookups; players use the default texture.
    pub skin_source: Option<Arc<dyn SkinSource>>,
    pub skin_workers: usize,
}

impl Default for EntitySyncPlugin {
    fn default() -> Self {
        Self {
            settings: EntitySyncSettings::default(),
            skin_source: None,
            skin_workers: 2,
        }
    }
}

impl Plugin for EntitySyncPlugin {
    fn build(&self, app: &mut App) {
        let scene = app
            .world_mut()
            .spawn((
                Name::new("EntityScene"),
                Transform::default(),
                Visibility::Visible,
            ))
            .id();

        app.insert_resource(self.settings.clone())
            .insert_resource(SceneContainer::new(scene))
            .init_resource::<EntityUpdateQueue>()
            .init_resource::<EntityRegistry>()
            .init_resource::<DisposeQueue>()
            .init_resource::<MeshFactory>()
            .init_resource::<NametagRenderer>()
            .init_resource::<EntityTextureCache>();

        if let Some(source) = &self.skin_source {
            app.insert_resource(SkinLoader::spawn(Arc::clone(source), self.skin_workers));
        }

        app.configure_sets(
            Update,
            (
                EntitySyncSet::Apply,
                EntitySyncSet::Animate,
                EntitySyncSet::Dispose,
            )
                .chain(),
        )
        .add_systems(
            Update,
            (
                (
                    textures::entity_texture_cache_tick,
                    registry::apply_entity_updates,
                    registry::attach_resolved_skins,
                    textures::apply_pending_textures,
                )
                    .chain()
                    .in_set(EntitySyncSet::Apply),
                (
                    interpolation::advance_interpolation,
                    nametag::billboard_nametags,
                )
                    .chain()
                    .in_set(EntitySyncSet::Animate),
                dispose::dispose_released_proxies.in_set(EntitySyncSet::Dispose),
            ),
        );
    }
}
