//! Descriptor to visual proxy. Registered kind tags map to a cuboid model and a
//! texture; anything else becomes a flat colored box of the entity's size.

use std::collections::HashMap;

use bevy::ecs::system::SystemParam;
use bevy::pbr::NotShadowCaster;
use bevy::prelude::*;
use rs_utils::EntityDescriptor;
use thiserror::Error;
use tracing::warn;

use crate::dispose::DisposeQueue;
use crate::entity_model::{
    CREEPER_MODEL, ModelDef, PLAYER_CLASSIC_MODEL, PLAYER_LEGACY_MODEL, PLAYER_SLIM_MODEL,
    SKELETON_MODEL, ZOMBIE_MODEL, spawn_model,
};
use crate::metadata::{EntityFlags, MetadataLayout};
use crate::nametag::{HEIGHT_OFFSET, Nametag, NametagError, NametagRaster, NametagRenderer};
use crate::registry::{EntityProxy, SceneContainer};
use crate::settings::EntitySyncSettings;
use crate::shadow::spawn_shadow;
use crate::skins::{SkinImage, SkinLoader, SkinModel};
use crate::textures::{EntityTextureCache, PendingTexture, TextureStatus, nearest_image};

/// #300030
pub const BOX_COLOR: Color = Color::srgb(48.0 / 255.0, 0.0, 48.0 / 255.0);
pub const TRANSLUCENT_ALPHA: f32 = 0.3;
pub const DEFAULT_PLAYER_TEXTURE: &str = "entity/steve.png";
/// Used to place a nametag when the descriptor carries no usable height.
const FALLBACK_HEIGHT: f32 = 1.8;

#[derive(Debug, Error, PartialEq)]
pub enum BuildError {
    #[error("{kind} has no model for variant {variant}")]
    UnknownVariant { kind: String, variant: u8 },
    #[error("invalid box dimensions {width}x{height}")]
    MalformedGeometry { width: f32, height: f32 },
    #[error(transparent)]
    Nametag(#[from] NametagError),
}

impl BuildError {
    /// Variants the viewer simply has no model for; not worth a warning.
    pub fn is_benign(&self) -> bool {
        matches!(self, BuildError::UnknownVariant { .. })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkinPolicy {
    /// Texture comes from the pack.
    None,
    /// Build waits for the player's skin when a username is known.
    ByUsername,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ModelTexture {
    Pack(&'static str),
    Skin,
}

#[derive(Debug, Clone, Copy)]
pub struct ModelChoice {
    pub model: &'static ModelDef,
    pub texture: ModelTexture,
}

pub struct ModelRequest<'a> {
    pub kind: &'a str,
    pub metadata: &'a [u8],
    pub layout: MetadataLayout,
    pub skin: Option<&'a SkinImage>,
}

pub type Resolver = fn(&ModelRequest) -> Result<ModelChoice, BuildError>;

#[derive(Clone, Copy)]
pub struct KindEntry {
    pub resolve: Resolver,
    pub skin: SkinPolicy,
}

#[derive(Resource, Clone)]
pub struct MeshFactory {
    kinds: HashMap<String, KindEntry>,
}

impl Default for MeshFactory {
    fn default() -> Self {
        let mut factory = Self {
            kinds: HashMap::new(),
        };
        factory.register("player", resolve_player, SkinPolicy::ByUsername);
        factory.register("zombie", resolve_zombie, SkinPolicy::None);
        factory.register("husk", resolve_zombie, SkinPolicy::None);
        factory.register("skeleton", resolve_skeleton, SkinPolicy::None);
        factory.register("wither_skeleton", resolve_skeleton, SkinPolicy::None);
        factory.register("stray", resolve_skeleton, SkinPolicy::None);
        factory.register("creeper", resolve_creeper, SkinPolicy::None);
        factory
    }
}

impl MeshFactory {
    pub fn register(&mut self, kind: &str, resolve: Resolver, skin: SkinPolicy) {
        self.kinds.insert(kind.to_string(), KindEntry { resolve, skin });
    }

    pub fn entry(&self, kind: &str) -> Option<&KindEntry> {
        self.kinds.get(kind)
    }

    /// Whether a creation for this descriptor has to wait for a skin lookup.
    pub fn needs_skin(&self, descriptor: &EntityDescriptor) -> bool {
        let by_username = descriptor
            .kind
            .as_deref()
            .and_then(|kind| self.entry(kind))
            .is_some_and(|entry| entry.skin == SkinPolicy::ByUsername);
        by_username && descriptor.username.as_deref().is_some_and(|name| !name.is_empty())
    }
}

fn resolve_player(request: &ModelRequest) -> Result<ModelChoice, BuildError> {
    let Some(skin) = request.skin else {
        return Ok(ModelChoice {
            model: &PLAYER_CLASSIC_MODEL,
            texture: ModelTexture::Pack(DEFAULT_PLAYER_TEXTURE),
        });
    };
    let model = if skin.is_legacy() {
        &PLAYER_LEGACY_MODEL
    } else if skin.model == SkinModel::Slim {
        &PLAYER_SLIM_MODEL
    } else {
        &PLAYER_CLASSIC_MODEL
    };
    Ok(ModelChoice {
        model,
        texture: ModelTexture::Skin,
    })
}

fn resolve_zombie(request: &ModelRequest) -> Result<ModelChoice, BuildError> {
    let texture = match request.kind {
        "husk" => "entity/zombie/husk.png",
        _ => "entity/zombie/zombie.png",
    };
    Ok(ModelChoice {
        model: &ZOMBIE_MODEL,
        texture: ModelTexture::Pack(texture),
    })
}

fn resolve_skeleton(request: &ModelRequest) -> Result<ModelChoice, BuildError> {
    // Old protocols send every skeleton as "skeleton" with the variant in metadata.
    let kind = match (request.kind, request.layout.skeleton_type(request.metadata)) {
        ("skeleton", Some(0)) => "skeleton",
        ("skeleton", Some(1)) => "wither_skeleton",
        ("skeleton", Some(2)) => "stray",
        ("skeleton", Some(variant)) => {
            return Err(BuildError::UnknownVariant {
                kind: request.kind.to_string(),
                variant,
            });
        }
        (kind, _) => kind,
    };
    let texture = match kind {
        "wither_skeleton" => "entity/skeleton/wither_skeleton.png",
        "stray" => "entity/skeleton/stray.png",
        _ => "entity/skeleton/skeleton.png",
    };
    Ok(ModelChoice {
        model: &SKELETON_MODEL,
        texture: ModelTexture::Pack(texture),
    })
}

fn resolve_creeper(_: &ModelRequest) -> Result<ModelChoice, BuildError> {
    Ok(ModelChoice {
        model: &CREEPER_MODEL,
        texture: ModelTexture::Pack("entity/creeper/creeper.png"),
    })
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoxBody {
    pub width: f32,
    pub height: f32,
}

impl BoxBody {
    pub fn new(width: f32, height: f32) -> Result<Self, BuildError> {
        let valid = |v: f32| v.is_finite() && v > 0.0;
        if !valid(width) || !valid(height) {
            return Err(BuildError::MalformedGeometry { width, height });
        }
        Ok(Self { width, height })
    }

    /// `width x height x width`, base resting on y = 0.
    pub fn mesh(&self) -> Mesh {
        Mesh::from(Cuboid::new(self.width, self.height, self.width))
            .translated_by(Vec3::Y * self.height / 2.0)
    }
}

enum Body {
    Model(ModelChoice),
    Box(BoxBody),
}

/// Initial transform of a new proxy.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Placement {
    pub position: Vec3,
    pub yaw: f32,
}

impl Placement {
    pub fn transform(&self) -> Transform {
        Transform::from_translation(self.position).with_rotation(Quat::from_rotation_y(self.yaw))
    }
}

pub fn body_material(texture: Option<Handle<Image>>, translucent: bool) -> StandardMaterial {
    StandardMaterial {
        base_color: if translucent {
            Color::WHITE.with_alpha(TRANSLUCENT_ALPHA)
        } else {
            Color::WHITE
        },
        base_color_texture: texture,
        // Entity textures cut out eyes and hair with zero-alpha pixels.
        alpha_mode: if translucent {
            AlphaMode::Blend
        } else {
            AlphaMode::Mask(0.5)
        },
        unlit: true,
        perceptual_roughness: 1.0,
        metallic: 0.0,
        ..Default::default()
    }
}

/// Everything proxy construction and teardown touches, as one system parameter.
#[derive(SystemParam)]
pub struct ProxyContext<'w, 's> {
    pub commands: Commands<'w, 's>,
    pub scene: Res<'w, SceneContainer>,
    pub factory: Res<'w, MeshFactory>,
    pub settings: ResMut<'w, EntitySyncSettings>,
    pub meshes: ResMut<'w, Assets<Mesh>>,
    pub materials: ResMut<'w, Assets<StandardMaterial>>,
    pub images: ResMut<'w, Assets<Image>>,
    pub textures: ResMut<'w, EntityTextureCache>,
    pub nametags: Res<'w, NametagRenderer>,
    pub skins: Option<Res<'w, SkinLoader>>,
    pub disposals: ResMut<'w, DisposeQueue>,
}

impl ProxyContext<'_, '_> {
    /// Builds the proxy tree for `descriptor`. Every fallible step runs before the
    /// first spawn, so an error leaves no entities or assets behind.
    pub fn build_proxy(
        &mut self,
        descriptor: &EntityDescriptor,
        skin: Option<&SkinImage>,
        placement: Placement,
    ) -> Result<Entity, BuildError> {
        let layout = self.settings.metadata_layout();
        let flags = layout.flags(&descriptor.metadata);

        let entry = descriptor
            .kind
            .as_deref()
            .and_then(|kind| self.factory.entry(kind).map(|entry| (kind, entry)));
        let body = match entry {
            Some((kind, entry)) => Body::Model((entry.resolve)(&ModelRequest {
                kind,
                metadata: &descriptor.metadata,
                layout,
                skin,
            })?),
            None => Body::Box(BoxBody::new(descriptor.width, descriptor.height)?),
        };

        let nametag = match descriptor.username.as_deref() {
            Some(name) if !name.is_empty() => match self.nametags.rasterize(name) {
                Ok(raster) => raster,
                Err(err) if matches!(body, Body::Box(_)) => {
                    warn!(id = descriptor.id, %err, "placeholder built without nametag");
                    None
                }
                Err(err) => return Err(err.into()),
            },
            _ => None,
        };

        let root = self
            .commands
            .spawn((
                Name::new(format!("EntityProxy[{}]", descriptor.id)),
                EntityProxy { id: descriptor.id },
                placement.transform(),
                Visibility::Visible,
            ))
            .id();

        let body_entity = match body {
            Body::Model(choice) => self.spawn_model_body(choice, skin, flags),
            Body::Box(body) => self.spawn_box_body(body, flags),
        };
        self.commands.entity(root).add_child(body_entity);

        if let Some(raster) = nametag {
            let height = if descriptor.height > 0.0 {
                descriptor.height
            } else {
                FALLBACK_HEIGHT
            };
            let tag = self.spawn_nametag(raster, height);
            self.commands.entity(root).add_child(tag);
        }

        if !flags.is_translucent() {
            let version = self.settings.version.clone();
            let shadow = spawn_shadow(
                &mut self.commands,
                &mut self.meshes,
                &mut self.materials,
                &mut self.textures,
                &version,
            );
            self.commands.entity(root).add_child(shadow);
        }

        Ok(root)
    }

    fn spawn_model_body(
        &mut self,
        choice: ModelChoice,
        skin: Option<&SkinImage>,
        flags: EntityFlags,
    ) -> Entity {
        let mut pending = None;
        let texture = match (choice.texture, skin) {
            (ModelTexture::Skin, Some(skin)) => Some(self.images.add(nearest_image(
                skin.rgba.clone(),
                skin.width,
                skin.height,
            ))),
            (ModelTexture::Skin, None) => None,
            (ModelTexture::Pack(path), _) => {
                let (key, status) = self.textures.request(&self.settings.version, path);
                match status {
                    TextureStatus::Ready(handle) => Some(handle),
                    TextureStatus::Loading => {
                        pending = Some(key);
                        None
                    }
                    TextureStatus::Missing => None,
                }
            }
        };

        let translucent = flags.is_translucent();
        let material = self.materials.add(body_material(texture, translucent));
        let spawned = spawn_model(
            &mut self.commands,
            &mut self.meshes,
            choice.model,
            &material,
            !translucent,
        );
        if let Some(key) = pending {
            self.commands
                .entity(spawned.root)
                .insert(PendingTexture { key, material });
        }
        spawned.root
    }

    fn spawn_box_body(&mut self, body: BoxBody, flags: EntityFlags) -> Entity {
        let translucent = flags.is_translucent();
        let material = StandardMaterial {
            base_color: if translucent {
                BOX_COLOR.with_alpha(TRANSLUCENT_ALPHA)
            } else {
                BOX_COLOR
            },
            alpha_mode: if translucent {
                AlphaMode::Blend
            } else {
                AlphaMode::Opaque
            },
            unlit: true,
            ..Default::default()
        };
        let mut entity = self.commands.spawn((
            Name::new("EntityBox"),
            Mesh3d(self.meshes.add(body.mesh())),
            MeshMaterial3d(self.materials.add(material)),
            Transform::default(),
            Visibility::Visible,
        ));
        if translucent {
            entity.insert(NotShadowCaster);
        }
        entity.id()
    }

    fn spawn_nametag(&mut self, raster: NametagRaster, entity_height: f32) -> Entity {
        let layout = raster.layout;
        let image = self.images.add(nearest_image(
            raster.rgba,
            layout.surface_width,
            layout.surface_height,
        ));
        let material = self.materials.add(StandardMaterial {
            base_color_texture: Some(image),
            alpha_mode: AlphaMode::Blend,
            unlit: true,
            double_sided: true,
            cull_mode: None,
            ..Default::default()
        });
        self.commands
            .spawn((
                Name::new("Nametag"),
                Nametag,
                Mesh3d(
                    self.meshes
                        .add(Rectangle::new(layout.quad_width, layout.quad_height)),
                ),
                MeshMaterial3d(material),
                Transform::from_xyz(0.0, entity_height + HEIGHT_OFFSET, 0.0),
                Visibility::Visible,
                NotShadowCaster,
            ))
            .id()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request<'a>(kind: &'a str, metadata: &'a [u8], version: &str) -> ModelRequest<'a> {
        ModelRequest {
            kind,
            metadata,
            layout: MetadataLayout::for_version(version),
            skin: None,
        }
    }

    fn skin(height: u32, model: SkinModel) -> SkinImage {
        SkinImage {
            rgba: vec![0; (64 * height * 4) as usize],
            width: 64,
            height,
            model,
        }
    }

    #[test]
    fn kind_lookup_is_explicit() {
        let factory = MeshFactory::default();
        for kind in [
            "player",
            "zombie",
            "husk",
            "skeleton",
            "wither_skeleton",
            "stray",
            "creeper",
        ] {
            assert!(factory.entry(kind).is_some(), "{kind} not registered");
        }
        assert!(factory.entry("ender_dragon").is_none());
        assert!(factory.entry("").is_none());
    }

    #[test]
    fn only_named_players_wait_for_skins() {
        let factory = MeshFactory::default();
        let alice = EntityDescriptor::new(1)
            .with_kind("player")
            .with_username("Alice");
        assert!(factory.needs_skin(&alice));
        assert!(!factory.needs_skin(&EntityDescriptor::new(1).with_kind("player")));
        assert!(!factory.needs_skin(&EntityDescriptor::new(1).with_kind("player").with_username("")));
        assert!(!factory.needs_skin(&EntityDescriptor::new(2).with_kind("zombie").with_username("Bob")));
    }

    #[test]
    fn player_model_follows_the_skin() {
        let mut req = request("player", &[], "1.16.4");
        let fallback = resolve_player(&req).unwrap();
        assert_eq!(fallback.model.name, "player_classic");
        assert_eq!(fallback.texture, ModelTexture::Pack(DEFAULT_PLAYER_TEXTURE));

        let slim = skin(64, SkinModel::Slim);
        req.skin = Some(&slim);
        assert_eq!(resolve_player(&req).unwrap().model.name, "player_slim");

        let legacy = skin(32, SkinModel::Slim);
        req.skin = Some(&legacy);
        let choice = resolve_player(&req).unwrap();
        assert_eq!(choice.model.name, "player_legacy");
        assert_eq!(choice.texture, ModelTexture::Skin);
    }

    #[test]
    fn legacy_skeleton_variants() {
        let mut metadata = vec![0u8; 14];
        let plain = resolve_skeleton(&request("skeleton", &metadata, "1.8.9")).unwrap();
        assert_eq!(plain.texture, ModelTexture::Pack("entity/skeleton/skeleton.png"));

        metadata[13] = 1;
        let wither = resolve_skeleton(&request("skeleton", &metadata, "1.8.9")).unwrap();
        assert_eq!(wither.texture, ModelTexture::Pack("entity/skeleton/wither_skeleton.png"));

        metadata[13] = 2;
        let stray = resolve_skeleton(&request("skeleton", &metadata, "1.8.9")).unwrap();
        assert_eq!(stray.texture, ModelTexture::Pack("entity/skeleton/stray.png"));

        metadata[13] = 7;
        let err = resolve_skeleton(&request("skeleton", &metadata, "1.8.9")).unwrap_err();
        assert_eq!(
            err,
            BuildError::UnknownVariant {
                kind: "skeleton".to_string(),
                variant: 7
            }
        );
        assert!(err.is_benign());

        // Modern layouts ignore byte 13 entirely.
        assert!(resolve_skeleton(&request("skeleton", &metadata, "1.16.4")).is_ok());
    }

    #[test]
    fn box_rejects_degenerate_sizes() {
        assert!(BoxBody::new(0.6, 1.8).is_ok());
        for (w, h) in [(0.0, 1.0), (1.0, -1.0), (f32::NAN, 1.0), (1.0, f32::INFINITY)] {
            let err = BoxBody::new(w, h).unwrap_err();
            assert!(matches!(err, BuildError::MalformedGeometry { .. }));
            assert!(!err.is_benign());
        }
    }

    #[test]
    fn box_mesh_sits_on_the_origin() {
        let mesh = BoxBody::new(0.6, 1.8).unwrap().mesh();
        let positions = mesh
            .attribute(Mesh::ATTRIBUTE_POSITION)
            .and_then(|values| values.as_float3())
            .unwrap();
        let min_y = positions.iter().map(|p| p[1]).fold(f32::MAX, f32::min);
        let max_y = positions.iter().map(|p| p[1]).fold(f32::MIN, f32::max);
        let max_x = positions.iter().map(|p| p[0]).fold(f32::MIN, f32::max);
        assert!(min_y.abs() < 1e-6);
        assert!((max_y - 1.8).abs() < 1e-6);
        assert!((max_x - 0.3).abs() < 1e-6);
    }

    #[test]
    fn translucent_bodies_blend() {
        let solid = body_material(None, false);
        assert_eq!(solid.alpha_mode, AlphaMode::Mask(0.5));
        let ghost = body_material(None, true);
        assert_eq!(ghost.alpha_mode, AlphaMode::Blend);
        assert!((ghost.base_color.alpha() - TRANSLUCENT_ALPHA).abs() < 1e-6);
    }
}
