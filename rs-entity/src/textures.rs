use std::collections::HashMap;
use std::path::PathBuf;
use std::thread;

use bevy::image::{ImageAddressMode, ImageSampler, ImageSamplerDescriptor};
use bevy::prelude::*;
use bevy::render::render_asset::RenderAssetUsages;
use bevy::render::render_resource::{Extent3d, TextureDimension, TextureFormat};
use crossbeam::channel::{Receiver, Sender, unbounded};
use tracing::{debug, warn};

use crate::settings::EntitySyncSettings;

/// Cache key: `<version>/<path inside the pack>`.
pub type TextureKey = String;

#[derive(Debug, Clone, PartialEq)]
pub enum TextureStatus {
    Loading,
    Ready(Handle<Image>),
    Missing,
}

#[derive(Debug)]
struct TextureResult {
    key: TextureKey,
    decoded: Option<(Vec<u8>, u32, u32)>,
}

/// Texture-pack images, decoded on a worker thread and shared by every proxy that
/// uses them. Proxies never own these handles.
#[derive(Resource)]
pub struct EntityTextureCache {
    request_tx: Sender<TextureKey>,
    result_rx: Receiver<TextureResult>,
    entries: HashMap<TextureKey, TextureStatus>,
}

impl FromWorld for EntityTextureCache {
    fn from_world(world: &mut World) -> Self {
        let root = world
            .get_resource::<EntitySyncSettings>()
            .map(|settings| settings.textures_root.clone())
            .unwrap_or_default();
        Self::spawn(root)
    }
}

impl EntityTextureCache {
    pub fn spawn(root: PathBuf) -> Self {
        let (request_tx, request_rx) = unbounded::<TextureKey>();
        let (result_tx, result_rx) = unbounded::<TextureResult>();
        thread::spawn(move || texture_worker(root, request_rx, result_tx));
        Self {
            request_tx,
            result_rx,
            entries: HashMap::new(),
        }
    }

    /// Queues `path` for the given version once; later calls only report status.
    pub fn request(&mut self, version: &str, path: &str) -> (TextureKey, TextureStatus) {
        let key = format!("{version}/{path}");
        let status = self
            .entries
            .entry(key.clone())
            .or_insert_with(|| {
                if self.request_tx.send(key.clone()).is_ok() {
                    TextureStatus::Loading
                } else {
                    TextureStatus::Missing
                }
            })
            .clone();
        (key, status)
    }

    pub fn status(&self, key: &str) -> Option<&TextureStatus> {
        self.entries.get(key)
    }

    pub fn is_shared(&self, image: AssetId<Image>) -> bool {
        self.entries
            .values()
            .any(|status| matches!(status, TextureStatus::Ready(handle) if handle.id() == image))
    }
}

pub fn entity_texture_cache_tick(
    mut cache: ResMut<EntityTextureCache>,
    mut images: ResMut<Assets<Image>>,
) {
    while let Ok(result) = cache.result_rx.try_recv() {
        let status = match result.decoded {
            Some((rgba, width, height)) => {
                TextureStatus::Ready(images.add(nearest_image(rgba, width, height)))
            }
            None => TextureStatus::Missing,
        };
        debug!(key = %result.key, ready = matches!(status, TextureStatus::Ready(_)), "entity texture resolved");
        cache.entries.insert(result.key, status);
    }
}

/// Pixel-art texture: sRGB, nearest sampling, clamped edges.
pub fn nearest_image(rgba: Vec<u8>, width: u32, height: u32) -> Image {
    let mut image = Image::new_fill(
        Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        },
        TextureDimension::D2,
        &[0, 0, 0, 0],
        TextureFormat::Rgba8UnormSrgb,
        RenderAssetUsages::default(),
    );
    image.data = Some(rgba);

    let mut sampler = ImageSamplerDescriptor::nearest();
    sampler.address_mode_u = ImageAddressMode::ClampToEdge;
    sampler.address_mode_v = ImageAddressMode::ClampToEdge;
    sampler.address_mode_w = ImageAddressMode::ClampToEdge;
    image.sampler = ImageSampler::Descriptor(sampler);
    image
}

/// Material waiting for a cache texture. Lives on the entity that owns the material,
/// so a despawned proxy simply stops waiting.
#[derive(Component, Debug, Clone)]
pub struct PendingTexture {
    pub key: TextureKey,
    pub material: Handle<StandardMaterial>,
}

pub fn apply_pending_textures(
    mut commands: Commands,
    cache: Res<EntityTextureCache>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    pending: Query<(Entity, &PendingTexture)>,
) {
    for (entity, wanted) in &pending {
        match cache.status(&wanted.key) {
            Some(TextureStatus::Loading) => continue,
            Some(TextureStatus::Ready(handle)) => {
                if let Some(material) = materials.get_mut(&wanted.material) {
                    material.base_color_texture = Some(handle.clone());
                }
            }
            Some(TextureStatus::Missing) | None => {}
        }
        commands.entity(entity).remove::<PendingTexture>();
    }
}

fn texture_worker(
    root: PathBuf,
    request_rx: Receiver<TextureKey>,
    result_tx: Sender<TextureResult>,
) {
    while let Ok(key) = request_rx.recv() {
        let full = root.join(&key);
        let decoded = std::fs::read(&full)
            .ok()
            .and_then(|bytes| image::load_from_memory(&bytes).ok())
            .map(|decoded| {
                let rgba = decoded.to_rgba8();
                let (width, height) = rgba.dimensions();
                (rgba.into_raw(), width, height)
            });
        if decoded.is_none() {
            warn!("failed to load entity texture: {:?}", full);
        }
        if result_tx.send(TextureResult { key, decoded }).is_err() {
            break;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn missing_files_resolve_to_missing() {
        let mut cache = EntityTextureCache::spawn(PathBuf::from("/nonexistent/textures"));
        let (key, status) = cache.request("1.16.4", "entity/zombie/zombie.png");
        assert_eq!(key, "1.16.4/entity/zombie/zombie.png");
        assert_eq!(status, TextureStatus::Loading);

        let result = cache
            .result_rx
            .recv_timeout(Duration::from_secs(5))
            .expect("worker reply");
        assert_eq!(result.key, key);
        assert!(result.decoded.is_none());

        // Requests are deduplicated per key.
        let (_, again) = cache.request("1.16.4", "entity/zombie/zombie.png");
        assert_eq!(again, TextureStatus::Loading);
        assert!(cache.result_rx.recv_timeout(Duration::from_millis(50)).is_err());
    }

    #[test]
    fn nearest_image_uses_point_sampling() {
        let image = nearest_image(vec![255; 4 * 4], 2, 2);
        assert_eq!(image.width(), 2);
        let ImageSampler::Descriptor(sampler) = &image.sampler else {
            panic!("expected explicit sampler");
        };
        assert!(matches!(
            sampler.mag_filter,
            bevy::image::ImageFilterMode::Nearest
        ));
    }
}
