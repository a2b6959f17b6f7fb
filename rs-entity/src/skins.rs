//! Player skin resolution. Lookups run on a small worker pool; results come back
//! tagged with the registry ticket that asked for them.

use std::sync::Arc;
use std::thread;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use bevy::prelude::*;
use crossbeam::channel::{Receiver, Sender, unbounded};
use rs_utils::EntityId;
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

const PROFILE_URL: &str = "https://api.mojang.com/users/profiles/minecraft";
const SESSION_URL: &str = "https://sessionserver.mojang.com/session/minecraft/profile";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SkinModel {
    #[default]
    Classic,
    Slim,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SkinImage {
    pub rgba: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub model: SkinModel,
}

impl SkinImage {
    /// Pre-1.8 skins are 64x32 and have no separate left limbs or overlays.
    pub fn is_legacy(&self) -> bool {
        self.height == 32
    }
}

#[derive(Debug, Error)]
pub enum SkinError {
    #[error("no profile for player {0}")]
    UnknownPlayer(String),
    #[error("profile has no skin texture")]
    NoSkin,
    #[error("skin request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("textures property is not valid base64: {0}")]
    Base64(#[from] base64::DecodeError),
    #[error("malformed textures property: {0}")]
    Json(#[from] serde_json::Error),
    #[error("skin is not a valid image: {0}")]
    Image(#[from] image::ImageError),
    #[error("unsupported skin size {width}x{height}")]
    UnsupportedSize { width: u32, height: u32 },
}

/// Where skins come from. Implementations block; they only ever run on loader workers.
pub trait SkinSource: Send + Sync + 'static {
    fn fetch(&self, username: &str) -> Result<SkinImage, SkinError>;
}

#[derive(Debug, Clone, PartialEq)]
pub struct SkinTextureRef {
    pub url: String,
    pub model: SkinModel,
}

#[derive(Deserialize)]
struct ProfileLookup {
    id: String,
}

#[derive(Deserialize)]
struct SessionProfile {
    #[serde(default)]
    properties: Vec<ProfileProperty>,
}

#[derive(Deserialize)]
struct ProfileProperty {
    name: String,
    value: String,
}

#[derive(Deserialize)]
struct TexturesPayload {
    textures: TexturesMap,
}

#[derive(Deserialize)]
struct TexturesMap {
    #[serde(rename = "SKIN")]
    skin: Option<SkinEntry>,
}

#[derive(Deserialize)]
struct SkinEntry {
    url: String,
    #[serde(default)]
    metadata: Option<SkinMetadata>,
}

#[derive(Deserialize)]
struct SkinMetadata {
    model: Option<String>,
}

/// Decodes the base64 `textures` profile property.
pub fn skin_from_textures_property(value: &str) -> Result<SkinTextureRef, SkinError> {
    let raw = STANDARD.decode(value.trim())?;
    let payload: TexturesPayload = serde_json::from_slice(&raw)?;
    let skin = payload.textures.skin.ok_or(SkinError::NoSkin)?;
    let model = match skin.metadata.and_then(|meta| meta.model).as_deref() {
        Some("slim") => SkinModel::Slim,
        _ => SkinModel::Classic,
    };
    Ok(SkinTextureRef {
        url: skin.url,
        model,
    })
}

pub fn decode_skin(bytes: &[u8], model: SkinModel) -> Result<SkinImage, SkinError> {
    let rgba = image::load_from_memory(bytes)?.to_rgba8();
    let (width, height) = rgba.dimensions();
    if width != 64 || (height != 64 && height != 32) {
        return Err(SkinError::UnsupportedSize { width, height });
    }
    Ok(SkinImage {
        rgba: rgba.into_raw(),
        width,
        height,
        model,
    })
}

/// Mojang profile lookup: name to uuid, uuid to session profile, then the skin PNG.
pub struct MojangSkinSource {
    client: reqwest::blocking::Client,
}

impl MojangSkinSource {
    pub fn new() -> Result<Self, SkinError> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(concat!("rs-viewer/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client })
    }
}

impl SkinSource for MojangSkinSource {
    fn fetch(&self, username: &str) -> Result<SkinImage, SkinError> {
        let response = self
            .client
            .get(format!("{PROFILE_URL}/{username}"))
            .send()?;
        // Unknown names answer 204 or 404.
        if response.status() != reqwest::StatusCode::OK {
            return Err(SkinError::UnknownPlayer(username.to_string()));
        }
        let lookup: ProfileLookup = response.json()?;

        let profile: SessionProfile = self
            .client
            .get(format!("{SESSION_URL}/{}", lookup.id))
            .send()?
            .error_for_status()?
            .json()?;
        let property = profile
            .properties
            .iter()
            .find(|property| property.name == "textures")
            .ok_or(SkinError::NoSkin)?;
        let texture = skin_from_textures_property(&property.value)?;

        let bytes = self
            .client
            .get(&texture.url)
            .send()?
            .error_for_status()?
            .bytes()?;
        decode_skin(&bytes, texture.model)
    }
}

#[derive(Debug, Clone)]
pub struct SkinRequest {
    pub id: EntityId,
    pub ticket: u64,
    pub username: String,
}

#[derive(Debug)]
pub struct SkinResponse {
    pub id: EntityId,
    pub ticket: u64,
    pub result: Result<SkinImage, SkinError>,
}

#[derive(Resource)]
pub struct SkinLoader {
    request_tx: Sender<SkinRequest>,
    result_rx: Receiver<SkinResponse>,
}

impl SkinLoader {
    /// Starts `workers` threads pulling from one shared request queue.
    pub fn spawn(source: Arc<dyn SkinSource>, workers: usize) -> Self {
        let (request_tx, request_rx) = unbounded::<SkinRequest>();
        let (result_tx, result_rx) = unbounded::<SkinResponse>();
        for _ in 0..workers.max(1) {
            let source = Arc::clone(&source);
            let request_rx = request_rx.clone();
            let result_tx = result_tx.clone();
            thread::spawn(move || skin_worker(source, request_rx, result_tx));
        }
        Self {
            request_tx,
            result_rx,
        }
    }

    pub fn request(&self, request: SkinRequest) -> bool {
        self.request_tx.send(request).is_ok()
    }

    pub fn drain(&self) -> Vec<SkinResponse> {
        self.result_rx.try_iter().collect()
    }
}

fn skin_worker(
    source: Arc<dyn SkinSource>,
    request_rx: Receiver<SkinRequest>,
    result_tx: Sender<SkinResponse>,
) {
    while let Ok(request) = request_rx.recv() {
        debug!(id = request.id, username = %request.username, "fetching skin");
        let result = source.fetch(&request.username);
        let response = SkinResponse {
            id: request.id,
            ticket: request.ticket,
            result,
        };
        if result_tx.send(response).is_err() {
            break;
        }
    }
}
