use std::path::{Path, PathBuf};

use bevy::{ecs::resource::Resource, prelude::Vec3};
use crossbeam::channel::Receiver;
use serde::Deserialize;

pub const VIEWER_ASSETS_ROOT_ENV: &str = "RS_VIEWER_ASSETS_ROOT";

/// Protocol version assumed until the server announces one.
pub const DEFAULT_PROTOCOL_VERSION: &str = "1.16.4";

pub fn viewer_assets_root() -> PathBuf {
    if let Ok(explicit) = std::env::var(VIEWER_ASSETS_ROOT_ENV) {
        let path = PathBuf::from(explicit);
        if path.exists() {
            return path;
        }
    }

    if let Ok(exe) = std::env::current_exe()
        && let Some(exe_dir) = exe.parent()
    {
        let sibling_assets = exe_dir.join("assets");
        if sibling_assets.exists() {
            return sibling_assets;
        }
    }

    let repo_assets = Path::new(env!("CARGO_MANIFEST_DIR")).join("../rs-client/assets");
    if repo_assets.exists() {
        return repo_assets;
    }

    PathBuf::from("assets")
}

/// Root of the per-version texture directories (`<root>/<version>/entity/...`).
pub fn textures_root(assets_root: &Path) -> PathBuf {
    assets_root.join("textures")
}

pub type EntityId = i32;

#[derive(Debug, Clone, Copy, PartialEq, Default, Deserialize)]
pub struct EntityPosition {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl EntityPosition {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub fn as_vec3(&self) -> Vec3 {
        Vec3::new(self.x as f32, self.y as f32, self.z as f32)
    }
}

/// One server-authoritative entity update. Every field except `id` is optional on
/// the wire; follow-up updates usually carry only `pos`/`yaw`.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct EntityDescriptor {
    pub id: EntityId,
    #[serde(default, alias = "name")]
    pub kind: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub width: f32,
    #[serde(default)]
    pub height: f32,
    #[serde(default)]
    pub metadata: Vec<u8>,
    #[serde(default)]
    pub pos: Option<EntityPosition>,
    #[serde(default)]
    pub yaw: Option<f32>,
    #[serde(default, alias = "delete")]
    pub deleted: bool,
}

impl EntityDescriptor {
    pub fn new(id: EntityId) -> Self {
        Self {
            id,
            ..Default::default()
        }
    }

    pub fn with_kind(mut self, kind: impl Into<String>) -> Self {
        self.kind = Some(kind.into());
        self
    }

    pub fn with_username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    pub fn with_size(mut self, width: f32, height: f32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    pub fn with_metadata(mut self, metadata: Vec<u8>) -> Self {
        self.metadata = metadata;
        self
    }

    pub fn with_pos(mut self, x: f64, y: f64, z: f64) -> Self {
        self.pos = Some(EntityPosition::new(x, y, z));
        self
    }

    pub fn with_yaw(mut self, yaw: f32) -> Self {
        self.yaw = Some(yaw);
        self
    }

    pub fn deletion(id: EntityId) -> Self {
        Self {
            id,
            deleted: true,
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FromNetMessage {
    Entity(EntityDescriptor),
    Version { version: String },
    WorldChanged,
    Disconnected,
    /// Position of the observed bot; aims the camera. With `add_mesh` the bot itself is
    /// mirrored too, built from `entity` and moved to `pos`/`yaw`.
    Position {
        pos: EntityPosition,
        #[serde(default)]
        yaw: Option<f32>,
        #[serde(default, rename = "addMesh", alias = "add_mesh")]
        add_mesh: bool,
        #[serde(default)]
        entity: Option<EntityDescriptor>,
    },
    FocusPoint { pos: EntityPosition },
}

#[derive(Resource)]
pub struct FromNet(pub Receiver<FromNetMessage>);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entity_message_parses_with_optional_fields() {
        let line = r#"{"type":"entity","id":1,"kind":"player","username":"Alice","width":0.6,"height":1.8,"metadata":[0,0],"pos":{"x":0,"y":64,"z":0},"yaw":0}"#;
        let msg: FromNetMessage = serde_json::from_str(line).unwrap();
        let FromNetMessage::Entity(entity) = msg else {
            panic!("expected entity message");
        };
        assert_eq!(entity.id, 1);
        assert_eq!(entity.kind.as_deref(), Some("player"));
        assert_eq!(entity.username.as_deref(), Some("Alice"));
        assert_eq!(entity.pos, Some(EntityPosition::new(0.0, 64.0, 0.0)));
        assert_eq!(entity.yaw, Some(0.0));
        assert!(!entity.deleted);
    }

    #[test]
    fn partial_update_and_aliases() {
        let moved: FromNetMessage =
            serde_json::from_str(r#"{"type":"entity","id":7,"pos":{"x":1,"y":2,"z":3}}"#).unwrap();
        assert_eq!(
            moved,
            FromNetMessage::Entity(EntityDescriptor::new(7).with_pos(1.0, 2.0, 3.0))
        );

        let removed: FromNetMessage =
            serde_json::from_str(r#"{"type":"entity","id":7,"delete":true}"#).unwrap();
        assert_eq!(removed, FromNetMessage::Entity(EntityDescriptor::deletion(7)));

        let named: FromNetMessage =
            serde_json::from_str(r#"{"type":"entity","id":8,"name":"zombie"}"#).unwrap();
        assert_eq!(
            named,
            FromNetMessage::Entity(EntityDescriptor::new(8).with_kind("zombie"))
        );
    }

    #[test]
    fn reset_messages_parse() {
        let version: FromNetMessage =
            serde_json::from_str(r#"{"type":"version","version":"1.8.9"}"#).unwrap();
        assert_eq!(
            version,
            FromNetMessage::Version {
                version: "1.8.9".to_string()
            }
        );
        let world: FromNetMessage = serde_json::from_str(r#"{"type":"world_changed"}"#).unwrap();
        assert_eq!(world, FromNetMessage::WorldChanged);
    }

    #[test]
    fn bot_position_carries_its_own_entity() {
        let line = r#"{"type":"position","pos":{"x":1,"y":64,"z":2},"yaw":1.5,"addMesh":true,"entity":{"id":42,"name":"player","username":"bot","width":0.6,"height":1.8}}"#;
        let FromNetMessage::Position {
            pos,
            yaw,
            add_mesh,
            entity,
        } = serde_json::from_str(line).unwrap()
        else {
            panic!("expected position message");
        };
        assert_eq!(pos, EntityPosition::new(1.0, 64.0, 2.0));
        assert_eq!(yaw, Some(1.5));
        assert!(add_mesh);
        let entity = entity.unwrap();
        assert_eq!(entity.id, 42);
        assert_eq!(entity.kind.as_deref(), Some("player"));

        let plain: FromNetMessage =
            serde_json::from_str(r#"{"type":"position","pos":{"x":0,"y":70,"z":0}}"#).unwrap();
        assert_eq!(
            plain,
            FromNetMessage::Position {
                pos: EntityPosition::new(0.0, 70.0, 0.0),
                yaw: None,
                add_mesh: false,
                entity: None,
            }
        );
    }
}
