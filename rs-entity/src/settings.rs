use std::path::PathBuf;
use std::time::Duration;

use bevy::prelude::*;
use rs_utils::{DEFAULT_PROTOCOL_VERSION, textures_root, viewer_assets_root};

use crate::metadata::MetadataLayout;

pub const DEFAULT_INTERPOLATION: Duration = Duration::from_millis(50);

#[derive(Resource, Debug, Clone)]
pub struct EntitySyncSettings {
    /// Protocol version of the observed server; selects textures and metadata layout.
    pub version: String,
    pub interpolation: Duration,
    /// Directory holding one texture pack per version.
    pub textures_root: PathBuf,
}

impl Default for EntitySyncSettings {
    fn default() -> Self {
        Self {
            version: DEFAULT_PROTOCOL_VERSION.to_string(),
            interpolation: DEFAULT_INTERPOLATION,
            textures_root: textures_root(&viewer_assets_root()),
        }
    }
}

impl EntitySyncSettings {
    pub fn metadata_layout(&self) -> MetadataLayout {
        MetadataLayout::for_version(&self.version)
    }
}
