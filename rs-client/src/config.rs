use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use rs_entity::EntitySyncSettings;
use rs_utils::{DEFAULT_PROTOCOL_VERSION, VIEWER_ASSETS_ROOT_ENV, textures_root, viewer_assets_root};

#[derive(Parser, Debug)]
#[command(name = "rs-client")]
#[command(about = "Mirrors a bot's entity feed into a 3D scene")]
pub struct Cli {
    /// JSON-lines event feed; `-` reads stdin
    #[arg(long, default_value = "-")]
    pub feed: PathBuf,

    /// Delay between replayed feed lines
    #[arg(long, default_value_t = 0)]
    pub feed_interval_ms: u64,

    /// Asset root holding `textures/<version>/...`
    #[arg(long, env = VIEWER_ASSETS_ROOT_ENV)]
    pub assets: Option<PathBuf>,

    /// TTF/OTF font for nametags; defaults to `<assets>/fonts/minecraft.ttf`
    #[arg(long)]
    pub font: Option<PathBuf>,

    /// Protocol version assumed until the feed announces one
    #[arg(long, default_value = DEFAULT_PROTOCOL_VERSION)]
    pub version: String,

    #[arg(long, default_value_t = 50)]
    pub interpolation_ms: u64,

    #[arg(long, default_value_t = 2)]
    pub skin_workers: usize,

    /// Skip skin lookups; players use the default texture
    #[arg(long)]
    pub offline: bool,
}

impl Cli {
    pub fn assets_root(&self) -> PathBuf {
        self.assets.clone().unwrap_or_else(viewer_assets_root)
    }

    pub fn font_path(&self) -> PathBuf {
        self.font
            .clone()
            .unwrap_or_else(|| self.assets_root().join("fonts").join("minecraft.ttf"))
    }

    pub fn feed_interval(&self) -> Duration {
        Duration::from_millis(self.feed_interval_ms)
    }

    pub fn sync_settings(&self) -> EntitySyncSettings {
        EntitySyncSettings {
            version: self.version.clone(),
            interpolation: Duration::from_millis(self.interpolation_ms),
            textures_root: textures_root(&self.assets_root()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_read_stdin_with_online_skins() {
        let cli = Cli::parse_from(["rs-client", "--assets", "/srv/viewer"]);
        assert_eq!(cli.feed, PathBuf::from("-"));
        assert!(!cli.offline);
        assert_eq!(cli.skin_workers, 2);
        assert_eq!(cli.font_path(), PathBuf::from("/srv/viewer/fonts/minecraft.ttf"));

        let settings = cli.sync_settings();
        assert_eq!(settings.version, DEFAULT_PROTOCOL_VERSION);
        assert_eq!(settings.interpolation, Duration::from_millis(50));
        assert_eq!(settings.textures_root, PathBuf::from("/srv/viewer/textures"));
    }

    #[test]
    fn flags_override_settings() {
        let cli = Cli::parse_from([
            "rs-client",
            "--feed",
            "session.jsonl",
            "--version",
            "1.8.9",
            "--interpolation-ms",
            "120",
            "--offline",
        ]);
        assert_eq!(cli.feed, PathBuf::from("session.jsonl"));
        assert!(cli.offline);
        let settings = cli.sync_settings();
        assert_eq!(settings.version, "1.8.9");
        assert_eq!(settings.interpolation, Duration::from_millis(120));
    }
}
