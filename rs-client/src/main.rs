use std::sync::Arc;

use bevy::prelude::*;
use clap::Parser;
use rs_entity::{EntitySyncPlugin, MojangSkinSource, NametagRenderer, SkinSource};
use rs_render::RenderPlugin;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

mod config;
mod feed;
mod message_handler;
mod plugins;

use config::Cli;
use plugins::ClientNetPlugin;

fn load_nametag_renderer(cli: &Cli) -> NametagRenderer {
    let path = cli.font_path();
    let bytes = match std::fs::read(&path) {
        Ok(bytes) => bytes,
        Err(err) => {
            error!(path = %path.display(), %err, "font unavailable, nametags disabled");
            return NametagRenderer::default();
        }
    };
    NametagRenderer::from_font_bytes(bytes).unwrap_or_else(|err| {
        error!(path = %path.display(), %err, "font unusable, nametags disabled");
        NametagRenderer::default()
    })
}

fn skin_source(cli: &Cli) -> Option<Arc<dyn SkinSource>> {
    if cli.offline {
        return None;
    }
    match MojangSkinSource::new() {
        Ok(source) => Some(Arc::new(source)),
        Err(err) => {
            warn!(%err, "skin lookups disabled");
            None
        }
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,wgpu=warn")),
        )
        .without_time()
        .compact()
        .init();

    let cli = Cli::parse();
    let nametags = load_nametag_renderer(&cli);

    let from_net = match feed::start_feed_thread(cli.feed.clone(), cli.feed_interval()) {
        Ok(from_net) => from_net,
        Err(err) => {
            error!(%err, "cannot start feed");
            std::process::exit(1);
        }
    };

    info!(version = %cli.version, assets = %cli.assets_root().display(), "Starting viewer");

    App::new()
        .add_plugins(DefaultPlugins.build().disable::<bevy::log::LogPlugin>())
        .add_plugins(RenderPlugin)
        .add_plugins(EntitySyncPlugin {
            settings: cli.sync_settings(),
            skin_source: skin_source(&cli),
            skin_workers: cli.skin_workers,
        })
        .insert_resource(nametags)
        .add_plugins(ClientNetPlugin::new(from_net))
        .run();
}
