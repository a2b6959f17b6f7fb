use std::sync::Mutex;

use bevy::prelude::*;
use rs_entity::EntitySyncSet;
use rs_utils::FromNet;
use tracing::warn;

use crate::message_handler;

/// Hands the feed receiver to the app and drains it ahead of entity sync.
pub struct ClientNetPlugin {
    from_net: Mutex<Option<FromNet>>,
}

impl ClientNetPlugin {
    pub fn new(from_net: FromNet) -> Self {
        Self {
            from_net: Mutex::new(Some(from_net)),
        }
    }
}

impl Plugin for ClientNetPlugin {
    fn build(&self, app: &mut App) {
        let from_net = self
            .from_net
            .lock()
            .ok()
            .and_then(|mut slot| slot.take());
        match from_net {
            Some(from_net) => {
                app.insert_resource(from_net);
            }
            None => {
                warn!("ClientNetPlugin built twice; feed already consumed");
                return;
            }
        }

        app.add_systems(
            Update,
            message_handler::handle_messages.before(EntitySyncSet::Apply),
        );
    }
}
