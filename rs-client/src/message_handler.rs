use bevy::prelude::*;
use rs_entity::{EntityEvent, EntityUpdateQueue};
use rs_render::CameraFocus;
use rs_utils::{FromNet, FromNetMessage};
use tracing::{debug, info};

pub fn handle_messages(
    from_net: Res<FromNet>,
    mut updates: ResMut<EntityUpdateQueue>,
    mut focus: ResMut<CameraFocus>,
) {
    while let Ok(msg) = from_net.0.try_recv() {
        dispatch(msg, &mut updates, &mut focus);
    }
}

fn dispatch(msg: FromNetMessage, updates: &mut EntityUpdateQueue, focus: &mut CameraFocus) {
    match msg {
        FromNetMessage::Entity(descriptor) => updates.push_update(descriptor),
        FromNetMessage::Version { version } => {
            info!(%version, "server version");
            updates.push(EntityEvent::Reset {
                version: Some(version),
            });
            focus.arm_first_position();
        }
        FromNetMessage::WorldChanged => updates.push(EntityEvent::Reset { version: None }),
        FromNetMessage::Disconnected => {
            info!("bot disconnected");
            updates.push(EntityEvent::Reset { version: None });
        }
        FromNetMessage::Position {
            pos,
            yaw,
            add_mesh,
            entity,
        } => {
            focus.observe_position(pos.as_vec3());
            if !add_mesh {
                return;
            }
            match entity {
                Some(mut bot) => {
                    bot.pos = Some(pos);
                    if yaw.is_some() {
                        bot.yaw = yaw;
                    }
                    updates.push_update(bot);
                }
                None => debug!("bot mesh requested without an entity"),
            }
        }
        FromNetMessage::FocusPoint { pos } => focus.focus_on(pos.as_vec3()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rs_utils::{EntityDescriptor, EntityPosition};

    fn position(pos: EntityPosition) -> FromNetMessage {
        FromNetMessage::Position {
            pos,
            yaw: None,
            add_mesh: false,
            entity: None,
        }
    }

    #[test]
    fn version_resets_and_arms_the_camera() {
        let mut updates = EntityUpdateQueue::default();
        let mut focus = CameraFocus::default();

        dispatch(
            FromNetMessage::Entity(EntityDescriptor::new(3).with_kind("creeper")),
            &mut updates,
            &mut focus,
        );
        dispatch(
            position(EntityPosition::new(0.0, 64.0, 0.0)),
            &mut updates,
            &mut focus,
        );
        assert_eq!(focus.take_target(), None);

        dispatch(
            FromNetMessage::Version {
                version: "1.8.9".to_string(),
            },
            &mut updates,
            &mut focus,
        );
        dispatch(
            position(EntityPosition::new(2.0, 70.0, 3.0)),
            &mut updates,
            &mut focus,
        );
        dispatch(FromNetMessage::Disconnected, &mut updates, &mut focus);

        assert_eq!(focus.take_target(), Some(Vec3::new(2.0, 70.0, 3.0)));
        let events: Vec<_> = updates.drain().collect();
        assert_eq!(
            events,
            vec![
                EntityEvent::Update(EntityDescriptor::new(3).with_kind("creeper")),
                EntityEvent::Reset {
                    version: Some("1.8.9".to_string())
                },
                EntityEvent::Reset { version: None },
            ]
        );
    }

    #[test]
    fn bot_position_mirrors_the_bot_when_asked() {
        let mut updates = EntityUpdateQueue::default();
        let mut focus = CameraFocus::default();
        let bot = EntityDescriptor::new(42)
            .with_kind("player")
            .with_username("bot")
            .with_size(0.6, 1.8);

        dispatch(
            FromNetMessage::Position {
                pos: EntityPosition::new(1.0, 64.0, 2.0),
                yaw: Some(1.5),
                add_mesh: true,
                entity: Some(bot.clone()),
            },
            &mut updates,
            &mut focus,
        );
        dispatch(
            FromNetMessage::Position {
                pos: EntityPosition::new(3.0, 64.0, 2.0),
                yaw: None,
                add_mesh: true,
                entity: Some(bot.clone()),
            },
            &mut updates,
            &mut focus,
        );
        dispatch(
            position(EntityPosition::new(9.0, 64.0, 9.0)),
            &mut updates,
            &mut focus,
        );
        dispatch(
            FromNetMessage::Position {
                pos: EntityPosition::new(9.0, 64.0, 9.0),
                yaw: None,
                add_mesh: true,
                entity: None,
            },
            &mut updates,
            &mut focus,
        );

        let events: Vec<_> = updates.drain().collect();
        assert_eq!(
            events,
            vec![
                EntityEvent::Update(bot.clone().with_pos(1.0, 64.0, 2.0).with_yaw(1.5)),
                EntityEvent::Update(bot.with_pos(3.0, 64.0, 2.0)),
            ]
        );
    }
}
