//! Owner of every entity proxy. Creation, retargeting and teardown all go through
//! `EntityRegistry::update`, applied in receipt order once per frame.

use std::collections::hash_map::Entry;
use std::collections::{HashMap, HashSet, VecDeque};

use bevy::prelude::*;
use rs_utils::{EntityDescriptor, EntityId};
use tracing::{debug, info, warn};

use crate::factory::{BoxBody, BuildError, Placement, ProxyContext};
use crate::interpolation::ProxyMotion;
use crate::skins::{SkinImage, SkinRequest, SkinResponse};

#[derive(Debug, Clone, PartialEq)]
pub enum EntityEvent {
    Update(EntityDescriptor),
    /// Drops every proxy; a new version also switches textures and metadata layout.
    Reset { version: Option<String> },
}

#[derive(Default, Resource)]
pub struct EntityUpdateQueue {
    events: VecDeque<EntityEvent>,
}

impl EntityUpdateQueue {
    pub fn push(&mut self, event: EntityEvent) {
        self.events.push_back(event);
    }

    pub fn push_update(&mut self, descriptor: EntityDescriptor) {
        self.push(EntityEvent::Update(descriptor));
    }

    pub fn drain(&mut self) -> std::collections::vec_deque::Drain<'_, EntityEvent> {
        self.events.drain(..)
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

/// Scene-graph node every proxy hangs under.
#[derive(Resource, Debug, Clone, Copy)]
pub struct SceneContainer {
    root: Entity,
}

impl SceneContainer {
    pub fn new(root: Entity) -> Self {
        Self { root }
    }

    pub fn root(&self) -> Entity {
        self.root
    }

    pub fn add(&self, commands: &mut Commands, node: Entity) {
        commands.entity(self.root).add_child(node);
    }

    pub fn remove(&self, commands: &mut Commands, node: Entity) {
        if let Ok(mut entity) = commands.get_entity(node) {
            entity.remove::<ChildOf>();
        }
    }
}

#[derive(Component, Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntityProxy {
    pub id: EntityId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProxyStatus {
    /// Waiting on a skin lookup; no proxy exists yet.
    Pending,
    Ready,
    /// Construction failed; updates are swallowed until deletion or reset.
    Failed,
}

/// Position/yaw received while a creation is pending. Last value wins.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
struct TransformIntent {
    position: Option<Vec3>,
    yaw: Option<f32>,
}

impl TransformIntent {
    fn merge(&mut self, descriptor: &EntityDescriptor) {
        if let Some(pos) = descriptor.pos {
            self.position = Some(pos.as_vec3());
        }
        if let Some(yaw) = descriptor.yaw {
            self.yaw = Some(yaw);
        }
    }

    fn placement(&self) -> Placement {
        Placement {
            position: self.position.unwrap_or(Vec3::ZERO),
            yaw: self.yaw.unwrap_or(0.0),
        }
    }
}

#[derive(Debug)]
enum Slot {
    Pending {
        ticket: u64,
        intent: TransformIntent,
        descriptor: EntityDescriptor,
    },
    Ready {
        root: Entity,
        motion: ProxyMotion,
    },
    /// `sticky` failures (no model for the variant) stay until deletion or reset;
    /// the rest are retried by the next descriptor that could build.
    Failed {
        sticky: bool,
        intent: TransformIntent,
    },
}

/// Upper bound on remembered deletions; the oldest are forgotten first.
pub const MAX_TOMBSTONES: usize = 4096;

/// Recently deleted ids, bounded by `MAX_TOMBSTONES`.
#[derive(Debug, Default)]
struct Tombstones {
    ids: HashSet<EntityId>,
    order: VecDeque<EntityId>,
}

impl Tombstones {
    fn contains(&self, id: EntityId) -> bool {
        self.ids.contains(&id)
    }

    fn insert(&mut self, id: EntityId) {
        if !self.ids.insert(id) {
            return;
        }
        self.order.push_back(id);
        while self.order.len() > MAX_TOMBSTONES {
            if let Some(oldest) = self.order.pop_front() {
                self.ids.remove(&oldest);
            }
        }
    }

    fn remove(&mut self, id: EntityId) {
        if self.ids.remove(&id) {
            self.order.retain(|tombstone| *tombstone != id);
        }
    }

    fn len(&self) -> usize {
        self.ids.len()
    }

    fn clear(&mut self) {
        self.ids.clear();
        self.order.clear();
    }
}

#[derive(Default, Resource)]
pub struct EntityRegistry {
    slots: HashMap<EntityId, Slot>,
    /// Ids deleted since the last reset.
    deleted: Tombstones,
    next_ticket: u64,
}

impl EntityRegistry {
    pub fn status(&self, id: EntityId) -> Option<ProxyStatus> {
        self.slots.get(&id).map(|slot| match slot {
            Slot::Pending { .. } => ProxyStatus::Pending,
            Slot::Ready { .. } => ProxyStatus::Ready,
            Slot::Failed { .. } => ProxyStatus::Failed,
        })
    }

    pub fn proxy(&self, id: EntityId) -> Option<Entity> {
        match self.slots.get(&id) {
            Some(Slot::Ready { root, .. }) => Some(*root),
            _ => None,
        }
    }

    pub fn motion(&self, id: EntityId) -> Option<&ProxyMotion> {
        match self.slots.get(&id) {
            Some(Slot::Ready { motion, .. }) => Some(motion),
            _ => None,
        }
    }

    /// Number of live proxies.
    pub fn len(&self) -> usize {
        self.slots
            .values()
            .filter(|slot| matches!(slot, Slot::Ready { .. }))
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_deleted(&self, id: EntityId) -> bool {
        self.deleted.contains(id)
    }

    pub fn tombstone_count(&self) -> usize {
        self.deleted.len()
    }

    pub fn motions_mut(&mut self) -> impl Iterator<Item = (Entity, &mut ProxyMotion)> {
        self.slots.values_mut().filter_map(|slot| match slot {
            Slot::Ready { root, motion } => Some((*root, motion)),
            _ => None,
        })
    }

    pub fn update(&mut self, descriptor: EntityDescriptor, ctx: &mut ProxyContext) {
        let id = descriptor.id;
        if descriptor.deleted {
            self.delete(id, ctx);
            return;
        }

        if self.deleted.contains(id) {
            if descriptor.kind.is_none() {
                warn!(id, "update for deleted entity ignored");
                return;
            }
            self.deleted.remove(id);
        }

        let duration = ctx.settings.interpolation;
        match self.slots.get_mut(&id) {
            None => self.create(descriptor, TransformIntent::default(), ctx),
            Some(Slot::Pending { intent, .. }) => intent.merge(&descriptor),
            Some(Slot::Ready { motion, .. }) => {
                if let Some(pos) = descriptor.pos {
                    motion.retarget_position(pos.as_vec3(), duration);
                }
                if let Some(yaw) = descriptor.yaw {
                    motion.retarget_yaw(yaw, duration);
                }
            }
            Some(Slot::Failed { sticky, intent }) => {
                if *sticky || !could_build(&descriptor) {
                    intent.merge(&descriptor);
                    return;
                }
                let intent = *intent;
                debug!(id, "retrying failed entity");
                self.slots.remove(&id);
                self.create(descriptor, intent, ctx);
            }
        }
    }

    fn create(
        &mut self,
        descriptor: EntityDescriptor,
        mut intent: TransformIntent,
        ctx: &mut ProxyContext,
    ) {
        let id = descriptor.id;
        intent.merge(&descriptor);

        if ctx.factory.needs_skin(&descriptor)
            && let Some(loader) = ctx.skins.as_ref()
        {
            let ticket = self.next_ticket;
            self.next_ticket += 1;
            let username = descriptor.username.clone().unwrap_or_default();
            if loader.request(SkinRequest {
                id,
                ticket,
                username,
            }) {
                debug!(id, ticket, "creation waiting for skin");
                self.slots.insert(
                    id,
                    Slot::Pending {
                        ticket,
                        intent,
                        descriptor,
                    },
                );
                return;
            }
            warn!(id, "skin loader unavailable, building without skin");
        }

        let slot = build_slot(id, &descriptor, None, intent, ctx);
        self.slots.insert(id, slot);
    }

    fn delete(&mut self, id: EntityId, ctx: &mut ProxyContext) {
        match self.slots.remove(&id) {
            Some(Slot::Ready { root, .. }) => release(root, ctx),
            Some(Slot::Pending { ticket, .. }) => debug!(id, ticket, "pending creation abandoned"),
            Some(Slot::Failed { .. }) => {}
            None if self.deleted.contains(id) => warn!(id, "entity deleted twice"),
            None => debug!(id, "deletion for unknown entity"),
        }
        self.deleted.insert(id);
    }

    /// Attaches a finished skin lookup, provided the slot still waits for this ticket.
    pub fn complete_skin(&mut self, response: SkinResponse, ctx: &mut ProxyContext) {
        let SkinResponse { id, ticket, result } = response;
        let Entry::Occupied(entry) = self.slots.entry(id) else {
            debug!(id, ticket, "skin for removed entity discarded");
            return;
        };
        if !matches!(entry.get(), Slot::Pending { ticket: current, .. } if *current == ticket) {
            debug!(id, ticket, "stale skin discarded");
            return;
        }
        let Slot::Pending {
            intent, descriptor, ..
        } = entry.remove()
        else {
            return;
        };

        let skin = match result {
            Ok(skin) => Some(skin),
            Err(err) => {
                warn!(id, username = ?descriptor.username, %err, "skin unavailable, using default");
                None
            }
        };
        let slot = build_slot(id, &descriptor, skin.as_ref(), intent, ctx);
        self.slots.insert(id, slot);
    }

    /// Removes every proxy and forgets deletions. Safe to call repeatedly.
    pub fn clear(&mut self, ctx: &mut ProxyContext) {
        let released = self.len();
        for (_, slot) in self.slots.drain() {
            if let Slot::Ready { root, .. } = slot {
                release(root, ctx);
            }
        }
        self.deleted.clear();
        if released > 0 {
            info!(released, "entity proxies cleared");
        }
    }
}

fn build_slot(
    id: EntityId,
    descriptor: &EntityDescriptor,
    skin: Option<&SkinImage>,
    intent: TransformIntent,
    ctx: &mut ProxyContext,
) -> Slot {
    let placement = intent.placement();
    match ctx.build_proxy(descriptor, skin, placement) {
        Ok(root) => {
            ctx.scene.add(&mut ctx.commands, root);
            debug!(id, kind = ?descriptor.kind, "entity proxy created");
            Slot::Ready {
                root,
                motion: ProxyMotion::new(placement.position, placement.yaw),
            }
        }
        Err(err) => {
            log_build_error(id, &err);
            Slot::Failed {
                sticky: err.is_benign(),
                intent,
            }
        }
    }
}

/// Whether a descriptor carries enough to attempt a build: a kind tag or a usable box.
fn could_build(descriptor: &EntityDescriptor) -> bool {
    descriptor.kind.is_some() || BoxBody::new(descriptor.width, descriptor.height).is_ok()
}

fn release(root: Entity, ctx: &mut ProxyContext) {
    ctx.scene.remove(&mut ctx.commands, root);
    ctx.disposals.push(root);
}

fn log_build_error(id: EntityId, err: &BuildError) {
    if err.is_benign() {
        debug!(id, %err, "no model for entity");
    } else {
        warn!(id, %err, "entity proxy not built");
    }
}

pub fn apply_entity_updates(
    mut queue: ResMut<EntityUpdateQueue>,
    mut registry: ResMut<EntityRegistry>,
    mut ctx: ProxyContext,
) {
    for event in queue.drain() {
        match event {
            EntityEvent::Update(descriptor) => registry.update(descriptor, &mut ctx),
            EntityEvent::Reset { version } => {
                registry.clear(&mut ctx);
                if let Some(version) = version
                    && version != ctx.settings.version
                {
                    info!(%version, "protocol version changed");
                    ctx.settings.version = version;
                }
            }
        }
    }
}

pub fn attach_resolved_skins(mut registry: ResMut<EntityRegistry>, mut ctx: ProxyContext) {
    let responses = match ctx.skins.as_ref() {
        Some(loader) => loader.drain(),
        None => return,
    };
    for response in responses {
        registry.complete_skin(response, &mut ctx);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn intent_keeps_the_latest_values() {
        let mut intent = TransformIntent::default();
        intent.merge(&EntityDescriptor::new(1).with_pos(1.0, 2.0, 3.0));
        intent.merge(&EntityDescriptor::new(1).with_yaw(0.5));
        intent.merge(&EntityDescriptor::new(1).with_pos(4.0, 5.0, 6.0));
        assert_eq!(
            intent.placement(),
            Placement {
                position: Vec3::new(4.0, 5.0, 6.0),
                yaw: 0.5,
            }
        );
        assert_eq!(TransformIntent::default().placement(), Placement::default());
    }

    #[test]
    fn queue_preserves_receipt_order() {
        let mut queue = EntityUpdateQueue::default();
        queue.push_update(EntityDescriptor::new(1));
        queue.push(EntityEvent::Reset { version: None });
        queue.push_update(EntityDescriptor::deletion(1));
        let events: Vec<_> = queue.drain().collect();
        assert_eq!(events.len(), 3);
        assert!(matches!(events[1], EntityEvent::Reset { .. }));
        assert_eq!(events[2], EntityEvent::Update(EntityDescriptor::deletion(1)));
        assert!(queue.is_empty());
    }

    #[test]
    fn tombstones_forget_the_oldest_ids() {
        let mut tombstones = Tombstones::default();
        let total = MAX_TOMBSTONES as EntityId + 10;
        for id in 0..total {
            tombstones.insert(id);
        }
        tombstones.insert(total - 1);
        assert_eq!(tombstones.len(), MAX_TOMBSTONES);
        assert!(!tombstones.contains(0));
        assert!(!tombstones.contains(9));
        assert!(tombstones.contains(10));
        assert!(tombstones.contains(total - 1));

        tombstones.remove(10);
        assert!(!tombstones.contains(10));
        assert_eq!(tombstones.order.len(), MAX_TOMBSTONES - 1);
        tombstones.insert(total);
        assert!(tombstones.contains(11));
        assert_eq!(tombstones.len(), MAX_TOMBSTONES);
    }

    #[test]
    fn only_kind_or_valid_size_can_retry() {
        assert!(!could_build(&EntityDescriptor::new(1).with_pos(1.0, 64.0, 1.0)));
        assert!(could_build(&EntityDescriptor::new(1).with_kind("zombie")));
        assert!(could_build(&EntityDescriptor::new(1).with_size(0.6, 1.95)));
        assert!(!could_build(&EntityDescriptor::new(1).with_size(f32::NAN, 1.0)));
    }
}
