//! Explicit release of the GPU-side assets a proxy owns. Handles alone would keep
//! meshes alive as long as anything clones them, so removed proxies drop their
//! assets from the stores directly.

use std::collections::HashSet;

use bevy::asset::Asset;
use bevy::prelude::*;
use tracing::debug;

use crate::textures::EntityTextureCache;

/// Proxies detached this frame, released by `dispose_released_proxies`.
#[derive(Resource, Default, Debug)]
pub struct DisposeQueue {
    nodes: Vec<Entity>,
}

impl DisposeQueue {
    pub fn push(&mut self, node: Entity) {
        self.nodes.push(node);
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DisposeReport {
    pub meshes: usize,
    pub materials: usize,
    pub images: usize,
    pub despawned: bool,
}

/// Releases every mesh, material and material texture under `node`, then despawns
/// it. Images tracked by the shared texture cache are left alone.
pub fn dispose_node(world: &mut World, node: Entity) -> DisposeReport {
    if world.get_entity(node).is_err() {
        return DisposeReport::default();
    }

    let mut meshes: HashSet<AssetId<Mesh>> = HashSet::new();
    let mut materials: HashSet<AssetId<StandardMaterial>> = HashSet::new();
    let mut stack = vec![node];
    while let Some(current) = stack.pop() {
        let Ok(entity) = world.get_entity(current) else {
            continue;
        };
        if let Some(mesh) = entity.get::<Mesh3d>() {
            meshes.insert(mesh.0.id());
        }
        if let Some(material) = entity.get::<MeshMaterial3d<StandardMaterial>>() {
            materials.insert(material.0.id());
        }
        if let Some(children) = entity.get::<Children>() {
            stack.extend_from_slice(children);
        }
    }

    let mut images: HashSet<AssetId<Image>> = HashSet::new();
    if let Some(store) = world.get_resource::<Assets<StandardMaterial>>() {
        images.extend(
            materials
                .iter()
                .filter_map(|id| store.get(*id))
                .filter_map(|material| material.base_color_texture.as_ref())
                .map(|handle| handle.id()),
        );
    }
    if let Some(cache) = world.get_resource::<EntityTextureCache>() {
        images.retain(|id| !cache.is_shared(*id));
    }

    DisposeReport {
        meshes: release(world, meshes),
        materials: release(world, materials),
        images: release(world, images),
        despawned: world.despawn(node),
    }
}

fn release<A: Asset>(world: &mut World, ids: HashSet<AssetId<A>>) -> usize {
    let Some(mut store) = world.get_resource_mut::<Assets<A>>() else {
        return 0;
    };
    ids.into_iter()
        .filter(|id| store.remove(*id).is_some())
        .count()
}

pub fn dispose_released_proxies(world: &mut World) {
    let nodes = std::mem::take(&mut world.resource_mut::<DisposeQueue>().nodes);
    for node in nodes {
        let report = dispose_node(world, node);
        debug!(?node, ?report, "disposed entity proxy");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn world_with_assets() -> World {
        let mut world = World::new();
        world.init_resource::<Assets<Mesh>>();
        world.init_resource::<Assets<StandardMaterial>>();
        world.init_resource::<Assets<Image>>();
        world
    }

    #[test]
    fn shared_handles_are_released_once() {
        let mut world = world_with_assets();
        let image = world.resource_mut::<Assets<Image>>().add(Image::default());
        let material = world
            .resource_mut::<Assets<StandardMaterial>>()
            .add(StandardMaterial {
                base_color_texture: Some(image),
                ..Default::default()
            });
        let mesh = world
            .resource_mut::<Assets<Mesh>>()
            .add(Cuboid::new(1.0, 1.0, 1.0));

        let root = world.spawn(Transform::default()).id();
        for _ in 0..3 {
            let part = world
                .spawn((Mesh3d(mesh.clone()), MeshMaterial3d(material.clone())))
                .id();
            world.entity_mut(root).add_child(part);
        }

        let report = dispose_node(&mut world, root);
        assert_eq!(
            report,
            DisposeReport {
                meshes: 1,
                materials: 1,
                images: 1,
                despawned: true,
            }
        );
        assert_eq!(world.resource::<Assets<Mesh>>().len(), 0);
        assert_eq!(world.resource::<Assets<StandardMaterial>>().len(), 0);
        assert_eq!(world.resource::<Assets<Image>>().len(), 0);
        assert_eq!(world.entities().len(), 0);
    }

    #[test]
    fn missing_node_is_a_no_op() {
        let mut world = world_with_assets();
        let node = world.spawn_empty().id();
        world.despawn(node);
        assert_eq!(dispose_node(&mut world, node), DisposeReport::default());
    }

    #[test]
    fn queue_drains_every_frame() {
        let mut world = world_with_assets();
        world.init_resource::<DisposeQueue>();
        let a = world.spawn_empty().id();
        let b = world.spawn_empty().id();
        world.resource_mut::<DisposeQueue>().push(a);
        world.resource_mut::<DisposeQueue>().push(b);

        dispose_released_proxies(&mut world);
        assert!(world.resource::<DisposeQueue>().is_empty());
        assert!(world.get_entity(a).is_err());
        assert!(world.get_entity(b).is_err());
    }
}
