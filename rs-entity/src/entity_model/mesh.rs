use bevy::pbr::NotShadowCaster;
use bevy::prelude::*;
use bevy::render::mesh::{Indices, PrimitiveTopology};
use bevy::render::render_asset::RenderAssetUsages;

use super::{CubeDef, ModelDef, PartDef};

/// One model pixel in world units.
pub const PX: f32 = 1.0 / 16.0;

#[derive(Component, Debug, Clone, Copy)]
pub struct ModelPart {
    pub name: &'static str,
}

#[derive(Debug, Clone)]
pub struct SpawnedModel {
    pub root: Entity,
    /// Bevy entities for each part, in the same order as `model.parts`.
    pub parts: Vec<Entity>,
}

struct Face {
    /// Indices into the cube corner table (bit 0: x, bit 1: y, bit 2: z).
    corners: [usize; 4],
    normal: [f32; 3],
}

// Vertex order follows vanilla ModelBox so the UV rectangles line up.
const FACES: [Face; 6] = [
    Face { corners: [5, 1, 3, 7], normal: [1.0, 0.0, 0.0] },
    Face { corners: [0, 4, 6, 2], normal: [-1.0, 0.0, 0.0] },
    Face { corners: [5, 4, 0, 1], normal: [0.0, 1.0, 0.0] },
    Face { corners: [3, 2, 6, 7], normal: [0.0, -1.0, 0.0] },
    Face { corners: [1, 0, 2, 3], normal: [0.0, 0.0, -1.0] },
    Face { corners: [4, 5, 7, 6], normal: [0.0, 0.0, 1.0] },
];

/// Texture rectangles `(u1, v1, u2, v2)` in `FACES` order.
fn face_uv_rects(cube: &CubeDef) -> [[u32; 4]; 6] {
    let [u, v] = cube.uv;
    let [w, h, d] = cube.size.map(|s| s as u32);
    [
        [u + d + w, v + d, u + d + w + d, v + d + h],
        [u, v + d, u + d, v + d + h],
        [u + d, v, u + d + w, v + d],
        [u + d + w, v + d, u + d + w + w, v],
        [u + d, v + d, u + d + w, v + d + h],
        [u + d + w + d, v + d, u + d + w + d + w, v + d + h],
    ]
}

#[derive(Default)]
struct MeshBuffers {
    positions: Vec<[f32; 3]>,
    normals: Vec<[f32; 3]>,
    uvs: Vec<[f32; 2]>,
    indices: Vec<u32>,
}

impl MeshBuffers {
    fn push_cube(&mut self, tex_size: [u32; 2], cube: &CubeDef) {
        let inf = cube.inflate;
        let [x, y, z] = cube.from;
        let [w, h, d] = cube.size;
        let (mut x1, mut x2) = (x - inf, x + w + inf);
        if cube.mirror {
            std::mem::swap(&mut x1, &mut x2);
        }
        let (y1, y2) = (y - inf, y + h + inf);
        let (z1, z2) = (z - inf, z + d + inf);

        // Model space is +Y down; bevy is +Y up.
        let corners: [Vec3; 8] = std::array::from_fn(|i| {
            let cx = if i & 1 == 0 { x1 } else { x2 };
            let cy = if i & 2 == 0 { y1 } else { y2 };
            let cz = if i & 4 == 0 { z1 } else { z2 };
            Vec3::new(cx * PX, -cy * PX, cz * PX)
        });

        let to_uv = |uu: u32, vv: u32| -> [f32; 2] {
            [uu as f32 / tex_size[0] as f32, vv as f32 / tex_size[1] as f32]
        };

        for (face, [u1, v1, u2, v2]) in FACES.iter().zip(face_uv_rects(cube)) {
            let mut normal = Vec3::from_array(face.normal);
            if cube.mirror {
                // Swapped x bounds move the east/west faces to the opposite side.
                normal.x = -normal.x;
            }
            let verts = face.corners.map(|c| corners[c]);
            let uv = [to_uv(u2, v1), to_uv(u1, v1), to_uv(u1, v2), to_uv(u2, v2)];
            self.push_quad(verts, normal, uv);
        }
    }

    fn push_quad(&mut self, mut verts: [Vec3; 4], normal: Vec3, mut uv: [[f32; 2]; 4]) {
        let winding = (verts[1] - verts[0]).cross(verts[2] - verts[0]);
        if winding.dot(normal) < 0.0 {
            verts.swap(1, 3);
            uv.swap(1, 3);
        }

        let base = self.positions.len() as u32;
        for (vert, uv) in verts.iter().zip(uv) {
            self.positions.push(vert.to_array());
            self.normals.push(normal.to_array());
            self.uvs.push(uv);
        }
        self.indices
            .extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
    }

    fn into_mesh(self) -> Mesh {
        let mut mesh = Mesh::new(
            PrimitiveTopology::TriangleList,
            RenderAssetUsages::default(),
        );
        mesh.insert_attribute(Mesh::ATTRIBUTE_POSITION, self.positions);
        mesh.insert_attribute(Mesh::ATTRIBUTE_NORMAL, self.normals);
        mesh.insert_attribute(Mesh::ATTRIBUTE_UV_0, self.uvs);
        mesh.insert_indices(Indices::U32(self.indices));
        mesh
    }
}

pub fn part_mesh(model: &ModelDef, part: &PartDef) -> Mesh {
    let mut buffers = MeshBuffers::default();
    for cube in part.cubes {
        buffers.push_cube(model.tex_size, cube);
    }
    buffers.into_mesh()
}

/// Spawns the part hierarchy of `model`. Every drawable part gets its own mesh asset
/// and shares `material`; the caller parents the returned root.
pub fn spawn_model(
    commands: &mut Commands,
    meshes: &mut Assets<Mesh>,
    model: &ModelDef,
    material: &Handle<StandardMaterial>,
    casts_shadows: bool,
) -> SpawnedModel {
    let root = commands
        .spawn((
            Name::new(format!("EntityModel[{}]", model.name)),
            Transform::from_translation(Vec3::from_array(model.root_offset_px) * PX),
            Visibility::Visible,
        ))
        .id();

    let parts: Vec<Entity> = model
        .parts
        .iter()
        .map(|part| {
            let pivot = Vec3::new(part.pivot[0], -part.pivot[1], part.pivot[2]) * PX;
            let mut part_cmd = commands.spawn((
                Name::new(format!("EntityModelPart[{}]", part.name)),
                ModelPart { name: part.name },
                Transform::from_translation(pivot),
                Visibility::Visible,
            ));
            if !part.cubes.is_empty() {
                part_cmd.insert((
                    Mesh3d(meshes.add(part_mesh(model, part))),
                    MeshMaterial3d(material.clone()),
                ));
                if !casts_shadows {
                    part_cmd.insert(NotShadowCaster);
                }
            }
            part_cmd.id()
        })
        .collect();

    for (part, &entity) in model.parts.iter().zip(&parts) {
        let parent = part
            .parent
            .and_then(|p| parts.get(p).copied())
            .unwrap_or(root);
        commands.entity(parent).add_child(entity);
    }

    SpawnedModel { root, parts }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity_model::{PLAYER_CLASSIC_MODEL, ZOMBIE_MODEL};

    fn positions(mesh: &Mesh) -> Vec<[f32; 3]> {
        mesh.attribute(Mesh::ATTRIBUTE_POSITION)
            .and_then(|values| values.as_float3())
            .expect("positions")
            .to_vec()
    }

    #[test]
    fn head_cube_spans_half_a_block_above_the_pivot() {
        let head = &PLAYER_CLASSIC_MODEL.parts[0];
        let mesh = part_mesh(&PLAYER_CLASSIC_MODEL, head);
        let positions = positions(&mesh);
        assert_eq!(positions.len(), 24);
        assert_eq!(mesh.indices().map(|i| i.len()), Some(36));

        let min_y = positions.iter().map(|p| p[1]).fold(f32::MAX, f32::min);
        let max_y = positions.iter().map(|p| p[1]).fold(f32::MIN, f32::max);
        assert!(min_y.abs() < 1e-6);
        assert!((max_y - 0.5).abs() < 1e-6);
    }

    #[test]
    fn faces_wind_outward_for_plain_and_mirrored_cubes() {
        // Part 4 of the zombie layout is the mirrored left arm.
        for part in [&ZOMBIE_MODEL.parts[3], &ZOMBIE_MODEL.parts[4]] {
            let mesh = part_mesh(&ZOMBIE_MODEL, part);
            let positions = positions(&mesh);
            let center = positions
                .iter()
                .fold(Vec3::ZERO, |acc, p| acc + Vec3::from_array(*p))
                / positions.len() as f32;
            for quad in positions.chunks(4) {
                let [a, b, c] = [quad[0], quad[1], quad[2]].map(Vec3::from_array);
                let facing = (b - a).cross(c - a);
                let outward = (a + c) * 0.5 - center;
                assert!(facing.dot(outward) > 0.0, "{} has an inward face", part.name);
            }
        }
    }
}
