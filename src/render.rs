use bevy::asset::RenderAssetUsages;
use bevy::prelude::*;
use bevy::render::mesh::{Indices, PrimitiveTopology};

use crate::bounds::VoxelIntBox;
use crate::metrics::Metrics;
use crate::voxel::{VoxelData, VoxelWorld};

/// Emitted after an edit or creation touched `bounds` of `world`. The same
/// region is merged into the world's `dirty` box, which the remesher consumes.
#[derive(Event, Clone, Copy, Debug, PartialEq, Eq)]
pub struct VoxelWorldUpdated {
    pub world: Entity,
    pub bounds: VoxelIntBox,
}

#[derive(Resource)]
pub struct VoxelMaterial(pub Handle<StandardMaterial>);

impl FromWorld for VoxelMaterial {
    fn from_world(world: &mut World) -> Self {
        let mut materials = world.resource_mut::<Assets<StandardMaterial>>();
        Self(materials.add(StandardMaterial {
            base_color: Color::srgb(0.45, 0.62, 0.38),
            perceptual_roughness: 0.9,
            ..default()
        }))
    }
}

struct FaceDir {
    offset: IVec3,
    normal: [f32; 3],
    corners: [[f32; 3]; 4],
}

// Corners wind counter-clockwise seen from outside the cell.
const FACES: [FaceDir; 6] = [
    FaceDir { offset: IVec3::X, normal: [1.0, 0.0, 0.0], corners: [[1.0, 0.0, 0.0], [1.0, 1.0, 0.0], [1.0, 1.0, 1.0], [1.0, 0.0, 1.0]] },
    FaceDir { offset: IVec3::NEG_X, normal: [-1.0, 0.0, 0.0], corners: [[0.0, 0.0, 1.0], [0.0, 1.0, 1.0], [0.0, 1.0, 0.0], [0.0, 0.0, 0.0]] },
    FaceDir { offset: IVec3::Y, normal: [0.0, 1.0, 0.0], corners: [[0.0, 1.0, 0.0], [0.0, 1.0, 1.0], [1.0, 1.0, 1.0], [1.0, 1.0, 0.0]] },
    FaceDir { offset: IVec3::NEG_Y, normal: [0.0, -1.0, 0.0], corners: [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [1.0, 0.0, 1.0], [0.0, 0.0, 1.0]] },
    FaceDir { offset: IVec3::Z, normal: [0.0, 0.0, 1.0], corners: [[0.0, 0.0, 1.0], [1.0, 0.0, 1.0], [1.0, 1.0, 1.0], [0.0, 1.0, 1.0]] },
    FaceDir { offset: IVec3::NEG_Z, normal: [0.0, 0.0, -1.0], corners: [[0.0, 0.0, 0.0], [0.0, 1.0, 0.0], [1.0, 1.0, 0.0], [1.0, 0.0, 0.0]] },
];

const FACE_UVS: [[f32; 2]; 4] = [[0.0, 0.0], [0.0, 1.0], [1.0, 1.0], [1.0, 0.0]];

/// Cube mesh of every solid cell, with faces between two solid cells culled.
/// Positions are in the world's local space, scaled by `voxel_size`.
pub fn build_voxel_mesh(data: &VoxelData, voxel_size: f32) -> Mesh {
    let mut positions: Vec<[f32; 3]> = Vec::new();
    let mut normals: Vec<[f32; 3]> = Vec::new();
    let mut uvs: Vec<[f32; 2]> = Vec::new();
    let mut indices: Vec<u32> = Vec::new();

    for (&cell, _) in data.iter() {
        let base = cell.as_vec3();
        for face in &FACES {
            if data.is_solid(cell + face.offset) {
                continue;
            }
            let start = positions.len() as u32;
            for (corner, uv) in face.corners.iter().zip(FACE_UVS) {
                positions.push(((base + Vec3::from_array(*corner)) * voxel_size).to_array());
                normals.push(face.normal);
                uvs.push(uv);
            }
            indices.extend_from_slice(&[start, start + 1, start + 2, start, start + 2, start + 3]);
        }
    }

    Mesh::new(PrimitiveTopology::TriangleList, RenderAssetUsages::default())
        .with_inserted_attribute(Mesh::ATTRIBUTE_POSITION, positions)
        .with_inserted_attribute(Mesh::ATTRIBUTE_NORMAL, normals)
        .with_inserted_attribute(Mesh::ATTRIBUTE_UV_0, uvs)
        .with_inserted_indices(Indices::U32(indices))
}

pub fn remesh_voxel_worlds(
    mut commands: Commands,
    mut updates: EventReader<VoxelWorldUpdated>,
    mut worlds: Query<(&mut VoxelWorld, Option<&Mesh3d>)>,
    mut meshes: ResMut<Assets<Mesh>>,
    material: Res<VoxelMaterial>,
    mut metrics: ResMut<Metrics>,
) {
    let mut touched: Vec<Entity> = updates.read().map(|u| u.world).collect();
    if touched.is_empty() {
        return;
    }
    touched.sort();
    touched.dedup();

    for entity in touched {
        let Ok((mut world, existing)) = worlds.get_mut(entity) else { continue };
        let Some(dirty) = world.dirty.take() else { continue };
        let mesh = build_voxel_mesh(&world.read(), world.voxel_size);
        match existing.and_then(|handle| meshes.get_mut(&handle.0)) {
            Some(current) => *current = mesh,
            None => {
                commands
                    .entity(entity)
                    .insert((Mesh3d(meshes.add(mesh)), MeshMaterial3d(material.0.clone())));
            }
        }
        metrics.remeshes += 1;
        debug!("remeshed voxel world {entity} after changes in {}..{}", dirty.min, dirty.max);
    }
}
