pub mod box_tools;

use std::collections::HashMap;

use bevy::math::Affine3A;
use bevy::prelude::*;
use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::bounds::{quantize_cube, VoxelIntBox};
use crate::constants::{CHUNK_SIZE, SOLID_MATERIAL, VOXEL_SIZE};
use crate::error::ShapingError;
use crate::render::VoxelWorldUpdated;

pub use box_tools::{add_box, remove_box, ModifiedVoxel};

pub type MaterialId = u8;

/// Sparse voxel field: a present cell is solid with the stored material.
#[derive(Default, Debug, Clone)]
pub struct VoxelData {
    cells: HashMap<IVec3, MaterialId>,
}

impl VoxelData {
    pub fn new() -> Self { Self::default() }

    pub fn get(&self, p: IVec3) -> Option<MaterialId> { self.cells.get(&p).copied() }

    pub fn is_solid(&self, p: IVec3) -> bool { self.cells.contains_key(&p) }

    /// Returns the previous value of the cell.
    pub fn set(&mut self, p: IVec3, mat: MaterialId) -> Option<MaterialId> { self.cells.insert(p, mat) }

    pub fn clear(&mut self, p: IVec3) -> Option<MaterialId> { self.cells.remove(&p) }

    pub fn iter(&self) -> impl Iterator<Item = (&IVec3, &MaterialId)> { self.cells.iter() }

    pub fn count(&self) -> usize { self.cells.len() }
}

/// How a world fills itself when it is created.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum VoxelWorldGenerator {
    Empty,
    /// Solid slab spanning `[-half_extent, half_extent)` on X/Z and `[-depth, 0)` on Y.
    FlatFloor { half_extent: i32, depth: i32 },
}

impl Default for VoxelWorldGenerator {
    fn default() -> Self {
        Self::FlatFloor { half_extent: CHUNK_SIZE / 2, depth: 4 }
    }
}

impl VoxelWorldGenerator {
    pub fn generate(&self, data: &mut VoxelData) -> Option<VoxelIntBox> {
        match *self {
            Self::Empty => None,
            Self::FlatFloor { half_extent, depth } => {
                if half_extent <= 0 || depth <= 0 {
                    return None;
                }
                let bounds = VoxelIntBox::new(
                    IVec3::new(-half_extent, -depth, -half_extent),
                    IVec3::new(half_extent - 1, -1, half_extent - 1),
                );
                for p in bounds.iter() {
                    data.set(p, SOLID_MATERIAL);
                }
                Some(bounds)
            }
        }
    }
}

/// A terrain actor. Its transform and data only become available once `created` is set.
#[derive(Component)]
#[require(Transform)]
pub struct VoxelWorld {
    pub voxel_size: f32,
    pub generator: VoxelWorldGenerator,
    pub created: bool,
    /// Region waiting for a remesh. Worlds with no dirty region are not remeshed.
    pub dirty: Option<VoxelIntBox>,
    local_to_world: Affine3A,
    world_to_local: Affine3A,
    data: RwLock<VoxelData>,
}

impl Default for VoxelWorld {
    fn default() -> Self { Self::new(VOXEL_SIZE) }
}

impl VoxelWorld {
    pub fn new(voxel_size: f32) -> Self {
        Self {
            voxel_size: voxel_size.max(f32::EPSILON),
            generator: VoxelWorldGenerator::default(),
            created: false,
            dirty: None,
            local_to_world: Affine3A::IDENTITY,
            world_to_local: Affine3A::IDENTITY,
            data: RwLock::new(VoxelData::new()),
        }
    }

    pub fn with_generator(mut self, generator: VoxelWorldGenerator) -> Self {
        self.generator = generator;
        self
    }

    pub fn with_transform(mut self, local_to_world: Affine3A) -> Self {
        self.set_transform(local_to_world);
        self
    }

    pub fn set_transform(&mut self, local_to_world: Affine3A) {
        self.local_to_world = local_to_world;
        self.world_to_local = local_to_world.inverse();
    }

    /// Runs the generator and marks the world usable. Returns the generated region.
    pub fn create(&mut self) -> Option<VoxelIntBox> {
        let generated = self.generator.generate(&mut self.data.write());
        self.created = true;
        if let Some(bounds) = generated {
            self.mark_dirty(bounds);
        }
        generated
    }

    /// World position to fractional grid position, `None` before creation.
    pub fn global_to_local(&self, p: Vec3) -> Option<Vec3> {
        if !self.created {
            return None;
        }
        Some(self.world_to_local.transform_point3(p) / self.voxel_size)
    }

    pub fn local_to_global(&self, p: Vec3) -> Vec3 {
        self.local_to_world.transform_point3(p * self.voxel_size)
    }

    /// Grid box covering the world cube of half-extent `side` around `center`.
    pub fn quantize_cube(&self, center: Vec3, side: f32) -> Result<VoxelIntBox, ShapingError> {
        if !self.created {
            return Err(ShapingError::WorldNotCreated);
        }
        let to_local = self.world_to_local;
        let voxel_size = self.voxel_size;
        quantize_cube(|p| to_local.transform_point3(p) / voxel_size, center, side).ok_or(ShapingError::EmptyRegion)
    }

    pub fn read(&self) -> RwLockReadGuard<'_, VoxelData> { self.data.read() }

    /// Exclusive write section; held for the duration of an edit.
    pub fn write(&self) -> RwLockWriteGuard<'_, VoxelData> { self.data.write() }

    pub fn mark_dirty(&mut self, bounds: VoxelIntBox) {
        self.dirty = Some(match self.dirty {
            Some(d) => d.union(&bounds),
            None => bounds,
        });
    }
}

/// Render-update request for `bounds` of `world`.
pub fn update_world(
    entity: Entity,
    world: &mut VoxelWorld,
    bounds: VoxelIntBox,
    updates: &mut EventWriter<VoxelWorldUpdated>,
) {
    world.mark_dirty(bounds);
    updates.write(VoxelWorldUpdated { world: entity, bounds });
}

pub fn sync_world_transforms(mut worlds: Query<(&GlobalTransform, &mut VoxelWorld), Changed<GlobalTransform>>) {
    for (global, mut world) in &mut worlds {
        world.set_transform(global.affine());
    }
}

pub fn create_voxel_worlds(
    mut worlds: Query<(Entity, &mut VoxelWorld)>,
    mut updates: EventWriter<VoxelWorldUpdated>,
) {
    for (entity, mut world) in &mut worlds {
        if world.created {
            continue;
        }
        let generated = world.create();
        info!("voxel world {entity} created with {} voxels", world.read().count());
        if let Some(bounds) = generated {
            updates.write(VoxelWorldUpdated { world: entity, bounds });
        }
    }
}
