//! Box CSG edits over a `VoxelData` region.
//!
//! Both tools overwrite: every cell of the region ends up solid (add) or empty
//! (remove), regardless of what it held before.

use bevy::math::IVec3;

use super::{MaterialId, VoxelData};
use crate::bounds::VoxelIntBox;

/// A cell whose value changed during an edit.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ModifiedVoxel {
    pub position: IVec3,
    pub old: Option<MaterialId>,
    pub new: Option<MaterialId>,
}

pub fn add_box(data: &mut VoxelData, bounds: VoxelIntBox, material: MaterialId) -> Vec<ModifiedVoxel> {
    let mut modified = Vec::new();
    for p in bounds.iter() {
        let old = data.set(p, material);
        if old != Some(material) {
            modified.push(ModifiedVoxel { position: p, old, new: Some(material) });
        }
    }
    modified
}

pub fn remove_box(data: &mut VoxelData, bounds: VoxelIntBox) -> Vec<ModifiedVoxel> {
    let mut modified = Vec::new();
    for p in bounds.iter() {
        if let Some(old) = data.clear(p) {
            modified.push(ModifiedVoxel { position: p, old: Some(old), new: None });
        }
    }
    modified
}
