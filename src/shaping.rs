use bevy::prelude::*;

use crate::bounds::VoxelIntBox;
use crate::constants::{DEBUG_LINE_SECONDS, SHAPING_SIDE, SOLID_MATERIAL, TRACE_DISTANCE};
use crate::error::ShapingError;
use crate::metrics::Metrics;
use crate::render::VoxelWorldUpdated;
use crate::voxel::{add_box, remove_box, update_world, ModifiedVoxel, VoxelWorld};

/// Lets an actor shape matter. Shaping input is ignored on actors without it.
#[derive(Component, Default, Debug, Clone, Copy)]
pub struct MatterShaping;

#[derive(Resource, Clone, Debug)]
pub struct ShapingSettings {
    /// Half-extent of the cube added or removed, in world units.
    pub side: f32,
    pub trace_distance: f32,
    pub debug_line_seconds: f32,
}

impl Default for ShapingSettings {
    fn default() -> Self {
        Self {
            side: SHAPING_SIDE,
            trace_distance: TRACE_DISTANCE,
            debug_line_seconds: DEBUG_LINE_SECONDS,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ShapingOp { Add, Remove }

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MatterShapingRequest {
    pub location: Vec3,
    pub side: f32,
    pub target: Option<Entity>,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ShapeMatter {
    pub request: MatterShapingRequest,
    pub op: ShapingOp,
}

/// Requests queued this frame, applied in order by `apply_shaping`.
#[derive(Resource, Default)]
pub struct ShapingBatch { pub ops: Vec<ShapeMatter> }

impl ShapingBatch {
    pub fn queue(&mut self, request: MatterShapingRequest, op: ShapingOp) {
        self.ops.push(ShapeMatter { request, op });
    }
}

#[derive(Debug)]
pub struct ShapingOutcome {
    pub bounds: VoxelIntBox,
    pub modified: Vec<ModifiedVoxel>,
}

/// Quantizes the request against `world` and runs the box tool under the
/// world's write lock.
pub fn shape_world(world: &VoxelWorld, request: &MatterShapingRequest, op: ShapingOp) -> Result<ShapingOutcome, ShapingError> {
    let bounds = world.quantize_cube(request.location, request.side)?;
    let modified = {
        let mut data = world.write();
        match op {
            ShapingOp::Add => add_box(&mut data, bounds, SOLID_MATERIAL),
            ShapingOp::Remove => remove_box(&mut data, bounds),
        }
    };
    Ok(ShapingOutcome { bounds, modified })
}

/// Resolves the request target to a voxel world and shapes it.
pub fn shape_matter(
    request: &MatterShapingRequest,
    op: ShapingOp,
    worlds: &Query<(Entity, &mut VoxelWorld)>,
) -> Result<(Entity, ShapingOutcome), ShapingError> {
    let target = request.target.ok_or(ShapingError::NotAVoxelWorld)?;
    let (entity, world) = worlds.get(target).map_err(|_| ShapingError::NotAVoxelWorld)?;
    Ok((entity, shape_world(world, request, op)?))
}

pub fn apply_shaping(
    mut batch: ResMut<ShapingBatch>,
    mut worlds: Query<(Entity, &mut VoxelWorld)>,
    mut updates: EventWriter<VoxelWorldUpdated>,
    mut metrics: ResMut<Metrics>,
) {
    if batch.ops.is_empty() { return; }
    for ShapeMatter { request, op } in batch.ops.drain(..) {
        match shape_matter(&request, op, &worlds) {
            Ok((entity, outcome)) => {
                metrics.voxels_modified += outcome.modified.len() as u64;
                if let Ok((_, mut world)) = worlds.get_mut(entity) {
                    update_world(entity, &mut world, outcome.bounds, &mut updates);
                }
                debug!(
                    "{op:?} box {:?}..{:?} on {entity}: {} voxels changed",
                    outcome.bounds.min,
                    outcome.bounds.max,
                    outcome.modified.len()
                );
            }
            Err(err) => {
                metrics.shaping_ignored += 1;
                debug!("shaping request at {} ignored: {err}", request.location);
            }
        }
    }
}
