use bevy::prelude::*;
use crate::voxel::VoxelWorld;

#[derive(Resource, Default, Debug)]
pub struct Metrics {
    pub frame_time_ms: f32,
    pub fps: f32,
    pub voxel_count: u64,
    pub voxels_modified: u64,
    pub shaping_ignored: u64,
    pub remeshes: u64,
}

pub fn flush_metrics(
    mut metrics: ResMut<Metrics>,
    time: Res<Time>,
    worlds: Query<&VoxelWorld>,
) {
    let dt = time.delta_secs();
    metrics.frame_time_ms = dt * 1000.0;
    if dt > 0.0 {
        metrics.fps = 1.0 / dt;
    }
    metrics.voxel_count = worlds.iter().map(|w| w.read().count() as u64).sum();
}
