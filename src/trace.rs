//! Segment traces against voxel worlds and simple box colliders.

use bevy::ecs::system::SystemParam;
use bevy::prelude::*;

use crate::voxel::{VoxelData, VoxelWorld};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TraceChannel {
    Visibility,
    Pawn,
}

/// Which channels a collider blocks.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TraceResponse {
    pub visibility: bool,
    pub pawn: bool,
}

impl TraceResponse {
    pub const BLOCK_ALL: Self = Self { visibility: true, pawn: true };

    pub fn blocks(&self, channel: TraceChannel) -> bool {
        match channel {
            TraceChannel::Visibility => self.visibility,
            TraceChannel::Pawn => self.pawn,
        }
    }
}

/// Axis-aligned box blocker centered on the entity's global translation.
/// Rotation and scale of the entity are ignored.
#[derive(Component, Clone, Copy, Debug)]
#[require(Transform)]
pub struct TraceCollider {
    pub half_extents: Vec3,
    pub response: TraceResponse,
}

impl TraceCollider {
    pub fn cuboid(half_extents: Vec3) -> Self {
        Self { half_extents, response: TraceResponse::BLOCK_ALL }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TraceHit {
    pub impact_point: Vec3,
    pub normal: Vec3,
    pub distance: f32,
    /// Fraction along the segment, 0 at start and 1 at end.
    pub fraction: f32,
    pub entity: Entity,
}

/// Closest blocking hit along `start..end`.
///
/// Voxel worlds block every channel; worlds that are not created yet are
/// skipped. `ignore` is never reported (usually the tracing actor).
pub fn line_trace_single<'a>(
    start: Vec3,
    end: Vec3,
    channel: TraceChannel,
    ignore: Option<Entity>,
    worlds: impl IntoIterator<Item = (Entity, &'a VoxelWorld)>,
    colliders: impl IntoIterator<Item = (Entity, &'a TraceCollider, Vec3)>,
) -> Option<TraceHit> {
    let length = start.distance(end);
    let mut best: Option<TraceHit> = None;
    let mut consider = |hit: TraceHit| {
        if best.is_none_or(|b| hit.fraction < b.fraction) {
            best = Some(hit);
        }
    };

    for (entity, world) in worlds {
        if Some(entity) == ignore {
            continue;
        }
        let (Some(local_start), Some(local_end)) = (world.global_to_local(start), world.global_to_local(end)) else {
            continue;
        };
        let Some((fraction, local_normal)) = trace_cells(&world.read(), local_start, local_end - local_start) else {
            continue;
        };
        let local_point = local_start + (local_end - local_start) * fraction;
        let normal = if local_normal == IVec3::ZERO {
            (start - end).normalize_or_zero()
        } else {
            (world.local_to_global(local_normal.as_vec3()) - world.local_to_global(Vec3::ZERO)).normalize_or_zero()
        };
        consider(TraceHit {
            impact_point: world.local_to_global(local_point),
            normal,
            distance: length * fraction,
            fraction,
            entity,
        });
    }

    for (entity, collider, center) in colliders {
        if Some(entity) == ignore || !collider.response.blocks(channel) {
            continue;
        }
        let min = center - collider.half_extents;
        let max = center + collider.half_extents;
        if let Some((fraction, normal)) = segment_aabb(start, end - start, min, max) {
            consider(TraceHit {
                impact_point: start + (end - start) * fraction,
                normal,
                distance: length * fraction,
                fraction,
                entity,
            });
        }
    }

    best
}

/// Grid walk over unit cells from `origin` along `delta` (fraction 0..=1).
/// Returns the fraction at which a solid cell is entered and the face normal
/// crossed; a zero normal means the origin itself is inside a solid cell.
pub fn trace_cells(data: &VoxelData, origin: Vec3, delta: Vec3) -> Option<(f32, IVec3)> {
    if data.count() == 0 {
        return None;
    }
    let mut cell = origin.floor().as_ivec3();
    if data.is_solid(cell) {
        return Some((0.0, IVec3::ZERO));
    }

    let mut step = IVec3::ZERO;
    let mut t_max = Vec3::splat(f32::INFINITY);
    let mut t_delta = Vec3::splat(f32::INFINITY);
    for axis in 0..3 {
        let d = delta[axis];
        if d > 0.0 {
            step[axis] = 1;
            t_delta[axis] = 1.0 / d;
            t_max[axis] = ((cell[axis] + 1) as f32 - origin[axis]) / d;
        } else if d < 0.0 {
            step[axis] = -1;
            t_delta[axis] = -1.0 / d;
            t_max[axis] = (cell[axis] as f32 - origin[axis]) / d;
        }
    }

    loop {
        let axis = if t_max.x <= t_max.y && t_max.x <= t_max.z {
            0
        } else if t_max.y <= t_max.z {
            1
        } else {
            2
        };
        let t = t_max[axis];
        if t > 1.0 {
            return None;
        }
        cell[axis] += step[axis];
        t_max[axis] += t_delta[axis];
        if data.is_solid(cell) {
            let mut normal = IVec3::ZERO;
            normal[axis] = -step[axis];
            return Some((t, normal));
        }
    }
}

/// Slab test of the segment `origin + delta * t`, `t` in 0..=1, against a box.
fn segment_aabb(origin: Vec3, delta: Vec3, min: Vec3, max: Vec3) -> Option<(f32, Vec3)> {
    let mut t_enter = 0.0_f32;
    let mut t_exit = 1.0_f32;
    let mut normal = Vec3::ZERO;

    for axis in 0..3 {
        let o = origin[axis];
        let d = delta[axis];
        if d.abs() < f32::EPSILON {
            if o < min[axis] || o > max[axis] {
                return None;
            }
            continue;
        }
        let (near, far, sign) = if d > 0.0 {
            ((min[axis] - o) / d, (max[axis] - o) / d, -1.0)
        } else {
            ((max[axis] - o) / d, (min[axis] - o) / d, 1.0)
        };
        if near > t_enter {
            t_enter = near;
            normal = Vec3::ZERO;
            normal[axis] = sign;
        }
        t_exit = t_exit.min(far);
        if t_enter > t_exit {
            return None;
        }
    }

    if normal == Vec3::ZERO {
        // started inside
        normal = -delta.normalize_or_zero();
    }
    Some((t_enter, normal))
}

/// World query used by anything that casts rays during `Update`.
#[derive(SystemParam)]
pub struct LineTrace<'w, 's> {
    worlds: Query<'w, 's, (Entity, &'static VoxelWorld)>,
    colliders: Query<'w, 's, (Entity, &'static TraceCollider, &'static GlobalTransform)>,
}

impl LineTrace<'_, '_> {
    pub fn single(&self, start: Vec3, end: Vec3, channel: TraceChannel, ignore: Option<Entity>) -> Option<TraceHit> {
        line_trace_single(
            start,
            end,
            channel,
            ignore,
            self.worlds.iter(),
            self.colliders.iter().map(|(e, c, g)| (e, c, g.translation())),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::voxel::VoxelWorldGenerator;

    fn floor_world() -> VoxelWorld {
        let mut world = VoxelWorld::new(1.0).with_generator(VoxelWorldGenerator::FlatFloor { half_extent: 8, depth: 2 });
        world.create();
        world
    }

    fn entity(i: u32) -> Entity { Entity::from_raw(i) }

    #[test]
    fn downward_trace_hits_floor_top() {
        let world = floor_world();
        let hit = line_trace_single(
            Vec3::new(0.5, 5.0, 0.5),
            Vec3::new(0.5, -10.0, 0.5),
            TraceChannel::Pawn,
            None,
            [(entity(1), &world)],
            [],
        )
        .unwrap();
        assert_eq!(hit.entity, entity(1));
        assert!((hit.impact_point.y - 0.0).abs() < 1e-4);
        assert!((hit.distance - 5.0).abs() < 1e-4);
        assert_eq!(hit.normal, Vec3::Y);
    }

    #[test]
    fn trace_above_floor_misses() {
        let world = floor_world();
        let hit = line_trace_single(Vec3::new(-5.0, 1.0, 0.0), Vec3::new(5.0, 1.0, 0.0), TraceChannel::Pawn, None, [(entity(1), &world)], []);
        assert!(hit.is_none());
    }

    #[test]
    fn uncreated_world_is_not_traced() {
        let world = VoxelWorld::new(1.0);
        let hit = line_trace_single(Vec3::new(0.5, 5.0, 0.5), Vec3::new(0.5, -10.0, 0.5), TraceChannel::Pawn, None, [(entity(1), &world)], []);
        assert!(hit.is_none());
    }

    #[test]
    fn closest_of_world_and_collider_wins() {
        let world = floor_world();
        let pillar = TraceCollider::cuboid(Vec3::splat(0.5));
        let hit = line_trace_single(
            Vec3::new(0.0, 5.0, 0.0),
            Vec3::new(0.0, -10.0, 0.0),
            TraceChannel::Pawn,
            None,
            [(entity(1), &world)],
            [(entity(2), &pillar, Vec3::new(0.0, 2.0, 0.0))],
        )
        .unwrap();
        assert_eq!(hit.entity, entity(2));
        assert!((hit.impact_point.y - 2.5).abs() < 1e-4);
        assert_eq!(hit.normal, Vec3::Y);
    }

    #[test]
    fn ignored_and_non_blocking_colliders_are_skipped() {
        let pillar = TraceCollider::cuboid(Vec3::splat(0.5));
        let ghost = TraceCollider { half_extents: Vec3::splat(0.5), response: TraceResponse { visibility: true, pawn: false } };
        let hit = line_trace_single(
            Vec3::new(-5.0, 0.0, 0.0),
            Vec3::new(5.0, 0.0, 0.0),
            TraceChannel::Pawn,
            Some(entity(2)),
            [],
            [(entity(2), &pillar, Vec3::ZERO), (entity(3), &ghost, Vec3::new(2.0, 0.0, 0.0))],
        );
        assert!(hit.is_none());
    }

    #[test]
    fn side_hit_on_collider() {
        let pillar = TraceCollider::cuboid(Vec3::new(1.0, 3.0, 1.0));
        let hit = line_trace_single(
            Vec3::new(-5.0, 0.0, 0.0),
            Vec3::new(5.0, 0.0, 0.0),
            TraceChannel::Visibility,
            None,
            [],
            [(entity(4), &pillar, Vec3::ZERO)],
        )
        .unwrap();
        assert!((hit.impact_point.x + 1.0).abs() < 1e-4);
        assert_eq!(hit.normal, Vec3::NEG_X);
    }

    #[test]
    fn grid_walk_reports_entered_face() {
        let mut data = VoxelData::new();
        data.set(IVec3::new(3, 0, 0), 1);
        let (t, normal) = trace_cells(&data, Vec3::new(0.5, 0.5, 0.5), Vec3::new(10.0, 0.0, 0.0)).unwrap();
        assert!((t - 0.25).abs() < 1e-5);
        assert_eq!(normal, IVec3::NEG_X);
    }

    #[test]
    fn grid_walk_starting_in_solid() {
        let mut data = VoxelData::new();
        data.set(IVec3::ZERO, 1);
        assert_eq!(trace_cells(&data, Vec3::splat(0.5), Vec3::X), Some((0.0, IVec3::ZERO)));
    }
}
