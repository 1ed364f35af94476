//! Integer voxel-grid boxes and the world-cube quantizer.

use bevy::math::{IVec3, Vec3};

/// Axis-aligned box in grid-cell coordinates. Both `min` and `max` are inclusive.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct VoxelIntBox {
    pub min: IVec3,
    pub max: IVec3,
}

impl VoxelIntBox {
    pub fn new(a: IVec3, b: IVec3) -> Self {
        Self { min: a.min(b), max: a.max(b) }
    }

    pub fn from_point(p: IVec3) -> Self { Self { min: p, max: p } }

    pub fn contains(&self, p: IVec3) -> bool {
        p.cmpge(self.min).all() && p.cmple(self.max).all()
    }

    pub fn union(&self, other: &VoxelIntBox) -> VoxelIntBox {
        VoxelIntBox { min: self.min.min(other.min), max: self.max.max(other.max) }
    }

    /// Number of cells along each axis.
    pub fn size(&self) -> IVec3 { self.max - self.min + IVec3::ONE }

    pub fn count(&self) -> u64 {
        let s = self.size();
        s.x as u64 * s.y as u64 * s.z as u64
    }

    pub fn iter(&self) -> impl Iterator<Item = IVec3> {
        let (min, max) = (self.min, self.max);
        (min.z..=max.z).flat_map(move |z| {
            (min.y..=max.y).flat_map(move |y| (min.x..=max.x).map(move |x| IVec3::new(x, y, z)))
        })
    }
}

/// Running min/max envelope. Starts empty; each `extend` grows it to include a point.
#[derive(Clone, Copy, Debug, Default)]
pub struct VoxelIntBoxAccumulator {
    bounds: Option<VoxelIntBox>,
}

impl VoxelIntBoxAccumulator {
    pub fn extend(&mut self, p: IVec3) {
        let point = VoxelIntBox::from_point(p);
        self.bounds = Some(match self.bounds {
            Some(b) => b.union(&point),
            None => point,
        });
    }

    pub fn is_valid(&self) -> bool { self.bounds.is_some() }

    pub fn finish(self) -> Option<VoxelIntBox> { self.bounds }
}

/// Corners of `[center - side, center + side]`, min-Z face first, each face in
/// the order (minX,minY) (maxX,minY) (minX,maxY) (maxX,maxY).
pub fn cube_corners(center: Vec3, side: f32) -> [Vec3; 8] {
    let min = center - Vec3::splat(side);
    let max = center + Vec3::splat(side);
    [
        Vec3::new(min.x, min.y, min.z),
        Vec3::new(max.x, min.y, min.z),
        Vec3::new(min.x, max.y, min.z),
        Vec3::new(max.x, max.y, min.z),
        Vec3::new(min.x, min.y, max.z),
        Vec3::new(max.x, min.y, max.z),
        Vec3::new(min.x, max.y, max.z),
        Vec3::new(max.x, max.y, max.z),
    ]
}

/// Smallest grid box containing the world cube `[center - side, center + side]`
/// once mapped through `world_to_local`.
///
/// Both the floor and the ceil of every transformed corner are folded in, so a
/// corner that lands between cells pulls in both neighbours. `None` only if no
/// corner was folded in.
pub fn quantize_cube(world_to_local: impl Fn(Vec3) -> Vec3, center: Vec3, side: f32) -> Option<VoxelIntBox> {
    let mut acc = VoxelIntBoxAccumulator::default();
    for corner in cube_corners(center, side) {
        let local = world_to_local(corner);
        acc.extend(local.floor().as_ivec3());
        acc.extend(local.ceil().as_ivec3());
    }
    acc.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_unit_cube() {
        let b = quantize_cube(|p| p, Vec3::ZERO, 1.0).unwrap();
        assert_eq!(b.min, IVec3::splat(-1));
        assert_eq!(b.max, IVec3::splat(1));
    }

    #[test]
    fn half_scale_transform() {
        let b = quantize_cube(|p| p * 0.5, Vec3::splat(10.0), 2.0).unwrap();
        assert_eq!(b.min, IVec3::splat(4));
        assert_eq!(b.max, IVec3::splat(6));
    }

    #[test]
    fn integer_inputs_are_exact() {
        let c = Vec3::new(3.0, -7.0, 12.0);
        let b = quantize_cube(|p| p, c, 4.0).unwrap();
        assert_eq!(b.min, IVec3::new(-1, -11, 8));
        assert_eq!(b.max, IVec3::new(7, -3, 16));
    }

    #[test]
    fn fractional_corners_round_outwards() {
        let b = quantize_cube(|p| p, Vec3::new(0.5, 0.25, -0.3), 1.0).unwrap();
        assert_eq!(b.min, IVec3::new(-1, -1, -2));
        assert_eq!(b.max, IVec3::new(2, 2, 1));
    }

    #[test]
    fn contains_every_transformed_corner_and_is_tight() {
        let xf = |p: Vec3| Vec3::new(p.x * 0.37 + 1.1, p.y * 0.8 - 2.3, p.z * 1.25 + 0.6);
        let center = Vec3::new(4.2, -1.7, 9.9);
        let side = 1.3;
        let b = quantize_cube(xf, center, side).unwrap();

        let mut lo = Vec3::splat(f32::MAX);
        let mut hi = Vec3::splat(f32::MIN);
        for c in cube_corners(center, side) {
            let l = xf(c);
            assert!(b.contains(l.floor().as_ivec3()));
            assert!(b.contains(l.ceil().as_ivec3()));
            lo = lo.min(l);
            hi = hi.max(l);
        }
        assert_eq!(b.min, lo.floor().as_ivec3());
        assert_eq!(b.max, hi.ceil().as_ivec3());
    }

    #[test]
    fn fold_order_does_not_matter() {
        let xf = |p: Vec3| p * 0.3 + Vec3::new(0.1, 0.7, -0.4);
        let corners = cube_corners(Vec3::new(2.5, 1.0, -3.0), 2.2);

        let fold = |order: &[usize]| {
            let mut acc = VoxelIntBoxAccumulator::default();
            for &i in order {
                let l = xf(corners[i]);
                acc.extend(l.floor().as_ivec3());
                acc.extend(l.ceil().as_ivec3());
            }
            acc.finish()
        };

        let forward = fold(&[0, 1, 2, 3, 4, 5, 6, 7]);
        assert_eq!(forward, fold(&[7, 6, 5, 4, 3, 2, 1, 0]));
        assert_eq!(forward, fold(&[3, 6, 0, 5, 2, 7, 1, 4]));
    }

    #[test]
    fn degenerate_cube_still_yields_a_box() {
        let b = quantize_cube(|p| p, Vec3::new(2.0, 3.0, 4.0), 0.0).unwrap();
        assert_eq!(b, VoxelIntBox::from_point(IVec3::new(2, 3, 4)));
        let b = quantize_cube(|p| p, Vec3::new(2.5, 3.0, 4.0), 0.0).unwrap();
        assert_eq!(b, VoxelIntBox::new(IVec3::new(2, 3, 4), IVec3::new(3, 3, 4)));
    }

    #[test]
    fn empty_accumulator_is_invalid() {
        let acc = VoxelIntBoxAccumulator::default();
        assert!(!acc.is_valid());
        assert_eq!(acc.finish(), None);
    }

    #[test]
    fn box_iteration_covers_inclusive_range() {
        let b = VoxelIntBox::new(IVec3::new(1, 1, 1), IVec3::new(-1, 0, 1));
        assert_eq!(b.min, IVec3::new(-1, 0, 1));
        assert_eq!(b.count(), 3 * 2 * 1);
        assert_eq!(b.iter().count() as u64, b.count());
        assert!(b.iter().all(|p| b.contains(p)));
    }
}
