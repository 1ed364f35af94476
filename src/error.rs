use thiserror::Error;

/// Why a shaping request did not touch any voxels.
///
/// These are expected in play (a trace hitting scenery, a world still
/// loading) and are swallowed by the dispatcher system.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum ShapingError {
    #[error("shaping target is not a voxel world")]
    NotAVoxelWorld,
    #[error("voxel world has not been created yet")]
    WorldNotCreated,
    #[error("shaping cube maps to an empty grid region")]
    EmptyRegion,
}
