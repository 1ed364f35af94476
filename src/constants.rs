//! Global size & coordinate constants

pub const VOXEL_SIZE: f32 = 1.0; // meters per cell
pub const CHUNK_SIZE: i32 = 32;

/// Material written by the add-box tool.
pub const SOLID_MATERIAL: u8 = 1;

/// Half-extent of the shaped cube, in world units.
pub const SHAPING_SIDE: f32 = 2.0;
/// How far the camera trace reaches.
pub const TRACE_DISTANCE: f32 = 30.0;
pub const DEBUG_LINE_SECONDS: f32 = 5.0;

pub const GRAVITY: f32 = 9.81;
