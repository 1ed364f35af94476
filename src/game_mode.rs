use bevy::prelude::*;

use crate::character::{FollowCamera, VoxelTestCharacter};
use crate::constants::{CHUNK_SIZE, VOXEL_SIZE};
use crate::shaping::MatterShaping;
use crate::trace::TraceCollider;
use crate::voxel::{VoxelWorld, VoxelWorldGenerator};

/// Which pawn the game mode spawns for the local player.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum DefaultPawn {
    #[default]
    ThirdPersonCharacter,
    /// No pawn; useful for headless runs.
    None,
}

/// Level layout and the pawn handed to the player.
#[derive(Resource, Clone, Debug)]
pub struct VoxelTestGameMode {
    pub default_pawn: DefaultPawn,
    pub player_start: Vec3,
    pub voxel_size: f32,
    pub floor_half_extent: i32,
    pub floor_depth: i32,
    /// Non-voxel pillars dropped around the level; traces hitting them shape nothing.
    pub scenery: Vec<Vec3>,
}

impl Default for VoxelTestGameMode {
    fn default() -> Self {
        Self {
            default_pawn: DefaultPawn::ThirdPersonCharacter,
            player_start: Vec3::new(0.0, 2.0, 6.0),
            voxel_size: VOXEL_SIZE,
            floor_half_extent: CHUNK_SIZE / 2,
            floor_depth: 4,
            scenery: vec![Vec3::new(6.0, 1.5, -6.0), Vec3::new(-8.0, 1.5, 2.0)],
        }
    }
}

pub struct GameModePlugin;

impl Plugin for GameModePlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<VoxelTestGameMode>()
            .add_systems(Startup, (spawn_level, spawn_default_pawn));
    }
}

fn spawn_level(
    mut commands: Commands,
    mode: Res<VoxelTestGameMode>,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
) {
    commands.spawn((
        Name::new("VoxelWorld"),
        VoxelWorld::new(mode.voxel_size).with_generator(VoxelWorldGenerator::FlatFloor {
            half_extent: mode.floor_half_extent,
            depth: mode.floor_depth,
        }),
        Transform::default(),
        Visibility::default(),
    ));

    let half = Vec3::new(0.5, 1.5, 0.5);
    let pillar_mesh = meshes.add(Cuboid::from_size(half * 2.0));
    let pillar_material = materials.add(Color::srgb(0.55, 0.55, 0.6));
    for &position in &mode.scenery {
        commands.spawn((
            Name::new("Pillar"),
            TraceCollider::cuboid(half),
            Mesh3d(pillar_mesh.clone()),
            MeshMaterial3d(pillar_material.clone()),
            Transform::from_translation(position),
        ));
    }

    commands.spawn((
        DirectionalLight {
            illuminance: 20000.0,
            shadows_enabled: true,
            ..default()
        },
        Transform::from_xyz(50.0, 100.0, 50.0).looking_at(Vec3::ZERO, Vec3::Y),
    ));
    commands.insert_resource(AmbientLight { brightness: 300.0, ..default() });
}

fn spawn_default_pawn(
    mut commands: Commands,
    mode: Res<VoxelTestGameMode>,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
) {
    if mode.default_pawn == DefaultPawn::None {
        return;
    }
    let body = VoxelTestCharacter::new(mode.player_start);
    let character = commands
        .spawn((
            Name::new("ThirdPersonCharacter"),
            Mesh3d(meshes.add(Capsule3d::new(0.42, 1.08))),
            MeshMaterial3d(materials.add(Color::srgb(0.8, 0.7, 0.3))),
            Transform::from_translation(mode.player_start),
            body,
            MatterShaping,
        ))
        .id();

    commands.spawn((
        Name::new("FollowCamera"),
        Camera3d::default(),
        Projection::Perspective(PerspectiveProjection {
            fov: 70.0_f32.to_radians(),
            ..default()
        }),
        Transform::from_translation(mode.player_start + Vec3::new(0.0, 1.0, 4.0)),
        FollowCamera { character },
    ));
}
