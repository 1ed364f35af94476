pub mod constants;
pub mod error;
pub mod bounds;
pub mod voxel;
pub mod shaping;
pub mod trace;
pub mod input;
pub mod character;
pub mod render;
pub mod game_mode;
pub mod debug_draw;
pub mod metrics;
pub mod debug_overlay;

use bevy::prelude::*;

/// Frame phases, in order.
#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub enum ShapingSet {
    Input,
    Character,
    Edit,
    Render,
}

/// Voxel worlds, player input, the character and matter shaping.
/// Add `GameModePlugin` on top to get the default level and pawn.
pub struct MatterShapingPlugin;

impl Plugin for MatterShapingPlugin {
    fn build(&self, app: &mut App) {
        app
            .add_event::<input::ActionEvent>()
            .add_event::<render::VoxelWorldUpdated>()
            .init_resource::<metrics::Metrics>()
            .init_resource::<input::InputMappingContext>()
            .init_resource::<input::ActionStates>()
            .init_resource::<shaping::ShapingSettings>()
            .init_resource::<shaping::ShapingBatch>()
            .init_resource::<debug_draw::DebugLines>()
            .init_resource::<render::VoxelMaterial>()
            .configure_sets(Update, (
                ShapingSet::Input,
                ShapingSet::Character,
                ShapingSet::Edit,
                ShapingSet::Render,
            ).chain())
            .add_systems(Update, (
                input::dispatch_input_actions.in_set(ShapingSet::Input),
                (
                    character::check_character_setup,
                    character::handle_character_actions,
                    character::move_characters,
                    character::update_follow_cameras,
                ).chain().in_set(ShapingSet::Character),
                (
                    voxel::sync_world_transforms,
                    voxel::create_voxel_worlds,
                    shaping::apply_shaping,
                ).chain().in_set(ShapingSet::Edit),
                (
                    render::remesh_voxel_worlds,
                    debug_draw::draw_debug_lines,
                    metrics::flush_metrics,
                ).in_set(ShapingSet::Render),
            ));
    }
}

pub use bounds::{quantize_cube, VoxelIntBox, VoxelIntBoxAccumulator};
pub use character::{CameraBoom, CharacterMovement, FollowCamera, VoxelTestCharacter};
pub use debug_overlay::DebugOverlayPlugin;
pub use error::ShapingError;
pub use game_mode::{GameModePlugin, VoxelTestGameMode};
pub use input::{ActionEvent, ActionValue, InputAction, InputMappingContext, TriggerEvent};
pub use metrics::Metrics;
pub use shaping::{MatterShaping, MatterShapingRequest, ShapingBatch, ShapingOp, ShapingSettings};
pub use trace::{LineTrace, TraceChannel, TraceCollider, TraceHit};
pub use voxel::{VoxelData, VoxelWorld, VoxelWorldGenerator};
