//! Third-person player character: movement, look, jump, follow camera, and
//! the add/remove cube actions.

use bevy::prelude::*;

use crate::constants::GRAVITY;
use crate::debug_draw::DebugLines;
use crate::input::{ActionEvent, InputAction, TriggerEvent};
use crate::shaping::{MatterShaping, MatterShapingRequest, ShapingBatch, ShapingOp, ShapingSettings};
use crate::trace::{LineTrace, TraceChannel, TraceHit};

const PITCH_LIMIT: f32 = 1.5;
/// Characters falling below this height are put back at their spawn point.
pub const KILL_Z: f32 = -50.0;
const GROUND_SNAP: f32 = 0.05;

#[derive(Component, Debug, Clone)]
#[require(Transform, CharacterMovement, CameraBoom)]
pub struct VoxelTestCharacter {
    pub control_yaw: f32,
    pub control_pitch: f32,
    pub velocity: Vec3,
    pub grounded: bool,
    pub spawn_point: Vec3,
    move_input: Vec2,
    jump_pressed: bool,
}

impl VoxelTestCharacter {
    pub fn new(spawn_point: Vec3) -> Self {
        Self {
            control_yaw: 0.0,
            control_pitch: -0.3,
            velocity: Vec3::ZERO,
            grounded: false,
            spawn_point,
            move_input: Vec2::ZERO,
            jump_pressed: false,
        }
    }

    /// Queues movement along the yaw-only forward (`y`) and right (`x`) axes.
    pub fn add_move_input(&mut self, value: Vec2) { self.move_input += value; }

    pub fn add_look_input(&mut self, value: Vec2) {
        self.control_yaw -= value.x;
        self.control_pitch = (self.control_pitch + value.y).clamp(-PITCH_LIMIT, PITCH_LIMIT);
    }

    pub fn jump(&mut self) { self.jump_pressed = true; }

    pub fn stop_jumping(&mut self) { self.jump_pressed = false; }

    pub fn control_rotation(&self) -> Quat {
        Quat::from_euler(EulerRot::YXZ, self.control_yaw, self.control_pitch, 0.0)
    }

    fn yaw_axes(&self) -> (Vec3, Vec3) {
        let yaw = Quat::from_rotation_y(self.control_yaw);
        (yaw * Vec3::NEG_Z, yaw * Vec3::X)
    }
}

/// Movement tuning, in metres and seconds.
#[derive(Component, Debug, Clone)]
pub struct CharacterMovement {
    pub capsule_radius: f32,
    pub capsule_half_height: f32,
    pub orient_rotation_to_movement: bool,
    /// Yaw turn rate in degrees per second.
    pub rotation_rate: f32,
    pub jump_z_velocity: f32,
    pub air_control: f32,
    pub max_walk_speed: f32,
    pub min_analog_walk_speed: f32,
    pub max_acceleration: f32,
    pub braking_deceleration_walking: f32,
    pub braking_deceleration_falling: f32,
    pub gravity_scale: f32,
}

impl Default for CharacterMovement {
    fn default() -> Self {
        Self {
            capsule_radius: 0.42,
            capsule_half_height: 0.96,
            orient_rotation_to_movement: true,
            rotation_rate: 500.0,
            jump_z_velocity: 7.0,
            air_control: 0.35,
            max_walk_speed: 5.0,
            min_analog_walk_speed: 0.2,
            max_acceleration: 20.48,
            braking_deceleration_walking: 20.0,
            braking_deceleration_falling: 15.0,
            gravity_scale: 1.0,
        }
    }
}

/// Spring arm holding the follow camera behind the character.
#[derive(Component, Debug, Clone)]
pub struct CameraBoom {
    pub target_arm_length: f32,
    pub use_pawn_control_rotation: bool,
    /// Arm pivot relative to the character origin.
    pub pivot_offset: Vec3,
    /// Gap kept between the camera and whatever pulled the arm in.
    pub probe_size: f32,
}

impl Default for CameraBoom {
    fn default() -> Self {
        Self {
            target_arm_length: 4.0,
            use_pawn_control_rotation: true,
            pivot_offset: Vec3::new(0.0, 0.6, 0.0),
            probe_size: 0.12,
        }
    }
}

#[derive(Component, Debug, Clone, Copy)]
pub struct FollowCamera {
    pub character: Entity,
}

/// Builds the shaping request for whatever the camera looks at.
///
/// Returns the request and the traced segment. A miss still yields a request,
/// aimed at the segment end with no target.
pub fn shaping_request_from_camera_trace(
    camera: &Transform,
    settings: &ShapingSettings,
    trace: impl FnOnce(Vec3, Vec3) -> Option<TraceHit>,
) -> (MatterShapingRequest, Vec3, Vec3) {
    let start = camera.translation;
    let end = start + *camera.forward() * settings.trace_distance;
    let request = match trace(start, end) {
        Some(hit) => MatterShapingRequest { location: hit.impact_point, side: settings.side, target: Some(hit.entity) },
        None => MatterShapingRequest { location: end, side: settings.side, target: None },
    };
    (request, start, end)
}

pub fn check_character_setup(added: Query<(Entity, Has<MatterShaping>), Added<VoxelTestCharacter>>) {
    for (entity, has_shaping) in &added {
        if has_shaping {
            info!("character {entity} ready");
        } else {
            error!("character {entity} has no MatterShaping component; cube actions are disabled");
        }
    }
}

pub fn handle_character_actions(
    mut actions: EventReader<ActionEvent>,
    mut characters: Query<(Entity, &mut VoxelTestCharacter, Has<MatterShaping>)>,
    cameras: Query<(&FollowCamera, &Transform)>,
    trace: LineTrace,
    settings: Res<ShapingSettings>,
    mut batch: ResMut<ShapingBatch>,
    mut debug_lines: ResMut<DebugLines>,
) {
    for event in actions.read() {
        for (entity, mut character, can_shape) in &mut characters {
            match (event.action, event.trigger) {
                (InputAction::Move, TriggerEvent::Triggered) => character.add_move_input(event.value.axis2d()),
                (InputAction::Look, TriggerEvent::Triggered) => character.add_look_input(event.value.axis2d()),
                (InputAction::Jump, TriggerEvent::Started) => character.jump(),
                (InputAction::Jump, TriggerEvent::Completed) => character.stop_jumping(),
                (InputAction::DrawAdd | InputAction::DrawRemove, TriggerEvent::Started) if can_shape => {
                    let Some((_, camera)) = cameras.iter().find(|(c, _)| c.character == entity) else {
                        warn!("character {entity} has no follow camera");
                        continue;
                    };
                    let (request, start, end) = shaping_request_from_camera_trace(camera, &settings, |s, e| {
                        trace.single(s, e, TraceChannel::Pawn, Some(entity))
                    });
                    debug_lines.add(start, end, Color::srgb(1.0, 0.0, 0.0), settings.debug_line_seconds);
                    let op = if event.action == InputAction::DrawAdd { ShapingOp::Add } else { ShapingOp::Remove };
                    batch.queue(request, op);
                }
                _ => {}
            }
        }
    }
}

/// Advances one character by `dt`. `trace` casts a segment against the level,
/// ignoring the character itself. Returns the new position.
pub fn step_movement(
    character: &mut VoxelTestCharacter,
    movement: &CharacterMovement,
    position: Vec3,
    dt: f32,
    trace: impl Fn(Vec3, Vec3) -> Option<TraceHit>,
) -> Vec3 {
    let (forward, right) = character.yaw_axes();
    let mut wish = forward * character.move_input.y + right * character.move_input.x;
    character.move_input = Vec2::ZERO;
    let analog = wish.length().min(1.0);
    wish = wish.normalize_or_zero();

    let max_speed = if analog > 0.0 {
        (movement.max_walk_speed * analog).max(movement.min_analog_walk_speed)
    } else {
        0.0
    };

    let mut horizontal = Vec3::new(character.velocity.x, 0.0, character.velocity.z);
    let control = if character.grounded { 1.0 } else { movement.air_control };
    if analog > 0.0 {
        horizontal += wish * movement.max_acceleration * control * dt;
        horizontal = horizontal.clamp_length_max(max_speed);
    } else {
        let braking = if character.grounded {
            movement.braking_deceleration_walking
        } else {
            movement.braking_deceleration_falling * movement.air_control
        };
        let speed = horizontal.length();
        let new_speed = (speed - braking * dt).max(0.0);
        horizontal = horizontal.normalize_or_zero() * new_speed;
    }

    let mut vertical = character.velocity.y;
    if character.jump_pressed && character.grounded {
        vertical = movement.jump_z_velocity;
        character.grounded = false;
        character.jump_pressed = false;
    }
    if !character.grounded {
        vertical -= GRAVITY * movement.gravity_scale * dt;
    }

    // horizontal sweep at waist height, sliding along whatever blocks
    let mut step = horizontal * dt;
    if step != Vec3::ZERO {
        let reach = step + step.normalize() * movement.capsule_radius;
        if let Some(hit) = trace(position, position + reach) {
            let into = step.dot(hit.normal);
            if into < 0.0 {
                step -= hit.normal * into;
                horizontal -= hit.normal * horizontal.dot(hit.normal);
            }
        }
    }

    let mut next = position + step + Vec3::Y * vertical * dt;

    let feet = movement.capsule_half_height;
    let probe_start = Vec3::new(next.x, position.y.max(next.y), next.z);
    let probe_end = next - Vec3::Y * (feet + GROUND_SNAP);
    match trace(probe_start, probe_end) {
        Some(hit) if vertical <= 0.0 => {
            next.y = hit.impact_point.y + feet;
            vertical = 0.0;
            character.grounded = true;
        }
        _ => character.grounded = false,
    }

    if next.y < KILL_Z {
        next = character.spawn_point;
        horizontal = Vec3::ZERO;
        vertical = 0.0;
        character.grounded = false;
    }

    character.velocity = Vec3::new(horizontal.x, vertical, horizontal.z);
    next
}

/// Turns `current` yaw toward `target` by at most `max_step` radians.
fn approach_yaw(current: f32, target: f32, max_step: f32) -> f32 {
    let diff = (target - current + std::f32::consts::PI).rem_euclid(std::f32::consts::TAU) - std::f32::consts::PI;
    current + diff.clamp(-max_step, max_step)
}

pub fn move_characters(
    time: Res<Time>,
    mut characters: Query<(Entity, &mut Transform, &mut VoxelTestCharacter, &CharacterMovement)>,
    trace: LineTrace,
) {
    let dt = time.delta_secs();
    if dt <= 0.0 {
        return;
    }
    for (entity, mut transform, mut character, movement) in &mut characters {
        let next = step_movement(&mut character, movement, transform.translation, dt, |s, e| {
            trace.single(s, e, TraceChannel::Pawn, Some(entity))
        });
        transform.translation = next;

        let horizontal = Vec2::new(character.velocity.x, character.velocity.z);
        if movement.orient_rotation_to_movement && horizontal.length_squared() > 1e-4 {
            let (current, _, _) = transform.rotation.to_euler(EulerRot::YXZ);
            let target = (-horizontal.x).atan2(-horizontal.y);
            let yaw = approach_yaw(current, target, movement.rotation_rate.to_radians() * dt);
            transform.rotation = Quat::from_rotation_y(yaw);
        }
    }
}

pub fn update_follow_cameras(
    characters: Query<(Entity, &Transform, &VoxelTestCharacter, &CameraBoom), Without<FollowCamera>>,
    mut cameras: Query<(&FollowCamera, &mut Transform)>,
    trace: LineTrace,
) {
    for (follow, mut camera) in &mut cameras {
        let Ok((entity, body, character, boom)) = characters.get(follow.character) else { continue };
        let rotation = if boom.use_pawn_control_rotation { character.control_rotation() } else { body.rotation };
        let pivot = body.translation + boom.pivot_offset;
        let desired = pivot + rotation * Vec3::Z * boom.target_arm_length;
        camera.translation = match trace.single(pivot, desired, TraceChannel::Visibility, Some(entity)) {
            Some(hit) => hit.impact_point + hit.normal * boom.probe_size,
            None => desired,
        };
        camera.rotation = rotation;
    }
}
