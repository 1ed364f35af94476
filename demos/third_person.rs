use bevy::prelude::*;
use bevy::window::{CursorGrabMode, PrimaryWindow};
use bevy_matter_shaping::{DebugOverlayPlugin, GameModePlugin, MatterShapingPlugin};

fn main() {
    App::new()
        .add_plugins((
            DefaultPlugins.set(WindowPlugin {
                primary_window: Some(Window {
                    title: "Voxel Test - Third Person".into(),
                    ..default()
                }),
                ..default()
            }),
            MatterShapingPlugin,
            GameModePlugin,
            DebugOverlayPlugin,
        ))
        .add_systems(Startup, grab_cursor)
        .add_systems(Update, toggle_cursor)
        .run();
}

fn set_grab(window: &mut Window, grab: bool) {
    window.cursor_options.grab_mode = if grab { CursorGrabMode::Locked } else { CursorGrabMode::None };
    window.cursor_options.visible = !grab;
}

fn grab_cursor(mut windows: Query<&mut Window, With<PrimaryWindow>>) {
    if let Ok(mut window) = windows.single_mut() {
        set_grab(&mut window, true);
    }
}

// Escape releases the mouse, clicking into the window takes it back.
fn toggle_cursor(
    mut windows: Query<&mut Window, With<PrimaryWindow>>,
    keys: Res<ButtonInput<KeyCode>>,
    mouse: Res<ButtonInput<MouseButton>>,
) {
    let Ok(mut window) = windows.single_mut() else { return };
    if keys.just_pressed(KeyCode::Escape) {
        set_grab(&mut window, false);
    } else if mouse.just_pressed(MouseButton::Left) && window.cursor_options.grab_mode == CursorGrabMode::None {
        set_grab(&mut window, true);
    }
}
