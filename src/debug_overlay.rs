use bevy::prelude::*;
use crate::metrics::Metrics;

#[derive(Component)]
struct DebugOverlayRoot;

#[derive(Resource)]
struct FpsReportTimer {
    timer: Timer,
}

impl Default for FpsReportTimer {
    fn default() -> Self {
        Self {
            timer: Timer::from_seconds(10.0, TimerMode::Repeating),
        }
    }
}

pub struct DebugOverlayPlugin;
impl Plugin for DebugOverlayPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<FpsReportTimer>()
            .add_systems(Startup, setup_ui)
            .add_systems(Update, (update_ui, periodic_fps_report));
    }
}

fn setup_ui(mut commands: Commands) {
    commands.spawn((
        Text::new("Loading..."),
        TextFont {
            font_size: 12.0,
            ..default()
        },
        TextColor(Color::srgb(1.0, 1.0, 1.0)),
        Node {
            position_type: PositionType::Absolute,
            top: Val::Px(10.0),
            left: Val::Px(10.0),
            ..default()
        },
        DebugOverlayRoot,
    ));
}

fn update_ui(mut q: Query<&mut Text, With<DebugOverlayRoot>>, metrics: Res<Metrics>, time: Res<Time>) {
    if let Ok(mut text) = q.single_mut() {
        **text = format!(
            "Controls:\n\
            • WASD / arrows: Move\n\
            • Mouse: Look\n\
            • Space: Jump\n\
            • Left click: Add cube\n\
            • Right click: Remove cube\n\
            \n\
            Stats:\n\
            • FPS: {:.1}\n\
            • Voxels: {}\n\
            • Voxels modified: {}\n\
            • Ignored requests: {}\n\
            • Time: {:.2}s",
            metrics.fps,
            metrics.voxel_count,
            metrics.voxels_modified,
            metrics.shaping_ignored,
            time.elapsed_secs()
        );
    }
}

fn periodic_fps_report(
    mut fps_timer: ResMut<FpsReportTimer>,
    metrics: Res<Metrics>,
    time: Res<Time>,
) {
    fps_timer.timer.tick(time.delta());

    if fps_timer.timer.just_finished() {
        info!("FPS Report: {:.1} fps | {} voxels | {} modified | {} remeshes",
              metrics.fps, metrics.voxel_count, metrics.voxels_modified, metrics.remeshes);
    }
}
