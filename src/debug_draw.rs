use bevy::prelude::*;

#[derive(Clone, Copy, Debug)]
pub struct DebugLine {
    pub start: Vec3,
    pub end: Vec3,
    pub color: Color,
    pub remaining: f32,
}

/// Lines that stay on screen for a while; gizmos alone only last one frame.
#[derive(Resource, Default)]
pub struct DebugLines {
    pub lines: Vec<DebugLine>,
}

impl DebugLines {
    pub fn add(&mut self, start: Vec3, end: Vec3, color: Color, seconds: f32) {
        self.lines.push(DebugLine { start, end, color, remaining: seconds });
    }

    /// Drops lines whose lifetime ran out.
    pub fn tick(&mut self, dt: f32) {
        for line in &mut self.lines {
            line.remaining -= dt;
        }
        self.lines.retain(|l| l.remaining > 0.0);
    }
}

pub fn draw_debug_lines(mut lines: ResMut<DebugLines>, mut gizmos: Gizmos, time: Res<Time>) {
    for line in &lines.lines {
        gizmos.line(line.start, line.end, line.color);
    }
    lines.tick(time.delta_secs());
}
