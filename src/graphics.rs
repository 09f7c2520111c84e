use macroquad::prelude::*;
use nalgebra::Point3;
use segway_physics::Part;
use segway_physics::worlds::rapier::{
    BASE_HALF_EXTENTS, HANDLE_HALF_EXTENTS, WHEEL_HALF_WIDTH, WHEEL_RADIUS,
};
use segway_sim::transform::Transform;
use segway_sim::{FrameReport, NodeTable, SceneRenderer};

// Function to configure the macroquad window
pub fn window_conf() -> Conf {
    Conf {
        window_title: "Segway Simulation".to_string(),
        window_width: 800,
        window_height: 600,
        high_dpi: true,
        ..Default::default()
    }
}

// Camera sits at this offset from the base and looks at it.
const CAMERA_OFFSET: Vec3 = Vec3::new(2.0, 4.0, 2.0);
const WHEEL_SEGMENTS: usize = 24;

/// Draws every part as a wireframe at its latest transform.
#[derive(Debug, Default)]
pub struct WindowRenderer {
    nodes: NodeTable,
}

impl SceneRenderer for WindowRenderer {
    fn write_transform(&mut self, part: Part, transform: &Transform) {
        self.nodes.write_transform(part, transform);
    }
}

impl WindowRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Draw one frame. Parts that never received a transform are skipped.
    pub fn render(&self, report: &FrameReport) {
        clear_background(LIGHTGRAY);

        let focus = self
            .nodes
            .transform(Part::Base)
            .map(|t| to_vec3(&Point3::from(t.translation())))
            .unwrap_or(Vec3::ZERO);
        set_camera(&Camera3D {
            position: focus + CAMERA_OFFSET,
            target: focus,
            up: Vec3::Y,
            ..Default::default()
        });

        draw_grid(100, 1.0, DARKGRAY, GRAY);
        for (part, transform) in self.nodes.iter() {
            match part {
                Part::Base => draw_box(transform, BASE_HALF_EXTENTS, DARKBLUE),
                Part::Handle => draw_box(transform, HANDLE_HALF_EXTENTS, BLUE),
                Part::LeftWheel | Part::RightWheel => draw_wheel(transform, BLACK),
            }
        }

        set_default_camera();
        draw_text(&format!("Frame {}", report.frame), 10.0, 20.0, 20.0, BLACK);
        draw_text(&report.control.to_string(), 10.0, 40.0, 20.0, BLACK);
        draw_text(&report.command.to_string(), 10.0, 60.0, 20.0, BLACK);
    }
}

fn to_vec3(p: &Point3<f64>) -> Vec3 {
    vec3(p.x as f32, p.y as f32, p.z as f32)
}

fn draw_box(transform: &Transform, half_extents: [f64; 3], color: Color) {
    let [hx, hy, hz] = half_extents;
    let corners: Vec<Vec3> = (0..8)
        .map(|i| {
            let sign = |bit: usize| if i & bit == 0 { -1.0 } else { 1.0 };
            let local = Point3::new(sign(1) * hx, sign(2) * hy, sign(4) * hz);
            to_vec3(&transform.transform_point(&local))
        })
        .collect();

    // Corners differing in exactly one bit share an edge.
    for a in 0..8 {
        for bit in [1, 2, 4] {
            let b = a | bit;
            if b != a {
                draw_line_3d(corners[a], corners[b], color);
            }
        }
    }
}

fn draw_wheel(transform: &Transform, color: Color) {
    for x in [-WHEEL_HALF_WIDTH, WHEEL_HALF_WIDTH] {
        let rim: Vec<Vec3> = (0..=WHEEL_SEGMENTS)
            .map(|i| {
                let angle = i as f64 / WHEEL_SEGMENTS as f64 * core::f64::consts::TAU;
                let local = Point3::new(x, WHEEL_RADIUS * angle.cos(), WHEEL_RADIUS * angle.sin());
                to_vec3(&transform.transform_point(&local))
            })
            .collect();
        for pair in rim.windows(2) {
            draw_line_3d(pair[0], pair[1], color);
        }
        // One spoke so the wheel's spin is visible.
        draw_line_3d(to_vec3(&transform.transform_point(&Point3::new(x, 0.0, 0.0))), rim[0], color);
    }
}
