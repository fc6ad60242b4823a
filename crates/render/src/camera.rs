use cubeview_input::{Direction, DirectionSet};
use glam::{Mat4, Vec3};

/// Distance the eye moves per held direction per key press.
const MOVE_STEP: f32 = 1.0;

/// Look-at camera whose eye slides along the world axes.
///
/// Only the eye moves; the target and up vector stay fixed, so the camera
/// keeps facing the same point while it travels. Movement is unbounded.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    pub eye: Vec3,
    pub look_at: Vec3,
    pub up: Vec3,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            eye: Vec3::new(0.0, 10.0, -5.0),
            look_at: Vec3::ZERO,
            up: Vec3::Y,
        }
    }
}

impl Camera {
    pub fn new(eye: Vec3, look_at: Vec3, up: Vec3) -> Self {
        Self { eye, look_at, up }
    }

    /// Move the eye one step along the axis of every held direction.
    pub fn handle_directional_input(&mut self, pressed: DirectionSet) {
        for direction in pressed.iter() {
            self.eye += axis(direction) * MOVE_STEP;
        }
        tracing::debug!(eye = ?self.eye, "camera moved");
    }

    pub fn view_transform(&self) -> Mat4 {
        Mat4::look_at_rh(self.eye, self.look_at, self.up)
    }
}

fn axis(direction: Direction) -> Vec3 {
    match direction {
        Direction::Forward => Vec3::Z,
        Direction::Backward => Vec3::NEG_Z,
        Direction::Left => Vec3::NEG_X,
        Direction::Right => Vec3::X,
    }
}
