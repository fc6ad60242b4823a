use crate::camera::Camera;
use crate::projection::{Lens, Projection};

/// Constants that shape every frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameConfig {
    /// RGBA the color buffer is cleared to.
    pub clear_color: [f32; 4],
    /// Flat color the mesh is drawn with.
    pub mesh_color: [f32; 3],
    /// Degrees the mesh turns per frame.
    pub angle_step_degrees: f32,
    pub startup_projection: Projection,
    pub resize_lens: Lens,
    pub camera: Camera,
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            clear_color: [0.0, 0.0, 0.0, 0.0],
            mesh_color: [0.5, 0.5, 0.0],
            angle_step_degrees: 10.0,
            startup_projection: Projection::STARTUP,
            resize_lens: Lens::RESIZE,
            camera: Camera::default(),
        }
    }
}
