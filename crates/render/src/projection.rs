use crate::device::ViewportRect;
use glam::Mat4;

/// Perspective projection parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Projection {
    pub fov_y_degrees: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
}

impl Projection {
    /// Projection in effect before the first resize.
    pub const STARTUP: Projection = Projection {
        fov_y_degrees: 90.0,
        aspect: 1.0,
        near: 1.0,
        far: 500.0,
    };

    /// Right-handed projection with a zero-to-one depth range.
    pub fn matrix(&self) -> Mat4 {
        Mat4::perspective_rh(
            self.fov_y_degrees.to_radians(),
            self.aspect,
            self.near,
            self.far,
        )
    }
}

/// Projection parameters that do not depend on the window shape.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Lens {
    pub fov_y_degrees: f32,
    pub near: f32,
    pub far: f32,
}

impl Lens {
    /// Lens applied whenever the window is resized.
    pub const RESIZE: Lens = Lens {
        fov_y_degrees: 45.0,
        near: 0.1,
        far: 10_000.0,
    };

    /// Projection for a `width` x `height` target. A zero height (minimized
    /// window) is treated as one pixel so the aspect stays finite.
    pub fn projection(&self, width: u32, height: u32) -> Projection {
        Projection {
            fov_y_degrees: self.fov_y_degrees,
            aspect: width as f32 / height.max(1) as f32,
            near: self.near,
            far: self.far,
        }
    }
}

/// Current window size and the projection derived for it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
    pub projection: Projection,
}

impl Viewport {
    pub fn new(width: u32, height: u32, projection: Projection) -> Self {
        Self {
            width,
            height,
            projection,
        }
    }

    pub fn rect(&self) -> ViewportRect {
        ViewportRect::full(self.width, self.height)
    }
}
