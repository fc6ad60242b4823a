use crate::error::RenderError;
use cubeview_geometry::{Topology, Vertex};
use glam::Mat4;

/// Handle to a buffer living on a device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BufferId(pub u32);

/// Pixel rectangle of the render target that draws land in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewportRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl ViewportRect {
    pub fn full(width: u32, height: u32) -> Self {
        Self {
            x: 0,
            y: 0,
            width,
            height,
        }
    }
}

/// Outcome of starting a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameStatus {
    /// Target acquired and cleared; draws will land.
    Ready,
    /// Target unavailable this frame; draws and present are skipped.
    Skipped,
}

/// Minimal graphics device: upload once, set transforms, draw indexed.
///
/// Transform and color state is sticky: it applies to every draw until set
/// again. Draws are only valid between [`Device::begin_frame`] returning
/// [`FrameStatus::Ready`] and [`Device::present`].
pub trait Device {
    fn upload_vertices(&mut self, vertices: &[Vertex]) -> Result<BufferId, RenderError>;

    fn upload_indices(
        &mut self,
        indices: &[u32],
        topology: Topology,
    ) -> Result<BufferId, RenderError>;

    fn delete_buffer(&mut self, buffer: BufferId);

    /// The window's drawable area changed size.
    fn resize_target(&mut self, _width: u32, _height: u32) {}

    fn set_viewport(&mut self, viewport: ViewportRect);

    fn set_projection(&mut self, projection: Mat4);

    fn set_model_view(&mut self, model_view: Mat4);

    fn set_color(&mut self, color: [f32; 3]);

    /// Start a frame, clearing color to `clear_color` and depth to far.
    fn begin_frame(&mut self, clear_color: [f32; 4]) -> Result<FrameStatus, RenderError>;

    fn draw_indexed(
        &mut self,
        vertices: BufferId,
        indices: BufferId,
        index_count: u32,
        topology: Topology,
    );

    /// Finish the frame and show it.
    fn present(&mut self) -> Result<(), RenderError>;
}
