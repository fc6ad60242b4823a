use crate::device::{BufferId, Device, FrameStatus, ViewportRect};
use crate::error::RenderError;
use cubeview_geometry::{Topology, Vertex};
use glam::Mat4;
use std::collections::BTreeSet;

/// One call made against a [`RecordingDevice`].
#[derive(Debug, Clone, PartialEq)]
pub enum DeviceCall {
    UploadVertices {
        buffer: BufferId,
        count: usize,
    },
    UploadIndices {
        buffer: BufferId,
        count: usize,
        topology: Topology,
    },
    DeleteBuffer(BufferId),
    ResizeTarget {
        width: u32,
        height: u32,
    },
    SetViewport(ViewportRect),
    SetProjection(Mat4),
    SetModelView(Mat4),
    SetColor([f32; 3]),
    BeginFrame {
        clear_color: [f32; 4],
    },
    DrawIndexed {
        vertices: BufferId,
        indices: BufferId,
        index_count: u32,
        topology: Topology,
    },
    Present,
}

/// In-memory device that records every call instead of drawing.
///
/// Useful for headless runs and for testing the frame loop. Draws issued
/// outside a frame or against buffers that are not live are counted as
/// stray.
#[derive(Debug, Default)]
pub struct RecordingDevice {
    calls: Vec<DeviceCall>,
    live: BTreeSet<BufferId>,
    next_buffer: u32,
    uploads: usize,
    fail_after: Option<usize>,
    skip_frames: usize,
    in_frame: bool,
    stray_draws: usize,
}

impl RecordingDevice {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject every upload once `uploads` have succeeded.
    pub fn failing_after(mut self, uploads: usize) -> Self {
        self.fail_after = Some(uploads);
        self
    }

    /// Report the next `frames` frames as skipped.
    pub fn skip_frames(&mut self, frames: usize) {
        self.skip_frames = frames;
    }

    pub fn calls(&self) -> &[DeviceCall] {
        &self.calls
    }

    pub fn take_calls(&mut self) -> Vec<DeviceCall> {
        std::mem::take(&mut self.calls)
    }

    pub fn live_buffers(&self) -> usize {
        self.live.len()
    }

    pub fn upload_count(&self) -> usize {
        self.uploads
    }

    pub fn delete_count(&self) -> usize {
        self.count(|c| matches!(c, DeviceCall::DeleteBuffer(_)))
    }

    pub fn draw_count(&self) -> usize {
        self.count(|c| matches!(c, DeviceCall::DrawIndexed { .. }))
    }

    pub fn present_count(&self) -> usize {
        self.count(|c| matches!(c, DeviceCall::Present))
    }

    pub fn stray_draws(&self) -> usize {
        self.stray_draws
    }

    /// Most recent viewport set, if any.
    pub fn last_viewport(&self) -> Option<ViewportRect> {
        self.calls.iter().rev().find_map(|c| match c {
            DeviceCall::SetViewport(v) => Some(*v),
            _ => None,
        })
    }

    /// Most recent projection set, if any.
    pub fn last_projection(&self) -> Option<Mat4> {
        self.calls.iter().rev().find_map(|c| match c {
            DeviceCall::SetProjection(m) => Some(*m),
            _ => None,
        })
    }

    /// Most recent model-view set, if any.
    pub fn last_model_view(&self) -> Option<Mat4> {
        self.calls.iter().rev().find_map(|c| match c {
            DeviceCall::SetModelView(m) => Some(*m),
            _ => None,
        })
    }

    fn count(&self, pred: impl Fn(&DeviceCall) -> bool) -> usize {
        self.calls.iter().filter(|c| pred(c)).count()
    }

    fn allocate(&mut self, what: &'static str, bytes: u64) -> Result<BufferId, RenderError> {
        if self.fail_after.is_some_and(|limit| self.uploads >= limit) {
            return Err(RenderError::Allocation {
                what,
                bytes,
                reason: "allocation refused".into(),
            });
        }
        let id = BufferId(self.next_buffer);
        self.next_buffer += 1;
        self.uploads += 1;
        self.live.insert(id);
        Ok(id)
    }
}

impl Device for RecordingDevice {
    fn upload_vertices(&mut self, vertices: &[Vertex]) -> Result<BufferId, RenderError> {
        let bytes = std::mem::size_of_val(vertices) as u64;
        let buffer = self.allocate("vertex", bytes)?;
        self.calls.push(DeviceCall::UploadVertices {
            buffer,
            count: vertices.len(),
        });
        Ok(buffer)
    }

    fn upload_indices(
        &mut self,
        indices: &[u32],
        topology: Topology,
    ) -> Result<BufferId, RenderError> {
        let bytes = std::mem::size_of_val(indices) as u64;
        let buffer = self.allocate("index", bytes)?;
        self.calls.push(DeviceCall::UploadIndices {
            buffer,
            count: indices.len(),
            topology,
        });
        Ok(buffer)
    }

    fn delete_buffer(&mut self, buffer: BufferId) {
        self.live.remove(&buffer);
        self.calls.push(DeviceCall::DeleteBuffer(buffer));
    }

    fn resize_target(&mut self, width: u32, height: u32) {
        self.calls.push(DeviceCall::ResizeTarget { width, height });
    }

    fn set_viewport(&mut self, viewport: ViewportRect) {
        self.calls.push(DeviceCall::SetViewport(viewport));
    }

    fn set_projection(&mut self, projection: Mat4) {
        self.calls.push(DeviceCall::SetProjection(projection));
    }

    fn set_model_view(&mut self, model_view: Mat4) {
        self.calls.push(DeviceCall::SetModelView(model_view));
    }

    fn set_color(&mut self, color: [f32; 3]) {
        self.calls.push(DeviceCall::SetColor(color));
    }

    fn begin_frame(&mut self, clear_color: [f32; 4]) -> Result<FrameStatus, RenderError> {
        self.calls.push(DeviceCall::BeginFrame { clear_color });
        if self.skip_frames > 0 {
            self.skip_frames -= 1;
            self.in_frame = false;
            return Ok(FrameStatus::Skipped);
        }
        self.in_frame = true;
        Ok(FrameStatus::Ready)
    }

    fn draw_indexed(
        &mut self,
        vertices: BufferId,
        indices: BufferId,
        index_count: u32,
        topology: Topology,
    ) {
        if !self.in_frame || !self.live.contains(&vertices) || !self.live.contains(&indices) {
            self.stray_draws += 1;
        }
        self.calls.push(DeviceCall::DrawIndexed {
            vertices,
            indices,
            index_count,
            topology,
        });
    }

    fn present(&mut self) -> Result<(), RenderError> {
        self.in_frame = false;
        self.calls.push(DeviceCall::Present);
        Ok(())
    }
}
