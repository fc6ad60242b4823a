use crate::device::{BufferId, Device};
use crate::error::RenderError;
use cubeview_geometry::{Mesh, Topology};

#[derive(Debug, Clone, Copy)]
struct Buffers {
    vertices: BufferId,
    indices: BufferId,
}

/// A static mesh resident on a device.
///
/// Uploaded once by [`GeometryStore::initialize`]; every [`GeometryStore::draw`]
/// reuses the same buffers. After [`GeometryStore::release`] the store is
/// inert.
#[derive(Debug)]
pub struct GeometryStore {
    buffers: Option<Buffers>,
    index_count: u32,
    topology: Topology,
}

impl GeometryStore {
    pub fn initialize<D: Device + ?Sized>(
        device: &mut D,
        mesh: &Mesh,
    ) -> Result<Self, RenderError> {
        mesh.validate()?;

        let vertices = device.upload_vertices(&mesh.vertices)?;
        let indices = match device.upload_indices(&mesh.indices, mesh.topology) {
            Ok(id) => id,
            Err(e) => {
                device.delete_buffer(vertices);
                return Err(e);
            }
        };

        tracing::debug!(
            vertices = mesh.vertices.len(),
            indices = mesh.indices.len(),
            topology = ?mesh.topology,
            "geometry uploaded"
        );

        Ok(Self {
            buffers: Some(Buffers { vertices, indices }),
            index_count: mesh.index_count(),
            topology: mesh.topology,
        })
    }

    /// Issue one indexed draw covering the whole mesh.
    pub fn draw<D: Device + ?Sized>(&self, device: &mut D) {
        let Some(buffers) = self.buffers else {
            tracing::warn!("draw after geometry release ignored");
            return;
        };
        device.draw_indexed(
            buffers.vertices,
            buffers.indices,
            self.index_count,
            self.topology,
        );
    }

    /// Free the device buffers. Returns `false` if they were already freed.
    pub fn release<D: Device + ?Sized>(&mut self, device: &mut D) -> bool {
        match self.buffers.take() {
            Some(buffers) => {
                device.delete_buffer(buffers.vertices);
                device.delete_buffer(buffers.indices);
                tracing::debug!("geometry released");
                true
            }
            None => false,
        }
    }

    pub fn is_released(&self) -> bool {
        self.buffers.is_none()
    }

    pub fn index_count(&self) -> u32 {
        self.index_count
    }

    pub fn topology(&self) -> Topology {
        self.topology
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recording::{DeviceCall, RecordingDevice};
    use cubeview_geometry::unit_cube;

    #[test]
    fn uploads_once() {
        let mut device = RecordingDevice::new();
        let store = GeometryStore::initialize(&mut device, &unit_cube()).unwrap();
        assert_eq!(device.upload_count(), 2);
        assert_eq!(device.live_buffers(), 2);
        assert_eq!(store.index_count(), 24);
        assert_eq!(store.topology(), Topology::Quads);
    }

    #[test]
    fn each_draw_is_one_call_over_all_indices() {
        let mut device = RecordingDevice::new();
        let store = GeometryStore::initialize(&mut device, &unit_cube()).unwrap();
        for _ in 0..3 {
            device.begin_frame([0.0; 4]).unwrap();
            store.draw(&mut device);
            device.present().unwrap();
        }
        let draws: Vec<_> = device
            .calls()
            .iter()
            .filter(|c| matches!(c, DeviceCall::DrawIndexed { .. }))
            .collect();
        assert_eq!(draws.len(), 3);
        for draw in draws {
            assert!(matches!(
                draw,
                DeviceCall::DrawIndexed {
                    index_count: 24,
                    topology: Topology::Quads,
                    ..
                }
            ));
        }
        assert_eq!(device.upload_count(), 2);
    }

    #[test]
    fn release_is_idempotent() {
        let mut device = RecordingDevice::new();
        let mut store = GeometryStore::initialize(&mut device, &unit_cube()).unwrap();
        assert!(store.release(&mut device));
        assert!(!store.release(&mut device));
        assert!(store.is_released());
        assert_eq!(device.delete_count(), 2);
        assert_eq!(device.live_buffers(), 0);
    }

    #[test]
    fn draw_after_release_issues_nothing() {
        let mut device = RecordingDevice::new();
        let mut store = GeometryStore::initialize(&mut device, &unit_cube()).unwrap();
        store.release(&mut device);
        device.begin_frame([0.0; 4]).unwrap();
        store.draw(&mut device);
        assert_eq!(device.draw_count(), 0);
    }

    #[test]
    fn allocation_failure_is_reported() {
        let mut device = RecordingDevice::new().failing_after(0);
        let err = GeometryStore::initialize(&mut device, &unit_cube()).unwrap_err();
        assert!(matches!(err, RenderError::Allocation { what: "vertex", .. }));
        assert_eq!(device.live_buffers(), 0);
    }

    #[test]
    fn index_failure_frees_vertex_buffer() {
        let mut device = RecordingDevice::new().failing_after(1);
        let err = GeometryStore::initialize(&mut device, &unit_cube()).unwrap_err();
        assert!(matches!(err, RenderError::Allocation { what: "index", .. }));
        assert_eq!(device.live_buffers(), 0);
        assert_eq!(device.delete_count(), 1);
    }

    #[test]
    fn invalid_mesh_is_rejected_before_upload() {
        let mut mesh = unit_cube();
        mesh.indices.pop();
        let mut device = RecordingDevice::new();
        let err = GeometryStore::initialize(&mut device, &mesh).unwrap_err();
        assert!(matches!(err, RenderError::Mesh(_)));
        assert_eq!(device.upload_count(), 0);
    }
}
