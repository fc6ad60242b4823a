use cubeview_geometry::MeshError;

/// Errors from the rendering core and its devices.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("device rejected {what} buffer of {bytes} bytes: {reason}")]
    Allocation {
        what: &'static str,
        bytes: u64,
        reason: String,
    },
    #[error("invalid mesh: {0}")]
    Mesh(#[from] MeshError),
    #[error("transform stack underflow")]
    StackUnderflow,
    #[error("device failure: {0}")]
    Device(String),
}
