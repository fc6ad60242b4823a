//! wgpu backend for the viewer.
//!
//! Implements the render core's `Device` with a flat-color pipeline: one
//! vertex attribute (position), one uniform block per draw (mvp + color),
//! depth testing, no lighting.
//!
//! # Invariants
//! - Buffers are only created through `upload_*` and freed through
//!   `delete_buffer`.
//! - A lost or outdated surface skips the frame; other surface errors are
//!   fatal.

mod gpu;
mod shaders;

pub use gpu::{InitError, WgpuDevice};
