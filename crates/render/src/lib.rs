//! Rendering core: renderer-agnostic interface and the per-frame loop.
//!
//! # Invariants
//! - Geometry is uploaded once and released once, on the device's lifetime.
//! - Input dispatch for a frame happens before its draw, and the draw before
//!   presentation.
//! - Animation advances by frame count, never by wall-clock time.
//!
//! The [`Device`] trait is the only seam to a graphics API. [`RecordingDevice`]
//! implements it in memory so the loop can run without a GPU.

mod animation;
mod camera;
mod config;
mod device;
mod error;
mod frame_loop;
mod geometry_store;
mod projection;
mod recording;
mod transform;

pub use animation::AnimationAngle;
pub use camera::Camera;
pub use config::FrameConfig;
pub use device::{BufferId, Device, FrameStatus, ViewportRect};
pub use error::RenderError;
pub use frame_loop::{FrameLoop, LoopState};
pub use geometry_store::GeometryStore;
pub use projection::{Lens, Projection, Viewport};
pub use recording::{DeviceCall, RecordingDevice};
pub use transform::TransformStack;
