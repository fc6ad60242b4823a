//! Static geometry for the viewer: vertex/index meshes, the built-in cube,
//! and OBJ import with normalization.
//!
//! Meshes are plain CPU-side data. Uploading them to a device is the render
//! crate's job; nothing here talks to a GPU.

mod cube;
mod import;
mod mesh;

pub use cube::unit_cube;
pub use import::{ImportError, Scene, SceneMesh, import};
pub use mesh::{Mesh, MeshError, Topology, Vertex};
