use crate::mesh::{Mesh, Topology, Vertex};

/// The built-in cube: unit cube over `[0, 1]^3`, one quad per face, four
/// unshared vertices per face.
pub fn unit_cube() -> Mesh {
    #[rustfmt::skip]
    let vertices = vec![
        // z = 0
        Vertex::new(0.0, 0.0, 0.0),
        Vertex::new(1.0, 0.0, 0.0),
        Vertex::new(1.0, 1.0, 0.0),
        Vertex::new(0.0, 1.0, 0.0),
        // z = 1
        Vertex::new(0.0, 0.0, 1.0),
        Vertex::new(1.0, 0.0, 1.0),
        Vertex::new(1.0, 1.0, 1.0),
        Vertex::new(0.0, 1.0, 1.0),
        // x = 0
        Vertex::new(0.0, 0.0, 0.0),
        Vertex::new(0.0, 0.0, 1.0),
        Vertex::new(0.0, 1.0, 1.0),
        Vertex::new(0.0, 1.0, 0.0),
        // x = 1
        Vertex::new(1.0, 0.0, 0.0),
        Vertex::new(1.0, 0.0, 1.0),
        Vertex::new(1.0, 1.0, 1.0),
        Vertex::new(1.0, 1.0, 0.0),
        // y = 0
        Vertex::new(0.0, 0.0, 0.0),
        Vertex::new(0.0, 0.0, 1.0),
        Vertex::new(1.0, 0.0, 1.0),
        Vertex::new(1.0, 0.0, 0.0),
        // y = 1
        Vertex::new(0.0, 1.0, 0.0),
        Vertex::new(0.0, 1.0, 1.0),
        Vertex::new(1.0, 1.0, 1.0),
        Vertex::new(1.0, 1.0, 0.0),
    ];
    let indices = (0..24).collect();
    Mesh::new(vertices, indices, Topology::Quads)
}
