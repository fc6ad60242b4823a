use bytemuck::{Pod, Zeroable};

/// Object-space vertex position.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
}

impl Vertex {
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self {
            position: [x, y, z],
        }
    }
}

/// How consecutive indices group into faces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Topology {
    /// Four indices per face.
    Quads,
    /// Three indices per face.
    Triangles,
}

impl Topology {
    pub fn indices_per_face(self) -> usize {
        match self {
            Topology::Quads => 4,
            Topology::Triangles => 3,
        }
    }

    /// Number of indices once every face is split into triangles.
    pub fn triangulated_len(self, index_count: u32) -> u32 {
        match self {
            Topology::Quads => index_count / 4 * 6,
            Topology::Triangles => index_count,
        }
    }

    /// Rewrite an index list as a triangle list.
    ///
    /// Quad `(a, b, c, d)` becomes `(a, b, c), (c, d, a)`. A trailing partial
    /// face is dropped.
    pub fn triangulate(self, indices: &[u32]) -> Vec<u32> {
        match self {
            Topology::Triangles => indices.to_vec(),
            Topology::Quads => indices
                .chunks_exact(4)
                .flat_map(|q| [q[0], q[1], q[2], q[2], q[3], q[0]])
                .collect(),
        }
    }
}

/// Errors from mesh validation.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum MeshError {
    #[error("mesh has no vertices")]
    NoVertices,
    #[error("{count} indices do not form whole {topology:?} faces")]
    PartialFace { count: usize, topology: Topology },
    #[error("index {index} out of range for {vertex_count} vertices")]
    IndexOutOfRange { index: u32, vertex_count: usize },
}

/// Vertices plus the indices that group them into faces.
#[derive(Debug, Clone, PartialEq)]
pub struct Mesh {
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
    pub topology: Topology,
}

impl Mesh {
    pub fn new(vertices: Vec<Vertex>, indices: Vec<u32>, topology: Topology) -> Self {
        Self {
            vertices,
            indices,
            topology,
        }
    }

    pub fn face_count(&self) -> usize {
        self.indices.len() / self.topology.indices_per_face()
    }

    pub fn index_count(&self) -> u32 {
        self.indices.len() as u32
    }

    /// Check that the indices describe whole faces over existing vertices.
    pub fn validate(&self) -> Result<(), MeshError> {
        if self.vertices.is_empty() {
            return Err(MeshError::NoVertices);
        }
        if self.indices.len() % self.topology.indices_per_face() != 0 {
            return Err(MeshError::PartialFace {
                count: self.indices.len(),
                topology: self.topology,
            });
        }
        let vertex_count = self.vertices.len();
        if let Some(&index) = self
            .indices
            .iter()
            .find(|&&i| i as usize >= vertex_count)
        {
            return Err(MeshError::IndexOutOfRange {
                index,
                vertex_count,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn triangle() -> Mesh {
        Mesh::new(
            vec![
                Vertex::new(0.0, 0.0, 0.0),
                Vertex::new(1.0, 0.0, 0.0),
                Vertex::new(0.0, 1.0, 0.0),
            ],
            vec![0, 1, 2],
            Topology::Triangles,
        )
    }

    #[test]
    fn quads_split_into_two_triangles() {
        let tris = Topology::Quads.triangulate(&[0, 1, 2, 3, 4, 5, 6, 7]);
        assert_eq!(tris, vec![0, 1, 2, 2, 3, 0, 4, 5, 6, 6, 7, 4]);
        assert_eq!(Topology::Quads.triangulated_len(8), 12);
    }

    #[test]
    fn triangles_pass_through() {
        assert_eq!(Topology::Triangles.triangulate(&[2, 1, 0]), vec![2, 1, 0]);
        assert_eq!(Topology::Triangles.triangulated_len(9), 9);
    }

    #[test]
    fn valid_mesh() {
        let mesh = triangle();
        assert_eq!(mesh.face_count(), 1);
        assert!(mesh.validate().is_ok());
    }

    #[test]
    fn partial_face_rejected() {
        let mut mesh = triangle();
        mesh.indices.push(0);
        assert!(matches!(
            mesh.validate(),
            Err(MeshError::PartialFace { count: 4, .. })
        ));
    }

    #[test]
    fn out_of_range_index_rejected() {
        let mut mesh = triangle();
        mesh.indices[2] = 7;
        assert_eq!(
            mesh.validate(),
            Err(MeshError::IndexOutOfRange {
                index: 7,
                vertex_count: 3
            })
        );
    }

    #[test]
    fn empty_mesh_rejected() {
        let mesh = Mesh::new(Vec::new(), Vec::new(), Topology::Quads);
        assert_eq!(mesh.validate(), Err(MeshError::NoVertices));
    }

    #[test]
    fn vertex_is_three_packed_floats() {
        assert_eq!(std::mem::size_of::<Vertex>(), 12);
        let vertex = Vertex::new(1.0, 2.0, 3.0);
        let bytes: &[u8] = bytemuck::bytes_of(&vertex);
        assert_eq!(bytes.len(), 12);
        assert_eq!(bytemuck::cast_slice::<u8, f32>(bytes), &[1.0, 2.0, 3.0]);
    }
}
