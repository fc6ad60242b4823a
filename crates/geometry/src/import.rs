//! Wavefront OBJ import.
//!
//! Loading is delegated to `tobj`, which triangulates faces and unifies the
//! per-attribute index streams into one. Each model is then normalized:
//! degenerate faces are dropped, identical vertices are joined, and missing
//! normals and tangents are generated.

use crate::mesh::{Mesh, MeshError, Topology, Vertex};
use glam::{Vec2, Vec3};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Errors from mesh import.
#[derive(Debug, thiserror::Error)]
pub enum ImportError {
    #[error("failed to load {}: {source}", .path.display())]
    Load {
        path: PathBuf,
        #[source]
        source: tobj::LoadError,
    },
    #[error("{} contains no triangle geometry", .path.display())]
    Empty { path: PathBuf },
    #[error("model '{name}' is malformed: {source}")]
    Invalid {
        name: String,
        #[source]
        source: MeshError,
    },
}

/// One normalized triangle mesh from an imported file.
#[derive(Debug, Clone)]
pub struct SceneMesh {
    pub name: String,
    pub mesh: Mesh,
    /// Unit normal per vertex.
    pub normals: Vec<Vec3>,
    /// Unit tangent per vertex, orthogonal to the normal.
    pub tangents: Vec<Vec3>,
    /// Texture coordinate per vertex; empty when the file has none.
    pub texcoords: Vec<Vec2>,
}

/// Every mesh found in an imported file, in file order.
#[derive(Debug, Clone, Default)]
pub struct Scene {
    pub meshes: Vec<SceneMesh>,
}

impl Scene {
    pub fn vertex_count(&self) -> usize {
        self.meshes.iter().map(|m| m.mesh.vertices.len()).sum()
    }

    /// All meshes concatenated into one triangle mesh.
    pub fn merged(&self) -> Mesh {
        let mut vertices = Vec::with_capacity(self.vertex_count());
        let mut indices = Vec::new();
        for scene_mesh in &self.meshes {
            let base = vertices.len() as u32;
            vertices.extend_from_slice(&scene_mesh.mesh.vertices);
            indices.extend(scene_mesh.mesh.indices.iter().map(|i| i + base));
        }
        Mesh::new(vertices, indices, Topology::Triangles)
    }
}

/// Import an OBJ file as a normalized triangle scene.
///
/// Failures are logged and returned; no partially built scene escapes.
pub fn import(path: impl AsRef<Path>) -> Result<Scene, ImportError> {
    let path = path.as_ref();
    let result = load_scene(path);
    match &result {
        Ok(scene) => tracing::info!(
            path = %path.display(),
            meshes = scene.meshes.len(),
            vertices = scene.vertex_count(),
            "mesh imported"
        ),
        Err(e) => tracing::error!("error during mesh loading: {e}"),
    }
    result
}

fn load_scene(path: &Path) -> Result<Scene, ImportError> {
    let options = tobj::LoadOptions {
        single_index: true,
        triangulate: true,
        ignore_points: true,
        ignore_lines: true,
        ..Default::default()
    };
    // Materials are not rendered, so a missing .mtl is not an error here.
    let (models, _materials) =
        tobj::load_obj(path, &options).map_err(|source| ImportError::Load {
            path: path.to_path_buf(),
            source,
        })?;

    let mut meshes = Vec::new();
    for model in models {
        if let Some(mesh) = normalize(model)? {
            meshes.push(mesh);
        }
    }

    if meshes.is_empty() {
        return Err(ImportError::Empty {
            path: path.to_path_buf(),
        });
    }
    Ok(Scene { meshes })
}

fn normalize(model: tobj::Model) -> Result<Option<SceneMesh>, ImportError> {
    let name = model.name;
    let raw = model.mesh;

    let positions: Vec<Vec3> = raw
        .positions
        .chunks_exact(3)
        .map(|p| Vec3::new(p[0], p[1], p[2]))
        .collect();
    let normals: Option<Vec<Vec3>> = (raw.normals.len() == raw.positions.len()).then(|| {
        raw.normals
            .chunks_exact(3)
            .map(|n| Vec3::new(n[0], n[1], n[2]))
            .collect()
    });
    let texcoords: Option<Vec<Vec2>> =
        (!positions.is_empty() && raw.texcoords.len() == positions.len() * 2).then(|| {
            raw.texcoords
                .chunks_exact(2)
                .map(|t| Vec2::new(t[0], t[1]))
                .collect()
        });

    // Faces that collapsed to a point or a line are not triangles.
    let mut indices = Vec::with_capacity(raw.indices.len());
    let mut dropped = 0usize;
    for tri in raw.indices.chunks_exact(3) {
        if tri[0] == tri[1] || tri[1] == tri[2] || tri[0] == tri[2] {
            dropped += 1;
        } else {
            indices.extend_from_slice(tri);
        }
    }
    if dropped > 0 {
        tracing::debug!(model = %name, dropped, "dropped degenerate faces");
    }
    if indices.is_empty() {
        tracing::debug!(model = %name, "model has no triangles, skipping");
        return Ok(None);
    }

    let check = Mesh::new(
        positions.iter().map(|p| Vertex::new(p.x, p.y, p.z)).collect(),
        indices.clone(),
        Topology::Triangles,
    );
    check.validate().map_err(|source| ImportError::Invalid {
        name: name.clone(),
        source,
    })?;

    let joined = join_identical(&positions, normals.as_deref(), texcoords.as_deref(), &indices);
    let normals = joined
        .normals
        .unwrap_or_else(|| generate_normals(&joined.positions, &joined.indices));
    let tangents = generate_tangents(
        &joined.positions,
        &normals,
        joined.texcoords.as_deref(),
        &joined.indices,
    );

    let vertices = joined
        .positions
        .iter()
        .map(|p| Vertex::new(p.x, p.y, p.z))
        .collect();
    Ok(Some(SceneMesh {
        name,
        mesh: Mesh::new(vertices, joined.indices, Topology::Triangles),
        normals,
        tangents,
        texcoords: joined.texcoords.unwrap_or_default(),
    }))
}

struct Joined {
    positions: Vec<Vec3>,
    normals: Option<Vec<Vec3>>,
    texcoords: Option<Vec<Vec2>>,
    indices: Vec<u32>,
}

/// Merge vertices whose attributes are bit-identical and drop the ones no
/// face references.
fn join_identical(
    positions: &[Vec3],
    normals: Option<&[Vec3]>,
    texcoords: Option<&[Vec2]>,
    indices: &[u32],
) -> Joined {
    let mut remap: HashMap<[u32; 8], u32> = HashMap::new();
    let mut out = Joined {
        positions: Vec::new(),
        normals: normals.map(|_| Vec::new()),
        texcoords: texcoords.map(|_| Vec::new()),
        indices: Vec::with_capacity(indices.len()),
    };

    for &index in indices {
        let i = index as usize;
        let p = positions[i];
        let n = normals.map_or(Vec3::ZERO, |n| n[i]);
        let t = texcoords.map_or(Vec2::ZERO, |t| t[i]);
        let key = [
            p.x.to_bits(),
            p.y.to_bits(),
            p.z.to_bits(),
            n.x.to_bits(),
            n.y.to_bits(),
            n.z.to_bits(),
            t.x.to_bits(),
            t.y.to_bits(),
        ];
        let next = out.positions.len() as u32;
        let joined = *remap.entry(key).or_insert_with(|| {
            out.positions.push(p);
            if let Some(normals) = out.normals.as_mut() {
                normals.push(n);
            }
            if let Some(texcoords) = out.texcoords.as_mut() {
                texcoords.push(t);
            }
            next
        });
        out.indices.push(joined);
    }
    out
}

/// Area-weighted vertex normals.
fn generate_normals(positions: &[Vec3], indices: &[u32]) -> Vec<Vec3> {
    let mut normals = vec![Vec3::ZERO; positions.len()];
    for tri in indices.chunks_exact(3) {
        let [a, b, c] = [tri[0] as usize, tri[1] as usize, tri[2] as usize];
        let face = (positions[b] - positions[a]).cross(positions[c] - positions[a]);
        normals[a] += face;
        normals[b] += face;
        normals[c] += face;
    }
    normals.into_iter().map(|n| n.normalize_or(Vec3::Y)).collect()
}

/// Per-vertex tangents from texture-space derivatives, falling back to any
/// vector orthogonal to the normal where the mapping is missing or
/// degenerate.
fn generate_tangents(
    positions: &[Vec3],
    normals: &[Vec3],
    texcoords: Option<&[Vec2]>,
    indices: &[u32],
) -> Vec<Vec3> {
    let mut accum = vec![Vec3::ZERO; positions.len()];
    if let Some(uv) = texcoords {
        for tri in indices.chunks_exact(3) {
            let [a, b, c] = [tri[0] as usize, tri[1] as usize, tri[2] as usize];
            let e1 = positions[b] - positions[a];
            let e2 = positions[c] - positions[a];
            let d1 = uv[b] - uv[a];
            let d2 = uv[c] - uv[a];
            let det = d1.x * d2.y - d2.x * d1.y;
            if det.abs() <= f32::EPSILON {
                continue;
            }
            let tangent = (e1 * d2.y - e2 * d1.y) / det;
            accum[a] += tangent;
            accum[b] += tangent;
            accum[c] += tangent;
        }
    }

    accum
        .into_iter()
        .zip(normals)
        .map(|(t, &n)| {
            let projected = t - n * n.dot(t);
            projected
                .try_normalize()
                .unwrap_or_else(|| n.any_orthonormal_vector())
        })
        .collect()
}
