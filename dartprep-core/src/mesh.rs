//! Mesh data structures and functionality

use crate::bounds::BoundingBox;
use crate::error::{Error, Result};
use crate::point::*;
use serde::{Deserialize, Serialize};

/// A triangle mesh with vertices and faces
///
/// Faces index into `vertices`. Manifoldness, winding and connectivity are
/// not enforced; [`TriangleMesh::validate_indices`] checks the one invariant
/// every consumer relies on.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TriangleMesh {
    pub vertices: Vec<Point3f>,
    pub faces: Vec<[usize; 3]>,
    pub normals: Option<Vec<Vector3f>>,
}

impl TriangleMesh {
    /// Create a new empty mesh
    pub fn new() -> Self {
        Self {
            vertices: Vec::new(),
            faces: Vec::new(),
            normals: None,
        }
    }

    /// Create a mesh from vertices and faces
    pub fn from_vertices_and_faces(vertices: Vec<Point3f>, faces: Vec<[usize; 3]>) -> Self {
        Self {
            vertices,
            faces,
            normals: None,
        }
    }

    /// Get the number of vertices
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Get the number of faces
    pub fn face_count(&self) -> usize {
        self.faces.len()
    }

    /// Check if the mesh is empty
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty() || self.faces.is_empty()
    }

    /// Add a vertex to the mesh
    pub fn add_vertex(&mut self, vertex: Point3f) -> usize {
        let index = self.vertices.len();
        self.vertices.push(vertex);
        index
    }

    /// Add a face to the mesh
    pub fn add_face(&mut self, face: [usize; 3]) {
        self.faces.push(face);
    }

    /// Axis-aligned bounds of the vertices, `None` for a mesh without vertices
    pub fn bounding_box(&self) -> Option<BoundingBox> {
        BoundingBox::from_points(&self.vertices)
    }

    /// Check that every face index is within the vertex sequence
    pub fn validate_indices(&self) -> Result<()> {
        let n = self.vertices.len();
        for (fi, face) in self.faces.iter().enumerate() {
            if let Some(&bad) = face.iter().find(|&&vi| vi >= n) {
                return Err(Error::InvalidData(format!(
                    "Face {} references vertex {} but mesh has {} vertices",
                    fi, bad, n
                )));
            }
        }
        Ok(())
    }

    /// Area of a single face
    pub fn face_area(&self, face: &[usize; 3]) -> f64 {
        let v0 = to_point3d(&self.vertices[face[0]]);
        let v1 = to_point3d(&self.vertices[face[1]]);
        let v2 = to_point3d(&self.vertices[face[2]]);
        (v1 - v0).cross(&(v2 - v0)).norm() * 0.5
    }

    /// Set vertex normals
    pub fn set_normals(&mut self, normals: Vec<Vector3f>) {
        if normals.len() == self.vertices.len() {
            self.normals = Some(normals);
        }
    }

    /// Concatenate another mesh into this one
    ///
    /// Faces of `other` are offset by this mesh's vertex count. Normals are
    /// kept only when both meshes carry them.
    pub fn append(&mut self, other: &TriangleMesh) {
        let offset = self.vertices.len();

        self.normals = match (self.normals.take(), &other.normals) {
            (Some(mut mine), Some(theirs)) => {
                mine.extend_from_slice(theirs);
                Some(mine)
            }
            _ => None,
        };

        self.vertices.extend_from_slice(&other.vertices);
        self.faces.extend(
            other
                .faces
                .iter()
                .map(|f| [f[0] + offset, f[1] + offset, f[2] + offset]),
        );
    }

    /// Replace every vertex position by `f(position)`
    pub fn transform_vertices<F>(&mut self, mut f: F)
    where
        F: FnMut(&Point3f) -> Point3f,
    {
        for v in &mut self.vertices {
            *v = f(v);
        }
    }
}

impl Default for TriangleMesh {
    fn default() -> Self {
        Self::new()
    }
}
