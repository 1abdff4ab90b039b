//! Connected components of a triangle mesh
//!
//! Two faces are connected when they share a vertex index. Meshes produced by
//! [`crate::marching_cubes`] are welded, so this is the surface connectivity.

use dartprep_core::TriangleMesh;
use tracing::debug;

/// Union-find over vertex indices
struct DisjointSet {
    parent: Vec<usize>,
    rank: Vec<u8>,
}

impl DisjointSet {
    fn new(n: usize) -> Self {
        Self {
            parent: (0..n).collect(),
            rank: vec![0; n],
        }
    }

    fn find(&mut self, mut x: usize) -> usize {
        while self.parent[x] != x {
            self.parent[x] = self.parent[self.parent[x]];
            x = self.parent[x];
        }
        x
    }

    fn union(&mut self, a: usize, b: usize) {
        let (ra, rb) = (self.find(a), self.find(b));
        if ra == rb {
            return;
        }
        match self.rank[ra].cmp(&self.rank[rb]) {
            std::cmp::Ordering::Less => self.parent[ra] = rb,
            std::cmp::Ordering::Greater => self.parent[rb] = ra,
            std::cmp::Ordering::Equal => {
                self.parent[rb] = ra;
                self.rank[ra] += 1;
            }
        }
    }
}

/// Split a mesh into its connected pieces
///
/// Components come out in order of their first face. Each piece carries only
/// the vertices its faces reference, renumbered from zero. Vertices no face
/// uses are dropped.
pub fn split_components(mesh: &TriangleMesh) -> Vec<TriangleMesh> {
    let mut sets = DisjointSet::new(mesh.vertex_count());
    for f in &mesh.faces {
        sets.union(f[0], f[1]);
        sets.union(f[1], f[2]);
    }

    // root vertex -> component slot
    let mut slot_of_root: Vec<Option<usize>> = vec![None; mesh.vertex_count()];
    let mut face_groups: Vec<Vec<usize>> = Vec::new();
    for (fi, f) in mesh.faces.iter().enumerate() {
        let root = sets.find(f[0]);
        let slot = *slot_of_root[root].get_or_insert_with(|| {
            face_groups.push(Vec::new());
            face_groups.len() - 1
        });
        face_groups[slot].push(fi);
    }

    let mut remap: Vec<usize> = vec![usize::MAX; mesh.vertex_count()];
    let components: Vec<TriangleMesh> = face_groups
        .iter()
        .map(|group| {
            let mut piece = TriangleMesh::new();
            for &fi in group {
                let mut face = [0usize; 3];
                for (k, &vi) in mesh.faces[fi].iter().enumerate() {
                    if remap[vi] == usize::MAX {
                        remap[vi] = piece.add_vertex(mesh.vertices[vi]);
                    }
                    face[k] = remap[vi];
                }
                piece.add_face(face);
            }
            piece
        })
        .collect();

    debug!(components = components.len(), "Split mesh into components");
    components
}

/// The component whose bounding box has the largest longest side
///
/// Ties keep the earlier component. Returns `None` for a mesh without faces.
pub fn largest_component(mesh: &TriangleMesh) -> Option<TriangleMesh> {
    let mut best: Option<(f64, TriangleMesh)> = None;

    for piece in split_components(mesh) {
        let extent = piece.bounding_box().map(|bb| bb.max_extent()).unwrap_or(0.0);
        match &best {
            Some((best_extent, _)) if extent <= *best_extent => {}
            _ => best = Some((extent, piece)),
        }
    }

    best.map(|(_, piece)| piece)
}

#[cfg(test)]
mod tests {
    use super::*;
    use dartprep_core::Point3f;

    fn triangle_at(offset: f32, size: f32) -> TriangleMesh {
        TriangleMesh::from_vertices_and_faces(
            vec![
                Point3f::new(offset, 0.0, 0.0),
                Point3f::new(offset + size, 0.0, 0.0),
                Point3f::new(offset, size, 0.0),
            ],
            vec![[0, 1, 2]],
        )
    }

    #[test]
    fn test_split_disjoint_triangles() {
        let mut mesh = triangle_at(0.0, 1.0);
        mesh.append(&triangle_at(5.0, 2.0));

        let pieces = split_components(&mesh);
        assert_eq!(pieces.len(), 2);
        assert_eq!(pieces[0].faces, vec![[0, 1, 2]]);
        assert_eq!(pieces[1].vertices[0], Point3f::new(5.0, 0.0, 0.0));
    }

    #[test]
    fn test_shared_vertex_joins_faces() {
        let mesh = TriangleMesh::from_vertices_and_faces(
            vec![
                Point3f::new(0.0, 0.0, 0.0),
                Point3f::new(1.0, 0.0, 0.0),
                Point3f::new(0.0, 1.0, 0.0),
                Point3f::new(-1.0, 0.0, 0.0),
                Point3f::new(0.0, -1.0, 0.0),
            ],
            vec![[0, 1, 2], [0, 3, 4]],
        );
        let pieces = split_components(&mesh);
        assert_eq!(pieces.len(), 1);
        assert_eq!(pieces[0].vertex_count(), 5);
    }

    #[test]
    fn test_largest_component_by_extent() {
        let mut mesh = triangle_at(0.0, 1.0);
        mesh.append(&triangle_at(5.0, 3.0));
        mesh.append(&triangle_at(20.0, 2.0));

        let largest = largest_component(&mesh).unwrap();
        assert_eq!(largest.vertices[0], Point3f::new(5.0, 0.0, 0.0));
        assert_eq!(largest.face_count(), 1);
    }

    #[test]
    fn test_largest_component_tie_keeps_first() {
        let mut mesh = triangle_at(0.0, 1.0);
        mesh.append(&triangle_at(5.0, 1.0));
        let largest = largest_component(&mesh).unwrap();
        assert_eq!(largest.vertices[0], Point3f::new(0.0, 0.0, 0.0));
    }

    #[test]
    fn test_largest_component_of_empty_mesh() {
        assert!(largest_component(&TriangleMesh::new()).is_none());
    }
}
