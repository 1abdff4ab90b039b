//! Mesh cleanup
//!
//! Removes duplicate and degenerate faces and merges coincident vertices. Runs
//! before any simplification strategy so every strategy sees the same input.

use dartprep_core::{Point3f, TriangleMesh};
use std::collections::{HashMap, HashSet};
use tracing::debug;

/// Cleanup parameters
#[derive(Debug, Clone, PartialEq)]
pub struct CleanupConfig {
    /// Vertices whose coordinates agree after rounding to this step are merged;
    /// zero merges only bit-identical positions
    pub merge_tolerance: f64,
    /// Faces with an area at or below this value are degenerate
    pub area_epsilon: f64,
}

impl Default for CleanupConfig {
    fn default() -> Self {
        Self {
            merge_tolerance: 1e-8,
            area_epsilon: 0.0,
        }
    }
}

impl CleanupConfig {
    pub fn with_merge_tolerance(mut self, tolerance: f64) -> Self {
        self.merge_tolerance = tolerance;
        self
    }

    pub fn with_area_epsilon(mut self, epsilon: f64) -> Self {
        self.area_epsilon = epsilon;
        self
    }
}

/// What a cleanup pass removed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CleanupStats {
    pub duplicate_faces: usize,
    pub degenerate_faces: usize,
    pub merged_vertices: usize,
    pub unreferenced_vertices: usize,
}

/// Drop faces that reference the same three vertices as an earlier face,
/// in any order or winding. Returns the number removed.
pub fn remove_duplicate_faces(mesh: &mut TriangleMesh) -> usize {
    let before = mesh.faces.len();
    let mut seen: HashSet<[usize; 3]> = HashSet::with_capacity(before);
    mesh.faces.retain(|face| {
        let mut key = *face;
        key.sort_unstable();
        seen.insert(key)
    });
    before - mesh.faces.len()
}

/// Drop faces with a repeated vertex index or an area at or below `area_epsilon`
pub fn remove_degenerate_faces(mesh: &mut TriangleMesh, area_epsilon: f64) -> usize {
    let before = mesh.faces.len();
    let keep: Vec<bool> = mesh
        .faces
        .iter()
        .map(|f| f[0] != f[1] && f[1] != f[2] && f[0] != f[2] && mesh.face_area(f) > area_epsilon)
        .collect();
    let mut flags = keep.into_iter();
    mesh.faces.retain(|_| flags.next().unwrap_or(false));
    before - mesh.faces.len()
}

fn position_key(p: &Point3f, tolerance: f64) -> [i64; 3] {
    if tolerance > 0.0 {
        [
            (p.x as f64 / tolerance).round() as i64,
            (p.y as f64 / tolerance).round() as i64,
            (p.z as f64 / tolerance).round() as i64,
        ]
    } else {
        [p.x.to_bits() as i64, p.y.to_bits() as i64, p.z.to_bits() as i64]
    }
}

/// Merge coincident vertices and drop vertices no face references
///
/// Faces are rewritten to the surviving vertex of each group; faces that
/// collapse as a result are left for [`remove_degenerate_faces`]. Returns
/// `(merged, unreferenced)` vertex counts.
pub fn merge_vertices(mesh: &mut TriangleMesh, tolerance: f64) -> (usize, usize) {
    let mut referenced = vec![false; mesh.vertices.len()];
    for face in &mesh.faces {
        for &i in face {
            if let Some(flag) = referenced.get_mut(i) {
                *flag = true;
            }
        }
    }

    let mut groups: HashMap<[i64; 3], usize> = HashMap::new();
    let mut remap = vec![usize::MAX; mesh.vertices.len()];
    let mut vertices = Vec::new();
    let mut normals = mesh.normals.as_ref().map(|_| Vec::new());
    let mut merged = 0;
    let mut unreferenced = 0;

    for (i, p) in mesh.vertices.iter().enumerate() {
        if !referenced[i] {
            unreferenced += 1;
            continue;
        }
        let key = position_key(p, tolerance);
        match groups.get(&key) {
            Some(&target) => {
                remap[i] = target;
                merged += 1;
            }
            None => {
                let target = vertices.len();
                groups.insert(key, target);
                remap[i] = target;
                vertices.push(*p);
                if let (Some(out), Some(src)) = (normals.as_mut(), mesh.normals.as_ref()) {
                    out.push(src[i]);
                }
            }
        }
    }

    for face in &mut mesh.faces {
        for i in face.iter_mut() {
            *i = remap[*i];
        }
    }
    mesh.vertices = vertices;
    mesh.normals = normals;
    (merged, unreferenced)
}

/// Run every cleanup step in order on a copy of `mesh`
///
/// Degenerate faces are removed again after merging, and duplicates are
/// checked once more since merging can make distinct faces identical.
pub fn clean_mesh(mesh: &TriangleMesh, config: &CleanupConfig) -> (TriangleMesh, CleanupStats) {
    let mut cleaned = mesh.clone();
    let mut stats = CleanupStats {
        duplicate_faces: remove_duplicate_faces(&mut cleaned),
        degenerate_faces: remove_degenerate_faces(&mut cleaned, config.area_epsilon),
        ..CleanupStats::default()
    };

    let (merged, unreferenced) = merge_vertices(&mut cleaned, config.merge_tolerance);
    stats.merged_vertices = merged;
    stats.unreferenced_vertices = unreferenced;
    if merged > 0 {
        stats.degenerate_faces += remove_degenerate_faces(&mut cleaned, config.area_epsilon);
        stats.duplicate_faces += remove_duplicate_faces(&mut cleaned);
        let (_, orphaned) = merge_vertices(&mut cleaned, 0.0);
        stats.unreferenced_vertices += orphaned;
    }

    debug!(
        duplicate_faces = stats.duplicate_faces,
        degenerate_faces = stats.degenerate_faces,
        merged_vertices = stats.merged_vertices,
        unreferenced_vertices = stats.unreferenced_vertices,
        "Cleaned mesh"
    );
    (cleaned, stats)
}
