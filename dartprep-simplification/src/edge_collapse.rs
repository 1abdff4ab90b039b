//! Edge collapse simplification
//!
//! Implements iterative edge collapse mesh simplification using a half-edge
//! data structure for efficient topology operations and quadric error metrics
//! (QEM) for error-driven edge prioritization.

use crate::quadric_error::{compute_plane, plane_to_quadric, quadric_error_at};
use crate::SimplificationStrategy;
use dartprep_core::{Error, Point3f, Result, TriangleMesh, Vector3f};
use nalgebra::Matrix4;
use priority_queue::PriorityQueue;
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use tracing::debug;

const INVALID: usize = usize::MAX;

// ============================================================
// Half-Edge Data Structure
// ============================================================

#[derive(Debug, Clone)]
struct HalfEdge {
    target: usize,
    twin: usize,
    next: usize,
    prev: usize,
    face: usize,
}

/// Half-edge mesh for topology-aware edge collapse operations.
struct HalfEdgeMesh {
    half_edges: Vec<HalfEdge>,
    /// One outgoing half-edge per vertex (INVALID if removed)
    vertex_edge: Vec<usize>,
    /// One half-edge per face (INVALID if removed)
    face_edge: Vec<usize>,
    active_face_count: usize,
    /// Faces that reference each vertex, possibly stale or repeated
    vertex_faces: Vec<Vec<usize>>,
    positions: Vec<Point3f>,
    normals: Option<Vec<Vector3f>>,
    quadrics: Vec<Matrix4<f64>>,
    vertex_removed: Vec<bool>,
}

impl HalfEdgeMesh {
    /// Build the half-edge structure
    ///
    /// Fails when the faces do not form an oriented 2-manifold: a directed edge
    /// used twice means either inconsistent winding or an edge shared by more
    /// than two faces, neither of which the twin pointers can express.
    fn from_triangle_mesh(mesh: &TriangleMesh) -> Result<Self> {
        let nv = mesh.vertices.len();
        let nf = mesh.faces.len();

        let mut half_edges = Vec::with_capacity(nf * 3);
        let mut vertex_edge = vec![INVALID; nv];
        let mut face_edge = Vec::with_capacity(nf);
        let mut vertex_faces = vec![Vec::new(); nv];

        for (fi, face) in mesh.faces.iter().enumerate() {
            if face[0] == face[1] || face[1] == face[2] || face[0] == face[2] {
                return Err(Error::Algorithm(format!(
                    "Face {} repeats a vertex and cannot be decimated",
                    fi
                )));
            }
            let base = fi * 3;
            for &v in face {
                vertex_faces[v].push(fi);
            }
            for j in 0..3usize {
                half_edges.push(HalfEdge {
                    target: face[(j + 1) % 3],
                    twin: INVALID,
                    next: base + (j + 1) % 3,
                    prev: base + (j + 2) % 3,
                    face: fi,
                });
                if vertex_edge[face[j]] == INVALID {
                    vertex_edge[face[j]] = base + j;
                }
            }
            face_edge.push(base);
        }

        // Build twin pointers
        let mut edge_map: HashMap<(usize, usize), usize> = HashMap::with_capacity(nf * 3);
        for (he_idx, he) in half_edges.iter().enumerate() {
            let src = half_edges[he.prev].target;
            if edge_map.insert((src, he.target), he_idx).is_some() {
                return Err(Error::Algorithm(format!(
                    "Non-manifold edge ({}, {}): shared by more than two faces or inconsistently wound",
                    src, he.target
                )));
            }
        }
        for he_idx in 0..half_edges.len() {
            if half_edges[he_idx].twin != INVALID {
                continue;
            }
            let src = half_edges[half_edges[he_idx].prev].target;
            let tgt = half_edges[he_idx].target;
            if let Some(&twin_idx) = edge_map.get(&(tgt, src)) {
                half_edges[he_idx].twin = twin_idx;
                half_edges[twin_idx].twin = he_idx;
            }
        }

        let mut hem = HalfEdgeMesh {
            half_edges,
            vertex_edge,
            face_edge,
            active_face_count: nf,
            vertex_faces,
            positions: mesh.vertices.clone(),
            normals: mesh.normals.clone(),
            quadrics: vec![Matrix4::zeros(); nv],
            vertex_removed: vec![false; nv],
        };
        hem.initialize_quadrics();
        Ok(hem)
    }

    #[inline]
    fn source(&self, he: usize) -> usize {
        self.half_edges[self.half_edges[he].prev].target
    }

    fn initialize_quadrics(&mut self) {
        for fi in 0..self.face_edge.len() {
            let he0 = self.face_edge[fi];
            if he0 == INVALID {
                continue;
            }
            let he1 = self.half_edges[he0].next;
            let v0 = self.source(he0);
            let v1 = self.half_edges[he0].target;
            let v2 = self.half_edges[he1].target;
            let plane = compute_plane(&self.positions[v0], &self.positions[v1], &self.positions[v2]);
            let q = plane_to_quadric(&plane);
            self.quadrics[v0] += q;
            self.quadrics[v1] += q;
            self.quadrics[v2] += q;
        }
    }

    /// Get all outgoing half-edges from a vertex (handles boundary vertices).
    fn outgoing_half_edges(&self, v: usize) -> Vec<usize> {
        let start = self.vertex_edge[v];
        if start == INVALID {
            return vec![];
        }

        let mut result = Vec::new();
        let mut current = start;

        // Rotate counterclockwise: current.prev.twin
        loop {
            result.push(current);
            let prev = self.half_edges[current].prev;
            let twin = self.half_edges[prev].twin;
            if twin == INVALID {
                break;
            }
            current = twin;
            if current == start {
                return result;
            }
        }

        // Boundary: also rotate clockwise from start via twin.next
        let twin_of_start = self.half_edges[start].twin;
        if twin_of_start != INVALID {
            let mut current = self.half_edges[twin_of_start].next;
            loop {
                if current == start {
                    break;
                }
                result.push(current);
                let twin = self.half_edges[current].twin;
                if twin == INVALID {
                    break;
                }
                current = self.half_edges[twin].next;
            }
        }

        result
    }

    fn neighbors(&self, v: usize) -> HashSet<usize> {
        let mut result: HashSet<usize> = HashSet::new();
        for he in self.outgoing_half_edges(v) {
            result.insert(self.half_edges[he].target);
            // The previous vertex of a boundary fan has no outgoing twin
            let prev = self.half_edges[he].prev;
            result.insert(self.source(prev));
        }
        result.remove(&v);
        result
    }

    fn is_boundary_vertex(&self, v: usize) -> bool {
        self.outgoing_half_edges(v).iter().any(|&he| {
            self.half_edges[he].twin == INVALID
                || self.half_edges[self.half_edges[he].prev].twin == INVALID
        })
    }

    /// Check the link condition: common neighbors must equal exactly the
    /// face apices opposite the edge (2 for interior, 1 for boundary).
    fn check_link_condition(&self, v1: usize, v2: usize) -> bool {
        let n1 = self.neighbors(v1);
        let n2 = self.neighbors(v2);
        let common_count = n1.intersection(&n2).count();

        let h = match self.find_half_edge(v1, v2) {
            Some(h) => h,
            None => return false,
        };
        let is_boundary = self.half_edges[h].twin == INVALID;
        let expected = if is_boundary { 1 } else { 2 };
        common_count == expected
    }

    fn find_half_edge(&self, from: usize, to: usize) -> Option<usize> {
        self.outgoing_half_edges(from)
            .into_iter()
            .find(|&he| self.half_edges[he].target == to)
    }

    /// Position and cost of collapsing the edge `(v1, v2)`
    ///
    /// The quadric optimum is used when it is well defined and stays near the
    /// edge; otherwise the best of the two endpoints and the midpoint.
    fn compute_collapse_cost(&self, v1: usize, v2: usize) -> (Point3f, f64) {
        let q = self.quadrics[v1] + self.quadrics[v2];
        let (p1, p2) = (self.positions[v1], self.positions[v2]);
        let midpoint = Point3f::from((p1.coords + p2.coords) * 0.5);
        let reach = (p2 - p1).norm() * 0.5;

        let q3 = q.fixed_view::<3, 3>(0, 0).into_owned();
        let q1 = q.fixed_view::<3, 1>(0, 3).into_owned();
        let optimal = q3.try_inverse().map(|inv| {
            let p = -inv * q1;
            Point3f::new(p[0] as f32, p[1] as f32, p[2] as f32)
        });

        if let Some(optimal) = optimal {
            let near = (0..3).all(|k| {
                optimal[k] >= p1[k].min(p2[k]) - reach && optimal[k] <= p1[k].max(p2[k]) + reach
            });
            if near && optimal.coords.iter().all(|x| x.is_finite()) {
                return (optimal, quadric_error_at(&optimal, &q));
            }
        }

        [midpoint, p1, p2]
            .into_iter()
            .map(|p| (p, quadric_error_at(&p, &q)))
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .unwrap_or((midpoint, 0.0))
    }

    /// Find any valid outgoing half-edge from a vertex (linear scan fallback).
    fn find_valid_outgoing(&self, v: usize) -> usize {
        for (i, he) in self.half_edges.iter().enumerate() {
            if he.face != INVALID && self.source(i) == v {
                return i;
            }
        }
        INVALID
    }

    /// Collapse edge (v1, v2), merging v2 into v1 at new_pos.
    /// Returns true on success.
    fn collapse_edge(&mut self, v1: usize, v2: usize, new_pos: Point3f) -> bool {
        let h = match self.find_half_edge(v1, v2) {
            Some(h) => h,
            None => return false,
        };

        let h_twin = self.half_edges[h].twin;
        let h_next = self.half_edges[h].next;
        let h_prev = self.half_edges[h].prev;
        let face_a = self.half_edges[h].face;
        let h_next_twin = self.half_edges[h_next].twin;
        let h_prev_twin = self.half_edges[h_prev].twin;
        let c = self.half_edges[h_next].target;

        let (face_b, ht_next, ht_prev, ht_next_twin, ht_prev_twin, d) = if h_twin != INVALID {
            let hn = self.half_edges[h_twin].next;
            let hp = self.half_edges[h_twin].prev;
            (
                self.half_edges[h_twin].face,
                hn,
                hp,
                self.half_edges[hn].twin,
                self.half_edges[hp].twin,
                self.half_edges[hn].target,
            )
        } else {
            (INVALID, INVALID, INVALID, INVALID, INVALID, INVALID)
        };

        // Collect v2 outgoing edges BEFORE any modifications
        let v2_outgoing = self.outgoing_half_edges(v2);

        // Re-pair twins for face A border edges
        if h_next_twin != INVALID {
            self.half_edges[h_next_twin].twin = h_prev_twin;
        }
        if h_prev_twin != INVALID {
            self.half_edges[h_prev_twin].twin = h_next_twin;
        }

        // Mark face A as removed
        self.half_edges[h].face = INVALID;
        self.half_edges[h_next].face = INVALID;
        self.half_edges[h_prev].face = INVALID;
        self.face_edge[face_a] = INVALID;
        self.active_face_count -= 1;

        // Handle face B
        if face_b != INVALID {
            if ht_next_twin != INVALID {
                self.half_edges[ht_next_twin].twin = ht_prev_twin;
            }
            if ht_prev_twin != INVALID {
                self.half_edges[ht_prev_twin].twin = ht_next_twin;
            }
            self.half_edges[h_twin].face = INVALID;
            self.half_edges[ht_next].face = INVALID;
            self.half_edges[ht_prev].face = INVALID;
            self.face_edge[face_b] = INVALID;
            self.active_face_count -= 1;
        }

        // Redirect all v2 references to v1
        for &he in &v2_outgoing {
            let prev = self.half_edges[he].prev;
            self.half_edges[prev].target = v1;

            let twin = self.half_edges[he].twin;
            if twin != INVALID && self.half_edges[twin].face != INVALID {
                self.half_edges[twin].target = v1;
            }
        }

        // Fans the rotation above cannot reach still point at v2
        let v2_faces = std::mem::take(&mut self.vertex_faces[v2]);
        for &f in &v2_faces {
            let he0 = self.face_edge[f];
            if he0 == INVALID {
                continue;
            }
            for he in [he0, self.half_edges[he0].next, self.half_edges[he0].prev] {
                if self.half_edges[he].target == v2 {
                    self.half_edges[he].target = v1;
                }
            }
        }
        self.vertex_faces[v1].extend(v2_faces);

        // Fix vertex_edge pointers for v1
        if self.half_edges[self.vertex_edge[v1]].face == INVALID {
            if h_prev_twin != INVALID && self.half_edges[h_prev_twin].face != INVALID {
                self.vertex_edge[v1] = h_prev_twin;
            } else {
                self.vertex_edge[v1] = self.find_valid_outgoing(v1);
            }
        }

        // Fix vertex_edge for c
        if c != INVALID
            && self.vertex_edge[c] != INVALID
            && self.half_edges[self.vertex_edge[c]].face == INVALID
        {
            if h_next_twin != INVALID && self.half_edges[h_next_twin].face != INVALID {
                self.vertex_edge[c] = h_next_twin;
            } else {
                self.vertex_edge[c] = self.find_valid_outgoing(c);
            }
        }

        // Fix vertex_edge for d
        if d != INVALID
            && d != c
            && self.vertex_edge[d] != INVALID
            && self.half_edges[self.vertex_edge[d]].face == INVALID
        {
            if ht_next_twin != INVALID && self.half_edges[ht_next_twin].face != INVALID {
                self.vertex_edge[d] = ht_next_twin;
            } else {
                self.vertex_edge[d] = self.find_valid_outgoing(d);
            }
        }

        // Mark v2 as removed
        self.vertex_edge[v2] = INVALID;
        self.vertex_removed[v2] = true;

        // Update position and quadric for v1
        let v2_quadric = self.quadrics[v2];
        self.positions[v1] = new_pos;
        self.quadrics[v1] += v2_quadric;

        // Interpolate normals
        if let Some(ref mut normals) = self.normals {
            let avg = (normals[v1] + normals[v2]).normalize();
            if avg.iter().all(|x| x.is_finite()) {
                normals[v1] = avg;
            }
        }

        true
    }

    /// Corners of a live face
    fn face_vertices(&self, f: usize) -> Option<[usize; 3]> {
        let he0 = self.face_edge[f];
        if he0 == INVALID {
            return None;
        }
        let he1 = self.half_edges[he0].next;
        Some([self.source(he0), self.half_edges[he0].target, self.half_edges[he1].target])
    }

    /// A live face that would not survive into the output mesh
    fn is_folded(&self, f: usize) -> bool {
        match self.face_vertices(f) {
            None => false,
            Some([a, b, c]) => {
                a == b
                    || b == c
                    || c == a
                    || [a, b, c].iter().any(|&v| {
                        v == INVALID || self.vertex_removed[v] || self.vertex_edge[v] == INVALID
                    })
            }
        }
    }

    /// Remove a live face and detach it from its neighbours
    fn retire_face(&mut self, f: usize) {
        let corners = match self.face_vertices(f) {
            Some(corners) => corners,
            None => return,
        };
        let he0 = self.face_edge[f];
        for he in [he0, self.half_edges[he0].next, self.half_edges[he0].prev] {
            let twin = self.half_edges[he].twin;
            if twin != INVALID {
                self.half_edges[twin].twin = INVALID;
            }
            self.half_edges[he].twin = INVALID;
            self.half_edges[he].face = INVALID;
        }
        self.face_edge[f] = INVALID;
        self.active_face_count -= 1;

        for v in corners {
            if v != INVALID
                && !self.vertex_removed[v]
                && self.vertex_edge[v] != INVALID
                && self.half_edges[self.vertex_edge[v]].face == INVALID
            {
                self.vertex_edge[v] = self.find_valid_outgoing(v);
            }
        }
    }

    /// Retire folded faces around `vertices` so the live count matches the output
    fn retire_folded_faces(&mut self, vertices: &[usize]) -> usize {
        let mut retired = 0;
        for &v in vertices {
            if v == INVALID {
                continue;
            }
            let mut faces = std::mem::take(&mut self.vertex_faces[v]);
            for &f in &faces {
                if self.is_folded(f) {
                    self.retire_face(f);
                    retired += 1;
                }
            }
            faces.retain(|&f| self.face_edge[f] != INVALID);
            faces.sort_unstable();
            faces.dedup();
            self.vertex_faces[v] = faces;
        }
        retired
    }

    fn to_triangle_mesh(&self) -> TriangleMesh {
        let mut old_to_new: Vec<usize> = vec![INVALID; self.positions.len()];
        let mut new_positions = Vec::new();
        let mut new_normals = Vec::new();

        for (i, &removed) in self.vertex_removed.iter().enumerate() {
            if !removed && self.vertex_edge[i] != INVALID {
                old_to_new[i] = new_positions.len();
                new_positions.push(self.positions[i]);
                if let Some(ref normals) = self.normals {
                    new_normals.push(normals[i]);
                }
            }
        }

        let mut new_faces = Vec::new();
        for &he0 in &self.face_edge {
            if he0 == INVALID {
                continue;
            }
            let he1 = self.half_edges[he0].next;
            let face = [
                old_to_new[self.source(he0)],
                old_to_new[self.half_edges[he0].target],
                old_to_new[self.half_edges[he1].target],
            ];
            if face.contains(&INVALID) {
                continue;
            }
            if face[0] != face[1] && face[1] != face[2] && face[2] != face[0] {
                new_faces.push(face);
            }
        }

        let mut mesh = TriangleMesh::from_vertices_and_faces(new_positions, new_faces);
        if self.normals.is_some() {
            mesh.set_normals(new_normals);
        }
        mesh
    }
}

// ============================================================
// Edge Cost for Priority Queue
// ============================================================

#[derive(Debug, Clone)]
struct EdgeCost {
    v1: usize,
    v2: usize,
    cost: f64,
}

impl PartialEq for EdgeCost {
    fn eq(&self, other: &Self) -> bool {
        self.cost.total_cmp(&other.cost) == Ordering::Equal
    }
}
impl Eq for EdgeCost {}

impl PartialOrd for EdgeCost {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for EdgeCost {
    fn cmp(&self, other: &Self) -> Ordering {
        // Min-heap: smallest cost first
        other.cost.total_cmp(&self.cost)
    }
}

type EdgeKey = (usize, usize);

// ============================================================
// Edge Collapse Simplifier
// ============================================================

/// Edge collapse mesh simplifier using half-edge data structure and QEM.
///
/// This simplifier builds a half-edge mesh for efficient local topology
/// queries (neighbor iteration, boundary detection, link condition checks)
/// and uses quadric error metrics to prioritize edge collapses. It collapses
/// until the face count reaches the target and fails if it cannot.
pub struct EdgeCollapseSimplifier {
    /// Stop when the minimum collapse cost exceeds this threshold
    pub error_threshold: Option<f64>,
    /// Never collapse edges touching the mesh boundary
    pub preserve_boundary: bool,
    /// Extra penalty weight applied to boundary edge costs
    pub boundary_weight: f64,
}

impl Default for EdgeCollapseSimplifier {
    fn default() -> Self {
        Self {
            error_threshold: None,
            preserve_boundary: false,
            boundary_weight: 100.0,
        }
    }
}

impl EdgeCollapseSimplifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_params(
        error_threshold: Option<f64>,
        preserve_boundary: bool,
        boundary_weight: f64,
    ) -> Self {
        Self {
            error_threshold,
            preserve_boundary,
            boundary_weight,
        }
    }

    /// Cost entry for the edge `(a, b)`, or `None` if it may not collapse
    fn candidate(&self, hem: &HalfEdgeMesh, a: usize, b: usize) -> Option<EdgeCost> {
        let on_boundary = hem.is_boundary_vertex(a) || hem.is_boundary_vertex(b);
        if self.preserve_boundary && on_boundary {
            return None;
        }

        let (_, mut cost) = hem.compute_collapse_cost(a, b);
        if on_boundary {
            cost += self.boundary_weight;
        }
        Some(EdgeCost { v1: a, v2: b, cost })
    }

    /// Build the initial priority queue of edge collapse candidates.
    fn build_queue(&self, hem: &HalfEdgeMesh) -> PriorityQueue<EdgeKey, EdgeCost> {
        let mut queue = PriorityQueue::new();

        for vi in 0..hem.positions.len() {
            if hem.vertex_removed[vi] {
                continue;
            }
            for he in hem.outgoing_half_edges(vi) {
                let target = hem.half_edges[he].target;
                let key = (vi.min(target), vi.max(target));
                if queue.get(&key).is_some() {
                    continue;
                }
                if let Some(entry) = self.candidate(hem, key.0, key.1) {
                    queue.push(key, entry);
                }
            }
        }

        queue
    }

    /// Re-queue every edge around `v` after its quadric changed.
    fn requeue_around(&self, hem: &HalfEdgeMesh, v: usize, queue: &mut PriorityQueue<EdgeKey, EdgeCost>) {
        for n in hem.neighbors(v) {
            let key = (v.min(n), v.max(n));
            match self.candidate(hem, key.0, key.1) {
                Some(entry) => {
                    queue.push(key, entry);
                }
                None => {
                    queue.remove(&key);
                }
            }
        }
    }

    /// Decimate `mesh` until it has at most `target_faces` faces
    pub fn simplify_to(&self, mesh: &TriangleMesh, target_faces: usize) -> Result<TriangleMesh> {
        if mesh.is_empty() {
            return Err(Error::Algorithm("Mesh is empty".to_string()));
        }
        mesh.validate_indices()?;
        if mesh.face_count() <= target_faces {
            return Ok(mesh.clone());
        }

        let mut hem = HalfEdgeMesh::from_triangle_mesh(mesh)?;
        let mut queue = self.build_queue(&hem);
        let mut collapse_count = 0usize;
        let mut folded_count = 0usize;

        while hem.active_face_count > target_faces {
            let (_, edge_cost) = match queue.pop() {
                Some(item) => item,
                None => break,
            };

            // Check error threshold
            if let Some(threshold) = self.error_threshold {
                if edge_cost.cost > threshold {
                    break;
                }
            }

            let v1 = edge_cost.v1;
            let v2 = edge_cost.v2;

            // Validate: both vertices still alive and still neighbors
            if hem.vertex_removed[v1]
                || hem.vertex_removed[v2]
                || hem.vertex_edge[v1] == INVALID
                || hem.vertex_edge[v2] == INVALID
            {
                continue;
            }

            if hem.find_half_edge(v1, v2).is_none() {
                continue;
            }

            // Check link condition to avoid non-manifold topology
            if !hem.check_link_condition(v1, v2) {
                continue;
            }

            let (pos, _cost) = hem.compute_collapse_cost(v1, v2);
            let mut ring: Vec<usize> = hem.neighbors(v1).into_iter().chain(hem.neighbors(v2)).collect();

            if hem.collapse_edge(v1, v2, pos) {
                collapse_count += 1;
                ring.push(v1);
                folded_count += hem.retire_folded_faces(&ring);
                if hem.vertex_edge[v1] != INVALID {
                    self.requeue_around(&hem, v1, &mut queue);
                }
            }
        }

        let simplified = hem.to_triangle_mesh();
        debug!(
            collapses = collapse_count,
            folded = folded_count,
            faces = simplified.face_count(),
            target = target_faces,
            "Edge collapse finished"
        );

        if simplified.face_count() > target_faces {
            return Err(Error::Algorithm(format!(
                "Decimation stalled at {} faces (target {})",
                simplified.face_count(),
                target_faces
            )));
        }
        if simplified.is_empty() {
            return Err(Error::Algorithm("Decimation removed every face".to_string()));
        }

        Ok(simplified)
    }
}

impl SimplificationStrategy for EdgeCollapseSimplifier {
    fn name(&self) -> &str {
        "quadric_decimation"
    }

    fn simplify(&self, mesh: &TriangleMesh, target_faces: usize) -> Result<TriangleMesh> {
        self.simplify_to(mesh, target_faces)
    }
}
