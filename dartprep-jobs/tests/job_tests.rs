//! Integration tests for the preprocessing jobs
//!
//! Every test works in its own temporary directory and goes through the same
//! file formats the command-line tools use.

use approx::assert_relative_eq;
use dartprep_core::{Error, Point3f, Result, SdfMetadata, TriangleMesh};
use dartprep_jobs::*;
use dartprep_reconstruction::{sample_coordinate, RepairingSdf, SdfBackend, SdfOutput};
use ndarray::Array3;
use std::path::Path;

/// Sphere of radius 0.5 for the grid; echoes the normalized input as the surface
struct AnalyticSdf;

impl SdfBackend for AnalyticSdf {
    fn name(&self) -> &str {
        "analytic"
    }

    fn compute(
        &self,
        vertices: &[Point3f],
        faces: &[[usize; 3]],
        size: usize,
        _level: f64,
    ) -> Result<SdfOutput> {
        let grid = Array3::from_shape_fn((size, size, size), |(i, j, k)| {
            let (x, y, z) = (
                sample_coordinate(i, size),
                sample_coordinate(j, size),
                sample_coordinate(k, size),
            );
            ((x * x + y * y + z * z).sqrt() - 0.5) as f32
        });
        Ok(SdfOutput {
            grid,
            mesh: TriangleMesh::from_vertices_and_faces(vertices.to_vec(), faces.to_vec()),
        })
    }
}

struct FailingSdf;

impl SdfBackend for FailingSdf {
    fn name(&self) -> &str {
        "failing"
    }

    fn compute(&self, _: &[Point3f], _: &[[usize; 3]], _: usize, _: f64) -> Result<SdfOutput> {
        Err(Error::Algorithm("no surface extracted".to_string()))
    }
}

/// Closed box between `min` and `max`, outward winding
fn box_mesh(min: [f32; 3], max: [f32; 3]) -> TriangleMesh {
    let [x0, y0, z0] = min;
    let [x1, y1, z1] = max;
    TriangleMesh::from_vertices_and_faces(
        vec![
            Point3f::new(x0, y0, z0),
            Point3f::new(x1, y0, z0),
            Point3f::new(x1, y1, z0),
            Point3f::new(x0, y1, z0),
            Point3f::new(x0, y0, z1),
            Point3f::new(x1, y0, z1),
            Point3f::new(x1, y1, z1),
            Point3f::new(x0, y1, z1),
        ],
        vec![
            [0, 2, 1],
            [0, 3, 2],
            [4, 5, 6],
            [4, 6, 7],
            [0, 1, 5],
            [0, 5, 4],
            [2, 3, 7],
            [2, 7, 6],
            [1, 2, 6],
            [1, 6, 5],
            [0, 4, 7],
            [0, 7, 3],
        ],
    )
}

/// Gently curved `size` x `size` height field
fn terrain(size: usize) -> TriangleMesh {
    let mut mesh = TriangleMesh::new();
    for y in 0..size {
        for x in 0..size {
            let fx = x as f32 / (size - 1) as f32 * std::f32::consts::PI;
            let fy = y as f32 / (size - 1) as f32 * std::f32::consts::PI;
            mesh.add_vertex(Point3f::new(x as f32, y as f32, fx.sin() * fy.sin()));
        }
    }
    for y in 0..size - 1 {
        for x in 0..size - 1 {
            let tl = y * size + x;
            let bl = tl + size;
            mesh.add_face([tl, bl, tl + 1]);
            mesh.add_face([tl + 1, bl, bl + 1]);
        }
    }
    mesh
}

fn write_input(dir: &Path, name: &str, mesh: &TriangleMesh) -> std::path::PathBuf {
    let path = dir.join(name);
    dartprep_io::write_mesh(mesh, &path).unwrap();
    path
}

// ---- Floor synthesis ----

#[test]
fn test_floor_scenario() {
    let dir = tempfile::tempdir().unwrap();
    let scene = box_mesh([-1.0, -1.0, 0.0], [1.0, 1.0, 2.0]);
    let input = write_input(dir.path(), "room.obj", &scene);
    let output = floor_output_path(dir.path(), "room");

    let report = run_floor(&input, &output, &FloorConfig::default()).unwrap();
    assert_eq!(report.output.vertices, scene.vertex_count() + 4);
    assert_eq!(report.output.faces, scene.face_count() + 2);

    let merged = dartprep_io::read_mesh(&output).unwrap();
    let n = scene.vertex_count();
    let expected = [
        Point3f::new(-1.5, -1.5, 0.0),
        Point3f::new(1.5, -1.5, 0.0),
        Point3f::new(1.5, 1.5, 0.0),
        Point3f::new(-1.5, 1.5, 0.0),
    ];
    for (got, want) in merged.vertices[n..].iter().zip(expected.iter()) {
        assert_relative_eq!(*got, *want, epsilon = 1e-6);
    }
    let m = scene.face_count();
    assert_eq!(merged.faces[m], [n, n + 1, n + 2]);
    assert_eq!(merged.faces[m + 1], [n, n + 2, n + 3]);
    assert_eq!(&merged.faces[..m], &scene.faces[..]);
}

#[test]
fn test_floor_covers_footprint() {
    let dir = tempfile::tempdir().unwrap();
    let scene = box_mesh([2.0, 3.0, 1.0], [5.0, 4.0, 3.0]);
    let input = write_input(dir.path(), "raised.obj", &scene);
    let output = dir.path().join("raised_floor.obj");

    let config = FloorConfig::default().with_margin(0.25);
    run_floor(&input, &output, &config).unwrap();
    let merged = dartprep_io::read_mesh(&output).unwrap();

    let floor = &merged.vertices[scene.vertex_count()..];
    assert!(floor.iter().all(|p| p.z == 0.0));
    let min_x = floor.iter().map(|p| p.x).fold(f32::INFINITY, f32::min);
    let max_x = floor.iter().map(|p| p.x).fold(f32::NEG_INFINITY, f32::max);
    let min_y = floor.iter().map(|p| p.y).fold(f32::INFINITY, f32::min);
    let max_y = floor.iter().map(|p| p.y).fold(f32::NEG_INFINITY, f32::max);
    assert!(min_x <= 1.75 && max_x >= 5.25);
    assert!(min_y <= 2.75 && max_y >= 4.25);
}

#[test]
fn test_floor_missing_input_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = run_floor(
        &dir.path().join("missing.obj"),
        &dir.path().join("out.obj"),
        &FloorConfig::default(),
    )
    .unwrap_err();
    assert!(matches!(err, Error::Io { .. }));
}

#[test]
fn test_floor_rejects_empty_scene() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("empty.obj");
    std::fs::write(&input, "# nothing here\n").unwrap();
    let output = dir.path().join("out.obj");

    assert!(run_floor(&input, &output, &FloorConfig::default()).is_err());
    assert!(!output.exists());
}

// ---- Simplification ----

#[test]
fn test_simplify_within_budget_keeps_cleaned_mesh() {
    let dir = tempfile::tempdir().unwrap();
    let mut mesh = terrain(6);
    mesh.faces.push(mesh.faces[3]);
    let input = write_input(dir.path(), "small.obj", &mesh);
    let output = dir.path().join("small_out.obj");

    let config = SimplifyConfig::default().with_target_faces(1000);
    let report = run_simplify(&input, &output, &config).unwrap();

    assert!(report.strategy.is_none());
    assert_eq!(report.cleaned_faces, 50);
    assert_eq!(report.output.faces, report.cleaned_faces);
    assert_relative_eq!(report.ratio, 1.0);
    assert_eq!(dartprep_io::read_mesh(&output).unwrap().face_count(), 50);
}

#[test]
fn test_simplify_reduces_to_target() {
    let dir = tempfile::tempdir().unwrap();
    let mesh = terrain(20);
    let input = write_input(dir.path(), "terrain.obj", &mesh);
    let output = dir.path().join("terrain_small.obj");

    let config = SimplifyConfig::default().with_target_faces(200);
    let report = run_simplify(&input, &output, &config).unwrap();

    assert_eq!(report.strategy.as_deref(), Some("quadric_decimation"));
    assert!(report.output.faces <= 200);
    assert!(report.ratio < 1.0);

    let simplified = dartprep_io::read_mesh(&output).unwrap();
    let before = mesh.bounding_box().unwrap();
    let after = simplified.bounding_box().unwrap();
    assert!(before.contains_box(&after, 0.05 * before.max_extent()));
}

#[test]
fn test_simplify_falls_back_when_decimation_fails() {
    let dir = tempfile::tempdir().unwrap();
    let mut mesh = terrain(10);
    // A fin on an interior diagonal makes the surface non-manifold
    let fin = mesh.add_vertex(Point3f::new(0.5, 0.5, 3.0));
    let [_, a, b] = mesh.faces[0];
    mesh.add_face([a, b, fin]);
    let input = write_input(dir.path(), "fin.obj", &mesh);
    let output = dir.path().join("fin_small.obj");

    let config = SimplifyConfig::default().with_target_faces(50);
    let report = run_simplify(&input, &output, &config).unwrap();

    assert_eq!(report.strategy.as_deref(), Some("voxel_clustering"));
    assert!(report.output.faces > 0);
    assert!(!dartprep_io::read_mesh(&output).unwrap().is_empty());
}

// ---- SDF generation ----

#[test]
fn test_sdf_normalization_scenario() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_input(dir.path(), "scene.obj", &box_mesh([0.0; 3], [4.0, 2.0, 1.0]));
    let out_dir = dir.path().join("sdf");

    let config = SdfConfig::default().with_size(8);
    let report = run_sdf(&input, &out_dir, &config, &AnalyticSdf).unwrap();

    assert_relative_eq!(report.metadata.center[0], 2.0);
    assert_relative_eq!(report.metadata.center[1], 1.0);
    assert_relative_eq!(report.metadata.center[2], 0.5);
    assert_relative_eq!(report.metadata.scale, 0.4);
    assert_relative_eq!(report.metadata.level, 0.125);
    assert_eq!(report.metadata.size, 8);

    let stored = dartprep_io::read_sdf_metadata(&report.paths.metadata).unwrap();
    assert_eq!(stored, report.metadata);
}

#[test]
fn test_sdf_outputs_and_stats() {
    let dir = tempfile::tempdir().unwrap();
    let scene = box_mesh([0.0; 3], [4.0, 2.0, 1.0]);
    let input = write_input(dir.path(), "scene.obj", &scene);

    let report = run_sdf(&input, dir.path(), &SdfConfig::default().with_size(10), &AnalyticSdf).unwrap();
    assert!(report.paths.mesh.exists());
    assert!(report.paths.grid.exists());
    assert!(report.paths.metadata.exists());

    assert_eq!(report.stats.shape, [10, 10, 10]);
    assert!(report.stats.min < 0.0 && report.stats.max > 0.0);
    assert!(report.stats.negative > 0 && report.stats.positive > report.stats.negative);
    assert_eq!(dartprep_io::read_sdf_grid(&report.paths.grid).unwrap().shape(), &[10, 10, 10]);

    // The echoed surface comes back in scene coordinates
    let repaired = dartprep_io::read_mesh(&report.paths.mesh).unwrap();
    for (got, want) in repaired.vertices.iter().zip(scene.vertices.iter()) {
        assert_relative_eq!(*got, *want, epsilon = 1e-5);
    }
}

#[test]
fn test_sdf_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_input(dir.path(), "scene.obj", &box_mesh([-3.0, 1.0, 0.0], [2.0, 2.5, 1.5]));
    let config = SdfConfig::default().with_size(6).with_mesh_scale(0.7);

    let first = run_sdf(&input, &dir.path().join("a"), &config, &AnalyticSdf).unwrap();
    let second = run_sdf(&input, &dir.path().join("b"), &config, &AnalyticSdf).unwrap();
    assert_eq!(first.metadata, second.metadata);
    assert_eq!(first.stats, second.stats);
}

#[test]
fn test_sdf_failure_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_input(dir.path(), "scene.obj", &box_mesh([0.0; 3], [1.0; 3]));
    let out_dir = dir.path().join("out");

    let err = run_sdf(&input, &out_dir, &SdfConfig::default().with_size(16), &FailingSdf).unwrap_err();
    match err {
        Error::SdfComputation { input: path, size, .. } => {
            assert_eq!(path, input);
            assert_eq!(size, 16);
        }
        other => panic!("expected an SDF computation error, got {other}"),
    }
    let paths = SdfOutputPaths::in_dir(&out_dir);
    assert!(!paths.mesh.exists() && !paths.grid.exists() && !paths.metadata.exists());
}

#[test]
fn test_sdf_with_repairing_backend() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_input(dir.path(), "cube.obj", &box_mesh([0.0; 3], [1.0; 3]));

    let report = run_sdf(
        &input,
        dir.path(),
        &SdfConfig::default().with_size(16),
        &RepairingSdf::default(),
    )
    .unwrap();

    assert!(report.stats.negative > 0);
    assert!(report.repaired.faces > 0);
    let bounds = report.repaired.bounds.unwrap();
    // The repaired shell hugs the unit cube in scene coordinates
    assert!(bounds.min.x < 0.0 && bounds.max.x > 1.0);
    assert!(bounds.min.x > -0.5 && bounds.max.x < 1.5);

    let grid = dartprep_io::read_sdf_grid(&report.paths.grid).unwrap();
    let at = |p: [f64; 3]| grid[grid_index(&report.metadata, p)];
    assert!(at([0.5, 0.5, 0.5]) < 0.0);
    assert!(at([-0.1, 0.5, 0.5]) > 0.0);
}

/// Grid sample whose cell contains the scene point `p`
fn grid_index(metadata: &SdfMetadata, p: [f64; 3]) -> [usize; 3] {
    let n = metadata.size as f64;
    let mut index = [0; 3];
    for axis in 0..3 {
        let normalized = (p[axis] - metadata.center[axis]) * metadata.scale;
        index[axis] = (((normalized + 1.0) * n / 2.0).floor() as usize).min(metadata.size - 1);
    }
    index
}

#[test]
fn test_sdf_of_object_on_floor() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_input(dir.path(), "crate.obj", &box_mesh([-0.5, -0.5, 0.0], [0.5, 0.5, 1.0]));
    let with_floor = floor_output_path(dir.path(), "crate");
    run_floor(&input, &with_floor, &FloorConfig::default()).unwrap();

    let out_dir = dir.path().join("sdf");
    let report = run_sdf(
        &with_floor,
        &out_dir,
        &SdfConfig::default().with_size(24),
        &RepairingSdf::default(),
    )
    .unwrap();
    assert!(report.stats.negative > 0 && report.stats.positive > report.stats.negative);

    let grid = dartprep_io::read_sdf_grid(&out_dir.join("scene_sdf.npy")).unwrap();
    let at = |p: [f64; 3]| grid[grid_index(&report.metadata, p)];
    // Inside the object
    assert!(at([0.0, 0.0, 0.5]) < 0.0);
    // Above the object and beside it over the floor
    assert!(at([0.0, 0.0, 1.5]) > 0.0);
    assert!(at([0.0, 0.0, 1.25]) > 0.0);
    assert!(at([0.85, 0.0, 0.5]) > 0.0);
}

// ---- Pipeline ----

#[test]
fn test_pipeline_writes_every_stage() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_input(dir.path(), "lounge.obj", &terrain(12));
    let out_dir = dir.path().join("processed");

    let config = PipelineConfig {
        simplify: SimplifyConfig::default().with_target_faces(100),
        sdf: SdfConfig::default().with_size(8),
        ..PipelineConfig::default()
    };
    let report = run_pipeline(&input, &out_dir, "lounge", &config, &AnalyticSdf).unwrap();

    assert_eq!(report.floor_mesh, out_dir.join("lounge_scene_with_floor.obj"));
    assert_eq!(report.simplified_mesh, out_dir.join("lounge_scene_with_floor_small.obj"));
    assert!(report.floor_mesh.exists() && report.simplified_mesh.exists());
    assert_eq!(report.floor.output.faces, 11 * 11 * 2 + 2);
    assert!(report.simplify.output.faces <= 100);
    assert_eq!(report.sdf.stats.shape, [8, 8, 8]);
}
