//! OBJ format support
//!
//! Only positions and faces are read. Polygons with more than three corners
//! are fan-triangulated; texture coordinates, normals, groups and materials are
//! ignored. Written files contain `v` and `f` records only.

use crate::{MeshReader, MeshWriter};
use dartprep_core::{Error, Point3f, Result, TriangleMesh};
use ::obj::ObjData;
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;
use tracing::{debug, warn};

pub struct ObjReader;
pub struct ObjWriter;

impl MeshReader for ObjReader {
    fn read_mesh<P: AsRef<Path>>(path: P) -> Result<TriangleMesh> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| Error::io(path, e))?;
        let mesh = parse_obj(BufReader::new(file), path)?;
        debug!(
            path = %path.display(),
            vertices = mesh.vertex_count(),
            faces = mesh.face_count(),
            "Read OBJ mesh"
        );
        Ok(mesh)
    }
}

impl MeshWriter for ObjWriter {
    fn write_mesh<P: AsRef<Path>>(mesh: &TriangleMesh, path: P) -> Result<()> {
        let path = path.as_ref();
        let file = File::create(path).map_err(|e| Error::io(path, e))?;
        let mut writer = BufWriter::new(file);
        write_obj(mesh, &mut writer).map_err(|e| Error::io(path, e))?;
        writer.flush().map_err(|e| Error::io(path, e))?;
        debug!(
            path = %path.display(),
            vertices = mesh.vertex_count(),
            faces = mesh.face_count(),
            "Wrote OBJ mesh"
        );
        Ok(())
    }
}

/// Parse OBJ text into a triangle mesh
///
/// `source` is only used to label errors.
pub fn parse_obj<R: Read>(reader: R, source: &Path) -> Result<TriangleMesh> {
    let data = ObjData::load_buf(reader).map_err(|e| Error::Parse {
        path: source.to_path_buf(),
        message: e.to_string(),
    })?;

    obj_data_to_mesh(&data, source)
}

fn obj_data_to_mesh(data: &ObjData, source: &Path) -> Result<TriangleMesh> {
    let vertices: Vec<Point3f> = data
        .position
        .iter()
        .map(|p| Point3f::new(p[0], p[1], p[2]))
        .collect();
    let vertex_count = vertices.len();

    let mut faces = Vec::new();
    let mut skipped = 0usize;

    for group in data.objects.iter().flat_map(|o| o.groups.iter()) {
        for poly in &group.polys {
            let corners: Vec<usize> = poly.0.iter().map(|t| t.0).collect();

            if let Some(&bad) = corners.iter().find(|&&vi| vi >= vertex_count) {
                return Err(Error::Parse {
                    path: source.to_path_buf(),
                    message: format!(
                        "face references vertex {} but only {} vertices are defined",
                        bad + 1,
                        vertex_count
                    ),
                });
            }

            if corners.len() < 3 {
                skipped += 1;
                continue;
            }

            // Fan around the first corner
            for i in 1..corners.len() - 1 {
                faces.push([corners[0], corners[i], corners[i + 1]]);
            }
        }
    }

    if skipped > 0 {
        warn!(
            path = %source.display(),
            skipped,
            "Skipped OBJ elements with fewer than three corners"
        );
    }

    Ok(TriangleMesh::from_vertices_and_faces(vertices, faces))
}

/// Write a mesh as OBJ text with 1-based face indices
pub fn write_obj<W: Write>(mesh: &TriangleMesh, writer: &mut W) -> std::io::Result<()> {
    for v in &mesh.vertices {
        writeln!(writer, "v {} {} {}", v.x, v.y, v.z)?;
    }
    for f in &mesh.faces {
        writeln!(writer, "f {} {} {}", f[0] + 1, f[1] + 1, f[2] + 1)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(text: &str) -> Result<TriangleMesh> {
        parse_obj(text.as_bytes(), Path::new("inline.obj"))
    }

    #[test]
    fn test_parse_triangles() {
        let mesh = parse(
            "v 0 0 0\nv 1 0 0\nv 1 1 0\nv 0 1 0\nf 1 2 3\nf 1 3 4\n",
        )
        .unwrap();
        assert_eq!(mesh.vertex_count(), 4);
        assert_eq!(mesh.faces, vec![[0, 1, 2], [0, 2, 3]]);
    }

    #[test]
    fn test_quad_is_fan_triangulated() {
        let mesh = parse("v 0 0 0\nv 1 0 0\nv 1 1 0\nv 0 1 0\nf 1 2 3 4\n").unwrap();
        assert_eq!(mesh.faces, vec![[0, 1, 2], [0, 2, 3]]);
    }

    #[test]
    fn test_texture_and_normal_indices_ignored() {
        let mesh = parse(
            "v 0 0 0\nv 1 0 0\nv 0 1 0\nvt 0 0\nvn 0 0 1\nf 1/1/1 2/1/1 3/1/1\n",
        )
        .unwrap();
        assert_eq!(mesh.faces, vec![[0, 1, 2]]);
    }

    #[test]
    fn test_out_of_range_index_is_parse_error() {
        let err = parse("v 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 7\n").unwrap_err();
        match err {
            Error::Parse { path, .. } => assert_eq!(path, Path::new("inline.obj")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_write_obj_format() {
        let mesh = TriangleMesh::from_vertices_and_faces(
            vec![
                Point3f::new(0.0, 0.0, 0.0),
                Point3f::new(1.5, 0.0, 0.0),
                Point3f::new(0.0, 2.0, -1.0),
            ],
            vec![[0, 1, 2]],
        );
        let mut buf = Vec::new();
        write_obj(&mesh, &mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert_eq!(text, "v 0 0 0\nv 1.5 0 0\nv 0 2 -1\nf 1 2 3\n");
    }

    #[test]
    fn test_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tri.obj");
        let mesh = TriangleMesh::from_vertices_and_faces(
            vec![
                Point3f::new(0.25, -1.0, 3.0),
                Point3f::new(1.0, 0.0, 0.0),
                Point3f::new(0.0, 1.0, 0.125),
            ],
            vec![[2, 0, 1]],
        );

        ObjWriter::write_mesh(&mesh, &path).unwrap();
        let loaded = ObjReader::read_mesh(&path).unwrap();
        assert_eq!(loaded.vertices, mesh.vertices);
        assert_eq!(loaded.faces, mesh.faces);
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("absent.obj");
        assert!(matches!(
            ObjReader::read_mesh(&missing),
            Err(Error::Io { .. })
        ));
    }
}
