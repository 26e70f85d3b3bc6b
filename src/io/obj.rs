//! Wavefront OBJ support with subdivision tags.
//!
//! Besides `v` and polygonal `f` records, the loader understands the tag
//! records used by subdivision tools to annotate control meshes:
//!
//! ```text
//! t crease 2/1 4 5 2.0      # edge 4-5 with weight 2
//! t crease 3/1 1 2 3 5.0    # edge chain 1-2-3, every edge weight 5
//! t corner 1/1 7 10.0       # vertex 7 with weight 10
//! t hole 1/0 3              # face 3 is a hole
//! ```
//!
//! The `a/b` pair gives the number of integer and float arguments. Tag
//! indices are zero-based; face indices in `f` records are one-based or
//! negative (relative to the last vertex), as usual for OBJ.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::error::{Result, SubdivError};
use crate::mesh::{MeshSizes, SubdivMesh, TopologyOptions, VertexBuffer};
use crate::scene::Scene;

/// A polygonal control mesh read from an OBJ file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ObjMesh {
    /// Vertex positions.
    pub positions: Vec<[f32; 3]>,
    /// Number of vertices per face.
    pub valences: Vec<u32>,
    /// Zero-based vertex indices, face after face.
    pub indices: Vec<u32>,
    /// Creased edges.
    pub edge_creases: Vec<[u32; 2]>,
    /// Weight of each creased edge.
    pub edge_crease_weights: Vec<f32>,
    /// Creased vertices.
    pub vertex_creases: Vec<u32>,
    /// Weight of each creased vertex.
    pub vertex_crease_weights: Vec<f32>,
    /// Hole faces.
    pub holes: Vec<u32>,
}

impl ObjMesh {
    /// Number of faces.
    pub fn num_faces(&self) -> usize {
        self.valences.len()
    }

    /// Element counts for a [`SubdivMesh`] holding this mesh.
    pub fn sizes(&self) -> MeshSizes {
        MeshSizes::new(self.valences.len(), self.indices.len(), self.positions.len())
    }

    /// Create a mesh in `scene` with every buffer filled. The mesh still has
    /// to be committed.
    pub fn into_mesh(self, scene: Arc<Scene>, options: TopologyOptions) -> Result<SubdivMesh> {
        let mut mesh = SubdivMesh::new(scene, self.sizes(), options)?;
        mesh.set_faces(self.valences)?;
        mesh.set_indices(self.indices)?;
        mesh.set_vertices(0, VertexBuffer::from_points(&self.positions)?)?;
        if !self.holes.is_empty() {
            mesh.set_holes(self.holes)?;
        }
        if !self.edge_creases.is_empty() {
            mesh.set_edge_creases(self.edge_creases, self.edge_crease_weights)?;
        }
        if !self.vertex_creases.is_empty() {
            mesh.set_vertex_creases(self.vertex_creases, self.vertex_crease_weights)?;
        }
        Ok(mesh)
    }
}

/// Load an OBJ file.
///
/// # Example
///
/// ```no_run
/// use subdiv_mesh::io::obj;
///
/// let mesh = obj::load("cube.obj").unwrap();
/// println!("{} faces", mesh.num_faces());
/// ```
pub fn load<P: AsRef<Path>>(path: P) -> Result<ObjMesh> {
    let path = path.as_ref();
    let file = File::open(path)?;
    parse(BufReader::new(file), path)
}

/// Parse OBJ data. `path` is only used in error messages.
pub fn parse<R: BufRead>(reader: R, path: &Path) -> Result<ObjMesh> {
    let mut parser = ObjParser {
        path: path.to_path_buf(),
        mesh: ObjMesh::default(),
    };

    for (number, line) in reader.lines().enumerate() {
        let line = line?;
        let line = line.split('#').next().unwrap_or("").trim();
        if line.is_empty() {
            continue;
        }
        parser
            .parse_line(line)
            .map_err(|message| parser.error(format!("line {}: {}", number + 1, message)))?;
    }

    if parser.mesh.valences.is_empty() {
        return Err(parser.error("OBJ file contains no faces".to_string()));
    }
    Ok(parser.mesh)
}

struct ObjParser {
    path: PathBuf,
    mesh: ObjMesh,
}

impl ObjParser {
    fn error(&self, message: String) -> SubdivError {
        SubdivError::LoadError {
            path: self.path.clone(),
            message,
        }
    }

    fn parse_line(&mut self, line: &str) -> std::result::Result<(), String> {
        let mut tokens = line.split_whitespace();
        match tokens.next() {
            Some("v") => {
                let mut p = [0.0f32; 3];
                for c in &mut p {
                    *c = parse_number(tokens.next(), "vertex coordinate")?;
                }
                self.mesh.positions.push(p);
            }
            Some("f") => {
                let start = self.mesh.indices.len();
                for token in tokens {
                    let index = self.resolve_index(token)?;
                    self.mesh.indices.push(index);
                }
                let valence = self.mesh.indices.len() - start;
                if valence < 3 {
                    return Err(format!("face with {} vertices", valence));
                }
                self.mesh.valences.push(valence as u32);
            }
            Some("t") => self.parse_tag(tokens)?,
            // normals, texture coordinates, groups and materials carry no topology
            Some(_) | None => {}
        }
        Ok(())
    }

    /// Turn a face vertex token (`v`, `v/vt`, `v//vn`, `v/vt/vn`) into a
    /// zero-based position index.
    fn resolve_index(&self, token: &str) -> std::result::Result<u32, String> {
        let field = token.split('/').next().unwrap_or(token);
        let index: i64 = field
            .parse()
            .map_err(|_| format!("invalid face index '{}'", token))?;
        let count = self.mesh.positions.len() as i64;
        let resolved = match index {
            0 => return Err("face index 0".to_string()),
            i if i > 0 => i - 1,
            i => count + i,
        };
        u32::try_from(resolved).map_err(|_| format!("face index {} out of range", index))
    }

    fn parse_tag<'a>(&mut self, mut tokens: impl Iterator<Item = &'a str>) -> std::result::Result<(), String> {
        let name = tokens.next().ok_or("missing tag name")?;
        let counts = tokens.next().ok_or("missing tag argument counts")?;
        let mut counts = counts.split('/');
        let num_ints: usize = parse_number(counts.next(), "integer argument count")?;
        let num_floats: usize = parse_number(counts.next(), "float argument count")?;

        // counts come from the file; the arguments themselves bound the allocation
        let ints = tokens
            .by_ref()
            .take(num_ints)
            .map(|t| parse_number::<u32>(Some(t), "integer argument"))
            .collect::<std::result::Result<Vec<_>, _>>()?;
        if ints.len() != num_ints {
            return Err(format!("tag expects {} integer arguments, found {}", num_ints, ints.len()));
        }
        let floats = tokens
            .by_ref()
            .take(num_floats)
            .map(|t| parse_number::<f32>(Some(t), "float argument"))
            .collect::<std::result::Result<Vec<_>, _>>()?;
        if floats.len() != num_floats {
            return Err(format!("tag expects {} float arguments, found {}", num_floats, floats.len()));
        }

        match name {
            "crease" => {
                if ints.len() < 2 || floats.is_empty() {
                    return Err("crease needs two vertices and a weight".to_string());
                }
                for (i, pair) in ints.windows(2).enumerate() {
                    let weight = floats.get(i).copied().unwrap_or(floats[0]);
                    self.mesh.edge_creases.push([pair[0], pair[1]]);
                    self.mesh.edge_crease_weights.push(weight);
                }
            }
            "corner" => {
                if ints.is_empty() || floats.is_empty() {
                    return Err("corner needs a vertex and a weight".to_string());
                }
                for (i, &vertex) in ints.iter().enumerate() {
                    let weight = floats.get(i).copied().unwrap_or(floats[0]);
                    self.mesh.vertex_creases.push(vertex);
                    self.mesh.vertex_crease_weights.push(weight);
                }
            }
            "hole" => self.mesh.holes.extend(ints),
            other => log::debug!("ignoring OBJ tag '{}'", other),
        }
        Ok(())
    }
}

fn parse_number<T: std::str::FromStr>(token: Option<&str>, what: &str) -> std::result::Result<T, String> {
    let token = token.ok_or_else(|| format!("missing {}", what))?;
    token
        .parse()
        .map_err(|_| format!("invalid {} '{}'", what, token))
}
