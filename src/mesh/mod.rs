//! Core mesh data structures.
//!
//! This module provides the half-edge topology of a polygonal subdivision
//! control mesh and the lifecycle that keeps it in sync with its input
//! buffers.
//!
//! # Overview
//!
//! The primary type is [`SubdivMesh`], which owns the face, index, vertex and
//! crease buffers of one mesh and derives a [`Topology`] from them on
//! [`SubdivMesh::commit`]. The topology is a flat array of [`HalfEdge`]
//! records: each face owns a contiguous run of half-edges, linked around the
//! face by relative offsets and across edges by arena indices.
//!
//! # Index Types
//!
//! Mesh elements are identified by type-safe index wrappers:
//! - [`VertexId`] - Identifies a vertex
//! - [`HalfEdgeId`] - Identifies a half-edge
//! - [`FaceId`] - Identifies a face
//! - [`EdgeKey`] - Identifies an undirected edge by its two vertices
//!
//! # Construction
//!
//! ```
//! use std::sync::Arc;
//! use subdiv_mesh::mesh::{MeshSizes, SubdivMesh, TopologyOptions, VertexBuffer};
//! use subdiv_mesh::scene::{Scene, SceneFlags};
//!
//! let scene = Arc::new(Scene::new(SceneFlags::default()));
//! let mut mesh = SubdivMesh::new(scene, MeshSizes::new(2, 6, 4), TopologyOptions::default()).unwrap();
//! mesh.set_faces(vec![3, 3]).unwrap();
//! mesh.set_indices(vec![0, 1, 2, 2, 1, 3]).unwrap();
//! mesh.set_vertices(0, VertexBuffer::from_points(&[[0.0f32; 3]; 4]).unwrap()).unwrap();
//! mesh.commit().unwrap();
//!
//! assert_eq!(mesh.half_edges().len(), 6);
//! assert!(mesh.verify());
//! ```

mod buffer;
mod builder;
mod classify;
mod halfedge;
mod index;
mod index_maps;
mod interpolate;
mod options;
mod subdiv_mesh;
mod update;

pub use buffer::{BufferType, TrackedBuffer, VertexBuffer};
pub use classify::patch_type;
pub use halfedge::{HalfEdge, PatchType, RingIter, Topology, VertexType, MAX_EDGE_LEVEL, MIN_EDGE_LEVEL};
pub use index::{EdgeKey, FaceId, HalfEdgeId, VertexId, INVALID_INDEX};
pub use index_maps::{EdgeCreaseMap, HoleSet, VertexCreaseMap};
pub use interpolate::Interpolation;
pub use options::{BoundaryMode, TopologyOptions, DEFAULT_TESSELLATION_RATE};
pub use subdiv_mesh::{CommitPath, MeshSizes, PatchStats, SubdivMesh, MAX_COORDINATE, NUM_USER_BUFFERS};

#[cfg(test)]
pub(crate) mod test_meshes {
    //! Small control meshes shared by the unit tests.

    use std::sync::Arc;

    use super::{MeshSizes, SubdivMesh, TopologyOptions, VertexBuffer};
    use crate::scene::{Scene, SceneFlags};

    pub struct MeshData {
        pub positions: Vec<f32>,
        pub valences: Vec<u32>,
        pub indices: Vec<u32>,
    }

    /// Unit square in the xy plane.
    pub fn single_quad() -> MeshData {
        MeshData {
            positions: vec![
                0.0, 0.0, 0.0, //
                1.0, 0.0, 0.0, //
                1.0, 1.0, 0.0, //
                0.0, 1.0, 0.0,
            ],
            valences: vec![4],
            indices: vec![0, 1, 2, 3],
        }
    }

    /// Two triangles sharing edge 1-2 with matching winding.
    pub fn two_triangles() -> MeshData {
        MeshData {
            positions: vec![
                0.0, 0.0, 0.0, //
                1.0, 0.0, 0.0, //
                0.0, 1.0, 0.0, //
                1.0, 1.0, 0.0,
            ],
            valences: vec![3, 3],
            indices: vec![0, 1, 2, 2, 1, 3],
        }
    }

    /// Three triangles fanning out from edge 0-1.
    pub fn three_faces_sharing_edge() -> MeshData {
        MeshData {
            positions: vec![
                0.0, 0.0, 0.0, //
                1.0, 0.0, 0.0, //
                0.5, 1.0, 0.0, //
                0.5, -1.0, 0.0, //
                0.5, 0.0, 1.0,
            ],
            valences: vec![3, 3, 3],
            indices: vec![0, 1, 2, 1, 0, 3, 0, 1, 4],
        }
    }

    /// An `n` x `n` grid of unit quads. Vertex `(i, j)` has index
    /// `j * (n + 1) + i` and sits at `(i, j, 0)`; face `(i, j)` has index
    /// `j * n + i`.
    pub fn grid(n: u32) -> MeshData {
        let mut positions = Vec::new();
        for j in 0..=n {
            for i in 0..=n {
                positions.extend_from_slice(&[i as f32, j as f32, 0.0]);
            }
        }
        let mut indices = Vec::new();
        for j in 0..n {
            for i in 0..n {
                let v = |i: u32, j: u32| j * (n + 1) + i;
                indices.extend_from_slice(&[v(i, j), v(i + 1, j), v(i + 1, j + 1), v(i, j + 1)]);
            }
        }
        MeshData {
            positions,
            valences: vec![4; (n * n) as usize],
            indices,
        }
    }

    /// A mesh with all buffers of `data` set, not yet committed.
    pub fn with_scene(data: &MeshData, scene: Arc<Scene>, options: TopologyOptions) -> SubdivMesh {
        let sizes = MeshSizes::new(data.valences.len(), data.indices.len(), data.positions.len() / 3);
        let mut mesh = SubdivMesh::new(scene, sizes, options).unwrap();
        mesh.set_faces(data.valences.clone()).unwrap();
        mesh.set_indices(data.indices.clone()).unwrap();
        mesh.set_vertices(0, VertexBuffer::from_floats(data.positions.clone(), 3).unwrap())
            .unwrap();
        mesh
    }

    /// Like [`with_scene`] in a fresh interpolatable scene.
    pub fn uncommitted(data: &MeshData, options: TopologyOptions) -> SubdivMesh {
        let scene = Arc::new(Scene::new(SceneFlags::default().interpolatable()));
        with_scene(data, scene, options)
    }

    pub fn committed(data: &MeshData, options: TopologyOptions) -> SubdivMesh {
        let mut mesh = uncommitted(data, options);
        mesh.commit().unwrap();
        mesh
    }

    pub fn committed_grid(n: u32, options: TopologyOptions) -> SubdivMesh {
        committed(&grid(n), options)
    }
}
