//! The subdivision mesh and its commit lifecycle.
//!
//! A [`SubdivMesh`] owns the input buffers, the sparse index maps built from
//! them and the derived half-edge topology. Buffers are set through the
//! mesh, which tracks what changed; [`SubdivMesh::commit`] then picks the
//! cheapest way to bring the topology up to date:
//!
//! | changed buffers                      | path                  |
//! |--------------------------------------|-----------------------|
//! | index, face or hole                  | full rebuild          |
//! | crease or level (or rate, boundary)  | incremental update    |
//! | nothing, or vertex data only         | no topology work      |

use std::sync::Arc;
use std::time::Instant;

use super::buffer::{BufferType, TrackedBuffer, VertexBuffer};
use super::builder::{build_topology, BuildInput, SortScratch};
use super::halfedge::{HalfEdge, PatchType, Topology};
use super::index::{FaceId, HalfEdgeId, VertexId};
use super::index_maps::{EdgeCreaseMap, HoleSet, VertexCreaseMap};
use super::options::{validate_tessellation_rate, BoundaryMode, TopologyOptions};
use super::update::{update_half_edges, UpdateFlags, UpdateInput};
use crate::algo::exclusive_prefix_sum;
use crate::error::{Result, SubdivError};
use crate::eval::{BilinearEvaluator, PatchCache, PatchEvaluator};
use crate::scene::Scene;

/// Largest vertex component magnitude considered valid.
pub const MAX_COORDINATE: f32 = 1.844e18;

/// Number of optional user vertex buffers.
pub const NUM_USER_BUFFERS: usize = 2;

/// Declared element counts of a mesh.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MeshSizes {
    /// Number of faces (length of the face buffer).
    pub faces: usize,
    /// Number of face-vertex indices (length of the index and level buffers).
    pub indices: usize,
    /// Number of vertices per vertex buffer.
    pub vertices: usize,
    /// Number of vertex buffers (motion blur time steps).
    pub time_steps: usize,
}

impl MeshSizes {
    /// Sizes for a mesh with a single time step.
    pub fn new(faces: usize, indices: usize, vertices: usize) -> Self {
        Self {
            faces,
            indices,
            vertices,
            time_steps: 1,
        }
    }

    /// Set the number of time steps.
    pub fn with_time_steps(mut self, time_steps: usize) -> Self {
        self.time_steps = time_steps;
        self
    }
}

/// What a commit did to the topology.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitPath {
    /// Half-edges were rebuilt from scratch.
    Rebuild,
    /// Derived fields were refreshed in place.
    Update,
    /// The topology was left as is.
    Unchanged,
}

/// Face counts per patch type.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PatchStats {
    /// Faces on the regular B-spline fast path.
    pub regular: usize,
    /// Quads that need irregular evaluation.
    pub irregular: usize,
    /// Faces of any other valence.
    pub complex: usize,
}

impl PatchStats {
    /// Total number of faces counted.
    pub fn total(&self) -> usize {
        self.regular + self.irregular + self.complex
    }

    /// Percentage of `count` among all faces.
    pub fn percent(&self, count: usize) -> f64 {
        if self.total() == 0 {
            0.0
        } else {
            100.0 * count as f64 / self.total() as f64
        }
    }
}

/// A polygonal control mesh with a half-edge topology for subdivision.
#[derive(Debug)]
pub struct SubdivMesh {
    scene: Arc<Scene>,
    options: TopologyOptions,
    sizes: MeshSizes,

    // Input buffers
    faces: TrackedBuffer<u32>,
    indices: TrackedBuffer<u32>,
    vertices: Vec<VertexBuffer>,
    user_buffers: [Option<VertexBuffer>; NUM_USER_BUFFERS],
    holes: TrackedBuffer<u32>,
    edge_crease_indices: TrackedBuffer<[u32; 2]>,
    edge_crease_weights: TrackedBuffer<f32>,
    vertex_crease_indices: TrackedBuffer<u32>,
    vertex_crease_weights: TrackedBuffer<f32>,
    levels: TrackedBuffer<f32>,

    // Index maps
    hole_set: HoleSet,
    edge_crease_map: EdgeCreaseMap,
    vertex_crease_map: VertexCreaseMap,

    // Derived state
    face_start_edge: Vec<u32>,
    num_half_edges: usize,
    topology: Topology,
    scratch: SortScratch,
    invalid_faces: Vec<bool>,
    level_update: bool,
    committed: bool,

    // Interpolation
    pub(crate) vertex_caches: Vec<PatchCache>,
    pub(crate) user_caches: [PatchCache; NUM_USER_BUFFERS],
    pub(crate) evaluator: Arc<dyn PatchEvaluator>,
}

impl SubdivMesh {
    /// Create an empty mesh in `scene`.
    ///
    /// All buffers start out unset and modified, so the first commit always
    /// rebuilds.
    pub fn new(scene: Arc<Scene>, sizes: MeshSizes, options: TopologyOptions) -> Result<Self> {
        options.validate()?;
        if sizes.time_steps == 0 {
            return Err(SubdivError::invalid_param(
                "time_steps",
                sizes.time_steps,
                "must be at least 1",
            ));
        }
        let vertices = (0..sizes.time_steps)
            .map(|_| VertexBuffer::new(3))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            scene,
            options,
            sizes,
            faces: TrackedBuffer::new(),
            indices: TrackedBuffer::new(),
            vertex_caches: (0..sizes.time_steps).map(|_| PatchCache::default()).collect(),
            vertices,
            user_buffers: [None, None],
            holes: TrackedBuffer::new(),
            edge_crease_indices: TrackedBuffer::new(),
            edge_crease_weights: TrackedBuffer::new(),
            vertex_crease_indices: TrackedBuffer::new(),
            vertex_crease_weights: TrackedBuffer::new(),
            levels: TrackedBuffer::new(),
            hole_set: HoleSet::default(),
            edge_crease_map: EdgeCreaseMap::default(),
            vertex_crease_map: VertexCreaseMap::default(),
            face_start_edge: Vec::new(),
            num_half_edges: 0,
            topology: Topology::default(),
            scratch: SortScratch::default(),
            invalid_faces: Vec::new(),
            level_update: false,
            committed: false,
            user_caches: [PatchCache::default(), PatchCache::default()],
            evaluator: Arc::new(BilinearEvaluator),
        })
    }

    /// Replace the patch evaluator used by interpolation.
    pub fn with_evaluator(mut self, evaluator: Arc<dyn PatchEvaluator>) -> Self {
        self.evaluator = evaluator;
        self
    }

    // ==================== Accessors ====================

    /// The owning scene.
    pub fn scene(&self) -> &Arc<Scene> {
        &self.scene
    }

    /// Declared element counts.
    pub fn sizes(&self) -> MeshSizes {
        self.sizes
    }

    /// Current options.
    pub fn options(&self) -> &TopologyOptions {
        &self.options
    }

    /// Number of faces.
    pub fn num_faces(&self) -> usize {
        self.sizes.faces
    }

    /// Number of vertices per vertex buffer.
    pub fn num_vertices(&self) -> usize {
        self.sizes.vertices
    }

    /// Number of time steps.
    pub fn num_time_steps(&self) -> usize {
        self.sizes.time_steps
    }

    /// Whether at least one commit completed.
    pub fn is_committed(&self) -> bool {
        self.committed
    }

    /// The committed topology.
    pub fn topology(&self) -> &Topology {
        &self.topology
    }

    /// The committed half-edge array.
    pub fn half_edges(&self) -> &[HalfEdge] {
        self.topology.half_edges()
    }

    /// First half-edge of every face.
    pub fn face_start_edges(&self) -> &[u32] {
        self.topology.face_start_edges()
    }

    /// Vertex buffer of time step `t`.
    pub fn vertex_buffer(&self, t: usize) -> Option<&VertexBuffer> {
        self.vertices.get(t)
    }

    /// User vertex buffer `slot`, if set.
    pub fn user_buffer(&self, slot: usize) -> Option<&VertexBuffer> {
        self.user_buffers.get(slot)?.as_ref()
    }

    /// Whether the last commit only changed tessellation levels of a mesh
    /// without creases, so structures built over the previous topology can
    /// be refitted instead of rebuilt.
    pub fn level_update(&self) -> bool {
        self.level_update
    }

    /// Whether face `f` must be skipped at time step `t`.
    ///
    /// Hole faces and faces referencing missing or non-finite vertices are
    /// invalid. Out-of-range queries report `true`.
    pub fn is_invalid_face(&self, f: usize, t: usize) -> bool {
        if t >= self.sizes.time_steps {
            return true;
        }
        self.invalid_faces
            .get(f * self.sizes.time_steps + t)
            .copied()
            .unwrap_or(true)
    }

    /// Count faces per patch type.
    pub fn patch_stats(&self) -> PatchStats {
        let mut stats = PatchStats::default();
        let edges = self.topology.half_edges();
        for &start in self.topology.face_start_edges() {
            match edges.get(start as usize).map(|e| e.patch_type) {
                Some(PatchType::RegularQuad) => stats.regular += 1,
                Some(PatchType::IrregularQuad) => stats.irregular += 1,
                _ => stats.complex += 1,
            }
        }
        stats
    }

    // ==================== Buffer setters ====================

    fn check_mutable(&self) -> Result<()> {
        if self.scene.is_frozen() {
            return Err(SubdivError::StaticSceneModified);
        }
        Ok(())
    }

    fn touched(&self, buffer: BufferType) {
        if buffer.bumps_generation() {
            self.scene.bump_generation();
        }
    }

    fn check_len(buffer: BufferType, expected: usize, actual: usize) -> Result<()> {
        if expected != actual {
            return Err(SubdivError::InvalidBufferSize {
                buffer,
                expected,
                actual,
            });
        }
        Ok(())
    }

    /// Set the per-face valences.
    pub fn set_faces(&mut self, valences: Vec<u32>) -> Result<()> {
        self.check_mutable()?;
        Self::check_len(BufferType::Face, self.sizes.faces, valences.len())?;
        self.faces.set(valences);
        self.touched(BufferType::Face);
        Ok(())
    }

    /// Set the face-vertex indices.
    pub fn set_indices(&mut self, indices: Vec<u32>) -> Result<()> {
        self.check_mutable()?;
        Self::check_len(BufferType::Index, self.sizes.indices, indices.len())?;
        self.indices.set(indices);
        self.touched(BufferType::Index);
        Ok(())
    }

    /// Set the vertex buffer of time step `t`.
    pub fn set_vertices(&mut self, t: usize, vertices: VertexBuffer) -> Result<()> {
        self.check_mutable()?;
        let buffer = BufferType::Vertex(t);
        if t >= self.sizes.time_steps {
            return Err(SubdivError::UnknownBuffer(buffer));
        }
        Self::check_len(buffer, self.sizes.vertices, vertices.len())?;
        let mut vertices = vertices;
        vertices.set_modified(true);
        self.vertices[t] = vertices;
        self.touched(buffer);
        Ok(())
    }

    /// Set user vertex buffer `slot` (0 or 1). Any stride is accepted.
    pub fn set_user_buffer(&mut self, slot: usize, data: VertexBuffer) -> Result<()> {
        self.check_mutable()?;
        let buffer = BufferType::User(slot);
        if slot >= NUM_USER_BUFFERS {
            return Err(SubdivError::UnknownBuffer(buffer));
        }
        Self::check_len(buffer, self.sizes.vertices, data.len())?;
        let mut data = data;
        data.set_modified(true);
        self.user_buffers[slot] = Some(data);
        self.touched(buffer);
        Ok(())
    }

    /// Set the list of hole faces.
    pub fn set_holes(&mut self, holes: Vec<u32>) -> Result<()> {
        self.check_mutable()?;
        self.holes.set(holes);
        self.touched(BufferType::Hole);
        Ok(())
    }

    /// Set creased edges as vertex pairs with one weight each.
    pub fn set_edge_creases(&mut self, edges: Vec<[u32; 2]>, weights: Vec<f32>) -> Result<()> {
        self.check_mutable()?;
        Self::check_len(BufferType::EdgeCreaseWeight, edges.len(), weights.len())?;
        self.edge_crease_indices.set(edges);
        self.edge_crease_weights.set(weights);
        self.touched(BufferType::EdgeCreaseIndex);
        Ok(())
    }

    /// Set creased vertices with one weight each.
    pub fn set_vertex_creases(&mut self, vertices: Vec<u32>, weights: Vec<f32>) -> Result<()> {
        self.check_mutable()?;
        Self::check_len(BufferType::VertexCreaseWeight, vertices.len(), weights.len())?;
        self.vertex_crease_indices.set(vertices);
        self.vertex_crease_weights.set(weights);
        self.touched(BufferType::VertexCreaseIndex);
        Ok(())
    }

    /// Set per-half-edge tessellation levels. An empty buffer falls back to
    /// the tessellation rate.
    pub fn set_levels(&mut self, levels: Vec<f32>) -> Result<()> {
        self.check_mutable()?;
        if !levels.is_empty() {
            Self::check_len(BufferType::Level, self.sizes.indices, levels.len())?;
        }
        self.levels.set(levels);
        Ok(())
    }

    /// Set any buffer from raw bytes.
    ///
    /// `stride` is the number of floats per vertex and only used for vertex
    /// and user buffers. Data must be 4-byte aligned.
    pub fn set_buffer_bytes(&mut self, buffer: BufferType, bytes: &[u8], stride: usize) -> Result<()> {
        self.check_mutable()?;
        let layout = |e: bytemuck::PodCastError| SubdivError::InvalidBufferLayout {
            buffer,
            reason: e.to_string(),
        };

        match buffer {
            BufferType::Vertex(t) => {
                let floats: &[f32] = bytemuck::try_cast_slice(bytes).map_err(layout)?;
                self.set_vertices(t, VertexBuffer::from_floats(floats.to_vec(), stride)?)
            }
            BufferType::User(slot) => {
                let floats: &[f32] = bytemuck::try_cast_slice(bytes).map_err(layout)?;
                self.set_user_buffer(slot, VertexBuffer::from_floats(floats.to_vec(), stride)?)
            }
            BufferType::Face => {
                let data: &[u32] = bytemuck::try_cast_slice(bytes).map_err(layout)?;
                self.set_faces(data.to_vec())
            }
            BufferType::Index => {
                let data: &[u32] = bytemuck::try_cast_slice(bytes).map_err(layout)?;
                self.set_indices(data.to_vec())
            }
            BufferType::Level => {
                let data: &[f32] = bytemuck::try_cast_slice(bytes).map_err(layout)?;
                self.set_levels(data.to_vec())
            }
            BufferType::Hole => {
                self.holes.set_bytes(bytes).map_err(layout)?;
                self.touched(buffer);
                Ok(())
            }
            BufferType::EdgeCreaseIndex => {
                self.edge_crease_indices.set_bytes(bytes).map_err(layout)?;
                self.touched(buffer);
                Ok(())
            }
            BufferType::EdgeCreaseWeight => {
                self.edge_crease_weights.set_bytes(bytes).map_err(layout)?;
                self.touched(buffer);
                Ok(())
            }
            BufferType::VertexCreaseIndex => {
                self.vertex_crease_indices.set_bytes(bytes).map_err(layout)?;
                self.touched(buffer);
                Ok(())
            }
            BufferType::VertexCreaseWeight => {
                self.vertex_crease_weights.set_bytes(bytes).map_err(layout)?;
                self.touched(buffer);
                Ok(())
            }
        }
    }

    /// Mark one buffer as modified after its contents were changed in place.
    pub fn update_buffer(&mut self, buffer: BufferType) -> Result<()> {
        self.check_mutable()?;
        match buffer {
            BufferType::Vertex(t) => self
                .vertices
                .get_mut(t)
                .ok_or(SubdivError::UnknownBuffer(buffer))?
                .set_modified(true),
            BufferType::User(slot) => self
                .user_buffers
                .get_mut(slot)
                .ok_or(SubdivError::UnknownBuffer(buffer))?
                .as_mut()
                .ok_or(SubdivError::UnsetBuffer(buffer))?
                .set_modified(true),
            BufferType::Index => self.indices.set_modified(true),
            BufferType::Face => self.faces.set_modified(true),
            BufferType::Hole => self.holes.set_modified(true),
            BufferType::EdgeCreaseIndex => self.edge_crease_indices.set_modified(true),
            BufferType::EdgeCreaseWeight => self.edge_crease_weights.set_modified(true),
            BufferType::VertexCreaseIndex => self.vertex_crease_indices.set_modified(true),
            BufferType::VertexCreaseWeight => self.vertex_crease_weights.set_modified(true),
            BufferType::Level => self.levels.set_modified(true),
        }
        self.touched(buffer);
        Ok(())
    }

    /// Mark every buffer as modified.
    pub fn update(&mut self) -> Result<()> {
        self.check_mutable()?;
        self.faces.set_modified(true);
        self.indices.set_modified(true);
        self.holes.set_modified(true);
        for buffer in &mut self.vertices {
            buffer.set_modified(true);
        }
        self.edge_crease_indices.set_modified(true);
        self.edge_crease_weights.set_modified(true);
        self.vertex_crease_indices.set_modified(true);
        self.vertex_crease_weights.set_modified(true);
        self.levels.set_modified(true);
        self.scene.bump_generation();
        Ok(())
    }

    /// Mutable access to the vertices of time step `t`. Marks the buffer
    /// modified.
    pub fn vertices_mut(&mut self, t: usize) -> Result<&mut VertexBuffer> {
        self.check_mutable()?;
        let buffer = BufferType::Vertex(t);
        if t >= self.vertices.len() {
            return Err(SubdivError::UnknownBuffer(buffer));
        }
        self.touched(buffer);
        let vertices = self.vertices.get_mut(t).ok_or(SubdivError::UnknownBuffer(buffer))?;
        vertices.set_modified(true);
        Ok(vertices)
    }

    /// Set the global tessellation rate.
    pub fn set_tessellation_rate(&mut self, rate: f32) -> Result<()> {
        self.check_mutable()?;
        validate_tessellation_rate(rate)?;
        self.options.tessellation_rate = rate;
        self.levels.set_modified(true);
        Ok(())
    }

    /// Change the boundary mode. Vertex creases are recomputed on the next
    /// commit.
    pub fn set_boundary_mode(&mut self, mode: BoundaryMode) -> Result<()> {
        self.check_mutable()?;
        if self.options.boundary == mode {
            return Ok(());
        }
        self.options.boundary = mode;
        self.update_buffer(BufferType::VertexCreaseWeight)
    }

    /// Release input buffers that are no longer needed once the scene is
    /// built. Vertex and index data survive for interpolatable scenes.
    pub fn immutable(&mut self) {
        let keep = self.scene.is_interpolatable();
        self.faces.free();
        if !keep {
            self.indices.free();
            for buffer in &mut self.vertices {
                buffer.free();
            }
        }
        self.edge_crease_indices.free();
        self.edge_crease_weights.free();
        self.vertex_crease_indices.free();
        self.vertex_crease_weights.free();
        self.levels.free();
        self.holes.free();
    }

    // ==================== Commit ====================

    /// Bring the topology up to date with the buffers.
    ///
    /// Index, face or hole changes rebuild every half-edge; crease and level
    /// changes refresh derived fields in place. Afterwards every modification
    /// flag is cleared.
    pub fn commit(&mut self) -> Result<CommitPath> {
        let start = Instant::now();

        if self.faces.is_modified() {
            self.num_half_edges = exclusive_prefix_sum(
                self.faces.as_slice(),
                &mut self.face_start_edge,
                self.options.block_size,
                self.options.parallel,
            );
        }

        if self.holes.is_modified() {
            self.hole_set = HoleSet::from_faces(self.holes.as_slice());
        }
        let vertex_creases_modified =
            self.vertex_crease_indices.is_modified() || self.vertex_crease_weights.is_modified();
        if vertex_creases_modified {
            self.vertex_crease_map = VertexCreaseMap::from_buffers(
                self.vertex_crease_indices.as_slice(),
                self.vertex_crease_weights.as_slice(),
            );
        }
        let edge_creases_modified =
            self.edge_crease_indices.is_modified() || self.edge_crease_weights.is_modified();
        if edge_creases_modified {
            self.edge_crease_map = EdgeCreaseMap::from_buffers(
                self.edge_crease_indices.as_slice(),
                self.edge_crease_weights.as_slice(),
            );
        }

        let recalculate =
            self.indices.is_modified() || self.faces.is_modified() || self.holes.is_modified();
        let flags = UpdateFlags {
            levels: self.levels.is_modified(),
            edge_creases: edge_creases_modified,
            vertex_creases: vertex_creases_modified,
        };
        self.level_update = !recalculate
            && self.edge_crease_indices.is_empty()
            && self.vertex_crease_indices.is_empty()
            && self.levels.is_modified();

        let path = if recalculate {
            let input = BuildInput {
                face_valences: self.faces.as_slice(),
                vertex_indices: self.indices.as_slice(),
                levels: self.levels.as_slice(),
                holes: &self.hole_set,
                edge_creases: &self.edge_crease_map,
                vertex_creases: &self.vertex_crease_map,
                options: &self.options,
            };
            self.topology = build_topology(
                &input,
                self.face_start_edge.clone(),
                self.num_half_edges,
                &mut self.scratch,
            );
            CommitPath::Rebuild
        } else if flags.any() {
            // no rebuild expected from here on
            self.scratch.clear();
            let input = UpdateInput {
                levels: self.levels.as_slice(),
                edge_creases: &self.edge_crease_map,
                vertex_creases: &self.vertex_crease_map,
                options: &self.options,
            };
            update_half_edges(&mut self.topology, &input, flags);
            CommitPath::Update
        } else {
            CommitPath::Unchanged
        };
        // slots refilled between a buffer edit and this commit saw the old
        // half-edges under the new generation
        if recalculate || flags.creases() {
            self.scene.bump_generation();
        }
        log::trace!("commit path {:?}, level update {}", path, self.level_update);

        if recalculate || self.vertices.iter().any(|b| b.is_modified()) {
            self.compute_invalid_faces();
        }

        if self.scene.is_interpolatable() {
            let num_faces = self.topology.num_faces();
            for (cache, buffer) in self.vertex_caches.iter_mut().zip(&self.vertices) {
                cache.resize(num_faces, buffer.stride());
            }
            for (cache, buffer) in self.user_caches.iter_mut().zip(&self.user_buffers) {
                match buffer {
                    Some(buffer) => cache.resize(num_faces, buffer.stride()),
                    None => cache.clear(),
                }
            }
        }

        if self.scene.is_static() {
            self.hole_set.clear();
            self.edge_crease_map.clear();
            self.vertex_crease_map.clear();
            self.scratch.clear();
        }

        self.clear_modified();
        self.committed = true;
        self.scene.mark_built();

        if path == CommitPath::Rebuild {
            let elapsed = start.elapsed().as_secs_f64();
            let stats = self.patch_stats();
            log::debug!(
                "half edge generation = {:.3}ms, {:.2}M/s",
                1000.0 * elapsed,
                1e-6 * self.num_half_edges as f64 / elapsed.max(f64::EPSILON)
            );
            log::debug!(
                "faces = {}, regular = {} ({:.1}%), irregular = {} ({:.1}%), complex = {} ({:.1}%)",
                stats.total(),
                stats.regular,
                stats.percent(stats.regular),
                stats.irregular,
                stats.percent(stats.irregular),
                stats.complex,
                stats.percent(stats.complex)
            );
        }

        Ok(path)
    }

    fn clear_modified(&mut self) {
        self.faces.set_modified(false);
        self.indices.set_modified(false);
        self.holes.set_modified(false);
        for buffer in &mut self.vertices {
            buffer.set_modified(false);
        }
        for buffer in self.user_buffers.iter_mut().flatten() {
            buffer.set_modified(false);
        }
        self.edge_crease_indices.set_modified(false);
        self.edge_crease_weights.set_modified(false);
        self.vertex_crease_indices.set_modified(false);
        self.vertex_crease_weights.set_modified(false);
        self.levels.set_modified(false);
    }

    fn compute_invalid_faces(&mut self) {
        let steps = self.sizes.time_steps;
        let num_faces = self.topology.num_faces();
        let mut invalid = vec![false; num_faces * steps];
        for f in 0..num_faces {
            let hole = self.hole_set.contains(f as u32);
            for (t, vertices) in self.vertices.iter().enumerate() {
                invalid[f * steps + t] = hole || !face_is_valid(&self.topology, FaceId::new(f), vertices);
            }
        }
        self.invalid_faces = invalid;
    }

    // ==================== Verification ====================

    /// Check the input buffers for consistency.
    ///
    /// Every time step must have the same number of vertices, every face's
    /// indices must lie inside the index buffer and reference an existing
    /// vertex, and every vertex component must be finite and within
    /// [`MAX_COORDINATE`]. Violations are reported, never fatal.
    pub fn verify(&self) -> bool {
        let Some(first) = self.vertices.first() else {
            return false;
        };
        if self.vertices.iter().any(|b| b.len() != first.len()) {
            return false;
        }

        let num_vertices = self.sizes.vertices;
        let indices = self.indices.as_slice();
        let mut offset = 0usize;
        for &valence in self.faces.as_slice() {
            let end = offset + valence as usize;
            if end > indices.len() {
                return false;
            }
            if indices[offset..end].iter().any(|&v| v as usize >= num_vertices) {
                return false;
            }
            offset = end;
        }

        self.vertices
            .iter()
            .all(|buffer| buffer.as_slice().iter().all(|&x| is_valid_component(x)))
    }
}

#[inline]
fn is_valid_component(x: f32) -> bool {
    x.is_finite() && x.abs() < MAX_COORDINATE
}

fn is_valid_vertex(vertices: &VertexBuffer, vertex: VertexId) -> bool {
    vertex.is_valid()
        && vertices
            .vertex(vertex.index())
            .is_some_and(|p| p.iter().all(|&x| is_valid_component(x)))
}

/// Whether every vertex of the face and of its edge neighbours is usable.
fn face_is_valid(topology: &Topology, face: FaceId, vertices: &VertexBuffer) -> bool {
    topology.face_range(face).all(|i| {
        let he = HalfEdgeId::new(i);
        is_valid_vertex(vertices, topology.origin(he))
            && topology.opposite(he).map_or(true, |o| {
                topology
                    .ring(o)
                    .all(|n| is_valid_vertex(vertices, topology.origin(n)))
            })
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::test_meshes::{self, MeshData};
    use crate::mesh::VertexType;
    use crate::scene::SceneFlags;

    fn new_mesh(data: &MeshData, flags: SceneFlags) -> SubdivMesh {
        test_meshes::with_scene(data, Arc::new(Scene::new(flags)), TopologyOptions::default())
    }

    #[test]
    fn test_single_quad_is_all_boundary() {
        let mesh = test_meshes::committed(&test_meshes::single_quad(), TopologyOptions::default());
        assert_eq!(mesh.half_edges().len(), 4);
        for edge in mesh.half_edges() {
            assert!(!edge.has_opposite());
            assert_eq!(edge.edge_crease_weight, f32::INFINITY);
        }
        // each corner has a single face but is not sharp
        assert_eq!(mesh.half_edges()[0].patch_type, PatchType::IrregularQuad);
        assert!(mesh.verify());
    }

    #[test]
    fn test_single_quad_with_sharp_corners_is_regular() {
        let options = TopologyOptions::default().with_boundary(BoundaryMode::EdgeAndCorner);
        let mesh = test_meshes::committed(&test_meshes::single_quad(), options);
        for edge in mesh.half_edges() {
            assert_eq!(edge.vertex_crease_weight, f32::INFINITY);
            assert_eq!(edge.patch_type, PatchType::RegularQuad);
        }
    }

    #[test]
    fn test_commit_paths() {
        let data = test_meshes::grid(3);
        let mut mesh = test_meshes::uncommitted(&data, TopologyOptions::default());
        assert!(!mesh.is_committed());
        assert_eq!(mesh.commit().unwrap(), CommitPath::Rebuild);
        assert_eq!(mesh.commit().unwrap(), CommitPath::Unchanged);

        mesh.set_vertex_creases(vec![5], vec![2.0]).unwrap();
        assert_eq!(mesh.commit().unwrap(), CommitPath::Update);
        assert!(!mesh.level_update());

        mesh.update_buffer(BufferType::Index).unwrap();
        assert_eq!(mesh.commit().unwrap(), CommitPath::Rebuild);

        mesh.set_boundary_mode(BoundaryMode::EdgeAndCorner).unwrap();
        assert_eq!(mesh.commit().unwrap(), CommitPath::Update);
        assert_eq!(mesh.half_edges()[0].vertex_crease_weight, f32::INFINITY);

        mesh.update().unwrap();
        assert_eq!(mesh.commit().unwrap(), CommitPath::Rebuild);
    }

    #[test]
    fn test_level_only_update() {
        let data = test_meshes::grid(3);
        let mut mesh = test_meshes::uncommitted(&data, TopologyOptions::default());
        mesh.commit().unwrap();
        let before = mesh.topology().clone();

        mesh.set_levels(vec![5.0; data.indices.len()]).unwrap();
        assert_eq!(mesh.commit().unwrap(), CommitPath::Update);
        assert!(mesh.level_update());

        for (a, b) in mesh.half_edges().iter().zip(before.half_edges()) {
            assert_eq!(a.edge_level, 5.0);
            assert_eq!(a.opposite, b.opposite);
            assert_eq!(a.patch_type, b.patch_type);
            assert_eq!(a.edge_crease_weight, b.edge_crease_weight);
            assert_eq!(a.vertex_crease_weight, b.vertex_crease_weight);
        }
        assert_eq!(mesh.face_start_edges(), before.face_start_edges());

        mesh.set_tessellation_rate(3.0).unwrap();
        mesh.set_levels(Vec::new()).unwrap();
        mesh.commit().unwrap();
        assert!(mesh.level_update());
        assert!(mesh.half_edges().iter().all(|e| e.edge_level == 3.0));

        // creased meshes never take the level-only path
        mesh.set_vertex_creases(vec![0], vec![1.0]).unwrap();
        mesh.commit().unwrap();
        mesh.set_tessellation_rate(4.0).unwrap();
        assert_eq!(mesh.commit().unwrap(), CommitPath::Update);
        assert!(!mesh.level_update());
    }

    #[test]
    fn test_rebuild_is_bit_identical() {
        let data = test_meshes::grid(5);
        let mut mesh = test_meshes::uncommitted(&data, TopologyOptions::default());
        mesh.set_edge_creases(vec![[7, 8]], vec![1.5]).unwrap();
        mesh.commit().unwrap();
        let first = mesh.topology().clone();

        mesh.update().unwrap();
        mesh.commit().unwrap();
        for (a, b) in mesh.half_edges().iter().zip(first.half_edges()) {
            assert!(a.bitwise_eq(b));
        }

        let sequential = test_meshes::committed(&data, TopologyOptions::default().sequential().with_block_size(1));
        let parallel = test_meshes::committed(&data, TopologyOptions::default().with_block_size(4));
        assert_eq!(sequential.half_edges(), parallel.half_edges());
    }

    #[test]
    fn test_static_scene_rejects_modification() {
        let data = test_meshes::grid(2);
        let mut mesh = new_mesh(&data, SceneFlags::default().static_scene());
        mesh.commit().unwrap();

        let before = mesh.topology().clone();
        assert!(matches!(mesh.set_holes(vec![0]), Err(SubdivError::StaticSceneModified)));
        assert!(matches!(mesh.update(), Err(SubdivError::StaticSceneModified)));
        assert!(matches!(
            mesh.set_tessellation_rate(4.0),
            Err(SubdivError::StaticSceneModified)
        ));
        assert!(matches!(
            mesh.set_boundary_mode(BoundaryMode::EdgeAndCorner),
            Err(SubdivError::StaticSceneModified)
        ));
        assert_eq!(mesh.half_edges(), before.half_edges());
        assert!(mesh.scratch.is_empty());
        assert!(mesh.hole_set.is_empty());

        mesh.immutable();
        assert!(mesh.vertex_buffer(0).unwrap().is_empty());
        assert_eq!(mesh.half_edges().len(), data.indices.len());
    }

    #[test]
    fn test_setters_check_sizes() {
        let data = test_meshes::single_quad();
        let mut mesh = test_meshes::uncommitted(&data, TopologyOptions::default());
        assert!(matches!(
            mesh.set_faces(vec![4, 4]),
            Err(SubdivError::InvalidBufferSize { expected: 1, actual: 2, .. })
        ));
        assert!(matches!(
            mesh.set_vertices(1, VertexBuffer::new(3).unwrap()),
            Err(SubdivError::UnknownBuffer(BufferType::Vertex(1)))
        ));
        assert!(matches!(
            mesh.set_user_buffer(2, VertexBuffer::new(3).unwrap()),
            Err(SubdivError::UnknownBuffer(BufferType::User(2)))
        ));
        assert!(mesh.set_edge_creases(vec![[0, 1]], vec![]).is_err());
        assert!(mesh.set_levels(vec![1.0; 3]).is_err());
    }

    #[test]
    fn test_set_buffer_bytes() {
        let data = test_meshes::single_quad();
        let mut mesh = test_meshes::uncommitted(&data, TopologyOptions::default());
        let indices: Vec<u32> = vec![3, 2, 1, 0];
        mesh.set_buffer_bytes(BufferType::Index, bytemuck::cast_slice(&indices), 0)
            .unwrap();
        let positions: Vec<f32> = vec![0.0; 16];
        mesh.set_buffer_bytes(BufferType::Vertex(0), bytemuck::cast_slice(&positions), 4)
            .unwrap();
        assert_eq!(mesh.vertex_buffer(0).unwrap().stride(), 4);
        mesh.commit().unwrap();
        assert_eq!(mesh.topology().origin(HalfEdgeId::new(0)).index(), 3);

        let creases: Vec<u32> = vec![0, 1, 1];
        assert!(matches!(
            mesh.set_buffer_bytes(BufferType::EdgeCreaseIndex, bytemuck::cast_slice(&creases), 0),
            Err(SubdivError::InvalidBufferLayout { .. })
        ));
    }

    #[test]
    fn test_generation_tracks_non_level_buffers() {
        let data = test_meshes::single_quad();
        let mut mesh = test_meshes::uncommitted(&data, TopologyOptions::default());
        let generation = mesh.scene().generation();
        mesh.set_levels(vec![2.0; 4]).unwrap();
        mesh.update_buffer(BufferType::Level).unwrap();
        assert_eq!(mesh.scene().generation(), generation);
        mesh.set_holes(vec![]).unwrap();
        assert_eq!(mesh.scene().generation(), generation + 1);
        mesh.vertices_mut(0).unwrap().vertex_mut(0).unwrap()[0] = 0.5;
        assert_eq!(mesh.scene().generation(), generation + 2);

        // rejected calls leave the generation alone
        assert!(matches!(mesh.vertices_mut(1), Err(SubdivError::UnknownBuffer(_))));
        assert!(matches!(
            mesh.update_buffer(BufferType::User(0)),
            Err(SubdivError::UnsetBuffer(BufferType::User(0)))
        ));
        assert!(matches!(
            mesh.update_buffer(BufferType::User(2)),
            Err(SubdivError::UnknownBuffer(BufferType::User(2)))
        ));
        assert_eq!(mesh.scene().generation(), generation + 2);
    }

    #[test]
    fn test_commit_advances_generation_on_topology_change() {
        let data = test_meshes::single_quad();
        let mut mesh = test_meshes::committed(&data, TopologyOptions::default());

        let generation = mesh.scene().generation();
        mesh.set_levels(vec![3.0; 4]).unwrap();
        assert_eq!(mesh.commit().unwrap(), CommitPath::Update);
        assert_eq!(mesh.scene().generation(), generation);

        mesh.set_edge_creases(vec![[0, 1]], vec![2.0]).unwrap();
        assert_eq!(mesh.scene().generation(), generation + 1);
        assert_eq!(mesh.commit().unwrap(), CommitPath::Update);
        assert_eq!(mesh.scene().generation(), generation + 2);

        mesh.set_indices(vec![1, 2, 3, 0]).unwrap();
        assert_eq!(mesh.commit().unwrap(), CommitPath::Rebuild);
        assert_eq!(mesh.scene().generation(), generation + 4);

        assert_eq!(mesh.commit().unwrap(), CommitPath::Unchanged);
        assert_eq!(mesh.scene().generation(), generation + 4);
    }

    #[test]
    fn test_update_buffer_marks_user_buffer() {
        let data = test_meshes::single_quad();
        let mut mesh = test_meshes::uncommitted(&data, TopologyOptions::default());
        mesh.set_user_buffer(0, VertexBuffer::from_floats(vec![1.0; 4], 1).unwrap())
            .unwrap();
        assert!(mesh.user_buffer(0).unwrap().is_modified());
        mesh.commit().unwrap();
        assert!(!mesh.user_buffer(0).unwrap().is_modified());

        let generation = mesh.scene().generation();
        mesh.update_buffer(BufferType::User(0)).unwrap();
        assert!(mesh.user_buffer(0).unwrap().is_modified());
        assert_eq!(mesh.scene().generation(), generation + 1);
    }

    #[test]
    fn test_invalid_faces_per_time_step() {
        let data = test_meshes::grid(2);
        let scene = Arc::new(Scene::new(SceneFlags::default()));
        let sizes = MeshSizes::new(4, data.indices.len(), data.positions.len() / 3).with_time_steps(2);
        let mut mesh = SubdivMesh::new(scene, sizes, TopologyOptions::default()).unwrap();
        mesh.set_faces(data.valences.clone()).unwrap();
        mesh.set_indices(data.indices.clone()).unwrap();
        mesh.set_vertices(0, VertexBuffer::from_floats(data.positions.clone(), 3).unwrap())
            .unwrap();
        let mut moved = data.positions.clone();
        // vertex 8 is the far corner, used by face 3 only
        moved[8 * 3] = f32::NAN;
        mesh.set_vertices(1, VertexBuffer::from_floats(moved, 3).unwrap()).unwrap();
        mesh.set_holes(vec![0]).unwrap();
        mesh.commit().unwrap();

        assert!(mesh.is_invalid_face(0, 0));
        assert!(mesh.is_invalid_face(0, 1));
        assert!(!mesh.is_invalid_face(3, 0));
        assert!(mesh.is_invalid_face(3, 1));
        // face 1 shares an edge with face 3
        assert!(mesh.is_invalid_face(1, 1));
        assert!(!mesh.is_invalid_face(1, 0));
        assert!(mesh.is_invalid_face(4, 0));
        assert!(!mesh.verify());

        // fixing the vertex without touching topology refreshes the flags
        mesh.vertices_mut(1).unwrap().vertex_mut(8).unwrap()[0] = 2.0;
        assert_eq!(mesh.commit().unwrap(), CommitPath::Unchanged);
        assert!(!mesh.is_invalid_face(3, 1));
        assert!(mesh.verify());
    }

    #[test]
    fn test_out_of_range_indices_are_invalid_not_fatal() {
        let mut data = test_meshes::two_triangles();
        data.indices[5] = 99;
        let mesh = test_meshes::committed(&data, TopologyOptions::default());
        assert!(!mesh.verify());
        assert!(mesh.is_invalid_face(1, 0));
        // the neighbour sees vertex 99 across the shared edge
        assert!(mesh.is_invalid_face(0, 0));
        assert_eq!(mesh.half_edges()[1].vertex_type, VertexType::Regular);
    }

    #[test]
    fn test_patch_stats() {
        let mesh = test_meshes::committed_grid(4, TopologyOptions::default());
        let stats = mesh.patch_stats();
        assert_eq!(stats.total(), 16);
        // corners are irregular; all other faces are regular
        assert_eq!(stats.irregular, 4);
        assert_eq!(stats.regular, 12);
        assert_eq!(stats.complex, 0);
        assert!((stats.percent(stats.regular) - 75.0).abs() < 1e-9);
    }
}
