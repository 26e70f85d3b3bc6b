//! Half-edge records and the flat half-edge topology.
//!
//! Every face of the control mesh owns a contiguous run of half-edges, one per
//! directed edge `v_i -> v_{i+1}`. Ring navigation is encoded as signed
//! offsets, so the whole structure is a single `Vec<HalfEdge>` plus the start
//! edge of each face.
//!
//! # Structure
//!
//! - `next_offset` / `prev_offset` move around the face ring
//! - `opposite` links to the half-edge of the neighbouring face that
//!   traverses the same undirected edge the other way, or is invalid on
//!   boundaries, hole faces, non-manifold edges and mis-wound pairs
//! - crease weights are stored per half-edge; `f32::INFINITY` means fully
//!   sharp

use super::index::{FaceId, HalfEdgeId, VertexId};

/// Smallest and largest tessellation level an edge can get.
pub const MIN_EDGE_LEVEL: f32 = 1.0;
/// Upper clamp for edge tessellation levels.
pub const MAX_EDGE_LEVEL: f32 = 4096.0;

/// Classification of a face for the subdivision fast paths.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PatchType {
    /// A quad whose 1-ring forms a regular B-spline patch.
    RegularQuad,
    /// A quad with extraordinary vertices, creases or irregular boundaries.
    IrregularQuad,
    /// Any face that is not a quad.
    #[default]
    Complex,
}

/// Topological type of the origin vertex of a half-edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum VertexType {
    /// Ordinary manifold vertex.
    #[default]
    Regular,
    /// Endpoint of an edge shared by more than two faces. Pinned.
    NonManifold,
}

/// A half-edge record.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HalfEdge {
    /// The vertex this half-edge originates from.
    pub origin: VertexId,

    /// Offset to the next half-edge around the face.
    pub next_offset: i32,

    /// Offset to the previous half-edge around the face.
    pub prev_offset: i32,

    /// The half-edge on the neighbouring face, or invalid.
    pub opposite: HalfEdgeId,

    /// Crease weight of this edge.
    pub edge_crease_weight: f32,

    /// Crease weight of the origin vertex.
    pub vertex_crease_weight: f32,

    /// Tessellation level of this edge.
    pub edge_level: f32,

    /// Patch type of the owning face.
    pub patch_type: PatchType,

    /// Type of the origin vertex.
    pub vertex_type: VertexType,
}

impl HalfEdge {
    /// Create a new uninitialized half-edge.
    pub fn new() -> Self {
        Self {
            origin: VertexId::invalid(),
            next_offset: 0,
            prev_offset: 0,
            opposite: HalfEdgeId::invalid(),
            edge_crease_weight: 0.0,
            vertex_crease_weight: 0.0,
            edge_level: MIN_EDGE_LEVEL,
            patch_type: PatchType::Complex,
            vertex_type: VertexType::Regular,
        }
    }

    /// Whether an opposite half-edge has been linked.
    #[inline]
    pub fn has_opposite(&self) -> bool {
        self.opposite.is_valid()
    }

    /// Whether this edge is infinitely sharp.
    #[inline]
    pub fn is_sharp_edge(&self) -> bool {
        self.edge_crease_weight == f32::INFINITY
    }

    /// Compare two records bit for bit, so that NaN weights compare equal to
    /// themselves.
    pub fn bitwise_eq(&self, other: &HalfEdge) -> bool {
        self.origin == other.origin
            && self.next_offset == other.next_offset
            && self.prev_offset == other.prev_offset
            && self.opposite == other.opposite
            && self.edge_crease_weight.to_bits() == other.edge_crease_weight.to_bits()
            && self.vertex_crease_weight.to_bits() == other.vertex_crease_weight.to_bits()
            && self.edge_level.to_bits() == other.edge_level.to_bits()
            && self.patch_type == other.patch_type
            && self.vertex_type == other.vertex_type
    }
}

impl Default for HalfEdge {
    fn default() -> Self {
        Self::new()
    }
}

/// Tessellation level of half-edge `i`: the level buffer entry when a level
/// buffer is present, otherwise the global rate, clamped to
/// [`MIN_EDGE_LEVEL`, `MAX_EDGE_LEVEL`].
#[inline]
pub(crate) fn edge_level(levels: &[f32], rate: f32, i: usize) -> f32 {
    let level = if levels.is_empty() {
        rate
    } else {
        levels.get(i).copied().unwrap_or(rate)
    };
    level.clamp(MIN_EDGE_LEVEL, MAX_EDGE_LEVEL)
}

/// Whether the origin of `edges[i]` is a topological corner of its face:
/// neither the half-edge leaving it nor the one entering it has a neighbour.
///
/// `i` may index a face-local slice; only the ring of the face is touched.
#[inline]
pub(crate) fn is_corner_at(edges: &[HalfEdge], i: usize) -> bool {
    let prev = (i as i64 + edges[i].prev_offset as i64) as usize;
    !edges[i].has_opposite() && !edges[prev].has_opposite()
}

/// The half-edge array of a committed mesh together with per-face start edges.
#[derive(Debug, Clone, Default)]
pub struct Topology {
    pub(crate) half_edges: Vec<HalfEdge>,
    pub(crate) face_start_edge: Vec<u32>,
}

impl Topology {
    pub(crate) fn new(half_edges: Vec<HalfEdge>, face_start_edge: Vec<u32>) -> Self {
        Self {
            half_edges,
            face_start_edge,
        }
    }

    // ==================== Accessors ====================

    /// Number of faces.
    #[inline]
    pub fn num_faces(&self) -> usize {
        self.face_start_edge.len()
    }

    /// Number of half-edges.
    #[inline]
    pub fn num_half_edges(&self) -> usize {
        self.half_edges.len()
    }

    /// All half-edge records.
    #[inline]
    pub fn half_edges(&self) -> &[HalfEdge] {
        &self.half_edges
    }

    /// Start edge of every face.
    #[inline]
    pub fn face_start_edges(&self) -> &[u32] {
        &self.face_start_edge
    }

    /// Get a half-edge by ID.
    #[inline]
    pub fn half_edge(&self, id: HalfEdgeId) -> &HalfEdge {
        &self.half_edges[id.index()]
    }

    /// First half-edge of a face.
    #[inline]
    pub fn face_edge(&self, f: FaceId) -> HalfEdgeId {
        HalfEdgeId::from_raw(self.face_start_edge[f.index()])
    }

    /// Number of half-edges owned by a face.
    pub fn face_valence(&self, f: FaceId) -> usize {
        let start = self.face_start_edge[f.index()] as usize;
        let end = self
            .face_start_edge
            .get(f.index() + 1)
            .map_or(self.half_edges.len(), |&e| e as usize);
        end - start
    }

    /// Half-edge range owned by a face.
    pub fn face_range(&self, f: FaceId) -> std::ops::Range<usize> {
        let start = self.face_start_edge[f.index()] as usize;
        start..start + self.face_valence(f)
    }

    // ==================== Topology Queries ====================

    /// Get the next half-edge around the face.
    #[inline]
    pub fn next(&self, he: HalfEdgeId) -> HalfEdgeId {
        he.offset(self.half_edge(he).next_offset)
    }

    /// Get the previous half-edge around the face.
    #[inline]
    pub fn prev(&self, he: HalfEdgeId) -> HalfEdgeId {
        he.offset(self.half_edge(he).prev_offset)
    }

    /// Get the opposite half-edge, if linked.
    #[inline]
    pub fn opposite(&self, he: HalfEdgeId) -> Option<HalfEdgeId> {
        let opposite = self.half_edge(he).opposite;
        opposite.is_valid().then_some(opposite)
    }

    /// Get the origin vertex of a half-edge.
    #[inline]
    pub fn origin(&self, he: HalfEdgeId) -> VertexId {
        self.half_edge(he).origin
    }

    /// Get the destination vertex of a half-edge.
    #[inline]
    pub fn dest(&self, he: HalfEdgeId) -> VertexId {
        self.origin(self.next(he))
    }

    /// Number of half-edges in the ring containing `he`, found by walking.
    pub fn ring_valence(&self, he: HalfEdgeId) -> usize {
        self.ring(he).count()
    }

    /// Whether the origin of `he` is a corner of its face.
    #[inline]
    pub fn is_corner(&self, he: HalfEdgeId) -> bool {
        is_corner_at(&self.half_edges, he.index())
    }

    // ==================== Iteration ====================

    /// Iterate over the half-edges of the ring containing `he`.
    pub fn ring(&self, he: HalfEdgeId) -> RingIter<'_> {
        RingIter::new(self, he)
    }

    /// Iterate over the vertices of a face.
    pub fn face_vertices(&self, f: FaceId) -> impl Iterator<Item = VertexId> + '_ {
        self.face_range(f)
            .map(move |i| self.half_edges[i].origin)
    }

    /// Iterate over all face IDs.
    pub fn face_ids(&self) -> impl Iterator<Item = FaceId> + '_ {
        (0..self.face_start_edge.len()).map(FaceId::new)
    }
}

/// Iterator over the half-edges of one face ring.
pub struct RingIter<'a> {
    topology: &'a Topology,
    start: HalfEdgeId,
    current: HalfEdgeId,
    done: bool,
}

impl<'a> RingIter<'a> {
    fn new(topology: &'a Topology, start: HalfEdgeId) -> Self {
        Self {
            topology,
            start,
            current: start,
            done: start.index() >= topology.half_edges.len(),
        }
    }
}

impl<'a> Iterator for RingIter<'a> {
    type Item = HalfEdgeId;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        let result = self.current;
        self.current = self.topology.next(self.current);

        if self.current == self.start {
            self.done = true;
        }

        Some(result)
    }
}
