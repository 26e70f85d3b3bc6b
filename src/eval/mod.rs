//! Patch evaluation.
//!
//! The mesh hands each query to a [`PatchEvaluator`] together with the face's
//! half-edge ring, a view of the control points and a per-patch cache entry.
//! Cache entries are tagged with the scene generation; an entry whose tag
//! differs from the current generation is stale and gets refilled by the
//! evaluator.
//!
//! Attributes are evaluated in groups of four floats. A buffer with stride
//! 7 is evaluated as two groups, components 0..4 and 4..7, each with its own
//! cache slot.

pub mod bilinear;

pub use bilinear::BilinearEvaluator;

use std::fmt::Debug;
use std::sync::{Mutex, MutexGuard, PoisonError};

use nalgebra::Vector4;

use crate::error::Result;
use crate::mesh::{FaceId, HalfEdgeId, RingIter, Topology, VertexId};

/// Floats evaluated together in one group.
pub const GROUP_SIZE: usize = 4;

/// Number of four-float groups needed for `stride` floats.
#[inline]
pub fn interpolation_slots(stride: usize) -> usize {
    stride.div_ceil(GROUP_SIZE)
}

/// Requested derivative order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum Derivatives {
    /// Position only.
    #[default]
    None,
    /// Position, dP/du and dP/dv.
    First,
    /// Additionally d²P/du², d²P/dv² and d²P/dudv.
    Second,
}

impl Derivatives {
    /// Whether first derivatives are requested.
    #[inline]
    pub fn first(self) -> bool {
        self >= Derivatives::First
    }

    /// Whether second derivatives are requested.
    #[inline]
    pub fn second(self) -> bool {
        self >= Derivatives::Second
    }
}

/// Result of evaluating one four-float group at one (u, v).
///
/// Derivatives that were not requested are zero.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PatchSample {
    /// Position.
    pub p: Vector4<f32>,
    /// dP/du.
    pub dpdu: Vector4<f32>,
    /// dP/dv.
    pub dpdv: Vector4<f32>,
    /// d²P/du².
    pub ddpdudu: Vector4<f32>,
    /// d²P/dv².
    pub ddpdvdv: Vector4<f32>,
    /// d²P/dudv.
    pub ddpdudv: Vector4<f32>,
}

/// Handle to the half-edge ring of the face being evaluated.
#[derive(Debug, Clone, Copy)]
pub struct PatchRef<'a> {
    topology: &'a Topology,
    face: FaceId,
}

impl<'a> PatchRef<'a> {
    pub(crate) fn new(topology: &'a Topology, face: FaceId) -> Self {
        Self { topology, face }
    }

    /// The face id.
    pub fn face(&self) -> FaceId {
        self.face
    }

    /// First half-edge of the face.
    pub fn first_edge(&self) -> HalfEdgeId {
        self.topology.face_edge(self.face)
    }

    /// Number of vertices of the face.
    pub fn valence(&self) -> usize {
        self.topology.face_valence(self.face)
    }

    /// The full topology, for evaluators that look past the face ring.
    pub fn topology(&self) -> &'a Topology {
        self.topology
    }

    /// Iterate over the ring half-edges.
    pub fn ring(&self) -> RingIter<'a> {
        self.topology.ring(self.first_edge())
    }
}

/// A four-float window into a vertex buffer.
#[derive(Debug, Clone, Copy)]
pub struct ControlPoints<'a> {
    data: &'a [f32],
    stride: usize,
    offset: usize,
    width: usize,
}

impl<'a> ControlPoints<'a> {
    /// Window over group `group` of a buffer with `stride` floats per vertex.
    pub fn new(data: &'a [f32], stride: usize, group: usize) -> Self {
        let offset = group * GROUP_SIZE;
        Self {
            data,
            stride,
            offset,
            width: stride.saturating_sub(offset).min(GROUP_SIZE),
        }
    }

    /// Number of vertices in the buffer.
    pub fn len(&self) -> usize {
        if self.stride == 0 {
            0
        } else {
            self.data.len() / self.stride
        }
    }

    /// Whether the buffer holds no vertices.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of meaningful components in this window (1..=4).
    pub fn width(&self) -> usize {
        self.width
    }

    /// The window of `vertex`, zero-padded to four components.
    pub fn point(&self, vertex: VertexId) -> Option<Vector4<f32>> {
        if !vertex.is_valid() || vertex.index() >= self.len() {
            return None;
        }
        let start = vertex.index() * self.stride + self.offset;
        let mut p = Vector4::zeros();
        for (c, value) in self.data[start..start + self.width].iter().enumerate() {
            p[c] = *value;
        }
        Some(p)
    }
}

/// Cached per-patch data.
#[derive(Debug, Clone, Default)]
pub struct CacheEntry {
    tag: Option<u64>,
    /// Control points gathered by the evaluator.
    pub points: Vec<Vector4<f32>>,
}

impl CacheEntry {
    /// Whether the entry was filled at `generation`.
    #[inline]
    pub fn is_current(&self, generation: u64) -> bool {
        self.tag == Some(generation)
    }

    /// Tag the entry with `generation` after refilling it.
    pub fn set_tag(&mut self, generation: u64) {
        self.tag = Some(generation);
    }

    /// Drop the tag so the next lookup refills.
    pub fn invalidate(&mut self) {
        self.tag = None;
    }
}

/// Evaluates one patch group at a parametric location.
pub trait PatchEvaluator: Send + Sync + Debug {
    /// Evaluate `patch` at `(u, v)`.
    ///
    /// `cache` belongs to this patch and group. When it is not current at
    /// `generation`, the evaluator must refill it from `points` and tag it.
    #[allow(clippy::too_many_arguments)]
    fn evaluate(
        &self,
        patch: PatchRef<'_>,
        points: &ControlPoints<'_>,
        cache: &mut CacheEntry,
        generation: u64,
        u: f32,
        v: f32,
        derivatives: Derivatives,
    ) -> Result<PatchSample>;
}

/// Per-patch cache entries of one buffer, one slot per face and group.
///
/// Each slot has its own lock so concurrent queries only contend on the
/// same patch.
#[derive(Debug, Default)]
pub struct PatchCache {
    slots: Vec<Mutex<CacheEntry>>,
    slots_per_face: usize,
}

impl PatchCache {
    /// Size the cache for `num_faces` faces of a buffer with `stride` floats.
    ///
    /// Storage is only reallocated when the slot count changes; stale entries
    /// are detected by their tag.
    pub fn resize(&mut self, num_faces: usize, stride: usize) {
        let slots_per_face = interpolation_slots(stride);
        let len = num_faces * slots_per_face;
        self.slots_per_face = slots_per_face;
        if self.slots.len() != len {
            self.slots = (0..len).map(|_| Mutex::new(CacheEntry::default())).collect();
        }
    }

    /// Release all slots.
    pub fn clear(&mut self) {
        self.slots = Vec::new();
        self.slots_per_face = 0;
    }

    /// Total number of slots.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Whether the cache holds no slots.
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Lock the slot of `face` and `group`, or `None` when out of range.
    pub fn lock(&self, face: usize, group: usize) -> Option<MutexGuard<'_, CacheEntry>> {
        if group >= self.slots_per_face {
            return None;
        }
        let slot = self.slots.get(face * self.slots_per_face + group)?;
        // a panicking evaluator leaves at worst a stale entry
        Some(slot.lock().unwrap_or_else(PoisonError::into_inner))
    }
}
