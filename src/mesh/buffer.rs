//! Modification-tracked input buffers.
//!
//! Every buffer remembers whether it changed since the last commit. The
//! lifecycle controller reads these flags to choose between a full rebuild,
//! an incremental update and a no-op.

use bytemuck::Pod;

use crate::error::{Result, SubdivError};

/// Selects one of the buffers of a [`SubdivMesh`](super::SubdivMesh).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BufferType {
    /// Vertex positions of the given time step.
    Vertex(usize),
    /// One of the two optional user attribute buffers.
    User(usize),
    /// Per-edge vertex indices, face after face.
    Index,
    /// Per-face valence.
    Face,
    /// Hole face list.
    Hole,
    /// Vertex pairs of creased edges.
    EdgeCreaseIndex,
    /// Weights of creased edges.
    EdgeCreaseWeight,
    /// Creased vertices.
    VertexCreaseIndex,
    /// Weights of creased vertices.
    VertexCreaseWeight,
    /// Per-half-edge tessellation level.
    Level,
}

impl BufferType {
    /// Whether changing this buffer advances the topology generation.
    ///
    /// Only the level buffer is exempt: levels do not change the surface.
    #[inline]
    pub fn bumps_generation(self) -> bool {
        self != BufferType::Level
    }
}

/// A typed buffer with a modification flag.
#[derive(Debug, Clone)]
pub struct TrackedBuffer<T: Pod> {
    data: Vec<T>,
    modified: bool,
}

impl<T: Pod> Default for TrackedBuffer<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Pod> TrackedBuffer<T> {
    /// Create an empty buffer. New buffers start out modified.
    pub fn new() -> Self {
        Self {
            data: Vec::new(),
            modified: true,
        }
    }

    /// Create an empty buffer with room for `capacity` elements.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            data: Vec::with_capacity(capacity),
            modified: true,
        }
    }

    /// Replace the contents and mark the buffer modified.
    pub fn set(&mut self, data: Vec<T>) {
        self.data = data;
        self.modified = true;
    }

    /// Replace the contents from raw bytes.
    ///
    /// Fails when the bytes are not aligned for `T` or their length is not a
    /// multiple of the element size.
    pub fn set_bytes(&mut self, bytes: &[u8]) -> std::result::Result<(), bytemuck::PodCastError> {
        let data: &[T] = bytemuck::try_cast_slice(bytes)?;
        self.set(data.to_vec());
        Ok(())
    }

    /// Buffer contents.
    #[inline]
    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    /// Mutable contents. Marks the buffer modified.
    pub fn as_mut_slice(&mut self) -> &mut [T] {
        self.modified = true;
        &mut self.data
    }

    /// Element at `i`, if any.
    #[inline]
    pub fn get(&self, i: usize) -> Option<T> {
        self.data.get(i).copied()
    }

    /// Number of elements.
    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether the buffer holds no elements.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Whether the buffer changed since the flag was last cleared.
    #[inline]
    pub fn is_modified(&self) -> bool {
        self.modified
    }

    /// Set or clear the modification flag.
    #[inline]
    pub fn set_modified(&mut self, modified: bool) {
        self.modified = modified;
    }

    /// Release the storage. The modification flag is left untouched.
    pub fn free(&mut self) {
        self.data = Vec::new();
    }
}

/// Vertex data stored as flat `f32` components with a fixed stride.
#[derive(Debug, Clone)]
pub struct VertexBuffer {
    data: Vec<f32>,
    stride: usize,
    modified: bool,
}

impl VertexBuffer {
    /// Create an empty buffer with `stride` floats per vertex.
    pub fn new(stride: usize) -> Result<Self> {
        Self::from_floats(Vec::new(), stride)
    }

    /// Wrap flat component data.
    pub fn from_floats(data: Vec<f32>, stride: usize) -> Result<Self> {
        if stride == 0 {
            return Err(SubdivError::invalid_param("stride", stride, "must be non-zero"));
        }
        if data.len() % stride != 0 {
            return Err(SubdivError::invalid_param(
                "data length",
                data.len(),
                "must be a multiple of the stride",
            ));
        }
        Ok(Self {
            data,
            stride,
            modified: true,
        })
    }

    /// Build from any plain-old-data point type made of `f32` components,
    /// such as `[f32; 3]` or `[f32; 4]`. The stride is the point size.
    pub fn from_points<P: Pod>(points: &[P]) -> Result<Self> {
        let stride = std::mem::size_of::<P>() / std::mem::size_of::<f32>();
        let floats: &[f32] = bytemuck::try_cast_slice(points).map_err(|e| {
            SubdivError::invalid_param("point type", e, "must consist of f32 components")
        })?;
        Self::from_floats(floats.to_vec(), stride)
    }

    /// Floats per vertex.
    #[inline]
    pub fn stride(&self) -> usize {
        self.stride
    }

    /// Number of vertices.
    #[inline]
    pub fn len(&self) -> usize {
        self.data.len() / self.stride
    }

    /// Whether the buffer holds no vertices.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Flat component data.
    #[inline]
    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    /// Components of vertex `i`.
    #[inline]
    pub fn vertex(&self, i: usize) -> Option<&[f32]> {
        let start = i.checked_mul(self.stride)?;
        self.data.get(start..start + self.stride)
    }

    /// Mutable components of vertex `i`. Marks the buffer modified.
    pub fn vertex_mut(&mut self, i: usize) -> Option<&mut [f32]> {
        let start = i.checked_mul(self.stride)?;
        self.modified = true;
        self.data.get_mut(start..start + self.stride)
    }

    /// Iterate over all vertices.
    pub fn vertices(&self) -> std::slice::ChunksExact<'_, f32> {
        self.data.chunks_exact(self.stride)
    }

    /// Whether the buffer changed since the flag was last cleared.
    #[inline]
    pub fn is_modified(&self) -> bool {
        self.modified
    }

    /// Set or clear the modification flag.
    #[inline]
    pub fn set_modified(&mut self, modified: bool) {
        self.modified = modified;
    }

    /// Release the storage.
    pub fn free(&mut self) {
        self.data = Vec::new();
    }
}
