//! Index types for mesh elements.
//!
//! This module provides type-safe index wrappers for vertices, half-edges and
//! faces, plus the packed undirected [`EdgeKey`] used to pair half-edges.
//! All indices are 32-bit, matching the index buffers they come from, and use
//! `u32::MAX` as the "absent" sentinel.

use std::fmt::{self, Debug};

/// Sentinel raw value for an absent index.
pub const INVALID_INDEX: u32 = u32::MAX;

/// A type-safe vertex index.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
#[repr(transparent)]
pub struct VertexId(u32);

/// A type-safe half-edge index into the half-edge array.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
#[repr(transparent)]
pub struct HalfEdgeId(u32);

/// A type-safe face index.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
#[repr(transparent)]
pub struct FaceId(u32);

macro_rules! impl_index_type {
    ($name:ident, $display:literal) => {
        impl $name {
            /// Create a new index from a position.
            #[inline]
            pub fn new(index: usize) -> Self {
                debug_assert!(index < INVALID_INDEX as usize, "index {} too large", index);
                Self(index as u32)
            }

            /// Wrap a raw buffer value without range checks.
            #[inline]
            pub const fn from_raw(raw: u32) -> Self {
                Self(raw)
            }

            /// Create an invalid/null index.
            #[inline]
            pub const fn invalid() -> Self {
                Self(INVALID_INDEX)
            }

            /// Get the index as a position.
            #[inline]
            pub fn index(self) -> usize {
                self.0 as usize
            }

            /// Get the raw 32-bit value.
            #[inline]
            pub fn raw(self) -> u32 {
                self.0
            }

            /// Check if this is a valid (non-null) index.
            #[inline]
            pub fn is_valid(self) -> bool {
                self.0 != INVALID_INDEX
            }
        }

        impl Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                if self.is_valid() {
                    write!(f, "{}({})", $display, self.0)
                } else {
                    write!(f, "{}(INVALID)", $display)
                }
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::invalid()
            }
        }

        impl From<usize> for $name {
            fn from(v: usize) -> Self {
                Self::new(v)
            }
        }
    };
}

impl_index_type!(VertexId, "V");
impl_index_type!(HalfEdgeId, "HE");
impl_index_type!(FaceId, "F");

impl HalfEdgeId {
    /// Move by a signed ring offset as stored in a half-edge record.
    #[inline]
    pub fn offset(self, delta: i32) -> Self {
        Self((self.0 as i64 + delta as i64) as u32)
    }
}

/// An undirected edge packed into 64 bits.
///
/// The larger vertex index occupies the high 32 bits, so `(a, b)` and `(b, a)`
/// produce the same key and sorting by key groups every directed half-edge of
/// one undirected edge into a contiguous run.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Default)]
#[repr(transparent)]
pub struct EdgeKey(u64);

impl EdgeKey {
    /// Key emitted for half-edges of hole faces. Sorts after every real edge.
    pub const HOLE: EdgeKey = EdgeKey(u64::MAX);

    /// Build the key of the undirected edge between `a` and `b`.
    #[inline]
    pub fn new(a: u32, b: u32) -> Self {
        let (hi, lo) = if a < b { (b, a) } else { (a, b) };
        EdgeKey(((hi as u64) << 32) | lo as u64)
    }

    /// The packed value.
    #[inline]
    pub fn raw(self) -> u64 {
        self.0
    }

    /// The two endpoints, larger first.
    #[inline]
    pub fn vertices(self) -> (u32, u32) {
        ((self.0 >> 32) as u32, self.0 as u32)
    }

    /// Whether this is the hole sentinel.
    #[inline]
    pub fn is_hole(self) -> bool {
        self == Self::HOLE
    }
}

impl Debug for EdgeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_hole() {
            write!(f, "Edge(HOLE)")
        } else {
            let (hi, lo) = self.vertices();
            write!(f, "Edge({}, {})", hi, lo)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vertex_id() {
        let v = VertexId::new(42);
        assert_eq!(v.index(), 42);
        assert!(v.is_valid());

        let invalid = VertexId::invalid();
        assert!(!invalid.is_valid());
    }

    #[test]
    fn test_debug_format() {
        assert_eq!(format!("{:?}", HalfEdgeId::new(7)), "HE(7)");
        assert_eq!(format!("{:?}", FaceId::invalid()), "F(INVALID)");
        assert_eq!(format!("{:?}", EdgeKey::new(3, 9)), "Edge(9, 3)");
        assert_eq!(format!("{:?}", EdgeKey::HOLE), "Edge(HOLE)");
    }

    #[test]
    fn test_edge_key_is_unordered() {
        assert_eq!(EdgeKey::new(1, 2), EdgeKey::new(2, 1));
        assert_ne!(EdgeKey::new(1, 2), EdgeKey::new(1, 3));
        assert_eq!(EdgeKey::new(5, 2).raw(), (5u64 << 32) | 2);
        assert_eq!(EdgeKey::new(2, 5).vertices(), (5, 2));
    }

    #[test]
    fn test_hole_key_sorts_last() {
        let real = EdgeKey::new(INVALID_INDEX - 1, INVALID_INDEX - 2);
        assert!(real < EdgeKey::HOLE);
        assert!(!real.is_hole());
    }

    #[test]
    fn test_half_edge_offset() {
        let he = HalfEdgeId::new(10);
        assert_eq!(he.offset(3), HalfEdgeId::new(13));
        assert_eq!(he.offset(-3), HalfEdgeId::new(7));
    }
}
