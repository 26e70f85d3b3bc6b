//! Sparse lookup structures built from the hole and crease buffers.
//!
//! All three maps are read-only once built and answer misses with a default:
//! `0.0` for crease weights and `false` for hole membership. They are rebuilt
//! from scratch whenever their backing buffers are marked modified.

use std::collections::{HashMap, HashSet};

use super::index::EdgeKey;

/// Set of faces flagged as holes.
#[derive(Debug, Clone, Default)]
pub struct HoleSet {
    faces: HashSet<u32>,
}

impl HoleSet {
    /// Build from an unordered list of face indices. Duplicates are ignored.
    pub fn from_faces(faces: &[u32]) -> Self {
        Self {
            faces: faces.iter().copied().collect(),
        }
    }

    /// Whether `face` is a hole. `false` for anything not in the set.
    #[inline]
    pub fn contains(&self, face: u32) -> bool {
        !self.faces.is_empty() && self.faces.contains(&face)
    }

    /// Number of distinct hole faces.
    pub fn len(&self) -> usize {
        self.faces.len()
    }

    /// Whether there are no holes.
    pub fn is_empty(&self) -> bool {
        self.faces.is_empty()
    }

    /// Drop all entries and release the storage.
    pub fn clear(&mut self) {
        self.faces = HashSet::new();
    }
}

/// Crease weights of individual vertices.
#[derive(Debug, Clone, Default)]
pub struct VertexCreaseMap {
    weights: HashMap<u32, f32>,
}

impl VertexCreaseMap {
    /// Build from parallel index and weight buffers.
    ///
    /// Entries beyond the shorter of the two buffers are ignored; a vertex
    /// listed twice keeps its last weight.
    pub fn from_buffers(vertices: &[u32], weights: &[f32]) -> Self {
        Self {
            weights: vertices.iter().copied().zip(weights.iter().copied()).collect(),
        }
    }

    /// Crease weight of `vertex`, `0.0` when absent.
    #[inline]
    pub fn lookup(&self, vertex: u32) -> f32 {
        self.weights.get(&vertex).copied().unwrap_or(0.0)
    }

    /// Number of creased vertices.
    pub fn len(&self) -> usize {
        self.weights.len()
    }

    /// Whether no vertex is creased.
    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }

    /// Drop all entries and release the storage.
    pub fn clear(&mut self) {
        self.weights = HashMap::new();
    }
}

/// Crease weights of undirected edges.
#[derive(Debug, Clone, Default)]
pub struct EdgeCreaseMap {
    weights: HashMap<EdgeKey, f32>,
}

impl EdgeCreaseMap {
    /// Build from a buffer of vertex pairs and a parallel weight buffer.
    ///
    /// The pair order does not matter; `[a, b]` and `[b, a]` name the same
    /// edge, and a later entry overrides an earlier one.
    pub fn from_buffers(edges: &[[u32; 2]], weights: &[f32]) -> Self {
        Self {
            weights: edges
                .iter()
                .zip(weights.iter().copied())
                .map(|(&[a, b], w)| (EdgeKey::new(a, b), w))
                .collect(),
        }
    }

    /// Crease weight of the edge with `key`, `0.0` when absent.
    #[inline]
    pub fn lookup(&self, key: EdgeKey) -> f32 {
        self.weights.get(&key).copied().unwrap_or(0.0)
    }

    /// Number of creased edges.
    pub fn len(&self) -> usize {
        self.weights.len()
    }

    /// Whether no edge is creased.
    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }

    /// Drop all entries and release the storage.
    pub fn clear(&mut self) {
        self.weights = HashMap::new();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hole_set() {
        let holes = HoleSet::from_faces(&[4, 1, 4]);
        assert_eq!(holes.len(), 2);
        assert!(holes.contains(1));
        assert!(holes.contains(4));
        assert!(!holes.contains(0));
        assert!(!HoleSet::default().contains(0));
    }

    #[test]
    fn test_vertex_crease_defaults_to_zero() {
        let map = VertexCreaseMap::from_buffers(&[3, 7], &[2.5, f32::INFINITY]);
        assert_eq!(map.lookup(3), 2.5);
        assert_eq!(map.lookup(7), f32::INFINITY);
        assert_eq!(map.lookup(0), 0.0);
    }

    #[test]
    fn test_vertex_crease_ignores_unpaired_entries() {
        let map = VertexCreaseMap::from_buffers(&[1, 2, 3], &[1.0]);
        assert_eq!(map.len(), 1);
        assert_eq!(map.lookup(2), 0.0);
    }

    #[test]
    fn test_edge_crease_is_unordered() {
        let map = EdgeCreaseMap::from_buffers(&[[0, 1], [5, 2]], &[1.5, 3.0]);
        assert_eq!(map.lookup(EdgeKey::new(1, 0)), 1.5);
        assert_eq!(map.lookup(EdgeKey::new(2, 5)), 3.0);
        assert_eq!(map.lookup(EdgeKey::new(0, 2)), 0.0);
    }

    #[test]
    fn test_clear_releases_entries() {
        let mut map = EdgeCreaseMap::from_buffers(&[[0, 1]], &[1.0]);
        map.clear();
        assert!(map.is_empty());
        assert_eq!(map.lookup(EdgeKey::new(0, 1)), 0.0);
    }
}
