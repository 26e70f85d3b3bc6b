//! Incremental refresh of derived half-edge fields.
//!
//! When connectivity and holes are unchanged, crease weights, tessellation
//! levels and patch types can be recomputed in place without sorting or
//! relinking. Adjacency (`opposite`, `vertex_type`) is never touched here.

use super::classify::{classify_faces, local_face_range, split_face_blocks};
use super::halfedge::{edge_level, is_corner_at, Topology, VertexType};
use super::index::EdgeKey;
use super::index_maps::{EdgeCreaseMap, VertexCreaseMap};
use super::options::TopologyOptions;
use crate::algo::{block_ranges, for_each_item};

/// Which derived fields need refreshing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct UpdateFlags {
    pub levels: bool,
    pub edge_creases: bool,
    pub vertex_creases: bool,
}

impl UpdateFlags {
    pub fn any(self) -> bool {
        self.levels || self.creases()
    }

    pub fn creases(self) -> bool {
        self.edge_creases || self.vertex_creases
    }
}

/// Inputs read by the updater.
pub(crate) struct UpdateInput<'a> {
    pub levels: &'a [f32],
    pub edge_creases: &'a EdgeCreaseMap,
    pub vertex_creases: &'a VertexCreaseMap,
    pub options: &'a TopologyOptions,
}

/// Refresh the fields selected by `flags`.
///
/// Boundary edges keep their infinite weight and non-manifold vertices stay
/// pinned. Patch types are recomputed whenever a crease kind changed.
pub(crate) fn update_half_edges(topology: &mut Topology, input: &UpdateInput<'_>, flags: UpdateFlags) {
    if !flags.any() {
        return;
    }
    let options = input.options;
    let rate = options.tessellation_rate;
    let sharpen = options.boundary.sharpens_corners();

    {
        let Topology {
            half_edges,
            face_start_edge,
        } = &mut *topology;
        let face_start: &[u32] = face_start_edge;
        let blocks = block_ranges(face_start.len(), options.block_size);
        let parts = split_face_blocks(half_edges, face_start, &blocks);
        let work: Vec<_> = blocks.into_iter().zip(parts).collect();

        for_each_item(options.parallel, work, |(faces, edges)| {
            let base = face_start[faces.start] as usize;
            let len = edges.len();
            for f in faces {
                let ring = local_face_range(face_start, f, base, len);
                for i in ring.clone() {
                    if flags.levels {
                        edges[i].edge_level = edge_level(input.levels, rate, base + i);
                    }
                    if flags.edge_creases && edges[i].has_opposite() {
                        let next = (i as i64 + edges[i].next_offset as i64) as usize;
                        let key = EdgeKey::new(edges[i].origin.raw(), edges[next].origin.raw());
                        edges[i].edge_crease_weight = input.edge_creases.lookup(key);
                    }
                    if flags.vertex_creases && edges[i].vertex_type != VertexType::NonManifold {
                        edges[i].vertex_crease_weight = if sharpen && is_corner_at(edges, i) {
                            f32::INFINITY
                        } else {
                            input.vertex_creases.lookup(edges[i].origin.raw())
                        };
                    }
                }
            }
        });
    }

    if flags.creases() {
        classify_faces(topology, options);
    }
}
