//! Patch classification and corner sharpening.
//!
//! A face is a [`PatchType::RegularQuad`] when it and its 1-ring form a plain
//! bicubic B-spline patch: four sides, and around each corner only quads
//! joined by smooth edges in a regular configuration (four faces inside,
//! two along a boundary, one at a sharp corner). Other quads are
//! [`PatchType::IrregularQuad`]; every other valence is
//! [`PatchType::Complex`].

use std::ops::Range;

use super::halfedge::{is_corner_at, HalfEdge, PatchType, Topology, VertexType};
use super::index::{FaceId, HalfEdgeId};
use super::options::TopologyOptions;
use crate::algo::{block_ranges, for_each_item, map_items};

/// Classify one face of a topology whose adjacency is resolved.
pub fn patch_type(topology: &Topology, face: FaceId) -> PatchType {
    if topology.face_valence(face) != 4 {
        return PatchType::Complex;
    }
    let first = topology.face_edge(face);
    if topology.ring(first).all(|he| is_regular_corner(topology, he)) {
        PatchType::RegularQuad
    } else {
        PatchType::IrregularQuad
    }
}

/// Whether the origin of `he` sits in a regular configuration.
///
/// Rotates around the vertex through `opposite(prev(p))` until the walk
/// closes or hits a boundary, then walks the other way through
/// `next(opposite(p))` to count the faces on the far side of `he`.
fn is_regular_corner(topology: &Topology, he: HalfEdgeId) -> bool {
    let edge = topology.half_edge(he);
    if edge.vertex_type == VertexType::NonManifold {
        return false;
    }
    let vertex_crease = edge.vertex_crease_weight;

    let mut faces = 1;
    let mut p = he;
    let mut boundary = false;
    loop {
        if topology.ring_valence(p) != 4 {
            return false;
        }
        let incoming = topology.prev(p);
        match topology.opposite(incoming) {
            None => {
                boundary = true;
                break;
            }
            Some(o) => {
                if topology.half_edge(incoming).edge_crease_weight != 0.0 {
                    return false;
                }
                if o == he {
                    break;
                }
                p = o;
                faces += 1;
                if faces > 4 {
                    return false;
                }
            }
        }
    }

    if !boundary {
        return faces == 4 && vertex_crease == 0.0;
    }

    let mut p = he;
    while let Some(o) = topology.opposite(p) {
        if topology.half_edge(p).edge_crease_weight != 0.0 {
            return false;
        }
        let q = topology.next(o);
        if topology.ring_valence(q) != 4 {
            return false;
        }
        faces += 1;
        if faces > 2 {
            return false;
        }
        p = q;
    }

    match faces {
        2 => vertex_crease == 0.0,
        1 => vertex_crease == f32::INFINITY,
        _ => false,
    }
}

/// Split a half-edge array into one mutable slice per block of faces.
///
/// `blocks` must be consecutive face ranges starting at face 0.
pub(crate) fn split_face_blocks<'a, T>(
    mut data: &'a mut [T],
    face_start: &[u32],
    blocks: &[Range<usize>],
) -> Vec<&'a mut [T]> {
    let total = data.len();
    let mut parts = Vec::with_capacity(blocks.len());
    let mut consumed = 0;
    for faces in blocks {
        let end = face_start.get(faces.end).map_or(total, |&e| e as usize);
        let (head, tail) = std::mem::take(&mut data).split_at_mut(end - consumed);
        parts.push(head);
        data = tail;
        consumed = end;
    }
    parts
}

/// Range of face `f` inside the slice of its block.
#[inline]
pub(crate) fn local_face_range(face_start: &[u32], f: usize, base: usize, block_len: usize) -> Range<usize> {
    let start = face_start[f] as usize - base;
    let end = face_start
        .get(f + 1)
        .map_or(block_len, |&e| e as usize - base);
    start..end
}

/// Force the vertex crease of every face corner to infinity when the boundary
/// mode asks for it.
pub(crate) fn sharpen_corners(half_edges: &mut [HalfEdge], face_start: &[u32], options: &TopologyOptions) {
    if !options.boundary.sharpens_corners() {
        return;
    }
    let blocks = block_ranges(face_start.len(), options.block_size);
    let parts = split_face_blocks(half_edges, face_start, &blocks);
    let work: Vec<_> = blocks.into_iter().zip(parts).collect();
    for_each_item(options.parallel, work, |(faces, edges)| {
        let base = face_start[faces.start] as usize;
        let len = edges.len();
        for f in faces {
            for i in local_face_range(face_start, f, base, len) {
                if is_corner_at(edges, i) {
                    edges[i].vertex_crease_weight = f32::INFINITY;
                }
            }
        }
    });
}

/// Recompute the patch type of every face.
///
/// Types are computed from a read-only view first and written afterwards, so
/// no face observes a half-updated neighbour.
pub(crate) fn classify_faces(topology: &mut Topology, options: &TopologyOptions) {
    let blocks = block_ranges(topology.num_faces(), options.block_size);

    let view: &Topology = topology;
    let types: Vec<Vec<PatchType>> = map_items(options.parallel, blocks.clone(), |faces| {
        faces.map(|f| patch_type(view, FaceId::new(f))).collect()
    });

    let Topology {
        half_edges,
        face_start_edge,
    } = topology;
    let face_start: &[u32] = face_start_edge;
    let parts = split_face_blocks(half_edges, face_start, &blocks);
    let work: Vec<_> = blocks.into_iter().zip(parts).zip(types).collect();
    for_each_item(options.parallel, work, |((faces, edges), types)| {
        let base = face_start[faces.start] as usize;
        let len = edges.len();
        for (f, ty) in faces.zip(types) {
            for edge in &mut edges[local_face_range(face_start, f, base, len)] {
                edge.patch_type = ty;
            }
        }
    });
}
