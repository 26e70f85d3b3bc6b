//! Half-edge construction and adjacency resolution.
//!
//! Building runs as four fork-join phases, each finishing before the next
//! starts:
//!
//! 1. **Create**: every face block writes its own half-edges and emits one
//!    `(edge key, half-edge)` pair per directed edge.
//! 2. **Sort**: a stable radix sort groups all half-edges of one undirected
//!    edge into a run.
//! 3. **Link**: blocks of the sorted array are scanned for runs. A block skips
//!    a run that started in the previous block, so each run is handled
//!    exactly once. Runs turn into link actions that are applied after the
//!    scan.
//! 4. **Classify**: corner sharpening and patch types per face.
//!
//! Everything is written into fresh storage, so a previous topology stays
//! untouched until the new one is complete.

use std::ops::Range;

use super::classify::{classify_faces, sharpen_corners, split_face_blocks};
use super::halfedge::{edge_level, HalfEdge, PatchType, Topology, VertexType};
use super::index::{EdgeKey, HalfEdgeId, VertexId, INVALID_INDEX};
use super::index_maps::{EdgeCreaseMap, HoleSet, VertexCreaseMap};
use super::options::TopologyOptions;
use crate::algo::{block_ranges, for_each_item, map_items, radix_sort, RadixKey};

/// A directed half-edge tagged with the key of its undirected edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub(crate) struct KeyedHalfEdge {
    pub key: EdgeKey,
    pub edge: HalfEdgeId,
}

impl RadixKey for KeyedHalfEdge {
    #[inline]
    fn radix_key(&self) -> u64 {
        self.key.raw()
    }
}

/// Temporary arrays of the sort phase.
///
/// Kept between rebuilds to avoid reallocating, dropped once the mesh only
/// gets incremental updates or belongs to a static scene.
#[derive(Debug, Default)]
pub(crate) struct SortScratch {
    pub sorted: Vec<KeyedHalfEdge>,
    pub temp: Vec<KeyedHalfEdge>,
}

impl SortScratch {
    /// Release both arrays.
    pub fn clear(&mut self) {
        self.sorted = Vec::new();
        self.temp = Vec::new();
    }

    /// Whether both arrays are released.
    pub fn is_empty(&self) -> bool {
        self.sorted.capacity() == 0 && self.temp.capacity() == 0
    }
}

/// Everything the builder reads.
pub(crate) struct BuildInput<'a> {
    pub face_valences: &'a [u32],
    pub vertex_indices: &'a [u32],
    pub levels: &'a [f32],
    pub holes: &'a HoleSet,
    pub edge_creases: &'a EdgeCreaseMap,
    pub vertex_creases: &'a VertexCreaseMap,
    pub options: &'a TopologyOptions,
}

impl BuildInput<'_> {
    /// Vertex index of half-edge `i`, invalid when the index buffer is short.
    #[inline]
    fn vertex_index(&self, i: usize) -> u32 {
        self.vertex_indices.get(i).copied().unwrap_or(INVALID_INDEX)
    }
}

/// What to do with the half-edges of one sorted run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LinkAction {
    /// Edge of a single face.
    Boundary(HalfEdgeId),
    /// Two faces sharing an edge with consistent winding.
    Opposite(HalfEdgeId, HalfEdgeId),
    /// Two faces sharing an edge with the same direction. Not linked.
    MisWound(HalfEdgeId, HalfEdgeId),
    /// One of more than two half-edges on the same edge.
    NonManifold(HalfEdgeId),
}

/// Build the half-edge topology.
///
/// `face_start_edge` must be the exclusive prefix sum of the valences and
/// `num_half_edges` their total.
pub(crate) fn build_topology(
    input: &BuildInput<'_>,
    face_start_edge: Vec<u32>,
    num_half_edges: usize,
    scratch: &mut SortScratch,
) -> Topology {
    let options = input.options;
    let num_faces = face_start_edge.len();

    // Phase 1: create half-edges and keys
    let mut half_edges = vec![HalfEdge::new(); num_half_edges];
    scratch.sorted.clear();
    scratch.sorted.resize(num_half_edges, KeyedHalfEdge::default());
    {
        let blocks = block_ranges(num_faces, options.block_size);
        let edge_parts = split_face_blocks(&mut half_edges, &face_start_edge, &blocks);
        let key_parts = split_face_blocks(&mut scratch.sorted, &face_start_edge, &blocks);
        let work: Vec<_> = blocks.into_iter().zip(edge_parts).zip(key_parts).collect();
        let face_start: &[u32] = &face_start_edge;
        for_each_item(options.parallel, work, |((faces, edges), keys)| {
            create_half_edges(input, face_start, faces, edges, keys);
        });
    }

    // Phase 2: group directed edges by undirected key
    radix_sort(
        &mut scratch.sorted,
        &mut scratch.temp,
        options.block_size,
        options.parallel,
    );

    // Phase 3: resolve adjacency
    let sorted: &[KeyedHalfEdge] = &scratch.sorted;
    let chunks = block_ranges(sorted.len(), options.block_size);
    let edges: &[HalfEdge] = &half_edges;
    let actions: Vec<Vec<LinkAction>> = map_items(options.parallel, chunks, |range| {
        scan_runs(sorted, edges, range)
    });
    for action in actions.into_iter().flatten() {
        apply_link(&mut half_edges, action);
    }

    // Phase 4: corners and patch types
    sharpen_corners(&mut half_edges, &face_start_edge, options);
    let mut topology = Topology::new(half_edges, face_start_edge);
    classify_faces(&mut topology, options);
    topology
}

/// Write the half-edges of one block of faces.
fn create_half_edges(
    input: &BuildInput<'_>,
    face_start: &[u32],
    faces: Range<usize>,
    edges: &mut [HalfEdge],
    keys: &mut [KeyedHalfEdge],
) {
    let rate = input.options.tessellation_rate;
    let base = face_start.get(faces.start).map_or(0, |&e| e as usize);

    for f in faces {
        let n = input.face_valences[f] as usize;
        let e = face_start[f] as usize;
        let hole = input.holes.contains(f as u32);

        for de in 0..n {
            let start_vertex = input.vertex_index(e + de);
            let next_index = if de + 1 >= n { de + 1 - n } else { de + 1 };
            let end_vertex = input.vertex_index(e + next_index);
            let key = EdgeKey::new(start_vertex, end_vertex);

            let local = e + de - base;
            edges[local] = HalfEdge {
                origin: VertexId::from_raw(start_vertex),
                next_offset: if de == n - 1 { -(n as i32 - 1) } else { 1 },
                prev_offset: if de == 0 { n as i32 - 1 } else { -1 },
                opposite: HalfEdgeId::invalid(),
                edge_crease_weight: input.edge_creases.lookup(key),
                vertex_crease_weight: input.vertex_creases.lookup(start_vertex),
                edge_level: edge_level(input.levels, rate, e + de),
                patch_type: PatchType::Complex,
                vertex_type: VertexType::Regular,
            };
            keys[local] = KeyedHalfEdge {
                key: if hole { EdgeKey::HOLE } else { key },
                edge: HalfEdgeId::new(e + de),
            };
        }
    }
}

/// Turn every run of equal keys that starts inside `range` into link actions.
fn scan_runs(sorted: &[KeyedHalfEdge], edges: &[HalfEdge], range: Range<usize>) -> Vec<LinkAction> {
    let mut actions = Vec::new();
    let mut e = range.start;

    // the run continuing from the previous block belongs to that block
    if e != 0 && sorted[e].key == sorted[e - 1].key {
        let key = sorted[e].key;
        while e < range.end && sorted[e].key == key {
            e += 1;
        }
    }

    while e < range.end {
        let key = sorted[e].key;
        if key.is_hole() {
            break;
        }
        let mut n = 1;
        while e + n < sorted.len() && sorted[e + n].key == key {
            n += 1;
        }

        match n {
            1 => actions.push(LinkAction::Boundary(sorted[e].edge)),
            2 => {
                let a = sorted[e].edge;
                let b = sorted[e + 1].edge;
                let a_next = a.offset(edges[a.index()].next_offset);
                if edges[a_next.index()].origin == edges[b.index()].origin {
                    actions.push(LinkAction::Opposite(a, b));
                } else {
                    actions.push(LinkAction::MisWound(a, b));
                }
            }
            _ => actions.extend(sorted[e..e + n].iter().map(|k| LinkAction::NonManifold(k.edge))),
        }
        e += n;
    }

    actions
}

fn apply_link(half_edges: &mut [HalfEdge], action: LinkAction) {
    match action {
        LinkAction::Boundary(he) => {
            half_edges[he.index()].edge_crease_weight = f32::INFINITY;
        }
        LinkAction::Opposite(a, b) => {
            half_edges[a.index()].opposite = b;
            half_edges[b.index()].opposite = a;
        }
        LinkAction::MisWound(a, b) => {
            half_edges[a.index()].edge_crease_weight = f32::INFINITY;
            half_edges[b.index()].edge_crease_weight = f32::INFINITY;
        }
        LinkAction::NonManifold(he) => {
            let next = he.offset(half_edges[he.index()].next_offset);
            for id in [he, next] {
                let edge = &mut half_edges[id.index()];
                edge.vertex_crease_weight = f32::INFINITY;
                edge.vertex_type = VertexType::NonManifold;
                edge.edge_crease_weight = f32::INFINITY;
            }
        }
    }
}
