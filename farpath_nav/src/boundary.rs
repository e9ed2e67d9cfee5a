// Seam regions between adjacent chunks and the boundary nodes found in them.
//
// For every pair of orthogonally adjacent tracked chunks the index builds a
// separate 2-block-thick region straddling the shared edge: the last row of
// the smaller chunk and the first row of the larger one, 16 blocks long and
// full height. Flood-filling it independently finds the surfaces that cross
// the seam. Each seam surface becomes one `BoundaryNode`, provided it reaches
// a chunk surface on both sides.
//
// Node extraction makes two passes over the seam in x, z, y order. The first
// accumulates each node's centroid and records which chunk surfaces its
// blocks sit on; the second picks a representative block per
// (side, chunk surface) using the now-final centroid.
//
// See also: `node.rs` for `BoundaryNode`, `world_index.rs` which builds and
// registers seams as chunks are added.

use crate::node::BoundaryNode;
use crate::region::Region;
use crate::types::{ChunkCoord, ChunkPair, SurfaceId, CHUNK_SIZE};
use std::collections::BTreeMap;

/// Blocks on each side of the shared edge covered by a seam region.
pub const SEAM_THICKNESS: u32 = 2;

/// The unbuilt seam region for a chunk pair.
pub fn boundary_region(pair: ChunkPair, height: u32) -> Region {
    let last = CHUNK_SIZE - 1;
    if pair.is_along_x() {
        Region::new(
            pair.smaller().block(last, 0, 0),
            SEAM_THICKNESS,
            height,
            CHUNK_SIZE as u32,
        )
    } else {
        Region::new(
            pair.smaller().block(0, 0, last),
            CHUNK_SIZE as u32,
            height,
            SEAM_THICKNESS,
        )
    }
}

/// One side of a seam: the chunk and its built region.
#[derive(Clone, Copy)]
pub struct SeamSide<'a> {
    pub chunk: ChunkCoord,
    pub region: &'a Region,
}

/// Extract boundary nodes from a built seam region. `one` becomes side 0 of
/// every node and `two` side 1. Nodes are returned in ascending seam surface
/// order; nodes that reach no chunk surface on one of the sides are dropped.
pub fn collect_nodes(seam: &Region, one: SeamSide<'_>, two: SeamSide<'_>) -> Vec<BoundaryNode> {
    let mut nodes: BTreeMap<SurfaceId, BoundaryNode> = BTreeMap::new();

    let side_of = |at| {
        if one.region.contains(at) {
            (0, one.region.surface_id(at))
        } else {
            (1, two.region.surface_id(at))
        }
    };

    for (at, seam_surface) in seam.surface_blocks() {
        let (side, surface) = side_of(at);
        nodes
            .entry(seam_surface)
            .or_insert_with(|| BoundaryNode::bridging(one.chunk, two.chunk, seam_surface))
            .accumulate(at, side, surface);
    }

    for (at, seam_surface) in seam.surface_blocks() {
        let (side, surface) = side_of(at);
        if surface == 0 {
            continue;
        }
        if let Some(node) = nodes.get_mut(&seam_surface) {
            node.offer_representative(at, side, surface);
        }
    }

    nodes
        .into_values()
        .filter(BoundaryNode::touches_both_sides)
        .collect()
}
