// Per-world pathing index: chunk regions, seam regions, and the coarse graph.
//
// `WorldIndex` tracks one `Region` per indexed chunk and one seam region per
// pair of orthogonally adjacent indexed chunks. Adding a chunk builds its
// region, then builds a seam against each already-indexed neighbour and folds
// the seam's boundary nodes into the `NodeGraph`. Removing a chunk tears all
// of that down again. Chunks that only share a corner get no seam, so a route
// that can only cross at a corner is reported as no route.
//
// A path query runs in three steps:
// 1. Locate both endpoints' chunk surfaces (`NotOnSurface` if either is off a
//    surface or in an unindexed chunk).
// 2. Splice an endpoint node for each into the graph (scoped by `Splice`,
//    so they are removed on every exit path) and run the coarse search.
// 3. Stitch the coarse route into blocks hop by hop, keeping a cursor at the
//    last block emitted. Each hop moves the cursor across the previous
//    node's seam if needed, then across the shared chunk surface to the next
//    node's representative.
//
// Coarse "no route" is `Ok(None)`. A fine search failing where the coarse
// graph promised a route is `Inconsistent`.
//
// See also: `region.rs`, `boundary.rs`, `node.rs`, `pathfinding.rs`,
// `service.rs` which owns one index per world.
//
// **Critical constraint: determinism.** For identical block data and the
// same sequence of add/remove calls, node ids, adjacency and returned paths
// are identical.

use crate::boundary::{boundary_region, collect_nodes, SeamSide};
use crate::config::NavConfig;
use crate::error::NavError;
use crate::node::{BoundaryNode, NodeGraph, Splice};
use crate::pathfinding::coarse_path;
use crate::region::Region;
use crate::types::{BlockLocation, ChunkCoord, ChunkPair, NodeId, SurfaceId};
use crate::world::BlockSource;
use rustc_hash::FxHashMap;
use std::time::Instant;

/// Pathing index for one world.
#[derive(Clone, Debug, Default)]
pub struct WorldIndex {
    config: NavConfig,
    chunks: FxHashMap<ChunkCoord, Region>,
    boundaries: FxHashMap<ChunkPair, Region>,
    graph: NodeGraph,
}

impl WorldIndex {
    pub fn new(config: NavConfig) -> Self {
        Self {
            config,
            ..Default::default()
        }
    }

    /// An index with every chunk in `loaded` already added.
    pub fn with_loaded_chunks<S, I>(config: NavConfig, source: &S, loaded: I) -> Self
    where
        S: BlockSource + ?Sized,
        I: IntoIterator<Item = ChunkCoord>,
    {
        let mut index = Self::new(config);
        for chunk in loaded {
            index.add(chunk, source);
        }
        index
    }

    pub fn config(&self) -> &NavConfig {
        &self.config
    }

    // -----------------------------------------------------------------------
    // Chunk lifecycle
    // -----------------------------------------------------------------------

    /// Index a chunk and its seams with already-indexed neighbours. Returns
    /// false (and does nothing) if the chunk is already indexed.
    pub fn add<S: BlockSource + ?Sized>(&mut self, chunk: ChunkCoord, source: &S) -> bool {
        if self.chunks.contains_key(&chunk) {
            return false;
        }
        let started = Instant::now();
        let height = source.max_height();

        let mut region = Region::for_chunk(chunk, height);
        region.rebuild(source);

        let mut seams = 0;
        let mut new_nodes = 0;
        for neighbor in chunk.orthogonal_neighbors() {
            let Some(neighbor_region) = self.chunks.get(&neighbor) else {
                continue;
            };
            let Ok(pair) = ChunkPair::new(chunk, neighbor) else {
                continue;
            };

            let mut seam = boundary_region(pair, height);
            seam.rebuild(source);
            let nodes = collect_nodes(
                &seam,
                SeamSide {
                    chunk,
                    region: &region,
                },
                SeamSide {
                    chunk: neighbor,
                    region: neighbor_region,
                },
            );
            for node in nodes {
                let id = self.graph.insert(node);
                self.graph.register(id);
                new_nodes += 1;
            }
            self.boundaries.insert(pair, seam);
            seams += 1;
        }

        let surfaces = region.surface_count();
        self.chunks.insert(chunk, region);

        let elapsed_ms = started.elapsed().as_secs_f64() * 1000.0;
        log::debug!(
            "indexed {chunk}: {surfaces} surfaces, {seams} seams, {new_nodes} nodes in {elapsed_ms:.2}ms"
        );
        if elapsed_ms > self.config.slow_rebuild_warn_ms {
            log::warn!(
                "indexing {chunk} took {elapsed_ms:.1}ms (threshold {}ms)",
                self.config.slow_rebuild_warn_ms
            );
        }
        true
    }

    /// Drop a chunk, its seams, and every boundary node on it. Returns false
    /// if the chunk was not indexed.
    pub fn remove(&mut self, chunk: ChunkCoord) -> bool {
        if self.chunks.remove(&chunk).is_none() {
            return false;
        }
        let removed = self.graph.remove_chunk(chunk);
        for neighbor in chunk.orthogonal_neighbors() {
            if let Ok(pair) = ChunkPair::new(chunk, neighbor) {
                self.boundaries.remove(&pair);
            }
        }
        log::debug!("dropped {chunk}: {removed} nodes");
        true
    }

    /// Re-read a chunk after its blocks changed. Always a full remove + add.
    pub fn rebuild<S: BlockSource + ?Sized>(&mut self, chunk: ChunkCoord, source: &S) {
        self.remove(chunk);
        self.add(chunk, source);
    }

    // -----------------------------------------------------------------------
    // Path queries
    // -----------------------------------------------------------------------

    /// A contiguous, inclusive block path from `start` to `end`, or `None`
    /// if the indexed world holds no route between them.
    pub fn find_path(
        &mut self,
        start: BlockLocation,
        end: BlockLocation,
    ) -> Result<Option<Vec<BlockLocation>>, NavError> {
        let start_surface = self.locate(start)?;
        let end_surface = self.locate(end)?;

        let route = {
            let mut splice = Splice::new(&mut self.graph);
            let from = splice.add_endpoint(start, start_surface);
            let to = splice.add_endpoint(end, end_surface);
            if self.config.link_colocated_endpoints
                && (start.chunk(), start_surface) == (end.chunk(), end_surface)
            {
                splice.link(from, to);
            }

            match coarse_path(&splice, from, to) {
                Some(route) => stitch(&self.chunks, &self.boundaries, &splice, &route, start, end),
                None => {
                    log::debug!("no route from {start} to {end}");
                    return Ok(None);
                }
            }
        }?;

        log::debug!(
            "route from {start} to {end}: {} blocks",
            route.len()
        );
        Ok(Some(route))
    }

    /// Chunk surface id of a query endpoint.
    fn locate(&self, at: BlockLocation) -> Result<SurfaceId, NavError> {
        match self.surface_id_at(at) {
            0 => Err(NavError::NotOnSurface { location: at }),
            surface => Ok(surface),
        }
    }

    // -----------------------------------------------------------------------
    // Introspection
    // -----------------------------------------------------------------------

    /// Surface id at a location; 0 if off any surface or the chunk is not
    /// indexed.
    pub fn surface_id_at(&self, at: BlockLocation) -> SurfaceId {
        self.chunks
            .get(&at.chunk())
            .map_or(0, |region| region.surface_id(at))
    }

    /// Connection bitmask at a location; 0 if the chunk is not indexed.
    pub fn connection_mask_at(&self, at: BlockLocation) -> u32 {
        self.chunks
            .get(&at.chunk())
            .map_or(0, |region| region.connection_mask(at))
    }

    /// Blocks directly connected to `at` inside its chunk.
    pub fn connections_at(&self, at: BlockLocation) -> Vec<BlockLocation> {
        self.chunks
            .get(&at.chunk())
            .map(|region| region.connections(at))
            .unwrap_or_default()
    }

    /// Boundary nodes registered on any surface of `chunk`, ascending.
    pub fn nodes_in_chunk(&self, chunk: ChunkCoord) -> Vec<NodeId> {
        self.graph.nodes_in_chunk(chunk)
    }

    pub fn node(&self, id: NodeId) -> Option<&BoundaryNode> {
        self.graph.node(id)
    }

    /// Every live node with its centroid truncated to a block.
    pub fn node_centroids(&self) -> Vec<(NodeId, BlockLocation)> {
        self.graph
            .iter()
            .map(|(id, node)| (id, node.centroid_block()))
            .collect()
    }

    pub fn graph(&self) -> &NodeGraph {
        &self.graph
    }

    pub fn node_count(&self) -> usize {
        self.graph.len()
    }

    pub fn region(&self, chunk: ChunkCoord) -> Option<&Region> {
        self.chunks.get(&chunk)
    }

    /// The seam region between two chunks, if both are indexed and
    /// orthogonally adjacent.
    pub fn boundary(&self, a: ChunkCoord, b: ChunkCoord) -> Option<&Region> {
        ChunkPair::new(a, b)
            .ok()
            .and_then(|pair| self.boundaries.get(&pair))
    }

    pub fn is_tracked(&self, chunk: ChunkCoord) -> bool {
        self.chunks.contains_key(&chunk)
    }

    /// Indexed chunks, ascending.
    pub fn tracked_chunks(&self) -> Vec<ChunkCoord> {
        let mut chunks: Vec<_> = self.chunks.keys().copied().collect();
        chunks.sort();
        chunks
    }

    /// Number of seam regions currently held.
    pub fn boundary_count(&self) -> usize {
        self.boundaries.len()
    }
}

// ---------------------------------------------------------------------------
// Stitching
// ---------------------------------------------------------------------------

fn inconsistent(msg: String) -> NavError {
    log::error!("{msg}");
    NavError::Inconsistent(msg)
}

/// Expand a coarse route into blocks.
fn stitch(
    chunks: &FxHashMap<ChunkCoord, Region>,
    boundaries: &FxHashMap<ChunkPair, Region>,
    graph: &NodeGraph,
    route: &[NodeId],
    start: BlockLocation,
    end: BlockLocation,
) -> Result<Vec<BlockLocation>, NavError> {
    let mut path = Vec::new();
    let mut cursor = start;

    for hop in route.windows(2) {
        let (prev_id, curr_id) = (hop[0], hop[1]);
        let (Some(prev), Some(curr)) = (graph.node(prev_id), graph.node(curr_id)) else {
            return Err(inconsistent(format!(
                "route hop {prev_id} -> {curr_id} references a dead node"
            )));
        };

        let Some((chunk, surface)) = shared_key(prev, curr, cursor) else {
            return Err(inconsistent(format!(
                "{prev_id} and {curr_id} are adjacent but share no chunk surface"
            )));
        };
        let (Some(entry), Some(exit)) = (
            prev.representative(chunk, surface),
            curr.representative(chunk, surface),
        ) else {
            return Err(inconsistent(format!(
                "missing representative on {chunk} surface {surface} for {prev_id} -> {curr_id}"
            )));
        };

        // Cross prev's seam to the side this hop leaves from.
        if cursor != entry {
            let seam = prev
                .pair()
                .and_then(|pair| boundaries.get(&pair))
                .ok_or_else(|| {
                    inconsistent(format!(
                        "{prev_id} needs a seam crossing from {cursor} but has no seam"
                    ))
                })?;
            append_segment(&mut path, seam, cursor, entry)?;
        }

        let region = chunks
            .get(&chunk)
            .ok_or_else(|| inconsistent(format!("route crosses unindexed {chunk}")))?;
        append_segment(&mut path, region, entry, exit)?;
        cursor = exit;
    }

    if cursor != end {
        return Err(inconsistent(format!(
            "stitched route ends at {cursor}, not {end}"
        )));
    }
    path.push(end);
    Ok(path)
}

/// The `(chunk, surface)` key a hop travels on. Prefers a key on which the
/// cursor already is `prev`'s representative.
fn shared_key(
    prev: &BoundaryNode,
    curr: &BoundaryNode,
    cursor: BlockLocation,
) -> Option<(ChunkCoord, SurfaceId)> {
    let mut fallback = None;
    for (chunk, surface) in prev.keys() {
        if !curr.has_key(chunk, surface) {
            continue;
        }
        if prev.representative(chunk, surface) == Some(cursor) {
            return Some((chunk, surface));
        }
        fallback.get_or_insert((chunk, surface));
    }
    fallback
}

/// Append the fine path `from -> to` inside `region`, minus its last block.
fn append_segment(
    path: &mut Vec<BlockLocation>,
    region: &Region,
    from: BlockLocation,
    to: BlockLocation,
) -> Result<(), NavError> {
    let segment = match region.find_path(from, to) {
        Ok(Some(segment)) => segment,
        Ok(None) => {
            return Err(inconsistent(format!(
                "{from} and {to} lie on different surfaces of region at {}",
                region.anchor()
            )));
        }
        Err(NavError::NotOnSurface { location }) => {
            return Err(inconsistent(format!(
                "representative {location} is off-surface in region at {}",
                region.anchor()
            )));
        }
        Err(e) => return Err(e),
    };
    if let Some((_, head)) = segment.split_last() {
        path.extend_from_slice(head);
    }
    Ok(())
}
