// Boundary nodes and the coarse graph that links them.
//
// A `BoundaryNode` is one connected surface found inside a seam region
// between two adjacent chunks. It records which chunk surfaces it touches on
// each side, the centroid of its member blocks, and a representative block
// per (side, surface) to use as the fine-level entry/exit point. Ephemeral
// nodes built at query time for a path's endpoints are the degenerate case:
// both sides are the endpoint's own chunk and surface, and the only member
// block is the endpoint.
//
// `NodeGraph` stores nodes in a slot arena addressed by `NodeId`, with
// adjacency held as `BTreeSet<NodeId>` per node. A key index maps
// `(chunk, chunk surface)` to the nodes registered there; registering a node
// links it to every node already on each of its keys, so two nodes are
// adjacent exactly when they share a key. Removing a node severs its edges on
// both ends, drops it from every key list, and frees its slot for reuse.
//
// `Splice` is the scope guard for query-time nodes: nodes added through it
// are linked into the graph for the duration of one query and torn down when
// the guard drops, on every exit path.
//
// See also: `boundary.rs` which builds persistent nodes, `pathfinding.rs` for
// the coarse search, `world_index.rs` which owns the graph.
//
// **Critical constraint: determinism.** Key lists and adjacency are ordered
// collections, so clique linking and search neighbour order are reproducible.

use crate::types::{BlockLocation, ChunkCoord, ChunkPair, NodeId, SurfaceId};
use smallvec::SmallVec;
use std::collections::{BTreeMap, BTreeSet};
use std::ops::Deref;

/// The block a node uses as its crossing point for one chunk surface.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Representative {
    pub surface: SurfaceId,
    pub block: BlockLocation,
}

/// A vertex of the coarse graph.
#[derive(Clone, Debug)]
pub struct BoundaryNode {
    /// The two chunks bridged. Equal for ephemeral nodes.
    chunks: [ChunkCoord; 2],
    /// Surface id inside the seam region (0 for ephemeral nodes).
    boundary_surface: SurfaceId,
    /// Chunk surface ids touched on each side, ascending, no duplicates.
    surfaces: [SmallVec<[SurfaceId; 4]>; 2],
    centroid_sum: [f64; 3],
    block_count: u32,
    representatives: [SmallVec<[Representative; 2]>; 2],
    adjacent: BTreeSet<NodeId>,
}

impl BoundaryNode {
    /// An empty seam node between `one` (side 0) and `two` (side 1).
    pub fn bridging(one: ChunkCoord, two: ChunkCoord, boundary_surface: SurfaceId) -> Self {
        Self {
            chunks: [one, two],
            boundary_surface,
            surfaces: Default::default(),
            centroid_sum: [0.0; 3],
            block_count: 0,
            representatives: Default::default(),
            adjacent: BTreeSet::new(),
        }
    }

    /// A query-time node standing on `surface` at `at`.
    pub fn ephemeral(at: BlockLocation, surface: SurfaceId) -> Self {
        let chunk = at.chunk();
        let rep = Representative { surface, block: at };
        let mut node = Self::bridging(chunk, chunk, 0);
        node.centroid_sum = [f64::from(at.x), f64::from(at.y), f64::from(at.z)];
        node.block_count = 1;
        for (surfaces, reps) in node.surfaces.iter_mut().zip(&mut node.representatives) {
            surfaces.push(surface);
            reps.push(rep);
        }
        node
    }

    /// Fold a member block into the centroid and record the chunk surface it
    /// sits on. `surface` 0 contributes to the centroid only.
    pub fn accumulate(&mut self, at: BlockLocation, side: usize, surface: SurfaceId) {
        self.centroid_sum[0] += f64::from(at.x);
        self.centroid_sum[1] += f64::from(at.y);
        self.centroid_sum[2] += f64::from(at.z);
        self.block_count += 1;

        if surface != 0 {
            let set = &mut self.surfaces[side];
            if let Err(pos) = set.binary_search(&surface) {
                set.insert(pos, surface);
            }
        }
    }

    /// Offer `at` as the representative for `(side, surface)`. The first
    /// offer wins until a strictly closer block (to the centroid) arrives.
    pub fn offer_representative(&mut self, at: BlockLocation, side: usize, surface: SurfaceId) {
        let centroid = self.centroid();
        let reps = &mut self.representatives[side];
        match reps.iter_mut().find(|r| r.surface == surface) {
            None => reps.push(Representative { surface, block: at }),
            Some(current) => {
                if at.distance_squared_to(centroid) < current.block.distance_squared_to(centroid) {
                    current.block = at;
                }
            }
        }
    }

    pub fn chunks(&self) -> [ChunkCoord; 2] {
        self.chunks
    }

    pub fn boundary_surface(&self) -> SurfaceId {
        self.boundary_surface
    }

    pub fn surfaces(&self, side: usize) -> &[SurfaceId] {
        &self.surfaces[side]
    }

    pub fn representatives(&self, side: usize) -> &[Representative] {
        &self.representatives[side]
    }

    pub fn block_count(&self) -> u32 {
        self.block_count
    }

    pub fn adjacent(&self) -> &BTreeSet<NodeId> {
        &self.adjacent
    }

    /// True unless the node is a query-time endpoint node.
    pub fn is_bridge(&self) -> bool {
        self.chunks[0] != self.chunks[1]
    }

    /// The seam this node lies in, for bridging nodes.
    pub fn pair(&self) -> Option<ChunkPair> {
        if self.is_bridge() {
            ChunkPair::new(self.chunks[0], self.chunks[1]).ok()
        } else {
            None
        }
    }

    /// True when the node reaches a chunk surface on both sides.
    pub fn touches_both_sides(&self) -> bool {
        !self.surfaces[0].is_empty() && !self.surfaces[1].is_empty()
    }

    /// Average position of the member blocks.
    pub fn centroid(&self) -> [f64; 3] {
        let n = f64::from(self.block_count.max(1));
        [
            self.centroid_sum[0] / n,
            self.centroid_sum[1] / n,
            self.centroid_sum[2] / n,
        ]
    }

    /// Centroid truncated toward zero, for display.
    pub fn centroid_block(&self) -> BlockLocation {
        let [x, y, z] = self.centroid();
        BlockLocation::new(x as i32, y as i32, z as i32)
    }

    /// Euclidean distance between two centroids.
    pub fn distance(&self, other: &BoundaryNode) -> f64 {
        let [x, y, z] = other.centroid();
        let [a, b, c] = self.centroid();
        ((x - a).powi(2) + (y - b).powi(2) + (z - c).powi(2)).sqrt()
    }

    /// Every `(chunk, surface)` key the node touches, side 0 first.
    pub fn keys(&self) -> impl Iterator<Item = (ChunkCoord, SurfaceId)> + '_ {
        (0..2).flat_map(move |side| self.surfaces[side].iter().map(move |&s| (self.chunks[side], s)))
    }

    pub fn has_key(&self, chunk: ChunkCoord, surface: SurfaceId) -> bool {
        self.keys().any(|k| k == (chunk, surface))
    }

    /// The crossing block for a chunk surface this node touches.
    pub fn representative(&self, chunk: ChunkCoord, surface: SurfaceId) -> Option<BlockLocation> {
        (0..2)
            .filter(|&side| self.chunks[side] == chunk)
            .flat_map(|side| self.representatives[side].iter())
            .find(|r| r.surface == surface)
            .map(|r| r.block)
    }
}

// ---------------------------------------------------------------------------
// NodeGraph
// ---------------------------------------------------------------------------

/// Slot arena of boundary nodes plus the `(chunk, surface)` key index.
#[derive(Clone, Debug, Default)]
pub struct NodeGraph {
    nodes: Vec<Option<BoundaryNode>>,
    free: Vec<u32>,
    live: usize,
    index: BTreeMap<ChunkCoord, BTreeMap<SurfaceId, Vec<NodeId>>>,
}

impl NodeGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a node without linking or registering it.
    pub fn insert(&mut self, mut node: BoundaryNode) -> NodeId {
        node.adjacent.clear();
        self.live += 1;
        match self.free.pop() {
            Some(slot) => {
                self.nodes[slot as usize] = Some(node);
                NodeId(slot)
            }
            None => {
                self.nodes.push(Some(node));
                NodeId((self.nodes.len() - 1) as u32)
            }
        }
    }

    pub fn node(&self, id: NodeId) -> Option<&BoundaryNode> {
        self.nodes.get(id.index()).and_then(Option::as_ref)
    }

    /// Number of live nodes.
    pub fn len(&self) -> usize {
        self.live
    }

    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    /// Number of slots, live or free. Every live `NodeId` is below this.
    pub fn capacity(&self) -> usize {
        self.nodes.len()
    }

    /// Live nodes in slot order.
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &BoundaryNode)> {
        self.nodes
            .iter()
            .enumerate()
            .filter_map(|(i, slot)| slot.as_ref().map(|n| (NodeId(i as u32), n)))
    }

    /// Add a symmetric edge. Self-loops and dead ids are ignored.
    pub fn connect(&mut self, a: NodeId, b: NodeId) {
        if a == b || self.node(a).is_none() || self.node(b).is_none() {
            return;
        }
        if let Some(Some(node)) = self.nodes.get_mut(a.index()) {
            node.adjacent.insert(b);
        }
        if let Some(Some(node)) = self.nodes.get_mut(b.index()) {
            node.adjacent.insert(a);
        }
    }

    /// Sever every edge of `id`, on both ends.
    pub fn disconnect_all(&mut self, id: NodeId) {
        let peers = match self.nodes.get_mut(id.index()) {
            Some(Some(node)) => std::mem::take(&mut node.adjacent),
            _ => return,
        };
        for peer in peers {
            if let Some(Some(node)) = self.nodes.get_mut(peer.index()) {
                node.adjacent.remove(&id);
            }
        }
    }

    /// Register a stored node under each of its keys, linking it to every
    /// node already registered on the same key.
    pub fn register(&mut self, id: NodeId) {
        let keys: SmallVec<[(ChunkCoord, SurfaceId); 8]> = match self.node(id) {
            Some(node) => node.keys().collect(),
            None => return,
        };
        for (chunk, surface) in keys {
            let list = self.index.entry(chunk).or_default().entry(surface).or_default();
            if list.contains(&id) {
                continue;
            }
            let peers = list.clone();
            list.push(id);
            for peer in peers {
                self.connect(id, peer);
            }
        }
    }

    /// Tear a node down: sever its edges, drop it from every key list, and
    /// free its slot. Returns the removed node.
    pub fn remove_node(&mut self, id: NodeId) -> Option<BoundaryNode> {
        self.disconnect_all(id);
        let node = self.nodes.get_mut(id.index())?.take()?;
        for (chunk, surface) in node.keys() {
            let Some(by_surface) = self.index.get_mut(&chunk) else {
                continue;
            };
            if let Some(list) = by_surface.get_mut(&surface) {
                list.retain(|&n| n != id);
                if list.is_empty() {
                    by_surface.remove(&surface);
                }
            }
            if by_surface.is_empty() {
                self.index.remove(&chunk);
            }
        }
        self.free.push(id.0);
        self.live -= 1;
        Some(node)
    }

    /// Nodes registered on `(chunk, surface)`, in registration order.
    pub fn nodes_on(&self, chunk: ChunkCoord, surface: SurfaceId) -> &[NodeId] {
        self.index
            .get(&chunk)
            .and_then(|m| m.get(&surface))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Every node registered on any surface of `chunk`, ascending.
    pub fn nodes_in_chunk(&self, chunk: ChunkCoord) -> Vec<NodeId> {
        let ids: BTreeSet<NodeId> = self
            .index
            .get(&chunk)
            .into_iter()
            .flat_map(|m| m.values().flatten().copied())
            .collect();
        ids.into_iter().collect()
    }

    /// Tear down every node registered on `chunk`. Returns how many went.
    pub fn remove_chunk(&mut self, chunk: ChunkCoord) -> usize {
        let ids = self.nodes_in_chunk(chunk);
        for &id in &ids {
            self.remove_node(id);
        }
        ids.len()
    }
}

// ---------------------------------------------------------------------------
// Splice guard
// ---------------------------------------------------------------------------

/// Scoped splice of query-time nodes into a `NodeGraph`. Dropping the guard
/// removes them and every edge they gained.
pub struct Splice<'a> {
    graph: &'a mut NodeGraph,
    ephemeral: SmallVec<[NodeId; 2]>,
}

impl<'a> Splice<'a> {
    pub fn new(graph: &'a mut NodeGraph) -> Self {
        Self {
            graph,
            ephemeral: SmallVec::new(),
        }
    }

    /// Add an endpoint node at `at` on `surface`, linked to every node
    /// registered on its `(chunk, surface)` key.
    pub fn add_endpoint(&mut self, at: BlockLocation, surface: SurfaceId) -> NodeId {
        let id = self.graph.insert(BoundaryNode::ephemeral(at, surface));
        self.ephemeral.push(id);
        let peers = self.graph.nodes_on(at.chunk(), surface).to_vec();
        for peer in peers {
            self.graph.connect(id, peer);
        }
        id
    }

    /// Directly link two nodes for the lifetime of the splice.
    pub fn link(&mut self, a: NodeId, b: NodeId) {
        self.graph.connect(a, b);
    }
}

impl Deref for Splice<'_> {
    type Target = NodeGraph;

    fn deref(&self) -> &NodeGraph {
        self.graph
    }
}

impl Drop for Splice<'_> {
    fn drop(&mut self) {
        for id in self.ephemeral.drain(..) {
            self.graph.remove_node(id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(x: i32, y: i32, z: i32) -> BlockLocation {
        BlockLocation::new(x, y, z)
    }

    /// A seam node between chunks (0, 0) and (1, 0) touching the given
    /// surfaces, with one member block per side.
    fn seam_node(left: &[SurfaceId], right: &[SurfaceId]) -> BoundaryNode {
        let mut node = BoundaryNode::bridging(ChunkCoord::new(0, 0), ChunkCoord::new(1, 0), 1);
        for &s in left {
            node.accumulate(at(15, 4, 3), 0, s);
        }
        for &s in right {
            node.accumulate(at(16, 4, 3), 1, s);
        }
        node
    }

    fn assert_no_dangling(graph: &NodeGraph) {
        for (id, node) in graph.iter() {
            for &peer in node.adjacent() {
                let other = graph.node(peer).expect("edge to dead node");
                assert!(other.adjacent().contains(&id), "{id} -> {peer} is one-way");
            }
        }
    }

    #[test]
    fn accumulate_tracks_centroid_and_sorted_surfaces() {
        let mut node = BoundaryNode::bridging(ChunkCoord::new(0, 0), ChunkCoord::new(0, 1), 3);
        node.accumulate(at(0, 10, 15), 0, 4);
        node.accumulate(at(2, 12, 15), 0, 2);
        node.accumulate(at(4, 14, 16), 1, 0);
        node.accumulate(at(2, 12, 16), 0, 4);

        assert_eq!(node.block_count(), 4);
        assert_eq!(node.centroid(), [2.0, 12.0, 15.5]);
        assert_eq!(node.surfaces(0), &[2, 4]);
        assert!(node.surfaces(1).is_empty());
        assert!(!node.touches_both_sides());
        assert_eq!(node.boundary_surface(), 3);
    }

    #[test]
    fn representative_prefers_strictly_closer_blocks() {
        let mut node = BoundaryNode::bridging(ChunkCoord::new(0, 0), ChunkCoord::new(1, 0), 1);
        for x in [13, 14, 15, 16] {
            node.accumulate(at(x, 0, 0), 0, 1);
        }
        // Centroid x = 14.5: 14 and 15 tie, the earlier offer stays.
        for x in [13, 14, 15, 16] {
            node.offer_representative(at(x, 0, 0), 0, 1);
        }
        assert_eq!(node.representative(ChunkCoord::new(0, 0), 1), Some(at(14, 0, 0)));
        assert_eq!(node.representative(ChunkCoord::new(1, 0), 1), None);
        assert_eq!(node.representative(ChunkCoord::new(0, 0), 2), None);
    }

    #[test]
    fn representatives_are_kept_per_surface() {
        let mut node = BoundaryNode::bridging(ChunkCoord::new(0, 0), ChunkCoord::new(1, 0), 1);
        node.accumulate(at(15, 0, 0), 0, 1);
        node.accumulate(at(15, 5, 0), 0, 2);
        node.offer_representative(at(15, 0, 0), 0, 1);
        node.offer_representative(at(15, 5, 0), 0, 2);
        assert_eq!(node.representatives(0).len(), 2);
        assert_eq!(node.representative(ChunkCoord::new(0, 0), 2), Some(at(15, 5, 0)));
    }

    #[test]
    fn ephemeral_node_is_its_own_representative() {
        let node = BoundaryNode::ephemeral(at(-3, 7, 20), 5);
        let chunk = ChunkCoord::new(-1, 1);
        assert_eq!(node.chunks(), [chunk, chunk]);
        assert!(!node.is_bridge());
        assert_eq!(node.pair(), None);
        assert_eq!(node.centroid(), [-3.0, 7.0, 20.0]);
        assert_eq!(node.representative(chunk, 5), Some(at(-3, 7, 20)));
        assert!(node.has_key(chunk, 5));
        assert!(!node.has_key(chunk, 4));
    }

    #[test]
    fn centroid_block_truncates_toward_zero() {
        let mut node = BoundaryNode::bridging(ChunkCoord::new(-1, 0), ChunkCoord::new(0, 0), 1);
        node.accumulate(at(-1, 3, 2), 0, 1);
        node.accumulate(at(0, 4, 2), 1, 1);
        assert_eq!(node.centroid(), [-0.5, 3.5, 2.0]);
        assert_eq!(node.centroid_block(), at(0, 3, 2));
    }

    #[test]
    fn register_clique_connects_shared_keys() {
        let mut graph = NodeGraph::new();
        let a = graph.insert(seam_node(&[1], &[1]));
        let b = graph.insert(seam_node(&[1], &[2]));
        let c = graph.insert(seam_node(&[3], &[2]));
        let d = graph.insert(seam_node(&[4], &[4]));
        for id in [a, b, c, d] {
            graph.register(id);
        }

        let adj = |id| graph.node(id).unwrap().adjacent().iter().copied().collect::<Vec<_>>();
        assert_eq!(adj(a), vec![b]);
        assert_eq!(adj(b), vec![a, c]);
        assert_eq!(adj(c), vec![b]);
        assert!(adj(d).is_empty());
        assert_eq!(graph.nodes_on(ChunkCoord::new(0, 0), 1), &[a, b]);
        assert_eq!(graph.nodes_on(ChunkCoord::new(1, 0), 2), &[b, c]);
        assert_no_dangling(&graph);
    }

    #[test]
    fn register_twice_is_a_no_op() {
        let mut graph = NodeGraph::new();
        let a = graph.insert(seam_node(&[1], &[1]));
        let b = graph.insert(seam_node(&[1], &[1]));
        graph.register(a);
        graph.register(b);
        graph.register(b);
        assert_eq!(graph.nodes_on(ChunkCoord::new(0, 0), 1), &[a, b]);
        assert_eq!(graph.node(b).unwrap().adjacent().len(), 1);
    }

    #[test]
    fn remove_node_cleans_edges_index_and_reuses_slot() {
        let mut graph = NodeGraph::new();
        let a = graph.insert(seam_node(&[1], &[1]));
        let b = graph.insert(seam_node(&[1], &[1]));
        graph.register(a);
        graph.register(b);

        let removed = graph.remove_node(a).unwrap();
        assert!(removed.adjacent().is_empty());
        assert!(graph.node(a).is_none());
        assert!(graph.node(b).unwrap().adjacent().is_empty());
        assert_eq!(graph.nodes_on(ChunkCoord::new(0, 0), 1), &[b]);
        assert_eq!(graph.len(), 1);
        assert!(graph.remove_node(a).is_none());

        let again = graph.insert(seam_node(&[1], &[1]));
        assert_eq!(again, a);
        assert_eq!(graph.capacity(), 2);
        assert_no_dangling(&graph);
    }

    #[test]
    fn remove_chunk_drops_nodes_from_neighbour_keys() {
        let mut graph = NodeGraph::new();
        let a = graph.insert(seam_node(&[1], &[1]));
        graph.register(a);
        // A node on the far side of chunk (1, 0), sharing its surface 1.
        let mut far = BoundaryNode::bridging(ChunkCoord::new(1, 0), ChunkCoord::new(2, 0), 1);
        far.accumulate(at(31, 4, 3), 0, 1);
        far.accumulate(at(32, 4, 3), 1, 1);
        let f = graph.insert(far);
        graph.register(f);
        assert!(graph.node(f).unwrap().adjacent().contains(&a));

        assert_eq!(graph.remove_chunk(ChunkCoord::new(0, 0)), 1);
        assert_eq!(graph.nodes_on(ChunkCoord::new(1, 0), 1), &[f]);
        assert!(graph.nodes_in_chunk(ChunkCoord::new(0, 0)).is_empty());
        assert!(graph.node(f).unwrap().adjacent().is_empty());
        assert_no_dangling(&graph);
    }

    #[test]
    fn splice_removes_endpoints_on_drop() {
        let mut graph = NodeGraph::new();
        let a = graph.insert(seam_node(&[1], &[1]));
        graph.register(a);
        {
            let mut splice = Splice::new(&mut graph);
            let s = splice.add_endpoint(at(3, 4, 3), 1);
            let e = splice.add_endpoint(at(20, 4, 3), 1);
            splice.link(s, e);
            assert_eq!(splice.len(), 3);
            assert!(splice.node(a).unwrap().adjacent().contains(&s));
            assert!(splice.node(a).unwrap().adjacent().contains(&e));
            assert!(splice.node(s).unwrap().adjacent().contains(&e));
        }
        assert_eq!(graph.len(), 1);
        assert!(graph.node(a).unwrap().adjacent().is_empty());
        assert_eq!(graph.nodes_on(ChunkCoord::new(0, 0), 1), &[a]);
    }
}
