// Best-first search shared by the fine (block) and coarse (boundary node)
// levels.
//
// Both levels are dense index spaces: a region addresses blocks by flat
// index, the node graph addresses nodes by arena slot. Search state
// (accumulated cost, predecessor, explored/processed flags) therefore lives
// in `Vec`s indexed by node, as in any grid A*. The open set is the
// re-keyable `PriorityQueue`: priority is `-(cost + heuristic)` so the
// cheapest estimate polls first, and a node reached again more cheaply is
// re-keyed in place rather than pushed twice.
//
// A search that exhausts its queue returns `None`. What that means is the
// caller's call: for the coarse graph it is an ordinary "no route", for a
// region whose flood fill put both ends on one surface it is corruption.
//
// See also: `region.rs` (block-level search space), `node.rs` (node-level
// search space), `world_index.rs` which drives both.
//
// **Critical constraint: determinism.** Neighbours are visited in the order
// the search space yields them (direction table order for blocks, ascending
// `NodeId` for nodes), and the queue breaks ties LIFO, so the returned path is
// a pure function of the graph and endpoints.

use crate::node::NodeGraph;
use crate::queue::PriorityQueue;
use crate::types::NodeId;

/// A graph the best-first search can walk, addressed by dense indices.
pub trait SearchSpace {
    /// Exclusive upper bound on node indices.
    fn node_bound(&self) -> usize;

    /// Append `(neighbour, step cost)` for every edge out of `node`.
    fn neighbors(&self, node: usize, out: &mut Vec<(usize, f64)>);

    /// Straight-line estimate from `node` to `goal`. Must not overestimate.
    fn heuristic(&self, node: usize, goal: usize) -> f64;
}

/// The result of a successful search.
#[derive(Clone, Debug, PartialEq)]
pub struct PathResult {
    /// Node indices from start to goal, inclusive.
    pub nodes: Vec<usize>,
    /// Sum of step costs along `nodes`.
    pub total_cost: f64,
}

/// Find the cheapest path from `start` to `goal`, or `None` if the queue
/// runs dry first.
pub fn best_first<S: SearchSpace + ?Sized>(
    space: &S,
    start: usize,
    goal: usize,
) -> Option<PathResult> {
    let n = space.node_bound();
    if start >= n || goal >= n {
        return None;
    }

    // Marked once a node has been queued at least once.
    let mut explored = vec![false; n];
    // Marked once a node has been polled; its cost is final.
    let mut processed = vec![false; n];
    let mut came_from: Vec<Option<usize>> = vec![None; n];
    let mut cost = vec![0.0f64; n];

    let mut open = PriorityQueue::new();
    open.add(start, 0.0);
    explored[start] = true;

    let mut scratch = Vec::new();
    while let Some(current) = open.poll() {
        if current == goal {
            return Some(PathResult {
                nodes: reconstruct_path(&came_from, start, goal),
                total_cost: cost[goal],
            });
        }
        processed[current] = true;

        scratch.clear();
        space.neighbors(current, &mut scratch);
        for &(next, step) in &scratch {
            if processed[next] {
                continue;
            }
            let tentative = cost[current] + step;
            let previously_explored = explored[next];
            if previously_explored && cost[next] <= tentative {
                continue;
            }
            explored[next] = true;
            cost[next] = tentative;
            came_from[next] = Some(current);

            let priority = -(tentative + space.heuristic(next, goal));
            if previously_explored {
                // An explored, unprocessed node is always still queued.
                if open.reprioritize(next, priority).is_err() {
                    open.add(next, priority);
                }
            } else {
                open.add(next, priority);
            }
        }
    }

    None
}

fn reconstruct_path(came_from: &[Option<usize>], start: usize, goal: usize) -> Vec<usize> {
    let mut path = vec![goal];
    let mut current = goal;
    while current != start {
        match came_from[current] {
            Some(prev) => {
                path.push(prev);
                current = prev;
            }
            None => break,
        }
    }
    path.reverse();
    path
}

// ---------------------------------------------------------------------------
// Coarse level
// ---------------------------------------------------------------------------

/// Node-graph adapter: edges are the adjacency sets, costs and heuristic are
/// centroid-to-centroid distances.
struct CoarseSpace<'a>(&'a NodeGraph);

impl SearchSpace for CoarseSpace<'_> {
    fn node_bound(&self) -> usize {
        self.0.capacity()
    }

    fn neighbors(&self, node: usize, out: &mut Vec<(usize, f64)>) {
        let Some(from) = self.0.node(NodeId(node as u32)) else {
            return;
        };
        for &peer in from.adjacent() {
            if let Some(to) = self.0.node(peer) {
                out.push((peer.index(), from.distance(to)));
            }
        }
    }

    fn heuristic(&self, node: usize, goal: usize) -> f64 {
        match (
            self.0.node(NodeId(node as u32)),
            self.0.node(NodeId(goal as u32)),
        ) {
            (Some(a), Some(b)) => a.distance(b),
            _ => 0.0,
        }
    }
}

/// Route between two live nodes over the current adjacency, or `None` when
/// `goal` is unreachable.
pub fn coarse_path(graph: &NodeGraph, start: NodeId, goal: NodeId) -> Option<Vec<NodeId>> {
    if graph.node(start).is_none() || graph.node(goal).is_none() {
        return None;
    }
    best_first(&CoarseSpace(graph), start.index(), goal.index())
        .map(|result| result.nodes.into_iter().map(|i| NodeId(i as u32)).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::BoundaryNode;
    use crate::types::BlockLocation;

    /// Points on a line with explicit weighted edges; heuristic is the gap
    /// between positions.
    struct LineGraph {
        positions: Vec<f64>,
        edges: Vec<(usize, usize, f64)>,
    }

    impl SearchSpace for LineGraph {
        fn node_bound(&self) -> usize {
            self.positions.len()
        }

        fn neighbors(&self, node: usize, out: &mut Vec<(usize, f64)>) {
            for &(a, b, c) in &self.edges {
                if a == node {
                    out.push((b, c));
                } else if b == node {
                    out.push((a, c));
                }
            }
        }

        fn heuristic(&self, node: usize, goal: usize) -> f64 {
            (self.positions[node] - self.positions[goal]).abs()
        }
    }

    #[test]
    fn trivial_path() {
        let g = LineGraph {
            positions: vec![0.0],
            edges: vec![],
        };
        let r = best_first(&g, 0, 0).unwrap();
        assert_eq!(r.nodes, vec![0]);
        assert_eq!(r.total_cost, 0.0);
    }

    #[test]
    fn simple_chain() {
        let g = LineGraph {
            positions: vec![0.0, 1.0, 2.0, 3.0],
            edges: vec![(0, 1, 1.0), (1, 2, 1.0), (2, 3, 1.0)],
        };
        let r = best_first(&g, 0, 3).unwrap();
        assert_eq!(r.nodes, vec![0, 1, 2, 3]);
        assert_eq!(r.total_cost, 3.0);
    }

    #[test]
    fn chooses_cheaper_detour() {
        // Direct edge 0-3 costs 10; the chain 0-1-2-3 costs 3.5.
        let g = LineGraph {
            positions: vec![0.0, 1.0, 2.0, 3.0],
            edges: vec![(0, 3, 10.0), (0, 1, 1.0), (1, 2, 1.0), (2, 3, 1.5)],
        };
        let r = best_first(&g, 0, 3).unwrap();
        assert_eq!(r.nodes, vec![0, 1, 2, 3]);
        assert_eq!(r.total_cost, 3.5);
    }

    #[test]
    fn relaxes_node_reached_cheaper_later() {
        // Node 2 is first reached via 0-2 (cost 5), then via 0-1-2 (cost 2).
        let g = LineGraph {
            positions: vec![0.0, 0.0, 0.0, 0.0],
            edges: vec![(0, 2, 5.0), (0, 1, 1.0), (1, 2, 1.0), (2, 3, 1.0)],
        };
        let r = best_first(&g, 0, 3).unwrap();
        assert_eq!(r.nodes, vec![0, 1, 2, 3]);
        assert_eq!(r.total_cost, 3.0);
    }

    #[test]
    fn no_path_returns_none() {
        let g = LineGraph {
            positions: vec![0.0, 1.0, 5.0],
            edges: vec![(0, 1, 1.0)],
        };
        assert!(best_first(&g, 0, 2).is_none());
    }

    #[test]
    fn out_of_range_endpoints_return_none() {
        let g = LineGraph {
            positions: vec![0.0],
            edges: vec![],
        };
        assert!(best_first(&g, 0, 4).is_none());
    }

    #[test]
    fn deterministic_across_runs() {
        let g = LineGraph {
            positions: vec![0.0, 1.0, 1.0, 2.0],
            edges: vec![(0, 1, 1.0), (0, 2, 1.0), (1, 3, 1.0), (2, 3, 1.0)],
        };
        let first = best_first(&g, 0, 3).unwrap();
        for _ in 0..10 {
            assert_eq!(best_first(&g, 0, 3).unwrap(), first);
        }
    }

    #[test]
    fn coarse_path_over_node_graph() {
        let mut graph = NodeGraph::new();
        let a = graph.insert(BoundaryNode::ephemeral(BlockLocation::new(0, 0, 0), 1));
        let b = graph.insert(BoundaryNode::ephemeral(BlockLocation::new(5, 0, 0), 1));
        let c = graph.insert(BoundaryNode::ephemeral(BlockLocation::new(10, 0, 0), 1));
        let lonely = graph.insert(BoundaryNode::ephemeral(BlockLocation::new(3, 0, 3), 2));
        graph.connect(a, b);
        graph.connect(b, c);

        assert_eq!(coarse_path(&graph, a, c), Some(vec![a, b, c]));
        assert_eq!(coarse_path(&graph, c, a), Some(vec![c, b, a]));
        assert_eq!(coarse_path(&graph, a, lonely), None);
    }

    #[test]
    fn coarse_path_ignores_removed_nodes() {
        let mut graph = NodeGraph::new();
        let a = graph.insert(BoundaryNode::ephemeral(BlockLocation::new(0, 0, 0), 1));
        let b = graph.insert(BoundaryNode::ephemeral(BlockLocation::new(1, 0, 0), 1));
        graph.connect(a, b);
        graph.remove_node(b);
        assert_eq!(coarse_path(&graph, a, b), None);
    }
}
