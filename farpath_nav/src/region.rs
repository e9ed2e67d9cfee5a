// Per-volume walkability analysis: the fine level of the two-level search.
//
// A `Region` is an anchored box of blocks (a whole chunk column, or the
// 2-block-thick seam between two chunks). `rebuild` re-reads live block state
// and derives, per block:
//
// - passable: open to an agent's body (passable in the host sense, not liquid)
// - solid: not passable in the host sense (liquids are neither)
// - free space: the two blocks above are passable; positions above the top of
//   the volume count as passable
// - walkable: solid with free space, i.e. an agent can stand on it
// - surface id: flood-filled connected component of walkable blocks (0 = none)
// - connection mask: one `Direction` bit per neighbour the block connects to
//
// Flood fill seeds in x, z, y scan order and expands breadth-first through the
// direction table, so surface ids are stable for identical block data. Each
// unordered block pair is tested once; a passing test sets the matching bits
// on both blocks, which keeps masks symmetric.
//
// Flat indices are `x + z * width + y * width * depth` in region-local
// coordinates. Public accessors take world `BlockLocation`s and treat
// anything outside the box as surface 0 / mask 0.
//
// See also: `boundary.rs` for seam regions and node extraction,
// `pathfinding.rs` for the search `find_path` runs over connection masks.
//
// **Critical constraint: determinism.** Surface ids and found paths depend
// only on block data and scan order.

use crate::bitset::BitSet;
use crate::direction::{directions_in, Direction};
use crate::error::NavError;
use crate::pathfinding::{best_first, SearchSpace};
use crate::types::{BlockLocation, ChunkCoord, SurfaceId, CHUNK_SIZE};
use crate::world::BlockSource;
use std::collections::VecDeque;

/// An anchored box of blocks with derived walkability and surfaces.
#[derive(Clone, Debug)]
pub struct Region {
    anchor: BlockLocation,
    width: i32,
    height: i32,
    depth: i32,

    passable: BitSet,
    solid: BitSet,
    free_space: BitSet,
    walkable: BitSet,
    surfaces: Vec<SurfaceId>,
    connection_masks: Vec<u32>,
    surface_count: u16,
}

impl Region {
    /// An empty (unbuilt) region. Every block reads as surface 0 until
    /// `rebuild` runs.
    pub fn new(anchor: BlockLocation, width: u32, height: u32, depth: u32) -> Self {
        let count = width as usize * height as usize * depth as usize;
        Self {
            anchor,
            width: width as i32,
            height: height as i32,
            depth: depth as i32,
            passable: BitSet::new(count),
            solid: BitSet::new(count),
            free_space: BitSet::new(count),
            walkable: BitSet::new(count),
            surfaces: vec![0; count],
            connection_masks: vec![0; count],
            surface_count: 0,
        }
    }

    /// The full-height column of `chunk`.
    pub fn for_chunk(chunk: ChunkCoord, height: u32) -> Self {
        Self::new(
            chunk.origin(),
            CHUNK_SIZE as u32,
            height,
            CHUNK_SIZE as u32,
        )
    }

    pub fn anchor(&self) -> BlockLocation {
        self.anchor
    }

    pub fn width(&self) -> u32 {
        self.width as u32
    }

    pub fn height(&self) -> u32 {
        self.height as u32
    }

    pub fn depth(&self) -> u32 {
        self.depth as u32
    }

    pub fn block_count(&self) -> usize {
        self.surfaces.len()
    }

    /// Number of surfaces assigned by the last rebuild. Ids run `1..=count`.
    pub fn surface_count(&self) -> u16 {
        self.surface_count
    }

    // -----------------------------------------------------------------------
    // Indexing
    // -----------------------------------------------------------------------

    #[inline]
    fn index(&self, x: i32, y: i32, z: i32) -> usize {
        (x + z * self.width + y * self.width * self.depth) as usize
    }

    /// The region-local position of a flat index, as a world location.
    pub fn reverse_index(&self, index: usize) -> BlockLocation {
        let index = index as i32;
        let x = index % self.width;
        let z = (index / self.width) % self.depth;
        let y = index / self.width / self.depth;
        self.anchor.offset(x, y, z)
    }

    #[inline]
    fn local_in_bounds(&self, x: i32, y: i32, z: i32) -> bool {
        x >= 0 && y >= 0 && z >= 0 && x < self.width && y < self.height && z < self.depth
    }

    /// Flat index of a world location, or `None` outside the box.
    fn index_of(&self, at: BlockLocation) -> Option<usize> {
        let (x, y, z) = (
            at.x - self.anchor.x,
            at.y - self.anchor.y,
            at.z - self.anchor.z,
        );
        self.local_in_bounds(x, y, z).then(|| self.index(x, y, z))
    }

    /// True if the world location lies inside this region's box.
    pub fn contains(&self, at: BlockLocation) -> bool {
        self.index_of(at).is_some()
    }

    // -----------------------------------------------------------------------
    // Rebuild
    // -----------------------------------------------------------------------

    /// Re-read every block from `source` and recompute all derived data.
    pub fn rebuild<S: BlockSource + ?Sized>(&mut self, source: &S) {
        let count = self.block_count();
        self.passable = BitSet::new(count);
        self.solid = BitSet::new(count);
        self.free_space = BitSet::new(count);
        self.walkable = BitSet::new(count);
        self.surfaces = vec![0; count];
        self.connection_masks = vec![0; count];
        self.surface_count = 0;

        // Pass 1: classification.
        for x in 0..self.width {
            for z in 0..self.depth {
                for y in 0..self.height {
                    let i = self.index(x, y, z);
                    let at = self.anchor.offset(x, y, z);
                    let host_passable = source.is_passable(at);
                    self.passable.set(i, host_passable && !source.is_liquid(at));
                    self.solid.set(i, !host_passable);
                }
            }
        }

        // Pass 2: free space and walkability, top-down per column.
        for x in 0..self.width {
            for z in 0..self.depth {
                let mut one_above: Option<usize> = None;
                let mut two_above: Option<usize> = None;
                for y in (0..self.height).rev() {
                    let i = self.index(x, y, z);
                    let above_free = one_above.is_none_or(|a| self.passable.get(a))
                        && two_above.is_none_or(|a| self.passable.get(a));
                    self.free_space.set(i, above_free);
                    self.walkable.set(i, above_free && self.solid.get(i));
                    two_above = one_above;
                    one_above = Some(i);
                }
            }
        }

        // Pass 3: surfaces and connection masks.
        let mut checked = vec![0u32; count];
        let mut queue = VecDeque::new();
        let mut next_id: SurfaceId = 1;
        for x in 0..self.width {
            for z in 0..self.depth {
                for y in 0..self.height {
                    let i = self.index(x, y, z);
                    if !self.walkable.get(i) || self.surfaces[i] != 0 {
                        continue;
                    }
                    self.flood_fill(next_id, (x, y, z), &mut checked, &mut queue);
                    self.surface_count = next_id;
                    next_id = next_id.wrapping_add(1);
                }
            }
        }
    }

    /// Breadth-first fill of `surface` from `seed`, setting connection bits
    /// for every pair that passes `can_walk_between`.
    fn flood_fill(
        &mut self,
        surface: SurfaceId,
        seed: (i32, i32, i32),
        checked: &mut [u32],
        queue: &mut VecDeque<(i32, i32, i32)>,
    ) {
        let (sx, sy, sz) = seed;
        let seed_index = self.index(sx, sy, sz);
        self.surfaces[seed_index] = surface;
        queue.clear();
        queue.push_back(seed);

        while let Some((x, y, z)) = queue.pop_front() {
            let i = self.index(x, y, z);
            for dir in Direction::ALL {
                let (dx, dy, dz) = dir.offset();
                let (x2, y2, z2) = (x + dx, y + dy, z + dz);
                if !self.local_in_bounds(x2, y2, z2) {
                    continue;
                }
                let j = self.index(x2, y2, z2);
                if !self.walkable.get(j) || checked[i] & dir.mask() != 0 {
                    continue;
                }

                let back = dir.opposite();
                checked[i] |= dir.mask();
                checked[j] |= back.mask();

                if !self.can_walk_between((x, y, z), (x2, y2, z2)) {
                    continue;
                }
                self.connection_masks[i] |= dir.mask();
                self.connection_masks[j] |= back.mask();

                if self.surfaces[j] != 0 {
                    continue;
                }
                self.surfaces[j] = surface;
                queue.push_back((x2, y2, z2));
            }
        }
    }

    /// Whether an agent can step directly between two walkable blocks, given
    /// in region-local coordinates.
    fn can_walk_between(&self, a: (i32, i32, i32), b: (i32, i32, i32)) -> bool {
        let (x1, y1, z1) = a;
        let (x2, y2, z2) = b;
        let (dx, dy, dz) = (x2 - x1, y2 - y1, z2 - z1);
        if dx.abs() > 1 || dy.abs() > 1 || dz.abs() > 1 {
            return false;
        }

        // Straight up or down.
        if dx == 0 && dz == 0 {
            return true;
        }
        let cardinal = dx == 0 || dz == 0;

        if dy == 0 {
            if cardinal {
                return true;
            }
            // Diagonal: neither corner may cut through an obstruction.
            return self.free_space.get(self.index(x1, y1, z2))
                && self.free_space.get(self.index(x2, y2, z1));
        }

        // Step up or down: reason from the lower block.
        let ((lx, ly, lz), (hx, hy, hz)) = if y1 < y2 { (a, b) } else { (b, a) };

        // Headroom above the lower block to make the step.
        if !self.free_space.get(self.index(lx, ly + 1, lz)) {
            return false;
        }
        if cardinal {
            return true;
        }
        self.free_space.get(self.index(lx, hy, hz)) && self.free_space.get(self.index(hx, hy, lz))
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    /// Surface id at a world location; 0 when off any surface or outside.
    pub fn surface_id(&self, at: BlockLocation) -> SurfaceId {
        self.index_of(at).map_or(0, |i| self.surfaces[i])
    }

    /// Connection bitmask at a world location; 0 outside.
    pub fn connection_mask(&self, at: BlockLocation) -> u32 {
        self.index_of(at).map_or(0, |i| self.connection_masks[i])
    }

    /// The blocks `at` is directly connected to, in direction table order.
    pub fn connections(&self, at: BlockLocation) -> Vec<BlockLocation> {
        directions_in(self.connection_mask(at))
            .map(|dir| dir.step(at))
            .collect()
    }

    pub fn is_passable(&self, at: BlockLocation) -> bool {
        self.index_of(at).is_some_and(|i| self.passable.get(i))
    }

    pub fn is_solid(&self, at: BlockLocation) -> bool {
        self.index_of(at).is_some_and(|i| self.solid.get(i))
    }

    pub fn has_free_space(&self, at: BlockLocation) -> bool {
        self.index_of(at).is_some_and(|i| self.free_space.get(i))
    }

    pub fn is_walkable(&self, at: BlockLocation) -> bool {
        self.index_of(at).is_some_and(|i| self.walkable.get(i))
    }

    /// Every block with a nonzero surface id, in x, z, y scan order.
    pub fn surface_blocks(&self) -> impl Iterator<Item = (BlockLocation, SurfaceId)> + '_ {
        (0..self.width)
            .flat_map(move |x| {
                (0..self.depth).flat_map(move |z| (0..self.height).map(move |y| (x, y, z)))
            })
            .filter_map(move |(x, y, z)| {
                let id = self.surfaces[self.index(x, y, z)];
                (id != 0).then_some((self.anchor.offset(x, y, z), id))
            })
    }

    /// Shortest path across a single surface, inclusive of both ends.
    ///
    /// Both ends must be on a surface of this region (`NotOnSurface`
    /// otherwise). Ends on different surfaces give `Ok(None)`. Ends on the
    /// same surface that the search cannot join mean the flood fill and the
    /// connection masks disagree, reported as `Inconsistent`.
    pub fn find_path(
        &self,
        start: BlockLocation,
        end: BlockLocation,
    ) -> Result<Option<Vec<BlockLocation>>, NavError> {
        let (start_i, start_surface) = self.surfaced_index(start)?;
        let (end_i, end_surface) = self.surfaced_index(end)?;
        if start_surface != end_surface {
            return Ok(None);
        }

        match best_first(self, start_i, end_i) {
            Some(result) => Ok(Some(
                result
                    .nodes
                    .into_iter()
                    .map(|i| self.reverse_index(i))
                    .collect(),
            )),
            None => {
                let msg = format!(
                    "no route between {start} and {end} on surface {start_surface} of region at {}",
                    self.anchor
                );
                log::error!("{msg}");
                Err(NavError::Inconsistent(msg))
            }
        }
    }

    fn surfaced_index(&self, at: BlockLocation) -> Result<(usize, SurfaceId), NavError> {
        self.index_of(at)
            .map(|i| (i, self.surfaces[i]))
            .filter(|&(_, surface)| surface != 0)
            .ok_or(NavError::NotOnSurface { location: at })
    }
}

impl SearchSpace for Region {
    fn node_bound(&self) -> usize {
        self.block_count()
    }

    fn neighbors(&self, node: usize, out: &mut Vec<(usize, f64)>) {
        let at = self.reverse_index(node);
        for dir in directions_in(self.connection_masks[node]) {
            if let Some(j) = self.index_of(dir.step(at)) {
                out.push((j, dir.cost()));
            }
        }
    }

    fn heuristic(&self, node: usize, goal: usize) -> f64 {
        self.reverse_index(node).distance(self.reverse_index(goal))
    }
}
