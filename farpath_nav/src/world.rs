// Block-state seam between the pathing engine and the host world, plus an
// in-memory world that implements it.
//
// The engine never owns block data. Every region rebuild reads block state
// through `BlockSource`: two per-block predicates and the world height. Reads
// are not snapshotted, so the host must not mutate a chunk while a rebuild of
// that chunk (or a seam next to it) is in progress.
//
// `VoxelWorld` is a sparse, chunk-keyed grid of `BlockKind`s. Each loaded
// chunk is a dense 16 x height x 16 column stored flat, indexed by
// `x + z * 16 + y * 16 * 16` in chunk-local coordinates. Unloaded chunks and
// out-of-height positions read as `Air`; writes to them are no-ops. Tests,
// benchmarks, and headless hosts use it as their world.
//
// See also: `region.rs` for the classification built on these predicates,
// `service.rs` for the chunk load/unload events a host feeds alongside.

use crate::types::{BlockLocation, ChunkCoord, CHUNK_SIZE};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Read-only access to live block state.
pub trait BlockSource {
    /// True if an agent's body can occupy the block (host sense: air, plants,
    /// open doors, liquids).
    fn is_passable(&self, at: BlockLocation) -> bool;

    /// True if the block is a liquid. Liquids are passable but never count
    /// as open space for walking.
    fn is_liquid(&self, at: BlockLocation) -> bool;

    /// Block columns span `0..max_height()` on the Y axis.
    fn max_height(&self) -> u32;
}

/// The block kinds the in-memory world distinguishes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BlockKind {
    #[default]
    Air,
    Solid,
    Liquid,
}

impl BlockKind {
    pub fn is_passable(self) -> bool {
        !matches!(self, BlockKind::Solid)
    }

    pub fn is_liquid(self) -> bool {
        matches!(self, BlockKind::Liquid)
    }
}

const COLUMN_AREA: usize = (CHUNK_SIZE * CHUNK_SIZE) as usize;

/// One loaded 16 x height x 16 chunk column.
#[derive(Clone, Debug)]
struct ChunkColumn {
    blocks: Vec<BlockKind>,
}

impl ChunkColumn {
    fn new(height: u32) -> Self {
        Self {
            blocks: vec![BlockKind::Air; COLUMN_AREA * height as usize],
        }
    }

    fn index(at: BlockLocation) -> usize {
        let lx = at.x.rem_euclid(CHUNK_SIZE) as usize;
        let lz = at.z.rem_euclid(CHUNK_SIZE) as usize;
        lx + lz * CHUNK_SIZE as usize + at.y as usize * COLUMN_AREA
    }
}

/// Sparse in-memory block world made of loaded chunk columns.
#[derive(Clone, Debug)]
pub struct VoxelWorld {
    height: u32,
    chunks: BTreeMap<ChunkCoord, ChunkColumn>,
}

impl VoxelWorld {
    /// An empty world with no loaded chunks whose columns are `height` tall.
    pub fn new(height: u32) -> Self {
        Self {
            height,
            chunks: BTreeMap::new(),
        }
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Load an all-`Air` column. Returns false if it was already loaded, in
    /// which case its contents are left alone.
    pub fn load_chunk(&mut self, chunk: ChunkCoord) -> bool {
        if self.chunks.contains_key(&chunk) {
            return false;
        }
        self.chunks.insert(chunk, ChunkColumn::new(self.height));
        true
    }

    /// Drop a column and its contents. Returns false if it was not loaded.
    pub fn unload_chunk(&mut self, chunk: ChunkCoord) -> bool {
        self.chunks.remove(&chunk).is_some()
    }

    pub fn is_loaded(&self, chunk: ChunkCoord) -> bool {
        self.chunks.contains_key(&chunk)
    }

    /// Loaded chunks in ascending `(x, z)` order.
    pub fn loaded_chunks(&self) -> impl Iterator<Item = ChunkCoord> + '_ {
        self.chunks.keys().copied()
    }

    fn in_height(&self, at: BlockLocation) -> bool {
        at.y >= 0 && (at.y as u32) < self.height
    }

    /// Read a block. `Air` for unloaded chunks and out-of-height positions.
    pub fn get(&self, at: BlockLocation) -> BlockKind {
        if !self.in_height(at) {
            return BlockKind::Air;
        }
        self.chunks
            .get(&at.chunk())
            .map(|column| column.blocks[ChunkColumn::index(at)])
            .unwrap_or(BlockKind::Air)
    }

    /// Write a block. No-op for unloaded chunks and out-of-height positions.
    pub fn set(&mut self, at: BlockLocation, kind: BlockKind) {
        if !self.in_height(at) {
            return;
        }
        if let Some(column) = self.chunks.get_mut(&at.chunk()) {
            column.blocks[ChunkColumn::index(at)] = kind;
        }
    }

    /// Fill the inclusive box between two corners (given in any order).
    pub fn fill(&mut self, a: BlockLocation, b: BlockLocation, kind: BlockKind) {
        for y in a.y.min(b.y)..=a.y.max(b.y) {
            for z in a.z.min(b.z)..=a.z.max(b.z) {
                for x in a.x.min(b.x)..=a.x.max(b.x) {
                    self.set(BlockLocation::new(x, y, z), kind);
                }
            }
        }
    }
}

impl BlockSource for VoxelWorld {
    fn is_passable(&self, at: BlockLocation) -> bool {
        self.get(at).is_passable()
    }

    fn is_liquid(&self, at: BlockLocation) -> bool {
        self.get(at).is_liquid()
    }

    fn max_height(&self) -> u32 {
        self.height
    }
}
