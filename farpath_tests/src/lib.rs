// Test-only world builder for pathing integration tests.
//
// Wraps an in-memory `VoxelWorld` (from `farpath_nav::world`) and a real
// `WorldIndex` (from `farpath_nav::world_index`) behind a small API for
// exercising the full pipeline: blocks → chunk regions → seams → boundary
// nodes → coarse route → stitched block path.
//
// The only test-specific code here is terrain construction and the path
// checks. All indexing and search uses the same code paths as a host.
//
// See also: `tests/end_to_end.rs` for the integration test scenarios.

use farpath_nav::direction::Direction;
use farpath_nav::{
    BlockKind, BlockLocation, ChunkCoord, NavConfig, NavError, VoxelWorld, WorldIndex,
};

/// Column height of test worlds. Short columns keep rebuilds cheap in debug
/// builds while leaving room for walls and ledges.
pub const TEST_HEIGHT: u32 = 8;

/// Y of the solid floor laid by `TestWorld::flat`. Walkable blocks sit here.
pub const FLOOR_Y: i32 = 2;

/// Install a test logger once per process. Later calls are no-ops.
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Block world plus the index built over it.
pub struct TestWorld {
    pub blocks: VoxelWorld,
    pub index: WorldIndex,
}

impl TestWorld {
    /// Empty world with nothing loaded.
    pub fn new(config: NavConfig) -> Self {
        init_logging();
        Self {
            blocks: VoxelWorld::new(TEST_HEIGHT),
            index: WorldIndex::new(config),
        }
    }

    /// Load `chunks` with a one-block solid floor at `FLOOR_Y` and index
    /// them in the given order.
    pub fn flat(chunks: &[ChunkCoord]) -> Self {
        let mut world = Self::new(NavConfig::default());
        for &chunk in chunks {
            world.lay_floor(chunk);
            world.load(chunk);
        }
        world
    }

    /// Load `chunk` into the block world and fill its floor, without
    /// indexing it.
    pub fn lay_floor(&mut self, chunk: ChunkCoord) {
        self.blocks.load_chunk(chunk);
        self.blocks.fill(
            chunk.block(0, FLOOR_Y, 0),
            chunk.block(15, FLOOR_Y, 15),
            BlockKind::Solid,
        );
    }

    /// Index an already-loaded chunk. Returns false if it was tracked.
    pub fn load(&mut self, chunk: ChunkCoord) -> bool {
        self.index.add(chunk, &self.blocks)
    }

    pub fn unload(&mut self, chunk: ChunkCoord) -> bool {
        self.index.remove(chunk)
    }

    /// Set a box of blocks and rebuild every indexed chunk it touches.
    pub fn fill(&mut self, a: BlockLocation, b: BlockLocation, kind: BlockKind) {
        self.blocks.fill(a, b, kind);
        let (lo, hi) = (a.chunk(), b.chunk());
        for cx in lo.x.min(hi.x)..=lo.x.max(hi.x) {
            for cz in lo.z.min(hi.z)..=lo.z.max(hi.z) {
                let chunk = ChunkCoord::new(cx, cz);
                if self.index.is_tracked(chunk) {
                    self.index.rebuild(chunk, &self.blocks);
                }
            }
        }
    }

    /// Raise a solid wall on the plane `x = wall_x`, from just above the
    /// floor to the top of the world, across z in `z0..=z1`.
    pub fn wall_x(&mut self, wall_x: i32, z0: i32, z1: i32) {
        self.fill(
            BlockLocation::new(wall_x, FLOOR_Y + 1, z0),
            BlockLocation::new(wall_x, TEST_HEIGHT as i32 - 1, z1),
            BlockKind::Solid,
        );
    }

    pub fn find_path(
        &mut self,
        start: BlockLocation,
        end: BlockLocation,
    ) -> Result<Option<Vec<BlockLocation>>, NavError> {
        self.index.find_path(start, end)
    }
}

/// Shorthand for a location on the test floor.
pub fn floor(x: i32, z: i32) -> BlockLocation {
    BlockLocation::new(x, FLOOR_Y, z)
}

/// Panic unless `path` runs from `start` to `end` in single 26-neighbour
/// steps, with every block on a surface of the index.
pub fn assert_walkable_path(
    index: &WorldIndex,
    path: &[BlockLocation],
    start: BlockLocation,
    end: BlockLocation,
) {
    assert_eq!(path.first(), Some(&start), "path must begin at start");
    assert_eq!(path.last(), Some(&end), "path must end at end");
    for pair in path.windows(2) {
        assert!(
            Direction::between(pair[0], pair[1]).is_some(),
            "non-adjacent step {} -> {}",
            pair[0],
            pair[1]
        );
    }
    for &at in path {
        assert_ne!(index.surface_id_at(at), 0, "{at} is not on a surface");
    }
}

/// Sum of step costs along a path.
pub fn path_cost(path: &[BlockLocation]) -> f64 {
    path.windows(2)
        .filter_map(|pair| Direction::between(pair[0], pair[1]))
        .map(Direction::cost)
        .sum()
}
