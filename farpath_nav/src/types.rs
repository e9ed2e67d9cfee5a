// Core types shared across the pathing engine.
//
// Defines world-space block coordinates (`BlockLocation`), chunk column
// coordinates (`ChunkCoord`), the canonical unordered seam between two
// orthogonally adjacent chunks (`ChunkPair`), and compact integer ids for
// surfaces and boundary nodes.
//
// Chunks are 16x16 columns spanning the full world height. Converting a block
// coordinate to its chunk uses floor division, so block x = -1 lives in chunk
// x = -1, not chunk 0.
//
// See also: `region.rs` for the per-volume analysis keyed by these types,
// `world_index.rs` which maps `ChunkCoord`/`ChunkPair` to regions.

use crate::error::{NavError, PairRejection};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Width and depth of a chunk column, in blocks.
pub const CHUNK_SIZE: i32 = 16;

/// Surface identifier inside a single region. 0 means "not on a surface";
/// ids are only comparable within the region that assigned them.
pub type SurfaceId = u16;

// ---------------------------------------------------------------------------
// Spatial types
// ---------------------------------------------------------------------------

/// An absolute block position.
///
/// Axis conventions follow the host world:
/// - X: east  (positive) / west  (negative)
/// - Y: up    (positive) / down  (negative)
/// - Z: south (positive) / north (negative)
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BlockLocation {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl BlockLocation {
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    /// Translate by the given offset.
    pub const fn offset(self, dx: i32, dy: i32, dz: i32) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
            z: self.z + dz,
        }
    }

    /// Euclidean distance between two block positions.
    pub fn distance(self, other: Self) -> f64 {
        let dx = f64::from(other.x - self.x);
        let dy = f64::from(other.y - self.y);
        let dz = f64::from(other.z - self.z);
        (dx * dx + dy * dy + dz * dz).sqrt()
    }

    /// Squared distance from this block to an arbitrary point.
    pub fn distance_squared_to(self, point: [f64; 3]) -> f64 {
        let dx = point[0] - f64::from(self.x);
        let dy = point[1] - f64::from(self.y);
        let dz = point[2] - f64::from(self.z);
        dx * dx + dy * dy + dz * dz
    }

    /// The chunk column containing this block.
    pub const fn chunk(self) -> ChunkCoord {
        ChunkCoord {
            x: self.x.div_euclid(CHUNK_SIZE),
            z: self.z.div_euclid(CHUNK_SIZE),
        }
    }
}

impl fmt::Display for BlockLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.x, self.y, self.z)
    }
}

/// A 16x16 chunk column, addressed by chunk index on the X and Z axes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ChunkCoord {
    pub x: i32,
    pub z: i32,
}

impl ChunkCoord {
    pub const fn new(x: i32, z: i32) -> Self {
        Self { x, z }
    }

    pub const fn offset(self, dx: i32, dz: i32) -> Self {
        Self {
            x: self.x + dx,
            z: self.z + dz,
        }
    }

    /// The block at local column offset `(dx, dz)` and absolute height `y`.
    pub const fn block(self, dx: i32, y: i32, dz: i32) -> BlockLocation {
        BlockLocation::new(self.x * CHUNK_SIZE + dx, y, self.z * CHUNK_SIZE + dz)
    }

    /// The lowest-coordinate block of the column at y = 0.
    pub const fn origin(self) -> BlockLocation {
        self.block(0, 0, 0)
    }

    /// The four edge-sharing neighbours, in west, east, north, south order.
    /// Corner-sharing chunks are not included.
    pub const fn orthogonal_neighbors(self) -> [ChunkCoord; 4] {
        [
            self.offset(-1, 0),
            self.offset(1, 0),
            self.offset(0, -1),
            self.offset(0, 1),
        ]
    }
}

impl fmt::Display for ChunkCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "chunk({}, {})", self.x, self.z)
    }
}

/// Two orthogonally adjacent chunks, stored in a canonical order so that
/// `ChunkPair::new(a, b) == ChunkPair::new(b, a)`.
///
/// `smaller` has the lower value on whichever axis the two chunks differ.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ChunkPair {
    smaller: ChunkCoord,
    larger: ChunkCoord,
}

impl ChunkPair {
    /// Pair two edge-sharing chunks. Identical, diagonal, or distant chunks
    /// are rejected.
    pub fn new(a: ChunkCoord, b: ChunkCoord) -> Result<Self, NavError> {
        let reject = |reason| NavError::InvalidChunkPair { a, b, reason };

        if a == b {
            return Err(reject(PairRejection::Identical));
        }
        let dx = (a.x - b.x).abs();
        let dz = (a.z - b.z).abs();
        if dx > 1 || dz > 1 {
            return Err(reject(PairRejection::NotAdjacent));
        }

        let (a_key, b_key) = if a.x == b.x {
            (a.z, b.z)
        } else if a.z == b.z {
            (a.x, b.x)
        } else {
            return Err(reject(PairRejection::Diagonal));
        };

        Ok(if a_key < b_key {
            Self { smaller: a, larger: b }
        } else {
            Self { smaller: b, larger: a }
        })
    }

    pub fn smaller(&self) -> ChunkCoord {
        self.smaller
    }

    pub fn larger(&self) -> ChunkCoord {
        self.larger
    }

    /// True when the chunks differ along X (the seam runs north-south).
    pub fn is_along_x(&self) -> bool {
        self.smaller.z == self.larger.z
    }

    pub fn contains(&self, chunk: ChunkCoord) -> bool {
        self.smaller == chunk || self.larger == chunk
    }
}

impl fmt::Display for ChunkPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}|{}", self.smaller, self.larger)
    }
}

// ---------------------------------------------------------------------------
// Graph ids
// ---------------------------------------------------------------------------

/// Handle to a boundary node slot in the `NodeGraph` arena. Slots are reused
/// after a node is torn down, so a handle is only meaningful while its node
/// is alive.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub u32);

impl NodeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "node#{}", self.0)
    }
}
