// farpath_nav: two-level pathfinding over chunked voxel worlds.
//
// Worlds too large to search block by block are preprocessed per chunk:
// each chunk column is flood-filled into walkable surfaces, and each seam
// between adjacent chunks is flood-filled into boundary nodes that link those
// surfaces. A query searches the small node graph first, then stitches the
// coarse route into a block path one chunk surface at a time.
//
// Module overview:
// - `types.rs`:       BlockLocation, ChunkCoord, ChunkPair, NodeId, SurfaceId.
// - `bitset.rs`:      Packed boolean array for per-block flags.
// - `queue.rs`:       Re-keyable priority queue (LIFO among ties).
// - `direction.rs`:   The 26 single-step moves with masks, costs, opposites.
// - `world.rs`:       BlockSource trait (host seam) + in-memory VoxelWorld.
// - `region.rs`:      Block classification, surface flood fill, per-surface paths.
// - `boundary.rs`:    Seam region geometry + boundary node extraction.
// - `node.rs`:        BoundaryNode, NodeGraph arena, Splice guard for query nodes.
// - `pathfinding.rs`: Best-first search shared by the block and node levels.
// - `world_index.rs`: WorldIndex: chunk add/remove/rebuild and path queries.
// - `service.rs`:     NavService: per-world indices driven by host events.
// - `config.rs`:      NavConfig.
// - `error.rs`:       NavError.
//
// The crate never installs a logger; it logs through the `log` facade and
// leaves the backend to the host.
//
// **Critical constraint: determinism.** Given the same block data and the
// same sequence of chunk events, surface ids, node ids, and returned paths
// are identical across runs. Ordered collections back everything that
// influences iteration order; hash maps are used for keyed lookup only.

pub mod bitset;
pub mod boundary;
pub mod config;
pub mod direction;
pub mod error;
pub mod node;
pub mod pathfinding;
pub mod queue;
pub mod region;
pub mod service;
pub mod types;
pub mod world;
pub mod world_index;

pub use config::NavConfig;
pub use error::NavError;
pub use service::{NavService, WorldEvent, WorldId};
pub use types::{BlockLocation, ChunkCoord, ChunkPair, NodeId, SurfaceId, CHUNK_SIZE};
pub use world::{BlockKind, BlockSource, VoxelWorld};
pub use world_index::WorldIndex;
