// Multi-world front end: one `WorldIndex` per world, driven by host events.
//
// The host forwards world and chunk lifecycle events to `NavService::handle`
// together with read access to its block state, and asks for paths by world.
// Worlds are created on first mention. Each world's index sits behind its own
// `Mutex`, so queries and rebuilds in different worlds do not contend; the
// outer `RwLock` is only write-locked to add or drop a world.
//
// See also: `world_index.rs` for what each event does to a world's index.

use crate::config::NavConfig;
use crate::error::NavError;
use crate::types::{BlockLocation, ChunkCoord};
use crate::world::BlockSource;
use crate::world_index::WorldIndex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};

/// Host-assigned world identifier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct WorldId(pub u32);

impl fmt::Display for WorldId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "world#{}", self.0)
    }
}

/// World and chunk lifecycle notifications from the host.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum WorldEvent {
    /// A world came up with these chunks already loaded.
    WorldLoaded {
        world: WorldId,
        chunks: Vec<ChunkCoord>,
    },
    WorldUnloaded(WorldId),
    ChunkLoaded(WorldId, ChunkCoord),
    ChunkUnloaded(WorldId, ChunkCoord),
    /// Blocks inside a loaded chunk changed.
    ChunkChanged(WorldId, ChunkCoord),
}

type SharedIndex = Arc<Mutex<WorldIndex>>;

/// Registry of per-world pathing indices.
#[derive(Debug, Default)]
pub struct NavService {
    config: NavConfig,
    worlds: RwLock<BTreeMap<WorldId, SharedIndex>>,
}

impl NavService {
    pub fn new(config: NavConfig) -> Self {
        Self {
            config,
            worlds: RwLock::new(BTreeMap::new()),
        }
    }

    /// The index for `id`, created empty if the world is not yet known.
    pub fn world(&self, id: WorldId) -> SharedIndex {
        if let Some(index) = self.lookup(id) {
            return index;
        }
        let mut worlds = self.worlds.write().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(worlds.entry(id).or_insert_with(|| {
            log::info!("registered {id}");
            Arc::new(Mutex::new(WorldIndex::new(self.config.clone())))
        }))
    }

    fn lookup(&self, id: WorldId) -> Option<SharedIndex> {
        self.worlds
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&id)
            .cloned()
    }

    /// Forget a world and everything indexed for it. Returns false if it
    /// was not known.
    pub fn unload_world(&self, id: WorldId) -> bool {
        let removed = self
            .worlds
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&id)
            .is_some();
        if removed {
            log::info!("unregistered {id}");
        }
        removed
    }

    pub fn is_registered(&self, id: WorldId) -> bool {
        self.lookup(id).is_some()
    }

    /// Known worlds, ascending.
    pub fn worlds(&self) -> Vec<WorldId> {
        self.worlds
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .copied()
            .collect()
    }

    /// Apply a host event. `source` must expose the event's world.
    pub fn handle<S: BlockSource + ?Sized>(&self, event: WorldEvent, source: &S) {
        match event {
            WorldEvent::WorldLoaded { world, chunks } => {
                let index = self.world(world);
                let mut index = lock(&index);
                for chunk in chunks {
                    index.add(chunk, source);
                }
                log::info!("{world}: {} chunks indexed", index.tracked_chunks().len());
            }
            WorldEvent::WorldUnloaded(world) => {
                self.unload_world(world);
            }
            WorldEvent::ChunkLoaded(world, chunk) => {
                lock(&self.world(world)).add(chunk, source);
            }
            WorldEvent::ChunkUnloaded(world, chunk) => {
                lock(&self.world(world)).remove(chunk);
            }
            WorldEvent::ChunkChanged(world, chunk) => {
                lock(&self.world(world)).rebuild(chunk, source);
            }
        }
    }

    /// Path query against one world's index.
    pub fn find_path(
        &self,
        world: WorldId,
        start: BlockLocation,
        end: BlockLocation,
    ) -> Result<Option<Vec<BlockLocation>>, NavError> {
        lock(&self.world(world)).find_path(start, end)
    }
}

/// Lock a world index. A panic in another holder leaves the index in
/// whatever state the last completed operation left it, which is still
/// consistent at chunk granularity.
fn lock(index: &SharedIndex) -> MutexGuard<'_, WorldIndex> {
    index.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::{BlockKind, VoxelWorld};

    fn flat(chunks: &[ChunkCoord]) -> VoxelWorld {
        let mut world = VoxelWorld::new(8);
        for &c in chunks {
            world.load_chunk(c);
            world.fill(c.block(0, 1, 0), c.block(15, 1, 15), BlockKind::Solid);
        }
        world
    }

    #[test]
    fn world_is_created_on_first_use() {
        let service = NavService::default();
        assert!(!service.is_registered(WorldId(3)));
        let a = service.world(WorldId(3));
        let b = service.world(WorldId(3));
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(service.worlds(), vec![WorldId(3)]);
    }

    #[test]
    fn events_route_to_their_world() {
        let service = NavService::default();
        let a = ChunkCoord::new(0, 0);
        let b = ChunkCoord::new(1, 0);
        let blocks = flat(&[a, b]);

        service.handle(WorldEvent::WorldLoaded { world: WorldId(1), chunks: vec![a] }, &blocks);
        service.handle(WorldEvent::ChunkLoaded(WorldId(1), b), &blocks);
        service.handle(WorldEvent::ChunkLoaded(WorldId(2), a), &blocks);

        assert_eq!(lock(&service.world(WorldId(1))).tracked_chunks(), vec![a, b]);
        assert_eq!(lock(&service.world(WorldId(2))).tracked_chunks(), vec![a]);

        service.handle(WorldEvent::ChunkUnloaded(WorldId(1), a), &blocks);
        assert_eq!(lock(&service.world(WorldId(1))).tracked_chunks(), vec![b]);
        assert_eq!(lock(&service.world(WorldId(2))).tracked_chunks(), vec![a]);

        service.handle(WorldEvent::WorldUnloaded(WorldId(2)), &blocks);
        assert_eq!(service.worlds(), vec![WorldId(1)]);
    }

    #[test]
    fn chunk_changed_rebuilds() {
        let service = NavService::default();
        let a = ChunkCoord::new(0, 0);
        let mut blocks = flat(&[a]);
        let spot = BlockLocation::new(4, 1, 4);
        service.handle(WorldEvent::ChunkLoaded(WorldId(0), a), &blocks);
        assert!(service.find_path(WorldId(0), spot, spot).unwrap().is_some());

        blocks.set(spot.offset(0, 1, 0), BlockKind::Solid);
        service.handle(WorldEvent::ChunkChanged(WorldId(0), a), &blocks);
        assert!(service.find_path(WorldId(0), spot, spot).is_err());
    }

    #[test]
    fn path_in_unknown_world_is_off_surface() {
        let service = NavService::default();
        let spot = BlockLocation::new(0, 1, 0);
        let err = service.find_path(WorldId(9), spot, spot).unwrap_err();
        assert!(matches!(err, NavError::NotOnSurface { .. }));
    }
}
