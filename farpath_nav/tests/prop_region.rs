use farpath_nav::direction::directions_in;
use farpath_nav::region::Region;
use farpath_nav::{BlockKind, BlockLocation, ChunkCoord, VoxelWorld};
use proptest::prelude::*;
use proptest::sample::Index;

const SIDE: i32 = 4;
const HEIGHT: u32 = 6;

fn heights() -> impl Strategy<Value = Vec<i32>> {
    prop::collection::vec(0i32..4, (SIDE * SIDE) as usize)
}

fn overhangs() -> impl Strategy<Value = Vec<(i32, i32, i32)>> {
    prop::collection::vec((0..SIDE, 2i32..HEIGHT as i32, 0..SIDE), 0..6)
}

/// A small box of terrain: one solid column per `(x, z)` up to its height,
/// plus a few floating solid blocks.
fn build(heights: &[i32], overhangs: &[(i32, i32, i32)], liquid: bool) -> Region {
    let mut world = VoxelWorld::new(HEIGHT);
    world.load_chunk(ChunkCoord::new(0, 0));
    for x in 0..SIDE {
        for z in 0..SIDE {
            let h = heights[(x + z * SIDE) as usize];
            world.fill(BlockLocation::new(x, 0, z), BlockLocation::new(x, h, z), BlockKind::Solid);
        }
    }
    for &(x, y, z) in overhangs {
        world.set(BlockLocation::new(x, y, z), BlockKind::Solid);
    }
    if liquid {
        world.set(BlockLocation::new(1, heights[1 + SIDE as usize] + 1, 1), BlockKind::Liquid);
    }
    let mut region = Region::new(BlockLocation::new(0, 0, 0), SIDE as u32, HEIGHT, SIDE as u32);
    region.rebuild(&world);
    region
}

fn all_blocks() -> impl Iterator<Item = BlockLocation> {
    (0..SIDE).flat_map(|x| {
        (0..HEIGHT as i32).flat_map(move |y| (0..SIDE).map(move |z| BlockLocation::new(x, y, z)))
    })
}

proptest! {
    // A block has a surface id exactly when it is walkable, and only
    // surfaced blocks carry connections.
    #[test]
    fn surfaces_cover_exactly_the_walkable_blocks(h in heights(), o in overhangs(), liquid in any::<bool>()) {
        let region = build(&h, &o, liquid);
        for at in all_blocks() {
            let surface = region.surface_id(at);
            prop_assert_eq!(surface != 0, region.is_walkable(at));
            prop_assert!(surface <= region.surface_count());
            if surface == 0 {
                prop_assert_eq!(region.connection_mask(at), 0);
            }
        }
    }

    // Connections are mutual and never leave a surface.
    #[test]
    fn connections_are_symmetric(h in heights(), o in overhangs(), liquid in any::<bool>()) {
        let region = build(&h, &o, liquid);
        for at in all_blocks() {
            for dir in directions_in(region.connection_mask(at)) {
                let next = dir.step(at);
                prop_assert!(region.contains(next));
                prop_assert!(dir.opposite().in_mask(region.connection_mask(next)));
                prop_assert_eq!(region.surface_id(next), region.surface_id(at));
            }
        }
    }

    // Any two blocks of one surface are joined by a path that only follows
    // connections; blocks of different surfaces are not.
    #[test]
    fn paths_follow_connections(h in heights(), o in overhangs(), a in any::<Index>(), b in any::<Index>()) {
        let region = build(&h, &o, false);
        let blocks: Vec<_> = region.surface_blocks().collect();
        prop_assume!(!blocks.is_empty());
        let (start, start_surface) = blocks[a.index(blocks.len())];
        let (end, end_surface) = blocks[b.index(blocks.len())];

        let path = region.find_path(start, end).unwrap();
        if start_surface != end_surface {
            prop_assert!(path.is_none());
            return Ok(());
        }
        let path = path.unwrap();
        prop_assert_eq!(path.first(), Some(&start));
        prop_assert_eq!(path.last(), Some(&end));
        for step in path.windows(2) {
            prop_assert!(region.connections(step[0]).contains(&step[1]));
        }
    }
}
