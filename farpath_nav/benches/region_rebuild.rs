use criterion::{Criterion, black_box, criterion_group, criterion_main};

use farpath_nav::region::Region;
use farpath_nav::{BlockKind, BlockLocation, ChunkCoord, NavConfig, VoxelWorld, WorldIndex};

const HEIGHT: u32 = 64;

/// Rolling terrain: each column's surface height follows a coarse sine
/// pattern, so chunks hold slopes, ledges and a few separate surfaces.
fn rolling_world(chunks: &[ChunkCoord]) -> VoxelWorld {
    let mut world = VoxelWorld::new(HEIGHT);
    for &chunk in chunks {
        world.load_chunk(chunk);
        for dx in 0..16 {
            for dz in 0..16 {
                let top = chunk.block(dx, 0, dz);
                let h = 20.0
                    + 4.0 * (f64::from(top.x) * 0.3).sin()
                    + 3.0 * (f64::from(top.z) * 0.2).cos();
                world.fill(top, top.offset(0, h as i32, 0), BlockKind::Solid);
            }
        }
    }
    world
}

fn bench_chunk_rebuild(c: &mut Criterion) {
    let mut group = c.benchmark_group("chunk_rebuild");
    let chunk = ChunkCoord::new(0, 0);
    let world = rolling_world(&[chunk]);
    group.bench_function("rolling_16x64x16", |b| {
        b.iter(|| {
            let mut region = Region::for_chunk(chunk, HEIGHT);
            region.rebuild(&world);
            black_box(region.surface_count());
        })
    });
    group.finish();
}

fn bench_index_add(c: &mut Criterion) {
    let mut group = c.benchmark_group("index_add");
    let grid: Vec<ChunkCoord> = (0..3)
        .flat_map(|x| (0..3).map(move |z| ChunkCoord::new(x, z)))
        .collect();
    let world = rolling_world(&grid);
    group.bench_function("grid_3x3", |b| {
        b.iter(|| {
            let index =
                WorldIndex::with_loaded_chunks(NavConfig::default(), &world, grid.iter().copied());
            black_box(index.node_count());
        })
    });
    group.finish();
}

fn bench_find_path(c: &mut Criterion) {
    let mut group = c.benchmark_group("find_path");
    let grid: Vec<ChunkCoord> = (0..4).map(|x| ChunkCoord::new(x, 0)).collect();
    let world = rolling_world(&grid);
    let mut index =
        WorldIndex::with_loaded_chunks(NavConfig::default(), &world, grid.iter().copied());

    // Standing blocks: the top solid block of each end column.
    let top_of = |x: i32, z: i32| {
        (0..HEIGHT as i32)
            .rev()
            .map(|y| BlockLocation::new(x, y, z))
            .find(|&at| index.surface_id_at(at) != 0)
    };
    let (Some(start), Some(end)) = (top_of(1, 8), top_of(62, 8)) else {
        return;
    };

    group.bench_function("four_chunks_east", |b| {
        b.iter(|| {
            let path = index.find_path(black_box(start), black_box(end));
            black_box(path.ok());
        })
    });
    group.finish();
}

criterion_group!(benches, bench_chunk_rebuild, bench_index_add, bench_find_path);
criterion_main!(benches);
