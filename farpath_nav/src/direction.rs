// The 26 single-step moves between blocks.
//
// Eight compass directions at the same elevation, the same eight one block up
// and one block down, plus straight up and straight down. Each direction owns
// one bit of a `u32` connection mask (`1 << index`), a step cost equal to the
// Euclidean length of its offset (1, sqrt 2, or sqrt 3), and an opposite.
//
// The declaration order is fixed: it is the order flood fill and searches
// iterate neighbours in, and therefore part of what makes surface ids and
// tie-broken paths reproducible.
//
// See also: `region.rs` which stores per-block masks built from these bits.

use crate::types::BlockLocation;
use std::f64::consts::SQRT_2;

const SQRT_3: f64 = 1.732_050_807_568_877_2;

/// A single-step move between two blocks.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Direction {
    North,
    East,
    South,
    West,
    NorthWest,
    NorthEast,
    SouthWest,
    SouthEast,

    UpNorth,
    UpEast,
    UpSouth,
    UpWest,
    UpNorthWest,
    UpNorthEast,
    UpSouthWest,
    UpSouthEast,

    DownNorth,
    DownEast,
    DownSouth,
    DownWest,
    DownNorthWest,
    DownNorthEast,
    DownSouthWest,
    DownSouthEast,

    Up,
    Down,
}

/// Horizontal component of the eight compass directions, in declaration order.
const COMPASS: [(i32, i32); 8] = [
    (0, -1),  // N (-Z)
    (1, 0),   // E (+X)
    (0, 1),   // S (+Z)
    (-1, 0),  // W (-X)
    (-1, -1), // NW
    (1, -1),  // NE
    (-1, 1),  // SW
    (1, 1),   // SE
];

impl Direction {
    /// Every direction, in mask-bit order.
    pub const ALL: [Direction; 26] = [
        Direction::North,
        Direction::East,
        Direction::South,
        Direction::West,
        Direction::NorthWest,
        Direction::NorthEast,
        Direction::SouthWest,
        Direction::SouthEast,
        Direction::UpNorth,
        Direction::UpEast,
        Direction::UpSouth,
        Direction::UpWest,
        Direction::UpNorthWest,
        Direction::UpNorthEast,
        Direction::UpSouthWest,
        Direction::UpSouthEast,
        Direction::DownNorth,
        Direction::DownEast,
        Direction::DownSouth,
        Direction::DownWest,
        Direction::DownNorthWest,
        Direction::DownNorthEast,
        Direction::DownSouthWest,
        Direction::DownSouthEast,
        Direction::Up,
        Direction::Down,
    ];

    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    /// `(dx, dy, dz)`, each component in {-1, 0, 1}.
    pub fn offset(self) -> (i32, i32, i32) {
        let i = self.index();
        match i {
            0..=7 => (COMPASS[i].0, 0, COMPASS[i].1),
            8..=15 => (COMPASS[i - 8].0, 1, COMPASS[i - 8].1),
            16..=23 => (COMPASS[i - 16].0, -1, COMPASS[i - 16].1),
            24 => (0, 1, 0),
            _ => (0, -1, 0),
        }
    }

    #[inline]
    pub fn mask(self) -> u32 {
        1 << self.index()
    }

    #[inline]
    pub fn in_mask(self, mask: u32) -> bool {
        mask & self.mask() != 0
    }

    /// Euclidean length of the offset.
    pub fn cost(self) -> f64 {
        let (dx, dy, dz) = self.offset();
        match dx.abs() + dy.abs() + dz.abs() {
            1 => 1.0,
            2 => SQRT_2,
            _ => SQRT_3,
        }
    }

    /// The direction with the negated offset.
    pub fn opposite(self) -> Direction {
        let (dx, dy, dz) = self.offset();
        // Every negated offset is itself in the table.
        match Direction::from_offset(-dx, -dy, -dz) {
            Some(d) => d,
            None => unreachable!("direction table is closed under negation"),
        }
    }

    /// Look up the direction for an offset. `None` for (0, 0, 0) or any
    /// component outside {-1, 0, 1}.
    pub fn from_offset(dx: i32, dy: i32, dz: i32) -> Option<Direction> {
        Direction::ALL
            .iter()
            .copied()
            .find(|d| d.offset() == (dx, dy, dz))
    }

    /// The direction from `from` to `to`, if they are single-step neighbours.
    pub fn between(from: BlockLocation, to: BlockLocation) -> Option<Direction> {
        Direction::from_offset(to.x - from.x, to.y - from.y, to.z - from.z)
    }

    /// Apply this direction to a location.
    pub fn step(self, from: BlockLocation) -> BlockLocation {
        let (dx, dy, dz) = self.offset();
        from.offset(dx, dy, dz)
    }
}

/// Iterate the directions whose bits are set in `mask`, in table order.
pub fn directions_in(mask: u32) -> impl Iterator<Item = Direction> {
    Direction::ALL.into_iter().filter(move |d| d.in_mask(mask))
}
