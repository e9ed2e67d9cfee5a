// Error types for the pathing engine.
//
// Three kinds of outcome flow out of a query:
// - user errors (`NotOnSurface`, `InvalidChunkPair`): the caller asked for
//   something meaningless; never retried.
// - expected negatives: "no route" is `Ok(None)`, not an error.
// - internal-consistency failures (`Inconsistent`): precomputed connectivity
//   promised a route the fine-grained search could not realise. Fatal to the
//   query.

use crate::types::{BlockLocation, ChunkCoord};
use thiserror::Error;

/// Main error type for the engine.
#[derive(Debug, Error)]
pub enum NavError {
    #[error("{location} is not on a walkable surface of a tracked chunk")]
    NotOnSurface { location: BlockLocation },

    #[error("{a} and {b} cannot form a chunk pair: {reason}")]
    InvalidChunkPair {
        a: ChunkCoord,
        b: ChunkCoord,
        reason: PairRejection,
    },

    #[error("internal consistency failure: {0}")]
    Inconsistent(String),

    #[error("config error: {0}")]
    Config(#[from] serde_json::Error),
}

/// Why two chunks were refused as a `ChunkPair`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum PairRejection {
    #[error("chunks are identical")]
    Identical,
    #[error("chunks only share a corner")]
    Diagonal,
    #[error("chunks are not adjacent")]
    NotAdjacent,
}
