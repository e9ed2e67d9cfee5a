// Tunable behaviour of the pathing engine.
//
// `NavConfig` is plain serde data with a `Default` impl. Every field is
// optional in JSON (`#[serde(default)]`), so a host can override one knob
// without restating the rest. World geometry (chunk size, seam thickness,
// column height) is not configurable: it comes from `types.rs`, `boundary.rs`
// and the block source.
//
// See also: `world_index.rs` and `service.rs`, which read these values.

use crate::error::NavError;
use serde::{Deserialize, Serialize};

/// Engine configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NavConfig {
    /// When a query's start and end stand on the same surface of the same
    /// chunk, link their endpoint nodes directly, so the query does not
    /// depend on that surface touching a seam.
    pub link_colocated_endpoints: bool,

    /// Chunk indexing slower than this (milliseconds) is logged as a warning.
    pub slow_rebuild_warn_ms: f64,
}

impl Default for NavConfig {
    fn default() -> Self {
        Self {
            link_colocated_endpoints: true,
            slow_rebuild_warn_ms: 50.0,
        }
    }
}

impl NavConfig {
    /// Parse a config from JSON. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, NavError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String, NavError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
