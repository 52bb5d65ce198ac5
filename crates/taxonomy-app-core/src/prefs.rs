// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Saved preferences for the gateway and the mock service.
//!
//! Missing fields fall back to the defaults below, so a prefs file written by
//! an older build still loads.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use taxonomy_proto::{DEFAULT_SERVICE_ADDR, DEFAULT_SERVICE_PORT};

/// Port the gateway listens on by default.
pub const DEFAULT_GATEWAY_PORT: u16 = 8082;
/// Taxonomy served by `GET /api/taxonomy`.
pub const DEFAULT_TAXONOMY_ID: &str = "1701181887VZ";
/// Upper bound on one backend call, in milliseconds.
pub const DEFAULT_FETCH_TIMEOUT_MS: u64 = 10_000;
/// Snapshot file the mock service loads by default.
pub const DEFAULT_SNAPSHOT_PATH: &str = "taxonomy_raw.json";

/// Gateway settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayPrefs {
    /// HTTP listen port.
    pub listen_port: u16,
    /// Taxonomy service address (`host:port`).
    pub backend_addr: String,
    /// Id substituted when the request names none.
    pub default_taxonomy_id: String,
    /// Deadline for one backend call.
    pub fetch_timeout_ms: u64,
}

impl GatewayPrefs {
    /// [`Self::fetch_timeout_ms`] as a duration.
    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_millis(self.fetch_timeout_ms)
    }
}

impl Default for GatewayPrefs {
    fn default() -> Self {
        Self {
            listen_port: DEFAULT_GATEWAY_PORT,
            backend_addr: DEFAULT_SERVICE_ADDR.to_string(),
            default_taxonomy_id: DEFAULT_TAXONOMY_ID.to_string(),
            fetch_timeout_ms: DEFAULT_FETCH_TIMEOUT_MS,
        }
    }
}

/// Mock taxonomy service settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MockServicePrefs {
    /// TCP listen port.
    pub port: u16,
    /// JSON snapshot to serve.
    pub snapshot_path: String,
}

impl Default for MockServicePrefs {
    fn default() -> Self {
        Self {
            port: DEFAULT_SERVICE_PORT,
            snapshot_path: DEFAULT_SNAPSHOT_PATH.to_string(),
        }
    }
}
