// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Command line of `taxonomy-gateway`.

use clap::Parser;
use std::path::PathBuf;
use taxonomy_app_core::GatewayPrefs;

/// Flags override saved prefs; absent flags keep them.
#[derive(Parser, Debug, Default)]
#[command(author, version, about = "Taxonomy HTTP gateway")]
pub struct Args {
    /// HTTP port to listen on (default 8082)
    #[arg(long)]
    pub port: Option<u16>,
    /// Taxonomy service address, host:port (default localhost:8083)
    #[arg(long)]
    pub backend_addr: Option<String>,
    /// Id served by GET /api/taxonomy
    #[arg(long)]
    pub default_taxonomy_id: Option<String>,
    /// Deadline for one backend call, in milliseconds (default 10000)
    #[arg(long)]
    pub fetch_timeout_ms: Option<u64>,
    /// Serve this JSON snapshot in-process instead of calling the service
    #[arg(long)]
    pub snapshot: Option<PathBuf>,
    /// Directory holding saved prefs (default: platform config dir)
    #[arg(long)]
    pub config_dir: Option<PathBuf>,
}

impl Args {
    /// `prefs` with every flag given on the command line applied.
    pub fn apply(&self, mut prefs: GatewayPrefs) -> GatewayPrefs {
        if let Some(port) = self.port {
            prefs.listen_port = port;
        }
        if let Some(addr) = &self.backend_addr {
            prefs.backend_addr.clone_from(addr);
        }
        if let Some(id) = &self.default_taxonomy_id {
            prefs.default_taxonomy_id.clone_from(id);
        }
        if let Some(ms) = self.fetch_timeout_ms {
            prefs.fetch_timeout_ms = ms;
        }
        prefs
    }
}
