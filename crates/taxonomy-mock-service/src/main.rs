// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! `taxonomy-mock-service`: serve one JSON snapshot over the taxonomy protocol.

use anyhow::{Context, Result};
use clap::Parser;
use std::net::{Ipv4Addr, SocketAddr};
use std::sync::Arc;
use taxonomy_app_core::{load_prefs_or_default, MockServicePrefs};
use taxonomy_client::SnapshotBackend;
use taxonomy_config_fs::FsConfigStore;
use taxonomy_mock_service::{serve, Args};
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

const PREFS_KEY: &str = "mock_service";

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse()?))
        .init();

    let prefs = args.apply(load_prefs(&args));

    let backend = SnapshotBackend::from_path(&prefs.snapshot_path)
        .with_context(|| format!("load snapshot {}", prefs.snapshot_path))?;
    let tree = backend.tree();
    for violation in tree.integrity_violations() {
        warn!(taxonomy_id = %tree.id, %violation, "snapshot integrity");
    }

    let addr = SocketAddr::from((Ipv4Addr::UNSPECIFIED, prefs.port));
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("bind {addr}"))?;
    info!(%addr, taxonomy_id = %tree.id, nodes = tree.nodes.len(), "mock taxonomy service listening");

    tokio::select! {
        () = serve(listener, Arc::new(backend)) => Ok(()),
        _ = tokio::signal::ctrl_c() => {
            info!("shutting down");
            Ok(())
        }
    }
}

fn load_prefs(args: &Args) -> MockServicePrefs {
    let store = match &args.config_dir {
        Some(dir) => FsConfigStore::with_base(dir),
        None => FsConfigStore::new(),
    };
    load_prefs_or_default(store, PREFS_KEY)
}
