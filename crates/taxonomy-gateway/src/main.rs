// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! `taxonomy-gateway`: HTTP in front of the taxonomy service.

use anyhow::{Context, Result};
use clap::Parser;
use std::net::{Ipv4Addr, SocketAddr};
use taxonomy_app_core::{load_prefs_or_default, GatewayPrefs};
use taxonomy_config_fs::FsConfigStore;
use taxonomy_gateway::{router, AppState, Args};
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

const PREFS_KEY: &str = "gateway";

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse()?))
        .init();

    let prefs = args.apply(load_prefs(&args));

    let state = match &args.snapshot {
        Some(path) => {
            let state = AppState::from_snapshot(path)
                .with_context(|| format!("load snapshot {}", path.display()))?;
            info!(path = %path.display(), "serving taxonomy snapshot in-process");
            state
        }
        None => {
            info!(addr = %prefs.backend_addr, "using taxonomy service");
            AppState::remote(prefs.backend_addr.clone())
        }
    }
    .with_default_taxonomy_id(prefs.default_taxonomy_id.clone())
    .with_fetch_timeout(prefs.fetch_timeout());

    let addr = SocketAddr::from((Ipv4Addr::UNSPECIFIED, prefs.listen_port));
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("bind {addr}"))?;
    info!(
        %addr,
        default_taxonomy_id = %prefs.default_taxonomy_id,
        fetch_timeout_ms = prefs.fetch_timeout_ms,
        "taxonomy gateway listening"
    );

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("http server")?;
    info!("taxonomy gateway stopped");
    Ok(())
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("shutting down"),
        Err(err) => {
            warn!(?err, "ctrl-c handler unavailable; running until killed");
            std::future::pending::<()>().await;
        }
    }
}

fn load_prefs(args: &Args) -> GatewayPrefs {
    let store = match &args.config_dir {
        Some(dir) => FsConfigStore::with_base(dir),
        None => FsConfigStore::new(),
    };
    load_prefs_or_default(store, PREFS_KEY)
}
