// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! TCP taxonomy service backed by any [`TaxonomyBackend`].
//!
//! The binary serves a JSON snapshot through a
//! [`SnapshotBackend`](taxonomy_client::SnapshotBackend); tests can mount any
//! other backend through [`serve`].

use anyhow::Result;
use clap::Parser;
use std::io::ErrorKind;
use std::sync::Arc;
use std::time::Duration;
use taxonomy_app_core::MockServicePrefs;
use taxonomy_client::TaxonomyBackend;
use taxonomy_proto::wire::{decode_message, encode_message, try_extract_frame, MAX_PAYLOAD_BYTES};
use taxonomy_proto::{ErrorPayload, GetTaxonomyByIdResponse, Message};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// Time the service allows its backend for one request.
pub const REQUEST_BUDGET: Duration = Duration::from_secs(10);

const OUTBOX_DEPTH: usize = 256;
const ACCEPT_BACKOFF: Duration = Duration::from_secs(1);

/// Command line of `taxonomy-mock-service`. Flags override saved prefs.
#[derive(Parser, Debug, Default)]
#[command(author, version, about = "Mock taxonomy service")]
pub struct Args {
    /// TCP port to listen on (default 8083)
    #[arg(long)]
    pub port: Option<u16>,
    /// JSON snapshot of a GetTaxonomyById response (default taxonomy_raw.json)
    #[arg(long = "json")]
    pub snapshot_path: Option<String>,
    /// Directory holding saved prefs (default: platform config dir)
    #[arg(long)]
    pub config_dir: Option<std::path::PathBuf>,
}

impl Args {
    /// `prefs` with every flag given on the command line applied.
    pub fn apply(&self, mut prefs: MockServicePrefs) -> MockServicePrefs {
        if let Some(port) = self.port {
            prefs.port = port;
        }
        if let Some(path) = &self.snapshot_path {
            prefs.snapshot_path.clone_from(path);
        }
        prefs
    }
}

/// Accept connections forever. Accept errors are logged and never end the loop.
pub async fn serve(listener: TcpListener, backend: Arc<dyn TaxonomyBackend>) {
    loop {
        let (stream, peer) = match listener.accept().await {
            Ok(conn) => conn,
            Err(err) => {
                let pause = accept_backoff(&err);
                warn!(?err, ?pause, "accept failed");
                if let Some(pause) = pause {
                    tokio::time::sleep(pause).await;
                }
                continue;
            }
        };
        debug!(%peer, "client connected");
        let backend = Arc::clone(&backend);
        tokio::spawn(async move {
            if let Err(err) = handle_client(stream, backend).await {
                warn!(%peer, ?err, "client handler error");
            }
        });
    }
}

// Peer-side failures retry at once; anything else (e.g. EMFILE) backs off.
fn accept_backoff(err: &std::io::Error) -> Option<Duration> {
    match err.kind() {
        ErrorKind::ConnectionAborted | ErrorKind::ConnectionReset | ErrorKind::ConnectionRefused => {
            None
        }
        _ => Some(ACCEPT_BACKOFF),
    }
}

async fn handle_client(stream: TcpStream, backend: Arc<dyn TaxonomyBackend>) -> Result<()> {
    stream.set_nodelay(true)?;
    let (mut reader, mut writer) = stream.into_split();
    let (tx, mut rx) = mpsc::channel::<Vec<u8>>(OUTBOX_DEPTH);

    tokio::spawn(async move {
        while let Some(buf) = rx.recv().await {
            if writer.write_all(&buf).await.is_err() {
                break;
            }
        }
    });

    let mut read_buf = vec![0u8; 16 * 1024];
    let mut acc: Vec<u8> = Vec::with_capacity(32 * 1024);
    loop {
        let n = reader.read(&mut read_buf).await?;
        if n == 0 {
            return Ok(());
        }
        acc.extend_from_slice(&read_buf[..n]);

        while let Some(packet) = try_extract_frame(&mut acc, MAX_PAYLOAD_BYTES)? {
            let (msg, ts, _) = decode_message(&packet)?;
            // answered concurrently; replies carry `ts`, so order does not matter
            let backend = Arc::clone(&backend);
            let tx = tx.clone();
            tokio::spawn(async move {
                let reply = answer(msg, backend.as_ref()).await;
                match encode_message(&reply, ts) {
                    Ok(pkt) => {
                        let _ = tx.send(pkt).await;
                    }
                    Err(err) => warn!(ts, ?err, "failed to encode reply"),
                }
            });
        }
    }
}

async fn answer(msg: Message, backend: &dyn TaxonomyBackend) -> Message {
    match msg {
        Message::GetTaxonomyById(req) => {
            info!(taxonomy_id = %req.taxonomy_id, "GetTaxonomyById");
            let deadline = Instant::now() + REQUEST_BUDGET;
            match backend.fetch_by_id(&req.taxonomy_id, deadline).await {
                Ok(tree) => Message::GetTaxonomyByIdResponse(GetTaxonomyByIdResponse::new(tree)),
                Err(err) => {
                    warn!(taxonomy_id = %req.taxonomy_id, kind = err.kind(), %err, "lookup failed");
                    Message::Error(ErrorPayload::backend(err.to_string()))
                }
            }
        }
        other => {
            warn!(op = other.op_name(), "unexpected op");
            Message::Error(ErrorPayload::invalid_op(other.op_name()))
        }
    }
}
