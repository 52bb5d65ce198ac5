// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! `GetTaxonomyById` over TCP.
//!
//! One connection is shared by every request. Callers hand a [`Call`] to a
//! connection task through an mpsc queue; the task stamps each request with a
//! fresh `ts`, writes it, and routes replies back by the `ts` they echo.
//! A caller that hits its deadline drops its reply receiver, and the late
//! reply is discarded when it arrives.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use taxonomy_model::TaxonomyTree;
use taxonomy_proto::wire::{
    decode_message, encode_message, try_extract_frame, WireError, MAX_PAYLOAD_BYTES,
};
use taxonomy_proto::{GetTaxonomyByIdRequest, Message};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::sync::{mpsc, oneshot, Mutex};
use tokio::time::{self, Instant};
use tracing::{debug, info, warn};

use crate::backend::{BackendError, TaxonomyBackend};

const CALL_QUEUE_DEPTH: usize = 256;

type Reply = Result<Message, String>;

struct Call {
    message: Message,
    reply: oneshot::Sender<Reply>,
}

/// Client for the remote taxonomy service.
///
/// Construct one per process and share it; the connection is opened on first
/// use and reopened on the next call after it drops. No call is retried.
pub struct RemoteBackend {
    addr: String,
    conn: Mutex<Option<mpsc::Sender<Call>>>,
}

impl RemoteBackend {
    /// Backend for the service at `addr` (e.g. `localhost:8083`). Does not connect.
    pub fn new(addr: impl Into<String>) -> Self {
        Self {
            addr: addr.into(),
            conn: Mutex::new(None),
        }
    }

    /// Address this backend dials.
    pub fn addr(&self) -> &str {
        &self.addr
    }

    async fn sender(&self) -> std::io::Result<mpsc::Sender<Call>> {
        let mut slot = self.conn.lock().await;
        if let Some(tx) = slot.as_ref().filter(|tx| !tx.is_closed()) {
            return Ok(tx.clone());
        }
        let stream = TcpStream::connect(&self.addr).await?;
        stream.set_nodelay(true)?;
        let (tx, rx) = mpsc::channel(CALL_QUEUE_DEPTH);
        tokio::spawn(run_connection(stream, rx, self.addr.clone()));
        info!(addr = %self.addr, "connected to taxonomy service");
        *slot = Some(tx.clone());
        Ok(tx)
    }

    async fn call(&self, taxonomy_id: &str) -> Result<Arc<TaxonomyTree>, BackendError> {
        let unavailable = |reason: String| BackendError::Unavailable {
            taxonomy_id: taxonomy_id.to_string(),
            addr: self.addr.clone(),
            reason,
        };

        let tx = self.sender().await.map_err(|e| unavailable(e.to_string()))?;
        let (reply_tx, reply_rx) = oneshot::channel();
        let message = Message::GetTaxonomyById(GetTaxonomyByIdRequest {
            taxonomy_id: taxonomy_id.to_string(),
        });
        tx.send(Call {
            message,
            reply: reply_tx,
        })
        .await
        .map_err(|_| unavailable("connection closed".into()))?;
        let reply = reply_rx
            .await
            .map_err(|_| unavailable("connection closed before reply".into()))?
            .map_err(unavailable)?;

        match reply {
            Message::GetTaxonomyByIdResponse(resp) => Ok(resp.into_tree()),
            Message::Error(err) => Err(BackendError::Remote {
                taxonomy_id: taxonomy_id.to_string(),
                code: err.code,
                name: err.name,
                message: err.message,
            }),
            other => Err(BackendError::Protocol {
                taxonomy_id: taxonomy_id.to_string(),
                reason: format!("unexpected reply op {}", other.op_name()),
            }),
        }
    }
}

#[async_trait]
impl TaxonomyBackend for RemoteBackend {
    async fn fetch_by_id(
        &self,
        taxonomy_id: &str,
        deadline: Instant,
    ) -> Result<Arc<TaxonomyTree>, BackendError> {
        let started = Instant::now();
        time::timeout_at(deadline, self.call(taxonomy_id))
            .await
            .unwrap_or_else(|_| {
                Err(BackendError::DeadlineExceeded {
                    taxonomy_id: taxonomy_id.to_string(),
                    waited: started.elapsed(),
                })
            })
    }
}

async fn run_connection(stream: TcpStream, mut calls: mpsc::Receiver<Call>, addr: String) {
    let (mut reader, mut writer) = stream.into_split();
    let mut pending: HashMap<u64, oneshot::Sender<Reply>> = HashMap::new();
    let mut next_ts: u64 = 0;
    let mut buf = vec![0u8; 16 * 1024];
    let mut acc: Vec<u8> = Vec::with_capacity(32 * 1024);

    let reason = loop {
        let stop: Option<String> = tokio::select! {
            call = calls.recv() => match call {
                None => Some("client dropped".to_string()),
                Some(Call { message, reply }) => {
                    let ts = next_ts;
                    next_ts = next_ts.wrapping_add(1);
                    match encode_message(&message, ts) {
                        Err(err) => {
                            let _ = reply.send(Err(err.to_string()));
                            None
                        }
                        Ok(pkt) => match writer.write_all(&pkt).await {
                            Err(err) => {
                                let _ = reply.send(Err(err.to_string()));
                                Some(format!("write failed: {err}"))
                            }
                            Ok(()) => {
                                // drop slots whose callers already gave up
                                pending.retain(|_, waiting| !waiting.is_closed());
                                pending.insert(ts, reply);
                                None
                            }
                        },
                    }
                }
            },
            read = reader.read(&mut buf) => match read {
                Ok(0) => Some("service closed the connection".to_string()),
                Err(err) => Some(format!("read failed: {err}")),
                Ok(n) => {
                    acc.extend_from_slice(&buf[..n]);
                    dispatch_replies(&mut acc, &mut pending)
                        .err()
                        .map(|err| format!("malformed reply: {err}"))
                }
            },
        };
        if let Some(reason) = stop {
            break reason;
        }
    };

    drop(calls);
    if pending.is_empty() {
        debug!(%addr, %reason, "taxonomy connection closed");
    } else {
        warn!(%addr, %reason, in_flight = pending.len(), "taxonomy connection closed");
    }
    for (_, reply) in pending.drain() {
        let _ = reply.send(Err(reason.clone()));
    }
}

fn dispatch_replies(
    acc: &mut Vec<u8>,
    pending: &mut HashMap<u64, oneshot::Sender<Reply>>,
) -> Result<(), WireError> {
    while let Some(pkt) = try_extract_frame(acc, MAX_PAYLOAD_BYTES)? {
        let (msg, ts, _) = decode_message(&pkt)?;
        match pending.remove(&ts) {
            Some(reply) => {
                if reply.send(Ok(msg)).is_err() {
                    debug!(ts, "caller gave up before reply; discarding");
                }
            }
            None => debug!(ts, "reply for unknown request; discarding"),
        }
    }
    Ok(())
}
