// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Wire schema for the taxonomy service's single unary call,
//! `GetTaxonomyById(taxonomyId) -> TaxonomyInfo`.
//!
//! Messages travel as CBOR `OpEnvelope`s inside checksummed packets (see
//! [`wire`]). The envelope `ts` is a per-connection request id: the service
//! answers with the `ts` of the request it is replying to.

pub use taxonomy_model::{TaxonomyResponse, TaxonomyTree};
use serde::{Deserialize, Serialize};

pub mod wire;

/// Port the taxonomy service listens on by default.
pub const DEFAULT_SERVICE_PORT: u16 = 8083;
/// Address the gateway dials by default.
pub const DEFAULT_SERVICE_ADDR: &str = "localhost:8083";

/// Response body of `GetTaxonomyById`.
pub type GetTaxonomyByIdResponse = TaxonomyResponse;

/// Envelope carried as the payload of a packet.
///
/// * `op` – operation name.
/// * `ts` – request id, echoed by replies.
/// * `payload` – operation specific body.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct OpEnvelope<P> {
    /// Operation name (e.g. "get_taxonomy_by_id", "error").
    pub op: String,
    /// Request id.
    pub ts: u64,
    /// Operation-specific body.
    pub payload: P,
}

/// Request body of `GetTaxonomyById`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct GetTaxonomyByIdRequest {
    /// Taxonomy to fetch.
    pub taxonomy_id: String,
}

/// Error reply sent instead of a response body.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorPayload {
    /// Numeric error code (400 for protocol misuse, 500 for backend failure).
    pub code: u32,
    /// Stable identifier (e.g., "E_BACKEND").
    pub name: String,
    /// Human readable message.
    pub message: String,
}

impl ErrorPayload {
    /// Error code for requests the service does not understand.
    pub const INVALID_OP: u32 = 400;
    /// Error code for failures behind the service.
    pub const BACKEND: u32 = 500;

    /// Reply for an op the service does not serve.
    pub fn invalid_op(op: &str) -> Self {
        Self {
            code: Self::INVALID_OP,
            name: "E_INVALID_OP".into(),
            message: format!("unsupported op {op}"),
        }
    }

    /// Reply for a failed lookup.
    pub fn backend(message: impl Into<String>) -> Self {
        Self {
            code: Self::BACKEND,
            name: "E_BACKEND".into(),
            message: message.into(),
        }
    }
}

/// Wire message kinds carried inside OpEnvelope payloads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    /// Fetch request (op = "get_taxonomy_by_id").
    GetTaxonomyById(GetTaxonomyByIdRequest),
    /// Fetch reply (op = "get_taxonomy_by_id_response").
    GetTaxonomyByIdResponse(GetTaxonomyByIdResponse),
    /// Protocol or processing error (op = "error").
    Error(ErrorPayload),
}

impl Message {
    /// Canonical op string for this message variant.
    pub fn op_name(&self) -> &'static str {
        match self {
            Message::GetTaxonomyById(_) => "get_taxonomy_by_id",
            Message::GetTaxonomyByIdResponse(_) => "get_taxonomy_by_id_response",
            Message::Error(_) => "error",
        }
    }
}
