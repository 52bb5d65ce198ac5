// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Request failures and their HTTP rendering.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use taxonomy_client::BackendError;
use taxonomy_model::TransformError;
use tracing::error;

/// Why a taxonomy request produced no JSON body.
///
/// Every variant renders as `500 Internal Server Error` with a plain-text body
/// naming the stage that failed.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// The backend call failed or ran past its deadline.
    #[error("Error fetching taxonomy: {0}")]
    Fetch(#[from] BackendError),
    /// The tree holds a node type outside the known codes.
    #[error("Error transforming taxonomy: {0}")]
    Transform(#[from] TransformError),
    /// The response body could not be encoded.
    #[error("Error encoding response: {0}")]
    Encode(#[from] serde_json::Error),
}

impl GatewayError {
    /// Stable label for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Fetch(err) => err.kind(),
            Self::Transform(_) => "transform",
            Self::Encode(_) => "encode",
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        error!(kind = self.kind(), err = %self, "taxonomy request failed");
        (StatusCode::INTERNAL_SERVER_ERROR, self.to_string()).into_response()
    }
}
