use std::sync::Arc;

use {
    axum::{
        body::Bytes,
        extract::{State, rejection::BytesRejection},
        http::{StatusCode, header},
        response::{IntoResponse, Response},
    },
    thiserror::Error,
    tracing::{debug, warn},
};

use crate::state::GatewayState;

// ── Errors ───────────────────────────────────────────────────────────────────

/// Upstream failure, split by stage so operators can tell from the response
/// alone whether the outbound request never formed, never completed, or died
/// while its body was being read.
#[derive(Debug, Error)]
pub enum ProxyError {
    #[error("upstream error (build): {0}")]
    Build(reqwest::Error),
    #[error("upstream error (connect): {0}")]
    Connect(reqwest::Error),
    #[error("upstream error (read): {0}")]
    Read(reqwest::Error),
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        warn!(error = %self, "upstream call failed");
        (StatusCode::BAD_GATEWAY, self.to_string()).into_response()
    }
}

// ── Handlers ─────────────────────────────────────────────────────────────────

/// `POST /api/run`: forward the body to the supervisor and relay its status
/// and body byte-for-byte. The payload is opaque to the gateway and is never
/// deserialized on either leg.
pub async fn run_handler(
    State(state): State<Arc<GatewayState>>,
    body: Result<Bytes, BytesRejection>,
) -> Response {
    let Ok(body) = body else {
        return (StatusCode::BAD_REQUEST, "bad request").into_response();
    };

    match forward(&state, body).await {
        Ok((status, body)) => (
            status,
            [(header::CONTENT_TYPE, "application/json")],
            body,
        )
            .into_response(),
        Err(e) => e.into_response(),
    }
}

/// `OPTIONS /api/run`: answer the CORS pre-flight probe directly. The
/// upstream is never contacted.
pub async fn preflight_handler() -> StatusCode {
    StatusCode::NO_CONTENT
}

/// One outbound POST per inbound request. No retries and no caching; retry
/// policy belongs to the caller or the supervisor itself.
async fn forward(state: &GatewayState, body: Bytes) -> Result<(StatusCode, Bytes), ProxyError> {
    let request = state
        .client
        .post(&state.supervisor_url)
        .header(header::CONTENT_TYPE, "application/json")
        .body(body)
        .build()
        .map_err(ProxyError::Build)?;

    let response = state
        .client
        .execute(request)
        .await
        .map_err(ProxyError::Connect)?;

    let status = response.status();
    let body = response.bytes().await.map_err(ProxyError::Read)?;
    debug!(status = %status, bytes = body.len(), "relayed supervisor response");

    Ok((status, body))
}
