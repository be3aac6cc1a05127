//! Envelope decoding shared by the sub-clients.

use crate::error::{ClientError, Result};
use crate::types::ApiResponse;
use reqwest::{Response, StatusCode};
use serde::de::DeserializeOwned;
use tracing::warn;

/// Decode an enveloped response, returning its `data` payload.
///
/// Non-2xx statuses are mapped to typed errors using the envelope's
/// message when the body carries one.
pub(crate) async fn decode<T: DeserializeOwned>(response: Response, what: &str) -> Result<Option<T>> {
    let status = response.status();
    let body = response.text().await?;

    if status.is_success() {
        let envelope: ApiResponse<T> = serde_json::from_str(&body).map_err(|e| {
            ClientError::ParseError(format!("Failed to parse {} response: {}", what, e))
        })?;

        if !envelope.success {
            let reason = envelope
                .reason()
                .unwrap_or_else(|| format!("{} request was not successful", what));
            return Err(ClientError::Rejected(reason));
        }

        return Ok(envelope.data);
    }

    let reason = serde_json::from_str::<ApiResponse<serde_json::Value>>(&body)
        .ok()
        .and_then(|envelope| envelope.reason())
        .unwrap_or_else(|| body.trim().to_string());

    warn!(status = %status, what = %what, reason = %reason, "API request failed");

    Err(match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ClientError::AuthRequired,
        StatusCode::NOT_FOUND => ClientError::NotFound(reason),
        _ => ClientError::ServerError {
            status: status.as_u16(),
            message: reason,
        },
    })
}

/// Like [`decode`], but an absent payload is a parse error.
pub(crate) async fn decode_required<T: DeserializeOwned>(response: Response, what: &str) -> Result<T> {
    decode(response, what)
        .await?
        .ok_or_else(|| ClientError::ParseError(format!("{} response has no data", what)))
}
