//! Webhook receiver endpoint.

use axum::{body::Bytes, http::StatusCode, response::IntoResponse};

/// POST /api/webhook - Logs the payload and acknowledges it.
///
/// Signature verification and event dispatch are intentionally absent;
/// the connector only needs the hook URL to exist when the app is
/// created from its manifest.
pub async fn handle_webhook(body: Bytes) -> impl IntoResponse {
    tracing::info!(payload = %String::from_utf8_lossy(&body), "Received webhook");
    StatusCode::NO_CONTENT
}
