//! HTTP route handlers.

pub mod app;
pub mod setup;
pub mod webhook;

use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;

use connector_core::endpoints;
use connector_core::github::GitHubClient;

use crate::state::AppState;

/// Error response type.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Debug, Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
}

pub(crate) fn error_response(status: StatusCode, code: &str, message: &str) -> Response {
    (
        status,
        Json(ErrorResponse {
            error: ErrorDetail {
                code: code.to_string(),
                message: message.to_string(),
            },
        }),
    )
        .into_response()
}

/// 405 with the route's allowed-method list and an `Allow` header.
fn method_not_allowed(allowed: &'static [&'static str]) -> Response {
    (
        StatusCode::METHOD_NOT_ALLOWED,
        [(header::ALLOW, allowed.join(", "))],
        Json(serde_json::json!({
            "error": {
                "code": "METHOD_NOT_ALLOWED",
                "message": format!("Method not allowed. Allowed: {}", allowed.join(", ")),
            },
            "allowed": allowed,
        })),
    )
        .into_response()
}

/// Builds a GitHub client for the configured deployment.
pub(crate) fn github_client(state: &AppState) -> Result<GitHubClient, Response> {
    let encryption_key = match state.require_encryption_key() {
        Ok(key) => key.clone(),
        Err(msg) => {
            return Err(error_response(
                StatusCode::SERVICE_UNAVAILABLE,
                "ENCRYPTION_NOT_CONFIGURED",
                msg,
            ));
        }
    };

    let client = match GitHubClient::new(encryption_key) {
        Ok(c) => c,
        Err(e) => {
            tracing::error!("Failed to create GitHub client: {}", e);
            return Err(error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "CLIENT_ERROR",
                "Failed to create GitHub client",
            ));
        }
    };

    Ok(match &state.config.github_api_base {
        Some(base) => client.with_api_base(base),
        None => client,
    })
}

/// Builds the API router. Layers (sessions, CORS) are applied by the
/// caller.
pub fn api_router(state: AppState) -> Router {
    Router::new()
        .route(
            endpoints::APP_ROOT,
            get(app::get_app)
                .delete(app::delete_app)
                .fallback(|| async { method_not_allowed(&["GET", "DELETE"]) }),
        )
        .route(
            endpoints::WEBHOOK,
            post(webhook::handle_webhook).fallback(|| async { method_not_allowed(&["POST"]) }),
        )
        .route(endpoints::SETUP_MANIFEST, get(setup::get_manifest))
        .route(
            endpoints::SETUP_SET_CREATE_APP_STATE,
            post(setup::set_create_app_state),
        )
        .route(endpoints::SETUP_CREATING_APP, post(setup::creating_app))
        .route(
            endpoints::SETUP_POST_INSTALL_APP,
            post(setup::post_install_app),
        )
        .with_state(state)
}
