//! Setup wizard endpoints.
//!
//! The browser drives GitHub's manifest flow: it registers a one-time
//! state token here, POSTs the manifest form to GitHub, and posts the
//! callback code back for exchange. Each endpoint below is one
//! server-side transition of that flow.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;

use connector_core::db::app_record::AppRecordRepo;
use connector_core::db::setup_state::{SetupState, SetupStateRepo};
use connector_core::github::manifest::{github_new_app_url, AppManifest, AppUrls};
use connector_core::github::AppConfig;

use crate::routes::{error_response, github_client};
use crate::session;
use crate::state::AppState;

/// Query parameters for the manifest endpoint.
#[derive(Debug, Deserialize)]
pub struct ManifestQuery {
    pub state: Option<String>,
}

/// Response for the manifest endpoint.
#[derive(Debug, Serialize)]
pub struct ManifestResponse {
    pub manifest: AppManifest,
    /// The GitHub page to POST the manifest form to, when a state token
    /// was supplied.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub create_url: Option<String>,
}

/// GET /api/setup/manifest - Returns the manifest for this deployment.
pub async fn get_manifest(
    State(state): State<AppState>,
    Query(query): Query<ManifestQuery>,
) -> Response {
    let manifest = AppManifest::for_origin(&state.config.base_url_parsed);
    let create_url = query.state.as_deref().map(github_new_app_url);

    (StatusCode::OK, Json(ManifestResponse { manifest, create_url })).into_response()
}

/// Request body for state registration.
#[derive(Debug, Deserialize)]
pub struct SetCreateAppStateBody {
    pub state: String,
}

/// POST /api/setup/set-create-app-state - Registers the one-time state
/// token the browser is about to round-trip through GitHub.
pub async fn set_create_app_state(
    State(state): State<AppState>,
    Json(body): Json<SetCreateAppStateBody>,
) -> Response {
    if body.state.is_empty() {
        return error_response(
            StatusCode::BAD_REQUEST,
            "INVALID_STATE",
            "State token must not be empty",
        );
    }

    match SetupStateRepo::create(&state.db, &SetupState::new(&body.state)).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => {
            tracing::error!("Failed to store setup state: {}", e);
            error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "DATABASE_ERROR",
                "Failed to store state token",
            )
        }
    }
}

/// Request body for the manifest callback.
#[derive(Debug, Deserialize)]
pub struct CreatingAppBody {
    pub code: String,
    pub state: String,
}

/// Response for a successful exchange.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedAppResponse {
    pub app_config: AppConfig,
    pub app_urls: AppUrls,
}

/// POST /api/setup/creating-app - Exchanges the callback code for app
/// credentials, stores them, and binds the owner to this session.
pub async fn creating_app(
    State(state): State<AppState>,
    session: Session,
    Json(body): Json<CreatingAppBody>,
) -> Response {
    // Validate the round-tripped state token
    match SetupStateRepo::consume(&state.db, &body.state).await {
        Ok(Some(_)) => {}
        Ok(None) => {
            return error_response(
                StatusCode::UNPROCESSABLE_ENTITY,
                "INVALID_STATE",
                "Invalid, expired, or already-used state parameter",
            );
        }
        Err(e) => {
            tracing::error!("Failed to validate setup state: {}", e);
            return error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "DATABASE_ERROR",
                "Failed to validate state",
            );
        }
    }

    let client = match github_client(&state) {
        Ok(c) => c,
        Err(response) => return response,
    };

    // Exchange the code for the created app
    let app = match client.exchange_manifest_code(&body.code).await {
        Ok(app) => app,
        Err(e) => {
            tracing::error!("Failed to exchange manifest code: {}", e);
            return error_response(
                StatusCode::UNPROCESSABLE_ENTITY,
                "CODE_EXCHANGE_FAILED",
                &format!("Failed to exchange code: {}", e),
            );
        }
    };

    // Encrypt and store the credentials
    let record = match client.create_record(&app) {
        Ok(r) => r,
        Err(e) => {
            tracing::error!("Failed to create app record: {}", e);
            return error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "ENCRYPTION_ERROR",
                "Failed to encrypt credentials",
            );
        }
    };

    if let Err(e) = AppRecordRepo::upsert(&state.db, &record).await {
        tracing::error!("Failed to store app record: {}", e);
        return error_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            "DATABASE_ERROR",
            "Failed to store app record",
        );
    }

    // The owner of the created app becomes this session's user
    if let Err(e) = session::bind_user(&session, app.owner.id).await {
        tracing::error!("Failed to bind user to session: {}", e);
        return error_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            "SESSION_ERROR",
            "Failed to bind user to session",
        );
    }

    tracing::info!(
        "GitHub App {} ({}) created for user {}",
        record.name,
        record.app_id,
        record.github_user_id
    );

    (
        StatusCode::CREATED,
        Json(CreatedAppResponse {
            app_config: AppConfig::from_record(&record),
            app_urls: AppUrls::new(&record.slug, &record.html_url),
        }),
    )
        .into_response()
}

/// Request body for the install callback.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostInstallAppBody {
    pub installation_id: i64,
}

/// POST /api/setup/post-install-app - Records the installation id after
/// the user has installed the app on GitHub.
pub async fn post_install_app(
    State(state): State<AppState>,
    session: Session,
    Json(body): Json<PostInstallAppBody>,
) -> Response {
    let data = match session::load(&session).await {
        Ok(d) => d,
        Err(e) => {
            tracing::error!("Failed to load session: {}", e);
            return error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "SESSION_ERROR",
                "Failed to load session",
            );
        }
    };

    let Some(user_id) = data.github_user_id else {
        return error_response(
            StatusCode::BAD_REQUEST,
            "NO_SESSION",
            "Failed to save installation: no user bound to this session",
        );
    };

    match AppRecordRepo::set_installation(&state.db, user_id, body.installation_id).await {
        Ok(true) => {
            tracing::info!(
                "Recorded installation {} for user {}",
                body.installation_id,
                user_id
            );
            StatusCode::NO_CONTENT.into_response()
        }
        Ok(false) => error_response(
            StatusCode::BAD_REQUEST,
            "NO_APP",
            "Failed to save installation: no app record for this session",
        ),
        Err(e) => {
            tracing::error!("Failed to record installation: {}", e);
            error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "DATABASE_ERROR",
                "Failed to record installation",
            )
        }
    }
}
