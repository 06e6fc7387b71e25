//! App root endpoints.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use tower_sessions::Session;

use connector_core::db::app_record::AppRecordRepo;
use connector_core::github::GitHubAppState;

use crate::routes::{error_response, github_client};
use crate::session;
use crate::state::AppState;

/// GET /api/app - Returns the stored app state for this session.
///
/// Responds `{"app": false}` when the session carries no user id or no
/// record is stored for it; otherwise fans out to GitHub for the current
/// installations and repositories.
pub async fn get_app(State(state): State<AppState>, session: Session) -> Response {
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
        return (StatusCode::OK, Json(GitHubAppState::not_configured())).into_response();
    };

    let record = match AppRecordRepo::get_by_user(&state.db, user_id).await {
        Ok(r) => r,
        Err(e) => {
            tracing::error!("Failed to fetch app record: {}", e);
            return error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "DATABASE_ERROR",
                "Failed to fetch app record",
            );
        }
    };

    let Some(record) = record else {
        tracing::info!("App is not initialized for user {}", user_id);
        return (StatusCode::OK, Json(GitHubAppState::not_configured())).into_response();
    };

    let client = match github_client(&state) {
        Ok(c) => c,
        Err(response) => return response,
    };

    // Two independent GitHub calls, awaited together. The repositories
    // listing needs an installation token, so it short-circuits to empty
    // until the install callback has recorded an installation id.
    let installations_fut = client.list_installations(&record);
    let repositories_fut = async {
        match record.installation_id {
            Some(id) => client.list_installation_repositories(&record, id).await,
            None => Ok(Vec::new()),
        }
    };
    let (installations, repositories) = tokio::join!(installations_fut, repositories_fut);

    let (installations, repositories) = match (installations, repositories) {
        (Ok(installations), Ok(repositories)) => (installations, repositories),
        (Err(e), _) | (_, Err(e)) => {
            tracing::error!("GitHub API call failed: {}", e);
            return error_response(
                StatusCode::BAD_GATEWAY,
                "GITHUB_API_ERROR",
                &format!("GitHub API call failed: {}", e),
            );
        }
    };

    (
        StatusCode::OK,
        Json(GitHubAppState::configured(&record, installations, repositories)),
    )
        .into_response()
}

/// DELETE /api/app - Removes the stored app record for this session.
pub async fn delete_app(State(state): State<AppState>, session: Session) -> Response {
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
            "Failed to delete app: no user bound to this session",
        );
    };

    match AppRecordRepo::delete_by_user(&state.db, user_id).await {
        Ok(existed) => {
            if existed {
                tracing::info!("Deleted app record for user {}", user_id);
            }
            StatusCode::NO_CONTENT.into_response()
        }
        Err(e) => {
            tracing::error!("Failed to delete app record: {}", e);
            error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "DATABASE_ERROR",
                "Failed to delete app record",
            )
        }
    }
}
