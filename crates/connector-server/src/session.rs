//! Session-bound user identity.
//!
//! A session carries at most one fact: the GitHub user id of the app
//! owner, written once by the manifest-code exchange. Handlers receive
//! the session handle explicitly and read it through these helpers.

use serde::{Deserialize, Serialize};
use tower_sessions::Session;

/// Key under which [`SessionData`] is stored in the session.
pub const SESSION_DATA_KEY: &str = "data";

/// Data stored in the session store.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionData {
    pub github_user_id: Option<i64>,
}

/// Loads the session data, defaulting to an anonymous session.
pub async fn load(session: &Session) -> Result<SessionData, tower_sessions::session::Error> {
    Ok(session
        .get::<SessionData>(SESSION_DATA_KEY)
        .await?
        .unwrap_or_default())
}

/// Binds a GitHub user id to the session.
pub async fn bind_user(
    session: &Session,
    github_user_id: i64,
) -> Result<(), tower_sessions::session::Error> {
    session
        .insert(
            SESSION_DATA_KEY,
            SessionData {
                github_user_id: Some(github_user_id),
            },
        )
        .await
}
