//! API endpoint paths.
//!
//! The same constants register the axum routes and feed the manifest
//! builder, so the webhook URL in a generated manifest cannot drift from
//! the route that serves it.

/// App root: GET returns the stored app state, DELETE removes it.
pub const APP_ROOT: &str = "/api/app";

/// Webhook receiver: POST only.
pub const WEBHOOK: &str = "/api/webhook";

/// Returns the manifest and GitHub creation URL for this deployment.
pub const SETUP_MANIFEST: &str = "/api/setup/manifest";

/// Registers the one-time state token before redirecting to GitHub.
pub const SETUP_SET_CREATE_APP_STATE: &str = "/api/setup/set-create-app-state";

/// Exchanges the manifest callback code for app credentials.
pub const SETUP_CREATING_APP: &str = "/api/setup/creating-app";

/// Records the installation id after the app is installed.
pub const SETUP_POST_INSTALL_APP: &str = "/api/setup/post-install-app";
