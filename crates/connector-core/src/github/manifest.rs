//! GitHub App manifest construction.
//!
//! <https://docs.github.com/en/developers/apps/creating-a-github-app-from-a-manifest>

use serde::Serialize;
use url::Url;

use crate::endpoints;
use crate::pages::ClientPages;

/// GitHub App manifest for creating a new app.
///
/// Serialized into the `manifest` form field the browser POSTs to
/// GitHub's app-creation page.
#[derive(Debug, Clone, Serialize)]
pub struct AppManifest {
    pub name: String,
    pub description: String,
    pub url: String,
    pub hook_attributes: HookAttributes,
    /// Redirected to after the app is created.
    pub redirect_url: String,
    /// Redirected to after the app is installed.
    pub callback_url: String,
    /// Redirected to after the app is updated.
    pub setup_url: String,
    pub setup_on_update: bool,
    pub public: bool,
    pub default_permissions: DefaultPermissions,
    pub default_events: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct HookAttributes {
    pub url: String,
    pub active: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct DefaultPermissions {
    pub actions: String,
    pub secrets: String,
}

impl AppManifest {
    /// Builds the manifest for a deployment reachable at `origin`.
    pub fn for_origin(origin: &Url) -> Self {
        let pages = ClientPages::new();
        let origin = origin.as_str();

        let redirect_url = pages.creating_app.with_origin(origin);
        let callback_url = pages.installed_app.with_origin(origin);
        let setup_url = format!("{}?reload=true", callback_url);
        let webhook_url = format!("{}{}", origin.trim_end_matches('/'), endpoints::WEBHOOK);

        Self {
            name: "OpenShift Actions Connector".to_string(),
            description: "Connect your OpenShift cluster to GitHub Actions".to_string(),
            url: "https://github.com/redhat-actions".to_string(),
            hook_attributes: HookAttributes {
                url: webhook_url,
                active: true,
            },
            redirect_url,
            callback_url,
            setup_url,
            setup_on_update: true,
            public: false,
            default_permissions: DefaultPermissions {
                actions: "write".to_string(),
                secrets: "write".to_string(),
            },
            default_events: vec!["workflow_run".to_string()],
        }
    }
}

/// Builds the GitHub manifest-creation URL the browser POSTs its form to.
pub fn github_new_app_url(state: &str) -> String {
    format!(
        "https://github.com/settings/apps/new?state={}",
        urlencoding::encode(state)
    )
}

/// Builds the installation-settings URL for a created app.
pub fn github_install_url(slug: &str) -> String {
    format!("https://github.com/settings/apps/{}/installations", slug)
}

/// URLs for a created app, derived from its slug and html_url.
#[derive(Debug, Clone, Serialize)]
pub struct AppUrls {
    /// The app's public page on GitHub.
    pub app: String,
    /// The app's settings page (owner only).
    pub settings: String,
    /// The installation-settings page, also the install target.
    pub install: String,
}

impl AppUrls {
    pub fn new(slug: &str, html_url: &str) -> Self {
        Self {
            app: html_url.to_string(),
            settings: format!("https://github.com/settings/apps/{}", slug),
            install: github_install_url(slug),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manifest_url_derivation() {
        let origin = Url::parse("https://connector.apps.cluster.example.com/").unwrap();
        let manifest = AppManifest::for_origin(&origin);

        assert_eq!(
            manifest.redirect_url,
            "https://connector.apps.cluster.example.com/setup/creating-app"
        );
        assert_eq!(
            manifest.callback_url,
            "https://connector.apps.cluster.example.com/setup/installed-app"
        );
        assert_eq!(
            manifest.setup_url,
            "https://connector.apps.cluster.example.com/setup/installed-app?reload=true"
        );
        assert_eq!(
            manifest.hook_attributes.url,
            "https://connector.apps.cluster.example.com/api/webhook"
        );
    }

    #[test]
    fn test_manifest_fixed_fields() {
        let origin = Url::parse("http://localhost:8080").unwrap();
        let manifest = AppManifest::for_origin(&origin);

        assert_eq!(manifest.name, "OpenShift Actions Connector");
        assert!(!manifest.public);
        assert!(manifest.setup_on_update);
        assert_eq!(manifest.default_permissions.actions, "write");
        assert_eq!(manifest.default_permissions.secrets, "write");
        assert_eq!(manifest.default_events, vec!["workflow_run"]);
    }

    #[test]
    fn test_github_urls() {
        assert_eq!(
            github_new_app_url("abc 123"),
            "https://github.com/settings/apps/new?state=abc%20123"
        );
        assert_eq!(
            github_install_url("my-connector"),
            "https://github.com/settings/apps/my-connector/installations"
        );
    }

    #[test]
    fn test_app_urls() {
        let urls = AppUrls::new("my-connector", "https://github.com/apps/my-connector");
        assert_eq!(urls.app, "https://github.com/apps/my-connector");
        assert_eq!(urls.settings, "https://github.com/settings/apps/my-connector");
        assert_eq!(
            urls.install,
            "https://github.com/settings/apps/my-connector/installations"
        );
    }
}
