//! Client page path table.
//!
//! The frontend's pages are described as a flat table of paths with
//! parent/child composition. Composition happens once, when the table is
//! built; everything downstream (manifest URLs, redirects) reads the
//! finished strings.

/// A URL path composed from a parent path and an endpoint segment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlPath {
    path: String,
}

impl UrlPath {
    /// Joins an endpoint segment onto an optional parent path.
    ///
    /// The endpoint must start with `/`. A root parent (`/`) does not
    /// double the slash.
    pub fn new(parent: Option<&UrlPath>, endpoint: &str) -> Self {
        let path = match parent {
            Some(parent) => format!("{}{}", parent.path.trim_end_matches('/'), endpoint),
            None => endpoint.to_string(),
        };
        Self { path }
    }

    /// The full composed path.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// The path appended to the given origin, e.g. `https://host/setup`.
    pub fn with_origin(&self, origin: &str) -> String {
        format!("{}{}", origin.trim_end_matches('/'), self.path)
    }
}

impl std::fmt::Display for UrlPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.path)
    }
}

/// All client pages, composed once at construction.
#[derive(Debug, Clone)]
pub struct ClientPages {
    pub home: UrlPath,
    pub setup: UrlPath,
    pub create_app: UrlPath,
    pub creating_app: UrlPath,
    pub installed_app: UrlPath,
    pub app: UrlPath,
}

impl ClientPages {
    pub fn new() -> Self {
        let home = UrlPath::new(None, "/");
        let setup = UrlPath::new(Some(&home), "/setup");
        let create_app = UrlPath::new(Some(&setup), "/create-app");
        let creating_app = UrlPath::new(Some(&setup), "/creating-app");
        let installed_app = UrlPath::new(Some(&setup), "/installed-app");
        let app = UrlPath::new(Some(&home), "/app");

        Self {
            home,
            setup,
            create_app,
            creating_app,
            installed_app,
            app,
        }
    }
}

impl Default for ClientPages {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_path_composition() {
        let pages = ClientPages::new();

        assert_eq!(pages.home.path(), "/");
        assert_eq!(pages.setup.path(), "/setup");
        assert_eq!(pages.create_app.path(), "/setup/create-app");
        assert_eq!(pages.creating_app.path(), "/setup/creating-app");
        assert_eq!(pages.installed_app.path(), "/setup/installed-app");
        assert_eq!(pages.app.path(), "/app");
    }

    #[test]
    fn test_with_origin_strips_trailing_slash() {
        let pages = ClientPages::new();

        assert_eq!(
            pages.setup.with_origin("https://connector.example.com/"),
            "https://connector.example.com/setup"
        );
        assert_eq!(
            pages.setup.with_origin("https://connector.example.com"),
            "https://connector.example.com/setup"
        );
    }
}
