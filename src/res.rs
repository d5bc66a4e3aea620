use std::path::Path;

use tower_http::services::ServeDir;

/// Remote favicon service; the target site URL is appended verbatim.
pub const FAVICON_SERVICE_URL: &str = "http://www.google.com/s2/favicons?domain_url=";

pub fn favicon_url(url: &str) -> String {
    format!("{FAVICON_SERVICE_URL}{url}")
}

/// Local route serving icon files, keyed by icon identifier.
#[derive(Debug, Clone)]
pub struct IconRoute {
    prefix: String,
}

impl IconRoute {
    pub fn new(prefix: &str) -> Self {
        let prefix = prefix.trim_end_matches('/');
        let prefix = if prefix.starts_with('/') {
            prefix.to_owned()
        } else {
            format!("/{prefix}")
        };
        Self { prefix }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn reverse(&self, icon: &str) -> String {
        format!("{}/{}", self.prefix, urlencoding::encode(icon))
    }

    pub fn service(dir: impl AsRef<Path>) -> ServeDir {
        ServeDir::new(dir)
    }
}

impl Default for IconRoute {
    fn default() -> Self {
        Self::new("/elsewhere/img")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn favicon_appends_url_verbatim() {
        assert_eq!(
            favicon_url("http://twitter.com/"),
            "http://www.google.com/s2/favicons?domain_url=http://twitter.com/"
        );
    }

    #[test]
    fn reverse_joins_prefix_and_icon() {
        let icons = IconRoute::new("static/icons/");
        assert_eq!(icons.prefix(), "/static/icons");
        assert_eq!(icons.reverse("twitter.png"), "/static/icons/twitter.png");
        assert_eq!(icons.reverse("a b.png"), "/static/icons/a%20b.png");
    }
}
