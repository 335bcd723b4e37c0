//! Download URL construction

use axum::http::{HeaderMap, header};

/// Route prefix files are served under
pub const FILES_ROUTE: &str = "/files";

/// Builds absolute download URLs from the configured public address, or from
/// the `Host` the client connected to when none is configured
#[derive(Debug, Clone)]
pub struct UrlBuilder {
    public_url: Option<String>,
    fallback_host: String,
}

impl UrlBuilder {
    pub fn new(public_url: Option<String>, fallback_host: impl Into<String>) -> Self {
        Self {
            public_url: public_url.map(|url| url.trim_end_matches('/').to_string()),
            fallback_host: fallback_host.into(),
        }
    }

    /// External base address for one request, without a trailing slash
    pub fn base_url(&self, headers: &HeaderMap) -> String {
        if let Some(url) = &self.public_url {
            return url.clone();
        }
        let host = headers
            .get(header::HOST)
            .and_then(|value| value.to_str().ok())
            .filter(|host| !host.is_empty())
            .unwrap_or(&self.fallback_host);
        format!("http://{}", host)
    }
}

/// Absolute download URL for a root-relative path; each segment is
/// percent-encoded
pub fn file_url(base: &str, relative_path: &str) -> String {
    let encoded = relative_path
        .split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect::<Vec<_>>()
        .join("/");
    format!("{}{}/{}", base, FILES_ROUTE, encoded)
}
