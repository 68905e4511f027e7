//! Release-listing and download client.
//!
//! The [`ReleaseClient`] trait is the boundary to the GitHub-compatible
//! releases API: list a repo's releases, download an asset's bytes to a
//! file. The resolver only ever talks through this trait, so tests can
//! substitute an in-memory implementation.

use std::path::Path;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use depstrap_core::{Error, Result};
use futures::StreamExt;
use reqwest::Client;
use serde::Deserialize;
use tokio::io::AsyncWriteExt;
use tracing::debug;

/// A remote release: publish timestamp, canonical URL, downloadable assets.
#[derive(Debug, Clone, Deserialize)]
pub struct Release {
    /// Canonical API URL of the release. Immutable once published; used as
    /// the freshness signal.
    pub url: String,
    /// Publish timestamp; newest wins.
    #[serde(default)]
    pub published_at: Option<DateTime<Utc>>,
    /// Downloadable assets in listing order.
    #[serde(default)]
    pub assets: Vec<ReleaseAsset>,
}

/// One downloadable asset of a release.
#[derive(Debug, Clone, Deserialize)]
pub struct ReleaseAsset {
    /// Asset file name, matched against the platform tag or pattern.
    pub name: String,
    /// Direct download URL.
    pub browser_download_url: String,
}

/// Boundary to the release-listing API and asset downloads.
#[async_trait]
pub trait ReleaseClient: Send + Sync {
    /// List all releases of `repo` (`owner/name`), in API order.
    async fn list_releases(&self, repo: &str) -> Result<Vec<Release>>;

    /// Stream the bytes at `url` into the file at `dest`.
    async fn download(&self, url: &str, dest: &Path) -> Result<()>;
}

/// Default GitHub API base.
const GITHUB_API_BASE: &str = "https://api.github.com";

/// `ReleaseClient` backed by the GitHub REST API.
pub struct GitHubReleaseClient {
    client: Client,
    api_base: String,
}

impl Default for GitHubReleaseClient {
    fn default() -> Self {
        Self::new()
    }
}

impl GitHubReleaseClient {
    /// Create a client against the public GitHub API.
    ///
    /// # Panics
    ///
    /// `reqwest::Client::builder().build()` only fails on TLS backend
    /// initialization problems; with default settings and a user agent this
    /// cannot happen, so the panic indicates a broken environment.
    #[must_use]
    pub fn new() -> Self {
        Self::with_api_base(GITHUB_API_BASE)
    }

    /// Create a client against a custom API base (tests, GitHub Enterprise).
    #[must_use]
    pub fn with_api_base(api_base: impl Into<String>) -> Self {
        Self {
            client: Client::builder()
                .user_agent("depstrap")
                .build()
                .expect("Failed to create HTTP client - TLS backend initialization failed"),
            api_base: api_base.into(),
        }
    }

    /// Attach a bearer token from the environment, if present.
    fn authorized(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        if let Ok(token) = std::env::var("GITHUB_TOKEN") {
            request.header("Authorization", format!("Bearer {token}"))
        } else if let Ok(token) = std::env::var("GH_TOKEN") {
            request.header("Authorization", format!("Bearer {token}"))
        } else {
            request
        }
    }
}

#[async_trait]
impl ReleaseClient for GitHubReleaseClient {
    async fn list_releases(&self, repo: &str) -> Result<Vec<Release>> {
        let url = format!("{}/repos/{}/releases", self.api_base, repo);
        debug!(%url, "Listing releases");

        let response = self
            .authorized(self.client.get(&url))
            .send()
            .await
            .map_err(|e| Error::transport(format!("Failed to list releases for {repo}: {e}")))?;

        if !response.status().is_success() {
            return Err(Error::transport(format!(
                "Release listing for {repo} failed (HTTP {})",
                response.status()
            )));
        }

        response.json().await.map_err(|e| {
            Error::transport(format!("Failed to parse release listing for {repo}: {e}"))
        })
    }

    async fn download(&self, url: &str, dest: &Path) -> Result<()> {
        debug!(%url, dest = %dest.display(), "Downloading asset");

        let response = self
            .authorized(self.client.get(url))
            .send()
            .await
            .map_err(|e| Error::transport(format!("Failed to download {url}: {e}")))?;

        if !response.status().is_success() {
            return Err(Error::transport(format!(
                "Download of {url} failed (HTTP {})",
                response.status()
            )));
        }

        let mut file = tokio::fs::File::create(dest)
            .await
            .map_err(|e| Error::io(e, Some(dest.to_path_buf()), "creating download file"))?;

        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk =
                chunk.map_err(|e| Error::transport(format!("Download of {url} failed: {e}")))?;
            file.write_all(&chunk)
                .await
                .map_err(|e| Error::io(e, Some(dest.to_path_buf()), "writing download file"))?;
        }
        file.flush()
            .await
            .map_err(|e| Error::io(e, Some(dest.to_path_buf()), "flushing download file"))?;

        debug!(dest = %dest.display(), "Download complete");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const LISTING: &str = r#"[
        {
            "url": "https://api.example.test/repos/acme/tool/releases/2",
            "published_at": "2024-05-01T12:00:00Z",
            "assets": [
                { "name": "tool-linux", "browser_download_url": "https://dl.example.test/v2/tool-linux" }
            ]
        },
        {
            "url": "https://api.example.test/repos/acme/tool/releases/1",
            "published_at": "2024-01-01T12:00:00Z",
            "assets": []
        }
    ]"#;

    #[tokio::test]
    async fn lists_releases_from_the_api() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/repos/acme/tool/releases"))
            .respond_with(
                ResponseTemplate::new(200).set_body_raw(LISTING, "application/json"),
            )
            .mount(&server)
            .await;

        let client = GitHubReleaseClient::with_api_base(server.uri());
        let releases = client.list_releases("acme/tool").await.unwrap();

        assert_eq!(releases.len(), 2);
        assert_eq!(releases[0].assets[0].name, "tool-linux");
        assert!(releases[0].published_at > releases[1].published_at);
    }

    #[tokio::test]
    async fn non_success_listing_is_a_transport_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/repos/acme/tool/releases"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let client = GitHubReleaseClient::with_api_base(server.uri());
        let err = client.list_releases("acme/tool").await.unwrap_err();
        assert!(matches!(err, Error::Transport { .. }));
    }

    #[tokio::test]
    async fn downloads_bytes_to_a_file() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/assets/tool-linux"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"binary-bytes".to_vec()))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("tool-linux");
        let client = GitHubReleaseClient::with_api_base(server.uri());
        client
            .download(&format!("{}/assets/tool-linux", server.uri()), &dest)
            .await
            .unwrap();

        assert_eq!(std::fs::read(&dest).unwrap(), b"binary-bytes");
    }

    #[tokio::test]
    async fn failed_download_is_a_transport_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/assets/ghost"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let client = GitHubReleaseClient::with_api_base(server.uri());
        let err = client
            .download(
                &format!("{}/assets/ghost", server.uri()),
                &dir.path().join("ghost"),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Transport { .. }));
    }
}
