//! GitHub release source resolver for depstrap.
//!
//! Resolves a process's binary from a GitHub-style releases endpoint: pick
//! the newest release, short-circuit when the recorded state already points
//! at it, otherwise select the first matching asset and stream it into the
//! install directory.

#![warn(missing_docs)]

mod client;

pub use client::{GitHubReleaseClient, Release, ReleaseAsset, ReleaseClient};

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use depstrap_core::pattern::AssetMatcher;
use depstrap_core::platform::PlatformTag;
use depstrap_core::process::{ProcessSpec, SourceType};
use depstrap_core::resolve::{Resolution, SourceResolver};
use depstrap_core::state::{DependencyRecord, SharedState};
use depstrap_core::{Error, Result};
use tracing::{debug, info};

/// Source resolver for GitHub releases.
pub struct GithubResolver {
    client: Arc<dyn ReleaseClient>,
}

impl Default for GithubResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl GithubResolver {
    /// Resolver against the public GitHub API.
    #[must_use]
    pub fn new() -> Self {
        Self::with_client(Arc::new(GitHubReleaseClient::new()))
    }

    /// Resolver with an injected release client.
    #[must_use]
    pub fn with_client(client: Arc<dyn ReleaseClient>) -> Self {
        Self { client }
    }
}

/// The release with the most recent publish timestamp; ties (and missing
/// timestamps) resolve to the first encountered, preserving listing order.
fn pick_latest(releases: &[Release]) -> Option<&Release> {
    releases.iter().reduce(|best, candidate| {
        if candidate.published_at > best.published_at {
            candidate
        } else {
            best
        }
    })
}

#[async_trait]
impl SourceResolver for GithubResolver {
    fn name(&self) -> &'static str {
        "github"
    }

    fn can_handle(&self, source_type: SourceType) -> bool {
        source_type == SourceType::Github
    }

    async fn resolve(
        &self,
        spec: &ProcessSpec,
        platform: PlatformTag,
        install_dir: &Path,
        state: &SharedState,
    ) -> Result<Resolution> {
        let repo = spec.source.as_deref().ok_or_else(|| {
            Error::configuration("source is required when sourceType is \"github\"")
        })?;

        // Built before any network access so a missing pattern fails fast.
        let matcher = AssetMatcher::for_spec(spec, platform)?;

        let releases = self.client.list_releases(repo).await?;
        let latest =
            pick_latest(&releases).ok_or_else(|| Error::resolution(repo, "no releases found"))?;

        {
            let guard = state.lock().await;
            if let Some(record) = guard.get(repo) {
                if record.url.as_deref() == Some(latest.url.as_str()) {
                    info!(source = repo, "Already up to date");
                    return Ok(Resolution::skipped(record.filename.clone()));
                }
            }
        }

        let asset = latest
            .assets
            .iter()
            .find(|a| matcher.is_match(&a.name))
            .ok_or_else(|| {
                Error::resolution(
                    repo,
                    format!(
                        "no asset matching {matcher} among {} assets",
                        latest.assets.len()
                    ),
                )
            })?;

        let filename = asset
            .browser_download_url
            .rsplit('/')
            .next()
            .unwrap_or(asset.name.as_str())
            .to_string();
        let dest = install_dir.join(&filename);

        info!(source = repo, asset = %asset.name, dest = %dest.display(), "Fetching release asset");
        self.client.download(&asset.browser_download_url, &dest).await?;
        debug!(source = repo, %filename, "Asset written");

        state
            .lock()
            .await
            .insert(repo, DependencyRecord::remote(latest.url.clone(), &filename));

        Ok(Resolution::fetched(filename))
    }
}
