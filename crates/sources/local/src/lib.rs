//! Local-directory source resolver for depstrap.
//!
//! Resolves a process's binary by copying a matching file out of a directory
//! on the local filesystem. Local sources have no freshness signal, so the
//! copy happens on every run; the state record still tracks what was copied.

#![warn(missing_docs)]

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use depstrap_core::pattern::AssetMatcher;
use depstrap_core::platform::PlatformTag;
use depstrap_core::process::{ProcessSpec, SourceType};
use depstrap_core::resolve::{Resolution, SourceResolver};
use depstrap_core::state::{DependencyRecord, SharedState};
use depstrap_core::{Error, Result};
use tracing::info;

/// Source resolver for local directories.
#[derive(Debug, Default)]
pub struct LocalResolver;

impl LocalResolver {
    /// Resolver reading from the local filesystem.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// An `Arc`'d resolver, ready for registry registration.
    #[must_use]
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::new())
    }
}

/// File names in `dir`, sorted so matching order is deterministic across
/// filesystems.
async fn sorted_entries(dir: &Path) -> Result<Vec<String>> {
    let mut reader = tokio::fs::read_dir(dir)
        .await
        .map_err(|e| Error::io(e, Some(dir.to_path_buf()), "listing local source"))?;

    let mut names = Vec::new();
    while let Some(entry) = reader
        .next_entry()
        .await
        .map_err(|e| Error::io(e, Some(dir.to_path_buf()), "listing local source"))?
    {
        if entry.file_type().await.is_ok_and(|t| t.is_file()) {
            if let Ok(name) = entry.file_name().into_string() {
                names.push(name);
            }
        }
    }
    names.sort();
    Ok(names)
}

#[async_trait]
impl SourceResolver for LocalResolver {
    fn name(&self) -> &'static str {
        "local"
    }

    fn can_handle(&self, source_type: SourceType) -> bool {
        source_type == SourceType::Local
    }

    async fn resolve(
        &self,
        spec: &ProcessSpec,
        platform: PlatformTag,
        install_dir: &Path,
        state: &SharedState,
    ) -> Result<Resolution> {
        let local_path = spec.local_path.as_deref().ok_or_else(|| {
            Error::configuration("localPath is required when sourceType is \"local\"")
        })?;

        let matcher = AssetMatcher::for_spec(spec, platform)?;

        let source_dir = Path::new(local_path);
        if !source_dir.is_dir() {
            return Err(Error::resolution(
                local_path,
                "local source path does not exist or is not a directory",
            ));
        }

        let entries = sorted_entries(source_dir).await?;
        let filename = entries
            .iter()
            .find(|name| matcher.is_match(name))
            .cloned()
            .ok_or_else(|| {
                Error::resolution(
                    local_path,
                    format!("no file matching {matcher} among {} entries", entries.len()),
                )
            })?;

        let dest = install_dir.join(&filename);
        info!(source = local_path, %filename, dest = %dest.display(), "Copying local file");
        tokio::fs::copy(source_dir.join(&filename), &dest)
            .await
            .map_err(|e| Error::io(e, Some(dest.clone()), "copying local file"))?;

        state
            .lock()
            .await
            .insert(local_path, DependencyRecord::local(local_path, &filename));

        Ok(Resolution::fetched(filename))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use depstrap_core::resolve::FetchOutcome;
    use depstrap_core::state::DependencyState;
    use serde_json::json;

    fn spec(value: serde_json::Value) -> ProcessSpec {
        serde_json::from_value(value).unwrap()
    }

    fn state() -> SharedState {
        DependencyState::default().into_shared()
    }

    #[tokio::test]
    async fn copies_platform_matching_file() {
        let source = tempfile::tempdir().unwrap();
        std::fs::write(source.path().join("tool-linux"), b"linux bytes").unwrap();
        std::fs::write(source.path().join("tool-win.exe"), b"win bytes").unwrap();
        let install = tempfile::tempdir().unwrap();
        let state = state();

        let spec = spec(json!({
            "sourceType": "local",
            "localPath": source.path().to_str().unwrap()
        }));

        let resolution = LocalResolver::new()
            .resolve(&spec, PlatformTag::Linux, install.path(), &state)
            .await
            .unwrap();

        assert_eq!(resolution.outcome, FetchOutcome::Fetched);
        assert_eq!(resolution.filename, "tool-linux");
        assert_eq!(
            std::fs::read(install.path().join("tool-linux")).unwrap(),
            b"linux bytes"
        );

        let guard = state.lock().await;
        let record = guard
            .get(source.path().to_str().unwrap())
            .unwrap();
        assert_eq!(record.filename, "tool-linux");
        assert!(record.url.is_none());
    }

    #[tokio::test]
    async fn pattern_mode_picks_first_match_in_name_order() {
        let source = tempfile::tempdir().unwrap();
        std::fs::write(source.path().join("b-widget.zip"), b"b").unwrap();
        std::fs::write(source.path().join("a-widget.zip"), b"a").unwrap();
        std::fs::write(source.path().join("readme.txt"), b"docs").unwrap();
        let install = tempfile::tempdir().unwrap();

        let spec = spec(json!({
            "sourceType": "local",
            "localPath": source.path().to_str().unwrap(),
            "sourceFileType": "pattern-match",
            "sourceFilePattern": "*.zip"
        }));

        let resolution = LocalResolver::new()
            .resolve(&spec, PlatformTag::Win, install.path(), &state())
            .await
            .unwrap();
        assert_eq!(resolution.filename, "a-widget.zip");
    }

    #[tokio::test]
    async fn second_run_copies_again() {
        // Local sources have no freshness signal, so every run refetches.
        let source = tempfile::tempdir().unwrap();
        std::fs::write(source.path().join("tool-linux"), b"v1").unwrap();
        let install = tempfile::tempdir().unwrap();
        let state = state();
        let spec = spec(json!({
            "sourceType": "local",
            "localPath": source.path().to_str().unwrap()
        }));
        let resolver = LocalResolver::new();

        resolver
            .resolve(&spec, PlatformTag::Linux, install.path(), &state)
            .await
            .unwrap();
        std::fs::write(source.path().join("tool-linux"), b"v2").unwrap();
        let second = resolver
            .resolve(&spec, PlatformTag::Linux, install.path(), &state)
            .await
            .unwrap();

        assert_eq!(second.outcome, FetchOutcome::Fetched);
        assert_eq!(std::fs::read(install.path().join("tool-linux")).unwrap(), b"v2");
    }

    #[tokio::test]
    async fn missing_local_path_field_is_a_configuration_error() {
        let install = tempfile::tempdir().unwrap();
        let spec = spec(json!({ "sourceType": "local" }));

        let err = LocalResolver::new()
            .resolve(&spec, PlatformTag::Linux, install.path(), &state())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Configuration { .. }));
    }

    #[tokio::test]
    async fn nonexistent_directory_is_a_resolution_error() {
        let install = tempfile::tempdir().unwrap();
        let spec = spec(json!({
            "sourceType": "local",
            "localPath": "/definitely/not/a/real/dir"
        }));

        let err = LocalResolver::new()
            .resolve(&spec, PlatformTag::Linux, install.path(), &state())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Resolution { .. }));
    }

    #[tokio::test]
    async fn no_matching_file_is_a_resolution_error() {
        let source = tempfile::tempdir().unwrap();
        std::fs::write(source.path().join("tool-win.exe"), b"win").unwrap();
        let install = tempfile::tempdir().unwrap();
        let spec = spec(json!({
            "sourceType": "local",
            "localPath": source.path().to_str().unwrap()
        }));

        let err = LocalResolver::new()
            .resolve(&spec, PlatformTag::Linux, install.path(), &state())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Resolution { .. }));
    }
}
