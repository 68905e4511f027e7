//! The `SourceResolver` trait and its result types.

use std::path::Path;

use async_trait::async_trait;

use crate::Result;
use crate::platform::PlatformTag;
use crate::process::{ProcessSpec, SourceType};
use crate::state::SharedState;

/// Whether a resolution touched the network/filesystem or reused the
/// previously recorded artifact.
///
/// Callers inspect this explicitly; the state transition is never inferred
/// from log output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    /// The recorded artifact is still current; nothing was fetched.
    Skipped,
    /// A fresh artifact was fetched and the state record replaced.
    Fetched,
}

/// The result of resolving one process's dependency.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    /// Name of the artifact now present in the install directory.
    pub filename: String,
    /// Whether a fetch actually happened.
    pub outcome: FetchOutcome,
}

impl Resolution {
    /// A resolution that reused the recorded artifact.
    #[must_use]
    pub fn skipped(filename: impl Into<String>) -> Self {
        Self {
            filename: filename.into(),
            outcome: FetchOutcome::Skipped,
        }
    }

    /// A resolution that fetched a fresh artifact.
    #[must_use]
    pub fn fetched(filename: impl Into<String>) -> Self {
        Self {
            filename: filename.into(),
            outcome: FetchOutcome::Fetched,
        }
    }
}

/// Trait implemented by each dependency source kind.
///
/// The contract: on success, an artifact named by the returned
/// [`Resolution`] exists in `install_dir`, and `state` holds a record for
/// the spec's source identity describing it.
#[async_trait]
pub trait SourceResolver: Send + Sync {
    /// Resolver name, matching the `sourceType` config value.
    fn name(&self) -> &'static str;

    /// Whether this resolver handles the given source type.
    fn can_handle(&self, source_type: SourceType) -> bool;

    /// Resolve the spec's dependency into `install_dir`, consulting and
    /// updating `state`.
    ///
    /// # Errors
    ///
    /// Configuration errors for missing required fields, resolution errors
    /// when nothing matches, transport errors for network failures.
    async fn resolve(
        &self,
        spec: &ProcessSpec,
        platform: PlatformTag,
        install_dir: &Path,
        state: &SharedState,
    ) -> Result<Resolution>;
}
