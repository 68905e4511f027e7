//! The provisioning driver: load config, resolve every declared dependency,
//! persist state, publish the resolved config.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use depstrap_config::ConfigDocument;
use depstrap_core::platform::PlatformTag;
use depstrap_core::process::{Action, ProcessSpec, ResolvedProcess};
use depstrap_core::resolve::{FetchOutcome, Resolution, ResolverRegistry};
use depstrap_core::state::{DependencyState, SharedState};
use depstrap_core::{Error, Result};
use depstrap_sources_github::GithubResolver;
use depstrap_sources_local::LocalResolver;
use tracing::{debug, info};

/// Repo of the orchestrator's own executable, provisioned on every run
/// before user-declared processes.
pub const BOOTSTRAP_REPO: &str = "3sig/3suite-orchestrator";

/// What a completed run did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProvisionReport {
    /// Directory the dependencies were installed into.
    pub install_dir: PathBuf,
    /// Path of the published configuration file.
    pub published_config: PathBuf,
    /// Dependencies actually fetched this run (bootstrap included).
    pub fetched: usize,
    /// Dependencies skipped as already current.
    pub skipped: usize,
    /// Processes written into the published configuration.
    pub published: usize,
}

/// Drives one provisioning run over an orchestrator configuration.
#[derive(Debug)]
pub struct Provisioner {
    config_path: PathBuf,
    platform: PlatformTag,
    registry: ResolverRegistry,
}

impl Provisioner {
    /// Provisioner for the host platform with the standard resolvers.
    ///
    /// # Errors
    ///
    /// Fails when the host OS/architecture maps to no known platform tag.
    pub fn new(config_path: impl Into<PathBuf>) -> Result<Self> {
        let mut registry = ResolverRegistry::new();
        registry.register(GithubResolver::new());
        registry.register(LocalResolver::new());
        Ok(Self::with_parts(config_path, PlatformTag::detect()?, registry))
    }

    /// Provisioner with an explicit platform and resolver set.
    #[must_use]
    pub fn with_parts(
        config_path: impl Into<PathBuf>,
        platform: PlatformTag,
        registry: ResolverRegistry,
    ) -> Self {
        Self {
            config_path: config_path.into(),
            platform,
            registry,
        }
    }

    /// Run the full provisioning flow.
    ///
    /// Stages: load config, ensure the install directory, load state,
    /// resolve the bootstrap dependency, resolve all user processes
    /// concurrently, persist state, publish the patched configuration.
    /// The state file is only written after every resolution succeeded.
    ///
    /// # Errors
    ///
    /// The first failing stage of any process fails the whole run.
    pub async fn run(&self) -> Result<ProvisionReport> {
        let doc = ConfigDocument::load(&self.config_path)?;
        let install_dir = doc.install_dir();
        std::fs::create_dir_all(&install_dir)
            .map_err(|e| Error::io(e, Some(install_dir.clone()), "creating install directory"))?;

        let state = DependencyState::load(&install_dir)?.into_shared();
        info!(
            config = %self.config_path.display(),
            install_dir = %install_dir.display(),
            platform = %self.platform,
            "Provisioning dependencies"
        );

        let bootstrap = self
            .resolve_process(&bootstrap_spec(), &install_dir, &state)
            .await?;

        let specs: Vec<ProcessSpec> = doc
            .processes()?
            .into_iter()
            .map(|spec| spec.effective_for(self.platform))
            .collect();
        validate_identities(&specs)?;

        let resolutions = futures::future::try_join_all(
            specs
                .iter()
                .map(|spec| self.resolve_process(spec, &install_dir, &state)),
        )
        .await?;

        state.lock().await.save(&install_dir)?;

        let fetched = std::iter::once(&bootstrap)
            .chain(resolutions.iter())
            .filter(|r| r.outcome == FetchOutcome::Fetched)
            .count();
        let skipped = 1 + resolutions.len() - fetched;

        let mut published: Vec<ResolvedProcess> = specs
            .into_iter()
            .zip(resolutions)
            .map(|(spec, resolution)| {
                let exec = match &spec.source_exec_override {
                    Some(exec) => exec.clone(),
                    None => format!("./{}", resolution.filename),
                };
                spec.into_resolved(exec)
            })
            .collect();
        published.retain(|process| !process.exclude);

        let published_config = doc.publish(&published, &install_dir)?;
        info!(
            fetched,
            skipped,
            published = published.len(),
            config = %published_config.display(),
            "Provisioning complete"
        );

        Ok(ProvisionReport {
            install_dir,
            published_config,
            fetched,
            skipped,
            published: published.len(),
        })
    }

    /// One process: dispatch to its resolver, then run its action pipeline
    /// when a fresh artifact was fetched.
    async fn resolve_process(
        &self,
        spec: &ProcessSpec,
        install_dir: &Path,
        state: &SharedState,
    ) -> Result<Resolution> {
        let resolver = self.registry.find_for(spec.source_type).ok_or_else(|| {
            Error::configuration(format!(
                "no resolver registered for sourceType {:?}",
                spec.source_type
            ))
        })?;

        debug!(resolver = resolver.name(), "Dispatching resolution");
        let resolution = resolver
            .resolve(spec, self.platform, install_dir, state)
            .await?;

        if resolution.outcome == FetchOutcome::Fetched {
            depstrap_actions::run_actions(&spec.source_actions, &resolution.filename, install_dir)
                .await?;
        }
        Ok(resolution)
    }
}

/// The fixed self-provisioning dependency.
fn bootstrap_spec() -> ProcessSpec {
    ProcessSpec {
        source: Some(BOOTSTRAP_REPO.to_string()),
        source_actions: vec![Action::Chmod { file: None }],
        ..ProcessSpec::default()
    }
}

/// Every process must declare a source, and no two processes may share a
/// source identity (they would race on the same state key and install
/// path). The bootstrap repo is reserved.
fn validate_identities(specs: &[ProcessSpec]) -> Result<()> {
    let mut seen: HashSet<String> = HashSet::from([BOOTSTRAP_REPO.to_string()]);
    for spec in specs {
        if !spec.declares_source() {
            return Err(Error::configuration(
                "every process must declare a source (source or localPath)",
            ));
        }
        let identity = spec.source_identity()?;
        if !seen.insert(identity.clone()) {
            return Err(Error::configuration(format!(
                "duplicate source identity '{identity}' across processes"
            )));
        }
    }
    Ok(())
}
