//! Post-fetch action pipeline.
//!
//! Applies an ordered list of actions to a just-fetched artifact inside the
//! install directory. Actions run strictly in declared order; each action's
//! effects are visible to the next. The list is validated before anything
//! executes, so a `move` without a `location` fails the run up front instead
//! of mid-pipeline.

#![warn(missing_docs)]

use std::path::Path;

use depstrap_core::process::Action;
use depstrap_core::{Error, Result};
use tokio::process::Command;
use tracing::{debug, info};

/// Run the action pipeline over the resolved artifact `filename` inside
/// `install_dir`.
///
/// # Errors
///
/// Configuration errors from pre-validation, extraction errors from a
/// non-zero `unzip` exit, I/O errors for missing targets.
pub async fn run_actions(actions: &[Action], filename: &str, install_dir: &Path) -> Result<()> {
    validate(actions)?;
    for action in actions {
        apply(action, filename, install_dir).await?;
    }
    Ok(())
}

/// Check the whole pipeline for configuration errors before running it.
fn validate(actions: &[Action]) -> Result<()> {
    for action in actions {
        if let Action::Move { location: None, .. } = action {
            return Err(Error::configuration("location is required for move action"));
        }
    }
    Ok(())
}

async fn apply(action: &Action, filename: &str, install_dir: &Path) -> Result<()> {
    match action {
        Action::Unzip => unzip(filename, install_dir).await,
        Action::Chmod { file } => chmod(file.as_deref().unwrap_or(filename), install_dir),
        Action::Move { location, filename: rename } => {
            // location presence was pre-validated
            let location = location.as_deref().unwrap_or_default();
            relocate(filename, location, rename.as_deref(), install_dir)
        }
    }
}

/// Extract the artifact by spawning the external `unzip` process.
async fn unzip(filename: &str, install_dir: &Path) -> Result<()> {
    let archive = install_dir.join(filename);
    info!(archive = %archive.display(), "Unzipping");

    let output = Command::new("unzip")
        .arg("-o")
        .arg(&archive)
        .arg("-d")
        .arg(install_dir)
        .output()
        .await
        .map_err(|e| Error::transport(format!("Failed to start unzip process: {e}")))?;

    if !output.status.success() {
        return Err(Error::Extraction {
            code: output.status.code(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        });
    }

    debug!(archive = %archive.display(), "Unzipped");
    Ok(())
}

/// Mark `file` (relative to the install directory) executable.
fn chmod(file: &str, install_dir: &Path) -> Result<()> {
    let target = install_dir.join(file);
    if !target.exists() {
        return Err(Error::io(
            std::io::Error::new(std::io::ErrorKind::NotFound, "no such file"),
            Some(target),
            "chmod",
        ));
    }

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mut perms = std::fs::metadata(&target)
            .map_err(|e| Error::io(e, Some(target.clone()), "chmod"))?
            .permissions();
        perms.set_mode(0o755);
        std::fs::set_permissions(&target, perms)
            .map_err(|e| Error::io(e, Some(target.clone()), "chmod"))?;
    }

    debug!(target = %target.display(), "Marked executable");
    Ok(())
}

/// Move the artifact into `install_dir/location`, creating the directory if
/// absent, optionally renaming.
fn relocate(
    filename: &str,
    location: &str,
    rename: Option<&str>,
    install_dir: &Path,
) -> Result<()> {
    let source = install_dir.join(filename);
    let target_dir = install_dir.join(location);
    std::fs::create_dir_all(&target_dir)
        .map_err(|e| Error::io(e, Some(target_dir.clone()), "creating move destination"))?;

    let target = target_dir.join(rename.unwrap_or(filename));
    info!(from = %source.display(), to = %target.display(), "Moving");
    std::fs::rename(&source, &target)
        .map_err(|e| Error::io(e, Some(source), "moving artifact"))?;
    Ok(())
}
