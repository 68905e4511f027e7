//! Error types for the depstrap workspace.

use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

/// Result type alias using the depstrap error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while provisioning dependencies.
#[derive(Error, Debug, Diagnostic)]
pub enum Error {
    /// A required field is missing or the declared configuration is invalid.
    #[error("Configuration error: {message}")]
    #[diagnostic(code(depstrap::configuration))]
    Configuration {
        /// Description of the configuration issue
        message: String,
    },

    /// A dependency could not be resolved (no matching asset/file, missing
    /// local path, empty release list).
    #[error("Failed to resolve '{identity}': {message}")]
    #[diagnostic(code(depstrap::resolution))]
    Resolution {
        /// The source identity that failed to resolve
        identity: String,
        /// Description of the failure
        message: String,
    },

    /// The host OS/architecture maps to no known platform tag.
    #[error("Unsupported platform: {os}/{arch}")]
    #[diagnostic(
        code(depstrap::unsupported_platform),
        help("Supported platforms: osx-arm, osx-x64, win, linux-arm, linux")
    )]
    UnsupportedPlatform {
        /// Host operating system
        os: String,
        /// Host CPU architecture
        arch: String,
    },

    /// Network or download failure.
    #[error("Transport error: {message}")]
    #[diagnostic(code(depstrap::transport))]
    Transport {
        /// Description of the transport failure
        message: String,
    },

    /// The external extraction process exited with a failure.
    #[error("Extraction failed (exit code {code:?}): {stderr}")]
    #[diagnostic(code(depstrap::extraction))]
    Extraction {
        /// Exit code of the extraction process, if any
        code: Option<i32>,
        /// Captured stderr from the extraction process
        stderr: String,
    },

    /// The persisted dependency state file is malformed.
    #[error("Corrupt dependency state at {path}: {message}")]
    #[diagnostic(
        code(depstrap::state_corrupt),
        help("Delete the state file to start from scratch; installed artifacts will be refetched")
    )]
    StateCorrupt {
        /// Path to the state file
        path: PathBuf,
        /// Parse error description
        message: String,
    },

    /// I/O error with operation context.
    #[error("I/O error during {operation}: {source}")]
    #[diagnostic(code(depstrap::io))]
    Io {
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
        /// The path involved, if known
        path: Option<PathBuf>,
        /// Description of the operation that failed
        operation: String,
    },
}

impl Error {
    /// Create a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create a resolution error for a source identity.
    pub fn resolution(source: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Resolution {
            identity: source.into(),
            message: message.into(),
        }
    }

    /// Create a transport error.
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }

    /// Create an I/O error with context.
    pub fn io(source: std::io::Error, path: Option<PathBuf>, operation: impl Into<String>) -> Self {
        Self::Io {
            source,
            path,
            operation: operation.into(),
        }
    }

    /// Create a state corruption error.
    pub fn state_corrupt(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::StateCorrupt {
            path: path.into(),
            message: message.into(),
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(source: std::io::Error) -> Self {
        Self::Io {
            source,
            path: None,
            operation: "filesystem access".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn configuration_message_is_preserved() {
        let err = Error::configuration("localPath is required");
        assert_eq!(
            err.to_string(),
            "Configuration error: localPath is required"
        );
    }

    #[test]
    fn resolution_names_the_source() {
        let err = Error::resolution("acme/tool", "no matching asset");
        assert!(err.to_string().contains("acme/tool"));
        assert!(err.to_string().contains("no matching asset"));
    }

    #[test]
    fn io_error_converts() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: Error = io.into();
        assert!(matches!(err, Error::Io { .. }));
    }
}
