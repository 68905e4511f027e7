//! Host platform identification.
//!
//! Maps the running OS and architecture to one of the fixed platform tags
//! used for asset selection. The mapping is a pure table so it can be tested
//! for every combination regardless of the build host.

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// One of the fixed OS/architecture identifiers used for asset selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlatformTag {
    /// macOS on Apple Silicon
    #[serde(rename = "osx-arm")]
    OsxArm,
    /// macOS on x86_64
    #[serde(rename = "osx-x64")]
    OsxX64,
    /// Windows (any architecture)
    #[serde(rename = "win")]
    Win,
    /// Linux on arm64
    #[serde(rename = "linux-arm")]
    LinuxArm,
    /// Linux on x86_64 (and anything else non-arm)
    #[serde(rename = "linux")]
    Linux,
}

impl PlatformTag {
    /// Detect the tag for the build host.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedPlatform`] when the host OS maps to no
    /// known tag. Resolvers treat this as a hard failure.
    pub fn detect() -> Result<Self> {
        Self::from_os_arch(std::env::consts::OS, std::env::consts::ARCH).ok_or_else(|| {
            Error::UnsupportedPlatform {
                os: std::env::consts::OS.to_string(),
                arch: std::env::consts::ARCH.to_string(),
            }
        })
    }

    /// Pure mapping from (OS, architecture) to a platform tag.
    ///
    /// `os` and `arch` use the `std::env::consts` vocabulary
    /// (`"macos"`, `"windows"`, `"linux"`; `"aarch64"`, `"x86_64"`).
    #[must_use]
    pub fn from_os_arch(os: &str, arch: &str) -> Option<Self> {
        match os {
            "macos" => Some(if arch == "aarch64" {
                Self::OsxArm
            } else {
                Self::OsxX64
            }),
            "windows" => Some(Self::Win),
            "linux" => Some(if arch == "aarch64" {
                Self::LinuxArm
            } else {
                Self::Linux
            }),
            _ => None,
        }
    }

    /// The tag as it appears in asset names and config keys.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::OsxArm => "osx-arm",
            Self::OsxX64 => "osx-x64",
            Self::Win => "win",
            Self::LinuxArm => "linux-arm",
            Self::Linux => "linux",
        }
    }

    /// Default platform-binary matching: true iff `candidate` contains the
    /// tag as a substring.
    #[must_use]
    pub fn matches(self, candidate: &str) -> bool {
        candidate.contains(self.as_str())
    }
}

impl std::fmt::Display for PlatformTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for PlatformTag {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "osx-arm" => Ok(Self::OsxArm),
            "osx-x64" => Ok(Self::OsxX64),
            "win" => Ok(Self::Win),
            "linux-arm" => Ok(Self::LinuxArm),
            "linux" => Ok(Self::Linux),
            other => Err(Error::configuration(format!(
                "Unknown platform tag: {other}"
            ))),
        }
    }
}
