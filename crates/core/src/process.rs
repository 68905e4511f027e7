//! Declared process specs and their resolved projection.
//!
//! A [`ProcessSpec`] is one entry of the orchestrator config's `processes`
//! list. The `source*` fields drive dependency resolution; every other field
//! (name, command arguments, whatever the orchestrator understands) is
//! carried opaquely in a flattened map and published back untouched.
//!
//! Platform-specific overrides are typed ([`ProcessOverride`]) and merged
//! with an explicit, recursive merge limited to the known fields; the
//! opaque remainder merges object-wise with wholesale array replacement.
//! After resolution a spec is *projected* into a [`ResolvedProcess`] - a
//! distinct type that carries only the opaque domain fields plus `exec`.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::platform::PlatformTag;
use crate::{Error, Result};

/// Where a process's binary comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceType {
    /// A GitHub-style release source (the default).
    #[default]
    Github,
    /// A directory on the local filesystem.
    Local,
}

/// How release assets / local files are matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SourceFileType {
    /// Match by platform-tag substring (the default).
    #[default]
    PlatformBinary,
    /// Match by wildcard pattern (`sourceFilePattern` required).
    PatternMatch,
}

/// One step of the post-fetch action pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Action {
    /// Extract the fetched artifact into the install directory.
    Unzip,
    /// Mark a file executable (0755). Defaults to the fetched artifact.
    Chmod {
        /// File to chmod instead of the fetched artifact.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        file: Option<String>,
    },
    /// Relocate the fetched artifact into a subdirectory.
    Move {
        /// Destination subdirectory, relative to the install directory.
        /// Required; validated before the pipeline runs.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        location: Option<String>,
        /// Destination file name. Defaults to the source name.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        filename: Option<String>,
    },
}

/// A declared dependency requirement from the orchestrator config.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessSpec {
    /// Source kind; `github` when omitted.
    #[serde(default)]
    pub source_type: SourceType,
    /// Repo identifier (`owner/name`), required for github sources.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    /// Source directory, required for local sources.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub local_path: Option<String>,
    /// Asset/file matching mode; `platform-binary` when omitted.
    #[serde(default)]
    pub source_file_type: SourceFileType,
    /// Wildcard pattern, required iff `sourceFileType` is `pattern-match`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_file_pattern: Option<String>,
    /// Ordered post-fetch actions.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub source_actions: Vec<Action>,
    /// Explicit exec command, overriding the resolved artifact path.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_exec_override: Option<String>,
    /// Drop this process from the published config after resolution.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub source_exclude: bool,
    /// Per-platform partial overrides, dropped once merged.
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub source_platform_config: HashMap<PlatformTag, ProcessOverride>,
    /// Opaque domain fields preserved into the published config.
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

/// A typed partial [`ProcessSpec`] used in `sourcePlatformConfig`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessOverride {
    /// Overrides [`ProcessSpec::source_type`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_type: Option<SourceType>,
    /// Overrides [`ProcessSpec::source`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    /// Overrides [`ProcessSpec::local_path`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub local_path: Option<String>,
    /// Overrides [`ProcessSpec::source_file_type`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_file_type: Option<SourceFileType>,
    /// Overrides [`ProcessSpec::source_file_pattern`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_file_pattern: Option<String>,
    /// Replaces [`ProcessSpec::source_actions`] wholesale.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_actions: Option<Vec<Action>>,
    /// Overrides [`ProcessSpec::source_exec_override`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_exec_override: Option<String>,
    /// Overrides [`ProcessSpec::source_exclude`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_exclude: Option<bool>,
    /// Opaque domain overrides, merged object-wise.
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl ProcessSpec {
    /// Produce the effective spec for `platform`: the base spec with its
    /// platform override (if any) merged over it. Scalar overrides win,
    /// opaque objects merge key-wise recursively, arrays are replaced
    /// wholesale. `sourcePlatformConfig` never survives the merge.
    #[must_use]
    pub fn effective_for(&self, platform: PlatformTag) -> Self {
        let mut effective = self.clone();
        if let Some(overlay) = effective.source_platform_config.remove(&platform) {
            effective.apply_override(overlay);
        }
        effective.source_platform_config.clear();
        effective
    }

    fn apply_override(&mut self, overlay: ProcessOverride) {
        if let Some(v) = overlay.source_type {
            self.source_type = v;
        }
        if let Some(v) = overlay.source {
            self.source = Some(v);
        }
        if let Some(v) = overlay.local_path {
            self.local_path = Some(v);
        }
        if let Some(v) = overlay.source_file_type {
            self.source_file_type = v;
        }
        if let Some(v) = overlay.source_file_pattern {
            self.source_file_pattern = Some(v);
        }
        if let Some(v) = overlay.source_actions {
            self.source_actions = v;
        }
        if let Some(v) = overlay.source_exec_override {
            self.source_exec_override = Some(v);
        }
        if let Some(v) = overlay.source_exclude {
            self.source_exclude = v;
        }
        for (key, value) in &overlay.fields {
            match self.fields.get_mut(key) {
                Some(slot) => merge_value(slot, value),
                None => {
                    self.fields.insert(key.clone(), value.clone());
                }
            }
        }
    }

    /// The key under which fetch history is tracked: the repo identifier for
    /// github sources, the local directory path for local sources.
    ///
    /// # Errors
    ///
    /// Returns a configuration error when the field the source type needs is
    /// missing.
    pub fn source_identity(&self) -> Result<String> {
        match self.source_type {
            SourceType::Github => self.source.clone().ok_or_else(|| {
                Error::configuration("source is required when sourceType is \"github\"")
            }),
            SourceType::Local => self.local_path.clone().ok_or_else(|| {
                Error::configuration("localPath is required when sourceType is \"local\"")
            }),
        }
    }

    /// Whether this process declares any dependency source at all.
    #[must_use]
    pub fn declares_source(&self) -> bool {
        self.source.is_some() || self.local_path.is_some()
    }

    /// Project the spec into its published form, discarding every
    /// resolution-internal field.
    #[must_use]
    pub fn into_resolved(self, exec: String) -> ResolvedProcess {
        ResolvedProcess {
            fields: self.fields,
            exec,
            exclude: self.source_exclude,
        }
    }
}

/// The final, published representation of a process: the opaque domain
/// fields plus the resolved executable path.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedProcess {
    /// Domain fields carried over from the declared spec.
    #[serde(flatten)]
    pub fields: Map<String, Value>,
    /// The command the orchestrator should run.
    pub exec: String,
    /// Drop this process from the published list. Never serialized.
    #[serde(skip)]
    pub exclude: bool,
}

/// Recursive value merge for the opaque field maps: objects merge key-wise,
/// everything else (scalars and arrays) is replaced by the overlay.
fn merge_value(base: &mut Value, overlay: &Value) {
    match (base, overlay) {
        (Value::Object(base_map), Value::Object(overlay_map)) => {
            for (key, value) in overlay_map {
                match base_map.get_mut(key) {
                    Some(slot) => merge_value(slot, value),
                    None => {
                        base_map.insert(key.clone(), value.clone());
                    }
                }
            }
        }
        (slot, value) => *slot = value.clone(),
    }
}
