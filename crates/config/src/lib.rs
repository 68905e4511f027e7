//! Orchestrator configuration loading and publishing.
//!
//! The input document is JSON5 (comments and trailing commas allowed); the
//! published output is plain JSON, which is valid JSON5. Original formatting
//! and comments are not preserved across the rewrite.

#![warn(missing_docs)]

use std::path::{Path, PathBuf};

use depstrap_core::process::{ProcessSpec, ResolvedProcess};
use depstrap_core::{Error, Result};
use serde_json::Value;
use tracing::debug;

/// Filename of the published configuration, relative to the install
/// directory.
pub const OUTPUT_FILE_NAME: &str = "config.json5";

/// A parsed orchestrator configuration document.
///
/// The raw top-level value is kept so that keys this tool does not interpret
/// survive into the published output untouched.
#[derive(Debug, Clone)]
pub struct ConfigDocument {
    root: Value,
}

impl ConfigDocument {
    /// Load and parse a JSON5 configuration file.
    ///
    /// # Errors
    ///
    /// [`Error::Io`] when the file cannot be read, [`Error::Configuration`]
    /// when it is not valid JSON5 or the top level is not an object.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| Error::io(e, Some(path.to_path_buf()), "reading configuration"))?;
        let root: Value = json5::from_str(&text).map_err(|e| {
            Error::configuration(format!("invalid JSON5 in {}: {e}", path.display()))
        })?;
        if !root.is_object() {
            return Err(Error::configuration(format!(
                "top level of {} must be an object",
                path.display()
            )));
        }
        debug!(path = %path.display(), "Loaded configuration");
        Ok(Self { root })
    }

    /// Parse a document from an in-memory JSON5 string.
    ///
    /// # Errors
    ///
    /// [`Error::Configuration`] for invalid JSON5 or a non-object top level.
    pub fn parse(text: &str) -> Result<Self> {
        let root: Value = json5::from_str(text)
            .map_err(|e| Error::configuration(format!("invalid JSON5: {e}")))?;
        if !root.is_object() {
            return Err(Error::configuration("top level must be an object"));
        }
        Ok(Self { root })
    }

    /// The install directory declared by `devDependenciesLocation`,
    /// defaulting to the current directory.
    #[must_use]
    pub fn install_dir(&self) -> PathBuf {
        self.root
            .get("devDependenciesLocation")
            .and_then(Value::as_str)
            .unwrap_or(".")
            .into()
    }

    /// The declared processes, deserialized into specs.
    ///
    /// A missing `processes` key is an empty list; a present key must be an
    /// array of objects.
    ///
    /// # Errors
    ///
    /// [`Error::Configuration`] when `processes` is not an array or an entry
    /// does not deserialize.
    pub fn processes(&self) -> Result<Vec<ProcessSpec>> {
        let Some(value) = self.root.get("processes") else {
            return Ok(Vec::new());
        };
        if !value.is_array() {
            return Err(Error::configuration("\"processes\" must be an array"));
        }
        serde_json::from_value(value.clone())
            .map_err(|e| Error::configuration(format!("invalid process entry: {e}")))
    }

    /// Re-emit the document with `processes` replaced by the resolved list
    /// and every other top-level key preserved.
    ///
    /// # Errors
    ///
    /// [`Error::Configuration`] when serialization fails.
    pub fn patched(&self, resolved: &[ResolvedProcess]) -> Result<String> {
        let mut root = self.root.clone();
        let processes = serde_json::to_value(resolved)
            .map_err(|e| Error::configuration(format!("cannot serialize processes: {e}")))?;
        if let Some(object) = root.as_object_mut() {
            object.insert("processes".to_string(), processes);
        }
        serde_json::to_string_pretty(&root)
            .map_err(|e| Error::configuration(format!("cannot serialize configuration: {e}")))
    }

    /// Write the patched document to `<install_dir>/config.json5`.
    ///
    /// # Errors
    ///
    /// Serialization or write failures.
    pub fn publish(&self, resolved: &[ResolvedProcess], install_dir: &Path) -> Result<PathBuf> {
        let path = install_dir.join(OUTPUT_FILE_NAME);
        let content = self.patched(resolved)?;
        std::fs::write(&path, content)
            .map_err(|e| Error::io(e, Some(path.clone()), "writing published configuration"))?;
        debug!(path = %path.display(), "Published configuration");
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn worker(exec: &str) -> ResolvedProcess {
        let mut fields = serde_json::Map::new();
        fields.insert("name".to_string(), Value::String("worker".to_string()));
        ResolvedProcess {
            fields,
            exec: exec.to_string(),
            exclude: false,
        }
    }

    #[test]
    fn parses_json5_with_comments() {
        let doc = ConfigDocument::parse(
            r#"{
                // where binaries land
                devDependenciesLocation: "bin",
                processes: [
                    { name: "worker", source: "acme/tool" },
                ],
            }"#,
        )
        .unwrap();

        assert_eq!(doc.install_dir(), PathBuf::from("bin"));
        let processes = doc.processes().unwrap();
        assert_eq!(processes.len(), 1);
        assert_eq!(processes[0].source.as_deref(), Some("acme/tool"));
    }

    #[test]
    fn install_dir_defaults_to_current_directory() {
        let doc = ConfigDocument::parse("{}").unwrap();
        assert_eq!(doc.install_dir(), PathBuf::from("."));
    }

    #[test]
    fn missing_processes_is_empty() {
        let doc = ConfigDocument::parse("{}").unwrap();
        assert!(doc.processes().unwrap().is_empty());
    }

    #[test]
    fn non_array_processes_is_rejected() {
        let doc = ConfigDocument::parse(r#"{ processes: "nope" }"#).unwrap();
        assert!(matches!(
            doc.processes().unwrap_err(),
            Error::Configuration { .. }
        ));
    }

    #[test]
    fn non_object_top_level_is_rejected() {
        assert!(matches!(
            ConfigDocument::parse("[1, 2]").unwrap_err(),
            Error::Configuration { .. }
        ));
    }

    #[test]
    fn patched_replaces_processes_and_keeps_other_keys() {
        let doc = ConfigDocument::parse(
            r#"{
                devDependenciesLocation: "bin",
                logLevel: "debug",
                processes: [
                    { name: "worker", source: "acme/tool", sourceType: "github" },
                ],
            }"#,
        )
        .unwrap();

        let output = doc.patched(&[worker("./tool-linux")]).unwrap();
        let reparsed: Value = serde_json::from_str(&output).unwrap();

        assert_eq!(reparsed["devDependenciesLocation"], "bin");
        assert_eq!(reparsed["logLevel"], "debug");
        assert_eq!(
            reparsed["processes"],
            serde_json::json!([{ "name": "worker", "exec": "./tool-linux" }])
        );
        // Source bookkeeping fields never leak into the output.
        assert!(output.find("sourceType").is_none());
    }

    #[test]
    fn publish_writes_into_install_dir() {
        let dir = tempfile::tempdir().unwrap();
        let doc = ConfigDocument::parse(r#"{ processes: [] }"#).unwrap();

        let path = doc.publish(&[], dir.path()).unwrap();
        assert_eq!(path, dir.path().join(OUTPUT_FILE_NAME));

        let on_disk = std::fs::read_to_string(path).unwrap();
        let reparsed: Value = serde_json::from_str(&on_disk).unwrap();
        assert_eq!(reparsed["processes"], serde_json::json!([]));
    }

    #[test]
    fn load_reports_missing_file_as_io() {
        let err = ConfigDocument::load(Path::new("/no/such/orchestrator.json5")).unwrap_err();
        assert!(matches!(err, Error::Io { .. }));
    }
}
