//! Local service-state files.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde_json::{json, Map, Value};
use tracing::warn;

use crate::error::{CliError, CliResult, NotFoundKind};

/// The flat `services.json` map (systemd unit name -> enabled) persisted on
/// non-manager nodes.
pub struct ServicesFile {
    path: PathBuf,
}

impl ServicesFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Read the full map. A missing file is a not-found error; the callers
    /// decide whether that is fatal.
    pub fn read(&self) -> CliResult<Map<String, Value>> {
        let content = std::fs::read_to_string(&self.path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                CliError::NotFound {
                    kind: NotFoundKind::ServicesFile {
                        path: self.path.clone(),
                    },
                }
            } else {
                e.into()
            }
        })?;
        let value: Value = serde_json::from_str(&content)?;
        value
            .as_object()
            .cloned()
            .ok_or_else(|| CliError::Config {
                message: format!("{} is not a JSON object", self.path.display()),
            })
    }

    /// Enabled flags only, for status classification.
    pub fn enabled_map(&self) -> CliResult<BTreeMap<String, bool>> {
        Ok(self
            .read()?
            .into_iter()
            .map(|(unit, value)| (unit, value.as_bool().unwrap_or(false)))
            .collect())
    }

    /// Merge `updates` into the on-disk map and rewrite it, preserving
    /// pre-existing keys the update does not touch.
    pub fn merge_write(&self, updates: &BTreeMap<String, bool>) -> CliResult<()> {
        let mut map = match self.read() {
            Ok(map) => map,
            Err(CliError::NotFound { .. }) => Map::new(),
            Err(e) => return Err(e),
        };
        for (unit, enabled) in updates {
            map.insert(unit.clone(), json!(enabled));
        }
        let pretty = serde_json::to_string_pretty(&Value::Object(map))?;
        std::fs::write(&self.path, pretty + "\n")?;
        Ok(())
    }
}

/// Read the external-services data bag item (service -> "external" | other).
/// Tolerant of absence and of malformed content.
pub fn read_external_services(path: &Path) -> BTreeMap<String, String> {
    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(_) => return BTreeMap::new(),
    };
    match serde_json::from_str::<BTreeMap<String, String>>(&content) {
        Ok(map) => map,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "ignoring malformed external services file");
            BTreeMap::new()
        }
    }
}

/// Whether a systemd unit is served externally. The minio unit follows the
/// `s3` marker.
pub fn is_external(unit: &str, externals: &BTreeMap<String, String>) -> bool {
    externals.get(unit).map(String::as_str) == Some("external")
        || (unit == "minio" && externals.get("s3").map(String::as_str) == Some("external"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_merge_preserves_unknown_keys() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("services.json");
        std::fs::write(&path, r#"{"kafka": true, "mystery": "keep"}"#).unwrap();

        let file = ServicesFile::new(&path);
        let mut updates = BTreeMap::new();
        updates.insert("kafka".to_string(), false);
        updates.insert("minio".to_string(), true);
        file.merge_write(&updates).unwrap();

        let reread = file.read().unwrap();
        assert_eq!(reread["kafka"], json!(false));
        assert_eq!(reread["minio"], json!(true));
        assert_eq!(reread["mystery"], json!("keep"));
    }

    #[test]
    fn test_round_trip_is_idempotent() {
        let tmp = TempDir::new().unwrap();
        let file = ServicesFile::new(tmp.path().join("services.json"));
        let mut updates = BTreeMap::new();
        updates.insert("zookeeper".to_string(), true);
        file.merge_write(&updates).unwrap();
        let first = file.enabled_map().unwrap();
        file.merge_write(&updates).unwrap();
        assert_eq!(file.enabled_map().unwrap(), first);
    }

    #[test]
    fn test_missing_file_is_not_found() {
        let tmp = TempDir::new().unwrap();
        let file = ServicesFile::new(tmp.path().join("absent.json"));
        assert!(matches!(file.read(), Err(CliError::NotFound { .. })));
    }

    #[test]
    fn test_external_markers() {
        let mut externals = BTreeMap::new();
        externals.insert("s3".to_string(), "external".to_string());
        externals.insert("postgresql".to_string(), "onprem".to_string());
        assert!(is_external("s3", &externals));
        assert!(is_external("minio", &externals));
        assert!(!is_external("postgresql", &externals));
        assert!(!is_external("kafka", &externals));
    }

    #[test]
    fn test_external_absent_file_is_empty() {
        assert!(read_external_services(Path::new("/nonexistent/ext.json")).is_empty());
    }
}
