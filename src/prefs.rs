//! Client state that survives restarts: dark-mode flag and session token

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

#[derive(Error, Debug)]
pub enum PrefsError {
    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid preferences file {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Preferences {
    #[serde(default)]
    pub dark: bool,
    #[serde(default)]
    pub session_token: Option<String>,
}

impl Preferences {
    /// Load preferences, falling back to defaults when the file is missing
    pub fn load(path: &Path) -> Result<Self, PrefsError> {
        let raw = match std::fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No preferences at {}, using defaults", path.display());
                return Ok(Self::default());
            }
            Err(source) => {
                return Err(PrefsError::Io {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };

        serde_json::from_str(&raw).map_err(|source| PrefsError::Json {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn save(&self, path: &Path) -> Result<(), PrefsError> {
        let raw = serde_json::to_string_pretty(self).map_err(|source| PrefsError::Json {
            path: path.to_path_buf(),
            source,
        })?;

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|source| PrefsError::Io {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
        }

        std::fs::write(path, raw).map_err(|source| PrefsError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        info!("Saved preferences to {}", path.display());
        Ok(())
    }

    pub fn toggle_dark(&mut self) -> bool {
        self.dark = !self.dark;
        self.dark
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = TempDir::new().unwrap();
        let prefs = Preferences::load(&dir.path().join("absent.json")).unwrap();
        assert_eq!(prefs, Preferences::default());
    }

    #[test]
    fn test_save_then_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("prefs.json");

        let mut prefs = Preferences::default();
        prefs.toggle_dark();
        prefs.session_token = Some("abc".to_string());
        prefs.save(&path).unwrap();

        let raw = std::fs::read_to_string(&path).unwrap();
        assert!(raw.contains("\"dark\": true"));
        assert!(raw.contains("sessionToken"));
        assert_eq!(Preferences::load(&path).unwrap(), prefs);
    }

    #[test]
    fn test_corrupt_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("prefs.json");
        std::fs::write(&path, "not json").unwrap();
        assert!(matches!(Preferences::load(&path), Err(PrefsError::Json { .. })));
    }
}
