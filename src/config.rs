// Configuration loaded from YAML

use crate::task_store::PersistPolicy;
use eyre::{Context, Result, eyre};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Base directory for file storage
    pub store_path: Option<PathBuf>,

    /// Skip writing the task list when it is empty
    pub skip_empty_writes: bool,
}

impl Config {
    /// Default location: `<config dir>/minitodo/config.yml`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("minitodo").join("config.yml"))
    }

    /// Load config from `path`, or from the default location
    ///
    /// A missing file at the default location yields defaults; a missing
    /// explicit path is an error.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => {
                if !path.exists() {
                    return Err(eyre!("Config file not found: {}", path.display()));
                }
                Self::from_file(path)
            }
            None => match Self::default_path() {
                Some(path) if path.exists() => Self::from_file(&path),
                _ => {
                    debug!("No config file, using defaults");
                    Ok(Self::default())
                }
            },
        }
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content =
            fs::read_to_string(path).with_context(|| format!("Failed to read config {}", path.display()))?;
        let config: Config = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse config {}", path.display()))?;

        debug!(path = ?path, ?config, "Loaded config");
        Ok(config)
    }

    /// Storage base directory: CLI override, then config, then the data dir
    pub fn resolve_store_path(&self, cli_override: Option<&Path>) -> PathBuf {
        cli_override
            .map(Path::to_path_buf)
            .or_else(|| self.store_path.clone())
            .or_else(|| dirs::data_dir().map(|dir| dir.join("minitodo")))
            .unwrap_or_else(|| PathBuf::from("."))
    }

    pub fn persist_policy(&self) -> PersistPolicy {
        if self.skip_empty_writes {
            PersistPolicy::SkipEmpty
        } else {
            PersistPolicy::Always
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.store_path, None);
        assert_eq!(config.persist_policy(), PersistPolicy::Always);
    }

    #[test]
    fn test_from_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.yml");
        fs::write(&path, "store_path: /tmp/todo\nskip_empty_writes: true\n").unwrap();

        let config = Config::load(Some(&path)).unwrap();
        assert_eq!(config.store_path, Some(PathBuf::from("/tmp/todo")));
        assert_eq!(config.persist_policy(), PersistPolicy::SkipEmpty);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.yml");
        fs::write(&path, "skip_empty_writes: true\n").unwrap();

        let config = Config::from_file(&path).unwrap();
        assert_eq!(config.store_path, None);
        assert!(config.skip_empty_writes);
    }

    #[test]
    fn test_missing_explicit_path_is_error() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("nope.yml");
        assert!(Config::load(Some(&path)).is_err());
    }

    #[test]
    fn test_malformed_file_is_error() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.yml");
        fs::write(&path, "skip_empty_writes: [not, a, bool]\n").unwrap();

        let err = Config::from_file(&path).unwrap_err();
        assert!(err.to_string().contains("Failed to parse config"));
    }

    #[test]
    fn test_resolve_store_path_precedence() {
        let config = Config {
            store_path: Some(PathBuf::from("/from/config")),
            skip_empty_writes: false,
        };

        assert_eq!(
            config.resolve_store_path(Some(Path::new("/from/cli"))),
            PathBuf::from("/from/cli")
        );
        assert_eq!(config.resolve_store_path(None), PathBuf::from("/from/config"));
    }
}
