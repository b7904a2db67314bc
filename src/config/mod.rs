//! Configuration for tasktree.
//!
//! ## config.kdl - User preferences
//!
//! Located at `<data dir>/config.kdl`, where the data dir is `$TT_DATA_DIR`
//! or `~/.local/share/tasktree` (the platform data dir).
//!
//! Contains:
//! - `database-path` - SQLite database file
//! - `output-format` - "json" or "human"
//! - `changelog-limit` - Default number of entries for `tt log`
//! - `log-level` - Log filter used when `RUST_LOG` is unset
//!
//! ## Precedence
//!
//! CLI flag > environment > config.kdl > defaults. See [`resolver`].

pub mod resolver;
pub mod schema;

pub use resolver::{
    ConfigOverrides, DB_ENV, Resolved, ResolvedConfig, ValueSource, resolve_config,
    resolve_config_with_env,
};
pub use schema::{CONFIG_KEYS, OutputFormat, TaskTreeConfig};

use crate::{Error, Result};
use kdl::KdlDocument;
use std::fs;
use std::path::{Path, PathBuf};

/// Environment variable overriding the data directory.
pub const DATA_DIR_ENV: &str = "TT_DATA_DIR";

/// Name of the config file inside the data dir.
pub const CONFIG_FILE: &str = "config.kdl";

/// Directory holding config.kdl and the default database.
pub fn data_dir() -> Result<PathBuf> {
    if let Ok(dir) = std::env::var(DATA_DIR_ENV) {
        if !dir.is_empty() {
            return Ok(PathBuf::from(dir));
        }
    }
    dirs::data_dir()
        .map(|dir| dir.join("tasktree"))
        .ok_or_else(|| Error::Config("Could not determine data directory".to_string()))
}

/// Path of config.kdl inside `data_dir`.
pub fn config_path(data_dir: &Path) -> PathBuf {
    data_dir.join(CONFIG_FILE)
}

/// Load config.kdl. A missing file yields an empty config.
pub fn load(path: &Path) -> Result<TaskTreeConfig> {
    if !path.exists() {
        return Ok(TaskTreeConfig::new());
    }

    let content = fs::read_to_string(path)?;
    let doc: KdlDocument = content
        .parse()
        .map_err(|e| Error::Config(format!("Failed to parse KDL in {}: {}", path.display(), e)))?;
    Ok(TaskTreeConfig::from_kdl(&doc))
}

/// Validate and write config.kdl, creating the directory if needed.
pub fn save(path: &Path, config: &TaskTreeConfig) -> Result<()> {
    config.validate()?;
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, config.to_kdl().to_string())?;
    tracing::debug!("Wrote config to {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_load_missing_file() {
        let temp_dir = TempDir::new().unwrap();
        let config = load(&config_path(temp_dir.path())).unwrap();
        assert_eq!(config, TaskTreeConfig::default());
    }

    #[test]
    fn test_save_then_load() {
        let temp_dir = TempDir::new().unwrap();
        let path = config_path(&temp_dir.path().join("nested"));

        let mut config = TaskTreeConfig::new();
        config.set("output-format", "human").unwrap();
        config.set("changelog-limit", "3").unwrap();
        save(&path, &config).unwrap();

        assert_eq!(load(&path).unwrap(), config);
    }

    #[test]
    fn test_load_rejects_malformed_kdl() {
        let temp_dir = TempDir::new().unwrap();
        let path = config_path(temp_dir.path());
        fs::write(&path, "output-format \"human").unwrap();

        let err = load(&path).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }
}
