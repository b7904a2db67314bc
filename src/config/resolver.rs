//! Precedence resolution for configuration.
//!
//! ## Database path (highest to lowest)
//!
//! 1. `--db` CLI flag
//! 2. `TT_DB` environment variable
//! 3. `database-path` in config.kdl
//! 4. `<data dir>/tasks.db`
//!
//! ## Other preferences (highest to lowest)
//!
//! 1. CLI flags
//! 2. config.kdl
//! 3. Built-in defaults

use crate::config::{OutputFormat, TaskTreeConfig};
use std::path::{Path, PathBuf};

/// Environment variable overriding the database path.
pub const DB_ENV: &str = "TT_DB";

/// File name of the default database inside the data dir.
pub const DEFAULT_DB_FILE: &str = "tasks.db";

/// Tracks where a resolved value came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValueSource {
    /// Value from CLI flag
    CliFlag,
    /// Value from environment variable
    EnvVar(String),
    /// Value from config.kdl
    ConfigFile,
    /// Built-in default value
    Default,
}

impl std::fmt::Display for ValueSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValueSource::CliFlag => write!(f, "cli"),
            ValueSource::EnvVar(name) => write!(f, "env:{}", name),
            ValueSource::ConfigFile => write!(f, "config"),
            ValueSource::Default => write!(f, "default"),
        }
    }
}

/// A resolved value with its source.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolved<T> {
    pub value: T,
    pub source: ValueSource,
}

impl<T> Resolved<T> {
    pub fn new(value: T, source: ValueSource) -> Self {
        Self { value, source }
    }
}

/// Fully resolved configuration with source tracking.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedConfig {
    pub database_path: Resolved<PathBuf>,
    pub output_format: Resolved<OutputFormat>,
    /// Default `tt log` limit; unset means unlimited
    pub changelog_limit: Option<Resolved<usize>>,
    /// Log filter from config.kdl; unset falls back to `warn`
    pub log_level: Option<Resolved<String>>,
}

impl ResolvedConfig {
    pub fn database_path(&self) -> &Path {
        &self.database_path.value
    }

    pub fn output_format(&self) -> OutputFormat {
        self.output_format.value
    }

    pub fn changelog_limit(&self) -> Option<usize> {
        self.changelog_limit.as_ref().map(|r| r.value)
    }

    pub fn log_level(&self) -> Option<&str> {
        self.log_level.as_ref().map(|r| r.value.as_str())
    }
}

/// CLI overrides for configuration resolution.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub database_path: Option<PathBuf>,
    pub output_format: Option<OutputFormat>,
}

impl ConfigOverrides {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_database_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.database_path = Some(path.into());
        self
    }

    pub fn with_output_format(mut self, format: OutputFormat) -> Self {
        self.output_format = Some(format);
        self
    }
}

/// Resolve configuration, reading `TT_DB` from the process environment.
pub fn resolve_config(
    data_dir: &Path,
    file: &TaskTreeConfig,
    overrides: &ConfigOverrides,
) -> ResolvedConfig {
    let env_db = std::env::var(DB_ENV).ok().filter(|v| !v.is_empty());
    resolve_config_with_env(data_dir, file, overrides, env_db)
}

/// Resolve configuration with an explicit `TT_DB` value.
pub fn resolve_config_with_env(
    data_dir: &Path,
    file: &TaskTreeConfig,
    overrides: &ConfigOverrides,
    env_db: Option<String>,
) -> ResolvedConfig {
    let database_path = if let Some(path) = &overrides.database_path {
        Resolved::new(path.clone(), ValueSource::CliFlag)
    } else if let Some(path) = env_db {
        Resolved::new(PathBuf::from(path), ValueSource::EnvVar(DB_ENV.to_string()))
    } else if let Some(path) = &file.database_path {
        // Relative paths in the file are anchored at the data dir.
        Resolved::new(data_dir.join(path), ValueSource::ConfigFile)
    } else {
        Resolved::new(data_dir.join(DEFAULT_DB_FILE), ValueSource::Default)
    };

    let output_format = if let Some(format) = overrides.output_format {
        Resolved::new(format, ValueSource::CliFlag)
    } else if let Some(format) = file.output_format {
        Resolved::new(format, ValueSource::ConfigFile)
    } else {
        Resolved::new(OutputFormat::Json, ValueSource::Default)
    };

    ResolvedConfig {
        database_path,
        output_format,
        changelog_limit: file
            .changelog_limit
            .map(|limit| Resolved::new(limit, ValueSource::ConfigFile)),
        log_level: file
            .log_level
            .clone()
            .map(|level| Resolved::new(level, ValueSource::ConfigFile)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn data_dir() -> PathBuf {
        PathBuf::from("/data/tasktree")
    }

    #[test]
    fn test_defaults() {
        let resolved =
            resolve_config_with_env(&data_dir(), &TaskTreeConfig::new(), &ConfigOverrides::new(), None);

        assert_eq!(resolved.database_path(), Path::new("/data/tasktree/tasks.db"));
        assert_eq!(resolved.database_path.source, ValueSource::Default);
        assert_eq!(resolved.output_format(), OutputFormat::Json);
        assert_eq!(resolved.changelog_limit(), None);
        assert_eq!(resolved.log_level(), None);
    }

    #[test]
    fn test_database_path_precedence() {
        let file = TaskTreeConfig {
            database_path: Some(PathBuf::from("from-file.db")),
            ..Default::default()
        };
        let flag = ConfigOverrides::new().with_database_path("/flag.db");
        let env = Some("/env.db".to_string());

        let resolved = resolve_config_with_env(&data_dir(), &file, &flag, env.clone());
        assert_eq!(resolved.database_path(), Path::new("/flag.db"));
        assert_eq!(resolved.database_path.source, ValueSource::CliFlag);

        let resolved = resolve_config_with_env(&data_dir(), &file, &ConfigOverrides::new(), env);
        assert_eq!(resolved.database_path(), Path::new("/env.db"));
        assert_eq!(resolved.database_path.source.to_string(), "env:TT_DB");

        let resolved = resolve_config_with_env(&data_dir(), &file, &ConfigOverrides::new(), None);
        assert_eq!(resolved.database_path(), Path::new("/data/tasktree/from-file.db"));
        assert_eq!(resolved.database_path.source, ValueSource::ConfigFile);
    }

    #[test]
    fn test_absolute_file_path_kept() {
        let file = TaskTreeConfig {
            database_path: Some(PathBuf::from("/srv/tt.db")),
            ..Default::default()
        };
        let resolved = resolve_config_with_env(&data_dir(), &file, &ConfigOverrides::new(), None);
        assert_eq!(resolved.database_path(), Path::new("/srv/tt.db"));
    }

    #[test]
    fn test_output_format_precedence() {
        let file = TaskTreeConfig {
            output_format: Some(OutputFormat::Human),
            changelog_limit: Some(7),
            log_level: Some("info".to_string()),
            ..Default::default()
        };

        let resolved = resolve_config_with_env(&data_dir(), &file, &ConfigOverrides::new(), None);
        assert_eq!(resolved.output_format(), OutputFormat::Human);
        assert_eq!(resolved.output_format.source, ValueSource::ConfigFile);
        assert_eq!(resolved.changelog_limit(), Some(7));
        assert_eq!(resolved.log_level(), Some("info"));

        let flag = ConfigOverrides::new().with_output_format(OutputFormat::Json);
        let resolved = resolve_config_with_env(&data_dir(), &file, &flag, None);
        assert_eq!(resolved.output_format(), OutputFormat::Json);
        assert_eq!(resolved.output_format.source, ValueSource::CliFlag);
    }
}
