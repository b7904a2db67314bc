//! KDL schema for config.kdl.
//!
//! This module provides:
//! - The `TaskTreeConfig` struct mirroring the file
//! - Conversion to and from KDL documents
//! - Validation and single-key updates for `tt config set`

use crate::{Error, Result};
use kdl::{KdlDocument, KdlEntry, KdlNode, KdlValue};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Keys accepted in config.kdl.
pub const CONFIG_KEYS: [&str; 4] = [
    "database-path",
    "output-format",
    "changelog-limit",
    "log-level",
];

/// Output format preference for CLI commands.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// JSON output (default, machine-readable)
    #[default]
    Json,
    /// Human-readable output
    Human,
}

impl OutputFormat {
    /// Parse from string, case-insensitive.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "json" => Some(OutputFormat::Json),
            "human" => Some(OutputFormat::Human),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OutputFormat::Json => "json",
            OutputFormat::Human => "human",
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// User preferences stored in config.kdl.
///
/// # KDL Schema
///
/// ```kdl
/// database-path "/home/me/.local/share/tasktree/tasks.db"
/// output-format "human"  // or "json"
/// changelog-limit 20
/// log-level "info"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskTreeConfig {
    /// SQLite database file, relative paths resolve against the data dir
    pub database_path: Option<PathBuf>,

    /// Default output format for CLI commands
    pub output_format: Option<OutputFormat>,

    /// Default number of entries shown by `tt log`
    pub changelog_limit: Option<usize>,

    /// `tracing` filter directive used when `RUST_LOG` is unset
    pub log_level: Option<String>,
}

impl TaskTreeConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate the config values.
    pub fn validate(&self) -> Result<()> {
        if let Some(path) = &self.database_path {
            if path.as_os_str().is_empty() {
                return Err(Error::Config("database-path must not be empty".to_string()));
            }
        }
        if let Some(level) = &self.log_level {
            if tracing_subscriber::EnvFilter::try_new(level).is_err() {
                return Err(Error::Config(format!(
                    "log-level '{}' is not a valid filter directive",
                    level
                )));
            }
        }
        Ok(())
    }

    /// Parse config from a KDL document.
    ///
    /// Unknown nodes and values of the wrong kind are ignored.
    pub fn from_kdl(doc: &KdlDocument) -> Self {
        let mut config = Self::new();

        if let Some(s) = first_string(doc, "database-path") {
            if !s.is_empty() {
                config.database_path = Some(PathBuf::from(s));
            }
        }

        if let Some(s) = first_string(doc, "output-format") {
            config.output_format = OutputFormat::parse(s);
        }

        if let Some(node) = doc.get("changelog-limit") {
            if let Some(i) = node.entries().first().and_then(|e| e.value().as_integer()) {
                config.changelog_limit = usize::try_from(i).ok();
            }
        }

        if let Some(s) = first_string(doc, "log-level") {
            config.log_level = Some(s.to_string());
        }

        config
    }

    /// Convert config to a KDL document.
    pub fn to_kdl(&self) -> KdlDocument {
        let mut doc = KdlDocument::new();

        if let Some(path) = &self.database_path {
            push_node(
                &mut doc,
                "database-path",
                KdlValue::String(path.to_string_lossy().into_owned()),
            );
        }
        if let Some(format) = self.output_format {
            push_node(&mut doc, "output-format", KdlValue::String(format.as_str().to_string()));
        }
        if let Some(limit) = self.changelog_limit {
            push_node(&mut doc, "changelog-limit", KdlValue::Integer(limit as i128));
        }
        if let Some(level) = &self.log_level {
            push_node(&mut doc, "log-level", KdlValue::String(level.clone()));
        }

        doc
    }

    /// Set one key from its command-line string form.
    ///
    /// The config is left untouched when the new value is rejected.
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let mut next = self.clone();
        match key {
            "database-path" => next.database_path = Some(PathBuf::from(value)),
            "output-format" => {
                next.output_format = Some(OutputFormat::parse(value).ok_or_else(|| {
                    Error::Config(format!(
                        "output-format must be 'json' or 'human', got '{}'",
                        value
                    ))
                })?)
            }
            "changelog-limit" => {
                next.changelog_limit = Some(value.parse().map_err(|_| {
                    Error::Config(format!(
                        "changelog-limit must be a non-negative integer, got '{}'",
                        value
                    ))
                })?)
            }
            "log-level" => next.log_level = Some(value.to_string()),
            _ => {
                return Err(Error::Config(format!(
                    "Unknown config key '{}'. Valid keys: {}",
                    key,
                    CONFIG_KEYS.join(", ")
                )));
            }
        }
        next.validate()?;
        *self = next;
        Ok(())
    }
}

fn first_string<'a>(doc: &'a KdlDocument, name: &str) -> Option<&'a str> {
    doc.get(name)?.entries().first()?.value().as_string()
}

fn push_node(doc: &mut KdlDocument, name: &str, value: KdlValue) {
    let mut node = KdlNode::new(name);
    node.push(KdlEntry::new(value));
    doc.nodes_mut().push(node);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_format_parse() {
        assert_eq!(OutputFormat::parse("json"), Some(OutputFormat::Json));
        assert_eq!(OutputFormat::parse("HUMAN"), Some(OutputFormat::Human));
        assert_eq!(OutputFormat::parse("yaml"), None);
        assert_eq!(OutputFormat::Human.to_string(), "human");
    }

    #[test]
    fn test_from_kdl_reads_every_key() {
        let doc: KdlDocument = r#"
            database-path "/tmp/tt/tasks.db"
            output-format "human"
            changelog-limit 25
            log-level "debug"
        "#
        .parse()
        .unwrap();

        let config = TaskTreeConfig::from_kdl(&doc);
        assert_eq!(config.database_path, Some(PathBuf::from("/tmp/tt/tasks.db")));
        assert_eq!(config.output_format, Some(OutputFormat::Human));
        assert_eq!(config.changelog_limit, Some(25));
        assert_eq!(config.log_level.as_deref(), Some("debug"));
    }

    #[test]
    fn test_from_kdl_ignores_bad_values() {
        let doc: KdlDocument = r#"
            output-format "yaml"
            changelog-limit -3
            database-path 12
            colour "blue"
        "#
        .parse()
        .unwrap();

        assert_eq!(TaskTreeConfig::from_kdl(&doc), TaskTreeConfig::default());
    }

    #[test]
    fn test_kdl_roundtrip() {
        let config = TaskTreeConfig {
            database_path: Some(PathBuf::from("work.db")),
            output_format: Some(OutputFormat::Json),
            changelog_limit: Some(5),
            log_level: Some("tasktree=debug".to_string()),
        };

        let text = config.to_kdl().to_string();
        let doc: KdlDocument = text.parse().unwrap();
        assert_eq!(TaskTreeConfig::from_kdl(&doc), config);
    }

    #[test]
    fn test_set_validates() {
        let mut config = TaskTreeConfig::new();
        config.set("output-format", "human").unwrap();
        config.set("changelog-limit", "0").unwrap();
        assert_eq!(config.output_format, Some(OutputFormat::Human));
        assert_eq!(config.changelog_limit, Some(0));

        assert!(config.set("output-format", "xml").is_err());
        assert!(config.set("changelog-limit", "-1").is_err());
        assert!(config.set("editor", "vim").is_err());
        assert!(config.set("database-path", "").is_err());
        assert!(config.set("log-level", "tasktree=loud").is_err());
        assert_eq!(config.output_format, Some(OutputFormat::Human));
        assert_eq!(config.database_path, None);
    }
}
