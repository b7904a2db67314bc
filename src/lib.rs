//! Tasktree - A hierarchical work plan tracker for AI agents and humans.
//!
//! This library provides the core functionality for the `tt` CLI tool:
//! a project → phase → task → subtask hierarchy kept well-formed by the
//! [`hierarchy`] validator, mutated through the [`repository`], and read back
//! as a rolling work plan that hides finished work behind roll-up summaries.

pub mod changelog;
pub mod cli;
pub mod commands;
pub mod config;
pub mod hierarchy;
pub mod models;
pub mod plan;
pub mod project_id;
pub mod repository;
pub mod search;
pub mod storage;


/// Library-level error type for tasktree operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Input violates a hierarchy, status or patch rule.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Input reaches across project boundaries.
    #[error("Isolation error: {0}")]
    Isolation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Stable machine-readable name of the error category.
    pub fn kind(&self) -> &'static str {
        match self {
            Error::Io(_) => "io",
            Error::Json(_) => "json",
            Error::Database(_) => "database",
            Error::Validation(_) => "validation",
            Error::Isolation(_) => "isolation",
            Error::NotFound(_) => "not_found",
            Error::InvalidInput(_) => "invalid_input",
            Error::Config(_) => "config",
        }
    }

    /// True for rule violations caused by caller input, isolation included.
    pub fn is_validation(&self) -> bool {
        matches!(self, Error::Validation(_) | Error::Isolation(_))
    }
}

/// Result type alias for tasktree operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_isolation_is_validation() {
        assert!(Error::Isolation("x".into()).is_validation());
        assert!(Error::Validation("x".into()).is_validation());
        assert!(!Error::NotFound("x".into()).is_validation());
    }

    #[test]
    fn test_error_kinds() {
        assert_eq!(Error::NotFound("x".into()).kind(), "not_found");
        assert_eq!(Error::Isolation("x".into()).kind(), "isolation");
        assert_eq!(
            Error::Validation("bad".into()).to_string(),
            "Validation error: bad"
        );
    }
}
