//! Project identifiers.
//!
//! A project ID is the standard base64 encoding of some caller-supplied
//! string that names the project, usually a git remote URL or an absolute
//! path. The same input always yields the same ID.

use crate::{Error, Result};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};

/// A derived project ID together with the value it came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectId {
    pub project_id: String,
    pub raw_value: String,
}

/// Derive the project ID for `project_info`.
pub fn generate(project_info: &str) -> Result<ProjectId> {
    if project_info.trim().is_empty() {
        return Err(Error::Validation(
            "project_info must be a non-empty string".to_string(),
        ));
    }

    Ok(ProjectId {
        project_id: STANDARD.encode(project_info.as_bytes()),
        raw_value: project_info.to_string(),
    })
}

/// Recover the raw value behind a project ID, if it is valid base64 UTF-8.
pub fn decode(project_id: &str) -> Option<String> {
    let bytes = STANDARD.decode(project_id).ok()?;
    String::from_utf8(bytes).ok()
}
