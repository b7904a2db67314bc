//! Data models for tasktree entities.
//!
//! This module defines the core data structures:
//! - `WorkItem` - A node in the project → phase → task → subtask hierarchy
//! - `ItemType` / `ItemStatus` - The hierarchy level and workflow state of an item
//! - `ChangelogEntry` - Append-only audit record of a mutation
//! - `WorkItemPatch` - Partial field update accepted by the repository
//! - `plan` - Nested node types produced by the tree builder

pub mod patch;
pub mod plan;

pub use patch::WorkItemPatch;
pub use plan::{PhaseNode, ProjectNode, TaskNode, WorkPlan};

use crate::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Maximum length of an ancestor chain, root included.
pub const MAX_DEPTH: usize = 4;

/// Level of a work item in the hierarchy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemType {
    Project,
    Phase,
    Task,
    Subtask,
}

impl ItemType {
    /// Every type, in hierarchy order.
    pub const ALL: [ItemType; 4] = [
        ItemType::Project,
        ItemType::Phase,
        ItemType::Task,
        ItemType::Subtask,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ItemType::Project => "project",
            ItemType::Phase => "phase",
            ItemType::Task => "task",
            ItemType::Subtask => "subtask",
        }
    }

    /// Sort rank used for plan and search ordering (project first).
    pub fn rank(&self) -> u8 {
        match self {
            ItemType::Project => 1,
            ItemType::Phase => 2,
            ItemType::Task => 3,
            ItemType::Subtask => 4,
        }
    }

    /// Types an item of this type may be nested under.
    ///
    /// An empty slice means the type is top-level only.
    pub fn allowed_parents(&self) -> &'static [ItemType] {
        match self {
            ItemType::Project => &[],
            ItemType::Phase => &[ItemType::Project],
            ItemType::Task => &[ItemType::Project, ItemType::Phase],
            ItemType::Subtask => &[ItemType::Task],
        }
    }

    /// Types an item of this type may keep as children after a type change.
    pub fn allowed_children(&self) -> &'static [ItemType] {
        match self {
            ItemType::Project => &[ItemType::Phase, ItemType::Task],
            ItemType::Phase => &[ItemType::Task, ItemType::Subtask],
            ItemType::Task => &[ItemType::Subtask],
            ItemType::Subtask => &[],
        }
    }

    pub fn can_be_top_level(&self) -> bool {
        self.allowed_parents().is_empty()
    }

    pub fn can_be_child_of(&self, parent: ItemType) -> bool {
        self.allowed_parents().contains(&parent)
    }
}

impl fmt::Display for ItemType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ItemType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "project" => Ok(ItemType::Project),
            "phase" => Ok(ItemType::Phase),
            "task" => Ok(ItemType::Task),
            "subtask" => Ok(ItemType::Subtask),
            _ => Err(Error::Validation(format!(
                "Invalid item type: {}. Must be one of: {}",
                s,
                type_list(&ItemType::ALL)
            ))),
        }
    }
}

/// Workflow state of a work item.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemStatus {
    #[default]
    NotStarted,
    InProgress,
    Completed,
}

impl ItemStatus {
    pub const ALL: [ItemStatus; 3] = [
        ItemStatus::NotStarted,
        ItemStatus::InProgress,
        ItemStatus::Completed,
    ];

    /// Statuses shown in the rolling work plan.
    pub const INCOMPLETE: [ItemStatus; 2] = [ItemStatus::NotStarted, ItemStatus::InProgress];

    pub fn as_str(&self) -> &'static str {
        match self {
            ItemStatus::NotStarted => "not_started",
            ItemStatus::InProgress => "in_progress",
            ItemStatus::Completed => "completed",
        }
    }

    /// States reachable from this one in a single update.
    ///
    /// Staying in the same state is always allowed and is not listed here.
    pub fn next_states(&self) -> &'static [ItemStatus] {
        match self {
            ItemStatus::NotStarted => &[ItemStatus::InProgress, ItemStatus::Completed],
            ItemStatus::InProgress => &[ItemStatus::NotStarted, ItemStatus::Completed],
            ItemStatus::Completed => &[ItemStatus::InProgress],
        }
    }

    pub fn can_transition_to(&self, next: ItemStatus) -> bool {
        *self == next || self.next_states().contains(&next)
    }

    /// Validate a status transition.
    pub fn validate_transition(&self, next: ItemStatus) -> Result<()> {
        if self.can_transition_to(next) {
            return Ok(());
        }
        let valid: Vec<&str> = self.next_states().iter().map(|s| s.as_str()).collect();
        Err(Error::Validation(format!(
            "Invalid status transition from '{}' to '{}'. Valid transitions: {}",
            self,
            next,
            valid.join(", ")
        )))
    }

    pub fn is_completed(&self) -> bool {
        *self == ItemStatus::Completed
    }
}

impl fmt::Display for ItemStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ItemStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "not_started" | "not-started" => Ok(ItemStatus::NotStarted),
            "in_progress" | "in-progress" => Ok(ItemStatus::InProgress),
            "completed" => Ok(ItemStatus::Completed),
            _ => {
                let valid: Vec<&str> = ItemStatus::ALL.iter().map(|s| s.as_str()).collect();
                Err(Error::Validation(format!(
                    "Invalid status '{}'. Must be one of: {}",
                    s,
                    valid.join(", ")
                )))
            }
        }
    }
}

/// Render a list of types for error messages, e.g. `project, phase`.
pub(crate) fn type_list(types: &[ItemType]) -> String {
    if types.is_empty() {
        return "none (top-level only)".to_string();
    }
    types
        .iter()
        .map(|t| t.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

/// A node in a project's work hierarchy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkItem {
    /// Store-generated identifier
    pub id: i64,

    /// Opaque project identifier (see `project_id`)
    pub project_id: String,

    /// Hierarchy level
    #[serde(rename = "type")]
    pub item_type: ItemType,

    pub title: String,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(default)]
    pub status: ItemStatus,

    /// Parent item; `None` only for projects
    #[serde(default)]
    pub parent_id: Option<i64>,

    #[serde(default)]
    pub notes: Option<String>,

    /// Position among siblings (lower sorts first)
    pub order_index: f64,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

impl WorkItem {
    pub fn is_completed(&self) -> bool {
        self.status.is_completed()
    }
}

/// Fields supplied by a caller when creating a work item.
#[derive(Debug, Clone, PartialEq)]
pub struct NewWorkItem {
    pub item_type: ItemType,
    pub title: String,
    pub description: Option<String>,
    pub parent_id: Option<i64>,
    pub notes: Option<String>,
}

impl NewWorkItem {
    pub fn new(item_type: ItemType, title: impl Into<String>) -> Self {
        Self {
            item_type,
            title: title.into(),
            description: None,
            parent_id: None,
            notes: None,
        }
    }

    pub fn with_parent(mut self, parent_id: i64) -> Self {
        self.parent_id = Some(parent_id);
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }
}

/// One entry of the append-only audit trail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangelogEntry {
    pub id: i64,
    pub work_item_id: i64,
    pub project_id: String,
    /// Action name: `created`, `updated` or `completed`
    pub action: String,
    /// Human-readable description of the change
    pub details: String,
    pub created_at: DateTime<Utc>,
}
