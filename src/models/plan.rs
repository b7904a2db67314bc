//! Nested views of the work hierarchy.
//!
//! These are produced by `plan::build` from a flat item list and annotated
//! by `plan::summarize`. Each node carries the full item inline.

use super::WorkItem;
use serde::{Deserialize, Serialize};

/// A task with its subtasks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskNode {
    #[serde(flatten)]
    pub item: WorkItem,

    pub subtasks: Vec<WorkItem>,

    /// Roll-up of subtask completion, e.g. "✓ 2/3 subtasks completed"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completion_summary: Option<String>,
}

/// A phase with its tasks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhaseNode {
    #[serde(flatten)]
    pub item: WorkItem,

    pub tasks: Vec<TaskNode>,

    /// Roll-up of task completion, e.g. "✓ All 3 tasks completed"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completion_summary: Option<String>,
}

/// A project root with its phases and direct tasks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectNode {
    #[serde(flatten)]
    pub item: WorkItem,

    pub phases: Vec<PhaseNode>,

    /// Tasks whose parent is the project itself
    pub direct_tasks: Vec<TaskNode>,
}

/// The rolling work plan: nested projects plus items that did not fit.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkPlan {
    pub projects: Vec<ProjectNode>,
    pub orphaned_items: Vec<WorkItem>,
}

impl WorkPlan {
    pub fn is_empty(&self) -> bool {
        self.projects.is_empty() && self.orphaned_items.is_empty()
    }

    /// Every task node in the plan, phase tasks first, then direct tasks.
    pub fn tasks(&self) -> impl Iterator<Item = &TaskNode> {
        self.projects.iter().flat_map(|project| {
            project
                .phases
                .iter()
                .flat_map(|phase| phase.tasks.iter())
                .chain(project.direct_tasks.iter())
        })
    }

    /// Number of items visible in the nested tree (orphans excluded).
    pub fn visible_count(&self) -> usize {
        self.projects
            .iter()
            .map(|project| {
                1 + project.phases.len()
                    + project
                        .phases
                        .iter()
                        .flat_map(|phase| phase.tasks.iter())
                        .chain(project.direct_tasks.iter())
                        .map(|task| 1 + task.subtasks.len())
                        .sum::<usize>()
            })
            .sum()
    }
}
