//! Nest a flat item list into the project hierarchy.

use crate::models::{ItemType, PhaseNode, ProjectNode, TaskNode, WorkItem, WorkPlan};
use std::collections::{HashMap, HashSet};

/// Build the nested plan from `items`.
///
/// Sibling order is taken from the input, which is expected to be sorted by
/// type rank, `order_index` and creation time. Any item that cannot be
/// reached from a top-level project through correctly typed links ends up
/// in `orphaned_items`.
pub fn build(items: &[WorkItem]) -> WorkPlan {
    let mut by_parent: HashMap<Option<i64>, Vec<&WorkItem>> = HashMap::new();
    for item in items {
        by_parent.entry(item.parent_id).or_default().push(item);
    }

    let mut builder = Builder {
        by_parent,
        processed: HashSet::new(),
    };

    let projects = builder
        .children(None, ItemType::Project)
        .into_iter()
        .map(|project| builder.project_node(project))
        .collect();

    let orphaned_items = items
        .iter()
        .filter(|item| !builder.processed.contains(&item.id))
        .cloned()
        .collect();

    WorkPlan {
        projects,
        orphaned_items,
    }
}

struct Builder<'a> {
    by_parent: HashMap<Option<i64>, Vec<&'a WorkItem>>,
    processed: HashSet<i64>,
}

impl<'a> Builder<'a> {
    /// Children of `parent` with the given type, in input order.
    fn children(&self, parent: Option<i64>, item_type: ItemType) -> Vec<&'a WorkItem> {
        self.by_parent
            .get(&parent)
            .map(|items| {
                items
                    .iter()
                    .copied()
                    .filter(|item| item.item_type == item_type)
                    .collect()
            })
            .unwrap_or_default()
    }

    fn project_node(&mut self, project: &WorkItem) -> ProjectNode {
        self.processed.insert(project.id);

        let phases = self
            .children(Some(project.id), ItemType::Phase)
            .into_iter()
            .map(|phase| self.phase_node(phase))
            .collect();
        let direct_tasks = self
            .children(Some(project.id), ItemType::Task)
            .into_iter()
            .map(|task| self.task_node(task))
            .collect();

        ProjectNode {
            item: project.clone(),
            phases,
            direct_tasks,
        }
    }

    fn phase_node(&mut self, phase: &WorkItem) -> PhaseNode {
        self.processed.insert(phase.id);

        let tasks = self
            .children(Some(phase.id), ItemType::Task)
            .into_iter()
            .map(|task| self.task_node(task))
            .collect();

        PhaseNode {
            item: phase.clone(),
            tasks,
            completion_summary: None,
        }
    }

    fn task_node(&mut self, task: &WorkItem) -> TaskNode {
        self.processed.insert(task.id);

        let subtasks: Vec<WorkItem> = self
            .children(Some(task.id), ItemType::Subtask)
            .into_iter()
            .cloned()
            .collect();
        self.processed.extend(subtasks.iter().map(|s| s.id));

        TaskNode {
            item: task.clone(),
            subtasks,
            completion_summary: None,
        }
    }
}
