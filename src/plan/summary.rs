//! Completion roll-ups for the rolling work plan.

use crate::models::{TaskNode, WorkItem, WorkPlan};
use std::collections::HashMap;

/// Completed and total child counts for one parent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct Tally {
    completed: usize,
    total: usize,
}

/// Annotate every phase and task in `plan` with a completion summary.
///
/// Counts come from `all_items`, the unfiltered item set, so children hidden
/// from the plan because they are finished still count. Projects get no
/// summary.
pub fn summarize(plan: &mut WorkPlan, all_items: &[WorkItem]) {
    let mut tallies: HashMap<i64, Tally> = HashMap::new();
    for item in all_items {
        if let Some(parent_id) = item.parent_id {
            let tally = tallies.entry(parent_id).or_default();
            tally.total += 1;
            if item.is_completed() {
                tally.completed += 1;
            }
        }
    }
    let tally_of = |id: i64| tallies.get(&id).copied().unwrap_or_default();

    for project in &mut plan.projects {
        for phase in &mut project.phases {
            phase.completion_summary = roll_up(tally_of(phase.item.id), "tasks");
            for task in &mut phase.tasks {
                summarize_task(task, tally_of(task.item.id));
            }
        }
        for task in &mut project.direct_tasks {
            summarize_task(task, tally_of(task.item.id));
        }
    }
}

fn summarize_task(task: &mut TaskNode, tally: Tally) {
    task.completion_summary = roll_up(tally, "subtasks");
}

/// `✓ All N <noun> completed`, `✓ M/N <noun> completed`, or nothing when no
/// child is finished.
fn roll_up(tally: Tally, noun: &str) -> Option<String> {
    if tally.completed == 0 {
        None
    } else if tally.completed == tally.total {
        Some(format!("✓ All {} {} completed", tally.total, noun))
    } else {
        Some(format!("✓ {}/{} {} completed", tally.completed, tally.total, noun))
    }
}
