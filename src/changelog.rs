//! Audit trail for work item mutations.
//!
//! Every successful create, update and complete appends one entry. Writes go
//! through [`record_change`], which never fails: a broken audit write is
//! logged and dropped so the mutation that triggered it still succeeds.

use crate::models::{ChangelogEntry, WorkItem, WorkItemPatch};
use crate::storage;
use crate::Result;
use chrono::Utc;
use rusqlite::Connection;

/// Action recorded for a newly created item.
pub const ACTION_CREATED: &str = "created";
/// Action recorded for a field update.
pub const ACTION_UPDATED: &str = "updated";
/// Action recorded by the complete shortcut.
pub const ACTION_COMPLETED: &str = "completed";

/// Append a changelog entry, returning its ID.
pub fn append_entry(
    conn: &Connection,
    work_item_id: i64,
    project_id: &str,
    action: &str,
    details: &str,
) -> Result<i64> {
    storage::insert_changelog(conn, work_item_id, project_id, action, details, Utc::now())
}

/// Record a change without letting a failure reach the caller.
///
/// This function never fails - errors are reported with `tracing::warn!`
/// and otherwise ignored.
pub fn record_change(conn: &Connection, item: &WorkItem, action: &str, details: &str) {
    if let Err(e) = append_entry(conn, item.id, &item.project_id, action, details) {
        tracing::warn!(
            item_id = item.id,
            action,
            "Failed to write changelog entry: {}",
            e
        );
    }
}

/// A project's changelog, newest first. A `limit` of 0 means no limit.
pub fn list(conn: &Connection, project_id: &str, limit: Option<usize>) -> Result<Vec<ChangelogEntry>> {
    storage::list_changelog(conn, project_id, limit.filter(|n| *n > 0))
}

/// Describe a creation, e.g. `Created task: 'Login' (parent: 3) - OAuth flow`.
pub fn created_details(item: &WorkItem) -> String {
    let mut details = format!("Created {}: '{}'", item.item_type, item.title);
    if let Some(parent_id) = item.parent_id {
        details.push_str(&format!(" (parent: {})", parent_id));
    }
    if let Some(description) = item.description.as_deref().filter(|d| !d.is_empty()) {
        details.push_str(&format!(" - {}", description));
    }
    details
}

/// Describe an update as the changed field names followed by one
/// `field: 'old' → 'new'` line per field.
pub fn updated_details(before: &WorkItem, after: &WorkItem, patch: &WorkItemPatch) -> String {
    let fields = patch.fields();
    let mut details = format!("Updated fields: {}", fields.join(", "));

    for field in fields {
        let (old, new) = match field {
            "title" => (before.title.clone(), after.title.clone()),
            "description" => (
                display_opt(before.description.as_deref()),
                display_opt(after.description.as_deref()),
            ),
            "status" => (before.status.to_string(), after.status.to_string()),
            "type" => (before.item_type.to_string(), after.item_type.to_string()),
            "parent_id" => (
                display_opt(before.parent_id.map(|p| p.to_string()).as_deref()),
                display_opt(after.parent_id.map(|p| p.to_string()).as_deref()),
            ),
            "order_index" => (before.order_index.to_string(), after.order_index.to_string()),
            _ => continue,
        };
        details.push_str(&format!("\n  {}: '{}' → '{}'", field, old, new));
    }
    details
}

/// Describe a completion.
pub fn completed_details(item: &WorkItem) -> String {
    format!("Item completed: {}", item.title)
}

fn display_opt(value: Option<&str>) -> String {
    value.unwrap_or("None").to_string()
}
