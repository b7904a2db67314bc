//! Work item repository.
//!
//! The repository is the only writer of work items. Each mutation validates
//! and writes inside one store transaction, then records a changelog entry
//! after the commit. Reads go through the same handle.

use crate::changelog::{self, ACTION_COMPLETED, ACTION_CREATED, ACTION_UPDATED};
use crate::hierarchy;
use crate::models::{
    ChangelogEntry, ItemStatus, NewWorkItem, WorkItem, WorkItemPatch, WorkPlan,
};
use crate::plan;
use crate::search::{self, SearchHit};
use crate::storage::{self, ORDER_STEP, Store};
use crate::{Error, Result};
use chrono::Utc;
use rusqlite::Connection;

/// Create, update and read work items against an injected store.
pub struct Repository {
    store: Store,
}

impl Repository {
    pub fn new(store: Store) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    /// Create a work item with status `not_started`, appended after its siblings.
    pub fn create(&mut self, project_id: &str, new_item: NewWorkItem) -> Result<WorkItem> {
        require_title(&new_item.title)?;

        let item = self.store.write(|tx| {
            hierarchy::validate_create(tx, project_id, new_item.item_type, new_item.parent_id)?;

            let order_index =
                storage::max_sibling_order(tx, project_id, new_item.parent_id)? + ORDER_STEP;
            let id = storage::insert_item(tx, project_id, &new_item, order_index, Utc::now())?;
            fetch(tx, id, project_id)
        })?;

        changelog::record_change(
            self.store.connection(),
            &item,
            ACTION_CREATED,
            &changelog::created_details(&item),
        );
        tracing::info!(
            id = item.id,
            item_type = %item.item_type,
            parent_id = ?item.parent_id,
            "Created work item"
        );
        Ok(item)
    }

    /// Apply a partial update.
    ///
    /// Status changes must follow the status state machine. Type and parent
    /// changes are checked against the item's children and new ancestors, and
    /// the resulting (type, parent) pair must be a valid placement.
    pub fn update(&mut self, id: i64, project_id: &str, patch: &WorkItemPatch) -> Result<WorkItem> {
        if patch.is_empty() {
            return Err(Error::Validation("No updates provided".to_string()));
        }
        if let Some(title) = &patch.title {
            require_title(title)?;
        }
        if let Some(order_index) = patch.order_index {
            if !order_index.is_finite() {
                return Err(Error::Validation(format!(
                    "order_index must be a finite number, got {}",
                    order_index
                )));
            }
        }

        let (before, after) = self.store.write(|tx| {
            let before = fetch(tx, id, project_id)?;

            if let Some(status) = patch.status {
                before.status.validate_transition(status)?;
            }

            let new_type = patch.item_type.unwrap_or(before.item_type);
            let new_parent = patch.parent_id.unwrap_or(before.parent_id);

            if patch.item_type.is_some() {
                hierarchy::validate_type_change(tx, id, before.item_type, new_type, project_id)?;
            }
            if patch.parent_id.is_some() {
                hierarchy::validate_reparent(
                    tx,
                    id,
                    before.parent_id,
                    new_parent,
                    new_type,
                    project_id,
                )?;
            }
            if patch.changes_structure() {
                hierarchy::validate_create(tx, project_id, new_type, new_parent)?;
            }

            let mut next = before.clone();
            if let Some(title) = &patch.title {
                next.title = title.clone();
            }
            if let Some(description) = &patch.description {
                next.description = Some(description.clone());
            }
            if let Some(status) = patch.status {
                next.status = status;
            }
            if let Some(order_index) = patch.order_index {
                next.order_index = order_index;
            }
            next.item_type = new_type;
            next.parent_id = new_parent;
            next.updated_at = Utc::now();

            storage::update_item(tx, &next)?;
            // Return the row as stored; timestamps lose sub-microsecond precision.
            let after = fetch(tx, id, project_id)?;
            Ok((before, after))
        })?;

        changelog::record_change(
            self.store.connection(),
            &after,
            ACTION_UPDATED,
            &changelog::updated_details(&before, &after, patch),
        );
        tracing::info!(id, fields = ?patch.fields(), "Updated work item");
        Ok(after)
    }

    /// Mark an item completed. Completing a completed item is a no-op.
    pub fn complete(&mut self, id: i64, project_id: &str) -> Result<WorkItem> {
        let (item, changed) = self.store.write(|tx| {
            let mut item = fetch(tx, id, project_id)?;
            if item.is_completed() {
                return Ok((item, false));
            }

            item.status.validate_transition(ItemStatus::Completed)?;
            item.status = ItemStatus::Completed;
            item.updated_at = Utc::now();
            storage::update_item(tx, &item)?;
            Ok((fetch(tx, id, project_id)?, true))
        })?;

        if changed {
            changelog::record_change(
                self.store.connection(),
                &item,
                ACTION_COMPLETED,
                &changelog::completed_details(&item),
            );
            tracing::info!(id, "Completed work item");
        } else {
            tracing::debug!(id, "Work item already completed");
        }
        Ok(item)
    }

    pub fn get(&self, id: i64, project_id: &str) -> Result<WorkItem> {
        fetch(self.store.connection(), id, project_id)
    }

    /// List a project's items. `None` lists every status.
    pub fn list(&self, project_id: &str, statuses: Option<&[ItemStatus]>) -> Result<Vec<WorkItem>> {
        storage::list_items(self.store.connection(), project_id, statuses)
    }

    /// Build the rolling work plan: incomplete items nested by hierarchy,
    /// with completion roll-ups computed from every item in the project.
    pub fn work_plan(&mut self, project_id: &str) -> Result<WorkPlan> {
        let (open, all) = self.store.read(|tx| {
            let open = storage::list_items(tx, project_id, Some(ItemStatus::INCOMPLETE.as_slice()))?;
            let all = storage::list_items(tx, project_id, None)?;
            Ok((open, all))
        })?;

        let mut work_plan = plan::build(&open);
        plan::summarize(&mut work_plan, &all);
        tracing::debug!(
            projects = work_plan.projects.len(),
            tasks = work_plan.tasks().count(),
            visible = work_plan.visible_count(),
            orphaned = work_plan.orphaned_items.len(),
            "Built work plan"
        );
        Ok(work_plan)
    }

    /// Case-insensitive search over titles and descriptions.
    pub fn search(&self, project_id: &str, query: &str) -> Result<Vec<WorkItem>> {
        search::search(self.store.connection(), project_id, query)
    }

    /// Search with breadcrumbs and parent context for every hit.
    pub fn search_with_context(&mut self, project_id: &str, query: &str) -> Result<Vec<SearchHit>> {
        self.store
            .read(|tx| search::search_with_context(tx, project_id, query))
    }

    /// The project's changelog, newest first.
    pub fn changelog(&self, project_id: &str, limit: Option<usize>) -> Result<Vec<ChangelogEntry>> {
        changelog::list(self.store.connection(), project_id, limit)
    }
}

fn fetch(conn: &Connection, id: i64, project_id: &str) -> Result<WorkItem> {
    storage::get_item_in_project(conn, id, project_id)?.ok_or_else(|| {
        Error::NotFound(format!(
            "Work item {} not found in project {}",
            id, project_id
        ))
    })
}

fn require_title(title: &str) -> Result<()> {
    if title.trim().is_empty() {
        return Err(Error::Validation("Title cannot be empty".to_string()));
    }
    Ok(())
}
