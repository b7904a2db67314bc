//! Hierarchy validation for work items.
//!
//! Every check here reads committed state through the connection it is
//! given, so callers run them inside the same transaction as the write that
//! follows. The rules:
//!
//! - only projects are top-level; every other type needs a parent
//! - the parent's type must be one the child type allows
//! - the parent must exist in the same project
//! - an item can never become its own ancestor
//! - an ancestor chain holds at most [`MAX_DEPTH`] items, root included

use crate::models::{ItemType, MAX_DEPTH, type_list};
use crate::storage;
use crate::{Error, Result};
use rusqlite::Connection;
use std::collections::{HashSet, VecDeque};

/// Validate placing a new item of `child_type` under `parent_id`.
pub fn validate_create(
    conn: &Connection,
    project_id: &str,
    child_type: ItemType,
    parent_id: Option<i64>,
) -> Result<()> {
    let Some(parent_id) = parent_id else {
        if child_type.can_be_top_level() {
            return Ok(());
        }
        return Err(Error::Validation(format!(
            "{} items cannot be top-level. Valid parents: {}",
            child_type,
            type_list(child_type.allowed_parents())
        )));
    };

    let parent_type = load_parent_type(conn, project_id, parent_id)?;
    if !child_type.can_be_child_of(parent_type) {
        return Err(Error::Validation(format!(
            "{} items cannot be children of {}. Valid parents: {}",
            child_type,
            parent_type,
            type_list(child_type.allowed_parents())
        )));
    }

    check_ancestry(conn, project_id, parent_id)
}

/// Validate changing an item's type given the children it already has.
pub fn validate_type_change(
    conn: &Connection,
    item_id: i64,
    old_type: ItemType,
    new_type: ItemType,
    project_id: &str,
) -> Result<()> {
    if old_type == new_type {
        return Ok(());
    }

    let allowed = new_type.allowed_children();
    let children = storage::child_types(conn, item_id, project_id)?;
    if let Some(child) = children.iter().find(|t| !allowed.contains(t)) {
        return Err(Error::Validation(format!(
            "Cannot change type from '{}' to '{}': would create invalid hierarchy with {} children. \
             '{}' can only have children of types: {}",
            old_type,
            new_type,
            child,
            new_type,
            if allowed.is_empty() {
                "none".to_string()
            } else {
                type_list(allowed)
            }
        )));
    }
    Ok(())
}

/// Validate moving an item from `old_parent_id` to `new_parent_id`.
pub fn validate_reparent(
    conn: &Connection,
    item_id: i64,
    old_parent_id: Option<i64>,
    new_parent_id: Option<i64>,
    item_type: ItemType,
    project_id: &str,
) -> Result<()> {
    if old_parent_id == new_parent_id {
        return Ok(());
    }

    let Some(new_parent_id) = new_parent_id else {
        if item_type.can_be_top_level() {
            return Ok(());
        }
        return Err(Error::Validation(format!(
            "Cannot make {} top-level. Only projects can be top-level.",
            item_type
        )));
    };

    if new_parent_id == item_id {
        return Err(Error::Validation(format!(
            "Cannot move item {} under itself",
            item_id
        )));
    }

    let parent_type = load_parent_type(conn, project_id, new_parent_id)?;
    if !item_type.can_be_child_of(parent_type) {
        return Err(Error::Validation(format!(
            "Cannot move {} under {}. Valid parents for {}: {}",
            item_type,
            parent_type,
            item_type,
            type_list(item_type.allowed_parents())
        )));
    }

    if descendants(conn, item_id, project_id)?.contains(&new_parent_id) {
        return Err(Error::Validation(format!(
            "Cannot move item {} under item {}: would create circular reference \
             (target is a descendant)",
            item_id, new_parent_id
        )));
    }
    Ok(())
}

/// Walk up from `start` to the root, rejecting cycles and over-deep chains.
///
/// `start` is the prospective parent, so the chain including the new child
/// may hold at most `MAX_DEPTH` items. A link to an item outside the project
/// ends the walk.
pub fn check_ancestry(conn: &Connection, project_id: &str, start: i64) -> Result<()> {
    let mut visited = HashSet::new();
    let mut current = Some(start);

    while let Some(id) = current {
        if !visited.insert(id) {
            return Err(Error::Validation(format!(
                "Circular reference detected in hierarchy at item {}",
                id
            )));
        }
        if visited.len() >= MAX_DEPTH {
            return Err(Error::Validation(format!(
                "Maximum hierarchy depth ({}) exceeded",
                MAX_DEPTH
            )));
        }
        current = storage::parent_of(conn, id, project_id)?.flatten();
    }
    Ok(())
}

/// Every item below `item_id` in the project, in breadth-first order.
///
/// The root itself is never included, even if corrupt data loops back to it.
pub fn descendants(conn: &Connection, item_id: i64, project_id: &str) -> Result<Vec<i64>> {
    let mut seen = HashSet::from([item_id]);
    let mut queue = VecDeque::from([item_id]);
    let mut found = Vec::new();

    while let Some(id) = queue.pop_front() {
        for child in storage::child_ids(conn, id, project_id)? {
            if seen.insert(child) {
                found.push(child);
                queue.push_back(child);
            }
        }
    }
    Ok(found)
}

fn load_parent_type(conn: &Connection, project_id: &str, parent_id: i64) -> Result<ItemType> {
    let parent = storage::get_item(conn, parent_id)?.ok_or_else(|| {
        Error::Validation(format!("Parent item with ID {} does not exist", parent_id))
    })?;

    if parent.project_id != project_id {
        return Err(Error::Isolation(format!(
            "Parent item {} belongs to a different project",
            parent_id
        )));
    }
    Ok(parent.item_type)
}
