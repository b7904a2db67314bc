//! Text search over work items.

use crate::models::{ItemStatus, ItemType, MAX_DEPTH, WorkItem};
use crate::storage;
use crate::{Error, Result};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Separator used to render a breadcrumb as one string.
pub const BREADCRUMB_SEPARATOR: &str = " > ";

/// A search match with its place in the hierarchy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    #[serde(flatten)]
    pub item: WorkItem,

    /// Titles from the root down to the item itself
    pub breadcrumb: Vec<String>,

    /// `breadcrumb` joined with `" > "`
    pub breadcrumb_path: String,

    /// The immediate parent, if it resolves
    pub parent_context: Option<ParentContext>,
}

/// Summary of a search hit's parent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParentContext {
    pub id: i64,
    #[serde(rename = "type")]
    pub item_type: ItemType,
    pub title: String,
    pub status: ItemStatus,
}

impl From<&WorkItem> for ParentContext {
    fn from(item: &WorkItem) -> Self {
        Self {
            id: item.id,
            item_type: item.item_type,
            title: item.title.clone(),
            status: item.status,
        }
    }
}

/// Case-insensitive substring search over title and description.
///
/// Surrounding whitespace in `query` is ignored. Results are ordered by type
/// rank, then `order_index`, then title.
pub fn search(conn: &Connection, project_id: &str, query: &str) -> Result<Vec<WorkItem>> {
    let query = query.trim();
    if query.is_empty() {
        return Err(Error::Validation("Search query cannot be empty".to_string()));
    }
    let items = storage::search_items(conn, project_id, query)?;
    tracing::debug!(query, matches = items.len(), "Searched work items");
    Ok(items)
}

/// Like [`search`], with each match's breadcrumb and parent resolved.
pub fn search_with_context(conn: &Connection, project_id: &str, query: &str) -> Result<Vec<SearchHit>> {
    search(conn, project_id, query)?
        .into_iter()
        .map(|item| with_context(conn, item))
        .collect()
}

fn with_context(conn: &Connection, item: WorkItem) -> Result<SearchHit> {
    let ancestors = ancestors(conn, &item)?;

    let mut breadcrumb: Vec<String> = ancestors.iter().rev().map(|a| a.title.clone()).collect();
    breadcrumb.push(item.title.clone());
    let breadcrumb_path = breadcrumb.join(BREADCRUMB_SEPARATOR);
    let parent_context = ancestors.first().map(ParentContext::from);

    Ok(SearchHit {
        item,
        breadcrumb,
        breadcrumb_path,
        parent_context,
    })
}

/// Ancestors of `item`, nearest first.
///
/// The walk stops at a missing parent, a repeated ID, or after `MAX_DEPTH`
/// steps, so corrupt links never loop.
pub fn ancestors(conn: &Connection, item: &WorkItem) -> Result<Vec<WorkItem>> {
    let mut chain = Vec::new();
    let mut seen = HashSet::from([item.id]);
    let mut current = item.parent_id;

    while let Some(id) = current {
        if chain.len() >= MAX_DEPTH || !seen.insert(id) {
            break;
        }
        let Some(parent) = storage::get_item_in_project(conn, id, &item.project_id)? else {
            break;
        };
        current = parent.parent_id;
        chain.push(parent);
    }
    Ok(chain)
}
