//! Storage layer for tasktree data.
//!
//! This module owns the SQLite connection and every SQL statement the
//! library runs. It is deliberately thin: queries return typed rows and do
//! no validation. Hierarchy rules live in [`crate::hierarchy`] and the
//! write workflow lives in [`crate::repository`].
//!
//! ## Layout
//!
//! - `work_items` - one row per project/phase/task/subtask, linked by `parent_id`
//! - `changelog` - append-only audit trail
//!
//! Query helpers take a `&Connection` so they can run on the bare
//! connection or inside a [`Transaction`] handed out by [`Store::write`] or
//! [`Store::read`].

use crate::models::{ChangelogEntry, ItemStatus, ItemType, NewWorkItem, WorkItem};
use crate::{Error, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::types::Type;
use rusqlite::{Connection, OptionalExtension, Row, Transaction, TransactionBehavior, params};
use std::fs;
use std::path::{Path, PathBuf};

/// Columns selected for a `WorkItem`, in the order `row_to_item` reads them.
const ITEM_COLUMNS: &str = "id, project_id, type, title, description, status, parent_id, \
                            notes, order_index, created_at, updated_at";

/// Sort key placing projects before phases before tasks before subtasks.
const TYPE_RANK: &str = "CASE type \
                         WHEN 'project' THEN 1 \
                         WHEN 'phase' THEN 2 \
                         WHEN 'task' THEN 3 \
                         WHEN 'subtask' THEN 4 \
                         ELSE 5 END";

/// Gap left between consecutive siblings by auto-ordering.
pub const ORDER_STEP: f64 = 10.0;

/// Handle to a tasktree database.
pub struct Store {
    /// Database file, `None` for in-memory stores
    path: Option<PathBuf>,
    conn: Connection,
}

impl Store {
    /// Open or create the database at `path`.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(path)?;
        Self::init_schema(&conn)?;
        tracing::debug!("Opened database at {}", path.display());

        Ok(Self {
            path: Some(path.to_path_buf()),
            conn,
        })
    }

    /// Open a private in-memory database.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::init_schema(&conn)?;
        Ok(Self { path: None, conn })
    }

    /// Initialize the SQLite schema. Safe to run on an existing database.
    ///
    /// Foreign keys are switched off for the connection: a `parent_id` may
    /// point at a missing row, and the plan reports such items as orphans.
    fn init_schema(conn: &Connection) -> Result<()> {
        conn.execute_batch(
            r#"
            PRAGMA foreign_keys = OFF;

            CREATE TABLE IF NOT EXISTS work_items (
                id INTEGER PRIMARY KEY,
                project_id TEXT NOT NULL,
                type TEXT NOT NULL
                    CHECK (type IN ('project', 'phase', 'task', 'subtask')),
                title TEXT NOT NULL,
                description TEXT,
                status TEXT NOT NULL DEFAULT 'not_started'
                    CHECK (status IN ('not_started', 'in_progress', 'completed')),
                parent_id INTEGER REFERENCES work_items(id),
                notes TEXT,
                order_index REAL NOT NULL DEFAULT 1.0,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS changelog (
                id INTEGER PRIMARY KEY,
                work_item_id INTEGER,
                project_id TEXT,
                action TEXT,
                details TEXT,
                created_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_project ON work_items(project_id);
            CREATE INDEX IF NOT EXISTS idx_parent ON work_items(parent_id);
            CREATE INDEX IF NOT EXISTS idx_status ON work_items(status);
            CREATE INDEX IF NOT EXISTS idx_changelog_project ON changelog(project_id);
            "#,
        )?;
        Ok(())
    }

    /// Database file backing this store, if any.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// The underlying connection, for statements outside a transaction.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Run `f` inside a write transaction.
    ///
    /// The transaction takes the write lock up front, so the reads `f` makes
    /// are consistent with the writes it performs. It commits when `f`
    /// returns `Ok` and rolls back otherwise.
    pub fn write<T, F>(&mut self, f: F) -> Result<T>
    where
        F: FnOnce(&Transaction<'_>) -> Result<T>,
    {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        let value = f(&tx)?;
        tx.commit()?;
        Ok(value)
    }

    /// Run `f` inside a read transaction so every query sees one snapshot.
    pub fn read<T, F>(&mut self, f: F) -> Result<T>
    where
        F: FnOnce(&Transaction<'_>) -> Result<T>,
    {
        let tx = self.conn.transaction()?;
        let value = f(&tx)?;
        tx.commit()?;
        Ok(value)
    }
}

/// Format a timestamp for storage.
///
/// Fixed-width microsecond RFC 3339 keeps lexical and chronological order equal.
pub fn timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_timestamp(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(idx)?;
    DateTime::parse_from_rfc3339(&raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn parse_column<T>(row: &Row<'_>, idx: usize) -> rusqlite::Result<T>
where
    T: std::str::FromStr<Err = Error>,
{
    let raw: String = row.get(idx)?;
    raw.parse()
        .map_err(|e: Error| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn row_to_item(row: &Row<'_>) -> rusqlite::Result<WorkItem> {
    Ok(WorkItem {
        id: row.get(0)?,
        project_id: row.get(1)?,
        item_type: parse_column(row, 2)?,
        title: row.get(3)?,
        description: row.get(4)?,
        status: parse_column(row, 5)?,
        parent_id: row.get(6)?,
        notes: row.get(7)?,
        order_index: row.get(8)?,
        created_at: parse_timestamp(row, 9)?,
        updated_at: parse_timestamp(row, 10)?,
    })
}

fn row_to_changelog(row: &Row<'_>) -> rusqlite::Result<ChangelogEntry> {
    Ok(ChangelogEntry {
        id: row.get(0)?,
        work_item_id: row.get(1)?,
        project_id: row.get(2)?,
        action: row.get(3)?,
        details: row.get(4)?,
        created_at: parse_timestamp(row, 5)?,
    })
}

// === Work Item Queries ===

/// Get an item by ID regardless of project.
pub fn get_item(conn: &Connection, id: i64) -> Result<Option<WorkItem>> {
    let sql = format!("SELECT {} FROM work_items WHERE id = ?1", ITEM_COLUMNS);
    Ok(conn.query_row(&sql, [id], row_to_item).optional()?)
}

/// Get an item by ID, only if it belongs to `project_id`.
pub fn get_item_in_project(conn: &Connection, id: i64, project_id: &str) -> Result<Option<WorkItem>> {
    let sql = format!(
        "SELECT {} FROM work_items WHERE id = ?1 AND project_id = ?2",
        ITEM_COLUMNS
    );
    Ok(conn
        .query_row(&sql, params![id, project_id], row_to_item)
        .optional()?)
}

/// Look up the parent link of an item within a project.
///
/// Returns `None` when the item does not exist in the project, and
/// `Some(None)` when it exists but is top-level.
pub fn parent_of(conn: &Connection, id: i64, project_id: &str) -> Result<Option<Option<i64>>> {
    Ok(conn
        .query_row(
            "SELECT parent_id FROM work_items WHERE id = ?1 AND project_id = ?2",
            params![id, project_id],
            |row| row.get(0),
        )
        .optional()?)
}

/// Types of the direct children of an item.
pub fn child_types(conn: &Connection, id: i64, project_id: &str) -> Result<Vec<ItemType>> {
    let mut stmt =
        conn.prepare("SELECT type FROM work_items WHERE parent_id = ?1 AND project_id = ?2")?;
    let types = stmt
        .query_map(params![id, project_id], |row| parse_column(row, 0))?
        .collect::<rusqlite::Result<Vec<ItemType>>>()?;
    Ok(types)
}

/// IDs of the direct children of an item.
pub fn child_ids(conn: &Connection, id: i64, project_id: &str) -> Result<Vec<i64>> {
    let mut stmt = conn.prepare(
        "SELECT id FROM work_items WHERE parent_id = ?1 AND project_id = ?2 ORDER BY id",
    )?;
    let ids = stmt
        .query_map(params![id, project_id], |row| row.get(0))?
        .collect::<rusqlite::Result<Vec<i64>>>()?;
    Ok(ids)
}

/// Highest `order_index` among items sharing `parent_id`, or 0 without siblings.
pub fn max_sibling_order(conn: &Connection, project_id: &str, parent_id: Option<i64>) -> Result<f64> {
    // `IS` matches NULL parents as well as concrete IDs.
    let max = conn.query_row(
        "SELECT COALESCE(MAX(order_index), 0) FROM work_items
         WHERE project_id = ?1 AND parent_id IS ?2",
        params![project_id, parent_id],
        |row| row.get(0),
    )?;
    Ok(max)
}

/// Insert a new item with status `not_started`, returning its ID.
pub fn insert_item(
    conn: &Connection,
    project_id: &str,
    item: &NewWorkItem,
    order_index: f64,
    now: DateTime<Utc>,
) -> Result<i64> {
    let now = timestamp(now);
    conn.execute(
        r#"
        INSERT INTO work_items
        (project_id, type, title, description, status, parent_id, notes, order_index,
         created_at, updated_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
        "#,
        params![
            project_id,
            item.item_type.as_str(),
            item.title,
            item.description,
            ItemStatus::NotStarted.as_str(),
            item.parent_id,
            item.notes,
            order_index,
            now,
            now,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Persist every mutable field of `item`.
pub fn update_item(conn: &Connection, item: &WorkItem) -> Result<()> {
    let changed = conn.execute(
        r#"
        UPDATE work_items
        SET type = ?1, title = ?2, description = ?3, status = ?4, parent_id = ?5,
            order_index = ?6, updated_at = ?7
        WHERE id = ?8 AND project_id = ?9
        "#,
        params![
            item.item_type.as_str(),
            item.title,
            item.description,
            item.status.as_str(),
            item.parent_id,
            item.order_index,
            timestamp(item.updated_at),
            item.id,
            item.project_id,
        ],
    )?;

    if changed == 0 {
        return Err(Error::NotFound(format!(
            "Work item {} not found in project {}",
            item.id, item.project_id
        )));
    }
    Ok(())
}

/// List a project's items, optionally restricted to some statuses.
///
/// Ordered by type rank, then `order_index`, then creation time.
pub fn list_items(
    conn: &Connection,
    project_id: &str,
    statuses: Option<&[ItemStatus]>,
) -> Result<Vec<WorkItem>> {
    let mut sql = format!("SELECT {} FROM work_items WHERE project_id = ?", ITEM_COLUMNS);
    let mut values: Vec<String> = vec![project_id.to_string()];

    if let Some(statuses) = statuses {
        if statuses.is_empty() {
            return Ok(Vec::new());
        }
        let placeholders = vec!["?"; statuses.len()].join(", ");
        sql.push_str(&format!(" AND status IN ({})", placeholders));
        values.extend(statuses.iter().map(|s| s.as_str().to_string()));
    }

    sql.push_str(&format!(
        " ORDER BY {}, order_index ASC, created_at ASC, id ASC",
        TYPE_RANK
    ));

    let mut stmt = conn.prepare(&sql)?;
    let items = stmt
        .query_map(rusqlite::params_from_iter(values.iter()), row_to_item)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(items)
}

/// Case-insensitive substring search over title and description.
///
/// SQLite's `LIKE` folds ASCII case only.
/// Ordered by type rank, then `order_index`, then title.
pub fn search_items(conn: &Connection, project_id: &str, query: &str) -> Result<Vec<WorkItem>> {
    let pattern = format!("%{}%", escape_like(query));
    let sql = format!(
        r#"
        SELECT {} FROM work_items
        WHERE project_id = ?1
          AND (title LIKE ?2 ESCAPE '\' OR description LIKE ?2 ESCAPE '\')
        ORDER BY {}, order_index ASC, title ASC
        "#,
        ITEM_COLUMNS, TYPE_RANK
    );

    let mut stmt = conn.prepare(&sql)?;
    let items = stmt
        .query_map(params![project_id, pattern], row_to_item)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(items)
}

/// Escape LIKE wildcards so the query matches literally.
fn escape_like(query: &str) -> String {
    let mut escaped = String::with_capacity(query.len());
    for c in query.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

// === Changelog Queries ===

/// Append a changelog row, returning its ID.
pub fn insert_changelog(
    conn: &Connection,
    work_item_id: i64,
    project_id: &str,
    action: &str,
    details: &str,
    now: DateTime<Utc>,
) -> Result<i64> {
    conn.execute(
        "INSERT INTO changelog (work_item_id, project_id, action, details, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![work_item_id, project_id, action, details, timestamp(now)],
    )?;
    Ok(conn.last_insert_rowid())
}

/// A project's changelog, newest first.
pub fn list_changelog(
    conn: &Connection,
    project_id: &str,
    limit: Option<usize>,
) -> Result<Vec<ChangelogEntry>> {
    // SQLite treats a negative LIMIT as unbounded.
    let limit = limit.map(|n| n as i64).unwrap_or(-1);

    let mut stmt = conn.prepare(
        "SELECT id, work_item_id, project_id, action, details, created_at
         FROM changelog WHERE project_id = ?1
         ORDER BY created_at DESC, id DESC
         LIMIT ?2",
    )?;
    let entries = stmt
        .query_map(params![project_id, limit], row_to_changelog)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(entries)
}
