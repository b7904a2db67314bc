//! Command implementations for the tasktree CLI.
//!
//! Each command takes the repository and project it operates on and returns
//! a result that implements [`Output`], so `main` can print it as JSON or as
//! human-readable text.

use crate::config::{self, ResolvedConfig, TaskTreeConfig};
use crate::models::{
    ChangelogEntry, ItemStatus, NewWorkItem, PhaseNode, TaskNode, WorkItem,
    WorkItemPatch, WorkPlan,
};
use crate::project_id::{self, ProjectId};
use crate::repository::Repository;
use crate::search::SearchHit;
use crate::{Error, Result};
use serde::Serialize;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};

/// Command results that can be serialized to JSON or formatted for humans.
pub trait Output {
    /// Serialize to a single-line JSON string.
    fn to_json(&self) -> String;

    /// Format for human-readable output.
    fn to_human(&self) -> String;
}

fn json<T: Serialize>(value: &T) -> String {
    serde_json::to_string(value)
        .unwrap_or_else(|e| serde_json::json!({ "error": e.to_string() }).to_string())
}

fn status_marker(status: ItemStatus) -> &'static str {
    match status {
        ItemStatus::NotStarted => "[ ]",
        ItemStatus::InProgress => "[~]",
        ItemStatus::Completed => "[x]",
    }
}

/// One-line rendering: `[~] #3 task: Build login`
fn item_line(item: &WorkItem) -> String {
    format!(
        "{} #{} {}: {}",
        status_marker(item.status),
        item.id,
        item.item_type,
        item.title
    )
}

// === Project ID ===

/// Derive a project ID.
pub fn project_id(info: &str) -> Result<ProjectId> {
    project_id::generate(info)
}

impl Output for ProjectId {
    fn to_json(&self) -> String {
        json(self)
    }

    fn to_human(&self) -> String {
        format!("{}\n  from: {}", self.project_id, self.raw_value)
    }
}

// === Work Items ===

impl Output for WorkItem {
    fn to_json(&self) -> String {
        json(self)
    }

    fn to_human(&self) -> String {
        let mut out = item_line(self);
        let _ = write!(out, "\n  status: {}", self.status);
        match self.parent_id {
            Some(parent_id) => {
                let _ = write!(out, "\n  parent: #{}", parent_id);
            }
            None => out.push_str("\n  parent: (top-level)"),
        }
        let _ = write!(out, "\n  order:  {}", self.order_index);
        if let Some(description) = &self.description {
            let _ = write!(out, "\n  description: {}", description);
        }
        if let Some(notes) = &self.notes {
            let _ = write!(out, "\n  notes: {}", notes);
        }
        let _ = write!(
            out,
            "\n  created: {}\n  updated: {}",
            self.created_at.format("%Y-%m-%d %H:%M:%S"),
            self.updated_at.format("%Y-%m-%d %H:%M:%S")
        );
        out
    }
}

/// Create a work item.
pub fn create(
    repo: &mut Repository,
    project_id: &str,
    item_type: &str,
    title: &str,
    description: Option<String>,
    parent: Option<i64>,
    notes: Option<String>,
) -> Result<WorkItem> {
    let new_item = NewWorkItem {
        item_type: item_type.parse()?,
        title: title.to_string(),
        description,
        parent_id: parent,
        notes,
    };
    repo.create(project_id, new_item)
}

/// Field changes requested on the command line.
#[derive(Debug, Clone, Default)]
pub struct UpdateFields {
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<String>,
    pub item_type: Option<String>,
    pub parent: Option<i64>,
    pub top_level: bool,
    pub order_index: Option<f64>,
    /// Raw JSON patch; explicit flags take precedence over its keys
    pub patch: Option<String>,
}

impl UpdateFields {
    /// Combine the JSON patch and flags into one patch.
    pub fn into_patch(self) -> Result<WorkItemPatch> {
        let mut patch = match &self.patch {
            Some(raw) => {
                let value: serde_json::Value = serde_json::from_str(raw)
                    .map_err(|e| Error::InvalidInput(format!("Invalid --patch JSON: {}", e)))?;
                WorkItemPatch::from_json(&value)?
            }
            None => WorkItemPatch::new(),
        };

        if let Some(title) = self.title {
            patch.title = Some(title);
        }
        if let Some(description) = self.description {
            patch.description = Some(description);
        }
        if let Some(status) = self.status {
            patch.status = Some(status.parse()?);
        }
        if let Some(item_type) = self.item_type {
            patch.item_type = Some(item_type.parse()?);
        }
        if let Some(parent) = self.parent {
            patch.parent_id = Some(Some(parent));
        } else if self.top_level {
            patch.parent_id = Some(None);
        }
        if let Some(order_index) = self.order_index {
            patch.order_index = Some(order_index);
        }
        Ok(patch)
    }
}

/// Update a work item.
pub fn update(
    repo: &mut Repository,
    project_id: &str,
    id: i64,
    fields: UpdateFields,
) -> Result<WorkItem> {
    let patch = fields.into_patch()?;
    repo.update(id, project_id, &patch)
}

/// Mark a work item completed.
pub fn complete(repo: &mut Repository, project_id: &str, id: i64) -> Result<WorkItem> {
    repo.complete(id, project_id)
}

/// Show a work item.
pub fn show(repo: &Repository, project_id: &str, id: i64) -> Result<WorkItem> {
    repo.get(id, project_id)
}

#[derive(Serialize)]
pub struct ItemList {
    pub items: Vec<WorkItem>,
    pub count: usize,
}

impl Output for ItemList {
    fn to_json(&self) -> String {
        json(self)
    }

    fn to_human(&self) -> String {
        if self.items.is_empty() {
            return "No work items found.".to_string();
        }
        let mut lines = vec![format!("{} work item(s):", self.count)];
        lines.extend(self.items.iter().map(|item| format!("  {}", item_line(item))));
        lines.join("\n")
    }
}

/// List work items. No statuses and no `all` lists incomplete items.
pub fn list(repo: &Repository, project_id: &str, statuses: &[String], all: bool) -> Result<ItemList> {
    let items = if all {
        repo.list(project_id, None)?
    } else if statuses.is_empty() {
        repo.list(project_id, Some(ItemStatus::INCOMPLETE.as_slice()))?
    } else {
        let parsed = statuses
            .iter()
            .map(|s| s.parse())
            .collect::<Result<Vec<ItemStatus>>>()?;
        repo.list(project_id, Some(parsed.as_slice()))?
    };

    Ok(ItemList {
        count: items.len(),
        items,
    })
}

// === Work Plan ===

impl Output for WorkPlan {
    fn to_json(&self) -> String {
        json(self)
    }

    fn to_human(&self) -> String {
        if self.is_empty() {
            return "No open work.".to_string();
        }

        let mut out = String::new();
        for project in &self.projects {
            let _ = writeln!(out, "{}", item_line(&project.item));
            for phase in &project.phases {
                render_phase(&mut out, phase);
            }
            for task in &project.direct_tasks {
                render_task(&mut out, task, 1);
            }
        }

        if !self.orphaned_items.is_empty() {
            let _ = writeln!(out, "Orphaned items:");
            for item in &self.orphaned_items {
                let _ = writeln!(out, "  {}", item_line(item));
            }
        }
        out.trim_end().to_string()
    }
}

fn render_phase(out: &mut String, phase: &PhaseNode) {
    let _ = write!(out, "  {}", item_line(&phase.item));
    if let Some(summary) = &phase.completion_summary {
        let _ = write!(out, "  ({})", summary);
    }
    out.push('\n');
    for task in &phase.tasks {
        render_task(out, task, 2);
    }
}

fn render_task(out: &mut String, task: &TaskNode, depth: usize) {
    let indent = "  ".repeat(depth);
    let _ = write!(out, "{}{}", indent, item_line(&task.item));
    if let Some(summary) = &task.completion_summary {
        let _ = write!(out, "  ({})", summary);
    }
    out.push('\n');
    for subtask in &task.subtasks {
        let _ = writeln!(out, "{}  {}", indent, item_line(subtask));
    }
}

/// Build the rolling work plan.
pub fn plan(repo: &mut Repository, project_id: &str) -> Result<WorkPlan> {
    repo.work_plan(project_id)
}

// === Search ===

#[derive(Serialize)]
pub struct SearchResults {
    pub query: String,
    pub results: Vec<SearchHit>,
    pub count: usize,
}

impl Output for SearchResults {
    fn to_json(&self) -> String {
        json(self)
    }

    fn to_human(&self) -> String {
        if self.results.is_empty() {
            return format!("No matches for '{}'.", self.query);
        }
        let mut lines = vec![format!("{} match(es) for '{}':", self.count, self.query)];
        for hit in &self.results {
            lines.push(format!("  {}", item_line(&hit.item)));
            lines.push(format!("      {}", hit.breadcrumb_path));
        }
        lines.join("\n")
    }
}

/// Search with breadcrumbs.
pub fn search(repo: &mut Repository, project_id: &str, query: &str) -> Result<SearchResults> {
    let results = repo.search_with_context(project_id, query)?;
    Ok(SearchResults {
        query: query.trim().to_string(),
        count: results.len(),
        results,
    })
}

// === Changelog ===

#[derive(Serialize)]
pub struct ChangelogList {
    pub entries: Vec<ChangelogEntry>,
    pub count: usize,
}

impl Output for ChangelogList {
    fn to_json(&self) -> String {
        json(self)
    }

    fn to_human(&self) -> String {
        if self.entries.is_empty() {
            return "No changelog entries.".to_string();
        }
        self.entries
            .iter()
            .map(|entry| {
                format!(
                    "{} #{} {}: {}",
                    entry.created_at.format("%Y-%m-%d %H:%M:%S"),
                    entry.work_item_id,
                    entry.action,
                    entry.details
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Show the changelog. `limit` falls back to the configured default.
pub fn log(
    repo: &Repository,
    project_id: &str,
    limit: Option<usize>,
    default_limit: Option<usize>,
) -> Result<ChangelogList> {
    let entries = repo.changelog(project_id, limit.or(default_limit))?;
    Ok(ChangelogList {
        count: entries.len(),
        entries,
    })
}

// === Config ===

#[derive(Serialize)]
pub struct ConfigValue {
    pub key: String,
    pub value: Option<String>,
    pub source: String,
}

#[derive(Serialize)]
pub struct ConfigShow {
    pub data_dir: PathBuf,
    pub config_file: PathBuf,
    pub values: Vec<ConfigValue>,
}

impl Output for ConfigShow {
    fn to_json(&self) -> String {
        json(self)
    }

    fn to_human(&self) -> String {
        let mut lines = vec![
            format!("data dir:    {}", self.data_dir.display()),
            format!("config file: {}", self.config_file.display()),
        ];
        for value in &self.values {
            lines.push(format!(
                "{} = {} ({})",
                value.key,
                value.value.as_deref().unwrap_or("(unset)"),
                value.source
            ));
        }
        lines.join("\n")
    }
}

/// Show every resolved config value with its source.
pub fn config_show(data_dir: &Path, resolved: &ResolvedConfig) -> ConfigShow {
    let unset = |key: &str| ConfigValue {
        key: key.to_string(),
        value: None,
        source: "default".to_string(),
    };

    let values = vec![
        ConfigValue {
            key: "database-path".to_string(),
            value: Some(resolved.database_path().display().to_string()),
            source: resolved.database_path.source.to_string(),
        },
        ConfigValue {
            key: "output-format".to_string(),
            value: Some(resolved.output_format().to_string()),
            source: resolved.output_format.source.to_string(),
        },
        resolved
            .changelog_limit
            .as_ref()
            .map(|r| ConfigValue {
                key: "changelog-limit".to_string(),
                value: Some(r.value.to_string()),
                source: r.source.to_string(),
            })
            .unwrap_or_else(|| unset("changelog-limit")),
        resolved
            .log_level
            .as_ref()
            .map(|r| ConfigValue {
                key: "log-level".to_string(),
                value: Some(r.value.clone()),
                source: r.source.to_string(),
            })
            .unwrap_or_else(|| unset("log-level")),
    ];

    ConfigShow {
        data_dir: data_dir.to_path_buf(),
        config_file: config::config_path(data_dir),
        values,
    }
}

#[derive(Serialize)]
pub struct ConfigSet {
    pub key: String,
    pub value: String,
    pub config_file: PathBuf,
}

impl Output for ConfigSet {
    fn to_json(&self) -> String {
        json(self)
    }

    fn to_human(&self) -> String {
        format!("Set {} = {} in {}", self.key, self.value, self.config_file.display())
    }
}

/// Set one key in config.kdl.
pub fn config_set(data_dir: &Path, key: &str, value: &str) -> Result<ConfigSet> {
    let path = config::config_path(data_dir);
    let mut file_config: TaskTreeConfig = config::load(&path)?;
    file_config.set(key, value)?;
    config::save(&path, &file_config)?;

    Ok(ConfigSet {
        key: key.to_string(),
        value: value.to_string(),
        config_file: path,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{PROJECT, chain, repo};

    #[test]
    fn test_update_fields_flags_override_patch() {
        let fields = UpdateFields {
            title: Some("From flag".to_string()),
            patch: Some(r#"{"title": "From patch", "order_index": 2}"#.to_string()),
            ..Default::default()
        };
        let patch = fields.into_patch().unwrap();
        assert_eq!(patch.title.as_deref(), Some("From flag"));
        assert_eq!(patch.order_index, Some(2.0));
    }

    #[test]
    fn test_update_fields_top_level() {
        let fields = UpdateFields {
            top_level: true,
            ..Default::default()
        };
        assert_eq!(fields.into_patch().unwrap().parent_id, Some(None));
    }

    #[test]
    fn test_update_fields_bad_json() {
        let fields = UpdateFields {
            patch: Some("{title".to_string()),
            ..Default::default()
        };
        assert!(matches!(fields.into_patch(), Err(Error::InvalidInput(_))));
    }

    #[test]
    fn test_create_rejects_unknown_type() {
        let mut repo = repo();
        let err = create(&mut repo, PROJECT, "epic", "x", None, None, None).unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn test_list_filters() {
        let mut repo = repo();
        let chain = chain(&mut repo);
        complete(&mut repo, PROJECT, chain.subtask.id).unwrap();

        assert_eq!(list(&repo, PROJECT, &[], false).unwrap().count, 3);
        assert_eq!(list(&repo, PROJECT, &[], true).unwrap().count, 4);
        let done = list(&repo, PROJECT, &["completed".to_string()], false).unwrap();
        assert_eq!(done.items[0].id, chain.subtask.id);
        assert!(list(&repo, PROJECT, &["finished".to_string()], false).is_err());
    }

    #[test]
    fn test_plan_human_output() {
        let mut repo = repo();
        let chain = chain(&mut repo);
        complete(&mut repo, PROJECT, chain.subtask.id).unwrap();

        let text = plan(&mut repo, PROJECT).unwrap().to_human();
        assert!(text.contains("project: Test Project"));
        assert!(text.contains("task: Task 1  (✓ All 1 subtasks completed)"));
        assert!(!text.contains("Subtask 1.1"));
    }

    #[test]
    fn test_empty_outputs() {
        let mut repo = repo();
        assert_eq!(plan(&mut repo, PROJECT).unwrap().to_human(), "No open work.");
        assert_eq!(plan(&mut repo, PROJECT).unwrap().to_json(), r#"{"projects":[],"orphaned_items":[]}"#);
        assert_eq!(log(&repo, PROJECT, None, None).unwrap().to_human(), "No changelog entries.");
    }

    #[test]
    fn test_log_uses_default_limit() {
        let mut repo = repo();
        chain(&mut repo);

        assert_eq!(log(&repo, PROJECT, None, Some(2)).unwrap().count, 2);
        assert_eq!(log(&repo, PROJECT, Some(3), Some(2)).unwrap().count, 3);
        assert_eq!(log(&repo, PROJECT, Some(0), Some(2)).unwrap().count, 4);
    }

    #[test]
    fn test_search_output() {
        let mut repo = repo();
        chain(&mut repo);

        let results = search(&mut repo, PROJECT, "phase").unwrap();
        assert_eq!(results.count, 1);
        assert!(results.to_human().contains("Test Project > Phase 1"));
    }
}
