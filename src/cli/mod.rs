//! CLI argument definitions for tasktree.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Tasktree - A hierarchical work plan tracker for AI agents and humans.
///
/// Items form a project → phase → task → subtask tree. Start with
/// `tt project-id <path>` to get an ID, then `tt create project <title>`.
#[derive(Parser, Debug)]
#[command(name = "tt")]
#[command(author, version, about = "Track a project's work as a project → phase → task → subtask tree", long_about = None)]
pub struct Cli {
    /// Output in human-readable format instead of JSON
    #[arg(short = 'H', long = "human", global = true)]
    pub human_readable: bool,

    /// Enable debug logging on stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// SQLite database file (overrides TT_DB and config.kdl)
    #[arg(long, global = true)]
    pub db: Option<PathBuf>,

    /// Project ID to operate on (see `tt project-id`)
    #[arg(short, long, global = true, env = "TT_PROJECT")]
    pub project: Option<String>,

    /// Derive the project ID from this value (git remote URL or absolute path)
    #[arg(long, global = true, env = "TT_PROJECT_INFO")]
    pub project_info: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Derive a project ID from a git remote URL or absolute path
    ProjectId {
        /// Value identifying the project
        info: String,
    },

    /// Create a work item
    Create {
        /// Item type: project, phase, task or subtask
        item_type: String,

        /// Item title
        title: String,

        /// Item description
        #[arg(short, long)]
        description: Option<String>,

        /// Parent item ID (required for everything except projects)
        #[arg(long)]
        parent: Option<i64>,

        /// Free-form notes
        #[arg(long)]
        notes: Option<String>,
    },

    /// Update fields of a work item
    Update {
        /// Item ID
        id: i64,

        /// New title
        #[arg(long)]
        title: Option<String>,

        /// New description
        #[arg(long)]
        description: Option<String>,

        /// New status: not_started, in_progress or completed
        #[arg(long)]
        status: Option<String>,

        /// New item type
        #[arg(long = "type")]
        item_type: Option<String>,

        /// Move under this parent
        #[arg(long, conflicts_with = "top_level")]
        parent: Option<i64>,

        /// Move to the top level (projects only)
        #[arg(long)]
        top_level: bool,

        /// New position among siblings
        #[arg(long)]
        order_index: Option<f64>,

        /// Raw JSON object of fields to update, merged under the flags above
        #[arg(long)]
        patch: Option<String>,
    },

    /// Mark a work item completed
    Complete {
        /// Item ID
        id: i64,
    },

    /// Show a work item
    Show {
        /// Item ID
        id: i64,
    },

    /// List work items (incomplete only by default)
    List {
        /// Only items with this status (repeatable)
        #[arg(short, long)]
        status: Vec<String>,

        /// Include completed items
        #[arg(long, conflicts_with = "status")]
        all: bool,
    },

    /// Show the rolling work plan
    Plan,

    /// Search titles and descriptions
    Search {
        /// Text to search for (case-insensitive)
        query: String,
    },

    /// Show the changelog, newest first
    Log {
        /// Maximum number of entries (0 for all)
        #[arg(short = 'n', long)]
        limit: Option<usize>,
    },

    /// Configuration management
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

/// Configuration subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show resolved configuration values and where they came from
    Show,

    /// Set a value in config.kdl
    Set {
        /// Key: database-path, output-format, changelog-limit or log-level
        key: String,

        /// New value
        value: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_create() {
        let cli = Cli::parse_from([
            "tt", "-p", "cA==", "create", "task", "Login", "--parent", "3", "-d", "OAuth",
        ]);
        assert_eq!(cli.project.as_deref(), Some("cA=="));
        match cli.command {
            Commands::Create {
                item_type,
                title,
                parent,
                description,
                ..
            } => {
                assert_eq!(item_type, "task");
                assert_eq!(title, "Login");
                assert_eq!(parent, Some(3));
                assert_eq!(description.as_deref(), Some("OAuth"));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_parent_conflicts_with_top_level() {
        let result = Cli::try_parse_from(["tt", "update", "1", "--parent", "2", "--top-level"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::parse_from(["tt", "plan", "-H", "--db", "/tmp/x.db"]);
        assert!(cli.human_readable);
        assert_eq!(cli.db, Some(PathBuf::from("/tmp/x.db")));
    }
}
