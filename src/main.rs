//! Tasktree CLI - A hierarchical work plan tracker for AI agents and humans.

use clap::Parser;
use std::path::Path;
use std::process;
use tasktree::cli::{Cli, Commands, ConfigCommands};
use tasktree::commands::{self, Output, UpdateFields};
use tasktree::config::{self, ConfigOverrides, OutputFormat, ResolvedConfig};
use tasktree::project_id;
use tasktree::repository::Repository;
use tasktree::storage::Store;
use tasktree::{Error, Result};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

fn main() {
    let cli = Cli::parse();
    let mut human = cli.human_readable;

    if let Err(e) = run(cli, &mut human) {
        if human {
            eprintln!("Error: {}", e);
        } else {
            eprintln!(
                "{}",
                serde_json::json!({ "error": e.to_string(), "kind": e.kind() })
            );
        }
        process::exit(1);
    }
}

/// Resolve configuration, set up logging, then run the command.
///
/// `human` is updated once the output format is known so errors are reported
/// in the same format as results.
fn run(cli: Cli, human: &mut bool) -> Result<()> {
    let data_dir = config::data_dir()?;
    let file_config = config::load(&config::config_path(&data_dir))?;

    let mut overrides = ConfigOverrides::new();
    if let Some(db) = &cli.db {
        overrides = overrides.with_database_path(db);
    }
    if cli.human_readable {
        overrides = overrides.with_output_format(OutputFormat::Human);
    }
    let resolved = config::resolve_config(&data_dir, &file_config, &overrides);
    *human = resolved.output_format() == OutputFormat::Human;

    init_logging(cli.verbose, resolved.log_level());
    tracing::debug!(
        "Using database {} ({})",
        resolved.database_path().display(),
        resolved.database_path.source
    );

    run_command(cli, &data_dir, &resolved, *human)
}

/// Install the stderr subscriber.
///
/// Filter precedence: `RUST_LOG` > `--verbose` > configured `log-level` > `warn`.
fn init_logging(verbose: bool, configured: Option<&str>) {
    let filter = if std::env::var_os("RUST_LOG").is_some() {
        EnvFilter::from_default_env()
    } else if verbose {
        EnvFilter::new("debug")
    } else {
        configured
            .and_then(|level| EnvFilter::try_new(level).ok())
            .unwrap_or_else(|| EnvFilter::new("warn"))
    };

    // Keep an already installed global subscriber rather than failing.
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .with(filter)
        .try_init()
        .ok();
}

fn run_command(cli: Cli, data_dir: &Path, resolved: &ResolvedConfig, human: bool) -> Result<()> {
    let Cli {
        command,
        project,
        project_info,
        ..
    } = cli;

    // Opened only by commands that work on items.
    let open = || -> Result<(Repository, String)> {
        let project_id = resolve_project(project.as_deref(), project_info.as_deref())?;
        let store = Store::open(resolved.database_path())?;
        Ok((Repository::new(store), project_id))
    };

    match command {
        Commands::ProjectId { info } => output(&commands::project_id(&info)?, human),

        Commands::Create {
            item_type,
            title,
            description,
            parent,
            notes,
        } => {
            let (mut repo, project_id) = open()?;
            let item = commands::create(
                &mut repo,
                &project_id,
                &item_type,
                &title,
                description,
                parent,
                notes,
            )?;
            output(&item, human);
        }

        Commands::Update {
            id,
            title,
            description,
            status,
            item_type,
            parent,
            top_level,
            order_index,
            patch,
        } => {
            let (mut repo, project_id) = open()?;
            let fields = UpdateFields {
                title,
                description,
                status,
                item_type,
                parent,
                top_level,
                order_index,
                patch,
            };
            output(&commands::update(&mut repo, &project_id, id, fields)?, human);
        }

        Commands::Complete { id } => {
            let (mut repo, project_id) = open()?;
            output(&commands::complete(&mut repo, &project_id, id)?, human);
        }

        Commands::Show { id } => {
            let (repo, project_id) = open()?;
            output(&commands::show(&repo, &project_id, id)?, human);
        }

        Commands::List { status, all } => {
            let (repo, project_id) = open()?;
            output(&commands::list(&repo, &project_id, &status, all)?, human);
        }

        Commands::Plan => {
            let (mut repo, project_id) = open()?;
            output(&commands::plan(&mut repo, &project_id)?, human);
        }

        Commands::Search { query } => {
            let (mut repo, project_id) = open()?;
            output(&commands::search(&mut repo, &project_id, &query)?, human);
        }

        Commands::Log { limit } => {
            let (repo, project_id) = open()?;
            let entries = commands::log(&repo, &project_id, limit, resolved.changelog_limit())?;
            output(&entries, human);
        }

        Commands::Config { command } => match command {
            ConfigCommands::Show => output(&commands::config_show(data_dir, resolved), human),
            ConfigCommands::Set { key, value } => {
                output(&commands::config_set(data_dir, &key, &value)?, human)
            }
        },
    }

    Ok(())
}

/// Pick the project: an explicit ID wins over one derived from project info.
fn resolve_project(project: Option<&str>, project_info: Option<&str>) -> Result<String> {
    if let Some(project) = project.filter(|p| !p.trim().is_empty()) {
        if let Some(raw) = project_id::decode(project) {
            tracing::debug!("Using project {} ({})", project, raw);
        }
        return Ok(project.to_string());
    }
    if let Some(info) = project_info {
        return Ok(project_id::generate(info)?.project_id);
    }
    Err(Error::InvalidInput(
        "No project specified. Pass --project <ID> or --project-info <INFO> \
         (or set TT_PROJECT / TT_PROJECT_INFO)"
            .to_string(),
    ))
}

/// Print output in JSON or human-readable format.
fn output<T: Output>(result: &T, human: bool) {
    if human {
        println!("{}", result.to_human());
    } else {
        println!("{}", result.to_json());
    }
}
