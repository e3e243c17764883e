//! `articles` command-line entry point.
//!
//! # Responsibility
//! - Expose every article store operation as a subcommand.
//! - Print results as JSON on stdout and failures as a JSON envelope on
//!   stderr, carrying the REST status code of the failure kind.

use anyhow::Result;
use article_core::{default_log_level, init_logging, LogTarget};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;

mod commands;
mod output;

use commands::{UpdateArgs, Workspace};

/// Manage articles stored in a SQLite database.
#[derive(Parser, Debug)]
#[command(name = "articles", author, version, about)]
struct Cli {
    /// Connection string, e.g. `sqlite://articles.db` or `sqlite::memory:`.
    #[arg(long, env = "DATABASE_URL", global = true)]
    database_url: Option<String>,

    /// Enables logging at this level (trace|debug|info|warn|error).
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Writes rotating log files into this absolute directory instead of stderr.
    #[arg(long, global = true)]
    log_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Create an article (draft unless --published).
    Create {
        #[arg(long)]
        title: String,
        #[arg(long)]
        body: String,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        published: bool,
    },
    /// List published articles, or drafts with --drafts.
    List {
        #[arg(long)]
        drafts: bool,
    },
    /// Show one article.
    Get { id: i64 },
    /// Apply a partial update.
    Update(UpdateArgs),
    /// Delete an article and print the removed record.
    Delete { id: i64 },
    /// Insert the sample articles that are not present yet.
    Seed,
    /// Apply pending schema migrations and print the schema version.
    Migrate,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(message) = start_logging(&cli) {
        return output::print_failure(&anyhow::anyhow!(message));
    }

    match run(cli) {
        Ok(value) => output::print_success(&value),
        Err(err) => output::print_failure(&err),
    }
}

fn start_logging(cli: &Cli) -> Result<(), String> {
    match (&cli.log_level, &cli.log_dir) {
        (None, None) => Ok(()),
        (level, Some(dir)) => init_logging(
            level.as_deref().unwrap_or(default_log_level()),
            LogTarget::Directory(dir.clone()),
        ),
        (Some(level), None) => init_logging(level, LogTarget::Stderr),
    }
}

fn run(cli: Cli) -> Result<serde_json::Value> {
    let mut workspace = Workspace::open(cli.database_url.as_deref())?;

    match cli.command {
        Commands::Create {
            title,
            body,
            description,
            published,
        } => workspace.create(title, body, description, published),
        Commands::List { drafts } => workspace.list(drafts),
        Commands::Get { id } => workspace.get(id),
        Commands::Update(args) => workspace.update(args),
        Commands::Delete { id } => workspace.delete(id),
        Commands::Seed => workspace.seed(),
        Commands::Migrate => workspace.migrate(),
    }
}
