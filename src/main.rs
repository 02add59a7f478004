use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use backlog_sync::config::{Adapter, ApiConfig, RepoRef, DEFAULT_PROJECT_NAME};
use backlog_sync::parser::{self, DEFAULT_BACKLOG_FILE};
use backlog_sync::sync::{self, RunOptions, SyncEngine};
use backlog_sync::tracker::{GhCliTracker, GitHubApiTracker, IssueTracker};

#[derive(Parser)]
#[command(name = "backlog-sync")]
#[command(about = "Create GitHub milestones, labels and issues from BACKLOG.md")]
struct Cli {
    /// Run in debug mode (only process a few tasks)
    #[arg(long)]
    debug: bool,

    /// Dry run (do not create issues)
    #[arg(long)]
    dry_run: bool,

    /// Backlog document to read
    #[arg(short, long, default_value = DEFAULT_BACKLOG_FILE)]
    file: PathBuf,

    /// How to talk to GitHub
    #[arg(long, value_enum, default_value_t = Adapter::Gh)]
    adapter: Adapter,

    /// Target repository as owner/name (defaults to GITHUB_REPOSITORY for the api adapter)
    #[arg(long)]
    repo: Option<String>,

    /// Project board title
    #[arg(long, default_value = DEFAULT_PROJECT_NAME)]
    project: String,

    /// Owner of the project board for the gh adapter (user, org, or @me)
    #[arg(long, default_value = "@me")]
    project_owner: String,
}

/// Initialize tracing with output to stdout.
fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG").unwrap_or_else(|_| "backlog_sync=info".into()),
    );

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();
}

fn build_tracker(cli: &Cli) -> anyhow::Result<Arc<dyn IssueTracker>> {
    match cli.adapter {
        Adapter::Api => {
            let config = ApiConfig::from_env(cli.repo.as_deref())?;
            tracing::debug!(?config, "Using GitHub REST adapter");
            Ok(Arc::new(GitHubApiTracker::new(config)))
        }
        Adapter::Gh => {
            let mut gh = GhCliTracker::new().with_project_owner(cli.project_owner.as_str());
            if let Some(ref repo) = cli.repo {
                gh = gh.with_repo(repo.parse::<RepoRef>()?);
            }
            Ok(Arc::new(gh))
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing();

    // Credentials and repository are checked before any tracker work.
    let tracker = build_tracker(&cli)?;

    if cli.dry_run {
        tracing::info!("Running in DRY RUN mode - no issues will be created");
    }
    if cli.debug {
        tracing::info!("Running in DEBUG mode - only processing a few tasks");
    }

    tracing::info!("Starting GitHub issue creation from {}...", cli.file.display());

    let content = parser::read_backlog_file(&cli.file)
        .with_context(|| format!("Cannot load backlog from {}", cli.file.display()))?;
    let backlog = parser::parse_backlog(&content);

    let engine = SyncEngine::new(tracker, cli.dry_run);
    let options = RunOptions::new(cli.project.clone()).with_debug(cli.debug);
    let report = sync::run(&engine, &backlog, &options).await;

    tracing::info!(
        milestones = report.milestones_processed,
        issues_created = report.issues_created,
        issues_failed = report.issues_failed,
        "Completed GitHub issue creation from {}",
        cli.file.display()
    );

    Ok(())
}
