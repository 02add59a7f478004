//! Runs a whole backlog through the sync engine, one call at a time.

use std::time::Duration;

use tracing::{info, warn};

use super::{Outcome, SyncEngine};
use crate::models::Backlog;

/// Pause after each issue to stay under the tracker's rate limit.
pub const DEFAULT_DELAY: Duration = Duration::from_secs(1);

/// Tasks processed per milestone in debug mode.
pub const DEBUG_TASK_LIMIT: usize = 2;

/// Options that only affect the driver.
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Project board title.
    pub project_name: String,
    /// Stop after the first milestone and its first [`DEBUG_TASK_LIMIT`] tasks.
    pub debug: bool,
    pub delay: Duration,
}

impl RunOptions {
    pub fn new(project_name: impl Into<String>) -> Self {
        Self {
            project_name: project_name.into(),
            debug: false,
            delay: DEFAULT_DELAY,
        }
    }

    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

/// Counts of what a run did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunReport {
    pub milestones_processed: usize,
    pub milestones_failed: usize,
    pub issues_created: usize,
    pub issues_existing: usize,
    pub issues_failed: usize,
    /// Issues reported in dry-run mode.
    pub issues_planned: usize,
}

/// Sync `backlog`: board, then labels, then each milestone and its issues.
pub async fn run(engine: &SyncEngine, backlog: &Backlog, options: &RunOptions) -> RunReport {
    let mut report = RunReport::default();

    engine.ensure_project_board(&options.project_name).await;
    engine.ensure_labels(backlog).await;

    for (milestone_id, record) in backlog {
        info!("Processing milestone: {} - {}", milestone_id, record.name);
        report.milestones_processed += 1;

        let outcome = engine.ensure_milestone(record).await;
        if outcome.is_success() {
            let milestone = outcome.into_value();

            for (i, task) in record.tasks.iter().enumerate() {
                match engine.ensure_issue(task, &record.name, milestone.as_ref()).await {
                    Outcome::Created(()) => report.issues_created += 1,
                    Outcome::Existing(()) => report.issues_existing += 1,
                    Outcome::DryRun => report.issues_planned += 1,
                    Outcome::Failed => report.issues_failed += 1,
                }
                tokio::time::sleep(options.delay).await;

                if options.debug && i + 1 >= DEBUG_TASK_LIMIT {
                    info!(
                        "Debug mode: Stopping after processing {} tasks in {}",
                        DEBUG_TASK_LIMIT, milestone_id
                    );
                    break;
                }
            }
        } else {
            warn!(milestone = %milestone_id, "Skipping tasks of milestone that could not be ensured");
            report.milestones_failed += 1;
        }

        if options.debug {
            info!("Debug mode: Stopping after processing first milestone");
            break;
        }
    }

    report
}
