//! Idempotent sync of parsed backlog records into an issue tracker.
//!
//! Every `ensure_*` operation checks the tracker before creating and never
//! returns an error: failures are logged and reported as
//! [`Outcome::Failed`]. In dry-run mode the tracker is not called at all.

mod driver;

pub use driver::{run, RunOptions, RunReport, DEBUG_TASK_LIMIT, DEFAULT_DELAY};

use std::sync::Arc;

use tracing::{error, info};

use crate::models::*;
use crate::tracker::{EntityKind, IssueTracker};

/// Acceptance checklist appended to every issue body.
const ACCEPTANCE_CRITERIA: [&str; 4] = [
    "Implementation complete",
    "Tests added/updated",
    "Documentation updated",
    "Code review completed",
];

/// Result of one ensure operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome<T = ()> {
    /// The entity was created.
    Created(T),
    /// A matching entity was already there; nothing was changed.
    Existing(T),
    /// Dry run: nothing was checked or created.
    DryRun,
    /// The check or the create call failed.
    Failed,
}

impl<T> Outcome<T> {
    pub fn is_success(&self) -> bool {
        !matches!(self, Self::Failed)
    }

    /// The created or existing entity, if there is one.
    pub fn into_value(self) -> Option<T> {
        match self {
            Self::Created(v) | Self::Existing(v) => Some(v),
            Self::DryRun | Self::Failed => None,
        }
    }
}

/// Creates board, labels, milestones and issues if they are absent.
#[derive(Clone)]
pub struct SyncEngine {
    tracker: Arc<dyn IssueTracker>,
    dry_run: bool,
}

impl SyncEngine {
    pub fn new(tracker: Arc<dyn IssueTracker>, dry_run: bool) -> Self {
        Self { tracker, dry_run }
    }

    /// Ensure a project board titled `name` exists.
    pub async fn ensure_project_board(&self, name: &str) -> Outcome {
        if self.dry_run {
            info!("[DRY RUN] Would create project: {}", name);
            return Outcome::DryRun;
        }

        match self.tracker.exists(EntityKind::Board, name).await {
            Ok(true) => {
                info!("Project '{}' already exists.", name);
                return Outcome::Existing(());
            }
            Ok(false) => {}
            Err(e) => {
                error!(project = %name, error = %e, "Error checking project");
                return Outcome::Failed;
            }
        }

        match self.tracker.create_board(name).await {
            Ok(()) => {
                info!("Created project: {}", name);
                Outcome::Created(())
            }
            Err(e) => {
                error!(project = %name, error = %e, "Failed to create project");
                Outcome::Failed
            }
        }
    }

    /// Ensure one label exists.
    pub async fn ensure_label(&self, label: &LabelSpec) -> Outcome {
        if self.dry_run {
            info!("[DRY RUN] Would create label: {}", label.name);
            return Outcome::DryRun;
        }

        match self.tracker.exists(EntityKind::Label, &label.name).await {
            Ok(true) => {
                info!("Label {} already exists", label.name);
                return Outcome::Existing(());
            }
            Ok(false) => {}
            Err(e) => {
                error!(label = %label.name, error = %e, "Error checking label");
                return Outcome::Failed;
            }
        }

        match self.tracker.create_label(label).await {
            Ok(()) => {
                info!("Created label: {}", label.name);
                Outcome::Created(())
            }
            Err(e) => {
                error!(label = %label.name, error = %e, "Failed to create label");
                Outcome::Failed
            }
        }
    }

    /// Ensure the milestone, priority and status labels exist.
    ///
    /// Each label is checked on its own. Returns `true` when every label
    /// exists afterwards.
    pub async fn ensure_labels(&self, backlog: &Backlog) -> bool {
        if self.dry_run {
            info!("[DRY RUN] Would create milestone, priority, and status labels");
            return true;
        }

        let mut all_ok = true;
        for label in label_specs(backlog) {
            if !self.ensure_label(&label).await.is_success() {
                all_ok = false;
            }
        }
        all_ok
    }

    /// Ensure a tracker milestone titled after `record` exists.
    pub async fn ensure_milestone(&self, record: &MilestoneRecord) -> Outcome<Milestone> {
        if self.dry_run {
            info!("[DRY RUN] Would create milestone: {}", record.name);
            return Outcome::DryRun;
        }

        match self.tracker.find_milestone(&record.name).await {
            Ok(Some(existing)) => {
                info!("Milestone '{}' already exists, skipping creation.", record.name);
                return Outcome::Existing(existing);
            }
            Ok(None) => {}
            Err(e) => {
                error!(milestone = %record.name, error = %e, "Error checking milestone");
                return Outcome::Failed;
            }
        }

        match self
            .tracker
            .create_milestone(&record.name, &record.description())
            .await
        {
            Ok(created) => {
                info!("Created milestone: {}", record.name);
                Outcome::Created(created)
            }
            Err(e) => {
                error!(milestone = %record.name, error = %e, "Failed to create milestone");
                Outcome::Failed
            }
        }
    }

    /// Ensure an issue exists for `task`.
    ///
    /// `milestone` is attached on creation when given; `milestone_name` only
    /// feeds the issue body.
    pub async fn ensure_issue(
        &self,
        task: &TaskRecord,
        milestone_name: &str,
        milestone: Option<&Milestone>,
    ) -> Outcome {
        let title = task.issue_title();

        if self.dry_run {
            info!("[DRY RUN] Would create issue: {}", title);
            return Outcome::DryRun;
        }

        match self.tracker.exists(EntityKind::Issue, &task.id).await {
            Ok(true) => {
                info!("Issue {} already exists, skipping creation.", task.id);
                return Outcome::Existing(());
            }
            Ok(false) => {}
            Err(e) => {
                error!(task = %task.id, error = %e, "Error checking issue");
                return Outcome::Failed;
            }
        }

        let issue = NewIssue {
            title,
            body: issue_body(task, milestone_name),
            milestone: milestone.cloned(),
            labels: issue_labels(task),
        };

        match self.tracker.create_issue(&issue).await {
            Ok(()) => {
                info!("Created issue: {}", issue.title);
                Outcome::Created(())
            }
            Err(e) => {
                error!(issue = %issue.title, error = %e, "Failed to create issue");
                Outcome::Failed
            }
        }
    }
}

/// Labels for a backlog: one per milestone, then the priority levels, then
/// the status levels.
pub fn label_specs(backlog: &Backlog) -> Vec<LabelSpec> {
    let milestones = backlog.keys().map(|id| LabelSpec::milestone(id));
    let priorities = PRIORITY_LEVELS
        .iter()
        .map(|(level, color)| LabelSpec::priority(level, color));
    let statuses = STATUS_LEVELS
        .iter()
        .map(|(level, color)| LabelSpec::status(level, color));

    milestones.chain(priorities).chain(statuses).collect()
}

/// Labels put on a task's issue. The status label is left off for the
/// default `backlog` status.
pub fn issue_labels(task: &TaskRecord) -> Vec<String> {
    let mut labels = vec![milestone_label(&task.milestone), priority_label(&task.priority)];
    if !task.is_default_status() {
        labels.push(status_label(&task.status));
    }
    labels
}

/// Markdown body for a task's issue.
pub fn issue_body(task: &TaskRecord, milestone_name: &str) -> String {
    let checklist: String = ACCEPTANCE_CRITERIA
        .iter()
        .map(|item| format!("- [ ] {}\n", item))
        .collect();

    format!(
        "\n## Description\n{}\n\n## Priority\n{}\n\n## Acceptance Criteria\n{}\n## Related Tasks\n- Milestone: {}\n",
        task.description, task.priority, checklist, milestone_name
    )
}
