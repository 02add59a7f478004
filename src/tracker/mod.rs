//! Issue tracker interface and its adapters.
//!
//! The sync engine only talks to [`IssueTracker`]. Adapters:
//! - [`GhCliTracker`]: runs the `gh` command-line tool
//! - [`GitHubApiTracker`]: calls the GitHub REST API with `reqwest`
//! - [`InMemoryTracker`]: in-process fake that records every call

mod gh_cli;
mod github;
mod memory;

pub use gh_cli::GhCliTracker;
pub use github::GitHubApiTracker;
pub use memory::{InMemoryTracker, TrackerCall};

use async_trait::async_trait;

use crate::error::TrackerError;
use crate::models::{LabelSpec, Milestone, NewIssue};

/// Kinds of tracker entity that are checked by name before creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    /// Project board, matched by exact title.
    Board,
    /// Label, matched by exact name.
    Label,
    /// Issue, matched when its title carries `[<task id>]`.
    Issue,
}

/// The collaborator surface the sync engine needs from an issue tracker.
#[async_trait]
pub trait IssueTracker: Send + Sync {
    /// Whether an entity of `kind` named `name` already exists.
    async fn exists(&self, kind: EntityKind, name: &str) -> Result<bool, TrackerError>;

    async fn create_board(&self, title: &str) -> Result<(), TrackerError>;

    async fn create_label(&self, label: &LabelSpec) -> Result<(), TrackerError>;

    /// Milestone whose title equals `title`, if any.
    async fn find_milestone(&self, title: &str) -> Result<Option<Milestone>, TrackerError>;

    async fn create_milestone(
        &self,
        title: &str,
        description: &str,
    ) -> Result<Milestone, TrackerError>;

    async fn create_issue(&self, issue: &NewIssue) -> Result<(), TrackerError>;
}

/// Whether an issue title belongs to the task `task_id`.
///
/// Issue titles look like `[TS-042] Tune friction`; matching on the bracketed
/// id keeps `TS-04` from matching `TS-042`.
pub fn title_mentions(title: &str, task_id: &str) -> bool {
    title.contains(&format!("[{}]", task_id))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn title_mentions_matches_bracketed_id_only() {
        assert!(title_mentions("[TS-042] Tune friction", "TS-042"));
        assert!(!title_mentions("[TS-042] Tune friction", "TS-04"));
        assert!(!title_mentions("TS-042 without brackets", "TS-042"));
    }
}
