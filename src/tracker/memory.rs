//! In-memory tracker for tests and offline runs.

use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;

use super::{title_mentions, EntityKind, IssueTracker};
use crate::error::TrackerError;
use crate::models::{LabelSpec, Milestone, NewIssue};

/// A call received by [`InMemoryTracker`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrackerCall {
    Exists(EntityKind, String),
    CreateBoard(String),
    CreateLabel(String),
    FindMilestone(String),
    CreateMilestone(String),
    CreateIssue(String),
}

impl TrackerCall {
    pub fn is_create(&self) -> bool {
        matches!(
            self,
            Self::CreateBoard(_)
                | Self::CreateLabel(_)
                | Self::CreateMilestone(_)
                | Self::CreateIssue(_)
        )
    }
}

#[derive(Debug, Default)]
struct State {
    boards: Vec<String>,
    labels: Vec<LabelSpec>,
    milestones: Vec<Milestone>,
    issues: Vec<NewIssue>,
    calls: Vec<TrackerCall>,
    /// Creates whose name contains one of these fail.
    failing: Vec<String>,
}

/// Tracker that keeps everything in memory.
///
/// Clones share state, so a test can hand one clone to the engine and
/// inspect the other.
#[derive(Debug, Clone, Default)]
pub struct InMemoryTracker {
    state: Arc<Mutex<State>>,
}

impl InMemoryTracker {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().expect("tracker lock poisoned")
    }

    pub fn with_board(self, title: &str) -> Self {
        self.state().boards.push(title.to_string());
        self
    }

    pub fn with_label(self, name: &str) -> Self {
        self.state().labels.push(LabelSpec {
            name: name.to_string(),
            color: "ededed".to_string(),
            description: String::new(),
        });
        self
    }

    pub fn with_milestone(self, title: &str) -> Self {
        {
            let mut state = self.state();
            let number = state.milestones.len() as u64 + 1;
            state.milestones.push(Milestone {
                number,
                title: title.to_string(),
            });
        }
        self
    }

    pub fn with_issue(self, title: &str) -> Self {
        self.state().issues.push(NewIssue {
            title: title.to_string(),
            body: String::new(),
            milestone: None,
            labels: Vec::new(),
        });
        self
    }

    /// Make every create call whose name or title contains `needle` fail.
    pub fn failing_on(self, needle: &str) -> Self {
        self.state().failing.push(needle.to_string());
        self
    }

    pub fn calls(&self) -> Vec<TrackerCall> {
        self.state().calls.clone()
    }

    pub fn create_calls(&self) -> Vec<TrackerCall> {
        self.calls().into_iter().filter(TrackerCall::is_create).collect()
    }

    pub fn boards(&self) -> Vec<String> {
        self.state().boards.clone()
    }

    pub fn labels(&self) -> Vec<LabelSpec> {
        self.state().labels.clone()
    }

    pub fn milestones(&self) -> Vec<Milestone> {
        self.state().milestones.clone()
    }

    pub fn issues(&self) -> Vec<NewIssue> {
        self.state().issues.clone()
    }

    fn record(&self, call: TrackerCall) -> Result<(), TrackerError> {
        let mut state = self.state();
        let name = match &call {
            TrackerCall::CreateBoard(n)
            | TrackerCall::CreateLabel(n)
            | TrackerCall::CreateMilestone(n)
            | TrackerCall::CreateIssue(n) => Some(n.clone()),
            _ => None,
        };
        state.calls.push(call);

        match name {
            Some(n) if state.failing.iter().any(|needle| n.contains(needle.as_str())) => {
                Err(TrackerError::Server(format!("simulated failure for {}", n)))
            }
            _ => Ok(()),
        }
    }
}

#[async_trait]
impl IssueTracker for InMemoryTracker {
    async fn exists(&self, kind: EntityKind, name: &str) -> Result<bool, TrackerError> {
        self.record(TrackerCall::Exists(kind, name.to_string()))?;
        let state = self.state();
        Ok(match kind {
            EntityKind::Board => state.boards.iter().any(|b| b == name),
            EntityKind::Label => state.labels.iter().any(|l| l.name == name),
            EntityKind::Issue => state.issues.iter().any(|i| title_mentions(&i.title, name)),
        })
    }

    async fn create_board(&self, title: &str) -> Result<(), TrackerError> {
        self.record(TrackerCall::CreateBoard(title.to_string()))?;
        self.state().boards.push(title.to_string());
        Ok(())
    }

    async fn create_label(&self, label: &LabelSpec) -> Result<(), TrackerError> {
        self.record(TrackerCall::CreateLabel(label.name.clone()))?;
        self.state().labels.push(label.clone());
        Ok(())
    }

    async fn find_milestone(&self, title: &str) -> Result<Option<Milestone>, TrackerError> {
        self.record(TrackerCall::FindMilestone(title.to_string()))?;
        Ok(self
            .state()
            .milestones
            .iter()
            .find(|m| m.title == title)
            .cloned())
    }

    async fn create_milestone(
        &self,
        title: &str,
        _description: &str,
    ) -> Result<Milestone, TrackerError> {
        self.record(TrackerCall::CreateMilestone(title.to_string()))?;
        let mut state = self.state();
        let milestone = Milestone {
            number: state.milestones.len() as u64 + 1,
            title: title.to_string(),
        };
        state.milestones.push(milestone.clone());
        Ok(milestone)
    }

    async fn create_issue(&self, issue: &NewIssue) -> Result<(), TrackerError> {
        self.record(TrackerCall::CreateIssue(issue.title.clone()))?;
        self.state().issues.push(issue.clone());
        Ok(())
    }
}
