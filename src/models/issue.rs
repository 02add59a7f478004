use serde::{Deserialize, Serialize};

use super::Milestone;

/// Input for creating an issue on the tracker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewIssue {
    pub title: String,
    pub body: String,
    /// Milestone to attach, if the tracker returned one.
    pub milestone: Option<Milestone>,
    pub labels: Vec<String>,
}
