use serde::{Deserialize, Serialize};

/// Status value that does not get a status label on its issue.
pub const DEFAULT_STATUS: &str = "backlog";

/// One task row of the backlog table.
///
/// `priority` and `status` are kept as written in the document; the known
/// levels are listed in [`PRIORITY_LEVELS`](super::PRIORITY_LEVELS) and
/// [`STATUS_LEVELS`](super::STATUS_LEVELS) but other values pass through.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskRecord {
    pub id: String,
    pub title: String,
    pub description: String,
    pub priority: String,
    pub status: String,
    /// Id of the milestone section the row was found in.
    pub milestone: String,
}

impl TaskRecord {
    /// Issue title, e.g. `[TS-042] Tune friction`.
    pub fn issue_title(&self) -> String {
        format!("[{}] {}", self.id, self.title)
    }

    pub fn is_default_status(&self) -> bool {
        self.status.trim().eq_ignore_ascii_case(DEFAULT_STATUS)
    }
}
