use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::TaskRecord;

/// A milestone section of the backlog.
///
/// The `id` is synthetic: the task prefix followed by `M` and the heading's
/// index, so `## Milestone 3: Physics` becomes `TS-M3`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MilestoneRecord {
    pub id: String,
    pub name: String,
    /// Tasks in the order they appear in the section.
    pub tasks: Vec<TaskRecord>,
}

impl MilestoneRecord {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            tasks: Vec::new(),
        }
    }

    /// Description given to the tracker milestone on creation.
    pub fn description(&self) -> String {
        format!("Milestone {}", self.id)
    }
}

/// Parsed backlog keyed by milestone id, preserving heading order.
pub type Backlog = IndexMap<String, MilestoneRecord>;

/// A milestone as the tracker knows it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Milestone {
    pub number: u64,
    pub title: String,
}
