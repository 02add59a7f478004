use serde::{Deserialize, Serialize};

/// Color used for every milestone label.
pub const MILESTONE_LABEL_COLOR: &str = "0366d6";

/// Priority levels and their label colors (red, yellow, green).
pub const PRIORITY_LEVELS: [(&str, &str); 3] = [
    ("high", "d73a4a"),
    ("medium", "fbca04"),
    ("low", "0e8a16"),
];

/// Status levels and their label colors.
pub const STATUS_LEVELS: [(&str, &str); 5] = [
    ("backlog", "ededed"),
    ("ready", "c5def5"),
    ("in progress", "bfdadc"),
    ("review", "c2e0c6"),
    ("done", "0e8a16"),
];

/// A label to ensure on the tracker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelSpec {
    pub name: String,
    /// Hex color without the leading `#`.
    pub color: String,
    pub description: String,
}

impl LabelSpec {
    pub fn milestone(milestone_id: &str) -> Self {
        Self {
            name: milestone_label(milestone_id),
            color: MILESTONE_LABEL_COLOR.to_string(),
            description: format!("Tasks for {}", milestone_id),
        }
    }

    pub fn priority(level: &str, color: &str) -> Self {
        Self {
            name: priority_label(level),
            color: color.to_string(),
            description: format!("{} priority tasks", capitalize(level)),
        }
    }

    pub fn status(level: &str, color: &str) -> Self {
        Self {
            name: status_label(level),
            color: color.to_string(),
            description: format!("Tasks in {} status", capitalize(level)),
        }
    }
}

pub fn milestone_label(milestone_id: &str) -> String {
    format!("milestone:{}", milestone_id)
}

pub fn priority_label(priority: &str) -> String {
    format!("priority:{}", priority.trim().to_lowercase())
}

/// Status label with the status lower-cased and spaces hyphenated,
/// so `In Progress` becomes `status:in-progress`.
pub fn status_label(status: &str) -> String {
    format!("status:{}", status.trim().to_lowercase().replace(' ', "-"))
}

/// Upper-case the first character only (`in progress` -> `In progress`).
fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
