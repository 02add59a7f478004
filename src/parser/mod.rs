//! Backlog document parser.
//!
//! A backlog groups task tables under numbered milestone headings:
//!
//! ```text
//! ## Milestone 3: Physics and Interaction
//!
//! | ID     | Task          | Description | Priority | Status |
//! |--------|---------------|-------------|----------|--------|
//! | TS-042 | Tune friction | Reduce skid | medium   | ready  |
//! ```
//!
//! Rows that do not look like a task (header, separator, foreign ids) are
//! skipped. Parsing never fails: a document with no headings yields an empty
//! [`Backlog`].

use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;

use crate::error::SyncError;
use crate::models::{Backlog, MilestoneRecord, TaskRecord};

/// Task id prefix used by the default parser.
pub const DEFAULT_PREFIX: &str = "TS-";

/// Backlog file read when no path is given.
pub const DEFAULT_BACKLOG_FILE: &str = "BACKLOG.md";

static MILESTONE_HEADING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"## Milestone (\d+): ([^\n]+)").expect("valid heading pattern")
});

static NEXT_MILESTONE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"## Milestone \d+:").expect("valid heading pattern"));

static NEXT_SECTION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"## ").expect("valid heading pattern"));

/// Parses backlog documents whose task ids start with a fixed prefix.
#[derive(Debug, Clone)]
pub struct BacklogParser {
    prefix: String,
    task_row: Regex,
}

impl BacklogParser {
    /// Create a parser for ids like `<prefix>042`.
    pub fn new(prefix: &str) -> Self {
        // The prefix is escaped, so the pattern is always valid.
        let pattern = format!(
            r"\| ({}\d+)\s+\| ([^|]+)\s*\| ([^|]+)\s*\| ([^|]+)\s*\| ([^|]+)\s*\|",
            regex::escape(prefix)
        );
        Self {
            prefix: prefix.to_string(),
            task_row: Regex::new(&pattern).expect("valid task row pattern"),
        }
    }

    /// Parse the full document text into milestones keyed by id.
    pub fn parse(&self, content: &str) -> Backlog {
        let mut backlog = Backlog::new();

        for heading in MILESTONE_HEADING.captures_iter(content) {
            let (Some(whole), Some(index), Some(name)) =
                (heading.get(0), heading.get(1), heading.get(2))
            else {
                continue;
            };

            let id = format!("{}M{}", self.prefix, index.as_str());
            let mut record = MilestoneRecord::new(id.clone(), name.as_str().trim());

            let section = section_after(content, whole.end());
            record.tasks = self.parse_rows(section, &id);

            tracing::debug!(
                milestone = %id,
                tasks = record.tasks.len(),
                "Parsed milestone section"
            );
            backlog.insert(id, record);
        }

        backlog
    }

    fn parse_rows(&self, section: &str, milestone_id: &str) -> Vec<TaskRecord> {
        self.task_row
            .captures_iter(section)
            .map(|row| TaskRecord {
                id: row[1].to_string(),
                title: row[2].trim().to_string(),
                description: row[3].trim().to_string(),
                priority: row[4].trim().to_string(),
                status: row[5].trim().to_string(),
                milestone: milestone_id.to_string(),
            })
            .collect()
    }
}

impl Default for BacklogParser {
    fn default() -> Self {
        Self::new(DEFAULT_PREFIX)
    }
}

/// Slice of `content` from `start` to the next milestone heading, else the
/// next `## ` heading, else end of document.
fn section_after(content: &str, start: usize) -> &str {
    let rest = &content[start..];
    let end = NEXT_MILESTONE
        .find(rest)
        .or_else(|| NEXT_SECTION.find(rest))
        .map(|m| m.start())
        .unwrap_or(rest.len());
    &rest[..end]
}

/// Parse with the default `TS-` prefix.
pub fn parse_backlog(content: &str) -> Backlog {
    BacklogParser::default().parse(content)
}

/// Read a backlog document from disk.
pub fn read_backlog_file(path: impl AsRef<Path>) -> Result<String, SyncError> {
    let path = path.as_ref();
    std::fs::read_to_string(path).map_err(|source| SyncError::ReadBacklog {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
# Backlog

## Milestone 1: Project Setup and Core AR

| ID | Task | Description | Priority | Status |
|----|------|-------------|----------|--------|
| TS-001 | Create project | Unity project with AR Foundation | high | done |
| TS-002 | Plane detection | Detect horizontal planes | high | in progress |

## Milestone 2: Avatar Implementation

| ID | Task | Description | Priority | Status |
|----|------|-------------|----------|--------|
| TS-010 | Import avatar | Rigged model import | medium | backlog |

## Notes

| TS-999 | Not a task | Lives under notes | low | backlog |
";

    #[test]
    fn section_stops_at_next_milestone() {
        let backlog = parse_backlog(SAMPLE);
        let ids: Vec<_> = backlog["TS-M1"].tasks.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["TS-001", "TS-002"]);
    }

    #[test]
    fn last_section_stops_at_next_heading() {
        let backlog = parse_backlog(SAMPLE);
        let ids: Vec<_> = backlog["TS-M2"].tasks.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["TS-010"]);
    }

    #[test]
    fn header_and_separator_rows_are_skipped() {
        let backlog = parse_backlog(SAMPLE);
        assert!(backlog
            .values()
            .flat_map(|m| &m.tasks)
            .all(|t| t.id.starts_with("TS-")));
    }

    #[test]
    fn milestones_keep_document_order() {
        let content = "## Milestone 10: Ten\n## Milestone 2: Two\n";
        let backlog = parse_backlog(content);
        let ids: Vec<_> = backlog.keys().map(String::as_str).collect();
        assert_eq!(ids, vec!["TS-M10", "TS-M2"]);
    }

    #[test]
    fn custom_prefix_changes_ids() {
        let parser = BacklogParser::new("AB.");
        let content = "## Milestone 1: One\n| AB.7 | T | D | low | ready |\n| TS-001 | x | y | low | ready |\n";
        let backlog = parser.parse(content);
        let milestone = &backlog["AB.M1"];
        assert_eq!(milestone.tasks.len(), 1);
        assert_eq!(milestone.tasks[0].id, "AB.7");
    }

    #[test]
    fn unterminated_tail_runs_to_end_of_document() {
        let content = "## Milestone 1: Only\ntext\n| TS-001 | A | B | low | done |\n";
        let backlog = parse_backlog(content);
        assert_eq!(backlog["TS-M1"].tasks.len(), 1);
    }
}
