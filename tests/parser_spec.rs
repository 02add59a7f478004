use std::io::Write;

use backlog_sync::models::*;
use backlog_sync::parser::{parse_backlog, read_backlog_file, BacklogParser};
use speculate2::speculate;

const BACKLOG: &str = "\
# Tequila Sunrise Backlog

Project tracking for the AR motorcycle game.

## Milestone 1: Project Setup and Core AR

| ID | Task | Description | Priority | Status |
|----|------|-------------|----------|--------|
| TS-001 | Create Unity project | Set up project with AR Foundation | high | done |
| TS-002 | Plane detection | Detect and visualize horizontal planes | high | in progress |
| TS-003 | Session lifecycle | Handle pause and resume | medium | backlog |

## Milestone 3: Physics and Interaction

| ID | Task | Description | Priority | Status |
|----|------|-------------|----------|--------|
| TS-042 | Tune friction | Reduce skid | medium | ready |

## Definitions

| TS-900 | Glossary | Not a real task | low | backlog |
";

speculate! {
    before {
        let backlog = parse_backlog(BACKLOG);
    }

    describe "milestone headings" {
        it "creates one record per heading in document order" {
            let ids: Vec<&str> = backlog.keys().map(String::as_str).collect();
            assert_eq!(ids, vec!["TS-M1", "TS-M3"]);
        }

        it "builds the id from the prefix and heading index" {
            let milestone = &backlog["TS-M3"];
            assert_eq!(milestone.id, "TS-M3");
            assert_eq!(milestone.name, "Physics and Interaction");
        }
    }

    describe "task rows" {
        it "parses the documented example row" {
            let tasks = &backlog["TS-M3"].tasks;
            assert_eq!(tasks.len(), 1);
            assert_eq!(tasks[0], TaskRecord {
                id: "TS-042".to_string(),
                title: "Tune friction".to_string(),
                description: "Reduce skid".to_string(),
                priority: "medium".to_string(),
                status: "ready".to_string(),
                milestone: "TS-M3".to_string(),
            });
        }

        it "attaches every row to the milestone it appears under" {
            for (id, milestone) in &backlog {
                assert!(milestone.tasks.iter().all(|t| &t.milestone == id));
            }
        }

        it "never places a task under two milestones" {
            let mut seen: Vec<&str> = backlog
                .values()
                .flat_map(|m| m.tasks.iter().map(|t| t.id.as_str()))
                .collect();
            let total = seen.len();
            seen.sort();
            seen.dedup();
            assert_eq!(seen.len(), total);
        }

        it "keeps multi-word statuses as written" {
            assert_eq!(backlog["TS-M1"].tasks[1].status, "in progress");
        }

        it "ignores rows after the next non-milestone heading" {
            let all: Vec<&str> = backlog
                .values()
                .flat_map(|m| m.tasks.iter().map(|t| t.id.as_str()))
                .collect();
            assert!(!all.contains(&"TS-900"));
        }
    }

    describe "edge cases" {
        it "returns an empty backlog when there are no headings" {
            assert!(parse_backlog("| TS-001 | A | B | high | done |\n").is_empty());
            assert!(parse_backlog("").is_empty());
        }

        it "is idempotent" {
            assert_eq!(parse_backlog(BACKLOG), backlog);
        }

        it "lets a later heading with the same index replace the earlier one" {
            let doc = "## Milestone 1: First\n| TS-001 | A | B | low | done |\n## Milestone 1: Again\n";
            let parsed = parse_backlog(doc);
            assert_eq!(parsed.len(), 1);
            assert_eq!(parsed["TS-M1"].name, "Again");
            assert!(parsed["TS-M1"].tasks.is_empty());
        }

        it "uses a custom prefix for ids and rows" {
            let parser = BacklogParser::new("GAME-");
            let parsed = parser.parse("## Milestone 2: Two\n| GAME-7 | A | B | low | done |\n");
            assert_eq!(parsed["GAME-M2"].tasks[0].id, "GAME-7");
        }
    }

    describe "read_backlog_file" {
        it "reads the document from disk" {
            let mut file = tempfile::NamedTempFile::new().expect("Failed to create temp file");
            file.write_all(BACKLOG.as_bytes()).expect("Failed to write");

            let content = read_backlog_file(file.path()).expect("Failed to read");
            assert_eq!(parse_backlog(&content), backlog);
        }

        it "fails for a missing file" {
            let dir = tempfile::tempdir().expect("Failed to create temp dir");
            assert!(read_backlog_file(dir.path().join("BACKLOG.md")).is_err());
        }
    }
}
