//! Tracker adapter that shells out to the GitHub CLI.
//!
//! Repository-scoped commands target the repository of the working
//! directory, or `GH_REPO` when a repository is configured.

use async_trait::async_trait;
use serde::Deserialize;
use tokio::process::Command;
use tracing::{debug, warn};

use super::{title_mentions, EntityKind, IssueTracker};
use crate::config::RepoRef;
use crate::error::TrackerError;
use crate::models::{LabelSpec, Milestone, NewIssue};

const PROGRAM: &str = "gh";

/// Upper bound on labels listed in one call.
const LABEL_LIMIT: &str = "1000";

#[derive(Debug, Deserialize)]
struct Named {
    name: String,
}

#[derive(Debug, Deserialize)]
struct Titled {
    title: String,
}

#[derive(Debug, Deserialize)]
struct ProjectList {
    projects: Vec<Titled>,
}

/// Runs `gh` subcommands for every tracker operation.
#[derive(Debug, Clone)]
pub struct GhCliTracker {
    program: String,
    repo: Option<RepoRef>,
    project_owner: String,
}

impl GhCliTracker {
    /// Use `gh` from `PATH` against the current repository.
    pub fn new() -> Self {
        Self {
            program: PROGRAM.to_string(),
            repo: None,
            project_owner: "@me".to_string(),
        }
    }

    /// Target `repo` instead of the working directory's repository.
    pub fn with_repo(mut self, repo: RepoRef) -> Self {
        self.repo = Some(repo);
        self
    }

    /// Owner passed to `gh project` commands (default `@me`).
    pub fn with_project_owner(mut self, owner: impl Into<String>) -> Self {
        self.project_owner = owner.into();
        self
    }

    /// Use a different executable, e.g. a wrapper script.
    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    /// Run `gh` and return stdout, failing on a non-zero exit.
    async fn run(&self, args: &[&str]) -> Result<String, TrackerError> {
        debug!(args = ?args, "Running gh command");

        let mut command = Command::new(&self.program);
        command.args(args);
        if let Some(ref repo) = self.repo {
            command.env("GH_REPO", repo.to_string());
        }

        let output = command.output().await.map_err(|source| TrackerError::Io {
            program: self.program.clone(),
            source,
        })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            warn!(args = ?args, stderr = %stderr, "gh command failed");
            return Err(TrackerError::CommandFailed {
                program: self.program.clone(),
                code: output.status.code(),
                stderr,
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    async fn board_exists(&self, title: &str) -> Result<bool, TrackerError> {
        let stdout = self
            .run(&[
                "project",
                "list",
                "--owner",
                &self.project_owner,
                "--format",
                "json",
            ])
            .await?;
        let list: ProjectList = serde_json::from_str(&stdout)?;
        Ok(list.projects.iter().any(|p| p.title == title))
    }

    async fn label_exists(&self, name: &str) -> Result<bool, TrackerError> {
        let stdout = self
            .run(&["label", "list", "--limit", LABEL_LIMIT, "--json", "name"])
            .await?;
        let labels: Vec<Named> = serde_json::from_str(&stdout)?;
        Ok(labels.iter().any(|l| l.name == name))
    }

    async fn issue_exists(&self, task_id: &str) -> Result<bool, TrackerError> {
        let query = format!("{} in:title", task_id);
        let stdout = self
            .run(&[
                "issue", "list", "--state", "all", "--search", &query, "--json", "title",
            ])
            .await?;
        let issues: Vec<Titled> = serde_json::from_str(&stdout)?;
        Ok(issues.iter().any(|i| title_mentions(&i.title, task_id)))
    }
}

impl Default for GhCliTracker {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl IssueTracker for GhCliTracker {
    async fn exists(&self, kind: EntityKind, name: &str) -> Result<bool, TrackerError> {
        match kind {
            EntityKind::Board => self.board_exists(name).await,
            EntityKind::Label => self.label_exists(name).await,
            EntityKind::Issue => self.issue_exists(name).await,
        }
    }

    async fn create_board(&self, title: &str) -> Result<(), TrackerError> {
        self.run(&[
            "project",
            "create",
            "--owner",
            &self.project_owner,
            "--title",
            title,
        ])
        .await?;
        Ok(())
    }

    async fn create_label(&self, label: &LabelSpec) -> Result<(), TrackerError> {
        self.run(&[
            "label",
            "create",
            &label.name,
            "--color",
            &label.color,
            "--description",
            &label.description,
        ])
        .await?;
        Ok(())
    }

    async fn find_milestone(&self, title: &str) -> Result<Option<Milestone>, TrackerError> {
        let stdout = self
            .run(&[
                "api",
                "--paginate",
                "repos/:owner/:repo/milestones?state=all&per_page=100",
            ])
            .await?;
        // --paginate prints one JSON array per page.
        for page in serde_json::Deserializer::from_str(&stdout).into_iter::<Vec<Milestone>>() {
            if let Some(found) = page?.into_iter().find(|m| m.title == title) {
                return Ok(Some(found));
            }
        }
        Ok(None)
    }

    async fn create_milestone(
        &self,
        title: &str,
        description: &str,
    ) -> Result<Milestone, TrackerError> {
        let title_field = format!("title={}", title);
        let description_field = format!("description={}", description);
        let stdout = self
            .run(&[
                "api",
                "--method",
                "POST",
                "repos/:owner/:repo/milestones",
                "-f",
                &title_field,
                "-f",
                &description_field,
            ])
            .await?;
        Ok(serde_json::from_str(&stdout)?)
    }

    /// Create through `gh api` so the milestone is attached by number;
    /// `gh issue create --milestone` only resolves open milestones by title.
    async fn create_issue(&self, issue: &NewIssue) -> Result<(), TrackerError> {
        let mut fields = vec![
            format!("title={}", issue.title),
            format!("body={}", issue.body),
        ];
        fields.extend(issue.labels.iter().map(|label| format!("labels[]={}", label)));

        let mut args = vec!["api", "--method", "POST", "repos/:owner/:repo/issues"];
        for field in &fields {
            args.extend(["-f", field.as_str()]);
        }
        let milestone_field = issue
            .milestone
            .as_ref()
            .map(|m| format!("milestone={}", m.number));
        if let Some(ref field) = milestone_field {
            args.extend(["-F", field.as_str()]);
        }

        self.run(&args).await?;
        Ok(())
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::os::unix::fs::PermissionsExt;
    use std::path::Path;

    /// Write an executable script that logs its arguments and prints `stdout`.
    fn fake_gh(dir: &Path, stdout: &str, exit_code: i32) -> String {
        let script = dir.join("gh");
        let log = dir.join("args.log");
        let body = format!(
            "#!/bin/sh\nprintf '%s\\n' \"$@\" >> '{}'\ncat <<'JSON'\n{}\nJSON\necho oops >&2\nexit {}\n",
            log.display(),
            stdout,
            exit_code
        );
        std::fs::write(&script, body).unwrap();
        std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();
        script.display().to_string()
    }

    fn logged_args(dir: &Path) -> Vec<String> {
        std::fs::read_to_string(dir.join("args.log"))
            .unwrap()
            .lines()
            .map(String::from)
            .collect()
    }

    #[tokio::test]
    async fn label_exists_matches_exact_name() {
        let dir = tempfile::tempdir().unwrap();
        let program = fake_gh(
            dir.path(),
            r#"[{"name":"milestone:TS-M10"},{"name":"priority:high"}]"#,
            0,
        );
        let gh = GhCliTracker::new().with_program(program);

        assert!(gh.exists(EntityKind::Label, "priority:high").await.unwrap());
        assert!(!gh.exists(EntityKind::Label, "milestone:TS-M1").await.unwrap());
    }

    #[tokio::test]
    async fn issue_lookup_searches_titles_in_all_states() {
        let dir = tempfile::tempdir().unwrap();
        let program = fake_gh(dir.path(), r#"[{"title":"[TS-042] Tune friction"}]"#, 0);
        let gh = GhCliTracker::new().with_program(program);

        assert!(gh.exists(EntityKind::Issue, "TS-042").await.unwrap());

        let args = logged_args(dir.path());
        assert!(args.contains(&"TS-042 in:title".to_string()));
        assert!(args.contains(&"all".to_string()));
    }

    #[tokio::test]
    async fn create_issue_attaches_milestone_by_number() {
        let dir = tempfile::tempdir().unwrap();
        let program = fake_gh(dir.path(), r#"{"number":1}"#, 0);
        let gh = GhCliTracker::new().with_program(program);

        gh.create_issue(&NewIssue {
            title: "[TS-001] Setup".to_string(),
            body: "body".to_string(),
            milestone: Some(Milestone {
                number: 4,
                title: "Core AR".to_string(),
            }),
            labels: vec!["milestone:TS-M1".to_string(), "priority:high".to_string()],
        })
        .await
        .unwrap();

        let args = logged_args(dir.path());
        assert_eq!(&args[..4], ["api", "--method", "POST", "repos/:owner/:repo/issues"]);
        assert!(args.contains(&"title=[TS-001] Setup".to_string()));
        assert!(args.contains(&"labels[]=milestone:TS-M1".to_string()));
        assert!(args.contains(&"labels[]=priority:high".to_string()));
        let milestone_at = args.iter().position(|a| a == "milestone=4").unwrap();
        assert_eq!(args[milestone_at - 1], "-F");
        assert!(!args.iter().any(|a| a.contains("Core AR")));
    }

    #[tokio::test]
    async fn create_issue_without_milestone_sends_no_milestone_field() {
        let dir = tempfile::tempdir().unwrap();
        let program = fake_gh(dir.path(), r#"{"number":2}"#, 0);
        let gh = GhCliTracker::new().with_program(program);

        gh.create_issue(&NewIssue {
            title: "[TS-002] Planes".to_string(),
            body: "body".to_string(),
            milestone: None,
            labels: vec![],
        })
        .await
        .unwrap();

        let args = logged_args(dir.path());
        assert!(!args.iter().any(|a| a.starts_with("milestone=")));
        assert!(!args.contains(&"-F".to_string()));
    }

    #[tokio::test]
    async fn board_commands_use_configured_project_owner() {
        let dir = tempfile::tempdir().unwrap();
        let program = fake_gh(dir.path(), r#"{"projects":[{"title":"Board"}],"totalCount":1}"#, 0);
        let gh = GhCliTracker::new()
            .with_program(program)
            .with_project_owner("octo-org");

        assert!(gh.exists(EntityKind::Board, "Board").await.unwrap());

        let args = logged_args(dir.path());
        let owner_at = args.iter().position(|a| a == "--owner").unwrap();
        assert_eq!(args[owner_at + 1], "octo-org");
    }

    #[tokio::test]
    async fn find_milestone_parses_api_output() {
        let dir = tempfile::tempdir().unwrap();
        let program = fake_gh(
            dir.path(),
            r#"[{"number":2,"title":"Avatar Implementation","state":"open"}]"#,
            0,
        );
        let gh = GhCliTracker::new().with_program(program);

        let found = gh.find_milestone("Avatar Implementation").await.unwrap();
        assert_eq!(found.map(|m| m.number), Some(2));
        assert!(gh.find_milestone("Missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn find_milestone_reads_every_paginated_page() {
        let dir = tempfile::tempdir().unwrap();
        let program = fake_gh(
            dir.path(),
            r#"[{"number":1,"title":"Core AR","state":"closed"}]
[{"number":101,"title":"Launch","state":"open"}]"#,
            0,
        );
        let gh = GhCliTracker::new().with_program(program);

        let found = gh.find_milestone("Launch").await.unwrap();
        assert_eq!(found.map(|m| m.number), Some(101));
        assert!(logged_args(dir.path()).contains(&"--paginate".to_string()));
    }

    #[tokio::test]
    async fn non_zero_exit_is_command_failed() {
        let dir = tempfile::tempdir().unwrap();
        let program = fake_gh(dir.path(), "", 1);
        let gh = GhCliTracker::new().with_program(program);

        let err = gh.create_board("Board").await.unwrap_err();
        match err {
            TrackerError::CommandFailed { code, stderr, .. } => {
                assert_eq!(code, Some(1));
                assert_eq!(stderr, "oops");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn missing_program_is_io_error() {
        let gh = GhCliTracker::new().with_program("/nonexistent/gh-binary");
        let err = gh.exists(EntityKind::Label, "x").await.unwrap_err();
        assert!(matches!(err, TrackerError::Io { .. }));
    }
}
