//! Tracker adapter for the GitHub REST API.
//!
//! Labels, milestones and issues go through the REST endpoints; list calls
//! follow the `Link: rel="next"` header. Project boards are Projects (v2),
//! which only exist in the GraphQL API.

use async_trait::async_trait;
use reqwest::{header, Client, Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;

use super::{title_mentions, EntityKind, IssueTracker};
use crate::config::ApiConfig;
use crate::error::TrackerError;
use crate::models::{LabelSpec, Milestone, NewIssue};

const ACCEPT: &str = "application/vnd.github.v3+json";
const USER_AGENT: &str = concat!("backlog-sync/", env!("CARGO_PKG_VERSION"));
const PAGE_SIZE: &str = "100";

/// Stop following `next` links after this many pages.
const MAX_PAGES: usize = 50;

const PROJECTS_QUERY: &str = "query($owner: String!, $name: String!) {
  repository(owner: $owner, name: $name) {
    id
    owner {
      id
      ... on User { projectsV2(first: 100) { nodes { title } } }
      ... on Organization { projectsV2(first: 100) { nodes { title } } }
    }
  }
}";

const CREATE_PROJECT_MUTATION: &str = "mutation($input: CreateProjectV2Input!) {
  createProjectV2(input: $input) { projectV2 { id title } }
}";

#[derive(Debug, Deserialize)]
struct Named {
    name: String,
}

#[derive(Debug, Deserialize)]
struct Titled {
    title: String,
}

#[derive(Debug, Deserialize)]
struct GraphQlResponse<T> {
    data: Option<T>,
    #[serde(default)]
    errors: Vec<GraphQlError>,
}

#[derive(Debug, Deserialize)]
struct GraphQlError {
    message: String,
}

#[derive(Debug, Deserialize)]
struct RepositoryData {
    repository: Option<RepositoryNode>,
}

#[derive(Debug, Deserialize)]
struct RepositoryNode {
    id: String,
    owner: OwnerNode,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OwnerNode {
    id: String,
    projects_v2: Option<ProjectConnection>,
}

#[derive(Debug, Deserialize)]
struct ProjectConnection {
    nodes: Vec<Option<Titled>>,
}

/// HTTP client for one GitHub repository.
#[derive(Debug, Clone)]
pub struct GitHubApiTracker {
    config: ApiConfig,
    client: Client,
}

impl GitHubApiTracker {
    pub fn new(config: ApiConfig) -> Self {
        Self {
            config,
            client: Client::new(),
        }
    }

    /// Build a request against `url` with auth and GitHub headers.
    fn request_url(&self, method: Method, url: &str) -> reqwest::RequestBuilder {
        self.client
            .request(method, url)
            .header(header::AUTHORIZATION, format!("token {}", self.config.token))
            .header(header::ACCEPT, ACCEPT)
            .header(header::USER_AGENT, USER_AGENT)
    }

    /// Build a request for a path under `/repos/{owner}/{repo}`.
    fn request(&self, method: Method, path: &str) -> reqwest::RequestBuilder {
        let url = format!(
            "{}/repos/{}/{}{}",
            self.config.base_url, self.config.repo.owner, self.config.repo.name, path
        );
        self.request_url(method, &url)
    }

    /// GraphQL endpoint for the configured API base.
    ///
    /// GitHub Enterprise serves REST under `/api/v3` and GraphQL under
    /// `/api/graphql`.
    fn graphql_url(&self) -> String {
        match self.config.base_url.strip_suffix("/v3") {
            Some(api_root) => format!("{}/graphql", api_root),
            None => format!("{}/graphql", self.config.base_url),
        }
    }

    /// Handle response, converting HTTP errors to TrackerError.
    async fn handle_response<T: DeserializeOwned>(
        &self,
        response: reqwest::Response,
    ) -> Result<T, TrackerError> {
        let status = response.status();
        if status.is_success() {
            Ok(response.json().await?)
        } else {
            let body = response.text().await.unwrap_or_default();
            Err(status_error(status, body))
        }
    }

    /// Handle a response whose body is not needed.
    async fn handle_empty_response(&self, response: reqwest::Response) -> Result<(), TrackerError> {
        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            let body = response.text().await.unwrap_or_default();
            Err(status_error(status, body))
        }
    }

    /// GET a repository list endpoint and every following page.
    async fn get_all<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<Vec<T>, TrackerError> {
        let mut response = self
            .request(Method::GET, path)
            .query(query)
            .query(&[("per_page", PAGE_SIZE)])
            .send()
            .await?;

        let mut items = Vec::new();
        for _ in 0..MAX_PAGES {
            let next = next_page_url(response.headers());
            let page: Vec<T> = self.handle_response(response).await?;
            items.extend(page);

            match next {
                Some(url) => response = self.request_url(Method::GET, &url).send().await?,
                None => return Ok(items),
            }
        }

        debug!(path, pages = MAX_PAGES, "Stopped following pagination links");
        Ok(items)
    }

    async fn list_names(&self, path: &str) -> Result<Vec<String>, TrackerError> {
        let named: Vec<Named> = self.get_all(path, &[]).await?;
        Ok(named.into_iter().map(|n| n.name).collect())
    }

    /// Scan issues in every state. Uses the core rate limit rather than the
    /// much smaller search limit.
    async fn issue_exists(&self, task_id: &str) -> Result<bool, TrackerError> {
        let issues: Vec<Titled> = self.get_all("/issues", &[("state", "all")]).await?;
        Ok(issues.iter().any(|i| title_mentions(&i.title, task_id)))
    }

    /// Run a GraphQL document and return its `data`.
    async fn graphql<T: DeserializeOwned>(
        &self,
        query: &str,
        variables: Value,
    ) -> Result<T, TrackerError> {
        let response = self
            .request_url(Method::POST, &self.graphql_url())
            .json(&json!({ "query": query, "variables": variables }))
            .send()
            .await?;
        let body: GraphQlResponse<T> = self.handle_response(response).await?;

        if !body.errors.is_empty() {
            let messages: Vec<_> = body.errors.into_iter().map(|e| e.message).collect();
            return Err(TrackerError::GraphQl(messages.join("; ")));
        }
        body.data
            .ok_or_else(|| TrackerError::GraphQl("response carried no data".to_string()))
    }

    async fn repository_node(&self) -> Result<RepositoryNode, TrackerError> {
        let data: RepositoryData = self
            .graphql(
                PROJECTS_QUERY,
                json!({ "owner": self.config.repo.owner, "name": self.config.repo.name }),
            )
            .await?;
        data.repository
            .ok_or_else(|| TrackerError::NotFound(format!("repository {}", self.config.repo)))
    }

    async fn board_exists(&self, title: &str) -> Result<bool, TrackerError> {
        let repository = self.repository_node().await?;
        Ok(repository
            .owner
            .projects_v2
            .map(|c| c.nodes.into_iter().flatten().any(|p| p.title == title))
            .unwrap_or(false))
    }
}

/// The `rel="next"` target of a `Link` header, if any.
fn next_page_url(headers: &header::HeaderMap) -> Option<String> {
    let link = headers.get(header::LINK)?.to_str().ok()?;
    link.split(',').find_map(|part| {
        let (target, params) = part.split_once(';')?;
        params.contains(r#"rel="next""#).then(|| {
            target
                .trim()
                .trim_start_matches('<')
                .trim_end_matches('>')
                .to_string()
        })
    })
}

fn status_error(status: StatusCode, body: String) -> TrackerError {
    match status {
        StatusCode::NOT_FOUND | StatusCode::GONE => TrackerError::NotFound(body),
        StatusCode::UNAUTHORIZED => TrackerError::Unauthorized,
        // GitHub also answers rate limiting with 403.
        StatusCode::FORBIDDEN | StatusCode::TOO_MANY_REQUESTS => TrackerError::Forbidden(body),
        StatusCode::UNPROCESSABLE_ENTITY => TrackerError::Validation(body),
        _ => TrackerError::Server(format!("{}: {}", status, body)),
    }
}

#[async_trait]
impl IssueTracker for GitHubApiTracker {
    async fn exists(&self, kind: EntityKind, name: &str) -> Result<bool, TrackerError> {
        match kind {
            EntityKind::Board => self.board_exists(name).await,
            EntityKind::Label => Ok(self.list_names("/labels").await?.iter().any(|n| n == name)),
            EntityKind::Issue => self.issue_exists(name).await,
        }
    }

    /// Create a Projects (v2) board owned by the repository owner and linked
    /// to the repository.
    async fn create_board(&self, title: &str) -> Result<(), TrackerError> {
        let repository = self.repository_node().await?;
        let _: Value = self
            .graphql(
                CREATE_PROJECT_MUTATION,
                json!({
                    "input": {
                        "ownerId": repository.owner.id,
                        "repositoryId": repository.id,
                        "title": title
                    }
                }),
            )
            .await?;
        Ok(())
    }

    async fn create_label(&self, label: &LabelSpec) -> Result<(), TrackerError> {
        let response = self
            .request(Method::POST, "/labels")
            .json(label)
            .send()
            .await?;
        // 422 means a label with that name already exists.
        if response.status() == StatusCode::UNPROCESSABLE_ENTITY {
            debug!(label = %label.name, "Label already present");
            return Ok(());
        }
        self.handle_empty_response(response).await
    }

    async fn find_milestone(&self, title: &str) -> Result<Option<Milestone>, TrackerError> {
        let milestones: Vec<Milestone> = self.get_all("/milestones", &[("state", "all")]).await?;
        Ok(milestones.into_iter().find(|m| m.title == title))
    }

    async fn create_milestone(
        &self,
        title: &str,
        description: &str,
    ) -> Result<Milestone, TrackerError> {
        let response = self
            .request(Method::POST, "/milestones")
            .json(&json!({
                "title": title,
                "description": description,
                "state": "open"
            }))
            .send()
            .await?;
        self.handle_response(response).await
    }

    async fn create_issue(&self, issue: &NewIssue) -> Result<(), TrackerError> {
        let response = self
            .request(Method::POST, "/issues")
            .json(&json!({
                "title": issue.title,
                "body": issue.body,
                "milestone": issue.milestone.as_ref().map(|m| m.number),
                "labels": issue.labels
            }))
            .send()
            .await?;
        self.handle_empty_response(response).await
    }
}
