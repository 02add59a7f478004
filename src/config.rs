//! Run configuration.
//!
//! Values come from CLI flags and a few environment variables:
//! - `GITHUB_TOKEN` - API token (required for the `api` adapter)
//! - `GITHUB_REPOSITORY` - `owner/name`, used when `--repo` is not given
//! - `GITHUB_API_URL` - API base URL (default: `https://api.github.com`)

use std::fmt;
use std::str::FromStr;

use crate::error::SyncError;

/// Default GitHub REST endpoint.
pub const DEFAULT_API_URL: &str = "https://api.github.com";

/// Project board created when `--project` is not given.
pub const DEFAULT_PROJECT_NAME: &str = "Tequila Sunrise Development";

/// Which tracker adapter drives the sync.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum Adapter {
    /// Shell out to the `gh` command-line tool
    #[default]
    Gh,
    /// Call the GitHub REST API directly
    Api,
}

/// A repository given as `owner/name`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoRef {
    pub owner: String,
    pub name: String,
}

impl FromStr for RepoRef {
    type Err = SyncError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().split_once('/') {
            Some((owner, name))
                if !owner.is_empty() && !name.is_empty() && !name.contains('/') =>
            {
                Ok(Self {
                    owner: owner.to_string(),
                    name: name.to_string(),
                })
            }
            _ => Err(SyncError::InvalidRepo(s.to_string())),
        }
    }
}

impl fmt::Display for RepoRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

/// Connection settings for the REST adapter.
#[derive(Clone)]
pub struct ApiConfig {
    pub base_url: String,
    pub token: String,
    pub repo: RepoRef,
}

impl ApiConfig {
    /// Create with explicit configuration.
    pub fn new(base_url: impl Into<String>, token: impl Into<String>, repo: RepoRef) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: token.into(),
            repo,
        }
    }

    /// Load from the process environment. `repo` overrides `GITHUB_REPOSITORY`.
    pub fn from_env(repo: Option<&str>) -> Result<Self, SyncError> {
        Self::from_lookup(repo, |key| std::env::var(key).ok())
    }

    /// Load using `lookup` in place of the environment.
    pub fn from_lookup(
        repo: Option<&str>,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, SyncError> {
        let token = lookup("GITHUB_TOKEN")
            .filter(|t| !t.trim().is_empty())
            .ok_or(SyncError::MissingToken)?;

        let repo = match repo {
            Some(r) => r.to_string(),
            None => lookup("GITHUB_REPOSITORY").ok_or(SyncError::MissingRepo)?,
        };

        let base_url = lookup("GITHUB_API_URL").unwrap_or_else(|| DEFAULT_API_URL.to_string());

        Ok(Self::new(base_url, token, repo.parse()?))
    }
}

// Keep the token out of logs.
impl fmt::Debug for ApiConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiConfig")
            .field("base_url", &self.base_url)
            .field("token", &"***")
            .field("repo", &self.repo)
            .finish()
    }
}
