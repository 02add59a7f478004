//! Error types for tracker adapters and startup.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised by an [`IssueTracker`](crate::tracker::IssueTracker) implementation.
#[derive(Debug, Error)]
pub enum TrackerError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("failed to run {program}: {source}")]
    Io {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{program} exited with {code:?}: {stderr}")]
    CommandFailed {
        program: String,
        code: Option<i32>,
        stderr: String,
    },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Unauthorized: token missing or invalid")]
    Unauthorized,

    #[error("Forbidden (permissions or rate limit): {0}")]
    Forbidden(String),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Server error: {0}")]
    Server(String),

    #[error("GraphQL error: {0}")]
    GraphQl(String),

    #[error("Unexpected response: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Fatal errors raised before any tracker work begins.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("GITHUB_TOKEN environment variable not set")]
    MissingToken,

    #[error("repository must be given as owner/name, got {0:?}")]
    InvalidRepo(String),

    #[error("no repository given: pass --repo or set GITHUB_REPOSITORY")]
    MissingRepo,

    #[error("failed to read backlog {path}: {source}")]
    ReadBacklog {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
