use serde::Deserialize;
use thiserror::Error;

use crate::bitbucket::PullRequestState;

/// A required request parameter was absent or unusable.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Missing required parameter '{0}'")]
    Missing(&'static str),

    #[error("Invalid parameter '{field}': {message}")]
    Invalid {
        field: &'static str,
        message: String,
    },
}

/// Check that a required parameter is present and not blank.
pub fn required(field: &'static str, value: Option<String>) -> Result<String, ValidationError> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or(ValidationError::Missing(field))
}

/// Check a repository file path. Leading and trailing slashes are ignored;
/// `.` and `..` segments are refused so the path cannot leave the
/// pull request's diff resource.
pub fn file_path(value: Option<String>) -> Result<String, ValidationError> {
    let raw = required("path", value)?;
    let invalid = |message: &str| ValidationError::Invalid {
        field: "path",
        message: format!("{}, got '{}'", message, raw),
    };

    let segments: Vec<&str> = raw.split('/').filter(|s| !s.is_empty()).collect();
    if segments.is_empty() {
        return Err(invalid("expected a file path"));
    }
    if segments.iter().any(|s| *s == "." || *s == "..") {
        return Err(invalid("'.' and '..' segments are not allowed"));
    }
    Ok(segments.join("/"))
}

fn parse_id(value: Option<String>) -> Result<u64, ValidationError> {
    let raw = required("pull_request_id", value)?;
    raw.parse::<u64>().map_err(|_| ValidationError::Invalid {
        field: "pull_request_id",
        message: format!("expected a non-negative integer, got '{}'", raw),
    })
}

fn parse_state(value: Option<String>) -> Result<PullRequestState, ValidationError> {
    match value.filter(|v| !v.trim().is_empty()) {
        Some(raw) => raw
            .parse()
            .map_err(|message| ValidationError::Invalid {
                field: "state",
                message,
            }),
        None => Ok(PullRequestState::default()),
    }
}

// ============================================================
// Raw query strings
// ============================================================

/// Query string of `GET /api/v1/pr`.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct PullRequestQuery {
    pub project: Option<String>,
    pub repository: Option<String>,
    pub state: Option<String>,
}

/// Query string of `GET /api/v1/pr/change`.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct PullRequestChangeQuery {
    pub project: Option<String>,
    pub repository: Option<String>,
    pub pull_request_id: Option<String>,
}

/// Query string of `GET /api/v1/pr/diff`.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct PullRequestDiffQuery {
    pub project: Option<String>,
    pub repository: Option<String>,
    pub pull_request_id: Option<String>,
    pub path: Option<String>,
    pub context_lines: Option<String>,
}

// ============================================================
// Validated parameters
// ============================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListPullRequests {
    pub project: String,
    pub repository: String,
    pub state: PullRequestState,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListChanges {
    pub project: String,
    pub repository: String,
    pub pull_request_id: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GetDiff {
    pub project: String,
    pub repository: String,
    pub pull_request_id: u64,
    pub path: String,
    pub context_lines: Option<u32>,
}

impl PullRequestQuery {
    pub fn validate(self) -> Result<ListPullRequests, ValidationError> {
        Ok(ListPullRequests {
            project: required("project", self.project)?,
            repository: required("repository", self.repository)?,
            state: parse_state(self.state)?,
        })
    }
}

impl PullRequestChangeQuery {
    pub fn validate(self) -> Result<ListChanges, ValidationError> {
        Ok(ListChanges {
            project: required("project", self.project)?,
            repository: required("repository", self.repository)?,
            pull_request_id: parse_id(self.pull_request_id)?,
        })
    }
}

impl PullRequestDiffQuery {
    pub fn validate(self) -> Result<GetDiff, ValidationError> {
        let project = required("project", self.project)?;
        let repository = required("repository", self.repository)?;
        let pull_request_id = parse_id(self.pull_request_id)?;
        let path = file_path(self.path)?;
        let context_lines = match self.context_lines.filter(|v| !v.trim().is_empty()) {
            Some(raw) => Some(raw.trim().parse::<u32>().map_err(|_| {
                ValidationError::Invalid {
                    field: "context_lines",
                    message: format!("expected a non-negative integer, got '{}'", raw),
                }
            })?),
            None => None,
        };

        Ok(GetDiff {
            project,
            repository,
            pull_request_id,
            path,
            context_lines,
        })
    }
}
