use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::providers::{ChangeRequest, CommitCandidate};
use crate::verdict::CheckOutcome;

/// Merge request as listed by `GET /projects/:id/merge_requests`.
#[derive(Debug, Clone, Deserialize)]
pub struct GitLabMergeRequest {
    /// Project-scoped id shown as `!iid`
    pub iid: u64,
    pub merged_at: Option<DateTime<Utc>>,
}

impl From<GitLabMergeRequest> for ChangeRequest {
    fn from(mr: GitLabMergeRequest) -> Self {
        Self {
            number: mr.iid,
            merged_at: mr.merged_at,
            label: format!("MR !{}", mr.iid),
        }
    }
}

/// Entry of `GET /projects/:id/merge_requests/:iid/commits`, newest first.
#[derive(Debug, Clone, Deserialize)]
pub struct GitLabCommit {
    pub id: String,
    pub authored_date: Option<DateTime<Utc>>,
    pub created_at: Option<DateTime<Utc>>,
}

impl From<GitLabCommit> for CommitCandidate {
    fn from(commit: GitLabCommit) -> Self {
        let timestamp = commit.authored_date.or(commit.created_at);
        Self::new(commit.id, timestamp)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct GitLabPipeline {
    pub id: u64,
    pub status: Option<String>,
}

/// A job within a GitLab CI/CD pipeline.
#[derive(Debug, Clone, Deserialize)]
pub struct GitLabJob {
    pub name: Option<String>,
    pub status: Option<String>,
}

impl From<GitLabJob> for CheckOutcome {
    fn from(job: GitLabJob) -> Self {
        Self::new(
            job.name.unwrap_or_else(|| "unknown".to_string()),
            job.status.unwrap_or_else(|| "unknown".to_string()),
        )
    }
}
