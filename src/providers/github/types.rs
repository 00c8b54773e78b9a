use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::providers::commits::CommitCandidate;
use crate::providers::scan::ChangeRequest;

/// Pull request as listed by `GET /repos/{owner}/{repo}/pulls`.
#[derive(Debug, Clone, Deserialize)]
pub struct GitHubPullRequest {
    pub number: u64,
    /// Null for pull requests closed without merging
    pub merged_at: Option<DateTime<Utc>>,
}

impl From<GitHubPullRequest> for ChangeRequest {
    fn from(pr: GitHubPullRequest) -> Self {
        Self {
            number: pr.number,
            merged_at: pr.merged_at,
            label: format!("PR #{}", pr.number),
        }
    }
}

/// Entry of `GET /repos/{owner}/{repo}/pulls/{number}/commits`.
#[derive(Debug, Clone, Deserialize)]
pub struct GitHubPullCommit {
    pub sha: String,
    #[serde(default)]
    pub commit: Option<GitHubCommitDetail>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GitHubCommitDetail {
    pub author: Option<GitHubSignature>,
    pub committer: Option<GitHubSignature>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GitHubSignature {
    pub date: Option<DateTime<Utc>>,
}

impl From<GitHubPullCommit> for CommitCandidate {
    fn from(commit: GitHubPullCommit) -> Self {
        let timestamp = commit.commit.and_then(|detail| {
            detail
                .author
                .and_then(|a| a.date)
                .or_else(|| detail.committer.and_then(|c| c.date))
        });
        Self::new(commit.sha, timestamp)
    }
}

/// Response of `GET /repos/{owner}/{repo}/commits/{sha}/check-runs`.
#[derive(Debug, Clone, Deserialize)]
pub struct GitHubCheckRuns {
    /// Runs across all pages
    pub total_count: Option<u64>,
    #[serde(default)]
    pub check_runs: Vec<GitHubCheckRun>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GitHubCheckRun {
    pub name: Option<String>,
    /// Null until the run completes
    pub conclusion: Option<String>,
}

/// Response of `GET /repos/{owner}/{repo}/commits/{sha}/status`.
#[derive(Debug, Clone, Deserialize)]
pub struct GitHubCombinedStatus {
    pub state: Option<String>,
    /// Number of individual statuses behind `state`
    pub total_count: Option<u64>,
}
