use std::sync::Arc;

use log::{debug, info};

use crate::auth::Token;
use crate::config::Platform;
use crate::error::{FtprError, Result};
use crate::providers::{select_initial_commit, ApiClient, ChangeRequest, ListOrder, MergeRequestSource};
use crate::verdict::{reduce, CheckOutcome, Verdict};

use super::client::GitHubClient;

/// Name of the synthetic check built from the combined commit status.
pub const COMBINED_STATUS_CHECK: &str = "combined-status";

/// First-time pass rate provider for GitHub pull requests.
pub struct GitHubProvider {
    /// GitHub API client
    client: GitHubClient,
    /// `owner/repo`, as reported
    repo_path: String,
    /// Maximum number of closed pull requests to list
    limit: usize,
}

impl GitHubProvider {
    /// Create a new GitHub provider.
    ///
    /// # Arguments
    ///
    /// * `api` - Shared HTTP requester
    /// * `base_url` - GitHub API base URL
    /// * `repo_path` - Repository path in format "owner/repo"
    /// * `token` - Optional GitHub personal access token
    /// * `limit` - Maximum number of closed pull requests to list
    /// * `per_page` - Page size for list endpoints
    ///
    /// # Errors
    ///
    /// Returns an error if the path is not `owner/repo` or the client cannot be built.
    pub fn new(
        api: Arc<ApiClient>,
        base_url: &str,
        repo_path: &str,
        token: Option<&Token>,
        limit: usize,
        per_page: usize,
    ) -> Result<Self> {
        let parts: Vec<&str> = repo_path.split('/').collect();
        let [owner, repo] = parts.as_slice() else {
            return Err(FtprError::Config(format!(
                "Repository path must be in format 'owner/repo', got '{repo_path}'"
            )));
        };
        if owner.is_empty() || repo.is_empty() {
            return Err(FtprError::Config(format!(
                "Repository path must be in format 'owner/repo', got '{repo_path}'"
            )));
        }

        let client = GitHubClient::new(api, base_url, owner, repo, token, per_page)?;

        Ok(Self {
            client,
            repo_path: repo_path.to_string(),
            limit,
        })
    }
}

impl MergeRequestSource for GitHubProvider {
    fn platform(&self) -> Platform {
        Platform::GitHub
    }

    fn repo_name(&self) -> &str {
        &self.repo_path
    }

    /// Closed pull requests with a merge timestamp; closed-unmerged ones are dropped.
    async fn merged_requests(&self) -> Result<Vec<ChangeRequest>> {
        let pulls = self.client.fetch_closed_pulls(self.limit).await?;
        info!("Found {} closed PRs in {}", pulls.len(), self.repo_path);

        Ok(pulls
            .into_iter()
            .map(ChangeRequest::from)
            .filter(|pr| {
                if !pr.merged() {
                    debug!("{}: skipped (closed but not merged)", pr.label);
                }
                pr.merged()
            })
            .collect())
    }

    async fn initial_commit(&self, request: &ChangeRequest) -> Result<Option<String>> {
        let commits = self.client.fetch_pull_commits(request.number).await?;

        Ok(select_initial_commit(&commits, ListOrder::OldestFirst).map(|c| c.sha.clone()))
    }

    /// Check-runs first; when a commit has none, the combined status stands in
    /// as a single synthetic check.
    async fn evaluate(&self, sha: &str) -> Result<Verdict> {
        if let Some(runs) = self.client.fetch_check_runs(sha).await? {
            if !runs.check_runs.is_empty() {
                let checks = runs
                    .check_runs
                    .into_iter()
                    .filter_map(|run| {
                        let conclusion = run.conclusion?;
                        let name = run.name.unwrap_or_else(|| "unknown".to_string());
                        Some(CheckOutcome::new(name, conclusion))
                    })
                    .collect();
                return Ok(reduce(checks));
            }
        }

        debug!("No check-runs for {sha}, falling back to combined status");

        match self.client.fetch_combined_status(sha).await? {
            Some(status) if status.total_count != Some(0) => {
                let state = status.state.unwrap_or_else(|| "unknown".to_string());
                Ok(reduce(vec![CheckOutcome::new(COMBINED_STATUS_CHECK, state)]))
            }
            _ => Ok(Verdict::no_checks()),
        }
    }
}
