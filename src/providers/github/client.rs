use std::sync::Arc;

use log::warn;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION};
use url::Url;

use crate::auth::Token;
use crate::error::{FtprError, Result};
use crate::providers::{api_root, join, ApiClient, CommitCandidate, Paginator};

use super::types::{GitHubCheckRuns, GitHubCombinedStatus, GitHubPullCommit, GitHubPullRequest};

const ACCEPT_V3: &str = "application/vnd.github.v3+json";
const MAX_COMMITS: usize = 250;
const MAX_CHECK_RUNS: usize = 1000;

/// GitHub REST v3 client scoped to one repository.
pub struct GitHubClient {
    api: Arc<ApiClient>,
    /// `{base}/repos/{owner}/{repo}/`
    repo_url: Url,
    headers: HeaderMap,
    per_page: usize,
}

impl GitHubClient {
    /// Create a new GitHub API client.
    ///
    /// # Arguments
    ///
    /// * `api` - Shared HTTP requester
    /// * `base_url` - GitHub API base URL (e.g., "https://api.github.com")
    /// * `owner` - Repository owner/organization
    /// * `repo` - Repository name
    /// * `token` - Optional GitHub personal access token
    /// * `per_page` - Page size for list endpoints
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL or token cannot be used in a request.
    pub fn new(
        api: Arc<ApiClient>,
        base_url: &str,
        owner: &str,
        repo: &str,
        token: Option<&Token>,
        per_page: usize,
    ) -> Result<Self> {
        let repo_url = join(&api_root(base_url)?, &format!("repos/{owner}/{repo}/"))?;

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static(ACCEPT_V3));

        if let Some(token) = token {
            let value = HeaderValue::from_str(&format!("token {}", token.as_str()))
                .map_err(|e| FtprError::Config(format!("Invalid GitHub token: {e}")))?;
            headers.insert(AUTHORIZATION, value);
        }

        Ok(Self {
            api,
            repo_url,
            headers,
            per_page,
        })
    }

    /// Closed pull requests (merged or not), newest first, at most `limit`.
    pub async fn fetch_closed_pulls(&self, limit: usize) -> Result<Vec<GitHubPullRequest>> {
        let url = join(&self.repo_url, "pulls")?;
        let query = [
            ("state", "closed".to_string()),
            ("sort", "created".to_string()),
            ("direction", "desc".to_string()),
        ];

        Ok(Paginator::new(self.per_page, limit)
            .collect(&self.api, &url, &self.headers, &query)
            .await)
    }

    /// Commits of a pull request, oldest first as GitHub lists them.
    pub async fn fetch_pull_commits(&self, number: u64) -> Result<Vec<CommitCandidate>> {
        let url = join(&self.repo_url, &format!("pulls/{number}/commits"))?;

        let commits: Vec<GitHubPullCommit> = Paginator::new(self.per_page, MAX_COMMITS)
            .collect(&self.api, &url, &self.headers, &[])
            .await;

        Ok(commits.into_iter().map(CommitCandidate::from).collect())
    }

    /// All check-runs of a commit, following pages until `total_count` is
    /// reached. `None` when the first page cannot be read.
    pub async fn fetch_check_runs(&self, sha: &str) -> Result<Option<GitHubCheckRuns>> {
        let url = join(&self.repo_url, &format!("commits/{sha}/check-runs"))?;
        let mut collected: Option<GitHubCheckRuns> = None;
        let mut page = 1;

        while (page - 1) * self.per_page < MAX_CHECK_RUNS {
            let query = [
                ("page", page.to_string()),
                ("per_page", self.per_page.to_string()),
            ];
            let Some(batch) = self
                .api
                .get(&url, &self.headers, &query)
                .await
                .and_then(|response| response.json::<GitHubCheckRuns>())
            else {
                break;
            };

            let batch_len = batch.check_runs.len();
            let runs = collected.get_or_insert_with(|| GitHubCheckRuns {
                total_count: batch.total_count,
                check_runs: Vec::new(),
            });
            runs.check_runs.extend(batch.check_runs);

            let complete = runs
                .total_count
                .map_or(true, |total| runs.check_runs.len() as u64 >= total);
            if complete || batch_len < self.per_page {
                break;
            }
            page += 1;
        }

        if let Some(runs) = &collected {
            if let Some(total) = runs.total_count.filter(|&t| t > runs.check_runs.len() as u64) {
                warn!(
                    "Only {} of {total} check-runs read for {sha}",
                    runs.check_runs.len()
                );
            }
        }

        Ok(collected)
    }

    pub async fn fetch_combined_status(&self, sha: &str) -> Result<Option<GitHubCombinedStatus>> {
        let url = join(&self.repo_url, &format!("commits/{sha}/status"))?;

        Ok(self
            .api
            .get(&url, &self.headers, &[])
            .await
            .and_then(|response| response.json()))
    }
}
