use std::sync::Arc;

use log::{debug, info};

use crate::auth::Token;
use crate::config::Platform;
use crate::error::Result;
use crate::providers::{select_initial_commit, ApiClient, ChangeRequest, ListOrder, MergeRequestSource};
use crate::verdict::{reduce, CheckOutcome, Verdict};

use super::client::GitLabClient;

/// Verdict reason when no pipeline ran on the initial commit.
pub const NO_PIPELINE_FOUND: &str = "No pipeline found";

/// First-time pass rate provider for GitLab merge requests.
///
/// Unlike GitHub, a merge request whose initial commit never got a pipeline
/// counts as a failure rather than being skipped.
pub struct GitLabProvider {
    client: GitLabClient,
    project_path: String,
    limit: usize,
    max_jobs: usize,
}

impl GitLabProvider {
    /// Creates a new GitLab provider for the specified project.
    ///
    /// # Arguments
    ///
    /// * `api` - Shared HTTP requester
    /// * `base_url` - GitLab instance base URL (e.g., <https://gitlab.com>)
    /// * `project_path` - Numeric project id or path (e.g., "group/project")
    /// * `token` - Optional authentication token
    /// * `limit` - Maximum number of merged merge requests to list
    /// * `per_page` - Page size for list endpoints
    /// * `max_jobs` - Maximum number of jobs read per pipeline
    ///
    /// # Errors
    ///
    /// Returns an error if the project URL cannot be constructed.
    pub fn new(
        api: Arc<ApiClient>,
        base_url: &str,
        project_path: &str,
        token: Option<&Token>,
        limit: usize,
        per_page: usize,
        max_jobs: usize,
    ) -> Result<Self> {
        let client = GitLabClient::new(api, base_url, project_path, token, per_page)?;

        Ok(Self {
            client,
            project_path: project_path.to_string(),
            limit,
            max_jobs,
        })
    }
}

impl MergeRequestSource for GitLabProvider {
    fn platform(&self) -> Platform {
        Platform::GitLab
    }

    fn repo_name(&self) -> &str {
        &self.project_path
    }

    async fn merged_requests(&self) -> Result<Vec<ChangeRequest>> {
        let merge_requests = self.client.fetch_merged_requests(self.limit).await?;
        info!("Found {} MRs in {}", merge_requests.len(), self.project_path);

        Ok(merge_requests.into_iter().map(ChangeRequest::from).collect())
    }

    async fn initial_commit(&self, request: &ChangeRequest) -> Result<Option<String>> {
        let commits = self
            .client
            .fetch_merge_request_commits(request.number)
            .await?;

        Ok(select_initial_commit(&commits, ListOrder::NewestFirst).map(|c| c.sha.clone()))
    }

    async fn evaluate(&self, sha: &str) -> Result<Verdict> {
        let Some(pipeline) = self.client.fetch_first_pipeline(sha).await? else {
            return Ok(Verdict::unresolved(NO_PIPELINE_FOUND));
        };

        debug!(
            "Pipeline {} ({}) ran on {sha}",
            pipeline.id,
            pipeline.status.as_deref().unwrap_or("unknown")
        );

        let jobs = self
            .client
            .fetch_pipeline_jobs(pipeline.id, self.max_jobs)
            .await?;

        Ok(reduce(jobs.into_iter().map(CheckOutcome::from).collect()))
    }
}
