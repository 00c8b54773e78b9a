use std::sync::Arc;

use reqwest::header::{HeaderMap, HeaderValue};
use url::Url;

use crate::auth::Token;
use crate::error::{FtprError, Result};
use crate::providers::{api_root, join, ApiClient, CommitCandidate, Paginator};

use super::types::{GitLabCommit, GitLabJob, GitLabMergeRequest, GitLabPipeline};

const PRIVATE_TOKEN: &str = "private-token";
const MAX_COMMITS: usize = 100;

/// GitLab REST v4 client scoped to one project.
pub struct GitLabClient {
    api: Arc<ApiClient>,
    project_url: Url,
    headers: HeaderMap,
    per_page: usize,
}

impl GitLabClient {
    pub fn new(
        api: Arc<ApiClient>,
        base_url: &str,
        project_id: &str,
        token: Option<&Token>,
        per_page: usize,
    ) -> Result<Self> {
        let api_url = join(&api_root(base_url)?, "api/v4/")?;
        let project_url = project_url(&api_url, project_id)?;

        let mut headers = HeaderMap::new();
        if let Some(token) = token {
            let value = HeaderValue::from_str(token.as_str())
                .map_err(|e| FtprError::Config(format!("Invalid GitLab token: {e}")))?;
            headers.insert(PRIVATE_TOKEN, value);
        }

        Ok(Self {
            api,
            project_url,
            headers,
            per_page,
        })
    }

    /// Merged merge requests, newest first, at most `limit`.
    pub async fn fetch_merged_requests(&self, limit: usize) -> Result<Vec<GitLabMergeRequest>> {
        let url = join(&self.project_url, "merge_requests")?;
        let query = [
            ("state", "merged".to_string()),
            ("order_by", "created_at".to_string()),
            ("sort", "desc".to_string()),
        ];

        Ok(Paginator::new(self.per_page, limit)
            .collect(&self.api, &url, &self.headers, &query)
            .await)
    }

    /// Commits of a merge request, newest first as GitLab lists them.
    pub async fn fetch_merge_request_commits(&self, iid: u64) -> Result<Vec<CommitCandidate>> {
        let url = join(&self.project_url, &format!("merge_requests/{iid}/commits"))?;

        let commits: Vec<GitLabCommit> = Paginator::new(self.per_page, MAX_COMMITS)
            .collect(&self.api, &url, &self.headers, &[])
            .await;

        Ok(commits.into_iter().map(CommitCandidate::from).collect())
    }

    /// Earliest pipeline created for `sha` (lowest id).
    pub async fn fetch_first_pipeline(&self, sha: &str) -> Result<Option<GitLabPipeline>> {
        let url = join(&self.project_url, "pipelines")?;
        let query = [
            ("sha", sha.to_string()),
            ("order_by", "id".to_string()),
            ("sort", "asc".to_string()),
            ("per_page", "1".to_string()),
        ];

        let pipelines: Option<Vec<GitLabPipeline>> = self
            .api
            .get(&url, &self.headers, &query)
            .await
            .and_then(|response| response.json());

        Ok(pipelines.and_then(|pipelines| pipelines.into_iter().next()))
    }

    pub async fn fetch_pipeline_jobs(&self, pipeline_id: u64, max_jobs: usize) -> Result<Vec<GitLabJob>> {
        let url = join(&self.project_url, &format!("pipelines/{pipeline_id}/jobs"))?;

        Ok(Paginator::new(self.per_page, max_jobs)
            .collect(&self.api, &url, &self.headers, &[])
            .await)
    }
}

/// Construct project base URL; the id is fully percent-encoded since
/// project paths contain `/`.
fn project_url(api_url: &Url, project_id: &str) -> Result<Url> {
    join(
        api_url,
        &format!("projects/{}/", urlencoding::encode(project_id)),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_project_path_is_percent_encoded() {
        let api_url = Url::parse("https://gitlab.com/api/v4/").unwrap();

        let url = project_url(&api_url, "group/sub group/project").unwrap();

        assert_eq!(
            url.as_str(),
            "https://gitlab.com/api/v4/projects/group%2Fsub%20group%2Fproject/"
        );
    }

    #[test]
    fn test_numeric_project_id_is_unchanged() {
        let api_url = Url::parse("https://gitlab.com/api/v4/").unwrap();

        let url = project_url(&api_url, "1234").unwrap();

        assert_eq!(url.as_str(), "https://gitlab.com/api/v4/projects/1234/");
    }
}
