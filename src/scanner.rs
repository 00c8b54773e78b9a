use std::sync::Arc;

use crate::config::{Config, Platform, RepositoryConfig, ScanConfig};
use crate::error::Result;
use crate::events::{EventSink, ScanEvent};
use crate::insights::RepoResult;
use crate::output::render_summary;
use crate::providers::{scan_repository, ApiClient, GitHubProvider, GitLabProvider};

/// Runs first-time pass rate scans over a list of repositories.
///
/// Repositories are processed in configuration order. A repository that
/// fails is reported to the event sink and left out of the results; the
/// remaining repositories are still scanned.
pub struct Scanner {
    repositories: Vec<RepositoryConfig>,
    scan: ScanConfig,
    client: Arc<ApiClient>,
    sink: Arc<dyn EventSink>,
    results: Vec<RepoResult>,
}

impl Scanner {
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: &Config, sink: Arc<dyn EventSink>) -> Result<Self> {
        Ok(Self {
            repositories: config.repositories.clone(),
            scan: config.scan.clone(),
            client: Arc::new(ApiClient::new(&config.http)?),
            sink,
            results: Vec::new(),
        })
    }

    /// Scans every configured repository and returns the collected results.
    pub async fn run(&mut self) -> &[RepoResult] {
        self.results.clear();

        for repository in &self.repositories {
            self.sink.record(&ScanEvent::RepositoryStarted {
                platform: repository.platform,
                repo: &repository.repo,
            });

            match self.scan(repository).await {
                Ok(result) => {
                    self.sink
                        .record(&ScanEvent::RepositoryFinished { result: &result });
                    self.results.push(result);
                }
                Err(e) => {
                    let error = e.to_string();
                    self.sink.record(&ScanEvent::RepositoryFailed {
                        repo: &repository.repo,
                        error: &error,
                    });
                }
            }
        }

        &self.results
    }

    /// Scans a single repository with the adapter matching its platform.
    pub async fn scan(&self, repository: &RepositoryConfig) -> Result<RepoResult> {
        let token = repository.token.as_ref();
        let sink = self.sink.as_ref();
        let concurrency = self.scan.concurrency;

        match repository.platform {
            Platform::GitHub => {
                let provider = GitHubProvider::new(
                    Arc::clone(&self.client),
                    repository.base_url(),
                    &repository.repo,
                    token,
                    self.scan.limit,
                    self.scan.per_page,
                )?;
                scan_repository(&provider, sink, concurrency).await
            }
            Platform::GitLab => {
                let provider = GitLabProvider::new(
                    Arc::clone(&self.client),
                    repository.base_url(),
                    &repository.repo,
                    token,
                    self.scan.limit,
                    self.scan.per_page,
                    self.scan.max_jobs,
                )?;
                scan_repository(&provider, sink, concurrency).await
            }
        }
    }

    pub fn results(&self) -> &[RepoResult] {
        &self.results
    }

    pub fn into_results(self) -> Vec<RepoResult> {
        self.results
    }

    /// Tabular report over the results of the last run.
    pub fn render_summary(&self) -> String {
        render_summary(&self.results)
    }
}

#[cfg(test)]
#[allow(clippy::float_cmp)]
mod tests {
    use super::*;
    use crate::auth::Token;
    use crate::config::HttpConfig;
    use crate::events::MemorySink;
    use mockito::{Matcher, ServerGuard};

    fn config(repositories: Vec<RepositoryConfig>) -> Config {
        Config {
            repositories,
            http: HttpConfig {
                timeout_secs: 5,
                max_retries: 1,
                backoff_base_ms: 1,
                default_retry_after_secs: 1,
            },
            ..Config::default()
        }
    }

    async fn mock_json(server: &mut ServerGuard, path: &str, body: &str) {
        server
            .mock("GET", path)
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(body)
            .create_async()
            .await;
    }

    async fn github_fixture(server: &mut ServerGuard) {
        mock_json(
            server,
            "/repos/acme/widgets/pulls",
            r#"[
                {"number": 1, "merged_at": "2024-05-01T10:00:00Z"},
                {"number": 2, "merged_at": "2024-05-02T10:00:00Z"},
                {"number": 3, "merged_at": "2024-05-03T10:00:00Z"}
            ]"#,
        )
        .await;

        for (number, sha) in [(1, "sha1"), (2, "sha2"), (3, "sha3")] {
            mock_json(
                server,
                &format!("/repos/acme/widgets/pulls/{number}/commits"),
                &format!(r#"[{{"sha": "{sha}"}}]"#),
            )
            .await;
        }

        mock_json(
            server,
            "/repos/acme/widgets/commits/sha1/check-runs",
            r#"{"check_runs": [
                {"name": "build", "conclusion": "success"},
                {"name": "test", "conclusion": "success"}
            ]}"#,
        )
        .await;
        mock_json(
            server,
            "/repos/acme/widgets/commits/sha2/check-runs",
            r#"{"check_runs": [
                {"name": "build", "conclusion": "success"},
                {"name": "test", "conclusion": "failure"}
            ]}"#,
        )
        .await;
        mock_json(
            server,
            "/repos/acme/widgets/commits/sha3/check-runs",
            r#"{"check_runs": []}"#,
        )
        .await;
        mock_json(
            server,
            "/repos/acme/widgets/commits/sha3/status",
            r#"{"state": "pending", "total_count": 0}"#,
        )
        .await;
    }

    #[tokio::test]
    async fn end_to_end_github_repository() {
        let mut server = mockito::Server::new_async().await;
        github_fixture(&mut server).await;

        let repository = RepositoryConfig::new(Platform::GitHub, "acme/widgets")
            .with_base_url(server.url())
            .with_token(Token::from("ghp-test"));
        let sink = Arc::new(MemorySink::new());
        let mut scanner = Scanner::new(&config(vec![repository]), sink.clone()).unwrap();

        let results = scanner.run().await.to_vec();

        assert_eq!(results.len(), 1);
        let result = &results[0];
        assert_eq!(result.repo_name, "acme/widgets");
        assert_eq!(result.platform, "GitHub");
        assert_eq!(result.total_merged, 3);
        assert_eq!(result.first_time_passes, 1);
        assert_eq!(result.first_time_failures, 2);
        assert_eq!(result.ftpr, 33.33);

        let lines = sink.lines();
        assert_eq!(lines[0], "Processing GitHub repository: acme/widgets");
        assert!(lines
            .iter()
            .any(|line| line.contains("PR #3: first-time fail on sha3 (No checks found)")));
    }

    #[tokio::test]
    async fn failing_repository_is_omitted_and_run_continues() {
        let mut server = mockito::Server::new_async().await;
        github_fixture(&mut server).await;

        let repositories = vec![
            RepositoryConfig::new(Platform::GitHub, "not-a-valid-path").with_base_url(server.url()),
            RepositoryConfig::new(Platform::GitHub, "acme/widgets").with_base_url(server.url()),
        ];
        let sink = Arc::new(MemorySink::new());
        let mut scanner = Scanner::new(&config(repositories), sink.clone()).unwrap();

        scanner.run().await;

        assert_eq!(scanner.results().len(), 1);
        assert_eq!(scanner.results()[0].repo_name, "acme/widgets");
        assert!(sink
            .lines()
            .iter()
            .any(|line| line.starts_with("Error processing not-a-valid-path:")));
    }

    #[tokio::test]
    async fn results_follow_configuration_order() {
        let mut server = mockito::Server::new_async().await;
        github_fixture(&mut server).await;
        mock_json(
            &mut server,
            "/api/v4/projects/group%2Fproject/merge_requests",
            "[]",
        )
        .await;

        let repositories = vec![
            RepositoryConfig::new(Platform::GitLab, "group/project").with_base_url(server.url()),
            RepositoryConfig::new(Platform::GitHub, "acme/widgets").with_base_url(server.url()),
        ];
        let mut scanner = Scanner::new(&config(repositories), Arc::new(MemorySink::new())).unwrap();

        scanner.run().await;
        let results = scanner.into_results();

        let names: Vec<&str> = results.iter().map(|r| r.repo_name.as_str()).collect();
        assert_eq!(names, vec!["group/project", "acme/widgets"]);
        assert_eq!(results[0].total_merged, 0);
        assert_eq!(results[0].ftpr, 0.0);
    }

    #[tokio::test]
    async fn summary_lists_scanned_repositories() {
        let mut server = mockito::Server::new_async().await;
        github_fixture(&mut server).await;

        let repository =
            RepositoryConfig::new(Platform::GitHub, "acme/widgets").with_base_url(server.url());
        let mut scanner =
            Scanner::new(&config(vec![repository]), Arc::new(MemorySink::new())).unwrap();

        scanner.run().await;
        let summary = console::strip_ansi_codes(&scanner.render_summary()).to_string();

        assert!(summary.contains("acme/widgets"));
        assert!(summary.contains("33.33%"));
    }
}
