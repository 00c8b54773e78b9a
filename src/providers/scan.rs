use std::pin::pin;

use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};

use crate::config::Platform;
use crate::error::Result;
use crate::events::{EventSink, ScanEvent};
use crate::insights::{RepoResult, RequestOutcome, Tally};
use crate::verdict::Verdict;

/// Platform-neutral view of a merged pull/merge request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeRequest {
    /// PR number (GitHub) or MR iid (GitLab)
    pub number: u64,
    pub merged_at: Option<DateTime<Utc>>,
    /// Display label such as `PR #12` or `MR !7`
    pub label: String,
}

impl ChangeRequest {
    pub fn merged(&self) -> bool {
        self.merged_at.is_some()
    }
}

/// The per-platform steps of a first-time pass rate scan.
#[allow(async_fn_in_trait)]
pub trait MergeRequestSource {
    fn platform(&self) -> Platform;

    /// Repository name as reported in results.
    fn repo_name(&self) -> &str;

    /// Merged requests to evaluate, in server order.
    async fn merged_requests(&self) -> Result<Vec<ChangeRequest>>;

    /// SHA of the commit the request was opened with, if it can be resolved.
    async fn initial_commit(&self, request: &ChangeRequest) -> Result<Option<String>>;

    /// CI verdict for a commit. Missing CI data is a failing verdict, not an error.
    async fn evaluate(&self, sha: &str) -> Result<Verdict>;
}

/// Runs the four-step pipeline over every merged request of one repository.
///
/// Up to `concurrency` requests are evaluated at once. Events and tallying
/// follow server order either way. Any error aborts this repository only.
pub async fn scan_repository<S: MergeRequestSource>(
    source: &S,
    sink: &dyn EventSink,
    concurrency: usize,
) -> Result<RepoResult> {
    let repo = source.repo_name();
    let requests = source.merged_requests().await?;

    sink.record(&ScanEvent::RequestsListed {
        repo,
        count: requests.len(),
    });

    let mut evaluations = pin!(stream::iter(&requests)
        .map(|request| async move { (request, evaluate_request(source, request).await) })
        .buffered(concurrency.max(1)));

    let mut tally = Tally::default();
    while let Some((request, evaluation)) = evaluations.next().await {
        let outcome = match evaluation? {
            Evaluation::Skipped => {
                sink.record(&ScanEvent::RequestSkipped {
                    repo,
                    request: &request.label,
                    reason: "could not find initial SHA",
                });
                RequestOutcome::Skipped
            }
            Evaluation::Evaluated { sha, verdict } => {
                sink.record(&ScanEvent::RequestEvaluated {
                    repo,
                    request: &request.label,
                    sha: &sha,
                    verdict: &verdict,
                });
                if verdict.all_passed {
                    RequestOutcome::Pass
                } else {
                    RequestOutcome::Fail
                }
            }
        };
        tally.record(outcome);
    }

    Ok(RepoResult::from_tally(
        repo,
        source.platform().label(),
        &tally,
    ))
}

enum Evaluation {
    Skipped,
    Evaluated { sha: String, verdict: Verdict },
}

async fn evaluate_request<S: MergeRequestSource>(
    source: &S,
    request: &ChangeRequest,
) -> Result<Evaluation> {
    let Some(sha) = source.initial_commit(request).await? else {
        return Ok(Evaluation::Skipped);
    };

    let verdict = source.evaluate(&sha).await?;

    Ok(Evaluation::Evaluated { sha, verdict })
}
