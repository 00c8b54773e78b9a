use std::fmt;
use std::sync::Mutex;

use log::{error, info, warn};

use crate::config::Platform;
use crate::insights::RepoResult;
use crate::verdict::Verdict;

/// Something worth reporting while repositories are scanned.
#[derive(Debug)]
pub enum ScanEvent<'a> {
    RepositoryStarted {
        platform: Platform,
        repo: &'a str,
    },
    RequestsListed {
        repo: &'a str,
        count: usize,
    },
    RequestSkipped {
        repo: &'a str,
        request: &'a str,
        reason: &'a str,
    },
    RequestEvaluated {
        repo: &'a str,
        request: &'a str,
        sha: &'a str,
        verdict: &'a Verdict,
    },
    RepositoryFinished {
        result: &'a RepoResult,
    },
    RepositoryFailed {
        repo: &'a str,
        error: &'a str,
    },
}

impl fmt::Display for ScanEvent<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RepositoryStarted { platform, repo } => {
                write!(f, "Processing {platform} repository: {repo}")
            }
            Self::RequestsListed { repo, count } => {
                write!(f, "{repo}: found {count} merged requests")
            }
            Self::RequestSkipped {
                repo,
                request,
                reason,
            } => write!(f, "{repo} {request}: skipped ({reason})"),
            Self::RequestEvaluated {
                repo,
                request,
                sha,
                verdict,
            } => {
                let sha: &str = sha;
                let short_sha = sha.get(..7).unwrap_or(sha);
                if verdict.all_passed {
                    write!(
                        f,
                        "{repo} {request}: first-time pass on {short_sha} ({} checks passed)",
                        verdict.total
                    )
                } else if let Some(reason) = &verdict.error {
                    write!(f, "{repo} {request}: first-time fail on {short_sha} ({reason})")
                } else {
                    write!(
                        f,
                        "{repo} {request}: first-time fail on {short_sha} ({}/{} checks failed)",
                        verdict.failed, verdict.total
                    )
                }
            }
            Self::RepositoryFinished { result } => write!(
                f,
                "{} {}: {}/{} merged requests passed all checks on first commit (FTPR: {:.2}%)",
                result.platform,
                result.repo_name,
                result.first_time_passes,
                result.total_merged,
                result.ftpr
            ),
            Self::RepositoryFailed { repo, error } => {
                write!(f, "Error processing {repo}: {error}")
            }
        }
    }
}

/// Receives scan events. Injected into the scanner and providers so callers
/// decide where diagnostics go.
pub trait EventSink: Send + Sync {
    fn record(&self, event: &ScanEvent<'_>);
}

/// Forwards events to the `log` facade.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

impl EventSink for LogSink {
    fn record(&self, event: &ScanEvent<'_>) {
        match event {
            ScanEvent::RequestSkipped { .. } => warn!("{event}"),
            ScanEvent::RepositoryFailed { .. } => error!("{event}"),
            ScanEvent::RequestEvaluated { verdict, .. } => {
                info!("{event}");
                for check in &verdict.checks {
                    log::debug!("  check '{}' - {}", check.name, check.status);
                }
            }
            _ => info!("{event}"),
        }
    }
}

/// Keeps rendered events in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    lines: Mutex<Vec<String>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> Vec<String> {
        self.lines
            .lock()
            .map(|lines| lines.clone())
            .unwrap_or_default()
    }
}

impl EventSink for MemorySink {
    fn record(&self, event: &ScanEvent<'_>) {
        if let Ok(mut lines) = self.lines.lock() {
            lines.push(event.to_string());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::verdict::{reduce, CheckOutcome};

    #[test]
    fn memory_sink_records_rendered_events() {
        let sink = MemorySink::new();
        let verdict = reduce(vec![
            CheckOutcome::new("build", "success"),
            CheckOutcome::new("test", "failure"),
        ]);

        sink.record(&ScanEvent::RepositoryStarted {
            platform: Platform::GitHub,
            repo: "owner/repo",
        });
        sink.record(&ScanEvent::RequestEvaluated {
            repo: "owner/repo",
            request: "PR #7",
            sha: "abcdef1234567890",
            verdict: &verdict,
        });

        let lines = sink.lines();
        assert_eq!(lines[0], "Processing GitHub repository: owner/repo");
        assert_eq!(
            lines[1],
            "owner/repo PR #7: first-time fail on abcdef1 (1/2 checks failed)"
        );
    }

    #[test]
    fn missing_checks_are_called_out() {
        let verdict = Verdict::no_checks();
        let event = ScanEvent::RequestEvaluated {
            repo: "g/p",
            request: "MR !3",
            sha: "abc",
            verdict: &verdict,
        };

        assert_eq!(
            event.to_string(),
            "g/p MR !3: first-time fail on abc (No checks found)"
        );
    }
}
