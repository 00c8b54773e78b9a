use chrono::{DateTime, Utc};

/// Order in which a platform lists the commits of a merge request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListOrder {
    /// GitHub pull request commits
    OldestFirst,
    /// GitLab merge request commits
    NewestFirst,
}

/// A commit of a merge request, with the timestamp used to order it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitCandidate {
    pub sha: String,
    pub timestamp: Option<DateTime<Utc>>,
}

impl CommitCandidate {
    pub fn new(sha: impl Into<String>, timestamp: Option<DateTime<Utc>>) -> Self {
        Self {
            sha: sha.into(),
            timestamp,
        }
    }
}

/// Picks the commit that represents the merge request as first opened.
///
/// The earliest timestamp wins when every commit carries one. Identical
/// timestamps, or any missing timestamp, fall back to the platform's listing
/// order (first entry on GitHub, last entry on GitLab).
pub fn select_initial_commit(
    commits: &[CommitCandidate],
    order: ListOrder,
) -> Option<&CommitCandidate> {
    let chronological: Vec<&CommitCandidate> = match order {
        ListOrder::OldestFirst => commits.iter().collect(),
        ListOrder::NewestFirst => commits.iter().rev().collect(),
    };

    if chronological.iter().all(|c| c.timestamp.is_some()) {
        chronological.into_iter().min_by_key(|c| c.timestamp)
    } else {
        chronological.into_iter().next()
    }
}
