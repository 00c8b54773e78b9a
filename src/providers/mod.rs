mod client;
mod commits;
pub mod github;
pub mod gitlab;
mod pagination;
mod scan;

pub use client::{ApiClient, ApiResponse};
pub use commits::{select_initial_commit, CommitCandidate, ListOrder};
pub use github::GitHubProvider;
pub use gitlab::GitLabProvider;
pub use pagination::Paginator;
pub use scan::{scan_repository, ChangeRequest, MergeRequestSource};

use url::Url;

use crate::error::{FtprError, Result};

/// Parses a configured base URL so that relative joins append to its path.
pub(crate) fn api_root(base_url: &str) -> Result<Url> {
    let trimmed = base_url.trim().trim_end_matches('/');
    Url::parse(&format!("{trimmed}/"))
        .map_err(|e| FtprError::Config(format!("Invalid base URL '{base_url}': {e}")))
}

pub(crate) fn join(base: &Url, path: &str) -> Result<Url> {
    base.join(path)
        .map_err(|e| FtprError::Config(format!("Invalid endpoint '{path}': {e}")))
}
