//! First-time pass rate (FTPR) for merged GitHub pull requests and GitLab
//! merge requests: the share of merged changes whose initial commit passed
//! every CI check without a follow-up push.

pub mod auth;
pub mod cli;
pub mod config;
pub mod error;
pub mod events;
pub mod insights;
pub mod output;
pub mod providers;
pub mod scanner;
pub mod verdict;

pub use error::{FtprError, Result};
pub use insights::RepoResult;
pub use scanner::Scanner;
