mod client;
mod provider;
mod types;

pub use client::GitLabClient;
pub use provider::{GitLabProvider, NO_PIPELINE_FOUND};
