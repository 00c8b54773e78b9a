use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use log::info;
use std::path::PathBuf;
use std::sync::Arc;

use crate::config::{Config, OutputFormat, Platform, RepositoryConfig};
use crate::insights::RepoResult;
use crate::output::{export_results, render_summary, ProgressSink};
use crate::scanner::Scanner;

#[derive(Parser)]
#[command(name = "ftpr")]
#[command(author, version, about = "First-Time Pass Rate for merged pull/merge requests", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file (defaults to ./ftpr.{toml,json,yaml,yml})
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[arg(short, long, global = true)]
    output: Option<PathBuf>,

    #[arg(short, long, global = true)]
    format: Option<OutputFormat>,

    #[arg(short, long, global = true, default_value_t = false)]
    pretty: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Scan repositories from the config file and the command line
    Scan {
        /// GitHub repository as owner/repo (repeatable)
        #[arg(long = "github", value_name = "OWNER/REPO")]
        github: Vec<String>,

        /// GitLab project id or path (repeatable)
        #[arg(long = "gitlab", value_name = "PROJECT")]
        gitlab: Vec<String>,

        #[arg(long)]
        github_url: Option<String>,

        #[arg(long)]
        gitlab_url: Option<String>,

        #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
        github_token: Option<String>,

        #[arg(long, env = "GITLAB_TOKEN", hide_env_values = true)]
        gitlab_token: Option<String>,

        /// Merged requests considered per repository
        #[arg(short, long)]
        limit: Option<usize>,

        /// Merged requests evaluated in parallel per repository
        #[arg(long)]
        concurrency: Option<usize>,
    },
}

/// Command-line values layered over the loaded configuration.
struct ScanOverrides<'a> {
    github: &'a [String],
    gitlab: &'a [String],
    github_url: Option<&'a str>,
    gitlab_url: Option<&'a str>,
    github_token: Option<&'a str>,
    gitlab_token: Option<&'a str>,
    limit: Option<usize>,
    concurrency: Option<usize>,
}

impl ScanOverrides<'_> {
    fn apply(&self, mut config: Config) -> Config {
        let mut add = |platform: Platform, repos: &[String], base_url: Option<&str>| {
            for repo in repos {
                let mut repository = RepositoryConfig::new(platform, repo.as_str());
                if let Some(url) = base_url {
                    repository = repository.with_base_url(url);
                }
                config.repositories.push(repository);
            }
        };
        add(Platform::GitHub, self.github, self.github_url);
        add(Platform::GitLab, self.gitlab, self.gitlab_url);

        if let Some(limit) = self.limit {
            config.scan.limit = limit;
        }
        if let Some(concurrency) = self.concurrency {
            config.scan.concurrency = concurrency;
        }

        config.with_fallback_tokens(|var| {
            let token = match var {
                "GITHUB_TOKEN" => self.github_token,
                "GITLAB_TOKEN" => self.gitlab_token,
                _ => None,
            };
            token.map(str::to_string)
        })
    }
}

impl Cli {
    async fn execute_scan(&self, overrides: &ScanOverrides<'_>) -> Result<()> {
        let config = Config::load(self.config.as_deref())?;
        let config = overrides.apply(config);

        if config.repositories.is_empty() {
            bail!("No repositories to scan: pass --github/--gitlab or add [[repositories]] to ftpr.toml");
        }

        info!("Scanning {} repositories", config.repositories.len());

        let mut scanner = Scanner::new(&config, Arc::new(ProgressSink::new()))
            .context("Failed to set up scanner")?;
        scanner.run().await;
        let results = scanner.into_results();

        let format = self.format.unwrap_or(config.output.format);
        let pretty = self.pretty || config.output.pretty;
        self.write_results(&results, format, pretty)
    }

    fn write_results(&self, results: &[RepoResult], format: OutputFormat, pretty: bool) -> Result<()> {
        let mut buffer = Vec::new();
        match format {
            OutputFormat::Summary => buffer.extend_from_slice(render_summary(results).as_bytes()),
            _ => export_results(results, format, pretty, &mut buffer)?,
        }

        if let Some(output_path) = &self.output {
            let contents = String::from_utf8_lossy(&buffer);
            std::fs::write(output_path, console::strip_ansi_codes(&contents).as_bytes())
                .with_context(|| format!("Failed to write {}", output_path.display()))?;
            info!("Results written to: {}", output_path.display());
        } else {
            print!("{}", String::from_utf8_lossy(&buffer));
        }

        Ok(())
    }

    pub async fn execute(&self) -> Result<()> {
        match &self.command {
            Commands::Scan {
                github,
                gitlab,
                github_url,
                gitlab_url,
                github_token,
                gitlab_token,
                limit,
                concurrency,
            } => {
                let overrides = ScanOverrides {
                    github,
                    gitlab,
                    github_url: github_url.as_deref(),
                    gitlab_url: gitlab_url.as_deref(),
                    github_token: github_token.as_deref(),
                    gitlab_token: gitlab_token.as_deref(),
                    limit: *limit,
                    concurrency: *concurrency,
                };
                self.execute_scan(&overrides).await
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::Token;

    fn overrides<'a>(github: &'a [String], gitlab: &'a [String]) -> ScanOverrides<'a> {
        ScanOverrides {
            github,
            gitlab,
            github_url: None,
            gitlab_url: Some("https://gitlab.example.com"),
            github_token: Some("ghp-cli"),
            gitlab_token: None,
            limit: Some(25),
            concurrency: None,
        }
    }

    #[test]
    fn test_parse_scan_command() {
        let cli = Cli::try_parse_from([
            "ftpr", "scan", "--github", "a/b", "--github", "c/d", "--gitlab", "g/p", "--format",
            "json", "--pretty",
        ])
        .unwrap();

        assert_eq!(cli.format, Some(OutputFormat::Json));
        assert!(cli.pretty);
        let Commands::Scan { github, gitlab, .. } = cli.command;
        assert_eq!(github, vec!["a/b", "c/d"]);
        assert_eq!(gitlab, vec!["g/p"]);
    }

    #[test]
    fn test_overrides_append_repositories_and_tokens() {
        let mut config = Config::default();
        config.repositories.push(
            RepositoryConfig::new(Platform::GitHub, "from/file").with_token(Token::from("ghp-file")),
        );
        let github = vec!["from/cli".to_string()];
        let gitlab = vec!["group/project".to_string()];

        let config = overrides(&github, &gitlab).apply(config);

        let repos: Vec<&str> = config.repositories.iter().map(|r| r.repo.as_str()).collect();
        assert_eq!(repos, vec!["from/file", "from/cli", "group/project"]);
        assert_eq!(config.repositories[0].token.as_ref().unwrap().as_str(), "ghp-file");
        assert_eq!(config.repositories[1].token.as_ref().unwrap().as_str(), "ghp-cli");
        assert!(config.repositories[2].token.is_none());
        assert_eq!(config.repositories[2].base_url(), "https://gitlab.example.com");
        assert_eq!(config.scan.limit, 25);
        assert_eq!(config.scan.concurrency, 1);
    }
}
