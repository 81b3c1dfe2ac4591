//! Interfaces to the external collaborators a run depends on

use async_trait::async_trait;
use repro_core::{Error, PaperMetadata, RepositoryAnalysis, RepositoryCandidate, Result};
use repro_env::{SetupCommand, ToolRunner};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

/// Resolves a paper reference (arXiv id, URL, file) into metadata
#[async_trait]
pub trait MetadataSource: Send + Sync {
    async fn fetch(&self, reference: &str) -> Result<PaperMetadata>;
}

/// Finds code repositories associated with a paper
#[async_trait]
pub trait CandidateDiscovery: Send + Sync {
    /// Candidates in ranked order
    async fn discover(&self, paper: &PaperMetadata) -> Result<Vec<RepositoryCandidate>>;
}

/// Places a candidate's code at a local path
#[async_trait]
pub trait RepositoryFetcher: Send + Sync {
    async fn fetch(&self, candidate: &RepositoryCandidate, dest: &Path) -> Result<()>;
}

/// Inspects a checked-out repository
#[async_trait]
pub trait RepositoryAnalyzer: Send + Sync {
    async fn analyze(&self, repo_path: &Path) -> Result<RepositoryAnalysis>;
}

/// Lets a person pick the candidate to run
pub trait CandidateChooser: Send + Sync {
    /// `None` when nothing was chosen
    fn choose(&self, candidates: &[RepositoryCandidate]) -> Option<RepositoryCandidate>;
}

/// The collaborators one pipeline is wired to
#[derive(Clone)]
pub struct Collaborators {
    pub metadata: Arc<dyn MetadataSource>,
    pub discovery: Arc<dyn CandidateDiscovery>,
    pub fetcher: Arc<dyn RepositoryFetcher>,
    pub analyzer: Arc<dyn RepositoryAnalyzer>,
    pub chooser: Option<Arc<dyn CandidateChooser>>,
}

/// Shallow `git clone` of the candidate URL
pub struct GitFetcher {
    runner: Arc<dyn ToolRunner>,
    timeout: Duration,
}

impl GitFetcher {
    pub fn new(runner: Arc<dyn ToolRunner>, timeout: Duration) -> Self {
        Self { runner, timeout }
    }
}

#[async_trait]
impl RepositoryFetcher for GitFetcher {
    async fn fetch(&self, candidate: &RepositoryCandidate, dest: &Path) -> Result<()> {
        let clone = SetupCommand::new("git", self.timeout)
            .args(["clone", "--depth", "1"])
            .arg(candidate.url.as_str())
            .arg(dest.to_string_lossy());
        tracing::info!(url = %candidate.url, dest = %dest.display(), "cloning repository");

        let output = self.runner.run(&clone).await?;
        if output.success() {
            Ok(())
        } else {
            Err(Error::command_execution(
                clone.display(),
                output.failure_summary(),
                output.status,
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use repro_env::{ScriptedRunner, SetupOutput};

    fn candidate() -> RepositoryCandidate {
        RepositoryCandidate::from_paper_text("https://github.com/org/model")
    }

    #[tokio::test]
    async fn test_git_clone_command() {
        let runner = ScriptedRunner::new();
        let fetcher = GitFetcher::new(Arc::new(runner.clone()), Duration::from_secs(60));

        fetcher
            .fetch(&candidate(), Path::new("/tmp/session/repo"))
            .await
            .unwrap();

        assert_eq!(
            runner.command_lines(),
            vec!["git clone --depth 1 https://github.com/org/model /tmp/session/repo".to_string()]
        );
    }

    #[tokio::test]
    async fn test_clone_failure_is_an_error() {
        let runner = ScriptedRunner::new().respond(
            "git clone",
            SetupOutput::failed(128, "fatal: repository not found"),
        );
        let fetcher = GitFetcher::new(Arc::new(runner), Duration::from_secs(60));

        let err = fetcher
            .fetch(&candidate(), Path::new("/tmp/session/repo"))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("repository not found"));
    }

    #[tokio::test]
    async fn test_missing_git() {
        let runner = ScriptedRunner::new().missing_tool("git");
        let fetcher = GitFetcher::new(Arc::new(runner), Duration::from_secs(60));

        let err = fetcher
            .fetch(&candidate(), Path::new("/tmp/session/repo"))
            .await
            .unwrap_err();
        assert!(err.is_tool_unavailable());
    }
}
