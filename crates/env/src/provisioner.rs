//! Environment provisioning with strategy fallback

use crate::runner::{SetupCommand, SetupOutput, ToolRunner};
use repro_core::{
    EnvironmentDescriptor, EnvironmentKind, EnvironmentPreference, Error, RepositoryAnalysis,
    Result, DEFAULT_CONDA_PYTHON, DEFAULT_IMAGE_NAME, DEFAULT_PYTHON, DOCKER_BUILD_TIMEOUT,
    INSTALL_TIMEOUT,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

/// Knobs for the individual strategies
#[derive(Debug, Clone)]
pub struct ProvisionOptions {
    /// Interpreter used to create virtual environments
    pub python: String,
    /// Specific python version; selects `python<version>` over `python`
    pub python_version: Option<String>,
    /// Python version for freshly created conda environments
    pub conda_python: String,
    pub image_name: String,
    pub install_timeout: Duration,
    pub docker_build_timeout: Duration,
    /// Try a container build first in auto mode when the repo supports it
    pub prefer_docker: bool,
    /// Use conda rather than venv for Python in auto mode
    pub prefer_conda: bool,
}

impl Default for ProvisionOptions {
    fn default() -> Self {
        Self {
            python: DEFAULT_PYTHON.to_string(),
            python_version: None,
            conda_python: DEFAULT_CONDA_PYTHON.to_string(),
            image_name: DEFAULT_IMAGE_NAME.to_string(),
            install_timeout: INSTALL_TIMEOUT,
            docker_build_timeout: DOCKER_BUILD_TIMEOUT,
            prefer_docker: true,
            prefer_conda: false,
        }
    }
}

/// Builds isolated execution environments for a repository
///
/// Missing tools and failed installs never surface as `Err`: they are
/// recorded on the returned descriptor so the caller can fall back.
pub struct Provisioner {
    pub(crate) envs_dir: PathBuf,
    pub(crate) runner: Arc<dyn ToolRunner>,
    pub(crate) options: ProvisionOptions,
}

impl Provisioner {
    pub fn new(envs_dir: impl Into<PathBuf>, runner: Arc<dyn ToolRunner>) -> Self {
        Self::with_options(envs_dir, runner, ProvisionOptions::default())
    }

    pub fn with_options(
        envs_dir: impl Into<PathBuf>,
        runner: Arc<dyn ToolRunner>,
        options: ProvisionOptions,
    ) -> Self {
        Self {
            envs_dir: envs_dir.into(),
            runner,
            options,
        }
    }

    pub fn options(&self) -> &ProvisionOptions {
        &self.options
    }

    pub fn envs_dir(&self) -> &Path {
        &self.envs_dir
    }

    /// Provision following `preference`, or the auto strategy
    ///
    /// Fails only when `repo_path` does not exist.
    pub async fn provision(
        &self,
        repo_path: &Path,
        analysis: &RepositoryAnalysis,
        preference: EnvironmentPreference,
    ) -> Result<EnvironmentDescriptor> {
        if !repo_path.is_dir() {
            return Err(Error::input(format!(
                "Repository path does not exist: {}",
                repo_path.display()
            )));
        }

        if let Err(e) = std::fs::create_dir_all(&self.envs_dir) {
            tracing::warn!(path = %self.envs_dir.display(), error = %e, "failed to create environments directory");
        }

        tracing::info!(preference = %preference, repo = %repo_path.display(), "provisioning environment");
        let descriptor = match preference {
            EnvironmentPreference::Auto => self.auto_setup(repo_path, analysis).await,
            EnvironmentPreference::Docker => self.setup_docker(repo_path, analysis).await,
            EnvironmentPreference::Conda => self.setup_conda(repo_path, analysis).await,
            EnvironmentPreference::Venv => self.setup_venv(repo_path, analysis).await,
            EnvironmentPreference::Node => self.setup_node(repo_path, analysis).await,
        };

        if descriptor.success {
            tracing::info!(kind = %descriptor.kind, "environment ready");
        } else {
            tracing::warn!(kind = %descriptor.kind, errors = ?descriptor.all_errors(), "environment setup failed");
        }
        Ok(descriptor)
    }

    /// Container first when supported and preferred, then every language
    /// strategy, aggregated under a `multi` descriptor
    pub async fn auto_setup(
        &self,
        repo_path: &Path,
        analysis: &RepositoryAnalysis,
    ) -> EnvironmentDescriptor {
        let mut attempts = Vec::new();

        if self.options.prefer_docker && analysis.docker_support {
            tracing::info!("attempting docker setup");
            let docker = self.setup_docker(repo_path, analysis).await;
            if docker.success {
                return docker;
            }
            tracing::warn!("docker setup failed, falling back to language strategies");
            attempts.push(docker);
        }

        let mut strategies = 0;

        if analysis.is_python() {
            strategies += 1;
            if self.options.prefer_conda {
                tracing::info!("attempting conda setup");
                let conda = self.setup_conda(repo_path, analysis).await;
                if conda.success {
                    attempts.push(conda);
                } else {
                    tracing::info!("conda setup failed, trying venv");
                    attempts.push(conda);
                    attempts.push(self.setup_venv(repo_path, analysis).await);
                }
            } else {
                tracing::info!("attempting python venv setup");
                attempts.push(self.setup_venv(repo_path, analysis).await);
            }
        }

        if analysis.is_node() {
            strategies += 1;
            tracing::info!("attempting node setup");
            attempts.push(self.setup_node(repo_path, analysis).await);
        }

        if strategies == 0 {
            let mut none = EnvironmentDescriptor::failed(
                EnvironmentKind::None,
                "No compatible environment setup found",
            );
            none.environments = attempts;
            return none;
        }

        EnvironmentDescriptor {
            kind: EnvironmentKind::Multi,
            success: attempts.iter().any(|d| d.success),
            environments: attempts,
            ..EnvironmentDescriptor::default()
        }
    }

    /// Run one setup command, turning runner errors into failure text
    pub(crate) async fn run_step(&self, command: &SetupCommand) -> std::result::Result<SetupOutput, String> {
        match self.runner.run(command).await {
            Ok(output) if output.success() => Ok(output),
            Ok(output) => Err(output.failure_summary()),
            Err(e) => Err(e.to_string()),
        }
    }
}

/// Directory holding executables inside a venv or conda prefix
pub(crate) fn bin_dir(prefix: &Path) -> PathBuf {
    if cfg!(windows) {
        prefix.join("Scripts")
    } else {
        prefix.join("bin")
    }
}

pub(crate) fn path_str(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}
