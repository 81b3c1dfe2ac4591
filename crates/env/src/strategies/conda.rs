use crate::provisioner::{bin_dir, path_str, Provisioner};
use crate::runner::SetupCommand;
use repro_core::{EnvironmentDescriptor, EnvironmentKind, RepositoryAnalysis, CONDA_CREATE_TIMEOUT};
use std::path::Path;

const CONDA_ENV_NAME: &str = "conda_env";

impl Provisioner {
    /// Conda environment from an environment file, or a minimal one plus pip
    /// requirements
    pub async fn setup_conda(
        &self,
        repo_path: &Path,
        analysis: &RepositoryAnalysis,
    ) -> EnvironmentDescriptor {
        let prefix = self.envs_dir.join(CONDA_ENV_NAME);
        let prefix_str = path_str(&prefix);
        let mut descriptor = EnvironmentDescriptor::new(EnvironmentKind::Conda);
        descriptor.locator_or_path = Some(prefix_str.clone());
        descriptor.activation_command = Some(format!("conda activate {prefix_str}"));

        if !self.runner.is_available("conda").await {
            descriptor.push_error("Conda is not installed or not in PATH");
            return descriptor;
        }

        let python_deps = analysis.dependencies.python.clone().unwrap_or_default();
        let env_file = python_deps
            .conda_files
            .first()
            .filter(|_| python_deps.conda_env)
            .map(|f| repo_path.join(f));

        match env_file {
            Some(env_file) => {
                tracing::info!(file = %env_file.display(), "creating conda environment from file");
                let create = SetupCommand::new("conda", self.options.install_timeout)
                    .args(["env", "create", "-f"])
                    .arg(path_str(&env_file))
                    .arg("-p")
                    .arg(&prefix_str)
                    .cwd(repo_path);
                if let Err(e) = self.run_step(&create).await {
                    descriptor.push_error(format!("Failed to create conda environment: {e}"));
                    return descriptor;
                }
            }
            None => {
                tracing::info!(prefix = %prefix_str, "creating conda environment");
                let create = SetupCommand::new("conda", CONDA_CREATE_TIMEOUT)
                    .args(["create", "-p"])
                    .arg(&prefix_str)
                    .arg(format!("python={}", self.options.conda_python))
                    .arg("-y");
                if let Err(e) = self.run_step(&create).await {
                    descriptor.push_error(format!("Failed to create conda environment: {e}"));
                    return descriptor;
                }

                for req_file in &python_deps.requirements_files {
                    let req_path = repo_path.join(req_file);
                    if !req_path.is_file() {
                        descriptor.push_error(format!("Requirements file not found: {req_file}"));
                        continue;
                    }
                    tracing::info!(file = %req_file, "installing requirements into conda environment");
                    let install = SetupCommand::new("conda", self.options.install_timeout)
                        .args(["run", "-p"])
                        .arg(&prefix_str)
                        .args(["pip", "install", "-r"])
                        .arg(path_str(&req_path))
                        .cwd(repo_path);
                    if let Err(e) = self.run_step(&install).await {
                        descriptor.push_error(format!("Failed to install from {req_file}: {e}"));
                    }
                }
            }
        }

        descriptor.path_prefixes = vec![bin_dir(&prefix)];
        descriptor
            .env_vars
            .insert("CONDA_PREFIX".to_string(), prefix_str);
        descriptor.success = true;
        descriptor
    }
}
