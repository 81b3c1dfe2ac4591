use crate::provisioner::{bin_dir, path_str, Provisioner};
use crate::runner::SetupCommand;
use repro_core::{EnvironmentDescriptor, EnvironmentKind, RepositoryAnalysis};
use std::path::Path;

const VENV_NAME: &str = "venv";

impl Provisioner {
    /// Interpreter used to create the virtual environment
    pub fn venv_interpreter(&self) -> String {
        match &self.options.python_version {
            Some(version) if !version.is_empty() => format!("python{version}"),
            _ => self.options.python.clone(),
        }
    }

    /// Virtual environment with requirements and editable install
    ///
    /// The environment counts as usable once it exists. Pip upgrade and
    /// install failures are recorded but do not fail it.
    pub async fn setup_venv(
        &self,
        repo_path: &Path,
        analysis: &RepositoryAnalysis,
    ) -> EnvironmentDescriptor {
        let env_path = self.envs_dir.join(VENV_NAME);
        let mut descriptor = EnvironmentDescriptor::new(EnvironmentKind::PythonVenv);
        descriptor.locator_or_path = Some(path_str(&env_path));

        let create = SetupCommand::new(self.venv_interpreter(), self.options.install_timeout)
            .args(["-m", "venv"])
            .arg(path_str(&env_path));
        if let Err(e) = self.run_step(&create).await {
            descriptor.push_error(format!("Failed to create virtual environment: {e}"));
            return descriptor;
        }
        tracing::info!(path = %env_path.display(), "created virtual environment");

        let bin = bin_dir(&env_path);
        let (pip, python) = if cfg!(windows) {
            (bin.join("pip.exe"), bin.join("python.exe"))
        } else {
            (bin.join("pip"), bin.join("python"))
        };
        descriptor.activation_command = Some(if cfg!(windows) {
            path_str(&bin.join("activate.bat"))
        } else {
            format!("source {}", path_str(&bin.join("activate")))
        });
        descriptor.interpreter = Some(python);
        descriptor.path_prefixes = vec![bin];
        descriptor
            .env_vars
            .insert("VIRTUAL_ENV".to_string(), path_str(&env_path));
        descriptor.success = true;

        let pip = path_str(&pip);
        let upgrade = SetupCommand::new(&pip, self.options.install_timeout)
            .args(["install", "--upgrade", "pip"]);
        if let Err(e) = self.run_step(&upgrade).await {
            tracing::warn!(error = %e, "pip upgrade failed");
            descriptor.push_error(format!("Failed to upgrade pip: {e}"));
        }

        let Some(python_deps) = &analysis.dependencies.python else {
            return descriptor;
        };

        for req_file in &python_deps.requirements_files {
            let req_path = repo_path.join(req_file);
            if !req_path.is_file() {
                descriptor.push_error(format!("Requirements file not found: {req_file}"));
                continue;
            }
            tracing::info!(file = %req_file, "installing requirements");
            let install = SetupCommand::new(&pip, self.options.install_timeout)
                .args(["install", "-r"])
                .arg(path_str(&req_path))
                .cwd(repo_path);
            if let Err(e) = self.run_step(&install).await {
                tracing::warn!(file = %req_file, "requirements install failed");
                descriptor.push_error(format!("Failed to install from {req_file}: {e}"));
            }
        }

        let has_setup_py = python_deps.setup_py && repo_path.join("setup.py").is_file();
        let has_pyproject = python_deps.pyproject_toml && repo_path.join("pyproject.toml").is_file();
        if has_setup_py || has_pyproject {
            let origin = if has_setup_py { "setup.py" } else { "pyproject.toml" };
            tracing::info!(origin, "installing package in editable mode");
            let install = SetupCommand::new(&pip, self.options.install_timeout)
                .args(["install", "-e"])
                .arg(path_str(repo_path))
                .cwd(repo_path);
            if let Err(e) = self.run_step(&install).await {
                descriptor.push_error(format!("Failed to install from {origin}: {e}"));
            }
        }

        descriptor
    }
}
