use crate::provisioner::Provisioner;
use crate::runner::SetupCommand;
use repro_core::{EnvironmentDescriptor, EnvironmentKind, RepositoryAnalysis};
use std::path::Path;

impl Provisioner {
    /// Install declared Node dependencies with npm
    pub async fn setup_node(
        &self,
        repo_path: &Path,
        analysis: &RepositoryAnalysis,
    ) -> EnvironmentDescriptor {
        let mut descriptor = EnvironmentDescriptor::new(EnvironmentKind::Node);
        descriptor.locator_or_path = Some(repo_path.to_string_lossy().into_owned());

        if !self.runner.is_available("npm").await {
            descriptor.push_error("npm is not installed or not in PATH");
            return descriptor;
        }

        let declares_manifest = analysis
            .dependencies
            .node
            .as_ref()
            .is_some_and(|node| node.package_json);
        if !declares_manifest || !repo_path.join("package.json").is_file() {
            descriptor.push_error("No package.json found");
            return descriptor;
        }

        tracing::info!("installing node dependencies");
        let install = SetupCommand::new("npm", self.options.install_timeout)
            .arg("install")
            .cwd(repo_path);
        if let Err(e) = self.run_step(&install).await {
            descriptor.push_error(format!("npm install failed: {e}"));
            return descriptor;
        }

        descriptor.path_prefixes = vec![repo_path.join("node_modules").join(".bin")];
        descriptor.success = true;
        descriptor
    }
}
