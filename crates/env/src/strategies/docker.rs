use crate::provisioner::{path_str, Provisioner};
use crate::runner::SetupCommand;
use repro_core::{EnvironmentDescriptor, EnvironmentKind, Error, RepositoryAnalysis};
use std::path::Path;

impl Provisioner {
    /// Build an image from the first Dockerfile the analysis found
    pub async fn setup_docker(
        &self,
        repo_path: &Path,
        analysis: &RepositoryAnalysis,
    ) -> EnvironmentDescriptor {
        let image = self.options.image_name.clone();
        let mut descriptor = EnvironmentDescriptor::new(EnvironmentKind::Docker);
        descriptor.locator_or_path = Some(image.clone());

        let Some(dockerfile) = analysis.dockerfile() else {
            descriptor.push_error("No Dockerfile found");
            return descriptor;
        };

        if !self.runner.is_available("docker").await {
            descriptor.push_error("Docker is not installed or not in PATH");
            return descriptor;
        }

        tracing::info!(dockerfile, image = %image, "building docker image");
        let build = SetupCommand::new("docker", self.options.docker_build_timeout)
            .args(["build", "-f"])
            .arg(path_str(&repo_path.join(dockerfile)))
            .args(["-t", image.as_str()])
            .arg(path_str(repo_path));

        match self.runner.run(&build).await {
            Ok(output) if output.success() => {
                descriptor.success = true;
                descriptor.run_command = Some(format!("docker run -it {image}"));
                tracing::info!(image = %image, "built docker image");
            }
            Ok(output) => {
                descriptor.push_error(format!("Docker build failed: {}", output.failure_summary()));
            }
            Err(Error::Timeout { duration, .. }) => {
                descriptor.push_error(format!(
                    "Docker build timed out ({} minutes)",
                    duration.as_secs() / 60
                ));
            }
            Err(e) => descriptor.push_error(format!("Docker build failed: {e}")),
        }

        descriptor
    }
}
