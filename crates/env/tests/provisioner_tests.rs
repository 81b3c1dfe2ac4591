use repro_core::{
    Dependencies, EnvironmentKind, EnvironmentPreference, Error, NodeDependencies,
    PythonDependencies, RepositoryAnalysis,
};
use repro_env::{ProvisionOptions, Provisioner, ScriptedRunner, SetupOutput};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

struct Fixture {
    _dir: TempDir,
    repo: std::path::PathBuf,
    envs: std::path::PathBuf,
}

fn fixture(files: &[&str]) -> Fixture {
    let dir = TempDir::new().unwrap();
    let repo = dir.path().join("repo");
    let envs = dir.path().join("envs");
    std::fs::create_dir_all(&repo).unwrap();
    for file in files {
        let path = repo.join(file);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, "").unwrap();
    }
    Fixture { _dir: dir, repo, envs }
}

fn python_analysis(requirements: &[&str]) -> RepositoryAnalysis {
    RepositoryAnalysis {
        languages: vec!["Python".into()],
        dependencies: Dependencies {
            python: Some(PythonDependencies {
                requirements_files: requirements.iter().map(|s| s.to_string()).collect(),
                ..Default::default()
            }),
            ..Default::default()
        },
        ..Default::default()
    }
}

fn provisioner(fx: &Fixture, runner: &ScriptedRunner, options: ProvisionOptions) -> Provisioner {
    Provisioner::with_options(&fx.envs, Arc::new(runner.clone()), options)
}

#[tokio::test]
async fn test_docker_without_dockerfile_falls_back_to_venv() {
    let fx = fixture(&["main.py"]);
    let runner = ScriptedRunner::new();
    let mut analysis = python_analysis(&[]);
    analysis.docker_support = true;
    analysis.container_files = vec!["docker-compose.yml".into()];

    let env = provisioner(&fx, &runner, ProvisionOptions::default())
        .provision(&fx.repo, &analysis, EnvironmentPreference::Auto)
        .await
        .unwrap();

    assert_eq!(env.kind, EnvironmentKind::Multi);
    assert!(env.success);
    let docker = &env.environments[0];
    assert_eq!(docker.kind, EnvironmentKind::Docker);
    assert!(!docker.success);
    assert_eq!(docker.errors, vec!["No Dockerfile found"]);
    assert_eq!(env.effective().kind, EnvironmentKind::PythonVenv);
    // Docker was never invoked
    assert!(runner.command_lines().iter().all(|c| !c.starts_with("docker")));
}

#[tokio::test]
async fn test_bad_requirements_file_does_not_abort_siblings() {
    let fx = fixture(&["bad.txt", "good.txt"]);
    let runner = ScriptedRunner::new().on("", |cmd| {
        if cmd.args.iter().any(|a| a.ends_with("bad.txt")) {
            Ok(SetupOutput::failed(1, "ERROR: No matching distribution found for torch==0.0.1"))
        } else {
            Ok(SetupOutput::ok(""))
        }
    });
    let analysis = python_analysis(&["bad.txt", "missing.txt", "good.txt"]);

    let env = provisioner(&fx, &runner, ProvisionOptions::default())
        .setup_venv(&fx.repo, &analysis)
        .await;

    assert!(env.success);
    assert_eq!(env.errors.len(), 2);
    assert!(env.errors[0].starts_with("Failed to install from bad.txt"));
    assert!(env.errors[0].contains("No matching distribution"));
    assert_eq!(env.errors[1], "Requirements file not found: missing.txt");
    assert!(runner.command_lines().iter().any(|c| c.ends_with("good.txt")));
    assert!(env.activation_command.unwrap().contains("activate"));
    assert!(env.env_vars.contains_key("VIRTUAL_ENV"));
}

#[tokio::test]
async fn test_venv_editable_install_and_python_version() {
    let fx = fixture(&["setup.py"]);
    let runner = ScriptedRunner::new();
    let mut analysis = python_analysis(&[]);
    if let Some(python) = analysis.dependencies.python.as_mut() {
        python.setup_py = true;
    }
    let options = ProvisionOptions {
        python_version: Some("3.10".into()),
        ..Default::default()
    };

    let env = provisioner(&fx, &runner, options).setup_venv(&fx.repo, &analysis).await;

    assert!(env.success);
    let lines = runner.command_lines();
    assert!(lines[0].starts_with("python3.10 -m venv"));
    assert!(lines.iter().any(|c| c.contains("install --upgrade pip")));
    assert!(lines.iter().any(|c| c.contains("install -e")));
}

#[tokio::test]
async fn test_venv_creation_failure_is_recorded() {
    let fx = fixture(&[]);
    let runner = ScriptedRunner::new().missing_tool("python3");

    let env = provisioner(&fx, &runner, ProvisionOptions::default())
        .setup_venv(&fx.repo, &python_analysis(&[]))
        .await;

    assert!(!env.success);
    assert!(env.errors[0].contains("python3 is not installed"));
}

#[tokio::test]
async fn test_missing_conda_is_labeled_and_falls_back() {
    let fx = fixture(&[]);
    let runner = ScriptedRunner::new().missing_tool("conda");
    let options = ProvisionOptions {
        prefer_conda: true,
        ..Default::default()
    };

    let env = provisioner(&fx, &runner, options)
        .provision(&fx.repo, &python_analysis(&[]), EnvironmentPreference::Auto)
        .await
        .unwrap();

    assert!(env.success);
    assert_eq!(env.environments.len(), 2);
    assert_eq!(env.environments[0].kind, EnvironmentKind::Conda);
    assert_eq!(
        env.environments[0].errors,
        vec!["Conda is not installed or not in PATH"]
    );
    assert_eq!(env.environments[1].kind, EnvironmentKind::PythonVenv);
}

#[tokio::test]
async fn test_conda_prefers_environment_file() {
    let fx = fixture(&["environment.yml"]);
    let runner = ScriptedRunner::new();
    let mut analysis = python_analysis(&[]);
    if let Some(python) = analysis.dependencies.python.as_mut() {
        python.conda_env = true;
        python.conda_files = vec!["environment.yml".into()];
    }

    let env = provisioner(&fx, &runner, ProvisionOptions::default())
        .provision(&fx.repo, &analysis, EnvironmentPreference::Conda)
        .await
        .unwrap();

    assert!(env.success);
    assert!(env.env_vars.contains_key("CONDA_PREFIX"));
    assert!(runner
        .command_lines()
        .iter()
        .any(|c| c.starts_with("conda env create -f") && c.contains("environment.yml")));
    assert!(!runner.command_lines().iter().any(|c| c.starts_with("conda create")));
}

#[tokio::test]
async fn test_docker_build_success_records_run_command() {
    let fx = fixture(&["Dockerfile"]);
    let runner = ScriptedRunner::new();
    let mut analysis = python_analysis(&[]);
    analysis.docker_support = true;
    analysis.container_files = vec!["Dockerfile".into()];

    let env = provisioner(&fx, &runner, ProvisionOptions::default())
        .provision(&fx.repo, &analysis, EnvironmentPreference::Auto)
        .await
        .unwrap();

    assert_eq!(env.kind, EnvironmentKind::Docker);
    assert!(env.success);
    assert_eq!(env.container_image(), Some("research_reproducer"));
    assert_eq!(env.run_command.as_deref(), Some("docker run -it research_reproducer"));
    // Language strategies are skipped once the container is ready
    assert!(runner.command_lines().iter().all(|c| !c.contains("-m venv")));
}

#[tokio::test]
async fn test_docker_build_timeout_is_terminal_for_strategy() {
    let fx = fixture(&["Dockerfile"]);
    let runner = ScriptedRunner::new().on("docker build", |cmd| {
        Err(Error::timeout(cmd.display(), Duration::from_secs(1800)))
    });
    let mut analysis = python_analysis(&[]);
    analysis.container_files = vec!["Dockerfile".into()];

    let env = provisioner(&fx, &runner, ProvisionOptions::default())
        .provision(&fx.repo, &analysis, EnvironmentPreference::Docker)
        .await
        .unwrap();

    assert!(!env.success);
    assert_eq!(env.errors, vec!["Docker build timed out (30 minutes)"]);
}

#[tokio::test]
async fn test_missing_docker_is_not_an_error() {
    let fx = fixture(&["Dockerfile"]);
    let runner = ScriptedRunner::new().missing_tool("docker");
    let analysis = RepositoryAnalysis {
        container_files: vec!["Dockerfile".into()],
        ..Default::default()
    };

    let env = provisioner(&fx, &runner, ProvisionOptions::default())
        .provision(&fx.repo, &analysis, EnvironmentPreference::Docker)
        .await
        .unwrap();

    assert!(!env.success);
    assert_eq!(env.errors, vec!["Docker is not installed or not in PATH"]);
}

#[tokio::test]
async fn test_node_install() {
    let fx = fixture(&["package.json"]);
    let runner = ScriptedRunner::new();
    let analysis = RepositoryAnalysis {
        languages: vec!["TypeScript".into()],
        dependencies: Dependencies {
            node: Some(NodeDependencies {
                package_json: true,
                packages: vec!["typescript".into()],
            }),
            ..Default::default()
        },
        ..Default::default()
    };

    let env = provisioner(&fx, &runner, ProvisionOptions::default())
        .provision(&fx.repo, &analysis, EnvironmentPreference::Auto)
        .await
        .unwrap();

    assert!(env.success);
    let node = env.effective();
    assert_eq!(node.kind, EnvironmentKind::Node);
    assert!(node.path_prefixes[0].ends_with("node_modules/.bin"));
    let install = runner.calls().into_iter().find(|c| c.program == "npm" && c.args == ["install"]).unwrap();
    assert_eq!(install.cwd.as_deref(), Some(fx.repo.as_path()));
}

#[tokio::test]
async fn test_node_without_manifest() {
    let fx = fixture(&[]);
    let runner = ScriptedRunner::new();
    let analysis = RepositoryAnalysis {
        languages: vec!["JavaScript".into()],
        ..Default::default()
    };

    let env = provisioner(&fx, &runner, ProvisionOptions::default())
        .setup_node(&fx.repo, &analysis)
        .await;

    assert!(!env.success);
    assert_eq!(env.errors, vec!["No package.json found"]);
}

#[tokio::test]
async fn test_python_and_node_aggregate_any_success() {
    let fx = fixture(&[]);
    let runner = ScriptedRunner::new();
    let analysis = RepositoryAnalysis {
        languages: vec!["Python".into(), "JavaScript".into()],
        ..Default::default()
    };

    let env = provisioner(&fx, &runner, ProvisionOptions::default())
        .auto_setup(&fx.repo, &analysis)
        .await;

    assert_eq!(env.kind, EnvironmentKind::Multi);
    assert!(env.success);
    assert!(env.environments[0].success);
    assert!(!env.environments[1].success);
}

#[tokio::test]
async fn test_no_supported_language() {
    let fx = fixture(&[]);
    let runner = ScriptedRunner::new();
    let analysis = RepositoryAnalysis {
        languages: vec!["R".into()],
        ..Default::default()
    };

    let env = provisioner(&fx, &runner, ProvisionOptions::default())
        .provision(&fx.repo, &analysis, EnvironmentPreference::Auto)
        .await
        .unwrap();

    assert_eq!(env.kind, EnvironmentKind::None);
    assert!(!env.success);
    assert_eq!(env.errors, vec!["No compatible environment setup found"]);
}

#[tokio::test]
async fn test_missing_repository_is_an_input_error() {
    let fx = fixture(&[]);
    let runner = ScriptedRunner::new();

    let err = provisioner(&fx, &runner, ProvisionOptions::default())
        .provision(&fx.repo.join("nope"), &RepositoryAnalysis::default(), EnvironmentPreference::Auto)
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Input { .. }));
}
