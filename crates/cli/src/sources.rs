//! File-backed collaborators for the `run` command
//!
//! Paper metadata, candidates and analysis are read from JSON documents
//! produced by upstream tooling. Without a candidates file the paper's own
//! GitHub links are used; without an analysis file the clone's top level is
//! scanned for well-known manifests.

use async_trait::async_trait;
use repro_core::{
    EntryPoint, Error, NodeDependencies, PaperMetadata, PythonDependencies, RepositoryAnalysis,
    RepositoryCandidate, Result,
};
use repro_pipeline::{CandidateChooser, CandidateDiscovery, MetadataSource, RepositoryAnalyzer};
use serde::de::DeserializeOwned;
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};

/// Scripts tried, in order, as the Python entry point
const PYTHON_ENTRY_SCRIPTS: &[&str] = &[
    "main.py",
    "run.py",
    "train.py",
    "test.py",
    "demo.py",
    "example.py",
    "inference.py",
    "predict.py",
];

const CONDA_FILES: &[&str] = &["environment.yml", "environment.yaml"];

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::file_system(path, "read input file", e))?;
    serde_json::from_str(&content)
        .map_err(|e| Error::input(format!("invalid JSON in '{}': {e}", path.display())))
}

/// Reads paper metadata from the JSON file named by the reference
pub struct JsonPaperSource;

#[async_trait]
impl MetadataSource for JsonPaperSource {
    async fn fetch(&self, reference: &str) -> Result<PaperMetadata> {
        read_json(Path::new(reference))
    }
}

/// Candidates from a JSON file, or the paper's GitHub URLs
pub struct FileDiscovery {
    path: Option<PathBuf>,
}

impl FileDiscovery {
    pub fn new(path: Option<PathBuf>) -> Self {
        Self { path }
    }
}

#[async_trait]
impl CandidateDiscovery for FileDiscovery {
    async fn discover(&self, paper: &PaperMetadata) -> Result<Vec<RepositoryCandidate>> {
        match &self.path {
            Some(path) => read_json(path),
            None => Ok(paper
                .github_urls
                .iter()
                .map(RepositoryCandidate::from_paper_text)
                .collect()),
        }
    }
}

/// Analysis from a JSON file, or a scan of the clone
pub struct FileAnalyzer {
    path: Option<PathBuf>,
}

impl FileAnalyzer {
    pub fn new(path: Option<PathBuf>) -> Self {
        Self { path }
    }
}

#[async_trait]
impl RepositoryAnalyzer for FileAnalyzer {
    async fn analyze(&self, repo_path: &Path) -> Result<RepositoryAnalysis> {
        match &self.path {
            Some(path) => read_json(path),
            None => scan_repository(repo_path),
        }
    }
}

/// Top-level manifest scan of a checked-out repository
pub fn scan_repository(repo: &Path) -> Result<RepositoryAnalysis> {
    let entries = std::fs::read_dir(repo)
        .map_err(|e| Error::file_system(repo, "read repository", e))?;
    let mut files: Vec<String> = entries
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.path().is_file())
        .filter_map(|entry| entry.file_name().to_str().map(str::to_string))
        .collect();
    files.sort();
    let has = |name: &str| files.iter().any(|f| f == name);

    let mut analysis = RepositoryAnalysis::default();

    let requirements: Vec<String> = files
        .iter()
        .filter(|f| f.starts_with("requirements") && f.ends_with(".txt"))
        .cloned()
        .collect();
    let conda_files: Vec<String> = CONDA_FILES
        .iter()
        .filter(|f| has(f))
        .map(|f| (*f).to_string())
        .collect();
    let is_python = !requirements.is_empty()
        || has("setup.py")
        || has("pyproject.toml")
        || files.iter().any(|f| f.ends_with(".py"));

    if is_python {
        analysis.languages.push("Python".to_string());
        analysis.dependencies.python = Some(PythonDependencies {
            packages: requirement_packages(repo, &requirements),
            requirements_files: requirements,
            setup_py: has("setup.py"),
            pyproject_toml: has("pyproject.toml"),
            conda_env: !conda_files.is_empty(),
            conda_files,
        });
        analysis.entry_points.extend(
            PYTHON_ENTRY_SCRIPTS
                .iter()
                .filter(|script| has(script))
                .map(|script| EntryPoint {
                    command: format!("python {script}"),
                    file: Some((*script).to_string()),
                    kind: Some("python_script".to_string()),
                }),
        );
    }

    if has("package.json") {
        analysis.languages.push("JavaScript".to_string());
        analysis.dependencies.node = Some(NodeDependencies {
            package_json: true,
            packages: Vec::new(),
        });
        analysis.entry_points.push(EntryPoint {
            command: "npm start".to_string(),
            file: Some("package.json".to_string()),
            kind: Some("npm_script".to_string()),
        });
    }

    analysis.container_files = files
        .iter()
        .filter(|f| f.starts_with("Dockerfile") || f.starts_with("docker-compose"))
        .cloned()
        .collect();
    analysis.docker_support = analysis.dockerfile().is_some();

    tracing::debug!(
        languages = ?analysis.languages,
        entry_points = analysis.entry_points.len(),
        "scanned repository"
    );
    Ok(analysis)
}

/// Package names declared across requirements files
fn requirement_packages(repo: &Path, files: &[String]) -> Vec<String> {
    let mut packages = Vec::new();
    for file in files {
        let Ok(content) = std::fs::read_to_string(repo.join(file)) else {
            tracing::warn!(file = %file, "failed to read requirements file");
            continue;
        };
        for line in content.lines().map(str::trim) {
            if line.is_empty() || line.starts_with('#') || line.starts_with('-') {
                continue;
            }
            let name = line
                .split(|c| matches!(c, '=' | '<' | '>' | '!' | '~' | ';' | '[' | ' '))
                .next()
                .unwrap_or_default()
                .trim();
            if !name.is_empty() {
                packages.push(name.to_string());
            }
        }
    }
    packages
}

/// Numbered prompt on the terminal
pub struct PromptChooser;

impl CandidateChooser for PromptChooser {
    fn choose(&self, candidates: &[RepositoryCandidate]) -> Option<RepositoryCandidate> {
        println!("Available repositories:");
        for (i, candidate) in candidates.iter().enumerate() {
            let marker = if candidate.is_official { " (official)" } else { "" };
            println!("  {}. {} ★{}{marker}", i + 1, candidate.url, candidate.stars);
        }
        print!("Select repository [1-{}, empty to cancel]: ", candidates.len());
        std::io::stdout().flush().ok()?;

        let mut line = String::new();
        std::io::stdin().lock().read_line(&mut line).ok()?;
        let index: usize = line.trim().parse().ok()?;
        candidates.get(index.checked_sub(1)?).cloned()
    }
}
