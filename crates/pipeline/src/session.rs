//! Per-run session directory layout

use chrono::{DateTime, Local};
use repro_core::{Error, Result, CHECKPOINT_FILE, ENVS_DIR, LOGS_DIR, REPORT_FILE, REPO_DIR};
use std::path::{Path, PathBuf};

/// Characters of the paper title kept in the directory name
const TITLE_CHARS: usize = 50;

/// Prefix of the container image tag built for a session
const IMAGE_TAG_PREFIX: &str = "repro-";

/// Docker limits a repository name component to this many characters
const IMAGE_TAG_MAX_LEN: usize = 128;

/// Directory owning everything one run produces
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionDir {
    root: PathBuf,
}

impl SessionDir {
    /// Create `<work_dir>/<title>_<YYYYmmdd_HHMMSS>`, suffixed when taken
    pub fn create(work_dir: &Path, title: &str, now: DateTime<Local>) -> Result<Self> {
        let base = format!("{}_{}", sanitize_title(title), now.format("%Y%m%d_%H%M%S"));
        std::fs::create_dir_all(work_dir)
            .map_err(|e| Error::file_system(work_dir, "create work directory", e))?;

        let mut root = work_dir.join(&base);
        let mut n = 1;
        while root.exists() {
            root = work_dir.join(format!("{base}_{n}"));
            n += 1;
        }
        std::fs::create_dir(&root)
            .map_err(|e| Error::file_system(&root, "create session directory", e))?;
        tracing::debug!(path = %root.display(), "created session directory");
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn repo(&self) -> PathBuf {
        self.root.join(REPO_DIR)
    }

    pub fn envs(&self) -> PathBuf {
        self.root.join(ENVS_DIR)
    }

    pub fn logs(&self) -> PathBuf {
        self.root.join(LOGS_DIR)
    }

    pub fn checkpoint(&self) -> PathBuf {
        self.root.join(CHECKPOINT_FILE)
    }

    pub fn report(&self) -> PathBuf {
        self.root.join(REPORT_FILE)
    }

    /// Container image tag unique to this session
    ///
    /// Lowercase ASCII alphanumerics separated by single dashes, so the tag
    /// is a valid docker repository name.
    pub fn image_tag(&self) -> String {
        let name = self
            .root
            .file_name()
            .map(|n| n.to_string_lossy().to_ascii_lowercase())
            .unwrap_or_default();
        let mut tag = IMAGE_TAG_PREFIX.to_string();
        for c in name.chars() {
            if c.is_ascii_alphanumeric() {
                tag.push(c);
            } else if !tag.ends_with('-') {
                tag.push('-');
            }
        }
        tag.truncate(IMAGE_TAG_MAX_LEN);
        tag.trim_end_matches('-').to_string()
    }
}

/// Filesystem-safe prefix of a paper title
fn sanitize_title(title: &str) -> String {
    let title = title.trim();
    let name: String = title
        .chars()
        .take(TITLE_CHARS)
        .map(|c| {
            if c.is_alphanumeric() || c == '-' || c == '_' || c == '.' {
                c
            } else {
                '_'
            }
        })
        .collect();
    let name = name.trim_matches('.');
    if name.is_empty() {
        "unknown".to_string()
    } else {
        name.to_string()
    }
}
