use serde::{Deserialize, Serialize};

/// Where a repository candidate was discovered
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CandidateSource {
    /// Linked directly from the paper's own text
    PaperText,
    /// Listed by a paper/code catalog
    PapersWithCode,
    /// Found by a code-host search
    GithubSearch,
    #[default]
    #[serde(other)]
    Other,
}

/// A discovered code repository for a paper, not yet verified to run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RepositoryCandidate {
    pub url: String,
    pub stars: u64,
    pub language: Option<String>,
    pub source: CandidateSource,
    pub is_official: bool,
    pub archived: bool,
}

impl RepositoryCandidate {
    /// Candidate linked from the paper text
    #[must_use]
    pub fn from_paper_text(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            source: CandidateSource::PaperText,
            ..Self::default()
        }
    }
}
