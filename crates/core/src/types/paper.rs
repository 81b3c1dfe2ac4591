use serde::{Deserialize, Serialize};

/// Normalized paper metadata handed over by the ingestion collaborator
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PaperMetadata {
    pub title: String,
    pub authors: Vec<String>,
    #[serde(rename = "abstract")]
    pub abstract_text: String,
    pub github_urls: Vec<String>,
    pub arxiv_id: Option<String>,
}

impl PaperMetadata {
    /// Title for display purposes, never empty
    #[must_use]
    pub fn display_title(&self) -> &str {
        if self.title.trim().is_empty() {
            "unknown"
        } else {
            self.title.trim()
        }
    }

    /// Stable identifier used to key cached lookups derived from this paper
    #[must_use]
    pub fn cache_identifier(&self) -> String {
        match &self.arxiv_id {
            Some(id) if !id.is_empty() => format!("arxiv:{id}"),
            _ => format!("title:{}", self.display_title().to_lowercase()),
        }
    }
}
