use chrono::Duration;
use repro_core::{
    Error, ANALYSIS_CACHE_MAX_AGE_DAYS, PAPER_CACHE_MAX_AGE_DAYS, REPOSITORY_CACHE_MAX_AGE_DAYS,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Partition of the cache, each with its own directory and max-age
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheKind {
    /// Paper metadata, stable for a long time
    Paper,
    /// Repository candidate lists
    Repository,
    /// Structural analysis of a repository, tied to a moving branch tip
    Analysis,
}

impl CacheKind {
    pub const ALL: [CacheKind; 3] = [CacheKind::Paper, CacheKind::Repository, CacheKind::Analysis];

    pub fn as_str(&self) -> &'static str {
        match self {
            CacheKind::Paper => "paper",
            CacheKind::Repository => "repository",
            CacheKind::Analysis => "analysis",
        }
    }

    /// Directory under the cache root holding this kind's entries
    pub fn dir_name(&self) -> &'static str {
        match self {
            CacheKind::Paper => "papers",
            CacheKind::Repository => "repositories",
            CacheKind::Analysis => "analysis",
        }
    }

    pub fn max_age(&self) -> Duration {
        match self {
            CacheKind::Paper => Duration::days(PAPER_CACHE_MAX_AGE_DAYS),
            CacheKind::Repository => Duration::days(REPOSITORY_CACHE_MAX_AGE_DAYS),
            CacheKind::Analysis => Duration::days(ANALYSIS_CACHE_MAX_AGE_DAYS),
        }
    }
}

impl fmt::Display for CacheKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CacheKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "paper" | "papers" => Ok(CacheKind::Paper),
            "repository" | "repositories" | "repo" | "repos" => Ok(CacheKind::Repository),
            "analysis" => Ok(CacheKind::Analysis),
            other => Err(Error::input(format!(
                "unknown cache kind '{other}' (expected paper, repository or analysis)"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_max_ages() {
        assert_eq!(CacheKind::Paper.max_age(), Duration::days(30));
        assert_eq!(CacheKind::Repository.max_age(), Duration::days(7));
        assert_eq!(CacheKind::Analysis.max_age(), Duration::days(3));
    }

    #[test]
    fn test_parse() {
        assert_eq!("papers".parse::<CacheKind>().unwrap(), CacheKind::Paper);
        assert_eq!("Repo".parse::<CacheKind>().unwrap(), CacheKind::Repository);
        assert!("images".parse::<CacheKind>().is_err());
    }
}
