//! Automatic choice among repository candidates

use repro_core::{CandidateSource, RepositoryCandidate};

/// Pick the candidate to run
///
/// A lone candidate is taken as is. Otherwise the first official candidate
/// wins, then the first one cited in the paper's own text, then the one with
/// the most stars (earliest on ties).
pub fn select_candidate(candidates: &[RepositoryCandidate]) -> Option<&RepositoryCandidate> {
    if let [only] = candidates {
        return Some(only);
    }

    candidates
        .iter()
        .find(|c| c.is_official)
        .or_else(|| {
            candidates
                .iter()
                .find(|c| c.source == CandidateSource::PaperText)
        })
        .or_else(|| {
            candidates
                .iter()
                .rev()
                .max_by_key(|c| c.stars)
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(url: &str, stars: u64, source: CandidateSource, official: bool) -> RepositoryCandidate {
        RepositoryCandidate {
            url: url.to_string(),
            stars,
            language: Some("Python".to_string()),
            source,
            is_official: official,
            archived: false,
        }
    }

    #[test]
    fn test_empty() {
        assert!(select_candidate(&[]).is_none());
    }

    #[test]
    fn test_single_candidate_is_taken() {
        let only = [candidate("https://github.com/a/a", 0, CandidateSource::GithubSearch, false)];
        assert_eq!(select_candidate(&only).unwrap().url, "https://github.com/a/a");
    }

    #[test]
    fn test_official_beats_stars() {
        let candidates = [
            candidate("https://github.com/a/popular", 9000, CandidateSource::GithubSearch, false),
            candidate("https://github.com/b/official", 12, CandidateSource::PapersWithCode, true),
            candidate("https://github.com/c/paper", 40, CandidateSource::PaperText, false),
        ];
        assert_eq!(
            select_candidate(&candidates).unwrap().url,
            "https://github.com/b/official"
        );
    }

    #[test]
    fn test_paper_text_beats_stars() {
        let candidates = [
            candidate("https://github.com/a/popular", 9000, CandidateSource::GithubSearch, false),
            candidate("https://github.com/c/paper", 40, CandidateSource::PaperText, false),
            candidate("https://github.com/d/paper2", 50, CandidateSource::PaperText, false),
        ];
        assert_eq!(select_candidate(&candidates).unwrap().url, "https://github.com/c/paper");
    }

    #[test]
    fn test_most_stars_earliest_on_ties() {
        let candidates = [
            candidate("https://github.com/a/few", 3, CandidateSource::GithubSearch, false),
            candidate("https://github.com/b/many", 70, CandidateSource::PapersWithCode, false),
            candidate("https://github.com/c/many", 70, CandidateSource::GithubSearch, false),
        ];
        assert_eq!(select_candidate(&candidates).unwrap().url, "https://github.com/b/many");
    }
}
