use chrono::{Duration, Utc};
use repro_cache::{CacheKind, ResultCache};
use repro_core::{CandidateSource, PaperMetadata, RepositoryCandidate};
use tempfile::TempDir;

fn paper() -> PaperMetadata {
    PaperMetadata {
        title: "Attention Is All You Need".into(),
        authors: vec!["Vaswani".into()],
        abstract_text: "Transformers.".into(),
        github_urls: vec!["https://github.com/tensorflow/tensor2tensor".into()],
        arxiv_id: Some("1706.03762".into()),
    }
}

#[test]
fn test_round_trip() {
    let dir = TempDir::new().unwrap();
    let cache = ResultCache::new(dir.path());

    cache.set(CacheKind::Paper, "arxiv:1706.03762", &paper());

    let cached: PaperMetadata = cache.get(CacheKind::Paper, "arxiv:1706.03762").unwrap();
    assert_eq!(cached, paper());
}

#[test]
fn test_unset_identifier_is_absent() {
    let dir = TempDir::new().unwrap();
    let cache = ResultCache::new(dir.path());

    assert!(cache.get_value(CacheKind::Paper, "never-set").is_none());
}

#[test]
fn test_expired_entry_is_absent() {
    let dir = TempDir::new().unwrap();
    let cache = ResultCache::new(dir.path());
    let old = Utc::now() - Duration::days(4);

    cache.set_with_timestamp(CacheKind::Analysis, "https://github.com/a/b", &serde_json::json!({"languages": ["Python"]}), old);
    cache.set_with_timestamp(CacheKind::Paper, "https://github.com/a/b", &paper(), old);

    assert!(cache.get_value(CacheKind::Analysis, "https://github.com/a/b").is_none());
    // Same age is still fresh for the longer-lived kind
    assert!(cache.get_value(CacheKind::Paper, "https://github.com/a/b").is_some());
}

#[test]
fn test_kinds_are_isolated() {
    let dir = TempDir::new().unwrap();
    let cache = ResultCache::new(dir.path());
    let id = "https://github.com/org/repo";

    cache.set(CacheKind::Analysis, id, &serde_json::json!({"entryPoints": []}));

    assert!(cache.get_value(CacheKind::Repository, id).is_none());
    assert!(cache.get_value(CacheKind::Analysis, id).is_some());
}

#[test]
fn test_corrupt_entry_is_a_miss() {
    let dir = TempDir::new().unwrap();
    let cache = ResultCache::new(dir.path());
    let path = cache.entry_path(CacheKind::Repository, "broken");
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(&path, "{ not json").unwrap();

    assert!(cache.get_value(CacheKind::Repository, "broken").is_none());
}

#[test]
fn test_payload_shape_mismatch_is_a_miss() {
    let dir = TempDir::new().unwrap();
    let cache = ResultCache::new(dir.path());

    cache.set(CacheKind::Repository, "id", &"just a string");

    let candidates: Option<Vec<RepositoryCandidate>> = cache.get(CacheKind::Repository, "id");
    assert!(candidates.is_none());
}

#[test]
fn test_set_never_fails_on_unwritable_root() {
    let dir = TempDir::new().unwrap();
    let blocker = dir.path().join("not-a-dir");
    std::fs::write(&blocker, "file in the way").unwrap();
    let cache = ResultCache::new(&blocker);

    cache.set(CacheKind::Paper, "id", &paper());

    assert!(cache.get_value(CacheKind::Paper, "id").is_none());
}

#[test]
fn test_entry_layout() {
    let dir = TempDir::new().unwrap();
    let cache = ResultCache::new(dir.path());

    cache.set(CacheKind::Repository, "paper-1", &vec![RepositoryCandidate {
        url: "https://github.com/a/b".into(),
        stars: 10,
        source: CandidateSource::PapersWithCode,
        ..Default::default()
    }]);

    let path = cache.entry_path(CacheKind::Repository, "paper-1");
    assert!(path.starts_with(dir.path().join("repositories")));
    let raw: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(raw["identifier"], "paper-1");
    assert!(raw["cachedAt"].is_string());
    assert_eq!(raw["payload"][0]["stars"], 10);
}

#[test]
fn test_stats_and_clear() {
    let dir = TempDir::new().unwrap();
    let cache = ResultCache::new(dir.path());

    cache.set(CacheKind::Paper, "p1", &paper());
    cache.set(CacheKind::Paper, "p2", &paper());
    cache.set(CacheKind::Analysis, "a1", &serde_json::json!({}));

    let stats = cache.stats().unwrap();
    assert_eq!(stats.count(CacheKind::Paper), 2);
    assert_eq!(stats.count(CacheKind::Repository), 0);
    assert_eq!(stats.count(CacheKind::Analysis), 1);
    assert_eq!(stats.total(), 3);
    assert_eq!(stats.root, dir.path());

    assert_eq!(cache.clear(Some(CacheKind::Paper)).unwrap(), 2);
    assert_eq!(cache.stats().unwrap().total(), 1);

    assert_eq!(cache.clear(None).unwrap(), 1);
    assert_eq!(cache.stats().unwrap().total(), 0);
}
