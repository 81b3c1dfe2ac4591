//! On-disk cache entry

use crate::kind::CacheKind;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One cached payload, stored as a whole JSON file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheEntry {
    pub kind: CacheKind,
    pub key: String,
    /// Identifier the key was derived from, kept for inspection
    pub identifier: String,
    pub payload: serde_json::Value,
    pub cached_at: DateTime<Utc>,
}

impl CacheEntry {
    /// Whether the entry is still fresh at `now`
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        now.signed_duration_since(self.cached_at) < self.kind.max_age()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn entry(kind: CacheKind, age: Duration, now: DateTime<Utc>) -> CacheEntry {
        CacheEntry {
            kind,
            key: "k".into(),
            identifier: "id".into(),
            payload: serde_json::json!({}),
            cached_at: now - age,
        }
    }

    #[test]
    fn test_validity_boundaries() {
        let now = Utc::now();
        assert!(entry(CacheKind::Analysis, Duration::days(2), now).is_valid_at(now));
        assert!(!entry(CacheKind::Analysis, Duration::days(3), now).is_valid_at(now));
        assert!(entry(CacheKind::Paper, Duration::days(29), now).is_valid_at(now));
        assert!(!entry(CacheKind::Repository, Duration::days(8), now).is_valid_at(now));
    }
}
