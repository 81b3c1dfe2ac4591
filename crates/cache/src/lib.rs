//! Result cache for repro
//!
//! A content-addressed, TTL-scoped store for expensive external lookups.
//! Entries are partitioned by kind (paper metadata, repository candidates,
//! repository analysis), each kind with its own maximum age.
//!
//! The cache is an optimization layer only: reads treat missing, corrupt or
//! expired entries as misses, and writes log failures instead of returning
//! them.

pub mod entry;
pub mod keys;
pub mod kind;
pub mod store;

pub use entry::CacheEntry;
pub use keys::cache_key;
pub use kind::CacheKind;
pub use store::{CacheStats, ResultCache};
