//! Request-keyed caching for entity collections.
//!
//! This module sits between the view/intent layer and the repositories:
//! - reads are served from cache and deduplicated per key
//! - mutation helpers patch cached collections with repository-confirmed
//!   results, optionally revalidating with a fresh fetch
//! - the cache is a read-through layer, never a second source of truth;
//!   the local store stays canonical

mod keys;
mod layer;
mod storage;
mod traits;

pub use keys::CollectionKey;
pub use layer::CacheLayer;
pub use storage::{CacheStorage, CachedValue, MemoryStorage, NoopStorage};
pub use traits::{Cacheable, QueryKey};
