//! Short-code cache in front of the link store on the redirect path.
//!
//! Cached records may carry stale click counters; resolution never reads them.
//!
//! - [`RedisCache`] - JSON records in Redis with a TTL, fail-open
//! - [`NullCache`] - always misses; used when Redis is off or unreachable

mod null_cache;
mod redis_cache;
mod service;

pub use null_cache::NullCache;
pub use redis_cache::RedisCache;
pub use service::{CacheError, CacheResult, CacheService};
