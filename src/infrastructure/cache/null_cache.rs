//! No-op link cache used when `REDIS_URL` is unset or Redis is unreachable.

use super::service::{CacheResult, CacheService};
use crate::domain::entities::LinkRecord;
use async_trait::async_trait;
use tracing::debug;

/// Cache that never holds a record, so every redirect reads the link store.
pub struct NullCache;

impl NullCache {
    /// Creates a new NullCache instance.
    pub fn new() -> Self {
        debug!("Using NullCache (caching disabled)");
        Self
    }
}

impl Default for NullCache {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CacheService for NullCache {
    async fn get_link(&self, _short_code: &str) -> CacheResult<Option<LinkRecord>> {
        Ok(None)
    }

    async fn set_link(&self, _record: &LinkRecord, _ttl_seconds: Option<u64>) -> CacheResult<()> {
        Ok(())
    }

    async fn health_check(&self) -> bool {
        true
    }
}
