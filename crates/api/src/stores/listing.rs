//! Feature-list cache for Redis.

use anyhow::Result;
use async_trait::async_trait;
use redis::AsyncCommands;

/// How long a cached listing may be served before it is recomputed.
pub const LISTING_TTL_SECS: u64 = 5 * 60;

const LISTING_KEY: &str = "feature_list";

/// Cache for the serialized feature-list response.
///
/// Holds the complete response body, so a hit is returned verbatim with no
/// re-filtering, re-sorting, or re-serialization. Mutations delete the entry
/// (invalidate-on-write) instead of updating it in place.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ListingCache: Send + Sync {
    /// Health check - verify Redis connectivity.
    async fn health_check(&self) -> Result<bool>;

    /// The cached response body, if one is live.
    async fn get(&self) -> Result<Option<String>>;

    /// Store a freshly built response body with the listing TTL.
    async fn put(&self, body: &str) -> Result<()>;

    /// Drop the cached body so the next read rebuilds from the store.
    async fn invalidate(&self) -> Result<()>;
}

/// Redis implementation of ListingCache.
#[derive(Clone)]
pub struct RedisListingCache {
    client: redis::Client,
}

impl RedisListingCache {
    pub fn new(client: redis::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ListingCache for RedisListingCache {
    async fn health_check(&self) -> Result<bool> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let result: String = redis::cmd("PING").query_async(&mut conn).await?;
        Ok(result == "PONG")
    }

    async fn get(&self) -> Result<Option<String>> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;

        let body: Option<String> = conn.get(LISTING_KEY).await?;
        Ok(body)
    }

    async fn put(&self, body: &str) -> Result<()> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;

        let _: () = conn.set_ex(LISTING_KEY, body, LISTING_TTL_SECS).await?;
        Ok(())
    }

    async fn invalidate(&self) -> Result<()> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;

        let _: i64 = conn.del(LISTING_KEY).await?;
        Ok(())
    }
}
