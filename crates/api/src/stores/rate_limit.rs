//! Cooldown locks for Redis.

use anyhow::Result;
use async_trait::async_trait;
use redis::AsyncCommands;

/// How long a derived identity must wait between submissions.
pub const SUBMIT_COOLDOWN_SECS: u64 = 60 * 60;
/// How long a vote lock holds before the same identity may vote again.
pub const VOTE_COOLDOWN_SECS: u64 = 24 * 60 * 60;

/// Cooldown enforcement for submissions and votes.
///
/// All methods are best-effort: the caller decides what a Redis failure
/// means (the roadmap ledger fails open, treating an unreachable cache as
/// "no lock held").
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RateLimiter: Send + Sync {
    /// Check the submission cooldown and arm it in the same step.
    ///
    /// Returns false when a cooldown is already active. The check and the
    /// write are one atomic operation with no rollback, so any validation of
    /// the submission must happen before this call.
    async fn check_and_lock_submit(&self, user_key: &str) -> Result<bool>;

    /// Whether the user currently counts as having voted for this feature.
    async fn has_voted(&self, user_key: &str, feature_id: i64) -> Result<bool>;

    /// Record a vote lock; expires on its own after the cooldown.
    async fn lock_vote(&self, user_key: &str, feature_id: i64) -> Result<()>;

    /// Remove a vote lock immediately (no TTL wait).
    async fn unlock_vote(&self, user_key: &str, feature_id: i64) -> Result<()>;
}

/// Redis implementation of RateLimiter.
#[derive(Clone)]
pub struct RedisRateLimiter {
    client: redis::Client,
}

impl RedisRateLimiter {
    pub fn new(client: redis::Client) -> Self {
        Self { client }
    }

    fn submit_key(user_key: &str) -> String {
        format!("ratelimit:submit:{}", user_key)
    }

    fn vote_key(user_key: &str, feature_id: i64) -> String {
        format!("ratelimit:vote:{}:{}", user_key, feature_id)
    }
}

#[async_trait]
impl RateLimiter for RedisRateLimiter {
    async fn check_and_lock_submit(&self, user_key: &str) -> Result<bool> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;

        // SET NX EX is both the check and the lock; nil reply means a
        // cooldown was already running.
        let armed: Option<String> = redis::cmd("SET")
            .arg(Self::submit_key(user_key))
            .arg("1")
            .arg("NX")
            .arg("EX")
            .arg(SUBMIT_COOLDOWN_SECS)
            .query_async(&mut conn)
            .await?;

        Ok(armed.is_some())
    }

    async fn has_voted(&self, user_key: &str, feature_id: i64) -> Result<bool> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;

        let present: bool = conn.exists(Self::vote_key(user_key, feature_id)).await?;
        Ok(present)
    }

    async fn lock_vote(&self, user_key: &str, feature_id: i64) -> Result<()> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;

        let _: () = conn
            .set_ex(
                Self::vote_key(user_key, feature_id),
                "1",
                VOTE_COOLDOWN_SECS,
            )
            .await?;
        Ok(())
    }

    async fn unlock_vote(&self, user_key: &str, feature_id: i64) -> Result<()> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;

        let _: i64 = conn.del(Self::vote_key(user_key, feature_id)).await?;
        Ok(())
    }
}
