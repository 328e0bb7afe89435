//! The roadmap ledger: listing, voting, and submission logic.
//!
//! All durable state lives in the feature store and all advisory state in
//! Redis; this module owns the logic between them: the read-through listing
//! cache, the cooldown checks, and the vote read-modify-write.
//!
//! ## Concurrency
//!
//! The store has no transactions, so a naive read-increment-write on the
//! votes cell loses updates under concurrency. Same-feature vote updates are
//! serialized through a per-feature async mutex, and id assignment for
//! submissions through a single service-level mutex. Appends themselves are
//! safe for concurrent callers.
//!
//! ## Cache failures
//!
//! Redis errors fail open here, by policy: an unreachable cache reads as "no
//! lock held" and "no cached listing", keeping the roadmap available at the
//! cost of cooldown enforcement. Every fail-open path logs a warning.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use tokio::sync::Mutex;

use shared::api::{
    ApiResponse, Feature, FeatureStatus, SubmitFeaturePayload, ANONYMOUS_EMAIL,
    MAX_DESCRIPTION_LENGTH, MAX_TITLE_LENGTH,
};

use crate::models::StoredFeature;
use crate::repos::FeatureStore;
use crate::stores::{ListingCache, RateLimiter};

/// Operation failures surfaced to the router.
///
/// Display strings are the user-facing messages of the legacy API and must
/// not change.
#[derive(Debug, thiserror::Error)]
pub enum RoadmapError {
    #[error("Title and description are required")]
    MissingFields,
    #[error("Title must be less than 100 characters")]
    TitleTooLong,
    #[error("Description must be less than 500 characters")]
    DescriptionTooLong,
    #[error("Please wait before submitting another feature")]
    SubmitCooldown,
    #[error("You already voted for this feature")]
    AlreadyVoted,
    #[error("You have not voted for this feature")]
    NotVoted,
    #[error("Feature not found")]
    FeatureNotFound,
    /// Store failure; detail is logged, never shown to the caller.
    #[error(transparent)]
    Store(#[from] anyhow::Error),
}

/// Roadmap operations, abstracted behind a trait to enable mocking in
/// handler tests.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Roadmap: Send + Sync {
    /// The serialized feature-list response body (cache hit, or rebuilt from
    /// the store and cached).
    async fn list(&self) -> Result<String, RoadmapError>;

    /// Cast a vote. Returns the new vote count.
    async fn vote(&self, feature_id: i64, user_key: &str) -> Result<i64, RoadmapError>;

    /// Retract a vote. Returns the new vote count (floored at zero).
    async fn unvote(&self, feature_id: i64, user_key: &str) -> Result<i64, RoadmapError>;

    /// Submit a new feature. Returns the assigned id.
    async fn submit(
        &self,
        payload: SubmitFeaturePayload,
        user_key: &str,
    ) -> Result<i64, RoadmapError>;
}

/// Production implementation of [`Roadmap`].
pub struct RoadmapService {
    store: Arc<dyn FeatureStore>,
    rate_limiter: Arc<dyn RateLimiter>,
    listing: Arc<dyn ListingCache>,
    /// Per-feature locks serializing the vote read-modify-write.
    vote_locks: DashMap<i64, Arc<Mutex<()>>>,
    /// feature id → last seen row position, to skip full scans on votes.
    /// Rows never move, but entries are verified on use anyway in case of
    /// out-of-band table maintenance.
    row_index: DashMap<i64, u64>,
    /// Serializes row-count reads against appends so concurrent submissions
    /// cannot mint the same id.
    submit_lock: Mutex<()>,
}

impl RoadmapService {
    pub fn new(
        store: Arc<dyn FeatureStore>,
        rate_limiter: Arc<dyn RateLimiter>,
        listing: Arc<dyn ListingCache>,
    ) -> Self {
        Self {
            store,
            rate_limiter,
            listing,
            vote_locks: DashMap::new(),
            row_index: DashMap::new(),
            submit_lock: Mutex::new(()),
        }
    }

    fn feature_lock(&self, feature_id: i64) -> Arc<Mutex<()>> {
        self.vote_locks.entry(feature_id).or_default().clone()
    }

    /// Locates a feature row, trying the cached row position before falling
    /// back to a full scan. First match wins on a scan: ids are expected
    /// unique but nothing in the store enforces it.
    async fn locate(&self, feature_id: i64) -> Result<Option<StoredFeature>, RoadmapError> {
        let cached_row = self.row_index.get(&feature_id).map(|entry| *entry);
        if let Some(row) = cached_row {
            match self.store.read_row(row).await? {
                Some(found) if found.feature.id == feature_id => return Ok(Some(found)),
                _ => {
                    // The row no longer holds this feature; rescan.
                    self.row_index.remove(&feature_id);
                }
            }
        }

        let rows = self.store.read_all().await?;
        let found = rows.into_iter().find(|r| r.feature.id == feature_id);
        if let Some(ref stored) = found {
            self.row_index.insert(feature_id, stored.row);
        }
        Ok(found)
    }

    async fn has_voted_fail_open(&self, user_key: &str, feature_id: i64) -> bool {
        match self.rate_limiter.has_voted(user_key, feature_id).await {
            Ok(voted) => voted,
            Err(err) => {
                tracing::warn!(error = %err, feature_id, "vote lock read failed, treating as absent");
                false
            }
        }
    }

    async fn invalidate_listing(&self) {
        if let Err(err) = self.listing.invalidate().await {
            tracing::warn!(error = %err, "listing cache invalidation failed");
        }
    }
}

fn validate(payload: &SubmitFeaturePayload) -> Result<(), RoadmapError> {
    if payload.title.is_empty() || payload.description.is_empty() {
        return Err(RoadmapError::MissingFields);
    }
    if payload.title.chars().count() > MAX_TITLE_LENGTH {
        return Err(RoadmapError::TitleTooLong);
    }
    if payload.description.chars().count() > MAX_DESCRIPTION_LENGTH {
        return Err(RoadmapError::DescriptionTooLong);
    }
    Ok(())
}

#[async_trait]
impl Roadmap for RoadmapService {
    async fn list(&self) -> Result<String, RoadmapError> {
        match self.listing.get().await {
            Ok(Some(body)) => return Ok(body),
            Ok(None) => {}
            Err(err) => {
                tracing::warn!(error = %err, "listing cache read failed, rebuilding");
            }
        }

        let rows = self.store.read_all().await?;
        let mut features: Vec<Feature> = rows
            .into_iter()
            .map(|stored| stored.feature)
            .filter(|feature| feature.status != FeatureStatus::Declined)
            .collect();
        // Stable sort: equal vote counts keep their store row order.
        features.sort_by(|a, b| b.votes.cmp(&a.votes));

        let message = if features.is_empty() {
            "No features yet"
        } else {
            "Features retrieved"
        };
        let body = serde_json::to_string(&ApiResponse::ok(message, features))
            .map_err(anyhow::Error::from)?;

        if let Err(err) = self.listing.put(&body).await {
            tracing::warn!(error = %err, "listing cache write failed");
        }

        Ok(body)
    }

    async fn vote(&self, feature_id: i64, user_key: &str) -> Result<i64, RoadmapError> {
        let lock = self.feature_lock(feature_id);
        let _guard = lock.lock().await;

        // Inside the lock, so the same user racing against themself cannot
        // slip past the cooldown check twice.
        if self.has_voted_fail_open(user_key, feature_id).await {
            return Err(RoadmapError::AlreadyVoted);
        }

        let stored = self
            .locate(feature_id)
            .await?
            .ok_or(RoadmapError::FeatureNotFound)?;
        let new_votes = stored.feature.votes + 1;
        self.store.write_votes(stored.row, new_votes).await?;

        if let Err(err) = self.rate_limiter.lock_vote(user_key, feature_id).await {
            tracing::warn!(error = %err, feature_id, "vote lock write failed, cooldown not recorded");
        }
        self.invalidate_listing().await;

        tracing::info!(feature_id, new_votes, "vote recorded");
        Ok(new_votes)
    }

    async fn unvote(&self, feature_id: i64, user_key: &str) -> Result<i64, RoadmapError> {
        let lock = self.feature_lock(feature_id);
        let _guard = lock.lock().await;

        if !self.has_voted_fail_open(user_key, feature_id).await {
            return Err(RoadmapError::NotVoted);
        }

        let stored = self
            .locate(feature_id)
            .await?
            .ok_or(RoadmapError::FeatureNotFound)?;
        // Floor at zero: the count must never go negative even if lock state
        // and the stored count disagree.
        let new_votes = (stored.feature.votes - 1).max(0);
        self.store.write_votes(stored.row, new_votes).await?;

        if let Err(err) = self.rate_limiter.unlock_vote(user_key, feature_id).await {
            tracing::warn!(error = %err, feature_id, "vote unlock failed, lock expires via TTL");
        }
        self.invalidate_listing().await;

        tracing::info!(feature_id, new_votes, "vote removed");
        Ok(new_votes)
    }

    async fn submit(
        &self,
        payload: SubmitFeaturePayload,
        user_key: &str,
    ) -> Result<i64, RoadmapError> {
        // Validation must finish before the cooldown check: the check arms
        // the lock as a side effect and there is no rollback.
        validate(&payload)?;

        let allowed = match self.rate_limiter.check_and_lock_submit(user_key).await {
            Ok(allowed) => allowed,
            Err(err) => {
                tracing::warn!(error = %err, "submit cooldown check failed, allowing");
                true
            }
        };
        if !allowed {
            return Err(RoadmapError::SubmitCooldown);
        }

        // Ids continue the stored sequence: data-row count + 1, so the first
        // feature ever submitted gets id 1.
        let serial = self.submit_lock.lock().await;
        let id = self.store.row_count().await? as i64 + 1;
        let feature = Feature {
            id,
            title: payload.title,
            description: payload.description,
            votes: 0,
            status: FeatureStatus::UnderReview,
            submitted: Utc::now(),
            email: payload
                .email
                .filter(|email| !email.is_empty())
                .unwrap_or_else(|| ANONYMOUS_EMAIL.to_string()),
        };
        self.store.append(&feature).await?;
        drop(serial);

        self.invalidate_listing().await;

        tracing::info!(feature_id = id, "feature submitted");
        Ok(id)
    }
}
