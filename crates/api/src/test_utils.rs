//! Shared test utilities.
//!
//! Two flavors of test double live here:
//!
//! - `TestStateBuilder` assembles an `AppState` from mockall mocks, for
//!   handler tests that only care about call/response shapes.
//! - `Memory*` fakes are real (if tiny) implementations of the store and
//!   cache traits over in-process collections, for ledger scenario tests
//!   that need actual state to evolve across calls.
//!
//! ## Usage
//!
//! ```ignore
//! let mut roadmap = MockRoadmap::new();
//! roadmap.expect_vote().returning(|_, _| Ok(43));
//!
//! let state = TestStateBuilder::new().with_roadmap(roadmap).build();
//! ```

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::Utc;

use shared::api::{Feature, FeatureStatus, ANONYMOUS_EMAIL};

use crate::config::Config;
use crate::models::StoredFeature;
use crate::repos::{FeatureStore, MockFeatureStore};
use crate::roadmap::{MockRoadmap, Roadmap, RoadmapService};
use crate::state::AppState;
use crate::stores::{ListingCache, MockListingCache, MockRateLimiter, RateLimiter, Stores};

/// Creates a test configuration with dummy values.
pub fn test_config() -> Config {
    Config {
        host: "127.0.0.1".to_string(),
        port: 3000,
        database_url: "postgres://test".to_string(),
        redis_url: "redis://test".to_string(),
        env: "test".to_string(),
        sentry_dsn: None,
    }
}

/// Creates a feature with the given id, votes, and status.
pub fn mock_feature(id: i64, votes: i64, status: FeatureStatus) -> Feature {
    Feature {
        id,
        title: format!("Feature {}", id),
        description: "Something the community asked for".to_string(),
        votes,
        status,
        submitted: Utc::now(),
        email: ANONYMOUS_EMAIL.to_string(),
    }
}

/// Builder for constructing test `AppState` with custom mocks.
///
/// Uses default (empty) mocks for anything not explicitly set, so tests only
/// configure what they actually exercise.
pub struct TestStateBuilder {
    store: Option<MockFeatureStore>,
    rate_limiter: Option<MockRateLimiter>,
    listing: Option<MockListingCache>,
    roadmap: Option<MockRoadmap>,
}

impl TestStateBuilder {
    pub fn new() -> Self {
        Self {
            store: None,
            rate_limiter: None,
            listing: None,
            roadmap: None,
        }
    }

    pub fn with_store(mut self, store: MockFeatureStore) -> Self {
        self.store = Some(store);
        self
    }

    #[allow(dead_code)]
    pub fn with_rate_limiter(mut self, limiter: MockRateLimiter) -> Self {
        self.rate_limiter = Some(limiter);
        self
    }

    pub fn with_listing(mut self, listing: MockListingCache) -> Self {
        self.listing = Some(listing);
        self
    }

    pub fn with_roadmap(mut self, roadmap: MockRoadmap) -> Self {
        self.roadmap = Some(roadmap);
        self
    }

    /// Builds the `AppState` using configured mocks or defaults.
    pub fn build(self) -> AppState {
        let stores = Stores {
            rate_limiter: Arc::new(self.rate_limiter.unwrap_or_else(MockRateLimiter::new)),
            listing: Arc::new(self.listing.unwrap_or_else(MockListingCache::new)),
        };

        let store = Arc::new(self.store.unwrap_or_else(MockFeatureStore::new))
            as Arc<dyn FeatureStore>;
        let roadmap =
            Arc::new(self.roadmap.unwrap_or_else(MockRoadmap::new)) as Arc<dyn Roadmap>;

        AppState {
            config: test_config(),
            store,
            stores,
            roadmap,
        }
    }
}

impl Default for TestStateBuilder {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// In-memory fakes
// ============================================================================

/// In-memory FeatureStore over a plain Vec; rows are 1-based positions.
pub struct MemoryFeatureStore {
    rows: Mutex<Vec<Feature>>,
}

impl MemoryFeatureStore {
    pub fn new(features: Vec<Feature>) -> Self {
        Self {
            rows: Mutex::new(features),
        }
    }

    /// Current table contents, in row order.
    pub fn snapshot(&self) -> Vec<Feature> {
        self.rows.lock().unwrap().clone()
    }
}

#[async_trait]
impl FeatureStore for MemoryFeatureStore {
    async fn health_check(&self) -> Result<bool> {
        Ok(true)
    }

    async fn read_all(&self) -> Result<Vec<StoredFeature>> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .enumerate()
            .map(|(i, feature)| StoredFeature {
                row: i as u64 + 1,
                feature: feature.clone(),
            })
            .collect())
    }

    async fn read_row(&self, row: u64) -> Result<Option<StoredFeature>> {
        let rows = self.rows.lock().unwrap();
        let index = match (row as usize).checked_sub(1) {
            Some(index) => index,
            None => return Ok(None),
        };
        Ok(rows.get(index).map(|feature| StoredFeature {
            row,
            feature: feature.clone(),
        }))
    }

    async fn append(&self, feature: &Feature) -> Result<()> {
        self.rows.lock().unwrap().push(feature.clone());
        Ok(())
    }

    async fn write_votes(&self, row: u64, votes: i64) -> Result<()> {
        let mut rows = self.rows.lock().unwrap();
        let index = (row as usize)
            .checked_sub(1)
            .ok_or_else(|| anyhow!("row {} out of range", row))?;
        let feature = rows
            .get_mut(index)
            .ok_or_else(|| anyhow!("row {} out of range", row))?;
        feature.votes = votes;
        Ok(())
    }

    async fn row_count(&self) -> Result<u64> {
        Ok(self.rows.lock().unwrap().len() as u64)
    }
}

/// In-memory RateLimiter. Entries never expire; tests that care about
/// expiry clear the state explicitly instead of waiting on clocks.
#[derive(Default)]
pub struct MemoryRateLimiter {
    submits: Mutex<HashSet<String>>,
    votes: Mutex<HashSet<(String, i64)>>,
}

impl MemoryRateLimiter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drops a submit lock, simulating TTL expiry.
    pub fn expire_submit(&self, user_key: &str) {
        self.submits.lock().unwrap().remove(user_key);
    }

    /// Drops a vote lock, simulating TTL expiry.
    pub fn expire_vote(&self, user_key: &str, feature_id: i64) {
        self.votes
            .lock()
            .unwrap()
            .remove(&(user_key.to_string(), feature_id));
    }
}

#[async_trait]
impl RateLimiter for MemoryRateLimiter {
    async fn check_and_lock_submit(&self, user_key: &str) -> Result<bool> {
        Ok(self.submits.lock().unwrap().insert(user_key.to_string()))
    }

    async fn has_voted(&self, user_key: &str, feature_id: i64) -> Result<bool> {
        Ok(self
            .votes
            .lock()
            .unwrap()
            .contains(&(user_key.to_string(), feature_id)))
    }

    async fn lock_vote(&self, user_key: &str, feature_id: i64) -> Result<()> {
        self.votes
            .lock()
            .unwrap()
            .insert((user_key.to_string(), feature_id));
        Ok(())
    }

    async fn unlock_vote(&self, user_key: &str, feature_id: i64) -> Result<()> {
        self.votes
            .lock()
            .unwrap()
            .remove(&(user_key.to_string(), feature_id));
        Ok(())
    }
}

/// In-memory ListingCache holding at most one body, like the real thing.
#[derive(Default)]
pub struct MemoryListingCache {
    body: Mutex<Option<String>>,
}

impl MemoryListingCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cached(&self) -> Option<String> {
        self.body.lock().unwrap().clone()
    }

    pub fn prime(&self, body: &str) {
        *self.body.lock().unwrap() = Some(body.to_string());
    }
}

#[async_trait]
impl ListingCache for MemoryListingCache {
    async fn health_check(&self) -> Result<bool> {
        Ok(true)
    }

    async fn get(&self) -> Result<Option<String>> {
        Ok(self.body.lock().unwrap().clone())
    }

    async fn put(&self, body: &str) -> Result<()> {
        *self.body.lock().unwrap() = Some(body.to_string());
        Ok(())
    }

    async fn invalidate(&self) -> Result<()> {
        *self.body.lock().unwrap() = None;
        Ok(())
    }
}

/// A RoadmapService over in-memory fakes, with handles kept for inspection.
pub struct MemoryRig {
    pub service: Arc<RoadmapService>,
    pub store: Arc<MemoryFeatureStore>,
    pub rate_limiter: Arc<MemoryRateLimiter>,
    pub listing: Arc<MemoryListingCache>,
}

/// Builds a ledger over in-memory fakes seeded with the given features.
pub fn memory_rig(features: Vec<Feature>) -> MemoryRig {
    let store = Arc::new(MemoryFeatureStore::new(features));
    let rate_limiter = Arc::new(MemoryRateLimiter::new());
    let listing = Arc::new(MemoryListingCache::new());

    let service = Arc::new(RoadmapService::new(
        store.clone(),
        rate_limiter.clone(),
        listing.clone(),
    ));

    MemoryRig {
        service,
        store,
        rate_limiter,
        listing,
    }
}
