//! Ephemeral stores (Redis).
//!
//! This module contains traits and implementations for ephemeral data
//! storage. All data stored here has automatic TTL-based expiration, and all
//! of it is advisory: losing an entry can make the service more permissive
//! (a cooldown resets) or slower (a listing rebuild), never corrupt a
//! feature row.
//!
//! ## Stores
//!
//! - **rate_limit** - submission and vote cooldown locks
//! - **listing** - the serialized feature-list response (5 min TTL)
//!
//! ## Redis Key Patterns
//!
//! ```text
//! ratelimit:submit:{user_key}              → submission cooldown (1 hour)
//! ratelimit:vote:{user_key}:{feature_id}   → vote lock (24 hours)
//! feature_list                             → serialized listing (5 minutes)
//! ```
//!
//! ## Usage
//!
//! Stores are injected into the roadmap ledger and reachable from handlers
//! via `state.stores`:
//!
//! ```ignore
//! async fn handler(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
//!     let ok = state.stores.listing.health_check().await?;
//! }
//! ```

mod listing;
mod rate_limit;

pub use listing::{ListingCache, RedisListingCache, LISTING_TTL_SECS};
pub use rate_limit::{
    RateLimiter, RedisRateLimiter, SUBMIT_COOLDOWN_SECS, VOTE_COOLDOWN_SECS,
};

#[cfg(test)]
pub use listing::MockListingCache;
#[cfg(test)]
pub use rate_limit::MockRateLimiter;

use std::sync::Arc;

/// Collection of all ephemeral stores.
#[derive(Clone)]
pub struct Stores {
    pub rate_limiter: Arc<dyn RateLimiter>,
    pub listing: Arc<dyn ListingCache>,
}
