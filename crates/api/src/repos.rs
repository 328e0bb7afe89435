//! Durable storage (PostgreSQL).
//!
//! The roadmap persists exactly one thing: the feature table. It is modeled
//! the way the legacy backend left it: an append-only, row-indexed table
//! accessed one statement at a time, with no transactions. The repository is
//! abstracted behind a trait to enable mocking in tests.
//!
//! ## Usage in Handlers
//!
//! The store is accessed via `state.store` (health checks) and through the
//! roadmap ledger for everything else:
//!
//! ```ignore
//! async fn handler(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
//!     let ok = state.store.health_check().await?;
//! }
//! ```

mod features;

pub use features::{FeatureStore, PgFeatureStore};

#[cfg(test)]
pub use features::MockFeatureStore;
