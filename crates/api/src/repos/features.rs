//! Feature table access for PostgreSQL.

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, Pool, Postgres};

use shared::api::Feature;

use crate::models::StoredFeature;

/// Row-oriented access to the feature table.
///
/// Each call maps to a single statement and is atomic only for itself; there
/// are no transactions spanning calls. Row positions are 1-based and stable:
/// rows are appended at the end and never reordered or deleted by this
/// service.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait FeatureStore: Send + Sync {
    /// Health check - verify database connectivity.
    async fn health_check(&self) -> Result<bool>;

    /// Read every data row, in physical row order.
    async fn read_all(&self) -> Result<Vec<StoredFeature>>;

    /// Read a single row by position. None when the position is vacant.
    async fn read_row(&self, row: u64) -> Result<Option<StoredFeature>>;

    /// Append a feature as a new row at the end of the table.
    async fn append(&self, feature: &Feature) -> Result<()>;

    /// Overwrite the votes cell of one row, leaving every other column alone.
    async fn write_votes(&self, row: u64, votes: i64) -> Result<()>;

    /// Number of data rows.
    async fn row_count(&self) -> Result<u64>;
}

/// Raw row shape; column order matches the legacy layout.
#[derive(FromRow)]
struct FeatureRow {
    row_pos: i64,
    id: i64,
    title: String,
    description: String,
    votes: i64,
    status: String,
    submitted_at: DateTime<Utc>,
    email: String,
}

impl FeatureRow {
    fn into_stored(self) -> Result<StoredFeature> {
        Ok(StoredFeature {
            row: self.row_pos as u64,
            feature: Feature {
                id: self.id,
                title: self.title,
                description: self.description,
                votes: self.votes,
                status: self.status.parse()?,
                submitted: self.submitted_at,
                email: self.email,
            },
        })
    }
}

const SELECT_COLUMNS: &str =
    "SELECT row_pos, id, title, description, votes, status, submitted_at, email FROM features";

/// PostgreSQL implementation of FeatureStore.
#[derive(Clone)]
pub struct PgFeatureStore {
    pool: Pool<Postgres>,
}

impl PgFeatureStore {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl FeatureStore for PgFeatureStore {
    async fn health_check(&self) -> Result<bool> {
        let one: i32 = sqlx::query_scalar("SELECT 1").fetch_one(&self.pool).await?;
        Ok(one == 1)
    }

    async fn read_all(&self) -> Result<Vec<StoredFeature>> {
        let rows: Vec<FeatureRow> =
            sqlx::query_as(&format!("{SELECT_COLUMNS} ORDER BY row_pos"))
                .fetch_all(&self.pool)
                .await?;

        rows.into_iter().map(FeatureRow::into_stored).collect()
    }

    async fn read_row(&self, row: u64) -> Result<Option<StoredFeature>> {
        let found: Option<FeatureRow> =
            sqlx::query_as(&format!("{SELECT_COLUMNS} WHERE row_pos = $1"))
                .bind(row as i64)
                .fetch_optional(&self.pool)
                .await?;

        found.map(FeatureRow::into_stored).transpose()
    }

    async fn append(&self, feature: &Feature) -> Result<()> {
        sqlx::query(
            "INSERT INTO features (id, title, description, votes, status, submitted_at, email) \
             VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(feature.id)
        .bind(&feature.title)
        .bind(&feature.description)
        .bind(feature.votes)
        .bind(feature.status.as_str())
        .bind(feature.submitted)
        .bind(&feature.email)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn write_votes(&self, row: u64, votes: i64) -> Result<()> {
        sqlx::query("UPDATE features SET votes = $2 WHERE row_pos = $1")
            .bind(row as i64)
            .bind(votes)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn row_count(&self) -> Result<u64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM features")
            .fetch_one(&self.pool)
            .await?;
        Ok(count as u64)
    }
}
