use std::path::Path;
use std::time::Duration;

use log::debug;
use sqlx::{Sqlite, SqliteConnection, Transaction};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use thiserror::Error;

use crate::quotation::{PersistedQuotation, QuotationReading};

const CREATE_TABLE: &str = r#"
    CREATE TABLE IF NOT EXISTS quotations (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        bid TEXT NOT NULL,
        created_at DATETIME DEFAULT CURRENT_TIMESTAMP
    )
"#;

const INSERT_QUOTATION: &str =
    "INSERT INTO quotations (bid) VALUES (?) RETURNING id, bid, created_at";

const SELECT_RECENT: &str =
    "SELECT id, bid, created_at FROM quotations ORDER BY id DESC LIMIT ?";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to open database: {0}")]
    Open(#[source] sqlx::Error),
    #[error("failed to create quotations table: {0}")]
    Schema(#[source] sqlx::Error),
    #[error("failed to insert quotation: {0}")]
    Insert(#[source] sqlx::Error),
    #[error("failed to query quotations: {0}")]
    Query(#[source] sqlx::Error),
    #[error("database did not finish within {0:?}")]
    DeadlineExceeded(Duration),
}

/// SQLite sink for quotation observations.
///
/// The pool is created once and connects lazily, so an unreachable database
/// surfaces on the first `save`, not at construction.
#[derive(Debug, Clone)]
pub struct QuotationStore {
    pool: SqlitePool,
    deadline: Duration,
}

impl QuotationStore {
    pub fn open(path: &Path, deadline: Duration) -> Self {
        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(4)
            .acquire_timeout(Duration::from_secs(3))
            .connect_lazy_with(options);

        QuotationStore { pool, deadline }
    }

    pub async fn ensure_schema(&self) -> Result<(), StoreError> {
        let mut conn = self.pool.acquire().await.map_err(StoreError::Open)?;
        create_table(&mut conn).await
    }

    /// Stores the reading's bid. Table creation and the insert share one deadline.
    ///
    /// Both run inside a transaction that is committed only once they finish in
    /// time. On expiry the transaction is dropped, which rolls back whatever the
    /// connection still executes, so a timed-out save never leaves a row behind.
    pub async fn save(&self, reading: &QuotationReading) -> Result<PersistedQuotation, StoreError> {
        let (tx, row) = tokio::time::timeout(self.deadline, self.insert(&reading.bid))
            .await
            .map_err(|_| StoreError::DeadlineExceeded(self.deadline))??;

        tx.commit().await.map_err(StoreError::Insert)?;
        debug!("Stored quotation {} with bid {}", row.id, row.bid);

        Ok(row)
    }

    async fn insert(
        &self,
        bid: &str,
    ) -> Result<(Transaction<'static, Sqlite>, PersistedQuotation), StoreError> {
        let mut tx = self.pool.begin().await.map_err(StoreError::Open)?;
        create_table(&mut tx).await?;

        let row = sqlx::query_as::<_, PersistedQuotation>(INSERT_QUOTATION)
            .bind(bid)
            .fetch_one(&mut *tx)
            .await
            .map_err(StoreError::Insert)?;

        Ok((tx, row))
    }

    /// Newest rows first. Inspection only; the request path never reads back.
    pub async fn recent(&self, limit: i64) -> Result<Vec<PersistedQuotation>, StoreError> {
        let mut conn = self.pool.acquire().await.map_err(StoreError::Open)?;
        create_table(&mut conn).await?;

        sqlx::query_as::<_, PersistedQuotation>(SELECT_RECENT)
            .bind(limit)
            .fetch_all(&mut *conn)
            .await
            .map_err(StoreError::Query)
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}

async fn create_table(conn: &mut SqliteConnection) -> Result<(), StoreError> {
    sqlx::query(CREATE_TABLE)
        .execute(conn)
        .await
        .map_err(StoreError::Schema)?;
    Ok(())
}
