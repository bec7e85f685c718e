//! Persistent event store implementation using PostgreSQL.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgConnectOptions, PgPoolOptions, PgRow};
use sqlx::{PgPool, Row};
use std::time::Duration;

use crate::domain::event::storage_precision;
use crate::domain::{EventKind, EventRecord, NewEvent};
use crate::infra::error::StoreError;
use crate::storage::ledger::store::LedgerStore;

const CREATE_TABLE_SQL: &str = r#"CREATE TABLE IF NOT EXISTS transactions (
    id BIGSERIAL PRIMARY KEY,
    "type" TEXT,
    user_address TEXT,
    document_hash TEXT,
    transaction_hash TEXT,
    verified BOOLEAN,
    error_msg TEXT,
    block_number BIGINT,
    "timestamp" TIMESTAMPTZ NOT NULL DEFAULT now()
)"#;

const CREATE_INDEX_SQL: &str =
    r#"CREATE INDEX IF NOT EXISTS transactions_timestamp_idx ON transactions ("timestamp" DESC, id DESC)"#;

/// Event store backed by the `transactions` table.
#[derive(Clone)]
pub struct PostgresLedgerStore {
    pool: PgPool,
}

impl PostgresLedgerStore {
    /// Connects with a bounded pool. Requests beyond `pool_size` queue for up to
    /// `acquire_timeout` and then fail.
    pub async fn connect(
        options: PgConnectOptions,
        pool_size: u32,
        acquire_timeout: Duration,
    ) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(pool_size)
            .acquire_timeout(acquire_timeout)
            .connect_with(options)
            .await?;
        Self::new_with_pool(pool).await
    }

    /// Wraps an existing pool and makes sure the table exists.
    pub async fn new_with_pool(pool: PgPool) -> Result<Self, StoreError> {
        sqlx::query(CREATE_TABLE_SQL).execute(&pool).await?;
        sqlx::query(CREATE_INDEX_SQL).execute(&pool).await?;
        Ok(Self { pool })
    }
}

fn row_to_record(row: &PgRow) -> Result<EventRecord, sqlx::Error> {
    let kind: Option<String> = row.try_get("type")?;
    let timestamp: DateTime<Utc> = row.try_get("timestamp")?;
    Ok(EventRecord {
        id: row.try_get("id")?,
        kind: kind.map(EventKind::from),
        user_address: row.try_get("user_address")?,
        document_hash: row.try_get("document_hash")?,
        transaction_hash: row.try_get("transaction_hash")?,
        verified: row.try_get("verified")?,
        error_msg: row.try_get("error_msg")?,
        block_number: row.try_get("block_number")?,
        timestamp,
    })
}

#[async_trait]
impl LedgerStore for PostgresLedgerStore {
    async fn insert(&self, event: NewEvent) -> Result<i64, StoreError> {
        let id: i64 = sqlx::query_scalar(
            r#"INSERT INTO transactions
               ("type", user_address, document_hash, transaction_hash, verified, error_msg, block_number, "timestamp")
               VALUES ($1, $2, $3, $4, $5, $6, $7, COALESCE($8::timestamptz, now()))
               RETURNING id"#,
        )
        .bind(event.kind.map(String::from))
        .bind(event.user_address)
        .bind(event.document_hash)
        .bind(event.transaction_hash)
        .bind(event.verified)
        .bind(event.error_msg)
        .bind(event.block_number)
        .bind(event.timestamp.map(storage_precision))
        .fetch_one(&self.pool)
        .await?;
        Ok(id)
    }

    async fn list_recent(&self, limit: u32) -> Result<Vec<EventRecord>, StoreError> {
        let rows = sqlx::query(
            r#"SELECT id, "type", user_address, document_hash, transaction_hash, verified,
                      error_msg, block_number, "timestamp"
               FROM transactions
               ORDER BY "timestamp" DESC, id DESC
               LIMIT $1"#,
        )
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await?;

        let mut records = Vec::with_capacity(rows.len());
        for row in &rows {
            records.push(row_to_record(row)?);
        }
        Ok(records)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
