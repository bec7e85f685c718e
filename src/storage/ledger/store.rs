//! Append-only event store interface.

use async_trait::async_trait;

use crate::domain::{EventRecord, NewEvent};
use crate::infra::error::StoreError;

/// Number of records returned by `GET /logs`.
pub const DEFAULT_LIST_LIMIT: u32 = 100;

/// Persistent, append-only store of event records.
///
/// Records are never updated or deleted. Implementations must accept concurrent
/// inserts and reads.
#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// Appends a record and returns its store-assigned id.
    ///
    /// A missing timestamp is filled with the store's receipt time.
    async fn insert(&self, event: NewEvent) -> Result<i64, StoreError>;

    /// Up to `limit` records, newest first (timestamp desc, then id desc).
    async fn list_recent(&self, limit: u32) -> Result<Vec<EventRecord>, StoreError>;

    /// Reachability check used by `/health`.
    async fn ping(&self) -> Result<(), StoreError>;
}
