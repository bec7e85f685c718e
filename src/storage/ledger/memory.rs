//! In-process event store for development runs and tests.

use async_trait::async_trait;
use chrono::Utc;
use std::sync::atomic::{AtomicI64, Ordering};
use tokio::sync::RwLock;

use crate::domain::{EventRecord, NewEvent};
use crate::infra::error::StoreError;
use crate::storage::ledger::store::LedgerStore;

/// Non-persistent store with the same ordering rules as the Postgres store.
#[derive(Default)]
pub struct MemoryLedgerStore {
    records: RwLock<Vec<EventRecord>>,
    next_id: AtomicI64,
}

impl MemoryLedgerStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

#[async_trait]
impl LedgerStore for MemoryLedgerStore {
    async fn insert(&self, event: NewEvent) -> Result<i64, StoreError> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        let record = event.into_record(id, Utc::now());
        self.records.write().await.push(record);
        Ok(id)
    }

    async fn list_recent(&self, limit: u32) -> Result<Vec<EventRecord>, StoreError> {
        let mut records = self.records.read().await.clone();
        records.sort_by(|a, b| b.timestamp.cmp(&a.timestamp).then(b.id.cmp(&a.id)));
        records.truncate(limit as usize);
        Ok(records)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::EventKind;
    use chrono::{DateTime, Duration};

    fn at(s: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
    }

    #[tokio::test]
    async fn insert_then_list_round_trips() {
        let store = MemoryLedgerStore::new();
        let event = NewEvent::new(EventKind::Upload)
            .user_address("0xabc")
            .document_hash("0x111")
            .transaction_hash("0xdead")
            .verified(true)
            .timestamp(at("2024-01-01T00:00:00Z"));

        let id = store.insert(event.clone()).await.unwrap();
        let listed = store.list_recent(100).await.unwrap();

        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0], event.into_record(id, Utc::now()));
    }

    #[tokio::test]
    async fn orders_by_timestamp_then_id_descending() {
        let store = MemoryLedgerStore::new();
        let base = at("2024-03-01T12:00:00Z");

        let older = store
            .insert(NewEvent::new(EventKind::Verify).timestamp(base - Duration::minutes(5)))
            .await
            .unwrap();
        let tie_a = store
            .insert(NewEvent::new(EventKind::Upload).timestamp(base))
            .await
            .unwrap();
        let tie_b = store
            .insert(NewEvent::new(EventKind::UploadFailed).timestamp(base))
            .await
            .unwrap();

        let ids: Vec<i64> = store
            .list_recent(10)
            .await
            .unwrap()
            .iter()
            .map(|r| r.id)
            .collect();
        assert_eq!(ids, vec![tie_b, tie_a, older]);
    }

    #[tokio::test]
    async fn respects_limit() {
        let store = MemoryLedgerStore::new();
        for _ in 0..5 {
            store.insert(NewEvent::default()).await.unwrap();
        }
        assert_eq!(store.list_recent(3).await.unwrap().len(), 3);
        assert_eq!(store.list_recent(0).await.unwrap().len(), 0);
        assert_eq!(store.len().await, 5);
    }

    #[tokio::test]
    async fn identical_payloads_get_distinct_ids() {
        let store = MemoryLedgerStore::new();
        let event = NewEvent::new(EventKind::Verify).verified(false);
        let a = store.insert(event.clone()).await.unwrap();
        let b = store.insert(event).await.unwrap();
        assert_ne!(a, b);
        assert!(b > a);
    }
}
