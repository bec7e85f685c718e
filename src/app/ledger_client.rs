//! Client for the ledger service plus a fire-and-forget dispatch queue.
//!
//! Actions never wait on the ledger: events go into a bounded queue that a detached
//! task drains. Delivery failures and overflow show up only in logs and in
//! [`DispatchStats`].

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde::Deserialize;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::domain::{EventRecord, NewEvent};
use crate::infra::config::LedgerClientConfig;
use crate::infra::error::TransportError;

/// Acknowledgement returned by `POST /logTransaction`.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct InsertAck {
    pub status: String,
    #[serde(rename = "insertedId")]
    pub inserted_id: i64,
}

/// HTTP client for the ledger service.
#[derive(Clone)]
pub struct LedgerClient {
    http: reqwest::Client,
    base_url: String,
}

impl LedgerClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, TransportError> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn from_config(config: &LedgerClientConfig) -> Result<Self, TransportError> {
        Self::new(config.base_url.clone(), config.timeout)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Sends one event and returns the service's acknowledgement.
    pub async fn record(&self, event: &NewEvent) -> Result<InsertAck, TransportError> {
        let resp = self
            .http
            .post(format!("{}/logTransaction", self.base_url))
            .json(event)
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            return Err(TransportError::Status { status, body });
        }
        Ok(resp.json::<InsertAck>().await?)
    }

    /// Up to `limit` most recent records, newest first.
    pub async fn fetch_recent(&self, limit: usize) -> Result<Vec<EventRecord>, TransportError> {
        let resp = self
            .http
            .get(format!("{}/logs", self.base_url))
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            return Err(TransportError::Status { status, body });
        }
        let mut records = resp.json::<Vec<EventRecord>>().await?;
        records.truncate(limit);
        Ok(records)
    }

    pub async fn health(&self) -> Result<(), TransportError> {
        let resp = self
            .http
            .get(format!("{}/health", self.base_url))
            .send()
            .await?;
        if resp.status().is_success() {
            Ok(())
        } else {
            Err(TransportError::Status {
                status: resp.status().as_u16(),
                body: resp.text().await.unwrap_or_default(),
            })
        }
    }
}

/// Where the orchestrator hands finished events. Must not block or fail.
pub trait EventSink: Send + Sync {
    fn submit(&self, event: NewEvent);
}

/// Delivery counters for the dispatch queue.
#[derive(Debug, Default)]
pub struct DispatchStats {
    delivered: AtomicU64,
    failed: AtomicU64,
    dropped: AtomicU64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DispatchSnapshot {
    pub delivered: u64,
    pub failed: u64,
    pub dropped: u64,
}

impl DispatchStats {
    pub fn snapshot(&self) -> DispatchSnapshot {
        DispatchSnapshot {
            delivered: self.delivered.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            dropped: self.dropped.load(Ordering::Relaxed),
        }
    }
}

/// Bounded outbound queue drained by a background task.
pub struct LedgerDispatcher {
    tx: Mutex<Option<mpsc::Sender<NewEvent>>>,
    worker: Mutex<Option<JoinHandle<()>>>,
    stats: Arc<DispatchStats>,
}

impl LedgerDispatcher {
    /// Starts the drain task. Must be called inside a Tokio runtime.
    pub fn spawn(client: LedgerClient, capacity: usize) -> Self {
        let (tx, mut rx) = mpsc::channel::<NewEvent>(capacity.max(1));
        let stats = Arc::new(DispatchStats::default());
        let worker_stats = stats.clone();

        let worker = tokio::spawn(async move {
            while let Some(event) = rx.recv().await {
                match client.record(&event).await {
                    Ok(ack) => {
                        worker_stats.delivered.fetch_add(1, Ordering::Relaxed);
                        debug!(inserted_id = ack.inserted_id, kind = ?event.kind, "ledger record stored");
                    }
                    Err(e) => {
                        worker_stats.failed.fetch_add(1, Ordering::Relaxed);
                        warn!(error = %e, kind = ?event.kind, "ledger logging failed");
                    }
                }
            }
        });

        Self {
            tx: Mutex::new(Some(tx)),
            worker: Mutex::new(Some(worker)),
            stats,
        }
    }

    pub fn stats(&self) -> DispatchSnapshot {
        self.stats.snapshot()
    }

    /// Stops accepting events and waits up to `grace` for the queue to drain.
    ///
    /// Returns `false` if the deadline passed with events still in flight.
    pub async fn close(&self, grace: Duration) -> bool {
        let tx = self.tx.lock().ok().and_then(|mut guard| guard.take());
        drop(tx);

        let worker = self.worker.lock().ok().and_then(|mut guard| guard.take());
        match worker {
            Some(handle) => match tokio::time::timeout(grace, handle).await {
                Ok(_) => true,
                Err(_) => {
                    warn!(?grace, "ledger queue not drained before shutdown");
                    false
                }
            },
            None => true,
        }
    }
}

impl EventSink for LedgerDispatcher {
    fn submit(&self, event: NewEvent) {
        let sender = match self.tx.lock() {
            Ok(guard) => guard.clone(),
            Err(_) => None,
        };
        let Some(sender) = sender else {
            self.stats.dropped.fetch_add(1, Ordering::Relaxed);
            warn!(kind = ?event.kind, "ledger queue closed; event dropped");
            return;
        };

        if let Err(e) = sender.try_send(event) {
            self.stats.dropped.fetch_add(1, Ordering::Relaxed);
            let reason = match e {
                mpsc::error::TrySendError::Full(_) => TransportError::Queue("full"),
                mpsc::error::TrySendError::Closed(_) => TransportError::Queue("closed"),
            };
            warn!(error = %reason, "ledger event dropped");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::EventKind;

    #[tokio::test]
    async fn unreachable_ledger_never_surfaces_to_caller() {
        let client = LedgerClient::new("http://127.0.0.1:1", Duration::from_secs(2)).unwrap();
        let dispatcher = LedgerDispatcher::spawn(client, 8);

        dispatcher.submit(NewEvent::new(EventKind::Upload).verified(true));
        dispatcher.submit(NewEvent::new(EventKind::VerifyFailed).verified(false));

        assert!(dispatcher.close(Duration::from_secs(10)).await);
        let stats = dispatcher.stats();
        assert_eq!(stats.failed, 2);
        assert_eq!(stats.delivered, 0);
    }

    #[tokio::test]
    async fn submit_after_close_is_dropped() {
        let client = LedgerClient::new("http://127.0.0.1:1", Duration::from_secs(1)).unwrap();
        let dispatcher = LedgerDispatcher::spawn(client, 1);
        assert!(dispatcher.close(Duration::from_secs(5)).await);

        dispatcher.submit(NewEvent::default());
        assert_eq!(dispatcher.stats().dropped, 1);
    }

    #[test]
    fn base_url_is_normalized() {
        let client = LedgerClient::new("http://localhost:5000/", Duration::from_secs(1)).unwrap();
        assert_eq!(client.base_url(), "http://localhost:5000");
    }
}
