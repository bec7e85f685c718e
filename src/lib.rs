pub mod app;
pub mod crypto;
pub mod domain;
pub mod infra;
pub mod storage;
pub mod transport;

// Convenience re-exports (keeps call-sites clean)
pub use app::{LedgerClient, LedgerDispatcher, Orchestrator};
pub use crypto::hashing::{hash_bytes, hash_file, DocumentDigest};
pub use domain::{EventKind, EventRecord, NewEvent, Session};
pub use infra::ethereum;
pub use storage::ledger::{LedgerStore, MemoryLedgerStore, PostgresLedgerStore};
