//! Client-side orchestration: ledger client, action sequencing and ledger rendering.

pub mod ledger_client;
pub mod orchestrator;
pub mod render;

pub use ledger_client::{DispatchSnapshot, EventSink, LedgerClient, LedgerDispatcher};
pub use orchestrator::{upload_status, verify_status, Orchestrator, Uploaded, Verification};
