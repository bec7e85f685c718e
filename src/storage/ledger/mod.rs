pub mod memory;
pub mod postgres;
pub mod store;

pub use memory::MemoryLedgerStore;
pub use postgres::PostgresLedgerStore;
pub use store::{LedgerStore, DEFAULT_LIST_LIMIT};
