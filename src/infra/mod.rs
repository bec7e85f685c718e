pub mod config;
pub mod error;
pub mod ethereum;
pub mod telemetry;

pub use error::{ActionError, ConfigError, GatewayError, HashError, StoreError, TransportError};
