use crate::storage::ledger::LedgerStore;
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::sync::Arc;
use utoipa::ToSchema;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn LedgerStore>,
}

/// Body of `POST /logTransaction`.
///
/// Fields are kept as raw JSON so the handler can coerce loosely typed clients
/// (`verified: 1`, `block_number: "42"`, empty strings).
#[derive(Deserialize, Debug, Default, ToSchema)]
pub struct LogTransactionRequest {
    #[serde(default, rename = "type")]
    #[schema(value_type = Option<String>, example = "upload")]
    pub kind: Option<JsonValue>,
    #[serde(default)]
    #[schema(value_type = Option<String>, example = "0x90F8bf6A479f320ead074411a4B0e7944Ea8c9C1")]
    pub user_address: Option<JsonValue>,
    #[serde(default)]
    #[schema(value_type = Option<String>)]
    pub document_hash: Option<JsonValue>,
    #[serde(default)]
    #[schema(value_type = Option<String>)]
    pub transaction_hash: Option<JsonValue>,
    /// Boolean, `0`/`1`, or `"true"`/`"false"`.
    #[serde(default)]
    #[schema(value_type = Option<bool>)]
    pub verified: Option<JsonValue>,
    #[serde(default)]
    #[schema(value_type = Option<String>)]
    pub error_msg: Option<JsonValue>,
    #[serde(default)]
    #[schema(value_type = Option<i64>)]
    pub block_number: Option<JsonValue>,
    /// RFC3339 string or epoch milliseconds. Defaults to receipt time.
    #[serde(default)]
    #[schema(value_type = Option<String>, example = "2024-01-01T00:00:00Z")]
    pub timestamp: Option<JsonValue>,
}

#[derive(Serialize, Deserialize, Debug, ToSchema)]
pub struct InsertResponse {
    pub status: String,
    #[serde(rename = "insertedId")]
    pub inserted_id: i64,
}

#[derive(Serialize, Deserialize, Debug, ToSchema)]
pub struct ErrorResponse {
    pub status: String,
    pub message: String,
}

#[derive(Serialize, Deserialize, Debug, ToSchema)]
pub struct HealthResponse {
    pub status: String,
}

pub fn error_body(status: StatusCode, message: impl Into<String>) -> (StatusCode, Json<ErrorResponse>) {
    (
        status,
        Json(ErrorResponse {
            status: "error".to_string(),
            message: message.into(),
        }),
    )
}

pub fn json_422(err: impl std::fmt::Display, expected: &str) -> (StatusCode, Json<ErrorResponse>) {
    error_body(
        StatusCode::UNPROCESSABLE_ENTITY,
        format!("Invalid JSON body: {} (expected: {})", err, expected),
    )
}
