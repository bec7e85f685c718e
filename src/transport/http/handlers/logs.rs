use crate::storage::ledger::DEFAULT_LIST_LIMIT;
use crate::transport::http::types::{error_body, AppState};
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use tracing::error;

#[utoipa::path(
    get,
    path = "/logs",
    responses(
        (status = 200, description = "Up to 100 most recent records, newest first", body = Vec<crate::domain::EventRecord>),
        (status = 500, description = "Store failure", body = crate::transport::http::types::ErrorResponse)
    )
)]
pub async fn list_logs_handler(State(state): State<AppState>) -> impl IntoResponse {
    match state.store.list_recent(DEFAULT_LIST_LIMIT).await {
        Ok(records) => (StatusCode::OK, Json(records)).into_response(),
        Err(e) => {
            error!(error = %e, "ledger fetch failed");
            error_body(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response()
        }
    }
}
