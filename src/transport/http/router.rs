use crate::transport::http::handlers::{health, logs, transactions};
use crate::transport::http::types::{
    ErrorResponse, HealthResponse, InsertResponse, LogTransactionRequest,
};
use axum::routing::{get, post};
use axum::Router;
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    paths(
        health::healthcheck_handler,
        transactions::log_transaction_handler,
        logs::list_logs_handler
    ),
    components(schemas(
        LogTransactionRequest,
        InsertResponse,
        ErrorResponse,
        HealthResponse,
        crate::domain::EventRecord
    ))
)]
pub struct ApiDoc;

pub fn create_router(app_state: crate::transport::http::types::AppState) -> Router {
    Router::new()
        .route("/health", get(health::healthcheck_handler))
        .route("/logTransaction", post(transactions::log_transaction_handler))
        .route("/logs", get(logs::list_logs_handler))
        .with_state(app_state)
}
