use crate::transport::http::handlers::common::{coerce_event, parse_request};
use crate::transport::http::types::{
    error_body, json_422, AppState, InsertResponse,
};
use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use tracing::{error, info};

#[utoipa::path(
    post,
    path = "/logTransaction",
    request_body = crate::transport::http::types::LogTransactionRequest,
    responses(
        (status = 200, description = "Record stored", body = InsertResponse),
        (status = 400, description = "A field could not be coerced to its column type", body = crate::transport::http::types::ErrorResponse),
        (status = 422, description = "Body present but not a JSON object", body = crate::transport::http::types::ErrorResponse),
        (status = 500, description = "Store failure", body = crate::transport::http::types::ErrorResponse)
    )
)]
pub async fn log_transaction_handler(
    State(state): State<AppState>,
    body: Bytes,
) -> impl IntoResponse {
    let request = match parse_request(&body) {
        Ok(v) => v,
        Err(e) => return json_422(e, "a JSON object").into_response(),
    };

    info!(?request, "received log");

    let event = match coerce_event(&request) {
        Ok(event) => event,
        Err(msg) => return error_body(StatusCode::BAD_REQUEST, msg).into_response(),
    };

    match state.store.insert(event).await {
        Ok(inserted_id) => (
            StatusCode::OK,
            Json(InsertResponse {
                status: "success".to_string(),
                inserted_id,
            }),
        )
            .into_response(),
        Err(e) => {
            error!(error = %e, "ledger insert failed");
            error_body(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response()
        }
    }
}
