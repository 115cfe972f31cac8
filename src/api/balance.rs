use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use tracing::error;

use crate::chain::models::ServiceError;
use crate::chain::rpc;
use crate::AppState;

// Address extracted from the URL path.
#[derive(Debug, Deserialize)]
pub struct BalancePath {
    pub address: String,
}

// The handler function for the GET /balance/{address} endpoint.
pub async fn get_balance_handler(
    Path(path): Path<BalancePath>,
    State(state): State<AppState>,
) -> impl IntoResponse {
    match rpc::get_native_balance(&state.http, &state.config.rpc_url, &path.address).await {
        Ok(balance) => (StatusCode::OK, Json(balance)).into_response(),
        Err(e) => {
            error!("Failed to get balance for {}: {}", path.address, e);
            error_status(&e, format!("Failed to fetch balance: {}", e))
        }
    }
}

/// Shared error mapping for the REST mirror: caller mistakes are 400,
/// missing upstream entities 404, everything else 502.
pub(crate) fn error_status(err: &ServiceError, message: String) -> axum::response::Response {
    let status = match err {
        ServiceError::InvalidInput(_) | ServiceError::MissingCredential(_) => {
            StatusCode::BAD_REQUEST
        }
        ServiceError::NotFound(_) => StatusCode::NOT_FOUND,
        _ => StatusCode::BAD_GATEWAY,
    };
    (status, message).into_response()
}
