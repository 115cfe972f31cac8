use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use tracing::error;

use crate::api::balance::error_status;
use crate::chain::rpc;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct TxPath {
    pub hash: String,
}

// The handler function for the GET /tx/{hash} endpoint.
pub async fn get_transaction_handler(
    Path(path): Path<TxPath>,
    State(state): State<AppState>,
) -> impl IntoResponse {
    match rpc::get_transaction(&state.http, &state.config.rpc_url, &path.hash).await {
        Ok(tx) => (StatusCode::OK, Json(tx)).into_response(),
        Err(e) => {
            error!("Failed to get transaction {}: {}", path.hash, e);
            error_status(&e, format!("Failed to fetch transaction: {}", e))
        }
    }
}
