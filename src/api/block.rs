use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use serde_json::Value;
use tracing::error;

use crate::api::balance::error_status;
use crate::chain::models::BlockId;
use crate::chain::rpc;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct BlockPath {
    pub id: String,
}

// The handler function for the GET /block/{id} endpoint. The id segment is a
// decimal height or one of the block tags.
pub async fn get_block_handler(
    Path(path): Path<BlockPath>,
    State(state): State<AppState>,
) -> impl IntoResponse {
    let block = match BlockId::from_value(&Value::String(path.id.clone())) {
        Ok(block) => block,
        Err(e) => return error_status(&e, format!("Invalid block identifier: {}", e)),
    };
    match rpc::get_block(&state.http, &state.config.rpc_url, &block).await {
        Ok(details) => (StatusCode::OK, Json(details)).into_response(),
        Err(e) => {
            error!("Failed to get block {}: {}", path.id, e);
            error_status(&e, format!("Failed to fetch block: {}", e))
        }
    }
}
