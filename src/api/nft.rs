use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use tracing::error;

use crate::api::balance::error_status;
use crate::chain::models::ServiceError;
use crate::chain::services::magic_eden;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct TrendingQuery {
    pub limit: Option<u64>,
    pub period: Option<String>,
    pub sort_by: Option<String>,
}

// The handler function for the GET /nft/trending endpoint.
pub async fn get_trending_handler(
    Query(query): Query<TrendingQuery>,
    State(state): State<AppState>,
) -> impl IntoResponse {
    let api_key = match state.config.magic_eden_api_key.as_deref() {
        Some(key) => key,
        None => {
            let e = ServiceError::MissingCredential("MAGIC_EDEN_API_KEY");
            return error_status(&e, e.to_string());
        }
    };
    match magic_eden::trending_collections(
        &state.http,
        &state.config.magic_eden_api_url,
        api_key,
        &state.config.magic_eden_network,
        query.limit.unwrap_or(20),
        query.period.as_deref().unwrap_or("1d"),
        query.sort_by.as_deref().unwrap_or("sales"),
    )
    .await
    {
        Ok(collections) => {
            (StatusCode::OK, Json(serde_json::json!({ "collections": collections })))
                .into_response()
        }
        Err(e) => {
            error!("Failed to fetch trending collections: {}", e);
            error_status(&e, format!("Failed to fetch trending collections: {}", e))
        }
    }
}
