// src/chain/services/magic_eden.rs
//
// Magic Eden marketplace API (v3 "rtp" routes). Three pagination styles are
// in play: offset for user collections, a continuation token for per-token
// activity, and a single capped page for the user activity feed. Requests
// authenticate with a bearer token.

use std::time::Duration;

use reqwest::Client;
use serde_json::Value;
use tracing::{debug, warn};

use crate::chain::models::ServiceError;
use crate::utils::parse_address;

const COLLECTIONS_PAGE_LIMIT: u64 = 100;
const ACTIVITY_PAGE_LIMIT: u64 = 20;
const PAGE_DELAY: Duration = Duration::from_millis(500);

const ALLOWED_PERIODS: [&str; 9] = ["5m", "10m", "30m", "1h", "6h", "1d", "24h", "7d", "30d"];
const ALLOWED_SORTS: [&str; 2] = ["sales", "volume"];

async fn get_json(
    client: &Client,
    api_key: &str,
    url: &str,
    query: &[(&str, String)],
) -> Result<Value, ServiceError> {
    let res = client
        .get(url)
        .query(query)
        .header("accept", "*/*")
        .bearer_auth(api_key)
        .send()
        .await?;
    let status = res.status();
    if !status.is_success() {
        let body = res.text().await.unwrap_or_default();
        return Err(ServiceError::Upstream {
            service: "magic-eden",
            status: status.as_u16(),
            body,
        });
    }
    Ok(res.json().await?)
}

/// Collection stats for every collection a wallet holds, offset-paginated
/// until a short page signals the end.
pub async fn user_collections(
    client: &Client,
    base_url: &str,
    api_key: &str,
    network: &str,
    address: &str,
) -> Result<Vec<Value>, ServiceError> {
    let checksummed = parse_address(address)?;
    let url = format!(
        "{}/v3/rtp/{}/users/{}/collections/v3",
        base_url.trim_end_matches('/'),
        network,
        checksummed
    );

    let mut all_collections = Vec::new();
    let mut offset: u64 = 0;
    loop {
        let query: Vec<(&str, String)> = vec![
            ("limit", COLLECTIONS_PAGE_LIMIT.to_string()),
            ("offset", offset.to_string()),
            ("includeTopBid", "true".to_string()),
            ("includeLiquidCount", "true".to_string()),
        ];
        let body = get_json(client, api_key, &url, &query).await?;
        let page = body
            .get("collections")
            .and_then(|v| v.as_array())
            .cloned()
            .ok_or(ServiceError::UnexpectedPayload("magic eden collections"))?;
        if page.is_empty() {
            break;
        }
        let page_len = page.len() as u64;
        all_collections.extend(page);
        if page_len < COLLECTIONS_PAGE_LIMIT {
            break;
        }
        offset += COLLECTIONS_PAGE_LIMIT;
        tokio::time::sleep(PAGE_DELAY).await;
    }

    debug!(
        "magic eden collections for {}: {} entries",
        checksummed,
        all_collections.len()
    );
    Ok(all_collections)
}

/// Activity history of one token, following the continuation token until the
/// feed runs dry.
pub async fn token_activity(
    client: &Client,
    base_url: &str,
    api_key: &str,
    network: &str,
    contract_address: &str,
    token_id: &str,
) -> Result<Vec<Value>, ServiceError> {
    let checksummed = parse_address(contract_address)?;
    if token_id.is_empty() || !token_id.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ServiceError::InvalidInput(format!(
            "invalid token_id: {}",
            token_id
        )));
    }
    let token_ref: String =
        url::form_urlencoded::byte_serialize(format!("{}:{}", checksummed, token_id).as_bytes())
            .collect();
    let url = format!(
        "{}/v3/rtp/{}/tokens/{}/activity/v5",
        base_url.trim_end_matches('/'),
        network,
        token_ref
    );

    let mut all_activities = Vec::new();
    let mut continuation: Option<String> = None;
    loop {
        let mut query: Vec<(&str, String)> = vec![
            ("limit", ACTIVITY_PAGE_LIMIT.to_string()),
            ("sortBy", "eventTimestamp".to_string()),
            ("includeMetadata", "true".to_string()),
        ];
        if let Some(token) = &continuation {
            query.push(("continuation", token.clone()));
        }
        let body = get_json(client, api_key, &url, &query).await?;
        let page = body
            .get("activities")
            .and_then(|v| v.as_array())
            .cloned()
            .unwrap_or_default();
        all_activities.extend(page);

        match body.get("continuation").and_then(|v| v.as_str()) {
            Some(token) if !token.is_empty() => {
                continuation = Some(token.to_string());
                tokio::time::sleep(PAGE_DELAY).await;
            }
            _ => break,
        }
    }

    Ok(all_activities)
}

/// Most recent activity feed for a user. Single page; the limit is clamped
/// into the range the endpoint accepts.
pub async fn user_activity(
    client: &Client,
    base_url: &str,
    api_key: &str,
    network: &str,
    address: &str,
    limit: u64,
) -> Result<Vec<Value>, ServiceError> {
    let checksummed = parse_address(address)?;
    let limit = if (1..=500).contains(&limit) {
        limit
    } else {
        warn!("requested activity limit {} outside 1-500, using 50", limit);
        50
    };

    let url = format!(
        "{}/v3/rtp/{}/users/activity/v6",
        base_url.trim_end_matches('/'),
        network
    );
    let query: Vec<(&str, String)> = vec![
        ("users", checksummed.clone()),
        ("limit", limit.to_string()),
        ("sortBy", "eventTimestamp".to_string()),
        ("includeMetadata", "false".to_string()),
    ];
    let body = get_json(client, api_key, &url, &query).await?;
    body.get("activities")
        .and_then(|v| v.as_array())
        .cloned()
        .ok_or(ServiceError::UnexpectedPayload("magic eden user activity"))
}

/// Trending collections for the network over a given period.
pub async fn trending_collections(
    client: &Client,
    base_url: &str,
    api_key: &str,
    network: &str,
    limit: u64,
    period: &str,
    sort_by: &str,
) -> Result<Vec<Value>, ServiceError> {
    let period = period.to_lowercase();
    if !ALLOWED_PERIODS.contains(&period.as_str()) {
        return Err(ServiceError::InvalidInput(format!(
            "invalid period '{}': must be one of {}",
            period,
            ALLOWED_PERIODS.join(", ")
        )));
    }
    let sort_by = sort_by.to_lowercase();
    if !ALLOWED_SORTS.contains(&sort_by.as_str()) {
        return Err(ServiceError::InvalidInput(format!(
            "invalid sort_by '{}': must be one of {}",
            sort_by,
            ALLOWED_SORTS.join(", ")
        )));
    }
    if !(1..=500).contains(&limit) {
        return Err(ServiceError::InvalidInput(
            "limit must be between 1 and 500".to_string(),
        ));
    }

    let url = format!(
        "{}/v3/rtp/{}/collections/trending/v1",
        base_url.trim_end_matches('/'),
        network
    );
    let query: Vec<(&str, String)> = vec![
        ("limit", limit.to_string()),
        ("period", period),
        ("sortBy", sort_by),
        ("normalizeRoyalties", "true".to_string()),
        ("useNonFlaggedFloorAsk", "false".to_string()),
    ];
    let body = get_json(client, api_key, &url, &query).await?;
    body.get("collections")
        .and_then(|v| v.as_array())
        .cloned()
        .ok_or(ServiceError::UnexpectedPayload("magic eden trending"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn trending_rejects_unknown_period() {
        let client = Client::new();
        let err = trending_collections(
            &client,
            "http://127.0.0.1:1",
            "key",
            "monad-testnet",
            20,
            "2d",
            "sales",
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn trending_rejects_unknown_sort() {
        let client = Client::new();
        let err = trending_collections(
            &client,
            "http://127.0.0.1:1",
            "key",
            "monad-testnet",
            20,
            "1d",
            "floor",
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn token_activity_rejects_non_numeric_token_id() {
        let client = Client::new();
        let err = token_activity(
            &client,
            "http://127.0.0.1:1",
            "key",
            "monad-testnet",
            "0xfb6916095ca1df60bb79ce92ce3ea74c37c5d359",
            "12abc",
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidInput(_)));
    }
}
