// src/chain/services/insight.rs
//
// Thirdweb Insight indexing API: contract ABI lookup, ERC20 wallet balances
// and paginated wallet transaction history. Authentication is either the
// public `clientId` query parameter or the backend `x-secret-key` header,
// depending on the endpoint.

use reqwest::Client;
use serde_json::Value;
use tracing::debug;

use crate::chain::models::ServiceError;
use crate::utils::parse_address;

/// Fetch the ABI entry list for a verified contract.
pub async fn fetch_abi(
    client: &Client,
    base_url: &str,
    client_id: &str,
    chain_id: u64,
    contract_address: &str,
) -> Result<Vec<Value>, ServiceError> {
    let checksummed = parse_address(contract_address)?;
    let url = format!("{}/contracts/abi/{}", base_url.trim_end_matches('/'), checksummed);
    debug!("fetching ABI for {} from Insight", checksummed);

    let res = client
        .get(&url)
        .query(&[("chain", chain_id.to_string()), ("clientId", client_id.to_string())])
        .header("Accept", "application/json")
        .send()
        .await?;
    let status = res.status();
    if status.as_u16() == 404 {
        return Err(ServiceError::NotFound(format!("ABI for {}", checksummed)));
    }
    if !status.is_success() {
        let body = res.text().await.unwrap_or_default();
        return Err(ServiceError::Upstream {
            service: "insight",
            status: status.as_u16(),
            body,
        });
    }

    // The endpoint has returned both a bare list and wrappers keyed by
    // "result" or "abi" over time; accept all three.
    let body: Value = res.json().await?;
    let entries = match &body {
        Value::Array(list) => Some(list.clone()),
        Value::Object(map) => map
            .get("result")
            .or_else(|| map.get("abi"))
            .and_then(|v| v.as_array())
            .cloned(),
        _ => None,
    };
    entries.ok_or(ServiceError::UnexpectedPayload("insight ABI"))
}

/// ERC20 token balances for a wallet, via the backend secret key.
pub async fn erc20_balances(
    client: &Client,
    base_url: &str,
    secret_key: &str,
    chain_id: u64,
    address: &str,
) -> Result<Vec<Value>, ServiceError> {
    let checksummed = parse_address(address)?;
    let url = format!("{}/tokens/erc20/{}", base_url.trim_end_matches('/'), checksummed);

    let res = client
        .get(&url)
        .query(&[("chain", chain_id.to_string()), ("include_price", "false".to_string())])
        .header("accept", "application/json")
        .header("x-secret-key", secret_key)
        .send()
        .await?;
    let status = res.status();
    if !status.is_success() {
        let body = res.text().await.unwrap_or_default();
        return Err(ServiceError::Upstream {
            service: "insight",
            status: status.as_u16(),
            body,
        });
    }

    let body: Value = res.json().await?;
    body.get("data")
        .and_then(|v| v.as_array())
        .cloned()
        .ok_or(ServiceError::UnexpectedPayload("insight ERC20 balances"))
}

/// One page of wallet transaction history.
#[allow(clippy::too_many_arguments)]
pub async fn transaction_history(
    client: &Client,
    base_url: &str,
    client_id: &str,
    chain_id: u64,
    address: &str,
    limit: u64,
    page: u64,
    sort_order: &str,
    timestamp_gte: Option<i64>,
) -> Result<Vec<Value>, ServiceError> {
    let checksummed = parse_address(address)?;
    if !(1..=500).contains(&limit) {
        return Err(ServiceError::InvalidInput(
            "limit must be between 1 and 500".to_string(),
        ));
    }
    let sort_order = sort_order.to_lowercase();
    if sort_order != "asc" && sort_order != "desc" {
        return Err(ServiceError::InvalidInput(
            "sort_order must be 'asc' or 'desc'".to_string(),
        ));
    }

    let url = format!(
        "{}/wallets/{}/transactions",
        base_url.trim_end_matches('/'),
        checksummed
    );
    let mut query: Vec<(&str, String)> = vec![
        ("chain", chain_id.to_string()),
        ("clientId", client_id.to_string()),
        ("limit", limit.to_string()),
        ("page", page.to_string()),
        ("sort_order", sort_order),
    ];
    if let Some(ts) = timestamp_gte {
        if ts < 0 {
            return Err(ServiceError::InvalidInput(
                "timestamp_gte must be a non-negative unix timestamp".to_string(),
            ));
        }
        query.push(("filter_block_timestamp_gte", ts.to_string()));
    }

    debug!("fetching tx history page {} for {}", page, checksummed);
    let res = client
        .get(&url)
        .query(&query)
        .header("Accept", "application/json")
        .send()
        .await?;
    let status = res.status();
    if !status.is_success() {
        let body = res.text().await.unwrap_or_default();
        return Err(ServiceError::Upstream {
            service: "insight",
            status: status.as_u16(),
            body,
        });
    }

    let body: Value = res.json().await?;
    body.get("data")
        .and_then(|v| v.as_array())
        .cloned()
        .ok_or(ServiceError::UnexpectedPayload("insight transaction history"))
}
