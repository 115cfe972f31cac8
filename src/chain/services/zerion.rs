// src/chain/services/zerion.rs
//
// Zerion indexing API. All endpoints use JSON:API shaped responses: items
// under `data`, cursor pagination via an absolute `links.next` URL. Requests
// authenticate with basic auth (key as username, empty password) plus the
// `X-Env: testnet` header Monad testnet data requires.

use std::collections::BTreeSet;
use std::time::Duration;

use reqwest::Client;
use serde_json::Value;
use tracing::{debug, warn};

use crate::chain::models::{ContractInteractions, ServiceError, TokenPosition};
use crate::chain::rpc;
use crate::utils::parse_address;

const PAGE_SIZE: u64 = 100;
const PAGE_DELAY: Duration = Duration::from_millis(500);
const CODE_CHECK_DELAY: Duration = Duration::from_millis(50);

async fn get_page(
    client: &Client,
    api_key: &str,
    url: &str,
    query: Option<&[(&str, String)]>,
) -> Result<Value, ServiceError> {
    let mut req = client
        .get(url)
        .basic_auth(api_key, Some(""))
        .header("accept", "application/json")
        .header("X-Env", "testnet");
    if let Some(q) = query {
        req = req.query(q);
    }
    let res = req.send().await?;
    let status = res.status();
    if !status.is_success() {
        let body = res.text().await.unwrap_or_default();
        return Err(ServiceError::Upstream {
            service: "zerion",
            status: status.as_u16(),
            body,
        });
    }
    Ok(res.json().await?)
}

fn next_link(page: &Value) -> Option<String> {
    page.get("links")
        .and_then(|l| l.get("next"))
        .and_then(|v| v.as_str())
        .map(|s| s.to_string())
}

fn parse_positions(page_items: &[Value]) -> Vec<TokenPosition> {
    let mut tokens = Vec::new();
    for position in page_items {
        if position.get("type").and_then(|v| v.as_str()) != Some("positions") {
            continue;
        }
        let attributes = &position["attributes"];
        let flags = &attributes["flags"];
        let is_trash = flags.get("trash").and_then(|v| v.as_bool()).unwrap_or(false);
        let is_native = flags.get("native").and_then(|v| v.as_bool()).unwrap_or(false);
        if is_trash || is_native {
            continue;
        }
        let fungible = &attributes["fungible_info"];
        let quantity = &attributes["quantity"];
        if fungible.is_null() || quantity.is_null() {
            continue;
        }
        tokens.push(TokenPosition {
            name: fungible
                .get("name")
                .and_then(|v| v.as_str())
                .unwrap_or("N/A")
                .to_string(),
            symbol: fungible
                .get("symbol")
                .and_then(|v| v.as_str())
                .unwrap_or("N/A")
                .to_string(),
            balance: quantity
                .get("numeric")
                .and_then(|v| v.as_str())
                .unwrap_or("0")
                .to_string(),
        });
    }
    tokens
}

/// Non-native, non-trash fungible positions for a wallet, sorted by name.
pub async fn token_positions(
    client: &Client,
    base_url: &str,
    api_key: &str,
    chain_filter: &str,
    address: &str,
) -> Result<Vec<TokenPosition>, ServiceError> {
    let checksummed = parse_address(address)?;
    let first_url = format!(
        "{}/wallets/{}/positions",
        base_url.trim_end_matches('/'),
        checksummed
    );
    let first_query: Vec<(&str, String)> = vec![
        ("filter[chain_ids]", chain_filter.to_string()),
        ("page[size]", PAGE_SIZE.to_string()),
        ("currency", "usd".to_string()),
        ("filter[trash]", "no_filter".to_string()),
        ("filter[positions]", "no_filter".to_string()),
        ("sort", "value".to_string()),
    ];

    let mut all_tokens = Vec::new();
    let mut current_url = first_url;
    let mut first_page = true;
    loop {
        let query = if first_page {
            Some(first_query.as_slice())
        } else {
            None
        };
        let page = get_page(client, api_key, &current_url, query).await?;
        let items = page
            .get("data")
            .and_then(|v| v.as_array())
            .cloned()
            .unwrap_or_default();
        all_tokens.extend(parse_positions(&items));

        match next_link(&page) {
            Some(next) => {
                current_url = next;
                first_page = false;
                tokio::time::sleep(PAGE_DELAY).await;
            }
            None => break,
        }
    }

    all_tokens.sort_by_key(|t| t.name.to_lowercase());
    debug!(
        "zerion positions for {}: {} tokens",
        checksummed,
        all_tokens.len()
    );
    Ok(all_tokens)
}

/// Raw wallet transaction feed, paginated to exhaustion. With `nft_only` the
/// upstream filters the feed to NFT asset types.
pub async fn wallet_transactions(
    client: &Client,
    base_url: &str,
    api_key: &str,
    chain_filter: &str,
    address: &str,
    nft_only: bool,
    page_size: u64,
) -> Result<Vec<Value>, ServiceError> {
    let checksummed = parse_address(address)?;
    if !(1..=500).contains(&page_size) {
        return Err(ServiceError::InvalidInput(
            "page_size must be between 1 and 500".to_string(),
        ));
    }
    let first_url = format!(
        "{}/wallets/{}/transactions",
        base_url.trim_end_matches('/'),
        checksummed
    );
    let mut first_query: Vec<(&str, String)> = vec![
        ("filter[chain_ids]", chain_filter.to_string()),
        ("page[size]", page_size.to_string()),
        ("currency", "usd".to_string()),
        ("filter[trash]", "no_filter".to_string()),
    ];
    if nft_only {
        first_query.push(("filter[asset_types]", "nft".to_string()));
    }

    let mut all_transactions = Vec::new();
    let mut current_url = first_url;
    let mut first_page = true;
    loop {
        let query = if first_page {
            Some(first_query.as_slice())
        } else {
            None
        };
        let page = get_page(client, api_key, &current_url, query).await?;
        let items = page
            .get("data")
            .and_then(|v| v.as_array())
            .cloned()
            .unwrap_or_default();
        if items.is_empty() && first_page {
            break;
        }
        all_transactions.extend(items);

        match next_link(&page) {
            Some(next) => {
                current_url = next;
                first_page = false;
                tokio::time::sleep(PAGE_DELAY).await;
            }
            None => break,
        }
    }

    Ok(all_transactions)
}

/// Scan the full transaction feed for distinct `sent_to` counterparties and
/// classify each one as contract or EOA via `eth_getCode` against the node.
pub async fn contract_interactions(
    client: &Client,
    base_url: &str,
    api_key: &str,
    chain_filter: &str,
    rpc_url: &str,
    address: &str,
) -> Result<ContractInteractions, ServiceError> {
    let checksummed = parse_address(address)?;
    let transactions = wallet_transactions(
        client,
        base_url,
        api_key,
        chain_filter,
        &checksummed,
        false,
        PAGE_SIZE,
    )
    .await?;

    let mut counterparties: BTreeSet<String> = BTreeSet::new();
    for tx in &transactions {
        if tx.get("type").and_then(|v| v.as_str()) != Some("transactions") {
            continue;
        }
        if let Some(sent_to) = tx
            .get("attributes")
            .and_then(|a| a.get("sent_to"))
            .and_then(|v| v.as_str())
        {
            counterparties.insert(sent_to.to_lowercase());
        }
    }

    let mut contract_addresses: BTreeSet<String> = BTreeSet::new();
    for addr in &counterparties {
        let checked = match parse_address(addr) {
            Ok(a) => a,
            Err(_) => {
                warn!("skipping malformed counterparty address {}", addr);
                continue;
            }
        };
        match rpc::is_contract(client, rpc_url, &checked).await {
            Ok(true) => {
                contract_addresses.insert(checked);
            }
            Ok(false) => {}
            Err(e) => {
                warn!("could not check code for {}: {}", checked, e);
            }
        }
        tokio::time::sleep(CODE_CHECK_DELAY).await;
    }

    Ok(ContractInteractions {
        address: checksummed,
        transactions_scanned: transactions.len() as u64,
        unique_counterparties: counterparties.len(),
        unique_contracts: contract_addresses.len(),
        contract_addresses: contract_addresses.into_iter().collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn positions_drop_trash_and_native_entries() {
        let items = vec![
            json!({
                "type": "positions",
                "attributes": {
                    "fungible_info": {"name": "Wrapped Monad", "symbol": "WMON"},
                    "quantity": {"numeric": "12.5"},
                    "flags": {"trash": false, "native": false}
                }
            }),
            json!({
                "type": "positions",
                "attributes": {
                    "fungible_info": {"name": "Scam Token", "symbol": "SCAM"},
                    "quantity": {"numeric": "9999"},
                    "flags": {"trash": true, "native": false}
                }
            }),
            json!({
                "type": "positions",
                "attributes": {
                    "fungible_info": {"name": "Monad", "symbol": "MON"},
                    "quantity": {"numeric": "3"},
                    "flags": {"trash": false, "native": true}
                }
            }),
            json!({"type": "not-positions", "attributes": {}}),
        ];
        let tokens = parse_positions(&items);
        assert_eq!(
            tokens,
            vec![TokenPosition {
                name: "Wrapped Monad".to_string(),
                symbol: "WMON".to_string(),
                balance: "12.5".to_string(),
            }]
        );
    }

    #[test]
    fn positions_without_quantity_are_skipped() {
        let items = vec![json!({
            "type": "positions",
            "attributes": {
                "fungible_info": {"name": "Ghost", "symbol": "GHO"},
                "flags": {}
            }
        })];
        assert!(parse_positions(&items).is_empty());
    }

    #[test]
    fn next_link_reads_json_api_cursor() {
        let page = json!({"links": {"next": "https://api.zerion.io/v1/x?page=2"}});
        assert_eq!(
            next_link(&page),
            Some("https://api.zerion.io/v1/x?page=2".to_string())
        );
        assert_eq!(next_link(&json!({"links": {}})), None);
    }
}
