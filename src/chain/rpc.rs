// src/chain/rpc.rs
//
// Raw JSON-RPC calls against the Monad node. Every helper takes the shared
// reqwest client plus the node URL so the HTTP handlers, the MCP dispatcher
// and the tests all go through the same code path.

use ethers_core::types::{Bytes, U256};
use ethers_core::utils::format_units;
use reqwest::Client;
use serde_json::{json, Value};

use crate::chain::models::{BlockId, NativeBalance, ServiceError};
use crate::utils::{parse_address, parse_tx_hash};

/// Issue one JSON-RPC request and return the `result` member.
pub async fn rpc_call(
    client: &Client,
    rpc_url: &str,
    method: &str,
    params: Value,
) -> Result<Value, ServiceError> {
    let payload = json!({
        "jsonrpc": "2.0",
        "method": method,
        "params": params,
        "id": 1
    });
    let res = client.post(rpc_url).json(&payload).send().await?;
    let status = res.status();
    if !status.is_success() {
        let body = res.text().await.unwrap_or_default();
        return Err(ServiceError::Upstream {
            service: "monad-rpc",
            status: status.as_u16(),
            body,
        });
    }
    let body: Value = res.json().await?;
    if let Some(err) = body.get("error") {
        return Err(ServiceError::Rpc(err.clone()));
    }
    Ok(body.get("result").cloned().unwrap_or(Value::Null))
}

/// Native MON balance of an address, in wei and as an 18-decimal string.
pub async fn get_native_balance(
    client: &Client,
    rpc_url: &str,
    address: &str,
) -> Result<NativeBalance, ServiceError> {
    let checksummed = parse_address(address)?;
    let result = rpc_call(
        client,
        rpc_url,
        "eth_getBalance",
        json!([checksummed, "latest"]),
    )
    .await?;
    let hex_balance = result
        .as_str()
        .ok_or(ServiceError::UnexpectedPayload("eth_getBalance"))?;
    let wei = U256::from_str_radix(hex_balance.trim_start_matches("0x"), 16)
        .map_err(|_| ServiceError::UnexpectedPayload("eth_getBalance"))?;
    let mon = format_units(wei, 18)
        .map_err(|_| ServiceError::UnexpectedPayload("eth_getBalance"))?;
    Ok(NativeBalance {
        address: checksummed,
        balance_wei: wei.to_string(),
        balance_mon: mon,
    })
}

/// Transaction details by hash. A null result means the node has never seen
/// the hash (or it is still pending in a non-indexed pool).
pub async fn get_transaction(
    client: &Client,
    rpc_url: &str,
    tx_hash: &str,
) -> Result<Value, ServiceError> {
    let hash = parse_tx_hash(tx_hash)?;
    let result = rpc_call(
        client,
        rpc_url,
        "eth_getTransactionByHash",
        json!([hash]),
    )
    .await?;
    if result.is_null() {
        return Err(ServiceError::NotFound(format!("transaction {}", hash)));
    }
    Ok(result)
}

/// Block details by number or tag, without full transaction bodies.
pub async fn get_block(
    client: &Client,
    rpc_url: &str,
    block: &BlockId,
) -> Result<Value, ServiceError> {
    let result = rpc_call(
        client,
        rpc_url,
        "eth_getBlockByNumber",
        json!([block.as_param(), false]),
    )
    .await?;
    if result.is_null() {
        return Err(ServiceError::NotFound(format!("block {}", block.as_param())));
    }
    Ok(result)
}

/// Deployed bytecode at an address ("0x" for externally owned accounts).
pub async fn get_code(
    client: &Client,
    rpc_url: &str,
    address: &str,
) -> Result<String, ServiceError> {
    let checksummed = parse_address(address)?;
    let result = rpc_call(client, rpc_url, "eth_getCode", json!([checksummed, "latest"])).await?;
    result
        .as_str()
        .map(|s| s.to_string())
        .ok_or(ServiceError::UnexpectedPayload("eth_getCode"))
}

/// True when the address holds deployed bytecode.
pub async fn is_contract(
    client: &Client,
    rpc_url: &str,
    address: &str,
) -> Result<bool, ServiceError> {
    let code = get_code(client, rpc_url, address).await?;
    Ok(code != "0x" && code != "0x0" && !code.is_empty())
}

/// Read-only `eth_call` with pre-encoded calldata.
pub async fn eth_call(
    client: &Client,
    rpc_url: &str,
    to: &str,
    data: Bytes,
) -> Result<Value, ServiceError> {
    rpc_call(
        client,
        rpc_url,
        "eth_call",
        json!([{"to": to, "data": format!("0x{}", hex::encode(&data))}, "latest"]),
    )
    .await
}
