//! Utility functions for the Monad MCP server

use std::str::FromStr;

use ethers_core::types::{Address, H256};
use ethers_core::utils::to_checksum;
use serde::de::DeserializeOwned;
use serde_json::{from_value, Value};

use crate::chain::models::ServiceError;
use crate::mcp::protocol::{error_codes, Response};

/// Helper function to extract a required argument from a JSON object
pub fn get_required_arg<T: DeserializeOwned>(
    args: &Value,
    key: &str,
    req_id: &Value,
) -> Result<T, Response> {
    from_value(args.get(key).cloned().unwrap_or(Value::Null)).map_err(|_| {
        Response::error(
            req_id.clone(),
            error_codes::INVALID_PARAMS,
            format!("Missing or invalid required argument: '{}'", key),
        )
    })
}

/// Validate a 0x-prefixed 20-byte address and return its EIP-55 checksum form.
pub fn parse_address(input: &str) -> Result<String, ServiceError> {
    let trimmed = input.trim();
    if !trimmed.starts_with("0x") {
        return Err(ServiceError::InvalidInput(format!(
            "invalid address format: {}",
            input
        )));
    }
    let addr = Address::from_str(trimmed)
        .map_err(|_| ServiceError::InvalidInput(format!("invalid address format: {}", input)))?;
    Ok(to_checksum(&addr, None))
}

/// Validate a 0x-prefixed 32-byte transaction hash, returned lowercased.
pub fn parse_tx_hash(input: &str) -> Result<String, ServiceError> {
    let trimmed = input.trim();
    if !trimmed.starts_with("0x") || trimmed.len() != 66 {
        return Err(ServiceError::InvalidInput(format!(
            "invalid transaction hash format: {}",
            input
        )));
    }
    let hash = H256::from_str(trimmed).map_err(|_| {
        ServiceError::InvalidInput(format!("invalid transaction hash format: {}", input))
    })?;
    Ok(format!("{:#x}", hash))
}
