// src/chain/models.rs

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

// --- Error type shared by all services ---

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("{0} environment variable is not set")]
    MissingCredential(&'static str),
    #[error("{0} not found")]
    NotFound(String),
    #[error("{service} error {status}: {body}")]
    Upstream {
        service: &'static str,
        status: u16,
        body: String,
    },
    #[error("node RPC error: {0}")]
    Rpc(Value),
    #[error("unexpected {0} response payload")]
    UnexpectedPayload(&'static str),
    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

impl ServiceError {
    /// True for failures the caller can fix (bad input, missing credential),
    /// as opposed to upstream trouble.
    pub fn is_caller_fault(&self) -> bool {
        matches!(
            self,
            ServiceError::InvalidInput(_)
                | ServiceError::MissingCredential(_)
                | ServiceError::NotFound(_)
        )
    }
}

// --- Block identifiers ---

/// Block selector for `eth_getBlockByNumber`: a concrete height or a tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlockId {
    Number(u64),
    Latest,
    Earliest,
    Pending,
}

impl BlockId {
    /// Accepts a JSON number or a string ("latest", "earliest", "pending",
    /// or a decimal height). Negative heights are rejected.
    pub fn from_value(value: &Value) -> Result<Self, ServiceError> {
        match value {
            Value::Number(n) => {
                let height = n.as_u64().ok_or_else(|| {
                    ServiceError::InvalidInput("block number cannot be negative".to_string())
                })?;
                Ok(BlockId::Number(height))
            }
            Value::String(s) => match s.trim().to_lowercase().as_str() {
                "latest" => Ok(BlockId::Latest),
                "earliest" => Ok(BlockId::Earliest),
                "pending" => Ok(BlockId::Pending),
                other => other.parse::<u64>().map(BlockId::Number).map_err(|_| {
                    ServiceError::InvalidInput(format!("invalid block identifier: {}", s))
                }),
            },
            _ => Err(ServiceError::InvalidInput(
                "block identifier must be a number or string".to_string(),
            )),
        }
    }

    /// Wire form for the JSON-RPC params array.
    pub fn as_param(&self) -> String {
        match self {
            BlockId::Number(n) => format!("{:#x}", n),
            BlockId::Latest => "latest".to_string(),
            BlockId::Earliest => "earliest".to_string(),
            BlockId::Pending => "pending".to_string(),
        }
    }
}

// --- Balance Models ---

/// Native MON balance for one address.
#[derive(Debug, Serialize, Deserialize)]
pub struct NativeBalance {
    pub address: String,
    pub balance_wei: String,
    pub balance_mon: String,
}

// --- Zerion Models ---

/// One fungible position from the Zerion positions endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TokenPosition {
    pub name: String,
    pub symbol: String,
    pub balance: String,
}

/// Result of scanning a wallet's transaction feed for contract counterparties.
#[derive(Debug, Serialize, Deserialize)]
pub struct ContractInteractions {
    pub address: String,
    pub transactions_scanned: u64,
    pub unique_counterparties: usize,
    pub unique_contracts: usize,
    pub contract_addresses: Vec<String>,
}
