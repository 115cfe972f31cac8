// src/config.rs

use std::env;

use anyhow::{Context, Result};
use tracing::warn;

// A struct to hold all configuration, loaded once at startup from the .env file.
#[derive(Clone, Debug)]
pub struct Config {
    // Server settings
    pub port: u16,

    /// JSON-RPC endpoint of the Monad testnet node. Required; every
    /// chain-backed tool goes through it.
    pub rpc_url: String,
    /// Chain id passed to the indexing APIs (Monad testnet is 10143).
    pub chain_id: u64,

    // Upstream credentials. Each is optional: a missing key disables only
    // the tools that need it.
    pub zerion_api_key: Option<String>,
    pub thirdweb_client_id: Option<String>,
    pub thirdweb_secret_key: Option<String>,
    pub magic_eden_api_key: Option<String>,

    // Upstream base URLs, overridable for tests and staging.
    pub zerion_api_url: String,
    pub insight_api_url: String,
    pub magic_eden_api_url: String,

    /// Chain slug Zerion uses for Monad testnet.
    pub zerion_chain_filter: String,
    /// Network segment Magic Eden uses in its v3 routes.
    pub magic_eden_network: String,
}

impl Config {
    /// Loads configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        // Load variables from the .env file into the environment
        dotenvy::dotenv().ok();

        let rpc_url = env::var("MONAD_RPC_URL")
            .context("MONAD_RPC_URL must be set to the Monad testnet JSON-RPC endpoint")?;

        let chain_id = env::var("CHAIN_ID")
            .unwrap_or_else(|_| "10143".to_string())
            .parse::<u64>()
            .context("CHAIN_ID must be a valid number")?;

        let zerion_api_key = env::var("ZERION_API_KEY").ok();
        let thirdweb_client_id = env::var("THIRDWEB_CLIENT_ID").ok();
        let thirdweb_secret_key = env::var("THIRDWEB_SECRET_KEY").ok();
        let magic_eden_api_key = env::var("MAGIC_EDEN_API_KEY").ok();

        if zerion_api_key.is_none() {
            warn!("ZERION_API_KEY not set; Zerion-backed tools will fail");
        }
        if thirdweb_client_id.is_none() {
            warn!("THIRDWEB_CLIENT_ID not set; ABI fetch and transaction history will fail");
        }
        if thirdweb_secret_key.is_none() {
            warn!("THIRDWEB_SECRET_KEY not set; ERC20 balance tool will fail");
        }
        if magic_eden_api_key.is_none() {
            warn!("MAGIC_EDEN_API_KEY not set; Magic Eden tools will fail");
        }

        Ok(Config {
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .context("PORT must be a valid number")?,
            rpc_url,
            chain_id,
            zerion_api_key,
            thirdweb_client_id,
            thirdweb_secret_key,
            magic_eden_api_key,
            zerion_api_url: env::var("ZERION_API_URL")
                .unwrap_or_else(|_| "https://api.zerion.io/v1".to_string()),
            insight_api_url: env::var("INSIGHT_API_URL")
                .unwrap_or_else(|_| "https://insight.thirdweb.com/v1".to_string()),
            magic_eden_api_url: env::var("MAGIC_EDEN_API_URL")
                .unwrap_or_else(|_| "https://api-mainnet.magiceden.dev".to_string()),
            zerion_chain_filter: env::var("ZERION_CHAIN_FILTER")
                .unwrap_or_else(|_| "monad-test-v2".to_string()),
            magic_eden_network: env::var("MAGIC_EDEN_NETWORK")
                .unwrap_or_else(|_| "monad-testnet".to_string()),
        })
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            port: 8080,
            rpc_url: "http://127.0.0.1:8545".to_string(),
            chain_id: 10143,
            zerion_api_key: None,
            thirdweb_client_id: None,
            thirdweb_secret_key: None,
            magic_eden_api_key: None,
            zerion_api_url: "https://api.zerion.io/v1".to_string(),
            insight_api_url: "https://insight.thirdweb.com/v1".to_string(),
            magic_eden_api_url: "https://api-mainnet.magiceden.dev".to_string(),
            zerion_chain_filter: "monad-test-v2".to_string(),
            magic_eden_network: "monad-testnet".to_string(),
        }
    }
}
