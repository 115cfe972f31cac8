// src/lib.rs

// Re-export commonly used types
pub use ethers_core::types::{Address, H256, U256};

// Re-export modules
pub mod api;
pub mod chain;
pub mod config;
pub mod mcp;
pub mod utils;

/// Application state shared across all request handlers
#[derive(Clone)]
pub struct AppState {
    /// Application configuration
    pub config: config::Config,
    /// Shared HTTP client used for every upstream call
    pub http: reqwest::Client,
}

impl AppState {
    pub fn new(config: config::Config) -> Self {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(60))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self { config, http }
    }
}
