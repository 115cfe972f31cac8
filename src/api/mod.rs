//! # API Module
//!
//! HTTP handlers for the Monad MCP server. A thin REST mirror of the
//! read-only tools, plus `/rpc` which forwards JSON-RPC bodies to the MCP
//! dispatcher.
//!
//! ## Available Endpoints
//!
//! - `GET /health` - Liveness check
//! - `GET /balance/:address` - Native MON balance
//! - `GET /tx/:hash` - Transaction details
//! - `GET /block/:id` - Block details by number or tag
//! - `GET /nft/trending` - Trending collections
//! - `POST /rpc` - JSON-RPC endpoint for MCP tool calls

pub mod balance;
pub mod block;
pub mod health;
pub mod nft;
pub mod tx;
