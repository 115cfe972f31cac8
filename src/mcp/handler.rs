//! # MCP Handler Module
//!
//! Implements the Model Context Protocol dispatcher for the Monad server.
//! Incoming requests are routed to read-only query tools, each a thin wrapper
//! over one upstream call.
//!
//! ## Supported Tools
//!
//! ### Chain RPC
//! - `get_native_balance` - Native MON balance of an address
//! - `get_transaction` - Transaction details by hash
//! - `get_block` - Block details by number or tag
//! - `read_contract` - Read-only contract call via ABI (auto-fetched if omitted)
//!
//! ### Thirdweb Insight
//! - `get_contract_abi` - ABI of a verified contract
//! - `get_erc20_balances` - ERC20 balances of a wallet
//! - `get_transaction_history` - One page of wallet transaction history
//!
//! ### Zerion
//! - `get_token_positions` - Fungible token positions of a wallet
//! - `get_user_nft_transactions` - NFT-related transactions of a wallet
//! - `get_contract_interactions` - Unique contracts a wallet has sent to
//!
//! ### Magic Eden
//! - `get_nft_collection_stats` - Collection stats for a wallet's holdings
//! - `get_nft_activity` - Activity feed of one token
//! - `get_user_nft_activity` - Recent activity feed of a wallet
//! - `get_trending_collections` - Trending collections on the network

use serde_json::{json, Value};
use tracing::info;

use crate::chain::models::{BlockId, ServiceError};
use crate::chain::rpc;
use crate::chain::services::{contract, insight, magic_eden, zerion};
use crate::mcp::protocol::{error_codes, Request, Response};
use crate::{utils, AppState};

/// Map a service failure onto the JSON-RPC error space: caller mistakes are
/// invalid-params, upstream trouble is an internal error.
fn service_error(req_id: &Value, err: ServiceError) -> Response {
    let code = if err.is_caller_fault() {
        error_codes::INVALID_PARAMS
    } else {
        error_codes::INTERNAL_ERROR
    };
    Response::error(req_id.clone(), code, err.to_string())
}

/// Resolve an optional credential from config, failing the call (not the
/// server) when it is absent.
fn require_credential<'a>(
    value: &'a Option<String>,
    var: &'static str,
    req_id: &Value,
) -> Result<&'a str, Response> {
    value
        .as_deref()
        .ok_or_else(|| service_error(req_id, ServiceError::MissingCredential(var)))
}

// Helper: produce a result Value that always contains a text content array
// and preserves structured data for JSON-friendly clients.
fn make_texty_result(text: String, payload: Value) -> Value {
    let content = json!([{ "type": "text", "text": text }]);
    match payload {
        Value::Object(mut map) => {
            if !map.contains_key("content") {
                map.insert("content".into(), content);
            }
            Value::Object(map)
        }
        other => json!({
            "data": other,
            "content": content
        }),
    }
}

/// This is the main dispatcher for all incoming MCP requests.
pub async fn handle_mcp_request(req: Request, state: AppState) -> Option<Response> {
    info!("Handling MCP request for method: {}", req.method);

    if req.is_notification() {
        return None;
    }

    let response = match req.method.as_str() {
        "initialize" => handle_initialize(&req),
        "tools/list" => handle_tools_list(&req),
        "tools/call" => handle_tool_call(req, state).await,
        // Convenience aliases to support direct method calls from CLI
        // clients; rewritten into tools/call to reuse the same logic.
        "get_native_balance"
        | "get_transaction"
        | "get_block"
        | "read_contract"
        | "get_contract_abi"
        | "get_erc20_balances"
        | "get_transaction_history"
        | "get_token_positions"
        | "get_user_nft_transactions"
        | "get_contract_interactions"
        | "get_nft_collection_stats"
        | "get_nft_activity"
        | "get_user_nft_activity"
        | "get_trending_collections" => {
            let name = req.method.clone();
            let wrapped = Request {
                jsonrpc: req.jsonrpc.clone(),
                id: req.id.clone(),
                method: "tools/call".to_string(),
                params: Some(json!({
                    "name": name,
                    "arguments": req.params.clone().unwrap_or_else(|| json!({}))
                })),
            };
            handle_tool_call(wrapped, state).await
        }
        _ => Response::error(
            req.id,
            error_codes::METHOD_NOT_FOUND,
            format!("Method not found: {}", req.method),
        ),
    };

    Some(response)
}

/// Handles a 'tools/call' request by dispatching it to the correct tool logic.
async fn handle_tool_call(req: Request, state: AppState) -> Response {
    let params = match req.params.as_ref() {
        Some(p) => p,
        None => {
            return Response::error(
                req.id,
                error_codes::INVALID_PARAMS,
                "Missing 'params' object".into(),
            )
        }
    };

    let tool_name = match params.get("name").and_then(|n| n.as_str()) {
        Some(name) => name,
        None => {
            return Response::error(
                req.id,
                error_codes::INVALID_PARAMS,
                "Missing 'name' field in params".into(),
            )
        }
    };

    let empty_args = json!({});
    let args = params.get("arguments").unwrap_or(&empty_args);
    let req_id = &req.id;

    match tool_name {
        "get_native_balance" => {
            let res: Result<Response, Response> = (async {
                let address = utils::get_required_arg::<String>(args, "address", req_id)?;
                let balance =
                    rpc::get_native_balance(&state.http, &state.config.rpc_url, &address)
                        .await
                        .map_err(|e| service_error(req_id, e))?;
                let summary = format!("{} MON", balance.balance_mon);
                Ok(Response::success(
                    req_id.clone(),
                    make_texty_result(summary, json!(balance)),
                ))
            })
            .await;
            res.unwrap_or_else(|err_resp| err_resp)
        }
        "get_transaction" => {
            let res: Result<Response, Response> = (async {
                let tx_hash = utils::get_required_arg::<String>(args, "tx_hash", req_id)?;
                let tx = rpc::get_transaction(&state.http, &state.config.rpc_url, &tx_hash)
                    .await
                    .map_err(|e| service_error(req_id, e))?;
                Ok(Response::success(
                    req_id.clone(),
                    make_texty_result(format!("Transaction {}", tx_hash), tx),
                ))
            })
            .await;
            res.unwrap_or_else(|err_resp| err_resp)
        }
        "get_block" => {
            let res: Result<Response, Response> = (async {
                let block_arg = args.get("block").cloned().ok_or_else(|| {
                    Response::error(
                        req_id.clone(),
                        error_codes::INVALID_PARAMS,
                        "Missing or invalid required argument: 'block'".into(),
                    )
                })?;
                let block =
                    BlockId::from_value(&block_arg).map_err(|e| service_error(req_id, e))?;
                let details = rpc::get_block(&state.http, &state.config.rpc_url, &block)
                    .await
                    .map_err(|e| service_error(req_id, e))?;
                Ok(Response::success(
                    req_id.clone(),
                    make_texty_result(format!("Block {}", block.as_param()), details),
                ))
            })
            .await;
            res.unwrap_or_else(|err_resp| err_resp)
        }
        "read_contract" => {
            let res: Result<Response, Response> = (async {
                let contract_address =
                    utils::get_required_arg::<String>(args, "contract_address", req_id)?;
                let function_name =
                    utils::get_required_arg::<String>(args, "function_name", req_id)?;
                let call_args = args
                    .get("args")
                    .and_then(|v| v.as_array())
                    .cloned()
                    .unwrap_or_default();
                let abi_entries = match args.get("abi").and_then(|v| v.as_array()) {
                    Some(entries) => entries.clone(),
                    None => {
                        let client_id = require_credential(
                            &state.config.thirdweb_client_id,
                            "THIRDWEB_CLIENT_ID",
                            req_id,
                        )?;
                        insight::fetch_abi(
                            &state.http,
                            &state.config.insight_api_url,
                            client_id,
                            state.config.chain_id,
                            &contract_address,
                        )
                        .await
                        .map_err(|e| service_error(req_id, e))?
                    }
                };
                let result = contract::read_contract(
                    &state.http,
                    &state.config.rpc_url,
                    &contract_address,
                    abi_entries,
                    &function_name,
                    &call_args,
                )
                .await
                .map_err(|e| service_error(req_id, e))?;
                Ok(Response::success(
                    req_id.clone(),
                    make_texty_result(
                        format!("Read {}.{}", contract_address, function_name),
                        result,
                    ),
                ))
            })
            .await;
            res.unwrap_or_else(|err_resp| err_resp)
        }
        "get_contract_abi" => {
            let res: Result<Response, Response> = (async {
                let contract_address =
                    utils::get_required_arg::<String>(args, "contract_address", req_id)?;
                let client_id = require_credential(
                    &state.config.thirdweb_client_id,
                    "THIRDWEB_CLIENT_ID",
                    req_id,
                )?;
                let abi = insight::fetch_abi(
                    &state.http,
                    &state.config.insight_api_url,
                    client_id,
                    state.config.chain_id,
                    &contract_address,
                )
                .await
                .map_err(|e| service_error(req_id, e))?;
                let summary = format!("ABI with {} entries", abi.len());
                Ok(Response::success(
                    req_id.clone(),
                    make_texty_result(summary, json!({ "abi": abi })),
                ))
            })
            .await;
            res.unwrap_or_else(|err_resp| err_resp)
        }
        "get_erc20_balances" => {
            let res: Result<Response, Response> = (async {
                let address = utils::get_required_arg::<String>(args, "address", req_id)?;
                let secret_key = require_credential(
                    &state.config.thirdweb_secret_key,
                    "THIRDWEB_SECRET_KEY",
                    req_id,
                )?;
                let balances = insight::erc20_balances(
                    &state.http,
                    &state.config.insight_api_url,
                    secret_key,
                    state.config.chain_id,
                    &address,
                )
                .await
                .map_err(|e| service_error(req_id, e))?;
                let summary = format!("{} ERC20 tokens", balances.len());
                Ok(Response::success(
                    req_id.clone(),
                    make_texty_result(summary, json!({ "tokens": balances })),
                ))
            })
            .await;
            res.unwrap_or_else(|err_resp| err_resp)
        }
        "get_transaction_history" => {
            let res: Result<Response, Response> = (async {
                let address = utils::get_required_arg::<String>(args, "address", req_id)?;
                let client_id = require_credential(
                    &state.config.thirdweb_client_id,
                    "THIRDWEB_CLIENT_ID",
                    req_id,
                )?;
                let limit = args.get("limit").and_then(|v| v.as_u64()).unwrap_or(50);
                let page = args.get("page").and_then(|v| v.as_u64()).unwrap_or(0);
                let sort_order = args
                    .get("sort_order")
                    .and_then(|v| v.as_str())
                    .unwrap_or("desc");
                let timestamp_gte = args.get("timestamp_gte").and_then(|v| v.as_i64());
                let transactions = insight::transaction_history(
                    &state.http,
                    &state.config.insight_api_url,
                    client_id,
                    state.config.chain_id,
                    &address,
                    limit,
                    page,
                    sort_order,
                    timestamp_gte,
                )
                .await
                .map_err(|e| service_error(req_id, e))?;
                let summary = format!("{} transactions (page {})", transactions.len(), page);
                Ok(Response::success(
                    req_id.clone(),
                    make_texty_result(summary, json!({ "transactions": transactions })),
                ))
            })
            .await;
            res.unwrap_or_else(|err_resp| err_resp)
        }
        "get_token_positions" => {
            let res: Result<Response, Response> = (async {
                let address = utils::get_required_arg::<String>(args, "address", req_id)?;
                let api_key =
                    require_credential(&state.config.zerion_api_key, "ZERION_API_KEY", req_id)?;
                let positions = zerion::token_positions(
                    &state.http,
                    &state.config.zerion_api_url,
                    api_key,
                    &state.config.zerion_chain_filter,
                    &address,
                )
                .await
                .map_err(|e| service_error(req_id, e))?;
                let summary = format!("{} token positions", positions.len());
                Ok(Response::success(
                    req_id.clone(),
                    make_texty_result(summary, json!({ "positions": positions })),
                ))
            })
            .await;
            res.unwrap_or_else(|err_resp| err_resp)
        }
        "get_user_nft_transactions" => {
            let res: Result<Response, Response> = (async {
                let address = utils::get_required_arg::<String>(args, "address", req_id)?;
                let api_key =
                    require_credential(&state.config.zerion_api_key, "ZERION_API_KEY", req_id)?;
                let page_size = args.get("page_size").and_then(|v| v.as_u64()).unwrap_or(50);
                let transactions = zerion::wallet_transactions(
                    &state.http,
                    &state.config.zerion_api_url,
                    api_key,
                    &state.config.zerion_chain_filter,
                    &address,
                    true,
                    page_size,
                )
                .await
                .map_err(|e| service_error(req_id, e))?;
                let summary = format!("{} NFT transactions", transactions.len());
                Ok(Response::success(
                    req_id.clone(),
                    make_texty_result(summary, json!({ "transactions": transactions })),
                ))
            })
            .await;
            res.unwrap_or_else(|err_resp| err_resp)
        }
        "get_contract_interactions" => {
            let res: Result<Response, Response> = (async {
                let address = utils::get_required_arg::<String>(args, "address", req_id)?;
                let api_key =
                    require_credential(&state.config.zerion_api_key, "ZERION_API_KEY", req_id)?;
                let report = zerion::contract_interactions(
                    &state.http,
                    &state.config.zerion_api_url,
                    api_key,
                    &state.config.zerion_chain_filter,
                    &state.config.rpc_url,
                    &address,
                )
                .await
                .map_err(|e| service_error(req_id, e))?;
                let summary = format!(
                    "{} unique contracts across {} transactions",
                    report.unique_contracts, report.transactions_scanned
                );
                Ok(Response::success(
                    req_id.clone(),
                    make_texty_result(summary, json!(report)),
                ))
            })
            .await;
            res.unwrap_or_else(|err_resp| err_resp)
        }
        "get_nft_collection_stats" => {
            let res: Result<Response, Response> = (async {
                let address = utils::get_required_arg::<String>(args, "address", req_id)?;
                let api_key = require_credential(
                    &state.config.magic_eden_api_key,
                    "MAGIC_EDEN_API_KEY",
                    req_id,
                )?;
                let collections = magic_eden::user_collections(
                    &state.http,
                    &state.config.magic_eden_api_url,
                    api_key,
                    &state.config.magic_eden_network,
                    &address,
                )
                .await
                .map_err(|e| service_error(req_id, e))?;
                let summary = format!("{} collections", collections.len());
                Ok(Response::success(
                    req_id.clone(),
                    make_texty_result(summary, json!({ "collections": collections })),
                ))
            })
            .await;
            res.unwrap_or_else(|err_resp| err_resp)
        }
        "get_nft_activity" => {
            let res: Result<Response, Response> = (async {
                let contract_address =
                    utils::get_required_arg::<String>(args, "contract_address", req_id)?;
                let token_id = utils::get_required_arg::<String>(args, "token_id", req_id)?;
                let api_key = require_credential(
                    &state.config.magic_eden_api_key,
                    "MAGIC_EDEN_API_KEY",
                    req_id,
                )?;
                let activities = magic_eden::token_activity(
                    &state.http,
                    &state.config.magic_eden_api_url,
                    api_key,
                    &state.config.magic_eden_network,
                    &contract_address,
                    &token_id,
                )
                .await
                .map_err(|e| service_error(req_id, e))?;
                let summary = format!(
                    "{} activity events for {}:{}",
                    activities.len(),
                    contract_address,
                    token_id
                );
                Ok(Response::success(
                    req_id.clone(),
                    make_texty_result(summary, json!({ "activities": activities })),
                ))
            })
            .await;
            res.unwrap_or_else(|err_resp| err_resp)
        }
        "get_user_nft_activity" => {
            let res: Result<Response, Response> = (async {
                let address = utils::get_required_arg::<String>(args, "address", req_id)?;
                let api_key = require_credential(
                    &state.config.magic_eden_api_key,
                    "MAGIC_EDEN_API_KEY",
                    req_id,
                )?;
                let limit = args.get("limit").and_then(|v| v.as_u64()).unwrap_or(50);
                let activities = magic_eden::user_activity(
                    &state.http,
                    &state.config.magic_eden_api_url,
                    api_key,
                    &state.config.magic_eden_network,
                    &address,
                    limit,
                )
                .await
                .map_err(|e| service_error(req_id, e))?;
                let summary = format!("{} activity events", activities.len());
                Ok(Response::success(
                    req_id.clone(),
                    make_texty_result(summary, json!({ "activities": activities })),
                ))
            })
            .await;
            res.unwrap_or_else(|err_resp| err_resp)
        }
        "get_trending_collections" => {
            let res: Result<Response, Response> = (async {
                let api_key = require_credential(
                    &state.config.magic_eden_api_key,
                    "MAGIC_EDEN_API_KEY",
                    req_id,
                )?;
                let limit = args.get("limit").and_then(|v| v.as_u64()).unwrap_or(20);
                let period = args.get("period").and_then(|v| v.as_str()).unwrap_or("1d");
                let sort_by = args
                    .get("sort_by")
                    .and_then(|v| v.as_str())
                    .unwrap_or("sales");
                let collections = magic_eden::trending_collections(
                    &state.http,
                    &state.config.magic_eden_api_url,
                    api_key,
                    &state.config.magic_eden_network,
                    limit,
                    period,
                    sort_by,
                )
                .await
                .map_err(|e| service_error(req_id, e))?;
                let summary = format!(
                    "Top {} collections by {} over {}",
                    collections.len(),
                    sort_by,
                    period
                );
                Ok(Response::success(
                    req_id.clone(),
                    make_texty_result(summary, json!({ "collections": collections })),
                ))
            })
            .await;
            res.unwrap_or_else(|err_resp| err_resp)
        }
        _ => Response::error(
            req.id,
            error_codes::METHOD_NOT_FOUND,
            format!("Tool not found: {}", tool_name),
        ),
    }
}

/// Handles the 'initialize' request.
fn handle_initialize(req: &Request) -> Response {
    let server_info = json!({
        "name": "monad_mcp",
        "version": "0.1.0"
    });
    let capabilities = json!({ "tools": { "listChanged": false } });
    let instructions =
        "Read-only Monad testnet MCP server: balances, transactions, blocks, contract reads, and NFT market data.";

    Response::success(
        req.id.clone(),
        json!({
            "serverInfo": server_info,
            "protocolVersion": "2025-06-18",
            "capabilities": capabilities,
            "instructions": instructions
        }),
    )
}

/// Handles the 'tools/list' request by returning a JSON definition of all available tools.
fn handle_tools_list(req: &Request) -> Response {
    let tools = json!([
        {
            "name": "get_native_balance",
            "description": "Get the native MON balance of an address on Monad testnet.",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "address": {"type": "string", "description": "The 0x... wallet address to check."}
                },
                "required": ["address"],
                "additionalProperties": false
            }
        },
        {
            "name": "get_transaction",
            "description": "Get details for a transaction hash on Monad testnet.",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "tx_hash": {"type": "string", "description": "The 0x... transaction hash (66 characters)."}
                },
                "required": ["tx_hash"],
                "additionalProperties": false
            }
        },
        {
            "name": "get_block",
            "description": "Get details for a block by number, or by tag ('latest', 'earliest', 'pending').",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "block": {
                        "description": "Block number (non-negative integer) or tag string.",
                        "oneOf": [{"type": "integer", "minimum": 0}, {"type": "string"}]
                    }
                },
                "required": ["block"],
                "additionalProperties": false
            }
        },
        {
            "name": "read_contract",
            "description": "Call a read-only contract function via eth_call. The ABI is fetched from Thirdweb Insight when omitted (requires THIRDWEB_CLIENT_ID).",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "contract_address": {"type": "string", "description": "The 0x... contract address."},
                    "function_name": {"type": "string", "description": "Name of the function to call."},
                    "args": {"type": "array", "description": "Positional arguments for the function."},
                    "abi": {"type": "array", "description": "Optional ABI entry list overriding the Insight lookup."}
                },
                "required": ["contract_address", "function_name"],
                "additionalProperties": false
            }
        },
        {
            "name": "get_contract_abi",
            "description": "Fetch the ABI of a verified contract from Thirdweb Insight.",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "contract_address": {"type": "string", "description": "The 0x... contract address."}
                },
                "required": ["contract_address"],
                "additionalProperties": false
            }
        },
        {
            "name": "get_erc20_balances",
            "description": "List ERC20 token balances of a wallet via Thirdweb Insight (requires THIRDWEB_SECRET_KEY).",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "address": {"type": "string", "description": "The 0x... wallet address."}
                },
                "required": ["address"],
                "additionalProperties": false
            }
        },
        {
            "name": "get_transaction_history",
            "description": "Get one page of wallet transaction history from Thirdweb Insight.",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "address": {"type": "string", "description": "The 0x... wallet address."},
                    "limit": {"type": "integer", "description": "Items per page, 1-500 (default 50)."},
                    "page": {"type": "integer", "description": "Zero-based page number (default 0)."},
                    "sort_order": {"type": "string", "description": "'asc' or 'desc' (default 'desc')."},
                    "timestamp_gte": {"type": "integer", "description": "Only transactions at or after this unix timestamp."}
                },
                "required": ["address"],
                "additionalProperties": false
            }
        },
        {
            "name": "get_token_positions",
            "description": "List fungible token positions of a wallet via Zerion, excluding native and trash-flagged tokens.",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "address": {"type": "string", "description": "The 0x... wallet address."}
                },
                "required": ["address"],
                "additionalProperties": false
            }
        },
        {
            "name": "get_user_nft_transactions",
            "description": "List NFT-related transactions of a wallet via Zerion.",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "address": {"type": "string", "description": "The 0x... wallet address."},
                    "page_size": {"type": "integer", "description": "Items per page, 1-500 (default 50)."}
                },
                "required": ["address"],
                "additionalProperties": false
            }
        },
        {
            "name": "get_contract_interactions",
            "description": "Count the unique contracts a wallet has sent transactions to, scanning its Zerion feed and classifying counterparties via eth_getCode.",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "address": {"type": "string", "description": "The 0x... wallet address to analyze."}
                },
                "required": ["address"],
                "additionalProperties": false
            }
        },
        {
            "name": "get_nft_collection_stats",
            "description": "Get NFT collection statistics for a wallet's holdings from Magic Eden.",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "address": {"type": "string", "description": "The 0x... wallet address."}
                },
                "required": ["address"],
                "additionalProperties": false
            }
        },
        {
            "name": "get_nft_activity",
            "description": "Get the activity history of one NFT from Magic Eden.",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "contract_address": {"type": "string", "description": "The 0x... collection contract address."},
                    "token_id": {"type": "string", "description": "Decimal token id within the collection."}
                },
                "required": ["contract_address", "token_id"],
                "additionalProperties": false
            }
        },
        {
            "name": "get_user_nft_activity",
            "description": "Get the most recent NFT activity feed of a wallet from Magic Eden.",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "address": {"type": "string", "description": "The 0x... wallet address."},
                    "limit": {"type": "integer", "description": "Max events to fetch, 1-500 (default 50)."}
                },
                "required": ["address"],
                "additionalProperties": false
            }
        },
        {
            "name": "get_trending_collections",
            "description": "Get trending NFT collections on Monad testnet from Magic Eden.",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "limit": {"type": "integer", "description": "Number of collections, 1-500 (default 20)."},
                    "period": {"type": "string", "description": "Time window: 5m, 10m, 30m, 1h, 6h, 1d, 24h, 7d or 30d (default 1d)."},
                    "sort_by": {"type": "string", "description": "'sales' or 'volume' (default 'sales')."}
                },
                "additionalProperties": false
            }
        }
    ]);
    Response::success(req.id.clone(), json!({ "tools": tools }))
}
