//! Tests for the Insight, Zerion and Magic Eden services against mocked
//! upstream endpoints, covering success shapes, pagination and error
//! surfacing.

use mockito::Matcher;
use serde_json::json;

use monad_mcp_server::chain::models::ServiceError;
use monad_mcp_server::chain::services::{insight, magic_eden, zerion};

const WALLET: &str = "0xfb6916095ca1df60bb79ce92ce3ea74c37c5d359";
const WALLET_CHECKSUM: &str = "0xfB6916095ca1df60bB79Ce92cE3Ea74c37c5d359";

// --- Thirdweb Insight ---

#[tokio::test]
async fn erc20_balances_unwrap_the_data_envelope() {
    let _m = mockito::mock(
        "GET",
        Matcher::Regex(format!("^/tokens/erc20/{}.*$", WALLET_CHECKSUM)),
    )
    .match_header("x-secret-key", "sekrit")
    .with_status(200)
    .with_header("content-type", "application/json")
    .with_body(
        json!({"data": [
            {"token_address": "0x5555555555555555555555555555555555555555", "balance": "120000"},
            {"token_address": "0x6666666666666666666666666666666666666666", "balance": "7"}
        ]})
        .to_string(),
    )
    .create();

    let client = reqwest::Client::new();
    let tokens = insight::erc20_balances(&client, &mockito::server_url(), "sekrit", 10143, WALLET)
        .await
        .unwrap();
    assert_eq!(tokens.len(), 2);
    assert_eq!(
        tokens[0]["token_address"],
        json!("0x5555555555555555555555555555555555555555")
    );
}

#[tokio::test]
async fn erc20_balances_surface_auth_failures() {
    let _m = mockito::mock(
        "GET",
        Matcher::Regex("^/tokens/erc20/0x1111111111111111111111111111111111111111.*$".to_string()),
    )
    .with_status(401)
    .with_body("invalid secret key")
    .create();

    let client = reqwest::Client::new();
    let err = insight::erc20_balances(
        &client,
        &mockito::server_url(),
        "wrong",
        10143,
        "0x1111111111111111111111111111111111111111",
    )
    .await
    .unwrap_err();
    match err {
        ServiceError::Upstream { service, status, .. } => {
            assert_eq!(service, "insight");
            assert_eq!(status, 401);
        }
        other => panic!("expected Upstream error, got {:?}", other),
    }
}

#[tokio::test]
async fn abi_fetch_accepts_wrapped_and_bare_lists() {
    let _m = mockito::mock(
        "GET",
        Matcher::Regex(format!("^/contracts/abi/{}.*$", WALLET_CHECKSUM)),
    )
    .with_status(200)
    .with_header("content-type", "application/json")
    .with_body(
        json!({"result": [
            {"type": "function", "name": "symbol", "inputs": [], "outputs": [{"name": "", "type": "string"}], "stateMutability": "view"}
        ]})
        .to_string(),
    )
    .create();

    let client = reqwest::Client::new();
    let abi = insight::fetch_abi(&client, &mockito::server_url(), "cid", 10143, WALLET)
        .await
        .unwrap();
    assert_eq!(abi.len(), 1);
    assert_eq!(abi[0]["name"], json!("symbol"));
}

#[tokio::test]
async fn unverified_contract_abi_is_not_found() {
    let unverified = "0x2222222222222222222222222222222222222222";
    let _m = mockito::mock(
        "GET",
        Matcher::Regex(format!("^/contracts/abi/{}.*$", unverified)),
    )
    .with_status(404)
    .with_body("not found")
    .create();

    let client = reqwest::Client::new();
    let err = insight::fetch_abi(&client, &mockito::server_url(), "cid", 10143, unverified)
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::NotFound(_)));
}

#[tokio::test]
async fn transaction_history_unwraps_one_page() {
    let wallet = "0x3333333333333333333333333333333333333333";
    let _m = mockito::mock(
        "GET",
        Matcher::Regex(format!("^/wallets/{}/transactions.*$", wallet)),
    )
    .with_status(200)
    .with_header("content-type", "application/json")
    .with_body(json!({"data": [{"hash": "0xaa"}, {"hash": "0xbb"}]}).to_string())
    .create();

    let client = reqwest::Client::new();
    let page = insight::transaction_history(
        &client,
        &mockito::server_url(),
        "cid",
        10143,
        wallet,
        50,
        0,
        "desc",
        None,
    )
    .await
    .unwrap();
    assert_eq!(page.len(), 2);
}

// --- Zerion ---

#[tokio::test]
async fn token_positions_follow_links_next_and_sort_by_name() {
    let server = mockito::server_url();
    let _m1 = mockito::mock(
        "GET",
        Matcher::Regex(format!("^/wallets/{}/positions.*$", WALLET_CHECKSUM)),
    )
    .match_header("X-Env", "testnet")
    .with_status(200)
    .with_header("content-type", "application/json")
    .with_body(
        json!({
            "data": [
                {
                    "type": "positions",
                    "attributes": {
                        "fungible_info": {"name": "Wrapped Monad", "symbol": "WMON"},
                        "quantity": {"numeric": "12.5"},
                        "flags": {"trash": false, "native": false}
                    }
                },
                {
                    "type": "positions",
                    "attributes": {
                        "fungible_info": {"name": "Monad", "symbol": "MON"},
                        "quantity": {"numeric": "3"},
                        "flags": {"trash": false, "native": true}
                    }
                }
            ],
            "links": {"next": format!("{}/zerion-positions-page-2", server)}
        })
        .to_string(),
    )
    .create();
    let _m2 = mockito::mock("GET", "/zerion-positions-page-2")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!({
                "data": [
                    {
                        "type": "positions",
                        "attributes": {
                            "fungible_info": {"name": "Acme Coin", "symbol": "ACME"},
                            "quantity": {"numeric": "1.25"},
                            "flags": {"trash": false, "native": false}
                        }
                    }
                ],
                "links": {}
            })
            .to_string(),
        )
        .create();

    let client = reqwest::Client::new();
    let positions = zerion::token_positions(&client, &server, "zkey", "monad-test-v2", WALLET)
        .await
        .unwrap();

    // Native position dropped, remaining two sorted by name.
    assert_eq!(positions.len(), 2);
    assert_eq!(positions[0].symbol, "ACME");
    assert_eq!(positions[1].symbol, "WMON");
}

#[tokio::test]
async fn zerion_error_status_is_surfaced_not_swallowed() {
    let wallet = "0x7777777777777777777777777777777777777777";
    let _m = mockito::mock(
        "GET",
        Matcher::Regex(format!("^/wallets/{}/positions.*$", wallet)),
    )
    .with_status(429)
    .with_body("rate limited")
    .create();

    let client = reqwest::Client::new();
    let err = zerion::token_positions(
        &client,
        &mockito::server_url(),
        "zkey",
        "monad-test-v2",
        wallet,
    )
    .await
    .unwrap_err();
    match err {
        ServiceError::Upstream { service, status, body } => {
            assert_eq!(service, "zerion");
            assert_eq!(status, 429);
            assert_eq!(body, "rate limited");
        }
        other => panic!("expected Upstream error, got {:?}", other),
    }
}

#[tokio::test]
async fn contract_interactions_classify_counterparties_via_get_code() {
    let wallet = "0x4444444444444444444444444444444444444444";
    let contract = "0x5555555555555555555555555555555555555555";
    let eoa = "0x6666666666666666666666666666666666666666";
    let server = mockito::server_url();

    let _feed = mockito::mock(
        "GET",
        Matcher::Regex(format!("^/wallets/{}/transactions.*$", wallet)),
    )
    .with_status(200)
    .with_header("content-type", "application/json")
    .with_body(
        json!({
            "data": [
                {"type": "transactions", "attributes": {"sent_to": contract}},
                {"type": "transactions", "attributes": {"sent_to": eoa}},
                {"type": "transactions", "attributes": {"sent_to": contract}},
                {"type": "other", "attributes": {"sent_to": "0x9999999999999999999999999999999999999999"}}
            ],
            "links": {}
        })
        .to_string(),
    )
    .create();
    let _code_contract = mockito::mock("POST", "/")
        .match_body(Matcher::PartialJson(json!({
            "method": "eth_getCode",
            "params": [contract, "latest"]
        })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(json!({"jsonrpc": "2.0", "id": 1, "result": "0x6080604052"}).to_string())
        .create();
    let _code_eoa = mockito::mock("POST", "/")
        .match_body(Matcher::PartialJson(json!({
            "method": "eth_getCode",
            "params": [eoa, "latest"]
        })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(json!({"jsonrpc": "2.0", "id": 1, "result": "0x"}).to_string())
        .create();

    let client = reqwest::Client::new();
    let report = zerion::contract_interactions(
        &client,
        &server,
        "zkey",
        "monad-test-v2",
        &server,
        wallet,
    )
    .await
    .unwrap();

    assert_eq!(report.address, wallet);
    assert_eq!(report.transactions_scanned, 4);
    assert_eq!(report.unique_counterparties, 2);
    assert_eq!(report.unique_contracts, 1);
    assert_eq!(report.contract_addresses, vec![contract.to_string()]);
}

// --- Magic Eden ---

#[tokio::test]
async fn trending_collections_unwrap_the_collections_envelope() {
    let _m = mockito::mock(
        "GET",
        Matcher::Regex("^/v3/rtp/monad-testnet/collections/trending/v1.*$".to_string()),
    )
    .match_header("authorization", "Bearer mekey")
    .with_status(200)
    .with_header("content-type", "application/json")
    .with_body(
        json!({"collections": [
            {"name": "Monad Punks", "volume": "120"},
            {"name": "Nads", "volume": "88"}
        ]})
        .to_string(),
    )
    .create();

    let client = reqwest::Client::new();
    let collections = magic_eden::trending_collections(
        &client,
        &mockito::server_url(),
        "mekey",
        "monad-testnet",
        20,
        "1d",
        "sales",
    )
    .await
    .unwrap();
    assert_eq!(collections.len(), 2);
    assert_eq!(collections[0]["name"], json!("Monad Punks"));
}

#[tokio::test]
async fn user_collections_stop_on_a_short_page() {
    let page_mock = mockito::mock(
        "GET",
        Matcher::Regex(format!(
            "^/v3/rtp/monad-testnet/users/{}/collections/v3.*$",
            WALLET_CHECKSUM
        )),
    )
    .with_status(200)
    .with_header("content-type", "application/json")
    .with_body(
        json!({"collections": [
            {"collection": {"id": "0xaaa"}, "ownership": {"tokenCount": "2"}},
            {"collection": {"id": "0xbbb"}, "ownership": {"tokenCount": "1"}}
        ]})
        .to_string(),
    )
    .expect(1)
    .create();

    let client = reqwest::Client::new();
    let collections = magic_eden::user_collections(
        &client,
        &mockito::server_url(),
        "mekey",
        "monad-testnet",
        WALLET,
    )
    .await
    .unwrap();
    assert_eq!(collections.len(), 2);
    // A short page must end the pagination: exactly one request.
    page_mock.assert();
}

#[tokio::test]
async fn token_activity_follows_the_continuation_token() {
    let contract = "0x8888888888888888888888888888888888888888";
    let _m1 = mockito::mock(
        "GET",
        Matcher::Regex(format!(
            "^/v3/rtp/monad-testnet/tokens/{}%3A15/activity/v5\\?limit=20&sortBy=eventTimestamp&includeMetadata=true$",
            contract
        )),
    )
    .with_status(200)
    .with_header("content-type", "application/json")
    .with_body(
        json!({"activities": [{"type": "sale"}], "continuation": "abc123"}).to_string(),
    )
    .create();
    let _m2 = mockito::mock(
        "GET",
        Matcher::Regex(format!(
            "^/v3/rtp/monad-testnet/tokens/{}%3A15/activity/v5\\?.*continuation=abc123.*$",
            contract
        )),
    )
    .with_status(200)
    .with_header("content-type", "application/json")
    .with_body(json!({"activities": [{"type": "mint"}], "continuation": null}).to_string())
    .create();

    let client = reqwest::Client::new();
    let activities = magic_eden::token_activity(
        &client,
        &mockito::server_url(),
        "mekey",
        "monad-testnet",
        contract,
        "15",
    )
    .await
    .unwrap();
    assert_eq!(activities.len(), 2);
    assert_eq!(activities[0]["type"], json!("sale"));
    assert_eq!(activities[1]["type"], json!("mint"));
}

#[tokio::test]
async fn user_activity_surfaces_upstream_failures() {
    let wallet = "0x9999999999999999999999999999999999999999";
    let _m = mockito::mock(
        "GET",
        Matcher::Regex("^/v3/rtp/monad-testnet/users/activity/v6.*$".to_string()),
    )
    .with_status(500)
    .with_body("internal error")
    .create();

    let client = reqwest::Client::new();
    let err = magic_eden::user_activity(
        &client,
        &mockito::server_url(),
        "mekey",
        "monad-testnet",
        wallet,
        50,
    )
    .await
    .unwrap_err();
    match err {
        ServiceError::Upstream { service, status, .. } => {
            assert_eq!(service, "magic-eden");
            assert_eq!(status, 500);
        }
        other => panic!("expected Upstream error, got {:?}", other),
    }
}
