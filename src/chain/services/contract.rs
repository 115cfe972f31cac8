// src/chain/services/contract.rs
//
// ABI-driven read-only contract calls: encode the selector and arguments,
// `eth_call` the node, decode the outputs into JSON-safe values.

use std::str::FromStr;

use ethers_core::abi::{decode, encode, Abi, Function, ParamType, Token};
use ethers_core::types::{Address, Bytes, U256};
use ethers_core::utils::{keccak256, to_checksum};
use reqwest::Client;
use serde_json::{json, Value};

use crate::chain::models::ServiceError;
use crate::chain::rpc::eth_call;
use crate::utils::parse_address;

// Integers above this cannot round-trip through a JSON number.
const MAX_SAFE_INTEGER: u64 = 1 << 53;

fn selector(sig: &str) -> [u8; 4] {
    let mut sel = [0u8; 4];
    sel.copy_from_slice(&keccak256(sig.as_bytes())[0..4]);
    sel
}

pub fn encode_call(sig: &str, tokens: &[Token]) -> Bytes {
    let mut out = selector(sig).to_vec();
    out.extend(encode(tokens));
    Bytes::from(out)
}

pub fn function_signature(func: &Function) -> String {
    let types: Vec<String> = func
        .inputs
        .iter()
        .map(|p| param_type_to_string(&p.kind))
        .collect();
    format!("{}({})", func.name, types.join(","))
}

fn param_type_to_string(p: &ParamType) -> String {
    match p {
        ParamType::Address => "address".to_string(),
        ParamType::Bytes => "bytes".to_string(),
        ParamType::FixedBytes(n) => format!("bytes{}", n),
        ParamType::Int(n) => format!("int{}", n),
        ParamType::Uint(n) => format!("uint{}", n),
        ParamType::Bool => "bool".to_string(),
        ParamType::String => "string".to_string(),
        ParamType::Array(inner) => format!("{}[]", param_type_to_string(inner)),
        ParamType::FixedArray(inner, n) => format!("{}[{}]", param_type_to_string(inner), n),
        ParamType::Tuple(components) => {
            let inner: Vec<String> = components.iter().map(param_type_to_string).collect();
            format!("({})", inner.join(","))
        }
    }
}

/// Coerce JSON arguments into ABI tokens matching the function's inputs.
pub fn coerce_tokens(func: &Function, args: &[Value]) -> Result<Vec<Token>, ServiceError> {
    if func.inputs.len() != args.len() {
        return Err(ServiceError::InvalidInput(format!(
            "argument count mismatch for '{}': expected {}, got {}",
            func.name,
            func.inputs.len(),
            args.len()
        )));
    }
    let mut out = Vec::new();
    for (param, val) in func.inputs.iter().zip(args) {
        out.push(coerce_token(&param.kind, val)?);
    }
    Ok(out)
}

fn coerce_token(ty: &ParamType, val: &Value) -> Result<Token, ServiceError> {
    let tok = match ty {
        ParamType::Address => {
            let s = val.as_str().ok_or_else(|| {
                ServiceError::InvalidInput("address argument must be a string".to_string())
            })?;
            let addr = Address::from_str(s.trim()).map_err(|_| {
                ServiceError::InvalidInput(format!("invalid address argument: {}", s))
            })?;
            Token::Address(addr)
        }
        ParamType::Uint(_) => {
            let n = match val {
                Value::String(s) => U256::from_dec_str(s).map_err(|_| {
                    ServiceError::InvalidInput(format!("invalid uint argument: {}", s))
                })?,
                Value::Number(n) => {
                    let v = n.as_u64().ok_or_else(|| {
                        ServiceError::InvalidInput(format!("invalid uint argument: {}", n))
                    })?;
                    U256::from(v)
                }
                _ => {
                    return Err(ServiceError::InvalidInput(
                        "uint argument must be a decimal string or number".to_string(),
                    ))
                }
            };
            Token::Uint(n)
        }
        ParamType::Bool => Token::Bool(val.as_bool().ok_or_else(|| {
            ServiceError::InvalidInput("bool argument must be a boolean".to_string())
        })?),
        ParamType::String => Token::String(
            val.as_str()
                .ok_or_else(|| {
                    ServiceError::InvalidInput("string argument must be a string".to_string())
                })?
                .to_string(),
        ),
        ParamType::Bytes => {
            let s = val.as_str().unwrap_or("");
            let bytes = if let Some(stripped) = s.strip_prefix("0x") {
                hex::decode(stripped).map_err(|_| {
                    ServiceError::InvalidInput(format!("invalid hex bytes argument: {}", s))
                })?
            } else {
                s.as_bytes().to_vec()
            };
            Token::Bytes(bytes)
        }
        other => {
            return Err(ServiceError::InvalidInput(format!(
                "unsupported ABI parameter type: {:?}",
                other
            )))
        }
    };
    Ok(tok)
}

/// Render a decoded ABI token as JSON. Wide integers and byte blobs become
/// strings so nothing is lost to JSON number precision.
pub fn token_to_value(token: &Token) -> Value {
    match token {
        Token::Address(a) => json!(to_checksum(a, None)),
        Token::Bytes(b) | Token::FixedBytes(b) => json!(format!("0x{}", hex::encode(b))),
        Token::Uint(n) => {
            if *n > U256::from(MAX_SAFE_INTEGER) {
                json!(n.to_string())
            } else {
                json!(n.as_u64())
            }
        }
        Token::Int(n) => json!(n.to_string()),
        Token::Bool(b) => json!(b),
        Token::String(s) => json!(s),
        Token::Array(items) | Token::FixedArray(items) | Token::Tuple(items) => {
            Value::Array(items.iter().map(token_to_value).collect())
        }
    }
}

/// Call a read-only function on a contract, given its ABI entry list.
/// Returns the single decoded output, or an array when the function has
/// several.
pub async fn read_contract(
    client: &Client,
    rpc_url: &str,
    contract_address: &str,
    abi_entries: Vec<Value>,
    function_name: &str,
    args: &[Value],
) -> Result<Value, ServiceError> {
    if abi_entries.is_empty() {
        return Err(ServiceError::InvalidInput("empty ABI".to_string()));
    }
    let checksummed = parse_address(contract_address)?;
    let abi: Abi = serde_json::from_value(Value::Array(abi_entries))
        .map_err(|e| ServiceError::InvalidInput(format!("invalid ABI: {}", e)))?;
    let func: &Function = abi
        .functions()
        .find(|f| f.name == function_name)
        .ok_or_else(|| {
            ServiceError::InvalidInput(format!("function '{}' not found in ABI", function_name))
        })?;
    let tokens = coerce_tokens(func, args)?;
    let data = encode_call(&function_signature(func), &tokens);

    let raw = eth_call(client, rpc_url, &checksummed, data).await?;
    let hex_result = raw
        .as_str()
        .ok_or(ServiceError::UnexpectedPayload("eth_call"))?;
    let bytes = hex::decode(hex_result.trim_start_matches("0x"))
        .map_err(|_| ServiceError::UnexpectedPayload("eth_call"))?;

    let output_types: Vec<ParamType> = func.outputs.iter().map(|p| p.kind.clone()).collect();
    if output_types.is_empty() {
        return Ok(json!(hex_result));
    }
    let decoded = decode(&output_types, &bytes).map_err(|e| {
        ServiceError::InvalidInput(format!(
            "could not decode '{}' return data: {}",
            function_name, e
        ))
    })?;
    let mut values: Vec<Value> = decoded.iter().map(token_to_value).collect();
    if values.len() == 1 {
        Ok(values.remove(0))
    } else {
        Ok(Value::Array(values))
    }
}
