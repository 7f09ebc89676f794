//! Ledger node access over Solana's JSON-RPC 2.0 interface.
//!
//! Only two read calls are needed: `getBalance` and `getTokenAccountsByOwner`.
//! Responses are decoded into typed records; anything missing or malformed
//! surfaces as [`RpcError::Parse`] instead of a panic on field access.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use pumpdesk_core::PumpdeskConfig;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use tracing::debug;

use crate::error::RpcError;
use crate::wallet::TokenHolding;

/// The SPL Token program. Token accounts are filtered by this owner program.
pub const TOKEN_PROGRAM_ID: &str = "TokenkegQfeZyiNwAJbNbGKPFXCWuBvf9Ss623VQ5DA";

/// Lamports per SOL.
pub const LAMPORTS_PER_SOL: u64 = 1_000_000_000;

/// Convert a lamport amount to SOL for display.
pub fn lamports_to_sol(lamports: u64) -> f64 {
    lamports as f64 / LAMPORTS_PER_SOL as f64
}

// ---------------------------------------------------------------------------
// Trait
// ---------------------------------------------------------------------------

/// Read-only view of a ledger node.
pub trait LedgerRpc: Send + Sync {
    /// Balance of `public_key` in lamports.
    fn get_balance(&self, public_key: &str) -> Result<u64, RpcError>;

    /// All token accounts owned by `owner` under `program_id`.
    fn get_token_accounts_by_owner(
        &self,
        owner: &str,
        program_id: &str,
    ) -> Result<Vec<TokenHolding>, RpcError>;
}

// ---------------------------------------------------------------------------
// Wire types (private)
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct RpcEnvelope {
    result: Option<Value>,
    error: Option<RpcErrorBody>,
}

#[derive(Debug, Deserialize)]
struct RpcErrorBody {
    code: i64,
    message: String,
}

#[derive(Debug, Deserialize)]
struct WithContext<T> {
    value: T,
}

#[derive(Debug, Deserialize)]
struct KeyedAccount {
    pubkey: String,
    account: AccountEntry,
}

#[derive(Debug, Deserialize)]
struct AccountEntry {
    data: Value,
}

#[derive(Debug, Deserialize)]
struct ParsedAccountData {
    parsed: ParsedAccount,
}

#[derive(Debug, Deserialize)]
struct ParsedAccount {
    info: TokenAccountInfo,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TokenAccountInfo {
    mint: String,
    token_amount: TokenAmount,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TokenAmount {
    amount: Option<String>,
    decimals: Option<u8>,
    ui_amount: Option<f64>,
    ui_amount_string: Option<String>,
}

impl TokenAmount {
    /// Human-readable amount: `uiAmount`, else `uiAmountString`, else `amount / 10^decimals`.
    fn ui_value(&self) -> Result<f64, RpcError> {
        if let Some(v) = self.ui_amount {
            return Ok(v);
        }
        if let Some(s) = &self.ui_amount_string {
            return s
                .parse::<f64>()
                .map_err(|e| RpcError::Parse(format!("uiAmountString {s:?}: {e}")));
        }
        match (&self.amount, self.decimals) {
            (Some(raw), Some(decimals)) => {
                let raw: u64 = raw
                    .parse()
                    .map_err(|e| RpcError::Parse(format!("tokenAmount.amount {raw:?}: {e}")))?;
                Ok(raw as f64 / 10f64.powi(i32::from(decimals)))
            }
            _ => Err(RpcError::Parse("tokenAmount carries no usable amount".into())),
        }
    }
}

fn decode<T: DeserializeOwned>(value: Value, what: &str) -> Result<T, RpcError> {
    serde_json::from_value(value).map_err(|e| RpcError::Parse(format!("{what}: {e}")))
}

/// Unwrap a JSON-RPC envelope into its `result`, surfacing node-side errors.
fn unwrap_envelope(body: Value) -> Result<Value, RpcError> {
    let envelope: RpcEnvelope = decode(body, "json-rpc envelope")?;
    if let Some(err) = envelope.error {
        return Err(RpcError::Rpc {
            code: err.code,
            message: err.message,
        });
    }
    envelope
        .result
        .ok_or_else(|| RpcError::Parse("response has neither result nor error".into()))
}

/// Decode a `getBalance` response body into lamports.
pub fn parse_balance_response(body: Value) -> Result<u64, RpcError> {
    let result = unwrap_envelope(body)?;
    let ctx: WithContext<u64> = decode(result, "getBalance result")?;
    Ok(ctx.value)
}

/// Decode a `getTokenAccountsByOwner` (jsonParsed) response body.
pub fn parse_token_accounts_response(body: Value) -> Result<Vec<TokenHolding>, RpcError> {
    let result = unwrap_envelope(body)?;
    let ctx: WithContext<Vec<KeyedAccount>> = decode(result, "getTokenAccountsByOwner result")?;

    ctx.value
        .into_iter()
        .map(|keyed| {
            let data: ParsedAccountData = decode(
                keyed.account.data,
                &format!("account {} data.parsed.info", keyed.pubkey),
            )?;
            let info = data.parsed.info;
            Ok(TokenHolding {
                mint: info.mint,
                amount: info.token_amount.ui_value()?,
                address: keyed.pubkey,
            })
        })
        .collect()
}

// ---------------------------------------------------------------------------
// HTTP client
// ---------------------------------------------------------------------------

/// Blocking JSON-RPC client for a Solana node.
#[derive(Debug)]
pub struct SolanaRpcClient {
    url: String,
    http: reqwest::blocking::Client,
    next_id: AtomicU64,
}

impl SolanaRpcClient {
    pub fn new(url: impl Into<String>, timeout_secs: u64) -> Result<Self, RpcError> {
        let http = reqwest::blocking::Client::builder()
            .user_agent(concat!("pumpdesk/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| RpcError::Network(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            url: url.into(),
            http,
            next_id: AtomicU64::new(1),
        })
    }

    /// Build a client from validated config.
    pub fn from_config(config: &PumpdeskConfig) -> Result<Self, RpcError> {
        config
            .validate()
            .map_err(|e| RpcError::Config(e.to_string()))?;
        Self::new(config.rpc_url.clone(), config.rpc_timeout_secs)
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    fn call(&self, method: &str, params: Value) -> Result<Value, RpcError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let request = json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": method,
            "params": params,
        });
        debug!(method, id, url = %self.url, "rpc request");

        let resp = self
            .http
            .post(&self.url)
            .json(&request)
            .send()
            .map_err(|e| RpcError::Network(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(RpcError::Status(status.as_u16()));
        }

        resp.json::<Value>()
            .map_err(|e| RpcError::Parse(format!("response body is not JSON: {e}")))
    }
}

impl LedgerRpc for SolanaRpcClient {
    fn get_balance(&self, public_key: &str) -> Result<u64, RpcError> {
        let body = self.call("getBalance", json!([public_key]))?;
        parse_balance_response(body)
    }

    fn get_token_accounts_by_owner(
        &self,
        owner: &str,
        program_id: &str,
    ) -> Result<Vec<TokenHolding>, RpcError> {
        let body = self.call(
            "getTokenAccountsByOwner",
            json!([owner, { "programId": program_id }, { "encoding": "jsonParsed" }]),
        )?;
        parse_token_accounts_response(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token_account(pubkey: &str, mint: &str, token_amount: Value) -> Value {
        json!({
            "pubkey": pubkey,
            "account": {
                "data": {
                    "program": "spl-token",
                    "parsed": {
                        "type": "account",
                        "info": {
                            "mint": mint,
                            "owner": "Owner1111111111111111111111111111111111111",
                            "tokenAmount": token_amount
                        }
                    },
                    "space": 165
                },
                "executable": false,
                "lamports": 2039280,
                "owner": TOKEN_PROGRAM_ID
            }
        })
    }

    #[test]
    fn lamports_convert_to_sol() {
        assert_eq!(lamports_to_sol(0), 0.0);
        assert_eq!(lamports_to_sol(1_500_000_000), 1.5);
        assert_eq!(lamports_to_sol(1), 0.000000001);
    }

    #[test]
    fn parses_balance() {
        let body = json!({
            "jsonrpc": "2.0",
            "id": 1,
            "result": { "context": { "slot": 1 }, "value": 2_500_000_000u64 }
        });
        assert_eq!(parse_balance_response(body).unwrap(), 2_500_000_000);
    }

    #[test]
    fn balance_missing_value_is_parse_error() {
        let body = json!({ "jsonrpc": "2.0", "id": 1, "result": { "context": {} } });
        let err = parse_balance_response(body).unwrap_err();
        assert!(matches!(err, RpcError::Parse(_)), "got {err:?}");
    }

    #[test]
    fn node_error_is_surfaced() {
        let body = json!({
            "jsonrpc": "2.0",
            "id": 1,
            "error": { "code": -32602, "message": "Invalid param: WrongSize" }
        });
        match parse_balance_response(body).unwrap_err() {
            RpcError::Rpc { code, message } => {
                assert_eq!(code, -32602);
                assert!(message.contains("WrongSize"));
            }
            other => panic!("expected Rpc error, got {other:?}"),
        }
    }

    #[test]
    fn empty_envelope_is_parse_error() {
        let err = parse_balance_response(json!({ "jsonrpc": "2.0", "id": 1 })).unwrap_err();
        assert!(matches!(err, RpcError::Parse(_)));
    }

    #[test]
    fn parses_token_accounts() {
        let body = json!({
            "jsonrpc": "2.0",
            "id": 2,
            "result": {
                "context": { "slot": 9 },
                "value": [
                    token_account("Acct1", "MintA", json!({
                        "amount": "1500000", "decimals": 6, "uiAmount": 1.5, "uiAmountString": "1.5"
                    })),
                    token_account("Acct2", "MintB", json!({
                        "amount": "0", "decimals": 9, "uiAmount": 0.0, "uiAmountString": "0"
                    })),
                ]
            }
        });

        let holdings = parse_token_accounts_response(body).unwrap();
        assert_eq!(holdings.len(), 2);
        assert_eq!(holdings[0].mint, "MintA");
        assert_eq!(holdings[0].amount, 1.5);
        assert_eq!(holdings[0].address, "Acct1");
        assert_eq!(holdings[1].mint, "MintB");
        assert_eq!(holdings[1].amount, 0.0);
    }

    #[test]
    fn null_ui_amount_falls_back() {
        let body = json!({
            "jsonrpc": "2.0",
            "id": 3,
            "result": {
                "context": { "slot": 9 },
                "value": [
                    token_account("A", "M1", json!({
                        "amount": "250", "decimals": 2, "uiAmount": null, "uiAmountString": "2.5"
                    })),
                    token_account(
                        "B",
                        "M2",
                        json!({ "amount": "250", "decimals": 2, "uiAmount": null }),
                    ),
                ]
            }
        });
        let holdings = parse_token_accounts_response(body).unwrap();
        assert_eq!(holdings[0].amount, 2.5);
        assert_eq!(holdings[1].amount, 2.5);
    }

    #[test]
    fn missing_mint_is_parse_error() {
        let mut account = token_account("A", "M", json!({ "uiAmount": 1.0 }));
        account["account"]["data"]["parsed"]["info"]
            .as_object_mut()
            .unwrap()
            .remove("mint");
        let body = json!({
            "jsonrpc": "2.0", "id": 4,
            "result": { "context": { "slot": 1 }, "value": [account] }
        });

        let err = parse_token_accounts_response(body).unwrap_err();
        match err {
            RpcError::Parse(msg) => assert!(msg.contains("mint"), "message: {msg}"),
            other => panic!("expected Parse, got {other:?}"),
        }
    }

    #[test]
    fn base64_encoded_account_is_parse_error() {
        let body = json!({
            "jsonrpc": "2.0", "id": 5,
            "result": {
                "context": { "slot": 1 },
                "value": [{ "pubkey": "A", "account": { "data": ["AAAA", "base64"] } }]
            }
        });
        assert!(matches!(
            parse_token_accounts_response(body),
            Err(RpcError::Parse(_))
        ));
    }

    #[test]
    fn empty_token_account_list() {
        let body = json!({
            "jsonrpc": "2.0", "id": 6,
            "result": { "context": { "slot": 1 }, "value": [] }
        });
        assert!(parse_token_accounts_response(body).unwrap().is_empty());
    }

    #[test]
    fn from_config_rejects_missing_rpc_url() {
        let config = PumpdeskConfig {
            rpc_url: String::new(),
            ..Default::default()
        };
        match SolanaRpcClient::from_config(&config).unwrap_err() {
            RpcError::Config(msg) => assert!(msg.contains("rpc_url"), "message: {msg}"),
            other => panic!("expected Config, got {other:?}"),
        }
    }

    #[test]
    fn from_config_uses_rpc_url() {
        let config = PumpdeskConfig {
            rpc_url: "http://127.0.0.1:8899".into(),
            ..Default::default()
        };
        let client = SolanaRpcClient::from_config(&config).unwrap();
        assert_eq!(client.url(), "http://127.0.0.1:8899");
    }

    #[test]
    fn unreachable_node_is_network_error() {
        // Port 1 on loopback refuses connections immediately.
        let client = SolanaRpcClient::new("http://127.0.0.1:1", 2).unwrap();
        let err = client.get_balance("11111111111111111111111111111111").unwrap_err();
        assert!(matches!(err, RpcError::Network(_)), "got {err:?}");
    }
}
