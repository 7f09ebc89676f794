//! PumpPortal trade API client.
//!
//! Only the `create` action is supported. The economic parameters of the dev
//! buy that accompanies token creation are fixed.

use std::time::Duration;

use pumpdesk_core::PumpdeskConfig;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::{debug, info, warn};

use crate::error::ApiError;

/// SOL spent on the initial dev buy.
pub const DEV_BUY_AMOUNT_SOL: u64 = 1;
/// Slippage tolerance, in percent.
pub const SLIPPAGE_PERCENT: u64 = 10;
/// Priority fee, in SOL.
pub const PRIORITY_FEE_SOL: f64 = 0.0005;
/// Liquidity pool tag.
pub const POOL: &str = "pump";

const ERROR_PREFIX: &str = "Failed to create token";
const MAX_ERROR_BODY_CHARS: usize = 200;

/// Metadata for a token to be created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenMetadata {
    pub name: String,
    pub symbol: String,
    pub description: String,
    pub metadata_uri: String,
    pub mint_address: String,
}

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

/// The JSON body POSTed to the trade endpoint.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTokenPayload<'a> {
    public_key: &'a str,
    action: &'static str,
    token_metadata: PayloadMetadata<'a>,
    mint: &'a str,
    denominated_in_sol: &'static str,
    amount: u64,
    slippage: u64,
    priority_fee: f64,
    pool: &'static str,
}

#[derive(Debug, Serialize)]
struct PayloadMetadata<'a> {
    name: &'a str,
    symbol: &'a str,
    uri: &'a str,
}

impl<'a> CreateTokenPayload<'a> {
    pub fn new(requester_public_key: &'a str, metadata: &'a TokenMetadata) -> Self {
        Self {
            public_key: requester_public_key,
            action: "create",
            token_metadata: PayloadMetadata {
                name: &metadata.name,
                symbol: &metadata.symbol,
                uri: &metadata.metadata_uri,
            },
            mint: &metadata.mint_address,
            denominated_in_sol: "true",
            amount: DEV_BUY_AMOUNT_SOL,
            slippage: SLIPPAGE_PERCENT,
            priority_fee: PRIORITY_FEE_SOL,
            pool: POOL,
        }
    }
}

/// Parsed success body from the trade API.
#[derive(Debug, Clone, PartialEq)]
pub struct TradeResponse {
    body: Value,
}

impl TradeResponse {
    pub fn new(body: Value) -> Self {
        Self { body }
    }

    pub fn body(&self) -> &Value {
        &self.body
    }

    /// Transaction signature, when the service reports one.
    pub fn signature(&self) -> Option<&str> {
        self.body.get("signature").and_then(Value::as_str)
    }

    /// Mint address, when the service reports one.
    pub fn mint(&self) -> Option<&str> {
        self.body.get("mint").and_then(Value::as_str)
    }

    /// Whether this response was synthesized in demo mode.
    pub fn is_demo(&self) -> bool {
        self.body.get("demo").and_then(Value::as_bool).unwrap_or(false)
    }

    fn demo(mint_address: &str) -> Self {
        Self::new(json!({
            "signature": format!("demo-{mint_address}"),
            "mint": mint_address,
            "demo": true,
        }))
    }
}

/// Turn an HTTP status and raw body into a trade result.
///
/// A 2xx body that still carries `error` (or a non-empty `errors` list) is a
/// failure.
pub fn interpret_response(status: u16, body: &str) -> Result<TradeResponse, ApiError> {
    if !(200..300).contains(&status) {
        let snippet: String = body.chars().take(MAX_ERROR_BODY_CHARS).collect();
        return Err(ApiError::new(format!(
            "{ERROR_PREFIX}: HTTP {status}: {snippet}"
        )));
    }

    let value: Value = serde_json::from_str(body)
        .map_err(|e| ApiError::new(format!("{ERROR_PREFIX}: invalid JSON response: {e}")))?;

    if let Some(err) = value.get("error").filter(|v| !v.is_null()) {
        let message = err.as_str().map(str::to_string).unwrap_or_else(|| err.to_string());
        return Err(ApiError::new(format!("{ERROR_PREFIX}: {message}")));
    }
    if let Some(errors) = value
        .get("errors")
        .and_then(Value::as_array)
        .filter(|a| !a.is_empty())
    {
        let joined = errors
            .iter()
            .map(|e| e.as_str().map(str::to_string).unwrap_or_else(|| e.to_string()))
            .collect::<Vec<_>>()
            .join("; ");
        return Err(ApiError::new(format!("{ERROR_PREFIX}: {joined}")));
    }

    Ok(TradeResponse::new(value))
}

// ---------------------------------------------------------------------------
// Trait
// ---------------------------------------------------------------------------

/// Submits trade actions to an external service.
pub trait TradeApi: Send + Sync {
    /// Request creation of the token described by `metadata`, paid for by
    /// `requester_public_key`. One attempt, no retry.
    fn submit_create_token(
        &self,
        requester_public_key: &str,
        metadata: &TokenMetadata,
    ) -> Result<TradeResponse, ApiError>;
}

// ---------------------------------------------------------------------------
// HTTP client
// ---------------------------------------------------------------------------

/// Blocking client for the PumpPortal `/trade` endpoint.
pub struct PumpPortalClient {
    endpoint: String,
    api_key: Option<String>,
    demo_mode: bool,
    http: reqwest::blocking::Client,
}

impl std::fmt::Debug for PumpPortalClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PumpPortalClient")
            .field("endpoint", &self.endpoint)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("demo_mode", &self.demo_mode)
            .finish()
    }
}

impl PumpPortalClient {
    pub fn new(
        endpoint: impl Into<String>,
        api_key: Option<String>,
        demo_mode: bool,
        timeout_secs: u64,
    ) -> Result<Self, ApiError> {
        let http = reqwest::blocking::Client::builder()
            .user_agent(concat!("pumpdesk/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| ApiError::new(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            endpoint: endpoint.into(),
            api_key: api_key.filter(|k| !k.is_empty()),
            demo_mode,
            http,
        })
    }

    /// Build a client from validated config.
    pub fn from_config(config: &PumpdeskConfig) -> Result<Self, ApiError> {
        config.validate().map_err(|e| ApiError::new(e.to_string()))?;
        Self::new(
            config.trade_endpoint(),
            config.api_key.clone(),
            config.demo_mode,
            config.api_timeout_secs,
        )
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn post(&self, payload: &CreateTokenPayload<'_>) -> Result<TradeResponse, ApiError> {
        let mut request = self.http.post(&self.endpoint).json(payload);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let resp = request
            .send()
            .map_err(|e| ApiError::new(format!("{ERROR_PREFIX}: {e}")))?;
        let status = resp.status().as_u16();
        let body = resp
            .text()
            .map_err(|e| ApiError::new(format!("{ERROR_PREFIX}: failed to read response: {e}")))?;

        interpret_response(status, &body)
    }
}

impl TradeApi for PumpPortalClient {
    fn submit_create_token(
        &self,
        requester_public_key: &str,
        metadata: &TokenMetadata,
    ) -> Result<TradeResponse, ApiError> {
        let payload = CreateTokenPayload::new(requester_public_key, metadata);
        debug!(
            endpoint = %self.endpoint,
            mint = %metadata.mint_address,
            "submitting create-token request"
        );

        match self.post(&payload) {
            Ok(resp) => {
                info!(
                    mint = %metadata.mint_address,
                    signature = ?resp.signature(),
                    "create-token accepted"
                );
                Ok(resp)
            }
            Err(err) if self.demo_mode => {
                warn!(
                    error = %err,
                    mint = %metadata.mint_address,
                    "trade API failed, returning demo response"
                );
                Ok(TradeResponse::demo(&metadata.mint_address))
            }
            Err(err) => {
                warn!(error = %err, mint = %metadata.mint_address, "create-token request failed");
                Err(err)
            }
        }
    }
}
