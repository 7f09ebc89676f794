use pumpdesk_core::PumpdeskError;
use thiserror::Error;

/// Wallet generation, key handling and export errors.
#[derive(Debug, Error)]
pub enum WalletError {
    #[error("key generation failed: {0}")]
    KeyGeneration(String),

    #[error("invalid key: {0}")]
    InvalidKey(String),

    #[error("wallet file error: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed wallet file: {0}")]
    Parse(String),

    #[error("wallet location unavailable: {0}")]
    Location(String),
}

/// Errors from the ledger node's JSON-RPC interface.
#[derive(Debug, Error)]
pub enum RpcError {
    #[error("rpc client misconfigured: {0}")]
    Config(String),

    #[error("network error: {0}")]
    Network(String),

    #[error("node returned HTTP {0}")]
    Status(u16),

    #[error("rpc error {code}: {message}")]
    Rpc { code: i64, message: String },

    #[error("unexpected rpc response: {0}")]
    Parse(String),
}

/// Failure reported by the trade API. The message is shown to the user as-is.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ApiError {
    pub message: String,
}

impl ApiError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Token creation errors.
#[derive(Debug, Error)]
pub enum TokenError {
    #[error("validation error: {0}")]
    Validation(String),

    #[error("token creation failed: {0}")]
    Creation(String),
}

// ---------------------------------------------------------------------------
// Conversions into the user-facing error
// ---------------------------------------------------------------------------

impl From<WalletError> for PumpdeskError {
    fn from(err: WalletError) -> Self {
        match err {
            WalletError::Io(io) => io.into(),
            WalletError::Location(msg) => Self::Config(msg),
            WalletError::InvalidKey(_) | WalletError::Parse(_) => Self::Storage(err.to_string()),
            WalletError::KeyGeneration(_) => Self::Internal(err.to_string()),
        }
    }
}

impl From<RpcError> for PumpdeskError {
    fn from(err: RpcError) -> Self {
        match err {
            RpcError::Config(msg) => Self::Config(msg),
            RpcError::Network(_) | RpcError::Status(_) | RpcError::Rpc { .. } => {
                Self::Network(err.to_string())
            }
            RpcError::Parse(_) => Self::Internal(err.to_string()),
        }
    }
}

impl From<ApiError> for PumpdeskError {
    fn from(err: ApiError) -> Self {
        Self::Network(err.message)
    }
}

impl From<TokenError> for PumpdeskError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::Validation(msg) => Self::Validation(msg),
            TokenError::Creation(msg) => Self::Network(msg),
        }
    }
}
