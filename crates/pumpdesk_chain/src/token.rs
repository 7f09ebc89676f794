use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{TokenError, WalletError};
use crate::keypair::SolanaKeypair;
use crate::trade::{TokenMetadata, TradeApi};

/// A token the trade service confirmed as created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    pub mint_address: String,
    pub name: String,
    pub symbol: String,
    pub description: String,
    pub metadata_uri: String,
    /// Creation transaction signature, if the service returned one.
    pub signature: Option<String>,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Name: {}", self.name)?;
        writeln!(f, "Symbol: {}", self.symbol)?;
        writeln!(f, "Mint Address: {}", self.mint_address)?;
        write!(f, "Description: {}", self.description)?;
        if let Some(sig) = &self.signature {
            write!(f, "\nSignature: {sig}")?;
        }
        Ok(())
    }
}

/// Generate a fresh mint address (the public key of a throwaway keypair).
pub fn new_mint_address() -> Result<String, WalletError> {
    Ok(SolanaKeypair::generate()?.public_key())
}

/// Validates token requests and turns confirmed trade responses into [`Token`]s.
pub struct TokenBuilder {
    trade: Arc<dyn TradeApi>,
}

impl TokenBuilder {
    pub fn new(trade: Arc<dyn TradeApi>) -> Self {
        Self { trade }
    }

    /// Create a token through the trade service.
    ///
    /// The record echoes the request fields. The response only supplies the
    /// transaction signature.
    pub fn create_token(
        &self,
        requester_public_key: &str,
        name: &str,
        symbol: &str,
        description: &str,
        metadata_uri: &str,
        mint_address: &str,
    ) -> Result<Token, TokenError> {
        require("wallet public key", requester_public_key)?;
        require("name", name)?;
        require("symbol", symbol)?;
        require("description", description)?;

        let metadata = TokenMetadata {
            name: name.to_string(),
            symbol: symbol.to_string(),
            description: description.to_string(),
            metadata_uri: metadata_uri.to_string(),
            mint_address: mint_address.to_string(),
        };

        let response = self
            .trade
            .submit_create_token(requester_public_key, &metadata)
            .map_err(|e| TokenError::Creation(e.message))?;

        let token = Token {
            mint_address: metadata.mint_address,
            name: metadata.name,
            symbol: metadata.symbol,
            description: metadata.description,
            metadata_uri: metadata.metadata_uri,
            signature: response.signature().map(str::to_string),
        };

        info!(
            mint = %token.mint_address,
            symbol = %token.symbol,
            demo = response.is_demo(),
            "token created"
        );
        Ok(token)
    }
}

fn require(field: &str, value: &str) -> Result<(), TokenError> {
    if value.trim().is_empty() {
        return Err(TokenError::Validation(format!("{field} is required")));
    }
    Ok(())
}
