// Solana wallet generation, ledger lookups and PumpPortal token creation.

pub mod error;
pub mod keypair;
pub mod rpc;
pub mod token;
pub mod trade;
pub mod wallet;

// Re-export primary types for convenient access.
pub use error::{ApiError, RpcError, TokenError, WalletError};
pub use keypair::{SolanaKeypair, validate_address};
pub use rpc::{LAMPORTS_PER_SOL, LedgerRpc, SolanaRpcClient, TOKEN_PROGRAM_ID, lamports_to_sol};
pub use token::{Token, TokenBuilder, new_mint_address};
pub use trade::{PumpPortalClient, TokenMetadata, TradeApi, TradeResponse};
pub use wallet::{TokenHolding, Wallet, WalletProvider};
