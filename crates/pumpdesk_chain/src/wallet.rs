use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use pumpdesk_core::PumpdeskConfig;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::WalletError;
use crate::keypair::SolanaKeypair;
use crate::rpc::{LedgerRpc, TOKEN_PROGRAM_ID, lamports_to_sol};

const PUBLIC_KEY_PREFIX: &str = "Public Key: ";
const PRIVATE_KEY_PREFIX: &str = "Private Key: ";
const BALANCE_PREFIX: &str = "Balance: ";
const BALANCE_UNIT: &str = " SOL";
const HOLDINGS_HEADER: &str = "Token Accounts:";

/// One SPL token account owned by a wallet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenHolding {
    pub mint: String,
    /// UI amount (already scaled by the mint's decimals).
    pub amount: f64,
    /// Address of the token account itself.
    pub address: String,
}

/// A generated wallet with the balance and holdings seen at creation time.
///
/// Fields are read-only once built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Wallet {
    public_key: String,
    private_key: String,
    balance: f64,
    token_holdings: Vec<TokenHolding>,
}

impl Wallet {
    pub fn new(
        public_key: String,
        private_key: String,
        balance: f64,
        token_holdings: Vec<TokenHolding>,
    ) -> Self {
        Self {
            public_key,
            private_key,
            balance: balance.max(0.0),
            token_holdings,
        }
    }

    pub fn public_key(&self) -> &str {
        &self.public_key
    }

    /// Base58 64-byte private key, importable into Phantom or Solflare.
    pub fn private_key(&self) -> &str {
        &self.private_key
    }

    /// Balance in SOL.
    pub fn balance(&self) -> f64 {
        self.balance
    }

    pub fn token_holdings(&self) -> &[TokenHolding] {
        &self.token_holdings
    }

    /// Re-derive the signing keypair from the stored private key.
    pub fn keypair(&self) -> Result<SolanaKeypair, WalletError> {
        SolanaKeypair::from_base58(&self.private_key)
    }

    /// `wallet_<first 8 chars of the public key>.txt`
    pub fn default_export_filename(&self) -> String {
        let prefix: String = self.public_key.chars().take(8).collect();
        format!("wallet_{prefix}.txt")
    }

    /// Parse the plaintext export format written by [`WalletProvider::export_wallet`].
    pub fn parse_export(text: &str) -> Result<Self, WalletError> {
        let mut lines = text.lines();

        let public_key = expect_field(lines.next(), PUBLIC_KEY_PREFIX)?;
        let private_key = expect_field(lines.next(), PRIVATE_KEY_PREFIX)?;
        let balance_text = expect_field(lines.next(), BALANCE_PREFIX)?;
        let balance_text = balance_text.strip_suffix(BALANCE_UNIT).ok_or_else(|| {
            WalletError::Parse(format!("balance line missing unit: {balance_text:?}"))
        })?;
        let balance: f64 = balance_text
            .parse()
            .map_err(|e| WalletError::Parse(format!("balance {balance_text:?}: {e}")))?;
        if !balance.is_finite() || balance < 0.0 {
            return Err(WalletError::Parse(format!("balance out of range: {balance}")));
        }

        match lines.next() {
            Some(HOLDINGS_HEADER) | None => {}
            Some(other) => {
                return Err(WalletError::Parse(format!(
                    "expected {HOLDINGS_HEADER:?}, got {other:?}"
                )));
            }
        }

        let token_holdings = lines
            .filter(|line| !line.trim().is_empty())
            .map(parse_holding_line)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            public_key,
            private_key,
            balance,
            token_holdings,
        })
    }
}

/// The export format. It doubles as the on-screen summary.
impl fmt::Display for Wallet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{PUBLIC_KEY_PREFIX}{}", self.public_key)?;
        writeln!(f, "{PRIVATE_KEY_PREFIX}{}", self.private_key)?;
        writeln!(f, "{BALANCE_PREFIX}{}{BALANCE_UNIT}", self.balance)?;
        writeln!(f, "{HOLDINGS_HEADER}")?;
        for holding in &self.token_holdings {
            writeln!(
                f,
                "  Mint: {}, Amount: {}, Address: {}",
                holding.mint, holding.amount, holding.address
            )?;
        }
        Ok(())
    }
}

fn expect_field(line: Option<&str>, prefix: &str) -> Result<String, WalletError> {
    let line = line.ok_or_else(|| WalletError::Parse(format!("missing {prefix:?} line")))?;
    line.strip_prefix(prefix)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| WalletError::Parse(format!("expected {prefix:?}, got {line:?}")))
}

fn parse_holding_line(line: &str) -> Result<TokenHolding, WalletError> {
    let malformed = || WalletError::Parse(format!("malformed token line: {line:?}"));

    let mut parts = line.trim().splitn(3, ", ");
    let mint = parts
        .next()
        .and_then(|p| p.strip_prefix("Mint: "))
        .ok_or_else(malformed)?;
    let amount = parts
        .next()
        .and_then(|p| p.strip_prefix("Amount: "))
        .ok_or_else(malformed)?;
    let address = parts
        .next()
        .and_then(|p| p.strip_prefix("Address: "))
        .ok_or_else(malformed)?;

    let amount: f64 = amount
        .parse()
        .map_err(|e| WalletError::Parse(format!("token amount {amount:?}: {e}")))?;

    Ok(TokenHolding {
        mint: mint.to_string(),
        amount,
        address: address.to_string(),
    })
}

// ---------------------------------------------------------------------------
// WalletProvider
// ---------------------------------------------------------------------------

/// Generates wallets and looks up their on-chain state.
///
/// Balance and holdings lookups never fail: an unreachable node degrades to
/// zero balance and no holdings, so wallet creation still succeeds offline.
pub struct WalletProvider {
    rpc: Arc<dyn LedgerRpc>,
}

impl WalletProvider {
    pub fn new(rpc: Arc<dyn LedgerRpc>) -> Self {
        Self { rpc }
    }

    /// Generate a keypair and enrich it with its current balance and holdings.
    pub fn create_wallet(&self) -> Result<Wallet, WalletError> {
        let keypair = SolanaKeypair::generate()?;
        let public_key = keypair.public_key();
        info!(public_key = %public_key, "wallet keypair generated");

        let balance = self.query_balance(&public_key);
        let token_holdings = self.query_token_holdings(&public_key);

        Ok(Wallet::new(
            public_key,
            keypair.private_key_base58(),
            balance,
            token_holdings,
        ))
    }

    /// Balance in SOL, or `0.0` if the node cannot be queried.
    pub fn query_balance(&self, public_key: &str) -> f64 {
        match self.rpc.get_balance(public_key) {
            Ok(lamports) => lamports_to_sol(lamports),
            Err(e) => {
                warn!(public_key, error = %e, "balance query failed, reporting zero");
                0.0
            }
        }
    }

    /// SPL token holdings, or an empty list if the node cannot be queried.
    pub fn query_token_holdings(&self, public_key: &str) -> Vec<TokenHolding> {
        match self
            .rpc
            .get_token_accounts_by_owner(public_key, TOKEN_PROGRAM_ID)
        {
            Ok(holdings) => holdings,
            Err(e) => {
                warn!(public_key, error = %e, "token account query failed, reporting none");
                Vec::new()
            }
        }
    }

    /// Write the wallet as plaintext to `destination`, replacing any existing file.
    ///
    /// The private key is stored unencrypted.
    pub fn export_wallet(&self, wallet: &Wallet, destination: &Path) -> Result<(), WalletError> {
        std::fs::write(destination, wallet.to_string())?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(destination, std::fs::Permissions::from_mode(0o600))?;
        }

        info!(path = %destination.display(), public_key = wallet.public_key(), "wallet exported");
        Ok(())
    }

    /// Export into `dir` under [`Wallet::default_export_filename`], creating
    /// the directory if needed. Returns the written path.
    pub fn export_to_dir(&self, wallet: &Wallet, dir: &Path) -> Result<PathBuf, WalletError> {
        std::fs::create_dir_all(dir)?;
        let path = dir.join(wallet.default_export_filename());
        self.export_wallet(wallet, &path)?;
        Ok(path)
    }

    /// Export into `~/.pumpdesk/wallets/`.
    pub fn export_to_default_dir(&self, wallet: &Wallet) -> Result<PathBuf, WalletError> {
        let dir =
            PumpdeskConfig::wallets_dir().map_err(|e| WalletError::Location(e.to_string()))?;
        self.export_to_dir(wallet, &dir)
    }

    /// Read back a wallet written by [`export_wallet`](Self::export_wallet).
    pub fn import_wallet(&self, source: &Path) -> Result<Wallet, WalletError> {
        let text = std::fs::read_to_string(source)?;
        let wallet = Wallet::parse_export(&text)?;
        info!(path = %source.display(), public_key = wallet.public_key(), "wallet imported");
        Ok(wallet)
    }
}
