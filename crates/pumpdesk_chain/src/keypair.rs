//! Ed25519 keypairs in Solana's string encodings.
//!
//! A Solana address is the Base58 encoding of the raw 32-byte public key. The
//! exported private key is the 64-byte `secret || public` form, Base58-encoded,
//! which is what Phantom and Solflare accept on import.

use std::fmt;

use ed25519_dalek::{Signer, SigningKey};
use rand::TryRngCore;
use rand::rngs::OsRng;
use zeroize::Zeroize;

use crate::error::WalletError;

const KEYPAIR_LEN: usize = 64;

/// A freshly generated or imported signing keypair.
#[derive(Clone)]
pub struct SolanaKeypair {
    signing_key: SigningKey,
}

impl SolanaKeypair {
    /// Generate a new keypair from the operating system RNG.
    pub fn generate() -> Result<Self, WalletError> {
        let mut seed = [0u8; 32];
        OsRng
            .try_fill_bytes(&mut seed)
            .map_err(|e| WalletError::KeyGeneration(e.to_string()))?;
        let signing_key = SigningKey::from_bytes(&seed);
        seed.zeroize();
        Ok(Self { signing_key })
    }

    /// Parse a Base58 64-byte `secret || public` private key.
    ///
    /// Fails if the string is not Base58, is the wrong length, or if the
    /// public half does not belong to the secret half.
    pub fn from_base58(private_key: &str) -> Result<Self, WalletError> {
        let mut bytes = bs58::decode(private_key.trim())
            .into_vec()
            .map_err(|e| WalletError::InvalidKey(format!("base58 decode failed: {e}")))?;

        if bytes.len() != KEYPAIR_LEN {
            let len = bytes.len();
            bytes.zeroize();
            return Err(WalletError::InvalidKey(format!(
                "expected {KEYPAIR_LEN} bytes, got {len}"
            )));
        }

        let mut arr = [0u8; KEYPAIR_LEN];
        arr.copy_from_slice(&bytes);
        bytes.zeroize();

        let result = SigningKey::from_keypair_bytes(&arr)
            .map_err(|e| WalletError::InvalidKey(format!("public key mismatch: {e}")));
        arr.zeroize();

        Ok(Self {
            signing_key: result?,
        })
    }

    /// Raw 32-byte public key.
    pub fn public_key_bytes(&self) -> [u8; 32] {
        self.signing_key.verifying_key().to_bytes()
    }

    /// The wallet address (Base58 public key).
    pub fn public_key(&self) -> String {
        bs58::encode(self.public_key_bytes()).into_string()
    }

    /// Base58 of the 64-byte `secret || public` keypair.
    pub fn private_key_base58(&self) -> String {
        let mut bytes = self.signing_key.to_keypair_bytes();
        let encoded = bs58::encode(&bytes).into_string();
        bytes.zeroize();
        encoded
    }

    /// Sign an arbitrary message, returning the Base58 signature.
    pub fn sign(&self, message: &[u8]) -> String {
        let signature = self.signing_key.sign(message);
        bs58::encode(signature.to_bytes()).into_string()
    }
}

impl fmt::Debug for SolanaKeypair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SolanaKeypair")
            .field("public_key", &self.public_key())
            .finish_non_exhaustive()
    }
}

/// Check that `address` is Base58 and decodes to exactly 32 bytes.
pub fn validate_address(address: &str) -> Result<(), WalletError> {
    let bytes = bs58::decode(address)
        .into_vec()
        .map_err(|e| WalletError::InvalidKey(format!("base58 decode failed: {e}")))?;

    if bytes.len() != 32 {
        return Err(WalletError::InvalidKey(format!(
            "expected 32 bytes, got {}",
            bytes.len()
        )));
    }
    Ok(())
}
