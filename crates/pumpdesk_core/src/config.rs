use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::error_handler::PumpdeskError;

/// Environment variables that override values loaded from `config.json`.
pub const ENV_RPC_URL: &str = "PUMPDESK_RPC_URL";
pub const ENV_API_BASE_URL: &str = "PUMPDESK_API_BASE_URL";
pub const ENV_API_KEY: &str = "PUMPDESK_API_KEY";
pub const ENV_DEMO_MODE: &str = "PUMPDESK_DEMO_MODE";

const DEFAULT_RPC_URL: &str = "https://api.devnet.solana.com";
const DEFAULT_API_BASE_URL: &str = "https://pumpportal.fun/api";
const DEFAULT_TIMEOUT_SECS: u64 = 30;

// ---------------------------------------------------------------------------
// PumpdeskConfig
// ---------------------------------------------------------------------------

/// Application configuration stored at `~/.pumpdesk/config.json`.
///
/// The API key is **never** written to the JSON file. It is supplied through
/// the `PUMPDESK_API_KEY` environment variable (see [`apply_env_overrides`]).
///
/// [`apply_env_overrides`]: PumpdeskConfig::apply_env_overrides
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PumpdeskConfig {
    #[serde(skip)]
    pub api_key: Option<String>,

    // Endpoints
    pub rpc_url: String,
    pub api_base_url: String,

    /// When the trade call fails, answer with a synthesized success instead.
    /// Off unless explicitly enabled.
    pub demo_mode: bool,

    // Network
    pub rpc_timeout_secs: u64,
    pub api_timeout_secs: u64,

    // General
    pub log_level: String,
}

impl Default for PumpdeskConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            rpc_url: DEFAULT_RPC_URL.into(),
            api_base_url: DEFAULT_API_BASE_URL.into(),
            demo_mode: false,
            rpc_timeout_secs: DEFAULT_TIMEOUT_SECS,
            api_timeout_secs: DEFAULT_TIMEOUT_SECS,
            log_level: "info".into(),
        }
    }
}

impl PumpdeskConfig {
    /// Returns the base config directory: `~/.pumpdesk/`
    pub fn base_dir() -> Result<PathBuf> {
        let home = dirs::home_dir().context("Could not determine home directory")?;
        Ok(home.join(".pumpdesk"))
    }

    /// Returns the config file path: `~/.pumpdesk/config.json`
    pub fn config_path() -> Result<PathBuf> {
        Ok(Self::base_dir()?.join("config.json"))
    }

    /// Returns the logs directory: `~/.pumpdesk/logs/`
    pub fn logs_dir() -> Result<PathBuf> {
        Ok(Self::base_dir()?.join("logs"))
    }

    /// Returns the directory wallet exports land in: `~/.pumpdesk/wallets/`
    pub fn wallets_dir() -> Result<PathBuf> {
        Ok(Self::base_dir()?.join("wallets"))
    }

    /// Ensures all required directories exist.
    pub fn ensure_dirs() -> Result<()> {
        let dirs = [Self::base_dir()?, Self::logs_dir()?, Self::wallets_dir()?];
        for dir in &dirs {
            if !dir.exists() {
                std::fs::create_dir_all(dir)
                    .with_context(|| format!("Failed to create directory: {}", dir.display()))?;
            }
        }
        Ok(())
    }

    /// Loads config from disk (creating a default file if missing), then
    /// applies environment overrides.
    pub fn load() -> Result<Self> {
        Self::ensure_dirs()?;
        let path = Self::config_path()?;
        let mut config = Self::load_from_path(&path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Load config from a specific file path.
    pub fn load_from_path(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config: {}", path.display()))?;
            let config: Self = serde_json::from_str(&content)
                .with_context(|| "Failed to parse config.json")?;
            info!("Loaded config from {}", path.display());
            Ok(config)
        } else {
            let config = Self::default();
            config.save_to_path(path)?;
            info!("Created default config at {}", path.display());
            Ok(config)
        }
    }

    /// Saves config to `~/.pumpdesk/config.json`.
    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()?;
        self.save_to_path(&path)
    }

    /// Save config to a specific file path (the API key is excluded via `#[serde(skip)]`).
    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config: {}", path.display()))?;
        Ok(())
    }

    /// Overlay values from the process environment.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides_from(|name| std::env::var(name).ok());
    }

    /// Overlay values from an arbitrary lookup. Empty values are ignored.
    pub fn apply_overrides_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        if let Some(url) = get(ENV_RPC_URL) {
            self.rpc_url = url;
        }
        if let Some(url) = get(ENV_API_BASE_URL) {
            self.api_base_url = url;
        }
        if let Some(key) = get(ENV_API_KEY) {
            self.api_key = Some(key);
        }
        if let Some(flag) = get(ENV_DEMO_MODE) {
            match parse_flag(&flag) {
                Some(enabled) => self.demo_mode = enabled,
                None => warn!("Ignoring unrecognised {ENV_DEMO_MODE} value: {flag}"),
            }
        }
    }

    /// The trade endpoint derived from the API base URL: `<base>/trade`.
    pub fn trade_endpoint(&self) -> String {
        format!("{}/trade", self.api_base_url.trim_end_matches('/'))
    }

    /// Checks that every endpoint is present. No further validation is done.
    pub fn validate(&self) -> Result<(), PumpdeskError> {
        if self.rpc_url.trim().is_empty() {
            return Err(PumpdeskError::Config("rpc_url is not set".into()));
        }
        if self.api_base_url.trim().is_empty() {
            return Err(PumpdeskError::Config("api_base_url is not set".into()));
        }
        Ok(())
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
