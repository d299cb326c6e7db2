//! Configuration module for chain access
//!
//! Chain configuration is loaded from TOML files with optional environment
//! overrides. The backend is selected by the `backend` tag:
//!
//! ```toml
//! backend = "solana"
//! endpoint = "https://api.mainnet-beta.solana.com"
//! ws_endpoint = "wss://api.mainnet-beta.solana.com"
//! funder = "<base58 keypair>"
//! default_priority_fee = 10000
//! compute_unit_limit = 200000
//! rate_limit = 10
//! ```

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use zeroize::Zeroizing;

use crate::errors::ChainAccessError;
use crate::wallet;

/// Environment variable overriding the funder secret
pub const ENV_FUNDER: &str = "CHAIN_ACCESS_FUNDER";
/// Environment variable overriding the RPC endpoint
pub const ENV_ENDPOINT: &str = "CHAIN_ACCESS_ENDPOINT";
/// Environment variable overriding the subscription endpoint
pub const ENV_WS_ENDPOINT: &str = "CHAIN_ACCESS_WS_ENDPOINT";

/// Chain configuration, one variant per supported backend
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "backend", rename_all = "lowercase")]
pub enum ChainConfig {
    /// Solana cluster
    Solana(SolanaChainConfig),
}

/// Static configuration of a Solana chain access handle
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SolanaChainConfig {
    /// JSON-RPC endpoint
    pub endpoint: String,

    /// Websocket endpoint used for subscribe-and-confirm submission
    #[serde(default)]
    pub ws_endpoint: String,

    /// Base58 secret of the keypair that pays fees and account rent
    pub funder: Secret,

    /// Priority fee in micro-lamports per compute unit, used when live estimation fails
    #[serde(default = "default_priority_fee")]
    pub default_priority_fee: u64,

    /// Compute unit ceiling set on every transaction
    #[serde(default = "default_compute_unit_limit")]
    pub compute_unit_limit: u32,

    /// Outbound requests per second (0 = unlimited)
    #[serde(default)]
    pub rate_limit: u32,

    /// Default bound on the confirmation wait, in seconds
    #[serde(default = "default_confirm_timeout")]
    pub confirm_timeout_secs: u64,

    /// Per-request RPC timeout, in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Percentile of recent prioritization fees taken as the live estimate
    #[serde(default = "default_fee_percentile")]
    pub priority_fee_percentile: u8,

    /// Upper bound applied to the live estimate
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_priority_fee: Option<u64>,
}

// Default value functions
fn default_priority_fee() -> u64 { 10_000 }
fn default_compute_unit_limit() -> u32 { 200_000 }
fn default_confirm_timeout() -> u64 { 60 }
fn default_request_timeout() -> u64 { 30 }
fn default_fee_percentile() -> u8 { 75 }

impl SolanaChainConfig {
    /// Minimal configuration with defaults for everything but the endpoints and funder
    pub fn new(endpoint: impl Into<String>, ws_endpoint: impl Into<String>, funder: Secret) -> Self {
        Self {
            endpoint: endpoint.into(),
            ws_endpoint: ws_endpoint.into(),
            funder,
            default_priority_fee: default_priority_fee(),
            compute_unit_limit: default_compute_unit_limit(),
            rate_limit: 0,
            confirm_timeout_secs: default_confirm_timeout(),
            request_timeout_secs: default_request_timeout(),
            priority_fee_percentile: default_fee_percentile(),
            max_priority_fee: None,
        }
    }

    /// Validate values that would otherwise fail deep inside a transfer
    pub fn validate(&self) -> Result<(), ChainAccessError> {
        if self.endpoint.trim().is_empty() {
            return Err(ChainAccessError::Configuration(
                "endpoint must not be empty".to_string(),
            ));
        }
        if self.compute_unit_limit == 0 {
            return Err(ChainAccessError::Configuration(
                "compute_unit_limit must be greater than zero".to_string(),
            ));
        }
        if self.priority_fee_percentile > 100 {
            return Err(ChainAccessError::Configuration(format!(
                "priority_fee_percentile must be within 0..=100, got {}",
                self.priority_fee_percentile
            )));
        }
        if self.confirm_timeout_secs == 0 {
            return Err(ChainAccessError::Configuration(
                "confirm_timeout_secs must be greater than zero".to_string(),
            ));
        }
        if let Some(max) = self.max_priority_fee {
            if max < self.default_priority_fee {
                return Err(ChainAccessError::Configuration(format!(
                    "max_priority_fee ({}) is below default_priority_fee ({})",
                    max, self.default_priority_fee
                )));
            }
        }
        wallet::keypair_from_secret(self.funder.expose())
            .map_err(|e| ChainAccessError::Configuration(format!("funder: {e}")))?;
        Ok(())
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(funder) = std::env::var(ENV_FUNDER) {
            self.funder = Secret::new(funder);
        }
        if let Ok(endpoint) = std::env::var(ENV_ENDPOINT) {
            self.endpoint = endpoint;
        }
        if let Ok(ws_endpoint) = std::env::var(ENV_WS_ENDPOINT) {
            self.ws_endpoint = ws_endpoint;
        }
    }
}

impl ChainConfig {
    /// Load configuration from TOML file
    pub fn from_file(path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from TOML text
    pub fn from_toml_str(content: &str) -> anyhow::Result<Self> {
        let config: ChainConfig = toml::from_str(content)?;
        Ok(config)
    }

    /// Load configuration with environment variable overrides
    pub fn from_file_with_env(path: &str) -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        let mut config = Self::from_file(path)?;
        match &mut config {
            ChainConfig::Solana(solana) => solana.apply_env_overrides(),
        }
        Ok(config)
    }

    /// Backend name as used in the `backend` tag
    pub fn backend(&self) -> &'static str {
        match self {
            ChainConfig::Solana(_) => "solana",
        }
    }

    /// Validate the selected backend's configuration
    pub fn validate(&self) -> Result<(), ChainAccessError> {
        match self {
            ChainConfig::Solana(solana) => solana.validate(),
        }
    }
}

/// A secret string that is zeroized on drop and never printed
#[derive(Clone)]
pub struct Secret(Zeroizing<String>);

impl Secret {
    pub fn new(value: impl Into<String>) -> Self {
        Self(Zeroizing::new(value.into()))
    }

    /// Borrow the secret for the duration of a call
    pub fn expose(&self) -> &str {
        self.0.as_str()
    }
}

impl std::fmt::Debug for Secret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Secret(***)")
    }
}

impl<'de> Deserialize<'de> for Secret {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        String::deserialize(deserializer).map(Secret::new)
    }
}

impl Serialize for Secret {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str("***")
    }
}
