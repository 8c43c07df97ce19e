//! Configuration management for Coinspend.
//!
//! Settings are stored in TOML. Every section has serde defaults so a partial
//! (or empty) file yields the standard relay policy: 546 satoshi dust
//! threshold, 1,000,000 satoshi free-output slack, 114-byte signed input
//! estimate and a 102,400 character hex size guard.
//!
//! ```
//! use coinspend_common::config::SpendConfig;
//!
//! let config: SpendConfig = toml::from_str("[wallet]\nnetwork = \"Testnet\"\n").unwrap();
//! assert_eq!(config.network().unwrap(), bitcoin::Network::Testnet);
//! assert_eq!(config.policy.dust_threshold, 546);
//! ```

use anyhow::{anyhow, Result};
use bitcoin::Network;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::logging::LogConfig;
use crate::policy;

/// Main configuration structure for Coinspend
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SpendConfig {
    #[serde(default)]
    pub wallet: WalletConfig,

    #[serde(default)]
    pub policy: PolicyConfig,

    #[serde(default)]
    pub submission: SubmissionConfig,

    #[serde(default)]
    pub logging: LogConfig,
}

/// Wallet-specific configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalletConfig {
    /// Bitcoin, Testnet, Signet or Regtest
    #[serde(default = "default_network")]
    pub network: String,

    /// Never spend an input whose address is also a destination
    #[serde(default = "default_true")]
    pub simple_send: bool,
}

impl Default for WalletConfig {
    fn default() -> Self {
        Self {
            network: default_network(),
            simple_send: default_true(),
        }
    }
}

/// Relay and selection policy
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolicyConfig {
    #[serde(default = "default_dust_threshold")]
    pub dust_threshold: u64,

    /// Selection slack above the needed value that ends input accumulation
    #[serde(default = "default_min_free_output")]
    pub min_free_output: u64,

    /// Bytes added per input when estimating the signed size for priority
    #[serde(default = "default_signed_input_size")]
    pub signed_input_size: u64,

    #[serde(default = "default_max_tx_hex_length")]
    pub max_tx_hex_length: usize,

    /// Fee in satoshis for requests that do not name one
    #[serde(default = "default_fee")]
    pub default_fee: u64,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            dust_threshold: default_dust_threshold(),
            min_free_output: default_min_free_output(),
            signed_input_size: default_signed_input_size(),
            max_tx_hex_length: default_max_tx_hex_length(),
            default_fee: default_fee(),
        }
    }
}

/// Transaction submission configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmissionConfig {
    /// Text the relay includes in its response when it accepts a transaction
    #[serde(default = "default_accepted_marker")]
    pub accepted_marker: String,
}

impl Default for SubmissionConfig {
    fn default() -> Self {
        Self {
            accepted_marker: default_accepted_marker(),
        }
    }
}

impl SpendConfig {
    /// Load configuration from file
    pub fn load(path: &Path) -> Result<Self> {
        let content =
            fs::read_to_string(path).map_err(|e| anyhow!("Failed to read config file: {}", e))?;

        let config: SpendConfig =
            toml::from_str(&content).map_err(|e| anyhow!("Failed to parse config file: {}", e))?;

        config.validate()?;
        Ok(config)
    }

    /// Save configuration to file
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| anyhow!("Failed to serialize config: {}", e))?;

        fs::write(path, content).map_err(|e| anyhow!("Failed to write config file: {}", e))?;

        Ok(())
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        self.network()?;

        if self.policy.dust_threshold == 0 {
            return Err(anyhow!("Invalid dust threshold: must be greater than 0"));
        }

        if self.policy.signed_input_size == 0 {
            return Err(anyhow!("Invalid signed input size: must be greater than 0"));
        }

        if self.policy.max_tx_hex_length == 0 {
            return Err(anyhow!("Invalid max transaction length: must be greater than 0"));
        }

        if self.submission.accepted_marker.trim().is_empty() {
            anyhow::bail!("Invalid accepted marker: must not be empty");
        }

        Ok(())
    }

    /// The configured Bitcoin network
    pub fn network(&self) -> Result<Network> {
        match self.wallet.network.as_str() {
            "Bitcoin" => Ok(Network::Bitcoin),
            "Testnet" => Ok(Network::Testnet),
            "Signet" => Ok(Network::Signet),
            "Regtest" => Ok(Network::Regtest),
            other => Err(anyhow!("Invalid network type: {}", other)),
        }
    }
}

/// Ensure a configuration file exists at the specified path
/// If it doesn't exist, create it with default values
pub fn ensure_config_exists(path: &Path) -> Result<()> {
    if !path.exists() {
        if let Some(parent) = path.parent() {
            if !parent.exists() {
                fs::create_dir_all(parent)
                    .map_err(|e| anyhow!("Failed to create config directory: {}", e))?;
            }
        }

        SpendConfig::default().save(path)?;
    }

    Ok(())
}

// Default value functions

fn default_network() -> String {
    "Bitcoin".to_string()
}

fn default_true() -> bool {
    true
}

fn default_dust_threshold() -> u64 {
    policy::DUST_THRESHOLD
}

fn default_min_free_output() -> u64 {
    policy::MIN_FREE_OUTPUT
}

fn default_signed_input_size() -> u64 {
    policy::SIGNED_INPUT_SIZE
}

fn default_max_tx_hex_length() -> usize {
    policy::MAX_TX_HEX_LENGTH
}

fn default_fee() -> u64 {
    policy::DEFAULT_FEE
}

fn default_accepted_marker() -> String {
    "Transaction Submitted".to_string()
}
