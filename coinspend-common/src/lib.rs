//! Coinspend Common Library
//!
//! Coin selection and transaction assembly for spending from HD or legacy
//! Bitcoin wallets. Everything here is synchronous and free of I/O; fetching
//! outputs, signing and submission live behind traits in `coinspend-core`.
//!
//! # Modules
//!
//! - `policy`: Relay policy constants and fee estimation helpers
//! - `error`: Error taxonomy shared by every spend phase
//! - `logging`: Security-aware logging infrastructure
//! - `config`: Configuration management
//! - `utxo_selection`: Unspent output catalog types and the output selector
//! - `transaction`: Payment requests and the transaction builder
//!
//! # Security Considerations
//!
//! - Output order is randomized with a cryptographically strong RNG
//! - Addresses and transaction ids are truncated before they are logged
//! - No key material ever passes through this crate

/// Relay policy constants and fee helpers
pub mod policy;

/// Error types
pub mod error;

/// Secure logging functionality
pub mod logging;

/// Configuration management
pub mod config;

/// Unspent output selection
pub mod utxo_selection;

/// Transaction assembly
pub mod transaction;

pub use config::SpendConfig;
pub use error::{ErrorCategory, SpendError, SpendResult};
pub use transaction::builder::TransactionBuilder;
pub use transaction::types::{BuiltTransaction, PaymentRequest};
pub use utxo_selection::selector::OutputSelector;
pub use utxo_selection::types::{SelectionResult, UnspentOutput};

// Re-export important Bitcoin and BDK types
pub use bdk::FeeRate;
pub use bitcoin::{Address, Amount, Network, OutPoint, Transaction, Txid};

/// Library version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library initialization
///
/// Sets up logging with the default configuration. Safe to call more than
/// once; only the first call has any effect.
pub fn init() -> Result<(), String> {
    logging::init(&logging::LogConfig::default())
        .map_err(|e| format!("Failed to initialize logging: {}", e))
}
