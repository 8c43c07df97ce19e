//! Core types for unspent output selection
//!
//! # Key Types
//!
//! - [`UnspentOutput`]: one spendable prior output and its metadata
//! - [`SelectionResult`]: the outputs chosen to fund a spend
//!
//! # Example
//!
//! ```
//! use coinspend_common::utxo_selection::types::UnspentOutput;
//! use bitcoin::{Amount, OutPoint, ScriptBuf, Txid};
//! use std::str::FromStr;
//!
//! let utxo = UnspentOutput::new(
//!     OutPoint::new(
//!         Txid::from_str("7967a5185e907a25225574544c31f7b059c1a191d65b53dcc1554d339c4f9efc").unwrap(),
//!         0,
//!     ),
//!     Amount::from_sat(10_000),
//!     ScriptBuf::new(),
//!     6,
//! )
//! .with_owner_path("M/0/3".to_string());
//!
//! assert_eq!(utxo.owner_path.as_deref(), Some("M/0/3"));
//! ```

use bitcoin::{Address, Amount, Network, OutPoint, ScriptBuf};

/// Unspent transaction output available to a spend attempt
///
/// Immutable once fetched. The selector moves these into a
/// [`SelectionResult`]; the transaction builder only borrows them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnspentOutput {
    /// Reference to the transaction output (txid and vout)
    pub outpoint: OutPoint,

    /// Value locked in this output
    pub value: Amount,

    /// Locking script of the output
    pub script_pubkey: ScriptBuf,

    /// Number of confirmations (0 for unconfirmed)
    pub confirmations: u32,

    /// Derivation path (HD) or address (legacy) of the owning key
    pub owner_path: Option<String>,
}

impl UnspentOutput {
    /// Create a new unspent output without owner information
    pub fn new(
        outpoint: OutPoint,
        value: Amount,
        script_pubkey: ScriptBuf,
        confirmations: u32,
    ) -> Self {
        Self {
            outpoint,
            value,
            script_pubkey,
            confirmations,
            owner_path: None,
        }
    }

    /// Attach the owning derivation path or address
    pub fn with_owner_path(mut self, path: String) -> Self {
        self.owner_path = Some(path);
        self
    }

    /// Address encoded by the locking script, if it is a standard form
    pub fn address(&self, network: Network) -> Option<Address> {
        Address::from_script(&self.script_pubkey, network).ok()
    }

    /// Get a unique identifier for this output
    pub fn id(&self) -> String {
        format!("{}:{}", self.outpoint.txid, self.outpoint.vout)
    }
}

/// Outputs chosen to fund a spend
///
/// Either a single output worth at least the target, or the shortest prefix
/// of the catalog in descending value order whose sum reaches the target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionResult {
    /// Selected outputs, largest first when more than one was needed
    pub selected: Vec<UnspentOutput>,
    /// Sum of `selected`
    pub total_value: Amount,
}

impl SelectionResult {
    /// Number of selected outputs
    pub fn len(&self) -> usize {
        self.selected.len()
    }

    /// True when nothing was selected
    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }
}
