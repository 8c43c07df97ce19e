//! External collaborators of a spend attempt
//!
//! Fetching outputs, deriving keys, signing, relaying and wallet bookkeeping
//! all happen outside this crate. Each is reached through one narrow trait so
//! the coordinator can be driven by real services or by test doubles.
//!
//! All traits are `Send + Sync`; the coordinator holds them behind `Arc` and
//! may be shared between worker threads.

use bitcoin::{PrivateKey, Transaction, Txid};
use std::fmt;
use std::sync::Arc;

use coinspend_common::error::SpendResult;
use coinspend_common::transaction::types::BuiltTransaction;

use crate::unspent_source::UnspentRecord;

/// Identity whose outputs fund a spend
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpendSource {
    /// HD account, identified by index and extended public key
    Hd { account: u32, xpub: String },
    /// Imported legacy addresses; the first one receives change
    Legacy { addresses: Vec<String> },
}

impl SpendSource {
    /// True for HD accounts
    pub fn is_hd(&self) -> bool {
        matches!(self, SpendSource::Hd { .. })
    }
}

/// What the key resolver needs besides the input's address
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyContext<'a> {
    /// Key derived from an HD account at `path` (e.g. `M/0/3`)
    Hd { account: u32, path: &'a str },
    /// Key stored for an imported legacy address
    Legacy,
}

/// Private keys for a built transaction, one per input in input order
#[derive(Clone, Default)]
pub struct KeyRing {
    keys: Vec<PrivateKey>,
}

impl KeyRing {
    /// Wrap keys already ordered to match the transaction's inputs
    pub fn new(keys: Vec<PrivateKey>) -> Self {
        Self { keys }
    }

    /// Key for input `index`
    pub fn get(&self, index: usize) -> Option<&PrivateKey> {
        self.keys.get(index)
    }

    /// Number of keys, equal to the number of inputs
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// True when the ring holds no keys
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

impl fmt::Debug for KeyRing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "KeyRing([REDACTED; {}])", self.keys.len())
    }
}

/// Source of unspent outputs (usually a block explorer API)
pub trait UnspentSource: Send + Sync {
    /// Fetch every unspent output owned by `source`
    fn fetch_unspent(&self, source: &SpendSource) -> SpendResult<Vec<UnspentRecord>>;
}

/// Looks up the private key controlling an address
pub trait KeyResolver: Send + Sync {
    /// `None` when no key is known for `address`
    fn resolve_key(&self, address: &str, context: &KeyContext<'_>) -> Option<PrivateKey>;
}

/// Produces a signed transaction
pub trait TransactionSigner: Send + Sync {
    /// Sign every input of `built`; `keys.get(i)` controls input `i`
    fn sign(&self, built: &BuiltTransaction<'_>, keys: &KeyRing) -> SpendResult<Transaction>;
}

/// Relays a signed transaction to the network
pub trait TransactionBroadcaster: Send + Sync {
    /// Submit hex-encoded transaction bytes and return the relay's response text
    fn submit(&self, tx_hex: &str) -> SpendResult<String>;
}

/// Wallet bookkeeping touched by a spend
///
/// `attach_note` and `advance_change_index` are only called after the relay
/// accepted the transaction.
pub trait WalletState: Send + Sync {
    /// Address at the account's current change index
    fn change_address(&self, account: u32) -> SpendResult<String>;

    /// Store a user note against a transaction
    fn attach_note(&self, txid: &Txid, note: &str) -> SpendResult<()>;

    /// Move the account's change index past the address just used
    fn advance_change_index(&self, account: u32) -> SpendResult<()>;
}

/// The full set of collaborators a coordinator talks to
#[derive(Clone)]
pub struct Collaborators {
    pub unspent_source: Arc<dyn UnspentSource>,
    pub key_resolver: Arc<dyn KeyResolver>,
    pub signer: Arc<dyn TransactionSigner>,
    pub broadcaster: Arc<dyn TransactionBroadcaster>,
    pub wallet_state: Arc<dyn WalletState>,
}
