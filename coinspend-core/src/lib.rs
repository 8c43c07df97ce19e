//! Coinspend Core
//!
//! Spend orchestration on top of `coinspend-common`: fetching unspent outputs,
//! selecting them, building, signing and submitting the transaction, and the
//! wallet bookkeeping that follows an accepted spend.
//!
//! # Modules
//!
//! - `collaborators`: Traits for the external services a spend talks to
//! - `unspent_source`: Unspent-outputs API records and their conversion
//! - `coordinator`: The two-phase prepare / execute flow
//! - `worker`: Per-attempt background threads

/// External collaborator traits
pub mod collaborators;

/// Unspent-outputs API records
pub mod unspent_source;

/// Spend orchestration
pub mod coordinator;

/// Background spend attempts
pub mod worker;

pub use collaborators::{
    Collaborators, KeyContext, KeyResolver, KeyRing, SpendSource, TransactionBroadcaster,
    TransactionSigner, UnspentSource, WalletState,
};
pub use coordinator::{PrepareRequest, PreparedSpend, SpendCoordinator, SpendReceipt, SpendRequest};
pub use unspent_source::{parse_unspent_response, UnspentRecord, XpubInfo};
pub use worker::{spawn_execute, spawn_prepare, spawn_spend, SpendHandle};
