//! Test doubles for the spend collaborators
//!
//! # WARNING: FOR TESTING PURPOSES ONLY
//!
//! These mocks never touch a network, a key store or a relay. Keys are
//! derived from fixed bytes and "signatures" are filler scripts.
#![allow(dead_code)]

use bitcoin::consensus::encode::serialize;
use bitcoin::hashes::Hash;
use bitcoin::secp256k1::SecretKey;
use bitcoin::{Address, Network, PrivateKey, PubkeyHash, ScriptBuf, Transaction, Txid};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use coinspend_common::config::SpendConfig;
use coinspend_common::error::{SpendError, SpendResult};
use coinspend_common::transaction::types::BuiltTransaction;
use coinspend_core::collaborators::{
    Collaborators, KeyContext, KeyResolver, KeyRing, SpendSource, TransactionBroadcaster,
    TransactionSigner, UnspentSource, WalletState,
};
use coinspend_core::coordinator::SpendCoordinator;
use coinspend_core::unspent_source::{UnspentRecord, XpubInfo};

pub const ACCEPTED: &str = "Transaction Submitted";

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub fn p2pkh_script(n: u8) -> ScriptBuf {
    ScriptBuf::new_p2pkh(&PubkeyHash::from_byte_array([n; 20]))
}

pub fn address(n: u8) -> String {
    Address::from_script(&p2pkh_script(n), Network::Bitcoin)
        .expect("p2pkh is a standard script")
        .to_string()
}

pub fn private_key(n: u8) -> PrivateKey {
    let secret = SecretKey::from_slice(&[n; 32]).expect("valid secret key");
    PrivateKey::new(secret, Network::Bitcoin)
}

/// Record for an output locked to [`address`]`(n)`
pub fn record(n: u8, value: u64) -> UnspentRecord {
    UnspentRecord {
        tx_hash: hex::encode([n; 32]),
        tx_output_n: 0,
        value,
        script: hex::encode(p2pkh_script(n).as_bytes()),
        confirmations: 3,
        xpub: None,
    }
}

/// HD record owned by derivation `path`
pub fn hd_record(n: u8, value: u64, path: &str) -> UnspentRecord {
    UnspentRecord {
        xpub: Some(XpubInfo {
            path: path.to_string(),
        }),
        ..record(n, value)
    }
}

pub fn hd_source(account: u32) -> SpendSource {
    SpendSource::Hd {
        account,
        xpub: "xpub6CUGRUonZSQ4TWtTMmzXdrXDtypWKiKrhko4egpiMZbpiaQL2jkwSB1icqYh2cfDfVxdx4df189oLKnC5fSwqPfgyP3hooxujYzAu3fDVmz".to_string(),
    }
}

#[derive(Default)]
pub struct MockUnspentSource {
    records: Vec<UnspentRecord>,
    fail: bool,
    pub fetches: AtomicUsize,
}

impl MockUnspentSource {
    pub fn new(records: Vec<UnspentRecord>) -> Self {
        Self {
            records,
            ..Default::default()
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Default::default()
        }
    }
}

impl UnspentSource for MockUnspentSource {
    fn fetch_unspent(&self, _source: &SpendSource) -> SpendResult<Vec<UnspentRecord>> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(SpendError::network("unspent outputs service unreachable"));
        }
        Ok(self.records.clone())
    }
}

/// Resolves keys from a fixed address table and records every request
#[derive(Default)]
pub struct MockKeyResolver {
    keys: HashMap<String, PrivateKey>,
    /// (address, derivation path or "legacy")
    pub requests: Mutex<Vec<(String, String)>>,
}

impl MockKeyResolver {
    pub fn with_key(mut self, n: u8) -> Self {
        self.keys.insert(address(n), private_key(n));
        self
    }
}

impl KeyResolver for MockKeyResolver {
    fn resolve_key(&self, address: &str, context: &KeyContext<'_>) -> Option<PrivateKey> {
        let context = match context {
            KeyContext::Hd { path, .. } => path.to_string(),
            KeyContext::Legacy => "legacy".to_string(),
        };
        self.requests
            .lock()
            .unwrap()
            .push((address.to_string(), context));
        self.keys.get(address).copied()
    }
}

/// Fills every script_sig with filler bytes of signature size
#[derive(Default)]
pub struct MockSigner {
    fail: bool,
    signed_size: Option<usize>,
    pub calls: AtomicUsize,
}

impl MockSigner {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Default::default()
        }
    }

    /// Pads the first input's script_sig so the signed transaction is
    /// exactly `bytes` long once serialized
    pub fn signing_to_size(bytes: usize) -> Self {
        Self {
            signed_size: Some(bytes),
            ..Default::default()
        }
    }
}

impl TransactionSigner for MockSigner {
    fn sign(&self, built: &BuiltTransaction<'_>, keys: &KeyRing) -> SpendResult<Transaction> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(SpendError::Signing("signer unavailable".to_string()));
        }
        assert_eq!(keys.len(), built.input_count());

        let mut signed = built.transaction.clone();
        for (index, input) in signed.input.iter_mut().enumerate() {
            assert!(keys.get(index).is_some(), "no key for input {}", index);
            input.script_sig = ScriptBuf::from(vec![0x51; 107]);
        }

        if let Some(bytes) = self.signed_size {
            // filler of 253..=65535 bytes takes a 3-byte length prefix
            // instead of the 1 byte an empty script takes
            signed.input[0].script_sig = ScriptBuf::new();
            let filler = bytes - serialize(&signed).len() - 2;
            signed.input[0].script_sig = ScriptBuf::from(vec![0x51; filler]);
        }
        Ok(signed)
    }
}

pub struct MockBroadcaster {
    response: String,
    pub submitted: Mutex<Vec<String>>,
}

impl MockBroadcaster {
    pub fn accepting() -> Self {
        Self::responding(ACCEPTED)
    }

    pub fn responding(response: &str) -> Self {
        Self {
            response: response.to_string(),
            submitted: Mutex::new(Vec::new()),
        }
    }

    pub fn submission_count(&self) -> usize {
        self.submitted.lock().unwrap().len()
    }
}

impl TransactionBroadcaster for MockBroadcaster {
    fn submit(&self, tx_hex: &str) -> SpendResult<String> {
        self.submitted.lock().unwrap().push(tx_hex.to_string());
        Ok(self.response.clone())
    }
}

pub struct MockWalletState {
    change_address: String,
    pub notes: Mutex<Vec<(Txid, String)>>,
    pub advanced: Mutex<Vec<u32>>,
}

impl MockWalletState {
    pub fn new(change_address: String) -> Self {
        Self {
            change_address,
            notes: Mutex::new(Vec::new()),
            advanced: Mutex::new(Vec::new()),
        }
    }

    pub fn has_side_effects(&self) -> bool {
        !self.notes.lock().unwrap().is_empty() || !self.advanced.lock().unwrap().is_empty()
    }
}

impl WalletState for MockWalletState {
    fn change_address(&self, _account: u32) -> SpendResult<String> {
        Ok(self.change_address.clone())
    }

    fn attach_note(&self, txid: &Txid, note: &str) -> SpendResult<()> {
        self.notes.lock().unwrap().push((*txid, note.to_string()));
        Ok(())
    }

    fn advance_change_index(&self, account: u32) -> SpendResult<()> {
        self.advanced.lock().unwrap().push(account);
        Ok(())
    }
}

/// One set of mocks plus the coordinator wired to them
pub struct Harness {
    pub source: Arc<MockUnspentSource>,
    pub keys: Arc<MockKeyResolver>,
    pub signer: Arc<MockSigner>,
    pub broadcaster: Arc<MockBroadcaster>,
    pub wallet: Arc<MockWalletState>,
}

impl Harness {
    /// Outputs of `records`, keys for `key_owners`, an accepting relay and
    /// change going to address 8
    pub fn new(records: Vec<UnspentRecord>, key_owners: &[u8]) -> Self {
        let keys = key_owners
            .iter()
            .fold(MockKeyResolver::default(), |r, n| r.with_key(*n));
        Self {
            source: Arc::new(MockUnspentSource::new(records)),
            keys: Arc::new(keys),
            signer: Arc::new(MockSigner::default()),
            broadcaster: Arc::new(MockBroadcaster::accepting()),
            wallet: Arc::new(MockWalletState::new(address(8))),
        }
    }

    pub fn with_source(mut self, source: MockUnspentSource) -> Self {
        self.source = Arc::new(source);
        self
    }

    pub fn with_signer(mut self, signer: MockSigner) -> Self {
        self.signer = Arc::new(signer);
        self
    }

    pub fn with_broadcaster(mut self, broadcaster: MockBroadcaster) -> Self {
        self.broadcaster = Arc::new(broadcaster);
        self
    }

    pub fn collaborators(&self) -> Collaborators {
        Collaborators {
            unspent_source: self.source.clone(),
            key_resolver: self.keys.clone(),
            signer: self.signer.clone(),
            broadcaster: self.broadcaster.clone(),
            wallet_state: self.wallet.clone(),
        }
    }

    pub fn coordinator(&self) -> SpendCoordinator {
        self.coordinator_with(&SpendConfig::default())
    }

    pub fn coordinator_with(&self, config: &SpendConfig) -> SpendCoordinator {
        init_logging();
        SpendCoordinator::new(config, self.collaborators()).expect("valid config")
    }
}
