//! Shared fixtures for coinspend-common integration tests
#![allow(dead_code)]

use bitcoin::hashes::Hash;
use bitcoin::{Address, Amount, Network, OutPoint, PubkeyHash, ScriptBuf, Txid};
use coinspend_common::utxo_selection::types::UnspentOutput;

/// P2PKH locking script for a fixed key hash derived from `n`
pub fn p2pkh_script(n: u8) -> ScriptBuf {
    ScriptBuf::new_p2pkh(&PubkeyHash::from_byte_array([n; 20]))
}

/// Mainnet address for [`p2pkh_script`]
pub fn address(n: u8) -> String {
    Address::from_script(&p2pkh_script(n), Network::Bitcoin)
        .expect("p2pkh is a standard script")
        .to_string()
}

/// Spendable output with a distinct outpoint and owning script per `n`
pub fn utxo(n: u8, sats: u64) -> UnspentOutput {
    utxo_with_confs(n, sats, 1)
}

pub fn utxo_with_confs(n: u8, sats: u64, confirmations: u32) -> UnspentOutput {
    UnspentOutput::new(
        OutPoint::new(Txid::from_byte_array([n; 32]), u32::from(n)),
        Amount::from_sat(sats),
        p2pkh_script(n),
        confirmations,
    )
}

pub fn sats(value: u64) -> Amount {
    Amount::from_sat(value)
}
