//! Unspent output records as served by the unspent-outputs API
//!
//! The API answers with an envelope:
//!
//! ```json
//! {"unspent_outputs": [
//!   {"tx_hash": "...", "tx_output_n": 0, "value": 10000, "script": "76a9...88ac",
//!    "confirmations": 6, "xpub": {"path": "M/0/3"}}
//! ]}
//! ```
//!
//! `tx_hash` is in internal byte order, the reverse of how txids are
//! displayed.

use bitcoin::{Amount, OutPoint, ScriptBuf, Txid};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::str::FromStr;

use coinspend_common::error::{SpendError, SpendResult};
use coinspend_common::logging::{self, LogLevel};
use coinspend_common::utxo_selection::types::UnspentOutput;

/// One unspent output as returned by the API
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnspentRecord {
    pub tx_hash: String,
    pub tx_output_n: u32,
    pub value: u64,
    /// Hex-encoded locking script
    pub script: String,
    #[serde(default)]
    pub confirmations: u32,
    /// Present for outputs owned by an HD account
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub xpub: Option<XpubInfo>,
}

/// HD ownership details of a record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct XpubInfo {
    pub path: String,
}

#[derive(Debug, Deserialize)]
struct UnspentResponse {
    #[serde(default)]
    unspent_outputs: Vec<UnspentRecord>,
}

/// Parse an unspent-outputs API response body
pub fn parse_unspent_response(body: &str) -> SpendResult<Vec<UnspentRecord>> {
    let response: UnspentResponse = serde_json::from_str(body)?;
    Ok(response.unspent_outputs)
}

impl UnspentRecord {
    /// Txid in display order
    pub fn txid(&self) -> SpendResult<Txid> {
        let mut bytes = hex::decode(&self.tx_hash)?;
        bytes.reverse();
        Txid::from_str(&hex::encode(bytes))
            .map_err(|e| SpendError::InvalidRecord(format!("tx_hash {}: {}", self.tx_hash, e)))
    }

    /// Convert into a catalog entry
    pub fn to_unspent_output(&self) -> SpendResult<UnspentOutput> {
        let script_pubkey = ScriptBuf::from(hex::decode(&self.script)?);
        let output = UnspentOutput::new(
            OutPoint::new(self.txid()?, self.tx_output_n),
            Amount::from_sat(self.value),
            script_pubkey,
            self.confirmations,
        );

        Ok(match &self.xpub {
            Some(xpub) => output.with_owner_path(xpub.path.clone()),
            None => output,
        })
    }
}

/// Convert records into a catalog, skipping (and logging) malformed ones
pub fn catalog_from_records(records: &[UnspentRecord]) -> Vec<UnspentOutput> {
    records
        .iter()
        .filter_map(|record| match record.to_unspent_output() {
            Ok(output) => Some(output),
            Err(e) => {
                logging::log_network(
                    LogLevel::Warn,
                    "skipping_malformed_unspent_record",
                    Some(json!({
                        "tx_hash": record.tx_hash,
                        "error": e.to_string(),
                    })),
                );
                None
            }
        })
        .collect()
}
