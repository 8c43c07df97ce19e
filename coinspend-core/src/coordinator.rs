//! Two-phase spend orchestration
//!
//! A spend attempt runs in two steps joined by [`PreparedSpend`]:
//!
//! 1. [`SpendCoordinator::prepare`] validates the payments, then fetches the
//!    unspent outputs of the spending identity and selects enough of them.
//!    The caller can show fee previews from the result before committing.
//! 2. [`SpendCoordinator::execute`] builds, signs and submits the
//!    transaction, then records the note and advances the HD change index.
//!
//! Insufficient funds is `Ok(None)` from either step. Wallet bookkeeping only
//! happens once the relay has accepted the transaction.

use bitcoin::consensus::encode::serialize_hex;
use bitcoin::{Amount, Network, Txid};
use serde_json::json;
use std::collections::BTreeMap;

use coinspend_common::config::SpendConfig;
use coinspend_common::error::{SpendError, SpendResult};
use coinspend_common::logging::{self, LogLevel};
use coinspend_common::policy;
use coinspend_common::transaction::builder::TransactionBuilder;
use coinspend_common::transaction::types::{BuiltTransaction, PaymentRequest};
use coinspend_common::utxo_selection::selector::OutputSelector;
use coinspend_common::utxo_selection::types::SelectionResult;
use coinspend_common::FeeRate;

use crate::collaborators::{Collaborators, KeyContext, KeyRing, SpendSource};
use crate::unspent_source::catalog_from_records;

/// Inputs to the prepare step
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrepareRequest {
    pub source: SpendSource,
    /// Payments the spend will make; validated before anything is fetched
    pub payments: PaymentRequest,
    /// Miner's fee; the configured default when `None`
    pub fee: Option<Amount>,
}

impl PrepareRequest {
    pub fn new(source: SpendSource, payments: PaymentRequest) -> Self {
        Self {
            source,
            payments,
            fee: None,
        }
    }

    /// Prepare for exactly the payments and fee of `request`
    pub fn for_spend(source: SpendSource, request: &SpendRequest) -> Self {
        Self {
            source,
            payments: request.payments.clone(),
            fee: request.fee,
        }
    }

    pub fn with_fee(mut self, fee: Amount) -> Self {
        self.fee = Some(fee);
        self
    }
}

/// Inputs to the execute step
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpendRequest {
    pub payments: PaymentRequest,
    /// Miner's fee; the configured default when `None`
    pub fee: Option<Amount>,
    /// Attached to the transaction after it is accepted
    pub note: Option<String>,
}

impl SpendRequest {
    pub fn new(payments: PaymentRequest) -> Self {
        Self {
            payments,
            fee: None,
            note: None,
        }
    }

    /// Pay a single address
    pub fn single(address: impl Into<String>, amount: Amount) -> Self {
        Self::new(PaymentRequest::single(address, amount))
    }

    pub fn with_fee(mut self, fee: Amount) -> Self {
        self.fee = Some(fee);
        self
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }
}

/// Result of the prepare step
///
/// Owns everything execute needs, including the address to derivation path
/// map for HD spends. Nothing about an attempt lives outside this value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedSpend {
    pub source: SpendSource,
    pub selection: SelectionResult,
    /// Address of each selected HD output to its derivation path
    pub key_paths: BTreeMap<String, String>,
}

impl PreparedSpend {
    /// Number of selected inputs
    pub fn input_count(&self) -> usize {
        self.selection.len()
    }

    /// Fee for spending the selection to one payment plus change at `fee_rate`
    pub fn suggested_fee(&self, fee_rate: FeeRate) -> Amount {
        policy::estimate_fee(self.input_count(), 2, fee_rate)
    }
}

/// Outcome of an accepted spend
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpendReceipt {
    pub txid: Txid,
    pub tx_hex: String,
    pub fee: Amount,
    pub change_included: bool,
    pub priority: u64,
    pub input_count: usize,
}

/// Runs spend attempts against a set of collaborators
pub struct SpendCoordinator {
    network: Network,
    default_fee: Amount,
    max_tx_hex_length: usize,
    accepted_marker: String,
    selector: OutputSelector,
    builder: TransactionBuilder,
    collaborators: Collaborators,
}

impl SpendCoordinator {
    /// Create a coordinator; fails when the configured network is unknown
    pub fn new(config: &SpendConfig, collaborators: Collaborators) -> SpendResult<Self> {
        let builder = TransactionBuilder::from_config(config)?;

        Ok(Self {
            network: builder.network(),
            default_fee: Amount::from_sat(config.policy.default_fee),
            max_tx_hex_length: config.policy.max_tx_hex_length,
            accepted_marker: config.submission.accepted_marker.clone(),
            selector: OutputSelector::from_config(config),
            builder,
            collaborators,
        })
    }

    /// Network every address is checked against
    pub fn network(&self) -> Network {
        self.network
    }

    /// Fee used when a request leaves it unset
    pub fn default_fee(&self) -> Amount {
        self.default_fee
    }

    /// Check the payments of `request` without any I/O
    ///
    /// Returns the total they pay out.
    pub fn validate(&self, request: &SpendRequest) -> SpendResult<Amount> {
        self.builder.validate_payments(&request.payments)
    }

    fn fee_or_default(&self, fee: Option<Amount>) -> Amount {
        fee.unwrap_or(self.default_fee)
    }

    /// Fetch and select outputs for a spend
    ///
    /// Payments are validated first; an invalid request fails without
    /// fetching anything. Returns `Ok(None)` when the source cannot fund the
    /// payments and fee plus a non-dust change output.
    pub fn prepare(&self, request: &PrepareRequest) -> SpendResult<Option<PreparedSpend>> {
        let amount = self.builder.validate_payments(&request.payments)?;
        let fee = self.fee_or_default(request.fee);

        logging::log_network(
            LogLevel::Debug,
            "fetching_unspent_outputs",
            Some(json!({ "hd": request.source.is_hd() })),
        );

        let records = self
            .collaborators
            .unspent_source
            .fetch_unspent(&request.source)?;
        let catalog = catalog_from_records(&records);

        let selection = match self
            .selector
            .select_for_payment(&catalog, amount, fee)
        {
            Some(selection) => selection,
            None => return Ok(None),
        };

        let key_paths = if request.source.is_hd() {
            selection
                .selected
                .iter()
                .filter_map(|utxo| {
                    let address = utxo.address(self.network)?;
                    Some((address.to_string(), utxo.owner_path.clone()?))
                })
                .collect()
        } else {
            BTreeMap::new()
        };

        logging::log_selection(
            LogLevel::Info,
            "spend_prepared",
            Some(json!({
                "fetched": records.len(),
                "usable": catalog.len(),
                "selected": selection.len(),
            })),
        );

        Ok(Some(PreparedSpend {
            source: request.source.clone(),
            selection,
            key_paths,
        }))
    }

    /// Build, sign and submit a prepared spend
    ///
    /// Returns `Ok(None)` when the selected outputs turn out not to cover the
    /// payments and fee (for example when some are skipped while building).
    pub fn execute(
        &self,
        prepared: &PreparedSpend,
        request: &SpendRequest,
    ) -> SpendResult<Option<SpendReceipt>> {
        let change_address = match &prepared.source {
            SpendSource::Hd { account, .. } => {
                Some(self.collaborators.wallet_state.change_address(*account)?)
            }
            SpendSource::Legacy { addresses } => addresses.first().cloned(),
        };

        let built = match self.builder.build(
            &prepared.selection.selected,
            &request.payments,
            self.fee_or_default(request.fee),
            change_address.as_deref(),
        )? {
            Some(built) => built,
            None => return Ok(None),
        };

        let keys = self.resolve_keys(prepared, &built)?;
        let signed = self.collaborators.signer.sign(&built, &keys)?;
        let txid = signed.txid();
        let tx_hex = serialize_hex(&signed);

        if tx_hex.len() > self.max_tx_hex_length {
            return Err(SpendError::TransactionTooLarge {
                length: tx_hex.len(),
                max: self.max_tx_hex_length,
            });
        }

        logging::log_network(
            LogLevel::Info,
            "submitting_transaction",
            Some(json!({
                "txid": txid.to_string(),
                "bytes": tx_hex.len() / 2,
            })),
        );

        let response = self.collaborators.broadcaster.submit(&tx_hex)?;
        if !response.contains(&self.accepted_marker) {
            logging::log_network(
                LogLevel::Warn,
                "submission_rejected",
                Some(json!({ "response": response })),
            );
            return Err(SpendError::SubmissionRejected(response));
        }

        self.record_accepted(prepared, request, &built, &txid);

        Ok(Some(SpendReceipt {
            txid,
            tx_hex,
            fee: built.fee,
            change_included: built.change_included,
            priority: built.priority,
            input_count: built.input_count(),
        }))
    }

    fn resolve_keys(
        &self,
        prepared: &PreparedSpend,
        built: &BuiltTransaction<'_>,
    ) -> SpendResult<KeyRing> {
        let mut keys = Vec::with_capacity(built.input_count());

        for utxo in &built.inputs {
            let address = utxo
                .address(self.network)
                .map(|a| a.to_string())
                .ok_or_else(|| SpendError::SigningKeyMissing {
                    address: utxo.id(),
                })?;

            let context = match &prepared.source {
                SpendSource::Hd { account, .. } => {
                    let path = prepared.key_paths.get(&address).ok_or_else(|| {
                        SpendError::SigningKeyMissing {
                            address: address.clone(),
                        }
                    })?;
                    KeyContext::Hd {
                        account: *account,
                        path,
                    }
                }
                SpendSource::Legacy { .. } => KeyContext::Legacy,
            };

            match self.collaborators.key_resolver.resolve_key(&address, &context) {
                Some(key) => keys.push(key),
                None => {
                    logging::log_signing(
                        LogLevel::Warn,
                        "signing_key_missing",
                        Some(json!({ "address": address })),
                    );
                    return Err(SpendError::SigningKeyMissing { address });
                }
            }
        }

        Ok(KeyRing::new(keys))
    }

    /// Bookkeeping after acceptance; failures are logged, the spend stands
    fn record_accepted(
        &self,
        prepared: &PreparedSpend,
        request: &SpendRequest,
        built: &BuiltTransaction<'_>,
        txid: &Txid,
    ) {
        let wallet = &self.collaborators.wallet_state;

        if let Some(note) = request.note.as_deref().filter(|n| !n.is_empty()) {
            if let Err(e) = wallet.attach_note(txid, note) {
                logging::log_storage(
                    LogLevel::Warn,
                    "attach_note_failed",
                    Some(json!({ "error": e.to_string() })),
                );
            }
        }

        if let SpendSource::Hd { account, .. } = &prepared.source {
            if built.change_included {
                if let Err(e) = wallet.advance_change_index(*account) {
                    logging::log_storage(
                        LogLevel::Warn,
                        "advance_change_index_failed",
                        Some(json!({ "account": account, "error": e.to_string() })),
                    );
                }
            }
        }

        logging::log_transaction(
            LogLevel::Info,
            "spend_accepted",
            Some(json!({
                "txid": txid.to_string(),
                "inputs": built.input_count(),
                "change": built.change_included,
            })),
        );
    }
}
