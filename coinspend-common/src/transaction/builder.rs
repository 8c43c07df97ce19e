//! Transaction builder
//!
//! Turns a set of candidate inputs and a [`PaymentRequest`] into an unsigned
//! transaction:
//!
//! 1. Every payment is validated (at least one, non-zero, not dust, address
//!    valid for the wallet's network). [`TransactionBuilder::validate_payments`]
//!    runs the same checks on their own so callers can reject a request
//!    before fetching anything.
//! 2. Inputs are taken in the order given. Inputs with non-standard locking
//!    scripts are skipped, and so are inputs paying to one of the
//!    destinations when simple send is on. Accumulation stops once the
//!    selected value matches the needed value exactly or exceeds it by at
//!    least the free-output slack.
//! 3. Whatever is left over after outputs and fee becomes a change output.
//! 4. Outputs are shuffled with a cryptographically strong RNG.
//! 5. Priority is the sum of `value * confirmations` over the inputs divided
//!    by the estimated signed size.
//!
//! Insufficient funds is `Ok(None)`. Misuse (bad amounts, dust change, no
//! change address) is an error.
//!
//! # Usage
//!
//! ```
//! use coinspend_common::transaction::builder::TransactionBuilder;
//! use coinspend_common::transaction::types::PaymentRequest;
//! use coinspend_common::utxo_selection::types::UnspentOutput;
//! use bitcoin::hashes::Hash;
//! use bitcoin::{Amount, Network, OutPoint, PubkeyHash, ScriptBuf};
//!
//! let script = ScriptBuf::new_p2pkh(&PubkeyHash::from_byte_array([1; 20]));
//! let inputs = vec![UnspentOutput::new(OutPoint::null(), Amount::from_sat(60_000), script, 2)];
//! let payments = PaymentRequest::single("1BoatSLRHtKNngkdXEeobR76b53LETtpyT", Amount::from_sat(50_000));
//!
//! let built = TransactionBuilder::new(Network::Bitcoin)
//!     .build(&inputs, &payments, Amount::from_sat(10_000), None)
//!     .unwrap()
//!     .expect("funded");
//! assert!(!built.change_included);
//! assert_eq!(built.fee, Amount::from_sat(10_000));
//! ```

use bitcoin::absolute::LockTime;
use bitcoin::consensus::encode::serialize;
use bitcoin::{Amount, Network, ScriptBuf, Sequence, Transaction, TxIn, TxOut, Witness};
use rand::seq::SliceRandom;
use rand::{CryptoRng, RngCore};
use serde_json::json;

use crate::config::SpendConfig;
use crate::error::{SpendError, SpendResult};
use crate::logging::{self, LogLevel};
use crate::policy::{is_dust, DUST_THRESHOLD, MIN_FREE_OUTPUT, SIGNED_INPUT_SIZE};
use crate::transaction::script::{is_spendable_script, parse_address};
use crate::transaction::types::{BuiltTransaction, PaymentRequest};
use crate::utxo_selection::types::UnspentOutput;

const TX_VERSION: i32 = 1;

/// Builds unsigned spend transactions
#[derive(Debug, Clone)]
pub struct TransactionBuilder {
    network: Network,
    dust_threshold: u64,
    min_free_output: u64,
    signed_input_size: u64,
    simple_send: bool,
}

impl TransactionBuilder {
    /// Create a builder with the standard relay policy
    pub fn new(network: Network) -> Self {
        Self {
            network,
            dust_threshold: DUST_THRESHOLD,
            min_free_output: MIN_FREE_OUTPUT,
            signed_input_size: SIGNED_INPUT_SIZE,
            simple_send: true,
        }
    }

    /// Create a builder from configuration
    pub fn from_config(config: &SpendConfig) -> SpendResult<Self> {
        let network = config
            .network()
            .map_err(|e| SpendError::Config(e.to_string()))?;

        Ok(Self {
            network,
            dust_threshold: config.policy.dust_threshold,
            min_free_output: config.policy.min_free_output,
            signed_input_size: config.policy.signed_input_size,
            simple_send: config.wallet.simple_send,
        })
    }

    /// Allow or forbid spending inputs that belong to a destination address
    pub fn with_simple_send(mut self, simple_send: bool) -> Self {
        self.simple_send = simple_send;
        self
    }

    /// Set the dust threshold
    pub fn with_dust_threshold(mut self, dust_threshold: u64) -> Self {
        self.dust_threshold = dust_threshold;
        self
    }

    /// Set the slack that ends input accumulation early
    pub fn with_min_free_output(mut self, min_free_output: u64) -> Self {
        self.min_free_output = min_free_output;
        self
    }

    /// Network addresses are validated against
    pub fn network(&self) -> Network {
        self.network
    }

    /// Check every payment without touching any inputs
    ///
    /// Rejects an empty request, zero or dust amounts, addresses that do not
    /// parse for this network, and totals that overflow. Returns the total
    /// the payments add up to.
    pub fn validate_payments(&self, payments: &PaymentRequest) -> SpendResult<Amount> {
        self.payment_outputs(payments).map(|(_, total)| total)
    }

    fn payment_outputs(&self, payments: &PaymentRequest) -> SpendResult<(Vec<TxOut>, Amount)> {
        if payments.is_empty() {
            return Err(SpendError::NoPayments);
        }

        let mut outputs = Vec::with_capacity(payments.len() + 1);
        let mut total = Amount::ZERO;

        for (address, amount) in payments.iter() {
            if amount == Amount::ZERO {
                return Err(SpendError::InvalidAmount {
                    address: address.to_string(),
                });
            }
            if is_dust(amount, self.dust_threshold) {
                return Err(SpendError::DustAmount {
                    amount: amount.to_sat(),
                    minimum: self.dust_threshold,
                });
            }

            let script_pubkey = parse_address(address, self.network)?.script_pubkey();

            total = total
                .checked_add(amount)
                .ok_or_else(|| SpendError::AmountOverflow("sum of payments".to_string()))?;

            outputs.push(TxOut {
                value: amount.to_sat(),
                script_pubkey,
            });
        }

        Ok((outputs, total))
    }

    /// Build a transaction, shuffling outputs with the thread-local CSPRNG
    pub fn build<'a>(
        &self,
        inputs: &'a [UnspentOutput],
        payments: &PaymentRequest,
        fee: Amount,
        change_address: Option<&str>,
    ) -> SpendResult<Option<BuiltTransaction<'a>>> {
        let mut rng = rand::rng();
        self.build_with_rng(inputs, payments, fee, change_address, &mut rng)
    }

    /// Build a transaction using the supplied RNG for output shuffling
    ///
    /// # Arguments
    ///
    /// * `inputs` - Candidate outputs, normally a selection result
    /// * `payments` - Destinations and amounts
    /// * `fee` - Absolute miner's fee
    /// * `change_address` - Where leftover value goes, if any is left
    /// * `rng` - Cryptographically strong RNG for output order
    ///
    /// # Returns
    ///
    /// * `Ok(Some(tx))` - funded unsigned transaction
    /// * `Ok(None)` - the usable inputs do not cover payments plus fee
    /// * `Err(_)` - invalid request
    pub fn build_with_rng<'a, R>(
        &self,
        inputs: &'a [UnspentOutput],
        payments: &PaymentRequest,
        fee: Amount,
        change_address: Option<&str>,
        rng: &mut R,
    ) -> SpendResult<Option<BuiltTransaction<'a>>>
    where
        R: RngCore + CryptoRng + ?Sized,
    {
        let (mut outputs, output_value_sum) = self.payment_outputs(payments)?;
        let destination_scripts: Vec<ScriptBuf> =
            outputs.iter().map(|o| o.script_pubkey.clone()).collect();

        if inputs.is_empty() {
            return Ok(None);
        }

        let value_needed = output_value_sum
            .checked_add(fee)
            .ok_or_else(|| SpendError::AmountOverflow("payments plus fee".to_string()))?;
        // None means the slack can never be reached
        let enough = value_needed.checked_add(Amount::from_sat(self.min_free_output));

        let mut used: Vec<&'a UnspentOutput> = Vec::new();
        let mut tx_inputs = Vec::new();
        let mut value_selected = Amount::ZERO;
        let mut coin_age: u128 = 0;

        for utxo in inputs {
            if !is_spendable_script(&utxo.script_pubkey) {
                logging::log_transaction(
                    LogLevel::Debug,
                    "skipping_nonstandard_input",
                    Some(json!({ "outpoint": utxo.id() })),
                );
                continue;
            }

            if self.simple_send && destination_scripts.contains(&utxo.script_pubkey) {
                logging::log_transaction(
                    LogLevel::Debug,
                    "skipping_self_payment_input",
                    Some(json!({ "outpoint": utxo.id() })),
                );
                continue;
            }

            value_selected = value_selected
                .checked_add(utxo.value)
                .ok_or_else(|| SpendError::AmountOverflow("sum of inputs".to_string()))?;
            coin_age += u128::from(utxo.value.to_sat()) * u128::from(utxo.confirmations);

            tx_inputs.push(TxIn {
                previous_output: utxo.outpoint,
                script_sig: ScriptBuf::new(),
                sequence: Sequence::MAX,
                witness: Witness::default(),
            });
            used.push(utxo);

            if value_selected == value_needed || enough.map_or(false, |e| value_selected >= e) {
                break;
            }
        }

        if value_selected < value_needed {
            logging::log_transaction(
                LogLevel::Info,
                "insufficient_funds",
                Some(json!({
                    "selected": value_selected.to_sat(),
                    "needed": value_needed.to_sat(),
                })),
            );
            return Ok(None);
        }

        // value_selected >= value_needed, so this cannot underflow
        let change_value = value_selected - value_needed;
        let change_included = change_value > Amount::ZERO;

        if change_included {
            if is_dust(change_value, self.dust_threshold) {
                return Err(SpendError::DustChange {
                    change: change_value.to_sat(),
                    minimum: self.dust_threshold,
                });
            }

            let change_address = change_address.ok_or(SpendError::NoChangeAddress {
                change: change_value.to_sat(),
            })?;

            outputs.push(TxOut {
                value: change_value.to_sat(),
                script_pubkey: parse_address(change_address, self.network)?.script_pubkey(),
            });
        }

        outputs.shuffle(rng);

        let transaction = Transaction {
            version: TX_VERSION,
            lock_time: LockTime::ZERO,
            input: tx_inputs,
            output: outputs,
        };

        let estimated_size = serialize(&transaction).len() as u64
            + self.signed_input_size * used.len() as u64;
        let priority = u64::try_from(coin_age / u128::from(estimated_size)).unwrap_or(u64::MAX);

        logging::log_transaction(
            LogLevel::Info,
            "transaction_built",
            Some(json!({
                "inputs": used.len(),
                "outputs": transaction.output.len(),
                "fee": fee.to_sat(),
                "change": change_value.to_sat(),
                "priority": priority,
            })),
        );

        Ok(Some(BuiltTransaction {
            inputs: used,
            transaction,
            fee,
            change_value,
            change_included,
            priority,
        }))
    }
}
