//! Payment and assembled transaction types

use bitcoin::{Amount, Transaction, TxOut, Txid};
use std::collections::BTreeMap;

use crate::utxo_selection::types::UnspentOutput;

/// Destination addresses and the amount each should receive
///
/// Keys are unique; adding the same address twice replaces the amount.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PaymentRequest {
    payments: BTreeMap<String, Amount>,
}

impl PaymentRequest {
    /// Create an empty payment request
    pub fn new() -> Self {
        Self::default()
    }

    /// A request paying one address
    pub fn single(address: impl Into<String>, amount: Amount) -> Self {
        Self::new().with_payment(address, amount)
    }

    /// Add a payment, returning the amount it replaced if any
    pub fn add(&mut self, address: impl Into<String>, amount: Amount) -> Option<Amount> {
        self.payments.insert(address.into(), amount)
    }

    /// Builder-style [`PaymentRequest::add`]
    pub fn with_payment(mut self, address: impl Into<String>, amount: Amount) -> Self {
        self.add(address, amount);
        self
    }

    /// Iterate over (address, amount) pairs
    pub fn iter(&self) -> impl Iterator<Item = (&str, Amount)> {
        self.payments.iter().map(|(a, v)| (a.as_str(), *v))
    }

    /// Number of destinations
    pub fn len(&self) -> usize {
        self.payments.len()
    }

    /// True when there are no destinations
    pub fn is_empty(&self) -> bool {
        self.payments.is_empty()
    }
}

/// Unsigned transaction produced by the builder
///
/// `inputs[i]` is the output spent by `transaction.input[i]`. Every input
/// carries an empty `script_sig` until it is signed, and the outputs are in
/// random order so the change output cannot be picked out by position.
#[derive(Debug, Clone)]
pub struct BuiltTransaction<'a> {
    /// Outputs being spent, in input order
    pub inputs: Vec<&'a UnspentOutput>,
    /// The unsigned transaction
    pub transaction: Transaction,
    /// Miner's fee: inputs minus outputs
    pub fee: Amount,
    /// Value of the change output, zero when there is none
    pub change_value: Amount,
    /// Whether a change output was added
    pub change_included: bool,
    /// Coin-age per estimated byte, for external fee and relay policy
    pub priority: u64,
}

impl<'a> BuiltTransaction<'a> {
    /// Outputs in their final (shuffled) order
    pub fn outputs(&self) -> &[TxOut] {
        &self.transaction.output
    }

    /// Number of inputs
    pub fn input_count(&self) -> usize {
        self.inputs.len()
    }

    /// Sum of the spent outputs
    pub fn input_value(&self) -> Amount {
        self.inputs.iter().map(|u| u.value).sum()
    }

    /// Sum of the created outputs
    pub fn output_value(&self) -> Amount {
        self.transaction
            .output
            .iter()
            .map(|o| Amount::from_sat(o.value))
            .sum()
    }

    /// Id of the unsigned transaction
    ///
    /// Signing legacy inputs changes the id; use the signed transaction's
    /// id once it exists.
    pub fn unsigned_txid(&self) -> Txid {
        self.transaction.txid()
    }
}
