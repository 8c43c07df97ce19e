//! Output selector
//!
//! Picks the outputs that fund a spend from the fetched catalog:
//!
//! 1. Scanning in catalog order, the first output worth at least the target
//!    is used alone. Spending one output avoids linking several addresses
//!    in the same transaction.
//! 2. Otherwise outputs are taken largest first (stable for equal values)
//!    until the running total reaches the target.
//! 3. If the whole catalog falls short there is no selection.
//!
//! The target already includes the dust threshold, so whatever is selected
//! can pay the amount, the fee and a non-dust change output.
//!
//! # Usage
//!
//! ```
//! use coinspend_common::utxo_selection::selector::OutputSelector;
//! use coinspend_common::utxo_selection::types::UnspentOutput;
//! use bitcoin::{Amount, OutPoint, ScriptBuf};
//!
//! let catalog = vec![UnspentOutput::new(
//!     OutPoint::null(),
//!     Amount::from_sat(200_000),
//!     ScriptBuf::new(),
//!     3,
//! )];
//!
//! let selector = OutputSelector::new();
//! let result = selector
//!     .select_for_payment(&catalog, Amount::from_sat(50_000), Amount::from_sat(1_000))
//!     .expect("enough funds");
//! assert_eq!(result.selected.len(), 1);
//! ```

use bitcoin::Amount;
use serde_json::json;

use crate::config::SpendConfig;
use crate::logging::{self, LogLevel};
use crate::policy::DUST_THRESHOLD;
use crate::utxo_selection::types::{SelectionResult, UnspentOutput};

/// Selects unspent outputs to cover a target amount
#[derive(Debug, Clone, Copy)]
pub struct OutputSelector {
    /// Dust threshold added on top of amount and fee
    dust_threshold: u64,
}

impl Default for OutputSelector {
    fn default() -> Self {
        Self::new()
    }
}

impl OutputSelector {
    /// Create a selector using the standard dust threshold
    pub fn new() -> Self {
        Self {
            dust_threshold: DUST_THRESHOLD,
        }
    }

    /// Create a selector from configuration
    pub fn from_config(config: &SpendConfig) -> Self {
        Self {
            dust_threshold: config.policy.dust_threshold,
        }
    }

    /// Set the dust threshold for this selector
    pub fn with_dust_threshold(mut self, dust_threshold: u64) -> Self {
        self.dust_threshold = dust_threshold;
        self
    }

    /// Dust threshold used by [`OutputSelector::select_for_payment`]
    pub fn dust_threshold(&self) -> u64 {
        self.dust_threshold
    }

    /// Select outputs worth at least `amount + fee + dust threshold`
    ///
    /// Returns `None` for insufficient funds, including when the target
    /// itself overflows.
    pub fn select_for_payment(
        &self,
        catalog: &[UnspentOutput],
        amount: Amount,
        fee: Amount,
    ) -> Option<SelectionResult> {
        let target = amount
            .checked_add(fee)
            .and_then(|t| t.checked_add(Amount::from_sat(self.dust_threshold)));

        match target {
            Some(target) => self.select(catalog, target),
            None => {
                logging::log_selection(
                    LogLevel::Warn,
                    "selection_target_overflow",
                    Some(json!({ "amount": amount.to_sat(), "fee": fee.to_sat() })),
                );
                None
            }
        }
    }

    /// Select outputs whose value covers `target_plus_dust`
    ///
    /// # Arguments
    ///
    /// * `catalog` - Outputs fetched for the spending identity
    /// * `target_plus_dust` - Amount plus fee plus dust threshold
    ///
    /// # Returns
    ///
    /// * `Some(SelectionResult)` when the catalog covers the target
    /// * `None` for insufficient funds (including an empty catalog)
    pub fn select(
        &self,
        catalog: &[UnspentOutput],
        target_plus_dust: Amount,
    ) -> Option<SelectionResult> {
        logging::log_selection(
            LogLevel::Debug,
            "selection_started",
            Some(json!({
                "candidates": catalog.len(),
                "target": target_plus_dust.to_sat(),
            })),
        );

        if let Some(single) = catalog.iter().find(|u| u.value >= target_plus_dust) {
            logging::log_selection(
                LogLevel::Debug,
                "single_output_selected",
                Some(json!({ "value": single.value.to_sat() })),
            );
            return Some(SelectionResult {
                selected: vec![single.clone()],
                total_value: single.value,
            });
        }

        // sort_by is stable, so equal values keep catalog order
        let mut sorted: Vec<&UnspentOutput> = catalog.iter().collect();
        sorted.sort_by(|a, b| b.value.cmp(&a.value));

        let mut selected = Vec::new();
        let mut total_value = Amount::ZERO;

        for utxo in sorted {
            total_value = match total_value.checked_add(utxo.value) {
                Some(total) => total,
                None => {
                    logging::log_selection(LogLevel::Warn, "selection_total_overflow", None);
                    return None;
                }
            };
            selected.push(utxo.clone());

            if total_value >= target_plus_dust {
                logging::log_selection(
                    LogLevel::Debug,
                    "selection_completed",
                    Some(json!({
                        "selected": selected.len(),
                        "total": total_value.to_sat(),
                    })),
                );
                return Some(SelectionResult {
                    selected,
                    total_value,
                });
            }
        }

        logging::log_selection(
            LogLevel::Info,
            "insufficient_funds",
            Some(json!({
                "available": total_value.to_sat(),
                "required": target_plus_dust.to_sat(),
            })),
        );
        None
    }
}
