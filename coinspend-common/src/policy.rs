//! Amount and relay policy constants
//!
//! Every other component reads its thresholds from here, either directly or
//! through [`crate::config::PolicyConfig`], whose defaults are these values.
//!
//! Example:
//! ```
//! use coinspend_common::policy::{is_dust_amount, DUST_THRESHOLD};
//!
//! assert!(is_dust_amount(DUST_THRESHOLD - 1));
//! assert!(!is_dust_amount(DUST_THRESHOLD));
//! ```

use bdk::FeeRate;
use bitcoin::Amount;

/// Minimum value of any output we create, in satoshis
pub const DUST_THRESHOLD: u64 = 546;

/// Slack above the needed value at which input accumulation stops early
pub const MIN_FREE_OUTPUT: u64 = 1_000_000;

/// Marginal size of one compressed-key P2PKH input once signed, in bytes
pub const SIGNED_INPUT_SIZE: u64 = 114;

/// Longest serialized transaction hex accepted for submission
pub const MAX_TX_HEX_LENGTH: usize = 100 * 1024;

/// Miner's fee used when the caller has no better estimate (0.0001 BTC)
pub const DEFAULT_FEE: u64 = 10_000;

/// Determines if an amount is too small to be relayed as an output.
///
/// # Arguments
/// * `amount_sats` - The amount in satoshis to check
///
/// # Returns
/// `true` if the amount is below [`DUST_THRESHOLD`]
pub fn is_dust_amount(amount_sats: u64) -> bool {
    amount_sats < DUST_THRESHOLD
}

/// Same check against a configured threshold
pub fn is_dust(amount: Amount, dust_threshold: u64) -> bool {
    amount.to_sat() < dust_threshold
}

/// Estimates the size of a legacy (P2PKH) transaction in bytes.
///
/// The wallet spends compressed-key P2PKH outputs, so this uses 148 bytes per
/// input and 34 bytes per output on top of a fixed 10-byte overhead.
///
/// # Arguments
/// * `inputs` - Number of inputs
/// * `outputs` - Number of outputs
pub fn estimate_tx_size(inputs: usize, outputs: usize) -> usize {
    const TX_OVERHEAD: usize = 10;
    const INPUT_SIZE: usize = 148;
    const OUTPUT_SIZE: usize = 34;

    TX_OVERHEAD + (inputs * INPUT_SIZE) + (outputs * OUTPUT_SIZE)
}

/// Fee for a transaction of the given shape at the given rate.
///
/// Used to preview alternate fee levels once the input count is known.
pub fn estimate_fee(inputs: usize, outputs: usize, fee_rate: FeeRate) -> Amount {
    let size = estimate_tx_size(inputs, outputs);
    let fee_sats = (size as f32 * fee_rate.as_sat_per_vb()).ceil() as u64;
    Amount::from_sat(fee_sats)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dust_boundary() {
        assert!(is_dust_amount(545));
        assert!(!is_dust_amount(546));
        assert!(is_dust(Amount::from_sat(999), 1_000));
        assert!(!is_dust(Amount::from_sat(1_000), 1_000));
    }

    #[test]
    fn size_grows_per_input_and_output() {
        assert_eq!(estimate_tx_size(1, 2), 10 + 148 + 68);
        assert_eq!(estimate_tx_size(3, 2) - estimate_tx_size(2, 2), 148);
        assert_eq!(estimate_tx_size(1, 3) - estimate_tx_size(1, 2), 34);
    }

    #[test]
    fn fee_scales_with_rate() {
        let one = estimate_fee(1, 2, FeeRate::from_sat_per_vb(1.0));
        let ten = estimate_fee(1, 2, FeeRate::from_sat_per_vb(10.0));
        assert_eq!(one, Amount::from_sat(226));
        assert_eq!(ten, Amount::from_sat(2_260));
    }

    #[test]
    fn relay_guard_is_one_hundred_kib() {
        assert_eq!(MAX_TX_HEX_LENGTH, 102_400);
    }
}
