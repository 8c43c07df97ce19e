//! Locking script helpers

use bitcoin::address::NetworkUnchecked;
use bitcoin::{Address, Network, Script};
use std::str::FromStr;

use crate::error::{SpendError, SpendResult};

/// Whether an output locked by `script` can be spent with a single key.
///
/// Anything else (bare multisig, OP_RETURN, witness scripts, unknown
/// templates) is treated as strange and never used as an input.
pub fn is_spendable_script(script: &Script) -> bool {
    script.is_p2pkh() || script.is_p2pk() || script.is_p2sh() || script.is_v0_p2wpkh()
}

/// Parse an address string and check it belongs to `network`
pub fn parse_address(address: &str, network: Network) -> SpendResult<Address> {
    Address::<NetworkUnchecked>::from_str(address)
        .map_err(|e| SpendError::InvalidAddress(format!("{}: {}", address, e)))?
        .require_network(network)
        .map_err(|e| SpendError::InvalidAddress(format!("{}: {}", address, e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use bitcoin::hashes::Hash;
    use bitcoin::{PubkeyHash, ScriptBuf};

    #[test]
    fn p2pkh_is_spendable_op_return_is_not() {
        let p2pkh = ScriptBuf::new_p2pkh(&PubkeyHash::from_byte_array([7; 20]));
        assert!(is_spendable_script(&p2pkh));

        let op_return = ScriptBuf::from(vec![0x6a, 0x01, 0x01]);
        assert!(!is_spendable_script(&op_return));
        assert!(!is_spendable_script(&ScriptBuf::new()));
    }

    #[test]
    fn network_mismatch_is_rejected() {
        let mainnet = "1BoatSLRHtKNngkdXEeobR76b53LETtpyT";
        assert!(parse_address(mainnet, Network::Bitcoin).is_ok());
        assert!(matches!(
            parse_address(mainnet, Network::Testnet),
            Err(SpendError::InvalidAddress(_))
        ));
        assert!(parse_address("not-an-address", Network::Bitcoin).is_err());
    }
}
