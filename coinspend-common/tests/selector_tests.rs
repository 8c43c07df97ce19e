//! Output selector behaviour

mod common;

use coinspend_common::config::SpendConfig;
use coinspend_common::utxo_selection::selector::OutputSelector;
use common::{sats, utxo};

#[test]
fn single_large_output_covers_payment() {
    let catalog = vec![utxo(1, 200_000)];

    let result = OutputSelector::new()
        .select_for_payment(&catalog, sats(50_000), sats(1_000))
        .expect("enough funds");

    assert_eq!(result.len(), 1);
    assert_eq!(result.total_value, sats(200_000));
}

#[test]
fn accumulates_largest_first_and_stops_early() {
    let catalog = vec![utxo(1, 10_000), utxo(2, 20_000), utxo(3, 30_000)];

    let result = OutputSelector::new()
        .select_for_payment(&catalog, sats(45_000), sats(1_000))
        .expect("enough funds");

    let values: Vec<u64> = result.selected.iter().map(|u| u.value.to_sat()).collect();
    assert_eq!(values, vec![30_000, 20_000]);
    assert_eq!(result.total_value, sats(50_000));
}

#[test]
fn insufficient_catalog_selects_nothing() {
    let catalog = vec![utxo(1, 2_000), utxo(2, 3_000)];

    let result = OutputSelector::new().select_for_payment(&catalog, sats(10_000), sats(1_000));

    assert!(result.is_none());
}

#[test]
fn exact_target_is_sufficient() {
    let catalog = vec![utxo(1, 400), utxo(2, 600)];

    let result = OutputSelector::new()
        .select(&catalog, sats(1_000))
        .expect("exact match");

    assert_eq!(result.len(), 2);
    assert_eq!(result.total_value, sats(1_000));
}

#[test]
fn single_output_preferred_even_when_later_pair_is_smaller() {
    // The shortcut takes the first qualifying output rather than a tighter pair
    let catalog = vec![utxo(1, 900), utxo(2, 50_000), utxo(3, 600), utxo(4, 500)];

    let result = OutputSelector::new()
        .select(&catalog, sats(1_000))
        .expect("enough funds");

    assert_eq!(result.selected, vec![utxo(2, 50_000)]);
}

#[test]
fn dust_threshold_comes_from_config() {
    let mut config = SpendConfig::default();
    config.policy.dust_threshold = 10_000;
    let catalog = vec![utxo(1, 15_000)];

    let selector = OutputSelector::from_config(&config);
    assert_eq!(selector.dust_threshold(), 10_000);

    // 5,000 + 1,000 + 10,000 exceeds the only output
    assert!(selector
        .select_for_payment(&catalog, sats(5_000), sats(1_000))
        .is_none());
    assert!(OutputSelector::new()
        .select_for_payment(&catalog, sats(5_000), sats(1_000))
        .is_some());
}
