use bitcoin::Network;
use tempfile::TempDir;

use crate::bridge::address::AddressInfo;
use crate::bridge::store::BridgeStore;
use crate::bridge::tx::{create_tx, SignedTx, UnsignedTx};
use crate::bridge::types::{OutPointState, CHAIN_NAME};
use crate::config::Config;
use crate::helper::store::{DefaultStore, Store};
use crate::nexus::CrossChainAddress;

use super::{outpoint_info, test_key};

fn bridge_store() -> (BridgeStore, TempDir) {
    let home = TempDir::new().expect("Unable to create test directory!");
    let conf = Config::default(home.path().to_str().unwrap(), Network::Regtest);
    (BridgeStore::open(&conf), home)
}

#[test]
fn test_store_roundtrip() {
    let testdir = TempDir::new().expect("Unable to create test directory!");
    let store: DefaultStore<String, String> = DefaultStore::new(testdir.path().join("test.db"));

    let key = "key".to_string();
    assert!(!store.exists(&key));

    store.save(&key, &"value".to_string());
    assert!(store.exists(&key));
    assert_eq!(store.get(&key), Some("value".to_string()));

    assert!(store.remove(&key));
    assert!(!store.remove(&key));
    assert_eq!(store.get(&key), None);
}

#[test]
fn test_store_entries_sorted_by_key() {
    let testdir = TempDir::new().expect("Unable to create test directory!");
    let store: DefaultStore<String, u64> = DefaultStore::new(testdir.path().join("test.db"));

    store.save(&"b".to_string(), &2);
    store.save(&"a".to_string(), &1);
    store.save(&"c".to_string(), &3);

    let keys = store
        .entries()
        .into_iter()
        .map(|(k, _)| k)
        .collect::<Vec<_>>();
    assert_eq!(keys, vec!["a", "b", "c"]);
    assert_eq!(store.list(), vec![1, 2, 3]);
}

#[test]
fn test_outpoint_state_transitions() {
    let (store, _home) = bridge_store();
    let info = outpoint_info(1, 50_000, "addr");

    assert_eq!(store.outpoint_info(&info.out_point), None);

    store.set_outpoint_info(&info, OutPointState::Confirmed);
    assert_eq!(
        store.outpoint_info(&info.out_point),
        Some((info.clone(), OutPointState::Confirmed))
    );
    assert_eq!(store.confirmed_outpoints(), vec![info.clone()]);

    store.set_outpoint_info(&info, OutPointState::Spent);
    assert_eq!(
        store.outpoint_info(&info.out_point),
        Some((info.clone(), OutPointState::Spent))
    );
    assert!(store.confirmed_outpoints().is_empty());

    store.delete_outpoint_info(&info.out_point);
    assert_eq!(store.outpoint_info(&info.out_point), None);
}

#[test]
fn test_confirmed_outpoints_sorted() {
    let (store, _home) = bridge_store();
    for seed in [3u8, 1, 2] {
        store.set_outpoint_info(&outpoint_info(seed, 1000, "addr"), OutPointState::Confirmed);
    }

    let outpoints = store
        .confirmed_outpoints()
        .iter()
        .map(|info| info.out_point.clone())
        .collect::<Vec<_>>();
    let mut sorted = outpoints.clone();
    sorted.sort();
    assert_eq!(outpoints, sorted);
    assert_eq!(outpoints.len(), 3);
}

#[test]
fn test_address_lookup_is_case_insensitive() {
    let (store, _home) = bridge_store();
    let key = test_key("master", 7);
    let info = AddressInfo::new_deposit_address(
        &key,
        &CrossChainAddress::new("ethereum", "0xabc"),
        Network::Regtest,
    );
    store.set_address_info(&info);

    assert_eq!(store.address_info(&info.address), Some(info.clone()));
    assert_eq!(
        store.address_info(&info.address.to_uppercase()),
        Some(info)
    );
    assert_eq!(store.address_info("bcrt1qunknown"), None);
}

#[test]
fn test_dust_amounts() {
    let (store, _home) = bridge_store();

    assert_eq!(store.dust_amount("addr"), 0);
    store.set_dust_amount("addr", 500);
    assert_eq!(store.dust_amount("addr"), 500);
    store.delete_dust_amount("addr");
    assert_eq!(store.dust_amount("addr"), 0);
}

#[test]
fn test_unconfirmed_amounts() {
    let (store, _home) = bridge_store();

    assert_eq!(store.unconfirmed_amount("master"), 0);
    store.set_unconfirmed_amount("master", 7000);
    assert_eq!(store.unconfirmed_amount("master"), 7000);
    store.set_unconfirmed_amount("master", 0);
    assert_eq!(store.unconfirmed_amount("master"), 0);
}

#[test]
fn test_unsigned_tx_slot() {
    let (store, _home) = bridge_store();
    assert_eq!(store.unsigned_tx(), None);

    let unsigned = UnsignedTx::new(create_tx(&[], vec![]), vec![], 0, 1, false);
    store.set_unsigned_tx(&unsigned);
    assert_eq!(store.unsigned_tx(), Some(unsigned));

    store.delete_unsigned_tx();
    assert_eq!(store.unsigned_tx(), None);
}

#[test]
fn test_latest_signed_tx_pointer() {
    let (store, _home) = bridge_store();
    assert!(store.latest_signed_tx().is_none());

    let first = SignedTx::new(create_tx(&[super::test_outpoint(1, 0)], vec![]), false, 1);
    let second = SignedTx::new(create_tx(&[super::test_outpoint(2, 0)], vec![]), false, 1);
    store.set_signed_tx(&first);
    store.set_signed_tx(&second);

    let first_id = first.tx.compute_txid().to_string();
    assert_eq!(store.signed_tx(&first_id), Some(first));
    assert_eq!(store.latest_signed_tx(), Some(second));
}

#[test]
fn test_pending_outpoints_keyed_by_poll() {
    let (store, _home) = bridge_store();
    let info = outpoint_info(1, 1000, "addr");
    let poll = crate::vote::PollKey::new(CHAIN_NAME, info.to_string());

    assert_eq!(store.pending_outpoint(&poll), None);
    store.set_pending_outpoint(&poll, &info);
    assert_eq!(store.pending_outpoint(&poll), Some(info));
    store.delete_pending_outpoint(&poll);
    assert_eq!(store.pending_outpoint(&poll), None);
}
