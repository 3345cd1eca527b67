use std::collections::BTreeMap;

use bitcoin::hashes::Hash;
use bitcoin::script::Builder;
use bitcoin::secp256k1::{PublicKey, Secp256k1, SecretKey};
use bitcoin::{Address, Network, OutPoint, Txid};
use tempfile::TempDir;

use crate::bridge::store::BridgeStore;
use crate::bridge::types::{OutPointInfo, CHAIN_NAME, SATOSHI};
use crate::bridge::Bridge;
use crate::config::Config;
use crate::helper::store::DefaultStore;
use crate::mock::{MockNexus, MockSigner, MockSnapshotter};
use crate::snapshot::Snapshot;
use crate::tss::{Key, KeyRole};
use crate::vote::PollKeeper;

mod store;
mod vote;

pub type TestBridge = Bridge<PollKeeper<MockSnapshotter>, MockSigner, MockNexus, MockSnapshotter>;

pub struct Fixture {
    pub bridge: TestBridge,
    _home: TempDir,
}

/// A bridge over fresh databases with one master key, a 100 share
/// validator set split 60/30/10 and ethereum as the registered
/// destination chain.
pub fn setup() -> Fixture {
    let home = TempDir::new().expect("Unable to create test directory!");
    let conf = Config::default(home.path().to_str().unwrap(), Network::Regtest);

    let mut snapshotter = MockSnapshotter::new();
    let mut participants = BTreeMap::new();
    participants.insert("validator1".to_string(), 60);
    participants.insert("validator2".to_string(), 30);
    participants.insert("validator3".to_string(), 10);
    snapshotter.register(Snapshot::new(1, participants));

    let keeper = PollKeeper::new(
        DefaultStore::new(conf.get_database_with_name("polls")),
        snapshotter.clone(),
    );

    let mut signer = MockSigner::new();
    signer.add_key("master", KeyRole::Master, 7, 1);
    signer.set_current_key(CHAIN_NAME, KeyRole::Master, "master");

    let mut nexus = MockNexus::new();
    nexus.add_chain("ethereum", "wei");
    nexus.register_asset("ethereum", SATOSHI);

    let store = BridgeStore::open(&conf);
    let bridge = Bridge::new(store, conf.params, keeper, signer, nexus, snapshotter);

    Fixture {
        bridge,
        _home: home,
    }
}

pub fn test_key(id: &str, seed: u8) -> Key {
    let secp = Secp256k1::new();
    let secret = SecretKey::from_slice(&[seed; 32]).expect("seed byte must be non-zero");
    Key {
        id: id.to_string(),
        role: KeyRole::Master,
        pubkey: PublicKey::from_secret_key(&secp, &secret),
    }
}

/// A deterministic outpoint. Outpoints made from ascending seeds sort in
/// ascending store order.
pub fn test_outpoint(seed: u8, vout: u32) -> OutPoint {
    OutPoint {
        txid: Txid::from_byte_array([seed; 32]),
        vout,
    }
}

pub fn outpoint_info(seed: u8, amount: u64, address: &str) -> OutPointInfo {
    OutPointInfo::new(test_outpoint(seed, 0), amount, address)
}

/// A spendable regtest address to withdraw to.
pub fn recipient_btc_address(seed: u8) -> String {
    let script = Builder::new().push_slice([seed; 20]).into_script();
    Address::p2wsh(&script, Network::Regtest).to_string()
}
