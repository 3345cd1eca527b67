use bitcoin::hashes::Hash;
use bitcoin::script::Builder;
use bitcoin::{Address, Network, OutPoint, Txid};
use criterion::{criterion_group, criterion_main, Criterion};
use tempfile::TempDir;

use btcbridge::bridge::address::AddressInfo;
use btcbridge::bridge::builder::plan_consolidation;
use btcbridge::bridge::store::BridgeStore;
use btcbridge::bridge::types::{OutPointInfo, OutPointState};
use btcbridge::config::Config;
use btcbridge::mock::MockSigner;
use btcbridge::nexus::{Asset, CrossChainAddress, CrossChainTransfer};
use btcbridge::tss::KeyRole;

fn recipient_address(seed: u8) -> String {
    let script = Builder::new().push_slice([seed; 20]).into_script();
    Address::p2wsh(&script, Network::Regtest).to_string()
}

/// Plans a consolidation of 50 confirmed deposits into 20 withdrawals,
/// the expected steady-state shape of a busy bridge.
fn bench_plan_consolidation(c: &mut Criterion) {
    let home = TempDir::new().expect("Unable to create bench directory!");
    let conf = Config::default(home.path().to_str().unwrap(), Network::Regtest);
    let store = BridgeStore::open(&conf);

    let mut signer = MockSigner::new();
    let master = signer.add_key("master", KeyRole::Master, 7, 1);

    let deposit = AddressInfo::new_deposit_address(
        &master,
        &CrossChainAddress::new("ethereum", "0xabc"),
        Network::Regtest,
    );
    store.set_address_info(&deposit);

    for i in 0..50u8 {
        let info = OutPointInfo::new(
            OutPoint {
                txid: Txid::from_byte_array([i + 1; 32]),
                vout: 0,
            },
            500_000,
            deposit.address.clone(),
        );
        store.set_outpoint_info(&info, OutPointState::Confirmed);
    }

    let transfers = (0..20u64)
        .map(|i| CrossChainTransfer {
            id: i,
            recipient: CrossChainAddress::new("bitcoin", recipient_address(i as u8 + 1)),
            asset: Asset::new("satoshi", 50_000),
        })
        .collect::<Vec<_>>();

    c.bench_function("plan_consolidation_50_in_20_out", |b| {
        b.iter(|| plan_consolidation(&store, &conf.params, transfers.clone(), 1000, &master).unwrap())
    });
}

criterion_group!(benches, bench_plan_consolidation);
criterion_main!(benches);
