use crate::config::Config;
use crate::helper::store::{DefaultStore, Store};
use crate::vote::PollKey;

use super::address::AddressInfo;
use super::tx::{SignedTx, UnsignedTx};
use super::types::{OutPointInfo, OutPointState};

const UNSIGNED_TX_KEY: &str = "consolidation";
const LATEST_CONSOLIDATION_OUT_POINT: &str = "latest-consolidation-out-point";
const LATEST_SIGNED_TX: &str = "latest-signed-tx";

/// Persistent bridge state, one database per concern.
pub struct BridgeStore {
    pending: DefaultStore<String, OutPointInfo>,
    confirmed: DefaultStore<String, OutPointInfo>,
    spent: DefaultStore<String, OutPointInfo>,
    addresses: DefaultStore<String, AddressInfo>,
    dust: DefaultStore<String, u64>,
    unconfirmed: DefaultStore<String, u64>,
    unsigned: DefaultStore<String, UnsignedTx>,
    signed: DefaultStore<String, SignedTx>,
    general: DefaultStore<String, String>,
}

impl BridgeStore {
    pub fn open(conf: &Config) -> Self {
        Self {
            pending: DefaultStore::new(conf.get_database_with_name("pending-outpoints")),
            confirmed: DefaultStore::new(conf.get_database_with_name("confirmed-outpoints")),
            spent: DefaultStore::new(conf.get_database_with_name("spent-outpoints")),
            addresses: DefaultStore::new(conf.get_database_with_name("addresses")),
            dust: DefaultStore::new(conf.get_database_with_name("dust")),
            unconfirmed: DefaultStore::new(conf.get_database_with_name("unconfirmed-amounts")),
            unsigned: DefaultStore::new(conf.get_database_with_name("unsigned-txs")),
            signed: DefaultStore::new(conf.get_database_with_name("signed-txs")),
            general: DefaultStore::new(conf.get_database_with_name("general")),
        }
    }

    pub fn set_pending_outpoint(&self, poll: &PollKey, info: &OutPointInfo) {
        self.pending.save(&poll.to_string(), info);
    }

    pub fn pending_outpoint(&self, poll: &PollKey) -> Option<OutPointInfo> {
        self.pending.get(&poll.to_string())
    }

    pub fn delete_pending_outpoint(&self, poll: &PollKey) {
        self.pending.remove(&poll.to_string());
    }

    /// Moves the outpoint into the given state, clearing any previous state.
    pub fn set_outpoint_info(&self, info: &OutPointInfo, state: OutPointState) {
        match state {
            OutPointState::Confirmed => {
                self.spent.remove(&info.out_point);
                self.confirmed.save(&info.out_point, info);
            }
            OutPointState::Spent => {
                self.confirmed.remove(&info.out_point);
                self.spent.save(&info.out_point, info);
            }
        }
    }

    pub fn outpoint_info(&self, out_point: &str) -> Option<(OutPointInfo, OutPointState)> {
        if let Some(info) = self.confirmed.get(&out_point.to_owned()) {
            return Some((info, OutPointState::Confirmed));
        }
        self.spent
            .get(&out_point.to_owned())
            .map(|info| (info, OutPointState::Spent))
    }

    /// All confirmed outpoints in ascending outpoint order.
    pub fn confirmed_outpoints(&self) -> Vec<OutPointInfo> {
        self.confirmed
            .entries()
            .into_iter()
            .map(|(_, info)| info)
            .collect()
    }

    pub fn delete_outpoint_info(&self, out_point: &str) {
        self.confirmed.remove(&out_point.to_owned());
        self.spent.remove(&out_point.to_owned());
    }

    pub fn set_address_info(&self, info: &AddressInfo) {
        self.addresses.save(&info.address.to_lowercase(), info);
    }

    /// Case-insensitive lookup by encoded address.
    pub fn address_info(&self, address: &str) -> Option<AddressInfo> {
        self.addresses.get(&address.to_lowercase())
    }

    pub fn dust_amount(&self, address: &str) -> u64 {
        self.dust.get(&address.to_lowercase()).unwrap_or_default()
    }

    pub fn set_dust_amount(&self, address: &str, amount: u64) {
        self.dust.save(&address.to_lowercase(), &amount);
    }

    pub fn delete_dust_amount(&self, address: &str) {
        self.dust.remove(&address.to_lowercase());
    }

    pub fn unconfirmed_amount(&self, key_id: &str) -> u64 {
        self.unconfirmed
            .get(&key_id.to_owned())
            .unwrap_or_default()
    }

    pub fn set_unconfirmed_amount(&self, key_id: &str, amount: u64) {
        self.unconfirmed.save(&key_id.to_owned(), &amount);
    }

    pub fn unsigned_tx(&self) -> Option<UnsignedTx> {
        self.unsigned.get(&UNSIGNED_TX_KEY.to_owned())
    }

    pub fn set_unsigned_tx(&self, tx: &UnsignedTx) {
        self.unsigned.save(&UNSIGNED_TX_KEY.to_owned(), tx);
    }

    pub fn delete_unsigned_tx(&self) {
        self.unsigned.remove(&UNSIGNED_TX_KEY.to_owned());
    }

    pub fn set_signed_tx(&self, tx: &SignedTx) {
        let tx_id = tx.tx.compute_txid().to_string();
        self.signed.save(&tx_id, tx);
        self.general.save(&LATEST_SIGNED_TX.to_owned(), &tx_id);
    }

    pub fn signed_tx(&self, tx_id: &str) -> Option<SignedTx> {
        self.signed.get(&tx_id.to_owned())
    }

    pub fn latest_signed_tx(&self) -> Option<SignedTx> {
        self.general
            .get(&LATEST_SIGNED_TX.to_owned())
            .and_then(|tx_id| self.signed.get(&tx_id))
    }

    /// Outpoint of the change output of the last signed consolidation
    /// transaction. It must be spent by the next consolidation.
    pub fn latest_consolidation_out_point(&self) -> Option<String> {
        self.general.get(&LATEST_CONSOLIDATION_OUT_POINT.to_owned())
    }

    pub fn set_latest_consolidation_out_point(&self, out_point: &str) {
        self.general
            .save(&LATEST_CONSOLIDATION_OUT_POINT.to_owned(), &out_point.to_owned());
    }
}
