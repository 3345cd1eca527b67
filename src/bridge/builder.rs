use std::collections::BTreeMap;

use bitcoin::address::NetworkUnchecked;
use bitcoin::{Address, Amount, Network, OutPoint, ScriptBuf, Transaction, TxOut};
use tracing::{error, info};

use crate::nexus::CrossChainTransfer;
use crate::tss::Key;

use super::address::{AddressInfo, AddressRole};
use super::error::BridgeError;
use super::events::BridgeEvent;
use super::params::Params;
use super::store::BridgeStore;
use super::tx::{create_tx, estimate_tx_size, OutPointToSign};
use super::types::{OutPointInfo, OutPointState, MIN_RELAY_TX_FEE_SAT_PER_VBYTE};

/// The outcome of planning a consolidation transaction. Nothing has been
/// persisted yet; the caller commits the plan only once every signing
/// session could be started.
#[derive(Debug)]
pub struct TxPlan {
    /// Change at output index 0, anyone-can-spend at index 1, withdrawals
    /// after that.
    pub tx: Transaction,
    /// Selected inputs in the same order as `tx.input`.
    pub out_points: Vec<OutPointToSign>,
    pub change: u64,
    pub fee: u64,
    pub change_address: AddressInfo,
    /// Transfers consumed by this plan, either paid out or converted to dust.
    pub archived: Vec<CrossChainTransfer>,
    /// Recipients whose combined amount stayed below the minimum, with the
    /// amount to carry forward.
    pub dust_stored: Vec<(String, u64)>,
    /// Recipients whose carried dust is paid out by this plan.
    pub dust_cleared: Vec<String>,
    pub events: Vec<BridgeEvent>,
}

/// Batches all confirmed deposits and pending transfers into a single
/// transaction paying the minimum relay fee rate.
pub fn plan_consolidation(
    store: &BridgeStore,
    params: &Params,
    pending_transfers: Vec<CrossChainTransfer>,
    min_amount: u64,
    change_key: &Key,
) -> Result<TxPlan, BridgeError> {
    let (out_points, input_total) = prepare_inputs(store, params)?;
    let prev_outs = out_points
        .iter()
        .map(|out_point| out_point.info.to_outpoint())
        .collect::<Result<Vec<OutPoint>, _>>()?;

    let change_address = AddressInfo::new_consolidation_address(change_key, params.network);
    let change_script = change_address.script_pubkey(params.network);
    let anyone_can_spend = AddressInfo::new_anyone_can_spend_address(params.network);

    let mut outputs = vec![TxOut {
        value: Amount::from_sat(min_amount),
        script_pubkey: anyone_can_spend.script_pubkey(params.network),
    }];
    let mut outputs_total = min_amount;
    let mut withdrawal_count = 0usize;
    let mut archived = Vec::new();
    let mut dust_stored = Vec::new();
    let mut dust_cleared = Vec::new();
    let mut events = Vec::new();

    for (address, script_pubkey, transfers) in merge_by_recipient(pending_transfers, params.network)
    {
        let dust = store.dust_amount(&address);
        let amount = transfers.iter().map(|t| t.asset.amount).sum::<u64>() + dust;

        if amount < min_amount {
            events.push(BridgeEvent::WithdrawalFailed {
                address: address.clone(),
                amount,
                min_amount,
            });
            dust_stored.push((address, amount));
            archived.extend(transfers);
            continue;
        }

        // output size does not depend on the amount, so the candidate and
        // the change can be sized at zero value
        let mut sized = outputs.clone();
        sized.push(TxOut {
            value: Amount::ZERO,
            script_pubkey: script_pubkey.clone(),
        });
        sized.push(TxOut {
            value: Amount::ZERO,
            script_pubkey: change_script.clone(),
        });
        if estimate_tx_size(&create_tx(&prev_outs, sized), &out_points) > params.max_tx_size {
            break;
        }

        if dust > 0 {
            dust_cleared.push(address.clone());
        }
        outputs_total += amount;
        withdrawal_count += 1;
        outputs.push(TxOut {
            value: Amount::from_sat(amount),
            script_pubkey,
        });
        archived.extend(transfers);
    }

    if withdrawal_count == 0 {
        info!("creating consolidation transaction without any withdrawals");
    }

    let mut sized = outputs.clone();
    sized.push(TxOut {
        value: Amount::ZERO,
        script_pubkey: change_script.clone(),
    });
    let tx_size = estimate_tx_size(&create_tx(&prev_outs, sized), &out_points);
    // consolidation transactions always pay 1 sat/vbyte, the default
    // minimum relay fee rate of bitcoin-core
    let fee = tx_size * MIN_RELAY_TX_FEE_SAT_PER_VBYTE;

    let change = input_total as i128 - outputs_total as i128 - fee as i128;
    if change <= 0 {
        return Err(BridgeError::InsufficientDeposits {
            deposits: input_total,
            withdrawals: outputs_total,
            fee,
        });
    }

    outputs.insert(
        0,
        TxOut {
            value: Amount::from_sat(change as u64),
            script_pubkey: change_script,
        },
    );
    let tx = create_tx(&prev_outs, outputs);

    Ok(TxPlan {
        tx,
        out_points,
        change: change as u64,
        fee,
        change_address,
        archived,
        dust_stored,
        dust_cleared,
        events,
    })
}

/// Selects confirmed outpoints up to the input cap. The change outpoint of
/// the previous consolidation, when one is recorded, must be confirmed and
/// is always selected first; remaining capacity fills in ascending outpoint
/// order.
fn prepare_inputs(
    store: &BridgeStore,
    params: &Params,
) -> Result<(Vec<OutPointToSign>, u64), BridgeError> {
    let mut out_points = Vec::new();
    let mut total = 0u64;

    let latest = store.latest_consolidation_out_point();
    if let Some(out_point) = &latest {
        let info = match store.outpoint_info(out_point) {
            Some((info, OutPointState::Confirmed)) => info,
            _ => return Err(BridgeError::PreviousConsolidationNotConfirmed),
        };
        let address = input_address(store, &info)?;
        total += info.amount;
        out_points.push(OutPointToSign { info, address });
    }

    for info in store.confirmed_outpoints() {
        if out_points.len() >= params.max_input_count {
            break;
        }
        if latest.as_deref() == Some(info.out_point.as_str()) {
            continue;
        }

        let address = input_address(store, &info)?;
        total += info.amount;
        out_points.push(OutPointToSign { info, address });
    }

    Ok((out_points, total))
}

fn input_address(store: &BridgeStore, info: &OutPointInfo) -> Result<AddressInfo, BridgeError> {
    let address = store
        .address_info(&info.address)
        .ok_or_else(|| BridgeError::InputAddressUnknown(info.out_point.clone()))?;
    match address.role {
        AddressRole::Deposit | AddressRole::Consolidation => Ok(address),
        AddressRole::None => Err(BridgeError::InputKeyUnknown(info.out_point.clone())),
    }
}

/// Groups transfers by decoded recipient address, preserving the order in
/// which each recipient first appears. Transfers with undecodable
/// recipients are left untouched.
fn merge_by_recipient(
    transfers: Vec<CrossChainTransfer>,
    network: Network,
) -> Vec<(String, ScriptBuf, Vec<CrossChainTransfer>)> {
    let mut order = Vec::new();
    let mut merged: BTreeMap<String, (ScriptBuf, Vec<CrossChainTransfer>)> = BTreeMap::new();

    for transfer in transfers {
        let (address, script_pubkey) = match decode_recipient(&transfer.recipient.address, network)
        {
            Some(decoded) => decoded,
            None => {
                error!("{} is not a valid address", transfer.recipient.address);
                continue;
            }
        };

        match merged.get_mut(&address) {
            Some((_, transfers)) => transfers.push(transfer),
            None => {
                order.push(address.clone());
                merged.insert(address, (script_pubkey, vec![transfer]));
            }
        }
    }

    order
        .into_iter()
        .filter_map(|address| {
            merged
                .remove(&address)
                .map(|(script_pubkey, transfers)| (address, script_pubkey, transfers))
        })
        .collect()
}

fn decode_recipient(address: &str, network: Network) -> Option<(String, ScriptBuf)> {
    let address = address
        .parse::<Address<NetworkUnchecked>>()
        .ok()?
        .require_network(network)
        .ok()?;
    Some((address.to_string(), address.script_pubkey()))
}
