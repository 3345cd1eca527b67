use tracing::info;

use crate::nexus::{Asset, CrossChainAddress, TransferState};
use crate::tss::{KeyId, KeyRole};
use crate::vote::{PollKey, VoteData, VoteError};

use super::address::{AddressInfo, AddressRole};
use super::builder::plan_consolidation;
use super::deps::{Nexus, Signer, Snapshotter, Voter};
use super::error::BridgeError;
use super::events::BridgeEvent;
use super::tx::{p2wsh_sig_hash, SigRequirement, UnsignedTx};
use super::types::{OutPointInfo, OutPointState, CHAIN_NAME, SATOSHI};
use super::Bridge;

#[derive(Debug, Clone)]
pub struct LinkRequest {
    pub recipient_chain: String,
    pub recipient_address: String,
}

#[derive(Debug, Clone)]
pub struct LinkResponse {
    pub deposit_address: String,
}

#[derive(Debug, Clone)]
pub struct ConfirmOutpointRequest {
    pub info: OutPointInfo,
}

#[derive(Debug, Clone)]
pub struct VoteConfirmOutpointRequest {
    pub voter: String,
    pub poll: PollKey,
    pub out_point: String,
    pub confirmed: bool,
}

#[derive(Debug, Clone)]
pub struct SignPendingTransfersRequest {
    pub key_id: KeyId,
    /// 0 selects the configured minimum output amount
    pub min_amount: u64,
}

/// What a tallied vote amounted to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VoteResult {
    AlreadyConfirmed,
    AlreadySpent,
    NotEnoughVotes,
    PollFailed,
    OutpointRejected,
    DepositConfirmed {
        destination_chain: String,
        destination_address: String,
        amount: u64,
    },
    ConsolidationConfirmed {
        key_id: KeyId,
        amount: u64,
    },
}

impl<V, S, N, X> Bridge<V, S, N, X>
where
    V: Voter,
    S: Signer,
    N: Nexus,
    X: Snapshotter,
{
    /// Derives a fresh deposit address for the recipient and registers it,
    /// so deposits to it can later be confirmed and routed.
    pub fn link(&mut self, req: LinkRequest) -> Result<LinkResponse, BridgeError> {
        let master_key = self
            .signer
            .get_current_key(CHAIN_NAME, KeyRole::Master)
            .ok_or(BridgeError::MasterKeyNotSet)?;

        let chain = self
            .nexus
            .get_chain(&req.recipient_chain)
            .ok_or_else(|| BridgeError::UnknownChain(req.recipient_chain.clone()))?;
        if !self.nexus.is_asset_registered(&chain.name, SATOSHI) {
            return Err(BridgeError::AssetNotRegistered {
                asset: SATOSHI.to_string(),
                chain: chain.name,
            });
        }

        let recipient = CrossChainAddress::new(chain.name, req.recipient_address);
        let deposit = AddressInfo::new_deposit_address(&master_key, &recipient, self.params.network);

        self.nexus
            .link_addresses(
                CrossChainAddress::new(CHAIN_NAME, deposit.address.clone()),
                recipient.clone(),
            )
            .map_err(|e| BridgeError::LinkFailed(e.to_string()))?;
        self.store.set_address_info(&deposit);

        info!("deposit address {} linked to {}", deposit.address, recipient);
        self.emit(BridgeEvent::LinkEstablished {
            deposit_address: deposit.address.clone(),
            destination_chain: recipient.chain,
            destination_address: recipient.address,
            key_id: deposit.key_id.clone(),
        });

        Ok(LinkResponse {
            deposit_address: deposit.address,
        })
    }

    /// Opens a confirmation poll for the given outpoint. The returned key
    /// is what votes must reference.
    pub fn confirm_outpoint(
        &mut self,
        block_height: u64,
        req: ConfirmOutpointRequest,
    ) -> Result<PollKey, BridgeError> {
        req.info.validate()?;

        match self.store.outpoint_info(&req.info.out_point) {
            Some((_, OutPointState::Confirmed)) => {
                return Err(BridgeError::AlreadyConfirmed(req.info.out_point))
            }
            Some((_, OutPointState::Spent)) => {
                return Err(BridgeError::AlreadySpent(req.info.out_point))
            }
            None => {}
        }

        if self.store.address_info(&req.info.address).is_none() {
            return Err(BridgeError::UnknownOutpointAddress);
        }

        let master_key = self
            .signer
            .get_current_key(CHAIN_NAME, KeyRole::Master)
            .ok_or(BridgeError::MasterKeyNotSet)?;
        let counter = self
            .signer
            .get_snapshot_counter_for_key(&master_key.id)
            .ok_or_else(|| BridgeError::NoSnapshotCounter(master_key.id.clone()))?;

        let poll = Self::poll_key_for(&req.info);
        self.voter.init_poll(
            poll.clone(),
            counter,
            block_height + self.params.revote_locking_period,
            self.params.voting_threshold,
            self.params.min_voter_count,
        )?;
        self.store.set_pending_outpoint(&poll, &req.info);

        info!("confirmation of outpoint {} started", req.info.out_point);
        self.emit(BridgeEvent::ConfirmationStarted {
            out_point: req.info.out_point.clone(),
            address: req.info.address.clone(),
            amount: req.info.amount,
            poll: poll.clone(),
            confirmation_height: self.params.confirmation_height,
        });

        Ok(poll)
    }

    /// Tallies one validator's vote and, once the poll is decided, commits
    /// the outcome: deposits are enqueued as cross-chain transfers,
    /// consolidation top-ups reduce the unconfirmed balance.
    pub fn vote_confirm_outpoint(
        &mut self,
        block_height: u64,
        req: VoteConfirmOutpointRequest,
    ) -> Result<VoteResult, BridgeError> {
        let confirmed_before = self.store.outpoint_info(&req.out_point);
        let pending = self.store.pending_outpoint(&req.poll);

        // a vote on an already committed outpoint may still have to clean
        // up the pending record, but only if it belongs to the same poll
        if let Some((info, state)) = confirmed_before {
            let same_poll = pending
                .as_ref()
                .map(|p| p.out_point == info.out_point)
                .unwrap_or(false);
            if same_poll {
                self.store.delete_pending_outpoint(&req.poll);
            }
            return match state {
                OutPointState::Confirmed => Ok(VoteResult::AlreadyConfirmed),
                OutPointState::Spent => Ok(VoteResult::AlreadySpent),
            };
        }

        let pending =
            pending.ok_or_else(|| BridgeError::NoOutpointForPoll(req.poll.to_string()))?;
        if pending.out_point != req.out_point {
            return Err(BridgeError::PollMismatch {
                out_point: req.out_point,
                poll: req.poll.to_string(),
            });
        }

        match self.voter.tally_vote(
            &req.voter,
            &req.poll,
            VoteData::Confirmed(req.confirmed),
            block_height,
        ) {
            Ok(()) => {}
            Err(VoteError::Expired(_)) => {
                self.store.delete_pending_outpoint(&req.poll);
                self.voter.delete_poll(&req.poll);
                info!("poll {} expired before reaching a result", req.poll);
                return Ok(VoteResult::PollFailed);
            }
            Err(e) => return Err(e.into()),
        }

        let confirmed = match self.voter.result(&req.poll) {
            None => return Ok(VoteResult::NotEnoughVotes),
            Some(VoteData::Confirmed(confirmed)) => confirmed,
        };

        if !confirmed {
            self.store.delete_pending_outpoint(&req.poll);
            self.voter.delete_poll(&req.poll);
            info!("outpoint {} was discarded", pending.out_point);
            self.emit(BridgeEvent::OutpointRejected {
                out_point: pending.out_point,
                poll: req.poll,
            });
            return Ok(VoteResult::OutpointRejected);
        }

        // all fallible steps happen before any state is written, so a
        // failed commit can be retried with another vote
        let address = self
            .store
            .address_info(&pending.address)
            .ok_or(BridgeError::UnknownOutpointAddress)?;

        let result = match address.role {
            AddressRole::Deposit => {
                let sender = CrossChainAddress::new(CHAIN_NAME, pending.address.clone());
                let recipient = self
                    .nexus
                    .enqueue_for_transfer(sender, Asset::new(SATOSHI, pending.amount))
                    .map_err(|e| BridgeError::EnqueueFailed(e.to_string()))?;
                VoteResult::DepositConfirmed {
                    destination_chain: recipient.chain,
                    destination_address: recipient.address,
                    amount: pending.amount,
                }
            }
            AddressRole::Consolidation => {
                let unconfirmed = self.store.unconfirmed_amount(&address.key_id);
                self.store.set_unconfirmed_amount(
                    &address.key_id,
                    unconfirmed.saturating_sub(pending.amount),
                );
                VoteResult::ConsolidationConfirmed {
                    key_id: address.key_id,
                    amount: pending.amount,
                }
            }
            AddressRole::None => {
                return Err(BridgeError::UnknownAddressRole(pending.address))
            }
        };

        self.voter.delete_poll(&req.poll);
        self.store.delete_pending_outpoint(&req.poll);
        self.store.set_outpoint_info(&pending, OutPointState::Confirmed);

        info!("outpoint {} was confirmed", pending.out_point);
        self.emit(BridgeEvent::OutpointConfirmed {
            out_point: pending.out_point,
            address: pending.address,
            amount: pending.amount,
        });

        Ok(result)
    }

    /// Builds the consolidation transaction for all confirmed deposits and
    /// pending transfers and starts a signing session per input. Nothing is
    /// persisted unless every session could be started.
    pub fn sign_pending_transfers(
        &mut self,
        req: SignPendingTransfersRequest,
    ) -> Result<(), BridgeError> {
        // a consolidation still being signed blocks a new one; an aborted
        // one is replaced and passes its re-confirmation duty on
        let aborted = match self.store.unsigned_tx() {
            Some(tx) if tx.is_signing() => return Err(BridgeError::ConsolidationInProgress),
            Some(tx) => Some(tx),
            None => None,
        };

        let key = self
            .signer
            .get_key(&req.key_id)
            .ok_or_else(|| BridgeError::UnknownKey(req.key_id.clone()))?;
        let master_key = self
            .signer
            .get_current_key(CHAIN_NAME, KeyRole::Master)
            .ok_or(BridgeError::MasterKeyNotSet)?;
        if key.id != master_key.id {
            return Err(BridgeError::NotMasterKey(key.id));
        }

        if self.store.unconfirmed_amount(&master_key.id) > 0 {
            return Err(BridgeError::PreviousConsolidationNotConfirmed);
        }

        let min_amount = if req.min_amount == 0 {
            self.params.min_output_amount
        } else {
            req.min_amount
        };

        let next_key = self.signer.get_next_key(CHAIN_NAME, KeyRole::Master);
        let rotate_key = next_key.is_some();
        let change_key = next_key.unwrap_or(master_key);

        let pending = self
            .nexus
            .get_transfers_for_chain(CHAIN_NAME, TransferState::Pending);
        let plan = plan_consolidation(&self.store, &self.params, pending, min_amount, &change_key)?;

        // start every signing session before anything is persisted
        let mut sig_requirements = Vec::with_capacity(plan.out_points.len());
        for (i, out_point) in plan.out_points.iter().enumerate() {
            let sig_hash = p2wsh_sig_hash(&plan.tx, i, out_point)
                .map_err(|e| BridgeError::SigningFailed(e.to_string()))?;
            let requirement = SigRequirement {
                key_id: out_point.address.key_id.clone(),
                sig_hash,
            };

            let counter = self
                .signer
                .get_snapshot_counter_for_key(&requirement.key_id)
                .ok_or_else(|| BridgeError::NoSnapshotCounter(requirement.key_id.clone()))?;
            let snapshot = self
                .snapshotter
                .get_snapshot(counter)
                .ok_or(BridgeError::SnapshotNotFound(counter))?;

            self.signer
                .start_sign(
                    &mut self.voter,
                    &requirement.key_id,
                    &requirement.sig_id(),
                    sig_hash,
                    &snapshot,
                )
                .map_err(|e| BridgeError::SigningFailed(e.to_string()))?;

            sig_requirements.push(requirement);
        }

        for out_point in &plan.out_points {
            self.store
                .set_outpoint_info(&out_point.info, OutPointState::Spent);
        }
        for transfer in &plan.archived {
            self.nexus.archive_pending_transfer(transfer);
        }
        for (address, amount) in &plan.dust_stored {
            self.store.set_dust_amount(address, *amount);
        }
        for address in &plan.dust_cleared {
            self.store.delete_dust_amount(address);
        }
        self.store.set_address_info(&plan.change_address);

        let mut unsigned = UnsignedTx::new(plan.tx, sig_requirements, 0, 1, rotate_key);
        if let Some(aborted) = aborted {
            unsigned.confirmation_required = aborted.confirmation_required;
            unsigned.prev_aborted_key_id = aborted.prev_aborted_key_id;
        }
        let tx_id = unsigned.tx.compute_txid().to_string();
        self.store.set_unsigned_tx(&unsigned);

        for event in plan.events {
            self.emit(event);
        }
        self.emit(BridgeEvent::ConsolidationCreated {
            tx_id: tx_id.clone(),
            input_count: unsigned.tx.input.len(),
            output_count: unsigned.tx.output.len(),
            fee: plan.fee,
            change: plan.change,
        });
        info!(
            "consolidation transaction {} created, awaiting {} signatures",
            tx_id,
            unsigned.sig_requirements.len()
        );

        Ok(())
    }
}
