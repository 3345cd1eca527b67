use anyhow::Result;

use crate::nexus::{Asset, Chain, CrossChainAddress, CrossChainTransfer, TransferState};
use crate::snapshot::Snapshot;
use crate::tss::{Key, KeyRole, SigStatus};
use crate::vote::{PollKey, Threshold, VoteData, VoteError};

/// Poll lifecycle as consumed by the confirmation workflows.
pub trait Voter {
    /// Fails if a poll with the same key already exists.
    fn init_poll(
        &mut self,
        key: PollKey,
        snapshot_counter: u64,
        expires_at: u64,
        voting_threshold: Threshold,
        min_voter_count: u64,
    ) -> Result<(), VoteError>;

    /// Accumulates a weighted vote. Votes on already decided polls are
    /// accepted without changing the result.
    fn tally_vote(
        &mut self,
        voter: &str,
        key: &PollKey,
        data: VoteData,
        block_height: u64,
    ) -> Result<(), VoteError>;

    /// None means the poll has not been decided yet.
    fn result(&self, key: &PollKey) -> Option<VoteData>;

    fn delete_poll(&mut self, key: &PollKey);
}

/// Facade over the threshold-signing subsystem. Signing is asynchronous:
/// `start_sign` registers a session and returns, the signature shows up
/// later via `get_sig`.
pub trait Signer {
    fn get_current_key(&self, chain: &str, role: KeyRole) -> Option<Key>;

    fn get_next_key(&self, chain: &str, role: KeyRole) -> Option<Key>;

    fn get_key(&self, key_id: &str) -> Option<Key>;

    fn get_snapshot_counter_for_key(&self, key_id: &str) -> Option<u64>;

    fn start_sign(
        &mut self,
        init_poller: &mut dyn Voter,
        key_id: &str,
        sig_id: &str,
        msg_hash: [u8; 32],
        snapshot: &Snapshot,
    ) -> Result<()>;

    fn get_sig(&self, sig_id: &str) -> SigStatus;

    fn rotate_key(&mut self, chain: &str, role: KeyRole) -> Result<()>;
}

/// Cross-chain transfer registry shared by all bridged chains.
pub trait Nexus {
    fn get_chain(&self, name: &str) -> Option<Chain>;

    fn is_asset_registered(&self, chain: &str, denom: &str) -> bool;

    fn link_addresses(
        &mut self,
        sender: CrossChainAddress,
        recipient: CrossChainAddress,
    ) -> Result<()>;

    /// Queues a transfer of the given asset from the sender's linked
    /// recipient and returns that recipient. Fails if no link exists.
    fn enqueue_for_transfer(
        &mut self,
        sender: CrossChainAddress,
        asset: Asset,
    ) -> Result<CrossChainAddress>;

    /// Transfers bound for the given destination chain, in ascending id
    /// order.
    fn get_transfers_for_chain(&self, chain: &str, state: TransferState)
        -> Vec<CrossChainTransfer>;

    fn archive_pending_transfer(&mut self, transfer: &CrossChainTransfer);
}

/// Access to historical validator sets and their stake weights.
pub trait Snapshotter {
    fn get_snapshot(&self, counter: u64) -> Option<Snapshot>;
}
