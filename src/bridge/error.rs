use thiserror::Error;

use crate::vote::VoteError;

#[derive(Debug, Error)]
pub enum BridgeError {
    #[error("master key not set")]
    MasterKeyNotSet,
    #[error("unknown recipient chain {0}")]
    UnknownChain(String),
    #[error("asset '{asset}' not registered for chain '{chain}'")]
    AssetNotRegistered { asset: String, chain: String },
    #[error("could not link addresses: {0}")]
    LinkFailed(String),
    #[error("outpoint {0} already confirmed")]
    AlreadyConfirmed(String),
    #[error("outpoint {0} already spent")]
    AlreadySpent(String),
    #[error("outpoint address unknown, aborting deposit confirmation")]
    UnknownOutpointAddress,
    #[error("no outpoint found for poll {0}")]
    NoOutpointForPoll(String),
    #[error("outpoint {out_point} does not match poll {poll}")]
    PollMismatch { out_point: String, poll: String },
    #[error("address {0} has an unknown role")]
    UnknownAddressRole(String),
    #[error("could not enqueue transfer: {0}")]
    EnqueueFailed(String),
    #[error("consolidation in progress")]
    ConsolidationInProgress,
    #[error("unknown key {0}")]
    UnknownKey(String),
    #[error("key {0} is not the current master key")]
    NotMasterKey(String),
    #[error("previous consolidation transaction must be confirmed first")]
    PreviousConsolidationNotConfirmed,
    #[error("no snapshot counter for key ID {0} registered")]
    NoSnapshotCounter(String),
    #[error("no snapshot found for counter {0}")]
    SnapshotNotFound(u64),
    #[error("address for outpoint {0} must be known")]
    InputAddressUnknown(String),
    #[error("no signing key for the address of outpoint {0}")]
    InputKeyUnknown(String),
    #[error("not enough deposits ({deposits} sat) to make all withdrawals ({withdrawals} sat) with a transaction fee of {fee} sat")]
    InsufficientDeposits {
        deposits: u64,
        withdrawals: u64,
        fee: u64,
    },
    #[error("invalid outpoint info: {0}")]
    InvalidOutpointInfo(String),
    #[error("signing could not be started: {0}")]
    SigningFailed(String),
    #[error(transparent)]
    Vote(#[from] VoteError),
}
