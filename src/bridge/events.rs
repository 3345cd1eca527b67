use serde::{Deserialize, Serialize};

use crate::tss::KeyId;
use crate::vote::PollKey;

/// State changes worth reporting to the outside, emitted in the order the
/// corresponding mutations were committed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum BridgeEvent {
    LinkEstablished {
        deposit_address: String,
        destination_chain: String,
        destination_address: String,
        key_id: KeyId,
    },
    ConfirmationStarted {
        out_point: String,
        address: String,
        amount: u64,
        poll: PollKey,
        confirmation_height: u64,
    },
    OutpointConfirmed {
        out_point: String,
        address: String,
        amount: u64,
    },
    OutpointRejected {
        out_point: String,
        poll: PollKey,
    },
    WithdrawalFailed {
        address: String,
        amount: u64,
        min_amount: u64,
    },
    ConsolidationCreated {
        tx_id: String,
        input_count: usize,
        output_count: usize,
        fee: u64,
        change: u64,
    },
    SigningAborted {
        tx_id: String,
        key_id: KeyId,
    },
    ConsolidationSigned {
        tx_id: String,
    },
}
