use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Validator voting power frozen at a counter. Snapshots are immutable once
/// taken; polls and signing sessions refer to them by counter so that later
/// stake changes cannot shift an open vote.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub counter: u64,
    /// validator address to share count, iterated in address order
    pub participants: BTreeMap<String, u64>,
}

impl Snapshot {
    pub fn new(counter: u64, participants: BTreeMap<String, u64>) -> Self {
        Self {
            counter,
            participants,
        }
    }

    pub fn total_share_count(&self) -> u64 {
        self.participants.values().sum()
    }

    pub fn share_count_of(&self, validator: &str) -> u64 {
        self.participants.get(validator).copied().unwrap_or(0)
    }
}
