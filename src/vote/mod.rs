use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::bridge::deps::{Snapshotter, Voter};
use crate::helper::store::{DefaultStore, Store};
use crate::snapshot::Snapshot;

/// Fraction of the total voting power that must be exceeded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Threshold {
    pub numerator: u64,
    pub denominator: u64,
}

impl Threshold {
    /// share / total > numerator / denominator, compared in integers
    pub fn is_met(&self, share: u64, total: u64) -> bool {
        u128::from(share) * u128::from(self.denominator)
            > u128::from(total) * u128::from(self.numerator)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PollKey {
    pub module: String,
    pub id: String,
}

impl PollKey {
    pub fn new(module: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            module: module.into(),
            id: id.into(),
        }
    }
}

impl fmt::Display for PollKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.module, self.id)
    }
}

/// The fact a poll decides on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum VoteData {
    Confirmed(bool),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum VoteError {
    #[error("poll {0} already exists")]
    AlreadyExists(String),
    #[error("poll {0} does not exist")]
    NotFound(String),
    #[error("poll {0} has expired")]
    Expired(String),
    #[error("voter {voter} is not eligible to vote in poll {poll}")]
    NotEligible { voter: String, poll: String },
    #[error("voter {voter} has already voted in poll {poll}")]
    AlreadyVoted { voter: String, poll: String },
    #[error("no snapshot found for counter {0}")]
    NoSnapshot(u64),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Poll {
    pub key: PollKey,
    pub snapshot_counter: u64,
    pub expires_at: u64,
    pub voting_threshold: Threshold,
    pub min_voter_count: u64,
    pub votes: BTreeMap<String, VoteData>,
    pub result: Option<VoteData>,
}

impl Poll {
    pub fn is_expired(&self, block_height: u64) -> bool {
        block_height >= self.expires_at
    }

    /// Decide the poll if some value's accumulated weight crosses the
    /// threshold and enough voters participated. Ties between qualifying
    /// values resolve to the heaviest, then smallest, value.
    fn decide(&mut self, snapshot: &Snapshot) {
        if (self.votes.len() as u64) < self.min_voter_count {
            return;
        }

        let mut tally: BTreeMap<VoteData, u64> = BTreeMap::new();
        for (voter, data) in &self.votes {
            *tally.entry(*data).or_default() += snapshot.share_count_of(voter);
        }

        let total = snapshot.total_share_count();
        let mut winner: Option<(VoteData, u64)> = None;
        for (data, share) in tally {
            if !self.voting_threshold.is_met(share, total) {
                continue;
            }
            match winner {
                Some((_, best)) if best >= share => {}
                _ => winner = Some((data, share)),
            }
        }

        if let Some((data, _)) = winner {
            self.result = Some(data);
        }
    }
}

/// Keeper of all polls. Votes are weighed by the snapshot the poll was
/// initialized with, one vote per validator.
pub struct PollKeeper<S: Snapshotter> {
    polls: DefaultStore<String, Poll>,
    snapshots: S,
}

impl<S: Snapshotter> PollKeeper<S> {
    pub fn new(polls: DefaultStore<String, Poll>, snapshots: S) -> Self {
        Self { polls, snapshots }
    }

    pub fn poll(&self, key: &PollKey) -> Option<Poll> {
        self.polls.get(&key.to_string())
    }
}

impl<S: Snapshotter> Voter for PollKeeper<S> {
    fn init_poll(
        &mut self,
        key: PollKey,
        snapshot_counter: u64,
        expires_at: u64,
        voting_threshold: Threshold,
        min_voter_count: u64,
    ) -> Result<(), VoteError> {
        let id = key.to_string();
        if self.polls.exists(&id) {
            return Err(VoteError::AlreadyExists(id));
        }

        let poll = Poll {
            key,
            snapshot_counter,
            expires_at,
            voting_threshold,
            min_voter_count,
            votes: BTreeMap::new(),
            result: None,
        };
        self.polls.save(&id, &poll);
        Ok(())
    }

    fn tally_vote(
        &mut self,
        voter: &str,
        key: &PollKey,
        data: VoteData,
        block_height: u64,
    ) -> Result<(), VoteError> {
        let id = key.to_string();
        let mut poll = self.polls.get(&id).ok_or(VoteError::NotFound(id.clone()))?;

        // late votes on a decided poll are no-ops
        if poll.result.is_some() {
            debug!("poll {} already decided, ignoring vote from {}", key, voter);
            return Ok(());
        }

        if poll.is_expired(block_height) {
            return Err(VoteError::Expired(id));
        }

        let snapshot = self
            .snapshots
            .get_snapshot(poll.snapshot_counter)
            .ok_or(VoteError::NoSnapshot(poll.snapshot_counter))?;

        if snapshot.share_count_of(voter) == 0 {
            return Err(VoteError::NotEligible {
                voter: voter.to_string(),
                poll: id,
            });
        }
        if poll.votes.contains_key(voter) {
            return Err(VoteError::AlreadyVoted {
                voter: voter.to_string(),
                poll: id,
            });
        }

        poll.votes.insert(voter.to_string(), data);
        poll.decide(&snapshot);
        self.polls.save(&id, &poll);
        Ok(())
    }

    fn result(&self, key: &PollKey) -> Option<VoteData> {
        self.polls.get(&key.to_string())?.result
    }

    fn delete_poll(&mut self, key: &PollKey) {
        self.polls.remove(&key.to_string());
    }
}
