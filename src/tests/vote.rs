use std::collections::BTreeMap;

use tempfile::TempDir;

use crate::bridge::deps::Voter;
use crate::helper::store::DefaultStore;
use crate::mock::MockSnapshotter;
use crate::snapshot::Snapshot;
use crate::vote::{PollKeeper, PollKey, Threshold, VoteData, VoteError};

const MAJORITY: Threshold = Threshold {
    numerator: 1,
    denominator: 2,
};

fn snapshot() -> Snapshot {
    let mut participants = BTreeMap::new();
    participants.insert("validator1".to_string(), 60);
    participants.insert("validator2".to_string(), 30);
    participants.insert("validator3".to_string(), 10);
    Snapshot::new(1, participants)
}

fn keeper() -> (PollKeeper<MockSnapshotter>, TempDir) {
    let testdir = TempDir::new().expect("Unable to create test directory!");
    let mut snapshots = MockSnapshotter::new();
    snapshots.register(snapshot());
    let keeper = PollKeeper::new(DefaultStore::new(testdir.path().join("polls")), snapshots);
    (keeper, testdir)
}

fn poll_key() -> PollKey {
    PollKey::new("bitcoin", "txid:0_addr_1000")
}

#[test]
fn test_threshold_is_strictly_greater() {
    let threshold = Threshold {
        numerator: 15,
        denominator: 100,
    };
    assert!(!threshold.is_met(15, 100));
    assert!(threshold.is_met(16, 100));
    // the comparison must not overflow on large share counts
    assert!(threshold.is_met(u64::MAX, u64::MAX));
}

#[test]
fn test_poll_decides_once_threshold_met() {
    let (mut keeper, _dir) = keeper();
    let key = poll_key();
    keeper.init_poll(key.clone(), 1, 100, MAJORITY, 1).unwrap();

    keeper
        .tally_vote("validator2", &key, VoteData::Confirmed(true), 10)
        .unwrap();
    assert_eq!(keeper.result(&key), None);

    keeper
        .tally_vote("validator1", &key, VoteData::Confirmed(true), 11)
        .unwrap();
    assert_eq!(keeper.result(&key), Some(VoteData::Confirmed(true)));
}

#[test]
fn test_poll_requires_min_voter_count() {
    let (mut keeper, _dir) = keeper();
    let key = poll_key();
    keeper.init_poll(key.clone(), 1, 100, MAJORITY, 2).unwrap();

    // validator1 alone clears the threshold but not the voter count
    keeper
        .tally_vote("validator1", &key, VoteData::Confirmed(true), 10)
        .unwrap();
    assert_eq!(keeper.result(&key), None);

    keeper
        .tally_vote("validator3", &key, VoteData::Confirmed(true), 11)
        .unwrap();
    assert_eq!(keeper.result(&key), Some(VoteData::Confirmed(true)));
}

#[test]
fn test_conflicting_votes_resolve_to_heaviest() {
    let (mut keeper, _dir) = keeper();
    let key = poll_key();
    let quarter = Threshold {
        numerator: 1,
        denominator: 4,
    };
    // two voters required, so the poll is still open when the second,
    // heavier vote arrives
    keeper.init_poll(key.clone(), 1, 100, quarter, 2).unwrap();

    keeper
        .tally_vote("validator2", &key, VoteData::Confirmed(true), 10)
        .unwrap();
    keeper
        .tally_vote("validator1", &key, VoteData::Confirmed(false), 11)
        .unwrap();

    // both sides cleared 25%, the heavier one wins
    assert_eq!(keeper.result(&key), Some(VoteData::Confirmed(false)));
}

#[test]
fn test_decided_poll_ignores_late_votes() {
    let (mut keeper, _dir) = keeper();
    let key = poll_key();
    keeper.init_poll(key.clone(), 1, 100, MAJORITY, 1).unwrap();

    keeper
        .tally_vote("validator1", &key, VoteData::Confirmed(true), 10)
        .unwrap();
    assert_eq!(keeper.result(&key), Some(VoteData::Confirmed(true)));

    keeper
        .tally_vote("validator2", &key, VoteData::Confirmed(false), 11)
        .unwrap();
    assert_eq!(keeper.result(&key), Some(VoteData::Confirmed(true)));
}

#[test]
fn test_vote_validation() {
    let (mut keeper, _dir) = keeper();
    let key = poll_key();

    assert_eq!(
        keeper.tally_vote("validator1", &key, VoteData::Confirmed(true), 10),
        Err(VoteError::NotFound(key.to_string()))
    );

    keeper.init_poll(key.clone(), 1, 100, MAJORITY, 2).unwrap();
    assert_eq!(
        keeper.init_poll(key.clone(), 1, 100, MAJORITY, 2),
        Err(VoteError::AlreadyExists(key.to_string()))
    );

    assert_eq!(
        keeper.tally_vote("stranger", &key, VoteData::Confirmed(true), 10),
        Err(VoteError::NotEligible {
            voter: "stranger".to_string(),
            poll: key.to_string(),
        })
    );

    keeper
        .tally_vote("validator1", &key, VoteData::Confirmed(true), 10)
        .unwrap();
    assert_eq!(
        keeper.tally_vote("validator1", &key, VoteData::Confirmed(false), 11),
        Err(VoteError::AlreadyVoted {
            voter: "validator1".to_string(),
            poll: key.to_string(),
        })
    );
}

#[test]
fn test_vote_on_expired_poll() {
    let (mut keeper, _dir) = keeper();
    let key = poll_key();
    keeper.init_poll(key.clone(), 1, 50, MAJORITY, 1).unwrap();

    keeper
        .tally_vote("validator2", &key, VoteData::Confirmed(true), 49)
        .unwrap();
    assert_eq!(
        keeper.tally_vote("validator1", &key, VoteData::Confirmed(true), 50),
        Err(VoteError::Expired(key.to_string()))
    );
    assert_eq!(keeper.result(&key), None);
}

#[test]
fn test_missing_snapshot_blocks_vote() {
    let testdir = TempDir::new().expect("Unable to create test directory!");
    let mut keeper = PollKeeper::new(
        DefaultStore::new(testdir.path().join("polls")),
        MockSnapshotter::new(),
    );

    let key = poll_key();
    keeper.init_poll(key.clone(), 9, 100, MAJORITY, 1).unwrap();
    assert_eq!(
        keeper.tally_vote("validator1", &key, VoteData::Confirmed(true), 10),
        Err(VoteError::NoSnapshot(9))
    );
}

#[test]
fn test_delete_poll_allows_reinit() {
    let (mut keeper, _dir) = keeper();
    let key = poll_key();
    keeper.init_poll(key.clone(), 1, 100, MAJORITY, 1).unwrap();
    assert!(keeper.poll(&key).is_some());

    keeper.delete_poll(&key);
    assert!(keeper.poll(&key).is_none());
    keeper.init_poll(key, 1, 100, MAJORITY, 1).unwrap();
}
