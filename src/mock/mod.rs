//! In-memory stand-ins for the external collaborators, used by tests and
//! benchmarks. Signing produces real ECDSA signatures so the assembly path
//! can verify them.

use std::collections::{BTreeMap, BTreeSet};

use anyhow::{anyhow, bail, Result};
use bitcoin::secp256k1::{All, Message, PublicKey, Secp256k1, SecretKey};

use crate::bridge::deps::{Nexus, Signer, Snapshotter, Voter};
use crate::nexus::{Asset, Chain, CrossChainAddress, CrossChainTransfer, TransferState};
use crate::snapshot::Snapshot;
use crate::tss::{Key, KeyId, KeyRole, SigStatus};

struct SigningSession {
    key_id: KeyId,
    msg_hash: [u8; 32],
    status: SigStatus,
}

pub struct MockSigner {
    secp: Secp256k1<All>,
    keys: BTreeMap<KeyId, (Key, SecretKey)>,
    counters: BTreeMap<KeyId, u64>,
    current: BTreeMap<String, KeyId>,
    next: BTreeMap<String, KeyId>,
    sessions: BTreeMap<String, SigningSession>,
    /// makes the next start_sign call fail, for abort-path tests
    pub start_sign_fails: bool,
}

fn role_key(chain: &str, role: KeyRole) -> String {
    format!("{}/{}", chain, role)
}

impl MockSigner {
    pub fn new() -> Self {
        MockSigner {
            secp: Secp256k1::new(),
            keys: BTreeMap::new(),
            counters: BTreeMap::new(),
            current: BTreeMap::new(),
            next: BTreeMap::new(),
            sessions: BTreeMap::new(),
            start_sign_fails: false,
        }
    }

    /// Registers a key derived from the seed byte.
    pub fn add_key(&mut self, id: &str, role: KeyRole, seed: u8, snapshot_counter: u64) -> Key {
        let secret = SecretKey::from_slice(&[seed; 32]).expect("seed byte must be non-zero");
        let key = Key {
            id: id.to_string(),
            role,
            pubkey: PublicKey::from_secret_key(&self.secp, &secret),
        };
        self.keys.insert(key.id.clone(), (key.clone(), secret));
        self.counters.insert(key.id.clone(), snapshot_counter);
        key
    }

    pub fn set_current_key(&mut self, chain: &str, role: KeyRole, key_id: &str) {
        self.current.insert(role_key(chain, role), key_id.to_string());
    }

    pub fn set_next_key(&mut self, chain: &str, role: KeyRole, key_id: &str) {
        self.next.insert(role_key(chain, role), key_id.to_string());
    }

    /// Drops the scheduled next key so a pending rotation fails.
    pub fn clear_next_key(&mut self, chain: &str, role: KeyRole) {
        self.next.remove(&role_key(chain, role));
    }

    /// Produces the signature for every session still waiting for one.
    pub fn sign_all(&mut self) {
        for session in self.sessions.values_mut() {
            if !session.status.is_pending() {
                continue;
            }
            if let Some((_, secret)) = self.keys.get(&session.key_id) {
                let msg = Message::from_digest(session.msg_hash);
                session.status = SigStatus::Signed(self.secp.sign_ecdsa(&msg, secret));
            }
        }
    }

    pub fn set_sig_status(&mut self, sig_id: &str, status: SigStatus) {
        if let Some(session) = self.sessions.get_mut(sig_id) {
            session.status = status;
        }
    }

    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }
}

impl Default for MockSigner {
    fn default() -> Self {
        Self::new()
    }
}

impl Signer for MockSigner {
    fn get_current_key(&self, chain: &str, role: KeyRole) -> Option<Key> {
        let id = self.current.get(&role_key(chain, role))?;
        self.keys.get(id).map(|(key, _)| key.clone())
    }

    fn get_next_key(&self, chain: &str, role: KeyRole) -> Option<Key> {
        let id = self.next.get(&role_key(chain, role))?;
        self.keys.get(id).map(|(key, _)| key.clone())
    }

    fn get_key(&self, key_id: &str) -> Option<Key> {
        self.keys.get(key_id).map(|(key, _)| key.clone())
    }

    fn get_snapshot_counter_for_key(&self, key_id: &str) -> Option<u64> {
        self.counters.get(key_id).copied()
    }

    fn start_sign(
        &mut self,
        _init_poller: &mut dyn Voter,
        key_id: &str,
        sig_id: &str,
        msg_hash: [u8; 32],
        _snapshot: &Snapshot,
    ) -> Result<()> {
        if self.start_sign_fails {
            bail!("signing subsystem unavailable");
        }
        if !self.keys.contains_key(key_id) {
            bail!("unknown key {}", key_id);
        }
        if self.sessions.contains_key(sig_id) {
            bail!("signing session {} already exists", sig_id);
        }

        self.sessions.insert(
            sig_id.to_string(),
            SigningSession {
                key_id: key_id.to_string(),
                msg_hash,
                status: SigStatus::Queued,
            },
        );
        Ok(())
    }

    fn get_sig(&self, sig_id: &str) -> SigStatus {
        self.sessions
            .get(sig_id)
            .map(|session| session.status.clone())
            .unwrap_or(SigStatus::Invalid)
    }

    fn rotate_key(&mut self, chain: &str, role: KeyRole) -> Result<()> {
        match self.next.remove(&role_key(chain, role)) {
            Some(id) => {
                self.current.insert(role_key(chain, role), id);
                Ok(())
            }
            None => bail!("next {} key for chain {} not set", role, chain),
        }
    }
}

#[derive(Default)]
pub struct MockNexus {
    chains: BTreeMap<String, Chain>,
    registered: BTreeSet<(String, String)>,
    links: BTreeMap<String, CrossChainAddress>,
    transfers: Vec<(CrossChainTransfer, TransferState)>,
    next_id: u64,
}

impl MockNexus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_chain(&mut self, name: &str, native_asset: &str) {
        self.chains.insert(
            name.to_string(),
            Chain {
                name: name.to_string(),
                native_asset: native_asset.to_string(),
            },
        );
    }

    pub fn register_asset(&mut self, chain: &str, denom: &str) {
        self.registered
            .insert((chain.to_string(), denom.to_string()));
    }

    /// Queues a transfer directly, bypassing the deposit flow. Used to
    /// model withdrawals owed to external recipients.
    pub fn add_pending_transfer(&mut self, recipient: CrossChainAddress, asset: Asset) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        self.transfers.push((
            CrossChainTransfer {
                id,
                recipient,
                asset,
            },
            TransferState::Pending,
        ));
        id
    }
}

impl Nexus for MockNexus {
    fn get_chain(&self, name: &str) -> Option<Chain> {
        self.chains.get(name).cloned()
    }

    fn is_asset_registered(&self, chain: &str, denom: &str) -> bool {
        self.registered
            .contains(&(chain.to_string(), denom.to_string()))
    }

    fn link_addresses(
        &mut self,
        sender: CrossChainAddress,
        recipient: CrossChainAddress,
    ) -> Result<()> {
        self.links.insert(sender.address, recipient);
        Ok(())
    }

    fn enqueue_for_transfer(
        &mut self,
        sender: CrossChainAddress,
        asset: Asset,
    ) -> Result<CrossChainAddress> {
        let recipient = self
            .links
            .get(&sender.address)
            .cloned()
            .ok_or_else(|| anyhow!("no recipient linked to {}", sender))?;

        let id = self.next_id;
        self.next_id += 1;
        self.transfers.push((
            CrossChainTransfer {
                id,
                recipient: recipient.clone(),
                asset,
            },
            TransferState::Pending,
        ));

        Ok(recipient)
    }

    fn get_transfers_for_chain(
        &self,
        chain: &str,
        state: TransferState,
    ) -> Vec<CrossChainTransfer> {
        self.transfers
            .iter()
            .filter(|(transfer, s)| transfer.recipient.chain == chain && *s == state)
            .map(|(transfer, _)| transfer.clone())
            .collect()
    }

    fn archive_pending_transfer(&mut self, transfer: &CrossChainTransfer) {
        for (t, state) in self.transfers.iter_mut() {
            if t.id == transfer.id {
                *state = TransferState::Archived;
            }
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct MockSnapshotter {
    snapshots: BTreeMap<u64, Snapshot>,
}

impl MockSnapshotter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, snapshot: Snapshot) {
        self.snapshots.insert(snapshot.counter, snapshot);
    }
}

impl Snapshotter for MockSnapshotter {
    fn get_snapshot(&self, counter: u64) -> Option<Snapshot> {
        self.snapshots.get(&counter).cloned()
    }
}
