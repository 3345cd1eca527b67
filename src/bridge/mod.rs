use crate::vote::PollKey;

use self::deps::{Nexus, Signer, Snapshotter, Voter};
use self::events::BridgeEvent;
use self::params::Params;
use self::store::BridgeStore;

pub mod address;
pub mod builder;
pub mod deps;
pub mod error;
pub mod events;
pub mod handler;
pub mod params;
pub mod store;
mod tick;
pub mod tx;
pub mod types;

/// Deterministic bridge state machine. All collaborators are injected at
/// construction and every mutation happens through a message handler or
/// the per-block tick.
pub struct Bridge<V, S, N, X>
where
    V: Voter,
    S: Signer,
    N: Nexus,
    X: Snapshotter,
{
    pub store: BridgeStore,
    pub params: Params,
    pub voter: V,
    pub signer: S,
    pub nexus: N,
    pub snapshotter: X,
    events: Vec<BridgeEvent>,
}

impl<V, S, N, X> Bridge<V, S, N, X>
where
    V: Voter,
    S: Signer,
    N: Nexus,
    X: Snapshotter,
{
    pub fn new(store: BridgeStore, params: Params, voter: V, signer: S, nexus: N, snapshotter: X) -> Self {
        Bridge {
            store,
            params,
            voter,
            signer,
            nexus,
            snapshotter,
            events: Vec::new(),
        }
    }

    /// Events emitted since the last call, in commit order.
    pub fn drain_events(&mut self) -> Vec<BridgeEvent> {
        std::mem::take(&mut self.events)
    }

    pub(crate) fn emit(&mut self, event: BridgeEvent) {
        self.events.push(event);
    }

    /// The poll key under which the given outpoint fact is confirmed.
    pub fn poll_key_for(info: &types::OutPointInfo) -> PollKey {
        PollKey::new(types::CHAIN_NAME, info.to_string())
    }
}
