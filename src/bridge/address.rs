use bitcoin::hashes::{hash160, Hash};
use bitcoin::opcodes;
use bitcoin::script::Builder;
use bitcoin::{Address, Network, ScriptBuf};
use serde::{Deserialize, Serialize};

use crate::nexus::CrossChainAddress;
use crate::tss::{Key, KeyId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AddressRole {
    Deposit,
    Consolidation,
    None,
}

/// A P2WSH address controlled by the bridge, together with the script
/// needed to spend it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressInfo {
    pub address: String,
    pub role: AddressRole,
    pub key_id: KeyId,
    pub redeem_script: ScriptBuf,
    /// signatures needed to spend, and hence the number of placeholders
    /// used when estimating the witness size
    pub max_sig_count: u32,
}

impl AddressInfo {
    /// Deposit address tied to a cross-chain recipient. The recipient hash
    /// makes the script, and therefore the address, unique per recipient.
    pub fn new_deposit_address(
        key: &Key,
        recipient: &CrossChainAddress,
        network: Network,
    ) -> Self {
        let nonce = hash160::Hash::hash(recipient.to_string().as_bytes());
        let script = Builder::new()
            .push_slice(nonce.to_byte_array())
            .push_opcode(opcodes::all::OP_DROP)
            .push_slice(key.pubkey.serialize())
            .push_opcode(opcodes::all::OP_CHECKSIG)
            .into_script();
        Self::from_script(script, AddressRole::Deposit, key.id.clone(), 1, network)
    }

    /// Change address holding the bridge's pooled funds for a key.
    pub fn new_consolidation_address(key: &Key, network: Network) -> Self {
        let script = Builder::new()
            .push_slice(key.pubkey.serialize())
            .push_opcode(opcodes::all::OP_CHECKSIG)
            .into_script();
        Self::from_script(
            script,
            AddressRole::Consolidation,
            key.id.clone(),
            1,
            network,
        )
    }

    /// Output any miner can claim, so fees can be bumped with a child
    /// transaction. Never registered, so it is not tracked as a deposit.
    pub fn new_anyone_can_spend_address(network: Network) -> Self {
        let script = Builder::new().push_opcode(opcodes::OP_TRUE).into_script();
        Self::from_script(script, AddressRole::None, KeyId::new(), 0, network)
    }

    fn from_script(
        script: ScriptBuf,
        role: AddressRole,
        key_id: KeyId,
        max_sig_count: u32,
        network: Network,
    ) -> Self {
        let address = Address::p2wsh(&script, network);
        AddressInfo {
            address: address.to_string(),
            role,
            key_id,
            redeem_script: script,
            max_sig_count,
        }
    }

    /// script_pubkey of the wrapping P2WSH output
    pub fn script_pubkey(&self, network: Network) -> ScriptBuf {
        Address::p2wsh(&self.redeem_script, network).script_pubkey()
    }
}
