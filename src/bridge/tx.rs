use anyhow::Result;
use bitcoin::absolute::LockTime;
use bitcoin::consensus::encode::serialize_hex;
use bitcoin::hashes::Hash;
use bitcoin::secp256k1::ecdsa::Signature;
use bitcoin::sighash::SighashCache;
use bitcoin::transaction::Version;
use bitcoin::{
    Amount, EcdsaSighashType, OutPoint, ScriptBuf, Sequence, Transaction, TxIn, TxOut, Witness,
};
use serde::{Deserialize, Serialize};

use super::address::AddressInfo;
use super::types::{OutPointInfo, MAX_DER_SIG_LENGTH};
use crate::tss::KeyId;

/// A confirmed outpoint paired with the address info needed to spend it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutPointToSign {
    pub info: OutPointInfo,
    pub address: AddressInfo,
}

/// One signature that must be produced before a transaction input can be
/// assembled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SigRequirement {
    pub key_id: KeyId,
    pub sig_hash: [u8; 32],
}

impl SigRequirement {
    pub fn sig_id(&self) -> String {
        format!("{}-{}", hex::encode(self.sig_hash), self.key_id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TxStatus {
    Signing,
    Aborted,
}

/// A consolidation transaction waiting for its signatures.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnsignedTx {
    pub tx: Transaction,
    pub status: TxStatus,
    pub sig_requirements: Vec<SigRequirement>,
    pub master_key_vout: u32,
    pub anyone_can_spend_vout: u32,
    pub rotate_key: bool,
    pub confirmation_required: bool,
    pub prev_aborted_key_id: Option<KeyId>,
}

impl UnsignedTx {
    pub fn new(
        tx: Transaction,
        sig_requirements: Vec<SigRequirement>,
        master_key_vout: u32,
        anyone_can_spend_vout: u32,
        rotate_key: bool,
    ) -> Self {
        UnsignedTx {
            tx,
            status: TxStatus::Signing,
            sig_requirements,
            master_key_vout,
            anyone_can_spend_vout,
            rotate_key,
            confirmation_required: false,
            prev_aborted_key_id: None,
        }
    }

    pub fn is_signing(&self) -> bool {
        self.status == TxStatus::Signing
    }
}

/// A fully signed consolidation transaction ready for broadcast.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedTx {
    pub tx: Transaction,
    pub confirmation_required: bool,
    pub anyone_can_spend_vout: u32,
}

impl SignedTx {
    pub fn new(tx: Transaction, confirmation_required: bool, anyone_can_spend_vout: u32) -> Self {
        SignedTx {
            tx,
            confirmation_required,
            anyone_can_spend_vout,
        }
    }

    /// Consensus encoding as broadcast to the Bitcoin network.
    pub fn consensus_hex(&self) -> String {
        serialize_hex(&self.tx)
    }
}

/// Creates an unsigned transaction spending the given outpoints into the
/// given outputs. Inputs carry no signature data yet.
pub fn create_tx(prev_outs: &[OutPoint], outputs: Vec<TxOut>) -> Transaction {
    let input = prev_outs
        .iter()
        .map(|out_point| TxIn {
            previous_output: *out_point,
            script_sig: ScriptBuf::new(),
            sequence: Sequence::MAX,
            witness: Witness::new(),
        })
        .collect();

    Transaction {
        version: Version::ONE,
        lock_time: LockTime::ZERO,
        input,
        output: outputs,
    }
}

/// Virtual size of the transaction once fully signed, computed by filling
/// every input witness with worst-case DER signature placeholders.
pub fn estimate_tx_size(tx: &Transaction, out_points: &[OutPointToSign]) -> u64 {
    let mut tx = tx.clone();
    let placeholder = [0u8; MAX_DER_SIG_LENGTH];

    for (tx_in, out_point) in tx.input.iter_mut().zip(out_points) {
        let mut witness = Witness::new();
        for _ in 0..out_point.address.max_sig_count {
            witness.push(placeholder);
        }
        witness.push(out_point.address.redeem_script.as_bytes());
        tx_in.witness = witness;
    }

    tx.vsize() as u64
}

/// BIP-143 signature hash committing to the input's redeem script and amount.
pub fn p2wsh_sig_hash(
    tx: &Transaction,
    input_index: usize,
    out_point: &OutPointToSign,
) -> Result<[u8; 32]> {
    let mut cache = SighashCache::new(tx);
    let sig_hash = cache.p2wsh_signature_hash(
        input_index,
        &out_point.address.redeem_script,
        Amount::from_sat(out_point.info.amount),
        EcdsaSighashType::All,
    )?;

    Ok(sig_hash.to_byte_array())
}

/// Attaches the collected signatures as witness data. Signatures must be in
/// input order and already verified against their signature hashes.
pub fn assemble_tx(
    tx: &Transaction,
    out_points: &[OutPointToSign],
    sigs: &[Signature],
) -> Transaction {
    let mut tx = tx.clone();

    for ((tx_in, out_point), sig) in tx.input.iter_mut().zip(out_points).zip(sigs) {
        let mut sig_bytes = sig.serialize_der().to_vec();
        sig_bytes.push(EcdsaSighashType::All.to_u32() as u8);

        let mut witness = Witness::new();
        witness.push(sig_bytes);
        witness.push(out_point.address.redeem_script.as_bytes());
        tx_in.witness = witness;
    }

    tx
}
