use bitcoin::secp256k1::{Message, Secp256k1};
use bitcoin::{Address, OutPoint, Transaction};
use tracing::{debug, error, info};

use crate::tss::{KeyId, KeyRole, SigStatus};

use super::deps::{Nexus, Signer, Snapshotter, Voter};
use super::events::BridgeEvent;
use super::tx::{assemble_tx, OutPointToSign, SignedTx, TxStatus, UnsignedTx};
use super::types::{OutPointInfo, OutPointState, CHAIN_NAME};
use super::Bridge;

enum AssembleError {
    /// signatures are still being produced, try again next tick
    Retry(String),
    /// a signing session died, the transaction cannot complete
    Aborted { key_id: KeyId, reason: String },
}

impl<V, S, N, X> Bridge<V, S, N, X>
where
    V: Voter,
    S: Signer,
    N: Nexus,
    X: Snapshotter,
{
    /// Reconciles the in-flight consolidation with the signing subsystem.
    /// Invoked once per block; actual reconciliation runs on the configured
    /// interval.
    pub fn tick(&mut self, block_height: u64) {
        if block_height % self.params.sig_check_interval != 0 {
            return;
        }
        self.process_unsigned_tx();
    }

    fn process_unsigned_tx(&mut self) {
        let unsigned = match self.store.unsigned_tx() {
            Some(tx) if tx.is_signing() => tx,
            _ => {
                debug!("no unsigned consolidation transaction ready");
                return;
            }
        };

        let tx_id = unsigned.tx.compute_txid().to_string();
        let signed_tx = match self.assemble(&unsigned) {
            Ok(tx) => tx,
            Err(AssembleError::Retry(reason)) => {
                debug!("failed to assemble tx {}: {}", tx_id, reason);
                return;
            }
            Err(AssembleError::Aborted { key_id, reason }) => {
                debug!("failed to assemble tx {}: {}", tx_id, reason);

                let mut aborted = unsigned;
                aborted.status = TxStatus::Aborted;
                aborted.confirmation_required = true;
                aborted.prev_aborted_key_id = Some(key_id.clone());
                self.store.set_unsigned_tx(&aborted);

                self.emit(BridgeEvent::SigningAborted { tx_id, key_id });
                return;
            }
        };

        // rotate before touching any other state, so a rotation failure
        // leaves everything untouched for the next tick
        if unsigned.rotate_key {
            if let Err(e) = self.signer.rotate_key(CHAIN_NAME, KeyRole::Master) {
                error!("Failed to rotate to the next master key: {:?}", e);
                return;
            }
        }

        let txid = signed_tx.compute_txid();
        for (vout, output) in signed_tx.output.iter().enumerate() {
            let address = match Address::from_script(
                output.script_pubkey.as_script(),
                self.params.network,
            ) {
                Ok(address) => address,
                Err(_) => continue,
            };
            let address_info = match self.store.address_info(&address.to_string()) {
                Some(info) => info,
                None => continue,
            };

            let info = OutPointInfo::new(
                OutPoint {
                    txid,
                    vout: vout as u32,
                },
                output.value.to_sat(),
                address_info.address,
            );

            if unsigned.confirmation_required {
                let unconfirmed = self.store.unconfirmed_amount(&address_info.key_id);
                self.store
                    .set_unconfirmed_amount(&address_info.key_id, unconfirmed + info.amount);
            } else {
                self.store.set_outpoint_info(&info, OutPointState::Confirmed);
                self.emit(BridgeEvent::OutpointConfirmed {
                    out_point: info.out_point.clone(),
                    address: info.address.clone(),
                    amount: info.amount,
                });
            }
        }

        self.store.delete_unsigned_tx();
        self.store.set_signed_tx(&SignedTx::new(
            signed_tx,
            unsigned.confirmation_required,
            unsigned.anyone_can_spend_vout,
        ));
        self.store
            .set_latest_consolidation_out_point(&format!("{}:{}", txid, unsigned.master_key_vout));

        self.emit(BridgeEvent::ConsolidationSigned {
            tx_id: txid.to_string(),
        });
        info!("transaction {} is fully signed", txid);
    }

    /// Collects and verifies every required signature and attaches them as
    /// witness data.
    fn assemble(&self, unsigned: &UnsignedTx) -> Result<Transaction, AssembleError> {
        let out_points = self
            .outpoints_to_sign(&unsigned.tx)
            .map_err(AssembleError::Retry)?;

        let secp = Secp256k1::verification_only();
        let mut sigs = Vec::with_capacity(unsigned.sig_requirements.len());
        for requirement in &unsigned.sig_requirements {
            let sig_id = requirement.sig_id();
            let sig = match self.signer.get_sig(&sig_id) {
                SigStatus::Signed(sig) => sig,
                status if status.is_pending() => {
                    return Err(AssembleError::Retry(format!(
                        "signature {} not yet found",
                        sig_id
                    )))
                }
                _ => {
                    return Err(AssembleError::Aborted {
                        key_id: requirement.key_id.clone(),
                        reason: format!("signing session for {} aborted", sig_id),
                    })
                }
            };

            let key = self.signer.get_key(&requirement.key_id).ok_or_else(|| {
                AssembleError::Retry(format!("key {} no longer known", requirement.key_id))
            })?;
            let msg = Message::from_digest(requirement.sig_hash);
            if secp.verify_ecdsa(&msg, &sig, &key.pubkey).is_err() {
                error!("signature {} failed verification", sig_id);
                return Err(AssembleError::Retry(format!(
                    "signature {} failed verification",
                    sig_id
                )));
            }

            sigs.push(sig);
        }

        Ok(assemble_tx(&unsigned.tx, &out_points, &sigs))
    }

    fn outpoints_to_sign(&self, tx: &Transaction) -> Result<Vec<OutPointToSign>, String> {
        let mut to_sign = Vec::with_capacity(tx.input.len());
        for tx_in in &tx.input {
            let out_point = tx_in.previous_output.to_string();
            let (info, state) = self
                .store
                .outpoint_info(&out_point)
                .ok_or_else(|| format!("cannot find {}", out_point))?;
            if state != OutPointState::Spent {
                return Err(format!("outpoint {} is not set as spent", out_point));
            }
            let address = self
                .store
                .address_info(&info.address)
                .ok_or_else(|| format!("address {} not found", info.address))?;

            to_sign.push(OutPointToSign { info, address });
        }
        Ok(to_sign)
    }
}
