use anyhow::{bail, Result};
use bitcoin::Network;
use serde::{Deserialize, Serialize};

use crate::vote::Threshold;

/// Dust limit bitcoin-core applies to P2SH outputs.
const DUST_LIMIT: u64 = 546;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Params {
    pub network: Network,
    /// confirmations an outpoint needs on the external chain before voting
    pub confirmation_height: u64,
    /// blocks a confirmation poll stays open
    pub revote_locking_period: u64,
    /// suggested blocks between signature reconciliation runs
    pub sig_check_interval: u64,
    /// minimum withdrawal output amount in satoshi
    pub min_output_amount: u64,
    pub max_input_count: usize,
    /// withdrawal batching stops once the estimated vsize exceeds this
    pub max_tx_size: u64,
    pub voting_threshold: Threshold,
    pub min_voter_count: u64,
}

impl Default for Params {
    fn default() -> Self {
        Self::default_for(Network::Regtest)
    }
}

impl Params {
    pub fn default_for(network: Network) -> Self {
        Params {
            network,
            confirmation_height: 1,
            revote_locking_period: 50,
            sig_check_interval: 10,
            min_output_amount: 1000,
            max_input_count: 50,
            max_tx_size: 1024 * 1024 / 3,
            voting_threshold: Threshold {
                numerator: 15,
                denominator: 100,
            },
            min_voter_count: 1,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.confirmation_height == 0 {
            bail!("confirmation height must be greater than 0");
        }
        if self.revote_locking_period == 0 {
            bail!("revote locking period must be greater than 0");
        }
        if self.sig_check_interval == 0 {
            bail!("sig check interval must be greater than 0");
        }
        if self.min_output_amount < DUST_LIMIT {
            bail!(
                "minimum output amount must be at least {} satoshi",
                DUST_LIMIT
            );
        }
        if self.max_input_count == 0 {
            bail!("max input count must be greater than 0");
        }
        if self.max_tx_size == 0 {
            bail!("max tx size must be greater than 0");
        }
        let threshold = self.voting_threshold;
        if threshold.numerator == 0
            || threshold.denominator == 0
            || threshold.numerator > threshold.denominator
        {
            bail!("voting threshold must be a fraction in (0, 1]");
        }
        if self.min_voter_count == 0 {
            bail!("min voter count must be at least 1");
        }
        Ok(())
    }
}
