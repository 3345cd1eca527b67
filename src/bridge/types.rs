use std::fmt;
use std::str::FromStr;

use bitcoin::OutPoint;
use serde::{Deserialize, Serialize};

use super::error::BridgeError;

/// Name of the chain this module guards.
pub const CHAIN_NAME: &str = "bitcoin";
/// Denomination of the bridged asset.
pub const SATOSHI: &str = "satoshi";
/// Upper bound for the length of a DER encoded ECDSA signature.
pub const MAX_DER_SIG_LENGTH: usize = 72;
/// Consolidation transactions always pay 1 satoshi/vbyte, the default
/// minimum relay fee rate bitcoin-core sets.
pub const MIN_RELAY_TX_FEE_SAT_PER_VBYTE: u64 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutPointState {
    Confirmed,
    Spent,
}

/// A UTXO paying one of the bridge's addresses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutPointInfo {
    /// canonical "txid:vout"
    pub out_point: String,
    /// value in satoshi
    pub amount: u64,
    pub address: String,
}

impl OutPointInfo {
    pub fn new(out_point: OutPoint, amount: u64, address: impl Into<String>) -> Self {
        Self {
            out_point: out_point.to_string(),
            amount,
            address: address.into(),
        }
    }

    pub fn validate(&self) -> Result<(), BridgeError> {
        self.to_outpoint()?;
        if self.amount == 0 {
            return Err(BridgeError::InvalidOutpointInfo(
                "amount must be greater than 0".to_string(),
            ));
        }
        if self.address.is_empty() {
            return Err(BridgeError::InvalidOutpointInfo(
                "invalid address to track".to_string(),
            ));
        }
        Ok(())
    }

    pub fn to_outpoint(&self) -> Result<OutPoint, BridgeError> {
        OutPoint::from_str(&self.out_point)
            .map_err(|e| BridgeError::InvalidOutpointInfo(e.to_string()))
    }
}

/// Doubles as the identifier of the poll confirming this outpoint.
impl fmt::Display for OutPointInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}_{}", self.out_point, self.address, self.amount)
    }
}
