use std::fmt;

use bitcoin::secp256k1::ecdsa::Signature;
use bitcoin::secp256k1::PublicKey;
use serde::{Deserialize, Serialize};

pub type KeyId = String;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum KeyRole {
    Master,
    Secondary,
}

impl fmt::Display for KeyRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyRole::Master => write!(f, "master"),
            KeyRole::Secondary => write!(f, "secondary"),
        }
    }
}

/// A threshold key as the bridge sees it. The private shares never leave the
/// signing subsystem; only the aggregated public key is visible here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Key {
    pub id: KeyId,
    pub role: KeyRole,
    pub pubkey: PublicKey,
}

/// Status of a signing session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SigStatus {
    Queued,
    Signing,
    Signed(Signature),
    Aborted,
    Invalid,
}

impl SigStatus {
    /// still worth polling again later
    pub fn is_pending(&self) -> bool {
        matches!(self, SigStatus::Queued | SigStatus::Signing)
    }
}
