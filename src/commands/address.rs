use bitcoin::secp256k1::PublicKey;
use tracing::{error, info};

use crate::bridge::address::AddressInfo;
use crate::config::Config;
use crate::nexus::CrossChainAddress;
use crate::tss::{Key, KeyRole};

use super::Cli;

pub fn execute(
    cli: &Cli,
    pubkey: &str,
    key_id: &str,
    recipient_chain: &Option<String>,
    recipient_address: &Option<String>,
) {
    let conf = Config::from_file(&cli.home).unwrap();

    let pubkey = match pubkey.parse::<PublicKey>() {
        Ok(pubkey) => pubkey,
        Err(e) => {
            error!("Invalid public key: {}", e);
            return;
        }
    };
    let key = Key {
        id: key_id.to_string(),
        role: KeyRole::Master,
        pubkey,
    };

    let info = match (recipient_chain, recipient_address) {
        (Some(chain), Some(address)) => {
            let recipient = CrossChainAddress::new(chain.clone(), address.clone());
            info!("Deposit address for {}", recipient);
            AddressInfo::new_deposit_address(&key, &recipient, conf.params.network)
        }
        _ => {
            info!("Consolidation address of key {}", key.id);
            AddressInfo::new_consolidation_address(&key, conf.params.network)
        }
    };

    info!("Address: {}", info.address);
    info!("Redeem script: {}", info.redeem_script.to_hex_string());
}
