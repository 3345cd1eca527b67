use bitcoin::Network;
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "btcbridge", version = "0.6.2")]
#[command(about = "Outpoint tracking and consolidation for a Bitcoin bridge", long_about = None)]
pub struct Cli {
    #[clap(long, default_value = ".btcbridge")]
    pub home: String,
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Write a default configuration file to the home directory
    Init {
        #[clap(long, default_value = "regtest")]
        network: Network,
    },
    /// Derive the bridge addresses controlled by a public key
    Address {
        /// Hex encoded compressed public key
        #[clap(long)]
        pubkey: String,
        #[clap(long, default_value = "master")]
        key_id: String,
        /// Destination chain of the depositor. When set together with
        /// --recipient-address a deposit address is derived, otherwise
        /// the consolidation address of the key is printed.
        #[clap(long)]
        recipient_chain: Option<String>,
        #[clap(long)]
        recipient_address: Option<String>,
    },
    /// Remove all local databases
    Reset,
}

pub mod address;
pub mod init;
pub mod reset;
