use crate::config;

use super::Cli;
use bitcoin::Network;

pub fn execute(cli: &Cli, network: Network) {
    println!("Initialize Bridge Home: {}", &cli.home);
    config::Config::default(&cli.home, network).save().unwrap();
}
