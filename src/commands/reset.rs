use std::fs;

use tracing::info;

use crate::config::Config;

use super::Cli;

pub fn execute(cli: &Cli) {
    let conf = Config::from_file(&cli.home).unwrap();

    let data = conf.home.join("data");
    if data.exists() {
        fs::remove_dir_all(&data).expect("Unable to remove data directory");
    }
    info!("Reset all local databases");
}
