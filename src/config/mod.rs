use std::path::PathBuf;
use std::str::FromStr;
use std::fs;

use bitcoin::Network;
use serde::{Deserialize, Serialize};

use crate::bridge::params::Params;

const CONFIG_FILE: &str = "config.toml";

/// Bridge node configuration
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Config {
    #[serde(skip_serializing, skip_deserializing)]
    pub home: PathBuf,
    /// logger level
    pub log_level: String,
    pub params: Params,
}

impl Config {
    pub fn from_file(app_home: &str) -> Result<Self, std::io::Error> {
        let home = if app_home.starts_with("/") {
            PathBuf::from(app_home)
        } else {
            home_dir(app_home)
        };
        if !home.join(CONFIG_FILE).exists() {
            return Err(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                "Config file not found",
            ));
        }
        let contents = fs::read_to_string(home.join(CONFIG_FILE))?;
        let mut config: Config = toml::from_str(&contents).expect("Failed to parse config file");
        config.home = home;

        Ok(config)
    }

    pub fn default(home_str: &str, network: Network) -> Self {
        let home = if home_str.starts_with("/") {
            PathBuf::from_str(home_str).unwrap()
        } else {
            home_dir(home_str)
        };
        Self {
            home,
            log_level: "debug".to_string(),
            params: Params::default_for(network),
        }
    }

    pub fn to_string(&self) -> String {
        toml::to_string(self).unwrap()
    }

    pub fn save(&self) -> Result<(), std::io::Error> {
        if !self.home.exists() {
            fs::create_dir_all(&self.home)?;
        }
        let contents = self.to_string();
        fs::write(self.home.join(CONFIG_FILE), contents)
    }

    pub fn get_database_with_name(&self, db_name: &str) -> String {
        let mut home = self.home.clone();
        home.push("data");
        home.push(db_name);
        home.display().to_string()
    }
}

pub fn home_dir(app_home: &str) -> PathBuf {
    dirs::home_dir().map(|path| path.join(app_home)).unwrap()
}
